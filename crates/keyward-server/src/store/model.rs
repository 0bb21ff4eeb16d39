use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Stored in redb as bincode-encoded bytes, keyed by `key`.
/// Status is never stored; see [`LicenseRecord::status_at`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    /// Opaque license token, unique for the lifetime of the store.
    pub key: String,
    pub issued_at: DateTime<Utc>,
    /// `None` means the license never expires.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Effective status of a key at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    Valid { expires_at: Option<DateTime<Utc>> },
    Expired { expires_at: DateTime<Utc> },
    NotFound,
}

impl LicenseRecord {
    /// Valid up to and including `expires_at`, expired strictly after it.
    pub fn status_at(&self, now: DateTime<Utc>) -> KeyStatus {
        match self.expires_at {
            Some(exp) if now > exp => KeyStatus::Expired { expires_at: exp },
            expires_at => KeyStatus::Valid { expires_at },
        }
    }
}

/// RFC 3339 UTC with second precision, e.g. `2026-10-19T12:00:00Z`.
pub fn iso8601(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn make_record(expires_at: Option<DateTime<Utc>>) -> LicenseRecord {
        LicenseRecord {
            key: "ABCDEF".into(),
            issued_at: t0(),
            expires_at,
        }
    }

    #[test]
    fn no_expiry_is_always_valid() {
        let r = make_record(None);
        assert_eq!(
            r.status_at(DateTime::<Utc>::MAX_UTC),
            KeyStatus::Valid { expires_at: None }
        );
    }

    #[test]
    fn expiry_instant_itself_is_still_valid() {
        let exp = t0() + TimeDelta::days(1);
        let r = make_record(Some(exp));
        assert_eq!(
            r.status_at(exp),
            KeyStatus::Valid {
                expires_at: Some(exp)
            }
        );
        assert_eq!(
            r.status_at(exp + TimeDelta::seconds(1)),
            KeyStatus::Expired { expires_at: exp }
        );
    }

    #[test]
    fn iso8601_uses_utc_seconds() {
        assert_eq!(iso8601(DateTime::UNIX_EPOCH), "1970-01-01T00:00:00Z");
        assert_eq!(iso8601(t0()), "2026-10-19T12:00:00Z");
    }
}

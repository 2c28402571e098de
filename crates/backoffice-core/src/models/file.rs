use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

/// Stored file record.
///
/// Rows are created by the upload domain; the cleanup worker only claims,
/// soft-deletes and bumps `failed_attempts`. `expires_at = None` means the
/// file is permanent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct File {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Bucket (or container) holding the object.
    pub bucket: String,
    /// Opaque object key inside `bucket`.
    pub storage_key: String,
    pub original_filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub expires_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    /// Start of the current cleanup lease, if any.
    pub claimed_at: Option<DateTime<Utc>>,
    pub failed_attempts: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl File {
    /// Expired, not soft-deleted, and not under a cleanup lease.
    pub fn is_claimable(&self, now: DateTime<Utc>) -> bool {
        self.deleted_at.is_none()
            && self.claimed_at.is_none()
            && self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Lease older than `stale_age` without finalization.
    pub fn has_stale_claim(&self, now: DateTime<Utc>, stale_age: Duration) -> bool {
        self.deleted_at.is_none()
            && self
                .claimed_at
                .is_some_and(|claimed_at| claimed_at < now - stale_age)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(expires_at: Option<DateTime<Utc>>) -> File {
        let now = Utc::now();
        File {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            bucket: "uploads".to_string(),
            storage_key: "tenant/a.pdf".to_string(),
            original_filename: "a.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            file_size: 42,
            expires_at,
            deleted_at: None,
            claimed_at: None,
            failed_attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn permanent_files_are_never_claimable() {
        assert!(!file(None).is_claimable(Utc::now()));
    }

    #[test]
    fn only_past_deadlines_are_claimable() {
        let now = Utc::now();
        assert!(file(Some(now - Duration::minutes(1))).is_claimable(now));
        assert!(!file(Some(now + Duration::minutes(1))).is_claimable(now));
    }

    #[test]
    fn deleted_or_claimed_files_are_not_claimable() {
        let now = Utc::now();
        let mut deleted = file(Some(now - Duration::hours(1)));
        deleted.deleted_at = Some(now);
        assert!(!deleted.is_claimable(now));

        let mut claimed = file(Some(now - Duration::hours(1)));
        claimed.claimed_at = Some(now);
        assert!(!claimed.is_claimable(now));
    }

    #[test]
    fn claim_goes_stale_after_age() {
        let now = Utc::now();
        let mut f = file(Some(now - Duration::hours(1)));
        f.claimed_at = Some(now - Duration::minutes(10));
        assert!(f.has_stale_claim(now, Duration::minutes(5)));
        assert!(!f.has_stale_claim(now, Duration::minutes(15)));

        f.deleted_at = Some(now);
        assert!(!f.has_stale_claim(now, Duration::minutes(5)));
    }

    #[test]
    fn serializes_nullable_timestamps() {
        let f = file(None);
        let json = serde_json::to_value(&f).unwrap();
        assert!(json["expires_at"].is_null());
        assert_eq!(json["failed_attempts"], 0);
    }
}

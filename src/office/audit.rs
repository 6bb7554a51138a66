//! Activity-trail recording.
//!
//! Every mutating practice operation appends a row describing who did what
//! to which record. An append failure is logged and swallowed; the primary
//! operation has already committed and must not be rolled back over a
//! missing trail entry.

use uuid::Uuid;

use crate::db::{ActivityLogStore, AppendActivityParams};

pub const ACTION_CREATE: &str = "create";
pub const ACTION_UPDATE: &str = "update";
pub const ACTION_DELETE: &str = "delete";

pub const TARGET_USER: &str = "user";
pub const TARGET_CLIENT: &str = "client";
pub const TARGET_CASE: &str = "case";
pub const TARGET_SESSION: &str = "session";
pub const TARGET_DOCUMENT: &str = "document";
pub const TARGET_INVOICE: &str = "invoice";
pub const TARGET_TASK: &str = "task";

/// Append one activity entry, logging instead of failing on error.
pub async fn record(
    store: &dyn ActivityLogStore,
    user_id: Uuid,
    action: &str,
    target_type: &str,
    target_id: &str,
    details: serde_json::Value,
) {
    let entry = AppendActivityParams {
        user_id,
        action: action.to_string(),
        target_type: target_type.to_string(),
        target_id: target_id.to_string(),
        details,
    };
    if let Err(err) = store.append_activity(&entry).await {
        tracing::warn!(
            action = action,
            target_type = target_type,
            target_id = target_id,
            "activity log append failed: {}",
            err
        );
    }
}

//! Deletion checks and orchestrated deletes.
//!
//! The check is advisory and read-only: it reports what a deletion would
//! touch so a caller can warn before committing. A missing record is part
//! of the report, not an error. The orchestrated deletes run the store
//! cascade and append an audit entry with the removal summary.

use serde::Serialize;
use uuid::Uuid;

use crate::db::{CaseCascadeSummary, ClientCascadeSummary, Database};
use crate::error::StoreError;
use crate::office::audit;

/// What a deletion would remove. `can_delete` is true only when the record
/// exists and nothing depends on it; the cascade itself never consults this.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeletionConstraintReport {
    pub can_delete: bool,
    pub related_cases: i64,
    pub related_sessions: i64,
    pub related_documents: i64,
    pub related_invoices: i64,
    pub related_tasks: i64,
    pub message: Option<String>,
}

fn describe_dependents(parts: &[(i64, &str)]) -> String {
    let listed: Vec<String> = parts
        .iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, label)| format!("{count} {label}(s)"))
        .collect();
    listed.join(", ")
}

/// Report what deleting this client would remove.
pub async fn check_client_deletion(
    store: &dyn Database,
    client_id: Uuid,
) -> Result<DeletionConstraintReport, StoreError> {
    if store.get_client(client_id).await?.is_none() {
        return Ok(DeletionConstraintReport {
            message: Some("client not found".to_string()),
            ..Default::default()
        });
    }

    let counts = store.client_dependent_counts(client_id).await?;
    if counts.all_zero() {
        return Ok(DeletionConstraintReport {
            can_delete: true,
            ..Default::default()
        });
    }

    let listed = describe_dependents(&[
        (counts.cases, "case"),
        (counts.sessions, "session"),
        (counts.documents, "document"),
        (counts.invoices, "invoice"),
        (counts.tasks, "task"),
    ]);
    Ok(DeletionConstraintReport {
        can_delete: false,
        related_cases: counts.cases,
        related_sessions: counts.sessions,
        related_documents: counts.documents,
        related_invoices: counts.invoices,
        related_tasks: counts.tasks,
        message: Some(format!("deleting this client also removes {listed}")),
    })
}

/// Report what deleting this case would remove. Invoices are listed even
/// though a case deletion only detaches them.
pub async fn check_case_deletion(
    store: &dyn Database,
    case_id: Uuid,
) -> Result<DeletionConstraintReport, StoreError> {
    if store.get_case(case_id).await?.is_none() {
        return Ok(DeletionConstraintReport {
            message: Some("case not found".to_string()),
            ..Default::default()
        });
    }

    let counts = store.case_dependent_counts(case_id).await?;
    if counts.sessions == 0 && counts.documents == 0 && counts.invoices == 0 && counts.tasks == 0 {
        return Ok(DeletionConstraintReport {
            can_delete: true,
            ..Default::default()
        });
    }

    let listed = describe_dependents(&[
        (counts.sessions, "session"),
        (counts.documents, "document"),
        (counts.invoices, "invoice"),
        (counts.tasks, "task"),
    ]);
    Ok(DeletionConstraintReport {
        can_delete: false,
        related_sessions: counts.sessions,
        related_documents: counts.documents,
        related_invoices: counts.invoices,
        related_tasks: counts.tasks,
        message: Some(format!("deleting this case also affects {listed}")),
        ..Default::default()
    })
}

/// Run the client cascade and record it in the activity trail.
pub async fn delete_client(
    store: &dyn Database,
    actor: Uuid,
    client_id: Uuid,
) -> Result<ClientCascadeSummary, StoreError> {
    let summary = store.delete_client(client_id).await?;
    audit::record(
        store,
        actor,
        audit::ACTION_DELETE,
        audit::TARGET_CLIENT,
        &client_id.to_string(),
        serde_json::json!({
            "cases": summary.cases,
            "sessions": summary.sessions,
            "documents": summary.documents,
            "invoices": summary.invoices,
            "tasks": summary.tasks,
            "assignments": summary.assignments,
        }),
    )
    .await;
    Ok(summary)
}

/// Run the case cascade and record it in the activity trail.
pub async fn delete_case(
    store: &dyn Database,
    actor: Uuid,
    case_id: Uuid,
) -> Result<CaseCascadeSummary, StoreError> {
    let summary = store.delete_case(case_id).await?;
    audit::record(
        store,
        actor,
        audit::ACTION_DELETE,
        audit::TARGET_CASE,
        &case_id.to_string(),
        serde_json::json!({
            "sessions": summary.sessions,
            "documents": summary.documents,
            "tasks": summary.tasks,
            "assignments": summary.assignments,
            "invoices_decoupled": summary.invoices_decoupled,
        }),
    )
    .await;
    Ok(summary)
}

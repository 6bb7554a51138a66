//! Deletion checks and cascade behavior against a real migrated database.

mod common;

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use uuid::Uuid;

use lexdesk::db::{TaskStatus, UserRole};
use lexdesk::office::retention;

use common::{
    open_store, seed_case, seed_client, seed_document, seed_invoice, seed_session, seed_task,
    seed_user,
};

#[tokio::test]
async fn deletion_report_lists_one_dependent_in_every_category() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await;
    let admin = seed_user(store.as_ref(), "admin", UserRole::Admin).await;
    let client = seed_client(store.as_ref(), "Khaled", admin.id).await;
    let case = seed_case(store.as_ref(), "Contract Dispute", client.id, admin.id).await;
    seed_session(store.as_ref(), case.id, "2025-03-05", "10:00").await;
    seed_document(store.as_ref(), case.id, admin.id).await;
    seed_invoice(store.as_ref(), Some(case.id), dec!(500), false).await;
    seed_task(store.as_ref(), Some(case.id), None, TaskStatus::Pending).await;

    let report = retention::check_client_deletion(store.as_ref(), client.id).await?;
    assert!(!report.can_delete);
    // Each category is fed by its own subquery; every one must land at 1.
    assert_eq!(report.related_cases, 1);
    assert_eq!(report.related_sessions, 1);
    assert_eq!(report.related_documents, 1);
    assert_eq!(report.related_invoices, 1);
    assert_eq!(report.related_tasks, 1);
    let message = report.message.expect("blocker message");
    for category in ["case", "session", "document", "invoice", "task"] {
        assert!(
            message.contains(&format!("1 {category}(s)")),
            "missing {category} in message: {message}"
        );
    }
    Ok(())
}

#[tokio::test]
async fn deletion_report_allows_client_with_no_dependents() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await;
    let admin = seed_user(store.as_ref(), "admin", UserRole::Admin).await;
    let client = seed_client(store.as_ref(), "Fresh Client", admin.id).await;

    let report = retention::check_client_deletion(store.as_ref(), client.id).await?;
    assert!(report.can_delete);
    assert!(report.message.is_none());
    Ok(())
}

#[tokio::test]
async fn deletion_report_treats_missing_client_as_data() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await;

    let report = retention::check_client_deletion(store.as_ref(), Uuid::new_v4()).await?;
    assert!(!report.can_delete);
    assert_eq!(report.message.as_deref(), Some("client not found"));
    Ok(())
}

#[tokio::test]
async fn case_deletion_report_lists_dependents_per_category() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await;
    let admin = seed_user(store.as_ref(), "admin", UserRole::Admin).await;
    let client = seed_client(store.as_ref(), "Client", admin.id).await;
    let case = seed_case(store.as_ref(), "Reviewed case", client.id, admin.id).await;
    seed_document(store.as_ref(), case.id, admin.id).await;
    seed_task(store.as_ref(), Some(case.id), None, TaskStatus::Pending).await;

    let report = retention::check_case_deletion(store.as_ref(), case.id).await?;
    assert!(!report.can_delete);
    assert_eq!(report.related_documents, 1);
    assert_eq!(report.related_tasks, 1);
    assert_eq!(report.related_sessions, 0);
    assert_eq!(report.related_invoices, 0);
    // A case never nests other cases.
    assert_eq!(report.related_cases, 0);
    let message = report.message.expect("blocker message");
    assert!(message.contains("1 document(s)"), "message: {message}");
    assert!(message.contains("1 task(s)"), "message: {message}");
    assert!(!message.contains("session"), "message: {message}");
    Ok(())
}

#[tokio::test]
async fn case_deletion_report_allows_bare_case_and_reports_missing_as_data()
-> anyhow::Result<()> {
    let (_dir, store) = open_store().await;
    let admin = seed_user(store.as_ref(), "admin", UserRole::Admin).await;
    let client = seed_client(store.as_ref(), "Client", admin.id).await;
    let case = seed_case(store.as_ref(), "Bare case", client.id, admin.id).await;

    let report = retention::check_case_deletion(store.as_ref(), case.id).await?;
    assert!(report.can_delete);
    assert!(report.message.is_none());

    let report = retention::check_case_deletion(store.as_ref(), Uuid::new_v4()).await?;
    assert!(!report.can_delete);
    assert_eq!(report.message.as_deref(), Some("case not found"));
    Ok(())
}

#[tokio::test]
async fn client_cascade_removes_every_dependent_under_its_cases() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await;
    let admin = seed_user(store.as_ref(), "admin", UserRole::Admin).await;
    let client = seed_client(store.as_ref(), "Doomed Client", admin.id).await;
    let case_a = seed_case(store.as_ref(), "Case A", client.id, admin.id).await;
    let case_b = seed_case(store.as_ref(), "Case B", client.id, admin.id).await;
    seed_session(store.as_ref(), case_a.id, "2025-03-05", "10:00").await;
    seed_session(store.as_ref(), case_b.id, "2025-03-06", "11:00").await;
    seed_document(store.as_ref(), case_a.id, admin.id).await;
    seed_invoice(store.as_ref(), Some(case_a.id), dec!(1200), false).await;
    seed_task(store.as_ref(), Some(case_b.id), None, TaskStatus::Pending).await;

    // Invoice already detached from any case; the cascade must leave it.
    let standalone = seed_invoice(store.as_ref(), None, dec!(90), false).await;

    let summary = retention::delete_client(store.as_ref(), admin.id, client.id).await?;
    assert_eq!(summary.cases, 2);
    assert_eq!(summary.sessions, 2);
    assert_eq!(summary.documents, 1);
    assert_eq!(summary.invoices, 1);
    assert_eq!(summary.tasks, 1);
    // One auto-assignment per created case.
    assert_eq!(summary.assignments, 2);

    assert!(store.get_client(client.id).await?.is_none());
    assert!(store.get_case(case_a.id).await?.is_none());
    assert!(store.get_case(case_b.id).await?.is_none());
    assert!(store.list_sessions().await?.is_empty());
    assert!(store.list_documents().await?.is_empty());
    assert!(store.list_tasks().await?.is_empty());

    let survivors = store.list_invoices().await?;
    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].id, standalone.id);
    Ok(())
}

#[tokio::test]
async fn case_delete_detaches_invoices_and_removes_the_rest() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await;
    let admin = seed_user(store.as_ref(), "admin", UserRole::Admin).await;
    let client = seed_client(store.as_ref(), "Kept Client", admin.id).await;
    let case = seed_case(store.as_ref(), "Closing Case", client.id, admin.id).await;
    seed_session(store.as_ref(), case.id, "2025-03-05", "10:00").await;
    seed_document(store.as_ref(), case.id, admin.id).await;
    let invoice = seed_invoice(store.as_ref(), Some(case.id), dec!(750), false).await;
    seed_task(store.as_ref(), Some(case.id), None, TaskStatus::Pending).await;

    let summary = retention::delete_case(store.as_ref(), admin.id, case.id).await?;
    assert_eq!(summary.sessions, 1);
    assert_eq!(summary.documents, 1);
    assert_eq!(summary.tasks, 1);
    assert_eq!(summary.assignments, 1);
    assert_eq!(summary.invoices_decoupled, 1);

    assert!(store.get_case(case.id).await?.is_none());
    assert!(store.get_client(client.id).await?.is_some());

    let detached = store
        .get_invoice(invoice.id)
        .await?
        .expect("invoice survives case deletion");
    assert_eq!(detached.case_id, None);
    assert_eq!(detached.amount, dec!(750));
    Ok(())
}

#[tokio::test]
async fn client_cascade_hard_deletes_invoices_while_case_delete_preserves_them()
-> anyhow::Result<()> {
    let (_dir, store) = open_store().await;
    let admin = seed_user(store.as_ref(), "admin", UserRole::Admin).await;

    let client_a = seed_client(store.as_ref(), "Client A", admin.id).await;
    let case_a = seed_case(store.as_ref(), "A's case", client_a.id, admin.id).await;
    let invoice_a = seed_invoice(store.as_ref(), Some(case_a.id), dec!(100), false).await;

    let client_b = seed_client(store.as_ref(), "Client B", admin.id).await;
    let case_b = seed_case(store.as_ref(), "B's case", client_b.id, admin.id).await;
    let invoice_b = seed_invoice(store.as_ref(), Some(case_b.id), dec!(200), false).await;

    store.delete_client(client_a.id).await?;
    store.delete_case(case_b.id).await?;

    // Same invoice, two very different fates depending on the entry point.
    assert!(store.get_invoice(invoice_a.id).await?.is_none());
    let survivor = store.get_invoice(invoice_b.id).await?.expect("detached invoice");
    assert_eq!(survivor.case_id, None);
    Ok(())
}

#[tokio::test]
async fn detached_invoices_never_count_against_a_client() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await;
    let admin = seed_user(store.as_ref(), "admin", UserRole::Admin).await;
    let client = seed_client(store.as_ref(), "Counted Client", admin.id).await;
    seed_case(store.as_ref(), "Only case", client.id, admin.id).await;
    seed_invoice(store.as_ref(), None, dec!(55), false).await;

    let counts = store.client_dependent_counts(client.id).await?;
    assert_eq!(counts.cases, 1);
    assert_eq!(counts.invoices, 0);
    Ok(())
}

#[tokio::test]
async fn cascades_fail_with_not_found_for_missing_parents() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await;

    let err = store.delete_client(Uuid::new_v4()).await.expect_err("missing client");
    assert!(err.is_not_found());
    let err = store.delete_case(Uuid::new_v4()).await.expect_err("missing case");
    assert!(err.is_not_found());
    Ok(())
}

#[tokio::test]
async fn orchestrated_deletes_leave_an_audit_trail() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await;
    let admin = seed_user(store.as_ref(), "admin", UserRole::Admin).await;
    let client = seed_client(store.as_ref(), "Audited Client", admin.id).await;

    retention::delete_client(store.as_ref(), admin.id, client.id).await?;

    let trail = store
        .list_activity_for_target("client", &client.id.to_string())
        .await?;
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].action, "delete");
    assert_eq!(trail[0].user_id, admin.id);
    Ok(())
}

//! Role-scoped case visibility, the scheduling conflict probe, and the
//! dashboard aggregates.

mod common;

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

use lexdesk::db::{
    AssignmentRole, CaseStatus, SessionStatus, TaskStatus, UpdateCaseParams, UpdateSessionParams,
    UserRole,
};
use lexdesk::office::schedule;
use lexdesk::office::stats::{self, StatsScope};

use common::{date, open_store, seed_case, seed_client, seed_invoice, seed_session, seed_task,
    seed_user, time};

#[tokio::test]
async fn creator_is_auto_assigned_as_primary() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await;
    let lawyer = seed_user(store.as_ref(), "nadia", UserRole::Lawyer).await;
    let client = seed_client(store.as_ref(), "Client", lawyer.id).await;
    let case = seed_case(store.as_ref(), "Own case", client.id, lawyer.id).await;

    let assignments = store.list_case_assignments(case.id).await?;
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].user_id, lawyer.id);
    assert_eq!(assignments[0].role, AssignmentRole::Primary);

    let visible = store.list_cases_for_user(lawyer.id, lawyer.role).await?;
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, case.id);
    Ok(())
}

#[tokio::test]
async fn non_admins_only_see_assigned_cases() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await;
    let admin = seed_user(store.as_ref(), "admin", UserRole::Admin).await;
    let nadia = seed_user(store.as_ref(), "nadia", UserRole::Lawyer).await;
    let omar = seed_user(store.as_ref(), "omar", UserRole::Lawyer).await;
    let client = seed_client(store.as_ref(), "Client", admin.id).await;
    let case = seed_case(store.as_ref(), "Nadia's case", client.id, nadia.id).await;

    assert_eq!(store.list_cases_for_user(omar.id, omar.role).await?.len(), 0);
    assert_eq!(store.list_cases_for_user(admin.id, admin.role).await?.len(), 1);

    store
        .assign_user_to_case(case.id, omar.id, AssignmentRole::Contributor)
        .await?;
    assert_eq!(store.list_cases_for_user(omar.id, omar.role).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn case_with_no_assignments_is_invisible_to_non_admins() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await;
    let admin = seed_user(store.as_ref(), "admin", UserRole::Admin).await;
    let nadia = seed_user(store.as_ref(), "nadia", UserRole::Lawyer).await;
    let client = seed_client(store.as_ref(), "Client", admin.id).await;
    let case = seed_case(store.as_ref(), "Orphaned case", client.id, nadia.id).await;

    store.remove_case_assignment(case.id, nadia.id).await?;

    assert!(store.list_cases_for_user(nadia.id, nadia.role).await?.is_empty());
    // Admins still see it.
    assert_eq!(store.list_cases_for_user(admin.id, admin.role).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn conflict_probe_flags_double_booked_slots_for_assigned_users_only() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await;
    let nadia = seed_user(store.as_ref(), "nadia", UserRole::Lawyer).await;
    let omar = seed_user(store.as_ref(), "omar", UserRole::Lawyer).await;
    let client = seed_client(store.as_ref(), "Client", nadia.id).await;
    let case_a = seed_case(store.as_ref(), "First hearing", client.id, nadia.id).await;
    let case_b = seed_case(store.as_ref(), "Second hearing", client.id, nadia.id).await;
    seed_session(store.as_ref(), case_a.id, "2025-03-01", "10:00").await;
    seed_session(store.as_ref(), case_b.id, "2025-03-01", "10:00").await;

    let booked = (date("2025-03-01"), time("10:00"));
    assert!(schedule::has_conflict(store.as_ref(), nadia.id, booked.0, booked.1).await?);
    // One session at a slot is a booking, not a conflict.
    assert!(!schedule::has_conflict(store.as_ref(), nadia.id, booked.0, time("10:30")).await?);
    assert!(
        !schedule::has_conflict(store.as_ref(), nadia.id, date("2025-03-02"), booked.1).await?
    );
    // Omar is not assigned to either case, so his calendar is clear.
    assert!(!schedule::has_conflict(store.as_ref(), omar.id, booked.0, booked.1).await?);
    Ok(())
}

#[tokio::test]
async fn conflict_clears_when_one_colliding_session_leaves_scheduled() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await;
    let nadia = seed_user(store.as_ref(), "nadia", UserRole::Lawyer).await;
    let client = seed_client(store.as_ref(), "Client", nadia.id).await;
    let case = seed_case(store.as_ref(), "Hearing case", client.id, nadia.id).await;
    let first = seed_session(store.as_ref(), case.id, "2025-03-01", "10:00").await;
    seed_session(store.as_ref(), case.id, "2025-03-01", "10:00").await;

    let slot = (date("2025-03-01"), time("10:00"));
    assert!(schedule::has_conflict(store.as_ref(), nadia.id, slot.0, slot.1).await?);

    store
        .update_session(
            first.id,
            &UpdateSessionParams {
                status: Some(SessionStatus::Completed),
                ..Default::default()
            },
        )
        .await?;
    assert!(!schedule::has_conflict(store.as_ref(), nadia.id, slot.0, slot.1).await?);

    store
        .update_session(
            first.id,
            &UpdateSessionParams {
                status: Some(SessionStatus::Scheduled),
                ..Default::default()
            },
        )
        .await?;
    assert!(schedule::has_conflict(store.as_ref(), nadia.id, slot.0, slot.1).await?);
    Ok(())
}

#[tokio::test]
async fn dashboard_stats_cover_week_window_and_unpaid_total() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await;
    let admin = seed_user(store.as_ref(), "admin", UserRole::Admin).await;
    let client = seed_client(store.as_ref(), "Client", admin.id).await;
    let active = seed_case(store.as_ref(), "Active case", client.id, admin.id).await;
    let pending = seed_case(store.as_ref(), "Pending case", client.id, admin.id).await;
    store
        .update_case(
            pending.id,
            &UpdateCaseParams {
                status: Some(CaseStatus::Pending),
                ..Default::default()
            },
        )
        .await?;

    // 2025-03-05 is a Wednesday; its week runs 03-03 through 03-09.
    seed_session(store.as_ref(), active.id, "2025-03-04", "09:00").await;
    seed_session(store.as_ref(), active.id, "2025-03-09", "14:00").await;
    seed_session(store.as_ref(), active.id, "2025-03-12", "09:00").await;

    seed_invoice(store.as_ref(), Some(active.id), dec!(150.50), false).await;
    seed_invoice(store.as_ref(), None, dec!(49.50), false).await;
    seed_invoice(store.as_ref(), Some(active.id), dec!(1000), true).await;

    let scope = StatsScope::resolve(UserRole::Assistant);
    let dashboard = stats::dashboard_stats(store.as_ref(), scope, date("2025-03-05")).await?;
    assert_eq!(dashboard.clients, 1);
    assert_eq!(dashboard.active_cases, 1);
    assert_eq!(dashboard.sessions_this_week, 2);
    assert_eq!(dashboard.unpaid_total, dec!(200.00));
    Ok(())
}

#[tokio::test]
async fn sidebar_stats_count_only_open_tasks() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await;
    let admin = seed_user(store.as_ref(), "admin", UserRole::Admin).await;
    seed_task(store.as_ref(), None, Some(admin.id), TaskStatus::Pending).await;
    seed_task(store.as_ref(), None, Some(admin.id), TaskStatus::InProgress).await;
    seed_task(store.as_ref(), None, Some(admin.id), TaskStatus::Completed).await;
    seed_task(store.as_ref(), None, Some(admin.id), TaskStatus::Cancelled).await;

    let scope = StatsScope::resolve(UserRole::Admin);
    let sidebar = stats::sidebar_stats(store.as_ref(), scope).await?;
    assert_eq!(sidebar.open_tasks, 2);
    assert_eq!(sidebar.clients, 0);
    assert_eq!(sidebar.cases, 0);
    Ok(())
}

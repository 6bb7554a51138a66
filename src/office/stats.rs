//! Dashboard and sidebar aggregation.
//!
//! Figures are practice-wide: every role sees the same numbers, even though
//! case listings are scoped per user. `StatsScope::resolve` is the single
//! place that decision lives.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::{StatsStore, UserRole};
use crate::error::StoreError;
use crate::office::schedule::week_window;

/// How widely aggregate figures are drawn. Every role currently resolves
/// to `Practice`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsScope {
    Practice,
}

impl StatsScope {
    pub fn resolve(_role: UserRole) -> Self {
        Self::Practice
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub clients: i64,
    pub active_cases: i64,
    pub sessions_this_week: i64,
    pub unpaid_total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct SidebarStats {
    pub clients: i64,
    pub cases: i64,
    pub sessions: i64,
    pub invoices: i64,
    pub open_tasks: i64,
}

pub async fn dashboard_stats(
    store: &dyn StatsStore,
    _scope: StatsScope,
    today: NaiveDate,
) -> Result<DashboardStats, StoreError> {
    let (week_start, week_end) = week_window(today);
    Ok(DashboardStats {
        clients: store.count_clients().await?,
        active_cases: store.count_active_cases().await?,
        sessions_this_week: store.count_sessions_between(week_start, week_end).await?,
        unpaid_total: store.unpaid_invoice_total().await?,
    })
}

pub async fn sidebar_stats(
    store: &dyn StatsStore,
    _scope: StatsScope,
) -> Result<SidebarStats, StoreError> {
    Ok(SidebarStats {
        clients: store.count_clients().await?,
        cases: store.count_cases().await?,
        sessions: store.count_sessions().await?,
        invoices: store.count_invoices().await?,
        open_tasks: store.count_open_tasks().await?,
    })
}

#[cfg(test)]
mod tests {
    use crate::db::UserRole;

    use super::StatsScope;

    #[test]
    fn every_role_resolves_to_practice_scope() {
        for role in [UserRole::Admin, UserRole::Lawyer, UserRole::Assistant] {
            assert_eq!(StatsScope::resolve(role), StatsScope::Practice);
        }
    }
}

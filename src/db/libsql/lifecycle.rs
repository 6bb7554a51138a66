//! Deletion constraints, ordered cascades, scheduling lookups, and counts.
//!
//! The two cascade orders are hardcoded per parent type. A client cascade
//! hard-deletes invoices under its cases; a direct case deletion decouples
//! them by nulling `case_id` instead. Both run inside a single transaction.

use libsql::params;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::db::{
    CaseCascadeSummary, CaseDependentCounts, ClientCascadeSummary, ClientDependentCounts,
    RetentionStore, ScheduleStore, SessionStatus, StatsStore,
};
use crate::error::StoreError;

use super::{LibSqlBackend, fmt_date, fmt_time, get_i64, get_text};

async fn row_exists(
    conn: &libsql::Connection,
    sql: &str,
    id: &str,
) -> Result<bool, StoreError> {
    Ok(conn.query(sql, params![id]).await?.next().await?.is_some())
}

#[async_trait::async_trait]
impl RetentionStore for LibSqlBackend {
    async fn client_dependent_counts(
        &self,
        client_id: Uuid,
    ) -> Result<ClientDependentCounts, StoreError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                "SELECT \
                   (SELECT COUNT(*) FROM cases WHERE client_id = ?1), \
                   (SELECT COUNT(*) FROM sessions \
                      WHERE case_id IN (SELECT id FROM cases WHERE client_id = ?1)), \
                   (SELECT COUNT(*) FROM documents \
                      WHERE case_id IN (SELECT id FROM cases WHERE client_id = ?1)), \
                   (SELECT COUNT(*) FROM invoices \
                      WHERE case_id IN (SELECT id FROM cases WHERE client_id = ?1)), \
                   (SELECT COUNT(*) FROM tasks \
                      WHERE case_id IN (SELECT id FROM cases WHERE client_id = ?1))",
                params![client_id.to_string()],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| StoreError::Query("failed to count client dependents".to_string()))?;
        Ok(ClientDependentCounts {
            cases: get_i64(&row, 0),
            sessions: get_i64(&row, 1),
            documents: get_i64(&row, 2),
            invoices: get_i64(&row, 3),
            tasks: get_i64(&row, 4),
        })
    }

    async fn case_dependent_counts(
        &self,
        case_id: Uuid,
    ) -> Result<CaseDependentCounts, StoreError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                "SELECT \
                   (SELECT COUNT(*) FROM sessions WHERE case_id = ?1), \
                   (SELECT COUNT(*) FROM documents WHERE case_id = ?1), \
                   (SELECT COUNT(*) FROM invoices WHERE case_id = ?1), \
                   (SELECT COUNT(*) FROM tasks WHERE case_id = ?1)",
                params![case_id.to_string()],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| StoreError::Query("failed to count case dependents".to_string()))?;
        Ok(CaseDependentCounts {
            sessions: get_i64(&row, 0),
            documents: get_i64(&row, 1),
            invoices: get_i64(&row, 2),
            tasks: get_i64(&row, 3),
        })
    }

    async fn delete_client(&self, client_id: Uuid) -> Result<ClientCascadeSummary, StoreError> {
        let conn = self.connect().await?;
        let id_text = client_id.to_string();

        if !row_exists(&conn, "SELECT 1 FROM clients WHERE id = ?1 LIMIT 1", &id_text).await? {
            return Err(StoreError::not_found("client", client_id));
        }

        conn.execute("BEGIN", ()).await?;
        let cascade = async {
            let sessions = conn
                .execute(
                    "DELETE FROM sessions \
                     WHERE case_id IN (SELECT id FROM cases WHERE client_id = ?1)",
                    params![id_text.as_str()],
                )
                .await?;
            let documents = conn
                .execute(
                    "DELETE FROM documents \
                     WHERE case_id IN (SELECT id FROM cases WHERE client_id = ?1)",
                    params![id_text.as_str()],
                )
                .await?;
            // Invoices are hard-deleted on this path only.
            let invoices = conn
                .execute(
                    "DELETE FROM invoices \
                     WHERE case_id IN (SELECT id FROM cases WHERE client_id = ?1)",
                    params![id_text.as_str()],
                )
                .await?;
            let tasks = conn
                .execute(
                    "DELETE FROM tasks \
                     WHERE case_id IN (SELECT id FROM cases WHERE client_id = ?1)",
                    params![id_text.as_str()],
                )
                .await?;
            let assignments = conn
                .execute(
                    "DELETE FROM case_users \
                     WHERE case_id IN (SELECT id FROM cases WHERE client_id = ?1)",
                    params![id_text.as_str()],
                )
                .await?;
            let cases = conn
                .execute(
                    "DELETE FROM cases WHERE client_id = ?1",
                    params![id_text.as_str()],
                )
                .await?;
            conn.execute("DELETE FROM clients WHERE id = ?1", params![id_text.as_str()])
                .await?;
            Ok::<ClientCascadeSummary, StoreError>(ClientCascadeSummary {
                cases,
                sessions,
                documents,
                invoices,
                tasks,
                assignments,
            })
        }
        .await;

        match cascade {
            Ok(summary) => {
                conn.execute("COMMIT", ()).await?;
                tracing::debug!(
                    client_id = %client_id,
                    cases = summary.cases,
                    invoices = summary.invoices,
                    "client cascade complete"
                );
                Ok(summary)
            }
            Err(err) => {
                let _ = conn.execute("ROLLBACK", ()).await;
                Err(err)
            }
        }
    }

    async fn delete_case(&self, case_id: Uuid) -> Result<CaseCascadeSummary, StoreError> {
        let conn = self.connect().await?;
        let id_text = case_id.to_string();

        if !row_exists(&conn, "SELECT 1 FROM cases WHERE id = ?1 LIMIT 1", &id_text).await? {
            return Err(StoreError::not_found("case", case_id));
        }

        conn.execute("BEGIN", ()).await?;
        let cascade = async {
            let assignments = conn
                .execute(
                    "DELETE FROM case_users WHERE case_id = ?1",
                    params![id_text.as_str()],
                )
                .await?;
            let sessions = conn
                .execute(
                    "DELETE FROM sessions WHERE case_id = ?1",
                    params![id_text.as_str()],
                )
                .await?;
            let documents = conn
                .execute(
                    "DELETE FROM documents WHERE case_id = ?1",
                    params![id_text.as_str()],
                )
                .await?;
            // Billing records survive a case deletion as standalone invoices.
            let invoices_decoupled = conn
                .execute(
                    "UPDATE invoices SET case_id = NULL, updated_at = datetime('now') \
                     WHERE case_id = ?1",
                    params![id_text.as_str()],
                )
                .await?;
            let tasks = conn
                .execute(
                    "DELETE FROM tasks WHERE case_id = ?1",
                    params![id_text.as_str()],
                )
                .await?;
            conn.execute("DELETE FROM cases WHERE id = ?1", params![id_text.as_str()])
                .await?;
            Ok::<CaseCascadeSummary, StoreError>(CaseCascadeSummary {
                sessions,
                documents,
                tasks,
                assignments,
                invoices_decoupled,
            })
        }
        .await;

        match cascade {
            Ok(summary) => {
                conn.execute("COMMIT", ()).await?;
                tracing::debug!(
                    case_id = %case_id,
                    invoices_decoupled = summary.invoices_decoupled,
                    "case cascade complete"
                );
                Ok(summary)
            }
            Err(err) => {
                let _ = conn.execute("ROLLBACK", ()).await;
                Err(err)
            }
        }
    }
}

#[async_trait::async_trait]
impl ScheduleStore for LibSqlBackend {
    async fn count_scheduled_sessions_at(
        &self,
        date: chrono::NaiveDate,
        time: chrono::NaiveTime,
        user_id: Uuid,
    ) -> Result<i64, StoreError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                "SELECT COUNT(*) FROM sessions s \
                 JOIN case_users cu ON cu.case_id = s.case_id \
                 WHERE s.session_date = ?1 \
                   AND s.session_time = ?2 \
                   AND s.status = ?3 \
                   AND cu.user_id = ?4",
                params![
                    fmt_date(&date),
                    fmt_time(&time),
                    SessionStatus::Scheduled.as_str(),
                    user_id.to_string(),
                ],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| StoreError::Query("failed to probe session slot".to_string()))?;
        Ok(get_i64(&row, 0))
    }
}

#[async_trait::async_trait]
impl StatsStore for LibSqlBackend {
    async fn count_clients(&self) -> Result<i64, StoreError> {
        self.count_all("SELECT COUNT(*) FROM clients").await
    }

    async fn count_cases(&self) -> Result<i64, StoreError> {
        self.count_all("SELECT COUNT(*) FROM cases").await
    }

    async fn count_active_cases(&self) -> Result<i64, StoreError> {
        self.count_all("SELECT COUNT(*) FROM cases WHERE status = 'active'")
            .await
    }

    async fn count_sessions(&self) -> Result<i64, StoreError> {
        self.count_all("SELECT COUNT(*) FROM sessions").await
    }

    async fn count_sessions_between(
        &self,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    ) -> Result<i64, StoreError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                "SELECT COUNT(*) FROM sessions \
                 WHERE session_date >= ?1 AND session_date <= ?2",
                params![fmt_date(&start), fmt_date(&end)],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| StoreError::Query("count query returned no row".to_string()))?;
        Ok(get_i64(&row, 0))
    }

    async fn count_invoices(&self) -> Result<i64, StoreError> {
        self.count_all("SELECT COUNT(*) FROM invoices").await
    }

    async fn count_open_tasks(&self) -> Result<i64, StoreError> {
        self.count_all("SELECT COUNT(*) FROM tasks WHERE status IN ('pending', 'in_progress')")
            .await
    }

    async fn unpaid_invoice_total(&self) -> Result<Decimal, StoreError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query("SELECT amount FROM invoices WHERE paid = 0", ())
            .await?;
        let mut total = Decimal::ZERO;
        while let Some(row) = rows.next().await? {
            let raw = get_text(&row, 0);
            let amount = raw.parse::<Decimal>().map_err(|e| {
                StoreError::Serialization(format!("invalid invoice amount '{}': {}", raw, e))
            })?;
            total += amount;
        }
        Ok(total)
    }
}

impl LibSqlBackend {
    async fn count_all(&self, sql: &str) -> Result<i64, StoreError> {
        let conn = self.connect().await?;
        let row = conn
            .query(sql, ())
            .await?
            .next()
            .await?
            .ok_or_else(|| StoreError::Query("count query returned no row".to_string()))?;
        Ok(get_i64(&row, 0))
    }
}

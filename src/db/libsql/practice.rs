//! Entity CRUD for the libSQL backend.
//!
//! Conventions shared by every impl here: inserts write `datetime('now')`
//! timestamps and re-select the created row; updates load the existing row,
//! merge the patch, rewrite every column, and re-select; listings default to
//! `created_at DESC` (newest first).

use libsql::params;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::db::{
    ActivityLogRecord, ActivityLogStore, AppendActivityParams, AssignmentRole,
    CaseAssignmentRecord, CaseAssignmentStore, CaseRecord, CaseStatus, CaseStore, ClientRecord,
    ClientStore, CreateCaseParams, CreateClientParams, CreateDocumentParams, CreateInvoiceParams,
    CreateSessionParams, CreateTaskParams, CreateUserParams, DocumentRecord, DocumentStore,
    InvoiceRecord, InvoiceStore, SessionRecord, SessionStatus, SessionStore, TaskPriority,
    TaskRecord, TaskStatus, TaskStore, UpdateCaseParams, UpdateClientParams, UpdateDocumentParams,
    UpdateInvoiceParams, UpdateSessionParams, UpdateTaskParams, UpdateUserParams, UserRecord,
    UserRole, UserStore, require_non_negative_size, require_positive_amount, require_text,
};
use crate::error::StoreError;

use super::{
    LibSqlBackend, fmt_date, fmt_time, get_i64, get_opt_text, get_text, opt_text, opt_text_owned,
    parse_date, parse_time, parse_timestamp,
};

fn parse_uuid(raw: &str, field: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw)
        .map_err(|e| StoreError::Serialization(format!("invalid {} uuid: {}", field, e)))
}

fn parse_opt_uuid(raw: Option<String>, field: &str) -> Result<Option<Uuid>, StoreError> {
    raw.map(|value| parse_uuid(&value, field)).transpose()
}

fn parse_opt_date(raw: Option<String>) -> Result<Option<chrono::NaiveDate>, StoreError> {
    raw.map(|value| parse_date(&value)).transpose()
}

fn parse_user_role(raw: &str) -> Result<UserRole, StoreError> {
    UserRole::from_db_value(raw)
        .ok_or_else(|| StoreError::Serialization(format!("invalid user role '{}'", raw)))
}

fn parse_assignment_role(raw: &str) -> Result<AssignmentRole, StoreError> {
    AssignmentRole::from_db_value(raw)
        .ok_or_else(|| StoreError::Serialization(format!("invalid assignment role '{}'", raw)))
}

fn parse_case_status(raw: &str) -> Result<CaseStatus, StoreError> {
    CaseStatus::from_db_value(raw)
        .ok_or_else(|| StoreError::Serialization(format!("invalid case status '{}'", raw)))
}

fn parse_session_status(raw: &str) -> Result<SessionStatus, StoreError> {
    SessionStatus::from_db_value(raw)
        .ok_or_else(|| StoreError::Serialization(format!("invalid session status '{}'", raw)))
}

fn parse_task_status(raw: &str) -> Result<TaskStatus, StoreError> {
    TaskStatus::from_db_value(raw)
        .ok_or_else(|| StoreError::Serialization(format!("invalid task status '{}'", raw)))
}

fn parse_task_priority(raw: &str) -> Result<TaskPriority, StoreError> {
    TaskPriority::from_db_value(raw)
        .ok_or_else(|| StoreError::Serialization(format!("invalid task priority '{}'", raw)))
}

fn parse_amount(raw: &str) -> Result<Decimal, StoreError> {
    raw.parse::<Decimal>()
        .map_err(|e| StoreError::Serialization(format!("invalid invoice amount '{}': {}", raw, e)))
}

/// Substring pattern for `LOWER(col) LIKE ?1 ESCAPE '\'`; `%`, `_` and `\`
/// in the term match literally.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn parse_details(raw: &str) -> Result<serde_json::Value, StoreError> {
    if raw.trim().is_empty() {
        return Ok(serde_json::json!({}));
    }
    serde_json::from_str(raw).map_err(|e| StoreError::Serialization(e.to_string()))
}

// ==================== Row mappers ====================

const USER_COLUMNS: &str = "id, username, password_hash, name, role, created_at, updated_at";

fn row_to_user_record(row: &libsql::Row) -> Result<UserRecord, StoreError> {
    let role_raw = get_text(row, 4);
    Ok(UserRecord {
        id: parse_uuid(&get_text(row, 0), "users.id")?,
        username: get_text(row, 1),
        password_hash: get_text(row, 2),
        name: get_text(row, 3),
        role: parse_user_role(&role_raw)?,
        created_at: parse_timestamp(&get_text(row, 5))?,
        updated_at: parse_timestamp(&get_text(row, 6))?,
    })
}

const CLIENT_COLUMNS: &str =
    "id, name, email, phone, address, notes, created_by, created_at, updated_at";

fn row_to_client_record(row: &libsql::Row) -> Result<ClientRecord, StoreError> {
    Ok(ClientRecord {
        id: parse_uuid(&get_text(row, 0), "clients.id")?,
        name: get_text(row, 1),
        email: get_opt_text(row, 2),
        phone: get_opt_text(row, 3),
        address: get_opt_text(row, 4),
        notes: get_opt_text(row, 5),
        created_by: parse_uuid(&get_text(row, 6), "clients.created_by")?,
        created_at: parse_timestamp(&get_text(row, 7))?,
        updated_at: parse_timestamp(&get_text(row, 8))?,
    })
}

const CASE_COLUMNS: &str =
    "id, title, case_type, court, status, client_id, created_by, created_at, updated_at";

fn row_to_case_record(row: &libsql::Row) -> Result<CaseRecord, StoreError> {
    let status_raw = get_text(row, 4);
    Ok(CaseRecord {
        id: parse_uuid(&get_text(row, 0), "cases.id")?,
        title: get_text(row, 1),
        case_type: get_text(row, 2),
        court: get_opt_text(row, 3),
        status: parse_case_status(&status_raw)?,
        client_id: parse_uuid(&get_text(row, 5), "cases.client_id")?,
        created_by: parse_uuid(&get_text(row, 6), "cases.created_by")?,
        created_at: parse_timestamp(&get_text(row, 7))?,
        updated_at: parse_timestamp(&get_text(row, 8))?,
    })
}

fn row_to_assignment_record(row: &libsql::Row) -> Result<CaseAssignmentRecord, StoreError> {
    let role_raw = get_text(row, 2);
    Ok(CaseAssignmentRecord {
        case_id: parse_uuid(&get_text(row, 0), "case_users.case_id")?,
        user_id: parse_uuid(&get_text(row, 1), "case_users.user_id")?,
        role: parse_assignment_role(&role_raw)?,
        created_at: parse_timestamp(&get_text(row, 3))?,
    })
}

const SESSION_COLUMNS: &str =
    "id, case_id, session_date, session_time, location, notes, status, created_at, updated_at";

fn row_to_session_record(row: &libsql::Row) -> Result<SessionRecord, StoreError> {
    let status_raw = get_text(row, 6);
    Ok(SessionRecord {
        id: parse_uuid(&get_text(row, 0), "sessions.id")?,
        case_id: parse_uuid(&get_text(row, 1), "sessions.case_id")?,
        session_date: parse_date(&get_text(row, 2))?,
        session_time: parse_time(&get_text(row, 3))?,
        location: get_opt_text(row, 4),
        notes: get_opt_text(row, 5),
        status: parse_session_status(&status_raw)?,
        created_at: parse_timestamp(&get_text(row, 7))?,
        updated_at: parse_timestamp(&get_text(row, 8))?,
    })
}

const DOCUMENT_COLUMNS: &str =
    "id, case_id, title, file_path, file_type, file_size, uploaded_by, created_at, updated_at";

fn row_to_document_record(row: &libsql::Row) -> Result<DocumentRecord, StoreError> {
    Ok(DocumentRecord {
        id: parse_uuid(&get_text(row, 0), "documents.id")?,
        case_id: parse_uuid(&get_text(row, 1), "documents.case_id")?,
        title: get_text(row, 2),
        file_path: get_text(row, 3),
        file_type: get_text(row, 4),
        file_size: get_i64(row, 5),
        uploaded_by: parse_uuid(&get_text(row, 6), "documents.uploaded_by")?,
        created_at: parse_timestamp(&get_text(row, 7))?,
        updated_at: parse_timestamp(&get_text(row, 8))?,
    })
}

const INVOICE_COLUMNS: &str =
    "id, case_id, amount, paid, due_date, paid_date, notes, created_at, updated_at";

fn row_to_invoice_record(row: &libsql::Row) -> Result<InvoiceRecord, StoreError> {
    let amount_raw = get_text(row, 2);
    Ok(InvoiceRecord {
        id: parse_uuid(&get_text(row, 0), "invoices.id")?,
        case_id: parse_opt_uuid(get_opt_text(row, 1), "invoices.case_id")?,
        amount: parse_amount(&amount_raw)?,
        paid: get_i64(row, 3) != 0,
        due_date: parse_opt_date(get_opt_text(row, 4))?,
        paid_date: parse_opt_date(get_opt_text(row, 5))?,
        notes: get_opt_text(row, 6),
        created_at: parse_timestamp(&get_text(row, 7))?,
        updated_at: parse_timestamp(&get_text(row, 8))?,
    })
}

const TASK_COLUMNS: &str = "id, title, description, case_id, assigned_to, status, priority, \
                            due_date, created_at, updated_at";

fn row_to_task_record(row: &libsql::Row) -> Result<TaskRecord, StoreError> {
    let status_raw = get_text(row, 5);
    let priority_raw = get_text(row, 6);
    Ok(TaskRecord {
        id: parse_uuid(&get_text(row, 0), "tasks.id")?,
        title: get_text(row, 1),
        description: get_opt_text(row, 2),
        case_id: parse_opt_uuid(get_opt_text(row, 3), "tasks.case_id")?,
        assigned_to: parse_opt_uuid(get_opt_text(row, 4), "tasks.assigned_to")?,
        status: parse_task_status(&status_raw)?,
        priority: parse_task_priority(&priority_raw)?,
        due_date: parse_opt_date(get_opt_text(row, 7))?,
        created_at: parse_timestamp(&get_text(row, 8))?,
        updated_at: parse_timestamp(&get_text(row, 9))?,
    })
}

const ACTIVITY_COLUMNS: &str = "id, user_id, action, target_type, target_id, details, created_at";

fn row_to_activity_record(row: &libsql::Row) -> Result<ActivityLogRecord, StoreError> {
    Ok(ActivityLogRecord {
        id: parse_uuid(&get_text(row, 0), "activity_log.id")?,
        user_id: parse_uuid(&get_text(row, 1), "activity_log.user_id")?,
        action: get_text(row, 2),
        target_type: get_text(row, 3),
        target_id: get_text(row, 4),
        details: parse_details(&get_text(row, 5))?,
        created_at: parse_timestamp(&get_text(row, 6))?,
    })
}

// ==================== Users ====================

#[async_trait::async_trait]
impl UserStore for LibSqlBackend {
    async fn create_user(&self, input: &CreateUserParams) -> Result<UserRecord, StoreError> {
        let username = require_text("username", &input.username)?;
        let name = require_text("name", &input.name)?;
        require_text("password hash", &input.password_hash)?;

        let conn = self.connect().await?;
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO users (id, username, password_hash, name, role, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'), datetime('now'))",
            params![
                id.as_str(),
                username.as_str(),
                input.password_hash.as_str(),
                name.as_str(),
                input.role.as_str(),
            ],
        )
        .await?;

        let row = conn
            .query(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1 LIMIT 1"),
                params![id.as_str()],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| StoreError::Query("failed to load created user".to_string()))?;
        row_to_user_record(&row)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1 LIMIT 1"),
                params![id.to_string()],
            )
            .await?
            .next()
            .await?;
        row.map(|row| row_to_user_record(&row)).transpose()
    }

    async fn get_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1 LIMIT 1"),
                params![username],
            )
            .await?
            .next()
            .await?;
        row.map(|row| row_to_user_record(&row)).transpose()
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"),
                (),
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_user_record(&row)?);
        }
        Ok(out)
    }

    async fn update_user(
        &self,
        id: Uuid,
        input: &UpdateUserParams,
    ) -> Result<UserRecord, StoreError> {
        let Some(existing) = self.get_user(id).await? else {
            return Err(StoreError::not_found("user", id));
        };

        let merged_username =
            require_text("username", input.username.as_deref().unwrap_or(&existing.username))?;
        let merged_name = require_text("name", input.name.as_deref().unwrap_or(&existing.name))?;
        let merged_hash = input
            .password_hash
            .clone()
            .unwrap_or(existing.password_hash);
        let merged_role = input.role.unwrap_or(existing.role);

        let conn = self.connect().await?;
        conn.execute(
            "UPDATE users SET \
                username = ?2, \
                password_hash = ?3, \
                name = ?4, \
                role = ?5, \
                updated_at = datetime('now') \
             WHERE id = ?1",
            params![
                id.to_string(),
                merged_username,
                merged_hash,
                merged_name,
                merged_role.as_str(),
            ],
        )
        .await?;

        self.get_user(id)
            .await?
            .ok_or_else(|| StoreError::Query("failed to reload updated user".to_string()))
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), StoreError> {
        let conn = self.connect().await?;
        let id_text = id.to_string();

        let row = conn
            .query(
                "SELECT \
                   (SELECT COUNT(*) FROM case_users WHERE user_id = ?1), \
                   (SELECT COUNT(*) FROM tasks WHERE assigned_to = ?1)",
                params![id_text.as_str()],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| StoreError::Query("failed to count user references".to_string()))?;
        let assignments = get_i64(&row, 0);
        let tasks = get_i64(&row, 1);
        if assignments > 0 || tasks > 0 {
            return Err(StoreError::ConstraintViolation(format!(
                "user is still referenced by {} case assignment(s) and {} task(s)",
                assignments, tasks
            )));
        }

        let deleted = conn
            .execute("DELETE FROM users WHERE id = ?1", params![id_text])
            .await?;
        if deleted == 0 {
            return Err(StoreError::not_found("user", id));
        }
        Ok(())
    }
}

// ==================== Clients ====================

#[async_trait::async_trait]
impl ClientStore for LibSqlBackend {
    async fn create_client(&self, input: &CreateClientParams) -> Result<ClientRecord, StoreError> {
        let name = require_text("client name", &input.name)?;

        let conn = self.connect().await?;
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO clients (id, name, email, phone, address, notes, created_by, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, datetime('now'), datetime('now'))",
            params![
                id.as_str(),
                name.as_str(),
                opt_text(input.email.as_deref()),
                opt_text(input.phone.as_deref()),
                opt_text(input.address.as_deref()),
                opt_text(input.notes.as_deref()),
                input.created_by.to_string(),
            ],
        )
        .await?;

        let row = conn
            .query(
                &format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?1 LIMIT 1"),
                params![id.as_str()],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| StoreError::Query("failed to load created client".to_string()))?;
        row_to_client_record(&row)
    }

    async fn get_client(&self, id: Uuid) -> Result<Option<ClientRecord>, StoreError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?1 LIMIT 1"),
                params![id.to_string()],
            )
            .await?
            .next()
            .await?;
        row.map(|row| row_to_client_record(&row)).transpose()
    }

    async fn list_clients(&self) -> Result<Vec<ClientRecord>, StoreError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {CLIENT_COLUMNS} FROM clients ORDER BY created_at DESC"),
                (),
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_client_record(&row)?);
        }
        Ok(out)
    }

    async fn update_client(
        &self,
        id: Uuid,
        input: &UpdateClientParams,
    ) -> Result<ClientRecord, StoreError> {
        let Some(existing) = self.get_client(id).await? else {
            return Err(StoreError::not_found("client", id));
        };

        let merged_name =
            require_text("client name", input.name.as_deref().unwrap_or(&existing.name))?;
        let merged_email = input.email.clone().unwrap_or(existing.email);
        let merged_phone = input.phone.clone().unwrap_or(existing.phone);
        let merged_address = input.address.clone().unwrap_or(existing.address);
        let merged_notes = input.notes.clone().unwrap_or(existing.notes);

        let conn = self.connect().await?;
        conn.execute(
            "UPDATE clients SET \
                name = ?2, \
                email = ?3, \
                phone = ?4, \
                address = ?5, \
                notes = ?6, \
                updated_at = datetime('now') \
             WHERE id = ?1",
            params![
                id.to_string(),
                merged_name,
                opt_text(merged_email.as_deref()),
                opt_text(merged_phone.as_deref()),
                opt_text(merged_address.as_deref()),
                opt_text(merged_notes.as_deref()),
            ],
        )
        .await?;

        self.get_client(id)
            .await?
            .ok_or_else(|| StoreError::Query("failed to reload updated client".to_string()))
    }

    async fn search_clients(&self, term: &str) -> Result<Vec<ClientRecord>, StoreError> {
        let trimmed = term.trim();
        if trimmed.is_empty() {
            return self.list_clients().await;
        }
        let like = like_pattern(trimmed);

        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {CLIENT_COLUMNS} FROM clients \
                     WHERE LOWER(name) LIKE ?1 ESCAPE '\\' \
                        OR LOWER(COALESCE(phone, '')) LIKE ?1 ESCAPE '\\' \
                        OR LOWER(COALESCE(email, '')) LIKE ?1 ESCAPE '\\' \
                     ORDER BY created_at DESC"
                ),
                params![like],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_client_record(&row)?);
        }
        Ok(out)
    }
}

// ==================== Cases ====================

#[async_trait::async_trait]
impl CaseStore for LibSqlBackend {
    async fn create_case(&self, input: &CreateCaseParams) -> Result<CaseRecord, StoreError> {
        let title = require_text("case title", &input.title)?;
        let case_type = require_text("case type", &input.case_type)?;

        let conn = self.connect().await?;
        let id = Uuid::new_v4().to_string();

        // Case row and the creator's primary assignment commit together so
        // the creator can never lose sight of a case they just opened.
        conn.execute("BEGIN", ()).await?;
        let create_result = async {
            conn.execute(
                "INSERT INTO cases (id, title, case_type, court, status, client_id, created_by, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, datetime('now'), datetime('now'))",
                params![
                    id.as_str(),
                    title.as_str(),
                    case_type.as_str(),
                    opt_text(input.court.as_deref()),
                    input.status.as_str(),
                    input.client_id.to_string(),
                    input.created_by.to_string(),
                ],
            )
            .await?;
            conn.execute(
                "INSERT INTO case_users (case_id, user_id, role, created_at) \
                 VALUES (?1, ?2, ?3, datetime('now'))",
                params![
                    id.as_str(),
                    input.created_by.to_string(),
                    AssignmentRole::Primary.as_str(),
                ],
            )
            .await?;
            Ok::<(), StoreError>(())
        }
        .await;

        match create_result {
            Ok(()) => {
                conn.execute("COMMIT", ()).await?;
            }
            Err(err) => {
                let _ = conn.execute("ROLLBACK", ()).await;
                return Err(err);
            }
        }

        let row = conn
            .query(
                &format!("SELECT {CASE_COLUMNS} FROM cases WHERE id = ?1 LIMIT 1"),
                params![id.as_str()],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| StoreError::Query("failed to load created case".to_string()))?;
        row_to_case_record(&row)
    }

    async fn get_case(&self, id: Uuid) -> Result<Option<CaseRecord>, StoreError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!("SELECT {CASE_COLUMNS} FROM cases WHERE id = ?1 LIMIT 1"),
                params![id.to_string()],
            )
            .await?
            .next()
            .await?;
        row.map(|row| row_to_case_record(&row)).transpose()
    }

    async fn list_cases(&self) -> Result<Vec<CaseRecord>, StoreError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {CASE_COLUMNS} FROM cases ORDER BY created_at DESC"),
                (),
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_case_record(&row)?);
        }
        Ok(out)
    }

    async fn list_cases_for_user(
        &self,
        user_id: Uuid,
        role: UserRole,
    ) -> Result<Vec<CaseRecord>, StoreError> {
        if role.sees_all_cases() {
            return self.list_cases().await;
        }

        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                "SELECT c.id, c.title, c.case_type, c.court, c.status, c.client_id, \
                        c.created_by, c.created_at, c.updated_at \
                 FROM cases c \
                 JOIN case_users cu ON cu.case_id = c.id \
                 WHERE cu.user_id = ?1 \
                 ORDER BY c.created_at DESC",
                params![user_id.to_string()],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_case_record(&row)?);
        }
        Ok(out)
    }

    async fn update_case(
        &self,
        id: Uuid,
        input: &UpdateCaseParams,
    ) -> Result<CaseRecord, StoreError> {
        let Some(existing) = self.get_case(id).await? else {
            return Err(StoreError::not_found("case", id));
        };

        let merged_title =
            require_text("case title", input.title.as_deref().unwrap_or(&existing.title))?;
        let merged_type = require_text(
            "case type",
            input.case_type.as_deref().unwrap_or(&existing.case_type),
        )?;
        let merged_court = input.court.clone().unwrap_or(existing.court);
        let merged_status = input.status.unwrap_or(existing.status);
        let merged_client = input.client_id.unwrap_or(existing.client_id);

        let conn = self.connect().await?;
        conn.execute(
            "UPDATE cases SET \
                title = ?2, \
                case_type = ?3, \
                court = ?4, \
                status = ?5, \
                client_id = ?6, \
                updated_at = datetime('now') \
             WHERE id = ?1",
            params![
                id.to_string(),
                merged_title,
                merged_type,
                opt_text(merged_court.as_deref()),
                merged_status.as_str(),
                merged_client.to_string(),
            ],
        )
        .await?;

        self.get_case(id)
            .await?
            .ok_or_else(|| StoreError::Query("failed to reload updated case".to_string()))
    }

    async fn search_cases(&self, term: &str) -> Result<Vec<CaseRecord>, StoreError> {
        let trimmed = term.trim();
        if trimmed.is_empty() {
            return self.list_cases().await;
        }
        let like = like_pattern(trimmed);

        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {CASE_COLUMNS} FROM cases \
                     WHERE LOWER(title) LIKE ?1 ESCAPE '\\' \
                        OR LOWER(case_type) LIKE ?1 ESCAPE '\\' \
                        OR LOWER(COALESCE(court, '')) LIKE ?1 ESCAPE '\\' \
                     ORDER BY created_at DESC"
                ),
                params![like],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_case_record(&row)?);
        }
        Ok(out)
    }
}

// ==================== Case assignments ====================

#[async_trait::async_trait]
impl CaseAssignmentStore for LibSqlBackend {
    async fn assign_user_to_case(
        &self,
        case_id: Uuid,
        user_id: Uuid,
        role: AssignmentRole,
    ) -> Result<CaseAssignmentRecord, StoreError> {
        let conn = self.connect().await?;
        conn.execute(
            "INSERT INTO case_users (case_id, user_id, role, created_at) \
             VALUES (?1, ?2, ?3, datetime('now')) \
             ON CONFLICT (case_id, user_id) DO UPDATE SET role = excluded.role",
            params![case_id.to_string(), user_id.to_string(), role.as_str()],
        )
        .await?;

        let row = conn
            .query(
                "SELECT case_id, user_id, role, created_at FROM case_users \
                 WHERE case_id = ?1 AND user_id = ?2 LIMIT 1",
                params![case_id.to_string(), user_id.to_string()],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| StoreError::Query("failed to load case assignment".to_string()))?;
        row_to_assignment_record(&row)
    }

    async fn remove_case_assignment(
        &self,
        case_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), StoreError> {
        let conn = self.connect().await?;
        let deleted = conn
            .execute(
                "DELETE FROM case_users WHERE case_id = ?1 AND user_id = ?2",
                params![case_id.to_string(), user_id.to_string()],
            )
            .await?;
        if deleted == 0 {
            return Err(StoreError::not_found("case assignment", case_id));
        }
        Ok(())
    }

    async fn list_case_assignments(
        &self,
        case_id: Uuid,
    ) -> Result<Vec<CaseAssignmentRecord>, StoreError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                "SELECT case_id, user_id, role, created_at FROM case_users \
                 WHERE case_id = ?1 ORDER BY created_at ASC",
                params![case_id.to_string()],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_assignment_record(&row)?);
        }
        Ok(out)
    }
}

// ==================== Sessions ====================

#[async_trait::async_trait]
impl SessionStore for LibSqlBackend {
    async fn create_session(
        &self,
        input: &CreateSessionParams,
    ) -> Result<SessionRecord, StoreError> {
        let conn = self.connect().await?;
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO sessions (id, case_id, session_date, session_time, location, notes, status, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, datetime('now'), datetime('now'))",
            params![
                id.as_str(),
                input.case_id.to_string(),
                fmt_date(&input.session_date),
                fmt_time(&input.session_time),
                opt_text(input.location.as_deref()),
                opt_text(input.notes.as_deref()),
                input.status.as_str(),
            ],
        )
        .await?;

        let row = conn
            .query(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1 LIMIT 1"),
                params![id.as_str()],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| StoreError::Query("failed to load created session".to_string()))?;
        row_to_session_record(&row)
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<SessionRecord>, StoreError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1 LIMIT 1"),
                params![id.to_string()],
            )
            .await?
            .next()
            .await?;
        row.map(|row| row_to_session_record(&row)).transpose()
    }

    async fn list_sessions(&self) -> Result<Vec<SessionRecord>, StoreError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions ORDER BY created_at DESC"),
                (),
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_session_record(&row)?);
        }
        Ok(out)
    }

    async fn list_sessions_for_case(
        &self,
        case_id: Uuid,
    ) -> Result<Vec<SessionRecord>, StoreError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {SESSION_COLUMNS} FROM sessions WHERE case_id = ?1 \
                     ORDER BY session_date ASC, session_time ASC"
                ),
                params![case_id.to_string()],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_session_record(&row)?);
        }
        Ok(out)
    }

    async fn update_session(
        &self,
        id: Uuid,
        input: &UpdateSessionParams,
    ) -> Result<SessionRecord, StoreError> {
        let Some(existing) = self.get_session(id).await? else {
            return Err(StoreError::not_found("session", id));
        };

        let merged_date = input.session_date.unwrap_or(existing.session_date);
        let merged_time = input.session_time.unwrap_or(existing.session_time);
        let merged_location = input.location.clone().unwrap_or(existing.location);
        let merged_notes = input.notes.clone().unwrap_or(existing.notes);
        let merged_status = input.status.unwrap_or(existing.status);

        let conn = self.connect().await?;
        conn.execute(
            "UPDATE sessions SET \
                session_date = ?2, \
                session_time = ?3, \
                location = ?4, \
                notes = ?5, \
                status = ?6, \
                updated_at = datetime('now') \
             WHERE id = ?1",
            params![
                id.to_string(),
                fmt_date(&merged_date),
                fmt_time(&merged_time),
                opt_text(merged_location.as_deref()),
                opt_text(merged_notes.as_deref()),
                merged_status.as_str(),
            ],
        )
        .await?;

        self.get_session(id)
            .await?
            .ok_or_else(|| StoreError::Query("failed to reload updated session".to_string()))
    }

    async fn delete_session(&self, id: Uuid) -> Result<(), StoreError> {
        let conn = self.connect().await?;
        let deleted = conn
            .execute("DELETE FROM sessions WHERE id = ?1", params![id.to_string()])
            .await?;
        if deleted == 0 {
            return Err(StoreError::not_found("session", id));
        }
        Ok(())
    }
}

// ==================== Documents ====================

#[async_trait::async_trait]
impl DocumentStore for LibSqlBackend {
    async fn create_document(
        &self,
        input: &CreateDocumentParams,
    ) -> Result<DocumentRecord, StoreError> {
        let title = require_text("document title", &input.title)?;
        let file_path = require_text("file path", &input.file_path)?;
        let file_type = require_text("file type", &input.file_type)?;
        require_non_negative_size(input.file_size)?;

        let conn = self.connect().await?;
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO documents (id, case_id, title, file_path, file_type, file_size, uploaded_by, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, datetime('now'), datetime('now'))",
            params![
                id.as_str(),
                input.case_id.to_string(),
                title.as_str(),
                file_path.as_str(),
                file_type.as_str(),
                input.file_size,
                input.uploaded_by.to_string(),
            ],
        )
        .await?;

        let row = conn
            .query(
                &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1 LIMIT 1"),
                params![id.as_str()],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| StoreError::Query("failed to load created document".to_string()))?;
        row_to_document_record(&row)
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<DocumentRecord>, StoreError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1 LIMIT 1"),
                params![id.to_string()],
            )
            .await?
            .next()
            .await?;
        row.map(|row| row_to_document_record(&row)).transpose()
    }

    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, StoreError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {DOCUMENT_COLUMNS} FROM documents ORDER BY created_at DESC"),
                (),
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_document_record(&row)?);
        }
        Ok(out)
    }

    async fn list_documents_for_case(
        &self,
        case_id: Uuid,
    ) -> Result<Vec<DocumentRecord>, StoreError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE case_id = ?1 \
                     ORDER BY created_at DESC"
                ),
                params![case_id.to_string()],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_document_record(&row)?);
        }
        Ok(out)
    }

    async fn update_document(
        &self,
        id: Uuid,
        input: &UpdateDocumentParams,
    ) -> Result<DocumentRecord, StoreError> {
        let Some(existing) = self.get_document(id).await? else {
            return Err(StoreError::not_found("document", id));
        };

        let merged_title = require_text(
            "document title",
            input.title.as_deref().unwrap_or(&existing.title),
        )?;
        let merged_path = require_text(
            "file path",
            input.file_path.as_deref().unwrap_or(&existing.file_path),
        )?;
        let merged_type = require_text(
            "file type",
            input.file_type.as_deref().unwrap_or(&existing.file_type),
        )?;
        let merged_size = input.file_size.unwrap_or(existing.file_size);
        require_non_negative_size(merged_size)?;

        let conn = self.connect().await?;
        conn.execute(
            "UPDATE documents SET \
                title = ?2, \
                file_path = ?3, \
                file_type = ?4, \
                file_size = ?5, \
                updated_at = datetime('now') \
             WHERE id = ?1",
            params![id.to_string(), merged_title, merged_path, merged_type, merged_size],
        )
        .await?;

        self.get_document(id)
            .await?
            .ok_or_else(|| StoreError::Query("failed to reload updated document".to_string()))
    }

    async fn delete_document(&self, id: Uuid) -> Result<(), StoreError> {
        let conn = self.connect().await?;
        let deleted = conn
            .execute("DELETE FROM documents WHERE id = ?1", params![id.to_string()])
            .await?;
        if deleted == 0 {
            return Err(StoreError::not_found("document", id));
        }
        Ok(())
    }
}

// ==================== Invoices ====================

#[async_trait::async_trait]
impl InvoiceStore for LibSqlBackend {
    async fn create_invoice(
        &self,
        input: &CreateInvoiceParams,
    ) -> Result<InvoiceRecord, StoreError> {
        require_positive_amount(input.amount)?;

        let conn = self.connect().await?;
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO invoices (id, case_id, amount, paid, due_date, paid_date, notes, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, datetime('now'), datetime('now'))",
            params![
                id.as_str(),
                opt_text_owned(input.case_id.map(|v| v.to_string())),
                input.amount.to_string(),
                i64::from(input.paid),
                opt_text_owned(input.due_date.as_ref().map(fmt_date)),
                opt_text_owned(input.paid_date.as_ref().map(fmt_date)),
                opt_text(input.notes.as_deref()),
            ],
        )
        .await?;

        let row = conn
            .query(
                &format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1 LIMIT 1"),
                params![id.as_str()],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| StoreError::Query("failed to load created invoice".to_string()))?;
        row_to_invoice_record(&row)
    }

    async fn get_invoice(&self, id: Uuid) -> Result<Option<InvoiceRecord>, StoreError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1 LIMIT 1"),
                params![id.to_string()],
            )
            .await?
            .next()
            .await?;
        row.map(|row| row_to_invoice_record(&row)).transpose()
    }

    async fn list_invoices(&self) -> Result<Vec<InvoiceRecord>, StoreError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {INVOICE_COLUMNS} FROM invoices ORDER BY created_at DESC"),
                (),
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_invoice_record(&row)?);
        }
        Ok(out)
    }

    async fn list_invoices_for_case(
        &self,
        case_id: Uuid,
    ) -> Result<Vec<InvoiceRecord>, StoreError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {INVOICE_COLUMNS} FROM invoices WHERE case_id = ?1 \
                     ORDER BY created_at DESC"
                ),
                params![case_id.to_string()],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_invoice_record(&row)?);
        }
        Ok(out)
    }

    async fn update_invoice(
        &self,
        id: Uuid,
        input: &UpdateInvoiceParams,
    ) -> Result<InvoiceRecord, StoreError> {
        let Some(existing) = self.get_invoice(id).await? else {
            return Err(StoreError::not_found("invoice", id));
        };

        let merged_case = input.case_id.unwrap_or(existing.case_id);
        let merged_amount = input.amount.unwrap_or(existing.amount);
        require_positive_amount(merged_amount)?;
        let merged_paid = input.paid.unwrap_or(existing.paid);
        let merged_due = input.due_date.unwrap_or(existing.due_date);
        let merged_paid_date = input.paid_date.unwrap_or(existing.paid_date);
        let merged_notes = input.notes.clone().unwrap_or(existing.notes);

        let conn = self.connect().await?;
        conn.execute(
            "UPDATE invoices SET \
                case_id = ?2, \
                amount = ?3, \
                paid = ?4, \
                due_date = ?5, \
                paid_date = ?6, \
                notes = ?7, \
                updated_at = datetime('now') \
             WHERE id = ?1",
            params![
                id.to_string(),
                opt_text_owned(merged_case.map(|v| v.to_string())),
                merged_amount.to_string(),
                i64::from(merged_paid),
                opt_text_owned(merged_due.as_ref().map(fmt_date)),
                opt_text_owned(merged_paid_date.as_ref().map(fmt_date)),
                opt_text(merged_notes.as_deref()),
            ],
        )
        .await?;

        self.get_invoice(id)
            .await?
            .ok_or_else(|| StoreError::Query("failed to reload updated invoice".to_string()))
    }

    async fn delete_invoice(&self, id: Uuid) -> Result<(), StoreError> {
        let conn = self.connect().await?;
        let deleted = conn
            .execute("DELETE FROM invoices WHERE id = ?1", params![id.to_string()])
            .await?;
        if deleted == 0 {
            return Err(StoreError::not_found("invoice", id));
        }
        Ok(())
    }
}

// ==================== Tasks ====================

#[async_trait::async_trait]
impl TaskStore for LibSqlBackend {
    async fn create_task(&self, input: &CreateTaskParams) -> Result<TaskRecord, StoreError> {
        let title = require_text("task title", &input.title)?;

        let conn = self.connect().await?;
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO tasks (id, title, description, case_id, assigned_to, status, priority, due_date, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, datetime('now'), datetime('now'))",
            params![
                id.as_str(),
                title.as_str(),
                opt_text(input.description.as_deref()),
                opt_text_owned(input.case_id.map(|v| v.to_string())),
                opt_text_owned(input.assigned_to.map(|v| v.to_string())),
                input.status.as_str(),
                input.priority.as_str(),
                opt_text_owned(input.due_date.as_ref().map(fmt_date)),
            ],
        )
        .await?;

        let row = conn
            .query(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1 LIMIT 1"),
                params![id.as_str()],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| StoreError::Query("failed to load created task".to_string()))?;
        row_to_task_record(&row)
    }

    async fn get_task(&self, id: Uuid) -> Result<Option<TaskRecord>, StoreError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1 LIMIT 1"),
                params![id.to_string()],
            )
            .await?
            .next()
            .await?;
        row.map(|row| row_to_task_record(&row)).transpose()
    }

    async fn list_tasks(&self) -> Result<Vec<TaskRecord>, StoreError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at DESC"),
                (),
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_task_record(&row)?);
        }
        Ok(out)
    }

    async fn update_task(
        &self,
        id: Uuid,
        input: &UpdateTaskParams,
    ) -> Result<TaskRecord, StoreError> {
        let Some(existing) = self.get_task(id).await? else {
            return Err(StoreError::not_found("task", id));
        };

        let merged_title =
            require_text("task title", input.title.as_deref().unwrap_or(&existing.title))?;
        let merged_description = input.description.clone().unwrap_or(existing.description);
        let merged_case = input.case_id.unwrap_or(existing.case_id);
        let merged_assignee = input.assigned_to.unwrap_or(existing.assigned_to);
        let merged_status = input.status.unwrap_or(existing.status);
        let merged_priority = input.priority.unwrap_or(existing.priority);
        let merged_due = input.due_date.unwrap_or(existing.due_date);

        let conn = self.connect().await?;
        conn.execute(
            "UPDATE tasks SET \
                title = ?2, \
                description = ?3, \
                case_id = ?4, \
                assigned_to = ?5, \
                status = ?6, \
                priority = ?7, \
                due_date = ?8, \
                updated_at = datetime('now') \
             WHERE id = ?1",
            params![
                id.to_string(),
                merged_title,
                opt_text(merged_description.as_deref()),
                opt_text_owned(merged_case.map(|v| v.to_string())),
                opt_text_owned(merged_assignee.map(|v| v.to_string())),
                merged_status.as_str(),
                merged_priority.as_str(),
                opt_text_owned(merged_due.as_ref().map(fmt_date)),
            ],
        )
        .await?;

        self.get_task(id)
            .await?
            .ok_or_else(|| StoreError::Query("failed to reload updated task".to_string()))
    }

    async fn delete_task(&self, id: Uuid) -> Result<(), StoreError> {
        let conn = self.connect().await?;
        let deleted = conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id.to_string()])
            .await?;
        if deleted == 0 {
            return Err(StoreError::not_found("task", id));
        }
        Ok(())
    }
}

// ==================== Activity log ====================

#[async_trait::async_trait]
impl ActivityLogStore for LibSqlBackend {
    async fn append_activity(
        &self,
        input: &AppendActivityParams,
    ) -> Result<ActivityLogRecord, StoreError> {
        let action = require_text("action", &input.action)?;
        let target_type = require_text("target type", &input.target_type)?;
        let details = serde_json::to_string(&input.details)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let conn = self.connect().await?;
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO activity_log (id, user_id, action, target_type, target_id, details, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, datetime('now'))",
            params![
                id.as_str(),
                input.user_id.to_string(),
                action.as_str(),
                target_type.as_str(),
                input.target_id.as_str(),
                details,
            ],
        )
        .await?;

        let row = conn
            .query(
                &format!("SELECT {ACTIVITY_COLUMNS} FROM activity_log WHERE id = ?1 LIMIT 1"),
                params![id.as_str()],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| StoreError::Query("failed to load appended activity".to_string()))?;
        row_to_activity_record(&row)
    }

    async fn list_activity(&self, limit: i64) -> Result<Vec<ActivityLogRecord>, StoreError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {ACTIVITY_COLUMNS} FROM activity_log \
                     ORDER BY created_at DESC LIMIT ?1"
                ),
                params![limit.max(0)],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_activity_record(&row)?);
        }
        Ok(out)
    }

    async fn list_activity_for_target(
        &self,
        target_type: &str,
        target_id: &str,
    ) -> Result<Vec<ActivityLogRecord>, StoreError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {ACTIVITY_COLUMNS} FROM activity_log \
                     WHERE target_type = ?1 AND target_id = ?2 \
                     ORDER BY created_at DESC"
                ),
                params![target_type, target_id],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_activity_record(&row)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_lowercases_and_wraps() {
        assert_eq!(like_pattern("Acme"), "%acme%");
    }

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("c\\d"), "%c\\\\d%");
    }
}

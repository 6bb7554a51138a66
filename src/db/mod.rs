//! Store abstraction layer.
//!
//! Provides a backend-agnostic `Database` trait that unifies all persistence
//! operations for the practice: users, clients, cases, case assignments,
//! sessions, documents, invoices, tasks, and the append-only activity log.
//!
//! The single shipped backend is libSQL (`db::libsql::LibSqlBackend`), either
//! a local file or a remote replica. Consumers hold an `Arc<dyn Database>`;
//! leaf consumers can depend on a specific sub-trait instead.

pub mod libsql;
pub mod libsql_migrations;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::error::StoreError;

/// Create the configured backend, optionally run migrations, and return it.
pub async fn connect_from_config(
    config: &DatabaseConfig,
) -> Result<Arc<dyn Database>, StoreError> {
    use secrecy::ExposeSecret as _;

    let backend = if let Some(ref url) = config.url {
        let token = config.auth_token.as_ref().ok_or_else(|| {
            StoreError::Connection(
                "LEXDESK_DB_AUTH_TOKEN required when LEXDESK_DB_URL is set".to_string(),
            )
        })?;
        libsql::LibSqlBackend::new_remote_replica(&config.db_path, url, token.expose_secret())
            .await?
    } else {
        libsql::LibSqlBackend::new_local(&config.db_path).await?
    };

    if config.migrate_on_connect {
        backend.run_migrations().await?;
    }
    Ok(Arc::new(backend))
}

// ==================== Enums ====================

/// Staff role; admins see every case, everyone else only assigned ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Lawyer,
    Assistant,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Lawyer => "lawyer",
            Self::Assistant => "assistant",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Self::Admin),
            "lawyer" => Some(Self::Lawyer),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }

    /// Admins bypass assignment-based case scoping.
    pub fn sees_all_cases(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Role a staff member plays on a case assignment. The case creator is
/// auto-assigned as `Primary` at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentRole {
    Primary,
    Contributor,
}

impl AssignmentRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Contributor => "contributor",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "primary" => Some(Self::Primary),
            "contributor" => Some(Self::Contributor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Active,
    Pending,
    Completed,
    Cancelled,
}

impl CaseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Scheduled,
    Completed,
    Cancelled,
    Postponed,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Postponed => "postponed",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "scheduled" => Some(Self::Scheduled),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            "postponed" => Some(Self::Postponed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }
}

// ==================== Records & params ====================
//
// Update params use `Option<T>` for "leave unchanged" and `Option<Option<T>>`
// for nullable columns so a patch can explicitly clear them.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUserParams {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub name: Option<String>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateClientParams {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateClientParams {
    pub name: Option<String>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRecord {
    pub id: Uuid,
    pub title: String,
    pub case_type: String,
    pub court: Option<String>,
    pub status: CaseStatus,
    pub client_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateCaseParams {
    pub title: String,
    pub case_type: String,
    pub court: Option<String>,
    pub status: CaseStatus,
    pub client_id: Uuid,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateCaseParams {
    pub title: Option<String>,
    pub case_type: Option<String>,
    pub court: Option<Option<String>>,
    pub status: Option<CaseStatus>,
    pub client_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseAssignmentRecord {
    pub case_id: Uuid,
    pub user_id: Uuid,
    pub role: AssignmentRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub case_id: Uuid,
    pub session_date: NaiveDate,
    pub session_time: NaiveTime,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateSessionParams {
    pub case_id: Uuid,
    pub session_date: NaiveDate,
    pub session_time: NaiveTime,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateSessionParams {
    pub session_date: Option<NaiveDate>,
    pub session_time: Option<NaiveTime>,
    pub location: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub status: Option<SessionStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: Uuid,
    pub case_id: Uuid,
    pub title: String,
    pub file_path: String,
    pub file_type: String,
    pub file_size: i64,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateDocumentParams {
    pub case_id: Uuid,
    pub title: String,
    pub file_path: String,
    pub file_type: String,
    pub file_size: i64,
    pub uploaded_by: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateDocumentParams {
    pub title: Option<String>,
    pub file_path: Option<String>,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub id: Uuid,
    /// Nullable: a standalone invoice, or one decoupled by a case deletion.
    pub case_id: Option<Uuid>,
    pub amount: Decimal,
    pub paid: bool,
    pub due_date: Option<NaiveDate>,
    pub paid_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateInvoiceParams {
    pub case_id: Option<Uuid>,
    pub amount: Decimal,
    pub paid: bool,
    pub due_date: Option<NaiveDate>,
    pub paid_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateInvoiceParams {
    pub case_id: Option<Option<Uuid>>,
    pub amount: Option<Decimal>,
    pub paid: Option<bool>,
    pub due_date: Option<Option<NaiveDate>>,
    pub paid_date: Option<Option<NaiveDate>>,
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub case_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateTaskParams {
    pub title: String,
    pub description: Option<String>,
    pub case_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTaskParams {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub case_id: Option<Option<Uuid>>,
    pub assigned_to: Option<Option<Uuid>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<Option<NaiveDate>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AppendActivityParams {
    pub user_id: Uuid,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    pub details: serde_json::Value,
}

// ==================== Cascade & counting types ====================

/// Dependent-row counts under all of one client's cases. Invoices whose
/// `case_id` is already NULL are never attributed here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClientDependentCounts {
    pub cases: i64,
    pub sessions: i64,
    pub documents: i64,
    pub invoices: i64,
    pub tasks: i64,
}

impl ClientDependentCounts {
    pub fn all_zero(&self) -> bool {
        self.cases == 0
            && self.sessions == 0
            && self.documents == 0
            && self.invoices == 0
            && self.tasks == 0
    }
}

/// Dependent-row counts under a single case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CaseDependentCounts {
    pub sessions: i64,
    pub documents: i64,
    pub invoices: i64,
    pub tasks: i64,
}

/// Rows removed by a client cascade. Invoices are hard-deleted on this path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClientCascadeSummary {
    pub cases: u64,
    pub sessions: u64,
    pub documents: u64,
    pub invoices: u64,
    pub tasks: u64,
    pub assignments: u64,
}

/// Rows removed by a direct case deletion. Invoices are decoupled
/// (`case_id` set to NULL), never deleted on this path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CaseCascadeSummary {
    pub sessions: u64,
    pub documents: u64,
    pub tasks: u64,
    pub assignments: u64,
    pub invoices_decoupled: u64,
}

// ==================== Validation helpers ====================

pub(crate) fn require_text(field: &'static str, raw: &str) -> Result<String, StoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn require_positive_amount(amount: Decimal) -> Result<(), StoreError> {
    if amount <= Decimal::ZERO {
        return Err(StoreError::Validation(
            "invoice amount must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn require_non_negative_size(size: i64) -> Result<(), StoreError> {
    if size < 0 {
        return Err(StoreError::Validation(
            "file size must not be negative".to_string(),
        ));
    }
    Ok(())
}

// ==================== Sub-traits ====================
//
// Each sub-trait groups related persistence methods. The `Database`
// supertrait combines them all.

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, input: &CreateUserParams) -> Result<UserRecord, StoreError>;
    async fn get_user(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError>;
    async fn get_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, StoreError>;
    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError>;
    async fn update_user(
        &self,
        id: Uuid,
        input: &UpdateUserParams,
    ) -> Result<UserRecord, StoreError>;
    /// Fails with `ConstraintViolation` while the user still holds case
    /// assignments or assigned tasks; no cascade covers those references.
    async fn delete_user(&self, id: Uuid) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn create_client(&self, input: &CreateClientParams) -> Result<ClientRecord, StoreError>;
    async fn get_client(&self, id: Uuid) -> Result<Option<ClientRecord>, StoreError>;
    async fn list_clients(&self) -> Result<Vec<ClientRecord>, StoreError>;
    async fn update_client(
        &self,
        id: Uuid,
        input: &UpdateClientParams,
    ) -> Result<ClientRecord, StoreError>;
    /// Case-insensitive substring match across name, phone and email.
    async fn search_clients(&self, term: &str) -> Result<Vec<ClientRecord>, StoreError>;
}

#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Creates the case and the creator's `primary` assignment in one
    /// transaction, so the creator can always see their own case.
    async fn create_case(&self, input: &CreateCaseParams) -> Result<CaseRecord, StoreError>;
    async fn get_case(&self, id: Uuid) -> Result<Option<CaseRecord>, StoreError>;
    async fn list_cases(&self) -> Result<Vec<CaseRecord>, StoreError>;
    /// Admins get every case; everyone else only cases with an assignment
    /// row for them. A case with zero assignments is invisible to every
    /// non-admin.
    async fn list_cases_for_user(
        &self,
        user_id: Uuid,
        role: UserRole,
    ) -> Result<Vec<CaseRecord>, StoreError>;
    async fn update_case(
        &self,
        id: Uuid,
        input: &UpdateCaseParams,
    ) -> Result<CaseRecord, StoreError>;
    /// Case-insensitive substring match across title, type and court.
    async fn search_cases(&self, term: &str) -> Result<Vec<CaseRecord>, StoreError>;
}

#[async_trait]
pub trait CaseAssignmentStore: Send + Sync {
    async fn assign_user_to_case(
        &self,
        case_id: Uuid,
        user_id: Uuid,
        role: AssignmentRole,
    ) -> Result<CaseAssignmentRecord, StoreError>;
    async fn remove_case_assignment(
        &self,
        case_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), StoreError>;
    async fn list_case_assignments(
        &self,
        case_id: Uuid,
    ) -> Result<Vec<CaseAssignmentRecord>, StoreError>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(
        &self,
        input: &CreateSessionParams,
    ) -> Result<SessionRecord, StoreError>;
    async fn get_session(&self, id: Uuid) -> Result<Option<SessionRecord>, StoreError>;
    async fn list_sessions(&self) -> Result<Vec<SessionRecord>, StoreError>;
    async fn list_sessions_for_case(
        &self,
        case_id: Uuid,
    ) -> Result<Vec<SessionRecord>, StoreError>;
    async fn update_session(
        &self,
        id: Uuid,
        input: &UpdateSessionParams,
    ) -> Result<SessionRecord, StoreError>;
    async fn delete_session(&self, id: Uuid) -> Result<(), StoreError>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_document(
        &self,
        input: &CreateDocumentParams,
    ) -> Result<DocumentRecord, StoreError>;
    async fn get_document(&self, id: Uuid) -> Result<Option<DocumentRecord>, StoreError>;
    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, StoreError>;
    async fn list_documents_for_case(
        &self,
        case_id: Uuid,
    ) -> Result<Vec<DocumentRecord>, StoreError>;
    async fn update_document(
        &self,
        id: Uuid,
        input: &UpdateDocumentParams,
    ) -> Result<DocumentRecord, StoreError>;
    async fn delete_document(&self, id: Uuid) -> Result<(), StoreError>;
}

#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn create_invoice(
        &self,
        input: &CreateInvoiceParams,
    ) -> Result<InvoiceRecord, StoreError>;
    async fn get_invoice(&self, id: Uuid) -> Result<Option<InvoiceRecord>, StoreError>;
    async fn list_invoices(&self) -> Result<Vec<InvoiceRecord>, StoreError>;
    async fn list_invoices_for_case(
        &self,
        case_id: Uuid,
    ) -> Result<Vec<InvoiceRecord>, StoreError>;
    async fn update_invoice(
        &self,
        id: Uuid,
        input: &UpdateInvoiceParams,
    ) -> Result<InvoiceRecord, StoreError>;
    async fn delete_invoice(&self, id: Uuid) -> Result<(), StoreError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create_task(&self, input: &CreateTaskParams) -> Result<TaskRecord, StoreError>;
    async fn get_task(&self, id: Uuid) -> Result<Option<TaskRecord>, StoreError>;
    async fn list_tasks(&self) -> Result<Vec<TaskRecord>, StoreError>;
    async fn update_task(
        &self,
        id: Uuid,
        input: &UpdateTaskParams,
    ) -> Result<TaskRecord, StoreError>;
    async fn delete_task(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Append-only by construction: no update or delete methods exist.
#[async_trait]
pub trait ActivityLogStore: Send + Sync {
    async fn append_activity(
        &self,
        input: &AppendActivityParams,
    ) -> Result<ActivityLogRecord, StoreError>;
    async fn list_activity(&self, limit: i64) -> Result<Vec<ActivityLogRecord>, StoreError>;
    async fn list_activity_for_target(
        &self,
        target_type: &str,
        target_id: &str,
    ) -> Result<Vec<ActivityLogRecord>, StoreError>;
}

/// Deletion constraints and the two hardcoded cascade orders. The order per
/// parent type is a deliberate, reviewable contract, not a graph walk.
#[async_trait]
pub trait RetentionStore: Send + Sync {
    async fn client_dependent_counts(
        &self,
        client_id: Uuid,
    ) -> Result<ClientDependentCounts, StoreError>;
    async fn case_dependent_counts(
        &self,
        case_id: Uuid,
    ) -> Result<CaseDependentCounts, StoreError>;
    /// Unconditional ordered cascade, one transaction. Per case: sessions →
    /// documents → invoices (hard delete) → tasks → assignments → case; then
    /// the client row.
    async fn delete_client(&self, client_id: Uuid) -> Result<ClientCascadeSummary, StoreError>;
    /// Ordered cascade, one transaction: assignments → sessions → documents
    /// → invoices decoupled (`case_id = NULL`) → tasks → case row.
    async fn delete_case(&self, case_id: Uuid) -> Result<CaseCascadeSummary, StoreError>;
}

#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Number of `scheduled` sessions at exactly this date and time on cases
    /// assigned to this user. Point-in-time match; a count of two or more
    /// means the slot is double-booked.
    async fn count_scheduled_sessions_at(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        user_id: Uuid,
    ) -> Result<i64, StoreError>;
}

#[async_trait]
pub trait StatsStore: Send + Sync {
    async fn count_clients(&self) -> Result<i64, StoreError>;
    async fn count_cases(&self) -> Result<i64, StoreError>;
    async fn count_active_cases(&self) -> Result<i64, StoreError>;
    async fn count_sessions(&self) -> Result<i64, StoreError>;
    async fn count_sessions_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64, StoreError>;
    async fn count_invoices(&self) -> Result<i64, StoreError>;
    async fn count_open_tasks(&self) -> Result<i64, StoreError>;
    /// Sum of unpaid invoice amounts, folded in Rust to keep decimal
    /// precision (amounts are stored as TEXT).
    async fn unpaid_invoice_total(&self) -> Result<Decimal, StoreError>;
}

/// Backend-agnostic store supertrait combining all sub-traits.
#[async_trait]
pub trait Database:
    UserStore
    + ClientStore
    + CaseStore
    + CaseAssignmentStore
    + SessionStore
    + DocumentStore
    + InvoiceStore
    + TaskStore
    + ActivityLogStore
    + RetentionStore
    + ScheduleStore
    + StatsStore
    + Send
    + Sync
{
    /// Run schema migrations for this backend.
    async fn run_migrations(&self) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{ClientDependentCounts, UserRole, require_positive_amount, require_text};

    #[test]
    fn only_admin_sees_all_cases() {
        assert!(UserRole::Admin.sees_all_cases());
        assert!(!UserRole::Lawyer.sees_all_cases());
        assert!(!UserRole::Assistant.sees_all_cases());
    }

    #[test]
    fn require_text_trims_and_rejects_empty() {
        assert_eq!(require_text("name", "  Khaled  ").expect("valid"), "Khaled");
        assert!(require_text("name", "   ").is_err());
    }

    #[test]
    fn require_positive_amount_rejects_zero_and_negative() {
        assert!(require_positive_amount(Decimal::new(500, 0)).is_ok());
        assert!(require_positive_amount(Decimal::ZERO).is_err());
        assert!(require_positive_amount(Decimal::new(-1, 0)).is_err());
    }

    #[test]
    fn client_counts_all_zero_requires_every_category() {
        assert!(ClientDependentCounts::default().all_zero());
        let counts = ClientDependentCounts {
            invoices: 1,
            ..Default::default()
        };
        assert!(!counts.all_zero());
    }
}

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use tempfile::TempDir;
use uuid::Uuid;

use lexdesk::db::{
    CaseRecord, CaseStatus, ClientRecord, CreateCaseParams, CreateClientParams,
    CreateDocumentParams, CreateInvoiceParams, CreateSessionParams, CreateTaskParams,
    CreateUserParams, Database, DocumentRecord, InvoiceRecord, SessionRecord, SessionStatus,
    TaskPriority, TaskRecord, TaskStatus, UserRecord, UserRole, libsql::LibSqlBackend,
};

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Fresh migrated store backed by a throwaway database file. Keep the
/// `TempDir` alive for the duration of the test.
pub async fn open_store() -> (TempDir, Arc<dyn Database>) {
    init_tracing();
    let dir = tempfile::tempdir().expect("create tempdir");
    let backend = LibSqlBackend::new_local(&dir.path().join("test.db"))
        .await
        .expect("open local database");
    backend.run_migrations().await.expect("run migrations");
    (dir, Arc::new(backend))
}

pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid date literal")
}

pub fn time(raw: &str) -> NaiveTime {
    NaiveTime::parse_from_str(raw, "%H:%M").expect("valid time literal")
}

pub async fn seed_user(store: &dyn Database, username: &str, role: UserRole) -> UserRecord {
    store
        .create_user(&CreateUserParams {
            username: username.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            name: format!("{username} (test)"),
            role,
        })
        .await
        .expect("create user")
}

pub async fn seed_client(store: &dyn Database, name: &str, created_by: Uuid) -> ClientRecord {
    store
        .create_client(&CreateClientParams {
            name: name.to_string(),
            email: None,
            phone: None,
            address: None,
            notes: None,
            created_by,
        })
        .await
        .expect("create client")
}

pub async fn seed_case(
    store: &dyn Database,
    title: &str,
    client_id: Uuid,
    created_by: Uuid,
) -> CaseRecord {
    store
        .create_case(&CreateCaseParams {
            title: title.to_string(),
            case_type: "civil".to_string(),
            court: None,
            status: CaseStatus::Active,
            client_id,
            created_by,
        })
        .await
        .expect("create case")
}

pub async fn seed_session(
    store: &dyn Database,
    case_id: Uuid,
    on: &str,
    at: &str,
) -> SessionRecord {
    store
        .create_session(&CreateSessionParams {
            case_id,
            session_date: date(on),
            session_time: time(at),
            location: None,
            notes: None,
            status: SessionStatus::Scheduled,
        })
        .await
        .expect("create session")
}

pub async fn seed_document(
    store: &dyn Database,
    case_id: Uuid,
    uploaded_by: Uuid,
) -> DocumentRecord {
    store
        .create_document(&CreateDocumentParams {
            case_id,
            title: "filing.pdf".to_string(),
            file_path: "uploads/filing.pdf".to_string(),
            file_type: "application/pdf".to_string(),
            file_size: 2048,
            uploaded_by,
        })
        .await
        .expect("create document")
}

pub async fn seed_invoice(
    store: &dyn Database,
    case_id: Option<Uuid>,
    amount: Decimal,
    paid: bool,
) -> InvoiceRecord {
    store
        .create_invoice(&CreateInvoiceParams {
            case_id,
            amount,
            paid,
            due_date: None,
            paid_date: None,
            notes: None,
        })
        .await
        .expect("create invoice")
}

pub async fn seed_task(
    store: &dyn Database,
    case_id: Option<Uuid>,
    assigned_to: Option<Uuid>,
    status: TaskStatus,
) -> TaskRecord {
    store
        .create_task(&CreateTaskParams {
            title: "prepare brief".to_string(),
            description: None,
            case_id,
            assigned_to,
            status,
            priority: TaskPriority::Medium,
            due_date: None,
        })
        .await
        .expect("create task")
}

//! Ordered schema migrations for the libSQL backend.
//!
//! Applied migrations are tracked by name in `schema_migrations`; each entry
//! runs at most once, in declaration order.

use crate::error::StoreError;

struct Migration {
    name: &'static str,
    statements: &'static [&'static str],
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "0001_practice_schema",
        statements: &[
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                name TEXT NOT NULL,
                role TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            "CREATE TABLE IF NOT EXISTS clients (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT,
                phone TEXT,
                address TEXT,
                notes TEXT,
                created_by TEXT NOT NULL REFERENCES users(id),
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            "CREATE TABLE IF NOT EXISTS cases (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                case_type TEXT NOT NULL,
                court TEXT,
                status TEXT NOT NULL,
                client_id TEXT NOT NULL REFERENCES clients(id),
                created_by TEXT NOT NULL REFERENCES users(id),
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            "CREATE TABLE IF NOT EXISTS case_users (
                case_id TEXT NOT NULL REFERENCES cases(id),
                user_id TEXT NOT NULL REFERENCES users(id),
                role TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (case_id, user_id)
            )",
            "CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                case_id TEXT NOT NULL REFERENCES cases(id),
                session_date TEXT NOT NULL,
                session_time TEXT NOT NULL,
                location TEXT,
                notes TEXT,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            "CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                case_id TEXT NOT NULL REFERENCES cases(id),
                title TEXT NOT NULL,
                file_path TEXT NOT NULL,
                file_type TEXT NOT NULL,
                file_size INTEGER NOT NULL,
                uploaded_by TEXT NOT NULL REFERENCES users(id),
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            "CREATE TABLE IF NOT EXISTS invoices (
                id TEXT PRIMARY KEY,
                case_id TEXT REFERENCES cases(id),
                amount TEXT NOT NULL,
                paid INTEGER NOT NULL DEFAULT 0,
                due_date TEXT,
                paid_date TEXT,
                notes TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            "CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                case_id TEXT REFERENCES cases(id),
                assigned_to TEXT REFERENCES users(id),
                status TEXT NOT NULL,
                priority TEXT NOT NULL,
                due_date TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            "CREATE TABLE IF NOT EXISTS activity_log (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id),
                action TEXT NOT NULL,
                target_type TEXT NOT NULL,
                target_id TEXT NOT NULL,
                details TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
        ],
    },
    Migration {
        name: "0002_lookup_indexes",
        statements: &[
            "CREATE INDEX IF NOT EXISTS idx_cases_client ON cases(client_id)",
            "CREATE INDEX IF NOT EXISTS idx_case_users_user ON case_users(user_id)",
            "CREATE INDEX IF NOT EXISTS idx_sessions_case ON sessions(case_id)",
            "CREATE INDEX IF NOT EXISTS idx_sessions_slot
                ON sessions(session_date, session_time, status)",
            "CREATE INDEX IF NOT EXISTS idx_documents_case ON documents(case_id)",
            "CREATE INDEX IF NOT EXISTS idx_invoices_case ON invoices(case_id)",
            "CREATE INDEX IF NOT EXISTS idx_tasks_case ON tasks(case_id)",
            "CREATE INDEX IF NOT EXISTS idx_tasks_assigned ON tasks(assigned_to)",
            "CREATE INDEX IF NOT EXISTS idx_activity_target
                ON activity_log(target_type, target_id)",
        ],
    },
];

pub(crate) async fn run(conn: &libsql::Connection) -> Result<(), StoreError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await?;

    for migration in MIGRATIONS {
        let applied = conn
            .query(
                "SELECT 1 FROM schema_migrations WHERE name = ?1 LIMIT 1",
                libsql::params![migration.name],
            )
            .await?
            .next()
            .await?
            .is_some();
        if applied {
            continue;
        }

        tracing::debug!(migration = migration.name, "applying schema migration");
        for statement in migration.statements {
            conn.execute(statement, ()).await?;
        }
        conn.execute(
            "INSERT INTO schema_migrations (name) VALUES (?1)",
            libsql::params![migration.name],
        )
        .await?;
    }

    Ok(())
}

//! lexdesk is the storage and service core of a small law-office practice
//! tool: staff accounts, clients, cases and their assignments, court
//! sessions, documents, invoices, tasks, and an append-only activity trail.
//!
//! The `db` module defines the backend-agnostic [`db::Database`] trait and
//! ships a libSQL implementation (local file or remote replica). `office`
//! layers practice behavior on top: audit recording, deletion checks and
//! cascades, scheduling conflict probes, and dashboard aggregation.

pub mod config;
pub mod db;
pub mod error;
pub mod office;

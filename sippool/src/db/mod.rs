//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with PostgreSQL.
//! It follows the Repository pattern to provide clean abstractions over database operations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries & conditional updates)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - database records)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! # Concurrency boundary
//!
//! The `assigned_user_id` column of `sip_configs` is only ever changed through
//! the repository's conditional updates (`UPDATE ... WHERE assigned_user_id IS
//! NULL` / `= expected`). Per record, the database linearizes those
//! transitions; no application-level locks exist, and no assignment state is
//! cached in-process.
//!
//! # Migrations
//!
//! Database migrations are managed by SQLx and located in the `migrations/`
//! directory. The [`crate::migrator`] function provides access to the migrator:
//!
//! ```ignore
//! sippool::migrator().run(&pool).await?;
//! ```

pub mod errors;
pub mod handlers;
pub mod models;

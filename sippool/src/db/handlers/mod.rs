//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection, provides strongly-typed
//! operations, handles query construction and parameter binding, and returns
//! domain models from [`crate::db::models`].
//!
//! # Available Repositories
//!
//! - [`SipConfigs`]: the SIP credential pool - CRUD for provisioning plus the
//!   conditional assign/release updates every assignment decision goes through
//!
//! # Common Pattern
//!
//! ```ignore
//! let mut conn = pool.acquire().await?;
//! let mut repo = SipConfigs::new(&mut conn);
//! let record = repo.get_by_id(7).await?;
//! ```

pub mod repository;
pub mod sip_configs;

pub use repository::Repository;
pub use sip_configs::SipConfigs;

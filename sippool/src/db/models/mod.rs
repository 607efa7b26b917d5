//! Database record models matching table schemas.
//!
//! These structs correspond directly to rows of the `sip_configs` table and to
//! the request shapes the repository accepts. They derive `sqlx::FromRow` where
//! they are produced by queries, and stay distinct from the API models in
//! [`crate::api::models`] so storage and API representations can evolve
//! independently.

pub mod sip_configs;

//! Common type definitions shared across the crate.
//!
//! # ID Types
//!
//! - [`UserId`]: identifier of the user holding a line, issued by the external
//!   authentication service. Trusted input; the pool manager never validates
//!   users beyond what its callers supply.
//! - [`ConfigId`]: identifier of a SIP credential record. Integer, assigned by
//!   the database at provisioning time and immutable thereafter.

use uuid::Uuid;

// Type aliases for IDs
pub type UserId = Uuid;
pub type ConfigId = i64;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

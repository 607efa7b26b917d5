//! Database models for SIP credential records.

use crate::api::models::sip_configs::{SipConfigCreate, SipConfigUpdate, SipTransport};
use crate::types::{ConfigId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for provisioning a new SIP config
#[derive(Debug, Clone)]
pub struct SipConfigCreateDBRequest {
    pub username: String,
    pub password: String,
    pub domain: String,
    pub server: String,
    pub port: i32,
    pub transport: SipTransport,
}

impl From<SipConfigCreate> for SipConfigCreateDBRequest {
    fn from(api: SipConfigCreate) -> Self {
        Self {
            username: api.username,
            password: api.password,
            domain: api.domain,
            server: api.server,
            port: api.port.unwrap_or(5060),
            transport: api.transport.unwrap_or_default(),
        }
    }
}

/// Database request for correcting SIP account fields.
///
/// Only applies while the record is unassigned; the repository enforces that
/// with the same conditional-update discipline as assignment itself.
#[derive(Debug, Clone, Default)]
pub struct SipConfigUpdateDBRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub domain: Option<String>,
    pub server: Option<String>,
    pub port: Option<i32>,
    pub transport: Option<SipTransport>,
}

impl From<SipConfigUpdate> for SipConfigUpdateDBRequest {
    fn from(api: SipConfigUpdate) -> Self {
        Self {
            username: api.username,
            password: api.password,
            domain: api.domain,
            server: api.server,
            port: api.port,
            transport: api.transport,
        }
    }
}

/// The user taking a line: written onto the record on assignment, cleared on release
#[derive(Debug, Clone)]
pub struct AssignmentHolder {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
}

/// Database response for a SIP config row
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct SipConfigDBResponse {
    pub id: ConfigId,
    pub username: String,
    pub password: String,
    pub domain: String,
    pub server: String,
    pub port: i32,
    pub transport: SipTransport,
    pub assigned_user_id: Option<UserId>,
    pub assigned_username: Option<String>,
    pub assigned_email: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SipConfigDBResponse {
    /// A record is available when nobody holds it
    pub fn is_available(&self) -> bool {
        self.assigned_user_id.is_none()
    }
}

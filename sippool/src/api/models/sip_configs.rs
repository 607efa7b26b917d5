//! API request/response models for SIP credential records.

use super::pagination::Pagination;
use crate::db::models::sip_configs::SipConfigDBResponse;
use crate::types::{ConfigId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// SIP transport protocol for a provisioned account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "sip_transport", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum SipTransport {
    #[default]
    Udp,
    Tcp,
    Wss,
}

/// Assignment state filter for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Available,
    Assigned,
}

/// Admin provisioning request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SipConfigCreate {
    pub username: String,
    pub password: String,
    pub domain: String,
    pub server: String,
    /// SIP port (default: 5060)
    pub port: Option<i32>,
    /// Transport protocol (default: UDP)
    pub transport: Option<SipTransport>,
}

/// Admin correction of SIP account fields; only accepted while unassigned
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SipConfigUpdate {
    pub username: Option<String>,
    pub password: Option<String>,
    pub domain: Option<String>,
    pub server: Option<String>,
    pub port: Option<i32>,
    pub transport: Option<SipTransport>,
}

/// A SIP credential record.
///
/// Includes the account credentials: this API is only reachable by the
/// backend, and the assignee needs the password to register its softphone.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SipConfigResponse {
    pub id: ConfigId,
    pub username: String,
    pub password: String,
    pub domain: String,
    pub server: String,
    pub port: i32,
    pub transport: SipTransport,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub assigned_user_id: Option<UserId>,
    pub assigned_username: Option<String>,
    pub assigned_email: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SipConfigDBResponse> for SipConfigResponse {
    fn from(db: SipConfigDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            password: db.password,
            domain: db.domain,
            server: db.server,
            port: db.port,
            transport: db.transport,
            assigned_user_id: db.assigned_user_id,
            assigned_username: db.assigned_username,
            assigned_email: db.assigned_email,
            assigned_at: db.assigned_at,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Query parameters for listing SIP configs
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListSipConfigsQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Filter by assignment state ("available" or "assigned")
    pub status: Option<AssignmentStatus>,
}

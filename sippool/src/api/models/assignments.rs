//! API request models for assignment operations.

use crate::db::models::sip_configs::AssignmentHolder;
use crate::errors::Error;
use crate::types::UserId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of the assign endpoints: who is taking a line.
///
/// `user_id` comes from the external authentication service and is trusted;
/// the shape checks here are the only validation this layer performs.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignRequest {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub username: String,
    pub user_email: String,
}

impl AssignRequest {
    /// Reject malformed payloads before they reach the assignment service
    pub fn validate(&self) -> Result<(), Error> {
        if self.username.trim().is_empty() {
            return Err(Error::BadRequest {
                message: "username must not be empty".to_string(),
            });
        }
        let email = self.user_email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(Error::BadRequest {
                message: "user_email must be a valid email address".to_string(),
            });
        }
        Ok(())
    }
}

impl From<AssignRequest> for AssignmentHolder {
    fn from(api: AssignRequest) -> Self {
        Self {
            user_id: api.user_id,
            username: api.username,
            email: api.user_email,
        }
    }
}

/// Optional body of the release endpoint.
///
/// With `user_id` present the release is owner-checked (self-service); without
/// it the release is an admin force-release.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ReleaseRequest {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub user_id: Option<UserId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn request() -> AssignRequest {
        AssignRequest {
            user_id: Uuid::new_v4(),
            username: "alice".to_string(),
            user_email: "alice@example.com".to_string(),
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_blank_username_rejected() {
        let mut req = request();
        req.username = "  ".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_malformed_email_rejected() {
        let mut req = request();
        req.user_email = "not-an-email".to_string();
        assert!(req.validate().is_err());

        req.user_email = String::new();
        assert!(req.validate().is_err());
    }
}

//! The uniform response envelope carried by every endpoint.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response wrapper: `success` always present, `data` on success, `error` and
/// `code` on failure. Non-2xx statuses always pair with `success: false`
/// (failure envelopes are produced by [`crate::errors::Error::into_response`]).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T: ToSchema> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl<T: ToSchema> ApiResponse<T> {
    /// Successful envelope carrying a payload
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    /// Successful envelope with no payload (e.g. idempotent release of nothing)
    pub fn ok_empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            code: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    struct Payload {
        value: i64,
    }

    #[test]
    fn test_ok_envelope_omits_error_fields() {
        let json = serde_json::to_value(ApiResponse::ok(Payload { value: 7 })).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["value"], 7);
        assert!(json.get("error").is_none());
        assert!(json.get("code").is_none());
    }

    #[test]
    fn test_empty_envelope_has_no_data() {
        let json = serde_json::to_value(ApiResponse::<Payload>::ok_empty()).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("data").is_none());
    }
}

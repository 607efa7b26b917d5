//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! - **Assignments** (`/api/v1/assignments/*`): hand a line to a user, query a
//!   user's current line, give it back on logout/deactivation
//! - **SIP configs** (`/api/v1/sip-configs/*`): admin provisioning and
//!   directed assign/release of individual records
//! - **Stats** (`/api/v1/stats/overview`): pool utilization
//!
//! # Response envelope
//!
//! Every endpoint responds with
//! `{"success": bool, "data"?: T, "error"?: string, "code"?: string}` and a
//! matching HTTP status; see [`models::envelope::ApiResponse`].
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`.
//! API documentation is served at `/docs` when the server is running.

pub mod handlers;
pub mod models;

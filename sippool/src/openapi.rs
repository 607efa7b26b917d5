//! OpenAPI documentation assembly.
//!
//! Collects every annotated handler and schema into one document, served via
//! Scalar at `/docs`.

use crate::api::handlers;
use crate::api::models::{
    assignments::{AssignRequest, ReleaseRequest},
    envelope::ApiResponse,
    sip_configs::{AssignmentStatus, SipConfigCreate, SipConfigResponse, SipConfigUpdate, SipTransport},
};
use crate::stats::PoolStats;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "sippool API",
        description = "SIP credential pool gateway: tracks a finite set of SIP accounts, \
                       atomically hands one to a requesting user, takes it back on \
                       logout/deactivation and reports pool utilization."
    ),
    servers((url = "/api/v1")),
    paths(
        handlers::assignments::assign_next,
        handlers::assignments::get_assignment,
        handlers::assignments::release_for_user,
        handlers::sip_configs::list_sip_configs,
        handlers::sip_configs::create_sip_config,
        handlers::sip_configs::peek_next_available,
        handlers::sip_configs::get_sip_config,
        handlers::sip_configs::update_sip_config,
        handlers::sip_configs::delete_sip_config,
        handlers::sip_configs::assign_sip_config,
        handlers::sip_configs::release_sip_config,
        handlers::stats::overview,
    ),
    components(schemas(
        AssignRequest,
        ReleaseRequest,
        SipConfigCreate,
        SipConfigUpdate,
        SipConfigResponse,
        SipTransport,
        AssignmentStatus,
        PoolStats,
        ApiResponse<SipConfigResponse>,
        ApiResponse<Vec<SipConfigResponse>>,
        ApiResponse<PoolStats>,
    )),
    tags(
        (name = "assignments", description = "Hand a line to a user and take it back"),
        (name = "sip-configs", description = "Admin provisioning and directed assignment of pool records"),
        (name = "stats", description = "Pool utilization")
    )
)]
pub struct ApiDoc;

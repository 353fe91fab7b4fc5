use crate::api::leave_request::{
    AttachmentPayload, CreateLeavePayload, DeletedLeaveListResponse, DeletedLeaveResponse,
    LeaveListResponse, LeaveResponse, PageQuery, Pagination, QuotaResponse, UpdateStatusPayload,
};
use crate::model::{LeaveDecision, LeaveStatus};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Management API",
        version = "1.0.0",
        description = r#"
## Employee Leave Management

This API manages employee leave requests with per-year quota accounting
and an encrypted soft-delete / restore workflow.

### Key Features
- **Leave Requests**
  - Submit requests with optional attachments, list own history
- **Quota Tracking**
  - Per-user-per-year quota, consumed on approval
- **Approval Workflow**
  - Admins approve or reject pending requests
- **Encrypted Trash**
  - Deleted requests keep their payload encrypted in place and can be
    restored by an admin

### Security
All endpoints are protected using **JWT Bearer authentication**.
Admin-only operations require the **admin** role.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave_request::create_leave,
        crate::api::leave_request::my_leaves,
        crate::api::leave_request::my_quota,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::delete_leave,
        crate::api::leave_request::admin_leave_list,
        crate::api::leave_request::deleted_leave_list,
        crate::api::leave_request::update_leave_status,
        crate::api::leave_request::restore_leave,
    ),
    components(
        schemas(
            CreateLeavePayload,
            AttachmentPayload,
            PageQuery,
            LeaveResponse,
            LeaveListResponse,
            Pagination,
            DeletedLeaveResponse,
            DeletedLeaveListResponse,
            QuotaResponse,
            UpdateStatusPayload,
            LeaveStatus,
            LeaveDecision
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave request APIs"),
        (name = "Leave admin", description = "Admin approval and trash APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

use actix_web::{HttpRequest, Responder, web};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::api::error_response;
use crate::auth::auth::AuthUser;
use crate::model::{LeaveDecision, LeaveRequest, Role};
use crate::response;
use crate::service::{AttachmentUpload, CreateLeaveRequest, LeaveService, Page};

const REASON_MIN_LEN: usize = 10;
const REASON_MAX_LEN: usize = 500;
const ATTACHMENT_MAX_BYTES: usize = 5 * 1024 * 1024;
const ALLOWED_ATTACHMENT_EXTENSIONS: [&str; 6] = ["pdf", "jpg", "jpeg", "png", "doc", "docx"];

#[derive(Deserialize, ToSchema)]
pub struct CreateLeavePayload {
    #[schema(example = "2026-03-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-03-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Recovering from minor surgery")]
    pub reason: String,
    pub attachment: Option<AttachmentPayload>,
}

#[derive(Deserialize, ToSchema)]
pub struct AttachmentPayload {
    #[schema(example = "doctor-note.pdf")]
    pub file_name: String,
    /// Base64-encoded file content.
    pub content: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PageQuery {
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Items per page
    pub limit: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveResponse {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 42)]
    pub user_id: u64,
    #[schema(example = "2026-03-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-03-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub reason: String,
    pub attachment: Option<String>,
    #[schema(example = "pending")]
    pub status: String,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl From<LeaveRequest> for LeaveResponse {
    fn from(request: LeaveRequest) -> Self {
        Self {
            id: request.id,
            user_id: request.user_id,
            start_date: request.start_date,
            end_date: request.end_date,
            reason: request.reason,
            attachment: request.attachment,
            status: request.status,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct Pagination {
    #[schema(example = 25)]
    pub total: i64,
    #[schema(example = 3)]
    pub pages: i64,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveResponse>,
    pub pagination: Pagination,
}

#[derive(Serialize, ToSchema)]
pub struct DeletedLeaveResponse {
    pub id: u64,
    pub user_id: u64,
    pub status: String,
    #[schema(format = "date-time", value_type = String)]
    pub deleted_at: Option<DateTime<Utc>>,
    pub note: String,
}

#[derive(Serialize, ToSchema)]
pub struct DeletedLeaveListResponse {
    pub data: Vec<DeletedLeaveResponse>,
    pub pagination: Pagination,
}

#[derive(Serialize, ToSchema)]
pub struct QuotaResponse {
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 12)]
    pub quota_total: i32,
    #[schema(example = 3)]
    pub quota_used: i32,
    #[schema(example = 9)]
    pub quota_remaining: i32,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateStatusPayload {
    #[schema(example = "approved")]
    pub status: LeaveDecision,
}

fn list_response(page: Page<LeaveRequest>) -> LeaveListResponse {
    LeaveListResponse {
        data: page.data.into_iter().map(LeaveResponse::from).collect(),
        pagination: Pagination {
            total: page.total,
            pages: page.pages,
        },
    }
}

fn page_params(query: &PageQuery) -> (u64, u64) {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    (page, limit)
}

/// Boundary validation of the create payload. The service assumes these
/// checks already ran.
fn validate_create(
    payload: &CreateLeavePayload,
) -> Result<Option<AttachmentUpload>, &'static str> {
    if payload.start_date > payload.end_date {
        return Err("start_date cannot be after end_date");
    }

    let reason_len = payload.reason.trim().chars().count();
    if !(REASON_MIN_LEN..=REASON_MAX_LEN).contains(&reason_len) {
        return Err("reason must be between 10 and 500 characters");
    }

    let Some(attachment) = &payload.attachment else {
        return Ok(None);
    };

    let extension_ok = attachment
        .file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| {
            ALLOWED_ATTACHMENT_EXTENSIONS.contains(&ext.to_lowercase().as_str())
        });
    if !extension_ok {
        return Err("attachment type not allowed. Allowed: pdf, jpg, jpeg, png, doc, docx");
    }

    let bytes = STANDARD
        .decode(&attachment.content)
        .map_err(|_| "attachment content must be valid base64")?;
    if bytes.len() > ATTACHMENT_MAX_BYTES {
        return Err("attachment exceeds the 5MB size limit");
    }

    Ok(Some(AttachmentUpload {
        file_name: attachment.file_name.clone(),
        bytes,
    }))
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave/requests",
    request_body(
        content = CreateLeavePayload,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request created", body = LeaveResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Insufficient quota"),
        (status = 409, description = "Dates overlap an approved request")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
#[instrument(
    name = "leave_create",
    skip(service, req, payload),
    fields(user_id = auth.user_id)
)]
pub async fn create_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    req: HttpRequest,
    payload: web::Json<CreateLeavePayload>,
) -> actix_web::Result<impl Responder> {
    let attachment = match validate_create(&payload) {
        Ok(attachment) => attachment,
        Err(message) => return Ok(response::bad_request(&req, message, None)),
    };

    let created = service
        .create_request(
            auth.user_id,
            CreateLeaveRequest {
                start_date: payload.start_date,
                end_date: payload.end_date,
                reason: payload.reason.trim().to_string(),
                attachment,
            },
        )
        .await;

    match created {
        Ok(request) => {
            info!(leave_id = request.id, "Leave request created");
            Ok(response::created(
                &req,
                "Leave request created",
                LeaveResponse::from(request),
            ))
        }
        Err(err) => Ok(error_response(&req, err)),
    }
}

/* =========================
Own requests
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave/requests",
    params(PageQuery),
    responses(
        (status = 200, description = "Paginated list of own requests", body = LeaveListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn my_leaves(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    req: HttpRequest,
    query: web::Query<PageQuery>,
) -> actix_web::Result<impl Responder> {
    let (page, limit) = page_params(&query);

    match service.list_active(Some(auth.user_id), page, limit).await {
        Ok(result) => Ok(response::ok(
            &req,
            "Leave requests fetched",
            list_response(result),
        )),
        Err(err) => Ok(error_response(&req, err)),
    }
}

/* =========================
Own quota
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave/quota",
    responses(
        (status = 200, description = "Quota for the current year", body = QuotaResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn my_quota(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    req: HttpRequest,
) -> actix_web::Result<impl Responder> {
    let year = Utc::now().year();

    match service.ledger().ensure(auth.user_id, year).await {
        Ok(quota) => Ok(response::ok(
            &req,
            "Leave quota fetched",
            QuotaResponse {
                year: quota.year,
                quota_total: quota.quota_total,
                quota_used: quota.quota_used,
                quota_remaining: quota.remaining(),
            },
        )),
        Err(err) => Ok(error_response(&req, err)),
    }
}

/* =========================
Request detail
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave/requests/{id}",
    params(("id" = u64, Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Leave request found", body = LeaveResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    req: HttpRequest,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();

    let request = match service.get_request(id).await {
        Ok(request) => request,
        Err(err) => return Ok(error_response(&req, err)),
    };

    if auth.role == Role::User && request.user_id != auth.user_id {
        return Ok(response::forbidden(
            &req,
            "You do not have access to this leave request",
        ));
    }

    Ok(response::ok(
        &req,
        "Leave request detail fetched",
        LeaveResponse::from(request),
    ))
}

/* =========================
Soft delete (owner or admin)
========================= */
#[utoipa::path(
    delete,
    path = "/api/v1/leave/requests/{id}",
    params(("id" = u64, Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Leave request deleted (payload encrypted)"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn delete_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    req: HttpRequest,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();

    // Ownership is checked against the active row before anything is touched.
    let request = match service.get_request(id).await {
        Ok(request) => request,
        Err(err) => return Ok(error_response(&req, err)),
    };

    if auth.role == Role::User && request.user_id != auth.user_id {
        return Ok(response::forbidden(
            &req,
            "You do not have access to delete this leave request",
        ));
    }

    match service.soft_delete(id).await {
        Ok(()) => Ok(response::ok_message(
            &req,
            "Leave request deleted (payload encrypted)",
        )),
        Err(err) => Ok(error_response(&req, err)),
    }
}

/* =========================
All requests (admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave/admin/requests",
    params(PageQuery),
    responses(
        (status = 200, description = "Paginated list of all active requests", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave admin"
)]
pub async fn admin_leave_list(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    req: HttpRequest,
    query: web::Query<PageQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (page, limit) = page_params(&query);

    match service.list_active(None, page, limit).await {
        Ok(result) => Ok(response::ok(
            &req,
            "All leave requests fetched",
            list_response(result),
        )),
        Err(err) => Ok(error_response(&req, err)),
    }
}

/* =========================
Deleted requests (admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave/admin/requests/deleted",
    params(PageQuery),
    responses(
        (status = 200, description = "Paginated list of soft-deleted requests", body = DeletedLeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave admin"
)]
pub async fn deleted_leave_list(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    req: HttpRequest,
    query: web::Query<PageQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (page, limit) = page_params(&query);

    match service.list_deleted(page, limit).await {
        Ok(result) => {
            let data = result
                .data
                .into_iter()
                .map(|request| DeletedLeaveResponse {
                    id: request.id,
                    user_id: request.user_id,
                    status: request.status,
                    deleted_at: request.deleted_at,
                    note: "Payload is encrypted. Use the restore endpoint to recover the data."
                        .to_string(),
                })
                .collect();

            Ok(response::ok(
                &req,
                "Deleted leave requests fetched",
                DeletedLeaveListResponse {
                    data,
                    pagination: Pagination {
                        total: result.total,
                        pages: result.pages,
                    },
                },
            ))
        }
        Err(err) => Ok(error_response(&req, err)),
    }
}

/* =========================
Approve / reject (admin)
========================= */
#[utoipa::path(
    patch,
    path = "/api/v1/leave/admin/requests/{id}/status",
    params(("id" = u64, Path, description = "Leave request id")),
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, description = "Status updated", body = LeaveResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave admin"
)]
#[instrument(
    name = "leave_update_status",
    skip(service, req, payload),
    fields(admin = %auth.username, leave_id = *path)
)]
pub async fn update_leave_status(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    req: HttpRequest,
    path: web::Path<u64>,
    payload: web::Json<UpdateStatusPayload>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();

    match service.update_status(id, payload.status).await {
        Ok(request) => Ok(response::ok(
            &req,
            "Leave request status updated",
            LeaveResponse::from(request),
        )),
        Err(err) => Ok(error_response(&req, err)),
    }
}

/* =========================
Restore (admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave/admin/requests/{id}/restore",
    params(("id" = u64, Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Leave request restored", body = LeaveResponse),
        (status = 400, description = "Encrypted payload is invalid"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Deleted leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave admin"
)]
pub async fn restore_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    req: HttpRequest,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();

    match service.restore(id).await {
        Ok(request) => Ok(response::ok(
            &req,
            "Leave request restored (payload decrypted)",
            LeaveResponse::from(request),
        )),
        Err(err) => Ok(error_response(&req, err)),
    }
}

//! Uniform response envelope: every handler answers with
//! `{success, message, data?, errors?, meta: {timestamp, request_id}}`.

use actix_web::{HttpRequest, HttpResponse};
use serde::Serialize;
use uuid::Uuid;

#[derive(Serialize)]
pub struct ResponseMeta {
    pub timestamp: String,
    pub request_id: String,
}

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<serde_json::Value>,
    pub meta: ResponseMeta,
}

fn meta(req: &HttpRequest) -> ResponseMeta {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|h| h.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    ResponseMeta {
        timestamp: chrono::Utc::now().to_rfc3339(),
        request_id,
    }
}

fn envelope<T: Serialize>(
    req: &HttpRequest,
    success: bool,
    message: &str,
    data: Option<T>,
    errors: Option<serde_json::Value>,
) -> ApiResponse<T> {
    ApiResponse {
        success,
        message: message.to_string(),
        data,
        errors,
        meta: meta(req),
    }
}

pub fn ok<T: Serialize>(req: &HttpRequest, message: &str, data: T) -> HttpResponse {
    HttpResponse::Ok().json(envelope(req, true, message, Some(data), None))
}

pub fn ok_message(req: &HttpRequest, message: &str) -> HttpResponse {
    HttpResponse::Ok().json(envelope::<()>(req, true, message, None, None))
}

pub fn created<T: Serialize>(req: &HttpRequest, message: &str, data: T) -> HttpResponse {
    HttpResponse::Created().json(envelope(req, true, message, Some(data), None))
}

pub fn bad_request(
    req: &HttpRequest,
    message: &str,
    errors: Option<serde_json::Value>,
) -> HttpResponse {
    HttpResponse::BadRequest().json(envelope::<()>(req, false, message, None, errors))
}

pub fn forbidden(req: &HttpRequest, message: &str) -> HttpResponse {
    HttpResponse::Forbidden().json(envelope::<()>(req, false, message, None, None))
}

pub fn not_found(req: &HttpRequest, message: &str) -> HttpResponse {
    HttpResponse::NotFound().json(envelope::<()>(req, false, message, None, None))
}

pub fn conflict(req: &HttpRequest, message: &str) -> HttpResponse {
    HttpResponse::Conflict().json(envelope::<()>(req, false, message, None, None))
}

pub fn internal_error(req: &HttpRequest, message: &str) -> HttpResponse {
    HttpResponse::InternalServerError().json(envelope::<()>(req, false, message, None, None))
}

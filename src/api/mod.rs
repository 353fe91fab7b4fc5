use actix_web::{HttpRequest, HttpResponse};

use crate::error::LeaveError;
use crate::response;

pub mod leave_request;

/// Maps core failures onto the envelope. Overlap conflicts with existing
/// leave (409), an exhausted quota is a refusal (403), tampered redaction
/// payloads are a client problem (400); everything else is a 500.
pub(crate) fn error_response(req: &HttpRequest, err: LeaveError) -> HttpResponse {
    match err {
        LeaveError::Overlap => response::conflict(
            req,
            "Requested dates overlap an existing approved leave request",
        ),
        LeaveError::InsufficientQuota => {
            response::forbidden(req, "Leave quota is not sufficient for this period")
        }
        LeaveError::NotFound => response::not_found(req, "Leave request not found"),
        LeaveError::DecryptionFailed => response::bad_request(
            req,
            "Encrypted payload is invalid, data cannot be restored",
            None,
        ),
        LeaveError::EncryptionFailed | LeaveError::Storage(_) | LeaveError::File(_) => {
            tracing::error!(error = %err, "Leave operation failed");
            response::internal_error(req, "Internal Server Error")
        }
    }
}

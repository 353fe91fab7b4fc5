//! Reversible redaction of soft-deleted leave requests.
//!
//! A deleted row keeps its encrypted field snapshot inside the `reason`
//! column, prefixed by [`DELETED_SENTINEL`]. The token is
//! `base64(nonce || AES-256-GCM ciphertext)` over the canonical JSON of
//! [`RedactionSnapshot`].

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LeaveError;
use crate::model::LeaveRequest;

/// Marker distinguishing a redacted `reason` value from ordinary text.
pub const DELETED_SENTINEL: &str = "[DELETED]";

const NONCE_LEN: usize = 12;

/// Field snapshot embedded into `reason` on soft delete and written back
/// on restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactionSnapshot {
    pub id: u64,
    pub user_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub attachment: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&LeaveRequest> for RedactionSnapshot {
    fn from(request: &LeaveRequest) -> Self {
        Self {
            id: request.id,
            user_id: request.user_id,
            start_date: request.start_date,
            end_date: request.end_date,
            reason: request.reason.clone(),
            attachment: request.attachment.clone(),
            status: request.status.clone(),
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct RedactionCodec {
    key: [u8; 32],
}

impl RedactionCodec {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Builds a codec from the base64-encoded `APP_KEY` the host supplies.
    pub fn from_base64(encoded: &str) -> anyhow::Result<Self> {
        let bytes = STANDARD.decode(encoded)?;
        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|_| anyhow::anyhow!("APP_KEY must decode to exactly 32 bytes"))?;
        Ok(Self::new(key))
    }

    pub fn encode(&self, snapshot: &RedactionSnapshot) -> Result<String, LeaveError> {
        let plaintext =
            serde_json::to_vec(snapshot).map_err(|_| LeaveError::EncryptionFailed)?;

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_ref())
            .map_err(|_| LeaveError::EncryptionFailed)?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(combined))
    }

    pub fn decode(&self, token: &str) -> Result<RedactionSnapshot, LeaveError> {
        let combined = STANDARD
            .decode(token)
            .map_err(|_| LeaveError::DecryptionFailed)?;

        if combined.len() <= NONCE_LEN {
            return Err(LeaveError::DecryptionFailed);
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| LeaveError::DecryptionFailed)?;

        serde_json::from_slice(&plaintext).map_err(|_| LeaveError::DecryptionFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_snapshot() -> RedactionSnapshot {
        RedactionSnapshot {
            id: 7,
            user_id: 42,
            start_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(),
            reason: "family matters out of town".to_string(),
            attachment: Some("leave_attachments/abc.pdf".to_string()),
            status: "pending".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 2, 20, 9, 30, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2026, 2, 21, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn encode_decode_roundtrip() {
        let codec = RedactionCodec::new([42u8; 32]);
        let snapshot = sample_snapshot();
        let token = codec.encode(&snapshot).unwrap();
        let decoded = codec.decode(&token).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn wrong_key_fails_decode() {
        let codec = RedactionCodec::new([42u8; 32]);
        let other = RedactionCodec::new([99u8; 32]);
        let token = codec.encode(&sample_snapshot()).unwrap();
        assert!(matches!(
            other.decode(&token),
            Err(LeaveError::DecryptionFailed)
        ));
    }

    #[test]
    fn flipped_byte_fails_decode() {
        let codec = RedactionCodec::new([42u8; 32]);
        let token = codec.encode(&sample_snapshot()).unwrap();

        let mut raw = STANDARD.decode(&token).unwrap();
        let mid = raw.len() / 2;
        raw[mid] ^= 0x01;
        let tampered = STANDARD.encode(raw);

        assert!(matches!(
            codec.decode(&tampered),
            Err(LeaveError::DecryptionFailed)
        ));
    }

    #[test]
    fn truncated_token_fails_decode() {
        let codec = RedactionCodec::new([42u8; 32]);
        let token = codec.encode(&sample_snapshot()).unwrap();
        assert!(matches!(
            codec.decode(&token[..8]),
            Err(LeaveError::DecryptionFailed)
        ));
    }

    #[test]
    fn garbage_input_fails_decode() {
        let codec = RedactionCodec::new([42u8; 32]);
        assert!(matches!(
            codec.decode("definitely not base64!!!"),
            Err(LeaveError::DecryptionFailed)
        ));
    }

    #[test]
    fn from_base64_rejects_short_keys() {
        let short = STANDARD.encode([1u8; 16]);
        assert!(RedactionCodec::from_base64(&short).is_err());
    }
}

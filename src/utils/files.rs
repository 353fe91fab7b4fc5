//! Attachment persistence for leave requests.

use std::path::PathBuf;

use uuid::Uuid;

use crate::error::LeaveError;

const ATTACHMENT_DIR: &str = "leave_attachments";

/// Where attachment bytes end up. Injected into the service so tests can
/// point it at a scratch directory.
#[async_trait::async_trait]
pub trait FileStore: Send + Sync {
    /// Persists `bytes` under `file_name` and returns the stored path.
    async fn store(&self, bytes: &[u8], file_name: &str) -> Result<String, LeaveError>;
}

pub struct DiskFileStore {
    root: PathBuf,
}

impl DiskFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait::async_trait]
impl FileStore for DiskFileStore {
    async fn store(&self, bytes: &[u8], file_name: &str) -> Result<String, LeaveError> {
        let dir = self.root.join(ATTACHMENT_DIR);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(file_name), bytes).await?;
        Ok(format!("{ATTACHMENT_DIR}/{file_name}"))
    }
}

/// Random unique name keeping the client file's extension, so concurrent
/// uploads never collide.
pub fn generate_file_name(original: &str) -> String {
    match original.rsplit_once('.') {
        Some((_, extension)) if !extension.is_empty() => {
            format!("{}.{}", Uuid::new_v4(), extension)
        }
        _ => Uuid::new_v4().to_string(),
    }
}

use serde::{Deserialize, Serialize};

/// Claims carried by the bearer tokens this service accepts. Tokens are
/// minted by the identity service fronting the API; we only verify them.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupIn {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginIn {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupOut {
    pub message: String,
    pub user_id: Uuid,
}

/// Login response. `expires_in` is the fixed token lifetime in seconds;
/// the client derives its stored expiry instant from it.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOut {
    pub token: String,
    pub user_id: Uuid,
    pub expires_in: i64,
}

use serde::{Deserialize, Serialize};

/// Signed-in user identity. Held in memory for the session only, never
/// written to the local store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

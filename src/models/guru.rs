use serde::{Deserialize, Serialize};

/// A user-defined AI persona. The server calls these "chatbots" and hands
/// out Mongo-style `_id` fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guru {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub subject: String,
    #[serde(default)]
    pub description: String,
    /// Owning user id.
    pub user: String,
}

/// Denormalized guru copy embedded in every chat session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuruSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub subject: String,
    #[serde(default)]
    pub description: String,
}

impl From<&Guru> for GuruSummary {
    fn from(guru: &Guru) -> Self {
        Self {
            id: guru.id.clone(),
            name: guru.name.clone(),
            subject: guru.subject.clone(),
            description: guru.description.clone(),
        }
    }
}

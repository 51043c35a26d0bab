use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// UUID of the project
    pub id: Uuid,
    /// Name of the project
    pub name: String,
    /// Free text description, may be empty
    #[serde(default)]
    pub description: String,
    /// Created at timestamp of the project
    pub created_at: Timestamp,
    /// Updated at timestamp of the project, advanced on every edit
    pub updated_at: Timestamp,
}

impl Project {
    pub fn new(id: Uuid, name: String, description: String, now: Timestamp) -> Self {
        Self {
            id,
            name,
            description,
            created_at: now,
            updated_at: now,
        }
    }
}

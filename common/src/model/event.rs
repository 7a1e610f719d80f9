use serde::{Deserialize, Serialize};

/// A role label offered by an event, tagged with its display color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRole {
    pub name: String,
    /// Hex color, e.g. `#4ECDC4`.
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub name: String,
    /// Owning organization; every access is scoped by it.
    pub organization_id: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    pub description: Option<String>,
    #[serde(default)]
    pub roles: Vec<EventRole>,
}

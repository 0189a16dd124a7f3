use serde::{Deserialize, Serialize};

/// The authenticated account behind the client token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamMember {
    pub team_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

/// A message in a channel.
///
/// Only `is_pinned` is ever changed on an existing post; the remaining fields
/// are sent back untouched on update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: String,
    pub channel_id: String,
    pub user_id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub create_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<serde_json::Value>,
}

/// A post that has not been created yet.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewPost {
    pub channel_id: String,
    pub user_id: String,
    pub message: String,
    pub is_pinned: bool,
}

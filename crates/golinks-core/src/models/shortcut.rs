use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who can resolve a shortcut besides its creator.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Workspace,
    Public,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Workspace => "workspace",
            Self::Public => "public",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "workspace" => Self::Workspace,
            "public" => Self::Public,
            _ => Self::Private,
        }
    }
}

/// A named link shortcut, e.g. `docs` → `https://example.com/handbook`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Shortcut {
    pub id: String,
    pub creator_id: i64,
    pub name: String,
    pub link: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shortcut {
    pub fn new(creator_id: i64, name: String, link: String) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            creator_id,
            name,
            link,
            title: String::new(),
            description: String::new(),
            visibility: Visibility::Private,
            created_at: now,
            updated_at: now,
        }
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Pro,
}

/// The workspace's current subscription, derived from the stored license key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub plan: Plan,
    /// Maximum number of shortcuts; `None` means unlimited.
    pub shortcut_limit: Option<u32>,
    /// Maximum number of users; `None` means unlimited.
    pub user_limit: Option<u32>,
}

impl Subscription {
    pub fn free() -> Self {
        Self {
            plan: Plan::Free,
            shortcut_limit: Some(100),
            user_limit: Some(5),
        }
    }

    pub fn pro() -> Self {
        Self {
            plan: Plan::Pro,
            shortcut_limit: None,
            user_limit: None,
        }
    }

    /// Derive the subscription from a license key. Key validation is a
    /// collaborator concern; a key with the `pro-` prefix unlocks the pro
    /// plan, anything else falls back to free.
    pub fn from_license_key(key: &str) -> Self {
        if key.starts_with("pro-") && key.len() >= 16 {
            Self::pro()
        } else {
            Self::free()
        }
    }
}

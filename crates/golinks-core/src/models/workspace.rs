use serde::{Deserialize, Serialize};

use super::shortcut::Visibility;

/// Public-facing workspace description. Served without authentication so
/// clients can render a landing page before sign-in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceProfile {
    /// Server version, e.g. `0.1.0`.
    pub version: String,
    /// Whether the workspace already has a host user.
    pub has_host: bool,
}

/// Admin-tunable workspace configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSetting {
    /// Visibility applied to newly created shortcuts when the creator does
    /// not pick one.
    #[serde(default)]
    pub default_visibility: Visibility,
    /// Extra CSS injected into the web frontend.
    #[serde(default)]
    pub custom_style: String,
    /// License key for the subscription service; empty means free plan.
    #[serde(default)]
    pub license_key: String,
}

impl Default for WorkspaceSetting {
    fn default() -> Self {
        Self {
            default_visibility: Visibility::Private,
            custom_style: String::new(),
            license_key: String::new(),
        }
    }
}

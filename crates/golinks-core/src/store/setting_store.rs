use std::collections::HashMap;

use crate::db::Database;
use crate::error::ServerError;
use crate::models::shortcut::Visibility;
use crate::models::workspace::WorkspaceSetting;

const KEY_DEFAULT_VISIBILITY: &str = "default-visibility";
const KEY_CUSTOM_STYLE: &str = "custom-style";
const KEY_LICENSE_KEY: &str = "license-key";

/// Key-value backed workspace settings. Missing keys fall back to the
/// defaults in `WorkspaceSetting::default`.
pub struct SettingStore {
    db: Database,
}

impl SettingStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn get(&self) -> Result<WorkspaceSetting, ServerError> {
        let rows: HashMap<String, String> = self
            .db
            .with_conn_async(move |conn| {
                let mut stmt = conn.prepare("SELECT key, value FROM workspace_settings")?;
                let rows = stmt
                    .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<Result<HashMap<_, _>, _>>()?;
                Ok(rows)
            })
            .await?;

        let mut setting = WorkspaceSetting::default();
        if let Some(v) = rows.get(KEY_DEFAULT_VISIBILITY) {
            setting.default_visibility = Visibility::from_str(v);
        }
        if let Some(v) = rows.get(KEY_CUSTOM_STYLE) {
            setting.custom_style = v.clone();
        }
        if let Some(v) = rows.get(KEY_LICENSE_KEY) {
            setting.license_key = v.clone();
        }
        Ok(setting)
    }

    pub async fn set(&self, setting: &WorkspaceSetting) -> Result<(), ServerError> {
        let pairs = vec![
            (
                KEY_DEFAULT_VISIBILITY.to_string(),
                setting.default_visibility.as_str().to_string(),
            ),
            (KEY_CUSTOM_STYLE.to_string(), setting.custom_style.clone()),
            (KEY_LICENSE_KEY.to_string(), setting.license_key.clone()),
        ];

        self.db
            .with_conn_async(move |conn| {
                for (key, value) in &pairs {
                    conn.execute(
                        "INSERT INTO workspace_settings (key, value) VALUES (?1, ?2)
                         ON CONFLICT (key) DO UPDATE SET value = excluded.value",
                        rusqlite::params![key, value],
                    )?;
                }
                Ok(())
            })
            .await
    }
}

pub mod setting_store;
pub mod shortcut_store;
pub mod token_store;
pub mod user_store;

pub use setting_store::SettingStore;
pub use shortcut_store::ShortcutStore;
pub use token_store::{AccessToken, TokenStore};
pub use user_store::UserStore;

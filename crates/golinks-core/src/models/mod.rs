pub mod shortcut;
pub mod subscription;
pub mod user;
pub mod workspace;

pub use shortcut::{Shortcut, Visibility};
pub use subscription::{Plan, Subscription};
pub use user::{Role, User};
pub use workspace::{WorkspaceProfile, WorkspaceSetting};

//! Business method implementations, grouped per service.
//!
//! Each service module exposes:
//!
//! - `register` — adds its methods to the [`RpcCore`] registry
//! - `routes` — declares its REST route templates (reflection has none)
//!
//! Handlers never look at credentials; authentication and the access
//! policy check happen in the core's interceptor chain before any
//! handler runs.

pub mod reflection;
pub mod shortcut;
pub mod subscription;
pub mod user;
pub mod workspace;

use golinks_core::AppState;

use crate::gateway::{PatternRegistry, PatternRegistryBuilder};
use crate::rpc::RpcCore;

/// Register every service. Reflection goes last so its captured catalogue
/// includes all other methods.
pub fn register_all(core: &mut RpcCore, state: AppState) -> Result<(), String> {
    shortcut::register(core, state.clone())?;
    user::register(core, state.clone())?;
    workspace::register(core, state.clone())?;
    subscription::register(core, state)?;
    reflection::register(core)?;
    Ok(())
}

/// The REST route table for all services, checked for ambiguity.
pub fn pattern_registry() -> Result<PatternRegistry, String> {
    let mut routes = PatternRegistryBuilder::new();
    shortcut::routes(&mut routes)?;
    user::routes(&mut routes)?;
    workspace::routes(&mut routes)?;
    subscription::routes(&mut routes)?;
    routes.build()
}

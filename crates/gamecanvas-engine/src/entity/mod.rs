//! Entity model: templates and their instances.
//!
//! A [`Template`] is the shared definition (update and draw hooks). Each live
//! occurrence is an instance: a lightweight handle ([`InstanceId`]) to an
//! [`InstanceState`] stored flat in the [`World`], tagged with its template.
//! Nesting is one level deep by construction; instances do not own instances.

mod commands;
mod hooks;
mod instance;
mod template;
mod world;

pub use commands::Commands;
pub use hooks::{HookId, HookList};
pub use instance::{InstanceId, InstanceState};
pub use template::{DrawFn, Template, TemplateId, UpdateFn};
pub use world::World;

//! Nested list editing for plate documents.
//!
//! [`EditList`] binds a validated [`ListOptions`] to the list queries, the
//! structural commands, the key policy, and a [`ListPlugin`] that installs
//! the list normalize passes into a [`plate_core::PluginRegistry`].

pub mod commands;
pub mod keys;
pub mod normalize;
mod options;
mod plugin;
pub mod query;

pub use crate::keys::{Key, KeyEvent, ListCommand, ParseKeyError};
pub use crate::options::{CanMerge, ConfigError, ListOptions};
pub use crate::plugin::{EditList, ListPlugin};

mod core;
mod draft;
mod ops;
pub mod path;
mod plugin;

pub use crate::core::*;
pub use crate::draft::*;
pub use crate::ops::*;
pub use crate::path::DirtyPaths;
pub use crate::plugin::*;

//! Construction-time configuration for the list engine.

use std::collections::HashSet;
use std::sync::Arc;

use plate_core::{ElementNode, core_plugins};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decides whether two adjacent list nodes may be joined into one.
pub type CanMerge = Arc<dyn Fn(&ElementNode, &ElementNode) -> bool + Send + Sync>;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// No element kind is recognized as a list.
    #[error("at least one list type is required")]
    EmptyTypes,
    #[error("max_depth must be at least 1, got {0}")]
    MaxDepthTooSmall(usize),
    #[error("list type `{0}` is listed more than once")]
    DuplicateType(String),
    #[error("item type `{0}` is also a list type")]
    ItemIsListType(String),
    #[error("default type `{0}` is also a list type")]
    DefaultIsListType(String),
    /// Unwrapped content would turn back into items.
    #[error("item type and default type are both `{0}`")]
    ItemIsDefault(String),
    /// List and item kinds must not redefine a kind the core registers.
    #[error("`{0}` is already a core node kind")]
    CoreKind(String),
    #[error("invalid list options: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListOptions {
    /// Element kinds treated as lists. The first one is used when a new
    /// list is created without an explicit kind.
    pub types: Vec<String>,
    pub type_item: String,
    pub type_default: String,
    pub max_depth: usize,
    #[serde(skip, default = "same_kind")]
    pub can_merge: CanMerge,
}

fn same_kind() -> CanMerge {
    Arc::new(|a: &ElementNode, b: &ElementNode| a.kind == b.kind)
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            types: vec!["ul_list".to_string(), "ol_list".to_string()],
            type_item: "list_item".to_string(),
            type_default: "paragraph".to_string(),
            max_depth: 6,
            can_merge: same_kind(),
        }
    }
}

impl std::fmt::Debug for ListOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListOptions")
            .field("types", &self.types)
            .field("type_item", &self.type_item)
            .field("type_default", &self.type_default)
            .field("max_depth", &self.max_depth)
            .field("can_merge", &"<fn>")
            .finish()
    }
}

impl ListOptions {
    /// Reads options from JSON using the `types`, `typeItem`,
    /// `typeDefault` and `maxDepth` keys. Missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn type_item(mut self, kind: impl Into<String>) -> Self {
        self.type_item = kind.into();
        self
    }

    pub fn type_default(mut self, kind: impl Into<String>) -> Self {
        self.type_default = kind.into();
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn can_merge(
        mut self,
        can_merge: impl Fn(&ElementNode, &ElementNode) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.can_merge = Arc::new(can_merge);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.types.is_empty() {
            return Err(ConfigError::EmptyTypes);
        }
        if self.max_depth < 1 {
            return Err(ConfigError::MaxDepthTooSmall(self.max_depth));
        }
        let mut seen = HashSet::new();
        for kind in &self.types {
            if !seen.insert(kind.as_str()) {
                return Err(ConfigError::DuplicateType(kind.clone()));
            }
        }
        if seen.contains(self.type_item.as_str()) {
            return Err(ConfigError::ItemIsListType(self.type_item.clone()));
        }
        if seen.contains(self.type_default.as_str()) {
            return Err(ConfigError::DefaultIsListType(self.type_default.clone()));
        }
        if self.type_item == self.type_default {
            return Err(ConfigError::ItemIsDefault(self.type_item.clone()));
        }
        let core_kinds: HashSet<String> = core_plugins()
            .iter()
            .flat_map(|plugin| plugin.node_specs())
            .map(|spec| spec.kind)
            .collect();
        if let Some(kind) = self
            .types
            .iter()
            .chain([&self.type_item])
            .find(|kind| core_kinds.contains(kind.as_str()))
        {
            return Err(ConfigError::CoreKind(kind.clone()));
        }
        Ok(())
    }

    pub fn is_list_kind(&self, kind: &str) -> bool {
        self.types.iter().any(|t| t == kind)
    }

    pub fn is_item_kind(&self, kind: &str) -> bool {
        self.type_item == kind
    }

    /// Kind used for lists created without an explicit kind.
    pub fn default_list_kind(&self) -> &str {
        self.types.first().map(String::as_str).unwrap_or_default()
    }

    pub fn can_merge_lists(&self, a: &ElementNode, b: &ElementNode) -> bool {
        (self.can_merge)(a, b)
    }
}

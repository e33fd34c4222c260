//! Keyboard policy for lists.
//!
//! [`decide`] classifies a key press against the current tree and
//! selection and names the command to run, if any. It never mutates.

use std::str::FromStr;

use plate_core::{Document, Selection};
use thiserror::Error;

use crate::options::ListOptions;
use crate::query;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Enter,
    Tab,
    Backspace,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub shift: bool,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self { key, shift: false }
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("empty key binding")]
pub struct ParseKeyError;

impl FromStr for KeyEvent {
    type Err = ParseKeyError;

    /// Parses bindings like `enter`, `shift-tab` or `Shift+Backspace`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut shift = false;
        let mut key = None;
        for part in s.split(['-', '+']).map(str::trim).filter(|p| !p.is_empty()) {
            match part.to_ascii_lowercase().as_str() {
                "shift" => shift = true,
                "enter" | "return" => key = Some(Key::Enter),
                "tab" => key = Some(Key::Tab),
                "backspace" => key = Some(Key::Backspace),
                other => key = Some(Key::Other(other.to_string())),
            }
        }
        let key = key.ok_or(ParseKeyError)?;
        Ok(Self { key, shift })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListCommand {
    WrapInList,
    UnwrapList,
    ToggleList,
    IncreaseItemDepth,
    DecreaseItemDepth,
    SplitListItem,
}

impl ListCommand {
    pub fn name(self) -> &'static str {
        match self {
            ListCommand::WrapInList => "wrap_in_list",
            ListCommand::UnwrapList => "unwrap_list",
            ListCommand::ToggleList => "toggle_list",
            ListCommand::IncreaseItemDepth => "increase_item_depth",
            ListCommand::DecreaseItemDepth => "decrease_item_depth",
            ListCommand::SplitListItem => "split_list_item",
        }
    }

    /// Registry id, e.g. `list.split_list_item`.
    pub fn id(self) -> String {
        format!("list.{}", self.name())
    }
}

/// The command a key press should run, or `None` to let the host handle it.
pub fn decide(
    options: &ListOptions,
    doc: &Document,
    selection: &Selection,
    event: &KeyEvent,
) -> Option<ListCommand> {
    let decision = match event.key {
        Key::Enter => on_enter(options, doc, selection, event),
        Key::Tab => on_tab(options, doc, selection, event),
        Key::Backspace => on_backspace(options, doc, selection),
        Key::Other(_) => None,
    };
    tracing::trace!(key = ?event.key, shift = event.shift, ?decision, "list key decision");
    decision
}

fn on_enter(
    options: &ListOptions,
    doc: &Document,
    selection: &Selection,
    event: &KeyEvent,
) -> Option<ListCommand> {
    if event.shift || selection.anchor.path != selection.focus.path {
        return None;
    }
    let item = query::current_item(options, doc, selection)?;
    if query::is_item_empty(doc, &item) {
        Some(ListCommand::DecreaseItemDepth)
    } else {
        Some(ListCommand::SplitListItem)
    }
}

fn on_tab(
    options: &ListOptions,
    doc: &Document,
    selection: &Selection,
    event: &KeyEvent,
) -> Option<ListCommand> {
    if !query::is_selection_in_list(options, doc, selection) {
        return None;
    }
    if event.shift {
        Some(ListCommand::DecreaseItemDepth)
    } else {
        Some(ListCommand::IncreaseItemDepth)
    }
}

fn on_backspace(options: &ListOptions, doc: &Document, selection: &Selection) -> Option<ListCommand> {
    if !selection.is_collapsed() {
        return None;
    }
    let item = query::current_item(options, doc, selection)?;
    query::is_at_start_of_item(doc, &selection.focus, &item).then_some(ListCommand::DecreaseItemDepth)
}

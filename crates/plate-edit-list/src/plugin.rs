use std::sync::Arc;

use plate_core::{
    ChildConstraint, CommandError, CommandSpec, Document, Editor, Node, NodeSpec, NormalizePass,
    Path, PlatePlugin, PluginRegistry, QueryError, QuerySpec, RegistryError, Selection,
};
use serde_json::{Value, json};

use crate::commands;
use crate::keys::{self, KeyEvent, ListCommand};
use crate::normalize;
use crate::options::{ConfigError, ListOptions};
use crate::query;

/// The list engine bound to one validated set of options.
#[derive(Debug, Clone)]
pub struct EditList {
    options: Arc<ListOptions>,
}

impl EditList {
    pub fn new(options: ListOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self {
            options: Arc::new(options),
        })
    }

    pub fn options(&self) -> &ListOptions {
        &self.options
    }

    pub fn plugin(&self) -> ListPlugin {
        ListPlugin {
            options: Arc::clone(&self.options),
        }
    }

    /// Core plugins plus this list plugin.
    pub fn registry(&self) -> Result<PluginRegistry, RegistryError> {
        PluginRegistry::with_core([Box::new(self.plugin()) as Box<dyn PlatePlugin>])
    }

    /// An editor over `doc`, normalized once up front.
    pub fn editor(&self, doc: Document, selection: Selection) -> Result<Editor, RegistryError> {
        Ok(Editor::new(doc, selection, self.registry()?))
    }

    pub fn is_list(&self, node: &Node) -> bool {
        query::is_list(&self.options, node)
    }

    pub fn is_item(&self, node: &Node) -> bool {
        query::is_item(&self.options, node)
    }

    pub fn current_item(&self, editor: &Editor) -> Option<Path> {
        query::current_item(&self.options, editor.doc(), editor.selection())
    }

    pub fn current_list(&self, editor: &Editor) -> Option<Path> {
        query::current_list(&self.options, editor.doc(), editor.selection())
    }

    pub fn is_selection_in_list(&self, editor: &Editor) -> bool {
        query::is_selection_in_list(&self.options, editor.doc(), editor.selection())
    }

    pub fn item_depth(&self, editor: &Editor, item: &[usize]) -> usize {
        query::item_depth(&self.options, editor.doc(), item)
    }

    /// Deepest item depth at `range`, or at the selection.
    pub fn deepest_item_depth(&self, editor: &Editor, range: Option<&Selection>) -> usize {
        let range = range.unwrap_or(editor.selection());
        query::deepest_item_depth(&self.options, editor.doc(), range)
    }

    pub fn items_at_range(&self, editor: &Editor, range: Option<&Selection>) -> Vec<Path> {
        let range = range.unwrap_or(editor.selection());
        query::items_at_range(&self.options, editor.doc(), range)
    }

    pub fn topmost_items_at_range(&self, editor: &Editor, range: Option<&Selection>) -> Vec<Path> {
        let range = range.unwrap_or(editor.selection());
        query::topmost_items_at_range(&self.options, editor.doc(), range)
    }

    pub fn list_for_item(&self, editor: &Editor, item: &[usize]) -> Option<Path> {
        query::list_for_item(&self.options, editor.doc(), item)
    }

    pub fn previous_item(&self, editor: &Editor, item: &[usize]) -> Option<Path> {
        query::previous_item(&self.options, editor.doc(), item)
    }

    /// Returns whether the document changed.
    pub fn wrap_in_list(
        &self,
        editor: &mut Editor,
        kind: Option<&str>,
        at: Option<&Selection>,
    ) -> Result<bool, CommandError> {
        commands::commit(editor, ListCommand::WrapInList.name(), |draft| {
            commands::wrap_in_list(&self.options, draft, kind, at)
        })
    }

    pub fn unwrap_list(
        &self,
        editor: &mut Editor,
        at: Option<&Selection>,
    ) -> Result<bool, CommandError> {
        commands::commit(editor, ListCommand::UnwrapList.name(), |draft| {
            commands::unwrap_list(&self.options, draft, at)
        })
    }

    pub fn toggle_list(&self, editor: &mut Editor, kind: Option<&str>) -> Result<bool, CommandError> {
        commands::commit(editor, ListCommand::ToggleList.name(), |draft| {
            commands::toggle_list(&self.options, draft, kind)
        })
    }

    pub fn increase_item_depth(&self, editor: &mut Editor) -> Result<bool, CommandError> {
        commands::commit(editor, ListCommand::IncreaseItemDepth.name(), |draft| {
            commands::increase_item_depth(&self.options, draft)
        })
    }

    pub fn decrease_item_depth(&self, editor: &mut Editor) -> Result<bool, CommandError> {
        commands::commit(editor, ListCommand::DecreaseItemDepth.name(), |draft| {
            commands::decrease_item_depth(&self.options, draft)
        })
    }

    pub fn split_list_item(&self, editor: &mut Editor) -> Result<bool, CommandError> {
        commands::commit(editor, ListCommand::SplitListItem.name(), |draft| {
            commands::split_list_item(&self.options, draft)
        })
    }

    pub fn run(&self, editor: &mut Editor, command: ListCommand) -> Result<bool, CommandError> {
        match command {
            ListCommand::WrapInList => self.wrap_in_list(editor, None, None),
            ListCommand::UnwrapList => self.unwrap_list(editor, None),
            ListCommand::ToggleList => self.toggle_list(editor, None),
            ListCommand::IncreaseItemDepth => self.increase_item_depth(editor),
            ListCommand::DecreaseItemDepth => self.decrease_item_depth(editor),
            ListCommand::SplitListItem => self.split_list_item(editor),
        }
    }

    pub fn decide(&self, editor: &Editor, event: &KeyEvent) -> Option<ListCommand> {
        keys::decide(&self.options, editor.doc(), editor.selection(), event)
    }

    /// Runs the command chosen for `event`. Returns whether the key was
    /// handled, in which case the host must suppress its default action.
    pub fn on_key_down(&self, editor: &mut Editor, event: &KeyEvent) -> Result<bool, CommandError> {
        let Some(command) = self.decide(editor, event) else {
            return Ok(false);
        };
        self.run(editor, command)?;
        Ok(true)
    }
}

pub struct ListPlugin {
    options: Arc<ListOptions>,
}

fn kind_arg(args: Option<&Value>) -> Option<String> {
    args?.get("type")?.as_str().map(str::to_string)
}

fn path_arg(args: Option<&Value>) -> Option<Path> {
    serde_json::from_value(args?.get("path")?.clone()).ok()
}

fn range_arg(args: Option<&Value>) -> Result<Option<Selection>, QueryError> {
    match args.and_then(|a| a.get("range")) {
        None => Ok(None),
        Some(range) => serde_json::from_value(range.clone())
            .map(Some)
            .map_err(|err| QueryError::new(format!("Invalid range: {err}"))),
    }
}

/// `path` from the args, falling back to the current item.
fn item_arg(options: &ListOptions, editor: &Editor, args: Option<&Value>) -> Option<Path> {
    path_arg(args).or_else(|| query::current_item(options, editor.doc(), editor.selection()))
}

impl ListPlugin {
    fn command(
        &self,
        command: ListCommand,
        run: fn(&EditList, &mut Editor, Option<&Value>) -> Result<bool, CommandError>,
    ) -> CommandSpec {
        let list = EditList {
            options: Arc::clone(&self.options),
        };
        CommandSpec::new(command.id(), move |editor, args| {
            run(&list, editor, args.as_ref()).map(|_| ())
        })
    }

    fn query(
        &self,
        id: &str,
        answer: impl Fn(&ListOptions, &Editor, Option<&Value>) -> Result<Value, QueryError>
        + Send
        + Sync
        + 'static,
    ) -> QuerySpec {
        let options = Arc::clone(&self.options);
        QuerySpec::new(id, move |editor, args| answer(&options, editor, args.as_ref()))
    }
}

impl PlatePlugin for ListPlugin {
    fn id(&self) -> &'static str {
        "list"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        let mut specs: Vec<NodeSpec> = self
            .options
            .types
            .iter()
            .map(|kind| NodeSpec::block(kind.clone(), ChildConstraint::BlockOnly))
            .collect();
        specs.push(NodeSpec::block(
            self.options.type_item.clone(),
            ChildConstraint::BlockOnly,
        ));
        specs
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        normalize::passes(&self.options)
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            // Args: {"type"?}
            self.command(ListCommand::WrapInList, |list, editor, args| {
                list.wrap_in_list(editor, kind_arg(args).as_deref(), None)
            }),
            self.command(ListCommand::UnwrapList, |list, editor, _| {
                list.unwrap_list(editor, None)
            }),
            // Args: {"type"?}
            self.command(ListCommand::ToggleList, |list, editor, args| {
                list.toggle_list(editor, kind_arg(args).as_deref())
            }),
            self.command(ListCommand::IncreaseItemDepth, |list, editor, _| {
                list.increase_item_depth(editor)
            }),
            self.command(ListCommand::DecreaseItemDepth, |list, editor, _| {
                list.decrease_item_depth(editor)
            }),
            self.command(ListCommand::SplitListItem, |list, editor, _| {
                list.split_list_item(editor)
            }),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![
            self.query("list.current_item", |options, editor, _| {
                Ok(json!(query::current_item(options, editor.doc(), editor.selection())))
            }),
            self.query("list.current_list", |options, editor, _| {
                Ok(json!(query::current_list(options, editor.doc(), editor.selection())))
            }),
            self.query("list.is_selection_in_list", |options, editor, _| {
                Ok(json!(query::is_selection_in_list(
                    options,
                    editor.doc(),
                    editor.selection()
                )))
            }),
            self.query("list.item_depth", |options, editor, args| {
                let depth = item_arg(options, editor, args)
                    .map_or(0, |item| query::item_depth(options, editor.doc(), &item));
                Ok(json!(depth))
            }),
            self.query("list.deepest_item_depth", |options, editor, args| {
                let range = range_arg(args)?.unwrap_or_else(|| editor.selection().clone());
                Ok(json!(query::deepest_item_depth(options, editor.doc(), &range)))
            }),
            self.query("list.items_at_range", |options, editor, args| {
                let range = range_arg(args)?.unwrap_or_else(|| editor.selection().clone());
                Ok(json!(query::items_at_range(options, editor.doc(), &range)))
            }),
            self.query("list.topmost_items_at_range", |options, editor, args| {
                let range = range_arg(args)?.unwrap_or_else(|| editor.selection().clone());
                Ok(json!(query::topmost_items_at_range(
                    options,
                    editor.doc(),
                    &range
                )))
            }),
            self.query("list.list_for_item", |options, editor, args| {
                let list = item_arg(options, editor, args)
                    .and_then(|item| query::list_for_item(options, editor.doc(), &item));
                Ok(json!(list))
            }),
            self.query("list.previous_item", |options, editor, args| {
                let prev = item_arg(options, editor, args)
                    .and_then(|item| query::previous_item(options, editor.doc(), &item));
                Ok(json!(prev))
            }),
            self.query("list.is_list", |options, editor, args| {
                let path = path_arg(args).ok_or_else(|| QueryError::new("Missing `path`"))?;
                Ok(json!(query::is_list_at(options, editor.doc(), &path)))
            }),
            self.query("list.is_item", |options, editor, args| {
                let path = path_arg(args).ok_or_else(|| QueryError::new("Missing `path`"))?;
                Ok(json!(query::is_item_at(options, editor.doc(), &path)))
            }),
        ]
    }
}

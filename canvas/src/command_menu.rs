//! The `@` command menu: trigger detection, filtering, keyboard navigation,
//! and the text edit a chosen item turns into.
//!
//! The menu does not edit text itself. A commit yields an [`Insertion`] that
//! the host applies to its text surface: delete the `@filter` run, then
//! insert the item's text.

#[cfg(test)]
#[path = "command_menu_test.rs"]
mod command_menu_test;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::macros::format_description;

use crate::camera::Point;
use crate::input::Key;

/// Gap between the caret's bottom edge and the menu.
const CARET_GAP: f64 = 5.0;
/// Inline template that inserts the current date and time.
const NOW_TEMPLATE: &str = "now";
/// Action that opens the reminder dialog instead of inserting text.
const REMINDER_ACTION: &str = "reminder";

/// A text template offered by the addon service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub pattern: Option<String>,
    /// Inline templates insert a short run of text rather than a block.
    #[serde(default)]
    pub is_inline: bool,
    #[serde(default)]
    pub content: Option<String>,
}

/// An action offered by the addon service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandAction {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
}

/// Everything the menu can offer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandCatalog {
    #[serde(default)]
    pub templates: Vec<CommandTemplate>,
    #[serde(default)]
    pub actions: Vec<CommandAction>,
}

impl CommandCatalog {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty() && self.actions.is_empty()
    }

    /// Templates then actions whose name contains `filter`, ignoring case.
    #[must_use]
    pub fn matching(&self, filter: &str) -> Vec<CommandItem<'_>> {
        let needle = filter.to_lowercase();
        let hit = |name: &str| needle.is_empty() || name.to_lowercase().contains(&needle);
        self.templates
            .iter()
            .filter(|t| hit(&t.name))
            .map(CommandItem::Template)
            .chain(self.actions.iter().filter(|a| hit(&a.name)).map(CommandItem::Action))
            .collect()
    }
}

/// One row of the menu.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandItem<'a> {
    Template(&'a CommandTemplate),
    Action(&'a CommandAction),
}

impl CommandItem<'_> {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Template(t) => &t.name,
            Self::Action(a) => &a.name,
        }
    }

    #[must_use]
    pub fn icon(&self) -> Option<&str> {
        match self {
            Self::Template(t) => t.icon.as_deref(),
            Self::Action(a) => a.icon.as_deref(),
        }
    }
}

/// Text edit produced by choosing a menu item.
#[derive(Debug, Clone, PartialEq)]
pub struct Insertion {
    /// Text surface range to delete: the `@` and the filter typed after it.
    pub delete_from: usize,
    pub delete_to: usize,
    /// Content to insert at `delete_from`. Empty for the reminder action.
    pub text: String,
    /// Set when the reminder dialog should open, anchored here.
    pub reminder_anchor: Option<Point>,
}

/// The open menu.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandMenu {
    /// Text position of the `@`.
    pub at: usize,
    pub filter: String,
    pub selected: usize,
    /// Screen anchor below the caret.
    pub anchor: Point,
}

/// Format `now` as `Sat, Oct 17, 2026, 9:05 AM`.
///
/// # Errors
///
/// Fails if `now` cannot be rendered with the format description.
pub fn format_now(now: OffsetDateTime) -> Result<String, time::error::Format> {
    let fmt = format_description!(
        "[weekday repr:short], [month repr:short] [day padding:none], [year], [hour repr:12 padding:none]:[minute] [period]"
    );
    now.format(&fmt)
}

impl CommandMenu {
    fn insertion(&self, item: CommandItem<'_>, now: OffsetDateTime) -> Insertion {
        let mut edit = Insertion {
            delete_from: self.at,
            delete_to: self.at + 1 + self.filter.chars().count(),
            text: String::new(),
            reminder_anchor: None,
        };
        match item {
            CommandItem::Template(t) if t.is_inline => {
                let pattern = t.pattern.clone().unwrap_or_default();
                edit.text = if t.id == NOW_TEMPLATE { format_now(now).unwrap_or(pattern) } else { pattern };
            }
            CommandItem::Template(t) => edit.text = t.content.clone().unwrap_or_default(),
            CommandItem::Action(a) if a.id == REMINDER_ACTION => edit.reminder_anchor = Some(self.anchor),
            CommandItem::Action(a) => {
                edit.text = match &a.template {
                    Some(template) => template.clone(),
                    None => format!("{} ", a.pattern.as_deref().unwrap_or_default()),
                };
            }
        }
        edit
    }
}

/// What a text or key event did to the menu.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuOutcome {
    /// The event is not the menu's; let the text surface handle it.
    Ignored,
    Opened,
    /// Filter or selection changed.
    Updated,
    Closed,
    Commit(Insertion),
}

/// Watches a text surface for `@` and drives the menu.
#[derive(Debug, Clone, Default)]
pub struct CommandTrigger {
    catalog: CommandCatalog,
    menu: Option<CommandMenu>,
}

impl CommandTrigger {
    #[must_use]
    pub fn new(catalog: CommandCatalog) -> Self {
        Self { catalog, menu: None }
    }

    pub fn set_catalog(&mut self, catalog: CommandCatalog) {
        self.catalog = catalog;
    }

    #[must_use]
    pub fn catalog(&self) -> &CommandCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn menu(&self) -> Option<&CommandMenu> {
        self.menu.as_ref()
    }

    /// Items matching the current filter; empty when closed.
    #[must_use]
    pub fn items(&self) -> Vec<CommandItem<'_>> {
        self.menu.as_ref().map(|m| self.catalog.matching(&m.filter)).unwrap_or_default()
    }

    pub fn close(&mut self) {
        self.menu = None;
    }

    /// Text was inserted so that the caret now sits at `caret`. `caret_bottom`
    /// is the screen position of the caret's bottom-left corner.
    pub fn on_insert(&mut self, inserted: &str, caret: usize, caret_bottom: Point) -> MenuOutcome {
        if inserted == "@" {
            if self.catalog.is_empty() {
                return MenuOutcome::Ignored;
            }
            self.menu = Some(CommandMenu {
                at: caret.saturating_sub(1),
                filter: String::new(),
                selected: 0,
                anchor: Point::new(caret_bottom.x, caret_bottom.y + CARET_GAP),
            });
            return MenuOutcome::Opened;
        }

        let Some(menu) = self.menu.as_mut() else {
            return MenuOutcome::Ignored;
        };
        let mut chars = inserted.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_whitespace() => {
                self.menu = None;
                MenuOutcome::Closed
            }
            // A paste or IME commit cannot be tracked as filter text.
            (Some(_), Some(_)) => {
                self.menu = None;
                MenuOutcome::Closed
            }
            (Some(c), None) if !c.is_control() => {
                menu.filter.push(c);
                menu.selected = 0;
                MenuOutcome::Updated
            }
            _ => MenuOutcome::Ignored,
        }
    }

    /// Key pressed while the text surface has focus. `now` is used by the
    /// date/time template.
    pub fn on_key(&mut self, key: &Key, now: OffsetDateTime) -> MenuOutcome {
        let Some(menu) = self.menu.as_mut() else {
            return MenuOutcome::Ignored;
        };
        match key.0.as_str() {
            "Escape" => {
                self.menu = None;
                MenuOutcome::Closed
            }
            "Backspace" => {
                if menu.filter.pop().is_some() {
                    menu.selected = 0;
                    MenuOutcome::Updated
                } else {
                    self.menu = None;
                    MenuOutcome::Closed
                }
            }
            "ArrowDown" | "ArrowUp" => {
                let count = self.catalog.matching(&menu.filter).len();
                if count == 0 {
                    return MenuOutcome::Ignored;
                }
                menu.selected = if key.is("ArrowDown") {
                    (menu.selected + 1) % count
                } else {
                    (menu.selected + count - 1) % count
                };
                MenuOutcome::Updated
            }
            "Enter" | "Tab" => {
                let items = self.catalog.matching(&menu.filter);
                let Some(item) = items.get(menu.selected).copied() else {
                    return MenuOutcome::Ignored;
                };
                let edit = menu.insertion(item, now);
                self.menu = None;
                MenuOutcome::Commit(edit)
            }
            _ => MenuOutcome::Ignored,
        }
    }
}

//! Help text layout.
//!
//! Help is a list of [`HelpEntry`] values rendered in two columns: option
//! keys padded to the widest key, then the description wrapped so that a
//! line fits an 80 column terminal.
//!
//! ```text
//! Commands:
//! build, b        Build the project. Defaults to: debug.
//! test            Run the tests and report every failure with
//!                 its captured output.
//! ```

use crate::types::{OptionGroup, OptionNode};

/// Width the key column plus description should stay within.
const WRAP_WIDTH: usize = 75;
/// Narrowest description column, used when keys are very wide.
const MIN_DESCRIPTION_WIDTH: usize = 20;
const COLUMN_GAP: &str = "    ";

/// One block of help output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelpEntry {
    /// Key column, e.g. `-o, --option`. Entries without one print the
    /// description on its own.
    pub value: Option<String>,
    /// Description column.
    pub description: String,
    /// Nested entries rendered below this one.
    pub options: Vec<HelpEntry>,
}

impl HelpEntry {
    /// A free-standing line of text.
    pub fn text(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    /// A group heading followed by one line per root option.
    pub fn from_group(group: &OptionGroup) -> Self {
        Self {
            value: None,
            description: group.description.clone(),
            options: group
                .options
                .iter()
                .map(|option| Self::from_option(option, false))
                .collect(),
        }
    }

    /// An option line, optionally followed by its required and optional
    /// children.
    pub fn from_option(option: &OptionNode, include_children: bool) -> Self {
        let mut description = option.description.clone();
        if let Some(default) = &option.default_value {
            description.push_str(&format!(" Defaults to: {default}."));
        }
        let options = if include_children {
            option
                .children()
                .map(|child| Self::from_option(child, false))
                .collect()
        } else {
            Vec::new()
        };
        Self {
            value: Some(option.keys.join(", ")),
            description,
            options,
        }
    }

    /// Widest key column in this entry and its nested entries.
    pub fn column_length(&self) -> usize {
        let own = self.value.as_ref().map_or(0, |v| v.chars().count());
        self.options
            .iter()
            .map(HelpEntry::column_length)
            .fold(own, usize::max)
    }

    /// Renders this entry with the key column padded to `padding`.
    pub fn render(&self, padding: usize) -> String {
        let mut out = String::new();

        match &self.value {
            None => out.push_str(&self.description),
            Some(value) => {
                out.push_str(&format!("{value:<padding$}{COLUMN_GAP}"));
                let width = WRAP_WIDTH.saturating_sub(padding).max(MIN_DESCRIPTION_WIDTH);
                let indent = format!("\n{}", " ".repeat(padding + COLUMN_GAP.len()));
                out.push_str(&wrap_words(&self.description, width).join(&indent));
            }
        }

        for option in &self.options {
            out.push('\n');
            out.push_str(&option.render(padding));
        }
        out
    }
}

/// Splits `text` into lines of at most `width` characters, breaking on
/// spaces. Words longer than `width` get a line of their own.
fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Renders `entries` with a shared key column.
pub fn help_string(entries: &[HelpEntry]) -> String {
    let padding = entries
        .iter()
        .map(HelpEntry::column_length)
        .max()
        .unwrap_or(0);
    entries
        .iter()
        .map(|entry| entry.render(padding))
        .collect::<Vec<_>>()
        .join("\n")
}

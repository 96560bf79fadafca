use thiserror::Error;

use crate::prompt::Prompter;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn cursor(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub fn clamp(self, len: usize) -> Self {
        Self::new(self.start.min(len), self.end.min(len))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextChange {
    pub start: usize,
    pub end: usize,
    pub insert: String,
}

impl TextChange {
    pub fn new(start: usize, end: usize, insert: impl Into<String>) -> Self {
        Self {
            start,
            end,
            insert: insert.into(),
        }
    }
}

/// One replacement plus where the selection should land afterwards.
///
/// With `selection_after == None` the old selection is carried through the change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub change: TextChange,
    pub selection_after: Option<Selection>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("range {start}..{end} is outside text of length {len}")]
    InvalidRange { start: usize, end: usize, len: usize },
    #[error("offset {offset} is not on a character boundary")]
    NotCharBoundary { offset: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorSnapshot {
    pub text: String,
    pub selection: Selection,
}

impl EditorSnapshot {
    pub fn new(text: String) -> Self {
        let len = text.len();
        Self {
            text,
            selection: Selection::cursor(len),
        }
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection.clamp(self.text.len());
    }

    pub fn selected_text(&self) -> &str {
        let selection = self.selection.clamp(self.text.len());
        self.text
            .get(selection.start..selection.end)
            .unwrap_or_default()
    }

    /// Applies the change and moves the selection. Returns whether the text changed.
    pub fn apply_transaction(&mut self, transaction: Transaction) -> Result<bool, CoreError> {
        let change = &transaction.change;
        let len = self.text.len();
        if change.start > change.end || change.end > len {
            return Err(CoreError::InvalidRange {
                start: change.start,
                end: change.end,
                len,
            });
        }
        for offset in [change.start, change.end] {
            if !self.text.is_char_boundary(offset) {
                return Err(CoreError::NotCharBoundary { offset });
            }
        }

        let mut next_text = String::with_capacity(len + change.insert.len());
        next_text.push_str(&self.text[..change.start]);
        next_text.push_str(&change.insert);
        next_text.push_str(&self.text[change.end..]);

        let next_selection = transaction
            .selection_after
            .map(|selection| selection.clamp(next_text.len()))
            .unwrap_or_else(|| {
                Selection::new(
                    map_position_through_change(self.selection.start, change),
                    map_position_through_change(self.selection.end, change),
                )
                .clamp(next_text.len())
            });

        let text_changed = self.text != next_text;
        self.text = next_text;
        self.selection = next_selection;
        Ok(text_changed)
    }
}

fn map_position_through_change(pos: usize, change: &TextChange) -> usize {
    if pos < change.start {
        return pos;
    }
    if pos <= change.end {
        return change.start + change.insert.len();
    }
    pos - (change.end - change.start) + change.insert.len()
}

/// Toolbar buttons, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolbarButton {
    Bold,
    Italic,
    Link,
    Code,
    List,
}

pub struct ToolbarItem {
    pub button: ToolbarButton,
    pub title: &'static str,
    pub icon: &'static str,
}

pub static TOOLBAR: [ToolbarItem; 5] = [
    ToolbarItem {
        button: ToolbarButton::Bold,
        title: "Bold",
        icon: "fa-bold",
    },
    ToolbarItem {
        button: ToolbarButton::Italic,
        title: "Italic",
        icon: "fa-italic",
    },
    ToolbarItem {
        button: ToolbarButton::Link,
        title: "Link",
        icon: "fa-link",
    },
    ToolbarItem {
        button: ToolbarButton::Code,
        title: "Code",
        icon: "fa-code",
    },
    ToolbarItem {
        button: ToolbarButton::List,
        title: "List",
        icon: "fa-list-ul",
    },
];

impl ToolbarButton {
    /// Gathers any input the command needs. `None` means the user backed out.
    pub fn resolve<P: Prompter + ?Sized>(self, prompter: &P) -> Option<ToolbarCommand> {
        match self {
            Self::Bold => Some(ToolbarCommand::Bold),
            Self::Italic => Some(ToolbarCommand::Italic),
            Self::Link => prompter
                .prompt("Enter URL:", Some("https://"))
                .filter(|url| !url.is_empty())
                .map(ToolbarCommand::Link),
            Self::Code => Some(ToolbarCommand::Code),
            Self::List => Some(ToolbarCommand::List),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolbarCommand {
    Bold,
    Italic,
    Link(String),
    Code,
    List,
}

impl ToolbarCommand {
    /// Whether the view should refocus the editor and restore the computed selection.
    pub fn restores_selection(&self) -> bool {
        !matches!(self, Self::List)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToolbarOutcome {
    pub text_changed: bool,
    pub restore_selection: bool,
}

pub fn apply_toolbar_command(
    snapshot: &mut EditorSnapshot,
    command: &ToolbarCommand,
) -> Result<ToolbarOutcome, CoreError> {
    let transaction = match command {
        ToolbarCommand::Bold => wrap_transaction(snapshot, "**", "**"),
        ToolbarCommand::Italic => wrap_transaction(snapshot, "*", "*"),
        ToolbarCommand::Link(url) => wrap_transaction(snapshot, "[", &format!("]({url})")),
        ToolbarCommand::Code => {
            if snapshot.selected_text().contains('\n') {
                wrap_transaction(snapshot, "```\n", "\n```")
            } else {
                wrap_transaction(snapshot, "`", "`")
            }
        }
        ToolbarCommand::List => list_transaction(snapshot),
    };
    let text_changed = snapshot.apply_transaction(transaction)?;
    Ok(ToolbarOutcome {
        text_changed,
        restore_selection: command.restores_selection(),
    })
}

/// Surrounds the selection; the selection stays on the original span, shifted past `open`.
fn wrap_transaction(snapshot: &EditorSnapshot, open: &str, close: &str) -> Transaction {
    let selection = snapshot.selection.clamp(snapshot.text.len());
    let mut insert = String::new();
    insert.push_str(open);
    insert.push_str(snapshot.selected_text());
    insert.push_str(close);
    Transaction {
        change: TextChange::new(selection.start, selection.end, insert),
        selection_after: Some(Selection::new(
            selection.start + open.len(),
            selection.end + open.len(),
        )),
    }
}

/// Prefixes every selected line with `- `, replacing the selection in place.
fn list_transaction(snapshot: &EditorSnapshot) -> Transaction {
    let selection = snapshot.selection.clamp(snapshot.text.len());
    let bulleted = snapshot
        .selected_text()
        .split('\n')
        .map(|line| format!("- {line}"))
        .collect::<Vec<_>>()
        .join("\n");
    Transaction {
        change: TextChange::new(selection.start, selection.end, bulleted),
        selection_after: None,
    }
}

/// Converts a textarea offset (UTF-16 code units) to a byte offset in `text`.
pub fn utf16_to_byte_idx(text: &str, pos_utf16: u32) -> usize {
    let mut acc: u32 = 0;
    for (idx, ch) in text.char_indices() {
        if acc >= pos_utf16 {
            return idx;
        }
        acc += ch.len_utf16() as u32;
    }
    text.len()
}

pub fn byte_idx_to_utf16(text: &str, byte_idx: usize) -> u32 {
    let mut end = byte_idx.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].encode_utf16().count() as u32
}

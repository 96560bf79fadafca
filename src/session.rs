//! Editor state and the file operations that move it.
//!
//! Operations never touch the state they were started from. Each returns an [`OpOutcome`] that
//! the caller applies to whatever the state is when the response lands, so typing during a slow
//! request is not lost. Failures are logged and come back as [`Transition::Unchanged`].

use crate::prompt::Prompter;
use crate::storage::StorageClient;
use crate::tree::display_name;

const MD_EXTENSION: &str = ".md";

/// Currently open file plus the text being edited.
///
/// `current_path == None` is the untitled buffer, distinct from any real path (even `""`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditorState {
    pub current_path: Option<String>,
    pub buffer: String,
}

impl EditorState {
    pub fn new(buffer: impl Into<String>) -> Self {
        Self {
            current_path: None,
            buffer: buffer.into(),
        }
    }

    pub fn title(&self) -> String {
        title_for(self.current_path.as_deref())
    }

    pub fn set_buffer(&mut self, text: String) {
        self.buffer = text;
    }

    /// Applies a finished operation. Returns whether the buffer text changed.
    pub fn apply(&mut self, transition: Transition) -> bool {
        match transition {
            Transition::Unchanged => false,
            Transition::Loaded { path, content } => {
                let changed = self.buffer != content;
                self.current_path = Some(path);
                self.buffer = content;
                changed
            }
            Transition::Saved { path } => {
                self.current_path = Some(path);
                false
            }
            Transition::Deleted { path } => {
                if self.current_path.as_deref() != Some(path.as_str()) {
                    return false;
                }
                self.current_path = None;
                let changed = !self.buffer.is_empty();
                self.buffer.clear();
                changed
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Loaded { path: String, content: String },
    Saved { path: String },
    /// Clears the editor only if `path` is still the open file when applied.
    Deleted { path: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpOutcome {
    pub transition: Transition,
    pub reload_tree: bool,
}

impl OpOutcome {
    fn unchanged() -> Self {
        Self {
            transition: Transition::Unchanged,
            reload_tree: false,
        }
    }

    fn reload(transition: Transition) -> Self {
        Self {
            transition,
            reload_tree: true,
        }
    }
}

/// Header label: the open path without `.md`, or `Untitled`.
pub fn title_for(current_path: Option<&str>) -> String {
    current_path
        .map(display_name)
        .unwrap_or_else(|| "Untitled".to_string())
}

/// Joins a child name onto a parent folder; the root is the empty string.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

/// Storage path for a new note: one `.md` suffix, never two. `None` for an empty name.
pub fn new_file_path(parent: &str, raw_name: &str) -> Option<String> {
    if raw_name.is_empty() {
        return None;
    }
    let stem = raw_name.strip_suffix(MD_EXTENSION).unwrap_or(raw_name);
    Some(join_path(parent, &format!("{stem}{MD_EXTENSION}")))
}

fn non_empty(answer: Option<String>) -> Option<String> {
    answer.filter(|text| !text.is_empty())
}

/// Loads a file into the editor.
pub async fn open<S>(storage: &S, path: &str) -> OpOutcome
where
    S: StorageClient + ?Sized,
{
    if path.is_empty() {
        leptos::logging::error!("No path provided to open");
        return OpOutcome::unchanged();
    }
    leptos::logging::log!("Loading file: {path}");

    match storage.read_file(path).await {
        Ok(content) => OpOutcome {
            transition: Transition::Loaded {
                path: path.to_string(),
                content,
            },
            reload_tree: false,
        },
        Err(err) => {
            leptos::logging::error!("Error loading file: {err}");
            OpOutcome::unchanged()
        }
    }
}

/// Creates a note under `parent` holding the current buffer (not a blank document).
pub async fn create_file<S, P>(
    storage: &S,
    prompter: &P,
    state: &EditorState,
    parent: &str,
) -> OpOutcome
where
    S: StorageClient + ?Sized,
    P: Prompter + ?Sized,
{
    let Some(name) = non_empty(prompter.prompt("Enter file name:", None)) else {
        return OpOutcome::unchanged();
    };
    let Some(path) = new_file_path(parent, &name) else {
        return OpOutcome::unchanged();
    };
    save(storage, prompter, state, Some(&path)).await
}

pub async fn create_folder<S, P>(storage: &S, prompter: &P, parent: &str) -> OpOutcome
where
    S: StorageClient + ?Sized,
    P: Prompter + ?Sized,
{
    let Some(name) = non_empty(prompter.prompt("Enter folder name:", Some("New Folder"))) else {
        return OpOutcome::unchanged();
    };
    let path = join_path(parent, &name);

    match storage.create_folder(&path).await {
        Ok(()) => OpOutcome::reload(Transition::Unchanged),
        Err(err) => {
            leptos::logging::error!("Error creating folder: {err}");
            OpOutcome::unchanged()
        }
    }
}

/// Writes the buffer to `path`, else the open file, else a prompted name.
pub async fn save<S, P>(
    storage: &S,
    prompter: &P,
    state: &EditorState,
    path: Option<&str>,
) -> OpOutcome
where
    S: StorageClient + ?Sized,
    P: Prompter + ?Sized,
{
    let target = non_empty(path.map(str::to_string))
        .or_else(|| non_empty(state.current_path.clone()))
        .or_else(|| non_empty(prompter.prompt("Enter file name:", Some("untitled.md"))));
    let Some(target) = target else {
        return OpOutcome::unchanged();
    };

    match storage.write_file(&target, &state.buffer).await {
        Ok(()) => OpOutcome::reload(Transition::Saved { path: target }),
        Err(err) => {
            let message = err
                .backend_message()
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            leptos::logging::error!("Error saving file: {message}");
            OpOutcome::unchanged()
        }
    }
}

pub async fn delete_file<S, P>(storage: &S, prompter: &P, path: &str) -> OpOutcome
where
    S: StorageClient + ?Sized,
    P: Prompter + ?Sized,
{
    if !prompter.confirm(&format!("Are you sure you want to delete {path}?")) {
        return OpOutcome::unchanged();
    }

    match storage.delete(path).await {
        Ok(()) => OpOutcome::reload(Transition::Deleted {
            path: path.to_string(),
        }),
        Err(err) => {
            leptos::logging::error!("Error deleting file: {err}");
            OpOutcome::unchanged()
        }
    }
}

/// Deletes a folder through the same endpoint as files.
///
/// The open file is left alone even when it lived inside the deleted folder.
pub async fn delete_folder<S, P>(storage: &S, prompter: &P, path: &str) -> OpOutcome
where
    S: StorageClient + ?Sized,
    P: Prompter + ?Sized,
{
    if !prompter.confirm(&format!("Are you sure you want to delete the folder {path}?")) {
        return OpOutcome::unchanged();
    }

    match storage.delete(path).await {
        Ok(()) => OpOutcome::reload(Transition::Unchanged),
        Err(err) => {
            leptos::logging::error!("Error deleting folder: {err}");
            OpOutcome::unchanged()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;
    use crate::storage::{MemoryStorage, StorageError};
    use crate::tree::TreeView;
    use futures::executor::block_on;

    fn storage_with(files: &[(&str, &str)]) -> MemoryStorage {
        let storage = MemoryStorage::new();
        for (path, content) in files {
            block_on(storage.write_file(path, content)).unwrap();
        }
        storage
    }

    fn bound(path: &str, buffer: &str) -> EditorState {
        EditorState {
            current_path: Some(path.to_string()),
            buffer: buffer.to_string(),
        }
    }

    #[test]
    fn save_then_open_round_trips_buffer() {
        let samples = [
            "# Title\n\n- **bold** item\n\n```rs\nfn main() {}\n```\n[link](https://x.y)",
            "",
            "windows\r\nline endings\r\n",
            "über naïve 日本語 😀",
            "  leading and trailing spaces  \t",
        ];
        for text in samples {
            let storage = MemoryStorage::new();
            let prompter = ScriptedPrompter::new();
            let mut state = EditorState::new(text);

            let saved = block_on(save(&storage, &prompter, &state, Some("notes/r.md")));
            assert!(saved.reload_tree, "save failed for {text:?}");
            state.apply(saved.transition);
            state.set_buffer("scratch".to_string());

            let opened = block_on(open(&storage, "notes/r.md"));
            state.apply(opened.transition);
            assert_eq!(state.buffer, text);
            assert_eq!(state.current_path.as_deref(), Some("notes/r.md"));
        }
    }

    #[test]
    fn opening_same_file_twice_is_idempotent() {
        let storage = storage_with(&[("a.md", "alpha")]);
        let mut state = EditorState::default();

        state.apply(block_on(open(&storage, "a.md")).transition);
        let first = state.clone();
        let changed = state.apply(block_on(open(&storage, "a.md")).transition);
        assert!(!changed);
        assert_eq!(state, first);
    }

    #[test]
    fn open_with_empty_path_sends_nothing() {
        let storage = MemoryStorage::new();
        storage.fail_next(StorageError::Transport("must not be used".to_string()));
        assert_eq!(block_on(open(&storage, "")), OpOutcome::unchanged());
        assert!(block_on(storage.list()).is_err());
    }

    #[test]
    fn failed_open_leaves_state_untouched() {
        let storage = MemoryStorage::new();
        let mut state = bound("x.md", "draft");
        let outcome = block_on(open(&storage, "missing.md"));
        assert!(!state.apply(outcome.transition));
        assert_eq!(state, bound("x.md", "draft"));

        storage.fail_next(StorageError::Format("No content in response".to_string()));
        let outcome = block_on(open(&storage, "x.md"));
        assert_eq!(outcome, OpOutcome::unchanged());
    }

    #[test]
    fn new_file_path_adds_exactly_one_extension() {
        assert_eq!(new_file_path("", "notes").as_deref(), Some("notes.md"));
        assert_eq!(new_file_path("", "notes.md").as_deref(), Some("notes.md"));
        assert_eq!(new_file_path("a/b", "n").as_deref(), Some("a/b/n.md"));
        assert_eq!(new_file_path("", ""), None);
    }

    #[test]
    fn create_normalizes_extension_and_stores_current_buffer() {
        for raw in ["notes", "notes.md"] {
            let storage = MemoryStorage::new();
            let prompter = ScriptedPrompter::new().answer(raw);
            let state = EditorState::new("whatever is in the editor");

            let outcome = block_on(create_file(&storage, &prompter, &state, ""));
            assert_eq!(
                outcome,
                OpOutcome::reload(Transition::Saved {
                    path: "notes.md".to_string()
                })
            );
            assert_eq!(
                storage.file_content("notes.md").as_deref(),
                Some("whatever is in the editor")
            );
            assert!(!storage.contains("notes.md.md"));
        }
    }

    #[test]
    fn create_inside_folder_joins_parent() {
        let storage = MemoryStorage::new();
        block_on(storage.create_folder("docs")).unwrap();
        let prompter = ScriptedPrompter::new().answer("todo");
        let outcome = block_on(create_file(&storage, &prompter, &EditorState::default(), "docs"));
        assert!(outcome.reload_tree);
        assert!(storage.contains("docs/todo.md"));
        assert_eq!(prompter.shown(), vec!["Enter file name:".to_string()]);
    }

    #[test]
    fn cancelled_or_empty_create_sends_no_request() {
        let storage = MemoryStorage::new();
        storage.fail_next(StorageError::Transport("must not be used".to_string()));
        let state = EditorState::new("x");

        let cancelled = ScriptedPrompter::new().cancel();
        assert_eq!(
            block_on(create_file(&storage, &cancelled, &state, "")),
            OpOutcome::unchanged()
        );
        let empty = ScriptedPrompter::new().answer("");
        assert_eq!(
            block_on(create_file(&storage, &empty, &state, "")),
            OpOutcome::unchanged()
        );
        assert!(block_on(storage.list()).is_err());
    }

    #[test]
    fn create_folder_prompts_with_default_and_reloads() {
        let storage = MemoryStorage::new();
        let prompter = ScriptedPrompter::new().answer("New Folder");
        let outcome = block_on(create_folder(&storage, &prompter, ""));
        assert_eq!(outcome, OpOutcome::reload(Transition::Unchanged));
        assert!(storage.contains("New Folder"));
        assert_eq!(
            prompter.shown(),
            vec!["Enter folder name: | New Folder".to_string()]
        );
    }

    #[test]
    fn create_folder_failure_does_not_reload() {
        let storage = MemoryStorage::new();
        block_on(storage.create_folder("docs")).unwrap();
        let prompter = ScriptedPrompter::new().answer("docs");
        assert_eq!(
            block_on(create_folder(&storage, &prompter, "")),
            OpOutcome::unchanged()
        );
    }

    #[test]
    fn save_prefers_explicit_then_current_then_prompt() {
        let storage = MemoryStorage::new();

        let prompter = ScriptedPrompter::new();
        let outcome = block_on(save(&storage, &prompter, &bound("cur.md", "a"), Some("exp.md")));
        assert_eq!(outcome.transition, Transition::Saved { path: "exp.md".to_string() });

        let outcome = block_on(save(&storage, &prompter, &bound("cur.md", "b"), None));
        assert_eq!(outcome.transition, Transition::Saved { path: "cur.md".to_string() });
        assert!(prompter.shown().is_empty());

        let prompter = ScriptedPrompter::new().answer("fresh.md");
        let outcome = block_on(save(&storage, &prompter, &EditorState::new("c"), None));
        assert_eq!(outcome.transition, Transition::Saved { path: "fresh.md".to_string() });
        assert_eq!(prompter.shown(), vec!["Enter file name: | untitled.md".to_string()]);
        assert_eq!(storage.file_content("fresh.md").as_deref(), Some("c"));
    }

    #[test]
    fn saving_untitled_buffer_binds_the_new_name() {
        let storage = MemoryStorage::new();
        let prompter = ScriptedPrompter::new().answer("draft.md");
        let mut state = EditorState::new("hello");
        state.apply(block_on(save(&storage, &prompter, &state.clone(), None)).transition);
        assert_eq!(state.current_path.as_deref(), Some("draft.md"));
        assert_eq!(state.title(), "draft");
    }

    #[test]
    fn save_as_moves_binding_to_new_path() {
        let storage = MemoryStorage::new();
        let mut state = bound("old.md", "text");
        let outcome = block_on(save(&storage, &ScriptedPrompter::new(), &state.clone(), Some("new.md")));
        state.apply(outcome.transition);
        assert_eq!(state.current_path.as_deref(), Some("new.md"));
    }

    #[test]
    fn cancelled_save_prompt_aborts() {
        let storage = MemoryStorage::new();
        let prompter = ScriptedPrompter::new().cancel();
        let outcome = block_on(save(&storage, &prompter, &EditorState::new("x"), None));
        assert_eq!(outcome, OpOutcome::unchanged());
        assert!(block_on(storage.list()).unwrap().is_empty());
    }

    #[test]
    fn failed_save_keeps_binding() {
        let storage = MemoryStorage::new();
        storage.fail_next(StorageError::status(500, "disk full"));
        let mut state = EditorState::new("x");
        let outcome = block_on(save(&storage, &ScriptedPrompter::new(), &state.clone(), Some("a.md")));
        assert_eq!(outcome, OpOutcome::unchanged());
        state.apply(outcome.transition);
        assert_eq!(state.current_path, None);
    }

    #[test]
    fn deleting_open_file_clears_editor() {
        let storage = storage_with(&[("x.md", "hello")]);
        let prompter = ScriptedPrompter::new().confirm_with(true);
        let mut state = bound("x.md", "hello");

        let outcome = block_on(delete_file(&storage, &prompter, "x.md"));
        assert!(outcome.reload_tree);
        assert!(state.apply(outcome.transition));
        assert_eq!(state, EditorState::default());
        assert_eq!(state.title(), "Untitled");
        assert_eq!(
            prompter.shown(),
            vec!["Are you sure you want to delete x.md?".to_string()]
        );
    }

    #[test]
    fn deleting_other_file_keeps_editor() {
        let storage = storage_with(&[("x.md", "hello"), ("y.md", "other")]);
        let prompter = ScriptedPrompter::new().confirm_with(true);
        let mut state = bound("x.md", "hello");

        let outcome = block_on(delete_file(&storage, &prompter, "y.md"));
        assert!(outcome.reload_tree);
        state.apply(outcome.transition);
        assert_eq!(state, bound("x.md", "hello"));
        assert!(!storage.contains("y.md"));
    }

    #[test]
    fn declined_delete_sends_nothing() {
        let storage = storage_with(&[("x.md", "hello")]);
        let prompter = ScriptedPrompter::new().confirm_with(false);
        assert_eq!(
            block_on(delete_file(&storage, &prompter, "x.md")),
            OpOutcome::unchanged()
        );
        assert!(storage.contains("x.md"));
    }

    #[test]
    fn failed_delete_does_not_clear_or_reload() {
        let storage = MemoryStorage::new();
        let prompter = ScriptedPrompter::new().confirm_with(true);
        let outcome = block_on(delete_file(&storage, &prompter, "x.md"));
        assert_eq!(outcome, OpOutcome::unchanged());
    }

    #[test]
    fn folder_delete_leaves_open_file_inside_it_bound() {
        let storage = storage_with(&[("docs/a.md", "inside")]);
        let prompter = ScriptedPrompter::new().confirm_with(true);
        let mut state = bound("docs/a.md", "inside");

        let outcome = block_on(delete_folder(&storage, &prompter, "docs"));
        assert_eq!(outcome, OpOutcome::reload(Transition::Unchanged));
        state.apply(outcome.transition);
        assert!(!storage.contains("docs/a.md"));
        assert_eq!(state, bound("docs/a.md", "inside"));
        assert_eq!(
            prompter.shown(),
            vec!["Are you sure you want to delete the folder docs?".to_string()]
        );
    }

    #[test]
    fn tree_marks_opened_file_after_reload() {
        let storage = storage_with(&[("a/b.md", "b"), ("a/c.md", "c"), ("b.md", "root")]);
        let mut state = EditorState::default();
        state.apply(block_on(open(&storage, "a/b.md")).transition);

        let mut view = TreeView::default();
        let ticket = view.begin_reload();
        view.finish_reload(ticket, block_on(storage.list()));
        let active: Vec<String> = view
            .rows(state.current_path.as_deref())
            .into_iter()
            .filter(|row| row.active)
            .map(|row| row.path)
            .collect();
        assert_eq!(active, vec!["a/b.md".to_string()]);
    }

    #[test]
    fn delete_transition_checks_path_at_apply_time() {
        let mut state = bound("x.md", "hello");
        state.apply(Transition::Loaded {
            path: "z.md".to_string(),
            content: "zed".to_string(),
        });
        assert!(!state.apply(Transition::Deleted {
            path: "x.md".to_string()
        }));
        assert_eq!(state, bound("z.md", "zed"));
    }
}

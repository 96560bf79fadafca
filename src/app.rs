use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::config::EditorConfig;
use crate::draft::DraftStore;
use crate::editor_core::{
    apply_toolbar_command, byte_idx_to_utf16, utf16_to_byte_idx, EditorSnapshot, Selection,
    ToolbarButton, TOOLBAR,
};
use crate::preview::render_markdown;
use crate::prompt::BrowserPrompter;
use crate::session::{self, EditorState, OpOutcome};
use crate::sidebar::{SidebarMode, SidebarState, SIDEBAR_ITEMS};
use crate::storage::{HttpStorage, StorageClient};
use crate::tree::{RowAction, RowKind, TreeRow, TreeView, ROOT_ACTIONS};

fn tree_row_view(
    row: TreeRow,
    on_open: impl Fn(String) + Copy + 'static,
    on_action: impl Fn(RowAction, String) + Copy + 'static,
) -> impl IntoView {
    let indent = format!("padding-left: {}px;", 8 + row.depth * 16);
    let open_target = row.open_target().map(str::to_string);
    let is_folder = row.kind == RowKind::Folder;
    let icon = format!("fas {}", row.kind.icon());
    let path = row.path.clone();

    let actions = row
        .kind
        .actions()
        .iter()
        .map(|&action| {
            let path = path.clone();
            view! {
                <button
                    class="file-action"
                    title=action.title()
                    on:click=move |ev| {
                        ev.stop_propagation();
                        on_action(action, path.clone());
                    }
                >
                    <i class=format!("fas {}", action.icon())></i>
                </button>
            }
        })
        .collect_view();

    view! {
        <div
            class="file-item"
            class:active=row.active
            class:folder-item=is_folder
            style=indent
            data-path=row.path
            on:click=move |_| {
                if let Some(target) = open_target.clone() {
                    on_open(target);
                }
            }
        >
            <span class="file-name">
                <i class=icon></i>
                {row.label}
            </span>
            <div class="file-actions">{actions}</div>
        </div>
    }
}

#[component]
pub fn App() -> impl IntoView {
    let config = EditorConfig::load();
    let drafts = DraftStore::new(config.draft_key.clone());
    let storage = StoredValue::new(HttpStorage::new(config.api_base.clone()));

    let editor = RwSignal::new(EditorState::new(drafts.initial_buffer()));
    let tree = RwSignal::new(TreeView::default());
    let sidebar = RwSignal::new(SidebarState::new(config.show_files_on_start));
    let textarea_ref = NodeRef::<html::Textarea>::new();

    let preview_html = Memo::new(move |_| editor.with(|state| render_markdown(&state.buffer)));
    let current_path = Memo::new(move |_| editor.with(|state| state.current_path.clone()));

    Effect::new(move |_| {
        let buffer = editor.with(|state| state.buffer.clone());
        if let Err(err) = drafts.save(&buffer) {
            leptos::logging::warn!("Could not store draft: {err}");
        }
    });

    let reload_tree = move || {
        let mut ticket = None;
        tree.update(|view| ticket = Some(view.begin_reload()));
        let Some(ticket) = ticket else {
            return;
        };
        let storage = storage.get_value();
        spawn_local(async move {
            let result = storage.list().await;
            tree.update(|view| {
                view.finish_reload(ticket, result);
            });
        });
    };

    let apply_outcome = move |outcome: OpOutcome| {
        if outcome.transition != session::Transition::Unchanged {
            editor.update(|state| {
                state.apply(outcome.transition);
            });
        }
        if outcome.reload_tree {
            reload_tree();
        }
    };

    let open_file = move |path: String| {
        let storage = storage.get_value();
        spawn_local(async move {
            apply_outcome(session::open(&storage, &path).await);
        });
    };

    let save_file = move || {
        let storage = storage.get_value();
        let snapshot = editor.get_untracked();
        spawn_local(async move {
            apply_outcome(session::save(&storage, &BrowserPrompter, &snapshot, None).await);
        });
    };

    let run_row_action = move |action: RowAction, path: String| {
        let storage = storage.get_value();
        let snapshot = editor.get_untracked();
        spawn_local(async move {
            let outcome = match action {
                RowAction::NewFile => {
                    session::create_file(&storage, &BrowserPrompter, &snapshot, &path).await
                }
                RowAction::NewFolder => {
                    session::create_folder(&storage, &BrowserPrompter, &path).await
                }
                RowAction::DeleteFile => {
                    session::delete_file(&storage, &BrowserPrompter, &path).await
                }
                RowAction::DeleteFolder => {
                    session::delete_folder(&storage, &BrowserPrompter, &path).await
                }
            };
            apply_outcome(outcome);
        });
    };

    let run_toolbar = move |button: ToolbarButton| {
        let Some(command) = button.resolve(&BrowserPrompter) else {
            return;
        };
        let Some(textarea) = textarea_ref.get_untracked() else {
            return;
        };

        let mut snapshot = EditorSnapshot::new(editor.with_untracked(|s| s.buffer.clone()));
        let start = textarea.selection_start().ok().flatten().unwrap_or(0);
        let end = textarea.selection_end().ok().flatten().unwrap_or(start);
        snapshot.set_selection(Selection::new(
            utf16_to_byte_idx(&snapshot.text, start),
            utf16_to_byte_idx(&snapshot.text, end),
        ));

        match apply_toolbar_command(&mut snapshot, &command) {
            Ok(outcome) if !outcome.text_changed => {}
            Ok(outcome) => {
                textarea.set_value(&snapshot.text);
                if outcome.restore_selection {
                    let _ = textarea.focus();
                    let _ = textarea.set_selection_range(
                        byte_idx_to_utf16(&snapshot.text, snapshot.selection.start),
                        byte_idx_to_utf16(&snapshot.text, snapshot.selection.end),
                    );
                }
                editor.update(|state| state.set_buffer(snapshot.text));
            }
            Err(err) => leptos::logging::error!("Toolbar command failed: {err}"),
        }
    };

    let activate_mode = move |mode: SidebarMode| {
        let mut effect = None;
        sidebar.update(|state| effect = Some(state.activate(mode)));
        if effect.is_some_and(|effect| effect.reload_tree) {
            reload_tree();
        }
    };

    reload_tree();

    let sidebar_icons = SIDEBAR_ITEMS
        .iter()
        .map(|item| {
            let mode = item.mode;
            view! {
                <div
                    class="sidebar-icon"
                    class:active=move || sidebar.with(|state| state.is_active(mode))
                    title=item.title
                    on:click=move |_| activate_mode(mode)
                >
                    <i class=format!("fas {}", item.icon)></i>
                </div>
            }
        })
        .collect_view();

    let toolbar_buttons = TOOLBAR
        .iter()
        .map(|item| {
            let button = item.button;
            view! {
                <button class="toolbar-btn" title=item.title on:click=move |_| run_toolbar(button)>
                    <i class=format!("fas {}", item.icon)></i>
                </button>
            }
        })
        .collect_view();

    let root_actions = ROOT_ACTIONS
        .iter()
        .map(|&action| {
            view! {
                <button
                    class="file-action"
                    title=action.title()
                    on:click=move |_| run_row_action(action, String::new())
                >
                    <i class=format!("fas {}", action.icon())></i>
                </button>
            }
        })
        .collect_view();

    let tree_rows = move || {
        let current = current_path.get();
        tree.with(|view| view.rows(current.as_deref()))
            .into_iter()
            .map(|row| tree_row_view(row, open_file, run_row_action))
            .collect_view()
    };

    let files_visible = move || sidebar.with(|state| state.files_visible);

    view! {
        <div class="app-layout">
            <nav class="sidebar">{sidebar_icons}</nav>
            <aside
                class="file-list"
                style:display=move || if files_visible() { "block" } else { "none" }
            >
                <div class="file-item root-actions">
                    <div class="file-actions">{root_actions}</div>
                </div>
                {tree_rows}
            </aside>
            <main
                class="main-container"
                style:margin-left=move || if files_visible() { "250px" } else { "0" }
            >
                <header class="toolbar">
                    {toolbar_buttons}
                    <span id="current-file" class="current-file">
                        {move || current_path.with(|path| session::title_for(path.as_deref()))}
                    </span>
                    <button id="save-btn" class="toolbar-btn" title="Save" on:click=move |_| save_file()>
                        <i class="fas fa-save"></i>
                    </button>
                </header>
                <div class="editor-container">
                    <section class="editor">
                        <textarea
                            id="markdown-input"
                            node_ref=textarea_ref
                            prop:value=move || editor.with(|state| state.buffer.clone())
                            on:input=move |ev| {
                                let text = event_target_value(&ev);
                                editor.update(|state| state.set_buffer(text));
                            }
                            spellcheck="false"
                        ></textarea>
                    </section>
                    <section id="preview" class="preview" inner_html=move || preview_html.get()></section>
                </div>
            </main>
        </div>
    }
}

//! Sidebar mode icons and the file-list visibility they control.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SidebarMode {
    Files,
    Editor,
    Settings,
}

pub struct SidebarItem {
    pub mode: SidebarMode,
    pub title: &'static str,
    pub icon: &'static str,
}

pub static SIDEBAR_ITEMS: [SidebarItem; 3] = [
    SidebarItem {
        mode: SidebarMode::Files,
        title: "Files",
        icon: "fa-folder",
    },
    SidebarItem {
        mode: SidebarMode::Editor,
        title: "Editor",
        icon: "fa-edit",
    },
    SidebarItem {
        mode: SidebarMode::Settings,
        title: "Settings",
        icon: "fa-cog",
    },
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SidebarEffect {
    pub reload_tree: bool,
}

/// At most one icon is active; the file list can stay open while Settings is highlighted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SidebarState {
    active: Option<SidebarMode>,
    pub files_visible: bool,
}

impl SidebarState {
    pub fn new(show_files: bool) -> Self {
        Self {
            active: show_files.then_some(SidebarMode::Files),
            files_visible: show_files,
        }
    }

    pub fn is_active(&self, mode: SidebarMode) -> bool {
        self.active == Some(mode)
    }

    pub fn activate(&mut self, mode: SidebarMode) -> SidebarEffect {
        let was_active = self.is_active(mode);
        match mode {
            SidebarMode::Files => {
                self.active = (!was_active).then_some(SidebarMode::Files);
                self.files_visible = !was_active;
                SidebarEffect {
                    reload_tree: !was_active,
                }
            }
            SidebarMode::Editor => {
                self.active = Some(SidebarMode::Editor);
                self.files_visible = false;
                SidebarEffect::default()
            }
            SidebarMode::Settings => {
                self.active = (!was_active).then_some(SidebarMode::Settings);
                SidebarEffect::default()
            }
        }
    }
}

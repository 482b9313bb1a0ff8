//! GUI action table and enable/disable gating.
//!
//! Every action is a row in [`ACTIONS`]: its text, status tip, default
//! shortcut, the menus/toolbars it appears in and a predicate over the
//! combined [`GuiState`]. [`ActionManager`] re-evaluates all predicates after
//! each state change, so an action's enabled flag is always a pure function of
//! the current four state dimensions.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::hotkeys::{Hotkey, Modifier};

// ─────────────────────────────────────────────────────────────────────────────
// State dimensions
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ApplicationState {
    #[default]
    NoFileOpen,
    FileOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FileState {
    #[default]
    Unchanged,
    Changed,
}

/// What is selected in the current signal browser tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TabSelectionState {
    /// No tab, or a tab without events.
    #[default]
    NoEventsPossible,
    NoEventSelected,
    EventSelectedOneChannel,
    EventSelectedAllChannels,
}

/// Undo/redo availability of the current tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TabEditState {
    #[default]
    NoRedoNoUndo,
    /// Undo possible.
    NoRedo,
    /// Redo possible.
    NoUndo,
    BothPossible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GuiState {
    pub application: ApplicationState,
    pub file: FileState,
    pub tab_selection: TabSelectionState,
    pub tab_edit: TabEditState,
}

impl GuiState {
    pub fn file_open(&self) -> bool {
        self.application == ApplicationState::FileOpen
    }

    pub fn event_selected(&self) -> bool {
        matches!(
            self.tab_selection,
            TabSelectionState::EventSelectedOneChannel | TabSelectionState::EventSelectedAllChannels
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Action table
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionId {
    FileOpen,
    FileSave,
    FileSaveAs,
    FileExportEvents,
    FileInfo,
    FileClose,
    Exit,
    EditUndo,
    EditRedo,
    EventDelete,
    EventChangeChannel,
    EventToAllChannels,
    EventCopyToChannels,
    EventChangeType,
    ViewZoomIn,
    ViewZoomOut,
    ViewAutoScale,
    OptionsChangeEventCreationType,
    ShowSettings,
    CalculateMeans,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionGroup {
    FileMenu,
    EditMenu,
    EventContext,
    ViewMenu,
    ViewToolbar,
    OptionsMenu,
    ToolsMenu,
}

/// One item of a menu or toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupEntry {
    Action(ActionId),
    Separator,
}

pub struct ActionSpec {
    pub id: ActionId,
    pub text: &'static str,
    pub status_tip: &'static str,
    pub shortcut: Option<Hotkey>,
    pub groups: &'static [ActionGroup],
    pub enabled_when: fn(&GuiState) -> bool,
}

const fn key(modifier: Modifier, key: char) -> Option<Hotkey> {
    Some(Hotkey { modifier, key })
}

fn always(_: &GuiState) -> bool {
    true
}

fn file_open(s: &GuiState) -> bool {
    s.file_open()
}

fn file_changed(s: &GuiState) -> bool {
    s.file_open() && s.file == FileState::Changed
}

fn undo_possible(s: &GuiState) -> bool {
    s.file_open() && matches!(s.tab_edit, TabEditState::NoRedo | TabEditState::BothPossible)
}

fn redo_possible(s: &GuiState) -> bool {
    s.file_open() && matches!(s.tab_edit, TabEditState::NoUndo | TabEditState::BothPossible)
}

fn event_selected(s: &GuiState) -> bool {
    s.file_open() && s.event_selected()
}

fn one_channel_event_selected(s: &GuiState) -> bool {
    s.file_open() && s.tab_selection == TabSelectionState::EventSelectedOneChannel
}

use ActionGroup as G;

pub static ACTIONS: &[ActionSpec] = &[
    ActionSpec {
        id: ActionId::FileOpen,
        text: "&Open...",
        status_tip: "Open a signal file",
        shortcut: key(Modifier::Ctrl, 'O'),
        groups: &[G::FileMenu],
        enabled_when: always,
    },
    ActionSpec {
        id: ActionId::FileSave,
        text: "&Save",
        status_tip: "Save the events of the signal file",
        shortcut: key(Modifier::Ctrl, 'S'),
        groups: &[G::FileMenu],
        enabled_when: file_changed,
    },
    ActionSpec {
        id: ActionId::FileSaveAs,
        text: "Save &As...",
        status_tip: "Save the signal file under a new name",
        shortcut: key(Modifier::CtrlShift, 'S'),
        groups: &[G::FileMenu],
        enabled_when: file_open,
    },
    ActionSpec {
        id: ActionId::FileExportEvents,
        text: "Export Events...",
        status_tip: "Export the events of the signal file",
        shortcut: None,
        groups: &[G::FileMenu],
        enabled_when: file_open,
    },
    ActionSpec {
        id: ActionId::FileInfo,
        text: "&Info...",
        status_tip: "Show basic information of the signal file",
        shortcut: None,
        groups: &[G::FileMenu],
        enabled_when: file_open,
    },
    ActionSpec {
        id: ActionId::FileClose,
        text: "&Close",
        status_tip: "Close the signal file",
        shortcut: key(Modifier::Ctrl, 'W'),
        groups: &[G::FileMenu],
        enabled_when: file_open,
    },
    ActionSpec {
        id: ActionId::Exit,
        text: "E&xit",
        status_tip: "Exit the application",
        shortcut: key(Modifier::Ctrl, 'Q'),
        groups: &[G::FileMenu],
        enabled_when: always,
    },
    ActionSpec {
        id: ActionId::EditUndo,
        text: "&Undo",
        status_tip: "Undo the last event change",
        shortcut: key(Modifier::Ctrl, 'Z'),
        groups: &[G::EditMenu],
        enabled_when: undo_possible,
    },
    ActionSpec {
        id: ActionId::EditRedo,
        text: "&Redo",
        status_tip: "Redo the last undone event change",
        shortcut: key(Modifier::CtrlShift, 'Z'),
        groups: &[G::EditMenu],
        enabled_when: redo_possible,
    },
    ActionSpec {
        id: ActionId::EventDelete,
        text: "&Delete",
        status_tip: "Delete the selected event",
        shortcut: key(Modifier::None, '\u{7f}'),
        groups: &[G::EditMenu, G::EventContext],
        enabled_when: event_selected,
    },
    ActionSpec {
        id: ActionId::EventChangeChannel,
        text: "Change C&hannel...",
        status_tip: "Move the selected event to another channel",
        shortcut: None,
        groups: &[G::EditMenu, G::EventContext],
        enabled_when: event_selected,
    },
    ActionSpec {
        id: ActionId::EventToAllChannels,
        text: "To &All Channels",
        status_tip: "Make the selected event apply to all channels",
        shortcut: None,
        groups: &[G::EditMenu, G::EventContext],
        enabled_when: one_channel_event_selected,
    },
    ActionSpec {
        id: ActionId::EventCopyToChannels,
        text: "Copy to &Channels...",
        status_tip: "Copy the selected event to other channels",
        shortcut: None,
        groups: &[G::EditMenu, G::EventContext],
        enabled_when: one_channel_event_selected,
    },
    ActionSpec {
        id: ActionId::EventChangeType,
        text: "Change &Type...",
        status_tip: "Change the type of the selected event",
        shortcut: None,
        groups: &[G::EditMenu, G::EventContext],
        enabled_when: event_selected,
    },
    ActionSpec {
        id: ActionId::ViewZoomIn,
        text: "Zoom &In",
        status_tip: "Zoom in all channels",
        shortcut: key(Modifier::Ctrl, '+'),
        groups: &[G::ViewMenu, G::ViewToolbar],
        enabled_when: file_open,
    },
    ActionSpec {
        id: ActionId::ViewZoomOut,
        text: "Zoom &Out",
        status_tip: "Zoom out all channels",
        shortcut: key(Modifier::Ctrl, '-'),
        groups: &[G::ViewMenu, G::ViewToolbar],
        enabled_when: file_open,
    },
    ActionSpec {
        id: ActionId::ViewAutoScale,
        text: "&Auto Scale",
        status_tip: "Autoscale all channels",
        shortcut: None,
        groups: &[G::ViewMenu, G::ViewToolbar],
        enabled_when: file_open,
    },
    ActionSpec {
        id: ActionId::OptionsChangeEventCreationType,
        text: "Set Event Creation Type",
        status_tip: "Change the type of newly created or inserted events",
        shortcut: None,
        groups: &[G::OptionsMenu],
        enabled_when: file_open,
    },
    ActionSpec {
        id: ActionId::ShowSettings,
        text: "Settings",
        status_tip: "Shows the settings dialog",
        shortcut: None,
        groups: &[G::OptionsMenu],
        enabled_when: file_open,
    },
    ActionSpec {
        id: ActionId::CalculateMeans,
        text: "Calculate Mean",
        status_tip: "Calculates mean of selected event type",
        shortcut: None,
        groups: &[G::ToolsMenu],
        enabled_when: file_open,
    },
];

pub fn spec(id: ActionId) -> Option<&'static ActionSpec> {
    ACTIONS.iter().find(|a| a.id == id)
}

/// Menu/toolbar layout of `group`, separators included.
pub fn group_entries(group: ActionGroup) -> Vec<GroupEntry> {
    use ActionId as A;
    use GroupEntry::{Action, Separator};
    match group {
        G::FileMenu => vec![
            Action(A::FileOpen),
            Action(A::FileSave),
            Action(A::FileSaveAs),
            Separator,
            Action(A::FileExportEvents),
            Action(A::FileInfo),
            Separator,
            Action(A::FileClose),
            Separator,
            Action(A::Exit),
        ],
        G::EditMenu => vec![
            Action(A::EditUndo),
            Action(A::EditRedo),
            Separator,
            Action(A::EventDelete),
            Action(A::EventChangeType),
            Separator,
            Action(A::EventChangeChannel),
            Action(A::EventToAllChannels),
            Action(A::EventCopyToChannels),
        ],
        G::EventContext => vec![
            Action(A::EventDelete),
            Action(A::EventChangeType),
            Separator,
            Action(A::EventChangeChannel),
            Action(A::EventToAllChannels),
            Action(A::EventCopyToChannels),
        ],
        G::ViewMenu => vec![
            Action(A::ViewZoomIn),
            Action(A::ViewZoomOut),
            Action(A::ViewAutoScale),
        ],
        G::ViewToolbar => vec![
            Action(A::ViewZoomIn),
            Action(A::ViewZoomOut),
            Action(A::ViewAutoScale),
        ],
        G::OptionsMenu => vec![
            Action(A::ShowSettings),
            Action(A::OptionsChangeEventCreationType),
        ],
        G::ToolsMenu => vec![Action(A::CalculateMeans)],
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Manager
// ─────────────────────────────────────────────────────────────────────────────

pub struct ActionManager {
    state: GuiState,
    enabled: IndexMap<ActionId, bool>,
    shortcut_overrides: BTreeMap<ActionId, Option<Hotkey>>,
}

impl Default for ActionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionManager {
    pub fn new() -> Self {
        let state = GuiState::default();
        let enabled = ACTIONS
            .iter()
            .map(|a| (a.id, (a.enabled_when)(&state)))
            .collect();
        Self {
            state,
            enabled,
            shortcut_overrides: BTreeMap::new(),
        }
    }

    pub fn state(&self) -> GuiState {
        self.state
    }

    pub fn set_application_state(&mut self, application: ApplicationState) -> Vec<ActionId> {
        self.set_state(GuiState {
            application,
            ..self.state
        })
    }

    pub fn set_file_state(&mut self, file: FileState) -> Vec<ActionId> {
        self.set_state(GuiState { file, ..self.state })
    }

    pub fn set_tab_selection_state(&mut self, tab_selection: TabSelectionState) -> Vec<ActionId> {
        self.set_state(GuiState {
            tab_selection,
            ..self.state
        })
    }

    pub fn set_tab_edit_state(&mut self, tab_edit: TabEditState) -> Vec<ActionId> {
        self.set_state(GuiState {
            tab_edit,
            ..self.state
        })
    }

    /// Switch to `state` and return the actions whose enabled flag flipped.
    pub fn set_state(&mut self, state: GuiState) -> Vec<ActionId> {
        self.state = state;
        let mut changed = Vec::new();
        for spec in ACTIONS {
            let now = (spec.enabled_when)(&self.state);
            let before = self.enabled.insert(spec.id, now);
            if before != Some(now) {
                changed.push(spec.id);
            }
        }
        if !changed.is_empty() {
            log::debug!("ActionManager: {:?} changed {} action(s)", self.state, changed.len());
        }
        changed
    }

    pub fn is_enabled(&self, id: ActionId) -> bool {
        self.enabled.get(&id).copied().unwrap_or(false)
    }

    pub fn enabled_actions(&self) -> Vec<ActionId> {
        self.enabled
            .iter()
            .filter(|(_, on)| **on)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Group entries paired with their enabled flag (`None` for separators).
    pub fn group_state(&self, group: ActionGroup) -> Vec<(GroupEntry, Option<bool>)> {
        group_entries(group)
            .into_iter()
            .map(|entry| match entry {
                GroupEntry::Action(id) => (entry, Some(self.is_enabled(id))),
                GroupEntry::Separator => (entry, None),
            })
            .collect()
    }

    // ── Shortcuts ────────────────────────────────────────────────────────────

    /// Effective shortcut: the user override if set, else the table default.
    pub fn shortcut(&self, id: ActionId) -> Option<Hotkey> {
        match self.shortcut_overrides.get(&id) {
            Some(overridden) => *overridden,
            None => spec(id).and_then(|s| s.shortcut),
        }
    }

    /// Override the shortcut of `id`; `None` removes it.
    pub fn set_shortcut(&mut self, id: ActionId, hotkey: Option<Hotkey>) {
        self.shortcut_overrides.insert(id, hotkey);
    }

    pub fn reset_shortcuts(&mut self) {
        self.shortcut_overrides.clear();
    }

    /// The enabled action bound to a key press, if any.
    pub fn action_for_key(&self, modifier: Modifier, key: char) -> Option<ActionId> {
        ACTIONS
            .iter()
            .map(|a| a.id)
            .filter(|id| self.is_enabled(*id))
            .find(|id| self.shortcut(*id).is_some_and(|hk| hk.matches(modifier, key)))
    }

    pub fn tooltip(&self, id: ActionId) -> Option<String> {
        let spec = spec(id)?;
        Some(crate::hotkeys::format_tooltip(
            spec.status_tip,
            self.shortcut(id).as_ref(),
        ))
    }

    pub fn shortcuts_to_yaml(&self) -> Result<String, String> {
        serde_yaml::to_string(&self.shortcut_overrides).map_err(|e| format!("Serialization error: {}", e))
    }

    pub fn load_shortcuts_yaml(&mut self, yaml: &str) -> Result<(), String> {
        let overrides: BTreeMap<ActionId, Option<Hotkey>> =
            serde_yaml::from_str(yaml).map_err(|e| format!("Deserialization error: {}", e))?;
        self.shortcut_overrides = overrides;
        Ok(())
    }
}

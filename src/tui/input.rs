//! Key routing for the lab.
//!
//! Keys resolve to [`InputAction`]s in two layers: the help overlay, when
//! open, swallows everything except its own close keys and `Ctrl-C`; otherwise
//! the global key map applies.

#![allow(missing_docs)]

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::core::config::RenderMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Quit,
    ToggleMode,
    SetMode(RenderMode),
    GrowDataset,
    ShrinkDataset,
    Regenerate,
    ToggleHeavy,
    FasterUpdates,
    SlowerUpdates,
    CursorUp,
    CursorDown,
    PageUp,
    PageDown,
    Home,
    End,
    EditRow,
    DeleteRow,
    ToggleHelp,
    CloseHelp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputResolution {
    pub action: Option<InputAction>,
    pub consumed: bool,
}

impl InputResolution {
    const fn action(action: InputAction) -> Self {
        Self {
            action: Some(action),
            consumed: true,
        }
    }

    const fn consumed_without_action() -> Self {
        Self {
            action: None,
            consumed: true,
        }
    }

    const fn passthrough() -> Self {
        Self {
            action: None,
            consumed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelpBinding {
    pub keys: &'static str,
    pub description: &'static str,
}

/// Resolve a key press. Key releases and repeats on platforms that report
/// them are ignored.
#[must_use]
pub fn resolve_key_event(key: &KeyEvent, help_open: bool) -> InputResolution {
    if key.kind == KeyEventKind::Release {
        return InputResolution::passthrough();
    }
    if help_open {
        return resolve_help_key(key);
    }
    resolve_global_key(key)
}

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

fn resolve_help_key(key: &KeyEvent) -> InputResolution {
    if is_ctrl_c(key) {
        return InputResolution::action(InputAction::Quit);
    }
    match key.code {
        KeyCode::Esc | KeyCode::Char('?' | 'q') => InputResolution::action(InputAction::CloseHelp),
        _ => InputResolution::consumed_without_action(),
    }
}

fn resolve_global_key(key: &KeyEvent) -> InputResolution {
    if is_ctrl_c(key) {
        return InputResolution::action(InputAction::Quit);
    }
    let action = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => InputAction::Quit,
        KeyCode::Char('m') => InputAction::ToggleMode,
        KeyCode::Char('o') => InputAction::SetMode(RenderMode::Optimized),
        KeyCode::Char('u') => InputAction::SetMode(RenderMode::Unoptimized),
        KeyCode::Char('+' | '=') => InputAction::GrowDataset,
        KeyCode::Char('-') => InputAction::ShrinkDataset,
        KeyCode::Char('g') => InputAction::Regenerate,
        KeyCode::Char('h') => InputAction::ToggleHeavy,
        KeyCode::Char(']') => InputAction::SlowerUpdates,
        KeyCode::Char('[') => InputAction::FasterUpdates,
        KeyCode::Up | KeyCode::Char('k') => InputAction::CursorUp,
        KeyCode::Down | KeyCode::Char('j') => InputAction::CursorDown,
        KeyCode::PageUp => InputAction::PageUp,
        KeyCode::PageDown => InputAction::PageDown,
        KeyCode::Home => InputAction::Home,
        KeyCode::End => InputAction::End,
        KeyCode::Char('e') | KeyCode::Enter => InputAction::EditRow,
        KeyCode::Char('d') | KeyCode::Delete => InputAction::DeleteRow,
        KeyCode::Char('?') => InputAction::ToggleHelp,
        _ => return InputResolution::passthrough(),
    };
    InputResolution::action(action)
}

/// Bindings listed by the help overlay, in display order.
#[must_use]
pub const fn help_bindings() -> &'static [HelpBinding] {
    &HELP_BINDINGS
}

const HELP_BINDINGS: [HelpBinding; 12] = [
    HelpBinding {
        keys: "m / o / u",
        description: "Toggle mode / force optimized / force unoptimized",
    },
    HelpBinding {
        keys: "+ / -",
        description: "Dataset size +/- 1000 (regenerates)",
    },
    HelpBinding {
        keys: "g",
        description: "Regenerate dataset",
    },
    HelpBinding {
        keys: "h",
        description: "Toggle heavy computation",
    },
    HelpBinding {
        keys: "] / [",
        description: "Background update interval +/- 100 ms",
    },
    HelpBinding {
        keys: "Up/Down j/k",
        description: "Move selection",
    },
    HelpBinding {
        keys: "PgUp/PgDn",
        description: "Move selection by a page",
    },
    HelpBinding {
        keys: "Home/End",
        description: "First / last row",
    },
    HelpBinding {
        keys: "e / Enter",
        description: "Edit selected row",
    },
    HelpBinding {
        keys: "d / Del",
        description: "Delete selected row",
    },
    HelpBinding {
        keys: "?",
        description: "Toggle this help",
    },
    HelpBinding {
        keys: "q / Esc / Ctrl-C",
        description: "Quit",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn resolve(code: KeyCode) -> Option<InputAction> {
        resolve_key_event(&key(code), false).action
    }

    #[test]
    fn global_key_map() {
        assert_eq!(resolve(KeyCode::Char('m')), Some(InputAction::ToggleMode));
        assert_eq!(
            resolve(KeyCode::Char('o')),
            Some(InputAction::SetMode(RenderMode::Optimized))
        );
        assert_eq!(resolve(KeyCode::Char('+')), Some(InputAction::GrowDataset));
        assert_eq!(resolve(KeyCode::Char('-')), Some(InputAction::ShrinkDataset));
        assert_eq!(resolve(KeyCode::Char(']')), Some(InputAction::SlowerUpdates));
        assert_eq!(resolve(KeyCode::Char('j')), Some(InputAction::CursorDown));
        assert_eq!(resolve(KeyCode::Delete), Some(InputAction::DeleteRow));
        assert_eq!(resolve(KeyCode::Esc), Some(InputAction::Quit));
        assert_eq!(resolve(KeyCode::Char('z')), None);
    }

    #[test]
    fn ctrl_c_quits_everywhere() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(resolve_key_event(&ctrl_c, false).action, Some(InputAction::Quit));
        assert_eq!(resolve_key_event(&ctrl_c, true).action, Some(InputAction::Quit));
    }

    #[test]
    fn help_overlay_swallows_other_keys() {
        let res = resolve_key_event(&key(KeyCode::Char('d')), true);
        assert!(res.consumed);
        assert!(res.action.is_none());
        assert_eq!(
            resolve_key_event(&key(KeyCode::Esc), true).action,
            Some(InputAction::CloseHelp)
        );
    }

    #[test]
    fn releases_are_ignored() {
        let mut release = key(KeyCode::Char('q'));
        release.kind = KeyEventKind::Release;
        let res = resolve_key_event(&release, false);
        assert!(!res.consumed);
    }

    #[test]
    fn help_lists_every_global_action_key() {
        let keys: Vec<&str> = help_bindings().iter().map(|b| b.keys).collect();
        assert!(keys.iter().any(|k| k.contains("PgUp")));
        assert!(keys.iter().any(|k| k.contains("Ctrl-C")));
        assert_eq!(keys.len(), 12);
    }
}

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{App, Effect};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    None,
    Quit,
    /// Spawn the lookup and feed its outcome back into the app
    Dispatch(Effect),
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{Backspace, Char, Down, Enter, Esc, Up};

    if key.kind == KeyEventKind::Release {
        return Action::None;
    }

    // Plain letters belong to the postcode, so quitting needs Ctrl
    if key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, Char('c' | 'q')) {
        return Action::Quit;
    }

    let effect = match key.code {
        Up => {
            app.highlight_previous();
            None
        }
        Down => {
            app.highlight_next();
            None
        }
        Enter => app.select_highlighted(),
        // Clearing never leaves the screen
        Esc => {
            app.clear();
            None
        }
        Backspace => {
            let mut postcode = app.postcode.clone();
            if postcode.pop().is_none() {
                return Action::None;
            }
            app.set_postcode(postcode)
        }
        Char(character)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            let mut postcode = app.postcode.clone();
            postcode.push(character);
            app.set_postcode(postcode)
        }
        _ => None,
    };

    effect.map_or(Action::None, Action::Dispatch)
}

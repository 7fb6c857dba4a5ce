// Keyboard as a gamepad: WASD left stick, IJKL right stick, Space/B/X/Y buttons,
// Q or Esc stops the run. Input decays to neutral after KEYBOARD_HOLD with no keys.

use std::io;
use std::time::Instant;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use tracing::info;

use super::GamepadFeed;
use crate::config::{KEYBOARD_HOLD, KEYBOARD_POLL};
use crate::messages::GamepadState;
use crate::op::StopHandle;

/// What a key press did to the emulated gamepad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Updated,
    Quit,
    Ignored,
}

/// Fold one key into `state`.
///
/// A stick key points its stick straight along one axis; terminals only repeat the
/// last key held, so the other axis of that stick is released.
pub fn apply_key(state: &mut GamepadState, code: KeyCode) -> KeyAction {
    match code {
        KeyCode::Char('w') => (state.left_stick.x, state.left_stick.y) = (0.0, 1.0),
        KeyCode::Char('s') => (state.left_stick.x, state.left_stick.y) = (0.0, -1.0),
        KeyCode::Char('a') => (state.left_stick.x, state.left_stick.y) = (-1.0, 0.0),
        KeyCode::Char('d') => (state.left_stick.x, state.left_stick.y) = (1.0, 0.0),

        KeyCode::Char('i') => (state.right_stick.x, state.right_stick.y) = (0.0, 1.0),
        KeyCode::Char('k') => (state.right_stick.x, state.right_stick.y) = (0.0, -1.0),
        KeyCode::Char('j') => (state.right_stick.x, state.right_stick.y) = (-1.0, 0.0),
        KeyCode::Char('l') => (state.right_stick.x, state.right_stick.y) = (1.0, 0.0),

        KeyCode::Char(' ') => state.buttons.a = true,
        KeyCode::Char('b') => state.buttons.b = true,
        KeyCode::Char('x') => state.buttons.x = true,
        KeyCode::Char('y') => state.buttons.y = true,

        KeyCode::Up => state.dpad.up = true,
        KeyCode::Down => state.dpad.down = true,
        KeyCode::Left => state.dpad.left = true,
        KeyCode::Right => state.dpad.right = true,

        KeyCode::Char('q') | KeyCode::Esc => return KeyAction::Quit,
        _ => return KeyAction::Ignored,
    }
    KeyAction::Updated
}

/// Poll the terminal and publish into `feed` until `stop` fires or Q is pressed.
///
/// Blocks the calling thread; run it on a blocking task.
pub fn run(feed: GamepadFeed, stop: StopHandle) -> io::Result<()> {
    info!("Keyboard gamepad: WASD=left stick, IJKL=right stick, Space/B/X/Y=buttons, Q=quit");
    enable_raw_mode()?;
    let result = poll_loop(&feed, &stop);
    disable_raw_mode()?;
    result
}

fn poll_loop(feed: &GamepadFeed, stop: &StopHandle) -> io::Result<()> {
    let mut state = GamepadState::neutral();
    let mut last_input = Instant::now();

    while !stop.is_stopped() {
        if event::poll(KEYBOARD_POLL)? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;
                if pressed {
                    match apply_key(&mut state, code) {
                        KeyAction::Updated => last_input = Instant::now(),
                        KeyAction::Quit => {
                            info!("Quit requested from keyboard");
                            stop.stop();
                            break;
                        }
                        KeyAction::Ignored => {}
                    }
                }
            }
        }

        // Terminals only report presses, so a held key is a stream of repeats
        if last_input.elapsed() > KEYBOARD_HOLD {
            state = GamepadState::neutral();
        }

        feed.publish(state);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wasd_drives_left_stick() {
        let mut state = GamepadState::neutral();
        assert_eq!(apply_key(&mut state, KeyCode::Char('w')), KeyAction::Updated);
        assert_eq!((state.left_stick.x, state.left_stick.y), (0.0, 1.0));
        assert_eq!(state.right_stick, Default::default());
    }

    #[test]
    fn test_switching_keys_never_leaves_unit_circle() {
        let mut state = GamepadState::neutral();
        apply_key(&mut state, KeyCode::Char('w'));
        apply_key(&mut state, KeyCode::Char('d'));
        assert_eq!((state.left_stick.x, state.left_stick.y), (1.0, 0.0));
        assert_eq!(state.left_stick.magnitude(), 1.0);

        apply_key(&mut state, KeyCode::Char('s'));
        assert_eq!((state.left_stick.x, state.left_stick.y), (0.0, -1.0));
    }

    #[test]
    fn test_ijkl_drives_right_stick() {
        let mut state = GamepadState::neutral();
        apply_key(&mut state, KeyCode::Char('j'));
        apply_key(&mut state, KeyCode::Char('k'));
        assert_eq!((state.right_stick.x, state.right_stick.y), (0.0, -1.0));
        assert_eq!(state.left_stick, Default::default());
    }

    #[test]
    fn test_buttons_and_quit() {
        let mut state = GamepadState::neutral();
        apply_key(&mut state, KeyCode::Char(' '));
        apply_key(&mut state, KeyCode::Up);
        assert!(state.a());
        assert!(state.dpad.up);

        assert_eq!(apply_key(&mut state, KeyCode::Esc), KeyAction::Quit);
        assert_eq!(apply_key(&mut state, KeyCode::Char('z')), KeyAction::Ignored);
    }
}

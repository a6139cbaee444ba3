/// Held-key tracking for the four direction keys.
///
/// Terminals report keys in one of two ways:
/// * **Keyboard-enhancement capable** (kitty protocol): real `Release`
///   events, so a key is held from its press until its release.
/// * **Classic terminals**: presses only, with OS auto-repeat showing up as
///   more presses.  A single tap moves for exactly the frame it arrived in.
///   Once a second press/repeat shows the key is being held, it stays live
///   for `HOLD_WINDOW` frames after the last one.  The OS waits 250-500 ms
///   before the first repeat, so a held key moves once, pauses, then moves
///   continuously; nothing can be done about that without release events.
use std::collections::HashMap;

use crossterm::event::KeyCode;

use crate::entities::Input;

/// Frames a repeating key stays live after its last event on classic
/// terminals.  Auto-repeat runs at 15 Hz or faster, so 4 frames at 30 FPS
/// (≈133 ms) covers the gap between repeats.
pub const HOLD_WINDOW: u64 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct KeySeen {
    first: u64,
    last: u64,
}

#[derive(Debug, Default)]
pub struct KeyTracker {
    release_events: bool,
    keys: HashMap<KeyCode, KeySeen>,
}

impl KeyTracker {
    /// `release_events` is true when the terminal reports key releases.
    pub fn new(release_events: bool) -> Self {
        Self {
            release_events,
            keys: HashMap::new(),
        }
    }

    /// Record a press or auto-repeat of `key` during `frame`.
    pub fn press(&mut self, key: KeyCode, frame: u64) {
        self.keys
            .entry(key)
            .and_modify(|seen| seen.last = frame)
            .or_insert(KeySeen { first: frame, last: frame });
    }

    pub fn release(&mut self, key: KeyCode) {
        self.keys.remove(&key);
    }

    pub fn is_held(&self, key: KeyCode, frame: u64) -> bool {
        let Some(seen) = self.keys.get(&key) else {
            return false;
        };
        if self.release_events || seen.last == frame {
            return true;
        }
        // A lone tap never lingers.
        seen.last != seen.first && frame.saturating_sub(seen.last) <= HOLD_WINDOW
    }

    /// Drop classic-terminal keys whose hold window has run out, so the
    /// next press of that key starts a fresh tap.
    pub fn expire(&mut self, frame: u64) {
        if self.release_events {
            return;
        }
        self.keys
            .retain(|_, seen| frame.saturating_sub(seen.last) <= HOLD_WINDOW);
    }

    pub fn input(&self, frame: u64) -> Input {
        Input {
            left: self.is_held(KeyCode::Left, frame),
            right: self.is_held(KeyCode::Right, frame),
            up: self.is_held(KeyCode::Up, frame),
            down: self.is_held(KeyCode::Down, frame),
        }
    }
}

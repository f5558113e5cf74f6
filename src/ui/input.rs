/// Input state tracker: held keys plus the pointer.
///
/// Key tracking enables continuous thrust while a key is held. Crossterm's
/// keyboard enhancement delivers Release events where supported; on
/// terminals that never report releases, a hold times out shortly after
/// the last Press/Repeat instead.
///
/// The pointer is the mouse position in terminal cells from this frame's
/// Move/Drag events (mouse capture must be on); absent on frames where
/// the mouse did not move.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, MouseEventKind, poll};

/// After this duration without a Press/Repeat event, consider the key
/// released. Only matters when the terminal doesn't report Release.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct InputState {
    /// Timestamp of the last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that transitioned "not held" → "held" during the most recent
    /// drain_events() call. Used for edge-triggered actions (pause, mute).
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,

    /// Pointer position in terminal (column, row) from the most recent
    /// drain, set only when a mouse event arrived that frame.
    fresh_pointer: Option<(u16, u16)>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(8),
            fresh_presses: Vec::with_capacity(4),
            raw_events: Vec::with_capacity(4),
            honor_release: false,
            fresh_pointer: None,
        }
    }

    /// Drain all pending terminal events and update key/pointer state.
    /// Call once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();
        self.fresh_pointer = None;

        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => {
                    self.raw_events.push(key);

                    match key.kind {
                        KeyEventKind::Release if self.honor_release => {
                            self.last_active.remove(&key.code);
                        }
                        KeyEventKind::Release => {
                            // Enhancement not confirmed: let the hold
                            // expire via timeout instead.
                        }
                        _ => {
                            let was_held = self.is_held_inner(key.code);
                            self.last_active.insert(key.code, Instant::now());
                            if !was_held {
                                self.fresh_presses.push(key.code);
                            }
                        }
                    }
                }
                Ok(Event::Mouse(mouse)) => match mouse.kind {
                    MouseEventKind::Moved
                    | MouseEventKind::Drag(_)
                    | MouseEventKind::Down(_) => {
                        self.fresh_pointer = Some((mouse.column, mouse.row));
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        // Expire keys that timed out (terminals without Release events).
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    /// Is any of these keys currently held? (continuous actions)
    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held_inner(*c))
    }

    /// Was any of these keys freshly pressed this frame? (edge trigger)
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh_presses.contains(c))
    }

    /// Pointer position in terminal cells, if the mouse moved this frame.
    pub fn pointer_moved(&self) -> Option<(u16, u16)> {
        self.fresh_pointer
    }

    /// Did any raw event this frame carry Ctrl+C?
    pub fn ctrl_c_pressed(&self) -> bool {
        use crossterm::event::KeyModifiers;
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    // ── Internal ──

    fn is_held_inner(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}

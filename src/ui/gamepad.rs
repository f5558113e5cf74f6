/// Gamepad input tracker using gilrs.
///
/// Mapping:
///   Left Stick        →  moves the steering cursor
///   A (South) / R2    →  thrust forward
///   B (East)  / L2    →  thrust reverse
///
/// The stick emits a velocity for a virtual cursor owned by the caller;
/// keyboard + mouse stay the primary input and simply win whenever the
/// pad is idle.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

const STICK_DEADZONE: f32 = 0.25;

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    thrust_held: bool,
    reverse_held: bool,
    stick_x: f32,
    stick_y: f32,

    #[allow(dead_code)]
    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(_) => (None, false),
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            thrust_held: false,
            reverse_held: false,
            stick_x: 0.0,
            stick_y: 0.0,
            connected,
        }
    }

    /// Drain pad events. Call once per frame.
    pub fn update(&mut self) {
        #[cfg(feature = "gamepad")]
        {
            let gilrs = match self.gilrs.as_mut() {
                Some(g) => g,
                None => return,
            };
            while let Some(ev) = gilrs.next_event() {
                match ev.event {
                    EventType::ButtonPressed(btn, _) => match btn {
                        Button::South | Button::RightTrigger2 => self.thrust_held = true,
                        Button::East | Button::LeftTrigger2 => self.reverse_held = true,
                        _ => {}
                    },
                    EventType::ButtonReleased(btn, _) => match btn {
                        Button::South | Button::RightTrigger2 => self.thrust_held = false,
                        Button::East | Button::LeftTrigger2 => self.reverse_held = false,
                        _ => {}
                    },
                    EventType::AxisChanged(Axis::LeftStickX, v, _) => self.stick_x = v,
                    EventType::AxisChanged(Axis::LeftStickY, v, _) => self.stick_y = v,
                    EventType::Connected => self.connected = true,
                    EventType::Disconnected => {
                        self.connected = false;
                        self.thrust_held = false;
                        self.reverse_held = false;
                        self.stick_x = 0.0;
                        self.stick_y = 0.0;
                    }
                    _ => {}
                }
            }
        }
    }

    pub fn thrust_held(&self) -> bool {
        self.thrust_held
    }

    pub fn reverse_held(&self) -> bool {
        self.reverse_held
    }

    /// Cursor velocity from the stick, screen pixels per frame.
    /// None inside the deadzone. Stick Y is up-positive; screen Y grows
    /// downward, hence the flip.
    pub fn cursor_velocity(&self) -> Option<(f32, f32)> {
        let mag = (self.stick_x * self.stick_x + self.stick_y * self.stick_y).sqrt();
        if mag < STICK_DEADZONE {
            return None;
        }
        const CURSOR_SPEED: f32 = 9.0;
        Some((self.stick_x * CURSOR_SPEED, -self.stick_y * CURSOR_SPEED))
    }
}

/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound.

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GameEvent {
    CoinCollected { x: f32, y: f32 },
}

/// WorldState: the complete snapshot of a running game, and the camera.
///
/// One writer: everything here is mutated only from the tick in
/// `sim::step` (plus level loading). The camera's viewport dimensions are
/// the exception — the renderer refreshes them every frame from the
/// terminal size, before the tick reads them.
///
/// Randomness is a seeded Pcg32 owned by the world and threaded into
/// every roll (coin placement, bob phase, blink reseed), so a fixed seed
/// replays a fixed game.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::domain::entity::{Coin, Player, Target};
use crate::domain::tile::TileGrid;

/// Easing factor per axis per tick.
const CAMERA_EASE: f32 = 0.1;

/// Within this distance of the goal the offset snaps exactly, ending the
/// asymptotic creep.
const CAMERA_SNAP: f32 = 0.1;

/// Viewport into the world: `(xo, yo)` is subtracted from world
/// coordinates when drawing.
#[derive(Clone, Debug)]
pub struct Camera {
    pub xo: f32,
    pub yo: f32,
    /// Viewport width in world pixels. Set by the renderer.
    pub view_w: f32,
    /// Viewport height in world pixels. Set by the renderer.
    pub view_h: f32,
}

impl Camera {
    pub fn new() -> Self {
        Camera { xo: 0.0, yo: 0.0, view_w: 0.0, view_h: 0.0 }
    }

    /// Back to the origin (level load). Viewport dimensions stay.
    pub fn reset(&mut self) {
        self.xo = 0.0;
        self.yo = 0.0;
    }

    /// Ease the offset toward centering (px, py), snap when close, clamp.
    pub fn follow(&mut self, px: f32, py: f32) {
        let goal_x = px - self.view_w / 2.0;
        let goal_y = py - self.view_h / 2.0;

        self.xo += (goal_x - self.xo) * CAMERA_EASE;
        self.yo += (goal_y - self.yo) * CAMERA_EASE;

        if (self.xo - goal_x).abs() < CAMERA_SNAP {
            self.xo = goal_x;
        }
        if (self.yo - goal_y).abs() < CAMERA_SNAP {
            self.yo = goal_y;
        }

        self.clamp();
    }

    /// Clamp both axes into [0, viewport dimension]. Note: the bound is
    /// the viewport's own size, not the level's pixel bounds, so on large
    /// levels the camera stays near the origin.
    fn clamp(&mut self) {
        self.xo = self.xo.clamp(0.0, self.view_w);
        self.yo = self.yo.clamp(0.0, self.view_h);
    }
}

pub struct WorldState {
    // ── Level ──
    pub grid: TileGrid,
    pub level_name: String,

    // ── Entities ──
    pub player: Player,
    pub coins: Vec<Coin>,
    pub target: Target,

    // ── View ──
    pub camera: Camera,

    // ── Meta ──
    pub paused: bool,
    pub tick: u64,
    pub coins_collected: usize,

    // ── Injected randomness ──
    pub rng: Pcg32,
}

impl WorldState {
    pub fn new(seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        WorldState {
            grid: TileGrid::empty(),
            level_name: String::new(),
            player: Player::new(0.0, 0.0, &mut rng),
            coins: Vec::new(),
            target: Target::default(),
            camera: Camera::new(),
            paused: false,
            tick: 0,
            coins_collected: 0,
            rng,
        }
    }

    /// Coins still sitting on the field (not collected, not vanishing).
    pub fn coins_remaining(&self) -> usize {
        self.coins.iter().filter(|c| c.vanish_timer == -1).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(view_w: f32, view_h: f32) -> Camera {
        let mut c = Camera::new();
        c.view_w = view_w;
        c.view_h = view_h;
        c
    }

    #[test]
    fn camera_eases_toward_goal() {
        let mut c = camera(720.0, 480.0);
        c.follow(400.0, 400.0); // goal = (40, 160)
        assert!((c.xo - 4.0).abs() < 1e-4);
        assert!((c.yo - 16.0).abs() < 1e-4);
    }

    #[test]
    fn camera_snaps_when_close() {
        let mut c = camera(720.0, 480.0);
        // goal = (40, 160); start within 0.1 of it on both axes
        c.xo = 39.95;
        c.yo = 159.92;
        c.follow(400.0, 400.0);
        assert_eq!(c.xo, 40.0); // exact, no residual drift
        assert_eq!(c.yo, 160.0);
    }

    #[test]
    fn camera_converges_in_bounded_ticks() {
        let mut c = camera(720.0, 480.0);
        for _ in 0..200 {
            c.follow(400.0, 400.0);
        }
        assert_eq!((c.xo, c.yo), (40.0, 160.0));
    }

    #[test]
    fn camera_clamps_to_viewport_dims() {
        // Goal far negative: offset floors at 0.
        let mut c = camera(720.0, 480.0);
        c.follow(0.0, 0.0);
        assert_eq!((c.xo, c.yo), (0.0, 0.0));

        // Goal far past the viewport size: offset ceils at (view_w, view_h),
        // not at the level bounds.
        let mut c = camera(720.0, 480.0);
        c.xo = 720.0;
        c.yo = 480.0;
        c.follow(5000.0, 5000.0);
        assert_eq!((c.xo, c.yo), (720.0, 480.0));
    }

    #[test]
    fn fixed_seed_reproduces_rolls() {
        use rand::Rng;
        let mut a = WorldState::new(123);
        let mut b = WorldState::new(123);
        for _ in 0..16 {
            let ra: u32 = a.rng.random();
            let rb: u32 = b.rng.random();
            assert_eq!(ra, rb);
        }
    }
}

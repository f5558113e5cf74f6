/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Player movement (thrust → integrate → clamp → aim → damp → blink)
///   2. Coin pickup scan (insertion order, first overlap only)
///   3. Camera follow
///   4. Coin vanish timers, then deferred compaction
///   5. Target ← cursor + camera offset
///
/// A set `paused` flag suppresses the entire step; rendering stays live.

use crate::domain::entity::{COIN_SIZE, PLAYER_SIZE};
use crate::domain::physics;
use crate::sim::event::GameEvent;
use crate::sim::world::WorldState;

/// Acceleration per tick while a thrust key is held.
const THRUST_ACCEL: f32 = 0.4;

/// Per-axis distance to the target below which the facing stays put.
/// Both axes must exceed it before re-aiming (an AND gate, not a radius),
/// which keeps the facing steady when the cursor hovers near the player.
const AIM_DEADZONE: f32 = 3.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Thrust {
    Forward,
    Reverse,
}

/// Input snapshot for one tick.
#[derive(Clone, Copy, Debug)]
pub struct FrameInput {
    /// Held movement axis, if any. Forward wins when both keys are down.
    pub thrust: Option<Thrust>,
    /// Pointer position in viewport-local pixels.
    pub cursor: (f32, f32),
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: FrameInput) -> Vec<GameEvent> {
    if world.paused {
        return vec![];
    }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;

    resolve_player_movement(world, input.thrust);
    resolve_coin_pickup(world, &mut events);
    world.camera.follow(world.player.x, world.player.y);
    resolve_coin_timers(world);
    resolve_target(world, input.cursor);

    events
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn resolve_player_movement(world: &mut WorldState, thrust: Option<Thrust>) {
    let bound_w = world.grid.pixel_width();
    let bound_h = world.grid.pixel_height();
    let (tx, ty) = (world.target.x, world.target.y);
    let p = &mut world.player;

    // Thrust along the facing direction. Else-if: never both in one tick.
    match thrust {
        Some(Thrust::Forward) => {
            p.xv += p.dir.cos() * THRUST_ACCEL;
            p.yv += p.dir.sin() * THRUST_ACCEL;
        }
        Some(Thrust::Reverse) => {
            p.xv -= p.dir.cos() * THRUST_ACCEL;
            p.yv -= p.dir.sin() * THRUST_ACCEL;
        }
        None => {}
    }

    // Integrate, then keep the whole box inside the grid.
    p.x += p.xv;
    p.y += p.yv;
    let half = PLAYER_SIZE / 2.0;
    p.x = physics::clamp_center(p.x, half, bound_w);
    p.y = physics::clamp_center(p.y, half, bound_h);

    // Re-aim toward the target, gated per axis.
    let dx = tx - p.x;
    let dy = ty - p.y;
    if dx.abs() > AIM_DEADZONE && dy.abs() > AIM_DEADZONE {
        p.dir = dy.atan2(dx);
    }

    p.xv = physics::damp_axis(p.xv);
    p.yv = physics::damp_axis(p.yv);

    p.blink_timer -= 1;
    if p.blink_timer <= 0 {
        p.reseed_blink(&mut world.rng);
    }
}

// ══════════════════════════════════════════════════════════════
// Coins
// ══════════════════════════════════════════════════════════════

fn resolve_coin_pickup(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let (px, py) = (world.player.x, world.player.y);

    // Insertion-order scan; only the first overlapping coin counts this
    // tick. A vanishing coin can still be the first hit — its collect()
    // is then a silent no-op.
    let hit = world.coins.iter().position(|c| {
        physics::boxes_overlap(
            px, py, PLAYER_SIZE, PLAYER_SIZE,
            c.x, c.y, COIN_SIZE, COIN_SIZE,
        )
    });

    if let Some(i) = hit {
        let coin = &mut world.coins[i];
        if coin.collect() {
            world.coins_collected += 1;
            events.push(GameEvent::CoinCollected { x: coin.x, y: coin.y });
        }
    }
}

fn resolve_coin_timers(world: &mut WorldState) {
    // Deferred removal: tick every coin first, compact afterwards.
    let mut expired: Vec<usize> = Vec::new();
    for (i, coin) in world.coins.iter_mut().enumerate() {
        if coin.tick() {
            expired.push(i);
        }
    }
    for &i in expired.iter().rev() {
        world.coins.remove(i);
    }
}

// ══════════════════════════════════════════════════════════════
// Target
// ══════════════════════════════════════════════════════════════

fn resolve_target(world: &mut WorldState, cursor: (f32, f32)) {
    // The pointer is viewport-local; the target lives in world space.
    world.target.x = cursor.0 + world.camera.xo;
    world.target.y = cursor.1 + world.camera.yo;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Coin;
    use crate::sim::level::{embedded_level, load_level, LevelDef};

    fn idle() -> FrameInput {
        FrameInput { thrust: None, cursor: (0.0, 0.0) }
    }

    fn forward() -> FrameInput {
        FrameInput { thrust: Some(Thrust::Forward), cursor: (0.0, 0.0) }
    }

    fn classic_world() -> WorldState {
        let mut w = WorldState::new(42);
        load_level(&mut w, &embedded_level()).unwrap();
        w
    }

    /// 10x7 field of open tiles, spawn (2, 6): room to roam everywhere.
    fn open_world() -> WorldState {
        let def = LevelDef {
            name: "open".into(),
            width: 10,
            height: 7,
            start_col: 2,
            start_row: 6,
            cells: vec![1; 70],
        };
        let mut w = WorldState::new(42);
        load_level(&mut w, &def).unwrap();
        w
    }

    #[test]
    fn forward_tick_from_spawn() {
        let mut w = classic_world();
        assert_eq!((w.player.x, w.player.y), (120.0, 440.0));
        assert!((w.player.dir - std::f32::consts::FRAC_PI_2).abs() < 1e-6);

        step(&mut w, forward());

        // dir = π/2: thrust is all vertical. yv = 0.4 pre-damping moved
        // the player 0.4 down; post-damping yv = 0.34, xv snapped to 0.
        assert!((w.player.y - 440.4).abs() < 1e-3);
        assert!((w.player.yv - 0.34).abs() < 1e-3);
        assert_eq!(w.player.xv, 0.0);
        assert_eq!(w.tick, 1);
    }

    #[test]
    fn player_never_leaves_the_grid() {
        let mut w = open_world();
        // Aim up-left and burn forward; without the clamp this exits at
        // the top-left corner within ~100 ticks.
        for _ in 0..500 {
            step(&mut w, forward());
            assert!(w.player.x >= 25.0 && w.player.x <= 775.0, "x = {}", w.player.x);
            assert!(w.player.y >= 25.0 && w.player.y <= 535.0, "y = {}", w.player.y);
        }
    }

    #[test]
    fn velocity_dies_out_without_thrust() {
        let mut w = open_world();
        w.player.xv = 3.0;
        w.player.yv = -2.0;
        let mut last = f32::MAX;
        let mut ticks = 0;
        while w.player.xv != 0.0 || w.player.yv != 0.0 {
            step(&mut w, idle());
            let speed = w.player.speed_sq();
            assert!(speed < last, "speed must strictly decrease");
            last = speed;
            ticks += 1;
            assert!(ticks < 60, "velocity never reached zero");
        }
    }

    #[test]
    fn pickup_uses_the_shrunk_overlap() {
        // 0.3 * (50 + 15) = 19.5 px reach on each axis.
        let mut w = open_world();
        w.coins = vec![Coin::new(400.0, 400.0, &mut w.rng)];
        w.player.x = 380.5;
        w.player.y = 380.5;

        let events = step(&mut w, idle());
        assert_eq!(events.len(), 1);
        let GameEvent::CoinCollected { x, y } = events[0];
        assert_eq!((x, y), (400.0, 400.0));
        assert_eq!(w.coins_collected, 1);

        // 20 px away on one axis: no pickup.
        let mut w = open_world();
        w.coins = vec![Coin::new(400.0, 400.0, &mut w.rng)];
        w.player.x = 380.0;
        w.player.y = 400.0;
        assert!(step(&mut w, idle()).is_empty());
    }

    #[test]
    fn one_pickup_per_tick_first_match_wins() {
        let mut w = open_world();
        let a = Coin::new(400.0, 400.0, &mut w.rng);
        let b = Coin::new(405.0, 400.0, &mut w.rng);
        w.coins = vec![a, b];
        w.player.x = 400.0;
        w.player.y = 400.0;

        let events = step(&mut w, idle());
        assert_eq!(events.len(), 1);
        assert_eq!(w.coins[0].vanish_timer, 29); // collected, then ticked once
        assert_eq!(w.coins[1].vanish_timer, -1); // untouched this tick
    }

    #[test]
    fn collected_coin_vanishes_after_31_ticks() {
        let mut w = open_world();
        let mut coin = Coin::new(400.0, 400.0, &mut w.rng);
        coin.vanish_timer = 30;
        w.coins = vec![coin];
        // Park the player far away so nothing else interferes.
        w.player.x = 100.0;
        w.player.y = 100.0;

        for tick in 1..=30 {
            step(&mut w, idle());
            assert_eq!(w.coins.len(), 1, "gone too early at tick {tick}");
        }
        step(&mut w, idle()); // 31st
        assert!(w.coins.is_empty());
    }

    #[test]
    fn re_collecting_a_vanishing_coin_is_silent() {
        let mut w = open_world();
        w.coins = vec![Coin::new(400.0, 400.0, &mut w.rng)];
        w.player.x = 400.0;
        w.player.y = 400.0;

        assert_eq!(step(&mut w, idle()).len(), 1);
        // Still overlapping next tick: no second event, timer keeps counting.
        assert!(step(&mut w, idle()).is_empty());
        assert_eq!(w.coins[0].vanish_timer, 28);
        assert_eq!(w.coins_collected, 1);
    }

    #[test]
    fn target_tracks_cursor_plus_camera() {
        let mut w = open_world();
        w.camera.view_w = 720.0;
        w.camera.view_h = 480.0;

        let input = FrameInput { thrust: None, cursor: (300.0, 200.0) };
        step(&mut w, input);
        assert_eq!(w.target.x, 300.0 + w.camera.xo);
        assert_eq!(w.target.y, 200.0 + w.camera.yo);
    }

    #[test]
    fn aim_deadzone_needs_both_axes() {
        let mut w = open_world();
        w.player.x = 400.0;
        w.player.y = 400.0;
        let dir0 = w.player.dir;

        // Target far on x but within 3 px on y: facing must not change.
        w.target.x = 500.0;
        w.target.y = 402.0;
        resolve_player_movement(&mut w, None);
        assert_eq!(w.player.dir, dir0);

        // Clear of both axes: re-aim fires.
        w.target.x = 500.0;
        w.target.y = 500.0;
        resolve_player_movement(&mut w, None);
        assert!((w.player.dir - std::f32::consts::FRAC_PI_4).abs() < 1e-3);
    }

    #[test]
    fn pause_freezes_the_simulation() {
        let mut w = open_world();
        let (x0, y0) = (w.player.x, w.player.y);
        w.paused = true;

        for _ in 0..10 {
            assert!(step(&mut w, forward()).is_empty());
        }
        assert_eq!(w.tick, 0);
        assert_eq!((w.player.x, w.player.y), (x0, y0));
    }
}

/// Entities: Player, Coin, Target.
/// Movement resolution lives in sim::step; entities hold state plus the
/// small lifecycle transitions that belong to them.

use rand::Rng;

// ── Player ──

/// Player box side, world pixels.
pub const PLAYER_SIZE: f32 = 50.0;

/// Blink countdown reseed range, in ticks. Uniform in [300, 600).
const BLINK_RESEED_MIN: i32 = 300;
const BLINK_RESEED_MAX: i32 = 600;

/// Eyes render closed for the last ticks of the countdown.
const EYES_CLOSED_BELOW: i32 = 10;

#[derive(Clone, Debug)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub xv: f32,
    pub yv: f32,
    /// Facing angle in radians. atan2 output; no wrap normalization needed.
    pub dir: f32,
    /// Ticks until the next eye blink.
    pub blink_timer: i32,
}

impl Player {
    pub fn new(x: f32, y: f32, rng: &mut impl Rng) -> Self {
        let mut p = Player {
            x,
            y,
            xv: 0.0,
            yv: 0.0,
            dir: std::f32::consts::FRAC_PI_2,
            blink_timer: 0,
        };
        p.reseed_blink(rng);
        p
    }

    /// Pick the next blink countdown.
    pub fn reseed_blink(&mut self, rng: &mut impl Rng) {
        self.blink_timer = rng.random_range(BLINK_RESEED_MIN..BLINK_RESEED_MAX);
    }

    /// Eyes are open except for a short window at the end of the countdown.
    pub fn eyes_open(&self) -> bool {
        self.blink_timer > EYES_CLOSED_BELOW
    }

    /// Squared speed, used by the renderer for the motion squash.
    pub fn speed_sq(&self) -> f32 {
        self.xv * self.xv + self.yv * self.yv
    }
}

// ── Coin ──

/// Coin box side, world pixels.
pub const COIN_SIZE: f32 = 15.0;

/// Ticks from collection to removal.
pub const VANISH_TICKS: i32 = 30;

/// A coin's vanish countdown:
///   -1       collectible, sitting on its cell
///   30..=0   collected, counting down to removal
/// Once the countdown decrements below zero the coin leaves the world.
#[derive(Clone, Debug)]
pub struct Coin {
    pub x: f32,
    pub y: f32,
    pub vanish_timer: i32,
    /// Random phase offset for the vertical bob. Cosmetic only.
    pub bob_phase: f32,
}

impl Coin {
    pub fn new(x: f32, y: f32, rng: &mut impl Rng) -> Self {
        Coin {
            x,
            y,
            vanish_timer: -1,
            bob_phase: rng.random_range(0.0..std::f32::consts::TAU),
        }
    }

    /// Collect the coin. Returns true exactly once: the first call arms the
    /// vanish countdown, later calls are no-ops.
    pub fn collect(&mut self) -> bool {
        if self.vanish_timer == -1 {
            self.vanish_timer = VANISH_TICKS;
            true
        } else {
            false
        }
    }

    /// Advance one tick. Returns true when the coin just expired and must
    /// be removed from the world.
    pub fn tick(&mut self) -> bool {
        if self.vanish_timer == -1 {
            return false;
        }
        self.vanish_timer -= 1;
        self.vanish_timer < 0
    }

    /// Is the vanish animation showing? (Collected, and at least one tick
    /// has passed since — the collect tick itself still renders normal.)
    pub fn vanishing(&self) -> bool {
        self.vanish_timer > -1 && self.vanish_timer < VANISH_TICKS
    }

    /// Vanish opacity: timer/100, deliberately decoupled from the 30-tick
    /// duration. Meaningful only while `vanishing()`.
    pub fn fade_alpha(&self) -> f32 {
        self.vanish_timer as f32 / 100.0
    }

    /// Vanish footprint multiplier: 1/(2*alpha). Grows as the coin fades.
    /// Unbounded at timer 0; the renderer clamps.
    pub fn fade_scale(&self) -> f32 {
        1.0 / (2.0 * self.fade_alpha())
    }
}

// ── Target ──

/// Rendered cursor-dot radius, world pixels.
pub const TARGET_RADIUS: f32 = 12.0;

/// The world point the player turns toward, fed from the pointer each tick.
/// No identity beyond its position.
#[derive(Clone, Copy, Debug, Default)]
pub struct Target {
    pub x: f32,
    pub y: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(7)
    }

    #[test]
    fn coin_collect_is_idempotent() {
        let mut c = Coin::new(40.0, 40.0, &mut rng());
        assert_eq!(c.vanish_timer, -1);
        assert!(c.collect()); // arms the countdown
        assert_eq!(c.vanish_timer, VANISH_TICKS);
        assert!(!c.collect()); // second collect is a no-op
        assert_eq!(c.vanish_timer, VANISH_TICKS); // timer set exactly once
    }

    #[test]
    fn coin_vanish_countdown() {
        let mut c = Coin::new(40.0, 40.0, &mut rng());
        c.collect();

        // 30 ticks: 30→29→...→0, still present throughout
        for _ in 0..VANISH_TICKS {
            assert!(!c.tick());
        }
        assert_eq!(c.vanish_timer, 0);

        // 31st tick: 0→-1, expired
        assert!(c.tick());
    }

    #[test]
    fn uncollected_coin_never_expires() {
        let mut c = Coin::new(40.0, 40.0, &mut rng());
        for _ in 0..1000 {
            assert!(!c.tick());
        }
        assert_eq!(c.vanish_timer, -1);
    }

    #[test]
    fn coin_fade_derivation() {
        let mut c = Coin::new(40.0, 40.0, &mut rng());
        assert!(!c.vanishing());
        c.collect();
        assert!(!c.vanishing()); // collect tick renders normal
        c.tick();
        assert!(c.vanishing());
        c.vanish_timer = 25;
        assert!((c.fade_alpha() - 0.25).abs() < 1e-6);
        assert!((c.fade_scale() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn blink_reseed_stays_in_range() {
        let mut r = rng();
        let mut p = Player::new(0.0, 0.0, &mut r);
        for _ in 0..200 {
            p.reseed_blink(&mut r);
            assert!((300..600).contains(&p.blink_timer));
        }
    }

    #[test]
    fn eyes_close_near_blink() {
        let mut p = Player::new(0.0, 0.0, &mut rng());
        p.blink_timer = 11;
        assert!(p.eyes_open());
        p.blink_timer = 10;
        assert!(!p.eyes_open());
    }
}

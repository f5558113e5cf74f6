/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use sim::event::GameEvent;
use sim::level::{self, LevelDef};
use sim::step::{step, FrameInput, Thrust};
use sim::world::WorldState;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(4);

// ── Key Constants ──

const KEYS_FORWARD: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_REVERSE: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_PAUSE: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('p'), KeyCode::Char('P')];
const KEYS_MUTE: &[KeyCode] = &[KeyCode::Char('m'), KeyCode::Char('M')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];

fn main() {
    let config = GameConfig::load();
    let seed = config.seed.unwrap_or_else(rand::random);

    let def = level::pick_level(&config);
    let mut world = WorldState::new(seed);
    if let Err(e) = level::load_level(&mut world, &def) {
        eprintln!("Cannot start level \"{}\": {e}", def.name);
        std::process::exit(1);
    }

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let mut sound = SoundEngine::new(config.volume, config.start_muted);

    let result = game_loop(&mut world, &def, &mut renderer, &mut sound, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Skitter!");
    println!("Coins collected: {}", world.coins_collected);
}

fn game_loop(
    world: &mut WorldState,
    def: &LevelDef,
    renderer: &mut Renderer,
    sound: &mut Option<SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.tick_rate_ms);

    // Steering cursor in viewport pixels: the mouse sets it, the pad
    // stick nudges it.
    let mut cursor: (f32, f32) = (0.0, 0.0);

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) {
            break;
        }
        if kb.any_pressed(KEYS_PAUSE) {
            world.paused = !world.paused;
        }
        if kb.any_pressed(KEYS_MUTE) {
            if let Some(s) = sound.as_mut() {
                s.toggle_mute();
            }
        }
        if kb.any_pressed(KEYS_RESTART) {
            level::load_level(world, def)?;
        }

        if let Some((mc, mr)) = kb.pointer_moved() {
            cursor = Renderer::mouse_to_screen_px(mc, mr);
        }
        if let Some((dx, dy)) = gp.cursor_velocity() {
            cursor.0 = (cursor.0 + dx).clamp(0.0, world.camera.view_w);
            cursor.1 = (cursor.1 + dy).clamp(0.0, world.camera.view_h);
        }

        if last_tick.elapsed() >= tick_rate {
            let frame_input = FrameInput {
                thrust: detect_thrust(&kb, &gp),
                cursor,
            };
            let events = step(world, frame_input);
            process_sound_events(sound.as_ref(), &events);
            last_tick = Instant::now();
        }

        // Render runs every frame, paused or not.
        let muted = sound.as_ref().map_or(false, |s| s.muted());
        renderer.render(world, muted)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn detect_thrust(kb: &InputState, gp: &GamepadState) -> Option<Thrust> {
    if kb.any_held(KEYS_FORWARD) || kb.any_pressed(KEYS_FORWARD) || gp.thrust_held() {
        Some(Thrust::Forward)
    } else if kb.any_held(KEYS_REVERSE) || kb.any_pressed(KEYS_REVERSE) || gp.reverse_held() {
        Some(Thrust::Reverse)
    } else {
        None
    }
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::CoinCollected { .. } => sfx.play_collect(),
        }
    }
}

/// Level loading and coin placement.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.txt` files, first one sorted by name)
///   2. Built-in embedded level (the classic 10x7 field)
///
/// ## Level file format (`.txt`):
///   Optional line:  `# Level Name`
///   Header line:    `width height start_col start_row`
///   Then exactly width*height tile codes in row-major order, whitespace
///   separated, any line layout. Codes: 0=void 1=open 2=player-only
///   3=cursor-only.

use std::fmt;
use std::path::Path;

use rand::Rng;

use crate::config::GameConfig;
use crate::domain::entity::{Coin, Player, Target};
use crate::domain::tile::{GridError, TileGrid, TILE_SIZE};
use crate::sim::world::WorldState;

/// Coins placed per level.
pub const COIN_COUNT: usize = 5;

/// Rejection-sampling budget per coin. A level with too few open cells
/// must fail construction instead of hanging in the sampling loop.
const MAX_PLACEMENT_TRIES: usize = 1000;

/// Parsed level descriptor: header + flat row-major tile codes.
#[derive(Clone, Debug)]
pub struct LevelDef {
    pub name: String,
    pub width: usize,
    pub height: usize,
    pub start_col: usize,
    pub start_row: usize,
    pub cells: Vec<u8>,
}

// ── Errors ──

#[derive(Debug)]
pub enum LevelError {
    /// The tile grid rejected the descriptor (count mismatch, bad code).
    Grid(GridError),
    /// No `width height start_col start_row` header line.
    MissingHeader,
    /// Header or cell token that does not parse as the expected integer.
    BadToken(String),
    /// Rejection sampling ran out of tries before every coin found an
    /// unoccupied open cell.
    PlacementExhausted { placed: usize, want: usize },
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::Grid(e) => write!(f, "{e}"),
            LevelError::MissingHeader => {
                write!(f, "level is missing the `width height start_col start_row` header")
            }
            LevelError::BadToken(tok) => write!(f, "unreadable number {tok:?} in level data"),
            LevelError::PlacementExhausted { placed, want } => {
                write!(f, "placed {placed} of {want} coins before running out of open cells")
            }
        }
    }
}

impl std::error::Error for LevelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LevelError::Grid(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GridError> for LevelError {
    fn from(e: GridError) -> Self {
        LevelError::Grid(e)
    }
}

// ══════════════════════════════════════════════════════════════
// Loading a level into the world
// ══════════════════════════════════════════════════════════════

/// (Re)build the world from a descriptor. Fresh grid, fresh coins, player
/// at the spawn cell; camera, target, tick and pause all reset.
pub fn load_level(world: &mut WorldState, def: &LevelDef) -> Result<(), LevelError> {
    let grid = TileGrid::from_flat(def.width, def.height, &def.cells)?;
    let coins = place_coins(&grid, &mut world.rng)?;

    // Spawn sits half a tile up-left of the start cell's origin corner.
    let spawn_x = def.start_col as f32 * TILE_SIZE - TILE_SIZE / 2.0;
    let spawn_y = def.start_row as f32 * TILE_SIZE - TILE_SIZE / 2.0;

    world.player = Player::new(spawn_x, spawn_y, &mut world.rng);
    world.grid = grid;
    world.coins = coins;
    world.coins_collected = 0;
    world.target = Target::default();
    world.camera.reset();
    world.level_name = def.name.clone();
    world.tick = 0;
    world.paused = false;

    Ok(())
}

/// Drop COIN_COUNT coins on distinct open cells by rejection sampling.
fn place_coins(grid: &TileGrid, rng: &mut impl Rng) -> Result<Vec<Coin>, LevelError> {
    let mut coins: Vec<Coin> = Vec::with_capacity(COIN_COUNT);
    let mut occupied: Vec<(usize, usize)> = Vec::with_capacity(COIN_COUNT);

    for placed in 0..COIN_COUNT {
        let mut tries = 0;
        loop {
            if tries >= MAX_PLACEMENT_TRIES {
                return Err(LevelError::PlacementExhausted { placed, want: COIN_COUNT });
            }
            tries += 1;

            let col = rng.random_range(0..grid.width());
            let row = rng.random_range(0..grid.height());
            if !grid.tile_at(col, row).hosts_coins() || occupied.contains(&(col, row)) {
                continue;
            }

            let (x, y) = TileGrid::cell_center(col, row);
            coins.push(Coin::new(x, y, rng));
            occupied.push((col, row));
            break;
        }
    }

    Ok(coins)
}

// ══════════════════════════════════════════════════════════════
// Level file parsing
// ══════════════════════════════════════════════════════════════

/// Parse one level from text content.
pub fn parse_level_file(content: &str) -> Result<LevelDef, LevelError> {
    let mut name = String::new();
    let mut header: Option<[usize; 4]> = None;
    let mut cells: Vec<u8> = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix('#') {
            if name.is_empty() {
                name = rest.trim().to_string();
            }
            continue;
        }

        if header.is_none() {
            let mut nums = [0usize; 4];
            let tokens: Vec<&str> = trimmed.split_whitespace().collect();
            if tokens.len() != 4 {
                return Err(LevelError::MissingHeader);
            }
            for (slot, tok) in nums.iter_mut().zip(&tokens) {
                *slot = tok
                    .parse()
                    .map_err(|_| LevelError::BadToken(tok.to_string()))?;
            }
            header = Some(nums);
        } else {
            for tok in trimmed.split_whitespace() {
                let code: u8 = tok
                    .parse()
                    .map_err(|_| LevelError::BadToken(tok.to_string()))?;
                cells.push(code);
            }
        }
    }

    let [width, height, start_col, start_row] = header.ok_or(LevelError::MissingHeader)?;

    if name.is_empty() {
        name = "untitled".to_string();
    }

    Ok(LevelDef { name, width, height, start_col, start_row, cells })
}

/// Pick the level to play: first `.txt` (sorted by file name) from the
/// configured levels directory, else the embedded field. Unreadable or
/// unparseable files are warned about and skipped.
pub fn pick_level(config: &GameConfig) -> LevelDef {
    let mut found = load_from_directory(&config.levels_dir);
    found.sort_by(|a, b| a.0.cmp(&b.0));
    if let Some((_, def)) = found.into_iter().next() {
        return def;
    }
    embedded_level()
}

fn load_from_directory(dir: &Path) -> Vec<(String, LevelDef)> {
    let mut results = vec![];

    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return results,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.extension().map_or(false, |e| e == "txt") {
            continue;
        }
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Warning: could not read {}: {e}", path.display());
                continue;
            }
        };
        match parse_level_file(&content) {
            Ok(def) => {
                let filename = path
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .to_string();
                results.push((filename, def));
            }
            Err(e) => eprintln!("Warning: skipping {}: {e}", path.display()),
        }
    }

    results
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback level
// ══════════════════════════════════════════════════════════════

/// The classic 10x7 field, spawn at cell (2, 6).
pub fn embedded_level() -> LevelDef {
    LevelDef {
        name: "The Old Field".to_string(),
        width: 10,
        height: 7,
        start_col: 2,
        start_row: 6,
        cells: vec![
            0, 0, 0, 0, 3, 0, 0, 0, 2, 1,
            0, 0, 0, 0, 0, 3, 0, 0, 2, 1,
            0, 0, 0, 1, 1, 1, 1, 1, 1, 1,
            0, 0, 0, 1, 2, 2, 2, 2, 2, 2,
            0, 0, 0, 1, 0, 0, 0, 3, 0, 0,
            0, 1, 1, 1, 0, 0, 0, 0, 3, 0,
            0, 0, 0, 0, 0, 0, 0, 0, 0, 3,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::TileKind;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn world() -> WorldState {
        WorldState::new(42)
    }

    #[test]
    fn parse_header_name_and_cells() {
        let def = parse_level_file(
            "# Tiny Yard\n\
             2 2 1 1\n\
             1 1\n\
             1 0\n",
        )
        .unwrap();
        assert_eq!(def.name, "Tiny Yard");
        assert_eq!((def.width, def.height), (2, 2));
        assert_eq!((def.start_col, def.start_row), (1, 1));
        assert_eq!(def.cells, vec![1, 1, 1, 0]);
    }

    #[test]
    fn parse_rejects_missing_header() {
        assert!(matches!(
            parse_level_file("# name only\n"),
            Err(LevelError::MissingHeader)
        ));
        // A header with the wrong arity is not a header.
        assert!(matches!(
            parse_level_file("2 2 1\n1 1 1 1\n"),
            Err(LevelError::MissingHeader)
        ));
    }

    #[test]
    fn parse_rejects_bad_token() {
        assert!(matches!(
            parse_level_file("2 2 0 0\n1 x 1 1\n"),
            Err(LevelError::BadToken(_))
        ));
    }

    #[test]
    fn load_fails_on_cell_count_mismatch() {
        let mut def = embedded_level();
        def.cells.pop();
        let err = load_level(&mut world(), &def).unwrap_err();
        assert!(matches!(
            err,
            LevelError::Grid(GridError::CellCountMismatch { expected: 70, got: 69 })
        ));
    }

    #[test]
    fn embedded_level_loads_with_five_coins() {
        let mut w = world();
        load_level(&mut w, &embedded_level()).unwrap();
        assert_eq!(w.coins.len(), COIN_COUNT);
        // Spawn: start cell (2, 6) → (2*80-40, 6*80-40)
        assert_eq!((w.player.x, w.player.y), (120.0, 440.0));
        assert_eq!(w.grid.pixel_width(), 800.0);
        assert_eq!(w.grid.pixel_height(), 560.0);
    }

    #[test]
    fn coins_land_on_distinct_open_cell_centers() {
        let mut w = world();
        load_level(&mut w, &embedded_level()).unwrap();

        let mut seen = vec![];
        for c in &w.coins {
            // Center of an open cell
            let col = (c.x / TILE_SIZE) as usize;
            let row = (c.y / TILE_SIZE) as usize;
            assert_eq!(TileGrid::cell_center(col, row), (c.x, c.y));
            assert_eq!(w.grid.tile_at(col, row), TileKind::Open);
            // Distinct
            assert!(!seen.contains(&(col, row)));
            seen.push((col, row));
            // Freshly placed coins are collectible
            assert_eq!(c.vanish_timer, -1);
        }
    }

    #[test]
    fn placement_fills_exactly_five_open_cells() {
        // Exactly COIN_COUNT open cells: every one must end up occupied.
        let grid = TileGrid::from_flat(5, 2, &[1, 1, 1, 1, 1, 0, 0, 0, 0, 0]).unwrap();
        let mut rng = Pcg32::seed_from_u64(1);
        let coins = place_coins(&grid, &mut rng).unwrap();
        let mut cols: Vec<usize> = coins.iter().map(|c| (c.x / TILE_SIZE) as usize).collect();
        cols.sort_unstable();
        assert_eq!(cols, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn placement_exhaustion_fails_construction() {
        // Only 4 open cells for 5 coins: must error, not hang.
        let grid = TileGrid::from_flat(4, 1, &[1, 1, 1, 1]).unwrap();
        let mut rng = Pcg32::seed_from_u64(1);
        match place_coins(&grid, &mut rng) {
            Err(LevelError::PlacementExhausted { placed: 4, want: 5 }) => {}
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[test]
    fn placement_is_deterministic_per_seed() {
        let def = embedded_level();
        let mut a = WorldState::new(9);
        let mut b = WorldState::new(9);
        load_level(&mut a, &def).unwrap();
        load_level(&mut b, &def).unwrap();
        for (ca, cb) in a.coins.iter().zip(&b.coins) {
            assert_eq!((ca.x, ca.y), (cb.x, cb.y));
        }
    }
}

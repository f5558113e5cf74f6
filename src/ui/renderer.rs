/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// The world is continuous pixel space; the terminal shows it through a
/// grid of screen cells, each covering PX_PER_CELL x PX_PER_CELL world
/// pixels and drawn as two terminal columns (terminal cells are roughly
/// 1:2). Every frame:
///   1. Build the next frame into the `front` buffer, sampling the world
///      at each screen cell's center (camera offset applied)
///   2. Diff against the `back` buffer (previous frame)
///   3. Emit terminal commands only for cells that changed, batched with
///      `queue!` and flushed once
///   4. Swap buffers
///
/// Visuals derive from core state only: coin bob `sin(tick*0.04 + phase)*3`,
/// vanish fade/expand from the coin's alpha/scale, player motion squash,
/// eye blink, target drawn topmost.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{COIN_SIZE, PLAYER_SIZE, TARGET_RADIUS};
use crate::domain::tile::{TileKind, TILE_SIZE};
use crate::sim::level::COIN_COUNT;
use crate::sim::world::WorldState;

/// Terminal columns per screen cell (square-ish cells on a 1:2 font).
const CELL_W: usize = 2;

/// World pixels covered by one screen cell. A tile (80 px) is 4x4 cells.
const PX_PER_CELL: f32 = 20.0;

/// Vertical layout.
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
/// Rows below the map: gap + help line.
const FOOTER_ROWS: usize = 2;

/// The vanish expansion is unbounded as the countdown hits zero; cap the
/// drawn footprint.
const MAX_VANISH_SCALE: f32 = 6.0;

// ── Palette ──

const COLOR_VOID: Color = Color::Rgb { r: 12, g: 12, b: 12 };
const COLOR_OPEN: Color = Color::Rgb { r: 141, g: 255, b: 255 };
const COLOR_PLAYER_ONLY: Color = Color::Rgb { r: 179, g: 51, b: 51 };
const COLOR_CURSOR_ONLY: Color = Color::Rgb { r: 4, g: 150, b: 53 };
const COLOR_PLAYER: Color = Color::Rgb { r: 255, g: 0, b: 0 };
const COLOR_COIN: Color = Color::Rgb { r: 255, g: 255, b: 25 };
const COLOR_TARGET: Color = Color::Rgb { r: 210, g: 60, b: 80 };
const COLOR_HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };

// ── Cell: the unit of the buffers ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: COLOR_VOID };

    /// Sentinel used to invalidate the back buffer: differs from any real
    /// cell, so every position gets diffed.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell { ch, fg, bg });
            cx += 1;
        }
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            EnableMouseCapture,
            SetBackgroundColor(COLOR_VOID),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force a full repaint on the first frame.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            DisableMouseCapture,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Map a terminal mouse position to viewport-local world pixels.
    /// Each terminal column is half a screen cell; sample its center.
    pub fn mouse_to_screen_px(col: u16, row: u16) -> (f32, f32) {
        let x = col as f32 * (PX_PER_CELL / CELL_W as f32) + PX_PER_CELL / 4.0;
        let y = (row as f32 - MAP_ROW as f32).max(0.0) * PX_PER_CELL + PX_PER_CELL / 2.0;
        (x, y)
    }

    pub fn render(&mut self, world: &mut WorldState, muted: bool) -> io::Result<()> {
        // Detect terminal resize.
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(COLOR_VOID), Clear(ClearType::All))?;
        }

        // Refresh the camera's viewport dimensions from the terminal size
        // before the next tick reads them.
        let view_cols = self.term_w / CELL_W;
        let view_rows = self.term_h.saturating_sub(MAP_ROW + FOOTER_ROWS).max(1);
        world.camera.view_w = view_cols as f32 * PX_PER_CELL;
        world.camera.view_h = view_rows as f32 * PX_PER_CELL;

        self.front.clear();
        self.compose_hud(world, muted);
        self.compose_field(world, view_cols, view_rows);
        self.compose_help(view_rows);
        if world.paused {
            self.compose_pause_overlay(view_cols, view_rows);
        }

        self.flush_diff()
    }

    // ── Composition ──

    fn compose_hud(&mut self, w: &WorldState, muted: bool) {
        let mute_tag = if muted { "  [muted]" } else { "" };
        let hud = format!(
            " {}   Coins: {}/{}   On field: {}{}",
            w.level_name, w.coins_collected, COIN_COUNT, w.coins_remaining(), mute_tag,
        );
        for x in 0..self.front.width {
            self.front.set(x, HUD_ROW, Cell { ch: ' ', fg: Color::White, bg: COLOR_HUD_BG });
        }
        self.front.put_str(0, HUD_ROW, &hud, Color::White, COLOR_HUD_BG);
    }

    fn compose_field(&mut self, w: &WorldState, view_cols: usize, view_rows: usize) {
        for vy in 0..view_rows {
            let row = MAP_ROW + vy;
            if row >= self.front.height {
                break;
            }
            for vx in 0..view_cols {
                let col = vx * CELL_W;
                if col + 1 >= self.front.width {
                    break;
                }
                // Sample the world at this screen cell's center.
                let wx = w.camera.xo + (vx as f32 + 0.5) * PX_PER_CELL;
                let wy = w.camera.yo + (vy as f32 + 0.5) * PX_PER_CELL;
                let (c0, c1, fg, bg) = compose_cell(w, wx, wy);
                self.front.set(col, row, Cell { ch: c0, fg, bg });
                self.front.set(col + 1, row, Cell { ch: c1, fg, bg });
            }
        }
    }

    fn compose_help(&mut self, view_rows: usize) {
        let help_row = MAP_ROW + view_rows + 1;
        let help = " W/Up thrust   S/Down reverse   mouse steer   P pause   M mute   R restart   Q quit";
        self.front.put_str(0, help_row, help, Color::DarkGrey, COLOR_VOID);
    }

    fn compose_pause_overlay(&mut self, view_cols: usize, view_rows: usize) {
        let msg = "  P A U S E D  ";
        let row = MAP_ROW + view_rows / 2;
        let col = (view_cols * CELL_W).saturating_sub(msg.len()) / 2;
        self.front.put_str(col, row, msg, Color::Black, Color::White);
    }

    // ── Diff and emit ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg: Option<Color> = None;
        let mut last_bg: Option<Color> = None;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let idx = y * self.front.width + x;
                if self.front.cells[idx] == self.back.cells[idx] {
                    x += 1;
                    continue;
                }
                let cell = self.front.cells[idx];
                queue!(self.writer, MoveTo(x as u16, y as u16))?;
                if last_fg != Some(cell.fg) {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = Some(cell.fg);
                }
                if last_bg != Some(cell.bg) {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = Some(cell.bg);
                }
                queue!(self.writer, Print(cell.ch))?;
                x += 1;
            }
        }

        self.writer.flush()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════
// Per-cell composition (world pixel space)
// ══════════════════════════════════════════════════════════════

/// Decide what the screen cell whose center is at world (wx, wy) shows.
/// Z-order: tiles, coins, player, target on top.
fn compose_cell(w: &WorldState, wx: f32, wy: f32) -> (char, char, Color, Color) {
    let bg = tile_color(w, wx, wy);

    // Target cursor, topmost.
    let tdx = wx - w.target.x;
    let tdy = wy - w.target.y;
    if tdx * tdx + tdy * tdy <= TARGET_RADIUS * TARGET_RADIUS {
        return ('(', ')', COLOR_TARGET, bg);
    }

    // Player, squashed vertically by speed.
    let p = &w.player;
    let half_w = PLAYER_SIZE / 2.0;
    let half_h = ((PLAYER_SIZE - p.speed_sq() / 2.0).max(10.0)) / 2.0;
    if (wx - p.x).abs() <= half_w && (wy - p.y).abs() <= half_h {
        if p.eyes_open() {
            // Eye sockets sit forward of center, rotated by the facing.
            let (sin, cos) = p.dir.sin_cos();
            for ey in [-13.0_f32, 13.0] {
                let ex_w = p.x + 15.0 * cos - ey * sin;
                let ey_w = p.y + 15.0 * sin + ey * cos;
                // Snap each 10 px eye to its nearest screen cell.
                if (wx - ex_w).abs() <= PX_PER_CELL / 2.0
                    && (wy - ey_w).abs() <= PX_PER_CELL / 2.0
                {
                    return ('o', ' ', Color::Black, Color::White);
                }
            }
        }
        return (' ', ' ', Color::White, COLOR_PLAYER);
    }

    // Coins, bobbing; vanishing coins fade and expand.
    for coin in &w.coins {
        let bob = ((w.tick as f32) * 0.04 + coin.bob_phase).sin() * 3.0;
        let cy = coin.y + bob;
        if coin.vanishing() {
            let scale = coin.fade_scale().min(MAX_VANISH_SCALE);
            let half = COIN_SIZE / 2.0 * scale;
            if (wx - coin.x).abs() <= half && (wy - cy).abs() <= half {
                return ('\u{2592}', '\u{2592}', fade_color(coin.fade_alpha()), bg);
            }
        } else {
            // A coin is smaller than one screen cell; widen the test by
            // half a cell so it always lands on the nearest cell center.
            let half = COIN_SIZE / 2.0 + PX_PER_CELL / 2.0;
            if (wx - coin.x).abs() <= half && (wy - cy).abs() <= half {
                return ('\u{25cf}', ' ', COLOR_COIN, bg);
            }
        }
    }

    (' ', ' ', Color::White, bg)
}

/// Background color for the tile under world (wx, wy). Outside the grid
/// everything is void.
fn tile_color(w: &WorldState, wx: f32, wy: f32) -> Color {
    if wx < 0.0 || wy < 0.0 {
        return COLOR_VOID;
    }
    let col = (wx / TILE_SIZE) as usize;
    let row = (wy / TILE_SIZE) as usize;
    match w.grid.tile_at(col, row) {
        TileKind::Void => COLOR_VOID,
        TileKind::Open => COLOR_OPEN,
        TileKind::PlayerOnly => COLOR_PLAYER_ONLY,
        TileKind::CursorOnly => COLOR_CURSOR_ONLY,
    }
}

/// Vanishing coin tint: full yellow at the start of the countdown, dark
/// by the end (alpha runs 0.3 → 0).
fn fade_color(alpha: f32) -> Color {
    let t = (alpha / 0.3).clamp(0.0, 1.0);
    Color::Rgb {
        r: (255.0 * t) as u8,
        g: (255.0 * t) as u8,
        b: (25.0 * t) as u8,
    }
}

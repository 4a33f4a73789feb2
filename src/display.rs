/// Rendering layer — all terminal I/O lives here.
///
/// Each function receives a mutable writer and an immutable view of the
/// game state.  No game logic is performed; this module only translates
/// state into terminal commands.
///
/// The simulation's logical 800x600 field is mapped onto a viewport of
/// terminal cells: a fixed bordered 80x24 box in windowed mode, or the
/// whole terminal in fullscreen mode.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal, QueueableCommand,
};

use crate::compute::{FIELD_H, FIELD_W, PLAYER_SIZE, POWERUP_SIZE};
use crate::entities::{GameState, Obstacle, PowerUp, SizeClass};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_HUD: Color = Color::White;
const C_PLAYER: Color = Color::White;
const C_OBSTACLE_SMALL: Color = Color::Red;
const C_OBSTACLE_MEDIUM: Color = Color::DarkYellow;
const C_OBSTACLE_LARGE: Color = Color::DarkMagenta;
const C_POWERUP: Color = Color::Cyan;
const C_GOLD: Color = Color::Rgb { r: 255, g: 215, b: 0 };
const C_SLOW_BANNER: Color = Color::Rgb { r: 255, g: 165, b: 0 };
const C_ALERT: Color = Color::Red;
const C_HINT: Color = Color::DarkGrey;

/// Background star-field themes, one picked at random per level.
/// Purely cosmetic.
const THEMES: [(Color, char); 6] = [
    (Color::DarkBlue, '·'),
    (Color::DarkGreen, '·'),
    (Color::DarkCyan, '*'),
    (Color::DarkMagenta, '·'),
    (Color::DarkGrey, '.'),
    (Color::DarkYellow, '*'),
];

// ── Viewport ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewMode {
    /// Fixed 80x24 field centred in the terminal, with a border.
    Windowed,
    /// The whole terminal is the field.
    Fullscreen,
}

impl ViewMode {
    pub fn toggled(self) -> ViewMode {
        match self {
            ViewMode::Windowed => ViewMode::Fullscreen,
            ViewMode::Fullscreen => ViewMode::Windowed,
        }
    }
}

/// The cell rectangle the field is drawn into.
#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    pub x0: u16,
    pub y0: u16,
    pub cols: u16,
    pub rows: u16,
}

const WINDOWED_COLS: u16 = 80;
const WINDOWED_ROWS: u16 = 24;

pub fn viewport(mode: ViewMode, term_cols: u16, term_rows: u16) -> Viewport {
    match mode {
        ViewMode::Fullscreen => Viewport {
            x0: 0,
            y0: 0,
            cols: term_cols.max(1),
            rows: term_rows.max(1),
        },
        ViewMode::Windowed => {
            let cols = WINDOWED_COLS.min(term_cols.saturating_sub(2)).max(1);
            let rows = WINDOWED_ROWS.min(term_rows.saturating_sub(2)).max(1);
            Viewport {
                x0: (term_cols.saturating_sub(cols)) / 2,
                y0: (term_rows.saturating_sub(rows)) / 2,
                cols,
                rows,
            }
        }
    }
}

impl Viewport {
    /// Logical x in [0, FIELD_W) to a cell column inside the viewport.
    fn cell_x(&self, x: f32) -> i32 {
        self.x0 as i32 + (x * self.cols as f32 / FIELD_W) as i32
    }

    fn cell_y(&self, y: f32) -> i32 {
        self.y0 as i32 + (y * self.rows as f32 / FIELD_H) as i32
    }

    fn contains(&self, cx: i32, cy: i32) -> bool {
        cx >= self.x0 as i32
            && cy >= self.y0 as i32
            && cx < (self.x0 + self.cols) as i32
            && cy < (self.y0 + self.rows) as i32
    }

    fn center_col(&self) -> u16 {
        self.x0 + self.cols / 2
    }
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete gameplay frame.
pub fn render<W: Write>(out: &mut W, state: &GameState, view: Viewport, windowed: bool) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    if windowed {
        draw_border(out, view)?;
    }
    draw_background(out, view, state.background)?;

    for powerup in &state.powerups {
        draw_powerup(out, view, powerup)?;
    }
    for obstacle in &state.obstacles {
        draw_obstacle(out, view, obstacle)?;
    }
    draw_player(out, view, state)?;

    draw_hud(out, view, state)?;
    draw_banners(out, view, state)?;

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, view.y0 + view.rows.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

// ── Field dressing ────────────────────────────────────────────────────────────

fn draw_border<W: Write>(out: &mut W, view: Viewport) -> std::io::Result<()> {
    let w = view.cols as usize;
    out.queue(style::SetForegroundColor(C_BORDER))?;

    out.queue(cursor::MoveTo(view.x0.saturating_sub(1), view.y0.saturating_sub(1)))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(w))))?;
    out.queue(cursor::MoveTo(view.x0.saturating_sub(1), view.y0 + view.rows))?;
    out.queue(Print(format!("└{}┘", "─".repeat(w))))?;

    for row in view.y0..view.y0 + view.rows {
        out.queue(cursor::MoveTo(view.x0.saturating_sub(1), row))?;
        out.queue(Print("│"))?;
        out.queue(cursor::MoveTo(view.x0 + view.cols, row))?;
        out.queue(Print("│"))?;
    }
    Ok(())
}

/// Sparse deterministic star field; the theme index only changes which
/// colour and glyph are used.
fn draw_background<W: Write>(out: &mut W, view: Viewport, theme: usize) -> std::io::Result<()> {
    let (color, glyph) = THEMES[theme % THEMES.len()];
    out.queue(style::SetForegroundColor(color))?;
    for row in 0..view.rows {
        for col in 0..view.cols {
            if (col as u32 * 7 + row as u32 * 11) % 37 == 0 {
                out.queue(cursor::MoveTo(view.x0 + col, view.y0 + row))?;
                out.queue(Print(glyph))?;
            }
        }
    }
    Ok(())
}

// ── Sprites ───────────────────────────────────────────────────────────────────

/// Fill the cell rectangle covering a logical box with one glyph.
fn fill_box<W: Write>(
    out: &mut W,
    view: Viewport,
    x: f32,
    y: f32,
    side: f32,
    color: Color,
    glyph: char,
) -> std::io::Result<()> {
    let left = view.cell_x(x);
    let top = view.cell_y(y);
    // At least one cell, so even the small obstacle stays visible.
    let right = view.cell_x(x + side).max(left + 1);
    let bottom = view.cell_y(y + side).max(top + 1);

    out.queue(style::SetForegroundColor(color))?;
    for cy in top..bottom {
        for cx in left..right {
            if view.contains(cx, cy) {
                out.queue(cursor::MoveTo(cx as u16, cy as u16))?;
                out.queue(Print(glyph))?;
            }
        }
    }
    Ok(())
}

fn draw_player<W: Write>(out: &mut W, view: Viewport, state: &GameState) -> std::io::Result<()> {
    let p = &state.player;
    let color = if state.invincible { C_GOLD } else { C_PLAYER };
    fill_box(out, view, p.x, p.y, PLAYER_SIZE, color, '█')
}

fn draw_obstacle<W: Write>(out: &mut W, view: Viewport, obstacle: &Obstacle) -> std::io::Result<()> {
    let color = match obstacle.size {
        SizeClass::Small => C_OBSTACLE_SMALL,
        SizeClass::Medium => C_OBSTACLE_MEDIUM,
        SizeClass::Large => C_OBSTACLE_LARGE,
    };
    fill_box(out, view, obstacle.x, obstacle.y, obstacle.size.side(), color, '▓')
}

/// Both power-up kinds share one look — which one you caught is only
/// revealed by the banner, exactly like the original sprite.
fn draw_powerup<W: Write>(out: &mut W, view: Viewport, powerup: &PowerUp) -> std::io::Result<()> {
    fill_box(out, view, powerup.x, powerup.y, POWERUP_SIZE, C_POWERUP, '♦')
}

// ── HUD ───────────────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(out: &mut W, view: Viewport, state: &GameState) -> std::io::Result<()> {
    out.queue(style::SetForegroundColor(C_HUD))?;
    out.queue(cursor::MoveTo(view.x0 + 1, view.y0))?;
    out.queue(Print(format!("Score : {}", state.score)))?;
    out.queue(cursor::MoveTo(view.x0 + 1, view.y0 + 1))?;
    out.queue(Print(format!("Level : {}", state.level)))?;
    out.queue(cursor::MoveTo(view.x0 + 1, view.y0 + 2))?;
    out.queue(Print(format!("Bonus collected : {}", state.bonus_count)))?;
    Ok(())
}

fn draw_banners<W: Write>(out: &mut W, view: Viewport, state: &GameState) -> std::io::Result<()> {
    if state.invincible {
        let text = "Invincible!";
        let col = (view.x0 + view.cols).saturating_sub(text.len() as u16 + 1);
        out.queue(cursor::MoveTo(col, view.y0))?;
        out.queue(style::SetForegroundColor(C_GOLD))?;
        out.queue(Print(text))?;
    }
    if state.slow_obstacles {
        let text = "Obstacles slowed!";
        let col = (view.x0 + view.cols).saturating_sub(text.len() as u16 + 1);
        out.queue(cursor::MoveTo(col, view.y0 + 1))?;
        out.queue(style::SetForegroundColor(C_SLOW_BANNER))?;
        out.queue(Print(text))?;
    }
    if state.bonus_flash_ms.is_some() {
        print_centered(out, view, view.y0 + view.rows / 2, "Bonus collected!", C_HUD)?;
    }
    Ok(())
}

fn print_centered<W: Write>(
    out: &mut W,
    view: Viewport,
    row: u16,
    text: &str,
    color: Color,
) -> std::io::Result<()> {
    let col = view
        .center_col()
        .saturating_sub(text.chars().count() as u16 / 2);
    out.queue(cursor::MoveTo(col, row))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(text))?;
    Ok(())
}

// ── Countdown ─────────────────────────────────────────────────────────────────

/// 3x5 bitmap digits, drawn scaled up for the countdown numeral.
#[rustfmt::skip]
const DIGITS: [[u8; 15]; 10] = [
    [1,1,1, 1,0,1, 1,0,1, 1,0,1, 1,1,1], // 0
    [0,1,0, 1,1,0, 0,1,0, 0,1,0, 1,1,1], // 1
    [1,1,1, 0,0,1, 1,1,1, 1,0,0, 1,1,1], // 2
    [1,1,1, 0,0,1, 0,1,1, 0,0,1, 1,1,1], // 3
    [1,0,1, 1,0,1, 1,1,1, 0,0,1, 0,0,1], // 4
    [1,1,1, 1,0,0, 1,1,1, 0,0,1, 1,1,1], // 5
    [1,1,1, 1,0,0, 1,1,1, 1,0,1, 1,1,1], // 6
    [1,1,1, 0,0,1, 0,1,0, 0,1,0, 0,1,0], // 7
    [1,1,1, 1,0,1, 1,1,1, 1,0,1, 1,1,1], // 8
    [1,1,1, 1,0,1, 1,1,1, 0,0,1, 1,1,1], // 9
];

fn draw_big_digit<W: Write>(
    out: &mut W,
    cx: u16,
    cy: u16,
    d: u8,
    color: Color,
) -> std::io::Result<()> {
    // Each bitmap pixel becomes a 2x1 cell block to roughly square it up.
    let glyph = &DIGITS[(d % 10) as usize];
    out.queue(style::SetForegroundColor(color))?;
    for row in 0..5u16 {
        for col in 0..3u16 {
            if glyph[(row * 3 + col) as usize] == 1 {
                out.queue(cursor::MoveTo(cx + col * 2, cy + row))?;
                out.queue(Print("██"))?;
            }
        }
    }
    Ok(())
}

/// One frame of the pre-game countdown: the remaining-seconds numeral
/// inside a ring of dots that depletes with the time left.
pub fn draw_countdown<W: Write>(
    out: &mut W,
    view: Viewport,
    remaining: u32,
    total: u32,
) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    print_centered(
        out,
        view,
        view.y0 + view.rows / 2 - 7,
        "Leo's Quest begins in:",
        C_HUD,
    )?;

    let cx = view.center_col() as f32;
    let cy = (view.y0 + view.rows / 2) as f32;
    let fraction = remaining as f32 / total.max(1) as f32;

    // Ring of dots, clockwise from the top; cells are ~2x taller than
    // wide, so the vertical radius is halved.
    out.queue(style::SetForegroundColor(Color::Green))?;
    let steps = 24;
    for i in 0..steps {
        let portion = i as f32 / steps as f32;
        if portion > fraction {
            break;
        }
        let angle = std::f32::consts::TAU * portion - std::f32::consts::FRAC_PI_2;
        let px = cx + 14.0 * angle.cos();
        let py = cy + 7.0 * 0.5 * angle.sin() + 2.0;
        out.queue(cursor::MoveTo(px as u16, py as u16))?;
        out.queue(Print("●"))?;
    }

    // Tens digit only shows up for 9..=10 style counts if ever needed.
    let cx_cells = view.center_col().saturating_sub(3);
    let cy_cells = view.y0 + view.rows / 2;
    if remaining >= 10 {
        draw_big_digit(out, cx_cells.saturating_sub(8), cy_cells, (remaining / 10) as u8, C_HUD)?;
    }
    draw_big_digit(out, cx_cells, cy_cells, (remaining % 10) as u8, C_HUD)?;

    out.queue(style::ResetColor)?;
    out.flush()?;
    Ok(())
}

// ── Intro scroll ──────────────────────────────────────────────────────────────

/// One frame of the intro: wrapped story lines scrolling up past the
/// screen, plus the hint row.  `scroll_row` is the (fractional) row of the
/// first line; lines above the top or below the bottom are skipped.
pub fn draw_intro<W: Write>(
    out: &mut W,
    view: Viewport,
    lines: &[String],
    scroll_row: f32,
) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    print_centered(out, view, view.y0, "★ LEO'S QUEST ★", C_GOLD)?;

    out.queue(style::SetForegroundColor(C_GOLD))?;
    for (i, line) in lines.iter().enumerate() {
        let row = scroll_row + i as f32;
        if row < view.y0 as f32 + 1.0 || row >= (view.y0 + view.rows) as f32 - 1.0 {
            continue;
        }
        let col = view
            .center_col()
            .saturating_sub(line.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(col, row as u16))?;
        out.queue(Print(line))?;
    }

    print_centered(
        out,
        view,
        view.y0 + view.rows.saturating_sub(1),
        "↑ ↓ : Scroll speed   F : Fullscreen   Q : Quit",
        C_HINT,
    )?;

    out.queue(style::ResetColor)?;
    out.flush()?;
    Ok(())
}

// ── Overlays & end screens ────────────────────────────────────────────────────

/// Full-screen red alert shown (frozen) when the final battle begins.
pub fn draw_final_alert<W: Write>(out: &mut W, view: Viewport) -> std::io::Result<()> {
    let mid = view.y0 + view.rows / 2;
    print_centered(out, view, mid.saturating_sub(1), "╔══════════════════════════════╗", C_ALERT)?;
    print_centered(out, view, mid, "║   WARNING !  FINAL BATTLE.   ║", C_ALERT)?;
    print_centered(out, view, mid + 1, "╚══════════════════════════════╝", C_ALERT)?;
    out.queue(style::ResetColor)?;
    out.flush()?;
    Ok(())
}

pub fn draw_game_over<W: Write>(
    out: &mut W,
    view: Viewport,
    score: u32,
    level: u32,
    bonus: u32,
) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let top = (view.y0 + view.rows / 2).saturating_sub(4);
    print_centered(out, view, top, "╔════════════════════╗", C_ALERT)?;
    print_centered(out, view, top + 1, "║    GAME  OVER !    ║", C_ALERT)?;
    print_centered(out, view, top + 2, "╚════════════════════╝", C_ALERT)?;

    print_centered(out, view, top + 4, &format!("Your final score : {}", score), C_GOLD)?;
    print_centered(out, view, top + 5, &format!("You reached level : {}", level), C_HUD)?;
    print_centered(out, view, top + 6, &format!("Bonuses collected : {}", bonus), C_HUD)?;
    print_centered(out, view, top + 8, "Play again (R) or quit (Q) ?", C_GOLD)?;

    out.queue(style::ResetColor)?;
    out.flush()?;
    Ok(())
}

const TROPHY: [&str; 6] = [
    "   ___________   ",
    "  '._==_==_=_.'  ",
    "  .-\\:      /-.  ",
    " | (|:.     |) | ",
    "  '-|:.     |-'  ",
    "    \\::.    /    ",
];

/// The victory screen.  `prompt_alpha` fades the replay prompt in:
/// `None` hides it, `Some(255)` is fully visible.
pub fn draw_victory<W: Write>(
    out: &mut W,
    view: Viewport,
    score: u32,
    level: u32,
    bonus: u32,
    prompt_alpha: Option<u8>,
) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let top = (view.y0 + view.rows / 2).saturating_sub(9);
    for (i, line) in TROPHY.iter().enumerate() {
        print_centered(out, view, top + i as u16, line, C_GOLD)?;
    }

    let base = top + TROPHY.len() as u16 + 1;
    print_centered(out, view, base, "Bravo, you won the final battle !", C_GOLD)?;
    print_centered(out, view, base + 2, &format!("Your final score : {}", score), C_HUD)?;
    print_centered(out, view, base + 3, &format!("You reached level : {}", level), C_HUD)?;
    print_centered(out, view, base + 4, &format!("Bonuses collected : {}", bonus), C_HUD)?;

    if let Some(alpha) = prompt_alpha {
        let grey = Color::Rgb { r: alpha, g: alpha, b: alpha };
        print_centered(out, view, base + 6, "Play again (R) or quit (Q) ?", grey)?;
    }

    out.queue(style::ResetColor)?;
    out.flush()?;
    Ok(())
}

use std::collections::HashMap;
use std::io::{stdout, BufWriter, Write};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    terminal, ExecutableCommand,
};
use rand::thread_rng;

use dysheros::audio::Audio;
use dysheros::compute::{
    init_state, move_player_down, move_player_left, move_player_right, move_player_up, tick,
};
use dysheros::display::{self, ViewMode, Viewport};
use dysheros::entities::{GameEvent, GamePhase, GameState};
use dysheros::story;

const FRAME_PLAY: Duration = Duration::from_millis(16); // ≈60 FPS
const FRAME_INTRO: Duration = Duration::from_millis(33); // ≈30 FPS

/// The pre-game countdown starts here and steps down once a second.
const COUNTDOWN_START: u32 = 9;
/// Frozen red-alert screen when the final battle is announced.
const ALERT_PAUSE: Duration = Duration::from_secs(6);
/// Breather before an end screen accepts input.
const END_PAUSE: Duration = Duration::from_secs(3);

// ── Simultaneous-input constants ──────────────────────────────────────────────

/// A key is considered "held" if its last press/repeat event arrived within
/// this many frames.  Covers terminals that don't emit key-release events:
/// the OS key-repeat rate is ≥ 15 Hz, so a window of 8 frames @ 60 FPS
/// (≈133 ms) is always refreshed before expiry.
const HOLD_WINDOW: u64 = 8;

/// Returns true if `key` was seen within the last `HOLD_WINDOW` frames.
fn is_held(key_frame: &HashMap<KeyCode, u64>, key: &KeyCode, frame: u64) -> bool {
    key_frame
        .get(key)
        .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

fn is_quit_key(code: KeyCode, modifiers: KeyModifiers) -> bool {
    matches!(code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc)
        || (code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL))
}

fn current_viewport(mode: ViewMode) -> std::io::Result<Viewport> {
    let (cols, rows) = terminal::size()?;
    Ok(display::viewport(mode, cols, rows))
}

// ── Timed waits that stay responsive ──────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
enum WaitOutcome {
    Elapsed,
    Quit,
}

/// Sleep for `duration` while still draining input.  Q quits, F toggles
/// fullscreen and triggers `redraw` so the frozen screen follows the
/// viewport.
fn wait_responsive<W, F>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    duration: Duration,
    view_mode: &mut ViewMode,
    mut redraw: F,
) -> std::io::Result<WaitOutcome>
where
    W: Write,
    F: FnMut(&mut W, ViewMode) -> std::io::Result<()>,
{
    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        while let Ok(ev) = rx.try_recv() {
            let Event::Key(KeyEvent { code, kind, modifiers, .. }) = ev else {
                continue;
            };
            if kind != KeyEventKind::Press {
                continue;
            }
            if is_quit_key(code, modifiers) {
                return Ok(WaitOutcome::Quit);
            }
            if code == KeyCode::Char('f') || code == KeyCode::Char('F') {
                *view_mode = view_mode.toggled();
                redraw(out, *view_mode)?;
            }
        }
        thread::sleep(Duration::from_millis(20));
    }
    Ok(WaitOutcome::Elapsed)
}

#[derive(Debug, PartialEq, Eq)]
enum EndChoice {
    Replay,
    Quit,
}

/// What an event means while an end screen is waiting for input.
#[derive(Debug, PartialEq, Eq)]
enum ChoiceAction {
    Pick(EndChoice),
    ToggleView,
    Ignore,
}

/// Only key presses act here; everything else (resize, repeats,
/// releases, unmapped keys) is ignored and the wait continues.
fn choice_for_event(ev: &Event) -> ChoiceAction {
    let Event::Key(KeyEvent { code, kind, modifiers, .. }) = ev else {
        return ChoiceAction::Ignore;
    };
    if *kind != KeyEventKind::Press {
        return ChoiceAction::Ignore;
    }
    if is_quit_key(*code, *modifiers) {
        return ChoiceAction::Pick(EndChoice::Quit);
    }
    match code {
        KeyCode::Char('r') | KeyCode::Char('R') => ChoiceAction::Pick(EndChoice::Replay),
        KeyCode::Char('f') | KeyCode::Char('F') => ChoiceAction::ToggleView,
        _ => ChoiceAction::Ignore,
    }
}

/// Block on an end screen until the player picks replay or quit.
fn wait_choice<W, F>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    view_mode: &mut ViewMode,
    mut redraw: F,
) -> std::io::Result<EndChoice>
where
    W: Write,
    F: FnMut(&mut W, ViewMode) -> std::io::Result<()>,
{
    loop {
        match rx.recv() {
            Ok(ev) => match choice_for_event(&ev) {
                ChoiceAction::Pick(choice) => return Ok(choice),
                ChoiceAction::ToggleView => {
                    *view_mode = view_mode.toggled();
                    redraw(out, *view_mode)?;
                }
                ChoiceAction::Ignore => {}
            },
            // Input thread gone; nothing left to wait for.
            Err(_) => return Ok(EndChoice::Quit),
        }
    }
}

// ── Intro scroll ──────────────────────────────────────────────────────────────

/// Scroll the story up the screen at ≈30 FPS.  Up/Down adjust the scroll
/// speed between 0 (paused) and 5; the intro ends when the last line has
/// left the top of the screen.
fn intro<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    view_mode: &mut ViewMode,
) -> std::io::Result<WaitOutcome> {
    let mut speed: u32 = 1;
    let mut scroll_row = {
        let view = current_viewport(*view_mode)?;
        (view.y0 + view.rows) as f32
    };

    loop {
        let frame_start = Instant::now();

        while let Ok(Event::Key(KeyEvent { code, kind, modifiers, .. })) = rx.try_recv() {
            if kind != KeyEventKind::Press {
                continue;
            }
            if is_quit_key(code, modifiers) {
                return Ok(WaitOutcome::Quit);
            }
            match code {
                KeyCode::Up => speed = (speed + 1).min(5),
                KeyCode::Down => speed = speed.saturating_sub(1),
                KeyCode::Char('f') | KeyCode::Char('F') => {
                    *view_mode = view_mode.toggled();
                }
                _ => {}
            }
        }

        // Re-derive viewport and wrapping every frame so a fullscreen
        // toggle or terminal resize takes effect immediately.
        let view = current_viewport(*view_mode)?;
        let width = (view.cols as usize).saturating_sub(6).clamp(16, 64);
        let lines = story::wrap_text(story::STORY_TEXT, width);

        scroll_row -= speed as f32 * 0.1;
        display::draw_intro(out, view, &lines, scroll_row)?;

        if scroll_row + (lines.len() as f32) < view.y0 as f32 + 1.0 {
            return Ok(WaitOutcome::Elapsed);
        }

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_INTRO {
            thread::sleep(FRAME_INTRO - elapsed);
        }
    }
}

// ── Countdown ─────────────────────────────────────────────────────────────────

/// 9 … 0 at one second per step, with the depleting ring.
fn countdown<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    view_mode: &mut ViewMode,
) -> std::io::Result<WaitOutcome> {
    for remaining in (0..=COUNTDOWN_START).rev() {
        let view = current_viewport(*view_mode)?;
        display::draw_countdown(out, view, remaining, COUNTDOWN_START)?;

        let outcome = wait_responsive(out, rx, Duration::from_secs(1), view_mode, |out, mode| {
            let view = current_viewport(mode)?;
            display::draw_countdown(out, view, remaining, COUNTDOWN_START)
        })?;
        if outcome == WaitOutcome::Quit {
            return Ok(WaitOutcome::Quit);
        }
    }
    Ok(WaitOutcome::Elapsed)
}

// ── Game loop ─────────────────────────────────────────────────────────────────

/// One full run, from countdown to an end screen.
///
/// Input model: instead of acting on each key event individually, a
/// `key_frame` map records the frame number of the last press/repeat event
/// for every key.  Each frame, every key still "fresh" (within
/// `HOLD_WINDOW` frames) applies its movement, so diagonals just work.
///
/// Works on two classes of terminal:
/// * **Keyboard-enhancement capable** (Ghostty, kitty, etc.): proper
///   `Press` / `Repeat` / `Release` events → keys are removed on release.
/// * **Classic terminals**: only `Press` events (OS key-repeat shows as
///   repeated `Press`).  Keys expire naturally after `HOLD_WINDOW` frames
///   of silence.
fn play<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    audio: &mut Option<Audio>,
    view_mode: &mut ViewMode,
    clock: Instant,
) -> std::io::Result<EndChoice> {
    let mut rng = thread_rng();
    let mut state = init_state(clock.elapsed().as_millis() as u64, &mut rng);

    if countdown(out, rx, view_mode)? == WaitOutcome::Quit {
        return Ok(EndChoice::Quit);
    }
    state.phase = GamePhase::Playing;
    state.last_score_tick_ms = clock.elapsed().as_millis() as u64;
    log::info!("run started");

    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut frame: u64 = 0;

    loop {
        let frame_start = Instant::now();
        frame += 1;

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(Event::Key(KeyEvent { code, kind, modifiers, .. })) = rx.try_recv() {
            match kind {
                KeyEventKind::Press => {
                    key_frame.insert(code, frame);
                    if is_quit_key(code, modifiers) {
                        return Ok(EndChoice::Quit);
                    }
                    if code == KeyCode::Char('f') || code == KeyCode::Char('F') {
                        *view_mode = view_mode.toggled();
                    }
                }
                // Repeat: refresh timestamp so the key stays "held"
                KeyEventKind::Repeat => {
                    key_frame.insert(code, frame);
                }
                // Release: remove key immediately (keyboard-enhancement path)
                KeyEventKind::Release => {
                    key_frame.remove(&code);
                }
            }
        }

        // ── Apply held arrow keys, then advance the simulation ────────────────
        if state.phase == GamePhase::Playing {
            if is_held(&key_frame, &KeyCode::Left, frame) {
                state = move_player_left(&state);
            }
            if is_held(&key_frame, &KeyCode::Right, frame) {
                state = move_player_right(&state);
            }
            if is_held(&key_frame, &KeyCode::Up, frame) {
                state = move_player_up(&state);
            }
            if is_held(&key_frame, &KeyCode::Down, frame) {
                state = move_player_down(&state);
            }

            let now_ms = clock.elapsed().as_millis() as u64;
            let (next, events) = tick(&state, now_ms, &mut rng);
            state = next;

            for ev in &events {
                if handle_event(out, rx, audio, view_mode, &state, *ev)? {
                    return Ok(EndChoice::Quit);
                }
            }
        }

        let view = current_viewport(*view_mode)?;
        display::render(out, &state, view, *view_mode == ViewMode::Windowed)?;

        match state.phase {
            GamePhase::GameOver => return game_over_screen(out, rx, view_mode, &state),
            GamePhase::Victory => return victory_screen(out, rx, audio, view_mode, &state),
            _ => {}
        }

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_PLAY {
            thread::sleep(FRAME_PLAY - elapsed);
        }
    }
}

/// React to one simulation event.  Returns `true` if the player asked to
/// quit during a scripted pause.
fn handle_event<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    audio: &mut Option<Audio>,
    view_mode: &mut ViewMode,
    state: &GameState,
    ev: GameEvent,
) -> std::io::Result<bool> {
    match ev {
        GameEvent::PowerUpCollected(kind) => {
            log::info!("power-up collected: {:?}", kind);
            if let Some(a) = audio {
                a.play_pickup();
            }
        }
        GameEvent::LevelUp(level) => {
            log::info!("reached level {}", level);
        }
        GameEvent::FinalBattle => {
            log::info!("final battle announced");
            if let Some(a) = audio {
                a.start_alert();
            }
            let view = current_viewport(*view_mode)?;
            display::render(out, state, view, *view_mode == ViewMode::Windowed)?;
            display::draw_final_alert(out, view)?;
            let outcome = wait_responsive(out, rx, ALERT_PAUSE, view_mode, |out, mode| {
                let view = current_viewport(mode)?;
                display::render(out, state, view, mode == ViewMode::Windowed)?;
                display::draw_final_alert(out, view)
            })?;
            if let Some(a) = audio {
                a.stop_alert();
            }
            if outcome == WaitOutcome::Quit {
                return Ok(true);
            }
        }
        GameEvent::GameOver => {
            log::info!(
                "game over at score {} level {} with {} bonuses",
                state.score,
                state.level,
                state.bonus_count
            );
            if let Some(a) = audio {
                a.play_game_over();
            }
        }
        GameEvent::Victory => {
            log::info!("victory at score {} with {} bonuses", state.score, state.bonus_count);
        }
    }
    Ok(false)
}

// ── End screens ───────────────────────────────────────────────────────────────

fn game_over_screen<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    view_mode: &mut ViewMode,
    state: &GameState,
) -> std::io::Result<EndChoice> {
    let (score, level, bonus) = (state.score, state.level, state.bonus_count);

    // Leave the crash frame up for a beat before the summary.
    let outcome = wait_responsive(out, rx, END_PAUSE, view_mode, |out, mode| {
        let view = current_viewport(mode)?;
        display::render(out, state, view, mode == ViewMode::Windowed)
    })?;
    if outcome == WaitOutcome::Quit {
        return Ok(EndChoice::Quit);
    }

    let view = current_viewport(*view_mode)?;
    display::draw_game_over(out, view, score, level, bonus)?;
    wait_choice(out, rx, view_mode, |out, mode| {
        let view = current_viewport(mode)?;
        display::draw_game_over(out, view, score, level, bonus)
    })
}

/// Alpha step and delay for the fading replay prompt.
const FADE_STEP: u8 = 5;
const FADE_DELAY: Duration = Duration::from_millis(50);

fn victory_screen<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    audio: &mut Option<Audio>,
    view_mode: &mut ViewMode,
    state: &GameState,
) -> std::io::Result<EndChoice> {
    let (score, level, bonus) = (state.score, state.level, state.bonus_count);

    if let Some(a) = audio {
        a.start_victory();
    }

    let view = current_viewport(*view_mode)?;
    display::draw_victory(out, view, score, level, bonus, None)?;
    let outcome = wait_responsive(out, rx, END_PAUSE, view_mode, |out, mode| {
        let view = current_viewport(mode)?;
        display::draw_victory(out, view, score, level, bonus, None)
    })?;
    if outcome == WaitOutcome::Quit {
        if let Some(a) = audio {
            a.stop_victory();
        }
        return Ok(EndChoice::Quit);
    }

    // Replay prompt fades in from black.
    let mut alpha: u8 = 0;
    loop {
        let view = current_viewport(*view_mode)?;
        display::draw_victory(out, view, score, level, bonus, Some(alpha))?;
        if alpha == u8::MAX {
            break;
        }
        alpha = alpha.saturating_add(FADE_STEP);
        let outcome = wait_responsive(out, rx, FADE_DELAY, view_mode, |out, mode| {
            let view = current_viewport(mode)?;
            display::draw_victory(out, view, score, level, bonus, Some(alpha))
        })?;
        if outcome == WaitOutcome::Quit {
            if let Some(a) = audio {
                a.stop_victory();
            }
            return Ok(EndChoice::Quit);
        }
    }

    let choice = wait_choice(out, rx, view_mode, |out, mode| {
        let view = current_viewport(mode)?;
        display::draw_victory(out, view, score, level, bonus, Some(u8::MAX))
    })?;
    if let Some(a) = audio {
        a.stop_victory();
    }
    Ok(choice)
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    // Audio is best-effort; a machine with no output device still plays.
    let mut audio = match Audio::new() {
        Ok(a) => Some(a),
        Err(e) => {
            log::warn!("audio disabled: {}", e);
            None
        }
    };

    terminal::enable_raw_mode().context("enabling raw mode")?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Request key-release (and key-repeat) events from the terminal.
    // Ghostty / kitty-protocol terminals support this; others fall back
    // gracefully.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || loop {
        match event::read() {
            Ok(ev) => {
                if tx.send(ev).is_err() {
                    break; // receiver dropped → program exiting
                }
            }
            Err(_) => break,
        }
    });

    let result = run(&mut out, &rx, &mut audio);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result.context("running game")
}

fn run<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    audio: &mut Option<Audio>,
) -> std::io::Result<()> {
    let clock = Instant::now();
    let mut view_mode = ViewMode::Windowed;

    if intro(out, rx, &mut view_mode)? == WaitOutcome::Quit {
        return Ok(());
    }

    loop {
        match play(out, rx, audio, &mut view_mode, clock)? {
            EndChoice::Quit => break,
            EndChoice::Replay => continue,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn end_screen_keys_map_to_choices() {
        assert_eq!(
            choice_for_event(&press(KeyCode::Char('r'))),
            ChoiceAction::Pick(EndChoice::Replay)
        );
        assert_eq!(
            choice_for_event(&press(KeyCode::Char('q'))),
            ChoiceAction::Pick(EndChoice::Quit)
        );
        assert_eq!(choice_for_event(&press(KeyCode::Esc)), ChoiceAction::Pick(EndChoice::Quit));
        assert_eq!(choice_for_event(&press(KeyCode::Char('f'))), ChoiceAction::ToggleView);
        assert_eq!(choice_for_event(&press(KeyCode::Char('x'))), ChoiceAction::Ignore);
    }

    #[test]
    fn resize_does_not_leave_an_end_screen() {
        assert_eq!(choice_for_event(&Event::Resize(80, 24)), ChoiceAction::Ignore);
    }

    #[test]
    fn key_release_does_not_pick_a_choice() {
        let ev = Event::Key(KeyEvent::new_with_kind(
            KeyCode::Char('r'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
        ));
        assert_eq!(choice_for_event(&ev), ChoiceAction::Ignore);
    }

    #[test]
    fn wait_choice_skips_non_key_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(Event::Resize(100, 40)).unwrap();
        tx.send(press(KeyCode::Char('r'))).unwrap();

        let mut out: Vec<u8> = Vec::new();
        let mut mode = ViewMode::Windowed;
        let choice = wait_choice(&mut out, &rx, &mut mode, |_, _| Ok(())).unwrap();
        assert_eq!(choice, EndChoice::Replay);
        assert_eq!(mode, ViewMode::Windowed);
    }

    #[test]
    fn fullscreen_toggle_redraws_during_a_pause() {
        let (tx, rx) = mpsc::channel();
        tx.send(press(KeyCode::Char('f'))).unwrap();

        let mut out: Vec<u8> = Vec::new();
        let mut mode = ViewMode::Windowed;
        let mut redrawn_as = None;
        let outcome = wait_responsive(
            &mut out,
            &rx,
            Duration::from_millis(30),
            &mut mode,
            |out, mode| {
                redrawn_as = Some(mode);
                out.write_all(b"frame")
            },
        )
        .unwrap();

        assert_eq!(outcome, WaitOutcome::Elapsed);
        assert_eq!(mode, ViewMode::Fullscreen);
        assert_eq!(redrawn_as, Some(ViewMode::Fullscreen));
        assert!(!out.is_empty());
    }
}

#![forbid(unsafe_code)]

//! Frame sinks: headless checksums and truecolor terminal output.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use nebula_render::{PackedArgb, PixelBuffer};
use nebula_runtime::{FrameInfo, FrameSink, StopHandle};

const UPPER_HALF_BLOCK: char = '\u{2580}';

// =============================================================================
// Headless
// =============================================================================

/// Discards frames; logs their checksum at debug level.
#[derive(Debug, Default)]
pub struct HeadlessSink {
    frames: u64,
}

impl HeadlessSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameSink for HeadlessSink {
    fn present(&mut self, frame: &PixelBuffer, info: &FrameInfo) -> io::Result<()> {
        // Full-frame hash, only when debug events are on.
        if tracing::enabled!(tracing::Level::DEBUG) {
            tracing::debug!(
                frame = info.index,
                t = info.t,
                checksum = %format_args!("{:016x}", frame.checksum()),
                path = info.stats.path.as_str(),
                tiles = info.stats.tiles,
                compute_us = info.stats.duration.as_micros() as u64,
                "frame"
            );
        }
        self.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        tracing::debug!(frames = self.frames, "headless sink finished");
        Ok(())
    }
}

// =============================================================================
// Terminal
// =============================================================================

/// Draws frames with upper-half-block cells: foreground is the top pixel,
/// background the bottom one. The frame is nearest-sampled to the terminal
/// size, which is re-read every frame.
pub struct TerminalSink {
    stop: StopHandle,
    show_fps: bool,
    scratch: Vec<u8>,
    active: bool,
}

impl TerminalSink {
    /// Switch to raw mode and the alternate screen.
    pub fn enter(stop: StopHandle, show_fps: bool) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut sink = Self {
            stop,
            show_fps,
            scratch: Vec::new(),
            active: true,
        };
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All)) {
            sink.restore();
            return Err(e);
        }
        tracing::debug!("terminal presentation active");
        Ok(sink)
    }

    /// Drain pending input; quit keys raise the stop flag.
    fn poll_input(&self) -> io::Result<()> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()?
                && is_quit_key(&key)
            {
                tracing::debug!(code = ?key.code, "quit key pressed");
                self.stop.request_stop();
            }
        }
        Ok(())
    }

    fn restore(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        let mut stdout = io::stdout();
        let _ = execute!(stdout, ResetColor, Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
        let _ = stdout.flush();
    }
}

impl FrameSink for TerminalSink {
    fn present(&mut self, frame: &PixelBuffer, info: &FrameInfo) -> io::Result<()> {
        self.poll_input()?;
        let (cols, rows) = terminal::size()?;
        let hud_rows = u16::from(self.show_fps);
        let image_rows = rows.saturating_sub(hud_rows).max(1);

        self.scratch.clear();
        encode_half_blocks(&mut self.scratch, frame, cols, image_rows)?;
        if self.show_fps && rows > image_rows {
            queue!(
                self.scratch,
                MoveTo(0, image_rows),
                ResetColor,
                Clear(ClearType::CurrentLine),
                Print(hud_line(info))
            )?;
        }

        let mut stdout = io::stdout().lock();
        stdout.write_all(&self.scratch)?;
        stdout.flush()
    }

    fn finish(&mut self) -> io::Result<()> {
        self.restore();
        Ok(())
    }
}

impl Drop for TerminalSink {
    fn drop(&mut self) {
        self.restore();
    }
}

fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind == KeyEventKind::Release {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

fn hud_line(info: &FrameInfo) -> String {
    let stats = &info.stats;
    format!(
        " FPS {:5.1} | {}x{} {} | {} tiles | {:.1} ms",
        info.fps,
        stats.sampled_width,
        stats.sampled_height,
        stats.path.as_str(),
        stats.tiles,
        stats.duration.as_secs_f64() * 1000.0,
    )
}

/// Frame coordinate for cell coordinate `c` out of `cells`, nearest mapping.
#[inline]
fn cell_to_pixel(c: u32, cells: u32, pixels: u32) -> u32 {
    if cells == 0 || pixels == 0 {
        return 0;
    }
    let p = (u64::from(c) * u64::from(pixels) / u64::from(cells)) as u32;
    p.min(pixels - 1)
}

/// Top and bottom pixel shown by cell `(cx, cy)` of a `cols x rows` grid.
fn cell_pixels(
    frame: &PixelBuffer,
    cols: u16,
    rows: u16,
    cx: u16,
    cy: u16,
) -> (PackedArgb, PackedArgb) {
    let x = cell_to_pixel(u32::from(cx), u32::from(cols), frame.width());
    let sub_rows = u32::from(rows) * 2;
    let top = cell_to_pixel(u32::from(cy) * 2, sub_rows, frame.height());
    let bottom = cell_to_pixel(u32::from(cy) * 2 + 1, sub_rows, frame.height());
    (
        frame.get(x, top).unwrap_or(PackedArgb::BLACK),
        frame.get(x, bottom).unwrap_or(PackedArgb::BLACK),
    )
}

#[inline]
fn color(px: PackedArgb) -> Color {
    Color::Rgb {
        r: px.r(),
        g: px.g(),
        b: px.b(),
    }
}

/// Queue the escape sequences that draw `frame` into a `cols x rows` cell area.
/// Colors are only re-emitted when they change along a row.
fn encode_half_blocks<W: Write>(
    out: &mut W,
    frame: &PixelBuffer,
    cols: u16,
    rows: u16,
) -> io::Result<()> {
    if frame.is_empty() {
        return Ok(());
    }
    for cy in 0..rows {
        queue!(out, MoveTo(0, cy))?;
        let mut last: Option<(PackedArgb, PackedArgb)> = None;
        for cx in 0..cols {
            let (top, bottom) = cell_pixels(frame, cols, rows, cx, cy);
            match last {
                Some((fg, bg)) if fg == top && bg == bottom => {}
                Some((fg, _)) if fg == top => queue!(out, SetBackgroundColor(color(bottom)))?,
                Some((_, bg)) if bg == bottom => queue!(out, SetForegroundColor(color(top)))?,
                _ => queue!(
                    out,
                    SetForegroundColor(color(top)),
                    SetBackgroundColor(color(bottom))
                )?,
            }
            last = Some((top, bottom));
            queue!(out, Print(UPPER_HALF_BLOCK))?;
        }
    }
    queue!(out, ResetColor)
}

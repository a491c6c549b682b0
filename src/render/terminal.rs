use super::canvas::{Cell, Frame};
use crossterm::{
    cursor, execute, queue,
    style::{Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use std::io::{self, Write};

/// Puts the terminal in raw mode on the alternate screen, restoring it when dropped.
pub(crate) struct TerminalGuard;

impl TerminalGuard {
    pub(crate) fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let guard = Self;
        execute!(io::stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, ResetColor, cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// Writes frames to a terminal.
pub(crate) struct TerminalDrawer<W: Write> {
    output: W,
    last_size: Option<(u16, u16)>,
}

impl<W: Write> TerminalDrawer<W> {
    pub(crate) fn new(output: W) -> Self {
        Self { output, last_size: None }
    }

    /// Draw a whole frame, only emitting color changes when the color actually changes.
    ///
    /// Frames cover the whole screen so the screen is only cleared when their size changes.
    pub(crate) fn draw(&mut self, frame: &Frame) -> io::Result<()> {
        let size = (frame.width(), frame.height());
        if self.last_size != Some(size) {
            queue!(self.output, ResetColor, terminal::Clear(ClearType::All))?;
            self.last_size = Some(size);
        }
        for (y, row) in frame.rows().enumerate() {
            queue!(self.output, cursor::MoveTo(0, y as u16))?;
            let mut colors = (None, None);
            for cell in row {
                if *cell == Cell::CONTINUATION {
                    continue;
                }
                if (cell.fg, cell.bg) != colors {
                    queue!(self.output, ResetColor)?;
                    if let Some(fg) = cell.fg {
                        queue!(self.output, SetForegroundColor(fg.into()))?;
                    }
                    if let Some(bg) = cell.bg {
                        queue!(self.output, SetBackgroundColor(bg.into()))?;
                    }
                    colors = (cell.fg, cell.bg);
                }
                queue!(self.output, Print(cell.ch))?;
            }
            queue!(self.output, ResetColor)?;
        }
        self.output.flush()
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wheel::colors::Color;

    #[test]
    fn colored_output_contains_text_and_escapes() {
        let mut frame = Frame::new(4, 1);
        frame.write_text(0, 0, "ab", Some(Color::new(1, 2, 3)), None);
        let mut drawer = TerminalDrawer::new(Vec::new());
        drawer.draw(&frame).expect("draw failed");
        let output = String::from_utf8(drawer.into_inner()).expect("invalid utf8");
        assert!(output.contains("ab"));
        assert!(output.contains("38;2;1;2;3"));
        // the color is only set once for both characters
        assert_eq!(output.matches("38;2;1;2;3").count(), 1);
    }

    #[test]
    fn clears_only_on_resize() {
        let clear = "\x1b[2J";
        let mut drawer = TerminalDrawer::new(Vec::new());
        drawer.draw(&Frame::new(4, 2)).expect("draw failed");
        drawer.draw(&Frame::new(4, 2)).expect("draw failed");
        drawer.draw(&Frame::new(5, 2)).expect("draw failed");
        let output = String::from_utf8(drawer.into_inner()).expect("invalid utf8");
        assert_eq!(output.matches(clear).count(), 2);
    }
}

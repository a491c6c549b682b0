use super::canvas::Frame;
use crate::wheel::colors::rainbow_color;
use figlet_rs::FIGfont;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::debug;
use unicode_width::UnicodeWidthStr;

/// How long the banner's colors take to cycle through the whole rainbow.
const HUE_CYCLE: Duration = Duration::from_millis(2000);

/// Generator for ASCII art banners using FIGlet fonts
pub(crate) struct BannerGenerator {
    font: FIGfont,
}

impl BannerGenerator {
    /// Create a generator that uses the standard FIGlet font.
    pub(crate) fn standard() -> Result<Self, BannerError> {
        // figlet-rs has been known to panic on malformed fonts
        match catch_unwind(FIGfont::standard) {
            Ok(Ok(font)) => Ok(Self { font }),
            Ok(Err(e)) => Err(BannerError::FontLoadFailed(e)),
            Err(_) => Err(BannerError::FontLoadFailed("panic during font loading".into())),
        }
    }

    /// Generate ASCII art from the given text, one string per line.
    pub(crate) fn generate(&self, text: &str) -> Result<Vec<String>, BannerError> {
        let figure = match catch_unwind(AssertUnwindSafe(|| self.font.convert(text))) {
            Ok(Some(figure)) => figure.to_string(),
            Ok(None) | Err(_) => return Err(BannerError::ConversionFailed(text.to_string())),
        };
        let mut lines: Vec<String> = figure.lines().map(|line| line.trim_end().to_string()).collect();
        while lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }
        Ok(lines)
    }
}

/// Errors that can occur when generating banners
#[derive(thiserror::Error, Debug)]
pub(crate) enum BannerError {
    #[error("failed to load font: {0}")]
    FontLoadFailed(String),

    #[error("failed to convert text '{0}' to ASCII art")]
    ConversionFailed(String),
}

/// The rainbow colored announcement of a spin's result.
#[derive(Clone, Debug)]
pub(crate) struct ResultBanner {
    lines: Vec<String>,
    started: Instant,
}

impl ResultBanner {
    /// Build a banner for `label` that fits in `max_width` columns.
    ///
    /// Falls back to the plain label when there's no generator, generation fails or the ASCII
    /// art would be too wide.
    pub(crate) fn new(generator: Option<&BannerGenerator>, label: &str, max_width: u16, started: Instant) -> Self {
        let art = generator.map(|generator| generator.generate(label));
        let lines = match art {
            Some(Ok(lines)) if lines.iter().all(|line| line.width() <= max_width as usize) => lines,
            Some(Ok(_)) => {
                debug!(label, max_width, "banner too wide, using plain text");
                vec![label.to_string()]
            }
            Some(Err(e)) => {
                debug!("banner generation failed: {e}");
                vec![label.to_string()]
            }
            None => vec![label.to_string()],
        };
        Self { lines, started }
    }

    #[cfg(test)]
    pub(crate) fn lines(&self) -> &[String] {
        &self.lines
    }

    pub(crate) fn height(&self) -> u16 {
        self.lines.len() as u16
    }

    /// The hue shift at `now`, looping every cycle.
    pub(crate) fn hue_offset(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.started);
        let progress = (elapsed.as_millis() % HUE_CYCLE.as_millis()) as f32 / HUE_CYCLE.as_millis() as f32;
        progress * 360.0
    }

    /// Paint the banner into the frame with its top left corner at `(x, y)`.
    pub(crate) fn paint(&self, frame: &mut Frame, x: u16, y: u16, now: Instant) {
        let hue_offset = self.hue_offset(now);
        let total_chars = self.lines.iter().flat_map(|line| line.chars()).filter(|c| !c.is_whitespace()).count();
        let mut char_index = 0;
        for (row, line) in self.lines.iter().enumerate() {
            let mut column = x;
            for ch in line.chars() {
                let mut buffer = [0; 4];
                let color = (!ch.is_whitespace()).then(|| rainbow_color(char_index, total_chars, hue_offset));
                if color.is_some() {
                    char_index += 1;
                }
                let text = ch.encode_utf8(&mut buffer);
                frame.write_text(column, y + row as u16, text, color, None);
                column += text.width() as u16;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_font_renders() {
        let generator = BannerGenerator::standard().expect("no standard font");
        let lines = generator.generate("Hi").expect("conversion failed");
        assert!(lines.len() > 1);
        assert!(lines.last().is_some_and(|line| !line.is_empty()));
        assert!(lines.iter().all(|line| line == line.trim_end()));
    }

    #[test]
    fn falls_back_to_plain_text_when_too_wide() {
        let generator = BannerGenerator::standard().expect("no standard font");
        let banner = ResultBanner::new(Some(&generator), "Cook something new", 20, Instant::now());
        assert_eq!(banner.lines(), &["Cook something new"]);
        assert_eq!(banner.height(), 1);
    }

    #[test]
    fn plain_text_without_generator() {
        let banner = ResultBanner::new(None, "Pizza", 80, Instant::now());
        assert_eq!(banner.lines(), &["Pizza"]);
    }

    #[test]
    fn hue_cycles() {
        let now = Instant::now();
        let banner = ResultBanner::new(None, "Pizza", 80, now);
        assert_eq!(banner.hue_offset(now), 0.0);
        assert_eq!(banner.hue_offset(now + HUE_CYCLE / 2), 180.0);
        assert_eq!(banner.hue_offset(now + HUE_CYCLE), 0.0);
    }

    #[test]
    fn paint_colors_only_visible_characters() {
        let now = Instant::now();
        let banner = ResultBanner::new(None, "a b", 80, now);
        let mut frame = Frame::new(5, 1);
        banner.paint(&mut frame, 1, 0, now);
        assert_eq!(frame.row_text(0), " a b ");
        assert_eq!(frame.get(1, 0).and_then(|c| c.fg), Some(rainbow_color(0, 2, 0.0)));
        assert_eq!(frame.get(2, 0).and_then(|c| c.fg), None);
        assert_eq!(frame.get(3, 0).and_then(|c| c.fg), Some(rainbow_color(1, 2, 0.0)));
    }
}

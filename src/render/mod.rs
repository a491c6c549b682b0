pub(crate) mod banner;
pub(crate) mod canvas;
pub(crate) mod terminal;

use crate::wheel::colors::Color;
use crate::wheel::geometry::slice_at_pointer;
use crate::wheel::SliceView;
use banner::ResultBanner;
use canvas::{truncate_to_width, Frame, WheelPainter};
use std::time::Instant;
use unicode_width::UnicodeWidthStr;

/// The rate the gauge in the status line is full at.
const GAUGE_MAX_RATE: f64 = 2.0;
const GAUGE_CELLS: usize = 10;

const DIM: Color = Color::new(0x80, 0x80, 0x80);

/// Everything that's drawn in a single frame.
pub(crate) struct Scene<'a> {
    pub(crate) slices: Vec<SliceView<'a>>,
    pub(crate) rotation: f64,
    /// How many cells labels may take, when known.
    pub(crate) label_cells: Option<f64>,
    pub(crate) rate: f64,
    pub(crate) spinning: bool,
    pub(crate) banner: Option<&'a ResultBanner>,
}

/// Where things go on a terminal of a given size.
///
/// The wheel sits on the left, with a panel on its right holding the result banner and the
/// legend. The last row is the status line.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ScreenLayout {
    width: u16,
    height: u16,
    painter: WheelPainter,
    panel_x: u16,
}

impl ScreenLayout {
    pub(crate) fn new(width: u16, height: u16) -> Self {
        // one row for the pointer and two for the status line
        let by_height = height.saturating_sub(3) / 2;
        // keep at least half the screen for the panel
        let by_width = (width / 2).saturating_sub(1) / 4;
        let painter = WheelPainter::new(by_height.min(by_width));
        let panel_x = painter.width() + 2;
        Self { width, height, painter, panel_x }
    }

    pub(crate) fn panel_width(&self) -> u16 {
        self.width.saturating_sub(self.panel_x)
    }

    pub(crate) fn render(&self, scene: &Scene, now: Instant) -> Frame {
        let mut frame = Frame::new(self.width, self.height);
        self.painter.paint(&mut frame, 0, 0, &scene.slices, scene.rotation, scene.label_cells);

        let mut legend_y = 1;
        if let Some(banner) = scene.banner {
            banner.paint(&mut frame, self.panel_x, legend_y, now);
            legend_y += banner.height() + 1;
        }
        self.paint_legend(&mut frame, legend_y, scene);
        self.paint_status(&mut frame, scene);
        frame
    }

    fn paint_legend(&self, frame: &mut Frame, top: u16, scene: &Scene) {
        let bottom = self.height.saturating_sub(2);
        if scene.slices.is_empty() || top >= bottom {
            return;
        }
        let rows = (bottom - top) as usize;
        let pointed = slice_at_pointer(scene.rotation, scene.slices.len());
        let shown = if scene.slices.len() > rows { rows.saturating_sub(1) } else { rows };
        let label_width = self.panel_width().saturating_sub(2) as usize;
        for (offset, slice) in scene.slices.iter().take(shown).enumerate() {
            let y = top + offset as u16;
            frame.write_text(self.panel_x, y, "■", Some(slice.fill), None);
            let marker = if slice.layout.index == pointed { '▸' } else { ' ' };
            let entry = format!("{marker}{}. {}", slice.layout.index + 1, slice.label);
            frame.write_text(self.panel_x + 1, y, &truncate_to_width(&entry, label_width), None, None);
        }
        let hidden = scene.slices.len() - shown.min(scene.slices.len());
        if hidden > 0 {
            let y = top + shown as u16;
            frame.write_text(self.panel_x + 2, y, &format!("… and {hidden} more"), Some(DIM), None);
        }
    }

    fn paint_status(&self, frame: &mut Frame, scene: &Scene) {
        let y = self.height.saturating_sub(1);
        let help = if scene.spinning { "spinning…" } else { "[enter] spin  [r] reload  [q] quit" };
        frame.write_text(0, y, help, Some(DIM), None);

        let gauge = rate_gauge(scene.rate);
        let x = self.width.saturating_sub(gauge.width() as u16);
        frame.write_text(x, y, &gauge, None, None);
    }
}

/// A bar showing the auxiliary rate.
fn rate_gauge(rate: f64) -> String {
    let filled = ((rate / GAUGE_MAX_RATE).clamp(0.0, 1.0) * GAUGE_CELLS as f64).round() as usize;
    format!("rate {rate:.2} {}{}", "█".repeat(filled), "░".repeat(GAUGE_CELLS - filled))
}

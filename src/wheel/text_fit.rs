use once_cell::unsync::OnceCell;
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::debug;
use unicode_width::UnicodeWidthStr;

/// Measures how wide a piece of text is when rendered.
pub(crate) trait TextMeasurer {
    /// The rendered width of `text` at `font_size`, or `None` if text can't be measured in this
    /// context.
    fn measure(&self, text: &str, font_size: u32) -> Option<f64>;

    /// How many terminal cells fit in `width` at `font_size`, if text is laid out in cells.
    fn cells_in(&self, _width: f64, _font_size: u32) -> Option<f64> {
        None
    }
}

impl<T: TextMeasurer + ?Sized> TextMeasurer for &T {
    fn measure(&self, text: &str, font_size: u32) -> Option<f64> {
        (**self).measure(text, font_size)
    }

    fn cells_in(&self, width: f64, font_size: u32) -> Option<f64> {
        (**self).cells_in(width, font_size)
    }
}

/// A measurer for contexts where nothing gets rendered.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Unmeasurable;

impl TextMeasurer for Unmeasurable {
    fn measure(&self, _text: &str, _font_size: u32) -> Option<f64> {
        None
    }
}

/// Measures text as a run of fixed advance glyphs, one per terminal cell.
///
/// Cell widths are computed on a measuring surface that's created the first time something is
/// measured and reused afterwards.
#[derive(Debug)]
pub(crate) struct CellMeasurer {
    advance: f64,
    surface: OnceCell<MeasuringSurface>,
}

impl CellMeasurer {
    /// The average glyph advance as a fraction of the font size.
    const DEFAULT_ADVANCE: f64 = 0.6;

    pub(crate) fn new(advance: f64) -> Self {
        Self { advance, surface: OnceCell::new() }
    }
}

impl Default for CellMeasurer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ADVANCE)
    }
}

impl TextMeasurer for CellMeasurer {
    fn measure(&self, text: &str, font_size: u32) -> Option<f64> {
        let surface = self.surface.get_or_init(MeasuringSurface::default);
        Some(surface.cells(text) as f64 * font_size as f64 * self.advance)
    }

    fn cells_in(&self, width: f64, font_size: u32) -> Option<f64> {
        let cell = font_size as f64 * self.advance;
        (cell > 0.0).then(|| width / cell)
    }
}

#[derive(Debug, Default)]
struct MeasuringSurface {
    widths: RefCell<HashMap<String, usize>>,
}

impl MeasuringSurface {
    fn cells(&self, text: &str) -> usize {
        if let Some(width) = self.widths.borrow().get(text) {
            return *width;
        }
        let width = text.width();
        self.widths.borrow_mut().insert(text.to_string(), width);
        width
    }
}

/// The font size bounds used when fitting labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FontSizing {
    /// The size text is first measured at.
    pub(crate) baseline: u32,

    /// The smallest size a label can shrink to.
    pub(crate) min_size: u32,

    /// The largest size a label can grow to.
    pub(crate) max_size: u32,
}

impl Default for FontSizing {
    fn default() -> Self {
        Self { baseline: 14, min_size: 8, max_size: 16 }
    }
}

/// Finds the font size that makes labels fit within their slice.
pub(crate) struct TextFitter<M> {
    measurer: M,
    sizing: FontSizing,
}

impl<M: TextMeasurer> TextFitter<M> {
    pub(crate) fn new(measurer: M, sizing: FontSizing) -> Self {
        Self { measurer, sizing }
    }

    /// The largest font size at which `label` fits in `max_width`.
    ///
    /// The result is always within the configured bounds. At the minimum size the label may still
    /// overflow.
    pub(crate) fn fit(&self, label: &str, max_width: f64) -> u32 {
        let FontSizing { baseline, min_size, max_size } = self.sizing;
        let base_width = match self.measurer.measure(label, baseline) {
            Some(width) if width.is_finite() && width > 0.0 => width,
            Some(_) => return baseline,
            None => {
                debug!("text measurement unavailable, using baseline font size");
                return baseline;
            }
        };
        let proposed = (baseline as f64 * max_width / base_width).floor();
        let mut size = proposed.clamp(min_size as f64, max_size as f64) as u32;
        // scaling from a single sample is approximate, walk down until it really fits
        while size > min_size && self.measurer.measure(label, size).is_some_and(|width| width > max_width) {
            size -= 1;
        }
        size
    }

    /// The font size shared by every label on the wheel: the smallest of their fitted sizes.
    pub(crate) fn uniform<S: AsRef<str>>(&self, labels: &[S], max_width: f64) -> u32 {
        labels.iter().map(|label| self.fit(label.as_ref(), max_width)).min().unwrap_or(self.sizing.baseline)
    }

    /// How many terminal cells a label `width` wide takes at `font_size`, when that's known.
    pub(crate) fn cells_in(&self, width: f64, font_size: u32) -> Option<f64> {
        self.measurer.cells_in(width, font_size)
    }

    #[cfg(test)]
    pub(crate) fn measurer(&self) -> &M {
        &self.measurer
    }
}

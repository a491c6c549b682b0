use crate::wheel::colors::Color;
use crate::wheel::rotation::slice_angle;
use crate::wheel::SliceView;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// The ratio between a terminal cell's height and its width.
const CELL_ASPECT: f64 = 2.0;

/// How far from the center labels are drawn, relative to the wheel's radius.
const LABEL_RADIUS_RATIO: f64 = 0.62;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Option<Color>,
    pub(crate) bg: Option<Color>,
}

impl Cell {
    pub(crate) const EMPTY: Cell = Cell { ch: ' ', fg: None, bg: None };

    /// Marks the second half of a double width character.
    pub(crate) const CONTINUATION: Cell = Cell { ch: '\0', fg: None, bg: None };
}

/// A grid of terminal cells.
#[derive(Clone, Debug)]
pub(crate) struct Frame {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl Frame {
    pub(crate) fn new(width: u16, height: u16) -> Self {
        Self { width, height, cells: vec![Cell::EMPTY; width as usize * height as usize] }
    }

    pub(crate) fn width(&self) -> u16 {
        self.width
    }

    pub(crate) fn height(&self) -> u16 {
        self.height
    }

    pub(crate) fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(y as usize * self.width as usize + x as usize)
    }

    pub(crate) fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y as usize * self.width as usize + x as usize] = cell;
        }
    }

    /// Write text starting at the given position, keeping each cell's background unless one is
    /// given. Text that goes past the right edge is cut.
    pub(crate) fn write_text(&mut self, x: u16, y: u16, text: &str, fg: Option<Color>, bg: Option<Color>) {
        let mut column = x;
        for ch in text.chars() {
            let width = ch.width().unwrap_or(0) as u16;
            if width == 0 {
                continue;
            }
            if column.saturating_add(width) > self.width {
                break;
            }
            let background = bg.or_else(|| self.get(column, y).and_then(|cell| cell.bg));
            self.set(column, y, Cell { ch, fg, bg: background });
            if width == 2 {
                self.set(column + 1, y, Cell::CONTINUATION);
            }
            column += width;
        }
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.width.max(1) as usize)
    }

    /// The text in a row, for debugging and tests.
    #[cfg(test)]
    pub(crate) fn row_text(&self, y: u16) -> String {
        let Some(row) = self.rows().nth(y as usize) else {
            return String::new();
        };
        row.iter().map(|cell| cell.ch).filter(|ch| *ch != '\0').collect()
    }
}

/// Cut `text` so it takes at most `max_cells` terminal cells, marking the cut with an ellipsis.
pub(crate) fn truncate_to_width(text: &str, max_cells: usize) -> String {
    if text.width() <= max_cells {
        return text.to_string();
    }
    if max_cells == 0 {
        return String::new();
    }
    let mut output = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let width = ch.width().unwrap_or(0);
        if used + width + 1 > max_cells {
            break;
        }
        output.push(ch);
        used += width;
    }
    output.push('…');
    output
}

/// Draws a wheel into a frame.
#[derive(Clone, Copy, Debug)]
pub(crate) struct WheelPainter {
    /// The wheel's radius, in rows.
    radius: u16,
}

impl WheelPainter {
    pub(crate) fn new(radius: u16) -> Self {
        Self { radius: radius.max(2) }
    }

    /// The number of columns the wheel takes.
    pub(crate) fn width(&self) -> u16 {
        self.radius * 4 + 1
    }

    /// The number of rows the wheel takes, including the pointer.
    pub(crate) fn height(&self) -> u16 {
        self.radius * 2 + 2
    }

    /// Paint the wheel with its top left corner at `(x, y)`, rotated by `rotation` degrees.
    ///
    /// Labels are cut to `label_cells` cells, or to the room on screen when that's not known.
    pub(crate) fn paint(
        &self,
        frame: &mut Frame,
        x: u16,
        y: u16,
        slices: &[SliceView],
        rotation: f64,
        label_cells: Option<f64>,
    ) {
        if slices.is_empty() {
            return;
        }
        let radius = self.radius as f64;
        let center_x = x as f64 + radius * CELL_ASPECT;
        let center_y = y as f64 + 1.0 + radius;
        for row in 0..self.height() - 1 {
            for column in 0..self.width() {
                let (cx, cy) = ((x + column) as f64 + 0.5, (y + 1 + row) as f64 + 0.5);
                let dx = (cx - center_x) / CELL_ASPECT;
                let dy = cy - center_y;
                if dx.hypot(dy) > radius {
                    continue;
                }
                // the cell's angle on the unrotated wheel
                let angle = dx.atan2(-dy).to_degrees() - rotation;
                let Some(slice) = slices.iter().find(|slice| slice.layout.contains(angle)).or(slices.last()) else {
                    continue;
                };
                frame.set(x + column, y + 1 + row, Cell { ch: ' ', fg: None, bg: Some(slice.fill) });
            }
        }
        frame.set(center_x as u16, y, Cell { ch: '▼', fg: Some(Color::WHITE), bg: None });

        let label_radius = radius * LABEL_RADIUS_RATIO;
        let half_angle = slice_angle(slices.len()).to_radians() / 2.0;
        let screen_chord = 2.0 * label_radius * half_angle.sin() * CELL_ASPECT;
        for slice in slices {
            let (ax, ay) = slice.layout.anchor_at(rotation);
            let scale = label_radius / ax.hypot(ay).max(f64::EPSILON);
            let anchor_x = center_x + ax * scale * CELL_ASPECT;
            let anchor_y = center_y + ay * scale;
            let cells = label_cells.map_or(screen_chord, |cells| cells.min(screen_chord)).floor().max(0.0) as usize;
            let label = truncate_to_width(slice.label, cells);
            if label.is_empty() {
                continue;
            }
            let start = (anchor_x - label.width() as f64 / 2.0).round().max(0.0) as u16;
            frame.write_text(start, anchor_y as u16, &label, Some(slice.text_color), None);
        }
    }
}

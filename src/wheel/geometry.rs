use super::rotation::{normalize_degrees, slice_angle};

/// Where labels are placed within the wheel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct LabelBand {
    /// The distance from the wheel's center to the labels' anchor.
    pub(crate) radius: f64,

    /// The horizontal space kept free around each label.
    pub(crate) padding: f64,
}

impl LabelBand {
    /// The width available to a label: the chord of the slice at the label radius, minus padding.
    pub(crate) fn max_text_width(&self, slice_count: usize) -> f64 {
        let half_angle = slice_angle(slice_count).to_radians() / 2.0;
        (2.0 * self.radius * half_angle.sin() - self.padding).max(0.0)
    }
}

impl Default for LabelBand {
    fn default() -> Self {
        Self { radius: 85.0, padding: 12.0 }
    }
}

/// The layout of a single slice, in wheel coordinates.
///
/// Angles are in degrees, measured clockwise from the top of the wheel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SliceLayout {
    pub(crate) index: usize,
    pub(crate) start_angle: f64,
    pub(crate) end_angle: f64,
    /// The label's anchor relative to the wheel's center, with y growing downwards.
    pub(crate) label_anchor: (f64, f64),
}

impl SliceLayout {
    pub(crate) fn new(index: usize, slice_count: usize, band: &LabelBand) -> Self {
        let angle = slice_angle(slice_count);
        let start_angle = index as f64 * angle;
        let mid_angle = start_angle + angle / 2.0;
        let theta = (mid_angle - 90.0).to_radians();
        let label_anchor = (band.radius * theta.cos(), band.radius * theta.sin());
        Self { index, start_angle, end_angle: start_angle + angle, label_anchor }
    }

    /// Where the label's anchor ends up once the wheel is rotated clockwise by `rotation` degrees.
    pub(crate) fn anchor_at(&self, rotation: f64) -> (f64, f64) {
        let (sin, cos) = rotation.to_radians().sin_cos();
        let (x, y) = self.label_anchor;
        (x * cos - y * sin, x * sin + y * cos)
    }

    /// Whether `angle` (in wheel coordinates) falls inside this slice.
    pub(crate) fn contains(&self, angle: f64) -> bool {
        let angle = normalize_degrees(angle);
        angle >= self.start_angle && angle < self.end_angle
    }
}

/// Lay out every slice of a wheel.
pub(crate) fn layout(slice_count: usize, band: &LabelBand) -> Vec<SliceLayout> {
    (0..slice_count).map(|index| SliceLayout::new(index, slice_count, band)).collect()
}

/// The slice under the pointer when the wheel has been rotated by `rotation` degrees.
pub(crate) fn slice_at_pointer(rotation: f64, slice_count: usize) -> usize {
    // the pointer sits at the top, which in wheel coordinates is at -rotation
    let angle = normalize_degrees(-rotation);
    ((angle / slice_angle(slice_count)) as usize).min(slice_count.saturating_sub(1))
}

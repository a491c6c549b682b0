use crate::random::RandomSource;
use std::ops::RangeInclusive;
use tracing::debug;

/// The full turns a spin makes before settling, unless configured otherwise.
pub(crate) const DEFAULT_TURNS: RangeInclusive<u32> = 3..=6;

/// Normalise an angle to the half-open range [0°, 360°).
pub(crate) fn normalize_degrees(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if normalized >= 360.0 { 0.0 } else { normalized }
}

/// The angle of a single slice for a wheel with `slice_count` slices.
pub(crate) fn slice_angle(slice_count: usize) -> f64 {
    360.0 / slice_count.max(1) as f64
}

/// The resting angle that puts the center of slice `index` right under the pointer.
pub(crate) fn desired_angle(index: usize, slice_count: usize) -> f64 {
    normalize_degrees(360.0 - (index as f64 + 0.5) * slice_angle(slice_count))
}

/// A planned rotation for a single spin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RotationPlan {
    /// The number of full turns before aligning.
    pub(crate) turns: u32,
    /// The forward rotation needed to align the target slice, in [0, 360).
    pub(crate) align_delta: f64,
}

impl RotationPlan {
    /// The total additional rotation, always positive.
    pub(crate) fn additional_rotation(&self) -> f64 {
        self.turns as f64 * 360.0 + self.align_delta
    }
}

/// Computes how much further the wheel needs to rotate so it lands on a slice.
#[derive(Clone, Debug)]
pub(crate) struct RotationPlanner {
    turns: RangeInclusive<u32>,
}

impl RotationPlanner {
    pub(crate) fn new(turns: RangeInclusive<u32>) -> Self {
        Self { turns }
    }

    /// Plan the rotation that takes the wheel from `current_rotation` to the center of
    /// `target_index`.
    ///
    /// The wheel only ever moves forward: the alignment part is always in [0, 360) no matter
    /// where the wheel is resting now.
    pub(crate) fn plan<R: RandomSource>(
        &self,
        current_rotation: f64,
        target_index: usize,
        slice_count: usize,
        rng: &mut R,
    ) -> RotationPlan {
        let desired = desired_angle(target_index, slice_count);
        let previous = normalize_degrees(current_rotation);
        let align_delta = normalize_degrees(desired - previous);
        let low = *self.turns.start();
        let high = (*self.turns.end()).max(low);
        let turns = low + rng.index((high - low) as usize + 1) as u32;
        debug!(target_index, slice_count, desired, previous, align_delta, turns, "planned rotation");
        RotationPlan { turns, align_delta }
    }
}

impl Default for RotationPlanner {
    fn default() -> Self {
        Self::new(DEFAULT_TURNS)
    }
}

pub(crate) mod animator;
pub(crate) mod colors;
pub(crate) mod geometry;
pub(crate) mod rotation;
pub(crate) mod selector;
pub(crate) mod text_fit;

use crate::choices::{ChoiceList, ChoiceListError};
use crate::random::RandomSource;
use animator::{AnimatorPoll, DecaySampler, Phase, RateCurve, SpinAnimator};
use colors::{Color, Palette};
use geometry::{LabelBand, SliceLayout};
use rotation::{RotationPlanner, DEFAULT_TURNS};
use selector::{Markers, SpecialGroup, TargetSelector};
use std::ops::RangeInclusive;
use std::time::{Duration, Instant};
use text_fit::{FontSizing, TextFitter, TextMeasurer};
use tracing::{debug, info};

/// Errors produced by the wheel.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub(crate) enum WheelError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<ChoiceListError> for WheelError {
    fn from(e: ChoiceListError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}

/// Everything that shapes how a wheel looks and spins.
#[derive(Clone, Debug)]
pub(crate) struct WheelSettings {
    pub(crate) spin_duration: Duration,
    pub(crate) turns: RangeInclusive<u32>,
    pub(crate) rate: RateCurve,
    pub(crate) palette: Palette,
    pub(crate) markers: Markers,
    pub(crate) band: LabelBand,
    pub(crate) sizing: FontSizing,
}

impl Default for WheelSettings {
    fn default() -> Self {
        Self {
            spin_duration: animator::DEFAULT_SPIN_DURATION,
            turns: DEFAULT_TURNS,
            rate: RateCurve::default(),
            palette: Palette::default(),
            markers: Markers::default(),
            band: LabelBand::default(),
            sizing: FontSizing::default(),
        }
    }
}

/// A snapshot of a wheel's state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct WheelState {
    /// The cumulative rotation, in degrees. It only ever grows.
    pub(crate) rotation: f64,
    pub(crate) phase: Phase,
    /// The special group used by the last spin that involved one.
    pub(crate) last_group: Option<SpecialGroup>,
}

/// What happened when a wheel was polled.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum WheelEvent {
    /// Nothing is going on.
    Idle,
    /// The wheel is spinning and should be drawn at `rotation`.
    Frame { rotation: f64, progress: f64 },
    /// A spin just finished on the given slice.
    Finished { index: usize, label: String },
}

/// A slice, ready to be drawn.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SliceView<'a> {
    pub(crate) label: &'a str,
    pub(crate) layout: SliceLayout,
    pub(crate) fill: Color,
    pub(crate) text_color: Color,
    pub(crate) font_size: u32,
}

type ResultListener = Box<dyn FnMut(usize, &str)>;

/// A spinning wheel.
///
/// The wheel owns its state and only changes it through [`Wheel::spin`], [`Wheel::poll`],
/// [`Wheel::cancel`] and [`Wheel::set_choices`]. Nothing happens on its own: callers poll the
/// wheel once per frame.
pub(crate) struct Wheel<R, M> {
    choices: ChoiceList,
    rng: R,
    fitter: TextFitter<M>,
    selector: TargetSelector,
    planner: RotationPlanner,
    band: LabelBand,
    palette: Palette,
    colors: Vec<Color>,
    font_size: u32,
    rotation: f64,
    last_group: Option<SpecialGroup>,
    animator: SpinAnimator,
    pending: Option<(usize, String)>,
    selected: Option<String>,
    listeners: Vec<ResultListener>,
}

impl<R, M> Wheel<R, M>
where
    R: RandomSource,
    M: TextMeasurer,
{
    pub(crate) fn new(
        choices: ChoiceList,
        settings: WheelSettings,
        rng: R,
        measurer: M,
        sampler: Box<dyn DecaySampler>,
    ) -> Self {
        let WheelSettings { spin_duration, turns, rate, palette, markers, band, sizing } = settings;
        let mut wheel = Self {
            choices,
            rng,
            fitter: TextFitter::new(measurer, sizing),
            selector: TargetSelector::new(&markers),
            planner: RotationPlanner::new(turns),
            band,
            palette,
            colors: Vec::new(),
            font_size: sizing.baseline,
            rotation: 0.0,
            last_group: None,
            animator: SpinAnimator::new(spin_duration, rate, sampler),
            pending: None,
            selected: None,
            listeners: Vec::new(),
        };
        wheel.relayout();
        wheel
    }

    /// Replace the wheel's choices, recomputing colors and font size.
    ///
    /// Returns `false` if the wheel is spinning, in which case nothing changes: the spin's result
    /// must refer to the list it was drawn from.
    pub(crate) fn set_choices(&mut self, choices: ChoiceList) -> bool {
        if self.is_spinning() {
            debug!("ignoring new choices while spinning");
            return false;
        }
        self.choices = choices;
        self.selected = None;
        self.relayout();
        true
    }

    /// Register a listener that's called once per completed spin with the winning slice.
    pub(crate) fn on_result<F>(&mut self, listener: F)
    where
        F: FnMut(usize, &str) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Start a spin.
    ///
    /// Returns `Ok(false)` if the wheel is already spinning, in which case nothing changes.
    pub(crate) fn spin(&mut self, now: Instant) -> Result<bool, WheelError> {
        if self.animator.phase() == Phase::Spinning {
            debug!("ignoring spin request while spinning");
            return Ok(false);
        }
        self.selected = None;
        let selection = self.selector.select(self.choices.labels(), self.last_group, &mut self.rng)?;
        self.last_group = selection.group;

        let slice_count = self.choices.len();
        let plan = self.planner.plan(self.rotation, selection.index, slice_count, &mut self.rng);
        let from = self.rotation;
        self.rotation += plan.additional_rotation();
        self.animator.start(now, from, self.rotation);

        let label = self.choices[selection.index].clone();
        info!(index = selection.index, label = %label, turns = plan.turns, rotation = self.rotation, "spin started");
        self.pending = Some((selection.index, label));
        Ok(true)
    }

    /// Advance the wheel to `now`.
    pub(crate) fn poll(&mut self, now: Instant) -> WheelEvent {
        match self.animator.poll(now) {
            AnimatorPoll::Idle => WheelEvent::Idle,
            AnimatorPoll::Spinning { progress } => {
                let rotation = self.animator.rotation_at(now).unwrap_or(self.rotation);
                WheelEvent::Frame { rotation, progress }
            }
            AnimatorPoll::Completed => match self.pending.take() {
                Some((index, label)) => {
                    info!(index, label = %label, "spin finished");
                    self.selected = Some(label.clone());
                    for listener in &mut self.listeners {
                        listener(index, &label);
                    }
                    WheelEvent::Finished { index, label }
                }
                None => WheelEvent::Idle,
            },
        }
    }

    /// Abandon the spin in progress without reporting a result.
    pub(crate) fn cancel(&mut self) {
        if self.animator.cancel() {
            debug!("spin cancelled");
            self.pending = None;
        }
    }

    /// The rotation the wheel should be drawn at, at `now`.
    pub(crate) fn displayed_rotation(&self, now: Instant) -> f64 {
        self.animator.rotation_at(now).unwrap_or(self.rotation)
    }

    pub(crate) fn state(&self) -> WheelState {
        WheelState { rotation: self.rotation, phase: self.animator.phase(), last_group: self.last_group }
    }

    pub(crate) fn is_spinning(&self) -> bool {
        self.animator.phase() == Phase::Spinning
    }

    pub(crate) fn spin_duration(&self) -> Duration {
        self.animator.duration()
    }

    pub(crate) fn choices(&self) -> &ChoiceList {
        &self.choices
    }

    /// The label the last completed spin landed on, cleared when a new spin starts.
    pub(crate) fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The width labels are fitted to.
    pub(crate) fn max_text_width(&self) -> f64 {
        self.band.max_text_width(self.choices.len())
    }

    /// How many terminal cells a label may take, when the measurer lays text out in cells.
    pub(crate) fn label_cells(&self) -> Option<f64> {
        self.fitter.cells_in(self.max_text_width(), self.font_size)
    }

    /// Every slice, with what's needed to draw it.
    pub(crate) fn slices(&self) -> impl Iterator<Item = SliceView<'_>> {
        geometry::layout(self.choices.len(), &self.band).into_iter().map(move |layout| {
            let fill = self.colors[layout.index];
            SliceView {
                label: &self.choices[layout.index],
                layout,
                fill,
                text_color: fill.label_color(),
                font_size: self.font_size,
            }
        })
    }

    fn relayout(&mut self) {
        let slice_count = self.choices.len();
        self.colors = self.palette.assign(slice_count, &mut self.rng);
        let max_width = self.max_text_width();
        self.font_size = self.fitter.uniform(self.choices.labels(), max_width);
        debug!(slice_count, max_width, font_size = self.font_size, "laid out wheel");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedSource;
    use animator::{NoopSampler, SharedRate};
    use rotation::{desired_angle, normalize_degrees};
    use std::cell::RefCell;
    use std::rc::Rc;
    use text_fit::{CellMeasurer, Unmeasurable};

    fn wheel<R: RandomSource>(labels: &[&str], rng: R) -> Wheel<R, CellMeasurer> {
        let choices = ChoiceList::new(labels.iter().copied()).expect("invalid choices");
        Wheel::new(choices, WheelSettings::default(), rng, CellMeasurer::default(), Box::new(NoopSampler))
    }

    fn record_results<R: RandomSource, M: TextMeasurer>(wheel: &mut Wheel<R, M>) -> Rc<RefCell<Vec<String>>> {
        let results = Rc::new(RefCell::new(Vec::new()));
        let sink = results.clone();
        wheel.on_result(move |_, label| sink.borrow_mut().push(label.to_string()));
        results
    }

    #[test]
    fn spin_reports_one_of_the_choices() {
        let choices = ["Pizza", "Sushi", "Tacos"];
        let mut wheel = wheel(&choices, fastrand::Rng::with_seed(10));
        let results = record_results(&mut wheel);
        let now = Instant::now();

        assert!(wheel.spin(now).unwrap());
        assert!(wheel.is_spinning());
        assert!(matches!(wheel.poll(now + Duration::from_millis(1500)), WheelEvent::Frame { .. }));
        let (index, label) = match wheel.poll(now + Duration::from_millis(3000)) {
            WheelEvent::Finished { index, label } => (index, label),
            other => panic!("spin didn't finish: {other:?}"),
        };
        assert_eq!(label, choices[index]);
        assert_eq!(*results.borrow(), vec![label.clone()]);
        assert_eq!(wheel.selected(), Some(label.as_str()));
        assert!(!wheel.is_spinning());
        assert_eq!(wheel.state().phase, Phase::Idle);
    }

    #[test]
    fn second_spin_request_is_ignored() {
        let mut wheel = wheel(&["Pizza", "Sushi", "Tacos"], fastrand::Rng::with_seed(1));
        let results = record_results(&mut wheel);
        let now = Instant::now();

        assert!(wheel.spin(now).unwrap());
        let rotation = wheel.state().rotation;
        assert!(!wheel.spin(now + Duration::from_millis(5)).unwrap());
        assert_eq!(wheel.state().rotation, rotation);

        wheel.poll(now + Duration::from_millis(3000));
        wheel.poll(now + Duration::from_millis(6000));
        assert_eq!(results.borrow().len(), 1);
    }

    #[test]
    fn wheel_stops_on_the_winner() {
        let choices: Vec<String> = (0..7).map(|i| format!("choice {i}")).collect();
        let labels: Vec<&str> = choices.iter().map(String::as_str).collect();
        let mut wheel = wheel(&labels, fastrand::Rng::with_seed(77));
        let mut now = Instant::now();
        for _ in 0..20 {
            let before = wheel.state().rotation;
            wheel.spin(now).unwrap();
            let after = wheel.state().rotation;
            assert!(after - before >= 3.0 * 360.0);
            now += wheel.spin_duration();
            let WheelEvent::Finished { index, .. } = wheel.poll(now) else {
                panic!("spin didn't finish");
            };
            let landed = normalize_degrees(wheel.displayed_rotation(now));
            assert!((landed - desired_angle(index, choices.len())).abs() < 1e-6);
            assert_eq!(geometry::slice_at_pointer(landed, choices.len()), index);
        }
    }

    #[test]
    fn groups_alternate_across_spins() {
        let mut wheel = wheel(&["atiq", "Pizza", "azim", "Sushi"], fastrand::Rng::with_seed(5));
        let mut now = Instant::now();
        let mut groups = Vec::new();
        for _ in 0..6 {
            wheel.spin(now).unwrap();
            groups.push(wheel.state().last_group.expect("no group recorded"));
            now += Duration::from_secs(3);
            wheel.poll(now);
        }
        assert!(groups.windows(2).all(|pair| pair[0] != pair[1]), "{groups:?}");
        assert_eq!(wheel.selected(), Some(if groups[5] == SpecialGroup::A { "atiq" } else { "azim" }));
    }

    #[test]
    fn result_cleared_on_new_spin() {
        let mut wheel = wheel(&["Pizza", "Sushi"], ScriptedSource::default());
        let now = Instant::now();
        wheel.spin(now).unwrap();
        wheel.poll(now + Duration::from_secs(3));
        assert_eq!(wheel.selected(), Some("Pizza"));
        wheel.spin(now + Duration::from_secs(4)).unwrap();
        assert_eq!(wheel.selected(), None);
    }

    #[test]
    fn cancel_reports_nothing() {
        let rate = SharedRate::default();
        let choices = ChoiceList::new(["Pizza", "Sushi"]).unwrap();
        let mut wheel = Wheel::new(
            choices,
            WheelSettings::default(),
            ScriptedSource::default(),
            Unmeasurable,
            Box::new(rate.clone()),
        );
        let results = record_results(&mut wheel);
        let now = Instant::now();
        wheel.spin(now).unwrap();
        wheel.poll(now + Duration::from_millis(100));
        assert!(rate.get() > 1.0);
        wheel.cancel();
        assert_eq!(wheel.poll(now + Duration::from_secs(4)), WheelEvent::Idle);
        assert!(results.borrow().is_empty());
        assert_eq!(rate.get(), 1.0);
        assert!(wheel.spin(now + Duration::from_secs(5)).unwrap());
    }

    #[test]
    fn teardown_mid_spin_resets_sampler() {
        let rate = SharedRate::default();
        let choices = ChoiceList::new(["Pizza", "Sushi"]).unwrap();
        let mut wheel = Wheel::new(
            choices,
            WheelSettings::default(),
            ScriptedSource::default(),
            Unmeasurable,
            Box::new(rate.clone()),
        );
        let now = Instant::now();
        wheel.spin(now).unwrap();
        wheel.poll(now + Duration::from_millis(100));
        drop(wheel);
        assert_eq!(rate.get(), 1.0);
    }

    #[test]
    fn layout_follows_choices() {
        let mut wheel = wheel(&["OK", "Fine"], fastrand::Rng::with_seed(2));
        let slices: Vec<_> = wheel.slices().collect();
        assert_eq!(slices.len(), 2);
        assert_ne!(slices[0].fill, slices[1].fill);
        assert!(slices.iter().all(|slice| slice.font_size == 16));

        let labels: Vec<String> = (0..40).map(|i| format!("a rather long label {i}")).collect();
        assert!(wheel.set_choices(ChoiceList::new(labels).unwrap()));
        let slices: Vec<_> = wheel.slices().collect();
        assert_eq!(slices.len(), 40);
        assert_eq!(slices[3].label, "a rather long label 3");
        assert!(slices.iter().all(|slice| slice.font_size == 8));
        assert!(slices.iter().all(|slice| slice.text_color == slice.fill.label_color()));
        assert!((wheel.max_text_width() - LabelBand::default().max_text_width(40)).abs() < 1e-9);
    }

    #[test]
    fn choices_are_kept_while_spinning() {
        let mut wheel = wheel(&["a", "b", "c"], fastrand::Rng::with_seed(4));
        let results = record_results(&mut wheel);
        let now = Instant::now();
        wheel.spin(now).unwrap();
        wheel.poll(now + Duration::from_millis(500));

        assert!(!wheel.set_choices(ChoiceList::new(["x", "y"]).unwrap()));
        assert_eq!(wheel.choices().labels(), &["a", "b", "c"]);
        assert_eq!(wheel.slices().count(), 3);

        finish_spin(&mut wheel, now + Duration::from_secs(3), &results);
        assert!(wheel.set_choices(ChoiceList::new(["x", "y"]).unwrap()));
        assert_eq!(wheel.choices().labels(), &["x", "y"]);
        assert_eq!(wheel.selected(), None);
    }

    fn finish_spin<R: RandomSource, M: TextMeasurer>(
        wheel: &mut Wheel<R, M>,
        now: Instant,
        results: &Rc<RefCell<Vec<String>>>,
    ) {
        let WheelEvent::Finished { index, label } = wheel.poll(now) else {
            panic!("spin didn't finish");
        };
        // the result refers to the list on the wheel, and the pointer agrees
        assert_eq!(wheel.choices()[index], label);
        let landed = wheel.displayed_rotation(now);
        assert_eq!(geometry::slice_at_pointer(landed, wheel.choices().len()), index);
        assert_eq!(*results.borrow(), vec![label]);
    }

    #[test]
    fn headless_wheel_uses_baseline_font() {
        let choices = ChoiceList::new(["Pizza", "Sushi"]).unwrap();
        let settings = WheelSettings::default();
        let wheel = Wheel::new(choices, settings, ScriptedSource::default(), Unmeasurable, Box::new(NoopSampler));
        assert!(wheel.slices().all(|slice| slice.font_size == 14));
        assert_eq!(wheel.label_cells(), None);
    }

    #[test]
    fn label_cells_use_the_wheels_measurer() {
        let choices = ChoiceList::new(["Pizza", "Sushi"]).unwrap();
        let wide = Wheel::new(
            choices.clone(),
            WheelSettings::default(),
            ScriptedSource::default(),
            CellMeasurer::new(1.0),
            Box::new(NoopSampler),
        );
        let narrow = wheel(&["Pizza", "Sushi"], ScriptedSource::default());
        let font_size = wide.slices().next().expect("no slices").font_size as f64;
        let expected = wide.max_text_width() / font_size;
        assert!((wide.label_cells().expect("no cell budget") - expected).abs() < 1e-9);
        assert!(narrow.label_cells().expect("no cell budget") > expected);
    }

    #[test]
    fn invalid_choices_become_invalid_input() {
        let error = WheelError::from(ChoiceListError::TooFew(1));
        assert!(matches!(error, WheelError::InvalidInput(_)));
    }
}

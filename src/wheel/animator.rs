use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::trace;

/// How long a spin lasts unless configured otherwise.
pub(crate) const DEFAULT_SPIN_DURATION: Duration = Duration::from_millis(3000);

/// The value auxiliary effects rest at while the wheel isn't spinning.
pub(crate) const NEUTRAL_RATE: f64 = 1.0;

/// Cubic ease-out: fast start, slow end.
pub(crate) fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// The state of a spin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, strum::Display)]
pub(crate) enum Phase {
    #[default]
    Idle,
    Spinning,
}

/// Something that follows the auxiliary rate while the wheel spins.
///
/// The rate decays from the curve's maximum to its minimum over the spin, and is set back to
/// [`NEUTRAL_RATE`] once the spin ends or is cancelled.
pub(crate) trait DecaySampler {
    fn sample(&mut self, rate: f64);
}

/// A sampler that ignores every sample.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct NoopSampler;

impl DecaySampler for NoopSampler {
    fn sample(&mut self, _rate: f64) {}
}

/// A sampler that publishes the latest rate so it can be read elsewhere, e.g. by a renderer.
#[derive(Clone, Debug)]
pub(crate) struct SharedRate(Rc<Cell<f64>>);

impl SharedRate {
    pub(crate) fn get(&self) -> f64 {
        self.0.get()
    }
}

impl Default for SharedRate {
    fn default() -> Self {
        Self(Rc::new(Cell::new(NEUTRAL_RATE)))
    }
}

impl DecaySampler for SharedRate {
    fn sample(&mut self, rate: f64) {
        self.0.set(rate);
    }
}

/// The range the auxiliary rate decays through during a spin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RateCurve {
    /// The rate at the start of a spin.
    pub(crate) max_rate: f64,

    /// The rate at the end of a spin.
    pub(crate) min_rate: f64,
}

impl RateCurve {
    /// The rate at `progress` (in [0, 1]) through the spin.
    pub(crate) fn at(&self, progress: f64) -> f64 {
        self.max_rate - (self.max_rate - self.min_rate) * ease_out_cubic(progress)
    }
}

impl Default for RateCurve {
    fn default() -> Self {
        Self { max_rate: 1.5, min_rate: 0.4 }
    }
}

/// What a poll of the animator observed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum AnimatorPoll {
    /// No spin in progress.
    Idle,
    /// A spin is in progress.
    Spinning { progress: f64 },
    /// The spin that was in progress just finished.
    Completed,
}

#[derive(Debug)]
struct ActiveSpin {
    started: Instant,
    from: f64,
    to: f64,
    /// When the spin completes.
    deadline: Instant,
    /// Whether the per frame rate sampling is still subscribed.
    sampling: bool,
}

/// Drives a spin from start to stop.
///
/// The animator is purely poll driven: callers poll it once per frame with the current time.
/// Rate sampling happens on every poll until the curve is exhausted, and the spin completes on
/// the first poll at or after its deadline.
pub(crate) struct SpinAnimator {
    duration: Duration,
    curve: RateCurve,
    sampler: Box<dyn DecaySampler>,
    active: Option<ActiveSpin>,
}

impl SpinAnimator {
    pub(crate) fn new(duration: Duration, curve: RateCurve, sampler: Box<dyn DecaySampler>) -> Self {
        let duration = if duration.is_zero() { Duration::from_millis(1) } else { duration };
        Self { duration, curve, sampler, active: None }
    }

    pub(crate) fn phase(&self) -> Phase {
        match self.active {
            Some(_) => Phase::Spinning,
            None => Phase::Idle,
        }
    }

    pub(crate) fn duration(&self) -> Duration {
        self.duration
    }

    /// Start animating from rotation `from` to `to`.
    ///
    /// Returns `false` and does nothing if a spin is already in progress.
    pub(crate) fn start(&mut self, now: Instant, from: f64, to: f64) -> bool {
        if self.active.is_some() {
            return false;
        }
        self.active =
            Some(ActiveSpin { started: now, from, to, deadline: now + self.duration, sampling: true });
        self.sampler.sample(self.curve.at(0.0));
        true
    }

    /// Advance the animation to `now`.
    pub(crate) fn poll(&mut self, now: Instant) -> AnimatorPoll {
        let Some(spin) = self.active.as_mut() else {
            return AnimatorPoll::Idle;
        };
        let progress = Self::progress(spin.started, self.duration, now);
        if spin.sampling {
            let rate = self.curve.at(progress);
            trace!(progress, rate, "sampling rate");
            self.sampler.sample(rate);
            if progress >= 1.0 {
                spin.sampling = false;
            }
        }
        if now >= spin.deadline {
            self.stop();
            return AnimatorPoll::Completed;
        }
        AnimatorPoll::Spinning { progress }
    }

    /// The rotation the wheel should be displayed at, at `now`.
    ///
    /// Returns `None` if there's no spin in progress.
    pub(crate) fn rotation_at(&self, now: Instant) -> Option<f64> {
        let spin = self.active.as_ref()?;
        let eased = ease_out_cubic(Self::progress(spin.started, self.duration, now));
        Some(spin.from + (spin.to - spin.from) * eased)
    }

    /// Abandon the spin in progress, if any, without completing it.
    pub(crate) fn cancel(&mut self) -> bool {
        if self.active.is_none() {
            return false;
        }
        self.stop();
        true
    }

    fn stop(&mut self) {
        // drops both the completion deadline and the frame sampling
        self.active = None;
        self.sampler.sample(NEUTRAL_RATE);
    }

    fn progress(started: Instant, duration: Duration, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(started);
        (elapsed.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0)
    }
}

impl Drop for SpinAnimator {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cell::RefCell;

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<f64>>>);

    impl DecaySampler for Recorder {
        fn sample(&mut self, rate: f64) {
            self.0.borrow_mut().push(rate);
        }
    }

    fn animator(sampler: impl DecaySampler + 'static) -> SpinAnimator {
        SpinAnimator::new(DEFAULT_SPIN_DURATION, RateCurve::default(), Box::new(sampler))
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(0.5, 0.875)]
    #[case(1.0, 1.0)]
    #[case(-1.0, 0.0)]
    #[case(2.0, 1.0)]
    fn easing(#[case] t: f64, #[case] expected: f64) {
        assert!((ease_out_cubic(t) - expected).abs() < 1e-12);
    }

    #[rstest]
    #[case(0.0, 1.5)]
    #[case(1.0, 0.4)]
    fn rate_curve_ends(#[case] progress: f64, #[case] expected: f64) {
        assert!((RateCurve::default().at(progress) - expected).abs() < 1e-12);
    }

    #[test]
    fn rate_decays_monotonically() {
        let curve = RateCurve::default();
        let rates: Vec<f64> = (0..=30).map(|i| curve.at(i as f64 / 30.0)).collect();
        assert!(rates.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn completes_after_duration() {
        let now = Instant::now();
        let mut animator = animator(NoopSampler);
        assert!(animator.start(now, 0.0, 1500.0));
        assert_eq!(animator.phase(), Phase::Spinning);
        assert!(matches!(animator.poll(now + Duration::from_millis(2999)), AnimatorPoll::Spinning { .. }));
        assert_eq!(animator.poll(now + Duration::from_millis(3000)), AnimatorPoll::Completed);
        assert_eq!(animator.phase(), Phase::Idle);
        assert_eq!(animator.poll(now + Duration::from_millis(3100)), AnimatorPoll::Idle);
    }

    #[test]
    fn rejects_start_while_spinning() {
        let now = Instant::now();
        let mut animator = animator(NoopSampler);
        assert!(animator.start(now, 0.0, 100.0));
        assert!(!animator.start(now + Duration::from_millis(10), 100.0, 900.0));
        assert_eq!(animator.rotation_at(now + Duration::from_secs(3)), Some(100.0));
    }

    #[test]
    fn rotation_follows_easing() {
        let now = Instant::now();
        let mut animator = animator(NoopSampler);
        animator.start(now, 100.0, 1100.0);
        let halfway = animator.rotation_at(now + Duration::from_millis(1500)).unwrap();
        assert!((halfway - 975.0).abs() < 1e-6);
        assert_eq!(animator.rotation_at(now), Some(100.0));
    }

    #[test]
    fn samples_rate_then_resets() {
        let recorder = Recorder::default();
        let now = Instant::now();
        let mut animator = animator(recorder.clone());
        animator.start(now, 0.0, 720.0);
        animator.poll(now + Duration::from_millis(1000));
        animator.poll(now + Duration::from_millis(3000));
        let samples = recorder.0.borrow().clone();
        assert_eq!(samples.first(), Some(&1.5));
        assert!(samples[1] < 1.5 && samples[1] > 0.4);
        assert!((samples[samples.len() - 2] - 0.4).abs() < 1e-12);
        assert_eq!(samples.last(), Some(&NEUTRAL_RATE));
    }

    #[test]
    fn cancel_stops_everything() {
        let rate = SharedRate::default();
        let now = Instant::now();
        let mut animator = animator(rate.clone());
        animator.start(now, 0.0, 720.0);
        animator.poll(now + Duration::from_millis(500));
        assert!(rate.get() > 1.0);
        assert!(animator.cancel());
        assert_eq!(rate.get(), NEUTRAL_RATE);
        assert_eq!(animator.poll(now + Duration::from_secs(5)), AnimatorPoll::Idle);
        assert!(!animator.cancel());
    }

    #[test]
    fn drop_resets_sampler() {
        let rate = SharedRate::default();
        let now = Instant::now();
        let mut animator = animator(rate.clone());
        animator.start(now, 0.0, 720.0);
        animator.poll(now + Duration::from_millis(100));
        drop(animator);
        assert_eq!(rate.get(), NEUTRAL_RATE);
    }
}

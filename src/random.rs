#[cfg(test)]
use std::collections::VecDeque;

/// A source of randomness for the wheel.
///
/// Every random decision the wheel makes goes through this trait so that callers can swap the
/// generator, e.g. to replay a sequence of spins in tests.
pub(crate) trait RandomSource {
    /// Returns a uniformly distributed index in `[0, bound)`.
    ///
    /// `bound` is always greater than zero.
    fn index(&mut self, bound: usize) -> usize;

    /// Returns a fair coin flip.
    fn coin(&mut self) -> bool {
        self.index(2) == 0
    }

    /// Picks one element out of a non empty slice.
    fn pick<T: Copy>(&mut self, items: &[T]) -> Option<T>
    where
        Self: Sized,
    {
        if items.is_empty() {
            return None;
        }
        Some(items[self.index(items.len())])
    }
}

impl RandomSource for fastrand::Rng {
    fn index(&mut self, bound: usize) -> usize {
        self.usize(0..bound)
    }

    fn coin(&mut self) -> bool {
        self.bool()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn index(&mut self, bound: usize) -> usize {
        (**self).index(bound)
    }

    fn coin(&mut self) -> bool {
        (**self).coin()
    }
}

/// Builds the default generator, seeded when a seed is given.
pub(crate) fn default_source(seed: Option<u64>) -> fastrand::Rng {
    match seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    }
}

/// A random source that replays a fixed script of values.
///
/// Each call consumes the next scripted value modulo the requested bound. Once the script runs
/// out it keeps returning zero.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub(crate) struct ScriptedSource {
    values: VecDeque<usize>,
}

#[cfg(test)]
impl ScriptedSource {
    pub(crate) fn new<I: IntoIterator<Item = usize>>(values: I) -> Self {
        Self { values: values.into_iter().collect() }
    }
}

#[cfg(test)]
impl RandomSource for ScriptedSource {
    fn index(&mut self, bound: usize) -> usize {
        self.values.pop_front().unwrap_or(0) % bound
    }
}

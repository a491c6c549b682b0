use super::WheelError;
use crate::choices::MIN_CHOICES;
use crate::random::RandomSource;
use itertools::Itertools;
use serde::Deserialize;
use tracing::debug;

/// One of the two special label groups that alternate across spins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SpecialGroup {
    A,
    B,
}

impl SpecialGroup {
    fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

/// The marker substrings that put a label into a special group.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Markers {
    /// Labels containing this token (case insensitive) belong to group A.
    pub(crate) group_a: String,

    /// Labels containing this token (case insensitive) belong to group B.
    pub(crate) group_b: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self { group_a: "atiq".into(), group_b: "azim".into() }
    }
}

/// The outcome of a target selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Selection {
    /// The winning slice.
    pub(crate) index: usize,
    /// The group to remember for the next spin.
    pub(crate) group: Option<SpecialGroup>,
}

/// Picks the winning slice for a spin.
#[derive(Clone, Debug)]
pub(crate) struct TargetSelector {
    group_a: String,
    group_b: String,
}

impl TargetSelector {
    pub(crate) fn new(markers: &Markers) -> Self {
        Self { group_a: markers.group_a.to_lowercase(), group_b: markers.group_b.to_lowercase() }
    }

    /// Select the winning index given the previous spin's group.
    ///
    /// Labels carrying a group marker take precedence over everything else. When both groups are
    /// present, spins alternate between them, starting from a random one. There's nothing to spin
    /// for with fewer than two choices, so that's rejected as invalid input.
    pub(crate) fn select<S, R>(
        &self,
        choices: &[S],
        last_group: Option<SpecialGroup>,
        rng: &mut R,
    ) -> Result<Selection, WheelError>
    where
        S: AsRef<str>,
        R: RandomSource,
    {
        if choices.len() < MIN_CHOICES {
            return Err(WheelError::InvalidInput(format!(
                "need at least {MIN_CHOICES} choices to select from, got {}",
                choices.len()
            )));
        }
        let lowered: Vec<String> = choices.iter().map(|c| c.as_ref().to_lowercase()).collect();
        let group_a = Self::members(&lowered, &self.group_a);
        let group_b = Self::members(&lowered, &self.group_b);

        let group = match (group_a.is_empty(), group_b.is_empty()) {
            (false, false) => Some(match last_group {
                Some(last) => last.other(),
                None if rng.coin() => SpecialGroup::A,
                None => SpecialGroup::B,
            }),
            (false, true) => Some(SpecialGroup::A),
            (true, false) => Some(SpecialGroup::B),
            (true, true) => None,
        };
        let index = match group {
            Some(SpecialGroup::A) => rng.pick(&group_a),
            Some(SpecialGroup::B) => rng.pick(&group_b),
            None => Some(rng.index(choices.len())),
        };
        // every pool above is non empty
        let index = index.ok_or_else(|| WheelError::InvalidInput("empty selection pool".into()))?;
        debug!(index, ?group, ?last_group, a = group_a.len(), b = group_b.len(), "selected target");
        Ok(Selection { index, group })
    }

    fn members(lowered: &[String], marker: &str) -> Vec<usize> {
        if marker.is_empty() {
            return Vec::new();
        }
        lowered.iter().positions(|label| label.contains(marker)).collect()
    }
}

impl Default for TargetSelector {
    fn default() -> Self {
        Self::new(&Markers::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedSource;
    use rstest::rstest;

    #[rstest]
    #[case::empty(&[])]
    #[case::single(&["Pizza"])]
    #[case::single_special(&["atiq"])]
    fn too_few_choices_are_invalid(#[case] choices: &[&str]) {
        let result = TargetSelector::default().select(choices, None, &mut ScriptedSource::default());
        assert!(matches!(result, Err(WheelError::InvalidInput(_))), "{result:?}");
    }

    #[test]
    fn single_group_always_wins() {
        let choices = ["Pizza", "Dinner with ATIQ", "Sushi", "Tacos"];
        let selector = TargetSelector::default();
        let mut rng = fastrand::Rng::with_seed(3);
        let mut last = None;
        for _ in 0..200 {
            let selection = selector.select(&choices, last, &mut rng).expect("selection failed");
            assert_eq!(selection.index, 1);
            assert_eq!(selection.group, Some(SpecialGroup::A));
            last = selection.group;
        }
    }

    #[test]
    fn only_group_b_present() {
        let choices = ["azim's pick", "Sushi"];
        let selection =
            TargetSelector::default().select(&choices, Some(SpecialGroup::B), &mut ScriptedSource::default()).unwrap();
        assert_eq!(selection, Selection { index: 0, group: Some(SpecialGroup::B) });
    }

    #[rstest]
    #[case::starts_with_a(0, SpecialGroup::A)]
    #[case::starts_with_b(1, SpecialGroup::B)]
    fn groups_alternate(#[case] first_draw: usize, #[case] first_group: SpecialGroup) {
        let choices = ["Pizza", "atiq", "Sushi", "azim"];
        let selector = TargetSelector::default();
        let mut rng = ScriptedSource::new([first_draw]);
        let mut last = None;
        let mut expected = first_group;
        for _ in 0..10 {
            let selection = selector.select(&choices, last, &mut rng).unwrap();
            assert_eq!(selection.group, Some(expected));
            let expected_index = match expected {
                SpecialGroup::A => 1,
                SpecialGroup::B => 3,
            };
            assert_eq!(selection.index, expected_index);
            last = selection.group;
            expected = expected.other();
        }
    }

    #[test]
    fn labels_can_belong_to_both_groups() {
        let choices = ["atiq and azim", "Sushi"];
        let selector = TargetSelector::default();
        let mut rng = fastrand::Rng::with_seed(11);
        let mut last = None;
        for _ in 0..20 {
            let selection = selector.select(&choices, last, &mut rng).unwrap();
            assert_eq!(selection.index, 0);
            last = selection.group;
        }
    }

    #[test]
    fn no_groups_clears_history() {
        let choices = ["Pizza", "Sushi", "Tacos"];
        let selection =
            TargetSelector::default().select(&choices, Some(SpecialGroup::A), &mut ScriptedSource::new([2])).unwrap();
        assert_eq!(selection, Selection { index: 2, group: None });
    }

    #[test]
    fn uniform_selection_covers_every_slice() {
        let choices = ["a", "b", "c", "d", "e"];
        let selector = TargetSelector::default();
        let mut rng = fastrand::Rng::with_seed(99);
        let mut seen = [0usize; 5];
        for _ in 0..1000 {
            seen[selector.select(&choices, None, &mut rng).unwrap().index] += 1;
        }
        assert!(seen.iter().all(|count| *count > 100), "{seen:?}");
    }

    #[test]
    fn custom_markers() {
        let markers = Markers { group_a: "Red".into(), group_b: "BLUE".into() };
        let choices = ["green", "dark red", "light blue"];
        let selector = TargetSelector::new(&markers);
        let first = selector.select(&choices, Some(SpecialGroup::B), &mut ScriptedSource::default()).unwrap();
        assert_eq!(first, Selection { index: 1, group: Some(SpecialGroup::A) });
        let second = selector.select(&choices, first.group, &mut ScriptedSource::default()).unwrap();
        assert_eq!(second, Selection { index: 2, group: Some(SpecialGroup::B) });
    }
}

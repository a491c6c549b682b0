use std::ops::Deref;

/// The fewest choices a wheel can have.
pub(crate) const MIN_CHOICES: usize = 2;

/// The most choices a wheel can have.
pub(crate) const MAX_CHOICES: usize = 100;

/// The ordered list of labels a wheel is made of.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ChoiceList(Vec<String>);

impl ChoiceList {
    /// Build a choice list, validating its labels.
    ///
    /// Labels are kept exactly as given, but they can't be blank.
    pub(crate) fn new<I, S>(labels: I) -> Result<Self, ChoiceListError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if let Some(index) = labels.iter().position(|label| label.trim().is_empty()) {
            return Err(ChoiceListError::BlankLabel(index));
        }
        match labels.len() {
            count if count < MIN_CHOICES => Err(ChoiceListError::TooFew(count)),
            count if count > MAX_CHOICES => Err(ChoiceListError::TooMany(count)),
            _ => Ok(Self(labels)),
        }
    }

    /// Parse a list of labels, one per line.
    ///
    /// Lines are trimmed, blank ones are skipped and anything past the maximum number of choices
    /// is dropped.
    pub(crate) fn parse(text: &str) -> Result<Self, ChoiceListError> {
        Self::new(text.lines().map(str::trim).filter(|line| !line.is_empty()).take(MAX_CHOICES))
    }

    pub(crate) fn labels(&self) -> &[String] {
        &self.0
    }
}

impl Deref for ChoiceList {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Default for ChoiceList {
    fn default() -> Self {
        let labels = ["Read a book", "Go for a walk", "Cook something new", "Call a friend", "Learn a song", "Nap"];
        Self(labels.into_iter().map(String::from).collect())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub(crate) enum ChoiceListError {
    #[error("need at least {min} choices, got {0}", min = MIN_CHOICES)]
    TooFew(usize),

    #[error("at most {max} choices are supported, got {0}", max = MAX_CHOICES)]
    TooMany(usize),

    #[error("choice #{} is blank", .0 + 1)]
    BlankLabel(usize),
}

use crate::choices::{ChoiceList, ChoiceListError};
use crate::wheel::animator::RateCurve;
use crate::wheel::colors::{Color, Palette};
use crate::wheel::geometry::LabelBand;
use crate::wheel::selector::Markers;
use crate::wheel::text_fit::FontSizing;
use crate::wheel::WheelSettings;
use serde::Deserialize;
use std::{fs, io, path::Path, time::Duration};

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    /// How spins behave.
    #[serde(default)]
    pub(crate) spin: SpinConfig,

    /// The colors slices are painted with.
    #[serde(default = "default_palette")]
    pub(crate) palette: Vec<Color>,

    /// The tokens that define the special label groups.
    #[serde(default)]
    pub(crate) markers: Markers,

    /// How labels are fitted into slices.
    #[serde(default)]
    pub(crate) text: TextConfig,

    /// The choices to use when none are given on the command line.
    #[serde(default)]
    pub(crate) choices: Vec<String>,
}

impl Config {
    /// Load the configuration from a YAML file.
    pub(crate) fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        let config = Self::parse(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn parse(contents: &str) -> Result<Self, ConfigLoadError> {
        // an empty file deserializes to a unit value rather than an empty mapping
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Check the values that deserialization alone can't.
    pub(crate) fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.palette.len() < 2 {
            return Err(ConfigLoadError::InvalidPalette(self.palette.len()));
        }
        let SpinConfig { duration_ms, min_turns, max_turns, max_rate, min_rate } = self.spin;
        if duration_ms == 0 {
            return Err(ConfigLoadError::InvalidValue("spin.duration_ms must be positive".into()));
        }
        if min_turns > max_turns {
            return Err(ConfigLoadError::InvalidValue(format!(
                "spin.min_turns ({min_turns}) is larger than spin.max_turns ({max_turns})"
            )));
        }
        // the rate decays over a spin, so it can't end higher than it starts
        if !(min_rate.is_finite() && max_rate.is_finite() && 0.0 <= min_rate && min_rate <= max_rate) {
            return Err(ConfigLoadError::InvalidValue(format!(
                "spin rates must satisfy 0 <= min_rate <= max_rate, got {min_rate} and {max_rate}"
            )));
        }
        let LabelBand { radius, padding } = self.text.band();
        for (name, value) in [("text.radius", radius), ("text.padding", padding)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigLoadError::InvalidValue(format!("{name} must be a non-negative number, got {value}")));
            }
        }
        let FontSizing { baseline, min_size, max_size } = self.text.sizing();
        if min_size == 0 || min_size > max_size {
            return Err(ConfigLoadError::InvalidValue(format!(
                "text sizes must satisfy 0 < min_size <= max_size, got {min_size} and {max_size}"
            )));
        }
        if baseline == 0 {
            return Err(ConfigLoadError::InvalidValue("text.baseline must be positive".into()));
        }
        Ok(())
    }

    /// The configured default choices, if there are any.
    pub(crate) fn choices(&self) -> Result<Option<ChoiceList>, ChoiceListError> {
        if self.choices.is_empty() {
            return Ok(None);
        }
        ChoiceList::new(self.choices.iter().cloned()).map(Some)
    }

    /// The settings a wheel built from this configuration uses.
    pub(crate) fn wheel_settings(&self) -> WheelSettings {
        WheelSettings {
            spin_duration: Duration::from_millis(self.spin.duration_ms),
            turns: self.spin.min_turns..=self.spin.max_turns,
            rate: self.spin.rate(),
            palette: Palette::new(self.palette.clone()),
            markers: self.markers.clone(),
            band: self.text.band(),
            sizing: self.text.sizing(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spin: SpinConfig::default(),
            palette: default_palette(),
            markers: Markers::default(),
            text: TextConfig::default(),
            choices: Vec::new(),
        }
    }
}

fn default_palette() -> Vec<Color> {
    Palette::default().colors().to_vec()
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SpinConfig {
    /// How long a spin lasts, in milliseconds.
    #[serde(default = "default_duration_ms")]
    pub(crate) duration_ms: u64,

    /// The fewest full turns a spin makes.
    #[serde(default = "default_min_turns")]
    pub(crate) min_turns: u32,

    /// The most full turns a spin makes.
    #[serde(default = "default_max_turns")]
    pub(crate) max_turns: u32,

    /// The auxiliary rate at the start of a spin.
    #[serde(default = "default_max_rate")]
    pub(crate) max_rate: f64,

    /// The auxiliary rate at the end of a spin.
    #[serde(default = "default_min_rate")]
    pub(crate) min_rate: f64,
}

impl SpinConfig {
    fn rate(&self) -> RateCurve {
        RateCurve { max_rate: self.max_rate, min_rate: self.min_rate }
    }
}

impl Default for SpinConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_duration_ms(),
            min_turns: default_min_turns(),
            max_turns: default_max_turns(),
            max_rate: default_max_rate(),
            min_rate: default_min_rate(),
        }
    }
}

fn default_duration_ms() -> u64 {
    3000
}

fn default_min_turns() -> u32 {
    3
}

fn default_max_turns() -> u32 {
    6
}

fn default_max_rate() -> f64 {
    RateCurve::default().max_rate
}

fn default_min_rate() -> f64 {
    RateCurve::default().min_rate
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TextConfig {
    /// The distance from the center at which labels are drawn.
    pub(crate) radius: Option<f64>,

    /// The space kept free around labels.
    pub(crate) padding: Option<f64>,

    /// The font size labels are measured at.
    pub(crate) baseline: Option<u32>,

    /// The smallest font size.
    pub(crate) min_size: Option<u32>,

    /// The largest font size.
    pub(crate) max_size: Option<u32>,
}

impl TextConfig {
    fn band(&self) -> LabelBand {
        let defaults = LabelBand::default();
        LabelBand { radius: self.radius.unwrap_or(defaults.radius), padding: self.padding.unwrap_or(defaults.padding) }
    }

    fn sizing(&self) -> FontSizing {
        let defaults = FontSizing::default();
        FontSizing {
            baseline: self.baseline.unwrap_or(defaults.baseline),
            min_size: self.min_size.unwrap_or(defaults.min_size),
            max_size: self.max_size.unwrap_or(defaults.max_size),
        }
    }
}

/// An error when loading configuration files.
#[derive(thiserror::Error, Debug)]
pub(crate) enum ConfigLoadError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] serde_yaml::Error),

    #[error("palette needs at least 2 colors, got {0}")]
    InvalidPalette(usize),

    #[error("invalid configuration: {0}")]
    InvalidValue(String),
}

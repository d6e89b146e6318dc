//! Maps a provider's condition text to a presentation bucket and backdrop.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentationBucket {
    ClearDay,
    ClearNight,
    CloudyDay,
    CloudyNight,
    Rain,
    Snow,
    Default,
}

impl PresentationBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresentationBucket::ClearDay => "clear-day",
            PresentationBucket::ClearNight => "clear-night",
            PresentationBucket::CloudyDay => "cloudy-day",
            PresentationBucket::CloudyNight => "cloudy-night",
            PresentationBucket::Rain => "rain",
            PresentationBucket::Snow => "snow",
            PresentationBucket::Default => "default",
        }
    }

    /// Gradient stops for this bucket under `theme`.
    pub fn backdrop(&self, theme: Theme) -> Backdrop {
        if theme == Theme::Dark {
            return DARK_SURFACE;
        }

        match self {
            PresentationBucket::ClearDay => Backdrop::new("yellow-300", "orange-500"),
            PresentationBucket::ClearNight => Backdrop::new("indigo-800", "purple-900"),
            PresentationBucket::CloudyDay => Backdrop::new("gray-300", "gray-500"),
            PresentationBucket::CloudyNight => Backdrop::new("gray-700", "gray-900"),
            PresentationBucket::Snow => Backdrop::new("blue-100", "blue-300"),
            // Rain shares the default backdrop.
            PresentationBucket::Rain | PresentationBucket::Default => DEFAULT_BACKDROP,
        }
    }
}

impl fmt::Display for PresentationBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// A two-stop background gradient, named by palette colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backdrop {
    pub from: &'static str,
    pub to: &'static str,
}

impl Backdrop {
    const fn new(from: &'static str, to: &'static str) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for Backdrop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.from == self.to {
            f.write_str(self.from)
        } else {
            write!(f, "{} -> {}", self.from, self.to)
        }
    }
}

pub const DEFAULT_BACKDROP: Backdrop = Backdrop::new("blue-400", "blue-800");
const DARK_SURFACE: Backdrop = Backdrop::new("gray-900", "gray-900");

/// How a rule picks its bucket once its keywords match.
#[derive(Debug, Clone, Copy)]
enum Outcome {
    Fixed(PresentationBucket),
    DayNight {
        day: PresentationBucket,
        night: PresentationBucket,
    },
}

#[derive(Debug)]
struct Rule {
    keywords: &'static [&'static str],
    outcome: Outcome,
}

/// Evaluated top to bottom; the first rule with a matching keyword wins.
const RULES: &[Rule] = &[
    Rule {
        keywords: &["clear", "sunny"],
        outcome: Outcome::DayNight {
            day: PresentationBucket::ClearDay,
            night: PresentationBucket::ClearNight,
        },
    },
    Rule {
        keywords: &["cloud"],
        outcome: Outcome::DayNight {
            day: PresentationBucket::CloudyDay,
            night: PresentationBucket::CloudyNight,
        },
    },
    Rule {
        keywords: &["rain", "drizzle"],
        outcome: Outcome::Fixed(PresentationBucket::Rain),
    },
    Rule {
        keywords: &["snow"],
        outcome: Outcome::Fixed(PresentationBucket::Snow),
    },
];

/// Classify a condition description such as "Patchy rain possible".
///
/// Matching is a case-insensitive substring test. Anything no rule recognises falls
/// through to [`PresentationBucket::Default`].
pub fn classify(condition_text: &str, is_day: bool) -> PresentationBucket {
    let text = condition_text.to_lowercase();

    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| text.contains(*kw)))
        .map(|rule| match rule.outcome {
            Outcome::Fixed(bucket) => bucket,
            Outcome::DayNight { day, night } => {
                if is_day {
                    day
                } else {
                    night
                }
            }
        })
        .unwrap_or(PresentationBucket::Default)
}

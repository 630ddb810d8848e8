//! Canonical emotion categories and provider label normalization.
//!
//! Classification backends speak their own vocabulary (`joy`, `sadness`,
//! `fear`, ...). Everything downstream of the classifier only ever sees
//! the five [`Emotion`] variants defined here.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The dominant emotional tone of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Emotion {
    /// Joy, love.
    Happy,
    /// Sadness.
    Sad,
    /// Anger.
    Angry,
    /// Surprise. Fear is folded in here as well.
    Surprised,
    /// Neutral, and anything the provider reports that we do not recognise.
    Neutral,
}

impl Emotion {
    /// Map a provider-specific label onto the canonical enum.
    ///
    /// Matching is case-insensitive. Unknown labels map to
    /// [`Emotion::Neutral`].
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "joy" | "love" | "happy" => Self::Happy,
            "sadness" | "sad" => Self::Sad,
            "anger" | "angry" => Self::Angry,
            "surprise" | "surprised" | "fear" => Self::Surprised,
            _ => Self::Neutral,
        }
    }

    /// The lowercase wire name of this emotion.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Surprised => "surprised",
            Self::Neutral => "neutral",
        }
    }
}

impl core::fmt::Display for Emotion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one piece of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// The normalized dominant emotion.
    pub emotion: Emotion,
    /// Provider confidence for that emotion, expected in `[0, 1]`.
    pub confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_labels_normalize() {
        assert_eq!(Emotion::from_label("joy"), Emotion::Happy);
        assert_eq!(Emotion::from_label("love"), Emotion::Happy);
        assert_eq!(Emotion::from_label("sadness"), Emotion::Sad);
        assert_eq!(Emotion::from_label("anger"), Emotion::Angry);
        assert_eq!(Emotion::from_label("fear"), Emotion::Surprised);
        assert_eq!(Emotion::from_label("surprise"), Emotion::Surprised);
        assert_eq!(Emotion::from_label("neutral"), Emotion::Neutral);
    }

    #[test]
    fn unknown_label_is_neutral() {
        assert_eq!(Emotion::from_label("ennui"), Emotion::Neutral);
        assert_eq!(Emotion::from_label(""), Emotion::Neutral);
    }

    #[test]
    fn label_matching_ignores_case_and_padding() {
        assert_eq!(Emotion::from_label(" JOY "), Emotion::Happy);
        assert_eq!(Emotion::from_label("Anger"), Emotion::Angry);
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&Emotion::Surprised).unwrap_or_default();
        assert_eq!(json, "\"surprised\"");
        assert_eq!(Emotion::Surprised.to_string(), "surprised");
    }
}

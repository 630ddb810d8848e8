//! The tagged wrapper for every message on the broadcast path.
//!
//! Each server-to-client frame is a JSON object
//! `{ "type": "emotion" | "error" | "info", "data": <payload> }`. The
//! payload type is fixed by the discriminator, so the enum below is the
//! whole protocol.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::event::EnrichedEvent;

/// A message delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Envelope {
    /// A classified, geolocated record.
    Emotion(EnrichedEvent),
    /// A problem the dashboard should surface.
    Error(ErrorInfo),
    /// Informational notice (connection greeting, pipeline state).
    Info(InfoMessage),
}

impl Envelope {
    /// Wrap an informational message.
    pub fn info(message: impl Into<String>) -> Self {
        Self::Info(InfoMessage {
            message: message.into(),
        })
    }

    /// Wrap an error message.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorInfo {
            message: message.into(),
        })
    }

    /// The wire discriminator of this envelope.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Emotion(_) => "emotion",
            Self::Error(_) => "error",
            Self::Info(_) => "info",
        }
    }
}

impl From<EnrichedEvent> for Envelope {
    fn from(event: EnrichedEvent) -> Self {
        Self::Emotion(event)
    }
}

/// Payload of an `error` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ErrorInfo {
    /// Human-readable description.
    pub message: String,
}

/// Payload of an `info` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct InfoMessage {
    /// Human-readable description.
    pub message: String,
}

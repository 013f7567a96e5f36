//! # Observation Module
//!
//! Room text observed during live play, as handed over by the text-parsing
//! collaborator.
//!
//! - Validate observations before they can create or mutate rooms
//! - Normalize surrounding whitespace
//! - No interpretation of the text itself

use crate::primitives::MAX_OBSERVED_TEXT_LENGTH;
use crate::{NavError, Uid};

/// What the player currently sees.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObservedRoom {
    /// Room title as displayed (`[Town Square, Market]`).
    pub title: String,
    /// Room description.
    pub description: String,
    /// Exit line (`Obvious paths: north, east.`).
    pub paths: String,
    /// Uid reported by the game, if any.
    pub uid: Option<Uid>,
    /// Location name reported by the game, if any.
    pub location: Option<String>,
}

impl ObservedRoom {
    /// Create an observation from the three room texts.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        paths: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            paths: paths.into(),
            uid: None,
            location: None,
        }
    }

    /// Attach the uid reported by the game.
    #[must_use]
    pub fn with_uid(mut self, uid: Uid) -> Self {
        self.uid = Some(uid);
        self
    }

    /// Attach the location name reported by the game.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Validate and normalize the observation.
    ///
    /// An observation is valid if:
    /// - The title is non-empty after trimming
    /// - No text exceeds `MAX_OBSERVED_TEXT_LENGTH`
    ///
    /// Returns a copy with all texts trimmed.
    pub fn validate(&self) -> Result<Self, NavError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(NavError::InvalidObservation("empty title".to_string()));
        }

        for (field, text) in [
            ("title", &self.title),
            ("description", &self.description),
            ("paths", &self.paths),
        ] {
            if text.len() > MAX_OBSERVED_TEXT_LENGTH {
                return Err(NavError::InvalidObservation(format!(
                    "{} exceeds {} bytes",
                    field, MAX_OBSERVED_TEXT_LENGTH
                )));
            }
        }

        Ok(Self {
            title: title.to_string(),
            description: self.description.trim().to_string(),
            paths: self.paths.trim().to_string(),
            uid: self.uid,
            location: self
                .location
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

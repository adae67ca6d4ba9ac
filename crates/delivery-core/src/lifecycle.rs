//! Delivery lifecycle tracking.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::DeliveryError;

/// Phases of one response exchange.
///
/// ```text
/// Start -> HeadersSet -> ShortCircuited ------------------------> Done
///                     -> ContentTypeResolved -> HeadOnly | BodySent | Streamed -> Done
/// Start -> Skipped (exchange already finished)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPhase {
    /// Exchange received, nothing written.
    Start,
    /// Identity and caching headers written.
    HeadersSet,
    /// Answered with 304 Not Modified.
    ShortCircuited,
    /// Content-Type decided.
    ContentTypeResolved,
    /// Ended without a body for a metadata-only request.
    HeadOnly,
    /// Ended with the buffered payload.
    BodySent,
    /// Ended after the producer streamed the body.
    Streamed,
    /// Exchange was already finished by an earlier stage.
    Skipped,
    /// Terminal.
    Done,
}

impl DeliveryPhase {
    /// Check whether `next` may follow this phase.
    pub fn can_advance_to(&self, next: DeliveryPhase) -> bool {
        use DeliveryPhase::*;
        matches!(
            (self, next),
            (Start, HeadersSet)
                | (Start, Skipped)
                | (HeadersSet, ShortCircuited)
                | (HeadersSet, ContentTypeResolved)
                | (ContentTypeResolved, HeadOnly)
                | (ContentTypeResolved, BodySent)
                | (ContentTypeResolved, Streamed)
                | (ShortCircuited, Done)
                | (HeadOnly, Done)
                | (BodySent, Done)
                | (Streamed, Done)
                | (Skipped, Done)
        )
    }

    /// Check whether this phase ends the exchange.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// State machine for a single exchange.
#[derive(Debug, Clone)]
pub struct DeliveryLifecycle {
    current: DeliveryPhase,
    /// Last phase before `Done`.
    outcome: DeliveryPhase,
}

impl DeliveryLifecycle {
    /// Create a lifecycle in `Start`.
    pub fn new() -> Self {
        Self {
            current: DeliveryPhase::Start,
            outcome: DeliveryPhase::Start,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> DeliveryPhase {
        self.current
    }

    /// Last non-terminal phase reached; the delivery branch once `Done`.
    pub fn outcome(&self) -> DeliveryPhase {
        self.outcome
    }

    /// Move to `next`, rejecting transitions the diagram does not allow.
    pub fn advance(&mut self, next: DeliveryPhase) -> Result<(), DeliveryError> {
        if !self.current.can_advance_to(next) {
            return Err(DeliveryError::InvalidTransition {
                from: self.current,
                to: next,
            });
        }
        if next != DeliveryPhase::Done {
            self.outcome = next;
        }
        self.current = next;
        Ok(())
    }

    /// Advance to `next` and then immediately to `Done`.
    pub fn finish(&mut self, next: DeliveryPhase) -> Result<(), DeliveryError> {
        self.advance(next)?;
        self.advance(DeliveryPhase::Done)
    }
}

impl Default for DeliveryLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Timing context for observability.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
    marks: HashMap<String, Instant>,
}

impl TimingContext {
    /// Create a new timing context.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            marks: HashMap::new(),
        }
    }

    /// Record a timing mark.
    pub fn mark(&mut self, name: &str) {
        self.marks.insert(name.to_string(), Instant::now());
    }

    /// Recorded marks with their offset from start.
    pub fn marks(&self) -> impl Iterator<Item = (&str, Duration)> + '_ {
        self.marks
            .iter()
            .map(|(name, at)| (name.as_str(), at.duration_since(self.start)))
    }

    /// Get elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

//! Trigger specifications for deferred activation.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The condition class that fires a deferred controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// First primary gesture on the containing region.
    Interaction,
    /// First transition of the containing region into the viewport.
    Viewport,
    /// Fixed delay after configuration.
    Timer,
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interaction => write!(f, "interaction"),
            Self::Viewport => write!(f, "viewport"),
            Self::Timer => write!(f, "timer"),
        }
    }
}

impl std::str::FromStr for TriggerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interaction" => Ok(Self::Interaction),
            "viewport" => Ok(Self::Viewport),
            "timer" => Ok(Self::Timer),
            other => Err(ConfigError::UnknownTrigger(other.to_string())),
        }
    }
}

/// Serialized trigger configuration, as written in page configs.
///
/// `timer_delay_ms` is required when `kind = "timer"` and ignored otherwise.
/// Use [`TriggerSpec::validate`] (or `Trigger::try_from`) to obtain a
/// [`Trigger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerSpec {
    /// Trigger kind.
    pub kind: TriggerKind,
    /// Delay for timer triggers, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_delay_ms: Option<i64>,
}

impl TriggerSpec {
    /// Interaction trigger spec.
    pub fn interaction() -> Self {
        Self {
            kind: TriggerKind::Interaction,
            timer_delay_ms: None,
        }
    }

    /// Viewport trigger spec.
    pub fn viewport() -> Self {
        Self {
            kind: TriggerKind::Viewport,
            timer_delay_ms: None,
        }
    }

    /// Timer trigger spec with the given delay.
    pub fn timer(delay_ms: i64) -> Self {
        Self {
            kind: TriggerKind::Timer,
            timer_delay_ms: Some(delay_ms),
        }
    }

    /// Validate into a [`Trigger`].
    pub fn validate(&self) -> Result<Trigger, ConfigError> {
        match self.kind {
            TriggerKind::Interaction => Ok(Trigger::Interaction),
            TriggerKind::Viewport => Ok(Trigger::Viewport),
            TriggerKind::Timer => {
                let ms = self.timer_delay_ms.ok_or(ConfigError::MissingTimerDelay)?;
                let ms = u64::try_from(ms)
                    .map_err(|_| ConfigError::InvalidTimerDelay(ms.to_string()))?;
                Ok(Trigger::Timer(Duration::from_millis(ms)))
            }
        }
    }
}

/// A validated trigger. Exactly one kind is active per controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Fire on the first primary gesture.
    Interaction,
    /// Fire on the first intersection with the viewport.
    Viewport,
    /// Fire once the delay has elapsed since configuration.
    Timer(Duration),
}

impl Trigger {
    /// The kind of this trigger.
    pub fn kind(&self) -> TriggerKind {
        match self {
            Self::Interaction => TriggerKind::Interaction,
            Self::Viewport => TriggerKind::Viewport,
            Self::Timer(_) => TriggerKind::Timer,
        }
    }

    /// Convert back to the serialized form.
    pub fn spec(&self) -> TriggerSpec {
        match self {
            Self::Interaction => TriggerSpec::interaction(),
            Self::Viewport => TriggerSpec::viewport(),
            Self::Timer(delay) => TriggerSpec::timer(delay.as_millis() as i64),
        }
    }
}

impl TryFrom<TriggerSpec> for Trigger {
    type Error = ConfigError;

    fn try_from(spec: TriggerSpec) -> Result<Self, Self::Error> {
        spec.validate()
    }
}

impl From<Trigger> for TriggerSpec {
    fn from(trigger: Trigger) -> Self {
        trigger.spec()
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timer(delay) => write!(f, "timer({}ms)", delay.as_millis()),
            other => write!(f, "{}", other.kind()),
        }
    }
}

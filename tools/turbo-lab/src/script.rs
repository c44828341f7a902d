//! Session steps for `turbo-lab run`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// A step that failed to parse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid step '{step}': {reason}")]
pub struct StepError {
    step: String,
    reason: &'static str,
}

impl StepError {
    fn new(step: &str, reason: &'static str) -> Self {
        Self {
            step: step.to_string(),
            reason,
        }
    }
}

/// One host event or inspection in a simulated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Primary gesture on an island's region.
    Click(String),
    /// Secondary gesture on an island's region.
    Hover(String),
    /// Scroll the island into view.
    Show(String),
    /// Scroll the island out of view.
    Hide(String),
    /// Let time pass.
    Wait(Duration),
    /// Perform an action on a mounted island.
    Act { island: String, action: String },
    /// Tear down the island's mount point.
    Destroy(String),
    /// Print the chunk report.
    Report,
}

fn island_name(step: &str, arg: Option<&str>) -> Result<String, StepError> {
    match arg.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(StepError::new(step, "expected an island name")),
    }
}

impl FromStr for Step {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (verb, arg) = match s.split_once(':') {
            Some((verb, arg)) => (verb, Some(arg)),
            None => (s, None),
        };

        match verb {
            "click" => Ok(Self::Click(island_name(s, arg)?)),
            "hover" => Ok(Self::Hover(island_name(s, arg)?)),
            "show" => Ok(Self::Show(island_name(s, arg)?)),
            "hide" => Ok(Self::Hide(island_name(s, arg)?)),
            "destroy" => Ok(Self::Destroy(island_name(s, arg)?)),
            "wait" => {
                let ms = arg
                    .and_then(|a| a.trim().parse::<u64>().ok())
                    .ok_or_else(|| StepError::new(s, "expected wait:<milliseconds>"))?;
                Ok(Self::Wait(Duration::from_millis(ms)))
            }
            "act" => {
                let (island, action) = arg
                    .and_then(|a| a.split_once(':'))
                    .filter(|(island, action)| !island.is_empty() && !action.is_empty())
                    .ok_or_else(|| StepError::new(s, "expected act:<island>:<action>"))?;
                Ok(Self::Act {
                    island: island.to_string(),
                    action: action.to_string(),
                })
            }
            "report" => Ok(Self::Report),
            _ => Err(StepError::new(s, "unknown step")),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Click(island) => write!(f, "click {}", island),
            Self::Hover(island) => write!(f, "hover {}", island),
            Self::Show(island) => write!(f, "scroll {} into view", island),
            Self::Hide(island) => write!(f, "scroll {} out of view", island),
            Self::Wait(duration) => write!(f, "wait {}ms", duration.as_millis()),
            Self::Act { island, action } => write!(f, "{} {}", island, action),
            Self::Destroy(island) => write!(f, "destroy {}", island),
            Self::Report => write!(f, "report"),
        }
    }
}

//! Execution context and the injected environment.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::events::{ActivationEvent, ActivationObserver};

/// Whether user-facing operations may take effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionContext {
    /// A live client where gestures, observers and timers exist.
    Interactive,
    /// Server-side pre-render; nothing is observed and nothing hydrates.
    PreRender,
}

impl ExecutionContext {
    /// Whether this is an interactive context.
    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::Interactive)
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interactive => write!(f, "interactive"),
            Self::PreRender => write!(f, "pre-render"),
        }
    }
}

/// Ambient environment passed to controllers and trackers at construction.
///
/// Carries the execution context and the optional observer hook.
#[derive(Clone)]
pub struct Environment {
    context: ExecutionContext,
    observer: Option<Rc<dyn ActivationObserver>>,
}

impl Environment {
    /// Create an environment for the given context.
    pub fn new(context: ExecutionContext) -> Self {
        Self {
            context,
            observer: None,
        }
    }

    /// Interactive client environment.
    pub fn interactive() -> Self {
        Self::new(ExecutionContext::Interactive)
    }

    /// Pre-render environment.
    pub fn pre_render() -> Self {
        Self::new(ExecutionContext::PreRender)
    }

    /// Attach an observer for activation events.
    pub fn with_observer(mut self, observer: Rc<dyn ActivationObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The execution context.
    pub fn context(&self) -> ExecutionContext {
        self.context
    }

    /// Whether the context is interactive.
    pub fn is_interactive(&self) -> bool {
        self.context.is_interactive()
    }

    pub(crate) fn emit(&self, event: ActivationEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(&event);
        }
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("context", &self.context)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

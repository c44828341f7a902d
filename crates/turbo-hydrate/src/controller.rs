//! Deferred activation controller.
//!
//! A controller owns one mount point and one trigger. It observes the
//! trigger, invokes its factory exactly once when the trigger fires, and
//! attaches the produced unit. Observation handles are held only until the
//! first fire or until the mount point is torn down.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Sleep};

use crate::context::Environment;
use crate::error::{ActivationError, ConfigError, MountError};
use crate::events::ActivationEvent;
use crate::mount::{MountPoint, Mountable};
use crate::region::{Gesture, Region};
use crate::trigger::{Trigger, TriggerSpec};

/// Boxed one-shot factory. Consumed on use, so it runs at most once.
pub type UnitFactory<U> = Box<dyn FnOnce() -> LocalBoxFuture<'static, anyhow::Result<U>>>;

/// Lifecycle state of a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerState {
    /// Configured in a pre-render context; nothing is observed.
    Dormant,
    /// Observing the trigger.
    Armed,
    /// Trigger fired; the factory is running.
    Fired,
    /// The unit is attached.
    Materialized,
    /// The factory failed. The mount point stays empty.
    Failed(String),
    /// The mount point or region went away before the unit was attached.
    TornDown,
}

impl ControllerState {
    /// Whether no further transition will happen.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            Self::Dormant | Self::Materialized | Self::Failed(_) | Self::TornDown
        )
    }

    /// Short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Dormant => "dormant",
            Self::Armed => "armed",
            Self::Fired => "fired",
            Self::Materialized => "materialized",
            Self::Failed(_) => "failed",
            Self::TornDown => "torn-down",
        }
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(error) => write!(f, "failed: {}", error),
            other => write!(f, "{}", other.label()),
        }
    }
}

/// The single outstanding observation of an armed controller.
enum Observation {
    Gestures(broadcast::Receiver<Gesture>),
    Visibility(watch::Receiver<bool>),
    Timer(Pin<Box<Sleep>>),
}

impl Observation {
    /// Acquire the observation for a trigger. The timer deadline starts now.
    fn arm(trigger: Trigger, region: &Region) -> Self {
        match trigger {
            Trigger::Interaction => Self::Gestures(region.listen()),
            Trigger::Viewport => Self::Visibility(region.observe()),
            Trigger::Timer(delay) => Self::Timer(Box::pin(tokio::time::sleep(delay))),
        }
    }

    /// Resolves `true` when the trigger fires, `false` if its source is gone.
    async fn fired(&mut self) -> bool {
        match self {
            // Regions only queue primary gestures, so a lag still means one arrived.
            Self::Gestures(rx) => match rx.recv().await {
                Ok(_) | Err(RecvError::Lagged(_)) => true,
                Err(RecvError::Closed) => false,
            },
            Self::Visibility(rx) => rx.wait_for(|intersecting| *intersecting).await.is_ok(),
            Self::Timer(sleep) => {
                sleep.as_mut().await;
                true
            }
        }
    }
}

/// Releases the mount point claim unless the controller has fired.
struct ClaimGuard<U> {
    mount: MountPoint<U>,
}

impl<U> Drop for ClaimGuard<U> {
    fn drop(&mut self) {
        self.mount.release();
    }
}

/// Decides when a deferred unit materializes and guarantees it happens once.
///
/// Observation runs on a local task (`tokio::task::spawn_local`), so
/// [`DeferredController::configure`] must be called inside a
/// [`tokio::task::LocalSet`] when the context is interactive. Dropping the
/// controller before it fires releases its observation and its claim on the
/// mount point. Once fired, the unit is still materialized and attached
/// after the controller is dropped.
pub struct DeferredController {
    mount: String,
    trigger: Trigger,
    state: watch::Receiver<ControllerState>,
    error: Rc<RefCell<Option<ActivationError>>>,
    task: Option<JoinHandle<()>>,
}

impl DeferredController {
    /// Configure a controller and begin observation.
    ///
    /// The trigger and the mount point are checked in every context. In a
    /// pre-render context nothing is observed; the controller stays
    /// [`ControllerState::Dormant`] and the mount point stays unclaimed for a
    /// later interactive configure.
    pub fn configure<U, F, Fut>(
        env: &Environment,
        spec: TriggerSpec,
        factory: F,
        mount: &MountPoint<U>,
        region: &Region,
    ) -> Result<Self, ConfigError>
    where
        U: Mountable,
        F: FnOnce() -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<U>> + 'static,
    {
        let trigger = spec.validate()?;
        mount.check_free()?;
        let name = mount.name().to_string();

        if !env.is_interactive() {
            tracing::debug!(mount = %name, trigger = %trigger, "Pre-render context, skipping observation");
            env.emit(ActivationEvent::Skipped {
                mount: name.clone(),
                trigger: trigger.kind(),
            });
            let (_, state) = watch::channel(ControllerState::Dormant);
            return Ok(Self {
                mount: name,
                trigger,
                state,
                error: Rc::default(),
                task: None,
            });
        }

        mount.claim()?;
        let claim = ClaimGuard {
            mount: mount.clone(),
        };
        let observation = Observation::arm(trigger, region);
        let (state_tx, state) = watch::channel(ControllerState::Armed);
        let error = Rc::new(RefCell::new(None));

        tracing::debug!(mount = %name, trigger = %trigger, "Armed deferred unit");
        env.emit(ActivationEvent::Armed {
            mount: name.clone(),
            trigger: trigger.kind(),
        });

        let task = tokio::task::spawn_local(observe_and_materialize(
            env.clone(),
            trigger,
            observation,
            Box::new(move || factory().boxed_local()),
            claim,
            state_tx,
            Rc::clone(&error),
            Instant::now(),
        ));

        Ok(Self {
            mount: name,
            trigger,
            state,
            error,
            task: Some(task),
        })
    }

    /// Name of the owned mount point.
    pub fn mount_name(&self) -> &str {
        &self.mount
    }

    /// The configured trigger.
    pub fn trigger(&self) -> Trigger {
        self.trigger
    }

    /// Current state.
    pub fn state(&self) -> ControllerState {
        self.state.borrow().clone()
    }

    /// Whether the trigger is still being observed.
    pub fn is_armed(&self) -> bool {
        self.state() == ControllerState::Armed
    }

    /// Wait for the one-shot activation outcome.
    pub async fn settled(&mut self) -> ControllerState {
        let settled = self
            .state
            .wait_for(ControllerState::is_settled)
            .await
            .map(|state| state.clone());
        match settled {
            Ok(state) => state,
            Err(_) => self.state.borrow().clone(),
        }
    }

    /// Wait for the outcome and report a failed activation as an error.
    ///
    /// A dormant controller counts as success. The typed error is handed out
    /// once; later calls rebuild it from the recorded message.
    pub async fn activated(&mut self) -> Result<(), ActivationError> {
        match self.settled().await {
            ControllerState::Failed(message) => Err(self
                .error
                .borrow_mut()
                .take()
                .unwrap_or_else(|| ActivationError::Materialize(anyhow::anyhow!(message)))),
            ControllerState::TornDown => Err(ActivationError::TornDown(self.mount.clone())),
            _ => Ok(()),
        }
    }
}

impl Drop for DeferredController {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            // Past the trigger the task runs on and attaches the unit.
            if self.is_armed() {
                task.abort();
            }
        }
    }
}

impl fmt::Debug for DeferredController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredController")
            .field("mount", &self.mount)
            .field("trigger", &self.trigger)
            .field("state", &self.state())
            .finish()
    }
}

async fn observe_and_materialize<U: Mountable>(
    env: Environment,
    trigger: Trigger,
    mut observation: Observation,
    factory: UnitFactory<U>,
    claim: ClaimGuard<U>,
    state: watch::Sender<ControllerState>,
    error: Rc<RefCell<Option<ActivationError>>>,
    configured_at: Instant,
) {
    let mount = claim.mount.clone();
    let name = mount.name().to_string();
    let mut teardown = mount.teardown_signal();

    let fired = tokio::select! {
        biased;
        _ = teardown.wait_for(|destroyed| *destroyed) => false,
        fired = observation.fired() => fired,
    };
    drop(observation);

    if !fired {
        tracing::debug!(mount = %name, "Torn down before trigger fired");
        state.send_replace(ControllerState::TornDown);
        env.emit(ActivationEvent::TornDown { mount: name });
        return;
    }

    mount.spend();
    drop(claim);
    let elapsed_ms = configured_at.elapsed().as_millis() as u64;
    tracing::info!(mount = %name, trigger = %trigger, elapsed_ms, "Loading deferred unit");
    state.send_replace(ControllerState::Fired);
    env.emit(ActivationEvent::Fired {
        mount: name.clone(),
        trigger: trigger.kind(),
        elapsed_ms,
    });

    let unit = match factory().await {
        Ok(unit) => unit,
        Err(err) => {
            let message = format!("{:#}", err);
            tracing::error!(mount = %name, error = %message, "Deferred unit failed to materialize");
            error.replace(Some(ActivationError::Materialize(err)));
            state.send_replace(ControllerState::Failed(message.clone()));
            env.emit(ActivationEvent::MaterializeFailed {
                mount: name,
                error: message,
            });
            return;
        }
    };

    match mount.attach(unit) {
        Ok(_) => {
            let elapsed_ms = configured_at.elapsed().as_millis() as u64;
            tracing::info!(mount = %name, elapsed_ms, "Deferred unit mounted");
            state.send_replace(ControllerState::Materialized);
            env.emit(ActivationEvent::Materialized {
                mount: name,
                elapsed_ms,
            });
        }
        Err(MountError::Destroyed(_)) => {
            tracing::debug!(mount = %name, "Mount point destroyed during materialization");
            state.send_replace(ControllerState::TornDown);
            env.emit(ActivationEvent::TornDown { mount: name });
        }
        Err(err) => {
            let message = err.to_string();
            tracing::error!(mount = %name, error = %message, "Deferred unit could not be attached");
            error.replace(Some(ActivationError::Mount(err)));
            state.send_replace(ControllerState::Failed(message.clone()));
            env.emit(ActivationEvent::MaterializeFailed {
                mount: name,
                error: message,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use tokio::task::LocalSet;

    struct Unit;

    impl Mountable for Unit {}

    // === ControllerState Tests ===

    #[test]
    fn test_settled_states() {
        assert!(ControllerState::Dormant.is_settled());
        assert!(ControllerState::Materialized.is_settled());
        assert!(ControllerState::Failed("x".into()).is_settled());
        assert!(ControllerState::TornDown.is_settled());
        assert!(!ControllerState::Armed.is_settled());
        assert!(!ControllerState::Fired.is_settled());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ControllerState::Armed.to_string(), "armed");
        assert_eq!(
            ControllerState::Failed("boom".into()).to_string(),
            "failed: boom"
        );
    }

    // === Configure Tests ===

    #[test]
    fn test_invalid_trigger_fails_before_context_check() {
        let mount: MountPoint<Unit> = MountPoint::new("slot");
        let region = Region::new("slot");
        let spec = TriggerSpec {
            kind: crate::TriggerKind::Timer,
            timer_delay_ms: None,
        };
        let result = DeferredController::configure(
            &Environment::pre_render(),
            spec,
            || async { Ok(Unit) },
            &mount,
            &region,
        );
        assert_eq!(result.unwrap_err(), ConfigError::MissingTimerDelay);
    }

    #[test]
    fn test_pre_render_is_dormant_and_unclaimed() {
        let mount: MountPoint<Unit> = MountPoint::new("slot");
        let region = Region::new("slot");
        let controller = DeferredController::configure(
            &Environment::pre_render(),
            TriggerSpec::interaction(),
            || async { Ok(Unit) },
            &mount,
            &region,
        )
        .unwrap();

        assert_eq!(controller.state(), ControllerState::Dormant);
        assert!(!mount.is_claimed());
        assert!(!region.is_observed());
    }

    #[test]
    fn test_pre_render_rejects_occupied_mount() {
        let mount = MountPoint::new("slot");
        mount.attach(Unit).unwrap();
        let region = Region::new("slot");
        let result = DeferredController::configure(
            &Environment::pre_render(),
            TriggerSpec::interaction(),
            || async { Ok(Unit) },
            &mount,
            &region,
        );
        assert_eq!(
            result.unwrap_err(),
            ConfigError::MountOccupied("slot".to_string())
        );
    }

    #[test]
    fn test_pre_render_rejects_destroyed_mount() {
        let mount: MountPoint<Unit> = MountPoint::new("slot");
        mount.destroy();
        let region = Region::new("slot");
        let result = DeferredController::configure(
            &Environment::pre_render(),
            TriggerSpec::viewport(),
            || async { Ok(Unit) },
            &mount,
            &region,
        );
        assert_eq!(
            result.unwrap_err(),
            ConfigError::MountDestroyed("slot".to_string())
        );
    }

    #[tokio::test]
    async fn test_occupied_mount_is_rejected() {
        LocalSet::new()
            .run_until(async {
                let mount = MountPoint::new("slot");
                mount.attach(Unit).unwrap();
                let region = Region::new("slot");
                let result = DeferredController::configure(
                    &Environment::interactive(),
                    TriggerSpec::interaction(),
                    || async { Ok(Unit) },
                    &mount,
                    &region,
                );
                assert_eq!(
                    result.unwrap_err(),
                    ConfigError::MountOccupied("slot".to_string())
                );
                assert!(!region.is_observed());
            })
            .await;
    }

    #[tokio::test]
    async fn test_observation_starts_at_configure() {
        LocalSet::new()
            .run_until(async {
                let mount: MountPoint<Unit> = MountPoint::new("slot");
                let region = Region::new("slot");
                let controller = DeferredController::configure(
                    &Environment::interactive(),
                    TriggerSpec::interaction(),
                    || async { Ok(Unit) },
                    &mount,
                    &region,
                )
                .unwrap();

                assert!(controller.is_armed());
                assert_eq!(region.gesture_listeners(), 1);
                assert_eq!(region.visibility_observers(), 0);
            })
            .await;
    }

    #[tokio::test]
    async fn test_dropping_controller_releases_claim_and_listener() {
        LocalSet::new()
            .run_until(async {
                let mount: MountPoint<Unit> = MountPoint::new("slot");
                let region = Region::new("slot");
                let controller = DeferredController::configure(
                    &Environment::interactive(),
                    TriggerSpec::viewport(),
                    || async { Ok(Unit) },
                    &mount,
                    &region,
                )
                .unwrap();
                assert!(mount.is_claimed());

                drop(controller);
                for _ in 0..4 {
                    tokio::task::yield_now().await;
                }

                assert!(!mount.is_claimed());
                assert!(!region.is_observed());
            })
            .await;
    }

    #[tokio::test]
    async fn test_hover_does_not_fire_interaction() {
        LocalSet::new()
            .run_until(async {
                let mount: MountPoint<Unit> = MountPoint::new("slot");
                let region = Region::new("slot");
                let calls = Rc::new(std::cell::Cell::new(0));
                let counter = Rc::clone(&calls);
                let mut controller = DeferredController::configure(
                    &Environment::interactive(),
                    TriggerSpec::interaction(),
                    move || async move {
                        counter.set(counter.get() + 1);
                        Ok(Unit)
                    },
                    &mount,
                    &region,
                )
                .unwrap();

                region.dispatch(Gesture::Hover);
                for _ in 0..4 {
                    tokio::task::yield_now().await;
                }
                assert_eq!(calls.get(), 0);
                assert!(controller.is_armed());

                region.click();
                assert_eq!(controller.settled().await, ControllerState::Materialized);
                assert_eq!(calls.get(), 1);
            })
            .await;
    }

    #[tokio::test]
    async fn test_factory_error_chain_is_reported() {
        LocalSet::new()
            .run_until(async {
                let mount: MountPoint<Unit> = MountPoint::new("slot");
                let region = Region::new("slot");
                let mut controller = DeferredController::configure(
                    &Environment::interactive(),
                    TriggerSpec::timer(0),
                    || async {
                        Err::<Unit, _>(
                            anyhow::anyhow!("chunk 404").context("load heavy chunk"),
                        )
                    },
                    &mount,
                    &region,
                )
                .unwrap();

                let state = controller.settled().await;
                assert_eq!(
                    state,
                    ControllerState::Failed("load heavy chunk: chunk 404".to_string())
                );
                assert!(mount.is_empty());
            })
            .await;
    }

    // === Activation Outcome Tests ===

    #[tokio::test]
    async fn test_activated_returns_factory_error() {
        LocalSet::new()
            .run_until(async {
                let mount: MountPoint<Unit> = MountPoint::new("slot");
                let region = Region::new("slot");
                let mut controller = DeferredController::configure(
                    &Environment::interactive(),
                    TriggerSpec::timer(0),
                    || async { Err::<Unit, _>(anyhow::anyhow!("chunk 404")) },
                    &mount,
                    &region,
                )
                .unwrap();

                let err = controller.activated().await.unwrap_err();
                match err {
                    ActivationError::Materialize(inner) => {
                        assert_eq!(inner.to_string(), "chunk 404")
                    }
                    other => panic!("unexpected error: {other}"),
                }

                let again = controller.activated().await.unwrap_err();
                assert!(matches!(again, ActivationError::Materialize(_)));
            })
            .await;
    }

    #[tokio::test]
    async fn test_activated_reports_teardown() {
        LocalSet::new()
            .run_until(async {
                let mount: MountPoint<Unit> = MountPoint::new("slot");
                let region = Region::new("slot");
                let mut controller = DeferredController::configure(
                    &Environment::interactive(),
                    TriggerSpec::interaction(),
                    || async { Ok(Unit) },
                    &mount,
                    &region,
                )
                .unwrap();

                mount.destroy();
                let err = controller.activated().await.unwrap_err();
                assert!(matches!(err, ActivationError::TornDown(ref name) if name == "slot"));
            })
            .await;
    }

    #[tokio::test]
    async fn test_activated_succeeds_once_mounted() {
        LocalSet::new()
            .run_until(async {
                let mount: MountPoint<Unit> = MountPoint::new("slot");
                let region = Region::new("slot");
                let mut controller = DeferredController::configure(
                    &Environment::interactive(),
                    TriggerSpec::interaction(),
                    || async { Ok(Unit) },
                    &mount,
                    &region,
                )
                .unwrap();

                region.click();
                assert!(controller.activated().await.is_ok());
                assert!(!mount.is_empty());
            })
            .await;
    }
}

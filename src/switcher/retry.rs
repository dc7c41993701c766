//! Delayed, cancellable confirmation retries
//!
//! After a gearset change the game ignores the commence button for a short
//! while, so clicking is retried on a timer:
//!
//! ```text
//! Idle -> Scheduled --delay--> Executing --+--> Scheduled (attempts left)
//!                                          +--> Terminated
//! ```
//!
//! Only one session may drive clicks. Reserving a generation cancels the
//! previous session under the controller lock, and every game step re-checks
//! its token on the single-writer context. A switch reserves before it
//! equips, so no step of the superseded session runs after the new gearset
//! goes on.

use crate::core::config::{ConfigReceiver, PreferenceTable, SwitcherConfig};
use crate::core::error::{Result, SwitcherError};
use crate::core::types::Role;
use crate::game::client::GameClient;
use crate::game::context::GameContext;
use crate::switcher::catalog::LoadoutCatalog;
use crate::switcher::constants::CONFIRM_CONTROL_ID;
use crate::switcher::names::{announce_selection, Notifier, RoleNames};
use crate::switcher::selector::select_loadout;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Timing and budget for one session, fixed when it starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPlan {
    pub role: Role,
    pub attempts: u32,
    pub first_delay: Duration,
    pub loop_delay: Duration,
}

impl RetryPlan {
    pub fn from_config(role: Role, config: &SwitcherConfig) -> Self {
        Self {
            role,
            attempts: config.retry_count,
            first_delay: config.first_delay(),
            loop_delay: config.loop_delay(),
        }
    }

    fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            self.first_delay
        } else {
            self.loop_delay
        }
    }
}

/// How a session ended. None of these are errors to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Dialog was gone or hidden when an attempt came due
    DialogClosed { attempts: u32 },
    /// Every attempt was spent with the dialog still up
    Exhausted { attempts: u32 },
    /// Superseded by a newer session or shut down
    Cancelled { attempts: u32 },
    /// The game client failed; the session stopped
    Failed { attempts: u32, error: String },
}

impl RetryOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::DialogClosed { attempts }
            | Self::Exhausted { attempts }
            | Self::Cancelled { attempts }
            | Self::Failed { attempts, .. } => *attempts,
        }
    }
}

struct ActiveSession {
    generation: u64,
    token: CancellationToken,
    // Taken by whoever awaits the session
    handle: Option<JoinHandle<RetryOutcome>>,
}

#[derive(Default)]
struct ControllerState {
    last_generation: u64,
    active: Option<ActiveSession>,
}

impl ControllerState {
    fn supersede(&mut self) -> u64 {
        if let Some(previous) = self.active.take() {
            previous.token.cancel();
            tracing::debug!("retry generation {} superseded", previous.generation);
        }
        self.last_generation += 1;
        self.last_generation
    }
}

/// A generation taken ahead of a switch; the previous session is already
/// cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Reservation {
    generation: u64,
}

impl Reservation {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Owner of the single live retry session
pub struct RetryController {
    game: GameContext,
    config: ConfigReceiver,
    names: Arc<RoleNames>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<ControllerState>,
}

impl RetryController {
    pub fn new(
        game: GameContext,
        config: ConfigReceiver,
        names: Arc<RoleNames>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            game,
            config,
            names,
            notifier,
            state: Mutex::new(ControllerState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancel any running session and take the next generation
    ///
    /// Call before touching the client for a new switch, then hand the
    /// reservation to [`launch`](Self::launch).
    pub fn reserve(&self) -> Reservation {
        Reservation {
            generation: self.lock().supersede(),
        }
    }

    /// Start the session for a reservation
    ///
    /// Returns `None` without spawning anything if a later reservation was
    /// taken in the meantime. Must be called from within a tokio runtime.
    pub fn launch(&self, reservation: Reservation, plan: RetryPlan) -> Option<u64> {
        let mut state = self.lock();
        if reservation.generation != state.last_generation {
            tracing::debug!(
                "retry generation {} superseded before it started",
                reservation.generation
            );
            return None;
        }
        self.spawn_session(&mut state, reservation.generation, plan);
        Some(reservation.generation)
    }

    /// Start a session for `plan`, cancelling any running one
    ///
    /// Returns the new session's generation. Must be called from within a
    /// tokio runtime.
    pub fn start(&self, plan: RetryPlan) -> u64 {
        let mut state = self.lock();
        let generation = state.supersede();
        self.spawn_session(&mut state, generation, plan);
        generation
    }

    fn spawn_session(&self, state: &mut ControllerState, generation: u64, plan: RetryPlan) {
        let token = CancellationToken::new();
        let session = RetrySession {
            plan,
            generation,
            attempts_made: 0,
            token: token.clone(),
            game: self.game.clone(),
            config: self.config.clone(),
            names: Arc::clone(&self.names),
            notifier: Arc::clone(&self.notifier),
        };
        let handle = tokio::spawn(session.run());

        state.active = Some(ActiveSession {
            generation,
            token,
            handle: Some(handle),
        });
    }

    /// Cancel the running session without waiting for it
    pub fn cancel(&self) -> Option<u64> {
        let state = self.lock();
        let active = state.active.as_ref()?;
        active.token.cancel();
        Some(active.generation)
    }

    /// Generation of the latest session, if it has not finished yet
    pub fn active_generation(&self) -> Option<u64> {
        let state = self.lock();
        let active = state.active.as_ref()?;
        if active.token.is_cancelled() {
            return None;
        }
        match &active.handle {
            Some(handle) if handle.is_finished() => None,
            _ => Some(active.generation),
        }
    }

    /// Wait for the latest session to end
    ///
    /// Returns `None` if there is no session or another caller is already
    /// waiting on it. The finished session is no longer reported as active.
    pub async fn wait(&self) -> Option<RetryOutcome> {
        let (generation, handle) = {
            let mut state = self.lock();
            let active = state.active.as_mut()?;
            (active.generation, active.handle.take()?)
        };
        let outcome = join(handle).await;

        let mut state = self.lock();
        if state
            .active
            .as_ref()
            .is_some_and(|active| active.generation == generation)
        {
            state.active = None;
        }
        outcome
    }

    /// Cancel the latest session and wait until it has released the game
    pub async fn shutdown(&self) -> Option<RetryOutcome> {
        let session = self.lock().active.take()?;
        session.token.cancel();
        join(session.handle?).await
    }
}

impl Drop for RetryController {
    fn drop(&mut self) {
        if let Some(active) = self.lock().active.take() {
            active.token.cancel();
        }
    }
}

async fn join(handle: JoinHandle<RetryOutcome>) -> Option<RetryOutcome> {
    match handle.await {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            tracing::error!("retry task ended abnormally: {}", e);
            None
        }
    }
}

/// One retry run for a target job
struct RetrySession {
    plan: RetryPlan,
    generation: u64,
    attempts_made: u32,
    token: CancellationToken,
    game: GameContext,
    config: ConfigReceiver,
    names: Arc<RoleNames>,
    notifier: Arc<dyn Notifier>,
}

enum StepResult {
    Cancelled,
    DialogClosed,
    Clicked,
}

impl RetrySession {
    async fn run(mut self) -> RetryOutcome {
        let outcome = self.drive().await;
        let generation = self.generation;
        match &outcome {
            RetryOutcome::DialogClosed { attempts } => tracing::info!(
                "retry generation {}: dialog closed after {} attempts",
                generation,
                attempts
            ),
            RetryOutcome::Exhausted { attempts } => tracing::info!(
                "retry generation {}: gave up after {} attempts",
                generation,
                attempts
            ),
            RetryOutcome::Cancelled { attempts } => tracing::debug!(
                "retry generation {}: cancelled after {} attempts",
                generation,
                attempts
            ),
            RetryOutcome::Failed { attempts, error } => tracing::warn!(
                "retry generation {}: stopped after {} attempts: {}",
                generation,
                attempts,
                error
            ),
        }
        outcome
    }

    async fn drive(&mut self) -> RetryOutcome {
        for attempt in 0..self.plan.attempts {
            if self.token.is_cancelled() {
                return self.cancelled();
            }

            tokio::select! {
                biased;
                _ = self.token.cancelled() => return self.cancelled(),
                _ = tokio::time::sleep(self.plan.delay_before(attempt)) => {}
            }

            let role = self.plan.role;
            let token = self.token.clone();
            let preferences = self.config.borrow().preferences.clone();
            let names = Arc::clone(&self.names);
            let notifier = Arc::clone(&self.notifier);
            let step = self
                .game
                .run(move |client| {
                    let drift = Drift {
                        role,
                        preferences: &preferences,
                        names: &names,
                        notifier: notifier.as_ref(),
                    };
                    attempt_step(client, &drift, &token, attempt)
                })
                .await
                .and_then(|result| result);

            match step {
                Ok(StepResult::Clicked) => self.attempts_made += 1,
                Ok(StepResult::DialogClosed) => {
                    return RetryOutcome::DialogClosed {
                        attempts: self.attempts_made,
                    }
                }
                Ok(StepResult::Cancelled) => return self.cancelled(),
                Err(e) => return self.failed(e),
            }
        }

        RetryOutcome::Exhausted {
            attempts: self.attempts_made,
        }
    }

    fn cancelled(&self) -> RetryOutcome {
        RetryOutcome::Cancelled {
            attempts: self.attempts_made,
        }
    }

    fn failed(&self, error: SwitcherError) -> RetryOutcome {
        RetryOutcome::Failed {
            attempts: self.attempts_made,
            error: error.to_string(),
        }
    }
}

/// What an attempt needs to put the target job back on
struct Drift<'a> {
    role: Role,
    preferences: &'a PreferenceTable,
    names: &'a RoleNames,
    notifier: &'a dyn Notifier,
}

// Runs on the single-writer context.
fn attempt_step(
    client: &mut dyn GameClient,
    drift: &Drift<'_>,
    token: &CancellationToken,
    attempt: u32,
) -> Result<StepResult> {
    if token.is_cancelled() {
        return Ok(StepResult::Cancelled);
    }

    if !client.is_dialog_visible()? {
        return Ok(StepResult::DialogClosed);
    }

    // A missing player only skips the re-equip; the click still goes out.
    if let Some(current) = client.current_role()? {
        if current != drift.role {
            tracing::info!(
                "job changed to {} while waiting, retrying gear switch to {}",
                current,
                drift.role
            );
            reequip(client, drift)?;
        }
    }

    tracing::info!("Attempt {}: clicking confirm", attempt + 1);
    client.focus_dialog()?;
    client.click_confirm(CONFIRM_CONTROL_ID)?;
    Ok(StepResult::Clicked)
}

fn reequip(client: &mut dyn GameClient, drift: &Drift<'_>) -> Result<()> {
    let role = drift.role;
    let catalog = LoadoutCatalog::new(client.loadouts()?);
    let selection = select_loadout(role, drift.preferences, &catalog);
    if selection.warning.is_some() {
        tracing::warn!("preferred gearset for job {} no longer exists, falling back", role);
    }
    announce_selection(drift.notifier, &drift.names.name_of(role), &selection);

    match selection.loadout {
        Some(id) => {
            client.equip_loadout(id)?;
            tracing::info!("re-equipped gearset {} for job {}", id, role);
        }
        None => tracing::warn!("no gearset left for job {}", role),
    }
    Ok(())
}

//! Single-writer game context
//!
//! One task owns the [`GameClient`] and runs submitted steps strictly in
//! submission order. Anything that reads or mutates live game state goes
//! through [`GameContext::run`] and awaits the step's result, so game access
//! is never concurrent with itself even when several retry timers fire
//! close together.

use crate::core::error::{Result, SwitcherError};
use crate::game::client::GameClient;
use std::panic::{self, AssertUnwindSafe};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

type Step = Box<dyn FnOnce(&mut dyn GameClient) + Send>;

/// Cloneable handle for submitting steps to the game task
#[derive(Clone)]
pub struct GameContext {
    steps: mpsc::UnboundedSender<Step>,
}

impl GameContext {
    /// Move `client` onto its own task and return a handle to it
    ///
    /// The task exits once every handle has been dropped and the queue is
    /// drained; await the returned `JoinHandle` to wait for that.
    pub fn spawn<C>(client: C) -> (Self, JoinHandle<()>)
    where
        C: GameClient + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Step>();
        let handle = tokio::spawn(async move {
            let mut client = client;
            while let Some(step) = rx.recv().await {
                step(&mut client);
            }
            tracing::debug!("game context closed");
        });
        (Self { steps: tx }, handle)
    }

    /// Run `step` on the game task and wait for its result
    ///
    /// A panic inside the step is contained to that step and reported as
    /// [`SwitcherError::GameStepPanicked`]; the game task keeps serving.
    pub async fn run<R, F>(&self, step: F) -> Result<R>
    where
        F: FnOnce(&mut dyn GameClient) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let boxed: Step = Box::new(move |client: &mut dyn GameClient| {
            let reply = match panic::catch_unwind(AssertUnwindSafe(|| step(client))) {
                Ok(value) => Ok(value),
                Err(_) => Err(SwitcherError::GameStepPanicked),
            };
            // Caller may have given up waiting; nothing to do then.
            let _ = reply_tx.send(reply);
        });

        self.steps
            .send(boxed)
            .map_err(|_| SwitcherError::GameContextClosed)?;
        reply_rx
            .await
            .map_err(|_| SwitcherError::GameContextClosed)?
    }

    /// Whether the game task is still accepting steps
    pub fn is_open(&self) -> bool {
        !self.steps.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::sim::SimulatedClient;
    use crate::core::types::{LoadoutId, Role};

    #[tokio::test]
    async fn test_steps_see_each_others_writes_in_order() {
        let sim = SimulatedClient::new(Some(Role(3)));
        sim.add_loadout(crate::core::types::Loadout::new(4, 7, 500));
        let (game, _task) = GameContext::spawn(sim);

        game.run(|client| client.equip_loadout(LoadoutId(4)))
            .await
            .unwrap()
            .unwrap();
        let role = game.run(|client| client.current_role()).await.unwrap().unwrap();

        assert_eq!(role, Some(Role(7)));
    }

    #[tokio::test]
    async fn test_panicking_step_is_contained() {
        let (game, _task) = GameContext::spawn(SimulatedClient::new(Some(Role(1))));

        let result = game.run(|_client| -> u32 { panic!("bad handle") }).await;
        assert!(matches!(result, Err(SwitcherError::GameStepPanicked)));

        // The task is still alive for later steps
        let role = game.run(|client| client.current_role()).await.unwrap().unwrap();
        assert_eq!(role, Some(Role(1)));
    }

    #[tokio::test]
    async fn test_task_exits_when_handles_dropped() {
        let (game, task) = GameContext::spawn(SimulatedClient::new(None));
        assert!(game.is_open());
        drop(game);
        task.await.unwrap();
    }
}

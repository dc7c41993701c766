//! Add-on lifetime: wiring, event entry point and teardown

use crate::core::config::ConfigReceiver;
use crate::core::types::DialogEvent;
use crate::game::client::GameClient;
use crate::game::context::GameContext;
use crate::switcher::coordinator::{SwitchCoordinator, SwitchOutcome};
use crate::switcher::names::{Notifier, RoleNameLookup, RoleNames};
use crate::switcher::retry::RetryController;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Running switcher bound to one game client
pub struct JobSwitcher {
    coordinator: SwitchCoordinator,
    game_task: JoinHandle<()>,
}

impl JobSwitcher {
    /// Move `client` onto the single-writer context and get ready for events
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<C>(
        client: C,
        config: ConfigReceiver,
        names: impl RoleNameLookup + 'static,
        notifier: Arc<dyn Notifier>,
    ) -> Self
    where
        C: GameClient + 'static,
    {
        let (game, game_task) = GameContext::spawn(client);
        let coordinator = SwitchCoordinator::new(game, config, RoleNames::new(names), notifier);
        tracing::info!("job switcher ready");
        Self {
            coordinator,
            game_task,
        }
    }

    /// Host listener entry point
    ///
    /// Adapter failures are logged and swallowed so they never reach the
    /// host; `None` means the event was dropped because of one.
    pub async fn handle_event(&self, event: &DialogEvent) -> Option<SwitchOutcome> {
        match self.coordinator.on_dialog_event(event).await {
            Ok(outcome) => {
                tracing::debug!("dialog event handled: {:?}", outcome);
                Some(outcome)
            }
            Err(e) => {
                tracing::warn!("dialog event dropped: {}", e);
                None
            }
        }
    }

    pub fn retries(&self) -> &RetryController {
        self.coordinator.retries()
    }

    /// Cancel any running retry session and stop the game context
    ///
    /// Returns once no retry session can touch the client any more.
    pub async fn shutdown(self) {
        let Self {
            coordinator,
            game_task,
        } = self;

        if let Some(outcome) = coordinator.retries().shutdown().await {
            tracing::debug!("retry session at shutdown: {:?}", outcome);
        }
        drop(coordinator);

        // Superseded sessions hold context handles until their next checkpoint
        if let Err(e) = game_task.await {
            tracing::error!("game context task failed: {}", e);
        }
        tracing::info!("job switcher stopped");
    }
}

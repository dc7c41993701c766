//! Handles a duty confirmation event end to end
//!
//! decode job -> compare with current job -> pick gearset -> equip -> retry
//! the commence click.

use crate::core::config::ConfigReceiver;
use crate::core::error::Result;
use crate::core::types::{DialogEvent, Loadout, LoadoutId, Role};
use crate::game::client::GameClient;
use crate::game::context::GameContext;
use crate::switcher::catalog::LoadoutCatalog;
use crate::switcher::constants::{BUTTON_ACTIVATE, DIALOG_NAME};
use crate::switcher::decoder::decode_role;
use crate::switcher::names::{announce_selection, chat_line, Notifier, RoleNames};
use crate::switcher::retry::{RetryController, RetryPlan};
use crate::switcher::selector::select_loadout;
use std::sync::Arc;

/// Why an event led to no action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Disabled,
    OtherDialog,
    NotButtonActivate,
    /// Dialog state did not name a job
    NotApplicable,
    NoPlayer,
}

/// What handling one event did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    Ignored(IgnoreReason),
    AlreadyOnRole(Role),
    /// No saved gearset for the job; nothing was changed
    NoLoadout(Role),
    Switched {
        role: Role,
        loadout: LoadoutId,
        generation: u64,
    },
}

pub struct SwitchCoordinator {
    game: GameContext,
    config: ConfigReceiver,
    names: Arc<RoleNames>,
    notifier: Arc<dyn Notifier>,
    retries: RetryController,
}

impl SwitchCoordinator {
    pub fn new(
        game: GameContext,
        config: ConfigReceiver,
        names: RoleNames,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let names = Arc::new(names);
        let retries = RetryController::new(
            game.clone(),
            config.clone(),
            Arc::clone(&names),
            Arc::clone(&notifier),
        );
        Self {
            game,
            config,
            names,
            notifier,
            retries,
        }
    }

    pub fn retries(&self) -> &RetryController {
        &self.retries
    }

    /// React to a host UI event
    ///
    /// Delivering the same event again once the player is on the target job
    /// is a no-op: nothing is equipped and the running session is left alone.
    /// A switch cancels the running session before the new gearset goes on.
    pub async fn on_dialog_event(&self, event: &DialogEvent) -> Result<SwitchOutcome> {
        let config = self.config.borrow().clone();

        if !config.enabled {
            return Ok(SwitchOutcome::Ignored(IgnoreReason::Disabled));
        }
        if event.dialog != DIALOG_NAME {
            return Ok(SwitchOutcome::Ignored(IgnoreReason::OtherDialog));
        }
        if event.kind != BUTTON_ACTIVATE {
            return Ok(SwitchOutcome::Ignored(IgnoreReason::NotButtonActivate));
        }

        let Some(role) = decode_role(&event.state) else {
            tracing::debug!("confirm dialog without a job icon, ignoring");
            return Ok(SwitchOutcome::Ignored(IgnoreReason::NotApplicable));
        };

        let view = self.game.run(move |client| read_view(client, role)).await??;
        let Some((current, slots)) = view else {
            return Ok(SwitchOutcome::Ignored(IgnoreReason::NoPlayer));
        };
        if current == role {
            tracing::debug!("already on job {}", role);
            return Ok(SwitchOutcome::AlreadyOnRole(role));
        }

        let catalog = LoadoutCatalog::new(slots);
        let selection = select_loadout(role, &config.preferences, &catalog);
        let name = self.names.name_of(role);

        if selection.warning.is_some() {
            tracing::warn!("preferred gearset for job {} no longer exists, falling back", role);
        }
        announce_selection(self.notifier.as_ref(), &name, &selection);

        let Some(loadout) = selection.loadout else {
            tracing::warn!("no gearset for job {}", role);
            return Ok(SwitchOutcome::NoLoadout(role));
        };

        self.notifier
            .print(&chat_line(&format!("Switching to {}...", name)));
        let reservation = self.retries.reserve();
        self.game
            .run(move |client| client.equip_loadout(loadout))
            .await??;
        tracing::info!("equipped gearset {} for job {}", loadout, role);

        let generation = reservation.generation();
        if self
            .retries
            .launch(reservation, RetryPlan::from_config(role, &config))
            .is_none()
        {
            tracing::debug!("switch to job {} overtaken by a newer one", role);
        }
        Ok(SwitchOutcome::Switched {
            role,
            loadout,
            generation,
        })
    }
}

// Runs on the single-writer context. Gearsets are only read when a switch
// is actually needed.
fn read_view(
    client: &mut dyn GameClient,
    role: Role,
) -> Result<Option<(Role, Vec<Loadout>)>> {
    let Some(current) = client.current_role()? else {
        return Ok(None);
    };
    let slots = if current == role {
        Vec::new()
    } else {
        client.loadouts()?
    };
    Ok(Some((current, slots)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{PreferenceTable, SwitcherConfig};
    use crate::core::types::{DialogSnapshot, DialogValue};
    use crate::game::sim::SimulatedClient;
    use crate::switcher::constants::{ICON_FIELD_INDEX, MIN_FIELDS};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Chat {
        lines: Mutex<Vec<String>>,
    }

    impl Notifier for Chat {
        fn print(&self, message: &str) {
            self.lines.lock().unwrap().push(message.to_string());
        }
    }

    fn confirm_event(icon: u32) -> DialogEvent {
        let mut values = vec![DialogValue::Undefined; MIN_FIELDS];
        values[ICON_FIELD_INDEX] = DialogValue::UInt(icon);
        DialogEvent::new(DIALOG_NAME, BUTTON_ACTIVATE, DialogSnapshot::new(values))
    }

    fn setup(sim: &SimulatedClient, config: SwitcherConfig) -> (SwitchCoordinator, Arc<Chat>) {
        let (game, _task) = GameContext::spawn(sim.clone());
        let (_publisher, receiver) = config.into_channel();
        let chat = Arc::new(Chat::default());
        let names = RoleNames::new(|role: Role| (role.0 == 5).then(|| "Monk".to_string()));
        let coordinator = SwitchCoordinator::new(game, receiver, names, chat.clone());
        (coordinator, chat)
    }

    fn scenario_client() -> SimulatedClient {
        SimulatedClient::new(Some(Role(3)))
            .with_loadouts([Loadout::new(2, 5, 450), Loadout::new(7, 5, 520)])
    }

    #[tokio::test(start_paused = true)]
    async fn test_switches_to_highest_item_level() {
        let sim = scenario_client();
        let (coordinator, chat) = setup(&sim, SwitcherConfig::default());

        let outcome = coordinator.on_dialog_event(&confirm_event(62105)).await.unwrap();

        assert_eq!(
            outcome,
            SwitchOutcome::Switched {
                role: Role(5),
                loadout: LoadoutId(7),
                generation: 1
            }
        );
        assert_eq!(sim.equips(), vec![LoadoutId(7)]);
        assert_eq!(
            chat.lines.lock().unwrap().clone(),
            vec!["[JobAutoSwitcher] Switching to Monk...".to_string()]
        );
        assert_eq!(coordinator.retries().active_generation(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_preference_warns_and_falls_back() {
        let sim = scenario_client();
        sim.delete_loadout(LoadoutId(2));
        let mut config = SwitcherConfig::default();
        config.preferences = PreferenceTable::new().with(Role(5), LoadoutId(2));
        let (coordinator, chat) = setup(&sim, config);

        let outcome = coordinator.on_dialog_event(&confirm_event(62105)).await.unwrap();

        assert!(matches!(
            outcome,
            SwitchOutcome::Switched {
                loadout: LoadoutId(7),
                ..
            }
        ));
        let lines = chat.lines.lock().unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("no longer exists"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_delivery_is_noop() {
        let sim = scenario_client();
        let (coordinator, _chat) = setup(&sim, SwitcherConfig::default());

        let first = coordinator.on_dialog_event(&confirm_event(62105)).await.unwrap();
        let second = coordinator.on_dialog_event(&confirm_event(62105)).await.unwrap();

        assert!(matches!(first, SwitchOutcome::Switched { generation: 1, .. }));
        assert_eq!(second, SwitchOutcome::AlreadyOnRole(Role(5)));
        assert_eq!(sim.equips().len(), 1);
        assert_eq!(coordinator.retries().active_generation(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_gearset_changes_nothing() {
        let sim = SimulatedClient::new(Some(Role(3))).with_loadouts([Loadout::new(1, 6, 500)]);
        let (coordinator, chat) = setup(&sim, SwitcherConfig::default());

        let outcome = coordinator.on_dialog_event(&confirm_event(62105)).await.unwrap();

        assert_eq!(outcome, SwitchOutcome::NoLoadout(Role(5)));
        assert!(sim.equips().is_empty());
        assert_eq!(coordinator.retries().active_generation(), None);
        assert_eq!(
            chat.lines.lock().unwrap().clone(),
            vec!["[JobAutoSwitcher] No gearset found for Monk.".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_ignored_events() {
        let sim = scenario_client();
        let (coordinator, _chat) = setup(&sim, SwitcherConfig::default());

        let mut other_kind = confirm_event(62105);
        other_kind.kind = BUTTON_ACTIVATE + 1;
        let mut other_dialog = confirm_event(62105);
        other_dialog.dialog = "SelectYesno".into();
        let short = DialogEvent::new(DIALOG_NAME, BUTTON_ACTIVATE, DialogSnapshot::default());

        assert_eq!(
            coordinator.on_dialog_event(&other_kind).await.unwrap(),
            SwitchOutcome::Ignored(IgnoreReason::NotButtonActivate)
        );
        assert_eq!(
            coordinator.on_dialog_event(&other_dialog).await.unwrap(),
            SwitchOutcome::Ignored(IgnoreReason::OtherDialog)
        );
        assert_eq!(
            coordinator.on_dialog_event(&short).await.unwrap(),
            SwitchOutcome::Ignored(IgnoreReason::NotApplicable)
        );
        assert_eq!(
            coordinator.on_dialog_event(&confirm_event(61000)).await.unwrap(),
            SwitchOutcome::Ignored(IgnoreReason::NotApplicable)
        );
        assert!(sim.equips().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_ignores_everything() {
        let sim = scenario_client();
        let config = SwitcherConfig {
            enabled: false,
            ..SwitcherConfig::default()
        };
        let (coordinator, _chat) = setup(&sim, config);

        let outcome = coordinator.on_dialog_event(&confirm_event(62105)).await.unwrap();
        assert_eq!(outcome, SwitchOutcome::Ignored(IgnoreReason::Disabled));
        assert!(sim.equips().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_player_loaded() {
        let sim = scenario_client();
        sim.set_role(None);
        let (coordinator, _chat) = setup(&sim, SwitcherConfig::default());

        let outcome = coordinator.on_dialog_event(&confirm_event(62105)).await.unwrap();
        assert_eq!(outcome, SwitchOutcome::Ignored(IgnoreReason::NoPlayer));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_gearset_leaves_running_session() {
        let sim = scenario_client();
        let (coordinator, chat) = setup(&sim, SwitcherConfig::default());

        coordinator.on_dialog_event(&confirm_event(62105)).await.unwrap();
        let outcome = coordinator.on_dialog_event(&confirm_event(62124)).await.unwrap();

        assert_eq!(outcome, SwitchOutcome::NoLoadout(Role(24)));
        assert_eq!(coordinator.retries().active_generation(), Some(1));
        assert_eq!(chat.lines.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_equip_still_cancels_previous_session() {
        let sim = scenario_client().with_loadouts([Loadout::new(9, 24, 600)]);
        let (coordinator, _chat) = setup(&sim, SwitcherConfig::default());

        coordinator.on_dialog_event(&confirm_event(62105)).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(600)).await;
        assert_eq!(sim.click_count(), 1);

        sim.set_equip_fails(true);
        let result = coordinator.on_dialog_event(&confirm_event(62124)).await;
        assert!(result.is_err());
        assert_eq!(coordinator.retries().active_generation(), None);

        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        assert_eq!(sim.click_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_adapter_failure_is_returned() {
        let sim = scenario_client();
        sim.set_fault(Some("object table unavailable"));
        let (coordinator, _chat) = setup(&sim, SwitcherConfig::default());

        let result = coordinator.on_dialog_event(&confirm_event(62105)).await;
        assert!(result.is_err());
        assert_eq!(coordinator.retries().active_generation(), None);
    }
}

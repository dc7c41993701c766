//! In-memory game client
//!
//! Stands in for the live client in the playtest binary and in tests.
//! Clones share state, so a test can keep one clone for inspection while
//! another is moved onto the game context.

use crate::core::error::{Result, SwitcherError};
use crate::core::types::{Loadout, LoadoutId, Role};
use crate::game::client::GameClient;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
struct SimState {
    role: Option<Role>,
    loadouts: Vec<Loadout>,
    dialog_visible: bool,
    equip_applies: bool,
    equip_fails: bool,
    equip_delay: Duration,
    fault: Option<String>,
    equips: Vec<LoadoutId>,
    clicks: Vec<Click>,
    focus_count: u32,
}

/// One confirmation click as the client saw it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Click {
    pub control: i32,
    pub at: Instant,
    /// Player job at the moment of the click
    pub role: Option<Role>,
}

#[derive(Debug, Clone)]
pub struct SimulatedClient {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedClient {
    /// A client whose player is on `role`, with the dialog shown
    pub fn new(role: Option<Role>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                role,
                loadouts: Vec::new(),
                dialog_visible: true,
                equip_applies: true,
                equip_fails: false,
                equip_delay: Duration::ZERO,
                fault: None,
                equips: Vec::new(),
                clicks: Vec::new(),
                focus_count: 0,
            })),
        }
    }

    pub fn with_loadouts(self, loadouts: impl IntoIterator<Item = Loadout>) -> Self {
        for loadout in loadouts {
            self.add_loadout(loadout);
        }
        self
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add or replace the gearset in `loadout.id`'s slot
    pub fn add_loadout(&self, loadout: Loadout) {
        let mut state = self.lock();
        match state.loadouts.iter_mut().find(|l| l.id == loadout.id) {
            Some(slot) => *slot = loadout,
            None => state.loadouts.push(loadout),
        }
    }

    /// Mark a slot as deleted, keeping the slot itself
    pub fn delete_loadout(&self, id: LoadoutId) {
        if let Some(slot) = self.lock().loadouts.iter_mut().find(|l| l.id == id) {
            slot.exists = false;
        }
    }

    /// Change the player's job behind the engine's back
    pub fn set_role(&self, role: Option<Role>) {
        self.lock().role = role;
    }

    pub fn role(&self) -> Option<Role> {
        self.lock().role
    }

    pub fn set_dialog_visible(&self, visible: bool) {
        self.lock().dialog_visible = visible;
    }

    pub fn dialog_visible(&self) -> bool {
        self.lock().dialog_visible
    }

    /// When false, equipping succeeds but leaves the job unchanged
    pub fn set_equip_applies(&self, applies: bool) {
        self.lock().equip_applies = applies;
    }

    /// When true, only equipping fails
    pub fn set_equip_fails(&self, fails: bool) {
        self.lock().equip_fails = fails;
    }

    /// Block the calling thread this long on every equip, like a slow client
    pub fn set_equip_delay(&self, delay: Duration) {
        self.lock().equip_delay = delay;
    }

    /// Make every call fail with an adapter error until cleared
    pub fn set_fault(&self, fault: Option<&str>) {
        self.lock().fault = fault.map(str::to_string);
    }

    pub fn equips(&self) -> Vec<LoadoutId> {
        self.lock().equips.clone()
    }

    pub fn clicks(&self) -> Vec<Click> {
        self.lock().clicks.clone()
    }

    pub fn click_count(&self) -> usize {
        self.lock().clicks.len()
    }

    pub fn focus_count(&self) -> u32 {
        self.lock().focus_count
    }

    pub fn loadout_list(&self) -> Vec<Loadout> {
        self.lock().loadouts.clone()
    }

    fn check_fault(state: &SimState) -> Result<()> {
        match &state.fault {
            Some(reason) => Err(SwitcherError::Adapter(reason.clone())),
            None => Ok(()),
        }
    }
}

impl GameClient for SimulatedClient {
    fn current_role(&self) -> Result<Option<Role>> {
        let state = self.lock();
        Self::check_fault(&state)?;
        Ok(state.role)
    }

    fn loadouts(&self) -> Result<Vec<Loadout>> {
        let state = self.lock();
        Self::check_fault(&state)?;
        Ok(state.loadouts.clone())
    }

    fn equip_loadout(&mut self, id: LoadoutId) -> Result<()> {
        let delay = self.lock().equip_delay;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let mut state = self.lock();
        Self::check_fault(&state)?;
        if state.equip_fails {
            return Err(SwitcherError::Adapter(format!("gearset {} could not be equipped", id)));
        }
        let role = state
            .loadouts
            .iter()
            .find(|l| l.id == id && l.exists)
            .map(|l| l.role)
            .ok_or_else(|| SwitcherError::Adapter(format!("gearset {} is empty", id)))?;
        state.equips.push(id);
        if state.equip_applies {
            state.role = Some(role);
        }
        Ok(())
    }

    fn is_dialog_visible(&self) -> Result<bool> {
        let state = self.lock();
        Self::check_fault(&state)?;
        Ok(state.dialog_visible)
    }

    fn focus_dialog(&mut self) -> Result<()> {
        let mut state = self.lock();
        Self::check_fault(&state)?;
        state.focus_count += 1;
        Ok(())
    }

    fn click_confirm(&mut self, control: i32) -> Result<()> {
        let mut state = self.lock();
        Self::check_fault(&state)?;
        if !state.dialog_visible {
            return Err(SwitcherError::Adapter("confirm dialog is not open".into()));
        }
        let role = state.role;
        state.clicks.push(Click {
            control,
            at: Instant::now(),
            role,
        });
        Ok(())
    }
}

//! Snapshot of the player's saved gearsets
//!
//! Built fresh from the client for every selection and dropped afterwards;
//! gearsets can be edited between two dialog pops.

use crate::core::types::{Loadout, LoadoutId, Role};
use crate::switcher::constants::MAX_LOADOUT_SLOTS;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadoutCatalog {
    loadouts: Vec<Loadout>,
}

impl LoadoutCatalog {
    /// Wrap the client's slot list, keeping slot order
    ///
    /// Slots past the client's slot limit are ignored.
    pub fn new(mut loadouts: Vec<Loadout>) -> Self {
        if loadouts.len() > MAX_LOADOUT_SLOTS {
            tracing::debug!(
                "client reported {} gearset slots, keeping the first {}",
                loadouts.len(),
                MAX_LOADOUT_SLOTS
            );
            loadouts.truncate(MAX_LOADOUT_SLOTS);
        }
        Self { loadouts }
    }

    /// Existing gearsets for `role`, in slot order
    pub fn for_role(&self, role: Role) -> impl Iterator<Item = &Loadout> {
        self.loadouts
            .iter()
            .filter(move |l| l.exists && l.role == role)
    }

    /// Existing gearset `id`, only if it belongs to `role`
    pub fn find(&self, role: Role, id: LoadoutId) -> Option<&Loadout> {
        self.for_role(role).find(|l| l.id == id)
    }

    pub fn len(&self) -> usize {
        self.loadouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loadouts.is_empty()
    }
}

impl From<Vec<Loadout>> for LoadoutCatalog {
    fn from(loadouts: Vec<Loadout>) -> Self {
        Self::new(loadouts)
    }
}

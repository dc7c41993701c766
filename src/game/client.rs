//! Adapter contract for the live game client
//!
//! Implementations touch real game memory, so every call must happen on the
//! single-writer context (see [`crate::game::context::GameContext`]). The
//! trait is synchronous on purpose: a step runs to completion inside one
//! framework tick.

use crate::core::error::Result;
use crate::core::types::{Loadout, LoadoutId, Role};

pub trait GameClient: Send {
    /// Job of the local player, or `None` when no player is loaded
    fn current_role(&self) -> Result<Option<Role>>;

    /// Every gearset slot the client knows about, in slot order
    fn loadouts(&self) -> Result<Vec<Loadout>>;

    /// Equip a gearset by slot
    fn equip_loadout(&mut self, id: LoadoutId) -> Result<()>;

    /// Whether the duty confirmation dialog exists and is shown
    fn is_dialog_visible(&self) -> Result<bool>;

    /// Give the dialog input focus before a click
    fn focus_dialog(&mut self) -> Result<()>;

    /// Fire the dialog callback with a single control id argument
    fn click_confirm(&mut self, control: i32) -> Result<()>;
}

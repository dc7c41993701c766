//! Job auto-switch engine
//!
//! Pipeline: [`decoder`] -> [`coordinator`] -> [`selector`] over a
//! [`catalog`] snapshot -> game client -> [`retry`].

pub mod catalog;
pub mod constants;
pub mod coordinator;
pub mod decoder;
pub mod names;
pub mod retry;
pub mod selector;
pub mod service;

pub use catalog::LoadoutCatalog;
pub use coordinator::{IgnoreReason, SwitchCoordinator, SwitchOutcome};
pub use decoder::decode_role;
pub use names::{announce_selection, chat_line, LogNotifier, Notifier, RoleNameLookup, RoleNames};
pub use retry::{Reservation, RetryController, RetryOutcome, RetryPlan};
pub use selector::{select_loadout, Selection, SelectionWarning};
pub use service::JobSwitcher;

pub mod config;
pub mod error;
pub mod types;

pub use config::{ConfigPublisher, ConfigReceiver, PreferenceTable, SwitcherConfig};
pub use error::{Result, SwitcherError};
pub use types::{DialogEvent, DialogSnapshot, DialogValue, Loadout, LoadoutId, Role, Score};

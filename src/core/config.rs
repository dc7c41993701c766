//! Switcher configuration
//!
//! Persisted and edited by the settings subsystem; the engine only reads it.
//! Snapshots are published through a `watch` channel so a toggle made while
//! a retry loop is running is seen on that loop's next attempt.

use crate::core::error::{Result, SwitcherError};
use crate::core::types::{LoadoutId, Role};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tokio::sync::watch;

/// Default number of confirmation attempts per switch
pub const DEFAULT_RETRY_COUNT: u32 = 5;

/// Default wait before the first attempt (ms)
pub const DEFAULT_RETRY_DELAY_FIRST: u64 = 500;

/// Default wait between later attempts (ms)
pub const DEFAULT_RETRY_DELAY_LOOP: u64 = 2000;

/// Receiving side of the published configuration
pub type ConfigReceiver = watch::Receiver<SwitcherConfig>;

/// Publishing side, owned by whoever edits settings
pub type ConfigPublisher = watch::Sender<SwitcherConfig>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitcherConfig {
    /// Master switch; when false every dialog event is ignored
    pub enabled: bool,

    /// Maximum confirmation clicks per switch (at least 1)
    pub retry_count: u32,

    /// Wait before the first click, in milliseconds
    ///
    /// The game needs a moment to finish the gearset change before the
    /// commence button accepts input.
    pub retry_delay_first: u64,

    /// Wait between subsequent clicks, in milliseconds
    pub retry_delay_loop: u64,

    /// Per-job gearset preferences
    pub preferences: PreferenceTable,
}

impl Default for SwitcherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retry_count: DEFAULT_RETRY_COUNT,
            retry_delay_first: DEFAULT_RETRY_DELAY_FIRST,
            retry_delay_loop: DEFAULT_RETRY_DELAY_LOOP,
            preferences: PreferenceTable::default(),
        }
    }
}

impl SwitcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document, then validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.retry_count == 0 {
            return Err(SwitcherError::InvalidConfig(
                "retry_count must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn first_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_first)
    }

    pub fn loop_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_loop)
    }

    /// Wrap this config in a fresh watch channel
    pub fn into_channel(self) -> (ConfigPublisher, ConfigReceiver) {
        watch::channel(self)
    }
}

/// Preferred gearset per job
///
/// A missing entry means "use the highest item level". Entries may point at
/// a slot that has since been deleted or reassigned; the selector handles
/// that case rather than the table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, u8>", into = "BTreeMap<String, u8>")]
pub struct PreferenceTable {
    entries: AHashMap<Role, LoadoutId>,
}

impl PreferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, role: Role) -> Option<LoadoutId> {
        self.entries.get(&role).copied()
    }

    /// Set or clear the preference for a job
    pub fn set(&mut self, role: Role, loadout: Option<LoadoutId>) {
        match loadout {
            Some(id) => {
                self.entries.insert(role, id);
            }
            None => {
                self.entries.remove(&role);
            }
        }
    }

    pub fn with(mut self, role: Role, loadout: LoadoutId) -> Self {
        self.set(role, Some(loadout));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<BTreeMap<String, u8>> for PreferenceTable {
    type Error = String;

    fn try_from(raw: BTreeMap<String, u8>) -> std::result::Result<Self, Self::Error> {
        let mut table = Self::new();
        for (key, slot) in raw {
            let role: u32 = key
                .trim()
                .parse()
                .map_err(|_| format!("preference key '{}' is not a job id", key))?;
            table.set(Role(role), Some(LoadoutId(slot)));
        }
        Ok(table)
    }
}

impl From<PreferenceTable> for BTreeMap<String, u8> {
    fn from(table: PreferenceTable) -> Self {
        table
            .entries
            .into_iter()
            .map(|(role, id)| (role.0.to_string(), id.0))
            .collect()
    }
}

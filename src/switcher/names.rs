//! User-facing collaborators: job names and the chat channel

use crate::core::types::Role;
use crate::switcher::constants::{CHAT_PREFIX, MAX_CACHED_NAMES, UNKNOWN_ROLE_NAME};
use crate::switcher::selector::{Selection, SelectionWarning};
use ahash::AHashMap;
use std::sync::{Mutex, PoisonError};

/// Job name source (the client's job sheet)
pub trait RoleNameLookup: Send + Sync {
    fn name_of(&self, role: Role) -> Option<String>;
}

/// Fire-and-forget chat output
pub trait Notifier: Send + Sync {
    fn print(&self, message: &str);
}

impl<F> RoleNameLookup for F
where
    F: Fn(Role) -> Option<String> + Send + Sync,
{
    fn name_of(&self, role: Role) -> Option<String> {
        self(role)
    }
}

/// Memoizing wrapper around a [`RoleNameLookup`]
///
/// Names are fixed for the life of the client, so the first answer for a job
/// is kept. The memo stops growing at `MAX_CACHED_NAMES` entries; later jobs
/// are looked up each time.
pub struct RoleNames {
    lookup: Box<dyn RoleNameLookup>,
    cache: Mutex<AHashMap<Role, String>>,
}

impl RoleNames {
    pub fn new(lookup: impl RoleNameLookup + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
            cache: Mutex::new(AHashMap::new()),
        }
    }

    pub fn name_of(&self, role: Role) -> String {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(name) = cache.get(&role) {
            return name.clone();
        }

        let name = self
            .lookup
            .name_of(role)
            .unwrap_or_else(|| UNKNOWN_ROLE_NAME.to_string());
        if cache.len() < MAX_CACHED_NAMES {
            cache.insert(role, name.clone());
        }
        name
    }

    pub fn cached(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Prefix a chat line the way every add-on message is shown
pub fn chat_line(message: &str) -> String {
    format!("{} {}", CHAT_PREFIX, message)
}

/// Tell the user when a selection fell back or found nothing
pub fn announce_selection(notifier: &dyn Notifier, name: &str, selection: &Selection) {
    if let Some(SelectionWarning::StalePreference { preferred, .. }) = selection.warning {
        notifier.print(&chat_line(&format!(
            "Preferred gearset {} for {} no longer exists, using the highest item level instead.",
            preferred, name
        )));
    }
    if selection.loadout.is_none() {
        notifier.print(&chat_line(&format!("No gearset found for {}.", name)));
    }
}

/// Notifier that forwards chat lines to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn print(&self, message: &str) {
        tracing::info!("{}", message);
    }
}

//! Game-facing constants for the duty confirmation window
//!
//! These mirror the client's UI layout and id tables. They change only with
//! game patches, which is why they are not part of the user config.

/// Dialog the host listener is registered for
pub const DIALOG_NAME: &str = "ContentsFinderConfirm";

/// Host event type for a button click
pub const BUTTON_ACTIVATE: u32 = 25;

// Dialog value layout
pub const MIN_FIELDS: usize = 25;
pub const ICON_FIELD_INDEX: usize = 24;

// Job icons are a contiguous block; icon - base = job id
pub const ICON_BASE: u32 = 62100;
pub const ICON_MAX: u32 = 63000;

/// Gearset slots the client exposes
pub const MAX_LOADOUT_SLOTS: usize = 100;

/// Callback value of the "Commence" button
pub const CONFIRM_CONTROL_ID: i32 = 8;

/// Prefix for every chat message we print
pub const CHAT_PREFIX: &str = "[JobAutoSwitcher]";

/// Shown when the job sheet has no name for a role
pub const UNKNOWN_ROLE_NAME: &str = "Unknown Job";

/// Role names kept in the memo before it stops growing
pub const MAX_CACHED_NAMES: usize = 128;

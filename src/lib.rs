//! Job Auto Switcher - gearset switching for duty confirmations

pub mod core;
pub mod game;
pub mod switcher;

pub use crate::core::error::{Result, SwitcherError};
pub use crate::switcher::JobSwitcher;

//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Job/class identifier as the game numbers it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Role(pub u32);

impl Role {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Gearset slot index (stable across sessions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LoadoutId(pub u8);

impl fmt::Display for LoadoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Item level of a gearset
pub type Score = i16;

/// A saved gearset as the client reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loadout {
    pub id: LoadoutId,
    pub role: Role,
    pub score: Score,
    pub exists: bool,
}

impl Loadout {
    pub fn new(id: u8, role: u32, score: Score) -> Self {
        Self {
            id: LoadoutId(id),
            role: Role(role),
            score,
            exists: true,
        }
    }

    /// A slot that the client still reports but which no longer holds a gearset
    pub fn empty(id: u8, role: u32) -> Self {
        Self {
            exists: false,
            ..Self::new(id, role, 0)
        }
    }
}

/// One typed value of a dialog's UI state
#[derive(Debug, Clone, PartialEq)]
pub enum DialogValue {
    Undefined,
    Bool(bool),
    Int(i32),
    UInt(u32),
    String(String),
}

/// Value snapshot of the duty confirmation dialog
///
/// The host copies the dialog's value array into this type; the decoder only
/// relies on its length and on the icon field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DialogSnapshot {
    pub values: Vec<DialogValue>,
}

impl DialogSnapshot {
    pub fn new(values: Vec<DialogValue>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DialogValue> {
        self.values.get(index)
    }
}

/// Event delivered by the host UI listener
#[derive(Debug, Clone, PartialEq)]
pub struct DialogEvent {
    /// Name of the dialog the event was raised on
    pub dialog: String,
    /// Host event type id (button click, focus, ...)
    pub kind: u32,
    pub state: DialogSnapshot,
}

impl DialogEvent {
    pub fn new(dialog: impl Into<String>, kind: u32, state: DialogSnapshot) -> Self {
        Self {
            dialog: dialog.into(),
            kind,
            state,
        }
    }
}

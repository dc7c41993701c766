//! Decode the required job from the confirmation dialog

use crate::core::types::{DialogSnapshot, DialogValue, Role};
use crate::switcher::constants::{ICON_BASE, ICON_FIELD_INDEX, ICON_MAX, MIN_FIELDS};

/// Job the queued duty was registered with, if the dialog names one
///
/// Returns `None` when the snapshot is shorter than the known layout, when
/// the icon field does not hold an unsigned id, or when the id lies outside
/// the job icon block. Never guesses or clamps.
pub fn decode_role(state: &DialogSnapshot) -> Option<Role> {
    if state.len() < MIN_FIELDS {
        return None;
    }

    let icon_id = icon_id(state.get(ICON_FIELD_INDEX)?)?;
    if !(ICON_BASE..=ICON_MAX).contains(&icon_id) {
        return None;
    }

    Some(Role(icon_id - ICON_BASE))
}

// The client stores the icon as an unsigned value, but some builds tag it as
// a plain int. Negative ints are not icons.
fn icon_id(value: &DialogValue) -> Option<u32> {
    match value {
        DialogValue::UInt(id) => Some(*id),
        DialogValue::Int(id) => u32::try_from(*id).ok(),
        _ => None,
    }
}

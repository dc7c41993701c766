//! Gearset selection policy
//!
//! 1. A user preference wins if it still names an existing gearset of the job.
//! 2. A preference that no longer resolves is reported and ignored.
//! 3. Otherwise take the highest item level; on ties the earliest slot wins.

use crate::core::config::PreferenceTable;
use crate::core::types::{Loadout, LoadoutId, Role};
use crate::switcher::catalog::LoadoutCatalog;

/// Recoverable policy notice produced during selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionWarning {
    /// The preferred slot is gone or now holds another job's gearset
    StalePreference { role: Role, preferred: LoadoutId },
}

/// Result of running the policy for one job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub loadout: Option<LoadoutId>,
    pub warning: Option<SelectionWarning>,
}

impl Selection {
    pub fn is_found(&self) -> bool {
        self.loadout.is_some()
    }
}

pub fn select_loadout(
    role: Role,
    preferences: &PreferenceTable,
    catalog: &LoadoutCatalog,
) -> Selection {
    let mut warning = None;

    if let Some(preferred) = preferences.get(role) {
        if catalog.find(role, preferred).is_some() {
            return Selection {
                loadout: Some(preferred),
                warning: None,
            };
        }
        warning = Some(SelectionWarning::StalePreference { role, preferred });
    }

    Selection {
        loadout: highest_score(catalog.for_role(role)).map(|l| l.id),
        warning,
    }
}

fn highest_score<'a>(loadouts: impl Iterator<Item = &'a Loadout>) -> Option<&'a Loadout> {
    let mut best: Option<&Loadout> = None;
    for loadout in loadouts {
        // Strictly greater keeps the first of equal scores
        if best.map_or(true, |b| loadout.score > b.score) {
            best = Some(loadout);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn catalog(loadouts: Vec<Loadout>) -> LoadoutCatalog {
        LoadoutCatalog::new(loadouts)
    }

    #[test]
    fn test_highest_item_level_without_preference() {
        let c = catalog(vec![Loadout::new(2, 5, 450), Loadout::new(7, 5, 520)]);
        let selection = select_loadout(Role(5), &PreferenceTable::new(), &c);
        assert_eq!(selection.loadout, Some(LoadoutId(7)));
        assert_eq!(selection.warning, None);
    }

    #[test]
    fn test_preference_beats_item_level() {
        let c = catalog(vec![Loadout::new(2, 5, 450), Loadout::new(7, 5, 520)]);
        let prefs = PreferenceTable::new().with(Role(5), LoadoutId(2));
        let selection = select_loadout(Role(5), &prefs, &c);
        assert_eq!(selection.loadout, Some(LoadoutId(2)));
        assert_eq!(selection.warning, None);
    }

    #[test]
    fn test_deleted_preference_falls_back_with_warning() {
        let c = catalog(vec![Loadout::empty(2, 5), Loadout::new(7, 5, 520)]);
        let prefs = PreferenceTable::new().with(Role(5), LoadoutId(2));
        let selection = select_loadout(Role(5), &prefs, &c);
        assert_eq!(selection.loadout, Some(LoadoutId(7)));
        assert_eq!(
            selection.warning,
            Some(SelectionWarning::StalePreference {
                role: Role(5),
                preferred: LoadoutId(2)
            })
        );
    }

    #[test]
    fn test_preference_for_other_job_is_stale() {
        let c = catalog(vec![Loadout::new(2, 6, 700), Loadout::new(7, 5, 520)]);
        let prefs = PreferenceTable::new().with(Role(5), LoadoutId(2));
        let selection = select_loadout(Role(5), &prefs, &c);
        assert_eq!(selection.loadout, Some(LoadoutId(7)));
        assert!(selection.warning.is_some());
    }

    #[test]
    fn test_tie_goes_to_first_slot() {
        let c = catalog(vec![
            Loadout::new(4, 5, 500),
            Loadout::new(1, 5, 520),
            Loadout::new(9, 5, 520),
        ]);
        let selection = select_loadout(Role(5), &PreferenceTable::new(), &c);
        assert_eq!(selection.loadout, Some(LoadoutId(1)));
    }

    #[test]
    fn test_no_gearset_for_job() {
        let c = catalog(vec![Loadout::new(1, 6, 520), Loadout::empty(2, 5)]);
        let selection = select_loadout(Role(5), &PreferenceTable::new(), &c);
        assert!(!selection.is_found());
    }

    #[test]
    fn test_negative_item_level_still_selectable() {
        let c = catalog(vec![Loadout::new(3, 5, -1)]);
        let selection = select_loadout(Role(5), &PreferenceTable::new(), &c);
        assert_eq!(selection.loadout, Some(LoadoutId(3)));
    }

    fn arb_loadout() -> impl Strategy<Value = Loadout> {
        (0u8..40, 0u32..4, any::<i16>(), any::<bool>()).prop_map(|(id, role, score, exists)| {
            Loadout {
                id: LoadoutId(id),
                role: Role(role),
                score,
                exists,
            }
        })
    }

    proptest! {
        #[test]
        fn prop_never_selects_missing_gearset(
            loadouts in prop::collection::vec(arb_loadout(), 0..30),
            role in 0u32..4,
            preferred in prop::option::of(0u8..40),
        ) {
            let mut prefs = PreferenceTable::new();
            prefs.set(Role(role), preferred.map(LoadoutId));
            let c = catalog(loadouts.clone());

            if let Some(id) = select_loadout(Role(role), &prefs, &c).loadout {
                let chosen = loadouts
                    .iter()
                    .find(|l| l.id == id && l.role == Role(role) && l.exists);
                prop_assert!(chosen.is_some());
            }
        }

        #[test]
        fn prop_fallback_is_first_maximum(
            loadouts in prop::collection::vec(arb_loadout(), 0..30),
            role in 0u32..4,
        ) {
            let c = catalog(loadouts.clone());
            let selection = select_loadout(Role(role), &PreferenceTable::new(), &c);

            let candidates: Vec<&Loadout> = loadouts
                .iter()
                .filter(|l| l.exists && l.role == Role(role))
                .collect();
            let expected = candidates
                .iter()
                .map(|l| l.score)
                .max()
                .and_then(|max| candidates.iter().find(|l| l.score == max))
                .map(|l| l.id);

            prop_assert_eq!(selection.loadout, expected);
        }
    }
}

use std::collections::HashMap;

use glam::Vec3;

use crate::{user::UserKey, world::ElementKey};

/// What a script asks for when assigning a syncer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncerChoice {
    /// Hand authority to a specific connected player.
    User(UserKey),
    /// Let the range heuristics pick.
    Auto,
    /// No syncer; the element is pinned out of auto assignment until
    /// explicitly reassigned.
    None,
}

/// Authority state of one syncable element.
///
/// Explicit assignment is a soft preference: the per-tick range pass revokes
/// it when the assigned player drifts out of range. A pinned `Unassigned`
/// (from `SyncerChoice::None`) is the only state the range pass never
/// touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncerState {
    Unassigned { pinned: bool },
    Explicit(UserKey),
    Auto(UserKey),
}

impl SyncerState {
    pub fn user(&self) -> Option<UserKey> {
        match self {
            SyncerState::Explicit(user) | SyncerState::Auto(user) => Some(*user),
            SyncerState::Unassigned { .. } => None,
        }
    }
}

/// Syncer assignment for every syncable element in the world.
pub struct SyncerMap {
    assignments: HashMap<ElementKey, SyncerState>,
}

impl SyncerMap {
    pub fn new() -> Self {
        Self {
            assignments: HashMap::new(),
        }
    }

    /// Track a newly created syncable element.
    pub fn register(&mut self, element: ElementKey) {
        self.assignments
            .insert(element, SyncerState::Unassigned { pinned: false });
    }

    /// Stop tracking a destroyed element.
    pub fn deregister(&mut self, element: &ElementKey) -> Option<SyncerState> {
        self.assignments.remove(element)
    }

    pub fn state(&self, element: &ElementKey) -> Option<SyncerState> {
        self.assignments.get(element).copied()
    }

    pub fn syncer_of(&self, element: &ElementKey) -> Option<UserKey> {
        self.assignments.get(element).and_then(|state| state.user())
    }

    /// Apply an explicit script-side assignment. Returns the new state, or
    /// `None` if the element is not tracked.
    pub fn set(&mut self, element: ElementKey, choice: SyncerChoice) -> Option<SyncerState> {
        let state = self.assignments.get_mut(&element)?;
        *state = match choice {
            SyncerChoice::User(user) => SyncerState::Explicit(user),
            SyncerChoice::Auto => SyncerState::Unassigned { pinned: false },
            SyncerChoice::None => SyncerState::Unassigned { pinned: true },
        };
        Some(*state)
    }

    /// Engine-driven override: the last occupant leaving a vehicle becomes
    /// its syncer, explicit assignment notwithstanding.
    pub fn assign_auto(&mut self, element: ElementKey, user: UserKey) -> Option<SyncerState> {
        let state = self.assignments.get_mut(&element)?;
        *state = SyncerState::Auto(user);
        Some(*state)
    }

    /// Drop every assignment referencing a disconnecting user. Returns the
    /// elements whose state changed.
    pub fn clear_user(&mut self, user: &UserKey) -> Vec<ElementKey> {
        let mut changed = Vec::new();
        for (element, state) in self.assignments.iter_mut() {
            if state.user() == Some(*user) {
                *state = SyncerState::Unassigned { pinned: false };
                changed.push(*element);
            }
        }
        changed
    }

    /// The per-tick range pass. `elements` supplies each tracked element's
    /// world position and sync range; `users` supplies candidate player
    /// positions. Out-of-range syncers (explicit included) are revoked and
    /// the nearest in-range player takes over as `Auto`. Returns the changes
    /// applied.
    pub fn range_pass(
        &mut self,
        elements: &[(ElementKey, Vec3, f32)],
        users: &[(UserKey, Vec3)],
    ) -> Vec<(ElementKey, SyncerState)> {
        let mut changes = Vec::new();
        for (element, position, range) in elements {
            let Some(state) = self.assignments.get_mut(element) else {
                continue;
            };
            if matches!(state, SyncerState::Unassigned { pinned: true }) {
                continue;
            }

            let current_in_range = state.user().is_some_and(|user| {
                users
                    .iter()
                    .any(|(candidate, at)| *candidate == user && at.distance(*position) <= *range)
            });
            if current_in_range {
                continue;
            }

            let nearest = users
                .iter()
                .filter(|(_, at)| at.distance(*position) <= *range)
                .min_by(|(_, a), (_, b)| {
                    a.distance(*position).total_cmp(&b.distance(*position))
                })
                .map(|(user, _)| *user);

            let next = match nearest {
                Some(user) => SyncerState::Auto(user),
                None => SyncerState::Unassigned { pinned: false },
            };
            if *state != next {
                *state = next;
                changes.push((*element, next));
            }
        }
        changes
    }
}

impl Default for SyncerMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_shared::BigMapKey;

    fn element(raw: u64) -> ElementKey {
        ElementKey::from_u64(raw)
    }

    fn user(raw: u64) -> UserKey {
        UserKey::from_u64(raw)
    }

    #[test]
    fn explicit_none_is_pinned_against_auto_assignment() {
        let mut map = SyncerMap::new();
        let vehicle = element(1);
        map.register(vehicle);
        map.set(vehicle, SyncerChoice::None);

        let changes = map.range_pass(
            &[(vehicle, Vec3::ZERO, 140.0)],
            &[(user(1), Vec3::new(10.0, 0.0, 0.0))],
        );

        assert!(changes.is_empty());
        assert_eq!(
            map.state(&vehicle),
            Some(SyncerState::Unassigned { pinned: true })
        );
    }

    #[test]
    fn range_exit_revokes_explicit_assignment() {
        let mut map = SyncerMap::new();
        let vehicle = element(1);
        let far_user = user(1);
        let near_user = user(2);
        map.register(vehicle);
        map.set(vehicle, SyncerChoice::User(far_user));

        let changes = map.range_pass(
            &[(vehicle, Vec3::ZERO, 140.0)],
            &[
                (far_user, Vec3::new(500.0, 0.0, 0.0)),
                (near_user, Vec3::new(20.0, 0.0, 0.0)),
            ],
        );

        assert_eq!(changes, vec![(vehicle, SyncerState::Auto(near_user))]);
    }

    #[test]
    fn in_range_explicit_assignment_is_kept() {
        let mut map = SyncerMap::new();
        let ped = element(1);
        let chosen = user(1);
        let closer = user(2);
        map.register(ped);
        map.set(ped, SyncerChoice::User(chosen));

        // another player being closer does not matter while the explicit
        // syncer stays in range
        let changes = map.range_pass(
            &[(ped, Vec3::ZERO, 100.0)],
            &[
                (chosen, Vec3::new(90.0, 0.0, 0.0)),
                (closer, Vec3::new(5.0, 0.0, 0.0)),
            ],
        );

        assert!(changes.is_empty());
        assert_eq!(map.state(&ped), Some(SyncerState::Explicit(chosen)));
    }

    #[test]
    fn no_candidates_leaves_element_unassigned() {
        let mut map = SyncerMap::new();
        let ped = element(1);
        map.register(ped);
        map.set(ped, SyncerChoice::User(user(1)));

        let changes = map.range_pass(&[(ped, Vec3::ZERO, 100.0)], &[]);

        assert_eq!(
            changes,
            vec![(ped, SyncerState::Unassigned { pinned: false })]
        );
    }

    #[test]
    fn disconnecting_user_loses_assignments() {
        let mut map = SyncerMap::new();
        let a = element(1);
        let b = element(2);
        map.register(a);
        map.register(b);
        map.set(a, SyncerChoice::User(user(1)));
        map.set(b, SyncerChoice::User(user(2)));

        let mut changed = map.clear_user(&user(1));
        changed.sort_by_key(|key| key.to_u64());

        assert_eq!(changed, vec![a]);
        assert_eq!(map.syncer_of(&a), None);
        assert_eq!(map.syncer_of(&b), Some(user(2)));
    }
}

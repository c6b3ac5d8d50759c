//! The participant roster.

use std::collections::BTreeMap;

/// Current role of one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleTag {
    /// Running and expected to behave honestly.
    Live,
    /// Crashed by the injector (or never came up).
    Down,
    /// Running with a declared misbehavior mode.
    Byzantine(String),
}

impl std::fmt::Display for RoleTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Live => f.write_str("live"),
            Self::Down => f.write_str("down"),
            Self::Byzantine(tag) => write!(f, "byzantine:{tag}"),
        }
    }
}

/// Mapping from logical participant name to its current role.
///
/// Mutated only by the [`FaultInjector`](crate::FaultInjector); read by the
/// scenario runner to decide whether quorum conditions hold.
#[derive(Debug, Clone, Default)]
pub struct ParticipantRoster {
    roles: BTreeMap<String, RoleTag>,
}

impl ParticipantRoster {
    /// Roster with every named participant `Live`.
    pub fn new(participants: &[String]) -> Self {
        let roles = participants.iter().map(|p| (p.clone(), RoleTag::Live)).collect();
        Self { roles }
    }

    /// Current role of a participant.
    pub fn role(&self, name: &str) -> Option<&RoleTag> {
        self.roles.get(name)
    }

    /// Number of participants currently tagged `Live` or `Byzantine`.
    ///
    /// A Byzantine participant is still a running process participating in
    /// the protocol; only `Down` participants are excluded.
    pub fn running_count(&self) -> usize {
        self.roles.values().filter(|r| !matches!(r, RoleTag::Down)).count()
    }

    /// Number of participants currently tagged `Live`.
    pub fn live_count(&self) -> usize {
        self.roles.values().filter(|r| matches!(r, RoleTag::Live)).count()
    }

    /// Total participant count.
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// True when no participants are registered.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// All (name, role) pairs, in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RoleTag)> {
        self.roles.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub(crate) fn set(&mut self, name: &str, role: RoleTag) {
        self.roles.insert(name.to_owned(), role);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("member{i}")).collect()
    }

    #[test]
    fn test_new_roster_is_all_live() {
        let roster = ParticipantRoster::new(&names(4));
        assert_eq!(roster.len(), 4);
        assert_eq!(roster.live_count(), 4);
        assert_eq!(roster.role("member1"), Some(&RoleTag::Live));
    }

    #[test]
    fn test_byzantine_counts_as_running_not_live() {
        let mut roster = ParticipantRoster::new(&names(4));
        roster.set("member4", RoleTag::Byzantine("YES_MAN".to_owned()));
        assert_eq!(roster.live_count(), 3);
        assert_eq!(roster.running_count(), 4);
    }

    #[test]
    fn test_role_display() {
        assert_eq!(RoleTag::Live.to_string(), "live");
        assert_eq!(RoleTag::Down.to_string(), "down");
        assert_eq!(RoleTag::Byzantine("NO_MAN".to_owned()).to_string(), "byzantine:NO_MAN");
    }
}

//! The fault injector.

use std::time::Duration;

use tracing::{info, warn};
use vigil_supervisor::ProcessSupervisor;

use crate::{ParticipantRoster, RoleTag};

/// Applies scripted faults to a subset of the participants one supervisor
/// tracks.
///
/// The injector owns the roster for the duration of one scenario and is the
/// only component that mutates it. It references processes by logical name;
/// the supervisor keeps ownership of the handles.
#[derive(Debug)]
pub struct FaultInjector {
    roster: ParticipantRoster,
}

impl FaultInjector {
    /// Injector over a roster with every named participant `Live`.
    pub fn new(participants: &[String]) -> Self {
        Self { roster: ParticipantRoster::new(participants) }
    }

    /// Read-only view of the roster.
    pub fn roster(&self) -> &ParticipantRoster {
        &self.roster
    }

    /// Declare a participant Byzantine before it is launched.
    ///
    /// Returns the behavior tag to append to the participant's launch
    /// arguments. The external system implements the misbehavior; the
    /// harness only passes the declared role.
    pub fn declare_byzantine(&mut self, name: &str, behavior: &str) -> String {
        info!(name, behavior, "declaring participant byzantine");
        self.roster.set(name, RoleTag::Byzantine(behavior.to_owned()));
        behavior.to_owned()
    }

    /// Behavior tag a participant was declared with, if any. Consulted when
    /// rendering launch commands.
    pub fn behavior_of(&self, name: &str) -> Option<&str> {
        match self.roster.role(name) {
            Some(RoleTag::Byzantine(tag)) => Some(tag),
            _ => None,
        }
    }

    /// Crash every named participant that is not already down.
    ///
    /// Terminates each one's process through the supervisor and tags it
    /// `Down`. A participant already `Down` is a no-op, not an error.
    /// Returns the count successfully transitioned.
    pub async fn crash(
        &mut self,
        supervisor: &mut ProcessSupervisor,
        names: &[String],
        grace: Duration,
    ) -> usize {
        let mut transitioned = 0;
        for name in names {
            match self.roster.role(name) {
                None => {
                    warn!(name, "crash requested for unknown participant");
                    continue;
                }
                Some(RoleTag::Down) => {
                    info!(name, "participant already down");
                    continue;
                }
                Some(_) => {}
            }
            if let Err(e) = supervisor.terminate(name, grace).await {
                warn!(name, error = %e, "failed to crash participant");
                continue;
            }
            self.roster.set(name, RoleTag::Down);
            transitioned += 1;
            info!(name, "crashed participant");
        }
        transitioned
    }

    /// Advisory quorum predicate: the external system can make progress
    /// while more than `fault_tolerance` participants are live.
    ///
    /// The harness never blocks or unblocks consensus itself; scenario
    /// authors use this to assert whether progress should be expected.
    pub fn has_quorum(&self, fault_tolerance: u32) -> bool {
        self.roster.live_count() > fault_tolerance as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_supervisor::SpawnOptions;

    fn members(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("member{i}")).collect()
    }

    fn spawn_sleepers(sup: &mut ProcessSupervisor, names: &[String]) {
        for name in names {
            sup.spawn(name, "sh", &["-c".to_owned(), "sleep 30".to_owned()], SpawnOptions::default())
                .unwrap();
        }
    }

    #[test]
    fn test_quorum_arithmetic() {
        let names = members(4);
        let mut injector = FaultInjector::new(&names);
        // n=4, f=1: quorum holds while live > 1.
        assert!(injector.has_quorum(1));

        injector.roster.set("member1", RoleTag::Down);
        injector.roster.set("member2", RoleTag::Down);
        assert!(injector.has_quorum(1));

        injector.roster.set("member3", RoleTag::Down);
        assert!(!injector.has_quorum(1));
    }

    #[test]
    fn test_declare_byzantine_sets_roster_and_args() {
        let names = members(4);
        let mut injector = FaultInjector::new(&names);
        let tag = injector.declare_byzantine("member4", "NO_MAN");
        assert_eq!(tag, "NO_MAN");
        assert_eq!(injector.behavior_of("member4"), Some("NO_MAN"));
        assert_eq!(injector.behavior_of("member1"), None);
        assert_eq!(
            injector.roster().role("member4"),
            Some(&RoleTag::Byzantine("NO_MAN".to_owned()))
        );
    }

    #[tokio::test]
    async fn test_crash_transitions_live_participants() {
        let names = members(3);
        let mut sup = ProcessSupervisor::new();
        spawn_sleepers(&mut sup, &names);
        let mut injector = FaultInjector::new(&names);

        let grace = Duration::from_millis(50);
        let crashed = injector
            .crash(&mut sup, &["member1".to_owned(), "member2".to_owned()], grace)
            .await;
        assert_eq!(crashed, 2);
        assert_eq!(injector.roster().live_count(), 1);
        assert!(!sup.is_alive("member1"));
        assert!(!sup.is_alive("member2"));
        assert!(sup.is_alive("member3"));

        // Crashing the same participant again is a no-op.
        let again = injector.crash(&mut sup, &["member1".to_owned()], grace).await;
        assert_eq!(again, 0);

        sup.terminate_all(grace).await;
    }

    #[tokio::test]
    async fn test_crash_unknown_participant_is_skipped() {
        let names = members(2);
        let mut sup = ProcessSupervisor::new();
        spawn_sleepers(&mut sup, &names);
        let mut injector = FaultInjector::new(&names);

        let crashed = injector
            .crash(&mut sup, &["nobody".to_owned()], Duration::from_millis(50))
            .await;
        assert_eq!(crashed, 0);
        assert_eq!(injector.roster().live_count(), 2);

        sup.terminate_all(Duration::from_millis(50)).await;
    }
}

use super::error::{StateError, StateResult};
use super::{TrackerEvent, TrackerState};

/// Lifecycle of the tracker. The tracker consults it before touching its
/// store, so it is the only record of whether the history is live.
#[derive(Debug, Default)]
pub struct StateMachine {
    state: TrackerState,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == TrackerState::Active
    }

    fn next_state(&self, event: TrackerEvent) -> Option<TrackerState> {
        match (self.state, event) {
            (TrackerState::Uninitialized, TrackerEvent::Init) => Some(TrackerState::Active),
            (TrackerState::Active, TrackerEvent::Exit) => Some(TrackerState::Uninitialized),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: TrackerEvent) -> StateResult<TrackerState> {
        tracing::debug!(from = ?self.state, event = ?event, "request tracker transition");
        let next = self.next_state(event).ok_or_else(|| {
            let from = self.state;
            tracing::warn!(from = ?from, event = ?event, "invalid tracker transition requested");
            StateError::InvalidStateTransition { from, event }
        })?;

        self.state = next;
        Ok(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_and_exit_cycle_between_states() {
        let mut machine = StateMachine::new();
        assert_eq!(machine.state(), TrackerState::Uninitialized);

        let state = machine.transition(TrackerEvent::Init).expect("init should work");
        assert_eq!(state, TrackerState::Active);
        assert!(machine.is_active());

        let state = machine.transition(TrackerEvent::Exit).expect("exit should work");
        assert_eq!(state, TrackerState::Uninitialized);
        assert!(!machine.is_active());

        machine
            .transition(TrackerEvent::Init)
            .expect("re-init after exit should work");
        assert!(machine.is_active());
    }

    #[test]
    fn double_init_is_rejected_without_changing_state() {
        let mut machine = StateMachine::new();
        machine.transition(TrackerEvent::Init).expect("init should work");

        let err = machine
            .transition(TrackerEvent::Init)
            .expect_err("active -> init should fail");
        assert!(matches!(
            err,
            StateError::InvalidStateTransition {
                from: TrackerState::Active,
                event: TrackerEvent::Init
            }
        ));
        assert!(machine.is_active());
    }

    #[test]
    fn exit_before_init_is_rejected() {
        let mut machine = StateMachine::new();
        let err = machine
            .transition(TrackerEvent::Exit)
            .expect_err("uninitialized -> exit should fail");
        assert!(matches!(
            err,
            StateError::InvalidStateTransition {
                from: TrackerState::Uninitialized,
                event: TrackerEvent::Exit
            }
        ));
        assert_eq!(machine.state(), TrackerState::Uninitialized);
    }
}

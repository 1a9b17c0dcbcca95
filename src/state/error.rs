use super::event::TrackerEvent;
use super::model::TrackerState;
use thiserror::Error;

pub type StateResult<T> = std::result::Result<T, StateError>;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("invalid tracker transition: from {from:?} using event {event:?}")]
    InvalidStateTransition {
        from: TrackerState,
        event: TrackerEvent,
    },
}

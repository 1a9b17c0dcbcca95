#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerEvent {
    Init,
    Exit,
}

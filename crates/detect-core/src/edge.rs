//! Transition-edge tracking for a single scan direction.
//!
//! A scan task walks its samples in order and feeds each match/no-match
//! result into an [`EdgeTracker`]. The returned [`EdgeEvent`] tells the
//! task whether to open a new run, extend the current one, or do nothing.

/// Whether the previous sample was inside a present run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeState {
    #[default]
    Outside,
    Inside,
}

/// Transition caused by one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeEvent {
    /// Outside → Inside: a new run starts at this sample.
    Opened,
    /// Inside → Inside: the current run grows to this sample.
    Extended,
    /// Inside → Outside: the current run stopped at the previous sample.
    Closed,
    /// Outside → Outside.
    Stayed,
}

/// Two-state machine over successive samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeTracker {
    state: EdgeState,
}

impl EdgeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EdgeState {
        self.state
    }

    /// Feed one sample's result and advance.
    pub fn observe(&mut self, present: bool) -> EdgeEvent {
        let (next, event) = match (self.state, present) {
            (EdgeState::Outside, true) => (EdgeState::Inside, EdgeEvent::Opened),
            (EdgeState::Inside, true) => (EdgeState::Inside, EdgeEvent::Extended),
            (EdgeState::Inside, false) => (EdgeState::Outside, EdgeEvent::Closed),
            (EdgeState::Outside, false) => (EdgeState::Outside, EdgeEvent::Stayed),
        };
        self.state = next;
        event
    }
}

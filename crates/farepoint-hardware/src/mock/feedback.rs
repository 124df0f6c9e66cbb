//! Mock feedback sink that records everything it is asked to do.

use super::lock;
use crate::traits::FeedbackSink;
use crate::types::{Indicator, Line, SoundPattern};
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// One call made on the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FeedbackEvent {
    Show { line: Line, text: String },
    Clear,
    Indicator { indicator: Indicator, on: bool },
    Sound(SoundPattern),
}

#[derive(Debug, Default)]
struct FeedbackState {
    lines: [String; 2],
    lit: [bool; 3],
    events: Vec<FeedbackEvent>,
}

/// Recording feedback sink.
///
/// # Examples
///
/// ```
/// use farepoint_hardware::{FeedbackSink, Line};
/// use farepoint_hardware::mock::MockFeedback;
///
/// let (mut sink, handle) = MockFeedback::new();
/// sink.show(Line::Top, "scan here");
/// assert_eq!(handle.line(Line::Top), "scan here");
/// ```
#[derive(Debug, Clone)]
pub struct MockFeedback {
    state: Arc<Mutex<FeedbackState>>,
}

/// Handle for inspecting a [`MockFeedback`].
#[derive(Debug, Clone)]
pub struct MockFeedbackHandle {
    state: Arc<Mutex<FeedbackState>>,
}

impl MockFeedback {
    pub fn new() -> (Self, MockFeedbackHandle) {
        let state = Arc::new(Mutex::new(FeedbackState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockFeedbackHandle { state },
        )
    }
}

impl FeedbackSink for MockFeedback {
    fn show(&mut self, line: Line, text: &str) {
        let mut state = lock(&self.state);
        state.lines[line.index()] = text.to_string();
        state.events.push(FeedbackEvent::Show {
            line,
            text: text.to_string(),
        });
    }

    fn clear(&mut self) {
        let mut state = lock(&self.state);
        state.lines = Default::default();
        state.events.push(FeedbackEvent::Clear);
    }

    fn set_indicator(&mut self, indicator: Indicator, on: bool) {
        let mut state = lock(&self.state);
        state.lit[indicator_slot(indicator)] = on;
        state.events.push(FeedbackEvent::Indicator { indicator, on });
    }

    fn sound(&mut self, pattern: SoundPattern) {
        lock(&self.state).events.push(FeedbackEvent::Sound(pattern));
    }
}

impl MockFeedbackHandle {
    /// Current text of a display line.
    pub fn line(&self, line: Line) -> String {
        lock(&self.state).lines[line.index()].clone()
    }

    /// Both display lines, top first.
    pub fn lines(&self) -> [String; 2] {
        lock(&self.state).lines.clone()
    }

    pub fn is_lit(&self, indicator: Indicator) -> bool {
        lock(&self.state).lit[indicator_slot(indicator)]
    }

    /// Indicators currently on.
    pub fn lit(&self) -> Vec<Indicator> {
        let state = lock(&self.state);
        Indicator::ALL
            .into_iter()
            .filter(|indicator| state.lit[indicator_slot(*indicator)])
            .collect()
    }

    /// Patterns played so far, oldest first.
    pub fn sounds(&self) -> Vec<SoundPattern> {
        lock(&self.state)
            .events
            .iter()
            .filter_map(|event| match event {
                FeedbackEvent::Sound(pattern) => Some(*pattern),
                _ => None,
            })
            .collect()
    }

    /// Every recorded call, oldest first.
    pub fn events(&self) -> Vec<FeedbackEvent> {
        lock(&self.state).events.clone()
    }

    /// Return the recorded calls and forget them.
    pub fn take_events(&self) -> Vec<FeedbackEvent> {
        std::mem::take(&mut lock(&self.state).events)
    }
}

fn indicator_slot(indicator: Indicator) -> usize {
    match indicator {
        Indicator::Red => 0,
        Indicator::Yellow => 1,
        Indicator::Green => 2,
    }
}

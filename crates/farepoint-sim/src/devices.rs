//! Peripherals of the simulated terminal.

use farepoint_hardware::mock::{MockFeedback, MockFeedbackHandle};
use farepoint_hardware::{Delay, FeedbackSink, Indicator, Line, SoundPattern};
use std::thread;
use std::time::Duration;
use tracing::info;

/// Feedback sink that logs what a customer would see and hear, and records
/// it for the transcript.
pub struct ConsoleFeedback {
    recorder: MockFeedback,
}

impl ConsoleFeedback {
    pub fn new() -> (Self, MockFeedbackHandle) {
        let (recorder, handle) = MockFeedback::new();
        (Self { recorder }, handle)
    }
}

impl FeedbackSink for ConsoleFeedback {
    fn show(&mut self, line: Line, text: &str) {
        info!(target: "display", ?line, text, "Display");
        self.recorder.show(line, text);
    }

    fn clear(&mut self) {
        info!(target: "display", "Display cleared");
        self.recorder.clear();
    }

    fn set_indicator(&mut self, indicator: Indicator, on: bool) {
        if on {
            info!(target: "display", %indicator, "Indicator on");
        }
        self.recorder.set_indicator(indicator, on);
    }

    fn sound(&mut self, pattern: SoundPattern) {
        info!(target: "display", ?pattern, duration_ms = pattern.duration_ms(), "Buzzer");
        self.recorder.sound(pattern);
    }
}

/// Delay backed by the OS scheduler.
#[derive(Debug, Clone, Copy, Default)]
pub struct SleepDelay;

impl Delay for SleepDelay {
    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

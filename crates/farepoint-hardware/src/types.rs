//! Feedback vocabulary shared by the terminal and sink implementations.

use farepoint_core::Outcome;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A line of the two-line display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Line {
    Top,
    Bottom,
}

impl Line {
    pub const ALL: [Line; 2] = [Line::Top, Line::Bottom];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Line::Top => 0,
            Line::Bottom => 1,
        }
    }
}

/// Indicator LEDs on the terminal front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Indicator {
    Red,
    Yellow,
    Green,
}

impl Indicator {
    pub const ALL: [Indicator; 3] = [Indicator::Red, Indicator::Yellow, Indicator::Green];
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Indicator::Red => write!(f, "red"),
            Indicator::Yellow => write!(f, "yellow"),
            Indicator::Green => write!(f, "green"),
        }
    }
}

/// One step of a buzzer pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundStep {
    /// Buzzer on for the given milliseconds.
    Tone(u32),
    /// Buzzer off for the given milliseconds.
    Pause(u32),
}

/// Buzzer patterns played when a result arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundPattern {
    SingleBeep,
    DoubleBeep,
    LongBeep,
}

const SINGLE_BEEP: [SoundStep; 1] = [SoundStep::Tone(100)];
const DOUBLE_BEEP: [SoundStep; 3] = [
    SoundStep::Tone(100),
    SoundStep::Pause(50),
    SoundStep::Tone(100),
];
const LONG_BEEP: [SoundStep; 1] = [SoundStep::Tone(255)];

impl SoundPattern {
    /// Pattern announcing an outcome: one beep for check-in, two for
    /// check-out and a long one for everything else.
    ///
    /// # Examples
    ///
    /// ```
    /// use farepoint_core::Outcome;
    /// use farepoint_hardware::SoundPattern;
    ///
    /// assert_eq!(SoundPattern::for_outcome(Outcome::CheckedOut), SoundPattern::DoubleBeep);
    /// assert_eq!(SoundPattern::for_outcome(Outcome::InvalidCard), SoundPattern::LongBeep);
    /// ```
    pub fn for_outcome(outcome: Outcome) -> Self {
        match outcome {
            Outcome::CheckedIn => SoundPattern::SingleBeep,
            Outcome::CheckedOut => SoundPattern::DoubleBeep,
            _ => SoundPattern::LongBeep,
        }
    }

    /// Timing of the pattern, for sinks that drive a plain on/off buzzer.
    pub fn steps(self) -> &'static [SoundStep] {
        match self {
            SoundPattern::SingleBeep => &SINGLE_BEEP,
            SoundPattern::DoubleBeep => &DOUBLE_BEEP,
            SoundPattern::LongBeep => &LONG_BEEP,
        }
    }

    /// Total duration in milliseconds.
    pub fn duration_ms(self) -> u32 {
        self.steps()
            .iter()
            .map(|step| match step {
                SoundStep::Tone(ms) | SoundStep::Pause(ms) => *ms,
            })
            .sum()
    }
}

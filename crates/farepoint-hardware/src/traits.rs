//! Hardware trait definitions.
//!
//! These traits are the contract between the terminal core and its
//! peripherals. All methods are synchronous: the terminal runs a single
//! cooperative main loop and the only blocking it does is bounded polling.

use crate::types::{Indicator, Line, SoundPattern};

/// Byte-level link to the card reader.
///
/// The reader is a polled half-duplex peripheral. The terminal clocks a byte
/// out and gets a byte back on every transfer; two input lines tell it
/// whether a card is in the field and whether the reader has data pending.
pub trait ReaderBus {
    /// Level of the card-present line.
    fn card_present(&mut self) -> bool;

    /// Level of the data-ready line.
    fn data_ready(&mut self) -> bool;

    /// Clock `byte` out and return the byte clocked in.
    fn transfer(&mut self, byte: u8) -> u8;
}

/// Display, indicators and buzzer.
pub trait FeedbackSink {
    /// Replace the contents of a display line.
    fn show(&mut self, line: Line, text: &str);

    /// Blank both display lines.
    fn clear(&mut self);

    fn set_indicator(&mut self, indicator: Indicator, on: bool);

    /// Play a buzzer pattern. May block for the pattern's duration.
    fn sound(&mut self, pattern: SoundPattern);
}

/// Liveness signal for the supervisory watchdog.
///
/// Every busy-wait kicks it on each poll. Any `FnMut()` is a watchdog, which
/// keeps tests free of hardware timers.
pub trait Watchdog {
    fn kick(&mut self);
}

impl<F: FnMut()> Watchdog for F {
    fn kick(&mut self) {
        self()
    }
}

/// Blocking delay.
pub trait Delay {
    fn delay_ms(&mut self, ms: u32);
}

impl<T: ReaderBus + ?Sized> ReaderBus for &mut T {
    fn card_present(&mut self) -> bool {
        (**self).card_present()
    }

    fn data_ready(&mut self) -> bool {
        (**self).data_ready()
    }

    fn transfer(&mut self, byte: u8) -> u8 {
        (**self).transfer(byte)
    }
}

impl<T: FeedbackSink + ?Sized> FeedbackSink for &mut T {
    fn show(&mut self, line: Line, text: &str) {
        (**self).show(line, text)
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn set_indicator(&mut self, indicator: Indicator, on: bool) {
        (**self).set_indicator(indicator, on)
    }

    fn sound(&mut self, pattern: SoundPattern) {
        (**self).sound(pattern)
    }
}

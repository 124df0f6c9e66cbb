//! Mock device implementations for testing and development.
//!
//! Each mock comes with a handle that shares its state, so a test (or the
//! simulator) can script the device while the terminal owns it.

pub mod feedback;
pub mod reader;
pub mod timing;

// Re-export commonly used types
pub use feedback::{FeedbackEvent, MockFeedback, MockFeedbackHandle};
pub use reader::{MockReaderBus, MockReaderHandle};
pub use timing::{CountingWatchdog, VirtualDelay};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock shared mock state, recovering it if a panicking test poisoned it.
fn lock<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

//! Hardware abstraction layer for the farepoint terminal.
//!
//! The terminal talks to three kinds of hardware, each behind a small trait
//! so the core logic runs unchanged against real peripherals and mocks:
//!
//! - [`ReaderBus`](traits::ReaderBus): the byte-level link to the card
//!   reader, with its card-present and data-ready lines.
//! - [`FeedbackSink`](traits::FeedbackSink): the two-line display, the three
//!   indicator LEDs and the buzzer.
//! - [`Watchdog`](traits::Watchdog) and [`Delay`](traits::Delay): liveness
//!   kicks and blocking delays used by every busy-wait.
//!
//! On top of the bus sits [`CardLink`], which implements the reader's
//! request/acknowledge protocol.
//!
//! # Design
//!
//! - **Synchronous**: the terminal is a single cooperative main loop, so
//!   every operation is a plain blocking call.
//! - **Bounded**: every wait polls a limited number of times and kicks the
//!   watchdog on each poll (see [`busy_wait`]).
//! - **Allocation-free**: the link assembles identifiers in fixed arrays.
//!
//! # Example
//!
//! ```
//! use farepoint_core::CardId;
//! use farepoint_hardware::CardLink;
//! use farepoint_hardware::mock::MockReaderBus;
//!
//! let (bus, handle) = MockReaderBus::new();
//! let id = CardId::new([1, 2, 3, 4, 5, 6, 7, 8]);
//! handle.present_card(id);
//!
//! let mut link = CardLink::new(bus);
//! let mut kicks = 0;
//! let mut watchdog = || kicks += 1;
//! assert!(link.is_card_present());
//! assert_eq!(link.read_identifier(&mut watchdog).unwrap(), id);
//! ```

pub mod busy_wait;
pub mod card_link;
pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

pub use card_link::{CardLink, LinkLimits};
pub use error::{PollTimeout, ReadError};
pub use traits::{Delay, FeedbackSink, ReaderBus, Watchdog};
pub use types::{Indicator, Line, SoundPattern, SoundStep};

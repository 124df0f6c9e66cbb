//! Terminal state machine.
//!
//! The main loop calls [`Terminal::step`] forever. Each step kicks the
//! watchdog, runs the entry action of a freshly entered state (exactly once
//! per transition, including transitions forced from interrupt context) and
//! then one iteration of the current state's work.
//!
//! # States
//!
//! - `Starting`: show "starting", settle, then Idle.
//! - `Idle`: show "scan here"; a card in the field moves to Scanning, once
//!   the field has been seen empty since Idle was entered. A card left on
//!   the reader across a reconnect is never submitted twice.
//! - `Scanning`: read the card id and submit it to the host. A failed read
//!   goes straight to Info with InvalidCard.
//! - `Processing`: wait for the host's response, bounded by
//!   `processing_timeout_polls` iterations; a timeout becomes GenericError.
//! - `Info`: show the outcome until the card is withdrawn, then settle and
//!   return to Idle.
//! - `NoConnection`: show "out of order" until the host is heard again.
//!
//! The keep-alive monitor may force NoConnection at any time and moves back
//! to Starting on the next keep-alive. The main loop only ever advances with
//! a compare-and-set on the state it believes it is in, so a forced state
//! always wins.
//!
//! # Examples
//!
//! ```
//! use farepoint_core::TerminalState;
//! use farepoint_hardware::mock::{MockFeedback, MockReaderBus, VirtualDelay};
//! use farepoint_terminal::{HostChannel, KeepAliveMonitor, SharedState, Terminal};
//!
//! let shared = SharedState::new();
//! let channel = HostChannel::new(&shared, KeepAliveMonitor::new(&shared), 1);
//! let (bus, _reader) = MockReaderBus::new();
//! let (feedback, _display) = MockFeedback::new();
//!
//! let mut terminal = Terminal::builder(&shared, &channel)
//!     .build(bus, feedback, || {}, VirtualDelay::new());
//!
//! terminal.step();
//! terminal.step();
//! assert_eq!(terminal.state(), TerminalState::Idle);
//! ```

use crate::display::{Renderer, Screen};
use crate::host_channel::HostChannel;
use crate::shared::SharedState;
use farepoint_core::{CardId, HostResponse, Outcome, TerminalConfig, TerminalState};
use farepoint_hardware::busy_wait::settle;
use farepoint_hardware::{
    CardLink, Delay, FeedbackSink, Indicator, Line, LinkLimits, ReaderBus, SoundPattern, Watchdog,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info, trace, warn};

/// Transitions kept in the history by default.
pub const DEFAULT_HISTORY_CAPACITY: usize = 32;

/// The customer interaction in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transaction {
    /// Identifier read during Scanning. Empty until then.
    pub card_id: CardId,
    /// Outcome to show in Info.
    pub response: Option<HostResponse>,
}

impl Transaction {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// An observed change of state.
///
/// `step` is the main-loop iteration on which the entry action ran. When an
/// interrupt moves the terminal twice between iterations only the second
/// state is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: TerminalState,
    pub to: TerminalState,
    pub step: u64,
}

/// The main loop's view of the current state, with per-state data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Starting,
    /// `field_cleared` is set once the reader has been seen empty.
    Idle { field_cleared: bool },
    Scanning,
    Processing { polls: u32 },
    Info,
    NoConnection,
}

impl Stage {
    fn entering(state: TerminalState) -> Self {
        match state {
            TerminalState::Starting => Stage::Starting,
            TerminalState::Idle => Stage::Idle {
                field_cleared: false,
            },
            TerminalState::Scanning => Stage::Scanning,
            TerminalState::Processing => Stage::Processing { polls: 0 },
            TerminalState::Info => Stage::Info,
            TerminalState::NoConnection => Stage::NoConnection,
        }
    }

    fn state(self) -> TerminalState {
        match self {
            Stage::Starting => TerminalState::Starting,
            Stage::Idle { .. } => TerminalState::Idle,
            Stage::Scanning => TerminalState::Scanning,
            Stage::Processing { .. } => TerminalState::Processing,
            Stage::Info => TerminalState::Info,
            Stage::NoConnection => TerminalState::NoConnection,
        }
    }
}

/// Builder for [`Terminal`].
pub struct TerminalBuilder<'a> {
    shared: &'a SharedState,
    channel: &'a HostChannel<'a>,
    config: TerminalConfig,
    history_capacity: usize,
}

impl<'a> TerminalBuilder<'a> {
    pub fn with_config(mut self, config: TerminalConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Attach the peripherals and build the terminal.
    ///
    /// The reader link takes its poll bounds from the configured timing.
    pub fn build<B, F, W, D>(
        self,
        bus: B,
        feedback: F,
        watchdog: W,
        delay: D,
    ) -> Terminal<'a, B, F, W, D>
    where
        B: ReaderBus,
        F: FeedbackSink,
        W: Watchdog,
        D: Delay,
    {
        let limits = LinkLimits::from(&self.config.timing);
        let entered = self.shared.state();
        Terminal {
            shared: self.shared,
            channel: self.channel,
            link: CardLink::with_limits(bus, limits),
            feedback,
            watchdog,
            delay,
            config: self.config,
            transaction: Transaction::default(),
            stage: Stage::entering(entered),
            last_entered: None,
            history: VecDeque::with_capacity(self.history_capacity),
            history_capacity: self.history_capacity,
            steps: 0,
        }
    }
}

/// The terminal's main-loop logic, bound to its peripherals.
pub struct Terminal<'a, B, F, W, D> {
    shared: &'a SharedState,
    channel: &'a HostChannel<'a>,
    link: CardLink<B>,
    feedback: F,
    watchdog: W,
    delay: D,
    config: TerminalConfig,
    transaction: Transaction,
    stage: Stage,
    /// State whose entry action ran last; `None` before the first one.
    last_entered: Option<TerminalState>,
    history: VecDeque<StateTransition>,
    history_capacity: usize,
    steps: u64,
}

impl<'a> Terminal<'a, (), (), (), ()> {
    /// Start building a terminal around the interrupt-shared state and the
    /// host channel.
    pub fn builder(shared: &'a SharedState, channel: &'a HostChannel<'a>) -> TerminalBuilder<'a> {
        TerminalBuilder {
            shared,
            channel,
            config: TerminalConfig::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl<'a, B, F, W, D> Terminal<'a, B, F, W, D>
where
    B: ReaderBus,
    F: FeedbackSink,
    W: Watchdog,
    D: Delay,
{
    /// Run one main-loop iteration.
    ///
    /// Returns the state the iteration worked in.
    pub fn step(&mut self) -> TerminalState {
        self.steps += 1;
        self.watchdog.kick();

        if let Some(state) = self.shared.take_entry() {
            self.enter(state);
        }
        let worked_in = self.stage.state();
        self.run();
        worked_in
    }

    /// Step until `done` holds or `max_steps` iterations have run.
    ///
    /// Returns whether `done` was reached.
    pub fn run_until(&mut self, max_steps: u64, mut done: impl FnMut(&Self) -> bool) -> bool {
        for _ in 0..max_steps {
            if done(self) {
                return true;
            }
            self.step();
        }
        done(self)
    }

    /// Current state, as shared with the interrupt handlers.
    pub fn state(&self) -> TerminalState {
        self.shared.state()
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    /// Main-loop iterations run so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Observed transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// The last `count` transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).copied().collect()
    }

    pub fn link_mut(&mut self) -> &mut CardLink<B> {
        &mut self.link
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    fn enter(&mut self, state: TerminalState) {
        match self.last_entered.replace(state) {
            Some(from) => self.record(from, state),
            None => info!(%state, "Terminal up"),
        }
        self.stage = Stage::entering(state);

        match state {
            TerminalState::Starting => {
                self.transaction.clear();
                self.shared.close_response();
                self.announce(state, Indicator::Yellow);
            }
            TerminalState::Idle => self.announce(state, Indicator::Green),
            TerminalState::Scanning | TerminalState::Processing => {
                self.announce(state, Indicator::Yellow)
            }
            TerminalState::Info => {
                let response = self
                    .transaction
                    .response
                    .unwrap_or_else(HostResponse::generic_error);
                let screen = self.renderer().outcome_screen(&response);
                self.show(&screen);
                self.light(if response.outcome().is_success() {
                    Indicator::Green
                } else {
                    Indicator::Red
                });
            }
            TerminalState::NoConnection => self.announce(state, Indicator::Red),
        }
    }

    fn run(&mut self) {
        match self.stage {
            Stage::Starting => {
                let timing = &self.config.timing;
                let (total, step) = (timing.starting_settle_ms, timing.settle_step_ms);
                settle(&mut self.delay, &mut self.watchdog, total, step);
                self.advance(TerminalState::Starting, TerminalState::Idle);
            }
            Stage::Idle { field_cleared } => {
                if !self.link.is_card_present() {
                    self.stage = Stage::Idle {
                        field_cleared: true,
                    };
                } else if field_cleared {
                    self.advance(TerminalState::Idle, TerminalState::Scanning);
                } else {
                    trace!("Card still in the field, waiting for withdrawal");
                }
            }
            Stage::Scanning => self.scan(),
            Stage::Processing { polls } => self.await_response(polls),
            Stage::Info => {
                if self.link.is_card_present() {
                    return;
                }
                self.transaction.clear();
                let timing = &self.config.timing;
                let (total, step) = (timing.info_settle_ms, timing.settle_step_ms);
                settle(&mut self.delay, &mut self.watchdog, total, step);
                self.advance(TerminalState::Info, TerminalState::Idle);
            }
            Stage::NoConnection => {}
        }
    }

    fn scan(&mut self) {
        let card_id = match self.link.read_identifier(&mut self.watchdog) {
            Ok(card_id) => card_id,
            Err(err) => {
                debug!(error = %err, "Card rejected without host round-trip");
                self.finish(HostResponse::outcome_only(Outcome::InvalidCard), TerminalState::Scanning);
                return;
            }
        };
        self.transaction.card_id = card_id;

        // Arm before sending so the answer cannot outrun the slot.
        self.shared.arm_response();
        let limit = self.config.timing.channel_ready_poll_limit;
        match self.channel.send_blocking(card_id.as_bytes(), &mut self.watchdog, limit) {
            Ok(()) => {
                info!(%card_id, "Card submitted to host");
                self.advance(TerminalState::Scanning, TerminalState::Processing);
            }
            Err(err) => {
                warn!(error = %err, %card_id, "Card could not be submitted");
                self.shared.close_response();
                self.finish(HostResponse::generic_error(), TerminalState::Scanning);
            }
        }
    }

    fn await_response(&mut self, polls: u32) {
        if let Some(response) = self.shared.take_response() {
            if self.config.buzzer_enabled {
                self.feedback.sound(SoundPattern::for_outcome(response.outcome()));
            }
            self.finish(response, TerminalState::Processing);
            return;
        }

        let polls = polls + 1;
        if polls >= self.config.timing.processing_timeout_polls {
            self.shared.close_response();
            warn!(polls, card_id = %self.transaction.card_id, "No host response, giving up");
            self.finish(HostResponse::generic_error(), TerminalState::Processing);
        } else {
            self.stage = Stage::Processing { polls };
        }
    }

    /// Store the outcome and move to Info.
    fn finish(&mut self, response: HostResponse, from: TerminalState) {
        if self.advance(from, TerminalState::Info) {
            self.transaction.response = Some(response);
        }
    }

    fn advance(&mut self, from: TerminalState, to: TerminalState) -> bool {
        let moved = self.shared.advance(from, to);
        if !moved {
            debug!(%from, %to, current = %self.shared.state(), "Transition pre-empted");
        }
        moved
    }

    fn record(&mut self, from: TerminalState, to: TerminalState) {
        if from.can_transition_to(to) {
            info!(%from, %to, "State transition");
        } else {
            // Two forced moves landed between iterations.
            info!(%from, %to, "State transition (coalesced)");
        }

        if self.history_capacity == 0 {
            return;
        }
        if self.history.len() == self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(StateTransition {
            from,
            to,
            step: self.steps,
        });
    }

    fn renderer(&self) -> Renderer<'_> {
        Renderer::new(&self.config.messages, self.config.display_columns)
    }

    fn announce(&mut self, state: TerminalState, indicator: Indicator) {
        if let Some(screen) = self.renderer().state_screen(state) {
            self.show(&screen);
        }
        self.light(indicator);
    }

    fn show(&mut self, screen: &Screen) {
        self.feedback.show(Line::Top, &screen.top);
        self.feedback.show(Line::Bottom, &screen.bottom);
    }

    /// Turn on `lit` and the other indicators off.
    fn light(&mut self, lit: Indicator) {
        for indicator in Indicator::ALL {
            self.feedback.set_indicator(indicator, indicator == lit);
        }
    }
}

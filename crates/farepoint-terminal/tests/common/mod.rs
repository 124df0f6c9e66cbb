//! Test rig for driving a terminal against mock devices and a scripted host.

#![allow(dead_code)]

use farepoint_core::{CardId, HostResponse, TerminalConfig, TerminalState};
use farepoint_hardware::mock::{
    CountingWatchdog, MockFeedback, MockFeedbackHandle, MockReaderBus, MockReaderHandle,
    VirtualDelay,
};
use farepoint_protocol::{CommandCode, Payload, SetupFrame, SetupReply, encode_response};
use farepoint_terminal::state_machine::DEFAULT_HISTORY_CAPACITY;
use farepoint_terminal::{HostChannel, KeepAliveMonitor, SharedState, Terminal, TickOutcome};

pub const CARD: CardId = CardId::new([0x04, 0xA2, 0x3C, 0x11, 0x90, 0x5E, 0x07, 0xF1]);
pub const OTHER_CARD: CardId = CardId::new([9, 8, 7, 6, 5, 4, 3, 2]);
pub const DEVICE_ID: u8 = 0x2A;

/// Upper bound on iterations for any single wait in a scenario.
pub const MAX_STEPS: u64 = 1_000;

pub type MockTerminal<'a> =
    Terminal<'a, MockReaderBus, MockFeedback, CountingWatchdog, VirtualDelay>;

pub fn channel(shared: &SharedState) -> HostChannel<'_> {
    HostChannel::new(shared, KeepAliveMonitor::new(shared), DEVICE_ID)
}

pub struct Rig<'a> {
    pub terminal: MockTerminal<'a>,
    pub channel: &'a HostChannel<'a>,
    pub reader: MockReaderHandle,
    pub display: MockFeedbackHandle,
    pub watchdog: CountingWatchdog,
    pub delay: VirtualDelay,
}

impl<'a> Rig<'a> {
    pub fn new(shared: &'a SharedState, channel: &'a HostChannel<'a>) -> Self {
        Self::with_config(shared, channel, TerminalConfig::default())
    }

    pub fn with_config(
        shared: &'a SharedState,
        channel: &'a HostChannel<'a>,
        config: TerminalConfig,
    ) -> Self {
        Self::with_history(shared, channel, config, DEFAULT_HISTORY_CAPACITY)
    }

    /// Rig whose terminal keeps up to `history_capacity` transitions.
    pub fn with_history(
        shared: &'a SharedState,
        channel: &'a HostChannel<'a>,
        config: TerminalConfig,
        history_capacity: usize,
    ) -> Self {
        let (bus, reader) = MockReaderBus::new();
        let (feedback, display) = MockFeedback::new();
        let watchdog = CountingWatchdog::new();
        let delay = VirtualDelay::new();
        let terminal = Terminal::builder(shared, channel)
            .with_config(config)
            .with_history_capacity(history_capacity)
            .build(bus, feedback, watchdog.clone(), delay.clone());

        Self {
            terminal,
            channel,
            reader,
            display,
            watchdog,
            delay,
        }
    }

    /// Step until the terminal is in `state` with its entry action done.
    pub fn run_to(&mut self, state: TerminalState) {
        // One more step after reaching `state` runs its entry action.
        let reached = self.terminal.run_until(MAX_STEPS, |t| t.state() == state);
        assert!(reached, "terminal never reached {state}");
        self.terminal.step();
    }

    pub fn steps(&mut self, count: usize) {
        for _ in 0..count {
            self.terminal.step();
        }
    }

    /// Boot to Idle.
    pub fn boot(&mut self) {
        self.run_to(TerminalState::Idle);
    }

    /// Report the driver collects on the next communications poll.
    pub fn host_poll(&self) -> Option<Payload> {
        self.channel.poll()
    }

    /// Host sends a Response exchange.
    pub fn host_respond(&self, response: &HostResponse) {
        self.host_respond_raw(&encode_response(response));
    }

    pub fn host_respond_raw(&self, payload: &[u8]) {
        let frame = SetupFrame::new(CommandCode::Response, [0, 0], payload.len() as u16);
        assert_eq!(self.channel.on_command(&frame), SetupReply::AwaitPayload);
        self.channel.on_payload(payload);
    }

    pub fn host_keep_alive(&self) {
        let reply = self
            .channel
            .on_command(&SetupFrame::command_only(CommandCode::KeepAlive));
        assert_eq!(reply, SetupReply::Empty);
    }

    /// Timer interrupt fires.
    pub fn tick(&self) -> TickOutcome {
        self.channel.monitor().tick()
    }

    pub fn lines(&self) -> [String; 2] {
        self.display.lines()
    }
}

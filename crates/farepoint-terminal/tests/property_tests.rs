//! Property tests over arbitrary interleavings of main-loop steps, interrupts
//! and customer actions.

mod common;

use common::{CARD, Rig};
use farepoint_core::{HostResponse, Outcome, TerminalConfig, TerminalState};
use farepoint_hardware::Line;
use farepoint_terminal::{SharedState, truncate_text};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Event {
    Step,
    Tick,
    KeepAlive,
    Present,
    Withdraw,
    Respond(u8, u16, u16),
}

fn event() -> impl Strategy<Value = Event> {
    prop_oneof![
        6 => Just(Event::Step),
        1 => Just(Event::Tick),
        2 => Just(Event::KeepAlive),
        1 => Just(Event::Present),
        1 => Just(Event::Withdraw),
        1 => (any::<u8>(), any::<u16>(), any::<u16>()).prop_map(|(c, b, p)| Event::Respond(c, b, p)),
    ]
}

/// Outcomes whose Response carries a balance, and for check-out a price.
fn financial_outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        Just(Outcome::CheckedIn),
        Just(Outcome::CheckedOut),
        Just(Outcome::InsufficientFunds),
    ]
}

fn quick_config() -> TerminalConfig {
    let mut config = TerminalConfig::default();
    config.timing.processing_timeout_polls = 20;
    config.timing.starting_settle_ms = 0;
    config.timing.info_settle_ms = 0;
    config
}

proptest! {
    #[test]
    fn prop_no_connection_only_left_for_starting(events in prop::collection::vec(event(), 1..200)) {
        let shared = SharedState::new();
        let channel = common::channel(&shared);
        let mut rig = Rig::with_config(&shared, &channel, quick_config());

        for event in events {
            let before = shared.state();
            match event {
                Event::Step => {
                    rig.terminal.step();
                    rig.host_poll();
                }
                Event::Tick => {
                    rig.tick();
                }
                Event::KeepAlive => rig.host_keep_alive(),
                Event::Present => rig.reader.present_card(CARD),
                Event::Withdraw => rig.reader.withdraw_card(),
                Event::Respond(code, balance, price) => {
                    rig.host_respond(&HostResponse::new(Outcome::from_code(code), balance, price));
                }
            }

            let after = shared.state();
            if before == TerminalState::NoConnection {
                prop_assert!(
                    matches!(after, TerminalState::NoConnection | TerminalState::Starting),
                    "left NoConnection for {}", after
                );
            }
        }

        for transition in rig.terminal.history() {
            if transition.from == TerminalState::NoConnection {
                prop_assert!(matches!(
                    transition.to,
                    TerminalState::NoConnection | TerminalState::Starting
                ));
            }
        }
    }

    #[test]
    fn prop_amounts_rendered_exactly(
        outcome in financial_outcome(),
        balance in any::<u16>(),
        price in any::<u16>(),
    ) {
        let shared = SharedState::new();
        let channel = common::channel(&shared);
        let config = quick_config();
        let columns = config.display_columns;
        let mut rig = Rig::with_config(&shared, &channel, config);
        rig.boot();

        rig.reader.present_card(CARD);
        rig.run_to(TerminalState::Processing);
        rig.host_poll();
        rig.host_respond(&HostResponse::new(outcome, balance, price));
        rig.run_to(TerminalState::Info);

        let top = match outcome {
            Outcome::CheckedIn => "check-in".to_string(),
            Outcome::CheckedOut => format!("check-out {price}"),
            _ => "insufficient funds".to_string(),
        };
        let expected_top = truncate_text(&top, columns);
        prop_assert_eq!(rig.display.line(Line::Top), expected_top.as_str());
        prop_assert_eq!(rig.display.line(Line::Bottom), format!("balance {balance}"));
    }

    #[test]
    fn prop_undefined_outcome_renders_system_error(code in any::<u8>()) {
        prop_assume!(!(1..=8).contains(&code));

        let shared = SharedState::new();
        let channel = common::channel(&shared);
        let mut rig = Rig::with_config(&shared, &channel, quick_config());
        rig.boot();

        rig.reader.present_card(CARD);
        rig.run_to(TerminalState::Processing);
        rig.host_poll();
        rig.host_respond_raw(&[code, 0xFF, 0xFF, 0xFF, 0xFF]);
        rig.run_to(TerminalState::Info);

        prop_assert_eq!(rig.display.line(Line::Top), "system error");
        prop_assert_eq!(rig.display.line(Line::Bottom), "");
    }
}

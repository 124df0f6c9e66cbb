//! Status line rendering.
//!
//! Turns terminal states and host outcomes into the two lines the display
//! shows. Text comes from the configured [`MessageTable`]; amounts are
//! substituted into its templates. Lines are cut to the display width and
//! stripped of control characters, and they live in fixed-capacity buffers.
//!
//! | Outcome | Top line | Bottom line |
//! |---------|----------|-------------|
//! | CheckedIn | check-in | balance |
//! | CheckedOut | check-out + price | balance |
//! | InsufficientFunds | insufficient funds | balance |
//! | InvalidCard, CardNotFound | invalid card | |
//! | TooLateCheckOut | too late | fee notice |
//! | Ok | ok | |
//! | anything else | system error | |

use core::fmt::{self, Write};
use farepoint_core::config::TEMPLATE_PLACEHOLDER;
use farepoint_core::constants::MAX_DISPLAY_COLUMNS;
use farepoint_core::{HostResponse, MessageTable, Outcome, TerminalState};
use heapless::String;

/// Byte capacity of a rendered line: the widest display in UTF-8.
pub const LINE_CAPACITY: usize = MAX_DISPLAY_COLUMNS * 4;

pub type LineText = String<LINE_CAPACITY>;

/// Contents of both display lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Screen {
    pub top: LineText,
    pub bottom: LineText,
}

/// Renders screens for one message table and display width.
#[derive(Debug, Clone, Copy)]
pub struct Renderer<'a> {
    messages: &'a MessageTable,
    columns: usize,
}

impl<'a> Renderer<'a> {
    pub fn new(messages: &'a MessageTable, columns: usize) -> Self {
        Self {
            messages,
            columns: columns.clamp(1, MAX_DISPLAY_COLUMNS),
        }
    }

    /// Announcement shown on entering a state. Info has none of its own;
    /// it shows the outcome.
    pub fn state_screen(&self, state: TerminalState) -> Option<Screen> {
        let top = match state {
            TerminalState::Starting => &self.messages.starting,
            TerminalState::Idle => &self.messages.scan_here,
            TerminalState::Scanning | TerminalState::Processing => &self.messages.working,
            TerminalState::NoConnection => &self.messages.out_of_order,
            TerminalState::Info => return None,
        };
        Some(self.screen(top, ""))
    }

    /// Result screen for a host response.
    ///
    /// Amounts are only rendered for outcomes that carry them.
    ///
    /// # Examples
    ///
    /// ```
    /// use farepoint_core::{HostResponse, MessageTable, Outcome};
    /// use farepoint_terminal::display::Renderer;
    ///
    /// let messages = MessageTable::default();
    /// let renderer = Renderer::new(&messages, 16);
    /// let screen = renderer.outcome_screen(&HostResponse::new(Outcome::CheckedIn, 350, 0));
    /// assert_eq!(screen.top.as_str(), "check-in");
    /// assert_eq!(screen.bottom.as_str(), "balance 350");
    /// ```
    pub fn outcome_screen(&self, response: &HostResponse) -> Screen {
        let m = self.messages;
        let balance = response.balance().unwrap_or_default();
        let price = response.price().unwrap_or_default();

        match response.outcome() {
            Outcome::CheckedIn => Screen {
                top: self.line(&m.check_in),
                bottom: self.fill(&m.balance, balance),
            },
            Outcome::CheckedOut => Screen {
                top: self.fill(&m.check_out, price),
                bottom: self.fill(&m.balance, balance),
            },
            Outcome::InsufficientFunds => Screen {
                top: self.line(&m.insufficient_funds),
                bottom: self.fill(&m.balance, balance),
            },
            Outcome::InvalidCard | Outcome::CardNotFound => self.screen(&m.invalid_card, ""),
            Outcome::TooLateCheckOut => self.screen(&m.too_late, &m.late_fee),
            Outcome::Ok => self.screen(&m.ok, ""),
            Outcome::Error | Outcome::GenericError | Outcome::Unknown(_) => {
                self.screen(&m.system_error, "")
            }
        }
    }

    fn screen(&self, top: &str, bottom: &str) -> Screen {
        Screen {
            top: self.line(top),
            bottom: self.line(bottom),
        }
    }

    fn line(&self, text: &str) -> LineText {
        truncate_text(text, self.columns)
    }

    /// Substitute `value` for the template's placeholder.
    fn fill(&self, template: &str, value: u16) -> LineText {
        let mut writer = LineWriter::new(self.columns);
        // LineWriter never fails; overflow is truncation.
        let _ = match template.split_once(TEMPLATE_PLACEHOLDER) {
            Some((prefix, suffix)) => write!(writer, "{prefix}{value}{suffix}"),
            None => writer.write_str(template),
        };
        writer.text
    }
}

/// Cut `text` to `max_chars` characters, dropping control characters.
///
/// # Examples
///
/// ```
/// use farepoint_terminal::display::truncate_text;
///
/// assert_eq!(truncate_text("insufficient funds", 16).as_str(), "insufficient fun");
/// assert_eq!(truncate_text("ok\n", 16).as_str(), "ok");
/// ```
pub fn truncate_text(text: &str, max_chars: usize) -> LineText {
    let mut writer = LineWriter::new(max_chars);
    let _ = writer.write_str(text);
    writer.text
}

struct LineWriter {
    text: LineText,
    columns: usize,
    written: usize,
}

impl LineWriter {
    fn new(columns: usize) -> Self {
        Self {
            text: LineText::new(),
            columns: columns.min(MAX_DISPLAY_COLUMNS),
            written: 0,
        }
    }
}

impl Write for LineWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars().filter(|c| !c.is_control()) {
            if self.written == self.columns || self.text.push(c).is_err() {
                break;
            }
            self.written += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn render(response: HostResponse) -> (std::string::String, std::string::String) {
        let messages = MessageTable::default();
        let screen = Renderer::new(&messages, 16).outcome_screen(&response);
        (screen.top.as_str().into(), screen.bottom.as_str().into())
    }

    #[rstest]
    #[case(HostResponse::new(Outcome::CheckedIn, 350, 0), "check-in", "balance 350")]
    #[case(HostResponse::new(Outcome::CheckedOut, 330, 20), "check-out 20", "balance 330")]
    #[case(HostResponse::new(Outcome::InsufficientFunds, 5, 24), "insufficient fun", "balance 5")]
    #[case(HostResponse::outcome_only(Outcome::InvalidCard), "invalid card", "")]
    #[case(HostResponse::outcome_only(Outcome::CardNotFound), "invalid card", "")]
    #[case(HostResponse::outcome_only(Outcome::TooLateCheckOut), "too late", "fee 50")]
    #[case(HostResponse::outcome_only(Outcome::Ok), "ok", "")]
    #[case(HostResponse::outcome_only(Outcome::Error), "system error", "")]
    #[case(HostResponse::generic_error(), "system error", "")]
    #[case(HostResponse::outcome_only(Outcome::Unknown(0)), "system error", "")]
    #[case(HostResponse::outcome_only(Outcome::Unknown(250)), "system error", "")]
    fn test_outcome_screens(
        #[case] response: HostResponse,
        #[case] top: &str,
        #[case] bottom: &str,
    ) {
        assert_eq!(render(response), (top.to_string(), bottom.to_string()));
    }

    #[rstest]
    #[case(TerminalState::Starting, Some("starting"))]
    #[case(TerminalState::Idle, Some("scan here"))]
    #[case(TerminalState::Scanning, Some("working"))]
    #[case(TerminalState::NoConnection, Some("out of order"))]
    #[case(TerminalState::Info, None)]
    fn test_state_screens(#[case] state: TerminalState, #[case] top: Option<&str>) {
        let messages = MessageTable::default();
        let screen = Renderer::new(&messages, 16).state_screen(state);

        assert_eq!(screen.as_ref().map(|s| s.top.as_str()), top);
        if let Some(screen) = screen {
            assert!(screen.bottom.is_empty());
        }
    }

    #[test]
    fn test_danish_check_out() {
        let messages = MessageTable::danish();
        let renderer = Renderer::new(&messages, 16);
        let screen = renderer.outcome_screen(&HostResponse::new(Outcome::CheckedOut, 330, 20));

        assert_eq!(screen.top.as_str(), "Check ud  20 kr");
        assert_eq!(screen.bottom.as_str(), "Saldo 330 kr");
    }

    #[test]
    fn test_max_amount_fits() {
        let (_, bottom) = render(HostResponse::new(Outcome::CheckedIn, u16::MAX, 0));
        assert_eq!(bottom, "balance 65535");
    }

    #[test]
    fn test_template_without_placeholder() {
        let messages = MessageTable {
            balance: "thanks".into(),
            ..MessageTable::default()
        };
        let screen = Renderer::new(&messages, 16)
            .outcome_screen(&HostResponse::new(Outcome::CheckedIn, 1, 0));
        assert_eq!(screen.bottom.as_str(), "thanks");
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate_text("Æblegrød", 3).as_str(), "Æbl");
        assert_eq!(truncate_text("", 16).as_str(), "");
    }

    #[test]
    fn test_wide_display_is_capped() {
        let long = "x".repeat(100);
        assert_eq!(truncate_text(&long, 80).len(), MAX_DISPLAY_COLUMNS);
    }
}

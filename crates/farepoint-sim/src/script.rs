//! Timed script of customer and host actions.
//!
//! A script is a JSON array of entries, each with a time offset and an
//! action:
//!
//! ```json
//! [
//!   { "at_ms": 2000, "action": "present", "card": [4, 162, 60, 17, 144, 94, 7, 241] },
//!   { "at_ms": 4000, "action": "withdraw" },
//!   { "at_ms": 5000, "action": "answer", "outcome": 7, "balance": 330, "price": 20 },
//!   { "at_ms": 9000, "action": "silence" }
//! ]
//! ```

use crate::host::HostModel;
use anyhow::{Context, Result};
use farepoint_core::{CardId, HostResponse, Outcome};
use farepoint_hardware::mock::MockReaderHandle;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Hold a card in the reader field.
    Present { card: [u8; 8] },
    Withdraw,
    /// Host answers later card reports with this decision.
    Answer {
        outcome: u8,
        #[serde(default)]
        balance: u16,
        #[serde(default)]
        price: u16,
    },
    /// Host stops answering card reports.
    Ignore,
    /// Host stops sending keep-alives.
    Silence,
    /// Host sends keep-alives again.
    Resume,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptEntry {
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    entries: Vec<ScriptEntry>,
}

impl Script {
    /// Build a script; entries are ordered by time.
    pub fn new(mut entries: Vec<ScriptEntry>) -> Self {
        entries.sort_by_key(|entry| entry.at_ms);
        Self { entries }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: Vec<ScriptEntry> = serde_json::from_str(json).context("invalid script")?;
        Ok(Self::new(entries))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Check-in, check-out, a rejected card and a host outage.
    pub fn demo() -> Self {
        const CARD: [u8; 8] = [0x04, 0xA2, 0x3C, 0x11, 0x90, 0x5E, 0x07, 0xF1];
        let at = |at_ms, action| ScriptEntry { at_ms, action };

        Self::new(vec![
            at(2_000, Action::Present { card: CARD }),
            at(3_000, Action::Withdraw),
            at(
                5_000,
                Action::Answer {
                    outcome: Outcome::CheckedOut.code(),
                    balance: 330,
                    price: 20,
                },
            ),
            at(5_500, Action::Present { card: CARD }),
            at(6_500, Action::Withdraw),
            at(
                7_000,
                Action::Answer {
                    outcome: Outcome::InvalidCard.code(),
                    balance: 0,
                    price: 0,
                },
            ),
            at(8_500, Action::Present { card: [0xFF; 8] }),
            at(9_500, Action::Withdraw),
            at(10_000, Action::Silence),
            at(13_000, Action::Resume),
        ])
    }

    pub fn entries(&self) -> &[ScriptEntry] {
        &self.entries
    }

    /// Time of the last entry.
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.entries.last().map_or(0, |entry| entry.at_ms))
    }
}

/// Play the script against the reader and the host.
pub async fn run(script: Script, reader: MockReaderHandle, host: &'static HostModel) {
    let start = Instant::now();
    for entry in script.entries {
        sleep_until(start + Duration::from_millis(entry.at_ms)).await;
        info!(at_ms = entry.at_ms, action = ?entry.action, "Script");
        apply(&entry.action, &reader, host);
    }
}

fn apply(action: &Action, reader: &MockReaderHandle, host: &HostModel) {
    match *action {
        Action::Present { card } => reader.present_card(CardId::new(card)),
        Action::Withdraw => reader.withdraw_card(),
        Action::Answer {
            outcome,
            balance,
            price,
        } => host.answer_with(HostResponse::new(Outcome::from_code(outcome), balance, price)),
        Action::Ignore => host.ignore_cards(),
        Action::Silence => host.set_silent(true),
        Action::Resume => host.set_silent(false),
    }
}

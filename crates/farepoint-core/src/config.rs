//! Deployment configuration for a terminal.
//!
//! Everything a site may want to tune lives here: the device identifier the
//! host sees, whether the buzzer is used, the display width, timing bounds
//! and the customer-facing message table. Configuration is plain serde data,
//! so a deployment can ship it as JSON:
//!
//! ```
//! use farepoint_core::TerminalConfig;
//!
//! let config = TerminalConfig::from_json_str(r#"{ "device_id": 7, "buzzer_enabled": false }"#)?;
//! assert_eq!(config.device_id, 7);
//! assert_eq!(config.display_columns, 16);
//! # Ok::<(), farepoint_core::Error>(())
//! ```

use crate::constants::*;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Placeholder substituted with a number in message templates.
pub const TEMPLATE_PLACEHOLDER: &str = "{}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Byte answered to the Identify command.
    pub device_id: u8,
    /// When false, outcomes are shown without sound.
    pub buzzer_enabled: bool,
    /// Characters per display line.
    pub display_columns: usize,
    pub timing: TimingConfig,
    pub messages: MessageTable,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            device_id: DEFAULT_DEVICE_ID,
            buzzer_enabled: true,
            display_columns: DEFAULT_DISPLAY_COLUMNS,
            timing: TimingConfig::default(),
            messages: MessageTable::default(),
        }
    }
}

impl TerminalConfig {
    /// Parse and validate a JSON document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigParse` for malformed JSON and `Error::Config`
    /// when a value is out of range.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: TerminalConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read, otherwise the errors
    /// of [`TerminalConfig::from_json_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_DISPLAY_COLUMNS).contains(&self.display_columns) {
            return Err(Error::config(format!(
                "display_columns must be 1-{MAX_DISPLAY_COLUMNS}, got {}",
                self.display_columns
            )));
        }
        self.timing.validate()?;
        self.messages.validate()
    }
}

/// Timing bounds of the main loop, the interrupts and the busy-waits.
///
/// `processing_timeout_polls` counts main-loop iterations while
/// `keep_alive_window_ticks` counts timer ticks. Retuning one for a faster
/// clock means retuning the other in the same ratio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub starting_settle_ms: u32,
    pub info_settle_ms: u32,
    pub settle_step_ms: u32,
    pub processing_timeout_polls: u32,
    pub keep_alive_window_ticks: u16,
    pub keep_alive_tick_ms: u64,
    pub host_poll_interval_ms: u64,
    pub reader_ready_poll_limit: u32,
    pub reader_drain_limit: u32,
    pub channel_ready_poll_limit: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            starting_settle_ms: DEFAULT_STARTING_SETTLE_MS,
            info_settle_ms: DEFAULT_INFO_SETTLE_MS,
            settle_step_ms: DEFAULT_SETTLE_STEP_MS,
            processing_timeout_polls: DEFAULT_PROCESSING_TIMEOUT_POLLS,
            keep_alive_window_ticks: DEFAULT_KEEP_ALIVE_WINDOW_TICKS,
            keep_alive_tick_ms: DEFAULT_KEEP_ALIVE_TICK_MS,
            host_poll_interval_ms: DEFAULT_HOST_POLL_INTERVAL_MS,
            reader_ready_poll_limit: DEFAULT_READER_READY_POLL_LIMIT,
            reader_drain_limit: DEFAULT_READER_DRAIN_LIMIT,
            channel_ready_poll_limit: DEFAULT_CHANNEL_READY_POLL_LIMIT,
        }
    }
}

impl TimingConfig {
    fn validate(&self) -> Result<()> {
        let nonzero = [
            ("settle_step_ms", u64::from(self.settle_step_ms)),
            ("processing_timeout_polls", u64::from(self.processing_timeout_polls)),
            ("keep_alive_window_ticks", u64::from(self.keep_alive_window_ticks)),
            ("keep_alive_tick_ms", self.keep_alive_tick_ms),
            ("host_poll_interval_ms", self.host_poll_interval_ms),
            ("reader_ready_poll_limit", u64::from(self.reader_ready_poll_limit)),
            ("reader_drain_limit", u64::from(self.reader_drain_limit)),
            ("channel_ready_poll_limit", u64::from(self.channel_ready_poll_limit)),
        ];

        match nonzero.iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(Error::config(format!("{name} must be greater than 0"))),
            None => Ok(()),
        }
    }
}

/// Customer-facing strings.
///
/// `check_out` and `balance` are templates: a single `{}` is replaced by the
/// amount. The default table is English; [`MessageTable::danish`] carries the
/// strings of the first deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageTable {
    pub starting: String,
    pub scan_here: String,
    pub working: String,
    pub check_in: String,
    pub check_out: String,
    pub balance: String,
    pub insufficient_funds: String,
    pub invalid_card: String,
    pub too_late: String,
    pub late_fee: String,
    pub ok: String,
    pub system_error: String,
    pub out_of_order: String,
}

impl Default for MessageTable {
    fn default() -> Self {
        Self {
            starting: "starting".into(),
            scan_here: "scan here".into(),
            working: "working".into(),
            check_in: "check-in".into(),
            check_out: "check-out {}".into(),
            balance: "balance {}".into(),
            insufficient_funds: "insufficient funds".into(),
            invalid_card: "invalid card".into(),
            too_late: "too late".into(),
            late_fee: "fee 50".into(),
            ok: "ok".into(),
            system_error: "system error".into(),
            out_of_order: "out of order".into(),
        }
    }
}

impl MessageTable {
    #[must_use]
    pub fn danish() -> Self {
        Self {
            starting: "Starter...".into(),
            scan_here: "Scan her!".into(),
            working: "Arbejder...".into(),
            check_in: "Check ind".into(),
            check_out: "Check ud  {} kr".into(),
            balance: "Saldo {} kr".into(),
            insufficient_funds: "Saldo for lav".into(),
            invalid_card: "Ugyldigt kort".into(),
            too_late: "For sent checkud".into(),
            late_fee: "Gebyr      50 kr".into(),
            ok: "OK".into(),
            system_error: "SYSTEMFEJL".into(),
            out_of_order: "Ude af drift".into(),
        }
    }

    fn validate(&self) -> Result<()> {
        for (name, template) in [("check_out", &self.check_out), ("balance", &self.balance)] {
            if template.matches(TEMPLATE_PLACEHOLDER).count() > 1 {
                return Err(Error::config(format!(
                    "{name} template may contain at most one placeholder"
                )));
            }
        }
        Ok(())
    }
}

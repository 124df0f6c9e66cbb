//! Bounded busy-waits.
//!
//! Nothing in the terminal blocks without a bound. Each helper kicks the
//! watchdog once per poll or step, so a healthy wait never trips it and a
//! wedged one is cut short either by the bound or by the watchdog itself.

use crate::error::PollTimeout;
use crate::traits::{Delay, Watchdog};

/// Poll `ready` until it returns `true`, at most `limit` times.
///
/// Returns the number of failed polls before success.
///
/// # Errors
///
/// Returns [`PollTimeout`] if `ready` never held.
///
/// # Examples
///
/// ```
/// use farepoint_hardware::busy_wait::poll_until;
///
/// let mut remaining = 3;
/// let mut watchdog = || {};
/// let polls = poll_until(&mut watchdog, 10, || {
///     remaining -= 1;
///     remaining == 0
/// });
/// assert_eq!(polls, Ok(2));
/// ```
pub fn poll_until<W, F>(watchdog: &mut W, limit: u32, mut ready: F) -> Result<u32, PollTimeout>
where
    W: Watchdog + ?Sized,
    F: FnMut() -> bool,
{
    for poll in 0..limit {
        if ready() {
            return Ok(poll);
        }
        watchdog.kick();
    }
    Err(PollTimeout { polls: limit })
}

/// Hold for `total_ms`, in steps of `step_ms`, kicking the watchdog before
/// every step.
pub fn settle<D, W>(delay: &mut D, watchdog: &mut W, total_ms: u32, step_ms: u32)
where
    D: Delay + ?Sized,
    W: Watchdog + ?Sized,
{
    let step_ms = step_ms.max(1);
    let mut remaining = total_ms;
    while remaining > 0 {
        let step = remaining.min(step_ms);
        watchdog.kick();
        delay.delay_ms(step);
        remaining -= step;
    }
}

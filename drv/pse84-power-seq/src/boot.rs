// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Starting the CM55 and waiting for it.
//!
//! The CM33 must not switch clocks or domains out from under the CM55 while
//! the CM55 is still setting itself up. There is no hardware acknowledgement
//! for that, so one of two barriers is used:
//!
//! - [`SyncMode::Handshake`]: the CM55 raises a ready flag in shared RAM
//!   once its setup is done and the CM33 polls for it, giving up fatally
//!   after a timeout.
//! - [`SyncMode::Settle`]: the CM33 just waits a fixed time and assumes the
//!   CM55 got there. Kept for comparing current numbers against the vendor
//!   reference firmware, which works this way.

use ringbuf::{ringbuf, ringbuf_entry};
use static_assertions::const_assert;

use crate::hw::{Cores, Cpu};
use crate::Fault;

/// How long `enable_secondary` waits for the CM55 to leave reset.
pub const SECONDARY_BOOT_WAIT_US: u32 = 10;

/// Fixed delay of [`SyncMode::Settle`].
pub const SETTLE_US: u32 = 300_000;

pub const HANDSHAKE_TIMEOUT_US: u32 = 500_000;
pub const HANDSHAKE_POLL_US: u32 = 100;

const_assert!(HANDSHAKE_POLL_US < HANDSHAKE_TIMEOUT_US);
// A handshake must allow at least as long as the old fixed barrier did.
const_assert!(HANDSHAKE_TIMEOUT_US >= SETTLE_US);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SyncMode {
    Settle { delay_us: u32 },
    Handshake { timeout_us: u32, poll_us: u32 },
}

impl SyncMode {
    pub const SETTLE: SyncMode = SyncMode::Settle {
        delay_us: SETTLE_US,
    };

    pub const HANDSHAKE: SyncMode = SyncMode::Handshake {
        timeout_us: HANDSHAKE_TIMEOUT_US,
        poll_us: HANDSHAKE_POLL_US,
    };
}

#[derive(Copy, Clone, PartialEq)]
enum Trace {
    None,
    Enable(u32),
    Settled(u32),
    Ready { waited_us: u32 },
    Timeout,
    Signalled,
}

ringbuf!(Trace, 8, Trace::None);

/// Starts the CM55 at `boot_address` and returns once it is safe to touch
/// shared clocks and domains.
pub fn boot_secondary<H: Cores + Cpu>(
    hw: &mut H,
    boot_address: u32,
    sync: &SyncMode,
) -> Result<(), Fault> {
    // A flag left over from before a reset must not count.
    if matches!(sync, SyncMode::Handshake { .. }) {
        hw.set_ready_flag(false);
    }

    ringbuf_entry!(Trace::Enable(boot_address));
    hw.enable_secondary(boot_address, SECONDARY_BOOT_WAIT_US);

    match *sync {
        SyncMode::Settle { delay_us } => {
            hw.delay_us(delay_us);
            ringbuf_entry!(Trace::Settled(delay_us));
            Ok(())
        }
        SyncMode::Handshake {
            timeout_us,
            poll_us,
        } => wait_ready(hw, timeout_us, poll_us),
    }
}

fn wait_ready<H: Cores + Cpu>(
    hw: &mut H,
    timeout_us: u32,
    poll_us: u32,
) -> Result<(), Fault> {
    let poll_us = poll_us.max(1);
    let mut waited_us = 0;
    loop {
        if hw.ready_flag() {
            ringbuf_entry!(Trace::Ready { waited_us });
            return Ok(());
        }
        if waited_us >= timeout_us {
            ringbuf_entry!(Trace::Timeout);
            return Err(Fault::SecondaryBootTimeout);
        }
        hw.delay_us(poll_us);
        waited_us = waited_us.saturating_add(poll_us);
    }
}

/// CM55 side of the handshake. Raised unconditionally; under
/// [`SyncMode::Settle`] nobody reads it.
pub fn signal_ready<H: Cores>(hw: &mut H) {
    hw.set_ready_flag(true);
    ringbuf_entry!(Trace::Signalled);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeHw, Op};

    #[test]
    fn settle_waits_the_fixed_delay() {
        let mut hw = FakeHw::new();
        boot_secondary(&mut hw, 0x1234_0000, &SyncMode::SETTLE).unwrap();
        assert_eq!(
            hw.ops,
            [
                Op::EnableSecondary {
                    boot_address: 0x1234_0000,
                    wait_us: 10,
                },
                Op::Delay(300_000),
            ]
        );
    }

    #[test]
    fn handshake_clears_stale_flag_before_enable() {
        let mut hw = FakeHw::new();
        hw.ready_after_polls = Some(0);
        boot_secondary(&mut hw, 0x100, &SyncMode::HANDSHAKE).unwrap();
        assert_eq!(
            hw.ops,
            [
                Op::ReadyFlag(false),
                Op::EnableSecondary {
                    boot_address: 0x100,
                    wait_us: 10,
                },
            ]
        );
    }

    #[test]
    fn handshake_polls_until_ready() {
        let mut hw = FakeHw::new();
        hw.ready_after_polls = Some(3);
        let sync = SyncMode::Handshake {
            timeout_us: 1_000,
            poll_us: 50,
        };
        boot_secondary(&mut hw, 0x100, &sync).unwrap();
        let delays = hw.ops.iter().filter(|op| **op == Op::Delay(50)).count();
        assert_eq!(delays, 3);
    }

    #[test]
    fn handshake_times_out() {
        let mut hw = FakeHw::new();
        hw.ready_after_polls = None;
        let sync = SyncMode::Handshake {
            timeout_us: 1_000,
            poll_us: 100,
        };
        assert_eq!(
            boot_secondary(&mut hw, 0x100, &sync),
            Err(Fault::SecondaryBootTimeout)
        );
        let waited: u32 = hw
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Delay(us) => Some(*us),
                _ => None,
            })
            .sum();
        assert_eq!(waited, 1_000);
    }

    #[test]
    fn zero_poll_interval_still_terminates() {
        let mut hw = FakeHw::new();
        hw.ready_after_polls = None;
        let sync = SyncMode::Handshake {
            timeout_us: 5,
            poll_us: 0,
        };
        assert_eq!(
            boot_secondary(&mut hw, 0x100, &sync),
            Err(Fault::SecondaryBootTimeout)
        );
    }

    #[test]
    fn secondary_raises_flag() {
        let mut hw = FakeHw::new();
        signal_ready(&mut hw);
        assert_eq!(hw.ops, [Op::ReadyFlag(true)]);
    }
}

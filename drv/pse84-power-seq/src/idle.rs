// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! What each core does once setup is over.

use drv_pse84_power_api::{Core, IdlePolicy, PowerBundle};
use ringbuf::{ringbuf, ringbuf_entry};

use crate::hw::Cpu;

/// Settle time before hibernate, so the last debug output drains.
pub const HIBERNATE_SETTLE_US: u32 = 100_000;

#[derive(Copy, Clone, PartialEq)]
enum Trace {
    None,
    Idle(Core, IdlePolicy),
    Substituted {
        core: Core,
        asked: IdlePolicy,
        runs: IdlePolicy,
    },
}

ringbuf!(Trace, 4, Trace::None);

pub struct IdleExecutor {
    core: Core,
    policy: IdlePolicy,
}

impl IdleExecutor {
    /// Picks the policy `core` actually runs, replacing combinations a
    /// custom bundle can ask for but the hardware cannot honor.
    pub fn new(core: Core, bundle: &PowerBundle) -> Self {
        let asked = bundle.idle_policy(core);
        let mut runs = asked;

        if core == Core::Secondary {
            if bundle.disable_secondary_power_domain {
                // The CM33 is about to switch this core's domain off.
                runs = IdlePolicy::DeepSleep;
            } else if runs == IdlePolicy::Hibernate {
                runs = IdlePolicy::Sleep;
            }
        }
        if runs == IdlePolicy::DeepSleep && bundle.deep_sleep_disabled {
            runs = IdlePolicy::Sleep;
        }

        if runs != asked {
            ringbuf_entry!(Trace::Substituted { core, asked, runs });
        }
        IdleExecutor { core, policy: runs }
    }

    pub fn policy(&self) -> IdlePolicy {
        self.policy
    }

    /// One iteration of the idle loop. Hibernate does not come back.
    pub fn step<H: Cpu>(&self, hw: &mut H) {
        match self.policy {
            IdlePolicy::Sleep => hw.sleep(),
            IdlePolicy::DeepSleep => {
                if self.core == Core::Secondary {
                    hw.write_deep_sleep_off_token();
                }
                hw.deep_sleep();
            }
            IdlePolicy::Hibernate => {
                hw.delay_us(HIBERNATE_SETTLE_US);
                hw.hibernate();
            }
            IdlePolicy::SpinForever => core::hint::spin_loop(),
            IdlePolicy::RunBenchmark => hw.benchmark_pass(),
        }
    }

    pub fn run<H: Cpu>(self, hw: &mut H) -> ! {
        ringbuf_entry!(Trace::Idle(self.core, self.policy));
        loop {
            self.step(hw);
        }
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Recording stand-in for the hardware, for host tests.

use drv_pse84_power_api::{HfClock, PerformanceTier, PeriSlave, PowerDomain};

use crate::hw::{
    Clocks, Cores, Cpu, Domains, DriverStatus, RramVoltage, SystemPower,
};
use crate::Fault;

/// One primitive call, with its arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Op {
    PllDisable,
    PllConfigure { input_hz: u32, output_hz: u32 },
    PllEnable { timeout_us: u32 },
    HfNoDivide(HfClock),
    HfDisable(HfClock),
    PeriSlaveDeinit(PeriSlave),
    EnterLowPower,
    EnterUltraLowPower,
    RramVoltage(RramVoltage),
    DeepSleepOff,
    BandgapLowPower,
    SocMem(bool),
    ClearDependency(PowerDomain, PowerDomain),
    PowerOff(PowerDomain),
    EnableSecondary { boot_address: u32, wait_us: u32 },
    ReadyFlag(bool),
    Delay(u32),
    Sleep,
    DeepSleep,
    DeepSleepOffToken,
    Benchmark,
    Hibernate,
    Halt(Fault),
}

pub struct FakeHw {
    pub ops: Vec<Op>,
    pub fail_pll_configure: bool,
    pub fail_pll_enable: bool,
    pub fail_mode_entry: bool,
    /// What the power status read reports after a mode change.
    pub mode_observed: bool,
    /// Number of ready-flag reads that come back clear before the CM55
    /// shows up. `None` never shows up.
    pub ready_after_polls: Option<u32>,
    pub fail_clear_dependency: bool,
    pub fail_power_off: Option<PowerDomain>,
    polls: u32,
}

const FAILED: DriverStatus = DriverStatus(0xDEAD);

impl FakeHw {
    pub fn new() -> Self {
        FakeHw {
            ops: Vec::new(),
            fail_pll_configure: false,
            fail_pll_enable: false,
            fail_mode_entry: false,
            mode_observed: true,
            ready_after_polls: Some(0),
            fail_clear_dependency: false,
            fail_power_off: None,
            polls: 0,
        }
    }

    fn status(&self, fail: bool) -> Result<(), DriverStatus> {
        if fail {
            Err(FAILED)
        } else {
            Ok(())
        }
    }
}

impl Clocks for FakeHw {
    fn pll_disable(&mut self) {
        self.ops.push(Op::PllDisable);
    }

    fn pll_configure(
        &mut self,
        input_hz: u32,
        output_hz: u32,
    ) -> Result<(), DriverStatus> {
        self.ops.push(Op::PllConfigure {
            input_hz,
            output_hz,
        });
        self.status(self.fail_pll_configure)
    }

    fn pll_enable(&mut self, timeout_us: u32) -> Result<(), DriverStatus> {
        self.ops.push(Op::PllEnable { timeout_us });
        self.status(self.fail_pll_enable)
    }

    fn hf_no_divide(&mut self, clock: HfClock) {
        self.ops.push(Op::HfNoDivide(clock));
    }

    fn hf_disable(&mut self, clock: HfClock) {
        self.ops.push(Op::HfDisable(clock));
    }

    fn peri_slave_deinit(&mut self, slave: PeriSlave) {
        self.ops.push(Op::PeriSlaveDeinit(slave));
    }
}

impl SystemPower for FakeHw {
    fn enter_low_power(&mut self) -> Result<(), DriverStatus> {
        self.ops.push(Op::EnterLowPower);
        self.status(self.fail_mode_entry)
    }

    fn enter_ultra_low_power(&mut self) -> Result<(), DriverStatus> {
        self.ops.push(Op::EnterUltraLowPower);
        self.status(self.fail_mode_entry)
    }

    fn in_system_mode(&mut self, _tier: PerformanceTier) -> bool {
        self.mode_observed
    }

    fn set_rram_voltage(&mut self, mode: RramVoltage) {
        self.ops.push(Op::RramVoltage(mode));
    }

    fn set_deep_sleep_off(&mut self) {
        self.ops.push(Op::DeepSleepOff);
    }

    fn set_bandgap_low_power(&mut self) {
        self.ops.push(Op::BandgapLowPower);
    }

    fn set_socmem_enabled(&mut self, enabled: bool) {
        self.ops.push(Op::SocMem(enabled));
    }
}

impl Domains for FakeHw {
    fn clear_dependency(
        &mut self,
        dependent: PowerDomain,
        on: PowerDomain,
    ) -> Result<(), DriverStatus> {
        self.ops.push(Op::ClearDependency(dependent, on));
        self.status(self.fail_clear_dependency)
    }

    fn power_off(&mut self, domain: PowerDomain) -> Result<(), DriverStatus> {
        self.ops.push(Op::PowerOff(domain));
        self.status(self.fail_power_off == Some(domain))
    }
}

impl Cores for FakeHw {
    fn enable_secondary(&mut self, boot_address: u32, wait_us: u32) {
        self.ops.push(Op::EnableSecondary {
            boot_address,
            wait_us,
        });
    }

    fn ready_flag(&mut self) -> bool {
        let Some(after) = self.ready_after_polls else {
            return false;
        };
        let ready = self.polls >= after;
        self.polls += 1;
        ready
    }

    fn set_ready_flag(&mut self, ready: bool) {
        self.ops.push(Op::ReadyFlag(ready));
    }
}

impl Cpu for FakeHw {
    fn sleep(&mut self) {
        self.ops.push(Op::Sleep);
    }

    fn deep_sleep(&mut self) {
        self.ops.push(Op::DeepSleep);
    }

    fn write_deep_sleep_off_token(&mut self) {
        self.ops.push(Op::DeepSleepOffToken);
    }

    fn hibernate(&mut self) -> ! {
        self.ops.push(Op::Hibernate);
        panic!("hibernated");
    }

    fn benchmark_pass(&mut self) {
        self.ops.push(Op::Benchmark);
    }

    fn delay_us(&mut self, us: u32) {
        self.ops.push(Op::Delay(us));
    }

    fn halt(&mut self, fault: Fault) -> ! {
        self.ops.push(Op::Halt(fault));
        panic!("halted: {fault:?}");
    }
}

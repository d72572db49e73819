// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The hardware primitives the sequencer is allowed to use.
//!
//! These are deliberately thin: each method is one driver call with no
//! decisions of its own. Ordering, parameters and error policy all live in
//! the sequencer. The target implementation is `drv-pse84-pdl`; tests use a
//! recording fake.

use drv_pse84_power_api::{HfClock, PerformanceTier, PeriSlave, PowerDomain};

use crate::Fault;

/// Raw status returned by a failing driver call, kept for the trace.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DriverStatus(pub u32);

/// RRAM controller voltage modes that follow a system mode change.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RramVoltage {
    LowPower,
    UltraLowPower,
}

/// DPLL-LP path and CLK_HF roots.
pub trait Clocks {
    fn pll_disable(&mut self);

    fn pll_configure(
        &mut self,
        input_hz: u32,
        output_hz: u32,
    ) -> Result<(), DriverStatus>;

    /// Enables the path and waits up to `timeout_us` for lock.
    fn pll_enable(&mut self, timeout_us: u32) -> Result<(), DriverStatus>;

    /// Sets the divider of `clock` to 1.
    fn hf_no_divide(&mut self, clock: HfClock);

    fn hf_disable(&mut self, clock: HfClock);

    fn peri_slave_deinit(&mut self, slave: PeriSlave);
}

/// System-wide power controls.
pub trait SystemPower {
    fn enter_low_power(&mut self) -> Result<(), DriverStatus>;

    fn enter_ultra_low_power(&mut self) -> Result<(), DriverStatus>;

    /// Reads back the power status and reports whether the system is in
    /// `tier`.
    fn in_system_mode(&mut self, tier: PerformanceTier) -> bool;

    fn set_rram_voltage(&mut self, mode: RramVoltage);

    fn set_deep_sleep_off(&mut self);

    fn set_bandgap_low_power(&mut self);

    fn set_socmem_enabled(&mut self, enabled: bool);
}

/// Power policy units and the dependency controller.
pub trait Domains {
    /// Removes the dependency `dependent` declares on `on`. Fails for a
    /// pair the hardware has no dependency link for.
    fn clear_dependency(
        &mut self,
        dependent: PowerDomain,
        on: PowerDomain,
    ) -> Result<(), DriverStatus>;

    /// Requests the OFF policy on a domain's PPU.
    fn power_off(&mut self, domain: PowerDomain) -> Result<(), DriverStatus>;
}

/// Cross-core controls.
pub trait Cores {
    /// Releases the CM55 from reset at `boot_address`, waiting up to
    /// `wait_us` for it to start.
    fn enable_secondary(&mut self, boot_address: u32, wait_us: u32);

    /// The shared ready flag the CM55 raises once its own setup is done.
    fn ready_flag(&mut self) -> bool;

    fn set_ready_flag(&mut self, ready: bool);
}

/// The running core.
pub trait Cpu {
    /// Wait-for-interrupt sleep; returns on wake.
    fn sleep(&mut self);

    /// CPU deep sleep; returns on wake.
    fn deep_sleep(&mut self);

    /// Marks the next deep sleep as a DeepSleep-OFF entry for the boot
    /// code.
    fn write_deep_sleep_off_token(&mut self);

    /// System hibernate. Waking restarts both images from reset.
    fn hibernate(&mut self) -> !;

    /// One pass of the Dhrystone benchmark.
    fn benchmark_pass(&mut self);

    fn delay_us(&mut self, us: u32);

    /// Stops the core for good: interrupts off, fault recorded for the
    /// debugger, breakpoint, spin.
    fn halt(&mut self, fault: Fault) -> !;
}

/// Everything at once, for the entry points.
pub trait Hardware: Clocks + SystemPower + Domains + Cores + Cpu {}

impl<T: Clocks + SystemPower + Domains + Cores + Cpu> Hardware for T {}

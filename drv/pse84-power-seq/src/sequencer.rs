// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One-shot power and clock configuration for each core.
//!
//! [`apply_primary`] is the CM33 side and does almost everything: it owns
//! the system power mode, the DPLL-LP, and the teardown of PD1. The CM55
//! only releases the resources it never uses ([`apply_secondary`]).
//!
//! The primary runs these phases in order:
//!
//! 1. prelude: SoCMEM off, bandgap, DeepSleep-OFF;
//! 2. start the CM55 and wait for it (unless it is disabled);
//! 3. DPLL-LP, dividers, system mode entry, boost;
//! 4. gate unused CLK_HF roots;
//! 5. PD1 teardown, or the lone APPCPU power-off.
//!
//! Only phase 3 can fail. Its failures are not retried.

use drv_pse84_power_api::{
    HfClock, HfClocks, PerformanceTier, PeriSlave, PowerBundle, PowerDomain,
    DPLL_INPUT_HZ,
};
use ringbuf::{ringbuf, ringbuf_entry};

use crate::boot;
use crate::hw::{Clocks, DriverStatus, Hardware, RramVoltage};
use crate::{BootOptions, ClockStep, Fault};

/// How long the DPLL-LP gets to lock after an enable request.
pub const DPLL_ENABLE_TIMEOUT_US: u32 = 10_000;

/// What happened to the system mode request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ModeEntry {
    /// High performance: the reset mode is kept.
    NotRequested,
    /// The mode change was accepted and the status read confirms it; the
    /// RRAM and divider follow-ups were applied.
    Verified(PerformanceTier),
    /// The mode change was accepted but the status read disagrees; the
    /// follow-ups were skipped.
    Unverified(PerformanceTier),
}

/// What to do when a mode change is accepted but not observed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnverifiedModePolicy {
    /// Skip the follow-ups and keep going in whatever mode the system is
    /// actually in.
    Continue,
    /// Treat it as fatal.
    Halt,
}

#[derive(Copy, Clone, PartialEq)]
enum Trace {
    None,
    Start(PerformanceTier),
    PllDisabled,
    PllProgrammed(u32),
    PllFailed(ClockStep, DriverStatus),
    UnityDivider,
    ModeEntryFailed(PerformanceTier, DriverStatus),
    Mode(ModeEntry),
    BoostIgnored(PerformanceTier),
    Gated(HfClocks),
    DependencyCleared,
    DependencyFailed(DriverStatus),
    PoweredOff(PowerDomain),
    PowerOffFailed(PowerDomain, DriverStatus),
    SecondaryHousekeeping,
    Done,
}

ringbuf!(Trace, 32, Trace::None);

/// Configures the system from the CM33. `boot_address` is where the CM55
/// image starts.
pub fn apply_primary<H: Hardware>(
    hw: &mut H,
    bundle: &PowerBundle,
    options: &BootOptions,
    boot_address: u32,
) -> Result<ModeEntry, Fault> {
    ringbuf_entry!(Trace::Start(bundle.performance_tier));

    hw.set_socmem_enabled(false);
    if bundle.bandgap_low_power {
        hw.set_bandgap_low_power();
    }
    if bundle.deep_sleep_off {
        hw.set_deep_sleep_off();
    }

    if !bundle.disable_second_core {
        boot::boot_secondary(hw, boot_address, &options.sync)?;
    }

    let entry = configure_system_mode(hw, bundle, options.unverified_mode)?;

    gate(hw, bundle.primary_unused_clocks);
    if bundle.disable_second_core {
        // Nobody else is going to release these.
        ringbuf_entry!(Trace::SecondaryHousekeeping);
        release_peripherals(hw);
        gate(hw, bundle.secondary_unused_clocks);
    }

    if bundle.disable_secondary_power_domain {
        teardown_pd1(hw);
    } else if bundle.disable_second_core {
        power_off(hw, PowerDomain::AppCpu);
    }

    ringbuf_entry!(Trace::Done);
    Ok(entry)
}

/// Releases what the CM55 never uses, then tells the CM33 it is done.
pub fn apply_secondary<H: Hardware>(hw: &mut H, bundle: &PowerBundle) {
    if bundle.deep_sleep_off {
        hw.set_deep_sleep_off();
    }
    release_peripherals(hw);
    gate(hw, bundle.secondary_unused_clocks);
    boot::signal_ready(hw);
}

fn configure_system_mode<H: Hardware>(
    hw: &mut H,
    bundle: &PowerBundle,
    policy: UnverifiedModePolicy,
) -> Result<ModeEntry, Fault> {
    let tier = bundle.performance_tier;

    match tier {
        PerformanceTier::HighPerformance => (),
        PerformanceTier::LowPower => {
            let hz = bundle.pll_target_hz.ok_or(Fault::MissingPllTarget)?;
            program_pll(hw, hz)?;
        }
        PerformanceTier::UltraLowPower => {
            // ULP runs straight off the IHO.
            hw.pll_disable();
            ringbuf_entry!(Trace::PllDisabled);
        }
    }

    if bundle.force_unity_clock_divider {
        hw.hf_no_divide(HfClock::Hf0);
        hw.hf_no_divide(HfClock::Hf1);
        ringbuf_entry!(Trace::UnityDivider);
    }

    let entry = enter_system_mode(hw, tier, policy)?;

    if bundle.boost_mode {
        if tier == PerformanceTier::HighPerformance {
            let hz = bundle.pll_target_hz.ok_or(Fault::MissingPllTarget)?;
            program_pll(hw, hz)?;
            hw.hf_no_divide(HfClock::Hf0);
        } else {
            ringbuf_entry!(Trace::BoostIgnored(tier));
        }
    }

    Ok(entry)
}

fn enter_system_mode<H: Hardware>(
    hw: &mut H,
    tier: PerformanceTier,
    policy: UnverifiedModePolicy,
) -> Result<ModeEntry, Fault> {
    let r = match tier {
        PerformanceTier::HighPerformance => return Ok(ModeEntry::NotRequested),
        PerformanceTier::LowPower => hw.enter_low_power(),
        PerformanceTier::UltraLowPower => hw.enter_ultra_low_power(),
    };
    if let Err(status) = r {
        ringbuf_entry!(Trace::ModeEntryFailed(tier, status));
        return Err(Fault::PowerModeEntry(tier));
    }

    let entry = if hw.in_system_mode(tier) {
        match tier {
            PerformanceTier::LowPower => {
                hw.set_rram_voltage(RramVoltage::LowPower);
            }
            PerformanceTier::UltraLowPower => {
                hw.set_rram_voltage(RramVoltage::UltraLowPower);
                hw.hf_no_divide(HfClock::Hf0);
            }
            PerformanceTier::HighPerformance => (),
        }
        ModeEntry::Verified(tier)
    } else {
        ModeEntry::Unverified(tier)
    };
    ringbuf_entry!(Trace::Mode(entry));

    match (entry, policy) {
        (ModeEntry::Unverified(t), UnverifiedModePolicy::Halt) => {
            Err(Fault::UnverifiedModeEntry(t))
        }
        _ => Ok(entry),
    }
}

/// Disable, configure, enable. The path is stopped first because the
/// DPLL-LP cannot be reconfigured while it is feeding anything.
fn program_pll<H: Clocks>(hw: &mut H, output_hz: u32) -> Result<(), Fault> {
    hw.pll_disable();

    hw.pll_configure(DPLL_INPUT_HZ, output_hz).map_err(|status| {
        ringbuf_entry!(Trace::PllFailed(ClockStep::Configure, status));
        Fault::ClockConfiguration(ClockStep::Configure)
    })?;

    hw.pll_enable(DPLL_ENABLE_TIMEOUT_US).map_err(|status| {
        ringbuf_entry!(Trace::PllFailed(ClockStep::Enable, status));
        Fault::ClockConfiguration(ClockStep::Enable)
    })?;

    ringbuf_entry!(Trace::PllProgrammed(output_hz));
    Ok(())
}

fn gate<H: Clocks>(hw: &mut H, clocks: HfClocks) {
    if clocks.is_empty() {
        return;
    }
    for c in clocks.clocks() {
        hw.hf_disable(c);
    }
    ringbuf_entry!(Trace::Gated(clocks));
}

fn release_peripherals<H: Clocks>(hw: &mut H) {
    for s in PeriSlave::SECONDARY_UNUSED {
        hw.peri_slave_deinit(s);
    }
}

fn teardown_pd1<H: Hardware>(hw: &mut H) {
    // Teardown failures are traced, not fatal.
    let (dependent, on) = PowerDomain::PD1_DEPENDENCY;
    match hw.clear_dependency(dependent, on) {
        Ok(()) => {
            ringbuf_entry!(Trace::DependencyCleared);
        }
        Err(e) => {
            ringbuf_entry!(Trace::DependencyFailed(e));
        }
    }

    for d in PowerDomain::PD1_TEARDOWN {
        power_off(hw, d);
    }
}

fn power_off<H: Hardware>(hw: &mut H, domain: PowerDomain) {
    match hw.power_off(domain) {
        Ok(()) => {
            ringbuf_entry!(Trace::PoweredOff(domain));
        }
        Err(e) => {
            ringbuf_entry!(Trace::PowerOffFailed(domain, e));
        }
    }
}

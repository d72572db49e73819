// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Common definitions for the PSOC Edge E84 power-mode firmware, shared by
//! the CM33 and CM55 images and the build-time configuration.
//!
//! The entry point is [`resolve`], which turns the selector chosen at build
//! time into a [`PowerBundle`]. Everything the sequencer does afterwards is
//! driven by that bundle.

#![cfg_attr(not(test), no_std)]

use bitflags::bitflags;
use num_derive::FromPrimitive;

mod table;

pub use table::{resolve, resolve_preset, ResolveError};

/// DPLL-LP reference input (the 50 MHz IHO).
pub const DPLL_INPUT_HZ: u32 = 50_000_000;

/// DPLL-LP output for the boosted HP operating points.
pub const BOOST_PLL_HZ: u32 = 200_000_000;

/// DPLL-LP output for LP variants 00 and 01.
pub const LP_TIER_A_PLL_HZ: u32 = 70_000_000;

/// DPLL-LP output for the remaining LP variants, and the custom default.
pub const LP_TIER_B_PLL_HZ: u32 = 140_000_000;

/// The operating points from the E84 datasheet CPU-current table ("SPEC
/// IDs"), plus [`Selector::Custom`].
///
/// The name encodes the row: `Sid` + system mode (`H`igh performance, `L`ow
/// power, `U`ltra low power) + two digits for the core workload + a letter
/// for the temperature/voltage column.
#[derive(Copy, Clone, Debug, FromPrimitive, PartialEq, Eq)]
#[repr(u8)]
pub enum Selector {
    /// HP + boost, PD1 off, CM33 sleep, CM55 deep sleep.
    Sidh00a = 1,
    /// HP + boost, PD1 off, CM33 Dhrystone, CM55 deep sleep.
    Sidh01a = 2,
    /// HP, CM55 off, CM33 sleep.
    Sidh10a = 3,
    /// HP, both cores sleep.
    Sidh12a = 4,
    /// HP, CM33 sleep, CM55 Dhrystone.
    Sidh14a = 5,
    /// HP, both cores Dhrystone.
    Sidh20a = 6,
    Sidl00b = 7,
    Sidl01b = 8,
    Sidl10b = 9,
    Sidl12b = 10,
    Sidl14b = 11,
    Sidl20b = 12,
    Sidu00c = 13,
    Sidu01c = 14,
    Sidu10c = 15,
    Sidu12c = 16,
    Sidu14c = 17,
    Sidu20c = 18,
    /// System DeepSleep-OFF: both cores in deep sleep with PD1 off.
    Siddso = 19,
    /// System Hibernate, entered from the CM33.
    Sidhiba = 20,
    /// Individually configured at build time; see [`CustomConfig`].
    Custom = 21,
}

impl Selector {
    /// Every datasheet preset, in selector order. `Custom` is not a preset.
    pub const PRESETS: [Selector; 20] = [
        Selector::Sidh00a,
        Selector::Sidh01a,
        Selector::Sidh10a,
        Selector::Sidh12a,
        Selector::Sidh14a,
        Selector::Sidh20a,
        Selector::Sidl00b,
        Selector::Sidl01b,
        Selector::Sidl10b,
        Selector::Sidl12b,
        Selector::Sidl14b,
        Selector::Sidl20b,
        Selector::Sidu00c,
        Selector::Sidu01c,
        Selector::Sidu10c,
        Selector::Sidu12c,
        Selector::Sidu14c,
        Selector::Sidu20c,
        Selector::Siddso,
        Selector::Sidhiba,
    ];
}

/// Coarse system power class.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PerformanceTier {
    /// The reset configuration set up by the device configurator; the
    /// sequencer leaves the system mode alone.
    HighPerformance,
    LowPower,
    UltraLowPower,
}

/// What a core does forever once setup is complete.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IdlePolicy {
    Sleep,
    DeepSleep,
    /// System hibernate; only meaningful on the primary core.
    Hibernate,
    /// Stay awake doing nothing, as the active-current baseline.
    SpinForever,
    /// Run the Dhrystone benchmark back to back.
    RunBenchmark,
}

/// The two cores of the part.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Core {
    /// The CM33, which boots first and owns the system power mode.
    Primary,
    /// The CM55, enabled by the CM33.
    Secondary,
}

/// Power domains the sequencer touches, named after their PPUs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PowerDomain {
    /// Power domain 1, which holds the application subsystem and SoCMEM.
    Pd1,
    /// The shared SRAM block in PD1.
    SocMem,
    /// The CM55 subsystem (APPCPUSS).
    AppCpuSs,
    /// The CM55 core itself (APPCPU).
    AppCpu,
    /// The CM33 subsystem. Never switched off here; it only appears as the
    /// far end of the APPCPUSS dependency link.
    SysCpu,
}

impl PowerDomain {
    /// The dependency link that keeps PD1 alive on behalf of the CM33:
    /// APPCPUSS declares a dependency on SYSCPU. It has to be cleared before
    /// anything in PD1 is switched off.
    pub const PD1_DEPENDENCY: (PowerDomain, PowerDomain) =
        (PowerDomain::AppCpuSs, PowerDomain::SysCpu);

    /// Order in which PD1 and its contents are switched off once
    /// [`Self::PD1_DEPENDENCY`] has been cleared.
    ///
    /// Each entry is an OFF request to the domain's PPU; a PPU only powers
    /// down once nothing above it still holds a dependency, so PD1 goes
    /// first and the CM55 core last.
    pub const PD1_TEARDOWN: [PowerDomain; 4] = [
        PowerDomain::Pd1,
        PowerDomain::SocMem,
        PowerDomain::AppCpuSs,
        PowerDomain::AppCpu,
    ];
}

/// A single high-frequency clock root (CLK_HFn).
#[derive(Copy, Clone, Debug, FromPrimitive, PartialEq, Eq)]
#[repr(u8)]
pub enum HfClock {
    Hf0 = 0,
    Hf1 = 1,
    Hf2 = 2,
    Hf3 = 3,
    Hf4 = 4,
    Hf5 = 5,
    Hf6 = 6,
    Hf7 = 7,
    Hf8 = 8,
    Hf9 = 9,
    Hf10 = 10,
    Hf11 = 11,
    Hf12 = 12,
    Hf13 = 13,
}

bitflags! {
    /// A set of CLK_HF roots.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct HfClocks: u16 {
        const HF0 = 1 << 0;
        const HF1 = 1 << 1;
        const HF2 = 1 << 2;
        const HF3 = 1 << 3;
        const HF4 = 1 << 4;
        const HF5 = 1 << 5;
        const HF6 = 1 << 6;
        const HF7 = 1 << 7;
        const HF8 = 1 << 8;
        const HF9 = 1 << 9;
        const HF10 = 1 << 10;
        const HF11 = 1 << 11;
        const HF12 = 1 << 12;
        const HF13 = 1 << 13;
    }
}

impl HfClocks {
    /// Roots gated by the CM33 when PD1 is off.
    pub const PD1_ONLY: HfClocks = HfClocks::HF1.union(HfClocks::HF2);

    /// Roots the CM55 image never uses. HF8 keeps running.
    pub const SECONDARY_IDLE: HfClocks = HfClocks::HF3
        .union(HfClocks::HF4)
        .union(HfClocks::HF5)
        .union(HfClocks::HF6)
        .union(HfClocks::HF7)
        .union(HfClocks::HF9)
        .union(HfClocks::HF10)
        .union(HfClocks::HF11)
        .union(HfClocks::HF12)
        .union(HfClocks::HF13);

    /// The members of the set, lowest root first.
    pub fn clocks(self) -> impl Iterator<Item = HfClock> {
        use num_traits::FromPrimitive;

        self.iter()
            .filter_map(|f| HfClock::from_u32(f.bits().trailing_zeros()))
    }
}

/// Peripheral group slaves released by the CM55 image: peripheral block 1,
/// group 1, slaves 0 through 2.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PeriSlave {
    pub peri: u8,
    pub group: u8,
    pub slave: u8,
}

impl PeriSlave {
    pub const SECONDARY_UNUSED: [PeriSlave; 3] = [
        PeriSlave {
            peri: 1,
            group: 1,
            slave: 0,
        },
        PeriSlave {
            peri: 1,
            group: 1,
            slave: 1,
        },
        PeriSlave {
            peri: 1,
            group: 1,
            slave: 2,
        },
    ];
}

/// The resolved operating point.
///
/// Built once by [`resolve`] and then only read. Presets produce consistent
/// bundles; a bundle from [`Selector::Custom`] is whatever the build
/// configuration asked for, and the sequencer has to cope with it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PowerBundle {
    pub performance_tier: PerformanceTier,
    /// Re-program the DPLL-LP to [`BOOST_PLL_HZ`] after setup. Only honored
    /// at [`PerformanceTier::HighPerformance`].
    pub boost_mode: bool,
    /// DPLL-LP output, for LP and boosted bundles.
    pub pll_target_hz: Option<u32>,
    /// Force the HF0 and HF1 dividers to 1 after the DPLL-LP is programmed.
    pub force_unity_clock_divider: bool,
    /// Never enable the CM55; the CM33 powers its core domain off instead.
    pub disable_second_core: bool,
    /// Tear down PD1 along with everything that depends on it.
    pub disable_secondary_power_domain: bool,
    /// Never enter CPU deep sleep on either core; `DeepSleep` policies fall
    /// back to `Sleep`. Keeps a debug probe attached. Custom builds only.
    pub deep_sleep_disabled: bool,
    /// Configure system deep sleep as DeepSleep-OFF (no retention, wake
    /// through reset).
    pub deep_sleep_off: bool,
    /// Run the bandgap reference in its low-power mode.
    pub bandgap_low_power: bool,
    /// Roots the CM33 gates after its power-mode work.
    pub primary_unused_clocks: HfClocks,
    /// Roots the CM55 gates during its own setup.
    pub secondary_unused_clocks: HfClocks,
    pub primary_core_idle_policy: IdlePolicy,
    pub secondary_core_idle_policy: IdlePolicy,
}

impl PowerBundle {
    pub fn idle_policy(&self, core: Core) -> IdlePolicy {
        match core {
            Core::Primary => self.primary_core_idle_policy,
            Core::Secondary => self.secondary_core_idle_policy,
        }
    }
}

/// The individually set fields behind [`Selector::Custom`].
///
/// No cross-field validation happens here or in [`resolve`]: a custom build
/// can ask for boost at LP, deep sleep on a core where it is disabled, or a
/// busy CM55 inside a PD1 that is being switched off. The sequencer and idle
/// executor pick a documented fallback for each of those.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CustomConfig {
    pub performance_tier: PerformanceTier,
    pub boost_mode: bool,
    /// DPLL-LP output used at [`PerformanceTier::LowPower`].
    pub pll_lp_hz: u32,
    pub force_unity_clock_divider: bool,
    pub disable_second_core: bool,
    pub disable_secondary_power_domain: bool,
    pub deep_sleep_disabled: bool,
    pub primary_core_idle_policy: IdlePolicy,
    pub secondary_core_idle_policy: IdlePolicy,
}

impl CustomConfig {
    /// What an untouched custom section selects: HP with both cores running
    /// Dhrystone.
    pub const DEFAULT: CustomConfig = CustomConfig {
        performance_tier: PerformanceTier::HighPerformance,
        boost_mode: false,
        pll_lp_hz: LP_TIER_B_PLL_HZ,
        force_unity_clock_divider: false,
        disable_second_core: false,
        disable_secondary_power_domain: false,
        deep_sleep_disabled: false,
        primary_core_idle_policy: IdlePolicy::RunBenchmark,
        secondary_core_idle_policy: IdlePolicy::RunBenchmark,
    };
}

impl Default for CustomConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

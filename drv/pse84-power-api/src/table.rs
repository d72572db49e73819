// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The datasheet operating points.
//!
//! Each preset is one row of the E84 CPU-current table. A row is the pair of
//! a [`Clocking`] (the system-mode column) and a [`Workload`] (what the two
//! cores are doing). Both halves are written out as literal constants; the
//! table is characterization data, not something to compute.

use static_assertions::const_assert;

use crate::{
    CustomConfig, HfClocks, IdlePolicy, PerformanceTier, PowerBundle,
    Selector, BOOST_PLL_HZ, LP_TIER_A_PLL_HZ, LP_TIER_B_PLL_HZ,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResolveError {
    /// The raw selector is not one of the 21 known values.
    InvalidSelector(u8),
}

struct Clocking {
    tier: PerformanceTier,
    boost: bool,
    pll_target_hz: Option<u32>,
    force_unity_divider: bool,
}

struct Workload {
    disable_second_core: bool,
    disable_pd1: bool,
    deep_sleep_off: bool,
    bandgap_low_power: bool,
    primary_unused: HfClocks,
    primary_idle: IdlePolicy,
    secondary_idle: IdlePolicy,
}

const HP: Clocking = Clocking {
    tier: PerformanceTier::HighPerformance,
    boost: false,
    pll_target_hz: None,
    force_unity_divider: false,
};

const HP_BOOST: Clocking = Clocking {
    tier: PerformanceTier::HighPerformance,
    boost: true,
    pll_target_hz: Some(BOOST_PLL_HZ),
    force_unity_divider: false,
};

const LP_A: Clocking = Clocking {
    tier: PerformanceTier::LowPower,
    boost: false,
    pll_target_hz: Some(LP_TIER_A_PLL_HZ),
    force_unity_divider: true,
};

const LP_B: Clocking = Clocking {
    tier: PerformanceTier::LowPower,
    boost: false,
    pll_target_hz: Some(LP_TIER_B_PLL_HZ),
    force_unity_divider: false,
};

const ULP: Clocking = Clocking {
    tier: PerformanceTier::UltraLowPower,
    boost: false,
    pll_target_hz: None,
    force_unity_divider: false,
};

// The DPLL-LP tops out at 200 MHz and the LP rows must stay below it.
const_assert!(LP_TIER_A_PLL_HZ < LP_TIER_B_PLL_HZ);
const_assert!(LP_TIER_B_PLL_HZ < BOOST_PLL_HZ);

/// "00": PD1 off, CM33 sleeps, CM55 parked in deep sleep.
const W00: Workload = Workload {
    disable_second_core: false,
    disable_pd1: true,
    deep_sleep_off: true,
    bandgap_low_power: false,
    primary_unused: HfClocks::PD1_ONLY,
    primary_idle: IdlePolicy::Sleep,
    secondary_idle: IdlePolicy::DeepSleep,
};

/// "01": PD1 off, CM33 runs Dhrystone, CM55 parked in deep sleep.
const W01: Workload = Workload {
    disable_second_core: false,
    disable_pd1: true,
    deep_sleep_off: true,
    bandgap_low_power: false,
    primary_unused: HfClocks::PD1_ONLY,
    primary_idle: IdlePolicy::RunBenchmark,
    secondary_idle: IdlePolicy::DeepSleep,
};

/// "10": CM55 never started, CM33 sleeps.
const W10: Workload = Workload {
    disable_second_core: true,
    disable_pd1: false,
    deep_sleep_off: false,
    bandgap_low_power: false,
    primary_unused: HfClocks::empty(),
    primary_idle: IdlePolicy::Sleep,
    secondary_idle: IdlePolicy::DeepSleep,
};

/// "12": both cores sleep.
const W12: Workload = Workload {
    disable_second_core: false,
    disable_pd1: false,
    deep_sleep_off: false,
    bandgap_low_power: false,
    primary_unused: HfClocks::empty(),
    primary_idle: IdlePolicy::Sleep,
    secondary_idle: IdlePolicy::Sleep,
};

/// "14": CM33 sleeps, CM55 runs Dhrystone.
const W14: Workload = Workload {
    disable_second_core: false,
    disable_pd1: false,
    deep_sleep_off: false,
    bandgap_low_power: false,
    primary_unused: HfClocks::empty(),
    primary_idle: IdlePolicy::Sleep,
    secondary_idle: IdlePolicy::RunBenchmark,
};

/// "20": both cores run Dhrystone.
const W20: Workload = Workload {
    disable_second_core: false,
    disable_pd1: false,
    deep_sleep_off: false,
    bandgap_low_power: false,
    primary_unused: HfClocks::empty(),
    primary_idle: IdlePolicy::RunBenchmark,
    secondary_idle: IdlePolicy::RunBenchmark,
};

/// System DeepSleep-OFF.
const WDSO: Workload = Workload {
    disable_second_core: false,
    disable_pd1: true,
    deep_sleep_off: true,
    bandgap_low_power: true,
    primary_unused: HfClocks::PD1_ONLY,
    primary_idle: IdlePolicy::DeepSleep,
    secondary_idle: IdlePolicy::DeepSleep,
};

/// System hibernate from the CM33; the CM55 is never started.
const WHIB: Workload = Workload {
    disable_second_core: true,
    disable_pd1: false,
    deep_sleep_off: false,
    bandgap_low_power: false,
    primary_unused: HfClocks::empty(),
    primary_idle: IdlePolicy::Hibernate,
    secondary_idle: IdlePolicy::DeepSleep,
};

fn row(selector: Selector) -> Option<(&'static Clocking, &'static Workload)> {
    let r = match selector {
        Selector::Sidh00a => (&HP_BOOST, &W00),
        Selector::Sidh01a => (&HP_BOOST, &W01),
        Selector::Sidh10a => (&HP, &W10),
        Selector::Sidh12a => (&HP, &W12),
        Selector::Sidh14a => (&HP, &W14),
        Selector::Sidh20a => (&HP, &W20),
        Selector::Sidl00b => (&LP_A, &W00),
        Selector::Sidl01b => (&LP_A, &W01),
        Selector::Sidl10b => (&LP_B, &W10),
        Selector::Sidl12b => (&LP_B, &W12),
        Selector::Sidl14b => (&LP_B, &W14),
        Selector::Sidl20b => (&LP_B, &W20),
        Selector::Sidu00c => (&ULP, &W00),
        Selector::Sidu01c => (&ULP, &W01),
        Selector::Sidu10c => (&ULP, &W10),
        Selector::Sidu12c => (&ULP, &W12),
        Selector::Sidu14c => (&ULP, &W14),
        Selector::Sidu20c => (&ULP, &W20),
        Selector::Siddso => (&HP, &WDSO),
        Selector::Sidhiba => (&HP, &WHIB),
        Selector::Custom => return None,
    };
    Some(r)
}

/// Resolves a typed selector. `custom` is only consulted for
/// [`Selector::Custom`].
pub fn resolve_preset(
    selector: Selector,
    custom: &CustomConfig,
) -> PowerBundle {
    let Some((c, w)) = row(selector) else {
        return from_custom(custom);
    };

    PowerBundle {
        performance_tier: c.tier,
        boost_mode: c.boost,
        pll_target_hz: c.pll_target_hz,
        force_unity_clock_divider: c.force_unity_divider,
        disable_second_core: w.disable_second_core,
        disable_secondary_power_domain: w.disable_pd1,
        deep_sleep_disabled: false,
        deep_sleep_off: w.deep_sleep_off,
        bandgap_low_power: w.bandgap_low_power,
        primary_unused_clocks: w.primary_unused,
        secondary_unused_clocks: HfClocks::SECONDARY_IDLE,
        primary_core_idle_policy: w.primary_idle,
        secondary_core_idle_policy: w.secondary_idle,
    }
}

/// Resolves the raw selector baked in at build time.
pub fn resolve(
    raw: u8,
    custom: &CustomConfig,
) -> Result<PowerBundle, ResolveError> {
    use num_traits::FromPrimitive;

    let selector =
        Selector::from_u8(raw).ok_or(ResolveError::InvalidSelector(raw))?;
    Ok(resolve_preset(selector, custom))
}

// Unchecked on purpose: every field is taken as written.
fn from_custom(custom: &CustomConfig) -> PowerBundle {
    let pll_target_hz = match custom.performance_tier {
        PerformanceTier::LowPower => Some(custom.pll_lp_hz),
        PerformanceTier::HighPerformance if custom.boost_mode => {
            Some(BOOST_PLL_HZ)
        }
        _ => None,
    };

    let pd1 = custom.disable_secondary_power_domain;

    PowerBundle {
        performance_tier: custom.performance_tier,
        boost_mode: custom.boost_mode,
        pll_target_hz,
        force_unity_clock_divider: custom.force_unity_clock_divider,
        disable_second_core: custom.disable_second_core,
        disable_secondary_power_domain: pd1,
        deep_sleep_disabled: custom.deep_sleep_disabled,
        deep_sleep_off: pd1,
        bandgap_low_power: false,
        primary_unused_clocks: if pd1 {
            HfClocks::PD1_ONLY
        } else {
            HfClocks::empty()
        },
        secondary_unused_clocks: HfClocks::SECONDARY_IDLE,
        primary_core_idle_policy: custom.primary_core_idle_policy,
        secondary_core_idle_policy: custom.secondary_core_idle_policy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preset(selector: Selector) -> PowerBundle {
        resolve_preset(selector, &CustomConfig::DEFAULT)
    }

    #[test]
    fn every_raw_value_in_range_resolves() {
        for raw in 1..=21u8 {
            assert!(resolve(raw, &CustomConfig::DEFAULT).is_ok(), "{raw}");
        }
    }

    #[test]
    fn out_of_range_selectors_are_rejected() {
        for raw in [0u8, 22, 99, u8::MAX] {
            assert_eq!(
                resolve(raw, &CustomConfig::DEFAULT),
                Err(ResolveError::InvalidSelector(raw))
            );
        }
    }

    #[test]
    fn raw_values_match_datasheet_numbering() {
        for (i, s) in Selector::PRESETS.iter().enumerate() {
            assert_eq!(*s as u8, i as u8 + 1);
        }
        assert_eq!(Selector::Custom as u8, 21);
    }

    #[test]
    fn presets_are_consistent() {
        for s in Selector::PRESETS {
            let b = preset(s);

            if b.boost_mode {
                assert_eq!(
                    b.performance_tier,
                    PerformanceTier::HighPerformance,
                    "{s:?}"
                );
            }
            match b.performance_tier {
                PerformanceTier::LowPower => {
                    assert!(b.pll_target_hz.is_some(), "{s:?}")
                }
                PerformanceTier::HighPerformance => {
                    assert_eq!(b.pll_target_hz.is_some(), b.boost_mode, "{s:?}")
                }
                PerformanceTier::UltraLowPower => {
                    assert_eq!(b.pll_target_hz, None, "{s:?}")
                }
            }
            if b.disable_second_core || b.disable_secondary_power_domain {
                // A CM55 that is never started or whose domain is going away
                // is parked, never given work.
                assert_eq!(
                    b.secondary_core_idle_policy,
                    IdlePolicy::DeepSleep,
                    "{s:?}"
                );
            }
            assert!(!b.deep_sleep_disabled, "{s:?}");
            if b.disable_secondary_power_domain {
                assert!(b.deep_sleep_off, "{s:?}");
                assert_eq!(b.primary_unused_clocks, HfClocks::PD1_ONLY);
            }
            assert_ne!(b.secondary_core_idle_policy, IdlePolicy::Hibernate);
        }
    }

    #[test]
    fn resolution_is_pure() {
        for raw in 1..=21u8 {
            let a = resolve(raw, &CustomConfig::DEFAULT);
            let b = resolve(raw, &CustomConfig::DEFAULT);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn hp_disable_pd1_row() {
        let b = preset(Selector::Sidh00a);
        assert_eq!(b.performance_tier, PerformanceTier::HighPerformance);
        assert!(b.boost_mode);
        assert_eq!(b.pll_target_hz, Some(200_000_000));
        assert!(b.disable_secondary_power_domain);
        assert!(!b.disable_second_core);
        assert_eq!(b.primary_core_idle_policy, IdlePolicy::Sleep);
        assert_eq!(b.secondary_core_idle_policy, IdlePolicy::DeepSleep);
    }

    #[test]
    fn hibernate_row_never_starts_the_cm55() {
        let b = preset(Selector::Sidhiba);
        assert_eq!(b.primary_core_idle_policy, IdlePolicy::Hibernate);
        assert!(b.disable_second_core);
        assert!(!b.disable_secondary_power_domain);
    }

    #[test]
    fn lp_tier_a_rows() {
        for s in [Selector::Sidl00b, Selector::Sidl01b] {
            let b = preset(s);
            assert_eq!(b.performance_tier, PerformanceTier::LowPower);
            assert_eq!(b.pll_target_hz, Some(70_000_000));
            assert!(b.force_unity_clock_divider);
        }
        for s in [Selector::Sidl10b, Selector::Sidl20b] {
            let b = preset(s);
            assert_eq!(b.pll_target_hz, Some(140_000_000));
            assert!(!b.force_unity_clock_divider);
        }
    }

    #[test]
    fn deep_sleep_off_row() {
        let b = preset(Selector::Siddso);
        assert!(b.deep_sleep_off);
        assert!(b.bandgap_low_power);
        assert_eq!(b.primary_core_idle_policy, IdlePolicy::DeepSleep);
        assert_eq!(b.secondary_core_idle_policy, IdlePolicy::DeepSleep);
    }

    #[test]
    fn workload_columns_repeat_across_tiers() {
        let groups = [
            [Selector::Sidh12a, Selector::Sidl12b, Selector::Sidu12c],
            [Selector::Sidh01a, Selector::Sidl01b, Selector::Sidu01c],
        ];
        for g in groups {
            let b: Vec<PowerBundle> = g.iter().map(|s| preset(*s)).collect();
            for x in &b[1..] {
                assert_eq!(
                    x.primary_core_idle_policy,
                    b[0].primary_core_idle_policy
                );
                assert_eq!(
                    x.secondary_core_idle_policy,
                    b[0].secondary_core_idle_policy
                );
                assert_eq!(
                    x.disable_secondary_power_domain,
                    b[0].disable_secondary_power_domain
                );
            }
        }
    }

    #[test]
    fn custom_path_takes_fields_as_written() {
        let custom = CustomConfig {
            performance_tier: PerformanceTier::UltraLowPower,
            boost_mode: true,
            deep_sleep_disabled: true,
            secondary_core_idle_policy: IdlePolicy::DeepSleep,
            disable_secondary_power_domain: true,
            ..CustomConfig::DEFAULT
        };
        let b = resolve(21, &custom).unwrap();

        // Inconsistent, and passed through untouched.
        assert!(b.boost_mode);
        assert_eq!(b.performance_tier, PerformanceTier::UltraLowPower);
        assert_eq!(b.pll_target_hz, None);
        assert!(b.deep_sleep_disabled);
        assert_eq!(b.secondary_core_idle_policy, IdlePolicy::DeepSleep);
        assert!(b.deep_sleep_off);
        assert_eq!(b.primary_unused_clocks, HfClocks::PD1_ONLY);
    }

    #[test]
    fn custom_lp_uses_configured_pll() {
        let custom = CustomConfig {
            performance_tier: PerformanceTier::LowPower,
            pll_lp_hz: 100_000_000,
            ..CustomConfig::DEFAULT
        };
        let b = resolve_preset(Selector::Custom, &custom);
        assert_eq!(b.pll_target_hz, Some(100_000_000));
    }

    #[test]
    fn default_custom_is_hp_dhrystone() {
        let b = resolve_preset(Selector::Custom, &CustomConfig::DEFAULT);
        assert_eq!(b.performance_tier, PerformanceTier::HighPerformance);
        assert_eq!(b.pll_target_hz, None);
        assert_eq!(b.primary_core_idle_policy, IdlePolicy::RunBenchmark);
        assert_eq!(b.secondary_core_idle_policy, IdlePolicy::RunBenchmark);
    }
}

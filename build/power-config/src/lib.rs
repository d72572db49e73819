// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Build-time power-mode configuration.
//!
//! Both images read the same TOML file from their `build.rs` and get the
//! selector and custom settings compiled in as constants. The file is
//! `app/power-mode.toml` unless `PSE84_POWER_CONFIG` names another one.
//!
//! ```toml
//! spec-id = "SIDL00B"   # or a number, 1-21; "custom" for the table below
//!
//! [custom]
//! performance-tier = "low-power"
//! pll-lp-hz = 100_000_000
//! primary-idle = "sleep"
//!
//! [boot]
//! sync = "handshake"
//! strict-mode-check = false
//! ```
//!
//! The selector is not range checked here beyond a warning. Firmware built
//! with a bad selector halts at boot, which is the behavior the resolver
//! owns.

use anyhow::{bail, Context, Result};
use drv_pse84_power_api::{
    CustomConfig, IdlePolicy, PerformanceTier, Selector,
};
use proc_macro2::TokenStream;
use quote::quote;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming an alternate configuration file.
pub const CONFIG_ENV: &str = "PSE84_POWER_CONFIG";

/// Name of the generated file in `OUT_DIR`.
pub const OUTPUT: &str = "power_config.rs";

/// Which image a `build.rs` is building.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Image {
    /// CM33; also gets the boot options.
    Primary,
    Secondary,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PowerConfig {
    spec_id: SpecId,
    #[serde(default)]
    custom: Option<CustomSection>,
    #[serde(default)]
    boot: BootSection,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum SpecId {
    Number(i64),
    Name(String),
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct CustomSection {
    performance_tier: Option<Tier>,
    boost: Option<bool>,
    pll_lp_hz: Option<u32>,
    force_unity_divider: Option<bool>,
    disable_second_core: Option<bool>,
    disable_secondary_power_domain: Option<bool>,
    deep_sleep_disabled: Option<bool>,
    primary_idle: Option<Idle>,
    secondary_idle: Option<Idle>,
}

#[derive(Copy, Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum Tier {
    HighPerformance,
    LowPower,
    UltraLowPower,
}

#[derive(Copy, Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum Idle {
    Sleep,
    DeepSleep,
    Hibernate,
    SpinForever,
    RunBenchmark,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct BootSection {
    #[serde(default)]
    sync: BootSync,
    #[serde(default)]
    strict_mode_check: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum BootSync {
    #[default]
    Handshake,
    Settle,
}

impl From<Tier> for PerformanceTier {
    fn from(t: Tier) -> Self {
        match t {
            Tier::HighPerformance => PerformanceTier::HighPerformance,
            Tier::LowPower => PerformanceTier::LowPower,
            Tier::UltraLowPower => PerformanceTier::UltraLowPower,
        }
    }
}

impl From<Idle> for IdlePolicy {
    fn from(i: Idle) -> Self {
        match i {
            Idle::Sleep => IdlePolicy::Sleep,
            Idle::DeepSleep => IdlePolicy::DeepSleep,
            Idle::Hibernate => IdlePolicy::Hibernate,
            Idle::SpinForever => IdlePolicy::SpinForever,
            Idle::RunBenchmark => IdlePolicy::RunBenchmark,
        }
    }
}

impl PowerConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads the file named by [`CONFIG_ENV`], or `default_path`.
    pub fn load(default_path: &Path) -> Result<Self> {
        println!("cargo:rerun-if-env-changed={CONFIG_ENV}");
        let path = match std::env::var_os(CONFIG_ENV) {
            Some(p) => PathBuf::from(p),
            None => default_path.to_owned(),
        };
        println!("cargo:rerun-if-changed={}", path.display());

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&text)
            .with_context(|| format!("parsing {}", path.display()))
    }

    /// The raw selector to compile in.
    pub fn selector(&self) -> Result<u8> {
        match &self.spec_id {
            SpecId::Number(n) => match u8::try_from(*n) {
                Ok(raw) => Ok(raw),
                Err(_) => bail!("spec-id {n} does not fit in a selector"),
            },
            SpecId::Name(name) => selector_by_name(name),
        }
    }

    /// The custom section with unset keys taken from
    /// [`CustomConfig::DEFAULT`].
    pub fn custom(&self) -> CustomConfig {
        let d = CustomConfig::DEFAULT;
        let Some(c) = &self.custom else {
            return d;
        };
        CustomConfig {
            performance_tier: c
                .performance_tier
                .map_or(d.performance_tier, Into::into),
            boost_mode: c.boost.unwrap_or(d.boost_mode),
            pll_lp_hz: c.pll_lp_hz.unwrap_or(d.pll_lp_hz),
            force_unity_clock_divider: c
                .force_unity_divider
                .unwrap_or(d.force_unity_clock_divider),
            disable_second_core: c
                .disable_second_core
                .unwrap_or(d.disable_second_core),
            disable_secondary_power_domain: c
                .disable_secondary_power_domain
                .unwrap_or(d.disable_secondary_power_domain),
            deep_sleep_disabled: c
                .deep_sleep_disabled
                .unwrap_or(d.deep_sleep_disabled),
            primary_core_idle_policy: c
                .primary_idle
                .map_or(d.primary_core_idle_policy, Into::into),
            secondary_core_idle_policy: c
                .secondary_idle
                .map_or(d.secondary_core_idle_policy, Into::into),
        }
    }

    /// Things worth telling whoever is building, none of which stop the
    /// build.
    pub fn warnings(&self) -> Vec<String> {
        let mut w = vec![];
        if let Ok(raw) = self.selector() {
            if !(1..=Selector::Custom as u8).contains(&raw) {
                w.push(format!(
                    "spec-id {raw} is not a known operating point; \
                     the firmware will halt at boot"
                ));
            } else if self.custom.is_some() && raw != Selector::Custom as u8 {
                w.push(format!(
                    "[custom] is ignored because spec-id is {raw}, not custom"
                ));
            }
        }
        w
    }

    /// The contents of [`OUTPUT`] for `image`.
    pub fn generate(&self, image: Image) -> Result<String> {
        let raw = self.selector()?;
        let custom = custom_tokens(&self.custom());

        let boot = match image {
            Image::Primary => {
                let sync = match self.boot.sync {
                    BootSync::Handshake => quote! { SyncMode::HANDSHAKE },
                    BootSync::Settle => quote! { SyncMode::SETTLE },
                };
                let unverified = if self.boot.strict_mode_check {
                    quote! { UnverifiedModePolicy::Halt }
                } else {
                    quote! { UnverifiedModePolicy::Continue }
                };
                quote! {
                    pub const BOOT_OPTIONS: drv_pse84_power_seq::BootOptions = {
                        use drv_pse84_power_seq::*;
                        BootOptions {
                            sync: #sync,
                            unverified_mode: #unverified,
                        }
                    };
                }
            }
            Image::Secondary => quote! {},
        };

        let tokens = quote! {
            pub const SELECTOR: u8 = #raw;

            pub const CUSTOM: drv_pse84_power_api::CustomConfig = #custom;

            #boot
        };
        let file = syn::parse2::<syn::File>(tokens)?;
        Ok(prettyplease::unparse(&file))
    }
}

fn selector_by_name(name: &str) -> Result<u8> {
    if name.eq_ignore_ascii_case("custom") {
        return Ok(Selector::Custom as u8);
    }
    for s in Selector::PRESETS {
        if format!("{s:?}").eq_ignore_ascii_case(name) {
            return Ok(s as u8);
        }
    }
    bail!("unknown spec-id {name:?}")
}

fn custom_tokens(c: &CustomConfig) -> TokenStream {
    let tier = match c.performance_tier {
        PerformanceTier::HighPerformance => quote! { HighPerformance },
        PerformanceTier::LowPower => quote! { LowPower },
        PerformanceTier::UltraLowPower => quote! { UltraLowPower },
    };
    let primary = idle_tokens(c.primary_core_idle_policy);
    let secondary = idle_tokens(c.secondary_core_idle_policy);
    let CustomConfig {
        boost_mode,
        pll_lp_hz,
        force_unity_clock_divider,
        disable_second_core,
        disable_secondary_power_domain,
        deep_sleep_disabled,
        ..
    } = *c;

    quote! {
        drv_pse84_power_api::CustomConfig {
            performance_tier: drv_pse84_power_api::PerformanceTier::#tier,
            boost_mode: #boost_mode,
            pll_lp_hz: #pll_lp_hz,
            force_unity_clock_divider: #force_unity_clock_divider,
            disable_second_core: #disable_second_core,
            disable_secondary_power_domain: #disable_secondary_power_domain,
            deep_sleep_disabled: #deep_sleep_disabled,
            primary_core_idle_policy: #primary,
            secondary_core_idle_policy: #secondary,
        }
    }
}

fn idle_tokens(p: IdlePolicy) -> TokenStream {
    let v = match p {
        IdlePolicy::Sleep => quote! { Sleep },
        IdlePolicy::DeepSleep => quote! { DeepSleep },
        IdlePolicy::Hibernate => quote! { Hibernate },
        IdlePolicy::SpinForever => quote! { SpinForever },
        IdlePolicy::RunBenchmark => quote! { RunBenchmark },
    };
    quote! { drv_pse84_power_api::IdlePolicy::#v }
}

/// Everything a `build.rs` needs: load, warn, write `$OUT_DIR/`[`OUTPUT`].
pub fn codegen(image: Image, default_path: &Path) -> Result<()> {
    let cfg = PowerConfig::load(default_path)?;
    for w in cfg.warnings() {
        println!("cargo:warning={w}");
    }

    let out_dir = std::env::var("OUT_DIR")?;
    let dest = Path::new(&out_dir).join(OUTPUT);
    std::fs::write(&dest, cfg.generate(image)?)
        .with_context(|| format!("writing {}", dest.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> PowerConfig {
        PowerConfig::from_toml(text).unwrap()
    }

    #[test]
    fn selector_by_number_and_name() {
        assert_eq!(parse("spec-id = 7").selector().unwrap(), 7);
        assert_eq!(parse("spec-id = \"SIDL00B\"").selector().unwrap(), 7);
        assert_eq!(parse("spec-id = \"sidhiba\"").selector().unwrap(), 20);
        assert_eq!(parse("spec-id = \"custom\"").selector().unwrap(), 21);
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert!(parse("spec-id = \"SIDX99Z\"").selector().is_err());
    }

    #[test]
    fn oversized_number_is_an_error() {
        assert!(parse("spec-id = 300").selector().is_err());
        assert!(parse("spec-id = -1").selector().is_err());
    }

    #[test]
    fn out_of_range_selector_only_warns() {
        let cfg = parse("spec-id = 42");
        assert_eq!(cfg.selector().unwrap(), 42);
        assert_eq!(cfg.warnings().len(), 1);
        assert!(cfg.generate(Image::Primary).unwrap().contains("42"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(PowerConfig::from_toml("spec-id = 1\nspecid = 2").is_err());
        assert!(PowerConfig::from_toml(
            "spec-id = 21\n[custom]\nturbo = true"
        )
        .is_err());
    }

    #[test]
    fn custom_defaults_fill_unset_keys() {
        let cfg = parse(
            r#"
            spec-id = "custom"
            [custom]
            performance-tier = "low-power"
            pll-lp-hz = 100_000_000
            secondary-idle = "deep-sleep"
            "#,
        );
        let c = cfg.custom();
        assert_eq!(c.performance_tier, PerformanceTier::LowPower);
        assert_eq!(c.pll_lp_hz, 100_000_000);
        assert_eq!(c.secondary_core_idle_policy, IdlePolicy::DeepSleep);
        assert_eq!(
            c.primary_core_idle_policy,
            CustomConfig::DEFAULT.primary_core_idle_policy
        );
        assert!(cfg.warnings().is_empty());
    }

    #[test]
    fn custom_section_without_custom_selector_warns() {
        let cfg = parse("spec-id = 3\n[custom]\nboost = true");
        assert_eq!(cfg.warnings().len(), 1);
    }

    #[test]
    fn boot_options_default_to_handshake() {
        let out = parse("spec-id = 1").generate(Image::Primary).unwrap();
        assert!(out.contains("SyncMode::HANDSHAKE"));
        assert!(out.contains("UnverifiedModePolicy::Continue"));
    }

    #[test]
    fn strict_settle_boot_options() {
        let out = parse(
            "spec-id = 1\n[boot]\nsync = \"settle\"\nstrict-mode-check = true",
        )
        .generate(Image::Primary)
        .unwrap();
        assert!(out.contains("SyncMode::SETTLE"));
        assert!(out.contains("UnverifiedModePolicy::Halt"));
    }

    #[test]
    fn secondary_gets_no_boot_options() {
        let out = parse("spec-id = 5").generate(Image::Secondary).unwrap();
        assert!(out.contains("pub const SELECTOR: u8 = 5u8;"));
        assert!(out.contains("pub const CUSTOM"));
        assert!(!out.contains("BOOT_OPTIONS"));
    }

    #[test]
    fn generated_custom_is_valid_rust() {
        let out = parse(
            r#"
            spec-id = 21
            [custom]
            performance-tier = "ultra-low-power"
            disable-second-core = true
            primary-idle = "spin-forever"
            "#,
        )
        .generate(Image::Primary)
        .unwrap();
        syn::parse_file(&out).unwrap();
        assert!(out.contains("PerformanceTier::UltraLowPower"));
        assert!(out.contains("IdlePolicy::SpinForever"));
        assert!(out.contains("disable_second_core: true"));
    }
}

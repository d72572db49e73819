// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power-mode sequencing for the PSOC Edge E84.
//!
//! Each image calls one entry point with the selector baked in at build
//! time:
//!
//! - the CM33 calls [`run_primary`], which resolves the bundle, starts the
//!   CM55, moves the system into its power mode, tears down whatever the
//!   bundle says is unused and then idles;
//! - the CM55 calls [`run_secondary`], which releases the resources the CM55
//!   never uses, tells the CM33 it is done, and idles.
//!
//! Neither returns. Any fault on the way is fatal (see [`fatal`]).
//!
//! All hardware access goes through the traits in [`hw`], so the whole
//! sequence runs on the host against a fake.

#![cfg_attr(not(test), no_std)]

pub mod boot;
pub mod hw;
pub mod idle;
pub mod sequencer;

#[cfg(test)]
mod fake;

use drv_pse84_power_api::{
    resolve, Core, CustomConfig, PerformanceTier, ResolveError,
};
use ringbuf::{ringbuf, ringbuf_entry};

pub use boot::SyncMode;
pub use hw::Hardware;
pub use sequencer::{ModeEntry, UnverifiedModePolicy};

/// Everything that stops a core.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fault {
    /// Board support initialization failed before any sequencing.
    BoardInit,
    /// The DPLL-LP refused a configure or enable request.
    ClockConfiguration(ClockStep),
    /// A bundle asked for the DPLL-LP without saying at what frequency.
    MissingPllTarget,
    /// The system mode change itself returned an error.
    PowerModeEntry(PerformanceTier),
    /// The selector is not one of the known operating points.
    InvalidSelector(u8),
    /// The CM55 never raised its ready flag.
    SecondaryBootTimeout,
    /// The system mode change was accepted but not observed, under
    /// [`UnverifiedModePolicy::Halt`].
    UnverifiedModeEntry(PerformanceTier),
    /// Rust panic.
    Panic,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClockStep {
    Configure,
    Enable,
}

impl From<ResolveError> for Fault {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::InvalidSelector(raw) => Fault::InvalidSelector(raw),
        }
    }
}

/// Build-time knobs that are not part of the operating point itself.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BootOptions {
    pub sync: SyncMode,
    pub unverified_mode: UnverifiedModePolicy,
}

impl BootOptions {
    pub const DEFAULT: BootOptions = BootOptions {
        sync: SyncMode::HANDSHAKE,
        unverified_mode: UnverifiedModePolicy::Continue,
    };
}

impl Default for BootOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Copy, Clone, PartialEq)]
enum Trace {
    None,
    Fatal(Fault),
}

ringbuf!(Trace, 4, Trace::None);

/// Stops the core with `fault`. Never returns.
pub fn fatal<H: hw::Cpu>(hw: &mut H, fault: Fault) -> ! {
    ringbuf_entry!(Trace::Fatal(fault));
    hw.halt(fault)
}

/// CM33 entry point.
pub fn run_primary<H: Hardware>(
    hw: &mut H,
    selector: u8,
    custom: &CustomConfig,
    options: &BootOptions,
    boot_address: u32,
) -> ! {
    let bundle = match resolve(selector, custom) {
        Ok(b) => b,
        Err(e) => fatal(hw, e.into()),
    };

    if let Err(f) =
        sequencer::apply_primary(hw, &bundle, options, boot_address)
    {
        fatal(hw, f);
    }

    idle::IdleExecutor::new(Core::Primary, &bundle).run(hw)
}

/// CM55 entry point.
pub fn run_secondary<H: Hardware>(
    hw: &mut H,
    selector: u8,
    custom: &CustomConfig,
) -> ! {
    let bundle = match resolve(selector, custom) {
        Ok(b) => b,
        Err(e) => fatal(hw, e.into()),
    };

    sequencer::apply_secondary(hw, &bundle);

    idle::IdleExecutor::new(Core::Secondary, &bundle).run(hw)
}

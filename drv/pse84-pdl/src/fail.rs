// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Recording a fatal fault where a debugger can find it.
//!
//! Binary interface to debuggers:
//!
//! - `drv_pse84_pdl::fail::POWER_HAS_FAILED` is a `bool`, cleared by the
//!   startup code and set once [`halt`] is entered.
//! - `drv_pse84_pdl::fail::POWER_FAULT` is an `Option<Fault>` holding the
//!   first fault. It is `None` whenever `POWER_HAS_FAILED` is false.

use core::sync::atomic::Ordering;

use drv_pse84_power_seq::Fault;

#[used]
static mut POWER_HAS_FAILED: bool = false;

#[used]
static mut POWER_FAULT: Option<Fault> = None;

/// Masks interrupts, records `fault`, traps to an attached debugger and
/// parks the core.
pub fn halt(fault: Fault) -> ! {
    cortex_m::interrupt::disable();

    // Safety: interrupts are off and this core never leaves this function,
    // so nothing else can be looking at either static.
    let previous = unsafe {
        core::ptr::replace(core::ptr::addr_of_mut!(POWER_HAS_FAILED), true)
    };
    if !previous {
        // A fault while recording a fault (a panic in here, say) keeps the
        // first one.
        unsafe {
            core::ptr::addr_of_mut!(POWER_FAULT).write(Some(fault));
        }
    }
    core::sync::atomic::fence(Ordering::SeqCst);

    cfg_if::cfg_if! {
        if #[cfg(feature = "debug-trap")] {
            if cortex_m::peripheral::DCB::is_debugger_attached() {
                cortex_m::asm::bkpt();
            }
        }
    }

    loop {
        cortex_m::asm::wfi();
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CM55 image. Started by the CM33; gives up what it does not use and
//! idles.

#![no_std]
#![no_main]

use cortex_m_rt::entry;
use drv_pse84_pdl::Pdl;
use drv_pse84_power_seq::{fatal, run_secondary, Fault};

mod config {
    include!(concat!(env!("OUT_DIR"), "/power_config.rs"));
}

#[entry]
fn main() -> ! {
    // Safety: this is the only handle on this core.
    let mut hw = unsafe { Pdl::new() };
    if hw.init_board().is_err() {
        fatal(&mut hw, Fault::BoardInit);
    }

    run_secondary(&mut hw, config::SELECTOR, &config::CUSTOM)
}

#[panic_handler]
fn panic(_info: &core::panic::PanicInfo<'_>) -> ! {
    drv_pse84_pdl::halt(Fault::Panic)
}

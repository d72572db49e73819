// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The PSOC Edge E84 hardware, as seen by the power sequencer.
//!
//! [`Pdl`] implements the sequencer's hardware traits by calling into the
//! Infineon peripheral driver library through the BSP glue in [`ffi`].
//! Both images link this crate; each side only calls what it needs.

#![no_std]

pub mod fail;
pub mod ffi;

use core::sync::atomic::Ordering;

use drv_pse84_power_api::{HfClock, PerformanceTier, PeriSlave, PowerDomain};
use drv_pse84_power_seq::hw::{
    Clocks, Cores, Cpu, Domains, DriverStatus, RramVoltage, SystemPower,
};
use drv_pse84_power_seq::Fault;
use num_traits::FromPrimitive;
use ringbuf::{ringbuf, ringbuf_entry};

pub use fail::halt;
use ffi::{PdcmId, PmStatus, Ppu, RramVmode, SysClkStatus, SysPmStatus};

/// Value of the handshake word once the CM55 is done. Anything else,
/// including whatever the SRAM powered up with, means not ready.
const CM55_READY: u32 = 0xC55E_2EAD;

/// Reported for a dependency pair the PDCM has no link for.
const NO_DEPENDENCY_LINK: DriverStatus = DriverStatus(u32::MAX);

#[derive(Copy, Clone, PartialEq)]
enum Trace {
    None,
    BspInit(u32),
    SysClk(SysClkStatus),
    SysPm(SysPmStatus),
    Unknown(u32),
    PowerStatus(PmStatus),
    NoDependencyLink(PowerDomain, PowerDomain),
    PpuOff(Ppu, u32),
}

ringbuf!(Trace, 16, Trace::None);

/// Handle on the system's clock and power hardware.
pub struct Pdl {
    _private: (),
}

impl Pdl {
    /// Claims the hardware.
    ///
    /// # Safety
    ///
    /// At most one `Pdl` may exist per core.
    pub unsafe fn new() -> Self {
        Pdl { _private: () }
    }

    /// Runs the BSP bring-up generated by the device configurator and
    /// unmasks interrupts, which the idle policies need for wakeup.
    pub fn init_board(&mut self) -> Result<(), u32> {
        let r = unsafe { ffi::pse84_bsp_init() };
        if r != ffi::BSP_SUCCESS {
            ringbuf_entry!(Trace::BspInit(r));
            return Err(r);
        }
        unsafe { cortex_m::interrupt::enable() };
        Ok(())
    }

    /// Where the CM55 image starts.
    pub fn secondary_boot_address() -> u32 {
        unsafe { core::ptr::addr_of!(ffi::__pse84_cm55_boot) as u32 }
    }
}

fn sysclk(raw: u32) -> Result<(), DriverStatus> {
    match SysClkStatus::from_u32(raw) {
        Some(SysClkStatus::Success) => Ok(()),
        Some(s) => {
            ringbuf_entry!(Trace::SysClk(s));
            Err(DriverStatus(raw))
        }
        None => {
            ringbuf_entry!(Trace::Unknown(raw));
            Err(DriverStatus(raw))
        }
    }
}

fn syspm(raw: u32) -> Result<(), DriverStatus> {
    match SysPmStatus::from_u32(raw) {
        Some(SysPmStatus::Success) => Ok(()),
        Some(s) => {
            ringbuf_entry!(Trace::SysPm(s));
            Err(DriverStatus(raw))
        }
        None => {
            ringbuf_entry!(Trace::Unknown(raw));
            Err(DriverStatus(raw))
        }
    }
}

impl Clocks for Pdl {
    fn pll_disable(&mut self) {
        unsafe { ffi::pse84_pll_disable() }
    }

    fn pll_configure(
        &mut self,
        input_hz: u32,
        output_hz: u32,
    ) -> Result<(), DriverStatus> {
        sysclk(unsafe { ffi::pse84_pll_configure(input_hz, output_hz) })
    }

    fn pll_enable(&mut self, timeout_us: u32) -> Result<(), DriverStatus> {
        sysclk(unsafe { ffi::pse84_pll_enable(timeout_us) })
    }

    fn hf_no_divide(&mut self, clock: HfClock) {
        unsafe { ffi::pse84_clk_hf_no_divide(clock as u32) }
    }

    fn hf_disable(&mut self, clock: HfClock) {
        unsafe { ffi::pse84_clk_hf_disable(clock as u32) }
    }

    fn peri_slave_deinit(&mut self, s: PeriSlave) {
        unsafe {
            ffi::pse84_peri_group_slave_deinit(
                s.peri.into(),
                s.group.into(),
                s.slave.into(),
            )
        }
    }
}

impl SystemPower for Pdl {
    fn enter_low_power(&mut self) -> Result<(), DriverStatus> {
        syspm(unsafe { ffi::pse84_syspm_enter_lp() })
    }

    fn enter_ultra_low_power(&mut self) -> Result<(), DriverStatus> {
        syspm(unsafe { ffi::pse84_syspm_enter_ulp() })
    }

    fn in_system_mode(&mut self, tier: PerformanceTier) -> bool {
        let status = PmStatus::from_bits_truncate(unsafe {
            ffi::pse84_syspm_read_status()
        });
        ringbuf_entry!(Trace::PowerStatus(status));
        status.contains(match tier {
            PerformanceTier::HighPerformance => PmStatus::SYSTEM_HP,
            PerformanceTier::LowPower => PmStatus::SYSTEM_LP,
            PerformanceTier::UltraLowPower => PmStatus::SYSTEM_ULP,
        })
    }

    fn set_rram_voltage(&mut self, mode: RramVoltage) {
        let vmode = match mode {
            RramVoltage::LowPower => RramVmode::Lp,
            RramVoltage::UltraLowPower => RramVmode::Ulp,
        };
        unsafe { ffi::pse84_rram_set_voltage_mode(vmode as u32) }
    }

    fn set_deep_sleep_off(&mut self) {
        unsafe { ffi::pse84_syspm_set_deep_sleep_off() }
    }

    fn set_bandgap_low_power(&mut self) {
        unsafe { ffi::pse84_bgref_low_power() }
    }

    fn set_socmem_enabled(&mut self, enabled: bool) {
        unsafe { ffi::pse84_socmem_enable(enabled) }
    }
}

impl Domains for Pdl {
    fn clear_dependency(
        &mut self,
        dependent: PowerDomain,
        on: PowerDomain,
    ) -> Result<(), DriverStatus> {
        let (Some(d), Some(o)) = (pdcm(dependent), pdcm(on)) else {
            ringbuf_entry!(Trace::NoDependencyLink(dependent, on));
            return Err(NO_DEPENDENCY_LINK);
        };
        unsafe { ffi::pse84_pdcm_clear_dependency(d as u32, o as u32) }
        Ok(())
    }

    fn power_off(&mut self, domain: PowerDomain) -> Result<(), DriverStatus> {
        let ppu = match domain {
            PowerDomain::Pd1 => Ppu::Pd1,
            PowerDomain::SocMem => Ppu::SocMem,
            PowerDomain::AppCpuSs => Ppu::AppCpuSs,
            PowerDomain::AppCpu => Ppu::AppCpu,
            // The CM33 does not switch itself off.
            PowerDomain::SysCpu => return Ok(()),
        };
        match unsafe { ffi::pse84_ppu_power_off(ppu as u32) } {
            ffi::PPU_SUCCESS => Ok(()),
            r => {
                ringbuf_entry!(Trace::PpuOff(ppu, r));
                Err(DriverStatus(r))
            }
        }
    }
}

fn pdcm(domain: PowerDomain) -> Option<PdcmId> {
    match domain {
        PowerDomain::AppCpuSs => Some(PdcmId::AppCpuSs),
        PowerDomain::SysCpu => Some(PdcmId::SysCpu),
        _ => None,
    }
}

impl Cores for Pdl {
    fn enable_secondary(&mut self, boot_address: u32, wait_us: u32) {
        unsafe { ffi::pse84_enable_cm55(boot_address, wait_us) }
    }

    fn ready_flag(&mut self) -> bool {
        let word = unsafe { &ffi::__pse84_cm55_ready };
        word.load(Ordering::Acquire) == CM55_READY
    }

    fn set_ready_flag(&mut self, ready: bool) {
        let word = unsafe { &ffi::__pse84_cm55_ready };
        word.store(if ready { CM55_READY } else { 0 }, Ordering::Release);
    }
}

impl Cpu for Pdl {
    fn sleep(&mut self) {
        unsafe { ffi::pse84_cpu_enter_sleep() }
    }

    fn deep_sleep(&mut self) {
        unsafe { ffi::pse84_cpu_enter_deep_sleep() }
    }

    fn write_deep_sleep_off_token(&mut self) {
        unsafe { ffi::pse84_pwr_hibernate_set(ffi::DEEP_SLEEP_OFF_TOKEN) }
    }

    fn hibernate(&mut self) -> ! {
        unsafe { ffi::pse84_system_enter_hibernate() }
    }

    fn benchmark_pass(&mut self) {
        unsafe { ffi::dhrystone() }
    }

    fn delay_us(&mut self, us: u32) {
        unsafe { ffi::pse84_delay_us(us) }
    }

    fn halt(&mut self, fault: Fault) -> ! {
        fail::halt(fault)
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The C side.
//!
//! Most of the PDL is macros and `static inline` functions over
//! configurator-generated headers, none of which can be called from Rust.
//! The BSP therefore exports one flat function per primitive (`pse84_*`),
//! each a direct call into the PDL with the board's path numbers and PPU
//! bases filled in. Everything here is plain `u32`s; the enums and flags
//! below define what those numbers mean on both sides.

use bitflags::bitflags;
use num_derive::FromPrimitive;

/// `cy_en_sysclk_status_t`.
#[repr(u32)]
#[derive(Copy, Clone, Debug, FromPrimitive, PartialEq, Eq)]
pub enum SysClkStatus {
    Success = 0,
    BadParam = 0x004A_0001,
    Timeout = 0x004A_0002,
    InvalidState = 0x004A_0003,
    UnsupportedState = 0x004A_0004,
}

/// `cy_en_syspm_status_t`.
#[repr(u32)]
#[derive(Copy, Clone, Debug, FromPrimitive, PartialEq, Eq)]
pub enum SysPmStatus {
    Success = 0,
    BadParam = 0x0042_0001,
    Timeout = 0x0042_0002,
    InvalidState = 0x0042_0003,
    Canceled = 0x0042_0004,
    SyscallPending = 0x0042_0005,
    Fail = 0x0042_00FF,
}

/// `cy_rslt_t` from `cybsp_init`. Anything but zero is a failure, and the
/// module/code split is not interesting here.
pub const BSP_SUCCESS: u32 = 0;

bitflags! {
    /// System power mode bits as reported by `pse84_syspm_read_status`.
    /// The glue translates `Cy_SysPm_ReadStatus` into these.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct PmStatus: u32 {
        const SYSTEM_HP = 1 << 0;
        const SYSTEM_LP = 1 << 1;
        const SYSTEM_ULP = 1 << 2;
    }
}

/// RRAM voltage modes, `cy_en_rram_vmode_t` order.
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RramVmode {
    Lp = 1,
    Ulp = 2,
}

/// PPU selector for `pse84_ppu_power_off`, mapped by the glue to the
/// `CY_PPU_*_BASE` register blocks.
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Ppu {
    Pd1 = 0,
    SocMem = 1,
    AppCpuSs = 2,
    AppCpu = 3,
}

/// `cy_pd_pdcm_id_t` subset.
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PdcmId {
    SysCpu = 3,
    AppCpuSs = 5,
}

/// `CY_PPU_SUCCESS`.
pub const PPU_SUCCESS: u32 = 0;

/// Written into `SRSS_PWR_HIBERNATE` before a DeepSleep-OFF entry.
pub const DEEP_SLEEP_OFF_TOKEN: u32 = 0xB1;

extern "C" {
    /// `cybsp_init`.
    pub fn pse84_bsp_init() -> u32;

    pub fn pse84_pll_disable();
    pub fn pse84_pll_configure(input_hz: u32, output_hz: u32) -> u32;
    pub fn pse84_pll_enable(timeout_us: u32) -> u32;

    pub fn pse84_clk_hf_no_divide(hf: u32);
    pub fn pse84_clk_hf_disable(hf: u32);
    pub fn pse84_peri_group_slave_deinit(peri: u32, group: u32, slave: u32);

    pub fn pse84_syspm_enter_lp() -> u32;
    pub fn pse84_syspm_enter_ulp() -> u32;
    pub fn pse84_syspm_read_status() -> u32;
    pub fn pse84_syspm_set_deep_sleep_off();
    pub fn pse84_rram_set_voltage_mode(vmode: u32);
    pub fn pse84_bgref_low_power();
    pub fn pse84_socmem_enable(enable: bool);
    /// ORs `token` into `SRSS_PWR_HIBERNATE`.
    pub fn pse84_pwr_hibernate_set(token: u32);

    pub fn pse84_pdcm_clear_dependency(dependent: u32, on: u32);
    /// Returns the PPU driver status, [`PPU_SUCCESS`] on success.
    pub fn pse84_ppu_power_off(ppu: u32) -> u32;

    pub fn pse84_enable_cm55(boot_address: u32, wait_us: u32);

    pub fn pse84_cpu_enter_sleep();
    pub fn pse84_cpu_enter_deep_sleep();
    pub fn pse84_system_enter_hibernate() -> !;
    pub fn pse84_delay_us(us: u32);

    /// One pass of the Dhrystone benchmark, linked in from C.
    pub fn dhrystone();
}

#[allow(non_upper_case_globals)]
extern "C" {
    /// First word of the CM55 image (the vector table past the MCUboot
    /// header), placed by the BSP linker script.
    pub static __pse84_cm55_boot: u32;

    /// Handshake word in SRAM that both images map at the same address and
    /// neither image's startup code initializes.
    pub static __pse84_cm55_ready: core::sync::atomic::AtomicU32;
}

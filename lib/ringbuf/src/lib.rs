// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Static trace buffers for the power-mode firmware.
//!
//! Neither core has a console, so everything the sequencer wants to say is
//! written into a fixed-size ring buffer in RAM and read back with a
//! debugger. A buffer holds entries of one `Copy + PartialEq` type, usually a
//! module-local `Trace` enum.
//!
//! ```ignore
//! #[derive(Copy, Clone, PartialEq)]
//! enum Trace {
//!     None,
//!     PllLocked(u32),
//! }
//!
//! ringbuf!(Trace, 32, Trace::None);
//!
//! ringbuf_entry!(Trace::PllLocked(70_000_000));
//! ```
//!
//! A module that wants more than one buffer names them:
//! `ringbuf!(BOOT_RINGBUF, Trace, 8, Trace::None)` and
//! `ringbuf_entry!(BOOT_RINGBUF, Trace::PllLocked(hz))`.
//!
//! Recording the same payload from the same line twice in a row bumps the
//! `count` of the existing entry instead of taking a new slot, so polling
//! loops don't flush the interesting history out of the buffer.
//!
//! ## Reading a buffer
//!
//! With symbols loaded, GDB prints the buffer directly; the unnamed buffer of
//! a module is called `__RINGBUF`:
//!
//! ```console
//! (gdb) set print pretty on
//! (gdb) print drv_pse84_power_seq::sequencer::__RINGBUF
//! ```
//!
//! `last` is the index of the most recent entry; `generation` tells how many
//! times a slot has been overwritten.

#![cfg_attr(not(test), no_std)]

mod cell;

pub use cell::{TraceCell, TraceRef};

/// Declares a ring buffer in the current module.
///
/// `ringbuf!(NAME, Type, N, init)` makes a static `NAME` holding `N` entries
/// of `Type`, all initialized to `init`. Without a name the buffer is called
/// `__RINGBUF`.
#[cfg(not(feature = "disabled"))]
#[macro_export]
macro_rules! ringbuf {
    ($name:ident, $t:ty, $n:expr, $init:expr) => {
        #[used]
        static $name: $crate::TraceCell<$crate::Ringbuf<$t, $n>> =
            $crate::TraceCell::new($crate::Ringbuf {
                last: None,
                buffer: [$crate::RingbufEntry {
                    line: 0,
                    generation: 0,
                    count: 0,
                    payload: $init,
                }; $n],
            });
    };
    ($t:ty, $n:expr, $init:expr) => {
        $crate::ringbuf!(__RINGBUF, $t, $n, $init);
    };
}

#[cfg(feature = "disabled")]
#[macro_export]
macro_rules! ringbuf {
    ($name:ident, $t:ty, $n:expr, $init:expr) => {
        #[allow(dead_code)]
        const _: $t = $init;
    };
    ($t:ty, $n:expr, $init:expr) => {
        #[allow(dead_code)]
        const _: $t = $init;
    };
}

/// Records `payload` in a ring buffer declared with [`ringbuf!`].
///
/// If the buffer is busy the entry is dropped.
#[cfg(not(feature = "disabled"))]
#[macro_export]
macro_rules! ringbuf_entry {
    ($buf:expr, $payload:expr) => {{
        // Evaluate the payload before touching the buffer so the payload
        // expression can never observe the borrow.
        let (p, buf) = ($payload, &$buf);
        if let Some(mut rb) = $crate::TraceCell::try_borrow_mut(buf) {
            $crate::Ringbuf::entry(&mut *rb, line!() as u16, p);
        }
    }};
    ($payload:expr) => {
        $crate::ringbuf_entry!(__RINGBUF, $payload);
    };
}

#[cfg(feature = "disabled")]
#[macro_export]
macro_rules! ringbuf_entry {
    ($buf:expr, $payload:expr) => {{
        let _ = &$buf;
        let _ = &$payload;
    }};
    ($payload:expr) => {{
        let _ = &$payload;
    }};
}

/// One slot of a [`Ringbuf`].
#[derive(Debug, Copy, Clone)]
pub struct RingbufEntry<T: Copy + PartialEq> {
    pub line: u16,
    pub generation: u16,
    pub count: u32,
    pub payload: T,
}

/// A ring buffer of `N` entries. Normally declared through [`ringbuf!`].
#[derive(Debug)]
pub struct Ringbuf<T: Copy + PartialEq, const N: usize> {
    pub last: Option<usize>,
    pub buffer: [RingbufEntry<T>; N],
}

impl<T: Copy + PartialEq, const N: usize> Ringbuf<T, N> {
    pub fn entry(&mut self, line: u16, payload: T) {
        // An empty buffer has no previous entry; usize::MAX is out of range
        // for both the reuse check and the advance below.
        let last = self.last.unwrap_or(usize::MAX);

        if let Some(ent) = self.buffer.get_mut(last) {
            if ent.line == line && ent.payload == payload {
                if let Some(new_count) = ent.count.checked_add(1) {
                    ent.count = new_count;
                    return;
                }
            }
        }

        // Compare rather than modulus: this also folds usize::MAX back to
        // slot 0.
        let ndx = match last.wrapping_add(1) {
            n if n >= N => 0,
            n => n,
        };

        let ent = &mut self.buffer[ndx];
        *ent = RingbufEntry {
            line,
            payload,
            count: 1,
            generation: ent.generation.wrapping_add(1),
        };

        self.last = Some(ndx);
    }

    /// Entries from oldest to newest, skipping slots never written.
    pub fn iter(&self) -> impl Iterator<Item = &RingbufEntry<T>> + '_ {
        let start = match self.last {
            Some(last) => last + 1,
            None => N,
        };
        self.buffer[start.min(N)..]
            .iter()
            .chain(self.buffer[..start.min(N)].iter())
            .filter(|e| e.generation != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty<const N: usize>() -> Ringbuf<u8, N> {
        Ringbuf {
            last: None,
            buffer: [RingbufEntry {
                line: 0,
                generation: 0,
                count: 0,
                payload: 0,
            }; N],
        }
    }

    #[test]
    fn repeats_fold_into_one_slot() {
        let mut rb = empty::<4>();
        rb.entry(10, 7);
        rb.entry(10, 7);
        rb.entry(10, 7);
        assert_eq!(rb.last, Some(0));
        assert_eq!(rb.buffer[0].count, 3);

        // Same payload from a different line is a new event.
        rb.entry(11, 7);
        assert_eq!(rb.last, Some(1));
    }

    #[test]
    fn wraps_and_bumps_generation() {
        let mut rb = empty::<3>();
        for p in 1..=4 {
            rb.entry(1, p);
        }
        assert_eq!(rb.last, Some(0));
        assert_eq!(rb.buffer[0].payload, 4);
        assert_eq!(rb.buffer[0].generation, 2);

        let order: Vec<u8> = rb.iter().map(|e| e.payload).collect();
        assert_eq!(order, [2, 3, 4]);
    }

    #[test]
    fn iter_skips_unwritten_slots() {
        let mut rb = empty::<8>();
        rb.entry(1, 9);
        rb.entry(2, 8);
        let order: Vec<u8> = rb.iter().map(|e| e.payload).collect();
        assert_eq!(order, [9, 8]);
    }
}

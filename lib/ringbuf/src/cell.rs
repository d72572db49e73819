// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, Ordering};

/// A single-borrower cell that can live in a `static`.
///
/// Unlike `RefCell`, a failed borrow is not an error: the trace path calls
/// [`TraceCell::try_borrow_mut`] and simply drops the event when the buffer
/// is already held (e.g. an interrupt handler tracing on top of a sequencing
/// step).
pub struct TraceCell<T> {
    borrowed: AtomicBool,
    cell: UnsafeCell<T>,
}

impl<T> TraceCell<T> {
    pub const fn new(contents: T) -> Self {
        Self {
            borrowed: AtomicBool::new(false),
            cell: UnsafeCell::new(contents),
        }
    }

    /// Gets exclusive access to the contents, or `None` if someone else
    /// already has it.
    pub fn try_borrow_mut(&self) -> Option<TraceRef<'_, T>> {
        if self.borrowed.swap(true, Ordering::Acquire) {
            return None;
        }
        // Safety: the swap above guarantees we are the only holder of a
        // `&mut` to the contents until the guard is dropped.
        Some(TraceRef {
            contents: unsafe { &mut *self.cell.get() },
            borrow: &self.borrowed,
        })
    }
}

unsafe impl<T> Sync for TraceCell<T> where for<'a> &'a mut T: Send {}

pub struct TraceRef<'a, T> {
    contents: &'a mut T,
    borrow: &'a AtomicBool,
}

impl<T> Drop for TraceRef<'_, T> {
    fn drop(&mut self) {
        self.borrow.store(false, Ordering::Release);
    }
}

impl<T> core::ops::Deref for TraceRef<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.contents
    }
}

impl<T> core::ops::DerefMut for TraceRef<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.contents
    }
}

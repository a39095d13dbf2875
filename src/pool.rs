//! L1 — fixed-pool allocator (§4.1, §3 "Work buffer").
//!
//! Carves fixed-size spans out of a single caller-supplied work buffer once
//! at stream init. There is no per-allocation free: the whole arena is
//! released implicitly when the caller drops the stream (and reused when the
//! caller passes the same backing buffer to a new stream). This is the
//! allocator-callback replacement described in spec.md §9 ("Allocator
//! callbacks → arena index"): each sub-allocation hands back a slice
//! borrowed from the original buffer rather than a pointer obtained from a
//! global allocator.
//!
//! Unlike the teacher crate (which heap-allocates streaming contexts with
//! `Box::new`, see `block/stream.rs`), every type in this crate that needs
//! scratch memory gets it from a [`Pool`] instead — no allocation happens
//! after [`Pool::new`].

use crate::error::PoolError;

/// A bump allocator over a single caller-owned byte span.
///
/// `used + remaining_len()` is invariant for the lifetime of the pool
/// (spec.md §3: "Pool cursor only advances").
pub struct Pool<'a> {
    buf: &'a mut [u8],
    used: usize,
}

impl<'a> Pool<'a> {
    /// Wrap a caller-supplied work buffer. Nothing is allocated yet.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Pool { buf, used: 0 }
    }

    /// Bytes sub-allocated so far.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Bytes still available.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Carve `n` bytes off the front of the remaining pool.
    ///
    /// Equivalent to the C pool's `alloc(items=n, size=1)`. Returns
    /// [`PoolError`] rather than a null sentinel — the caller gets a typed
    /// `Result` instead of having to check a pointer against `NULL`.
    pub fn alloc_bytes(&mut self, n: usize) -> Result<&'a mut [u8], PoolError> {
        if n > self.buf.len() {
            return Err(PoolError {
                requested: n,
                remaining: self.buf.len(),
            });
        }
        // Swap out the borrow so we can split it without holding `&mut self`
        // across the return value — this is the only way to hand back a
        // sub-slice with the pool's original lifetime `'a` rather than a
        // lifetime tied to `&mut self`.
        let whole = core::mem::take(&mut self.buf);
        let (head, tail) = whole.split_at_mut(n);
        self.buf = tail;
        self.used += n;
        Ok(head)
    }

    /// Carve out room for `count` values of `T` and return it as a zeroed
    /// `&mut [T]`.
    ///
    /// Equivalent to the C pool's `alloc(items=count, size=size_of::<T>())`,
    /// generalized from raw bytes to a typed slice. Asserts `count *
    /// size_of::<T>()` does not overflow `usize` before delegating to
    /// [`Pool::alloc_bytes`] (the overflow guard spec.md §9 flags as missing
    /// in the original FIXME-marked allocator).
    ///
    /// # Safety
    /// `T` must be a plain-old-data type with no padding and for which the
    /// all-zero bit pattern is valid (this crate only ever instantiates this
    /// with `u16`/`u32`). The caller-supplied work buffer must be aligned to
    /// at least `align_of::<T>()` — the pool does not insert padding to fix
    /// up a misaligned buffer, matching spec.md §4.1's documented
    /// requirement that callers provide a sufficiently aligned buffer.
    pub fn alloc<T: Copy>(&mut self, count: usize) -> Result<&'a mut [T], PoolError> {
        let elem_size = core::mem::size_of::<T>();
        let total = count
            .checked_mul(elem_size)
            .expect("pool allocation size overflowed usize");
        let bytes = self.alloc_bytes(total)?;
        bytes.fill(0);
        debug_assert_eq!(bytes.as_ptr() as usize % core::mem::align_of::<T>(), 0);
        // SAFETY: `bytes` is exactly `count * size_of::<T>()` zeroed bytes,
        // carved exclusively for this call (no other live reference aliases
        // it), and is aligned per the function's documented precondition.
        // All-zero is a valid bit pattern for `T` by the function's contract.
        let typed = unsafe {
            core::slice::from_raw_parts_mut(bytes.as_mut_ptr().cast::<T>(), count)
        };
        Ok(typed)
    }
}

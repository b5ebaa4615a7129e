//! Region model (§3, "Heap region").
//!
//! Owns the cursor trio (`start`, `top`, `end`) and the optional inaccessible
//! gap that can appear between the static arena and a non-contiguous
//! program-break extension. Every physical-block traversal in `heap.rs`
//! consults `is_addressable` before dereferencing a neighbor, which is what
//! keeps a stray read of unrelated process data from being mis-interpreted
//! as a block header.

/// Live address-space bookkeeping for one allocator instance.
pub struct Region {
  /// First byte of the static arena.
  pub start: *mut u8,
  /// One past the last byte used by any block.
  pub top: *mut u8,
  /// One past the last byte currently owned by the process.
  pub end: *mut u8,
  /// Bounds of the inaccessible span between the static arena and a
  /// non-contiguous program-break extension, if one has occurred.
  pub gap_start: Option<*mut u8>,
  pub gap_end: Option<*mut u8>,
}

impl Region {
  /// # Safety
  ///
  /// `start` must point to the first byte of an allocation at least `size`
  /// bytes long, so that `start.add(size)` stays in bounds.
  pub unsafe fn new(start: *mut u8, size: usize) -> Self {
    Self {
      start,
      top: start,
      end: unsafe { start.add(size) },
      gap_start: None,
      gap_end: None,
    }
  }

  /// An address is addressable iff it lies in `[start, top)` and is not
  /// inside `[gap_start, gap_end)`.
  #[inline]
  pub fn is_addressable(&self, addr: *mut u8) -> bool {
    if addr < self.start || addr >= self.top {
      return false;
    }
    if let (Some(gs), Some(ge)) = (self.gap_start, self.gap_end)
      && addr >= gs
      && addr < ge
    {
      return false;
    }
    true
  }

  /// Records a non-contiguous extension. `gap_start` is the first byte this
  /// process no longer meaningfully owns for block purposes: the old `end`
  /// if the `end - top` sliver was large enough to become a real free
  /// block (so every byte up to `end` is accounted for), or the old `top`
  /// if the sliver was too small and was left stranded (so the stranded
  /// bytes fall inside the gap and are skipped by traversal, rather than
  /// being silently unaccounted for).
  pub fn record_gap(&mut self, gap_start: *mut u8, new_region_start: *mut u8) {
    debug_assert!(self.gap_start.is_none(), "at most one gap is supported");
    self.gap_start = Some(gap_start);
    self.gap_end = Some(new_region_start);
  }
}

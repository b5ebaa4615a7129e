//! Core algorithms (§4.3–§4.7): `coalesce`, `first_fit`, `split`,
//! `grow_via_program_break`, and the `allocate`/`release` façade that
//! orchestrates them.
//!
//! This is the generalization of the teacher's `BumpAllocator`: instead of
//! always requesting fresh memory from `sbrk` on every call, a static arena
//! is carved from first, a segregated free list is searched and split before
//! growth is attempted, and freed blocks are coalesced with their physical
//! neighbors instead of only ever being reclaimed when they're the last
//! block in a singly linked list.

use std::cell::UnsafeCell;
use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::block::{self, Block, HEADER_SIZE, MIN_BLOCK_SIZE};
use crate::config::{DEFAULT_ARENA_SIZE, DEFAULT_MMAP_THRESHOLD, WORD_SIZE};
use crate::list::FreeLists;
use crate::mmap::{self, MmapRegistry};
use crate::platform;
use crate::region::Region;

/// Backing storage for every heap's static arena. A real C allocator's
/// static arena is a global array living in the data segment, contiguous
/// with where the program break starts growing — which is exactly what
/// makes a contiguous `sbrk` extension the common case and the gap (§4.6)
/// the exception. A `Vec`/`Box`-backed arena would instead be placed by the
/// general-purpose allocator, with no defined address relationship to the
/// program break, so each `Heap` claims a slice of one real `static` buffer
/// instead.
const ARENA_STORAGE_CAPACITY: usize = 1 << 20;

#[repr(align(16))]
struct ArenaStorage(UnsafeCell<[u8; ARENA_STORAGE_CAPACITY]>);

// SAFETY: access is only ever through disjoint, non-overlapping slices
// handed out by `claim_static_arena`, each owned exclusively by one `Heap`.
unsafe impl Sync for ArenaStorage {}

static ARENA_STORAGE: ArenaStorage = ArenaStorage(UnsafeCell::new([0u8; ARENA_STORAGE_CAPACITY]));
static ARENA_CURSOR: AtomicUsize = AtomicUsize::new(0);

fn claim_static_arena(size: usize) -> *mut u8 {
  let offset = ARENA_CURSOR.fetch_add(size, Ordering::Relaxed);
  assert!(
    offset + size <= ARENA_STORAGE_CAPACITY,
    "static arena storage exhausted (requested {size} bytes at offset {offset})"
  );
  unsafe { (ARENA_STORAGE.0.get() as *mut u8).add(offset) }
}

/// A single allocator instance: the static arena, the growable region, the
/// bucket table, and the large-block side registry. Owning one of these is
/// the "process-wide mutable state" the design notes call for; nothing here
/// is `Sync`, matching the single-threaded, synchronous model of §5.
pub struct Heap {
  region: Region,
  lists: FreeLists,
  mmap_registry: MmapRegistry,
  mmap_threshold: usize,
}

impl Default for Heap {
  fn default() -> Self {
    Self::new()
  }
}

impl Heap {
  pub fn new() -> Self {
    Self::with_config(DEFAULT_ARENA_SIZE, DEFAULT_MMAP_THRESHOLD)
  }

  /// Constructs a heap with an explicit arena size and mmap threshold.
  /// Exposed so tests can force both the contiguous and the gapped growth
  /// path (§9: "Tests must force both paths... by placing a large static
  /// buffer between the arena and the first extension" — a small arena
  /// size makes the first extension happen quickly and predictably).
  pub fn with_config(arena_size: usize, mmap_threshold: usize) -> Self {
    let start = claim_static_arena(arena_size);
    Self {
      // SAFETY: `start` was just claimed from `ARENA_STORAGE` and is valid
      // for `arena_size` bytes.
      region: unsafe { Region::new(start, arena_size) },
      lists: FreeLists::new(),
      mmap_registry: MmapRegistry::new(),
      mmap_threshold,
    }
  }

  /// `allocate(n)` (§4.7).
  ///
  /// # Safety
  ///
  /// Caller must eventually pass the returned pointer (if non-null) to
  /// [`Heap::release`] on this same `Heap`, at most once, and must not
  /// write past `n` bytes from it.
  pub unsafe fn allocate(&mut self, n: usize) -> *mut u8 {
    if n == 0 {
      return std::ptr::null_mut();
    }

    let aligned = align_up(n, WORD_SIZE);

    if aligned >= self.mmap_threshold {
      return unsafe { mmap::allocate(aligned, &mut self.mmap_registry) };
    }

    let total = total_block_size(aligned);

    unsafe {
      if let Some(b) = self.lists.first_fit(total) {
        self.lists.remove(b);
        let remainder = self.split(b, total);
        b.set_header(b.size_of(), true);
        b.write_footer();
        if let Some(r) = remainder {
          self.lists.insert(r);
        }
        return b.payload();
      }

      if self.fits_at_top(total) {
        return self.carve_at_top(total);
      }

      self.grow_via_program_break(total)
    }
  }

  /// `release(p)` (§4.7).
  ///
  /// # Safety
  ///
  /// `p` must be null or a pointer previously returned by [`Heap::allocate`]
  /// on this same `Heap`, not already released. Double-free and releasing a
  /// wild pointer are undefined behavior, matching `free`'s contract.
  pub unsafe fn release(&mut self, p: *mut u8) {
    if p.is_null() {
      return;
    }

    let b = unsafe { Block::from_payload(p) };

    if unsafe { b.is_mmaped() } {
      unsafe { mmap::release(p, &mut self.mmap_registry) };
      return;
    }

    unsafe {
      b.set_header(b.size_of(), false);
      b.write_footer();

      let survivor = self.coalesce(b);
      self.lists.insert(survivor);
    }
  }

  /// `split(block, needed)` (§4.4). Precondition: `block` has already been
  /// removed from its free list and is not yet marked used. Returns the
  /// carved-off remainder (not yet inserted into any bucket) if a split
  /// occurred.
  unsafe fn split(&mut self, b: Block, needed: usize) -> Option<Block> {
    unsafe {
      let current = b.size_of();
      if current < needed + MIN_BLOCK_SIZE {
        return None;
      }

      b.setup(needed, true);
      let remainder = b.next_physical();
      remainder.setup(current - needed, false);
      Some(remainder)
    }
  }

  /// `coalesce(block)` (§4.5). `block`'s `USED` bit must already be clear
  /// and its footer already refreshed. Merges with addressable, free
  /// physical neighbors; the survivor assumes the lowest address.
  unsafe fn coalesce(&mut self, block: Block) -> Block {
    unsafe {
      let mut survivor = block;
      let mut new_size = block.size_of();

      let next = survivor.next_physical();
      if self.region.is_addressable(next.0 as *mut u8) && !next.is_used() {
        self.lists.remove(next);
        new_size += next.size_of();
      }

      let block_addr = survivor.0 as *mut u8;
      let is_region_start = block_addr == self.region.start;
      let is_gap_end = self.region.gap_end == Some(block_addr);

      if !is_region_start && !is_gap_end {
        let footer_addr = block_addr.sub(block::FOOTER_SIZE);
        if self.region.is_addressable(footer_addr) {
          let prev = survivor.prev_physical();
          if self.region.is_addressable(prev.0 as *mut u8) && !prev.is_used() {
            self.lists.remove(prev);
            new_size += prev.size_of();
            survivor = prev;
          }
        }
      }

      survivor.setup(new_size, false);
      survivor
    }
  }

  #[inline]
  fn fits_at_top(&self, total: usize) -> bool {
    unsafe { self.region.top.add(total) <= self.region.end }
  }

  unsafe fn carve_at_top(&mut self, total: usize) -> *mut u8 {
    unsafe {
      let b = Block(self.region.top as *mut usize);
      b.setup(total, true);
      self.region.top = self.region.top.add(total);
      b.payload()
    }
  }

  /// `grow_via_program_break(total)` (§4.6).
  unsafe fn grow_via_program_break(&mut self, total: usize) -> *mut u8 {
    unsafe {
      let page = platform::page_size();
      let requested = align_up(total, page);

      let before = platform::current_program_break();
      let Some(granted_start) = platform::extend_program_break(requested) else {
        log::debug!("grow_via_program_break: sbrk({requested}) failed, returning null");
        return std::ptr::null_mut();
      };

      if granted_start == self.region.end {
        log::trace!("grow_via_program_break: contiguous extension of {requested} bytes");
        self.region.end = granted_start.add(requested);
      } else {
        log::debug!(
          "grow_via_program_break: non-contiguous extension, break was {before:p}, granted {granted_start:p}"
        );

        let slack = self.region.end as usize - self.region.top as usize;
        let gap_start = if slack >= MIN_BLOCK_SIZE {
          let residual = Block(self.region.top as *mut usize);
          residual.setup(slack, false);
          self.lists.insert(residual);
          self.region.end
        } else {
          self.region.top
        };

        self.region.record_gap(gap_start, granted_start);
        self.region.top = granted_start;
        self.region.end = granted_start.add(requested);
      }

      self.carve_at_top(total)
    }
  }

  /// Walks every live physical block from `start` to `top`, skipping the
  /// gap if one exists. Used by the debug dump and by tests that assert
  /// heap-wide invariants.
  ///
  /// # Safety
  ///
  /// Must not be called while a mutable reference to this `Heap` could
  /// observe a block mid-update (i.e. not during `allocate`/`release`).
  pub unsafe fn walk_blocks(&self) -> Vec<Block> {
    unsafe {
      let mut blocks = Vec::new();
      let mut cur = self.region.start;

      while cur < self.region.top {
        if let (Some(gs), Some(ge)) = (self.region.gap_start, self.region.gap_end)
          && cur == gs
        {
          cur = ge;
          continue;
        }
        let b = Block(cur as *mut usize);
        let size = b.size_of();
        blocks.push(b);
        cur = cur.add(size);
      }

      blocks
    }
  }

  pub fn region(&self) -> &Region {
    &self.region
  }

  pub fn lists(&self) -> &FreeLists {
    &self.lists
  }

  pub fn mmap_records(&self) -> &[mmap::MmapRecord] {
    &self.mmap_registry
  }
}

#[inline]
fn align_up(value: usize, alignment: usize) -> usize {
  crate::align_to!(value, alignment)
}

/// `total = sizeof(header) + aligned + sizeof(footer)`, raised to the
/// minimum block size if smaller.
#[inline]
fn total_block_size(aligned_payload: usize) -> usize {
  let total = HEADER_SIZE + aligned_payload + block::FOOTER_SIZE;
  total.max(MIN_BLOCK_SIZE)
}

const _: () = assert!(mem::size_of::<usize>() == WORD_SIZE);

#[cfg(test)]
mod tests {
  use super::*;

  fn is_aligned(p: *mut u8, align: usize) -> bool {
    (p as usize).is_multiple_of(align)
  }

  #[test]
  fn alignment_law() {
    let mut heap = Heap::new();
    unsafe {
      let p = heap.allocate(1);
      assert!(!p.is_null());
      assert!(is_aligned(p, WORD_SIZE));
      heap.release(p);
    }
  }

  #[test]
  fn reuse_after_release() {
    let mut heap = Heap::new();
    unsafe {
      let p1 = heap.allocate(64);
      heap.release(p1);
      let p2 = heap.allocate(64);
      assert_eq!(p1, p2);
    }
  }

  #[test]
  fn coalesce_and_reuse_span() {
    let mut heap = Heap::new();
    unsafe {
      let a = heap.allocate(4);
      let b = heap.allocate(4);
      let c = heap.allocate(4);

      let a_block = Block::from_payload(a);
      let c_block = Block::from_payload(c);
      let span_end = (c_block.0 as *mut u8).add(c_block.size_of());

      heap.release(a);
      heap.release(c);
      heap.release(b);

      let p = heap.allocate(12 * mem::size_of::<i32>());
      assert!(!p.is_null());
      assert!(p >= a_block.0 as *mut u8);
      assert!(p < span_end);
    }
  }

  #[test]
  fn split_leaves_residual_in_correct_bucket() {
    let mut heap = Heap::new();
    unsafe {
      let big = heap.allocate(600);
      heap.release(big);

      // A small allocation should be carved out of the now-free 600+ byte
      // block via split, leaving a residual free block behind.
      let small = heap.allocate(16);
      assert!(!small.is_null());

      let found = heap.lists.first_fit(1);
      assert!(found.is_some(), "expected a residual free block after split");
    }
  }

  #[test]
  fn no_adjacent_free_blocks_survive_release() {
    let mut heap = Heap::new();
    unsafe {
      let a = heap.allocate(64);
      let b = heap.allocate(64);
      let c = heap.allocate(64);
      heap.release(a);
      heap.release(b);
      heap.release(c);

      let blocks = heap.walk_blocks();
      let mut prev_free = false;
      for blk in blocks {
        let free = !blk.is_used();
        assert!(!(free && prev_free), "two adjacent free blocks survived release");
        prev_free = free;
      }
    }
  }

  #[test]
  fn null_release_is_noop() {
    let mut heap = Heap::new();
    unsafe {
      heap.release(std::ptr::null_mut());
    }
  }

  #[test]
  fn zero_size_allocate_returns_null() {
    let mut heap = Heap::new();
    unsafe {
      assert!(heap.allocate(0).is_null());
    }
  }

  #[test]
  fn large_block_goes_through_mmap_path() {
    let mut heap = Heap::new();
    unsafe {
      let p = heap.allocate(256 * 1024);
      assert!(!p.is_null());
      let block = Block::from_payload(p);
      assert!(block.is_mmaped());
      heap.release(p);
    }
  }

  #[test]
  fn growth_across_small_arena_produces_either_contiguous_or_gapped_extension() {
    // A tiny arena forces growth almost immediately.
    let mut heap = Heap::with_config(256, DEFAULT_MMAP_THRESHOLD);
    unsafe {
      let mut ptrs = Vec::new();
      for _ in 0..70 {
        let p = heap.allocate(100);
        assert!(!p.is_null());
        ptrs.push(p);
      }
      for p in ptrs {
        heap.release(p);
      }
    }
  }

  #[test]
  fn fragmentation_resilience() {
    let mut heap = Heap::new();
    unsafe {
      let mut larges = Vec::new();
      for _ in 0..10 {
        let l = heap.allocate(512);
        let s = heap.allocate(64);
        let m = heap.allocate(256);
        assert!(!l.is_null() && !s.is_null() && !m.is_null());
        heap.release(m);
        larges.push(l);
      }
      for l in larges {
        heap.release(l);
      }

      for _ in 0..10 {
        let p = heap.allocate(256);
        assert!(!p.is_null());
        heap.release(p);
      }
    }
  }
}

//! Tunable constants for the allocator.
//!
//! The teacher only ever had one knob (the `sbrk` increment computed inline
//! in `allocate`); this crate has three (arena size, large-block threshold,
//! word size), so they are centralized here instead of left as scattered
//! literals.

use std::mem;

/// Size of a machine word. All block sizes are multiples of this.
pub const WORD_SIZE: usize = mem::size_of::<usize>();

/// Default size of the static byte arena carved out before any program-break
/// extension is needed.
pub const DEFAULT_ARENA_SIZE: usize = 4 * 1024;

/// Requests at or above this many bytes (after alignment) bypass the heap
/// engine entirely and go straight to the large-block collaborator.
pub const DEFAULT_MMAP_THRESHOLD: usize = 128 * 1024;

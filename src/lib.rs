//! # segalloc - A Hybrid Segregated-Fit Memory Allocator
//!
//! This crate provides a general-purpose dynamic memory allocator backed by
//! a hybrid strategy: a small in-process byte arena that grows on demand via
//! the OS program-break (`sbrk`), plus direct page mappings (`mmap`) for
//! large requests. It emulates the contract of a standard C-style allocator
//! in user space, with inspectable metadata.
//!
//! ## Overview
//!
//! ```text
//!   Heap region:
//!
//!   ┌───────────────────────────────────────────────────────────────────┐
//!   │  static arena   │  (gap)  │   program-break extension(s)          │
//!   └───────────────────────────────────────────────────────────────────┘
//!   start             end  gap_start...gap_end  top ───────────────► end
//!
//!   Each block: [ header : W ][ body : size - 2W ][ footer : W ]
//!   Free blocks thread their body into one of 6 segregated free lists,
//!   indexed by size bucket; used blocks' bodies are caller payload.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   segalloc
//!   ├── align       - Alignment macros (align!, align_to!)
//!   ├── config      - Tunable constants (arena size, mmap threshold)
//!   ├── block       - Block metadata primitives (internal unsafe façade)
//!   ├── list        - Segregated free lists (6 size buckets)
//!   ├── region      - Cursor trio + gap bookkeeping for the live heap
//!   ├── platform    - sbrk / page-size OS collaborators
//!   ├── mmap        - Large-block collaborator (direct page mappings)
//!   ├── heap        - Core algorithms + the allocate/release façade
//!   └── debug       - Pretty-printer for memory dumps
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use segalloc::Heap;
//!
//! let mut heap = Heap::new();
//!
//! unsafe {
//!     let p = heap.allocate(64) as *mut u64;
//!     assert!(!p.is_null());
//!
//!     *p = 42;
//!     assert_eq!(*p, 42);
//!
//!     heap.release(p as *mut u8);
//! }
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no synchronization primitives; wrap a `Heap`
//!   in an external mutex for multi-threaded use.
//! - **The program break only grows**: releasing memory never shrinks it;
//!   only an mmap'd large block is ever returned to the OS.
//! - **Double-free, wild pointers, and use-after-free are undefined
//!   behavior**: no runtime detection is performed, matching the contract of
//!   the C allocators this crate emulates.
//!
//! ## Safety
//!
//! This crate is inherently unsafe, as it deals with raw memory management.
//! Both [`Heap::allocate`] and [`Heap::release`] require `unsafe` blocks, and
//! callers must uphold the same contract as `malloc`/`free`: only release
//! pointers this allocator returned, exactly once, and never write outside
//! the requested size.

pub mod align;
mod block;
pub mod config;
pub mod debug;
mod heap;
mod list;
mod mmap;
mod platform;
mod region;

pub use heap::Heap;
pub use region::Region;

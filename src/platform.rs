//! OS collaborators: the program-break primitive and the page size query.
//!
//! Grounded in `jgespiga-memalloc`'s `mmap.rs::page_size()` (`sysconf`
//! cached in a `static`), generalized here to also serve the growth
//! protocol, which needs to page-align its `sbrk` requests.

use std::sync::atomic::{AtomicUsize, Ordering};

use libc::{c_void, intptr_t, sbrk};

static PAGE_SIZE: AtomicUsize = AtomicUsize::new(0);

/// The system's virtual memory page size, queried once and cached.
#[inline]
pub fn page_size() -> usize {
  let cached = PAGE_SIZE.load(Ordering::Relaxed);
  if cached != 0 {
    return cached;
  }
  let size = unsafe { libc::sysconf(libc::_SC_PAGE_SIZE) } as usize;
  PAGE_SIZE.store(size, Ordering::Relaxed);
  size
}

/// Advances the program break by `increment` bytes and returns the address
/// of the start of the newly granted region (the break's previous value),
/// or `None` if the kernel refused the request.
pub unsafe fn extend_program_break(increment: usize) -> Option<*mut u8> {
  let prev = unsafe { sbrk(increment as intptr_t) };
  if prev == usize::MAX as *mut c_void {
    return None;
  }
  Some(prev as *mut u8)
}

/// The current program break, without moving it. Used to decide whether an
/// extension landed contiguously.
pub unsafe fn current_program_break() -> *mut u8 {
  unsafe { sbrk(0) as *mut u8 }
}

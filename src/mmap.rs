//! Large-block collaborator (§4.8) — interface only, independent of the
//! heap engine. Direct page-mapped allocation for requests at or above the
//! mmap threshold.

use std::ptr;

use libc::{
  c_void, MAP_ANONYMOUS, MAP_PRIVATE, MAP_FAILED, PROT_READ, PROT_WRITE, mmap, munmap,
};

use crate::block::{Block, HEADER_SIZE};
use crate::platform::page_size;

/// One outstanding mmap'd block, tracked only for inspection (§4.8: "not
/// required for correctness"). Grounded in `jgespiga-memalloc`'s
/// `regions: List<Region>` bookkeeping.
#[derive(Clone, Copy)]
pub struct MmapRecord {
  pub header: *mut usize,
  pub mapped_bytes: usize,
}

/// Side list of live mappings, owned by the `Heap` and handed to this
/// module's functions by reference so the mapping logic itself stays free
/// of any heap-engine state.
pub type MmapRegistry = Vec<MmapRecord>;

/// Maps `sizeof(header) + aligned` bytes, rounded up to a page, with
/// read+write permission and private+anonymous backing. Writes the header
/// directly (`size = mapped_bytes`, `USED`, `MMAPED`) and registers the
/// mapping. Returns the payload pointer, or null on mmap failure.
pub unsafe fn allocate(aligned: usize, registry: &mut MmapRegistry) -> *mut u8 {
  let requested = HEADER_SIZE + aligned;
  let page = page_size();
  let mapped_bytes = crate::align_to!(requested, page);

  let addr = unsafe {
    mmap(
      ptr::null_mut(),
      mapped_bytes,
      PROT_READ | PROT_WRITE,
      MAP_PRIVATE | MAP_ANONYMOUS,
      -1,
      0,
    )
  };

  if addr == MAP_FAILED {
    return ptr::null_mut();
  }

  let block = Block(addr as *mut usize);
  unsafe {
    block.set_mmaped(mapped_bytes);
  }

  log::trace!("mmap: mapped {mapped_bytes} bytes at {addr:p} for a {aligned}-byte request");
  registry.push(MmapRecord { header: block.0, mapped_bytes });

  unsafe { block.payload() }
}

/// Reads `size` from the header and unmaps the whole region.
pub unsafe fn release(p: *mut u8, registry: &mut MmapRegistry) {
  let block = unsafe { Block::from_payload(p) };
  let mapped_bytes = unsafe { block.size_of() };

  registry.retain(|rec| rec.header != block.0);

  log::trace!("mmap: unmapping {mapped_bytes} bytes at {:p}", block.0);
  unsafe {
    munmap(block.0 as *mut c_void, mapped_bytes);
  }
}

//! Pretty-printer for memory dumps — an external collaborator, not part of
//! the heap engine (§1: "deliberately out of scope, treated here only as
//! external collaborators"). Generalizes the teacher's `print_alloc`, which
//! printed one allocation at a time, into a structured walk over every live
//! region, block, and bucket, driven by the harness's `verbose` switch.

use std::fmt::Write as _;

use crate::heap::Heap;
use crate::list::NUM_BUCKETS;

/// Renders a human-readable dump of the heap's regions, physical blocks,
/// free-list buckets, and outstanding mmap'd blocks.
pub fn render(heap: &Heap) -> String {
  let mut out = String::new();
  let region = heap.region();

  let _ = writeln!(out, "region: start={:p} top={:p} end={:p}", region.start, region.top, region.end);
  match (region.gap_start, region.gap_end) {
    (Some(gs), Some(ge)) => {
      let _ = writeln!(out, "gap: [{gs:p}, {ge:p})");
    }
    _ => {
      let _ = writeln!(out, "gap: none");
    }
  }

  let _ = writeln!(out, "blocks:");
  unsafe {
    for b in heap.walk_blocks() {
      let _ = writeln!(
        out,
        "  {:p} size={} used={} mmaped={}",
        b.0,
        b.size_of(),
        b.is_used(),
        b.is_mmaped()
      );
    }
  }

  let _ = writeln!(out, "buckets:");
  let heads = heap.lists().bucket_heads();
  for (idx, &head) in heads.iter().enumerate().take(NUM_BUCKETS) {
    let mut cur = head;
    let mut sizes = Vec::new();
    unsafe {
      while !cur.is_null() {
        sizes.push(cur.size_of());
        cur = cur.next_free();
      }
    }
    let _ = writeln!(out, "  [{idx}]: {sizes:?}");
  }

  let _ = writeln!(out, "mmap blocks:");
  for rec in heap.mmap_records() {
    let _ = writeln!(out, "  {:p} mapped_bytes={}", rec.header, rec.mapped_bytes);
  }

  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn render_does_not_panic_on_fresh_heap() {
    let heap = Heap::new();
    let dump = render(&heap);
    assert!(dump.contains("region:"));
    assert!(dump.contains("buckets:"));
  }
}

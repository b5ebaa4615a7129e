//! End-to-end scenarios, taken literally from spec.md §8.

use std::mem;

use segalloc::Heap;
use segalloc::config::{DEFAULT_ARENA_SIZE, WORD_SIZE};

fn init() {
  let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn scenario_1_alignment() {
  init();
  let mut heap = Heap::new();
  unsafe {
    let p = heap.allocate(1);
    assert!(!p.is_null());
    assert_eq!((p as usize) % mem::size_of::<usize>(), 0);
    heap.release(p);
  }
}

#[test]
fn scenario_2_reuse() {
  init();
  let mut heap = Heap::new();
  unsafe {
    let p1 = heap.allocate(64);
    heap.release(p1);
    let p2 = heap.allocate(64);
    assert_eq!(p1, p2);
  }
}

#[test]
fn scenario_3_coalesce_and_reuse() {
  init();
  let mut heap = Heap::new();
  unsafe {
    let a = heap.allocate(4);
    let b = heap.allocate(4);
    let c = heap.allocate(4);

    let span_start = a;
    // a, b, and c are equal-size blocks, so the stride between consecutive
    // payload pointers is the total block size; the header is one word, so
    // subtracting it from c's stride-away end gives c's block end.
    let stride = b as usize - a as usize;
    let span_end = (c as usize + stride - WORD_SIZE) as *mut u8;

    heap.release(a);
    heap.release(c);
    heap.release(b);

    let p = heap.allocate(12 * mem::size_of::<i32>());
    assert!(!p.is_null());
    assert!(p as usize >= span_start as usize);
    assert!((p as usize) < span_end as usize);
  }
}

#[test]
fn scenario_4_large_block_path() {
  init();
  let mut heap = Heap::new();
  unsafe {
    let n = 256 * 1024;
    let p = heap.allocate(n);
    assert!(!p.is_null());

    std::ptr::write_bytes(p, 0x5A, n);
    for i in 0..n {
      assert_eq!(*p.add(i), 0x5A);
    }

    let rendered = segalloc::debug::render(&heap);
    assert!(rendered.contains("mapped_bytes"));

    heap.release(p);
    assert!(heap.mmap_records().is_empty());
  }
}

#[test]
fn scenario_5_growth_across_a_gap() {
  init();
  // A small static arena forces growth almost immediately.
  let mut heap = Heap::with_config(DEFAULT_ARENA_SIZE.min(512), 128 * 1024);
  unsafe {
    let mut ptrs = Vec::new();
    for _ in 0..70 {
      let p = heap.allocate(100);
      assert!(!p.is_null());
      ptrs.push(p);
    }

    // Whether or not a gap was introduced, every live block must still be
    // reachable by walking the region without overlap.
    let blocks = heap.walk_blocks();
    assert!(blocks.len() >= 70);

    for p in ptrs {
      heap.release(p);
    }
  }
}

#[test]
fn scenario_6_fragmentation_resilience() {
  init();
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

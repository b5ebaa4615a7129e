use std::io::Read;

use segalloc::Heap;

/// Waits until the user presses ENTER.
/// Useful when you want to inspect memory state with tools like `pmap`, `htop`,
/// `gdb`, or just visually track how allocations change the program break.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

fn main() {
  // The heap engine: a static arena that grows via sbrk once exhausted,
  // plus a segregated free-list index over everything released back to it.
  let mut heap = Heap::new();

  unsafe {
    println!("start: {}", segalloc::debug::render(&heap));
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 1) Allocate space for a u32 (4 bytes).
    // --------------------------------------------------------------------
    let first_block = heap.allocate(4) as *mut u32;
    println!("\n[1] Allocate u32 at {:?}", first_block);
    first_block.write(0xDEADBEEF);
    println!("[1] Value written to first_block = 0x{:X}", first_block.read());
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 2) Allocate 12 bytes. Shows how the allocator handles odd sizes.
    // --------------------------------------------------------------------
    let second_block = heap.allocate(12);
    println!("\n[2] Allocate [u8; 12] at {:?}", second_block);
    std::ptr::write_bytes(second_block, 0xAB, 12);
    println!("[2] Initialized second block with 0xAB");
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 3) Allocate a u64 to observe alignment.
    // --------------------------------------------------------------------
    let third_block = heap.allocate(8) as *mut u64;
    println!("\n[3] Allocate u64 at {:?}", third_block);
    third_block.write(0x1122334455667788);
    println!(
      "[3] Value = 0x{:X}, addr % 8 = {}",
      third_block.read(),
      (third_block as usize) % 8
    );
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 4) Deallocate the first block, then request 2 bytes and see whether
    //    the segregated free list reuses it.
    // --------------------------------------------------------------------
    heap.release(first_block as *mut u8);
    println!("\n[4] Released first_block at {:?}", first_block);

    let fourth_block = heap.allocate(2);
    println!(
      "[4] Allocate [u8; 2]: {}",
      if fourth_block as usize == first_block as usize {
        "reused the freed block"
      } else {
        "allocated somewhere else"
      }
    );
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 5) Allocate a large block. At or above the mmap threshold this
    //    bypasses the heap engine entirely and goes straight to mmap.
    // --------------------------------------------------------------------
    let big_block = heap.allocate(256 * 1024);
    println!("\n[5] Allocate large 256 KiB block at {:?}", big_block);
    println!("{}", segalloc::debug::render(&heap));
    heap.release(big_block);
    block_until_enter_pressed();

    println!("\n[6] End of example. Process will exit and the OS will reclaim all memory.");
  }
}

//! Proves the no-allocation property of inline storage with a counting
//! allocator, and the exact-fit behavior of the heap path.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

use strbuf::{Str, Str16};

struct CountingAlloc;

static ALLOCATIONS: AtomicUsize = AtomicUsize::new(0);

unsafe impl GlobalAlloc for CountingAlloc {
  unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
    ALLOCATIONS.fetch_add(1, Ordering::SeqCst);
    unsafe { System.alloc(layout) }
  }

  unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
    unsafe { System.dealloc(ptr, layout) }
  }
}

#[global_allocator]
static ALLOC: CountingAlloc = CountingAlloc;

fn allocations() -> usize {
  ALLOCATIONS.load(Ordering::SeqCst)
}

// A single test so no parallel test thread can disturb the counter.
#[test]
fn inline_storage_never_touches_the_heap() {
  let before = allocations();
  let mut s = Str16::new();
  s.set("filename.h");
  s.append(".bak"); // 14 bytes + terminator still fit
  s.clear();
  s.set("0123456789abcde"); // 15 bytes, the inline maximum
  assert!(s.is_inline());
  assert_eq!(allocations(), before, "inline operations must not allocate");

  let borrowed = Str::borrowed("no copy, no allocation");
  assert!(!borrowed.is_owned());
  assert_eq!(allocations(), before, "borrowing must not allocate");

  let before = allocations();
  s.set("long_filename_not_very_long_but_longer_than_expected.h");
  assert!(!s.is_inline());
  assert_eq!(allocations(), before + 1, "spilling allocates exactly once");
  assert_eq!(s.capacity(), s.len() + 1);
}

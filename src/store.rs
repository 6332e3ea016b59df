//! Byte-level storage cell backing [`StrBuf`](crate::StrBuf).
//!
//! A cell is always in exactly one of four modes: empty, inline (content
//! lives in a fixed buffer embedded in the value), heap (content lives in
//! an exact-fit allocation) or borrowed (content is externally owned and
//! never written through). Every mutating operation on the string type
//! funnels through the transition methods here, which pick the target mode,
//! copy content when required and release the previous heap block by
//! dropping the old variant.

use alloc::boxed::Box;
use alloc::vec;

/// Capacity and content length are held below 2^24, mirroring the 24-bit
/// header fields this layout was designed around. The type is not meant
/// for multi-megabyte strings.
pub(crate) const MAX_CAPACITY: usize = (1 << 24) - 1;

/// Storage cell for up to `N` inline bytes.
///
/// Owned variants (`Inline`, `Heap`) keep a NUL terminator at `buf[len]`,
/// so their capacity always exceeds their content length by at least one.
/// `Borrowed` reports the borrowed span's length as its capacity and must
/// transition to an owned variant before any write, regardless of that
/// reported capacity.
#[derive(Clone)]
pub(crate) enum ByteStore<'a, const N: usize> {
  Empty,
  Inline { buf: [u8; N], len: usize },
  Heap { buf: Box<[u8]>, len: usize },
  Borrowed(&'a [u8]),
}

impl<'a, const N: usize> ByteStore<'a, N> {
  /// A fresh cell: inline and empty when there is an inline buffer,
  /// otherwise the empty mode.
  pub(crate) const fn new() -> Self {
    if N > 0 {
      ByteStore::Inline {
        buf: [0u8; N],
        len: 0,
      }
    } else {
      ByteStore::Empty
    }
  }

  pub(crate) fn len(&self) -> usize {
    match self {
      ByteStore::Empty => 0,
      ByteStore::Inline { len, .. } => *len,
      ByteStore::Heap { len, .. } => *len,
      ByteStore::Borrowed(b) => b.len(),
    }
  }

  pub(crate) fn capacity(&self) -> usize {
    match self {
      ByteStore::Empty => 0,
      ByteStore::Inline { .. } => N,
      ByteStore::Heap { buf, .. } => buf.len(),
      ByteStore::Borrowed(b) => b.len(),
    }
  }

  /// Whether the cell is responsible for its backing memory. Only owned
  /// storage may be written through.
  pub(crate) fn is_owned(&self) -> bool {
    matches!(self, ByteStore::Inline { .. } | ByteStore::Heap { .. })
  }

  pub(crate) fn as_bytes(&self) -> &[u8] {
    match self {
      ByteStore::Empty => &[],
      ByteStore::Inline { buf, len } => &buf[..*len],
      ByteStore::Heap { buf, len } => &buf[..*len],
      ByteStore::Borrowed(b) => b,
    }
  }

  /// Mutable view of the current content. Empty for unowned cells; callers
  /// must transition to owned storage first if they intend to write.
  pub(crate) fn content_mut(&mut self) -> &mut [u8] {
    match self {
      ByteStore::Inline { buf, len } => &mut buf[..*len],
      ByteStore::Heap { buf, len } => &mut buf[..*len],
      ByteStore::Empty | ByteStore::Borrowed(_) => &mut [],
    }
  }

  /// Ensures owned storage with at least `min_cap` bytes, keeping the
  /// current content intact.
  ///
  /// No-op when the cell is already owned with sufficient capacity. A
  /// borrowed cell always transitions, and the request is raised to fit
  /// its full content plus terminator so a preserving grow never truncates.
  /// The target is the inline buffer whenever the request fits it, else an
  /// exact-fit heap block.
  pub(crate) fn grow_preserving(&mut self, min_cap: usize) {
    if self.is_owned() && self.capacity() >= min_cap {
      return;
    }
    let min_cap = min_cap.max(self.len() + 1);
    assert!(min_cap <= MAX_CAPACITY, "capacity exceeds the 24-bit limit");
    let src = self.as_bytes();
    let next = if min_cap <= N {
      let mut buf = [0u8; N];
      buf[..src.len()].copy_from_slice(src);
      ByteStore::Inline {
        buf,
        len: src.len(),
      }
    } else {
      let mut buf = vec![0u8; min_cap].into_boxed_slice();
      buf[..src.len()].copy_from_slice(src);
      ByteStore::Heap {
        buf,
        len: src.len(),
      }
    };
    // Dropping the old variant frees a heap block exactly once; inline
    // and borrowed variants release nothing.
    *self = next;
  }

  /// Like [`grow_preserving`](Self::grow_preserving) but discards the
  /// content, for callers about to overwrite the whole buffer. When the
  /// cell is already owned with sufficient capacity the old bytes stay in
  /// place, logically stale until overwritten.
  pub(crate) fn reset_for_overwrite(&mut self, min_cap: usize) {
    assert!(min_cap <= MAX_CAPACITY, "capacity exceeds the 24-bit limit");
    let min_cap = min_cap.max(1);
    if self.is_owned() && self.capacity() >= min_cap {
      return;
    }
    *self = if min_cap <= N {
      ByteStore::Inline {
        buf: [0u8; N],
        len: 0,
      }
    } else {
      ByteStore::Heap {
        buf: vec![0u8; min_cap].into_boxed_slice(),
        len: 0,
      }
    };
  }

  /// Reallocates a heap cell down to `len + 1` bytes when that is strictly
  /// smaller than the current capacity. Inline, borrowed and already-tight
  /// heap cells are left alone.
  pub(crate) fn shrink_to_fit(&mut self) {
    if let ByteStore::Heap { buf, len } = self {
      let tight = *len + 1;
      if buf.len() <= tight {
        return;
      }
      let mut next = vec![0u8; tight].into_boxed_slice();
      next[..*len].copy_from_slice(&buf[..*len]);
      *buf = next;
    }
  }

  /// Drops any owned storage and borrows `bytes` without copying. An empty
  /// span clears to the empty mode instead of borrowing it.
  pub(crate) fn set_ref(&mut self, bytes: &'a [u8]) {
    *self = if bytes.is_empty() {
      ByteStore::Empty
    } else {
      ByteStore::Borrowed(bytes)
    };
  }

  /// Drops any owned storage; back to an empty inline cell when there is
  /// an inline buffer, else the empty mode.
  pub(crate) fn clear(&mut self) {
    *self = Self::new();
  }

  /// Copies `src` into owned storage at byte offset `at`, writes the
  /// terminator and updates the length. The caller must have established
  /// owned storage of sufficient capacity beforehand.
  pub(crate) fn write_at(&mut self, at: usize, src: &[u8]) {
    let new_len = at + src.len();
    debug_assert!(new_len < self.capacity());
    match self {
      ByteStore::Inline { buf, len } => {
        buf[at..new_len].copy_from_slice(src);
        buf[new_len] = 0;
        *len = new_len;
      }
      ByteStore::Heap { buf, len } => {
        buf[at..new_len].copy_from_slice(src);
        buf[new_len] = 0;
        *len = new_len;
      }
      ByteStore::Empty | ByteStore::Borrowed(_) => {
        unreachable!("write into unowned storage")
      }
    }
  }

  /// Writable span from byte offset `at` up to the last content byte the
  /// cell can hold (the terminator slot is excluded). Owned storage only.
  pub(crate) fn writable_tail(&mut self, at: usize) -> &mut [u8] {
    match self {
      ByteStore::Inline { buf, .. } => &mut buf[at..N - 1],
      ByteStore::Heap { buf, .. } => {
        let cap = buf.len();
        &mut buf[at..cap - 1]
      }
      ByteStore::Empty | ByteStore::Borrowed(_) => {
        unreachable!("write into unowned storage")
      }
    }
  }

  /// Commits a length after a raw write through
  /// [`writable_tail`](Self::writable_tail), terminating the content.
  pub(crate) fn set_len(&mut self, new_len: usize) {
    match self {
      ByteStore::Inline { buf, len } => {
        buf[new_len] = 0;
        *len = new_len;
      }
      ByteStore::Heap { buf, len } => {
        buf[new_len] = 0;
        *len = new_len;
      }
      ByteStore::Empty | ByteStore::Borrowed(_) => {
        unreachable!("write into unowned storage")
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fresh_cell_mode_depends_on_inline_size() {
    let cell: ByteStore<'_, 0> = ByteStore::new();
    assert!(matches!(cell, ByteStore::Empty));
    assert_eq!(cell.capacity(), 0);
    assert!(!cell.is_owned());

    let cell: ByteStore<'_, 16> = ByteStore::new();
    assert!(matches!(cell, ByteStore::Inline { .. }));
    assert_eq!(cell.capacity(), 16);
    assert!(cell.is_owned());
  }

  #[test]
  fn grow_targets_inline_when_request_fits() {
    let mut cell: ByteStore<'_, 16> = ByteStore::new();
    cell.grow_preserving(10);
    assert!(matches!(cell, ByteStore::Inline { .. }));
    cell.grow_preserving(17);
    assert!(matches!(cell, ByteStore::Heap { .. }));
    assert_eq!(cell.capacity(), 17);
  }

  #[test]
  fn grow_keeps_content_and_terminator() {
    let mut cell: ByteStore<'_, 8> = ByteStore::new();
    cell.write_at(0, b"hey");
    cell.grow_preserving(32);
    assert_eq!(cell.as_bytes(), b"hey");
    match &cell {
      ByteStore::Heap { buf, len } => assert_eq!(buf[*len], 0),
      _ => panic!("expected heap storage"),
    }
  }

  #[test]
  fn grow_is_a_noop_when_owned_capacity_suffices() {
    let mut cell: ByteStore<'_, 0> = ByteStore::new();
    cell.reset_for_overwrite(32);
    cell.write_at(0, b"abc");
    cell.grow_preserving(8);
    assert_eq!(cell.capacity(), 32);
    assert_eq!(cell.as_bytes(), b"abc");
  }

  #[test]
  fn borrowed_transitions_regardless_of_reported_capacity() {
    let mut cell: ByteStore<'_, 0> = ByteStore::new();
    cell.set_ref(b"abcdef");
    assert!(!cell.is_owned());
    assert_eq!(cell.capacity(), 6);
    // Smaller than the reported capacity, but the borrowed span is not
    // writable so the cell must still move to owned storage.
    cell.grow_preserving(4);
    assert!(cell.is_owned());
    assert_eq!(cell.as_bytes(), b"abcdef");
  }

  #[test]
  fn borrowed_fits_inline_after_transition() {
    let mut cell: ByteStore<'_, 16> = ByteStore::new();
    cell.set_ref(b"short");
    cell.grow_preserving(6);
    assert!(matches!(cell, ByteStore::Inline { .. }));
    assert_eq!(cell.as_bytes(), b"short");
  }

  #[test]
  fn reset_discards_content() {
    let mut cell: ByteStore<'_, 0> = ByteStore::new();
    cell.reset_for_overwrite(8);
    cell.write_at(0, b"0123456");
    cell.reset_for_overwrite(64);
    assert_eq!(cell.len(), 0);
    assert_eq!(cell.capacity(), 64);
  }

  #[test]
  fn clear_returns_to_inline_or_empty() {
    let mut cell: ByteStore<'_, 16> = ByteStore::new();
    cell.reset_for_overwrite(100);
    assert!(matches!(cell, ByteStore::Heap { .. }));
    cell.clear();
    assert!(matches!(cell, ByteStore::Inline { len: 0, .. }));

    let mut cell: ByteStore<'_, 0> = ByteStore::new();
    cell.reset_for_overwrite(100);
    cell.clear();
    assert!(matches!(cell, ByteStore::Empty));
  }

  #[test]
  fn shrink_reallocates_to_exact_fit_once() {
    let mut cell: ByteStore<'_, 0> = ByteStore::new();
    cell.reset_for_overwrite(64);
    cell.write_at(0, b"tiny");
    cell.shrink_to_fit();
    assert_eq!(cell.capacity(), 5);
    cell.shrink_to_fit();
    assert_eq!(cell.capacity(), 5);
    assert_eq!(cell.as_bytes(), b"tiny");
  }

  #[test]
  fn shrink_ignores_inline_and_borrowed() {
    let mut cell: ByteStore<'_, 16> = ByteStore::new();
    cell.write_at(0, b"abc");
    cell.shrink_to_fit();
    assert_eq!(cell.capacity(), 16);

    let mut cell: ByteStore<'_, 0> = ByteStore::new();
    cell.set_ref(b"borrowed");
    cell.shrink_to_fit();
    assert!(!cell.is_owned());
    assert_eq!(cell.capacity(), 8);
  }

  #[test]
  fn empty_ref_clears_instead_of_borrowing() {
    let mut cell: ByteStore<'_, 16> = ByteStore::new();
    cell.set_ref(b"");
    assert!(matches!(cell, ByteStore::Empty));
  }

  #[test]
  #[should_panic(expected = "capacity exceeds the 24-bit limit")]
  fn capacity_limit_is_fatal() {
    let mut cell: ByteStore<'_, 0> = ByteStore::new();
    cell.reset_for_overwrite(MAX_CAPACITY + 1);
  }
}

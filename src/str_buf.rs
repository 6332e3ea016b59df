//! A mutable UTF-8 string with an optional inline buffer.
//!
//! [`StrBuf<N>`](StrBuf) stores up to `N - 1` bytes of content (plus a NUL
//! terminator) directly in the value, switches to an exact-fit heap
//! allocation when content outgrows the inline buffer, and can borrow
//! external data zero-copy through [`StrBuf::borrowed`] and
//! [`StrBuf::set_ref`]. The idea is that you pick an inline capacity the
//! content is expected to fit most of the time, and the heap is only
//! touched when it does not.
//!
//! ## Examples
//!
//! Short content stays inline, long content spills to the heap:
//!
//! ```
//! use strbuf::Str16;
//!
//! let file: Str16 = "filename.h".into();
//! assert!(file.is_inline());
//! assert_eq!(file.capacity(), 16);
//!
//! let long: Str16 =
//!   "long_filename_not_very_long_but_longer_than_expected.h".into();
//! assert!(!long.is_inline());
//! assert_eq!(long.len(), 54);
//! ```
//!
//! Borrowed cells copy nothing until the first mutation:
//!
//! ```
//! use strbuf::Str;
//!
//! let mut s = Str::borrowed("literal");
//! assert!(!s.is_owned());
//! s.append("!");
//! assert!(s.is_owned());
//! assert_eq!(s, "literal!");
//! ```

use alloc::borrow::Borrow;
use alloc::borrow::ToOwned;
use alloc::string::String;
use core::cmp::Ordering;
use core::fmt;
use core::hash::Hash;
use core::hash::Hasher;
use core::ops::Deref;
use core::ops::Index;
use core::str;

use crate::store::ByteStore;
use crate::store::MAX_CAPACITY;

/// Storage mode of a [`StrBuf`], derived from its current state.
///
/// Exactly one mode holds at any time. `Empty` and `Borrowed` cells do not
/// own their bytes and are never written through; any mutation first
/// transitions them to `Inline` or `Heap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "is_variant", derive(derive_more::IsVariant))]
pub enum Mode {
  /// Zero-length placeholder; no backing storage at all.
  Empty,
  /// Content lives in the fixed buffer embedded in the value.
  Inline,
  /// Content lives in an exact-fit heap allocation owned by the value.
  Heap,
  /// Content is externally owned; the cell holds a non-owning reference.
  Borrowed,
}

/// Error returned by the `*_nogrow` operations when the content does not
/// fit the cell's current capacity (or the cell does not own writable
/// storage). Nothing is written in that case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
#[display("content does not fit in the remaining capacity")]
pub struct CapacityError;

/// A mutable string with an inline buffer of `N` bytes.
///
/// Owned content is kept NUL-terminated, so the inline buffer holds up to
/// `N - 1` content bytes and heap allocations are sized to the content
/// length plus one. Capacity figures reported by [`capacity`](Self::capacity)
/// include that terminator slot. There is no geometric over-allocation:
/// growth allocates exactly what was asked for, so repeated small appends
/// pay a copy each time. Content length is limited to 2^24 − 2 bytes;
/// exceeding the limit is a programming error and panics.
///
/// `StrBuf<'a, 0>` (aliased as [`Str`]) has no inline buffer and always
/// uses the heap or a borrowed reference. The lifetime `'a` only matters
/// for borrowed cells; fully owned values can use `'static`.
///
/// Functions that should accept any variant take `&mut StrBuf<'_, N>` with
/// `N` generic:
///
/// ```
/// use strbuf::{Str128, StrBuf};
///
/// fn add_ext<const N: usize>(s: &mut StrBuf<'_, N>) {
///   s.append(".tmp");
/// }
///
/// let mut name: Str128 = "report".into();
/// add_ext(&mut name);
/// assert_eq!(name, "report.tmp");
/// ```
#[derive(Clone)]
pub struct StrBuf<'a, const N: usize = 0> {
  store: ByteStore<'a, N>,
}

/// No inline buffer; always heap or borrowed.
pub type Str<'a> = StrBuf<'a, 0>;
pub type Str16<'a> = StrBuf<'a, 16>;
pub type Str32<'a> = StrBuf<'a, 32>;
pub type Str64<'a> = StrBuf<'a, 64>;
pub type Str128<'a> = StrBuf<'a, 128>;
pub type Str256<'a> = StrBuf<'a, 256>;

impl<'a, const N: usize> StrBuf<'a, N> {
  /// Creates an empty `StrBuf`. Starts in inline mode when `N > 0`,
  /// otherwise in the empty mode. Never allocates.
  pub const fn new() -> Self {
    Self {
      store: ByteStore::new(),
    }
  }

  /// Creates a cell borrowing `s` without copying. No tracking of the
  /// source whatsoever; the borrow checker enforces what the caller would
  /// otherwise have to promise. An empty `s` yields an empty cell.
  pub fn borrowed(s: &'a str) -> Self {
    let mut buf = Self::new();
    buf.set_ref(s);
    buf
  }

  /// Creates a cell directly from a format invocation, sized exactly.
  ///
  /// ```
  /// use strbuf::Str64;
  ///
  /// let path = Str64::from_fmt(format_args!("{}/{}.tmp", "out", "scratch"));
  /// assert_eq!(path, "out/scratch.tmp");
  /// ```
  pub fn from_fmt(args: fmt::Arguments<'_>) -> Self {
    let mut buf = Self::new();
    buf.set_fmt(args);
    buf
  }

  /// Content length in bytes, excluding the terminator.
  pub fn len(&self) -> usize {
    self.store.len()
  }

  pub fn is_empty(&self) -> bool {
    self.store.len() == 0
  }

  /// Bytes available in the active buffer, including the terminator slot
  /// for owned storage. A borrowed cell reports the borrowed length, but
  /// that figure is never trusted for write sizing.
  pub fn capacity(&self) -> usize {
    self.store.capacity()
  }

  /// Fixed inline capacity of this variant; zero when there is no inline
  /// buffer. Never changes for the lifetime of the value.
  pub const fn inline_capacity(&self) -> usize {
    N
  }

  /// Whether the cell is responsible for releasing its backing memory.
  /// False for empty and borrowed cells.
  pub fn is_owned(&self) -> bool {
    self.store.is_owned()
  }

  pub fn is_inline(&self) -> bool {
    matches!(self.store, ByteStore::Inline { .. })
  }

  pub fn is_borrowed(&self) -> bool {
    matches!(self.store, ByteStore::Borrowed(_))
  }

  /// Current storage mode.
  pub fn mode(&self) -> Mode {
    match self.store {
      ByteStore::Empty => Mode::Empty,
      ByteStore::Inline { .. } => Mode::Inline,
      ByteStore::Heap { .. } => Mode::Heap,
      ByteStore::Borrowed(_) => Mode::Borrowed,
    }
  }

  pub fn as_str(&self) -> &str {
    // SAFETY: every write path stores complete, valid UTF-8 runs.
    unsafe { str::from_utf8_unchecked(self.store.as_bytes()) }
  }

  pub fn as_bytes(&self) -> &[u8] {
    self.store.as_bytes()
  }

  /// Raw pointer to the first content byte. Owned storage keeps a NUL
  /// terminator after the content; borrowed storage carries no such
  /// guarantee, so C consumers must use the explicit length.
  pub fn as_ptr(&self) -> *const u8 {
    self.store.as_bytes().as_ptr()
  }

  /// Mutable view of the content, transitioning a borrowed or empty cell
  /// to owned storage first.
  ///
  /// ```
  /// use strbuf::Str16;
  ///
  /// let mut s = Str16::borrowed("hello");
  /// s.to_mut().make_ascii_uppercase();
  /// assert!(s.is_owned());
  /// assert_eq!(s, "HELLO");
  /// ```
  pub fn to_mut(&mut self) -> &mut str {
    if !self.store.is_owned() {
      self.store.grow_preserving(self.store.len() + 1);
    }
    // SAFETY: content is valid UTF-8 and mutations through &mut str
    // preserve that.
    unsafe { str::from_utf8_unchecked_mut(self.store.content_mut()) }
  }

  /// Copies `s` into the cell, reusing the current buffer when it is owned
  /// and large enough. A borrowed cell becomes owned (exact-fit) without
  /// copying its old content first.
  pub fn set(&mut self, s: &str) {
    assert!(s.len() < MAX_CAPACITY, "content exceeds the 24-bit limit");
    self.store.reset_for_overwrite(s.len() + 1);
    self.store.write_at(0, s.as_bytes());
  }

  /// Borrows `s` without copying, dropping any owned storage. An empty `s`
  /// clears the cell instead.
  pub fn set_ref(&mut self, s: &'a str) {
    self.store.set_ref(s.as_bytes());
  }

  /// Appends `s` after the current content, growing as needed. Appending
  /// to a borrowed cell first copies the borrowed content into owned
  /// storage; the source is left untouched.
  pub fn append(&mut self, s: &str) {
    let at = self.store.len();
    let new_len = at + s.len();
    assert!(new_len < MAX_CAPACITY, "content exceeds the 24-bit limit");
    self.store.grow_preserving(new_len + 1);
    self.store.write_at(at, s.as_bytes());
  }

  /// Appends a single character.
  pub fn push(&mut self, c: char) {
    let mut utf8 = [0u8; 4];
    self.append(c.encode_utf8(&mut utf8));
  }

  /// Appends `s` only if it fits the current capacity in full (terminator
  /// included), for callers that have deliberately fixed a capacity
  /// ceiling. On failure nothing is written and the content is unchanged.
  pub fn append_nogrow(&mut self, s: &str) -> Result<(), CapacityError> {
    if s.is_empty() {
      return Ok(());
    }
    let at = self.store.len();
    if !self.store.is_owned() || at + s.len() + 1 > self.store.capacity() {
      return Err(CapacityError);
    }
    self.store.write_at(at, s.as_bytes());
    Ok(())
  }

  /// Empties the cell, releasing any heap storage. Returns to inline mode
  /// when there is an inline buffer, else to the empty mode.
  pub fn clear(&mut self) {
    self.store.clear();
  }

  /// Ensures a total capacity of at least `cap` bytes (terminator slot
  /// included), preserving the content. Requests below the current
  /// capacity are a no-op for owned cells; a borrowed cell always
  /// transitions to owned storage, keeping its content in full.
  pub fn reserve(&mut self, cap: usize) {
    self.store.grow_preserving(cap);
  }

  /// Like [`reserve`](Self::reserve) but discards the content when a new
  /// buffer has to be set up. Content is unspecified afterwards; callers
  /// are expected to overwrite it.
  pub fn reserve_discard(&mut self, cap: usize) {
    self.store.reset_for_overwrite(cap);
  }

  /// Reallocates a heap cell down to its content length plus terminator.
  /// No-op for inline, borrowed and already-tight cells. Idempotent.
  pub fn shrink_to_fit(&mut self) {
    self.store.shrink_to_fit();
  }

  /// Replaces the content with the rendered output of `args`, sized
  /// exactly. Returns the rendered length.
  ///
  /// The required length is computed first over a counting writer, then
  /// the buffer is grown (discarding old content) and rendered into.
  pub fn set_fmt(&mut self, args: fmt::Arguments<'_>) -> usize {
    let len = formatted_len(args);
    assert!(len < MAX_CAPACITY, "content exceeds the 24-bit limit");
    self.store.reset_for_overwrite(len + 1);
    debug_assert!(self.store.is_owned());
    let written = render(self.store.writable_tail(0), args);
    self.store.set_len(written);
    written
  }

  /// Appends the rendered output of `args` after the current content.
  /// Returns the rendered length.
  pub fn append_fmt(&mut self, args: fmt::Arguments<'_>) -> usize {
    let add = formatted_len(args);
    let at = self.store.len();
    assert!(at + add < MAX_CAPACITY, "content exceeds the 24-bit limit");
    self.store.grow_preserving(at + add + 1);
    debug_assert!(self.store.is_owned());
    let written = render(self.store.writable_tail(at), args);
    self.store.set_len(at + written);
    add
  }

  /// Renders `args` over the content only if the output fits the current
  /// capacity in full. On failure nothing is written.
  pub fn set_fmt_nogrow(
    &mut self,
    args: fmt::Arguments<'_>,
  ) -> Result<usize, CapacityError> {
    let len = formatted_len(args);
    if !self.store.is_owned() || len + 1 > self.store.capacity() {
      return Err(CapacityError);
    }
    let written = render(self.store.writable_tail(0), args);
    self.store.set_len(written);
    Ok(written)
  }

  /// Renders `args` after the current content only if the output fits the
  /// current capacity in full. On failure nothing is written.
  pub fn append_fmt_nogrow(
    &mut self,
    args: fmt::Arguments<'_>,
  ) -> Result<usize, CapacityError> {
    let add = formatted_len(args);
    let at = self.store.len();
    if !self.store.is_owned() || at + add + 1 > self.store.capacity() {
      return Err(CapacityError);
    }
    let written = render(self.store.writable_tail(at), args);
    self.store.set_len(at + written);
    Ok(written)
  }

  /// Consumes the cell and returns a `String`. A heap cell hands over its
  /// allocation (trimmed of the terminator); other modes copy.
  pub fn into_string(self) -> String {
    match self.store {
      ByteStore::Heap { buf, len } => {
        let mut bytes = buf.into_vec();
        bytes.truncate(len);
        // SAFETY: only complete UTF-8 runs are ever stored.
        unsafe { String::from_utf8_unchecked(bytes) }
      }
      ref store => {
        // SAFETY: as above.
        unsafe { str::from_utf8_unchecked(store.as_bytes()) }.to_owned()
      }
    }
  }
}

/// Exact rendered length of a format invocation, measured over a counting
/// writer. First pass of the two-pass formatted-write protocol.
fn formatted_len(args: fmt::Arguments<'_>) -> usize {
  struct Counter(usize);

  impl fmt::Write for Counter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
      self.0 += s.len();
      Ok(())
    }
  }

  let mut counter = Counter(0);
  let _ = fmt::write(&mut counter, args);
  counter.0
}

/// Renders `args` into `buf`, truncating at whole-chunk granularity if the
/// output would not fit. Returns the number of bytes written. Callers size
/// `buf` from [`formatted_len`] so truncation does not happen in practice.
fn render(buf: &mut [u8], args: fmt::Arguments<'_>) -> usize {
  struct Sink<'b> {
    buf: &'b mut [u8],
    pos: usize,
  }

  impl fmt::Write for Sink<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
      let end = self.pos + s.len();
      if end > self.buf.len() {
        return Err(fmt::Error);
      }
      self.buf[self.pos..end].copy_from_slice(s.as_bytes());
      self.pos = end;
      Ok(())
    }
  }

  let mut sink = Sink { buf, pos: 0 };
  let _ = fmt::write(&mut sink, args);
  sink.pos
}

impl<'a, const N: usize> Default for StrBuf<'a, N> {
  fn default() -> Self {
    Self::new()
  }
}

impl<'a, const N: usize> fmt::Display for StrBuf<'a, N> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl<'a, const N: usize> fmt::Debug for StrBuf<'a, N> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(self.as_str(), f)
  }
}

impl<'a, const N: usize> fmt::Write for StrBuf<'a, N> {
  fn write_str(&mut self, s: &str) -> fmt::Result {
    self.append(s);
    Ok(())
  }
}

impl<'a, const N: usize> Deref for StrBuf<'a, N> {
  type Target = str;

  fn deref(&self) -> &str {
    self.as_str()
  }
}

impl<'a, const N: usize> AsRef<str> for StrBuf<'a, N> {
  fn as_ref(&self) -> &str {
    self.as_str()
  }
}

impl<'a, const N: usize> AsRef<[u8]> for StrBuf<'a, N> {
  fn as_ref(&self) -> &[u8] {
    self.as_bytes()
  }
}

impl<'a, const N: usize> Borrow<str> for StrBuf<'a, N> {
  fn borrow(&self) -> &str {
    self.as_str()
  }
}

impl<'a, const N: usize> Hash for StrBuf<'a, N> {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.as_str().hash(state);
  }
}

/// Byte access by index. Out-of-range indices are a programming error and
/// panic; valid indices are `0 <= i < len()`.
impl<'a, const N: usize> Index<usize> for StrBuf<'a, N> {
  type Output = u8;

  fn index(&self, i: usize) -> &u8 {
    let bytes = self.store.as_bytes();
    assert!(i < bytes.len(), "index out of bounds");
    &bytes[i]
  }
}

impl<'a, 'b, const N: usize, const M: usize> PartialEq<StrBuf<'b, M>>
  for StrBuf<'a, N>
{
  fn eq(&self, other: &StrBuf<'b, M>) -> bool {
    self.as_str() == other.as_str()
  }
}

impl<'a, const N: usize> Eq for StrBuf<'a, N> {}

impl<'a, const N: usize> PartialEq<str> for StrBuf<'a, N> {
  fn eq(&self, other: &str) -> bool {
    self.as_str() == other
  }
}

impl<'a, const N: usize> PartialEq<&str> for StrBuf<'a, N> {
  fn eq(&self, other: &&str) -> bool {
    self.as_str() == *other
  }
}

impl<'a, const N: usize> PartialEq<String> for StrBuf<'a, N> {
  fn eq(&self, other: &String) -> bool {
    self.as_str() == other.as_str()
  }
}

impl<'a, const N: usize> PartialEq<StrBuf<'a, N>> for str {
  fn eq(&self, other: &StrBuf<'a, N>) -> bool {
    self == other.as_str()
  }
}

impl<'a, const N: usize> PartialEq<StrBuf<'a, N>> for &str {
  fn eq(&self, other: &StrBuf<'a, N>) -> bool {
    *self == other.as_str()
  }
}

impl<'a, const N: usize> PartialEq<StrBuf<'a, N>> for String {
  fn eq(&self, other: &StrBuf<'a, N>) -> bool {
    self.as_str() == other.as_str()
  }
}

impl<'a, 'b, const N: usize, const M: usize> PartialOrd<StrBuf<'b, M>>
  for StrBuf<'a, N>
{
  fn partial_cmp(&self, other: &StrBuf<'b, M>) -> Option<Ordering> {
    Some(self.as_str().cmp(other.as_str()))
  }
}

impl<'a, const N: usize> PartialOrd<str> for StrBuf<'a, N> {
  fn partial_cmp(&self, other: &str) -> Option<Ordering> {
    Some(self.as_str().cmp(other))
  }
}

impl<'a, const N: usize> PartialOrd<&str> for StrBuf<'a, N> {
  fn partial_cmp(&self, other: &&str) -> Option<Ordering> {
    Some(self.as_str().cmp(other))
  }
}

impl<'a, const N: usize> Ord for StrBuf<'a, N> {
  fn cmp(&self, other: &Self) -> Ordering {
    self.as_str().cmp(other.as_str())
  }
}

impl<'a, 's, const N: usize> From<&'s str> for StrBuf<'a, N> {
  /// Copying construction. For zero-copy borrowing use
  /// [`StrBuf::borrowed`].
  fn from(s: &'s str) -> Self {
    let mut buf = Self::new();
    buf.set(s);
    buf
  }
}

impl<'a, const N: usize> From<String> for StrBuf<'a, N> {
  /// Adopts the string's buffer when it cannot fit inline; the allocation
  /// is re-terminated rather than copied.
  fn from(s: String) -> Self {
    if s.len() + 1 <= N {
      let mut buf = Self::new();
      buf.set(&s);
      return buf;
    }
    assert!(s.len() < MAX_CAPACITY, "content exceeds the 24-bit limit");
    let len = s.len();
    let mut bytes = s.into_bytes();
    bytes.push(0);
    Self {
      store: ByteStore::Heap {
        buf: bytes.into_boxed_slice(),
        len,
      },
    }
  }
}

impl<'a, const N: usize> From<char> for StrBuf<'a, N> {
  fn from(c: char) -> Self {
    let mut buf = Self::new();
    buf.push(c);
    buf
  }
}

impl<'a, const N: usize> From<StrBuf<'a, N>> for String {
  fn from(s: StrBuf<'a, N>) -> Self {
    s.into_string()
  }
}

#[cfg(feature = "serde")]
mod serde_impl {
  use core::fmt;

  use serde::Deserialize;
  use serde::Deserializer;
  use serde::Serialize;
  use serde::Serializer;
  use serde::de;

  use super::*;

  impl<'a, const N: usize> Serialize for StrBuf<'a, N> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
      S: Serializer,
    {
      serializer.serialize_str(self.as_str())
    }
  }

  struct StrBufVisitor<const N: usize>;

  impl<'de, const N: usize> de::Visitor<'de> for StrBufVisitor<N> {
    type Value = StrBuf<'de, N>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
      formatter.write_str("a string")
    }

    fn visit_borrowed_str<E>(self, v: &'de str) -> Result<Self::Value, E>
    where
      E: de::Error,
    {
      Ok(StrBuf::borrowed(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
      E: de::Error,
    {
      Ok(StrBuf::from(v))
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
    where
      E: de::Error,
    {
      Ok(StrBuf::from(v))
    }
  }

  impl<'a, 'de: 'a, const N: usize> Deserialize<'de> for StrBuf<'a, N> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
      D: Deserializer<'de>,
    {
      deserializer.deserialize_str(StrBufVisitor::<N>)
    }
  }
}

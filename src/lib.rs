//! # strbuf
//!
//! ### Mutable strings with an optional inline buffer
//!
//! This crate provides [`StrBuf`], a compact string value type with
//! small-buffer optimization: content that fits the inline buffer is
//! stored directly in the value (no heap allocation), longer content
//! transparently moves to an exact-fit heap allocation, and a zero-copy
//! "reference" mode borrows external data without owning or copying it.
//!
//! ---
//!
//! ## [`StrBuf`]
//!
//! The inline capacity is a const generic parameter; aliases are provided
//! for common sizes ([`Str16`] through [`Str256`]), plus [`Str`] for the
//! bufferless variant that always uses the heap or a borrowed reference.
//!
//! ### Example
//!
//! ```rust
//! use strbuf::{Str, Str16, Str256};
//!
//! let short: Str16 = "filename.h".into(); // copied into the inline buffer
//! assert!(short.is_inline());
//!
//! let long: Str16 =
//!   "long_filename_not_very_long_but_longer_than_expected.h".into();
//! assert!(!long.is_inline()); // spilled to the heap
//!
//! let wide: Str256 =
//!   "long_filename_not_very_long_but_longer_than_expected.h".into();
//! assert!(wide.is_inline()); // fits a 256-byte buffer
//!
//! let r = Str::borrowed("literal"); // pointer copy, no allocation
//! assert!(!r.is_owned());
//! ```
//!
//! ### Storage modes
//!
//! A value is always in exactly one of four modes, reported by
//! [`StrBuf::mode`]: [`Empty`](Mode::Empty), [`Inline`](Mode::Inline),
//! [`Heap`](Mode::Heap) or [`Borrowed`](Mode::Borrowed). Every mutating
//! operation moves between them without leaking or double-freeing: a
//! borrowed cell becomes owned before its first write, growth targets the
//! inline buffer whenever the request fits it, and heap blocks are sized
//! exactly with no geometric over-allocation.
//!
//! ### Formatted writes
//!
//! [`set_fmt`](StrBuf::set_fmt) and [`append_fmt`](StrBuf::append_fmt)
//! render a `format_args!` invocation into exactly-sized storage; the
//! `*_nogrow` variants refuse instead of allocating. `StrBuf` also
//! implements [`core::fmt::Write`], so `write!` works directly.
//!
//! ---
//!
//! ## `no_std` support
//!
//! The crate is `no_std` (with `alloc`) unless the `std` feature is
//! enabled, making it suitable for embedded and other constrained
//! environments.
//!
//! ---
//!
//! ## Features
//!
//! - `std`: Enables integration with the Rust standard library. When
//!   disabled, which is the default, the crate operates in `no_std` mode.
//! - `serde`†: Serialization as a plain string and deserialization that
//!   borrows from the input when the format allows it.
//! - `is_variant`†: `is_empty()`/`is_inline()`/… helpers on [`Mode`].
//!
//! > † enabled by default

#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;
extern crate core;

mod store;
pub mod str_buf;

pub use str_buf::*;

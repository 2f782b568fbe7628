//! Page based byte storage for the session pipeline.
//!
//! This module provides the memory layer every other part of the crate builds on:
//!
//! - [`Arena`]: a growable sequence of fixed-size, power-of-two pages. Bytes written
//!   into an arena are never moved again, growth only appends whole pages at the tail.
//! - [`View`]: an `(offset, length)` pair addressing bytes inside one arena. Views are
//!   `Copy`, carry no lifetime and no arena identity; the caller keeps track of which
//!   arena a view belongs to.
//!
//! Because page addresses are stable, a view taken while a request is still arriving
//! stays valid however much the arena grows afterwards, and the reactor can read from
//! the socket straight into the tail page (see [`Arena::last_page_for_write`]).
//!
//! # Example
//!
//! ```
//! use arena_http::arena::{Arena, View};
//!
//! let mut arena = Arena::new(4);
//! let hello = arena.append(b"hello").unwrap();
//! let world = arena.append(b" world").unwrap();
//!
//! assert_eq!(arena.page_count(), 3);
//! assert!(arena.equal(hello, b"hello"));
//! assert_eq!(arena.to_vec(View::new(0, 11)), b"hello world");
//! assert_eq!(arena.find_byte(world, b'w'), Some(6));
//! ```

mod error;
mod ignore_case;
mod page_arena;
mod view;

#[cfg(test)]
mod proptests;

pub use error::ArenaError;
pub use page_arena::Arena;
pub use page_arena::Chunks;
pub use page_arena::DEFAULT_PAGE_SIZE;
pub use view::View;

pub(crate) use ignore_case::eq_ignore_case;

//! A Rust implementation of 64-bit Snowflake IDs
//!
//! ```rust
//! let id = snowflake::next()?;
//! println!("{}", id); // e.g. 1203164364374265856
//! println!("{}", snowflake::time_of(id)); // e.g. 1611942018305 (Unix milliseconds)
//! # Ok::<(), snowflake::Error>(())
//! ```
//!
//! # Field and bit layout
//!
//! This implementation produces signed 64-bit identifiers with the following bit layout:
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           timestamp                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     timestamp     |     worker_id     |       sequence        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Where:
//!
//! - The 42 high bits (41 usable while the sign bit stays clear) hold the number of
//!   milliseconds elapsed since [`EPOCH_MS`].
//! - The 10-bit `worker_id` field identifies the generating process. Assigning distinct worker
//!   IDs to concurrently running processes is up to the caller.
//! - The 12-bit `sequence` field is a counter that disambiguates IDs generated by the same
//!   worker within the same millisecond. It is reset to zero whenever the timestamp changes.
//!
//! When the system clock moves backwards, the generator waits (by default up to about ten
//! seconds) for the clock to pass the last timestamp used, and returns
//! [`Error::ClockRollback`] if it does not.
//!
//! By default, the sequence counter wraps around after 4096 IDs within one millisecond without
//! advancing the timestamp, so the 4097th ID generated in the same millisecond repeats the
//! first. Use [`SequenceOverflow::WaitForNextMillis`] to block until the next millisecond
//! instead.
//!
//! # Explicit generators
//!
//! ```rust
//! use snowflake::Generator;
//!
//! let g = Generator::new(222);
//! let id = g.next()?;
//! assert_eq!(g.worker_id(), 222);
//! assert_eq!(snowflake::Id::from(id).worker_id(), 222);
//! println!("{} generated at {}", id, g.time_of(id));
//! # Ok::<(), snowflake::Error>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
pub use error::{Error, ParseError};

mod id;
pub use id::Id;

pub mod generator;
pub use generator::{
    normalize_worker_id, Config, Generator, SequenceOverflow, SystemClock, TimeSource,
};

#[cfg(feature = "global_gen")]
mod worker_id;
#[cfg(feature = "global_gen")]
pub use worker_id::default_worker_id;

#[cfg(feature = "global_gen")]
mod global_gen;
#[cfg(feature = "global_gen")]
pub use global_gen::{default_generator, init, init_with, next, time_of, worker_id};

/// Number of bits allocated to the worker ID.
pub const WORKER_ID_BITS: u32 = 10;

/// Number of bits allocated to the sequence counter.
pub const SEQUENCE_BITS: u32 = 12;

/// Number of bits the timestamp is shifted by in a packed ID.
pub const TIMESTAMP_SHIFT: u32 = WORKER_ID_BITS + SEQUENCE_BITS;

/// Largest worker ID, also used as the worker ID mask.
pub const MAX_WORKER_ID: i64 = (1 << WORKER_ID_BITS) - 1;

/// Largest sequence value, also used as the sequence mask.
pub const MAX_SEQUENCE: i64 = (1 << SEQUENCE_BITS) - 1;

/// The reference instant of the timestamp field, in Unix milliseconds (2011-12-31T00:00:00Z).
///
/// IDs persisted or compared across processes must agree on this value.
pub const EPOCH_MS: i64 = 1_325_289_600_000;

use thiserror::Error;

/// Error returned when the generator cannot produce an ID.
///
/// Both variants are fatal to the call only; the generator state is left untouched and
/// subsequent calls succeed once the clock recovers.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The clock stayed behind the last timestamp used for longer than the configured budget.
    ///
    /// Timestamps are milliseconds relative to [`EPOCH_MS`](crate::EPOCH_MS).
    #[error("clock moved backwards: now {now}ms is behind the last timestamp {last_timestamp}ms")]
    ClockRollback {
        /// The last timestamp used by the generator.
        last_timestamp: i64,
        /// The last clock reading taken before giving up.
        now: i64,
    },

    /// The sequence counter was exhausted and the clock did not reach the next millisecond
    /// within the configured budget.
    ///
    /// Only returned by generators configured with
    /// [`SequenceOverflow::WaitForNextMillis`](crate::SequenceOverflow::WaitForNextMillis).
    #[error("sequence exhausted at {timestamp}ms and the clock did not advance")]
    SequenceExhausted {
        /// The timestamp whose sequence space was exhausted.
        timestamp: i64,
    },
}

/// Error parsing an invalid string representation of an ID.
#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("invalid string representation: {0}")]
pub struct ParseError(#[from] std::num::ParseIntError);

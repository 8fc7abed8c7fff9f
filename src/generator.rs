//! Snowflake generator and related types.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::{thread, time};

use tracing::{debug, error, warn};

use crate::{Error, Id, EPOCH_MS, MAX_SEQUENCE, MAX_WORKER_ID};

/// A trait that defines the minimum system clock interface for [`Generator`].
pub trait TimeSource {
    /// Returns the current Unix timestamp in milliseconds.
    fn unix_ts_ms(&mut self) -> i64;
}

/// The default [`TimeSource`] implementation that reads [`std::time::SystemTime`].
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn unix_ts_ms(&mut self) -> i64 {
        match time::SystemTime::now().duration_since(time::UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_millis() as i64,
            // clock set before 1970
            Err(err) => -(err.duration().as_millis() as i64),
        }
    }
}

/// Behavior when more than 4096 IDs are requested within the same millisecond.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SequenceOverflow {
    /// Wraps the sequence around to zero and keeps the timestamp, so the 4097th ID generated
    /// within one millisecond repeats the first.
    #[default]
    Wrap,

    /// Blocks until the clock reaches the next millisecond, capping the throughput at 4096 IDs
    /// per millisecond. Fails with [`Error::SequenceExhausted`] if the clock does not advance
    /// within the wait budget.
    WaitForNextMillis,
}

/// Tuning knobs of a [`Generator`].
///
/// The wait budget applies both to clock rollbacks and to
/// [`SequenceOverflow::WaitForNextMillis`]: the generator polls the clock every
/// `poll_interval`, at most `max_wait_attempts` times.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Maximum number of clock re-reads while waiting. Defaults to `100_000`.
    pub max_wait_attempts: u32,

    /// Delay between clock re-reads. Defaults to 50 microseconds.
    pub poll_interval: time::Duration,

    /// Sequence overflow behavior. Defaults to [`SequenceOverflow::Wrap`].
    pub sequence_overflow: SequenceOverflow,
}

impl Default for Config {
    /// Returns a config that polls every 50 microseconds up to 100,000 times, which adds up to
    /// about ten seconds with typical sleep granularity.
    fn default() -> Self {
        Self {
            max_wait_attempts: 100_000,
            poll_interval: time::Duration::from_micros(50),
            sequence_overflow: SequenceOverflow::Wrap,
        }
    }
}

/// Folds any integer into the valid worker ID range.
///
/// In-range values are returned as is; others are reduced with `((id % m) + m) % m` where `m`
/// is [`MAX_WORKER_ID`].
///
/// # Examples
///
/// ```rust
/// use snowflake::normalize_worker_id;
///
/// assert_eq!(normalize_worker_id(42), 42);
/// assert_eq!(normalize_worker_id(1029), 6);
/// assert_eq!(normalize_worker_id(-5), 1018);
/// ```
pub const fn normalize_worker_id(worker_id: i64) -> i64 {
    if 0 <= worker_id && worker_id <= MAX_WORKER_ID {
        worker_id
    } else {
        (worker_id % MAX_WORKER_ID + MAX_WORKER_ID) % MAX_WORKER_ID
    }
}

/// Represents a Snowflake generator bound to a worker ID.
///
/// The generator keeps the last timestamp and the sequence counter behind a mutex, so a single
/// instance can be shared across threads and guarantees unique IDs among its callers (see
/// [`SequenceOverflow`] for the per-millisecond limit).
///
/// # Examples
///
/// ```rust
/// use snowflake::Generator;
/// use std::{sync, thread};
///
/// let g = sync::Arc::new(Generator::new(7));
/// thread::scope(|s| {
///     for i in 0..4 {
///         let g = sync::Arc::clone(&g);
///         s.spawn(move || {
///             for _ in 0..8 {
///                 println!("{} by thread {}", g.next().unwrap(), i);
///                 thread::yield_now();
///             }
///         });
///     }
/// });
/// ```
///
/// # Clock rollback
///
/// If the clock reports a time earlier than the last timestamp used, [`next`] polls the clock
/// until it passes that timestamp and then resumes. The lock is held while waiting, so other
/// callers block as well. When the wait budget in [`Config`] runs out, [`next`] returns
/// [`Error::ClockRollback`] and leaves the generator state unchanged.
///
/// [`next`]: Generator::next
#[derive(Debug)]
pub struct Generator<T = SystemClock> {
    worker_id: i64,
    config: Config,
    state: Mutex<State<T>>,
}

#[derive(Debug)]
struct State<T> {
    last_timestamp: i64,
    sequence: i64,
    clock: T,
}

impl Generator {
    /// Creates a generator reading the system clock.
    ///
    /// Out-of-range worker IDs are folded into range by [`normalize_worker_id`].
    pub fn new(worker_id: i64) -> Self {
        Self::with_time_source(worker_id, SystemClock)
    }
}

impl<T: TimeSource> Generator<T> {
    /// Creates a generator with a custom clock and the default [`Config`].
    pub fn with_time_source(worker_id: i64, clock: T) -> Self {
        Self::with_config(worker_id, clock, Config::default())
    }

    /// Creates a generator with a custom clock and config.
    pub fn with_config(worker_id: i64, clock: T, config: Config) -> Self {
        let normalized = normalize_worker_id(worker_id);
        if normalized != worker_id {
            debug!(worker_id, normalized, "normalized out-of-range worker id");
        }
        debug!(worker_id = normalized, ?config, "created snowflake generator");

        Self {
            worker_id: normalized,
            config,
            state: Mutex::new(State {
                last_timestamp: 0,
                sequence: 0,
                clock,
            }),
        }
    }

    /// Generates a new ID.
    ///
    /// See the [`Generator`] type documentation for the rollback and overflow behavior.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockRollback`] if the clock stays behind the last timestamp for longer
    /// than the wait budget, and [`Error::SequenceExhausted`] if the sequence is exhausted under
    /// [`SequenceOverflow::WaitForNextMillis`] and the clock does not advance in time.
    pub fn next(&self) -> Result<i64, Error> {
        let mut state = self.lock_state();
        let last_timestamp = state.last_timestamp;

        let mut now = state.timestamp();
        if now < last_timestamp {
            warn!(
                last_timestamp,
                now,
                worker_id = self.worker_id,
                "clock moved backwards, waiting for it to catch up"
            );
            now = state
                .wait_until_after(now, &self.config)
                .map_err(|now| {
                    error!(last_timestamp, now, "clock did not recover from rollback");
                    Error::ClockRollback {
                        last_timestamp,
                        now,
                    }
                })?;
        }

        let mut sequence = 0;
        if now == last_timestamp {
            sequence = (state.sequence + 1) & MAX_SEQUENCE;
            if sequence == 0 && self.config.sequence_overflow == SequenceOverflow::WaitForNextMillis
            {
                now = state
                    .wait_until_after(now, &self.config)
                    .map_err(|_| {
                        error!(
                            timestamp = last_timestamp,
                            "clock did not advance past exhausted sequence"
                        );
                        Error::SequenceExhausted {
                            timestamp: last_timestamp,
                        }
                    })?;
            }
        }

        state.last_timestamp = now;
        state.sequence = sequence;
        Ok(Id::from_fields(now, self.worker_id, sequence).into())
    }

    /// Returns an infinite iterator that calls [`next`](Generator::next) for each item.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use snowflake::Generator;
    ///
    /// Generator::new(1)
    ///     .iter()
    ///     .enumerate()
    ///     .skip(4)
    ///     .take(4)
    ///     .for_each(|(i, e)| println!("[{i}] {}", e.unwrap()));
    /// ```
    pub fn iter(&self) -> impl Iterator<Item = Result<i64, Error>> + '_ {
        std::iter::repeat_with(move || self.next())
    }

    fn lock_state(&self) -> MutexGuard<'_, State<T>> {
        // state is only written after every fallible step
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Generator<T> {
    /// Returns the worker ID bound to the generator.
    pub fn worker_id(&self) -> i64 {
        self.worker_id
    }

    /// Extracts the Unix timestamp in milliseconds from an ID.
    ///
    /// The ID is not checked to have been produced by this generator.
    pub fn time_of(&self, id: i64) -> i64 {
        Id::from(id).unix_ts_ms()
    }

    /// Returns the config the generator was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl<T: TimeSource> State<T> {
    /// Reads the clock in milliseconds relative to [`EPOCH_MS`].
    fn timestamp(&mut self) -> i64 {
        self.clock.unix_ts_ms() - EPOCH_MS
    }

    /// Polls the clock until it passes `last_timestamp`, starting from the reading `now`.
    ///
    /// Returns the last reading as `Err` when the wait budget is exhausted.
    fn wait_until_after(&mut self, mut now: i64, config: &Config) -> Result<i64, i64> {
        let mut attempts = 0;
        while now <= self.last_timestamp {
            if attempts == config.max_wait_attempts {
                return Err(now);
            }
            attempts += 1;
            thread::sleep(config.poll_interval);
            now = self.timestamp();
        }
        Ok(now)
    }
}

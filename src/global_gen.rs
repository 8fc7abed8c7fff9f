//! Default generator and entry point functions.

#![cfg_attr(docsrs, doc(cfg(feature = "global_gen")))]

use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::info;

use crate::{default_worker_id, Error, Generator};

/// Returns the slot holding the process-wide default generator, creating one if none exists.
fn global_gen() -> &'static RwLock<Arc<Generator>> {
    static G: OnceLock<RwLock<Arc<Generator>>> = OnceLock::new();
    G.get_or_init(|| {
        let worker_id = default_worker_id();
        info!(worker_id, "initialized default snowflake generator");
        RwLock::new(Arc::new(Generator::new(worker_id)))
    })
}

/// Returns the process-wide default generator.
///
/// The returned handle keeps working even if the default generator is replaced afterwards by
/// [`init`] or [`init_with`].
pub fn default_generator() -> Arc<Generator> {
    let slot = global_gen().read().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(&slot)
}

/// Replaces the process-wide default generator with a new one bound to `worker_id`.
///
/// Passing `0` derives the worker ID with [`default_worker_id`] instead of using worker ID `0`
/// literally; use [`init_with`] with [`Generator::new(0)`](Generator::new) to bind the default
/// generator to worker ID `0`.
///
/// Calls already in progress complete against the generator that was the default when they
/// started.
///
/// # Examples
///
/// ```rust
/// snowflake::init(111);
/// assert_eq!(snowflake::worker_id(), 111);
/// ```
pub fn init(worker_id: i64) {
    let worker_id = if worker_id == 0 {
        default_worker_id()
    } else {
        worker_id
    };
    init_with(Generator::new(worker_id));
}

/// Replaces the process-wide default generator with an explicitly constructed one.
///
/// # Examples
///
/// ```rust
/// use snowflake::{Config, Generator, SequenceOverflow, SystemClock};
///
/// let config = Config {
///     sequence_overflow: SequenceOverflow::WaitForNextMillis,
///     ..Default::default()
/// };
/// snowflake::init_with(Generator::with_config(42, SystemClock, config));
/// assert_eq!(snowflake::worker_id(), 42);
/// ```
pub fn init_with(generator: Generator) {
    info!(
        worker_id = generator.worker_id(),
        "replaced default snowflake generator"
    );
    let generator = Arc::new(generator);
    *global_gen().write().unwrap_or_else(PoisonError::into_inner) = generator;
}

/// Generates a new ID with the process-wide default generator.
///
/// # Errors
///
/// See [`Generator::next`].
///
/// # Examples
///
/// ```rust
/// let id = snowflake::next()?;
/// println!("{}", id); // e.g. 1571649329562513407
/// # Ok::<(), snowflake::Error>(())
/// ```
pub fn next() -> Result<i64, Error> {
    default_generator().next()
}

/// Extracts the Unix timestamp in milliseconds from an ID.
///
/// # Examples
///
/// ```rust
/// assert_eq!(snowflake::time_of(1571649329562513407), 1_700_000_000_000);
/// ```
pub fn time_of(id: i64) -> i64 {
    default_generator().time_of(id)
}

/// Returns the worker ID of the process-wide default generator.
pub fn worker_id() -> i64 {
    default_generator().worker_id()
}

#[cfg(test)]
mod tests {
    use super::{default_generator, init, init_with, next, time_of, worker_id};
    use crate::generator::{Config, Generator, SequenceOverflow, SystemClock, TimeSource};
    use crate::{default_worker_id, Id, MAX_WORKER_ID};
    use std::sync::{Mutex, MutexGuard, PoisonError};

    /// Serializes the tests that replace the process-wide generator.
    fn serial() -> MutexGuard<'static, ()> {
        static LOCK: Mutex<()> = Mutex::new(());
        LOCK.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn strict_generator(worker_id: i64) -> Generator {
        let config = Config {
            sequence_overflow: SequenceOverflow::WaitForNextMillis,
            ..Default::default()
        };
        Generator::with_config(worker_id, SystemClock, config)
    }

    /// Binds default generator to worker ID passed to init
    #[test]
    fn binds_default_generator_to_worker_id_passed_to_init() {
        let _guard = serial();
        init(111);
        assert_eq!(worker_id(), 111);
        assert_eq!(Id::from(next().unwrap()).worker_id(), 111);

        init(-5);
        assert_eq!(worker_id(), 1018);
    }

    /// Derives worker ID when init receives zero
    #[test]
    fn derives_worker_id_when_init_receives_zero() {
        let _guard = serial();
        init(0);
        let derived = worker_id();
        assert!((0..=MAX_WORKER_ID).contains(&derived));
        if crate::worker_id::hardware_address_checksum().is_ok() {
            assert_eq!(derived, default_worker_id());
        }

        init_with(Generator::new(0));
        assert_eq!(worker_id(), 0);
    }

    /// Keeps in-flight handles on the replaced generator
    #[test]
    fn keeps_in_flight_handles_on_replaced_generator() {
        let _guard = serial();
        init(7);
        let old = default_generator();
        init(8);

        assert_eq!(old.worker_id(), 7);
        assert_eq!(Id::from(old.next().unwrap()).worker_id(), 7);
        assert_eq!(worker_id(), 8);
        assert_eq!(Id::from(next().unwrap()).worker_id(), 8);
    }

    /// Encodes up-to-date timestamp
    #[test]
    fn encodes_up_to_date_timestamp() {
        let _guard = serial();
        init(222);
        for _ in 0..10_000 {
            let before = SystemClock.unix_ts_ms();
            let id = next().unwrap();
            let after = SystemClock.unix_ts_ms();
            assert!(before <= time_of(id) && time_of(id) <= after);
        }
    }

    /// Generates no IDs sharing same timestamp and sequence under multithreading
    #[test]
    fn generates_no_ids_sharing_same_timestamp_and_sequence_under_multithreading(
    ) -> Result<(), Box<dyn std::error::Error>> {
        use std::{collections::HashSet, sync::mpsc, thread};

        let _guard = serial();
        init_with(strict_generator(100));

        let (tx, rx) = mpsc::channel();
        for _ in 0..4 {
            let tx = tx.clone();
            thread::Builder::new()
                .spawn(move || {
                    for _ in 0..100_000 {
                        tx.send(next().unwrap()).unwrap();
                    }
                })
                .map_err(|err| format!("failed to spawn thread: {:?}", err))?;
        }
        drop(tx);

        let mut s = HashSet::new();
        while let Ok(e) = rx.recv() {
            s.insert(e);
        }

        assert_eq!(s.len(), 4 * 100_000);
        Ok(())
    }
}

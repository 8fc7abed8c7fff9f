//! Default worker ID derivation.

use std::{io, time};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha12Rng;
use tracing::{debug, warn};

use crate::MAX_WORKER_ID;

/// Derives a worker ID from the hardware addresses of the local network interfaces.
///
/// The addresses are fed into a CRC-32 (IEEE) checksum that is reduced into the worker ID range.
/// Interfaces without a hardware address, or with an all-zero one such as loopback, are skipped.
/// If the interfaces cannot be enumerated, a random worker ID seeded from the current time is
/// returned instead.
///
/// Machines may still end up with the same worker ID; assign IDs explicitly where collisions
/// matter.
///
/// # Examples
///
/// ```rust
/// let worker_id = snowflake::default_worker_id();
/// assert!((0..=snowflake::MAX_WORKER_ID).contains(&worker_id));
/// ```
#[cfg_attr(docsrs, doc(cfg(feature = "global_gen")))]
pub fn default_worker_id() -> i64 {
    match hardware_address_checksum() {
        Ok(checksum) => {
            let worker_id = reduce(checksum);
            debug!(worker_id, checksum, "derived worker id from hardware addresses");
            worker_id
        }
        Err(err) => {
            let worker_id = random_worker_id();
            warn!(
                %err,
                worker_id,
                "could not enumerate network interfaces, using random worker id"
            );
            worker_id
        }
    }
}

fn reduce(value: u32) -> i64 {
    (value as i64 % MAX_WORKER_ID) & MAX_WORKER_ID
}

fn random_worker_id() -> i64 {
    let seed = time::SystemTime::now()
        .duration_since(time::UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_nanos() as u64);
    reduce(ChaCha12Rng::seed_from_u64(seed).next_u32())
}

/// Computes the CRC-32 of the non-zero addresses in order.
fn checksum<I: IntoIterator<Item = [u8; 6]>>(addrs: I) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    for addr in addrs {
        if addr.iter().any(|&b| b != 0) {
            hasher.update(&addr);
        }
    }
    hasher.finalize()
}

#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "netbsd",
    target_os = "openbsd"
))]
pub(crate) fn hardware_address_checksum() -> io::Result<u32> {
    let addrs = nix::ifaddrs::getifaddrs()?.filter_map(|ifaddr| {
        ifaddr
            .address
            .as_ref()
            .and_then(|addr| addr.as_link_addr())
            .and_then(|link| link.addr())
    });
    Ok(checksum(addrs))
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "netbsd",
    target_os = "openbsd"
)))]
pub(crate) fn hardware_address_checksum() -> io::Result<u32> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "network interface enumeration is not supported on this platform",
    ))
}

use std::{fmt, str};

use crate::{ParseError, EPOCH_MS, MAX_SEQUENCE, MAX_WORKER_ID, SEQUENCE_BITS, TIMESTAMP_SHIFT};

/// A view over a packed 64-bit Snowflake ID that gives access to its fields.
///
/// Generators hand out plain `i64` values; wrap one in `Id` to decode it.
///
/// # Examples
///
/// ```rust
/// use snowflake::Id;
///
/// let id = Id::from(1571649329562513407);
/// assert_eq!(id.unix_ts_ms(), 1_700_000_000_000);
/// assert_eq!(id.worker_id(), 222);
/// assert_eq!(id.sequence(), 4095);
/// ```
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Id(i64);

impl Id {
    /// Packs field values into an ID.
    ///
    /// `timestamp` is in milliseconds relative to [`EPOCH_MS`]. `worker_id` and `sequence` are
    /// masked to their field widths; the timestamp is shifted without range checks.
    pub const fn from_fields(timestamp: i64, worker_id: i64, sequence: i64) -> Self {
        Self(
            (timestamp << TIMESTAMP_SHIFT)
                | ((worker_id & MAX_WORKER_ID) << SEQUENCE_BITS)
                | (sequence & MAX_SEQUENCE),
        )
    }

    /// Returns the underlying integer.
    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// Returns the timestamp field in milliseconds relative to [`EPOCH_MS`].
    pub const fn timestamp(&self) -> i64 {
        self.0 >> TIMESTAMP_SHIFT
    }

    /// Returns the timestamp as Unix milliseconds.
    pub const fn unix_ts_ms(&self) -> i64 {
        self.timestamp() + EPOCH_MS
    }

    /// Returns the worker ID field.
    pub const fn worker_id(&self) -> i64 {
        (self.0 >> SEQUENCE_BITS) & MAX_WORKER_ID
    }

    /// Returns the sequence field.
    pub const fn sequence(&self) -> i64 {
        self.0 & MAX_SEQUENCE
    }
}

impl fmt::Display for Id {
    /// Returns the decimal string representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl str::FromStr for Id {
    type Err = ParseError;

    /// Creates an object from the decimal string representation.
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        Ok(Self(src.parse()?))
    }
}

impl From<Id> for i64 {
    fn from(src: Id) -> Self {
        src.0
    }
}

impl From<i64> for Id {
    fn from(src: i64) -> Self {
        Self(src)
    }
}

impl From<Id> for String {
    fn from(src: Id) -> Self {
        src.to_string()
    }
}

impl TryFrom<String> for Id {
    type Error = ParseError;

    fn try_from(src: String) -> Result<Self, Self::Error> {
        src.parse()
    }
}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
mod serde_support {
    use super::{fmt, Id};
    use serde::{de, Deserializer, Serializer};

    /// Human-readable formats get a decimal string since many JSON consumers lose precision
    /// above 2^53.
    impl serde::Serialize for Id {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            if serializer.is_human_readable() {
                serializer.collect_str(self)
            } else {
                serializer.serialize_i64(self.0)
            }
        }
    }

    impl<'de> serde::Deserialize<'de> for Id {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            if deserializer.is_human_readable() {
                deserializer.deserialize_any(VisitorImpl)
            } else {
                deserializer.deserialize_i64(VisitorImpl)
            }
        }
    }

    struct VisitorImpl;

    impl<'de> de::Visitor<'de> for VisitorImpl {
        type Value = Id;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "a snowflake ID as an integer or a decimal string")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            value.parse::<Self::Value>().map_err(de::Error::custom)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(Id(value))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            i64::try_from(value)
                .map(Id)
                .map_err(|_| de::Error::invalid_value(de::Unexpected::Unsigned(value), &self))
        }
    }

}

#[cfg(test)]
mod tests {
    use super::Id;
    use crate::{EPOCH_MS, MAX_SEQUENCE, MAX_WORKER_ID};

    /// Returns a collection of prepared cases
    fn prepare_cases() -> &'static [((i64, i64, i64), i64)] {
        const MAX_TIMESTAMP: i64 = (1 << 41) - 1;

        &[
            ((0, 0, 0), 0),
            ((1, 0, 0), 4194304),
            ((0, MAX_WORKER_ID, 0), 4190208),
            ((0, 0, MAX_SEQUENCE), 4095),
            ((MAX_TIMESTAMP, MAX_WORKER_ID, MAX_SEQUENCE), i64::MAX),
            ((123456789, 111, 7), 517815304384519),
            ((374710400000, 222, 4095), 1571649329562513407),
        ]
    }

    /// Encodes and decodes prepared cases correctly
    #[test]
    fn encodes_and_decodes_prepared_cases_correctly() {
        for &((timestamp, worker_id, sequence), value) in prepare_cases() {
            let e = Id::from_fields(timestamp, worker_id, sequence);
            assert_eq!(e.as_i64(), value);
            assert_eq!(e.timestamp(), timestamp);
            assert_eq!(e.worker_id(), worker_id);
            assert_eq!(e.sequence(), sequence);
            assert_eq!(e.unix_ts_ms(), timestamp + EPOCH_MS);
            assert_eq!(e.to_string(), value.to_string());
            assert_eq!(value.to_string().parse(), Ok(e));
        }
    }

    /// Masks out-of-range worker ID and sequence
    #[test]
    fn masks_out_of_range_worker_id_and_sequence() {
        let e = Id::from_fields(5, 1024 + 3, 4096 + 9);
        assert_eq!(e.timestamp(), 5);
        assert_eq!(e.worker_id(), 3);
        assert_eq!(e.sequence(), 9);
    }

    /// Orders IDs by timestamp first
    #[test]
    fn orders_ids_by_timestamp_first() {
        let earlier = Id::from_fields(1000, MAX_WORKER_ID, MAX_SEQUENCE);
        let later = Id::from_fields(1001, 0, 0);
        assert!(earlier < later);
        assert!(i64::from(earlier) < i64::from(later));
    }

    /// Returns error to invalid string representation
    #[test]
    fn returns_error_to_invalid_string_representation() {
        let cases = [
            "",
            " 517815304384519",
            "517815304384519 ",
            "0x1d6f3d4a06f07",
            "517815304384519.0",
            "9223372036854775808",
            "51781530438451a",
        ];

        for e in cases {
            assert!(e.parse::<Id>().is_err(), "{e:?}");
        }
    }

    /// Has symmetric converters
    #[test]
    fn has_symmetric_converters() {
        for &(_, value) in prepare_cases() {
            let e = Id::from(value);
            assert_eq!(Id::from(i64::from(e)), e);
            assert_eq!(Id::try_from(String::from(e)), Ok(e));
        }
    }
}

use std::fmt;
use std::time::Duration;

use humantime::{format_duration, parse_duration};
use serde_with::{DeserializeAs, SerializeAs};

/// Durations in configuration files are written in humantime syntax
/// ("10s", "1m30s").
pub(crate) struct DurationString;

impl<'de> DeserializeAs<'de, Duration> for DurationString {
    fn deserialize_as<D>(deserializer: D) -> std::result::Result<Duration, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct DurationVisitor;

        impl serde::de::Visitor<'_> for DurationVisitor {
            type Value = Duration;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a humantime duration string such as \"10s\"")
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Duration, E>
            where
                E: serde::de::Error,
            {
                parse_duration(value.trim()).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(DurationVisitor)
    }
}

impl SerializeAs<Duration> for DurationString {
    fn serialize_as<S>(value: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&format_duration(*value))
    }
}

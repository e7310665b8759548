use std::time::Duration;

pub(super) const fn default_limit() -> u32 {
    20
}

pub(super) const fn default_http_timeout() -> Duration {
    Duration::from_secs(10)
}

pub(super) const fn default_connect_timeout() -> Duration {
    Duration::from_secs(5)
}

use std::time::Duration;

use serde::{Deserialize, Serialize};

////////////////////////////////////////////////////////////////////////////////

/// Local interval between two polls of a countdown.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Poll intervals below this are raised to it.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Entries a countdown log keeps before dropping the oldest ones.
pub const DEFAULT_LOG_CAPACITY: usize = 1024;

////////////////////////////////////////////////////////////////////////////////

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountdownConfig {
    #[serde(rename = "poll_interval_ms", with = "millis")]
    pub poll_interval: Duration,

    /// Clock reads running longer than this fail the countdown.
    /// `None` waits for a read indefinitely.
    #[serde(rename = "read_timeout_ms", with = "opt_millis")]
    pub read_timeout: Option<Duration>,

    /// Echo log entries to stdout as they are recorded.
    pub verbose: bool,

    /// Maximum number of log entries kept, `None` keeps all of them.
    pub log_capacity: Option<usize>,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            read_timeout: None,
            verbose: false,
            log_capacity: Some(DEFAULT_LOG_CAPACITY),
        }
    }
}

impl CountdownConfig {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        Ok(config.normalized())
    }

    /// Raises out-of-range values. Countdowns apply it to every config
    /// they receive.
    pub(crate) fn normalized(mut self) -> Self {
        self.poll_interval = self.poll_interval.max(MIN_POLL_INTERVAL);
        self.log_capacity = self.log_capacity.map(|capacity| capacity.max(1));
        self
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Default)]
pub struct CountdownConfigBuilder {
    poll_interval: Option<Duration>,
    read_timeout: Option<Duration>,
    verbose: bool,
    log_capacity: Option<Option<usize>>,
}

impl CountdownConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = Some(poll_interval);
        self
    }

    pub fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = Some(read_timeout);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = Some(Some(capacity));
        self
    }

    pub fn unbounded_log(mut self) -> Self {
        self.log_capacity = Some(None);
        self
    }

    pub fn build(self) -> CountdownConfig {
        CountdownConfig {
            poll_interval: self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
            read_timeout: self.read_timeout,
            verbose: self.verbose,
            log_capacity: self.log_capacity.unwrap_or(Some(DEFAULT_LOG_CAPACITY)),
        }
        .normalized()
    }
}

////////////////////////////////////////////////////////////////////////////////

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

mod opt_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(d).map(|v| v.map(Duration::from_millis))
    }
}

////////////////////////////////////////////////////////////////////////////////

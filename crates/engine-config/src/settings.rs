use crate::error::SettingsError;
use std::{collections::HashMap, time::Duration};
use tracing::debug;

pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(500);
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;
pub const DEFAULT_PAGE_SIZE: usize = 1000;

pub const ENV_POLL_TIMEOUT_MS: &str = "RIAK_POLL_TIMEOUT_MS";
pub const ENV_QUEUE_CAPACITY: &str = "RIAK_QUEUE_CAPACITY";
pub const ENV_PAGE_SIZE: &str = "RIAK_PAGE_SIZE";
pub const ENV_MAX_RESULTS: &str = "RIAK_MAX_RESULTS";

/// Immutable, validated tuning for streaming operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSettings {
    /// Upper bound on a single wait for the next chunk
    poll_timeout: Duration,
    /// Chunks the producer may enqueue ahead of the consumer
    queue_capacity: usize,
    /// Entries per chunk produced by the execution engine
    page_size: usize,
    /// Default result cap for paginated queries
    max_results: Option<usize>,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            page_size: DEFAULT_PAGE_SIZE,
            max_results: None,
        }
    }
}

impl StreamSettings {
    pub fn builder() -> StreamSettingsBuilder {
        StreamSettingsBuilder::default()
    }

    /// Reads overrides from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_vars(std::env::vars())
    }

    /// Reads overrides from `vars`; unset variables keep their defaults.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        StreamSettingsBuilder::from_vars(vars)?.build()
    }

    pub fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn max_results(&self) -> Option<usize> {
        self.max_results
    }
}

#[derive(Debug, Default, Clone)]
pub struct StreamSettingsBuilder {
    pub poll_timeout: Option<Duration>,
    pub queue_capacity: Option<usize>,
    pub page_size: Option<usize>,
    pub max_results: Option<usize>,
}

impl StreamSettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a builder from `RIAK_*` variables.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let mut builder = Self::default();
        if let Some(ms) = parse_var(&vars, ENV_POLL_TIMEOUT_MS)? {
            builder.poll_timeout = Some(Duration::from_millis(ms as u64));
        }
        builder.queue_capacity = parse_var(&vars, ENV_QUEUE_CAPACITY)?;
        builder.page_size = parse_var(&vars, ENV_PAGE_SIZE)?;
        builder.max_results = parse_var(&vars, ENV_MAX_RESULTS)?;

        Ok(builder)
    }

    pub fn poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = Some(poll_timeout);
        self
    }

    pub fn queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = Some(queue_capacity);
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Fields set on `other` win over fields set on `self`.
    pub fn merge(self, other: StreamSettingsBuilder) -> Self {
        Self {
            poll_timeout: other.poll_timeout.or(self.poll_timeout),
            queue_capacity: other.queue_capacity.or(self.queue_capacity),
            page_size: other.page_size.or(self.page_size),
            max_results: other.max_results.or(self.max_results),
        }
    }

    pub fn build(self) -> Result<StreamSettings, SettingsError> {
        let defaults = StreamSettings::default();
        let settings = StreamSettings {
            poll_timeout: self.poll_timeout.unwrap_or(defaults.poll_timeout),
            queue_capacity: self.queue_capacity.unwrap_or(defaults.queue_capacity),
            page_size: self.page_size.unwrap_or(defaults.page_size),
            max_results: self.max_results,
        };

        if settings.poll_timeout.is_zero() {
            return Err(SettingsError::Zero("poll_timeout"));
        }
        if settings.queue_capacity == 0 {
            return Err(SettingsError::Zero("queue_capacity"));
        }
        if settings.page_size == 0 {
            return Err(SettingsError::Zero("page_size"));
        }
        if settings.max_results == Some(0) {
            return Err(SettingsError::Zero("max_results"));
        }

        debug!(?settings, "Stream settings resolved");
        Ok(settings)
    }
}

fn parse_var(
    vars: &HashMap<String, String>,
    var: &'static str,
) -> Result<Option<usize>, SettingsError> {
    let Some(raw) = vars.get(var) else {
        return Ok(None);
    };

    raw.trim()
        .parse::<usize>()
        .map(Some)
        .map_err(|_| SettingsError::InvalidNumber {
            var,
            value: raw.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = StreamSettings::default();
        assert_eq!(settings.poll_timeout(), Duration::from_millis(500));
        assert_eq!(settings.queue_capacity(), 64);
        assert_eq!(settings.page_size(), 1000);
        assert_eq!(settings.max_results(), None);
    }

    #[test]
    fn test_builder() {
        let settings = StreamSettings::builder()
            .poll_timeout(Duration::from_millis(50))
            .page_size(10)
            .max_results(25)
            .build()
            .unwrap();

        assert_eq!(settings.poll_timeout(), Duration::from_millis(50));
        assert_eq!(settings.queue_capacity(), DEFAULT_QUEUE_CAPACITY);
        assert_eq!(settings.page_size(), 10);
        assert_eq!(settings.max_results(), Some(25));
    }

    #[test]
    fn test_zero_values_are_rejected() {
        assert_eq!(
            StreamSettings::builder().page_size(0).build(),
            Err(SettingsError::Zero("page_size"))
        );
        assert_eq!(
            StreamSettings::builder()
                .poll_timeout(Duration::ZERO)
                .build(),
            Err(SettingsError::Zero("poll_timeout"))
        );
        assert_eq!(
            StreamSettings::builder().queue_capacity(0).build(),
            Err(SettingsError::Zero("queue_capacity"))
        );
    }

    #[test]
    fn test_from_vars() {
        let settings = StreamSettings::from_vars([
            (ENV_POLL_TIMEOUT_MS, "250"),
            (ENV_PAGE_SIZE, " 20 "),
            ("UNRELATED", "x"),
        ])
        .unwrap();

        assert_eq!(settings.poll_timeout(), Duration::from_millis(250));
        assert_eq!(settings.page_size(), 20);
        assert_eq!(settings.queue_capacity(), DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn test_from_vars_rejects_garbage() {
        let err = StreamSettings::from_vars([(ENV_QUEUE_CAPACITY, "many")]).unwrap_err();
        assert_eq!(
            err,
            SettingsError::InvalidNumber {
                var: ENV_QUEUE_CAPACITY,
                value: "many".to_string()
            }
        );
    }

    #[test]
    fn test_explicit_values_override_environment() {
        let env = StreamSettingsBuilder::from_vars([(ENV_PAGE_SIZE, "20"), (ENV_MAX_RESULTS, "5")])
            .unwrap();
        let flags = StreamSettingsBuilder::new().page_size(7);

        let settings = env.merge(flags).build().unwrap();
        assert_eq!(settings.page_size(), 7);
        assert_eq!(settings.max_results(), Some(5));
    }
}

//! Configuration for the mailwatch service.
//!
//! Use [`MailwatchConfigBuilder`] to create a configuration with sensible
//! defaults:
//!
//! ```
//! use mailwatch::MailwatchConfig;
//! use std::time::Duration;
//!
//! let config = MailwatchConfig::builder()
//!     .port(8080)
//!     .check_interval(Duration::from_secs(5))
//!     .build()
//!     .expect("valid config");
//! ```

use crate::error::{Error, Result};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default upstream provider API endpoint.
pub const DEFAULT_PROVIDER_URL: &str = "https://www.1secmail.com/api/v1/";

/// Runtime configuration for [`MailwatchService`](crate::MailwatchService)
/// and the HTTP server.
#[derive(Debug, Clone)]
pub struct MailwatchConfig {
    /// Address the HTTP server binds to.
    pub host: IpAddr,
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Upstream provider API base URL.
    pub provider_base_url: String,
    /// Interval between poll ticks for a tracked address.
    pub check_interval: Duration,
    /// Per-request timeout for mailbox fetches.
    pub fetch_timeout: Duration,
    /// Timeout for the verify-email provider probe.
    pub verify_timeout: Duration,
    /// Idle threshold after which a realtime connection is swept.
    pub idle_timeout: Duration,
    /// Interval between idle-connection sweeps.
    pub sweep_interval: Duration,
}

impl Default for MailwatchConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
            provider_base_url: DEFAULT_PROVIDER_URL.to_string(),
            check_interval: Duration::from_secs(5),
            fetch_timeout: Duration::from_secs(10),
            verify_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(3600),
        }
    }
}

impl MailwatchConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> MailwatchConfigBuilder {
        MailwatchConfigBuilder::default()
    }

    /// Loads configuration from the environment.
    ///
    /// Honors `PORT` and `MAILWATCH_PROVIDER_URL`; everything else keeps its
    /// default.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment value fails to parse or validation
    /// fails.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();

        if let Ok(port) = std::env::var("PORT") {
            let port = port.parse::<u16>().map_err(|_| Error::InvalidConfig {
                message: format!("PORT is not a valid port number: {port}"),
            })?;
            builder = builder.port(port);
        }

        if let Ok(url) = std::env::var("MAILWATCH_PROVIDER_URL") {
            builder = builder.provider_base_url(url);
        }

        builder.build()
    }

    /// The socket address the HTTP server binds to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Builder for [`MailwatchConfig`].
#[derive(Debug, Default)]
pub struct MailwatchConfigBuilder {
    host: Option<IpAddr>,
    port: Option<u16>,
    provider_base_url: Option<String>,
    check_interval: Option<Duration>,
    fetch_timeout: Option<Duration>,
    verify_timeout: Option<Duration>,
    idle_timeout: Option<Duration>,
    sweep_interval: Option<Duration>,
}

impl MailwatchConfigBuilder {
    /// Sets the bind host.
    #[must_use]
    pub fn host(mut self, host: IpAddr) -> Self {
        self.host = Some(host);
        self
    }

    /// Sets the bind port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the upstream provider API base URL.
    #[must_use]
    pub fn provider_base_url(mut self, url: impl Into<String>) -> Self {
        self.provider_base_url = Some(url.into());
        self
    }

    /// Sets the poll interval for tracked addresses.
    #[must_use]
    pub fn check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = Some(interval);
        self
    }

    /// Sets the per-request timeout for mailbox fetches.
    #[must_use]
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Sets the timeout for the verify-email provider probe.
    #[must_use]
    pub fn verify_timeout(mut self, timeout: Duration) -> Self {
        self.verify_timeout = Some(timeout);
        self
    }

    /// Sets the idle threshold for realtime connections.
    #[must_use]
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Sets the interval between idle-connection sweeps.
    #[must_use]
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = Some(interval);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a value fails validation (zero intervals, empty
    /// provider URL).
    pub fn build(self) -> Result<MailwatchConfig> {
        let defaults = MailwatchConfig::default();

        let config = MailwatchConfig {
            host: self.host.unwrap_or(defaults.host),
            port: self.port.unwrap_or(defaults.port),
            provider_base_url: self.provider_base_url.unwrap_or(defaults.provider_base_url),
            check_interval: self.check_interval.unwrap_or(defaults.check_interval),
            fetch_timeout: self.fetch_timeout.unwrap_or(defaults.fetch_timeout),
            verify_timeout: self.verify_timeout.unwrap_or(defaults.verify_timeout),
            idle_timeout: self.idle_timeout.unwrap_or(defaults.idle_timeout),
            sweep_interval: self.sweep_interval.unwrap_or(defaults.sweep_interval),
        };

        if config.provider_base_url.is_empty() {
            return Err(Error::InvalidConfig {
                message: "provider base URL must not be empty".into(),
            });
        }
        if config.check_interval.is_zero() {
            return Err(Error::InvalidConfig {
                message: "check interval must be non-zero".into(),
            });
        }
        if config.fetch_timeout.is_zero() || config.verify_timeout.is_zero() {
            return Err(Error::InvalidConfig {
                message: "timeouts must be non-zero".into(),
            });
        }
        if config.sweep_interval.is_zero() {
            return Err(Error::InvalidConfig {
                message: "sweep interval must be non-zero".into(),
            });
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MailwatchConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.check_interval, Duration::from_secs(5));
        assert_eq!(config.provider_base_url, DEFAULT_PROVIDER_URL);
        assert_eq!(config.bind_addr().port(), 3000);
    }

    #[test]
    fn test_builder_overrides() {
        let config = MailwatchConfig::builder()
            .port(8080)
            .check_interval(Duration::from_secs(2))
            .provider_base_url("http://localhost:9999/api/v1/")
            .build()
            .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.check_interval, Duration::from_secs(2));
        assert_eq!(config.provider_base_url, "http://localhost:9999/api/v1/");
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = MailwatchConfig::builder()
            .check_interval(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_provider_url_rejected() {
        let result = MailwatchConfig::builder().provider_base_url("").build();
        assert!(result.is_err());
    }
}

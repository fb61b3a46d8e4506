use crate::{
    ConfigError, DEFAULT_DRAIN_TIMEOUT, DEFAULT_DURATION, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_VIRTUAL_USERS,
};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSecondsWithFrac};
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Configuration for a single load run. Immutable once the run starts.
///
/// `virtual_users` concurrent workers execute `scenario` in a loop until
/// `duration` elapses. Iterations are uncapped and back-to-back unless
/// `max_iterations`, `iteration_delay` or `max_tps` say otherwise.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunConfig {
    pub virtual_users: u32,
    #[serde_as(as = "DurationSecondsWithFrac")]
    pub duration: Duration,
    pub scenario: Vec<RequestSpec>,
    #[serde_as(as = "DurationSecondsWithFrac")]
    pub request_timeout: Duration,
    /// How long the scheduler waits for in-flight work after the deadline
    /// before force-abandoning stragglers.
    #[serde_as(as = "DurationSecondsWithFrac")]
    pub drain_timeout: Duration,
    /// Per-VU iteration cap. `None` means bounded by the deadline only.
    #[serde(default)]
    pub max_iterations: Option<u64>,
    /// Pause between iterations of a single VU.
    #[serde(default)]
    #[serde_as(as = "Option<DurationSecondsWithFrac>")]
    pub iteration_delay: Option<Duration>,
    /// Global iteration-rate cap shared by all VUs.
    #[serde(default)]
    pub max_tps: Option<NonZeroU32>,
}

impl RunConfig {
    pub fn new(scenario: Vec<RequestSpec>) -> Self {
        Self {
            virtual_users: DEFAULT_VIRTUAL_USERS,
            duration: DEFAULT_DURATION,
            scenario,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            max_iterations: None,
            iteration_delay: None,
            max_tps: None,
        }
    }

    /// Shorthand for the common single-step GET scenario.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(vec![RequestSpec::get(url)])
    }

    pub fn virtual_users(mut self, virtual_users: u32) -> Self {
        self.virtual_users = virtual_users;
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    pub fn max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn iteration_delay(mut self, iteration_delay: Duration) -> Self {
        self.iteration_delay = Some(iteration_delay);
        self
    }

    pub fn max_tps(mut self, max_tps: NonZeroU32) -> Self {
        self.max_tps = Some(max_tps);
        self
    }

    /// Checks every config-level precondition. A failure here is fatal and
    /// happens before any request is sent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.virtual_users == 0 {
            return Err(ConfigError::ZeroVirtualUsers);
        }
        if self.duration.is_zero() {
            return Err(ConfigError::ZeroDuration);
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroRequestTimeout);
        }
        if self.scenario.is_empty() {
            return Err(ConfigError::EmptyScenario);
        }
        for spec in &self.scenario {
            spec.validate()?;
        }
        Ok(())
    }
}

/// One request step of a scenario. Immutable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RequestSpec {
    pub method: Method,
    pub url: String,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default)]
    pub body: Option<String>,
}

impl RequestSpec {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let parsed = Url::parse(&self.url).map_err(|err| ConfigError::InvalidUrl {
            url: self.url.clone(),
            reason: err.to_string(),
        })?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ConfigError::InvalidUrl {
                url: self.url.clone(),
                reason: format!("unsupported scheme `{other}`"),
            }),
        }
    }
}

/// HTTP method of a request step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Patch,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Patch => "PATCH",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "HEAD" => Ok(Method::Head),
            "PATCH" => Ok(Method::Patch),
            "OPTIONS" => Ok(Method::Options),
            other => Err(ConfigError::InvalidMethod(other.to_string())),
        }
    }
}

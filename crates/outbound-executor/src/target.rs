use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

/// A remote endpoint: hostname (or IP literal) and port.
///
/// Circuit breakers are keyed by [`Target::authority`] and resolver entries by
/// [`Target::host`], so different ports of one host share a cache entry but
/// not a circuit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    host: String,
    port: u16,
}

/// Error returned when a `host:port` string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid target '{input}': {reason}")]
pub struct TargetParseError {
    input: String,
    reason: &'static str,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`, with IPv6 literals bracketed.
    pub fn authority(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.host.parse::<IpAddr>() {
            Ok(IpAddr::V6(_)) => write!(f, "[{}]:{}", self.host, self.port),
            _ => write!(f, "{}:{}", self.host, self.port),
        }
    }
}

impl FromStr for Target {
    type Err = TargetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = |reason| TargetParseError {
            input: s.to_owned(),
            reason,
        };

        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, after) = rest.split_once(']').ok_or_else(|| fail("unclosed '['"))?;
            let port = after
                .strip_prefix(':')
                .ok_or_else(|| fail("missing port"))?;
            (host, port)
        } else {
            let (host, port) = s.rsplit_once(':').ok_or_else(|| fail("missing port"))?;
            if host.contains(':') {
                return Err(fail("IPv6 addresses must be bracketed"));
            }
            (host, port)
        };

        if host.is_empty() {
            return Err(fail("empty host"));
        }
        let port = port.parse::<u16>().map_err(|_| fail("invalid port"))?;
        Ok(Target::new(host, port))
    }
}

impl TryFrom<&str> for Target {
    type Error = TargetParseError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<(&str, u16)> for Target {
    fn from((host, port): (&str, u16)) -> Self {
        Target::new(host, port)
    }
}

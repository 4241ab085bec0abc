//! Connectivity probe for throwaway test services
//!
//! Opens a plain TCP connection to the ingest server of a test instance.
//! Nothing is sent; a successful connect is all that is checked.

use anyhow::{Context, Result, anyhow, bail};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::constants::{keys, probe};
use crate::host::ServiceInstance;

/// Host and port extracted from a server URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// Parse `rtmp://host[:port]/app`, `rtmps://...` or bare `host[:port]`
    pub fn parse(server: &str) -> Result<Self> {
        let server = server.trim();
        if server.is_empty() {
            bail!("No server configured");
        }

        let (default_port, rest) = match server.split_once("://") {
            Some((scheme, rest)) => match scheme.to_ascii_lowercase().as_str() {
                "rtmp" => (probe::RTMP_PORT, rest),
                "rtmps" => (probe::RTMPS_PORT, rest),
                other => bail!("Unsupported scheme '{}'", other),
            },
            None => (probe::RTMP_PORT, server),
        };

        let authority = rest.split('/').next().unwrap_or_default();
        if authority.is_empty() {
            bail!("Server '{}' has no host", server);
        }

        // [v6addr]:port
        if let Some(bracketed) = authority.strip_prefix('[') {
            let (host, tail) = bracketed
                .split_once(']')
                .ok_or_else(|| anyhow!("Unterminated IPv6 address in '{}'", server))?;
            let port = match tail.strip_prefix(':') {
                Some(port) => parse_port(port)?,
                None => default_port,
            };
            return Ok(Self {
                host: host.to_string(),
                port,
            });
        }

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => (host, parse_port(port)?),
            None => (authority, default_port),
        };

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

fn parse_port(value: &str) -> Result<u16> {
    value
        .parse::<u16>()
        .with_context(|| format!("Invalid port '{}'", value))
}

/// Outcome of a successful probe
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub endpoint: Endpoint,
    pub address: SocketAddr,
    pub elapsed: Duration,
}

/// Try to connect to the server of `instance` within `timeout`
///
/// Each resolved address is tried in turn; the last error is returned if
/// none accepts the connection.
pub fn probe_service(instance: &ServiceInstance, timeout: Duration) -> Result<ProbeReport> {
    let server = instance.settings.get_str(keys::SERVER).unwrap_or_default();
    let endpoint = Endpoint::parse(server)?;

    let addresses: Vec<SocketAddr> = (endpoint.host.as_str(), endpoint.port)
        .to_socket_addrs()
        .with_context(|| format!("Failed to resolve {}:{}", endpoint.host, endpoint.port))?
        .collect();

    let mut last_error = None;
    for address in addresses {
        debug!(%address, "Probing server");
        let started = Instant::now();
        match TcpStream::connect_timeout(&address, timeout) {
            Ok(_stream) => {
                let elapsed = started.elapsed();
                info!(%address, elapsed_ms = elapsed.as_millis() as u64, "Server reachable");
                return Ok(ProbeReport {
                    endpoint,
                    address,
                    elapsed,
                });
            }
            Err(e) => {
                warn!(%address, error = %e, "Connection attempt failed");
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) => Err(e)
            .with_context(|| format!("Could not reach {}:{}", endpoint.host, endpoint.port)),
        None => bail!("{}:{} resolved to no addresses", endpoint.host, endpoint.port),
    }
}

// src/config/parsing.rs

use anyhow::{anyhow, Context, Result};
use byte_unit::Byte;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

/// Parses an optional human-readable size string ("500MiB", "1G", "1024") into bytes.
pub(super) fn parse_size_limit(size_str: Option<String>) -> Result<Option<u64>> {
    size_str
        .map(|s| {
            Byte::from_str(&s)
                .map(|b| b.as_u64())
                .with_context(|| format!("Invalid size format: '{}'", s))
        })
        .transpose()
}

/// Combines a bind address and port into a `SocketAddr`.
pub(super) fn parse_bind_addr(bind: &str, port: u16) -> Result<SocketAddr> {
    let ip = IpAddr::from_str(bind.trim())
        .with_context(|| format!("Invalid bind address: '{}'", bind))?;
    Ok(SocketAddr::new(ip, port))
}

/// Normalizes allowlisted hosts to lowercase, dropping empty entries.
pub(super) fn normalize_hosts(hosts: Option<Vec<String>>) -> Option<Vec<String>> {
    hosts.map(|v| {
        v.into_iter()
            .map(|s| s.trim().trim_start_matches('.').to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

/// Validates the provider scheme used for path-addressed requests.
pub(super) fn parse_provider_scheme(scheme: &str) -> Result<String> {
    let scheme = scheme.trim().trim_end_matches("://").to_lowercase();
    match scheme.as_str() {
        "http" | "https" => Ok(scheme),
        _ => Err(anyhow!(
            "Invalid provider scheme '{}': expected 'http' or 'https'",
            scheme
        )),
    }
}

//! Downloads snapshot archives from the hosting provider.

use crate::cancellation::CancellationToken;
use crate::errors::{DownloadFailure, Error, Result};
use crate::security::check_host_allowed;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::time::{Duration, Instant};

/// Redirect hops followed before giving up, as reqwest's default policy.
const MAX_REDIRECTS: usize = 10;

/// Options for a single snapshot download.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Overall request timeout handed to the HTTP client. `None` means no timeout.
    pub timeout: Option<Duration>,
    /// Maximum accepted body size in bytes.
    pub max_size: Option<u64>,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Hosts every redirect target must belong to. `None` allows all.
    pub allowed_hosts: Option<Vec<String>>,
}

/// A redirect refused by the host allowlist.
#[derive(Debug)]
struct RedirectBlocked(String);

impl std::fmt::Display for RedirectBlocked {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "redirect to disallowed host '{}'", self.0)
    }
}

impl std::error::Error for RedirectBlocked {}

/// Downloads `url` into the file at `destination`.
///
/// The response body is streamed to disk in chunks; it is never held in memory
/// as a whole. Only `200 OK` counts as success. Redirects are followed as long
/// as every hop stays within `options.allowed_hosts`.
///
/// # Errors
/// Returns `Error::Download` for a non-success status, any transport failure,
/// a failed write, or a body exceeding `options.max_size`. Returns
/// `Error::HostNotAllowed` for a redirect leaving the allowlist and
/// `Error::Cancelled` if `token` is cancelled mid-download.
pub fn fetch(
    url: &str,
    destination: &Path,
    options: &FetchOptions,
    token: &CancellationToken,
) -> Result<()> {
    let download_error = |source: DownloadFailure| Error::Download {
        url: url.to_string(),
        source,
    };

    token.check()?;
    let client = build_reqwest_client(options).map_err(|e| download_error(e.into()))?;

    log::debug!("Downloading snapshot from: {}", url);
    let response = client
        .get(url)
        .header(USER_AGENT, options.user_agent.as_str())
        .send()
        .map_err(|e| match blocked_redirect(&e) {
            Some(host) => Error::HostNotAllowed { host },
            None => download_error(e.into()),
        })?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(download_error(DownloadFailure::Status(status)));
    }

    if let (Some(limit), Some(len)) = (options.max_size, response.content_length()) {
        if len > limit {
            return Err(download_error(DownloadFailure::TooLarge(limit)));
        }
    }

    let file = File::create(destination).map_err(|e| download_error(e.into()))?;
    let mut writer = BufWriter::new(file);
    let mut reader = GuardedReader::new(response, options.max_size, token);

    match io::copy(&mut reader, &mut writer) {
        Ok(bytes) => {
            writer.flush().map_err(|e| download_error(e.into()))?;
            log::debug!(
                "Downloaded {} bytes to {}",
                bytes,
                destination.display()
            );
            Ok(())
        }
        Err(_) if token.is_cancelled() => Err(Error::Cancelled),
        Err(_) if reader.exceeded => Err(download_error(DownloadFailure::TooLarge(
            options.max_size.unwrap_or_default(),
        ))),
        Err(e) => Err(download_error(e.into())),
    }
}

/// Builds a `reqwest` blocking client honoring the request deadline and the host allowlist.
fn build_reqwest_client(options: &FetchOptions) -> std::result::Result<Client, reqwest::Error> {
    let allowed_hosts = options.allowed_hosts.clone();
    let policy = Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        match check_host_allowed(attempt.url().as_str(), &allowed_hosts) {
            Ok(()) => attempt.follow(),
            Err(host) => attempt.error(RedirectBlocked(host)),
        }
    });

    Client::builder()
        // `None` disables reqwest's default 30s timeout as well.
        .timeout(client_timeout(options.timeout))
        .redirect(policy)
        .build()
}

/// The timeout handed to the client, dropped when no `Instant` can represent it.
///
/// The client adds the timeout to `Instant::now()` later on its own thread, so
/// a day of headroom is kept for values sitting right at the limit.
fn client_timeout(timeout: Option<Duration>) -> Option<Duration> {
    const HEADROOM: Duration = Duration::from_secs(24 * 60 * 60);
    timeout.filter(|t| Instant::now().checked_add(t.saturating_add(HEADROOM)).is_some())
}

/// The host a redirect was refused for, if that is why `error` happened.
fn blocked_redirect(error: &reqwest::Error) -> Option<String> {
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        if let Some(RedirectBlocked(host)) = cause.downcast_ref::<RedirectBlocked>() {
            return Some(host.clone());
        }
        source = cause.source();
    }
    None
}

/// A reader that stops on cancellation and enforces a byte limit.
struct GuardedReader<'a, R> {
    inner: R,
    token: &'a CancellationToken,
    limit: Option<u64>,
    read: u64,
    exceeded: bool,
}

impl<'a, R: Read> GuardedReader<'a, R> {
    fn new(inner: R, limit: Option<u64>, token: &'a CancellationToken) -> Self {
        Self {
            inner,
            token,
            limit,
            read: 0,
            exceeded: false,
        }
    }
}

impl<R: Read> Read for GuardedReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.token.is_cancelled() {
            // Not `Interrupted`: `io::copy` retries those.
            return Err(io::Error::new(io::ErrorKind::Other, "download cancelled"));
        }
        let n = self.inner.read(buf)?;
        self.read = self.read.saturating_add(n as u64);
        if let Some(limit) = self.limit {
            if self.read > limit {
                self.exceeded = true;
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    "download exceeds size limit",
                ));
            }
        }
        Ok(n)
    }
}

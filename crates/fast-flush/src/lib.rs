/*
 * vSMTP mail transfer agent
 * Copyright (C) 2022 viridIT SAS
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or any later version.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT
 * ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
 * FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * this program. If not, see https://www.gnu.org/licenses/.
 *
*/

//! Client interface to the deferred-mail flush trigger and the per-site
//! "fast flush" logfile service. The fast-flush service is only available
//! for sites a client previously asked to track (for example via an SMTP
//! `ETRN`), so most of this surface is a thin request/response RPC over a
//! local socket rather than something this crate implements end to end.
#![forbid(unsafe_code)]
#![warn(clippy::all)]

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

/// Errors raised while talking to the fast-flush service.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The local IPC connection failed or was reset.
    #[error("fast-flush connection error: {0}")]
    Io(#[from] std::io::Error),
    /// The service returned a response this client does not understand.
    #[error("fast-flush service returned an unrecognized status: {0:?}")]
    UnrecognizedStatus(String),
    /// The request did not complete within the configured IPC timeout.
    #[error("fast-flush request timed out after {0:?}")]
    Timeout(Duration),
}

/// Result alias for the fast-flush client.
pub type Result<T> = std::result::Result<T, Error>;

/// Outcome of a fast-flush request, mirroring the four result codes the
/// service itself defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
pub enum FlushStatus {
    /// The request completed normally.
    #[strum(serialize = "OK")]
    Ok,
    /// The request failed.
    #[strum(serialize = "FAIL")]
    Fail,
    /// The site has no fast-flush logfile.
    #[strum(serialize = "UNKNOWN_SITE")]
    UnknownSite,
    /// The service rejected the request parameters.
    #[strum(serialize = "BAD_REQUEST")]
    BadRequest,
}

/// A request sent to the fast-flush service, kept around mainly so stub
/// implementations have something to record for assertions in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushRequest {
    /// Trigger delivery of all deferred and incoming mail.
    Deferred,
    /// Trigger delivery of mail queued for `site`.
    Site {
        /// Destination site name.
        site: String,
    },
    /// Append `queue_id` to `site`'s fast-flush logfile.
    Append {
        /// Destination site name.
        site: String,
        /// Queue id of the message still pending delivery to that site.
        queue_id: String,
    },
}

impl fmt::Display for FlushRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deferred => write!(f, "D"),
            Self::Site { site } => write!(f, "S {site}"),
            Self::Append { site, queue_id } => write!(f, "A {site} {queue_id}"),
        }
    }
}

/// Client interface to the fast-flush service, kept trait-based so the
/// queue processor can be exercised against an in-memory stub in tests
/// without a running daemon on the other end.
#[async_trait]
pub trait FastFlush {
    /// Trigger delivery of all deferred or incoming mail.
    async fn flush_deferred(&self) -> Result<FlushStatus>;

    /// Trigger delivery of mail queued for `site`, if it has a fast-flush
    /// logfile.
    async fn flush_site(&self, site: &str) -> Result<FlushStatus>;

    /// Record that `queue_id` is still queued for `site`.
    async fn flush_append(&self, site: &str, queue_id: &str) -> Result<FlushStatus>;
}

/// In-memory stand-in for the fast-flush service, recording every request
/// it receives and always reporting success.
#[derive(Debug, Default)]
pub struct StubFastFlush {
    requests: tokio::sync::Mutex<Vec<FlushRequest>>,
}

impl StubFastFlush {
    /// Start with an empty request log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests recorded so far, in the order they arrived.
    pub async fn requests(&self) -> Vec<FlushRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl FastFlush for StubFastFlush {
    async fn flush_deferred(&self) -> Result<FlushStatus> {
        self.requests.lock().await.push(FlushRequest::Deferred);
        Ok(FlushStatus::Ok)
    }

    async fn flush_site(&self, site: &str) -> Result<FlushStatus> {
        self.requests.lock().await.push(FlushRequest::Site {
            site: site.to_owned(),
        });
        Ok(FlushStatus::Ok)
    }

    async fn flush_append(&self, site: &str, queue_id: &str) -> Result<FlushStatus> {
        self.requests.lock().await.push(FlushRequest::Append {
            site: site.to_owned(),
            queue_id: queue_id.to_owned(),
        });
        Ok(FlushStatus::Ok)
    }
}

/// Default IPC timeout, mirroring `mail_flush_clnt`'s use of
/// `var_ipc_timeout` when no caller-supplied value overrides it.
pub const DEFAULT_TIMEOUT_SECS: u64 = 3600;

/// Fast-flush client backed by a local Unix domain socket, one connection
/// per request: the service is low-traffic enough that connection reuse
/// isn't worth the complexity.
#[derive(Debug, Clone)]
pub struct UnixSocketFastFlush {
    socket_path: std::path::PathBuf,
    timeout: Duration,
}

impl UnixSocketFastFlush {
    /// Point the client at the fast-flush service's listening socket, with
    /// the default IPC timeout.
    #[must_use]
    pub fn new(socket_path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Override the IPC timeout, matching `vstream_control`'s
    /// `VSTREAM_CTL_TIMEOUT` knob on the connection this client opens.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn send(&self, request: &FlushRequest) -> Result<FlushStatus> {
        tokio::time::timeout(self.timeout, self.send_inner(request))
            .await
            .map_err(|_| Error::Timeout(self.timeout))?
    }

    async fn send_inner(&self, request: &FlushRequest) -> Result<FlushStatus> {
        let mut stream = UnixStream::connect(&self.socket_path).await?;
        let line = format!("{request}\n");
        stream.write_all(line.as_bytes()).await?;
        stream.flush().await?;

        let mut response = String::new();
        stream.read_to_string(&mut response).await?;
        let status = response.trim();

        status
            .parse::<FlushStatus>()
            .map_err(|_| Error::UnrecognizedStatus(status.to_owned()))
    }
}

#[async_trait]
impl FastFlush for UnixSocketFastFlush {
    async fn flush_deferred(&self) -> Result<FlushStatus> {
        self.send(&FlushRequest::Deferred).await
    }

    async fn flush_site(&self, site: &str) -> Result<FlushStatus> {
        self.send(&FlushRequest::Site {
            site: site.to_owned(),
        })
        .await
    }

    async fn flush_append(&self, site: &str, queue_id: &str) -> Result<FlushStatus> {
        self.send(&FlushRequest::Append {
            site: site.to_owned(),
            queue_id: queue_id.to_owned(),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_records_requests_in_order() {
        let client = StubFastFlush::new();
        client.flush_deferred().await.unwrap();
        client.flush_site("mail.example.com").await.unwrap();
        client
            .flush_append("mail.example.com", "A1B2C3D4")
            .await
            .unwrap();

        let requests = client.requests().await;
        assert_eq!(
            requests,
            vec![
                FlushRequest::Deferred,
                FlushRequest::Site {
                    site: "mail.example.com".to_owned()
                },
                FlushRequest::Append {
                    site: "mail.example.com".to_owned(),
                    queue_id: "A1B2C3D4".to_owned()
                },
            ]
        );
    }

    #[test]
    fn request_display_matches_wire_form() {
        assert_eq!(FlushRequest::Deferred.to_string(), "D");
        assert_eq!(
            FlushRequest::Site {
                site: "example.com".to_owned()
            }
            .to_string(),
            "S example.com"
        );
        assert_eq!(
            FlushRequest::Append {
                site: "example.com".to_owned(),
                queue_id: "Q1".to_owned()
            }
            .to_string(),
            "A example.com Q1"
        );
    }

    #[test]
    fn status_round_trips_through_display_and_parse() {
        for status in [
            FlushStatus::Ok,
            FlushStatus::Fail,
            FlushStatus::UnknownSite,
            FlushStatus::BadRequest,
        ] {
            let rendered = status.to_string();
            assert_eq!(rendered.parse::<FlushStatus>().unwrap(), status);
        }
    }

    #[tokio::test]
    async fn timeout_elapses_when_service_is_unresponsive() {
        static COUNTER: std::sync::atomic::AtomicU32 = std::sync::atomic::AtomicU32::new(0);
        let id = COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let socket_path =
            std::env::temp_dir().join(format!("fast-flush-test-{}-{id}.sock", std::process::id()));
        let _ = std::fs::remove_file(&socket_path);
        let listener = tokio::net::UnixListener::bind(&socket_path).unwrap();

        let _server = tokio::spawn(async move {
            let (_stream, _addr) = listener.accept().await.unwrap();
            // Never responds, forcing the client to time out.
            std::future::pending::<()>().await
        });

        let client =
            UnixSocketFastFlush::new(&socket_path).with_timeout(Duration::from_millis(50));
        let result = client.flush_deferred().await;

        let _ = std::fs::remove_file(&socket_path);
        assert!(matches!(result, Err(Error::Timeout(_))));
    }
}

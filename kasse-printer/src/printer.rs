//! Print transports
//!
//! Supports:
//! - HTTP print relay (`POST {base}/print`, `GET {base}/health`)
//! - Network printers (raw ESC/POS over TCP, port 9100)

use crate::error::{PrintError, PrintResult};
use crate::escpos::EscPosBuilder;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, info, instrument, warn};

/// Trait for printer adapters
///
/// `text` is expected to be sanitized already. `cut` asks the transport to
/// cut the paper after the text.
#[allow(async_fn_in_trait)]
pub trait Printer {
    async fn print(&self, text: &str, cut: bool) -> PrintResult<()>;

    /// Check if the printer is online/reachable
    async fn is_online(&self) -> bool;
}

// ============================================================================
// HTTP relay
// ============================================================================

const RELAY_TIMEOUT: Duration = Duration::from_secs(5);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Serialize)]
struct RelayPrintRequest<'a> {
    printer: &'a str,
    text: &'a str,
    cut: bool,
}

/// Body of `GET {base}/health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayHealth {
    pub status: String,
}

impl RelayHealth {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Client for the HTTP print relay
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct RelayClient {
    base_url: String,
    http: reqwest::Client,
}

impl RelayClient {
    pub fn new(base_url: &str) -> PrintResult<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(PrintError::InvalidConfig(format!(
                "Relay URL must start with http:// or https://: {base_url}"
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(RELAY_TIMEOUT)
            .build()
            .map_err(|e| PrintError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Bind the client to one relay queue
    pub fn printer(&self, queue: impl Into<String>) -> RelayPrinter {
        RelayPrinter {
            client: self.clone(),
            queue: queue.into(),
        }
    }

    #[instrument(skip(self, text), fields(queue = %queue, text_len = text.len()))]
    pub async fn print(&self, queue: &str, text: &str, cut: bool) -> PrintResult<()> {
        let url = format!("{}/print", self.base_url);
        let body = RelayPrintRequest {
            printer: queue,
            text,
            cut,
        };
        let resp = self.http.post(&url).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Relay rejected print job");
            return Err(PrintError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        debug!("Print job accepted by relay");
        Ok(())
    }

    /// `GET {base}/health`; healthy only if it answers `{"status":"ok"}`
    #[instrument(skip(self), fields(base = %self.base_url))]
    pub async fn health(&self) -> PrintResult<RelayHealth> {
        let url = format!("{}/health", self.base_url);
        let resp = self
            .http
            .get(&url)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(PrintError::Offline(format!(
                "health check returned {}",
                resp.status()
            )));
        }
        let health: RelayHealth = resp.json().await?;
        if !health.is_ok() {
            return Err(PrintError::Offline(format!(
                "relay status is {:?}",
                health.status
            )));
        }
        Ok(health)
    }
}

/// One queue on the print relay
#[derive(Debug, Clone)]
pub struct RelayPrinter {
    client: RelayClient,
    queue: String,
}

impl RelayPrinter {
    pub fn queue(&self) -> &str {
        &self.queue
    }
}

impl Printer for RelayPrinter {
    async fn print(&self, text: &str, cut: bool) -> PrintResult<()> {
        self.client.print(&self.queue, text, cut).await
    }

    async fn is_online(&self) -> bool {
        self.client.health().await.is_ok()
    }
}

// ============================================================================
// Raw TCP
// ============================================================================

/// Network printer (TCP port 9100)
///
/// Most thermal printers support raw TCP printing on port 9100.
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    host: String,
    port: u16,
    timeout: Duration,
    double_width: bool,
}

impl NetworkPrinter {
    pub fn new(host: &str, port: u16) -> PrintResult<Self> {
        let host = host.trim();
        if host.is_empty() {
            return Err(PrintError::InvalidConfig("Printer host is empty".into()));
        }
        if port == 0 {
            return Err(PrintError::InvalidConfig(format!(
                "Invalid port for {host}: 0"
            )));
        }
        Ok(Self {
            host: host.to_string(),
            port,
            timeout: Duration::from_secs(5),
            double_width: false,
        })
    }

    /// Set connection timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Switch the printer to double-width glyphs before the text
    pub fn with_double_width(mut self, double_width: bool) -> Self {
        self.double_width = double_width;
        self
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    async fn connect(&self, timeout: Duration) -> PrintResult<TcpStream> {
        tokio::time::timeout(timeout, TcpStream::connect((self.host.as_str(), self.port)))
            .await
            .map_err(|_| PrintError::Timeout(format!("Connection timeout: {}", self.addr())))?
            .map_err(|e| PrintError::Connection(format!("{}: {}", self.addr(), e)))
    }
}

impl Printer for NetworkPrinter {
    #[instrument(skip(self, text), fields(addr = %self.addr(), text_len = text.len()))]
    async fn print(&self, text: &str, cut: bool) -> PrintResult<()> {
        let mut builder = EscPosBuilder::new();
        if self.double_width {
            builder.double_width();
        }
        builder.text(text);
        if cut {
            builder.cut();
        }
        let data = builder.build();

        let mut stream = self.connect(self.timeout).await?;
        info!(bytes = data.len(), "Connected, sending print data");

        stream.write_all(&data).await?;
        stream.flush().await?;

        info!("Print job sent successfully");
        Ok(())
    }

    #[instrument(skip(self), fields(addr = %self.addr()))]
    async fn is_online(&self) -> bool {
        match self.connect(Duration::from_millis(500)).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Printer offline");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_relay_url_validation() {
        assert!(RelayClient::new("ftp://relay").is_err());
        let client = RelayClient::new("http://127.0.0.1:3001/").unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:3001");
        assert_eq!(client.printer("bar").queue(), "bar");
    }

    #[test]
    fn test_relay_request_body() {
        let body = RelayPrintRequest {
            printer: "kitchen",
            text: "1x Bratwurst\n",
            cut: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"printer": "kitchen", "text": "1x Bratwurst\n", "cut": true})
        );
    }

    #[test]
    fn test_health_body() {
        let ok: RelayHealth = serde_json::from_str(r#"{"status":"ok"}"#).unwrap();
        assert!(ok.is_ok());
        let bad: RelayHealth = serde_json::from_str(r#"{"status":"degraded"}"#).unwrap();
        assert!(!bad.is_ok());
    }

    #[test]
    fn test_network_printer_new() {
        assert!(NetworkPrinter::new("", 9100).is_err());
        assert!(NetworkPrinter::new("192.168.1.100", 0).is_err());
        let p = NetworkPrinter::new("192.168.1.100", 9100).unwrap();
        assert_eq!(p.addr(), "192.168.1.100:9100");
    }

    #[tokio::test]
    async fn test_network_printer_sends_escpos_frame() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            socket.read_to_end(&mut buf).await.unwrap();
            buf
        });

        let printer = NetworkPrinter::new("127.0.0.1", port).unwrap();
        printer.print("Test\n", true).await.unwrap();

        let received = server.await.unwrap();
        assert!(received.starts_with(crate::escpos::INIT));
        assert!(received.ends_with(crate::escpos::CUT));
        assert!(!received.windows(3).any(|w| w == crate::escpos::DOUBLE_WIDTH));
    }

    #[tokio::test]
    async fn test_network_printer_double_width() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            socket.read_to_end(&mut buf).await.unwrap();
            buf
        });

        let printer = NetworkPrinter::new("127.0.0.1", port)
            .unwrap()
            .with_double_width(true);
        printer.print("Test\n", false).await.unwrap();

        let received = server.await.unwrap();
        let mut expected = crate::escpos::INIT.to_vec();
        expected.extend_from_slice(crate::escpos::DOUBLE_WIDTH);
        expected.extend_from_slice(b"Test\n");
        assert_eq!(received, expected);
    }

    #[tokio::test]
    async fn test_network_printer_online_check() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let printer = NetworkPrinter::new("127.0.0.1", port).unwrap();
        assert!(printer.is_online().await);

        drop(listener);
        assert!(!printer.is_online().await);
    }

    #[tokio::test]
    async fn test_relay_unreachable_is_error() {
        // nothing listens on port 9 locally
        let client = RelayClient::new("http://127.0.0.1:9").unwrap();
        assert!(client.health().await.is_err());
        assert!(!client.printer("bar").is_online().await);
    }
}

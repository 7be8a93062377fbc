//! # Network Printer Transport
//!
//! Many receipt printers also listen on a raw TCP port (commonly 9100) and
//! accept the same ESC/POS byte stream that would go over BLE. No chunking
//! or pacing is needed; TCP flow control does the job.
//!
//! ```no_run
//! use sudsy::transport::TcpPrinter;
//! use sudsy::protocol::commands;
//!
//! # async fn demo() -> sudsy::error::Result<()> {
//! let printer = TcpPrinter::new("192.168.1.50");
//! printer.send(&commands::init()).await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use log::{debug, info};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::{Result, SudsyError};

/// Raw printing port used by most network printers.
pub const DEFAULT_PORT: u16 = 9100;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A printer reachable at `host:port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpPrinter {
    host: String,
    port: u16,
}

impl TcpPrinter {
    /// Printer at `host` on the default port. A `host:port` string overrides
    /// the port.
    pub fn new(host: impl Into<String>) -> Self {
        let host = host.into();
        match host.rsplit_once(':') {
            Some((name, port)) if !name.contains(':') => match port.parse() {
                Ok(port) => Self {
                    host: name.to_string(),
                    port,
                },
                Err(_) => Self {
                    host,
                    port: DEFAULT_PORT,
                },
            },
            _ => Self {
                host,
                port: DEFAULT_PORT,
            },
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Open a connection, write the whole job and close.
    pub async fn send(&self, data: &[u8]) -> Result<()> {
        let address = self.address();
        info!("Connecting to network printer {}", address);

        let mut stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(&address))
            .await
            .map_err(|_| SudsyError::Link(format!("Timed out connecting to {}", address)))??;

        stream.write_all(data).await?;
        stream.flush().await?;
        stream.shutdown().await?;

        debug!("Sent {} bytes to {}", data.len(), address);
        Ok(())
    }
}

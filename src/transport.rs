use crate::constants::*;
use parking_lot::Mutex;
use serialport::{DataBits, Parity, SerialPort, StopBits};
use std::io::{Read, Write};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },
    #[error("serial error: {0}")]
    Serial(#[from] serialport::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("transport task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Byte-stream device the controller talks to. The controller never opens or
/// closes it; that is left to whoever constructs the implementation.
#[allow(async_fn_in_trait)]
pub trait BusTransport {
    /// Write all of `bytes` as one operation.
    async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Number of bytes buffered and readable without blocking.
    async fn bytes_available(&mut self) -> Result<usize, TransportError>;

    /// Read whatever is currently buffered. Never waits for more.
    async fn read_available(&mut self) -> Result<Vec<u8>, TransportError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    pub port: String,
    pub baud: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            port: DEFAULT_PORT.to_string(),
            baud: DEFAULT_BAUD,
        }
    }
}

pub struct SerialTransport {
    port: Arc<Mutex<Box<dyn SerialPort>>>,
    name: String,
}

impl SerialTransport {
    pub async fn open(config: &SerialConfig) -> Result<Self, TransportError> {
        let name = config.port.clone();
        let baud = config.baud;

        let port = {
            let name = name.clone();
            tokio::task::spawn_blocking(move || {
                serialport::new(&name, baud)
                    .data_bits(DataBits::Eight)
                    .parity(Parity::None)
                    .stop_bits(StopBits::One)
                    .timeout(SERIAL_TIMEOUT)
                    .open()
                    .map_err(|source| TransportError::Open { port: name, source })
            })
            .await??
        };

        info!(port = %name, baud, "serial port open");
        tokio::time::sleep(PORT_STABILIZE_DELAY).await;

        Ok(SerialTransport {
            port: Arc::new(Mutex::new(port)),
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn close(self) {
        drop(self.port);
        info!(port = %self.name, "serial port closed");
    }
}

impl BusTransport for SerialTransport {
    async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let port = Arc::clone(&self.port);
        let data = bytes.to_vec();

        // The blocking task runs to completion even if the caller is dropped,
        // so a frame is never cut short on the wire.
        tokio::task::spawn_blocking(move || -> Result<(), TransportError> {
            let mut port = port.lock();
            port.write_all(&data)?;
            port.flush()?;
            Ok(())
        })
        .await??;

        debug!(len = bytes.len(), "wrote to serial port");
        Ok(())
    }

    async fn bytes_available(&mut self) -> Result<usize, TransportError> {
        let port = Arc::clone(&self.port);
        let count = tokio::task::spawn_blocking(move || {
            let port = port.lock();
            port.bytes_to_read()
        })
        .await??;
        Ok(count as usize)
    }

    async fn read_available(&mut self) -> Result<Vec<u8>, TransportError> {
        let port = Arc::clone(&self.port);
        tokio::task::spawn_blocking(move || -> Result<Vec<u8>, TransportError> {
            let mut port = port.lock();
            let pending = port.bytes_to_read()? as usize;
            if pending == 0 {
                return Ok(Vec::new());
            }
            let mut buf = vec![0u8; pending];
            let n = port.read(&mut buf)?;
            buf.truncate(n);
            Ok(buf)
        })
        .await?
    }
}

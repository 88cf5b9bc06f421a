//! Pipe process transport: the driver runs as a child process.
//!
//! The consumer spawns the driver binary, sends one command per line on the
//! child's stdin, and reads replies from its stdout. JSON and text replies
//! arrive as newline-terminated lines; binary replies arrive as a u32
//! little-endian length prefix followed by the payload. There is no shared
//! memory across the process boundary; the byte streams are the only
//! synchronization.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::codec::{self, WireFormat};
use crate::record::{DriverResult, BINARY_FRAME_LEN};

use super::{DriverTransport, TransportError, TransportMode, TransportResult};

/// How long to wait for the child to exit after the terminate command.
const EXIT_WAIT: Duration = Duration::from_secs(5);

/// Drives one driver child process over its stdio streams.
pub struct PipeTransport {
    driver_bin: PathBuf,
    format: WireFormat,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<BufReader<ChildStdout>>,
}

impl PipeTransport {
    pub fn new(driver_bin: PathBuf, format: WireFormat) -> Self {
        Self {
            driver_bin,
            format,
            child: None,
            stdin: None,
            stdout: None,
        }
    }

    /// The wire format this transport requests on every read.
    pub fn format(&self) -> WireFormat {
        self.format
    }

    async fn send_line(&mut self, line: &str) -> TransportResult<()> {
        let stdin = self.stdin.as_mut().ok_or(TransportError::NotConnected)?;
        stdin.write_all(line.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }

    async fn read_frame(&mut self) -> TransportResult<Vec<u8>> {
        let stdout = self.stdout.as_mut().ok_or(TransportError::NotConnected)?;
        match self.format {
            WireFormat::Binary => {
                let mut len_bytes = [0u8; 4];
                stdout.read_exact(&mut len_bytes).await?;
                let len = u32::from_le_bytes(len_bytes) as usize;
                if len != BINARY_FRAME_LEN {
                    return Err(TransportError::Decode(codec::CodecError::TruncatedFrame {
                        expected: BINARY_FRAME_LEN,
                        got: len,
                    }));
                }
                let mut payload = vec![0u8; len];
                stdout.read_exact(&mut payload).await?;
                Ok(payload)
            }
            WireFormat::Json | WireFormat::Text => {
                let mut line = String::new();
                let n = stdout.read_line(&mut line).await?;
                if n == 0 {
                    return Err(TransportError::StreamIo(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "driver closed stdout",
                    )));
                }
                Ok(line.trim_end().as_bytes().to_vec())
            }
        }
    }
}

#[async_trait]
impl DriverTransport for PipeTransport {
    async fn connect(&mut self, interval: Duration) -> TransportResult<()> {
        let mut child = Command::new(&self.driver_bin)
            .arg("--cmd")
            .arg("--interval-ms")
            .arg(interval.as_millis().to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(TransportError::ProcessSpawn)?;

        self.stdin = child.stdin.take();
        self.stdout = child.stdout.take().map(BufReader::new);
        if self.stdin.is_none() || self.stdout.is_none() {
            return Err(TransportError::NotConnected);
        }
        tracing::info!(
            driver = %self.driver_bin.display(),
            format = %self.format,
            "driver process spawned"
        );
        self.child = Some(child);
        Ok(())
    }

    async fn run(&mut self) -> TransportResult<()> {
        self.send_line("run").await
    }

    async fn read(&mut self) -> TransportResult<DriverResult> {
        let command = format!("r {}", self.format);
        self.send_line(&command).await?;
        let frame = self.read_frame().await?;
        Ok(codec::decode(&frame, self.format)?)
    }

    async fn disconnect(&mut self) -> TransportResult<()> {
        // Any unrecognized command terminates the child's loop; closing
        // stdin afterwards covers a child that never read the line.
        if self.stdin.is_some() {
            let _ = self.send_line("exit").await;
        }
        self.stdin = None;
        self.stdout = None;

        if let Some(mut child) = self.child.take() {
            match tokio::time::timeout(EXIT_WAIT, child.wait()).await {
                Ok(status) => {
                    let status = status?;
                    tracing::info!(%status, "driver process exited");
                }
                Err(_) => {
                    tracing::warn!("driver process did not exit in time, killing");
                    let _ = child.kill().await;
                }
            }
        }
        Ok(())
    }

    fn mode(&self) -> TransportMode {
        TransportMode::PipeProcess
    }
}

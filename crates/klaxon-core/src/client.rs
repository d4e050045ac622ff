//! Async client for communicating with the browser bridge.
//!
//! This module provides [`BridgeClient`], a low-level transport layer that
//! sends [`Request`]s and receives [`Response`]s over a TCP stream using the
//! binary protocol defined in [`crate::protocol`].
//!
//! # Example
//!
//! ```no_run
//! use std::net::SocketAddr;
//! use klaxon_core::client::BridgeClient;
//! use klaxon_core::protocol::Request;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let addr: SocketAddr = "127.0.0.1:4444".parse()?;
//! let mut client = BridgeClient::new(addr);
//!
//! client.connect().await?;
//! client.heartbeat().await?;
//! client.disconnect();
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use tracing::{debug, debug_span, trace, Instrument};

use crate::protocol::{
    decode_response, encode_request, read_frame_length, ErrorCode, ProtocolError, Request,
    Response,
};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Timeout for establishing a TCP connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for reading a response frame from the bridge.
const READ_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur during bridge communication.
#[derive(Error, Debug)]
pub enum BridgeClientError {
    /// Attempted to send a request without an active connection.
    #[error("not connected to bridge")]
    NotConnected,

    /// Failed to establish a TCP connection.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// An I/O error occurred on the stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The response could not be decoded according to the protocol.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The remote bridge returned an error response.
    #[error("bridge error: {message}")]
    BridgeError {
        /// Machine-readable failure category.
        code: ErrorCode,
        /// Human-readable message.
        message: String,
        /// Extra context for some codes (dialog text for unexpected-dialog).
        detail: Option<String>,
    },

    /// A read or connect operation exceeded its timeout.
    #[error("operation timed out")]
    Timeout,
}

// ---------------------------------------------------------------------------
// BridgeClient
// ---------------------------------------------------------------------------

/// Async client for the browser bridge.
///
/// Manages a single connection and provides methods for sending protocol
/// requests and receiving responses. The connection is established via
/// [`connect`](Self::connect).
pub struct BridgeClient {
    stream: Option<TcpStream>,
    addr: SocketAddr,
}

impl BridgeClient {
    /// Create a new client targeting the given address.
    ///
    /// No connection is established until [`connect`](Self::connect) is called.
    pub fn new(addr: SocketAddr) -> Self {
        Self { stream: None, addr }
    }

    /// Establish a TCP connection to the bridge with a 5-second timeout.
    pub async fn connect(&mut self) -> Result<(), BridgeClientError> {
        let addr = self.addr;
        debug!(%addr, "connecting to bridge");

        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| BridgeClientError::Timeout)?
            .map_err(|e| BridgeClientError::ConnectionFailed(e.to_string()))?;

        self.stream = Some(stream);
        debug!("connected to bridge");
        Ok(())
    }

    /// Close the connection, if one is active.
    pub fn disconnect(&mut self) {
        self.stream.take();
    }

    /// Returns `true` if the client currently holds an open connection.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Send a request to the bridge and wait for the response.
    ///
    /// If the bridge returns a [`Response::Error`], this method converts it
    /// into a [`BridgeClientError::BridgeError`] carrying the error code and
    /// detail, so callers can treat all failures uniformly via the error type.
    pub async fn send(&mut self, request: &Request) -> Result<Response, BridgeClientError> {
        self.send_with_timeout(request, READ_TIMEOUT).await
    }

    /// Like [`send`](Self::send), but with a caller-supplied read timeout.
    ///
    /// Used for operations the bridge handles with its own internal retry
    /// window, where the host side should wait longer than the default.
    pub async fn send_with_timeout(
        &mut self,
        request: &Request,
        read_timeout: Duration,
    ) -> Result<Response, BridgeClientError> {
        let opcode = request.opcode_name();
        let span = debug_span!("bridge_send", opcode);
        async {
            let frame = encode_request(request);
            self.write_frame(&frame).await?;

            let payload = self.read_frame(read_timeout).await?;
            let response = decode_response(&payload)?;

            match response {
                Response::Error {
                    code,
                    message,
                    detail,
                } => Err(BridgeClientError::BridgeError {
                    code,
                    message,
                    detail,
                }),
                other => Ok(other),
            }
        }
        .instrument(span)
        .await
    }

    /// Convenience method to send a heartbeat and verify the bridge is alive.
    pub async fn heartbeat(&mut self) -> Result<(), BridgeClientError> {
        self.send(&Request::Heartbeat).await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internal frame I/O
    // -----------------------------------------------------------------------

    /// Write a complete frame (header + payload) to the stream.
    ///
    /// The `data` parameter should already include the 4-byte length header
    /// (as produced by [`encode_request`]).
    async fn write_frame(&mut self, data: &[u8]) -> Result<(), BridgeClientError> {
        let stream = self.stream.as_mut().ok_or(BridgeClientError::NotConnected)?;
        trace!(frame_bytes = data.len(), "writing frame");
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Read a complete response frame from the stream.
    ///
    /// Reads the 4-byte length header, then reads exactly that many bytes of
    /// payload. Returns the payload bytes (opcode + data, without the header).
    async fn read_frame(&mut self, read_timeout: Duration) -> Result<Vec<u8>, BridgeClientError> {
        let stream = self.stream.as_mut().ok_or(BridgeClientError::NotConnected)?;

        let result = timeout(read_timeout, async {
            // Read the 4-byte length header.
            let mut header = [0u8; 4];
            stream.read_exact(&mut header).await?;
            let len = read_frame_length(&header) as usize;

            // Read the payload.
            let mut payload = vec![0u8; len];
            trace!(payload_bytes = len, "reading frame");
            stream.read_exact(&mut payload).await?;

            Ok::<Vec<u8>, std::io::Error>(payload)
        })
        .await;

        match result {
            Ok(Ok(payload)) => Ok(payload),
            Ok(Err(io_err)) => {
                // I/O error — stream is likely broken, drop it to prevent reuse.
                self.stream.take();
                Err(BridgeClientError::Io(io_err))
            }
            Err(_) => {
                // Timeout — the bridge may still send a response later, leaving
                // stale bytes in the TCP buffer. Drop the stream so the next
                // caller gets NotConnected instead of reading a mismatched
                // response from a previous request.
                self.stream.take();
                Err(BridgeClientError::Timeout)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Binary wire protocol for communication between the Rust host and the
//! browser bridge.
//!
//! This module defines the binary protocol used over TCP for communication
//! with the bridge process that remote-controls a browser.
//!
//! # Packet Structure (Little Endian)
//!
//! ```text
//! [Header: 4 bytes LE u32 len] [OpCode: 1 byte] [Payload: variable]
//! ```
//!
//! The `len` field encodes the total length of the opcode + payload (NOT
//! including the 4-byte header itself).
//!
//! # String Encoding
//!
//! Strings are length-prefixed: a `u32` LE byte count followed by UTF-8 bytes.
//!
//! # Optional Values
//!
//! Optional fields use a `u8` presence flag (`0` = None, `1` = Some) followed
//! by the value when present.
//!
//! # Errors
//!
//! Bridge errors carry a one-byte [`ErrorCode`] plus a message and an optional
//! detail string. The detail is how an unexpected-dialog error transports the
//! open dialog's text back to the host.
//!
//! # Example
//!
//! ```
//! use klaxon_core::protocol::{Request, Response, encode_request, decode_request};
//!
//! let req = Request::Navigate { url: "http://localhost:8000/alerts".into() };
//! let wire = encode_request(&req);
//!
//! // Skip the 4-byte length header to decode
//! let decoded = decode_request(&wire[4..]).unwrap();
//! ```

use thiserror::Error;

use crate::dialog::DialogKind;
use crate::element::Locator;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during protocol encoding or decoding.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    /// The opcode byte does not correspond to any known operation.
    #[error("invalid opcode: 0x{0:02X}")]
    InvalidOpCode(u8),

    /// The buffer does not contain enough bytes for the expected data.
    #[error("insufficient data in buffer")]
    InsufficientData,

    /// A string field contains invalid UTF-8.
    #[error("invalid UTF-8 in string field")]
    Utf8Error,

    /// The payload structure is invalid for the given opcode.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

// ---------------------------------------------------------------------------
// OpCode
// ---------------------------------------------------------------------------

/// On-the-wire operation codes.
///
/// Each request or response starts with a single-byte opcode that identifies
/// the message type and determines how the remaining payload is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    /// Keep-alive ping (no payload).
    Heartbeat = 0x01,
    /// Load a URL in the browsing context (length-prefixed string).
    Navigate = 0x02,
    /// Find a single element (strategy byte + length-prefixed string).
    FindElement = 0x03,
    /// Click an element by its bridge-assigned id (length-prefixed string).
    Click = 0x04,
    /// Read an element's visible text (length-prefixed string id).
    ElementText = 0x05,
    /// Switch the browsing context into a frame element (length-prefixed string id).
    SwitchFrame = 0x06,
    /// Switch the browsing context back to the top-level document (no payload).
    SwitchDefaultContent = 0x07,
    /// Query whether a native dialog is open (no payload).
    DialogState = 0x08,
    /// Accept the open dialog (no payload).
    DialogAccept = 0x09,
    /// Dismiss the open dialog (no payload).
    DialogDismiss = 0x0A,
    /// Type text into the open prompt (length-prefixed string).
    DialogSendKeys = 0x0B,
    /// Read the page title (no payload).
    PageTitle = 0x10,
    /// Read the current URL (no payload).
    CurrentUrl = 0x11,
    /// Evaluate a JavaScript snippet in the page (length-prefixed string).
    ExecuteScript = 0x12,
    /// Read browser name and version (no payload).
    BrowserInfo = 0x13,
    /// Error message from the bridge (code byte + strings).
    Error = 0x99,
    /// Generic response (response-type byte + variable data).
    Response = 0xA0,
}

impl OpCode {
    /// Try to convert a raw byte into an `OpCode`.
    pub fn from_u8(byte: u8) -> Result<Self, ProtocolError> {
        match byte {
            0x01 => Ok(OpCode::Heartbeat),
            0x02 => Ok(OpCode::Navigate),
            0x03 => Ok(OpCode::FindElement),
            0x04 => Ok(OpCode::Click),
            0x05 => Ok(OpCode::ElementText),
            0x06 => Ok(OpCode::SwitchFrame),
            0x07 => Ok(OpCode::SwitchDefaultContent),
            0x08 => Ok(OpCode::DialogState),
            0x09 => Ok(OpCode::DialogAccept),
            0x0A => Ok(OpCode::DialogDismiss),
            0x0B => Ok(OpCode::DialogSendKeys),
            0x10 => Ok(OpCode::PageTitle),
            0x11 => Ok(OpCode::CurrentUrl),
            0x12 => Ok(OpCode::ExecuteScript),
            0x13 => Ok(OpCode::BrowserInfo),
            0x99 => Ok(OpCode::Error),
            0xA0 => Ok(OpCode::Response),
            other => Err(ProtocolError::InvalidOpCode(other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Error codes
// ---------------------------------------------------------------------------

/// Machine-readable failure categories attached to bridge error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorCode {
    /// Anything without a more specific category.
    Unknown = 0x00,
    /// No element matched the locator.
    NoSuchElement = 0x01,
    /// A dialog operation was attempted with no dialog open.
    NoDialogOpen = 0x02,
    /// A page operation was blocked by an open dialog.
    ///
    /// The error detail carries the dialog's text.
    UnexpectedDialogOpen = 0x03,
    /// A script evaluation threw.
    JavascriptError = 0x04,
    /// The operation is invalid for the current dialog kind
    /// (e.g. sending keys to a plain alert).
    InvalidDialogState = 0x05,
}

impl ErrorCode {
    /// Try to convert a raw byte into an `ErrorCode`.
    pub fn from_u8(byte: u8) -> Result<Self, ProtocolError> {
        match byte {
            0x00 => Ok(ErrorCode::Unknown),
            0x01 => Ok(ErrorCode::NoSuchElement),
            0x02 => Ok(ErrorCode::NoDialogOpen),
            0x03 => Ok(ErrorCode::UnexpectedDialogOpen),
            0x04 => Ok(ErrorCode::JavascriptError),
            0x05 => Ok(ErrorCode::InvalidDialogState),
            other => Err(ProtocolError::InvalidPayload(format!(
                "unknown error code: 0x{other:02X}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Request / Response enums
// ---------------------------------------------------------------------------

/// A high-level typed request from the Rust host to the browser bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Keep-alive heartbeat.
    Heartbeat,
    /// Load a URL in the current top-level browsing context.
    Navigate { url: String },
    /// Find a single element matching the locator.
    FindElement { locator: Locator },
    /// Click an element by its bridge-assigned id.
    Click { element_id: String },
    /// Read an element's visible text.
    ElementText { element_id: String },
    /// Switch the browsing context into a frame element.
    SwitchFrame { element_id: String },
    /// Switch the browsing context back to the top-level document.
    SwitchDefaultContent,
    /// Query the current dialog state.
    DialogState,
    /// Accept the open dialog.
    DialogAccept,
    /// Dismiss the open dialog.
    DialogDismiss,
    /// Type text into the open prompt.
    DialogSendKeys { text: String },
    /// Read the page title.
    PageTitle,
    /// Read the current URL.
    CurrentUrl,
    /// Evaluate a JavaScript snippet in the page.
    ExecuteScript { script: String },
    /// Read browser name and version.
    BrowserInfo,
}

impl Request {
    /// Returns a short, static name for this request type suitable for use in
    /// tracing span metadata. Avoids Debug-formatting large enum payloads.
    pub fn opcode_name(&self) -> &'static str {
        match self {
            Request::Heartbeat => "heartbeat",
            Request::Navigate { .. } => "navigate",
            Request::FindElement { .. } => "find_element",
            Request::Click { .. } => "click",
            Request::ElementText { .. } => "element_text",
            Request::SwitchFrame { .. } => "switch_frame",
            Request::SwitchDefaultContent => "switch_default_content",
            Request::DialogState => "dialog_state",
            Request::DialogAccept => "dialog_accept",
            Request::DialogDismiss => "dialog_dismiss",
            Request::DialogSendKeys { .. } => "dialog_send_keys",
            Request::PageTitle => "page_title",
            Request::CurrentUrl => "current_url",
            Request::ExecuteScript { .. } => "execute_script",
            Request::BrowserInfo => "browser_info",
        }
    }
}

/// Response sub-type byte used inside the `Response` opcode payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum ResponseType {
    Ok = 0x00,
    Error = 0x01,
    Text = 0x02,
    Value = 0x03,
    Json = 0x04,
    Dialog = 0x05,
}

impl ResponseType {
    fn from_u8(byte: u8) -> Result<Self, ProtocolError> {
        match byte {
            0x00 => Ok(ResponseType::Ok),
            0x01 => Ok(ResponseType::Error),
            0x02 => Ok(ResponseType::Text),
            0x03 => Ok(ResponseType::Value),
            0x04 => Ok(ResponseType::Json),
            0x05 => Ok(ResponseType::Dialog),
            other => Err(ProtocolError::InvalidPayload(format!(
                "unknown response type: 0x{other:02X}"
            ))),
        }
    }
}

/// A typed response from the browser bridge to the Rust host.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// The operation completed successfully with no additional data.
    Ok,
    /// The operation failed.
    Error {
        code: ErrorCode,
        message: String,
        /// Extra context for some codes; carries the dialog text for
        /// [`ErrorCode::UnexpectedDialogOpen`].
        detail: Option<String>,
    },
    /// A plain text payload (title, URL, element text).
    Text { value: String },
    /// A script evaluation result. `None` encodes JavaScript `null`.
    Value { value: Option<String> },
    /// A JSON-encoded payload (element result, browser info).
    Json { json: String },
    /// The current dialog state.
    Dialog {
        /// Whether a dialog is currently open.
        open: bool,
        /// The dialog kind; present only when open.
        kind: Option<DialogKind>,
        /// The dialog's message text; present only when open.
        text: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Low-level payload helpers
// ---------------------------------------------------------------------------

/// Write a length-prefixed UTF-8 string into `buf`.
///
/// Format: `[u32 LE byte_count] [UTF-8 bytes]`
fn write_string(buf: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(bytes);
}

/// Write an optional string into `buf`.
///
/// Format: `[u8 flag]` where flag=0 means None, flag=1 means Some followed by
/// a length-prefixed string.
fn write_optional_string(buf: &mut Vec<u8>, opt: &Option<String>) {
    match opt {
        None => buf.push(0u8),
        Some(s) => {
            buf.push(1u8);
            write_string(buf, s);
        }
    }
}

/// Write a bool as a single `u8` (0 = false, 1 = true).
fn write_bool(buf: &mut Vec<u8>, v: bool) {
    buf.push(if v { 1u8 } else { 0u8 });
}

/// A cursor over a byte slice for sequential reads.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn read_u8(&mut self) -> Result<u8, ProtocolError> {
        if self.remaining() < 1 {
            return Err(ProtocolError::InsufficientData);
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Ok(v)
    }

    fn read_u32(&mut self) -> Result<u32, ProtocolError> {
        if self.remaining() < 4 {
            return Err(ProtocolError::InsufficientData);
        }
        let bytes: [u8; 4] = self.data[self.pos..self.pos + 4]
            .try_into()
            .map_err(|_| ProtocolError::InsufficientData)?;
        self.pos += 4;
        Ok(u32::from_le_bytes(bytes))
    }

    fn read_bool(&mut self) -> Result<bool, ProtocolError> {
        Ok(self.read_u8()? != 0)
    }

    /// Read a length-prefixed UTF-8 string.
    fn read_string(&mut self) -> Result<String, ProtocolError> {
        let len = self.read_u32()? as usize;
        if self.remaining() < len {
            return Err(ProtocolError::InsufficientData);
        }
        let s = std::str::from_utf8(&self.data[self.pos..self.pos + len])
            .map_err(|_| ProtocolError::Utf8Error)?;
        self.pos += len;
        Ok(s.to_owned())
    }

    /// Read an optional length-prefixed string.
    fn read_optional_string(&mut self) -> Result<Option<String>, ProtocolError> {
        let flag = self.read_u8()?;
        if flag == 0 {
            Ok(None)
        } else {
            Ok(Some(self.read_string()?))
        }
    }
}

// ---------------------------------------------------------------------------
// Locator / DialogKind wire helpers
// ---------------------------------------------------------------------------

fn write_locator(buf: &mut Vec<u8>, locator: &Locator) {
    let (strategy, value) = match locator {
        Locator::Id(v) => (0u8, v),
        Locator::Name(v) => (1u8, v),
        Locator::Css(v) => (2u8, v),
        Locator::Tag(v) => (3u8, v),
    };
    buf.push(strategy);
    write_string(buf, value);
}

fn read_locator(cur: &mut Cursor<'_>) -> Result<Locator, ProtocolError> {
    let strategy = cur.read_u8()?;
    let value = cur.read_string()?;
    match strategy {
        0 => Ok(Locator::Id(value)),
        1 => Ok(Locator::Name(value)),
        2 => Ok(Locator::Css(value)),
        3 => Ok(Locator::Tag(value)),
        other => Err(ProtocolError::InvalidPayload(format!(
            "unknown locator strategy: 0x{other:02X}"
        ))),
    }
}

fn write_dialog_kind(buf: &mut Vec<u8>, kind: DialogKind) {
    buf.push(match kind {
        DialogKind::Alert => 0u8,
        DialogKind::Confirm => 1u8,
        DialogKind::Prompt => 2u8,
        DialogKind::BeforeUnload => 3u8,
    });
}

fn read_dialog_kind(cur: &mut Cursor<'_>) -> Result<DialogKind, ProtocolError> {
    match cur.read_u8()? {
        0 => Ok(DialogKind::Alert),
        1 => Ok(DialogKind::Confirm),
        2 => Ok(DialogKind::Prompt),
        3 => Ok(DialogKind::BeforeUnload),
        other => Err(ProtocolError::InvalidPayload(format!(
            "unknown dialog kind: 0x{other:02X}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Frame helpers
// ---------------------------------------------------------------------------

/// Wrap a payload (opcode + data) with the 4-byte LE length header.
///
/// The returned buffer contains `[u32 LE length][payload]` where `length`
/// equals `payload.len()`.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Read the payload length from a 4-byte LE header.
pub fn read_frame_length(header: &[u8; 4]) -> u32 {
    u32::from_le_bytes(*header)
}

// ---------------------------------------------------------------------------
// Encode request
// ---------------------------------------------------------------------------

/// Encode a [`Request`] into wire format including the 4-byte length header.
///
/// The returned bytes are ready to be written directly to a TCP stream.
pub fn encode_request(req: &Request) -> Vec<u8> {
    let mut payload = Vec::new();

    match req {
        Request::Heartbeat => {
            payload.push(OpCode::Heartbeat as u8);
        }
        Request::Navigate { url } => {
            payload.push(OpCode::Navigate as u8);
            write_string(&mut payload, url);
        }
        Request::FindElement { locator } => {
            payload.push(OpCode::FindElement as u8);
            write_locator(&mut payload, locator);
        }
        Request::Click { element_id } => {
            payload.push(OpCode::Click as u8);
            write_string(&mut payload, element_id);
        }
        Request::ElementText { element_id } => {
            payload.push(OpCode::ElementText as u8);
            write_string(&mut payload, element_id);
        }
        Request::SwitchFrame { element_id } => {
            payload.push(OpCode::SwitchFrame as u8);
            write_string(&mut payload, element_id);
        }
        Request::SwitchDefaultContent => {
            payload.push(OpCode::SwitchDefaultContent as u8);
        }
        Request::DialogState => {
            payload.push(OpCode::DialogState as u8);
        }
        Request::DialogAccept => {
            payload.push(OpCode::DialogAccept as u8);
        }
        Request::DialogDismiss => {
            payload.push(OpCode::DialogDismiss as u8);
        }
        Request::DialogSendKeys { text } => {
            payload.push(OpCode::DialogSendKeys as u8);
            write_string(&mut payload, text);
        }
        Request::PageTitle => {
            payload.push(OpCode::PageTitle as u8);
        }
        Request::CurrentUrl => {
            payload.push(OpCode::CurrentUrl as u8);
        }
        Request::ExecuteScript { script } => {
            payload.push(OpCode::ExecuteScript as u8);
            write_string(&mut payload, script);
        }
        Request::BrowserInfo => {
            payload.push(OpCode::BrowserInfo as u8);
        }
    }

    encode_frame(&payload)
}

// ---------------------------------------------------------------------------
// Decode request
// ---------------------------------------------------------------------------

/// Decode wire bytes (opcode + payload, **after** the 4-byte length header)
/// into a [`Request`].
///
/// Pass the slice starting at the opcode byte; do **not** include the length
/// header.
pub fn decode_request(data: &[u8]) -> Result<Request, ProtocolError> {
    let mut cur = Cursor::new(data);
    let opcode = OpCode::from_u8(cur.read_u8()?)?;

    match opcode {
        OpCode::Heartbeat => Ok(Request::Heartbeat),

        OpCode::Navigate => {
            let url = cur.read_string()?;
            Ok(Request::Navigate { url })
        }

        OpCode::FindElement => {
            let locator = read_locator(&mut cur)?;
            Ok(Request::FindElement { locator })
        }

        OpCode::Click => {
            let element_id = cur.read_string()?;
            Ok(Request::Click { element_id })
        }

        OpCode::ElementText => {
            let element_id = cur.read_string()?;
            Ok(Request::ElementText { element_id })
        }

        OpCode::SwitchFrame => {
            let element_id = cur.read_string()?;
            Ok(Request::SwitchFrame { element_id })
        }

        OpCode::SwitchDefaultContent => Ok(Request::SwitchDefaultContent),

        OpCode::DialogState => Ok(Request::DialogState),

        OpCode::DialogAccept => Ok(Request::DialogAccept),

        OpCode::DialogDismiss => Ok(Request::DialogDismiss),

        OpCode::DialogSendKeys => {
            let text = cur.read_string()?;
            Ok(Request::DialogSendKeys { text })
        }

        OpCode::PageTitle => Ok(Request::PageTitle),

        OpCode::CurrentUrl => Ok(Request::CurrentUrl),

        OpCode::ExecuteScript => {
            let script = cur.read_string()?;
            Ok(Request::ExecuteScript { script })
        }

        OpCode::BrowserInfo => Ok(Request::BrowserInfo),

        OpCode::Error | OpCode::Response => Err(ProtocolError::InvalidPayload(format!(
            "opcode 0x{:02X} is not a valid request opcode",
            opcode as u8
        ))),
    }
}

// ---------------------------------------------------------------------------
// Encode response
// ---------------------------------------------------------------------------

/// Encode a [`Response`] into wire format including the 4-byte length header.
pub fn encode_response(resp: &Response) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.push(OpCode::Response as u8);

    match resp {
        Response::Ok => {
            payload.push(ResponseType::Ok as u8);
        }
        Response::Error {
            code,
            message,
            detail,
        } => {
            payload.push(ResponseType::Error as u8);
            payload.push(*code as u8);
            write_string(&mut payload, message);
            write_optional_string(&mut payload, detail);
        }
        Response::Text { value } => {
            payload.push(ResponseType::Text as u8);
            write_string(&mut payload, value);
        }
        Response::Value { value } => {
            payload.push(ResponseType::Value as u8);
            write_optional_string(&mut payload, value);
        }
        Response::Json { json } => {
            payload.push(ResponseType::Json as u8);
            write_string(&mut payload, json);
        }
        Response::Dialog { open, kind, text } => {
            payload.push(ResponseType::Dialog as u8);
            write_bool(&mut payload, *open);
            if *open {
                match (kind, text) {
                    (Some(k), Some(t)) => {
                        write_dialog_kind(&mut payload, *k);
                        write_string(&mut payload, t);
                    }
                    // An open dialog without kind/text is not representable;
                    // encode as alert with empty text.
                    _ => {
                        write_dialog_kind(&mut payload, DialogKind::Alert);
                        write_string(&mut payload, "");
                    }
                }
            }
        }
    }

    encode_frame(&payload)
}

// ---------------------------------------------------------------------------
// Decode response
// ---------------------------------------------------------------------------

/// Decode wire bytes (opcode + payload, **after** the 4-byte length header)
/// into a [`Response`].
///
/// The first byte must be the `Response` opcode (`0xA0`), followed by a
/// response-type discriminator and the type-specific payload.
pub fn decode_response(data: &[u8]) -> Result<Response, ProtocolError> {
    let mut cur = Cursor::new(data);
    let opcode = OpCode::from_u8(cur.read_u8()?)?;

    match opcode {
        OpCode::Response => {
            let resp_type = ResponseType::from_u8(cur.read_u8()?)?;
            match resp_type {
                ResponseType::Ok => Ok(Response::Ok),
                ResponseType::Error => {
                    let code = ErrorCode::from_u8(cur.read_u8()?)?;
                    let message = cur.read_string()?;
                    let detail = cur.read_optional_string()?;
                    Ok(Response::Error {
                        code,
                        message,
                        detail,
                    })
                }
                ResponseType::Text => {
                    let value = cur.read_string()?;
                    Ok(Response::Text { value })
                }
                ResponseType::Value => {
                    let value = cur.read_optional_string()?;
                    Ok(Response::Value { value })
                }
                ResponseType::Json => {
                    let json = cur.read_string()?;
                    Ok(Response::Json { json })
                }
                ResponseType::Dialog => {
                    let open = cur.read_bool()?;
                    if open {
                        let kind = read_dialog_kind(&mut cur)?;
                        let text = cur.read_string()?;
                        Ok(Response::Dialog {
                            open: true,
                            kind: Some(kind),
                            text: Some(text),
                        })
                    } else {
                        Ok(Response::Dialog {
                            open: false,
                            kind: None,
                            text: None,
                        })
                    }
                }
            }
        }

        OpCode::Error => {
            // The bridge may also send a bare Error opcode.
            let code = ErrorCode::from_u8(cur.read_u8()?)?;
            let message = cur.read_string()?;
            let detail = cur.read_optional_string()?;
            Ok(Response::Error {
                code,
                message,
                detail,
            })
        }

        _ => Err(ProtocolError::InvalidPayload(format!(
            "opcode 0x{:02X} is not a valid response opcode",
            opcode as u8
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

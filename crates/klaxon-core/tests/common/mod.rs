//! Shared test helpers for klaxon-core integration tests.
//!
//! This module provides reusable mock infrastructure for tests that exercise
//! the TCP bridge protocol and the full driver stack: canned-response mock
//! bridges, a programmable per-request mock, and [`BrowserModel`], a
//! stateful in-process browser that reproduces the fixture pages' dialog
//! behavior over the real wire protocol.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use klaxon_core::bridge::BridgeDriver;
use klaxon_core::dialog::DialogKind;
use klaxon_core::driver::BrowserDriver;
use klaxon_core::element::Locator;
use klaxon_core::executor::ActionExecutor;
use klaxon_core::protocol::{
    decode_request, encode_response, read_frame_length, ErrorCode, Request, Response,
};

// ---------------------------------------------------------------------------
// Basic mock helpers
// ---------------------------------------------------------------------------

/// Start a mock TCP bridge that accepts one connection and handles a sequence
/// of request/response pairs. The first response is always consumed by the
/// heartbeat that `BridgeDriver::connect()` sends.
pub async fn mock_bridge(responses: Vec<Response>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        for response in responses {
            // Read one request frame: 4-byte LE header + payload.
            let mut header = [0u8; 4];
            stream.read_exact(&mut header).await.unwrap();
            let len = read_frame_length(&header) as usize;
            let mut payload = vec![0u8; len];
            stream.read_exact(&mut payload).await.unwrap();

            // Send the canned response.
            let resp_bytes = encode_response(&response);
            stream.write_all(&resp_bytes).await.unwrap();
            stream.flush().await.unwrap();
        }
    });

    addr
}

/// Convenience: create a BridgeDriver connected to the mock, wrapped in an
/// ActionExecutor.
pub async fn connected_executor(responses: Vec<Response>) -> ActionExecutor {
    let addr = mock_bridge(responses).await;
    let mut driver = BridgeDriver::direct(addr.ip().to_string(), addr.port());
    driver.connect().await.unwrap();
    ActionExecutor::new(std::sync::Arc::new(driver))
}

// ---------------------------------------------------------------------------
// Programmable mock bridge
// ---------------------------------------------------------------------------

/// Describes the behavior a mock bridge should exhibit for a single incoming
/// request frame.
pub enum MockBehavior {
    /// Read one request frame and reply with the given response.
    Respond(Response),
    /// Read one request frame, sleep for `Duration`, then reply.
    Delay(Duration, Response),
    /// Read one request frame and then close the connection.
    Drop,
    /// Read one request frame and send invalid (non-protocol) bytes.
    SendGarbage,
    /// Accept the connection but never read or write (blocks forever).
    Hang,
}

/// Start a mock TCP bridge whose behavior is scripted per-request.
///
/// The bridge accepts exactly one connection and processes each
/// `MockBehavior` entry in sequence. After all behaviors are exhausted the
/// connection is closed.
pub async fn programmable_mock_bridge(behaviors: Vec<MockBehavior>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        for behavior in behaviors {
            match behavior {
                MockBehavior::Respond(response) => {
                    if read_one_frame(&mut stream).await.is_none() {
                        return;
                    }
                    let resp_bytes = encode_response(&response);
                    let _ = stream.write_all(&resp_bytes).await;
                    let _ = stream.flush().await;
                }
                MockBehavior::Delay(duration, response) => {
                    if read_one_frame(&mut stream).await.is_none() {
                        return;
                    }
                    tokio::time::sleep(duration).await;
                    let resp_bytes = encode_response(&response);
                    let _ = stream.write_all(&resp_bytes).await;
                    let _ = stream.flush().await;
                }
                MockBehavior::Drop => {
                    let _ = read_one_frame(&mut stream).await;
                    return; // close connection
                }
                MockBehavior::SendGarbage => {
                    if read_one_frame(&mut stream).await.is_none() {
                        return;
                    }
                    // A well-formed frame header with an unknown opcode inside.
                    let garbage = [0x04, 0x00, 0x00, 0x00, 0x42, 0x42, 0x42, 0x42];
                    let _ = stream.write_all(&garbage).await;
                    let _ = stream.flush().await;
                }
                MockBehavior::Hang => {
                    // Accept but never respond — block forever.
                    std::future::pending::<()>().await;
                }
            }
        }
    });

    addr
}

/// Read one request frame (header + payload); `None` on any read error.
async fn read_one_frame(stream: &mut TcpStream) -> Option<Vec<u8>> {
    let mut header = [0u8; 4];
    stream.read_exact(&mut header).await.ok()?;
    let len = read_frame_length(&header) as usize;
    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).await.ok()?;
    Some(payload)
}

// ---------------------------------------------------------------------------
// BrowserModel — stateful scripted browser
// ---------------------------------------------------------------------------

/// How long the slow-alert fixture waits before its dialog opens.
const SLOW_ALERT_DELAY: Duration = Duration::from_millis(200);

/// The page the model currently has loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Alerts,
    Simple,
    OnLoad,
    BeforeUnload,
}

impl Page {
    fn title(self) -> &'static str {
        match self {
            Page::Alerts => "Testing Alerts",
            Page::Simple => "Hello WebDriver",
            Page::OnLoad => "Page with onload event handler",
            Page::BeforeUnload => "Page with onbeforeunload handler",
        }
    }

    fn url(self) -> &'static str {
        match self {
            Page::Alerts => "http://fixtures.local/alerts.html",
            Page::Simple => "http://fixtures.local/simpleTest.html",
            Page::OnLoad => "http://fixtures.local/pageWithOnLoad.html",
            Page::BeforeUnload => "http://fixtures.local/pageWithOnBeforeUnloadMessage.html",
        }
    }

    fn from_url(url: &str) -> Option<Self> {
        if url.ends_with("alerts.html") {
            Some(Page::Alerts)
        } else if url.ends_with("simpleTest.html") {
            Some(Page::Simple)
        } else if url.ends_with("pageWithOnLoad.html") {
            Some(Page::OnLoad)
        } else if url.ends_with("pageWithOnBeforeUnloadMessage.html") {
            Some(Page::BeforeUnload)
        } else {
            None
        }
    }
}

/// Convenience: the model's URL for a fixture page name.
pub fn page_url(name: &str) -> String {
    format!("http://fixtures.local/{name}")
}

/// What resolving a dialog does to the page.
#[derive(Debug, Clone)]
enum DialogEffect {
    /// Nothing beyond closing the dialog.
    None,
    /// Write the prompt result into a document slot: the supplied input on
    /// accept (falling back to the default, then to empty), `"null"` on
    /// dismiss.
    WriteResult { slot: &'static str },
    /// Proceed with the blocked navigation on accept; stay on dismiss.
    NavigateOnAccept { page: Page },
}

/// A dialog raised by the page, queued until resolved.
#[derive(Debug, Clone)]
struct PendingDialog {
    kind: DialogKind,
    text: String,
    default: Option<String>,
    input: Option<String>,
    effect: DialogEffect,
    /// For timer-raised dialogs: not reported open before this instant.
    visible_at: Option<Instant>,
}

impl PendingDialog {
    fn alert(text: &str) -> Self {
        Self {
            kind: DialogKind::Alert,
            text: text.to_string(),
            default: None,
            input: None,
            effect: DialogEffect::None,
            visible_at: None,
        }
    }

    fn prompt(text: &str, default: Option<&str>, slot: &'static str) -> Self {
        Self {
            kind: DialogKind::Prompt,
            text: text.to_string(),
            default: default.map(str::to_string),
            input: None,
            effect: DialogEffect::WriteResult { slot },
            visible_at: None,
        }
    }

    fn visible(&self) -> bool {
        self.visible_at.map(|at| Instant::now() >= at).unwrap_or(true)
    }
}

/// A stateful in-process browser reproducing the fixture pages' dialog
/// behavior.
///
/// The model answers protocol [`Request`]s the way a real bridge driving the
/// fixture pages would: clicking the known trigger elements queues dialogs,
/// resolving them applies their page effects, navigation is blocked while a
/// dialog is open, and frame focus gates which elements are reachable.
pub struct BrowserModel {
    page: Page,
    frame_stack: Vec<String>,
    dialogs: VecDeque<PendingDialog>,
    doc: HashMap<&'static str, String>,
    alert_overridden: bool,
    browser_name: String,
}

impl Default for BrowserModel {
    fn default() -> Self {
        Self {
            page: Page::Simple,
            frame_stack: Vec::new(),
            dialogs: VecDeque::new(),
            doc: HashMap::new(),
            alert_overridden: false,
            browser_name: "scripted".to_string(),
        }
    }
}

impl BrowserModel {
    fn error(code: ErrorCode, message: &str) -> Response {
        Response::Error {
            code,
            message: message.to_string(),
            detail: None,
        }
    }

    /// The open dialog's text, if one is visible.
    fn open_dialog_text(&self) -> Option<String> {
        self.dialogs
            .front()
            .filter(|d| d.visible())
            .map(|d| d.text.clone())
    }

    fn load(&mut self, page: Page) {
        self.page = page;
        self.frame_stack.clear();
        self.doc.clear();
        self.alert_overridden = false;
        if page == Page::OnLoad {
            self.dialogs.push_back(PendingDialog::alert("onload"));
            self.doc
                .insert("p", "Page with onload event handler".to_string());
        }
    }

    /// Whether the element named by `key` exists in the current context.
    fn element_exists(&self, key: &str) -> bool {
        let in_frame = |name: &str| self.frame_stack.last().map(String::as_str) == Some(name);
        match key {
            // Top-level triggers on the alerts page.
            "id:alert" | "id:empty-alert" | "id:slow-alert" | "id:prompt"
            | "id:prompt-with-default" | "id:double-prompt"
            | "id:open-page-with-onload-alert" | "id:text" | "id:text1" | "id:text2" => {
                self.page == Page::Alerts && self.frame_stack.is_empty()
            }
            "name:iframeWithAlert" => {
                self.page == Page::Alerts
                    && (self.frame_stack.is_empty() || in_frame("iframeWithIframe"))
            }
            "name:iframeWithIframe" => self.page == Page::Alerts && self.frame_stack.is_empty(),
            "id:alertInFrame" => self.page == Page::Alerts && in_frame("iframeWithAlert"),
            "id:navigate" => self.page == Page::BeforeUnload,
            "tag:p" => self.page == Page::OnLoad,
            _ => false,
        }
    }

    fn find_element(&self, locator: &Locator) -> Response {
        let key = format!("{}:{}", locator.strategy(), locator.value());
        if self.element_exists(&key) {
            Response::Json {
                json: format!(r#"{{"elementId":"{key}"}}"#),
            }
        } else {
            Self::error(
                ErrorCode::NoSuchElement,
                &format!("no element matched {locator}"),
            )
        }
    }

    fn click(&mut self, element_id: &str) -> Response {
        if let Some(text) = self.open_dialog_text() {
            return Response::Error {
                code: ErrorCode::UnexpectedDialogOpen,
                message: "element not interactable while a dialog is open".to_string(),
                detail: Some(text),
            };
        }
        if !self.element_exists(element_id) {
            return Self::error(
                ErrorCode::NoSuchElement,
                &format!("stale element: {element_id}"),
            );
        }

        match element_id {
            "id:alert" => {
                if self.alert_overridden {
                    // The page replaced window.alert; the message lands in #text.
                    self.doc.insert("text", "cheese".to_string());
                } else {
                    self.dialogs.push_back(PendingDialog::alert("cheese"));
                }
            }
            "id:empty-alert" => self.dialogs.push_back(PendingDialog::alert("")),
            "id:slow-alert" => {
                let mut dialog = PendingDialog::alert("Slow");
                dialog.visible_at = Some(Instant::now() + SLOW_ALERT_DELAY);
                self.dialogs.push_back(dialog);
            }
            "id:prompt" => self
                .dialogs
                .push_back(PendingDialog::prompt("Enter something", None, "text")),
            "id:prompt-with-default" => self.dialogs.push_back(PendingDialog::prompt(
                "Enter something",
                Some("This is a default value"),
                "text",
            )),
            "id:double-prompt" => {
                self.dialogs
                    .push_back(PendingDialog::prompt("First", None, "text1"));
                self.dialogs
                    .push_back(PendingDialog::prompt("Second", None, "text2"));
            }
            "id:open-page-with-onload-alert" => self.load(Page::OnLoad),
            "id:alertInFrame" => self.dialogs.push_back(PendingDialog::alert("framed cheese")),
            "id:navigate" => self.dialogs.push_back(PendingDialog {
                kind: DialogKind::BeforeUnload,
                text: "Leaving this page will lose data.".to_string(),
                default: None,
                input: None,
                effect: DialogEffect::NavigateOnAccept { page: Page::Alerts },
                visible_at: None,
            }),
            // Result paragraphs are clickable no-ops.
            _ => {}
        }
        Response::Ok
    }

    fn resolve_dialog(&mut self, accept: bool) -> Response {
        let Some(dialog) = self.dialogs.front() else {
            return Self::error(ErrorCode::NoDialogOpen, "no dialog open");
        };
        if !dialog.visible() {
            return Self::error(ErrorCode::NoDialogOpen, "no dialog open");
        }
        let dialog = self.dialogs.pop_front().expect("front checked above");

        match dialog.effect {
            DialogEffect::None => {}
            DialogEffect::WriteResult { slot } => {
                let value = if accept {
                    dialog
                        .input
                        .or(dialog.default)
                        .unwrap_or_default()
                } else {
                    "null".to_string()
                };
                self.doc.insert(slot, value);
            }
            DialogEffect::NavigateOnAccept { page } => {
                if accept {
                    self.load(page);
                }
            }
        }
        Response::Ok
    }

    /// Answer one protocol request, mutating the model.
    pub fn handle(&mut self, request: Request) -> Response {
        match request {
            Request::Heartbeat => Response::Ok,

            Request::Navigate { url } => {
                if let Some(text) = self.open_dialog_text() {
                    // Navigation refuses while a dialog is up; the bridge
                    // dismisses it as part of reporting the failure.
                    self.dialogs.pop_front();
                    return Response::Error {
                        code: ErrorCode::UnexpectedDialogOpen,
                        message: "navigation blocked by open dialog".to_string(),
                        detail: Some(text),
                    };
                }
                match Page::from_url(&url) {
                    Some(page) => {
                        self.load(page);
                        Response::Ok
                    }
                    None => Self::error(ErrorCode::Unknown, &format!("unroutable url: {url}")),
                }
            }

            Request::FindElement { locator } => self.find_element(&locator),

            Request::Click { element_id } => self.click(&element_id),

            Request::ElementText { element_id } => {
                if !self.element_exists(&element_id) {
                    return Self::error(
                        ErrorCode::NoSuchElement,
                        &format!("stale element: {element_id}"),
                    );
                }
                let slot = element_id.rsplit(':').next().unwrap_or_default();
                Response::Text {
                    value: self.doc.get(slot).cloned().unwrap_or_default(),
                }
            }

            Request::SwitchFrame { element_id } => {
                if !self.element_exists(&element_id) {
                    return Self::error(
                        ErrorCode::NoSuchElement,
                        &format!("stale element: {element_id}"),
                    );
                }
                match element_id.strip_prefix("name:") {
                    Some(name) => {
                        self.frame_stack.push(name.to_string());
                        Response::Ok
                    }
                    None => Self::error(ErrorCode::Unknown, "element is not a frame"),
                }
            }

            Request::SwitchDefaultContent => {
                self.frame_stack.clear();
                Response::Ok
            }

            Request::DialogState => match self.dialogs.front() {
                Some(dialog) if dialog.visible() => Response::Dialog {
                    open: true,
                    kind: Some(dialog.kind),
                    text: Some(dialog.text.clone()),
                },
                _ => Response::Dialog {
                    open: false,
                    kind: None,
                    text: None,
                },
            },

            Request::DialogAccept => self.resolve_dialog(true),

            Request::DialogDismiss => self.resolve_dialog(false),

            Request::DialogSendKeys { text } => match self.dialogs.front_mut() {
                Some(dialog) if dialog.visible() => {
                    if dialog.kind == DialogKind::Prompt {
                        dialog.input = Some(text);
                        Response::Ok
                    } else {
                        Self::error(
                            ErrorCode::InvalidDialogState,
                            &format!("{} dialogs take no input", dialog.kind),
                        )
                    }
                }
                _ => Self::error(ErrorCode::NoDialogOpen, "no dialog open"),
            },

            Request::PageTitle => Response::Text {
                value: self.page.title().to_string(),
            },

            Request::CurrentUrl => Response::Text {
                value: self.page.url().to_string(),
            },

            Request::ExecuteScript { script } => {
                if script.contains("window.alert =") {
                    self.alert_overridden = true;
                }
                Response::Value { value: None }
            }

            Request::BrowserInfo => Response::Json {
                json: format!(r#"{{"browserName":"{}"}}"#, self.browser_name),
            },
        }
    }
}

/// Start a mock bridge backed by a [`BrowserModel`], accepting one
/// connection and serving requests until it closes.
pub async fn scripted_browser_bridge() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut model = BrowserModel::default();

        while let Some(payload) = read_one_frame(&mut stream).await {
            let response = match decode_request(&payload) {
                Ok(request) => model.handle(request),
                Err(e) => Response::Error {
                    code: ErrorCode::Unknown,
                    message: e.to_string(),
                    detail: None,
                },
            };
            let resp_bytes = encode_response(&response);
            if stream.write_all(&resp_bytes).await.is_err() {
                return;
            }
            let _ = stream.flush().await;
        }
    });

    addr
}

/// A connected [`BridgeDriver`] talking to a fresh [`BrowserModel`].
pub async fn scripted_browser() -> BridgeDriver {
    let addr = scripted_browser_bridge().await;
    let mut driver = BridgeDriver::direct(addr.ip().to_string(), addr.port());
    driver.connect().await.unwrap();
    driver
}

//! Fixture page server for dialog tests.
//!
//! Serves a small set of embedded HTML pages over HTTP on an ephemeral local
//! port. The pages carry the dialog-triggering markup the live suite drives
//! a real browser against: alert/confirm/prompt buttons, framed alerts, an
//! onload alert, and a beforeunload confirmation.
//!
//! [`PageServer::where_is`] resolves a page name to a URL, so tests never
//! hard-code ports:
//!
//! ```no_run
//! use klaxon_core::pages::PageServer;
//!
//! # async fn example() -> Result<(), std::io::Error> {
//! let server = PageServer::start().await?;
//! let url = server.where_is("alerts.html");
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Fixture pages
// ---------------------------------------------------------------------------

const ALERTS_HTML: &str = r##"<!DOCTYPE html>
<html>
<head><title>Testing Alerts</title></head>
<body>
  <p id="text"></p>
  <p id="text1"></p>
  <p id="text2"></p>

  <a href="#" id="alert" onclick="alert('cheese'); return false;">click me</a>
  <a href="#" id="empty-alert" onclick="alert(''); return false;">click me</a>
  <a href="#" id="slow-alert"
     onclick="setTimeout(function() { alert('Slow'); }, 200); return false;">click me</a>
  <a href="#" id="prompt"
     onclick="document.getElementById('text').innerHTML =
        String(prompt('Enter something')); return false;">click me</a>
  <a href="#" id="prompt-with-default"
     onclick="document.getElementById('text').innerHTML =
        String(prompt('Enter something', 'This is a default value')); return false;">
     click me</a>
  <a href="#" id="double-prompt"
     onclick="document.getElementById('text1').innerHTML = String(prompt('First'));
              document.getElementById('text2').innerHTML = String(prompt('Second'));
              return false;">click me</a>
  <a href="pageWithOnLoad.html" id="open-page-with-onload-alert">open</a>

  <iframe name="iframeWithAlert" src="frameWithAlert.html"></iframe>
  <iframe name="iframeWithIframe" src="frameWithIframe.html"></iframe>
</body>
</html>
"##;

const FRAME_WITH_ALERT_HTML: &str = r##"<!DOCTYPE html>
<html>
<head><title>Frame with alert</title></head>
<body>
  <a href="#" id="alertInFrame" onclick="alert('framed cheese'); return false;">click me</a>
</body>
</html>
"##;

const FRAME_WITH_IFRAME_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Frame with iframe</title></head>
<body>
  <iframe name="iframeWithAlert" src="frameWithAlert.html"></iframe>
</body>
</html>
"#;

const SIMPLE_TEST_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Hello WebDriver</title></head>
<body>
  <h1 id="header">Heading</h1>
  <p id="oneline">A single line of text</p>
</body>
</html>
"#;

const PAGE_WITH_ONLOAD_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Page with onload event handler</title></head>
<body onload="alert('onload');">
  <p>Page with onload event handler</p>
</body>
</html>
"#;

const PAGE_WITH_ONBEFOREUNLOAD_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Page with onbeforeunload handler</title></head>
<body onbeforeunload="return 'Leaving this page will lose data.';">
  <a href="alerts.html" id="navigate">navigate</a>
</body>
</html>
"#;

/// Look up an embedded fixture page by request path.
fn fixture(path: &str) -> Option<&'static str> {
    match path {
        "/alerts.html" => Some(ALERTS_HTML),
        "/frameWithAlert.html" => Some(FRAME_WITH_ALERT_HTML),
        "/frameWithIframe.html" => Some(FRAME_WITH_IFRAME_HTML),
        "/simpleTest.html" => Some(SIMPLE_TEST_HTML),
        "/pageWithOnLoad.html" => Some(PAGE_WITH_ONLOAD_HTML),
        "/pageWithOnBeforeUnloadMessage.html" => Some(PAGE_WITH_ONBEFOREUNLOAD_HTML),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// PageServer
// ---------------------------------------------------------------------------

/// A minimal HTTP server for the embedded fixture pages.
///
/// Binds an ephemeral port on localhost and serves GET requests until
/// dropped. Only what the fixtures need: no keep-alive, no methods other
/// than GET.
pub struct PageServer {
    addr: SocketAddr,
    accept_task: tokio::task::JoinHandle<()>,
}

impl PageServer {
    /// Bind an ephemeral localhost port and start serving.
    pub async fn start() -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        debug!(%addr, "fixture page server listening");

        let accept_task = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, _)) => {
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream).await {
                                warn!(error = %e, "fixture request failed");
                            }
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        return;
                    }
                }
            }
        });

        Ok(Self { addr, accept_task })
    }

    /// The address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Resolve a fixture page name (e.g. `"alerts.html"`) to a URL.
    pub fn where_is(&self, page: &str) -> String {
        format!("http://{}/{}", self.addr, page)
    }
}

impl Drop for PageServer {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

/// Serve one request on an accepted connection.
async fn handle_connection(mut stream: TcpStream) -> Result<(), std::io::Error> {
    // Read until the end of the request head. Fixture requests are tiny;
    // anything beyond 8 KiB is rejected by closing the connection.
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") || buf.len() > 8192 {
            break;
        }
    }

    let head = String::from_utf8_lossy(&buf);
    let path = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/");

    let response = match fixture(path) {
        Some(body) => format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        ),
        None => {
            let body = "not found";
            format!(
                "HTTP/1.1 404 Not Found\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            )
        }
    };

    stream.write_all(response.as_bytes()).await?;
    stream.flush().await?;
    Ok(())
}

use assert_cmd::Command;
use std::sync::mpsc;
use std::sync::OnceLock;

use klaxon_core::pages::PageServer;

static HARNESS: OnceLock<BrowserHarness> = OnceLock::new();

pub struct BrowserHarness {
    pub bridge: String,
    pages_addr: std::net::SocketAddr,
    // Keeps the page-server runtime alive for the whole test run.
    _pages_thread: std::thread::JoinHandle<()>,
}

impl BrowserHarness {
    fn init() -> Self {
        let bridge = std::env::var("KLAXON_BRIDGE").expect(
            "KLAXON_BRIDGE not set. Point it at a running bridge (host:port) \
             before running the browser suite.",
        );

        // Serve the fixture pages from a dedicated runtime thread so the
        // synchronous CLI invocations below have something to point at.
        let (addr_tx, addr_rx) = mpsc::channel();
        let pages_thread = std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("page server runtime");
            runtime.block_on(async move {
                let server = PageServer::start().await.expect("start page server");
                addr_tx.send(server.addr()).expect("report page server addr");
                std::future::pending::<()>().await;
            });
        });
        let pages_addr = addr_rx.recv().expect("page server addr");

        // Fail early if the bridge is not reachable.
        klaxon_cmd()
            .args(["-b", &bridge, "info"])
            .timeout(std::time::Duration::from_secs(10))
            .assert()
            .success();

        BrowserHarness {
            bridge,
            pages_addr,
            _pages_thread: pages_thread,
        }
    }

    /// URL of a fixture page on the harness's page server.
    pub fn where_is(&self, page: &str) -> String {
        format!("http://{}/{}", self.pages_addr, page)
    }
}

/// Get or initialize the shared harness.
pub fn harness() -> &'static BrowserHarness {
    HARNESS.get_or_init(BrowserHarness::init)
}

/// Build a Command for the klaxon binary.
pub fn klaxon_cmd() -> Command {
    Command::cargo_bin("klaxon").unwrap()
}

/// Run a klaxon CLI command against the shared bridge. Asserts success and
/// returns stdout.
///
/// Example: `run(&["click", "alert"])` runs `klaxon -b <bridge> click alert`
pub fn run(args: &[&str]) -> String {
    let h = harness();
    let mut all_args: Vec<&str> = vec!["-b", &h.bridge];
    all_args.extend_from_slice(args);
    let assert = klaxon_cmd()
        .args(&all_args)
        .timeout(std::time::Duration::from_secs(15))
        .assert()
        .success();
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

/// Run a klaxon CLI command expecting failure. Returns stderr.
pub fn run_fail(args: &[&str]) -> String {
    let h = harness();
    let mut all_args: Vec<&str> = vec!["-b", &h.bridge];
    all_args.extend_from_slice(args);
    let assert = klaxon_cmd()
        .args(&all_args)
        .timeout(std::time::Duration::from_secs(15))
        .assert()
        .failure();
    let output = assert.get_output();
    let stderr = String::from_utf8(output.stderr.clone()).unwrap();
    let stdout = String::from_utf8(output.stdout.clone()).unwrap();
    // Return whichever has content (some errors go to stdout)
    if stderr.is_empty() {
        stdout
    } else {
        stderr
    }
}

/// Load a fixture page by name, clearing any dialog a previous test left open.
pub fn load_page(name: &str) {
    let h = harness();
    let _ = klaxon_cmd()
        .args(["-b", &h.bridge, "dismiss"])
        .timeout(std::time::Duration::from_secs(5))
        .output();
    run(&["navigate", &h.where_is(name)]);
}

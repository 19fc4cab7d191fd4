//! Development server for the output directory.

mod response;

use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use anyhow::Result;
use percent_encoding::percent_decode_str;
use tiny_http::{Method, Request, Server};

use crate::config::Config;
use crate::log;
use crate::reload::ReloadHub;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start
///
/// Before the server is bound the handler exits immediately; afterwards it
/// unblocks the request loop so `run` can return and clean up.
pub fn setup_shutdown_handler() -> Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        if let Some(server) = SERVER.get() {
            log!("serve"; "shutting down...");
            server.unblock();
        } else {
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
    addr: SocketAddr,
    output: PathBuf,
}

/// Bind the HTTP server for the output directory, with port retry.
pub fn bind_server(config: &Config) -> Result<BoundServer> {
    let (server, addr) = bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);
    let _ = SERVER.set(Arc::clone(&server));

    log!("serve"; "http://{}", addr);

    Ok(BoundServer {
        server,
        addr,
        output: config.output_dir().to_path_buf(),
    })
}

impl BoundServer {
    /// Get the bound address.
    #[allow(dead_code)]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start the request loop (blocking until shutdown).
    pub fn run(self, ws_port: Option<u16>, hub: Option<Arc<ReloadHub>>) -> Result<()> {
        // Thread pool so a slow response doesn't block other requests
        let pool = rayon::ThreadPoolBuilder::new().num_threads(4).build()?;
        let output = Arc::new(self.output);

        for request in self.server.incoming_requests() {
            let output = Arc::clone(&output);
            pool.spawn(move || {
                if let Err(e) = handle_request(request, &output, ws_port) {
                    log!("serve"; "request error: {e}");
                }
            });
        }

        // incoming_requests ends only after unblock()
        if let Some(hub) = hub {
            hub.close_all();
        }
        Ok(())
    }
}

/// Handle a single HTTP request
fn handle_request(request: Request, output: &Path, ws_port: Option<u16>) -> Result<()> {
    if is_shutdown() {
        return response::respond_unavailable(request);
    }

    if !matches!(request.method(), Method::Get | Method::Head) {
        return response::respond_method_not_allowed(request);
    }

    match resolve_path(request.url(), output) {
        Some(path) => response::respond_file(request, &path, ws_port),
        None => response::respond_not_found(request),
    }
}

/// Resolve a request URL to a file inside the output directory.
///
/// `/` and directory paths map to their `index.html`. Returns `None` for
/// missing files and for paths escaping the output directory.
fn resolve_path(url: &str, output: &Path) -> Option<PathBuf> {
    // Strip query and fragment, then percent-decode (filenames with
    // spaces or non-ASCII characters arrive encoded)
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    let path = decoded.trim_start_matches('/');

    let relative = Path::new(path);
    if relative
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
    {
        return None;
    }

    let mut candidate = output.join(relative);
    if candidate.is_dir() || path.is_empty() {
        candidate = candidate.join("index.html");
    }

    candidate.is_file().then_some(candidate)
}

/// Bind to the specified interface and port, with automatic port retry.
fn bind_with_retry(
    interface: std::net::IpAddr,
    base_port: u16,
) -> Result<(Server, SocketAddr)> {
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(_) if offset + 1 < MAX_PORT_RETRIES => continue,
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Failed to bind after {} attempts (ports {}-{}): {}",
                    MAX_PORT_RETRIES,
                    base_port,
                    port,
                    e
                ));
            }
        }
    }
    unreachable!()
}

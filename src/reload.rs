//! Live-reload hub.
//!
//! A WebSocket server collects connected browser clients; `broadcast_reload`
//! pushes a refresh signal to all of them. The dev server injects a small
//! client script into served HTML documents that listens for the signal and
//! reloads the page, reconnecting after a server restart.

use std::net::{TcpListener, TcpStream};
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use crate::{debug, log};

/// Default WebSocket port for live reload
pub const DEFAULT_WS_PORT: u16 = 35729;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Connected browser clients and the broadcast operation.
pub struct ReloadHub {
    clients: Mutex<Vec<WebSocket<TcpStream>>>,
}

impl ReloadHub {
    /// Bind the WebSocket server (with port retry) and spawn the acceptor
    /// thread. Returns the hub and the actually bound port.
    pub fn start(base_port: u16) -> Result<(Arc<Self>, u16)> {
        let (listener, actual_port) = try_bind_port(base_port, MAX_PORT_RETRIES)?;

        let hub = Arc::new(Self {
            clients: Mutex::new(Vec::new()),
        });

        let acceptor = Arc::clone(&hub);
        std::thread::spawn(move || acceptor.accept_loop(listener));

        debug!("reload"; "ws://localhost:{}", actual_port);
        Ok((hub, actual_port))
    }

    fn accept_loop(&self, listener: TcpListener) {
        loop {
            match listener.accept() {
                Ok((stream, addr)) => {
                    debug!("reload"; "client connected: {}", addr);
                    self.add_client(stream);
                }
                Err(e) => {
                    log!("reload"; "accept error: {}", e);
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
            }
        }
    }

    /// Perform the WebSocket handshake and register the client.
    fn add_client(&self, stream: TcpStream) {
        match tungstenite::accept(stream) {
            Ok(mut ws) => {
                let connected = message("connected");
                if let Err(e) = ws.send(Message::Text(connected.into())) {
                    log!("reload"; "failed to send connected message: {}", e);
                    return;
                }
                let mut clients = self.clients.lock();
                clients.push(ws);
                debug!("reload"; "clients: {}", clients.len());
            }
            Err(e) => {
                log!("reload"; "handshake failed: {}", e);
            }
        }
    }

    /// Push a refresh signal to every connected client.
    ///
    /// Clients whose send fails are pruned.
    pub fn broadcast_reload(&self) {
        let payload = message("reload");
        let mut clients = self.clients.lock();
        clients.retain_mut(|ws| ws.send(Message::Text(payload.clone().into())).is_ok());
    }

    /// Close every client connection (graceful shutdown).
    pub fn close_all(&self) {
        let mut clients = self.clients.lock();
        for mut ws in clients.drain(..) {
            let _ = ws.close(None);
        }
    }
}

/// Wire message: `{"type": "<kind>"}`.
fn message(kind: &str) -> String {
    serde_json::json!({ "type": kind }).to_string()
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(format!("127.0.0.1:{}", port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        }
    }

    Err(anyhow::anyhow!(
        "failed to bind reload server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

// =============================================================================
// Client script injection
// =============================================================================

/// Browser-side reload client. Reconnects with a delay so a restarted dev
/// server triggers a reload once it comes back up.
fn client_script(ws_port: u16) -> String {
    format!(
        "<script>\n\
         (function () {{\n\
           var connect = function () {{\n\
             var ws = new WebSocket(\"ws://localhost:{ws_port}/\");\n\
             ws.onmessage = function (ev) {{\n\
               var msg = JSON.parse(ev.data);\n\
               if (msg.type === \"reload\") location.reload();\n\
             }};\n\
             ws.onclose = function () {{ setTimeout(connect, 1000); }};\n\
           }};\n\
           connect();\n\
         }})();\n\
         </script>"
    )
}

/// Inject the reload client script before `</body>` of an HTML document.
///
/// Falls back to appending when no `</body>` is present (browsers handle
/// this gracefully).
pub fn inject_reload_script(content: &[u8], ws_port: u16) -> Vec<u8> {
    let script = client_script(ws_port);
    let script_bytes = script.as_bytes();

    const PATTERN: &[u8] = b"</body>";

    if let Some(pos) = content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
    {
        let mut result = Vec::with_capacity(content.len() + script_bytes.len());
        result.extend_from_slice(&content[..pos]);
        result.extend_from_slice(script_bytes);
        result.extend_from_slice(&content[pos..]);
        return result;
    }

    let mut result = Vec::with_capacity(content.len() + script_bytes.len());
    result.extend_from_slice(content);
    result.extend_from_slice(script_bytes);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_shape() {
        assert_eq!(message("reload"), "{\"type\":\"reload\"}");
    }

    #[test]
    fn test_inject_before_body_close() {
        let html = b"<html><body><p>hi</p></body></html>";
        let out = inject_reload_script(html, 35729);
        let text = String::from_utf8(out).unwrap();
        let script_pos = text.find("<script>").unwrap();
        let body_pos = text.find("</body>").unwrap();
        assert!(script_pos < body_pos);
        assert!(text.contains("ws://localhost:35729/"));
    }

    #[test]
    fn test_inject_case_insensitive_and_last_match() {
        let html = b"<html><body></BODY></html>";
        let out = inject_reload_script(html, 1234);
        let text = String::from_utf8(out).unwrap();
        assert!(text.find("<script>").unwrap() < text.find("</BODY>").unwrap());
    }

    #[test]
    fn test_inject_appends_without_body() {
        let html = b"fragment";
        let out = inject_reload_script(html, 1234);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("fragment"));
        assert!(text.contains("location.reload()"));
    }

    #[test]
    fn test_bind_retry_on_conflict() {
        let (first, port) = try_bind_port(0, 1).unwrap();
        // Port 0 asks the OS for an ephemeral port
        assert_ne!(port, 0);
        // A busy port falls through to the next one
        let (_, second_port) = try_bind_port(port, 10).unwrap();
        assert_ne!(second_port, port);
        drop(first);
    }
}

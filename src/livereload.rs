//! Live-reload channel between the dev server and open browser tabs.
//!
//! Each tab opens a websocket to `/ws` and waits. After a rebuild the
//! watcher calls [`ReloadHub::broadcast`], which sends the text frame
//! `reload` to every connection; the injected script then swaps the page's
//! `#content` for the freshly built one (or reloads the page when it can't).
//!
//! ```text
//! watcher thread ── rebuild ── hub.broadcast() ──► "reload" ──► tab 1
//!                                                          └──► tab 2
//! ```
//!
//! Connections are only ever written to. A connection whose send fails is
//! gone and is dropped from the hub.

use log::debug;
use std::io::{Read, Write};
use std::sync::Mutex;
use tungstenite::{Message, WebSocket};

/// Script appended to every served HTML page.
pub const RELOAD_SCRIPT: &str = concat!(
    "<script>\n",
    include_str!("embed/livereload.js"),
    "</script>\n"
);

/// The text frame sent after every rebuild.
pub const RELOAD_MESSAGE: &str = "reload";

/// One open browser connection.
pub trait Transport: Send {
    fn send_reload(&mut self) -> Result<(), tungstenite::Error>;

    /// Orderly close. Errors mean the peer is already gone.
    fn close(&mut self) -> Result<(), tungstenite::Error>;
}

impl<S: Read + Write + Send> Transport for WebSocket<S> {
    fn send_reload(&mut self) -> Result<(), tungstenite::Error> {
        self.send(Message::text(RELOAD_MESSAGE))
    }

    fn close(&mut self) -> Result<(), tungstenite::Error> {
        WebSocket::close(self, None)?;
        self.flush()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send_reload(&mut self) -> Result<(), tungstenite::Error> {
        (**self).send_reload()
    }

    fn close(&mut self) -> Result<(), tungstenite::Error> {
        (**self).close()
    }
}

/// The set of open connections, shared between the HTTP thread (which
/// registers them) and the watcher thread (which broadcasts).
pub struct ReloadHub<T: Transport> {
    connections: Mutex<Vec<T>>,
}

impl<T: Transport> Default for ReloadHub<T> {
    fn default() -> Self {
        Self {
            connections: Mutex::new(Vec::new()),
        }
    }
}

impl<T: Transport> ReloadHub<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, connection: T) {
        let mut connections = self.lock();
        connections.push(connection);
        debug!("Live-reload client connected ({} open)", connections.len());
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Send `reload` to every connection, dropping the ones that fail.
    /// Returns how many were reached.
    pub fn broadcast(&self) -> usize {
        let mut connections = self.lock();
        connections.retain_mut(|conn| match conn.send_reload() {
            Ok(()) => true,
            Err(e) => {
                debug!("Dropping live-reload client: {e}");
                false
            }
        });
        connections.len()
    }

    /// Close and forget every connection. Close errors are ignored.
    pub fn close_all(&self) {
        let mut connections = self.lock();
        for conn in connections.iter_mut() {
            let _ = conn.close();
        }
        connections.clear();
    }

    /// A poisoned lock only means another thread panicked mid-broadcast;
    /// the vector itself is still usable.
    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<T>> {
        self.connections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Insert [`RELOAD_SCRIPT`] before the last `</body>`, or append it when
/// the document has none.
pub fn inject_reload_script(html: &str) -> String {
    match html.rfind("</body>") {
        Some(pos) => format!("{}{RELOAD_SCRIPT}{}", &html[..pos], &html[pos..]),
        None => format!("{html}{RELOAD_SCRIPT}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;
    use tungstenite::protocol::Role;

    /// Records what was sent; fails every send once `broken` is set.
    #[derive(Clone, Default)]
    struct FakeTransport {
        sent: Arc<Mutex<Vec<&'static str>>>,
        broken: bool,
    }

    impl Transport for FakeTransport {
        fn send_reload(&mut self) -> Result<(), tungstenite::Error> {
            if self.broken {
                return Err(tungstenite::Error::ConnectionClosed);
            }
            self.sent.lock().unwrap().push("reload");
            Ok(())
        }

        fn close(&mut self) -> Result<(), tungstenite::Error> {
            self.sent.lock().unwrap().push("close");
            if self.broken {
                Err(tungstenite::Error::AlreadyClosed)
            } else {
                Ok(())
            }
        }
    }

    /// In-memory socket: reads nothing, keeps everything written.
    #[derive(Default)]
    struct MemoryStream {
        written: Vec<u8>,
    }

    impl Read for MemoryStream {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::ErrorKind::WouldBlock.into())
        }
    }

    impl Write for MemoryStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    // =========================================================================
    // ReloadHub
    // =========================================================================

    #[test]
    fn broadcast_reaches_every_connection() {
        let hub = ReloadHub::new();
        let a = FakeTransport::default();
        let b = FakeTransport::default();
        hub.register(a.clone());
        hub.register(b.clone());

        assert_eq!(hub.broadcast(), 2);
        assert_eq!(*a.sent.lock().unwrap(), vec!["reload"]);
        assert_eq!(*b.sent.lock().unwrap(), vec!["reload"]);
    }

    #[test]
    fn failed_send_drops_connection() {
        let hub = ReloadHub::new();
        let good = FakeTransport::default();
        hub.register(good.clone());
        hub.register(FakeTransport {
            broken: true,
            ..FakeTransport::default()
        });

        assert_eq!(hub.broadcast(), 1);
        assert_eq!(hub.len(), 1);
        hub.broadcast();
        assert_eq!(good.sent.lock().unwrap().len(), 2);
    }

    #[test]
    fn broadcast_with_no_clients() {
        let hub: ReloadHub<FakeTransport> = ReloadHub::new();
        assert_eq!(hub.broadcast(), 0);
        assert!(hub.is_empty());
    }

    #[test]
    fn close_all_ignores_errors_and_empties_hub() {
        let hub = ReloadHub::new();
        let good = FakeTransport::default();
        let broken = FakeTransport {
            broken: true,
            ..FakeTransport::default()
        };
        hub.register(good.clone());
        hub.register(broken.clone());

        hub.close_all();

        assert!(hub.is_empty());
        assert_eq!(*good.sent.lock().unwrap(), vec!["close"]);
        assert_eq!(*broken.sent.lock().unwrap(), vec!["close"]);
    }

    #[test]
    fn boxed_transports_share_a_hub() {
        let hub: ReloadHub<Box<dyn Transport>> = ReloadHub::new();
        let fake = FakeTransport::default();
        hub.register(Box::new(fake.clone()));
        assert_eq!(hub.broadcast(), 1);
        assert_eq!(fake.sent.lock().unwrap().len(), 1);
    }

    // =========================================================================
    // Websocket transport
    // =========================================================================

    #[test]
    fn websocket_sends_unmasked_text_frame() {
        let mut ws = WebSocket::from_raw_socket(MemoryStream::default(), Role::Server, None);
        ws.send_reload().unwrap();

        let mut expected = vec![0x81, 6];
        expected.extend_from_slice(b"reload");
        assert_eq!(ws.get_ref().written, expected);
    }

    #[test]
    fn websocket_close_writes_close_frame() {
        let mut ws = WebSocket::from_raw_socket(MemoryStream::default(), Role::Server, None);
        Transport::close(&mut ws).unwrap();
        assert_eq!(ws.get_ref().written.first(), Some(&0x88));
    }

    // =========================================================================
    // Script injection
    // =========================================================================

    #[test]
    fn script_goes_before_last_body_close() {
        let html = "<body>a</body><body>b</body></html>";
        let out = inject_reload_script(html);
        assert_eq!(
            out,
            format!("<body>a</body><body>b{RELOAD_SCRIPT}</body></html>")
        );
    }

    #[test]
    fn script_is_appended_without_body() {
        let out = inject_reload_script("<p>fragment</p>");
        assert!(out.starts_with("<p>fragment</p><script>"));
        assert!(out.ends_with("</script>\n"));
    }

    #[test]
    fn script_connects_to_ws_endpoint() {
        assert!(RELOAD_SCRIPT.contains("\"/ws\""));
        assert!(RELOAD_SCRIPT.contains("\"reload\""));
    }
}

//! Shared stop and teardown state
//!
//! The supervisor owns one [`Control`] for the life of the process and hands
//! it to both pipelines. It replaces a global socket handle: pipelines
//! deposit clones of their live sockets here, and [`Control::shutdown`] is
//! the single entry point the signal glue calls to close them and stop
//! everything.

use std::io;
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

/// Granularity of the interruptible sleep
const SLEEP_SLICE: Duration = Duration::from_millis(25);

#[derive(Default)]
struct LinkRegistry {
    listeners: Vec<TcpListener>,
    clients: Vec<TcpStream>,
}

/// Stop flags and socket registry shared by the supervisor and pipelines
#[derive(Default)]
pub struct Control {
    /// Process-level: set once by the signal glue, never cleared
    shutdown: AtomicBool,
    /// Run-level: set when the current supervised run is being torn down
    halt: AtomicBool,
    links: Mutex<LinkRegistry>,
}

impl Control {
    /// Create idle control state
    pub fn new() -> Self {
        Self::default()
    }

    /// Request process shutdown and tear down every registered socket.
    ///
    /// Intended to be called from signal-handling glue; safe from any thread.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.teardown();
    }

    /// Tear down the current run without requesting process shutdown
    pub(crate) fn halt_run(&self) {
        self.halt.store(true, Ordering::SeqCst);
        self.teardown();
    }

    /// Clear run-level state once a supervised run has fully stopped.
    ///
    /// Must only be called after both pipeline threads have been joined.
    pub(crate) fn reset_run(&self) {
        self.halt.store(false, Ordering::SeqCst);
        self.clear_links();
    }

    /// True once process shutdown has been requested
    pub fn shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// True while the current run should stop, for any reason
    pub fn stopping(&self) -> bool {
        self.shutting_down() || self.halt.load(Ordering::SeqCst)
    }

    /// Deposit a clone of a listening socket for teardown
    pub(crate) fn register_listener(&self, listener: &TcpListener) -> io::Result<()> {
        let clone = listener.try_clone()?;
        self.links
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .listeners
            .push(clone);
        // A stop may have swept the registry between the caller's last check
        // and this registration; sweep again so the handle cannot outlive it.
        if self.stopping() {
            self.teardown();
        }
        Ok(())
    }

    /// Deposit a clone of an accepted client socket for teardown
    pub(crate) fn register_client(&self, stream: &TcpStream) -> io::Result<()> {
        let clone = stream.try_clone()?;
        self.links
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clients
            .push(clone);
        if self.stopping() {
            self.teardown();
        }
        Ok(())
    }

    /// Sleep in small slices, bailing out early when stopping.
    ///
    /// Returns `false` if the sleep was cut short by a stop request.
    pub fn sleep(&self, total: Duration) -> bool {
        let deadline = Instant::now() + total;
        loop {
            if self.stopping() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
    }

    fn teardown(&self) {
        let mut links = self
            .links
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for client in links.clients.drain(..) {
            // Unblocks any thread stuck in a read on the other clone
            let _ = client.shutdown(Shutdown::Both);
        }
        let closed = links.listeners.len();
        links.listeners.clear();
        if closed > 0 {
            debug!("closed {closed} listening socket(s)");
        }
    }

    fn clear_links(&self) {
        let mut links = self
            .links
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        links.listeners.clear();
        links.clients.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    fn loopback_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (server, _) = listener.accept().unwrap();
        (client, server)
    }

    #[test]
    fn test_flags() {
        let control = Control::new();
        assert!(!control.stopping());
        assert!(!control.shutting_down());

        control.halt_run();
        assert!(control.stopping());
        assert!(!control.shutting_down());

        control.reset_run();
        assert!(!control.stopping());

        control.shutdown();
        assert!(control.stopping());
        assert!(control.shutting_down());
    }

    #[test]
    fn test_sleep_interrupted_by_stop() {
        let control = Control::new();
        control.halt_run();
        let start = Instant::now();
        assert!(!control.sleep(Duration::from_secs(5)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_sleep_completes_when_idle() {
        let control = Control::new();
        assert!(control.sleep(Duration::from_millis(30)));
    }

    #[test]
    fn test_shutdown_unblocks_registered_client() {
        let (mut reader_side, mut writer_side) = loopback_pair();
        let control = std::sync::Arc::new(Control::new());
        control.register_client(&reader_side).unwrap();

        let handle = std::thread::spawn(move || {
            let mut buf = [0u8; 16];
            // Blocks until the registered clone is shut down
            reader_side.read(&mut buf)
        });

        std::thread::sleep(Duration::from_millis(50));
        control.shutdown();

        let result = handle.join().unwrap();
        // Shutdown surfaces as EOF (Ok(0)) or a reset error; either way the
        // read is no longer blocked.
        match result {
            Ok(n) => assert_eq!(n, 0),
            Err(_) => {}
        }
        let _ = writer_side.write_all(b"x");
    }
}

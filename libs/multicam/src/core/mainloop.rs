//! Blocking run-loop primitive.
//!
//! Keeps the process alive while the engine executes the graph. `run()`
//! blocks the calling thread until some other party — the event
//! dispatcher, a signal handler — calls `quit()`. Termination is requested
//! by quitting the loop, never by tearing down bus watches, so in-flight
//! messages are not lost mid-shutdown.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

struct Inner {
    quit: Mutex<bool>,
    signal: Condvar,
}

/// Cloneable handle to one run loop. All clones share the same quit flag.
#[derive(Clone)]
pub struct MainLoop {
    inner: Arc<Inner>,
}

impl MainLoop {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                quit: Mutex::new(false),
                signal: Condvar::new(),
            }),
        }
    }

    /// Block until [`MainLoop::quit`] is called. Returns immediately if it
    /// already was.
    pub fn run(&self) {
        let mut quit = self.inner.quit.lock();
        while !*quit {
            self.inner.signal.wait(&mut quit);
        }
    }

    /// Request termination. Idempotent; callable from any thread.
    pub fn quit(&self) {
        let mut quit = self.inner.quit.lock();
        *quit = true;
        self.inner.signal.notify_all();
    }

    pub fn is_quit(&self) -> bool {
        *self.inner.quit.lock()
    }
}

impl Default for MainLoop {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_quit_unblocks_run() {
        let main_loop = MainLoop::new();
        let remote = main_loop.clone();
        let waiter = std::thread::spawn(move || main_loop.run());
        std::thread::sleep(Duration::from_millis(20));
        assert!(!remote.is_quit());
        remote.quit();
        waiter.join().unwrap();
        assert!(remote.is_quit());
    }

    #[test]
    fn test_run_after_quit_returns_immediately() {
        let main_loop = MainLoop::new();
        main_loop.quit();
        main_loop.quit();
        main_loop.run();
    }
}

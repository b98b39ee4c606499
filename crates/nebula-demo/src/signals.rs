#![forbid(unsafe_code)]

//! SIGINT/SIGTERM turn into a stop request; the frame loop then finishes
//! the frame in flight and exits normally, restoring the terminal.

use std::io;

use nebula_runtime::StopHandle;

#[cfg(unix)]
use signal_hook::consts::signal::{SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

/// Keeps the signal listener alive; closing it on drop joins the thread.
#[cfg(unix)]
#[derive(Debug)]
pub struct SignalGuard {
    handle: signal_hook::iterator::Handle,
    thread: Option<std::thread::JoinHandle<()>>,
}

#[cfg(unix)]
impl SignalGuard {
    pub fn install(stop: StopHandle) -> io::Result<Self> {
        let mut signals = Signals::new([SIGINT, SIGTERM])?;
        let handle = signals.handle();
        let thread = std::thread::Builder::new()
            .name("nebula-signals".into())
            .spawn(move || {
                for signal in signals.forever() {
                    tracing::warn!(signal, "termination signal, stopping after this frame");
                    stop.request_stop();
                }
            })?;
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

#[cfg(unix)]
impl Drop for SignalGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// No signal listener off Unix; Ctrl+C is read as a key in terminal mode.
#[cfg(not(unix))]
#[derive(Debug)]
pub struct SignalGuard;

#[cfg(not(unix))]
impl SignalGuard {
    pub fn install(_stop: StopHandle) -> io::Result<Self> {
        Ok(Self)
    }
}

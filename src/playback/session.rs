use std::fmt;

/// Identifies one playback chain. Captured when the chain starts and never
/// changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionToken(u64);

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The live-session counter plus its stopped flag.
///
/// A token is live iff it equals the latest issued token and that session
/// has not been stopped. Stopping is synchronous: once [`stop`](Self::stop)
/// returns, no check for the current token passes until a new session
/// begins.
#[derive(Debug, Default)]
pub struct SessionCounter {
    current: u64,
    stopped: bool,
}

impl SessionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate every earlier token and issue a fresh, live one.
    pub fn begin(&mut self) -> SessionToken {
        self.current += 1;
        self.stopped = false;
        SessionToken(self.current)
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_live(&self, token: SessionToken) -> bool {
        !self.stopped && token.0 == self.current
    }
}

//! Session state for a gateway connection
//!
//! A session tracks:
//! - Connection state (disconnected / connected / listening)
//! - Link generation (increments on every successful (re)connect)

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No socket
    Disconnected,

    /// Socket open, no listener running
    Connected,

    /// Socket open, background listener running
    Listening,
}

/// Session state machine
///
/// Thread-safe and can be cloned cheaply (Arc internally).
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    /// Number of links established so far
    generation: AtomicU32,

    /// Current session state
    state: parking_lot::RwLock<SessionState>,
}

impl Session {
    /// Create a new disconnected session
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionInner {
                generation: AtomicU32::new(0),
                state: parking_lot::RwLock::new(SessionState::Disconnected),
            }),
        }
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        *self.inner.state.read()
    }

    /// Check if a socket is open
    pub fn is_connected(&self) -> bool {
        !matches!(self.state(), SessionState::Disconnected)
    }

    /// Check if the listener is running
    pub fn is_listening(&self) -> bool {
        matches!(self.state(), SessionState::Listening)
    }

    /// Number of links established so far
    pub fn generation(&self) -> u32 {
        self.inner.generation.load(Ordering::Acquire)
    }

    /// Record a freshly established link
    ///
    /// Moves `Disconnected` to `Connected`. A reconnect while listening keeps
    /// the session in `Listening`. Returns the new link generation.
    pub fn link_established(&self) -> u32 {
        let mut state = self.inner.state.write();

        if *state == SessionState::Disconnected {
            *state = SessionState::Connected;
        }

        self.inner.generation.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
    }

    /// Mark the listener as started
    pub fn begin_listening(&self) -> Result<()> {
        let mut state = self.inner.state.write();

        if *state != SessionState::Connected {
            return Err(Error::InvalidSessionState(format!(
                "Cannot start listening from state: {:?}",
                *state
            )));
        }

        *state = SessionState::Listening;
        Ok(())
    }

    /// Mark the listener as stopped
    pub fn end_listening(&self) -> Result<()> {
        let mut state = self.inner.state.write();

        if *state != SessionState::Listening {
            return Err(Error::InvalidSessionState(format!(
                "Cannot stop listening from state: {:?}",
                *state
            )));
        }

        *state = SessionState::Connected;
        Ok(())
    }

    /// Socket closed outside of the listener
    ///
    /// A listening session stays `Listening`: the listener reopens the socket
    /// on its own.
    pub fn link_lost(&self) {
        let mut state = self.inner.state.write();

        if *state == SessionState::Connected {
            *state = SessionState::Disconnected;
        }
    }

    /// Close session
    pub fn close(&self) {
        *self.inner.state.write() = SessionState::Disconnected;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_new() {
        let session = Session::new();
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(session.generation(), 0);
        assert!(!session.is_connected());
        assert!(!session.is_listening());
    }

    #[test]
    fn test_session_lifecycle() {
        let session = Session::new();

        assert_eq!(session.link_established(), 1);
        assert_eq!(session.state(), SessionState::Connected);

        session.begin_listening().unwrap();
        assert!(session.is_listening());

        session.end_listening().unwrap();
        assert_eq!(session.state(), SessionState::Connected);

        session.close();
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_reconnect_while_listening_keeps_state() {
        let session = Session::new();
        session.link_established();
        session.begin_listening().unwrap();

        session.link_lost();
        assert_eq!(session.link_established(), 2);
        assert_eq!(session.state(), SessionState::Listening);
    }

    #[test]
    fn test_link_lost_when_connected() {
        let session = Session::new();
        session.link_established();

        session.link_lost();
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_invalid_state_transitions() {
        let session = Session::new();

        // Cannot listen without a socket
        assert!(session.begin_listening().is_err());
        assert!(session.end_listening().is_err());

        // Cannot start a second listener
        session.link_established();
        session.begin_listening().unwrap();
        assert!(session.begin_listening().is_err());
    }

    #[test]
    fn test_session_clone() {
        let session1 = Session::new();
        session1.link_established();

        let session2 = session1.clone();
        assert!(session2.is_connected());

        session1.begin_listening().unwrap();
        assert!(session2.is_listening());
    }
}

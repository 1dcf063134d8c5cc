//! Lifecycle state machine.

/// Process-wide lifecycle flag for one controller.
///
/// Guards against double-start and double-stop races; the run trio (server,
/// watcher, registry) only exists while the state is `Starting` or `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// `start()` was invoked.
    StartRequested,
    /// Startup finished successfully.
    Started,
    /// `stop()` was invoked or the kill switch fired.
    StopRequested,
    /// Teardown finished.
    Stopped,
}

impl ServerState {
    /// Total transition function. `None` means the event is a no-op in the
    /// current state (caller misuse is tolerated, never an error).
    pub fn next(self, event: LifecycleEvent) -> Option<ServerState> {
        use LifecycleEvent::*;
        use ServerState::*;

        match (self, event) {
            (ServerState::Stopped, StartRequested) => Some(Starting),
            (Starting, Started) => Some(Running),
            (Starting, StopRequested) | (Running, StopRequested) => Some(Stopping),
            (Stopping, LifecycleEvent::Stopped) | (Starting, LifecycleEvent::Stopped) => {
                Some(ServerState::Stopped)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LifecycleEvent::*;
    use super::ServerState::*;
    use super::{LifecycleEvent, ServerState};

    #[test]
    fn happy_path_cycle() {
        let state = ServerState::Stopped;
        let state = state.next(StartRequested).unwrap();
        assert_eq!(state, Starting);
        let state = state.next(Started).unwrap();
        assert_eq!(state, Running);
        let state = state.next(StopRequested).unwrap();
        assert_eq!(state, Stopping);
        let state = state.next(LifecycleEvent::Stopped).unwrap();
        assert_eq!(state, ServerState::Stopped);
    }

    #[test]
    fn double_start_is_rejected() {
        assert_eq!(Starting.next(StartRequested), None);
        assert_eq!(Running.next(StartRequested), None);
        assert_eq!(Stopping.next(StartRequested), None);
    }

    #[test]
    fn stop_from_starting_is_allowed() {
        assert_eq!(Starting.next(StopRequested), Some(Stopping));
    }

    #[test]
    fn stop_when_stopped_is_noop() {
        assert_eq!(ServerState::Stopped.next(StopRequested), None);
        assert_eq!(Stopping.next(StopRequested), None);
    }
}

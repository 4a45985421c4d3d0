/// Session controller state machine.
///
/// State transitions:
/// ```text
/// idle → discovering → awaiting_operator → capturing → stopping → stopped
///                             │                           ↑
///                             └──────── (abort) ──────────┘
/// ```
/// No state is revisited within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    Discovering,
    AwaitingOperator,
    Capturing,
    Stopping,
    Stopped,
}

impl SessionState {
    pub fn is_capturing(&self) -> bool {
        matches!(self, Self::Capturing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle, Discovering)
                | (Discovering, AwaitingOperator)
                | (Discovering, Stopping)
                | (AwaitingOperator, Capturing)
                | (AwaitingOperator, Stopping)
                | (Capturing, Stopping)
                | (Stopping, Stopped)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Discovering => "discovering",
            Self::AwaitingOperator => "awaiting_operator",
            Self::Capturing => "capturing",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_path_is_legal() {
        let path = [
            SessionState::Idle,
            SessionState::Discovering,
            SessionState::AwaitingOperator,
            SessionState::Capturing,
            SessionState::Stopping,
            SessionState::Stopped,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn states_are_never_revisited() {
        assert!(!SessionState::Capturing.can_transition_to(SessionState::AwaitingOperator));
        assert!(!SessionState::Stopped.can_transition_to(SessionState::Idle));
        assert!(!SessionState::Stopping.can_transition_to(SessionState::Capturing));
    }

    #[test]
    fn abort_and_fatal_paths_reach_stopping() {
        assert!(SessionState::AwaitingOperator.can_transition_to(SessionState::Stopping));
        assert!(SessionState::Discovering.can_transition_to(SessionState::Stopping));
        assert!(SessionState::Stopped.is_terminal());
    }

    #[test]
    fn only_capturing_is_capturing() {
        assert!(SessionState::Capturing.is_capturing());
        assert!(!SessionState::AwaitingOperator.is_capturing());
        assert!(!SessionState::Stopping.is_capturing());
    }
}

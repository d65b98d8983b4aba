use serde::{Deserialize, Serialize};

/// Lifecycle of a single fetch request, which never goes back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchState {
    Idle,
    Connecting,
    Transferring,
    Succeeded,
    Failed,
}

impl FetchState {
    pub fn can_advance_to(&self, next: FetchState) -> bool {
        use FetchState::*;

        matches!(
            (self, next),
            (Idle, Connecting)
                | (Connecting, Transferring)
                | (Connecting, Failed)
                | (Transferring, Succeeded)
                | (Transferring, Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchState::Succeeded | FetchState::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::FetchState::*;

    #[test]
    fn should_follow_forward_path() {
        assert!(Idle.can_advance_to(Connecting));
        assert!(Connecting.can_advance_to(Transferring));
        assert!(Transferring.can_advance_to(Succeeded));
        assert!(Transferring.can_advance_to(Failed));
        assert!(Connecting.can_advance_to(Failed));
    }

    #[test]
    fn should_not_go_back_or_skip() {
        assert!(!Idle.can_advance_to(Transferring));
        assert!(!Idle.can_advance_to(Succeeded));
        assert!(!Connecting.can_advance_to(Succeeded));
        assert!(!Transferring.can_advance_to(Connecting));
        assert!(!Transferring.can_advance_to(Transferring));

        for terminal in [Succeeded, Failed] {
            assert!(terminal.is_terminal());
            for next in [Idle, Connecting, Transferring, Succeeded, Failed] {
                assert!(!terminal.can_advance_to(next));
            }
        }
    }
}

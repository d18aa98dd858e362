//! Optimistic cancellation for build cycles.
//!
//! Every cycle mints a fresh [`CancellationToken`]. Asynchronous work captures
//! the token when it is dispatched and checks [`CancellationCoordinator::is_current`]
//! right before publishing; a mismatch means a newer cycle superseded it and the
//! result is dropped. In-flight work is never aborted.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Tokens are unique across every coordinator in the process.
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier of one build cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CancellationToken(u64);

impl CancellationToken {
    fn mint() -> Self {
        Self(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cycle-{:x}", self.0)
    }
}

/// Holds the current token for one logical build (the command list, the
/// filesystem search, ...).
#[derive(Debug)]
pub struct CancellationCoordinator {
    current: AtomicU64,
}

impl CancellationCoordinator {
    /// Start with a freshly minted token already current.
    pub fn new() -> Self {
        Self {
            current: AtomicU64::new(CancellationToken::mint().0),
        }
    }

    /// Mint a new token and make it current, superseding every earlier one.
    pub fn begin_cycle(&self) -> CancellationToken {
        let token = CancellationToken::mint();
        self.current.store(token.0, Ordering::SeqCst);
        token
    }

    pub fn current_token(&self) -> CancellationToken {
        CancellationToken(self.current.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, token: &CancellationToken) -> bool {
        self.current.load(Ordering::SeqCst) == token.0
    }
}

impl Default for CancellationCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn new_cycle_supersedes_previous_token() {
        let coordinator = CancellationCoordinator::new();
        let first = coordinator.begin_cycle();
        assert!(coordinator.is_current(&first));

        let second = coordinator.begin_cycle();
        assert_ne!(first, second);
        assert!(!coordinator.is_current(&first));
        assert!(coordinator.is_current(&second));
        assert_eq!(coordinator.current_token(), second);
    }

    #[test]
    fn tokens_are_unique_across_coordinators() {
        let builds = CancellationCoordinator::new();
        let files = CancellationCoordinator::new();
        let mut seen = HashSet::new();
        for _ in 0..100 {
            assert!(seen.insert(builds.begin_cycle()));
            assert!(seen.insert(files.begin_cycle()));
        }
        assert!(!builds.is_current(&files.current_token()));
    }

    #[test]
    fn tokens_render_as_strings() {
        let token = CancellationCoordinator::new().begin_cycle();
        assert!(token.to_string().starts_with("cycle-"));
    }
}

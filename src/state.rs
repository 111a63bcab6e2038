//! Logging settings shared by every [`Logger`](crate::Logger) built from the
//! same factory.
//!
//! The minimum severity stored here applies to all of those loggers at once:
//! calling `set_level` on any one of them changes what every other one emits.
//! Writes are last-writer-wins.

use crate::level::LogLevel;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

#[derive(Debug)]
pub struct SharedLogState {
    min_level: AtomicU8,
    capture_stacks: AtomicBool,
}

impl SharedLogState {
    pub fn new(min_level: LogLevel) -> Self {
        Self {
            min_level: AtomicU8::new(min_level.as_u8()),
            capture_stacks: AtomicBool::new(true),
        }
    }

    pub fn min_level(&self) -> LogLevel {
        LogLevel::from_ordinal(self.min_level.load(Ordering::Acquire))
    }

    pub fn set_min_level(&self, level: LogLevel) {
        self.min_level.store(level.as_u8(), Ordering::Release);
    }

    pub fn allows(&self, level: LogLevel) -> bool {
        level >= self.min_level()
    }

    /// Whether error records carry a captured call stack.
    pub fn capture_stacks(&self) -> bool {
        self.capture_stacks.load(Ordering::Acquire)
    }

    pub fn set_capture_stacks(&self, enabled: bool) {
        self.capture_stacks.store(enabled, Ordering::Release);
    }
}

impl Default for SharedLogState {
    fn default() -> Self {
        Self::new(LogLevel::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_default_state() {
        let state = SharedLogState::default();
        assert_eq!(state.min_level(), LogLevel::Info);
        assert!(state.capture_stacks());
        assert!(!state.allows(LogLevel::Debug));
        assert!(state.allows(LogLevel::Info));
        assert!(state.allows(LogLevel::Error));
    }

    #[test]
    fn test_set_min_level() {
        let state = SharedLogState::new(LogLevel::Error);
        assert!(!state.allows(LogLevel::Warning));

        state.set_min_level(LogLevel::Debug);
        assert_eq!(state.min_level(), LogLevel::Debug);
        assert!(state.allows(LogLevel::Debug));
    }

    #[test]
    fn test_concurrent_level_writes_leave_a_valid_level() {
        let state = Arc::new(SharedLogState::default());

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let state = state.clone();
                thread::spawn(move || {
                    state.set_min_level(LogLevel::from_ordinal((i % 4) as u8));
                    state.min_level()
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().is_ok());
        }

        assert!(LogLevel::ALL.contains(&state.min_level()));
    }
}

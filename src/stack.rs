use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;

/// Captures the current call stack regardless of `RUST_BACKTRACE`.
pub fn capture_stack() -> String {
    Backtrace::force_capture().to_string()
}

/// Displays an error followed by its `source()` chain, joined with `": "`.
pub struct ErrorChain<'a>(pub &'a (dyn Error + 'a));

impl fmt::Display for ErrorChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(err) = source {
            write!(f, ": {err}")?;
            source = err.source();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;

    #[derive(Error, Debug)]
    #[error("write batch failed")]
    struct Outer {
        #[source]
        source: std::io::Error,
    }

    #[test]
    fn test_error_chain_includes_sources() {
        let err = Outer {
            source: std::io::Error::other("disk full"),
        };
        assert_eq!(
            ErrorChain(&err).to_string(),
            "write batch failed: disk full"
        );
    }

    #[test]
    fn test_error_chain_without_source() {
        let err = std::io::Error::other("boom");
        assert_eq!(ErrorChain(&err).to_string(), "boom");
    }

    #[test]
    fn test_capture_stack_is_not_empty() {
        assert!(!capture_stack().trim().is_empty());
    }
}

//! Error type shared by the fallible setup paths (termios, signals, terminal I/O).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TuiError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to register handler for signal {signal}: {source}")]
    Signal {
        signal: i32,
        #[source]
        source: std::io::Error,
    },

    #[error("stdin is not a terminal")]
    NotATerminal,

    #[error("runtime is already running")]
    AlreadyRunning,
}

pub type Result<T> = std::result::Result<T, TuiError>;

#[cfg(test)]
mod tests {
    use super::TuiError;
    use std::io;

    #[test]
    fn io_errors_convert_with_question_mark() {
        fn fails() -> super::Result<()> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))?;
            Ok(())
        }

        let err = fails().expect_err("expected io error");
        assert!(matches!(err, TuiError::Io(_)));
        assert!(err.to_string().starts_with("terminal I/O failed"));
    }

    #[test]
    fn signal_error_names_the_signal() {
        let err = TuiError::Signal {
            signal: 28,
            source: io::Error::from(io::ErrorKind::Other),
        };
        assert!(err.to_string().contains("signal 28"));
    }
}

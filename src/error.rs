/// Input/output failure or invalid usage (bad flags, unwritable output).
pub const EXIT_IO: u8 = 2;
/// Nothing usable was loaded, so there is nothing to generate.
pub const EXIT_NO_DATA: u8 = 3;
/// A diagnostic gate failed (checksum `--strict`, SQL verification).
pub const EXIT_CHECK_FAILED: u8 = 4;

/// Failure carrying the process exit code it should map to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_message_and_keeps_exit_code() {
        let err = AppError::new(EXIT_NO_DATA, "nothing loaded");
        assert_eq!(err.to_string(), "nothing loaded");
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.message(), "nothing loaded");
        assert!(format!("{err:?}").contains("exit_code: 3"));
    }
}

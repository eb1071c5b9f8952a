use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("MoonsecDeobfuscator not found at: {}", .path.display())]
    DependencyMissing { path: PathBuf },

    #[error("Failed to build Moonsec tool")]
    BuildFailure { stderr: String },

    #[error("Moonsec executable not found. Try building first.")]
    ExecutableNotFound,

    #[error("Deobfuscation failed: {0}")]
    ToolExecution(String),

    #[error("Process timed out after {secs} seconds")]
    Timeout { secs: f64 },

    #[error("Output file was not created")]
    OutputMissing,

    #[error("Processing error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the caller sent a bad request rather than the tool failing.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Error for a request without a `content` field.
    pub fn missing_content() -> Self {
        Error::Validation("No content provided".to_string())
    }

    /// Error for a nonzero tool exit. Empty stderr reads as "Unknown error".
    pub fn tool_failed(stderr: &str) -> Self {
        let trimmed = stderr.trim();
        if trimmed.is_empty() {
            Error::ToolExecution("Unknown error".to_string())
        } else {
            Error::ToolExecution(trimmed.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(Error::missing_content().to_string(), "No content provided");
        assert_eq!(
            Error::DependencyMissing {
                path: PathBuf::from("MoonsecDeobfuscator-master")
            }
            .to_string(),
            "MoonsecDeobfuscator not found at: MoonsecDeobfuscator-master"
        );
        assert_eq!(
            Error::Timeout { secs: 30.0 }.to_string(),
            "Process timed out after 30 seconds"
        );
        assert_eq!(Error::OutputMissing.to_string(), "Output file was not created");
    }

    #[test]
    fn test_tool_failed_uses_stderr() {
        let err = Error::tool_failed("  bad header\n");
        assert_eq!(err.to_string(), "Deobfuscation failed: bad header");

        let err = Error::tool_failed("");
        assert_eq!(err.to_string(), "Deobfuscation failed: Unknown error");
    }

    #[test]
    fn test_only_validation_is_client_error() {
        assert!(Error::missing_content().is_client_error());
        assert!(!Error::ExecutableNotFound.is_client_error());
        assert!(!Error::Timeout { secs: 0.5 }.is_client_error());
        assert!(!Error::BuildFailure {
            stderr: String::new()
        }
        .is_client_error());
    }
}

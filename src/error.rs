/// Process-level error with a stable exit code.
///
/// The code doubles as the error class: `2` for configuration problems
/// (surfaced before any work starts), `3` for inputs too sparse to scan or
/// fit, `4` for internal/numeric failures. Per-lag and per-fit pathologies
/// are NOT errors — they degrade to sentinel records and fallback fits.
#[derive(Clone)]
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

    /// Invalid configuration (bad lag range, bin count, percentile, ...).
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    /// Input data too sparse to produce any result.
    pub fn insufficient(message: impl Into<String>) -> Self {
        Self::new(3, message)
    }

    /// Internal or numeric failure.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(4, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

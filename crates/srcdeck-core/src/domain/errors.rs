use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SourceResult<T> = Result<T, SourceError>;

/// Failure class of a deck-generation run; each maps to one process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceErrorCategory {
    ConfigurationError,
    ValidationError,
    UnsupportedTarget,
    IoSystemError,
    InternalError,
}

impl SourceErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::ConfigurationError => 2,
            Self::ValidationError => 3,
            Self::UnsupportedTarget => 4,
            Self::IoSystemError => 5,
            Self::InternalError => 6,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigurationError => "ConfigurationError",
            Self::ValidationError => "ValidationError",
            Self::UnsupportedTarget => "UnsupportedTarget",
            Self::IoSystemError => "IoSystemError",
            Self::InternalError => "InternalError",
        }
    }
}

/// Error carrying a category and a stable dotted placeholder such as
/// `CONFIG.MISSING_VARIABLE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    category: SourceErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl SourceError {
    pub fn new(
        category: SourceErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn configuration(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SourceErrorCategory::ConfigurationError, placeholder, message)
    }

    pub fn validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SourceErrorCategory::ValidationError, placeholder, message)
    }

    pub fn unsupported_target(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SourceErrorCategory::UnsupportedTarget, placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SourceErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SourceErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> SourceErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.as_str(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for SourceError {}

#[cfg(test)]
mod tests {
    use super::{SourceError, SourceErrorCategory};

    #[test]
    fn exit_codes_are_stable() {
        let cases = [
            (SourceErrorCategory::ConfigurationError, 2),
            (SourceErrorCategory::ValidationError, 3),
            (SourceErrorCategory::UnsupportedTarget, 4),
            (SourceErrorCategory::IoSystemError, 5),
            (SourceErrorCategory::InternalError, 6),
        ];
        for (category, exit_code) in cases {
            assert_eq!(category.exit_code(), exit_code, "{}", category.as_str());
        }
    }

    #[test]
    fn error_renders_diagnostic_lines() {
        let error = SourceError::configuration(
            "CONFIG.MISSING_VARIABLE",
            "required variable 'beamXWidth' is not defined",
        );

        assert_eq!(error.exit_code(), 2);
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [CONFIG.MISSING_VARIABLE] required variable 'beamXWidth' is not defined"
        );
        assert_eq!(error.fatal_exit_line(), "FATAL EXIT CODE: 2");
        assert_eq!(
            error.to_string(),
            "ConfigurationError [CONFIG.MISSING_VARIABLE] required variable 'beamXWidth' is not defined"
        );
    }
}

use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RegressResult<T> = Result<T, RegressError>;
pub type RunResult<T> = RegressResult<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegressErrorCategory {
    Success,
    ToleranceViolation,
    InputValidationError,
    IoSystemError,
    EnvironmentError,
    ParseError,
    ShapeError,
    InternalError,
}

impl RegressErrorCategory {
    pub const fn exit_profile(self) -> ExitProfile {
        match self {
            Self::Success => ExitProfile {
                exit_code: 0,
                rust_category: "Success",
                class: "SUCCESS",
            },
            Self::ToleranceViolation => ExitProfile {
                exit_code: 1,
                rust_category: "ToleranceViolation",
                class: "REGRESSION",
            },
            Self::InputValidationError => ExitProfile {
                exit_code: 2,
                rust_category: "InputValidationError",
                class: "INPUT_FATAL",
            },
            Self::IoSystemError => ExitProfile {
                exit_code: 3,
                rust_category: "IoSystemError",
                class: "IO_FATAL",
            },
            Self::EnvironmentError => ExitProfile {
                exit_code: 4,
                rust_category: "EnvironmentError",
                class: "ENV_FATAL",
            },
            Self::ParseError => ExitProfile {
                exit_code: 5,
                rust_category: "ParseError",
                class: "PARSE_FATAL",
            },
            Self::ShapeError => ExitProfile {
                exit_code: 6,
                rust_category: "ShapeError",
                class: "SHAPE_FATAL",
            },
            Self::InternalError => ExitProfile {
                exit_code: 7,
                rust_category: "InternalError",
                class: "SYS_FATAL",
            },
        }
    }

    pub const fn exit_code(self) -> i32 {
        self.exit_profile().exit_code
    }

    pub const fn rust_category(self) -> &'static str {
        self.exit_profile().rust_category
    }

    pub const fn class(self) -> &'static str {
        self.exit_profile().class
    }

    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::Success)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitProfile {
    pub exit_code: i32,
    pub rust_category: &'static str,
    pub class: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegressError {
    category: RegressErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl RegressError {
    pub fn new(
        category: RegressErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn tolerance_violation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(RegressErrorCategory::ToleranceViolation, placeholder, message)
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(
            RegressErrorCategory::InputValidationError,
            placeholder,
            message,
        )
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(RegressErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn environment(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(RegressErrorCategory::EnvironmentError, placeholder, message)
    }

    pub fn parse(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(RegressErrorCategory::ParseError, placeholder, message)
    }

    pub fn shape(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(RegressErrorCategory::ShapeError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(RegressErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> RegressErrorCategory {
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
        let severity = if self.category.is_fatal() {
            "ERROR"
        } else {
            "INFO"
        };
        format!("{}: [{}] {}", severity, self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> Option<String> {
        self.category
            .is_fatal()
            .then(|| format!("FATAL EXIT CODE: {}", self.exit_code()))
    }
}

impl Display for RegressError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.rust_category(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for RegressError {}

use thiserror::Error;

/// Result type alias using PatchError
pub type Result<T> = std::result::Result<T, PatchError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every engine failure falls into one of these kinds. Each kind maps to a
/// stable error code that callers can match on, log, or surface to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Shape
    /// A value contains a construct the canonicalizer cannot represent
    UnsupportedKind,
    /// A patch tree could not be turned back into the requested type
    Rehydrate,

    // Policy
    /// A policy rule pattern is malformed (empty, or empty segments)
    InvalidPolicyRule,

    // Caller-side
    /// A caller-supplied model conversion failed before diffing
    Conversion,

    // Integration
    Serialization,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::UnsupportedKind => "ERR_UNSUPPORTED_KIND",
            ExErrorKind::Rehydrate => "ERR_REHYDRATE",
            ExErrorKind::InvalidPolicyRule => "ERR_INVALID_POLICY_RULE",
            ExErrorKind::Conversion => "ERR_CONVERSION",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification used for programmatic handling plus the
/// structural path and operation that produced it.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    path: Option<String>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            path: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add structural path context
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the structural path context, if any
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for patch computation
///
/// Any of these aborts the computation: there is no partial patch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatchError {
    // ===== Shape Errors =====
    /// The canonicalizer met a construct it cannot represent
    #[error("Unsupported value kind at '{path}': {kind}")]
    UnsupportedKind { path: String, kind: String },

    /// The patch tree does not fit the requested output type
    #[error("Cannot rehydrate patch: {message}")]
    Rehydrate { message: String },

    // ===== Policy Errors =====
    /// A rule pattern is malformed
    #[error("Invalid {rule} rule '{pattern}': {reason}")]
    InvalidRule {
        rule: String,
        pattern: String,
        reason: String,
    },

    // ===== Caller Errors =====
    /// The caller's model conversion failed
    #[error("Model conversion failed: {message}")]
    Conversion { message: String },

    /// Serialization failure outside the canonicalizer
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

/// Conversion from PatchError to ExError
impl From<PatchError> for ExError {
    fn from(err: PatchError) -> Self {
        match err {
            PatchError::UnsupportedKind { path, kind } => {
                ExError::new(ExErrorKind::UnsupportedKind)
                    .with_path(path)
                    .with_op("canonicalize")
                    .with_message(format!("Unsupported value kind: {}", kind))
            }

            PatchError::Rehydrate { message } => ExError::new(ExErrorKind::Rehydrate)
                .with_op("rehydrate")
                .with_message(message),

            PatchError::InvalidRule {
                rule,
                pattern,
                reason,
            } => ExError::new(ExErrorKind::InvalidPolicyRule)
                .with_op("build_policy")
                .with_message(format!("Invalid {} rule '{}': {}", rule, pattern, reason)),

            PatchError::Conversion { message } => {
                ExError::new(ExErrorKind::Conversion).with_message(message)
            }

            PatchError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to PatchError
impl From<serde_json::Error> for PatchError {
    fn from(err: serde_json::Error) -> Self {
        PatchError::Serialization {
            message: err.to_string(),
        }
    }
}

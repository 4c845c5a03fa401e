//! Error types for config loading and validation.

use std::path::PathBuf;

use thiserror::Error;

/// Error codes for config validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Identity errors (E001-E003)
    /// E001: Invalid asset id format
    InvalidAssetId,
    /// E002: Asset id used twice within one collection
    DuplicateAssetId,
    /// E003: Source scene file does not exist
    SourceSceneMissing,

    // Size and layout errors (E004-E005)
    /// E004: Texture or sprite size is zero or too large
    InvalidSize,
    /// E005: Sheet width must be at least one tile
    InvalidSheetWidth,

    // Frame range errors (E006-E008)
    /// E006: Frame step must be positive
    InvalidFrameStep,
    /// E007: Frame range produces no frames
    EmptyFrameRange,
    /// E008: Frame span is not a multiple of the frame step
    FrameStepMismatch,

    // Reference list errors (E009-E015)
    /// E009: Sprite config lists no objects
    NoObjects,
    /// E010: Scene config lists no actions
    NoActions,
    /// E011: The same action is listed twice
    DuplicateActionName,
    /// E012: Camera ortho scale must be finite and positive
    InvalidOrthoScale,
    /// E013: A required name is empty
    EmptyName,
    /// E014: Bake step must be positive
    InvalidBakeStep,
    /// E015: Sprite sheet edge exceeds the maximum sheet size
    SheetTooLarge,

    // Manifest errors (E020-E021)
    /// E020: Manifest declares no collections
    NoCollections,
    /// E021: Two collections share a name
    DuplicateCollection,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::InvalidAssetId => "E001",
            ErrorCode::DuplicateAssetId => "E002",
            ErrorCode::SourceSceneMissing => "E003",
            ErrorCode::InvalidSize => "E004",
            ErrorCode::InvalidSheetWidth => "E005",
            ErrorCode::InvalidFrameStep => "E006",
            ErrorCode::EmptyFrameRange => "E007",
            ErrorCode::FrameStepMismatch => "E008",
            ErrorCode::NoObjects => "E009",
            ErrorCode::NoActions => "E010",
            ErrorCode::DuplicateActionName => "E011",
            ErrorCode::InvalidOrthoScale => "E012",
            ErrorCode::EmptyName => "E013",
            ErrorCode::InvalidBakeStep => "E014",
            ErrorCode::SheetTooLarge => "E015",
            ErrorCode::NoCollections => "E020",
            ErrorCode::DuplicateCollection => "E021",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Warning codes for config validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    /// W001: Texture size is not a power of two
    NonPowerOfTwoSize,
    /// W002: Collection lists no asset documents
    EmptyCollection,
    /// W003: Sprite object has no action and renders as a still
    StaticSpriteObject,
}

impl WarningCode {
    /// Returns the warning code string (e.g., "W001").
    pub fn code(&self) -> &'static str {
        match self {
            WarningCode::NonPowerOfTwoSize => "W001",
            WarningCode::EmptyCollection => "W002",
            WarningCode::StaticSpriteObject => "W003",
        }
    }
}

impl std::fmt::Display for WarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A validation error with code, message, and optional JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// JSON path to the problematic field (e.g., "object_configs\[0\].object_name").
    pub path: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Creates a new validation error with a JSON path.
    pub fn with_path(code: ErrorCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// A validation warning with code, message, and optional JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The warning code.
    pub code: WarningCode,
    /// Human-readable warning message.
    pub message: String,
    /// JSON path to the problematic field.
    pub path: Option<String>,
}

impl ValidationWarning {
    /// Creates a new validation warning.
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Creates a new validation warning with a JSON path.
    pub fn with_path(
        code: WarningCode,
        message: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

/// Result of config validation.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether validation passed (no errors).
    pub ok: bool,
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of validation warnings.
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Creates a successful validation result.
    pub fn success() -> Self {
        Self {
            ok: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Adds an error to the result.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
        self.ok = false;
    }

    /// Adds a warning to the result.
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Moves every error and warning of `other` into this result.
    pub fn merge(&mut self, other: ValidationResult) {
        for error in other.errors {
            self.add_error(error);
        }
        self.warnings.extend(other.warnings);
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// Converts to a Result, returning Err if there are errors.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, Vec<ValidationError>> {
        if self.ok {
            Ok(self.warnings)
        } else {
            Err(self.errors)
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::success()
    }
}

/// Errors raised while loading config documents.
///
/// Every variant is fatal for the run: configs are loaded and validated
/// eagerly, before any engine call is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A document could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document is malformed: missing field, unknown variant tag, or type mismatch.
    #[error("schema error in {path}: {source}")]
    Schema {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A document parsed but failed semantic validation.
    #[error("{path} failed validation with {} error(s)", errors.len())]
    Invalid {
        path: PathBuf,
        errors: Vec<ValidationError>,
    },

    /// Several documents of one manifest failed validation.
    #[error("{} config document(s) failed validation", .0.len())]
    Multiple(Vec<ConfigError>),
}

impl ConfigError {
    /// Path of the document the error belongs to, if it belongs to one.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            ConfigError::Io { path, .. }
            | ConfigError::Schema { path, .. }
            | ConfigError::Invalid { path, .. } => Some(path),
            ConfigError::Multiple(_) => None,
        }
    }

    /// Flattens the error into `(document, validation error)` pairs.
    ///
    /// Io and schema errors have no validation errors and yield nothing.
    pub fn validation_errors(&self) -> Vec<(&std::path::Path, &ValidationError)> {
        match self {
            ConfigError::Invalid { path, errors } => {
                errors.iter().map(|e| (path.as_path(), e)).collect()
            }
            ConfigError::Multiple(inner) => {
                inner.iter().flat_map(|e| e.validation_errors()).collect()
            }
            _ => Vec::new(),
        }
    }
}

impl BackendError for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "CONFIG_001",
            ConfigError::Schema { .. } => "CONFIG_002",
            ConfigError::Invalid { .. } => "CONFIG_003",
            ConfigError::Multiple(_) => "CONFIG_004",
        }
    }

    fn category(&self) -> &'static str {
        "config"
    }
}

/// Common trait for pipeline errors.
///
/// Each error type of the workspace implements this trait so that failures
/// can be reported with a stable code and a category regardless of which
/// stage produced them.
pub trait BackendError: std::error::Error {
    /// Stable error code, e.g. "CONFIG_002" or "ENGINE_004".
    fn code(&self) -> &'static str;

    /// Human-readable message; defaults to the `Display` output.
    fn message(&self) -> String {
        self.to_string()
    }

    /// Error category, e.g. "config", "texture", "engine", "pipeline".
    fn category(&self) -> &'static str;
}

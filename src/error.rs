//! Error types for genmap.
//!
//! A single error enum covers palette parsing, colormap registration,
//! preset lookup and map rendering.

use thiserror::Error;

/// The main error type for genmap operations.
#[derive(Error, Debug)]
pub enum GenMapError {
    /// A palette source could not be parsed or violates an invariant
    #[error("Malformed palette{}: {message}", line.map(|l| format!(" (line {})", l)).unwrap_or_default())]
    MalformedPalette {
        line: Option<usize>,
        message: String,
    },

    /// A colormap name is already taken by a different definition
    #[error("Colormap already registered with a different definition: {name}")]
    DuplicateName { name: String },

    /// Colormap lookup failed
    #[error("Unknown colormap: {name}")]
    UnknownColormap { name: String },

    /// Field identifier outside the preset table
    #[error("Unknown field: {field}")]
    UnknownField { field: String },

    /// Invalid parameter errors
    #[error("Invalid parameter: {param} - {message}")]
    InvalidParameter { param: String, message: String },

    /// Image generation errors
    #[error("Image generation error: {message}")]
    ImageGeneration { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image encoding errors
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl GenMapError {
    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        GenMapError::MalformedPalette {
            line: Some(line),
            message: message.into(),
        }
    }

    pub(crate) fn invalid(param: &str, message: impl Into<String>) -> Self {
        GenMapError::InvalidParameter {
            param: param.to_string(),
            message: message.into(),
        }
    }

    /// Short stable name of the variant, used as a log field
    pub fn kind(&self) -> &'static str {
        match self {
            GenMapError::MalformedPalette { .. } => "malformed_palette",
            GenMapError::DuplicateName { .. } => "duplicate_name",
            GenMapError::UnknownColormap { .. } => "unknown_colormap",
            GenMapError::UnknownField { .. } => "unknown_field",
            GenMapError::InvalidParameter { .. } => "invalid_parameter",
            GenMapError::ImageGeneration { .. } => "image_generation",
            GenMapError::Config { .. } => "config",
            GenMapError::Io(_) => "io",
            GenMapError::Json(_) => "json",
            GenMapError::Image(_) => "image",
        }
    }
}

/// Convenience type alias for Results with GenMapError
pub type Result<T> = std::result::Result<T, GenMapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_palette_display() {
        let err = GenMapError::malformed(3, "expected 4, 5 or 8 fields");
        assert_eq!(
            err.to_string(),
            "Malformed palette (line 3): expected 4, 5 or 8 fields"
        );

        let err = GenMapError::MalformedPalette {
            line: None,
            message: "no control points".to_string(),
        };
        assert_eq!(err.to_string(), "Malformed palette: no control points");
    }
}

//! Error types for programmer errors.
//!
//! Numeric edge cases (degenerate radii, parallel planes, recursion overflow)
//! never surface here; they stay in normal control flow. These errors cover
//! malformed input handed to constructors and broken configuration files.

/// Malformed mesh data handed to a selector constructor.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    /// Index list length is not a multiple of three.
    #[error("mesh buffer {buffer}: {count} indices do not form whole triangles")]
    IndexCountNotTriangles { buffer: usize, count: usize },

    /// An index points past the vertex list.
    #[error("mesh buffer {buffer}: index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        buffer: usize,
        index: u32,
        vertex_count: usize,
    },
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// A value parsed but is unusable.
    #[error("Invalid setting: {0}")]
    Invalid(String),
}

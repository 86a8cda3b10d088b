// error.rs
//
// This file defines the ElfError type shared by the parser and the builder.
// Parsing errors reject the input outright; builder errors signal a misuse
// of the builder by whatever is feeding it sections and symbols.

use thiserror::Error;

/// Errors raised while decoding or generating an object file.
#[derive(Debug, Error)]
pub enum ElfError {
    /// The bytes do not describe a well-formed object file (bad magic,
    /// unrecognized class/encoding/version, inconsistent table geometry).
    #[error("format error: {0}")]
    Format(String),

    /// A byte range computed from header fields falls outside the buffer.
    #[error("range {offset:#x}+{len} is outside a buffer of {size} bytes")]
    OutOfRange { offset: usize, len: usize, size: usize },

    /// A table index points past the end of its table.
    #[error("{what} index {index} is out of range (table has {count} entries)")]
    BadIndex { what: &'static str, index: usize, count: usize },

    /// The builder was configured with values it cannot emit.
    #[error("builder configuration error: {0}")]
    BuilderConfig(String),

    /// The builder was asked to resolve something that was never registered.
    #[error("builder state error: {0}")]
    BuilderState(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("formatting: {0}")]
    Fmt(#[from] std::fmt::Error),
}

impl ElfError {
    pub fn format(message: impl Into<String>) -> Self {
        ElfError::Format(message.into())
    }

    pub fn builder_state(message: impl Into<String>) -> Self {
        ElfError::BuilderState(message.into())
    }

    /// True for every error that means "the input file was rejected".
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            ElfError::Format(_) | ElfError::OutOfRange { .. } | ElfError::BadIndex { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ElfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ElfError::OutOfRange { offset: 0x10, len: 4, size: 3 };
        assert_eq!(format!("{err}"), "range 0x10+4 is outside a buffer of 3 bytes");

        let err = ElfError::BadIndex { what: "section", index: 9, count: 4 };
        assert_eq!(
            format!("{err}"),
            "section index 9 is out of range (table has 4 entries)"
        );
    }

    #[test]
    fn test_format_classification() {
        assert!(ElfError::format("bad magic").is_format());
        assert!(ElfError::OutOfRange { offset: 0, len: 1, size: 0 }.is_format());
        assert!(!ElfError::builder_state("missing symbol").is_format());
        assert!(!ElfError::BuilderConfig("class".into()).is_format());
    }
}

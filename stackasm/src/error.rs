use thiserror::Error;

/// Every error names the 1-based source line it originates from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AsmError {
    #[error("line {line}: {message}")]
    Parse { line: u32, message: String },

    #[error("line {line}: duplicate label `{name}` (first declared at line {first_line})")]
    DuplicateLabel {
        name: String,
        line: u32,
        first_line: u32,
    },

    #[error("line {line}: variable slot {slot} already named at line {first_line}")]
    DuplicateVar {
        slot: u16,
        line: u32,
        first_line: u32,
    },

    #[error("line {line}: undefined label `{name}`")]
    UndefinedLabel { name: String, line: u32 },
}

impl AsmError {
    pub fn parse(line: u32, message: impl Into<String>) -> Self {
        AsmError::Parse {
            line,
            message: message.into(),
        }
    }
}

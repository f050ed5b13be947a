use thiserror::Error;

/// Problems with a directive occurrence, reported against its source line
/// by the host.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectiveError {
    #[error("unknown option '{option}' for directive '{directive}'")]
    UnknownOption { directive: String, option: String },

    #[error("option '{option}' given more than once")]
    DuplicateOption { option: String },

    #[error("option '{option}' is a flag and takes no value")]
    UnexpectedValue { option: String },

    #[error("option '{option}' requires a value")]
    MissingValue { option: String },

    #[error("option '{option}' expects a non-negative integer, got '{value}'")]
    InvalidInteger { option: String, value: String },

    #[error("invalid line number spec '{spec}'")]
    InvalidLineSpec { spec: String },

    #[error("line number spec '{spec}' is out of range (1-{total})")]
    LineSpecOutOfRange { spec: String, total: usize },

    #[error("directive '{directive}' does not take an argument")]
    UnexpectedArgument { directive: String },
}

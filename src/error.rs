use thiserror::Error;

#[derive(Error, Debug)]
pub enum UnflattenError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output directory already exists: {path}")]
    OutputAlreadyExists { path: String },

    #[error("Input file not found: {path}")]
    InputNotFound { path: String },

    #[error("Input file is not valid UTF-8 text: {path}")]
    InputNotUtf8 { path: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },

    #[error("Path resolves outside the output directory: {path}")]
    UnsafePath { path: String },

    #[error("Destination already written by an earlier block: {path}")]
    DuplicatePath { path: String },

    #[error("Failed to build block pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for UnflattenError {
    fn user_message(&self) -> String {
        match self {
            UnflattenError::OutputAlreadyExists { path } => {
                format!("Output directory '{}' already exists.", path)
            }
            UnflattenError::InputNotFound { path } => {
                format!("Input file '{}' not found.", path)
            }
            UnflattenError::InputNotUtf8 { path } => {
                format!("Input file '{}' could not be decoded as UTF-8 text.", path)
            }
            UnflattenError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            UnflattenError::InvalidPath { path } => {
                format!("Invalid file path: {}", path)
            }
            UnflattenError::UnsafePath { path } => {
                format!("Refusing to write outside the output directory: {}", path)
            }
            UnflattenError::DuplicatePath { path } => {
                format!("Duplicate destination path: {}", path)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            UnflattenError::OutputAlreadyExists { .. } => Some(
                "Please remove it or choose a different name to avoid overwriting data.".to_string()
            ),
            UnflattenError::InputNotFound { .. } => Some(
                "Check the input path. Note that the output directory has already been created and was left in place.".to_string()
            ),
            UnflattenError::InputNotUtf8 { .. } => Some(
                "Re-save the combined file as UTF-8; binary content is not supported.".to_string()
            ),
            UnflattenError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all values are valid.".to_string()
            ),
            UnflattenError::UnsafePath { .. } => Some(
                "Fix the path in the combined file, or run without --strict-paths to accept it.".to_string()
            ),
            UnflattenError::DuplicatePath { .. } => Some(
                "Rename one of the blocks, or use --on-duplicate overwrite to keep the last one.".to_string()
            ),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, UnflattenError>;

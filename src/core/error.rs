use thiserror::Error;

#[derive(Error, Debug)]
pub enum SwitcherError {
    #[error("Game client error: {0}")]
    Adapter(String),

    #[error("Game context is closed")]
    GameContextClosed,

    #[error("Game context step panicked")]
    GameStepPanicked,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SwitcherError>;

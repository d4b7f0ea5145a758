use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("configuration root is not a mapping")]
    NotAMapping,
}

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("fork failed: {0}")]
    Fork(nix::Error),
    #[error("could not start a new session")]
    Session,
    #[error("waiting for the detaching child failed: {0}")]
    Wait(nix::Error),
    #[error("detaching child ended abnormally: {0}")]
    Detach(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{name}: command is empty")]
    EmptyCommand { name: String },
    #[error("{0:?} is not a directory")]
    NotADirectory(PathBuf),
    #[error("item {name:?} was not produced by provider {provider}")]
    ForeignItem { name: String, provider: &'static str },
    #[error("no provider registered for item {0:?}")]
    UnknownProvider(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExecError {
    #[error("unterminated {0} quote")]
    UnterminatedQuote(char),
    #[error("no character after trailing backslash")]
    TrailingEscape,
}

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML serialization error: {0}")]
    #[diagnostic(
        code(packyard_config::toml_serialize),
        help("Check your configuration structure for invalid values")
    )]
    TomlSerError(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(packyard_config::toml_deserialize),
        help("Check your config.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Failed to parse TOML: {0}")]
    #[diagnostic(code(packyard_config::toml))]
    Toml(#[from] toml_edit::TomlError),

    #[error("`{field}` must contain the `{placeholder}` placeholder")]
    #[diagnostic(
        code(packyard_config::invalid_template),
        help("Composer clients substitute the placeholder, e.g. \"/p/%package%$%hash%.json\"")
    )]
    InvalidTemplate {
        field: &'static str,
        placeholder: &'static str,
    },

    #[error("Invalid duration: {0}")]
    #[diagnostic(
        code(packyard_config::invalid_duration),
        help("Use a combination of days, hours, minutes and seconds, e.g. \"1h\" or \"1d12h\"")
    )]
    InvalidDuration(String),

    #[error("Mail sender address is empty")]
    #[diagnostic(
        code(packyard_config::empty_mail_from),
        help("Set `mail.from` or remove the `[mail]` table")
    )]
    EmptyMailFrom,

    #[error("Encountered unexpected TOML item: {0}")]
    #[diagnostic(code(packyard_config::unexpected_toml_item))]
    UnexpectedTomlItem(String),

    #[error("IO error: {0}")]
    #[diagnostic(code(packyard_config::io))]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

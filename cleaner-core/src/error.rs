use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),
    #[error("consul server discovery unavailable: {0}")]
    DiscoveryUnavailable(String),
    #[error("{operation}{} failed: {source:#}", fmt_target(.target))]
    AdministrativeCall {
        operation: &'static str,
        target: Option<String>,
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    pub fn admin_call(operation: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Error::AdministrativeCall {
            operation,
            target: None,
            source: source.into(),
        }
    }

    pub fn admin_call_on(operation: &'static str, target: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Error::AdministrativeCall {
            operation,
            target: Some(target.into()),
            source: source.into(),
        }
    }
}

fn fmt_target(target: &Option<String>) -> String {
    match target {
        None => String::new(),
        Some(target) => format!(" {target}"),
    }
}

impl From<config::ConfigError> for Error {
    fn from(value: config::ConfigError) -> Self {
        Error::Config(value.to_string())
    }
}

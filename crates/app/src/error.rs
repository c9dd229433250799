use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("api error: {0}")]
    Client(#[from] client::ClientError),
    #[error("filter error: {0}")]
    Filter(#[from] engine::FilterError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("render error: {0}")]
    Render(#[from] std::fmt::Error),
    #[error("unknown timezone \"{0}\"")]
    Timezone(String),
}

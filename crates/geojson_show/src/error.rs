use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShowError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("failed to bind {addr}: {source}")]
    Listen {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open browser: {0}")]
    BrowserOpen(String),

    #[error("server error: {0}")]
    Serve(String),
}

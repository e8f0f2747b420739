use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "S3 bucket is not configured. Set it in one of:\n\
        - AWS_S3_BUCKET_NAME environment variable\n\
        - `bucket` in ./flipdb.yaml or ~/.config/flipdb/config.yaml\n\
        - `bucket` in the file named by FLIPDB_CONFIG_PATH"
    )]
    MissingBucket,

    #[error("config file {0} does not exist")]
    ConfigFileNotFound(PathBuf),

    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },

    #[error("failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

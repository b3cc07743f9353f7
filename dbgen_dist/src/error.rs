use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read member list {path}: {source}")]
    MemberList {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to determine local hostname: {0}")]
    Hostname(String),

    #[error("node {host} is not in the member list and unlisted nodes are rejected")]
    UnlistedNode { host: String },

    #[error("failed to create local output directory {path}: {source}")]
    LocalOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("dbgen exited with {}", exit_description(*code))]
    Generation { code: Option<i32> },

    #[error("upload failed for [{}]; succeeded for [{}]", failed.join(", "), succeeded.join(", "))]
    Upload {
        failed: Vec<String>,
        succeeded: Vec<String>,
    },

    #[error("failed to write report {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn exit_description(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

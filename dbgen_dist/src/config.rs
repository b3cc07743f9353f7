//! Paths and policies a node needs to run, loaded from an optional JSON file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_MEMBERS_FILE: &str = "/root/ephemeral-hdfs/conf/slaves";
pub const DEFAULT_HADOOP_EXECUTABLE: &str = "/root/ephemeral-hdfs/bin/hadoop";
/// Directory holding `dbgen` and `dists.dss`, looked up next to the executable.
pub const DBGEN_DIR_NAME: &str = "tpch-dbgen";

/// What to do with a node whose address is not in the member list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnlistedNodePolicy {
    /// Take partition 1 and the coordinator's extra tables.
    #[default]
    Coordinator,
    /// Refuse to run.
    Fail,
}

impl FromStr for UnlistedNodePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "coordinator" => Ok(UnlistedNodePolicy::Coordinator),
            "fail" => Ok(UnlistedNodePolicy::Fail),
            other => Err(format!(
                "unknown policy {:?}, expected coordinator or fail",
                other
            )),
        }
    }
}

impl fmt::Display for UnlistedNodePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnlistedNodePolicy::Coordinator => f.write_str("coordinator"),
            UnlistedNodePolicy::Fail => f.write_str("fail"),
        }
    }
}

/// Shape of the HDFS destination handed to `-copyFromLocal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationStyle {
    /// `<base>/<table>/<file>`
    #[default]
    File,
    /// `<base>/<table>/`, letting the client keep the local file name.
    Directory,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub members_file: PathBuf,
    pub hadoop_executable: PathBuf,
    pub dbgen_dir: Option<PathBuf>,
    pub coordinator: Option<String>,
    pub hostname: Option<String>,
    pub unlisted_node: UnlistedNodePolicy,
    pub destination: DestinationStyle,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            members_file: PathBuf::from(DEFAULT_MEMBERS_FILE),
            hadoop_executable: PathBuf::from(DEFAULT_HADOOP_EXECUTABLE),
            dbgen_dir: None,
            coordinator: None,
            hostname: None,
            unlisted_node: UnlistedNodePolicy::default(),
            destination: DestinationStyle::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let contents = fs::read_to_string(path).map_err(|source| Error::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        Config::parse(&contents).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(contents: &str) -> std::result::Result<Config, serde_json::Error> {
        serde_json::from_str(contents)
    }

    /// The dbgen install directory as an absolute path, defaulting to
    /// `tpch-dbgen` beside the running executable.
    ///
    /// dbgen runs inside the local output directory, so a relative path
    /// would be looked up from there instead of from where we were started.
    pub fn dbgen_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.dbgen_dir {
            return std::path::absolute(dir).map_err(|e| {
                Error::Config(format!("cannot resolve dbgen dir {}: {}", dir.display(), e))
            });
        }
        let exe = std::env::current_exe()
            .map_err(|e| Error::Config(format!("cannot locate running executable: {}", e)))?;
        let parent = exe.parent().ok_or_else(|| {
            Error::Config(format!("executable {} has no parent", exe.display()))
        })?;
        Ok(parent.join(DBGEN_DIR_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.members_file, PathBuf::from(DEFAULT_MEMBERS_FILE));
        assert_eq!(config.unlisted_node, UnlistedNodePolicy::Coordinator);
        assert_eq!(config.destination, DestinationStyle::File);
    }

    #[test]
    fn test_parse_overrides() {
        let config = Config::parse(
            r#"{
                "members_file": "/etc/cluster/members",
                "hadoop_executable": "/opt/hadoop/bin/hadoop",
                "dbgen_dir": "/opt/dbgen",
                "coordinator": "master",
                "unlisted_node": "fail",
                "destination": "directory"
            }"#,
        )
        .unwrap();
        assert_eq!(config.members_file, PathBuf::from("/etc/cluster/members"));
        assert_eq!(config.coordinator.as_deref(), Some("master"));
        assert_eq!(config.unlisted_node, UnlistedNodePolicy::Fail);
        assert_eq!(config.destination, DestinationStyle::Directory);
        assert_eq!(config.dbgen_dir().unwrap(), PathBuf::from("/opt/dbgen"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(Config::parse(r#"{"slaves": "/tmp/x"}"#).is_err());
    }

    #[test]
    fn test_relative_dbgen_dir_made_absolute() {
        let config = Config {
            dbgen_dir: Some(PathBuf::from("tpch-dbgen")),
            ..Config::default()
        };
        let dir = config.dbgen_dir().unwrap();
        assert!(dir.is_absolute());
        assert_eq!(dir, std::env::current_dir().unwrap().join("tpch-dbgen"));
    }

    #[test]
    fn test_default_dbgen_dir_is_beside_executable() {
        let dir = Config::default().dbgen_dir().unwrap();
        assert!(dir.ends_with(DBGEN_DIR_NAME));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "coordinator".parse::<UnlistedNodePolicy>(),
            Ok(UnlistedNodePolicy::Coordinator)
        );
        assert_eq!("fail".parse::<UnlistedNodePolicy>(), Ok(UnlistedNodePolicy::Fail));
        assert!("master".parse::<UnlistedNodePolicy>().is_err());
    }
}

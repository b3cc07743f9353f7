//! External commands (`dbgen`, `hadoop fs`) and the runners that execute them.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use log::info;

use crate::error::{Error, Result};

/// A fully built command line, ready to hand to a [`CommandRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Invocation {
            program: program.into(),
            args: vec![],
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn get_program(&self) -> &PathBuf {
        &self.program
    }

    pub fn get_args(&self) -> &Vec<String> {
        &self.args
    }

    pub fn get_current_dir(&self) -> Option<&PathBuf> {
        self.current_dir.as_ref()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// How a finished command exited. `code` is `None` when killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    pub code: Option<i32>,
}

impl RunStatus {
    pub const SUCCESS: RunStatus = RunStatus { code: Some(0) };

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status {}", code),
            None => f.write_str("terminated by signal"),
        }
    }
}

/// Runs one command to completion.
///
/// Only a failure to start the command is an `Err`; a command that runs and
/// exits non-zero is reported through [`RunStatus`] and judged by the caller.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    async fn run(&self, invocation: &Invocation) -> Result<RunStatus>;

    /// Prepares a working directory for a command. Succeeds if it exists.
    async fn create_dir_all(&self, dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| Error::LocalOutput {
                path: dir.to_path_buf(),
                source,
            })
    }
}

impl<R: CommandRunner> CommandRunner for &R {
    async fn run(&self, invocation: &Invocation) -> Result<RunStatus> {
        (**self).run(invocation).await
    }

    async fn create_dir_all(&self, dir: &Path) -> Result<()> {
        (**self).create_dir_all(dir).await
    }
}

/// Spawns real child processes, inheriting stdout and stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<RunStatus> {
        info!("{}", invocation);
        let mut command = tokio::process::Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(dir) = &invocation.current_dir {
            command.current_dir(dir);
        }
        let status = command.status().await.map_err(|source| Error::Spawn {
            program: invocation.program.clone(),
            source,
        })?;
        Ok(RunStatus {
            code: status.code(),
        })
    }
}

/// Logs each command and reports success without running anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunRunner;

impl CommandRunner for DryRunRunner {
    async fn run(&self, invocation: &Invocation) -> Result<RunStatus> {
        match &invocation.current_dir {
            Some(dir) => info!("[dry run] (in {}) {}", dir.display(), invocation),
            None => info!("[dry run] {}", invocation),
        }
        Ok(RunStatus::SUCCESS)
    }

    async fn create_dir_all(&self, dir: &Path) -> Result<()> {
        info!("[dry run] mkdir -p {}", dir.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_display() {
        let invocation = Invocation::new("/opt/hadoop/bin/hadoop")
            .arg("fs")
            .arg("-copyFromLocal")
            .arg("nation.tbl")
            .arg("/tpch/nation/nation.tbl");
        assert_eq!(
            invocation.to_string(),
            "/opt/hadoop/bin/hadoop fs -copyFromLocal nation.tbl /tpch/nation/nation.tbl"
        );
        assert!(invocation.get_current_dir().is_none());
    }

    #[tokio::test]
    async fn test_dry_run_always_succeeds() {
        let invocation = Invocation::new("/does/not/exist").current_dir("/nowhere");
        let status = DryRunRunner.run(&invocation).await.unwrap();
        assert!(status.success());
    }

    #[tokio::test]
    async fn test_dry_run_creates_no_directory() {
        let dir = std::env::temp_dir().join(format!("dbgen_dist_dry_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        DryRunRunner.create_dir_all(&dir).await.unwrap();
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_process_runner_missing_program() {
        let invocation = Invocation::new("/does/not/exist/dbgen");
        match ProcessRunner.run(&invocation).await {
            Err(Error::Spawn { program, .. }) => {
                assert_eq!(program, PathBuf::from("/does/not/exist/dbgen"))
            }
            other => panic!("expected spawn error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_reports_exit_code() {
        let ok = ProcessRunner.run(&Invocation::new("true")).await.unwrap();
        assert!(ok.success());
        let failed = ProcessRunner.run(&Invocation::new("false")).await.unwrap();
        assert!(!failed.success());
        assert_eq!(failed.code, Some(1));
    }
}

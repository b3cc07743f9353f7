//! Runs dbgen for one partition.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{error, info};

use crate::command::{CommandRunner, Invocation};
use crate::error::{Error, Result};
use crate::resolver::PartitionAssignment;

/// TPC-H scale factor, handed to dbgen with one decimal place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() || value <= 0.0 {
            return Err(Error::Config(format!(
                "scale factor must be a positive number, got {}",
                value
            )));
        }
        let scale = ScaleFactor(value);
        if scale.to_string() == "0.0" {
            return Err(Error::Config(format!(
                "scale factor {} rounds to 0.0 at one decimal place",
                value
            )));
        }
        Ok(scale)
    }

    pub fn get(&self) -> f64 {
        self.0
    }
}

impl FromStr for ScaleFactor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value = s
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::Config(format!("scale factor expects a number, got {:?}", s)))?;
        ScaleFactor::new(value)
    }
}

impl fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// The dbgen command line for one partition, run from `local_output` since
/// dbgen only writes to its working directory.
pub fn dbgen_invocation(
    dbgen_dir: &Path,
    local_output: &Path,
    scale: ScaleFactor,
    assignment: PartitionAssignment,
) -> Invocation {
    Invocation::new(dbgen_dir.join("dbgen"))
        .arg("-b")
        .arg(dbgen_dir.join("dists.dss").display().to_string())
        .arg("-v")
        .arg("-f")
        .arg("-s")
        .arg(scale.to_string())
        .arg("-S")
        .arg(assignment.get_index().to_string())
        .arg("-C")
        .arg(assignment.get_total().to_string())
        .current_dir(local_output)
}

pub struct Generator<'a, R> {
    runner: &'a R,
    dbgen_dir: PathBuf,
}

impl<'a, R: CommandRunner> Generator<'a, R> {
    pub fn new(runner: &'a R, dbgen_dir: impl Into<PathBuf>) -> Self {
        Generator {
            runner,
            dbgen_dir: dbgen_dir.into(),
        }
    }

    /// Creates `local_output` if needed and runs dbgen in it, failing if
    /// dbgen cannot start or exits non-zero.
    pub async fn generate(
        &self,
        local_output: &Path,
        scale: ScaleFactor,
        assignment: PartitionAssignment,
    ) -> Result<()> {
        self.runner.create_dir_all(local_output).await?;
        info!("local output directory: {}", local_output.display());

        let invocation = dbgen_invocation(&self.dbgen_dir, local_output, scale, assignment);
        let status = self.runner.run(&invocation).await?;
        if !status.success() {
            error!("dbgen failed with {}; skipping upload", status);
            return Err(Error::Generation { code: status.code });
        }
        info!(
            "generated partition {} of {} at scale {}",
            assignment.get_index(),
            assignment.get_total(),
            scale
        );
        Ok(())
    }
}

//! One node's run: resolve its partition, generate it, upload it.

use std::path::PathBuf;

use log::info;

use crate::command::CommandRunner;
use crate::config::Config;
use crate::error::Result;
use crate::generator::{Generator, ScaleFactor};
use crate::resolver::{resolve_partition, AddressResolver, PartitionAssignment};
use crate::upload::{UploadReport, Uploader};

/// What to generate and where to put it.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub scale: ScaleFactor,
    pub local_output: PathBuf,
    pub hdfs_output: String,
    /// Explicit partition index; `None` means look it up in the member list.
    pub partition: Option<u32>,
    pub num_parts: Option<u32>,
}

pub struct Node<R, D> {
    config: Config,
    runner: R,
    resolver: D,
}

impl<R, D> std::fmt::Display for Node<R, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Node {{ members: {}, hadoop: {} }}",
            self.config.members_file.display(),
            self.config.hadoop_executable.display()
        )
    }
}

impl<R: CommandRunner, D: AddressResolver> Node<R, D> {
    pub fn new(config: Config, runner: R, resolver: D) -> Self {
        Node {
            config,
            runner,
            resolver,
        }
    }

    pub fn get_config(&self) -> &Config {
        &self.config
    }

    pub async fn resolve(&self, job: &GenerationJob) -> Result<PartitionAssignment> {
        resolve_partition(&self.resolver, &self.config, job.partition, job.num_parts).await
    }

    /// Runs the whole job. Resolution and generation failures abort before
    /// anything is uploaded; upload failures are left in the report for the
    /// caller to inspect or turn into an error with
    /// [`UploadReport::into_result`].
    pub async fn run(&self, job: &GenerationJob) -> Result<UploadReport> {
        info!("local output: {}", job.local_output.display());
        info!("hdfs output: {}", job.hdfs_output);
        info!("scale factor: {}", job.scale);

        let assignment = self.resolve(job).await?;
        let dbgen_dir = self.config.dbgen_dir()?;
        Generator::new(&self.runner, dbgen_dir)
            .generate(&job.local_output, job.scale, assignment)
            .await?;

        let report = Uploader::new(
            &self.runner,
            &self.config.hadoop_executable,
            self.config.destination,
        )
        .upload(&job.hdfs_output, &job.local_output, assignment)
        .await;
        info!(
            "partition {}: uploaded {} of {} tables",
            assignment.get_index(),
            report.succeeded().len(),
            report.get_outcomes().len()
        );
        Ok(report)
    }
}

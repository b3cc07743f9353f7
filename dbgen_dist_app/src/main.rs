//! Generates one partition of TPC-H data with dbgen and copies it to HDFS.
//!
//! Run once per node, e.g. through a parallel ssh tool or a Spark job:
//!
//! ```text
//! parallel-dbgen -s 10 -l /mnt/tpch10g -h /tpch10g -n 10 -p 3
//! ```
//!
//! Without `-p` the partition is taken from the node's position in the
//! cluster member list.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser};
use log::info;

use dbgen_dist::command::{CommandRunner, DryRunRunner, ProcessRunner};
use dbgen_dist::config::{Config, DestinationStyle, UnlistedNodePolicy};
use dbgen_dist::generator::ScaleFactor;
use dbgen_dist::node::{GenerationJob, Node};
use dbgen_dist::resolver::{AddressResolver, SystemResolver};

#[derive(Debug, Parser)]
#[command(name = "parallel-dbgen")]
#[command(
    about = "Run TPC-H dbgen for one partition and copy the output to HDFS",
    long_about = None
)]
#[command(disable_help_flag = true)]
struct Args {
    /// TPC-H scale factor
    #[arg(short, long)]
    scale: ScaleFactor,

    /// Partition index of this node; looked up in the member list if omitted
    #[arg(short, long)]
    part: Option<u32>,

    /// Total number of partitions; the member list's count wins without `-p`
    #[arg(short, long)]
    num_parts: u32,

    /// Local directory dbgen writes into
    #[arg(short, long)]
    local_output: PathBuf,

    /// HDFS directory the tables are copied under
    #[arg(short = 'h', long)]
    hdfs_output: String,

    /// JSON config file
    #[arg(long, env = "DBGEN_DIST_CONFIG")]
    config: Option<PathBuf>,

    /// Cluster member list, one address per line
    #[arg(long, env = "DBGEN_DIST_MEMBERS_FILE")]
    members_file: Option<PathBuf>,

    /// Hadoop client executable
    #[arg(long, env = "DBGEN_DIST_HADOOP")]
    hadoop: Option<PathBuf>,

    /// Directory containing dbgen and dists.dss
    #[arg(long, env = "DBGEN_DIST_DBGEN_DIR")]
    dbgen_dir: Option<PathBuf>,

    /// Name to look this node up by instead of its hostname
    #[arg(long)]
    hostname: Option<String>,

    /// Host name of the coordinator node
    #[arg(long)]
    coordinator: Option<String>,

    /// What an unlisted node does: coordinator or fail
    #[arg(long)]
    unlisted_node: Option<UnlistedNodePolicy>,

    /// Copy into `<base>/<table>/` and keep the local file name
    #[arg(long)]
    directory_destination: bool,

    /// Log commands instead of running them
    #[arg(long)]
    dry_run: bool,

    /// Write a JSON upload report here
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

impl Args {
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(path) = &self.members_file {
            config.members_file = path.clone();
        }
        if let Some(path) = &self.hadoop {
            config.hadoop_executable = path.clone();
        }
        if let Some(dir) = &self.dbgen_dir {
            config.dbgen_dir = Some(dir.clone());
        }
        if let Some(host) = &self.hostname {
            config.hostname = Some(host.clone());
        }
        if let Some(host) = &self.coordinator {
            config.coordinator = Some(host.clone());
        }
        if let Some(policy) = self.unlisted_node {
            config.unlisted_node = policy;
        }
        if self.directory_destination {
            config.destination = DestinationStyle::Directory;
        }
        Ok(config)
    }

    fn job(&self) -> GenerationJob {
        GenerationJob {
            scale: self.scale,
            local_output: self.local_output.clone(),
            hdfs_output: self.hdfs_output.clone(),
            partition: self.part,
            num_parts: Some(self.num_parts),
        }
    }
}

async fn run<R: CommandRunner, D: AddressResolver>(
    node: Node<R, D>,
    job: &GenerationJob,
    report_path: Option<&Path>,
) -> anyhow::Result<()> {
    info!("{}", node);
    let report = node.run(job).await?;
    if let Some(path) = report_path {
        report.write_json(path)?;
        info!("wrote report to {}", path.display());
    }
    let report = report.into_result()?;
    info!(
        "partition {} of {} done",
        report.get_partition().get_index(),
        report.get_partition().get_total()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.config().context("loading configuration")?;
    let job = args.job();
    let report = args.report.as_deref();

    if args.dry_run {
        run(Node::new(config, DryRunRunner, SystemResolver), &job, report).await
    } else {
        run(Node::new(config, ProcessRunner, SystemResolver), &job, report).await
    }
}

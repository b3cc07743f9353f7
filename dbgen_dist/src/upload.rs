//! Copies generated table files into HDFS.
//!
//! Every node writes only paths qualified by its own partition index, so
//! nodes never collide and a rerun simply overwrites its own files.

use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info};
use serde::Serialize;

use crate::command::{CommandRunner, Invocation};
use crate::config::DestinationStyle;
use crate::error::{Error, Result};
use crate::resolver::PartitionAssignment;
use crate::table::Table;

/// HDFS destination for a table file. Pure in its inputs.
pub fn destination(base: &str, table: Table, partition: u32, style: DestinationStyle) -> String {
    let base = base.trim_end_matches('/');
    match style {
        DestinationStyle::File => format!(
            "{}/{}/{}",
            base,
            table.name(),
            table.file_name(partition)
        ),
        DestinationStyle::Directory => format!("{}/{}/", base, table.name()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOp {
    table: Table,
    local: PathBuf,
    destination: String,
}

impl UploadOp {
    pub fn get_table(&self) -> Table {
        self.table
    }

    pub fn get_local(&self) -> &PathBuf {
        &self.local
    }

    pub fn get_destination(&self) -> &str {
        &self.destination
    }

    pub fn invocation(&self, hadoop: &Path) -> Invocation {
        Invocation::new(hadoop)
            .arg("fs")
            .arg("-copyFromLocal")
            .arg(self.local.display().to_string())
            .arg(self.destination.clone())
    }
}

/// The copies a node must make: the unpartitioned tables first when it is
/// the coordinator, then its file of each partitioned table.
pub fn plan(
    base: &str,
    local_dir: &Path,
    assignment: PartitionAssignment,
    style: DestinationStyle,
) -> Vec<UploadOp> {
    let partition = assignment.get_index();
    Table::for_partition(partition)
        .into_iter()
        .map(|table| UploadOp {
            table,
            local: local_dir.join(table.file_name(partition)),
            destination: destination(base, table, partition, style),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UploadStatus {
    Copied,
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct TableOutcome {
    #[serde(flatten)]
    op: UploadOp,
    #[serde(flatten)]
    status: UploadStatus,
}

impl TableOutcome {
    pub fn get_op(&self) -> &UploadOp {
        &self.op
    }

    pub fn get_status(&self) -> &UploadStatus {
        &self.status
    }
}

/// Result of every copy a node attempted.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    partition: PartitionAssignment,
    outcomes: Vec<TableOutcome>,
}

impl UploadReport {
    pub fn get_partition(&self) -> PartitionAssignment {
        self.partition
    }

    pub fn get_outcomes(&self) -> &Vec<TableOutcome> {
        &self.outcomes
    }

    pub fn succeeded(&self) -> Vec<Table> {
        self.tables_where(|s| *s == UploadStatus::Copied)
    }

    pub fn failed(&self) -> Vec<Table> {
        self.tables_where(|s| *s != UploadStatus::Copied)
    }

    fn tables_where(&self, pred: impl Fn(&UploadStatus) -> bool) -> Vec<Table> {
        self.outcomes
            .iter()
            .filter(|o| pred(&o.status))
            .map(|o| o.op.table)
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.failed().is_empty()
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Report {
                path: path.to_path_buf(),
                source: e.into(),
            })?;
        fs::write(path, serialized).map_err(|source| Error::Report {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `Err` naming failed and succeeded tables if any copy failed.
    pub fn into_result(self) -> Result<UploadReport> {
        if self.is_success() {
            return Ok(self);
        }
        let names = |tables: Vec<Table>| -> Vec<String> {
            tables.iter().map(|t| t.to_string()).collect()
        };
        Err(Error::Upload {
            failed: names(self.failed()),
            succeeded: names(self.succeeded()),
        })
    }
}

pub struct Uploader<'a, R> {
    runner: &'a R,
    hadoop: PathBuf,
    style: DestinationStyle,
}

impl<'a, R: CommandRunner> Uploader<'a, R> {
    pub fn new(runner: &'a R, hadoop: impl Into<PathBuf>, style: DestinationStyle) -> Self {
        Uploader {
            runner,
            hadoop: hadoop.into(),
            style,
        }
    }

    /// Runs each copy in order. A failed copy is recorded and the remaining
    /// tables are still attempted.
    pub async fn upload(
        &self,
        base: &str,
        local_dir: &Path,
        assignment: PartitionAssignment,
    ) -> UploadReport {
        let mut outcomes = vec![];
        for op in plan(base, local_dir, assignment, self.style) {
            let status = match self.runner.run(&op.invocation(&self.hadoop)).await {
                Ok(status) if status.success() => {
                    info!("copied {} to {}", op.local.display(), op.destination);
                    UploadStatus::Copied
                }
                Ok(status) => {
                    error!("copying {} failed with {}", op.table, status);
                    UploadStatus::Failed {
                        reason: status.to_string(),
                    }
                }
                Err(e) => {
                    error!("copying {} failed: {}", op.table, e);
                    UploadStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            outcomes.push(TableOutcome { op, status });
        }
        UploadReport {
            partition: assignment,
            outcomes,
        }
    }
}

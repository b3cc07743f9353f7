//! Distributed TPC-H data generation.
//!
//! Each node in a cluster runs one [`node::Node`]: it works out which dbgen
//! partition it owns, runs the external `dbgen` tool for that partition and
//! copies the resulting `.tbl` files into HDFS.

pub mod command;
pub mod config;
pub mod error;
pub mod generator;
pub mod node;
pub mod resolver;
pub mod table;
pub mod upload;

pub use error::{Error, Result};

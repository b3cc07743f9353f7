//! Works out which dbgen partition this node owns.
//!
//! With an explicit index the answer is taken as given. Otherwise the node
//! finds its own address in the shared member list: member `i` (0-based)
//! owns partition `i + 2`, partition 1 belongs to the coordinator, which is
//! not listed, and the partition count is `members + 1`.

use std::fs;
use std::net::IpAddr;
use std::path::Path;

use futures::future::join_all;
use log::{debug, info, warn};
use serde::Serialize;

use crate::config::{Config, UnlistedNodePolicy};
use crate::error::{Error, Result};

/// Partition `index` of `total`, with `1 <= index <= total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PartitionAssignment {
    index: u32,
    total: u32,
}

impl PartitionAssignment {
    pub fn new(index: u32, total: u32) -> Result<Self> {
        if total == 0 {
            return Err(Error::Config("partition count must be at least 1".into()));
        }
        if index == 0 || index > total {
            return Err(Error::Config(format!(
                "partition index {} is outside 1..={}",
                index, total
            )));
        }
        Ok(PartitionAssignment { index, total })
    }

    pub fn get_index(&self) -> u32 {
        self.index
    }

    pub fn get_total(&self) -> u32 {
        self.total
    }

    /// Partition 1 also produces the unpartitioned tables.
    pub fn is_coordinator(&self) -> bool {
        self.index == 1
    }
}

/// Where the current node sits relative to the member list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Found at this 0-based position of the member list.
    Member(usize),
    /// Matches the configured coordinator.
    Coordinator,
    /// Not found anywhere, or the node's own address did not resolve.
    Unlisted,
}

/// Locates `current` among `members`, comparing resolved addresses.
///
/// Members that failed to resolve are `None` and never match, but still
/// occupy their position so other nodes keep their partition index.
pub fn place<A: PartialEq>(
    members: &[Option<A>],
    coordinator: Option<&A>,
    current: Option<&A>,
) -> Placement {
    let current = match current {
        Some(current) => current,
        None => return Placement::Unlisted,
    };
    if let Some(i) = members
        .iter()
        .position(|member| member.as_ref() == Some(current))
    {
        return Placement::Member(i);
    }
    if coordinator == Some(current) {
        return Placement::Coordinator;
    }
    Placement::Unlisted
}

/// Turns a placement into an assignment over `member_count + 1` partitions.
pub fn assign(
    placement: Placement,
    member_count: usize,
    policy: UnlistedNodePolicy,
    host: &str,
) -> Result<PartitionAssignment> {
    let total = u32::try_from(member_count + 1)
        .map_err(|_| Error::Config(format!("member list too long ({} entries)", member_count)))?;
    let index = match placement {
        Placement::Member(i) => i as u32 + 2,
        Placement::Coordinator => 1,
        Placement::Unlisted => match policy {
            UnlistedNodePolicy::Coordinator => {
                warn!(
                    "{} is not in the member list; acting as coordinator (partition 1)",
                    host
                );
                1
            }
            UnlistedNodePolicy::Fail => {
                return Err(Error::UnlistedNode {
                    host: host.to_string(),
                })
            }
        },
    };
    PartitionAssignment::new(index, total)
}

/// One member per line; blank lines and `#` comments are skipped.
pub fn parse_members(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn read_members(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path).map_err(|source| Error::MemberList {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_members(&contents))
}

/// Name lookup for the current node and for member list entries.
#[allow(async_fn_in_trait)]
pub trait AddressResolver {
    /// The name this node reports for itself.
    async fn hostname(&self) -> Result<String>;

    /// The canonical address of `host`, or `None` if it does not resolve.
    async fn resolve(&self, host: &str) -> Option<IpAddr>;
}

/// Resolves through the operating system: `gethostname(2)` and the system
/// resolver.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl AddressResolver for SystemResolver {
    async fn hostname(&self) -> Result<String> {
        let raw = gethostname::gethostname();
        let name = raw
            .to_str()
            .ok_or_else(|| Error::Hostname(format!("hostname {:?} is not UTF-8", raw)))?
            .trim()
            .to_string();
        if name.is_empty() {
            return Err(Error::Hostname("hostname is empty".into()));
        }
        Ok(name)
    }

    async fn resolve(&self, host: &str) -> Option<IpAddr> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Some(ip);
        }
        let addrs: Vec<IpAddr> = match tokio::net::lookup_host((host, 0)).await {
            Ok(addrs) => addrs.map(|a| a.ip()).collect(),
            Err(e) => {
                debug!("lookup of {} failed: {}", host, e);
                return None;
            }
        };
        // Prefer IPv4 so names compare the way gethostbyname sees them.
        addrs
            .iter()
            .find(|ip| ip.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
    }
}

/// Resolves this node's partition, from `explicit` if given, otherwise from
/// its position in the configured member list.
pub async fn resolve_partition<D: AddressResolver>(
    resolver: &D,
    config: &Config,
    explicit: Option<u32>,
    num_parts: Option<u32>,
) -> Result<PartitionAssignment> {
    if let Some(index) = explicit {
        let total = num_parts.ok_or_else(|| {
            Error::Config("a partition count is required with an explicit partition index".into())
        })?;
        let assignment = PartitionAssignment::new(index, total)?;
        info!("Using partition index {} of {}", index, total);
        return Ok(assignment);
    }

    let members = read_members(&config.members_file)?;
    let addresses = join_all(members.iter().map(|m| resolver.resolve(m))).await;
    for (member, address) in members.iter().zip(&addresses) {
        match address {
            Some(ip) => debug!("member {} resolves to {}", member, ip),
            None => warn!("member {} does not resolve and can never match", member),
        }
    }

    let host = match &config.hostname {
        Some(host) => host.clone(),
        None => resolver.hostname().await?,
    };
    let current = resolver.resolve(&host).await;
    match current {
        Some(ip) => info!("Current node {} resolves to {}", host, ip),
        None => warn!("Current node {} does not resolve", host),
    }
    let coordinator = match &config.coordinator {
        Some(name) => resolver.resolve(name).await,
        None => None,
    };

    let placement = place(&addresses, coordinator.as_ref(), current.as_ref());
    let assignment = assign(placement, members.len(), config.unlisted_node, &host)?;
    if let Some(n) = num_parts {
        if n != assignment.get_total() {
            warn!(
                "Ignoring partition count {}: the member list gives {}",
                n,
                assignment.get_total()
            );
        }
    }
    info!(
        "Automatically determined partition index {} of {}",
        assignment.get_index(),
        assignment.get_total()
    );
    Ok(assignment)
}

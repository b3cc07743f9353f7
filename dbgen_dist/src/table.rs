//! The fixed set of TPC-H tables and their file naming.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Nation,
    Region,
    Supplier,
    Part,
    PartSupp,
    Orders,
    LineItem,
    Customer,
}

impl Table {
    /// Tables dbgen writes once, on the coordinator only.
    pub const UNPARTITIONED: [Table; 2] = [Table::Nation, Table::Region];

    /// Tables dbgen splits into one file per partition, in upload order.
    pub const PARTITIONED: [Table; 6] = [
        Table::Supplier,
        Table::Part,
        Table::PartSupp,
        Table::Orders,
        Table::LineItem,
        Table::Customer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::Nation => "nation",
            Table::Region => "region",
            Table::Supplier => "supplier",
            Table::Part => "part",
            Table::PartSupp => "partsupp",
            Table::Orders => "orders",
            Table::LineItem => "lineitem",
            Table::Customer => "customer",
        }
    }

    pub fn is_partitioned(self) -> bool {
        !Table::UNPARTITIONED.contains(&self)
    }

    /// Name of the file dbgen writes for this table.
    ///
    /// Partitioned tables carry the partition index as a suffix
    /// (`lineitem.tbl.3`); the others are plain (`nation.tbl`).
    pub fn file_name(self, partition: u32) -> String {
        if self.is_partitioned() {
            format!("{}.tbl.{}", self.name(), partition)
        } else {
            format!("{}.tbl", self.name())
        }
    }

    /// Tables a node with the given partition index generates and uploads.
    pub fn for_partition(partition: u32) -> Vec<Table> {
        let mut tables = Vec::with_capacity(8);
        if partition == 1 {
            tables.extend(Table::UNPARTITIONED);
        }
        tables.extend(Table::PARTITIONED);
        tables
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        assert_eq!(Table::Nation.file_name(1), "nation.tbl");
        assert_eq!(Table::Region.file_name(4), "region.tbl");
        assert_eq!(Table::LineItem.file_name(3), "lineitem.tbl.3");
        assert_eq!(Table::PartSupp.file_name(12), "partsupp.tbl.12");
    }

    #[test]
    fn test_coordinator_gets_all_tables() {
        let tables = Table::for_partition(1);
        assert_eq!(tables.len(), 8);
        assert_eq!(&tables[..2], &[Table::Nation, Table::Region]);
    }

    #[test]
    fn test_members_skip_unpartitioned_tables() {
        for partition in 2..6 {
            let tables = Table::for_partition(partition);
            assert_eq!(tables, Table::PARTITIONED.to_vec());
            assert!(tables.iter().all(|t| t.is_partitioned()));
        }
    }
}

//! Route selection for gateway description groups.
//!
//! A group whose source and destination PDUs live in the same execution
//! partition is evaluated by a direct call. Otherwise the received payload is
//! framed into the destination partition's queue and evaluated by that
//! partition's gateway main function. The choice is made once, when the
//! tables are built.

use crate::index::Idx;
use crate::tables::Partition;

/// How a description group reaches its destination partition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Evaluate in the receiving context
    Local,
    /// Queue for the destination partition's gateway main function
    CrossPartition { partition: Idx<Partition> },
}

impl Route {
    pub fn is_local(&self) -> bool {
        matches!(self, Route::Local)
    }
}

/// Pick the route between a source and a destination partition.
pub fn select_route(source: Idx<Partition>, destination: Idx<Partition>) -> Route {
    if source == destination {
        Route::Local
    } else {
        Route::CrossPartition {
            partition: destination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Table;

    fn partitions() -> Table<Partition> {
        Table::from_vec(
            "partition",
            vec![Partition::new("app"), Partition::new("safety")],
        )
        .unwrap()
    }

    #[test]
    fn same_partition_is_local() {
        let table = partitions();
        let app = table.index(0).unwrap();
        assert_eq!(select_route(app, app), Route::Local);
        assert!(select_route(app, app).is_local());
    }

    #[test]
    fn different_partition_is_queued() {
        let table = partitions();
        let app = table.index(0).unwrap();
        let safety = table.index(1).unwrap();
        assert_eq!(
            select_route(app, safety),
            Route::CrossPartition { partition: safety }
        );
        assert_eq!(
            select_route(safety, app),
            Route::CrossPartition { partition: app }
        );
    }
}

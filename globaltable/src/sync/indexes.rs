use crate::types::{ReplicaIndexUpdate, TableDescription};

/// Computes the global secondary index changes that make `destination` match `master`.
///
/// The master is authoritative:
/// - an index the master is deleting is deleted on the destination if it still exists there,
///   and never created on it;
/// - any other index missing on the destination is created with the master's full
///   definition, throughput included;
/// - an index only the destination has is deleted.
///
/// Indexes present on both sides are left alone, even if their definitions differ.
pub fn diff_global_secondary_indexes(
    master: &TableDescription,
    destination: &TableDescription,
) -> Vec<ReplicaIndexUpdate> {
    let mut updates = Vec::new();

    for master_index in &master.global_secondary_indexes {
        let on_destination = destination
            .global_secondary_index(&master_index.index_name)
            .is_some();

        match (on_destination, master_index.is_deleting()) {
            (true, true) => updates.push(ReplicaIndexUpdate::Delete {
                index_name: master_index.index_name.clone(),
            }),
            (false, false) => {
                updates.push(ReplicaIndexUpdate::Create(master_index.definition()));
            }
            (true, false) | (false, true) => {}
        }
    }

    for destination_index in &destination.global_secondary_indexes {
        if master
            .global_secondary_index(&destination_index.index_name)
            .is_none()
        {
            updates.push(ReplicaIndexUpdate::Delete {
                index_name: destination_index.index_name.clone(),
            });
        }
    }

    updates
}

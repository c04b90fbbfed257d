// Copyright 2025 Cowboy AI, LLC.

//! Tree assembly from flat parent-pointer rows
//!
//! The persisted model encodes trees as parent-id foreign keys, never as
//! nested objects. This module is the single shared algorithm that turns
//! flat rows back into nested entities, used by every storage adapter so
//! cached and freshly-loaded reads cannot diverge in shape.
//!
//! ```mermaid
//! graph TD
//!     R1[root row] --> A[op: parent_root_id = R1]
//!     A --> B[op: parent_operation_id = A]
//!     A --> C[op: parent_operation_id = A]
//! ```

use indexmap::IndexMap;
use std::collections::HashSet;

use crate::entity::{OperationId, RootId};
use crate::errors::DomainResult;
use crate::operation::{CalculationOperation, ParentRef};
use crate::persistence::{OperationRow, RootRow};
use crate::root::CalculationRoot;

/// Operation rows bucketed by their parent reference
///
/// Buckets preserve the input row order, so siblings keep the
/// creation-time ordering the repository queried them in.
struct Buckets {
    by_root: IndexMap<RootId, Vec<OperationRow>>,
    by_operation: IndexMap<OperationId, Vec<OperationRow>>,
}

fn group_by_parent(rows: Vec<OperationRow>) -> DomainResult<Buckets> {
    let mut buckets = Buckets {
        by_root: IndexMap::new(),
        by_operation: IndexMap::new(),
    };
    for row in rows {
        match row.parent_ref()? {
            ParentRef::Root(root_id) => {
                buckets.by_root.entry(root_id).or_default().push(row);
            }
            ParentRef::Operation(operation_id) => {
                buckets
                    .by_operation
                    .entry(operation_id)
                    .or_default()
                    .push(row);
            }
        }
    }
    Ok(buckets)
}

fn build_subtree(
    row: OperationRow,
    buckets: &mut IndexMap<OperationId, Vec<OperationRow>>,
) -> DomainResult<CalculationOperation> {
    let mut node = row.into_entity()?;
    if let Some(child_rows) = buckets.shift_remove(&node.id()) {
        let mut children = Vec::with_capacity(child_rows.len());
        for child_row in child_rows {
            children.push(build_subtree(child_row, buckets)?);
        }
        node.set_children(children);
    }
    Ok(node)
}

fn assemble_one(row: RootRow, buckets: &mut Buckets) -> DomainResult<CalculationRoot> {
    let mut root = row.into_entity();
    if let Some(direct_rows) = buckets.by_root.shift_remove(&root.id()) {
        let mut operations = Vec::with_capacity(direct_rows.len());
        for direct_row in direct_rows {
            operations.push(build_subtree(direct_row, &mut buckets.by_operation)?);
        }
        root.set_operations(operations);
    }
    Ok(root)
}

/// Assemble every root's tree from the full set of flat rows
///
/// Groups operations by `parent_root_id` for each root's direct children
/// and follows a `parent_operation_id` lookup depth-first for descendants.
pub fn assemble_forest(
    root_rows: Vec<RootRow>,
    operation_rows: Vec<OperationRow>,
) -> DomainResult<Vec<CalculationRoot>> {
    let mut buckets = group_by_parent(operation_rows)?;
    root_rows
        .into_iter()
        .map(|row| assemble_one(row, &mut buckets))
        .collect()
}

/// Ids of every operation transitively reachable from a root
///
/// A flat per-root query is not available, so membership is grown
/// iteratively until a fixed point: an operation belongs if its
/// `parent_root_id` matches the root, or its `parent_operation_id` already
/// belongs.
pub fn reachable_operation_ids(
    root_id: RootId,
    operations: &[OperationRow],
) -> HashSet<OperationId> {
    let mut members: HashSet<OperationId> = operations
        .iter()
        .filter(|row| row.parent_root_id == Some(root_id))
        .map(|row| row.id)
        .collect();

    loop {
        let before = members.len();
        for row in operations {
            if let Some(parent_id) = row.parent_operation_id {
                if members.contains(&parent_id) {
                    members.insert(row.id);
                }
            }
        }
        if members.len() == before {
            break;
        }
    }
    members
}

/// Assemble a single root's tree from the full set of operation rows
///
/// Computes the reachable closure first, then builds the nested structure
/// from only those rows.
pub fn assemble_root(
    root_row: RootRow,
    operation_rows: Vec<OperationRow>,
) -> DomainResult<CalculationRoot> {
    let members = reachable_operation_ids(root_row.id, &operation_rows);
    let relevant: Vec<OperationRow> = operation_rows
        .into_iter()
        .filter(|row| members.contains(&row.id))
        .collect();
    let mut buckets = group_by_parent(relevant)?;
    assemble_one(root_row, &mut buckets)
}

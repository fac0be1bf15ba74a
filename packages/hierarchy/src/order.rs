//! Display-order sequencing by depth-first pre-order traversal.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::error::{HierarchyError, Result};
use crate::natural;
use crate::types::FrameworkId;

/// One node as seen by the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderEntry<'a, K> {
    /// Identity of the node.
    pub key: K,
    /// Reference code, used for sibling order.
    pub ref_code: &'a str,
    /// Parent key; a parent outside the entry set counts as none.
    pub parent: Option<K>,
}

/// Order nodes so that every parent precedes its subtree and siblings
/// follow natural order of their reference codes.
///
/// Returns the keys in display order; the position of a key is its
/// display order value, starting at zero. Nodes that no root reaches
/// (a parent cycle) fail the whole framework.
///
/// # Examples
/// ```
/// use controlmap_hierarchy::order::{sequence, OrderEntry};
/// use controlmap_hierarchy::types::FrameworkId;
///
/// let entries = [
///     OrderEntry { key: 1, ref_code: "1.10", parent: Some(0) },
///     OrderEntry { key: 2, ref_code: "1.9", parent: Some(0) },
///     OrderEntry { key: 0, ref_code: "1", parent: None },
/// ];
/// let order = sequence(&FrameworkId::new("CIS-CSC", "v8.1"), &entries).unwrap();
/// assert_eq!(order, vec![0, 2, 1]);
/// ```
pub fn sequence<K>(framework_id: &FrameworkId, entries: &[OrderEntry<'_, K>]) -> Result<Vec<K>>
where
    K: Copy + Eq + Hash,
{
    let known: HashSet<K> = entries.iter().map(|e| e.key).collect();

    let mut roots: Vec<&OrderEntry<'_, K>> = Vec::new();
    let mut children: HashMap<K, Vec<&OrderEntry<'_, K>>> = HashMap::new();
    for entry in entries {
        match entry.parent.filter(|p| known.contains(p)) {
            Some(parent) => children.entry(parent).or_default().push(entry),
            None => roots.push(entry),
        }
    }

    roots.sort_by(|a, b| natural::compare(a.ref_code, b.ref_code));
    for siblings in children.values_mut() {
        siblings.sort_by(|a, b| natural::compare(a.ref_code, b.ref_code));
    }

    let mut ordered = Vec::with_capacity(known.len());
    let mut visited = HashSet::with_capacity(known.len());
    let mut stack: Vec<&OrderEntry<'_, K>> = roots.into_iter().rev().collect();

    while let Some(entry) = stack.pop() {
        if !visited.insert(entry.key) {
            continue;
        }
        ordered.push(entry.key);
        if let Some(kids) = children.get(&entry.key) {
            stack.extend(kids.iter().rev());
        }
    }

    if ordered.len() < known.len() {
        return Err(HierarchyError::UnreachableNodes {
            framework: framework_id.clone(),
            count: known.len() - ordered.len(),
        });
    }

    Ok(ordered)
}

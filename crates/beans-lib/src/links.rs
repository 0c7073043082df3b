//! Link consistency rules.
//!
//! Every link mutation goes through [`add_link`] / [`remove_link`], which
//! check the proposed edge against a read-only view of the graph before
//! touching the record.

use std::collections::HashSet;

use crate::error::{BeansError, Result, Warning};
use crate::model::{LinkType, Record};

/// Read-only graph view consulted while validating links.
pub trait LinkGraph {
    /// Return true if a bean with this id exists.
    fn contains(&self, id: &str) -> bool;

    /// Outgoing targets of `id` for one link type.
    fn targets(&self, id: &str, link_type: &LinkType) -> &[String];
}

/// A cycle found over one hierarchical link type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    pub link_type: LinkType,
    /// Ordered ids, first and last equal.
    pub path: Vec<String>,
}

/// Validate and apply `source --link_type--> target` to `record`.
///
/// Returns the warnings produced (dangling target). Adding a pair that is
/// already present is a no-op.
///
/// # Errors
///
/// Returns `SelfLink`, `DuplicateParent`, `LinkCycle`, or `Validation` for
/// an empty target.
pub fn add_link(
    record: &mut Record,
    link_type: LinkType,
    target: &str,
    graph: &impl LinkGraph,
) -> Result<Vec<Warning>> {
    let target = target.trim();
    if target.is_empty() {
        return Err(BeansError::validation("target", "cannot be empty"));
    }

    if target == record.id {
        return Err(BeansError::SelfLink {
            id: record.id.clone(),
        });
    }

    if link_type == LinkType::Parent {
        if let Some(existing) = record.links.parent() {
            return Err(BeansError::DuplicateParent {
                id: record.id.clone(),
                existing: existing.to_string(),
            });
        }
    }

    if link_type.is_hierarchical() {
        if let Some(path) = find_cycle(graph, &record.id, &link_type, target) {
            return Err(BeansError::LinkCycle {
                link_type: link_type.to_string(),
                path,
            });
        }
    }

    let mut warnings = Vec::new();
    if !graph.contains(target) {
        warnings.push(Warning::DanglingLink {
            source: record.id.clone(),
            link_type: link_type.to_string(),
            target: target.to_string(),
        });
    }

    if !record.links.add(link_type, target) {
        tracing::debug!(id = %record.id, target, "link already present");
    }
    Ok(warnings)
}

/// Remove `source --link_type--> target` from `record`.
///
/// Returns `false` if the pair was not present; that is not an error.
pub fn remove_link(record: &mut Record, link_type: &LinkType, target: &str) -> bool {
    record.links.remove(link_type, target.trim())
}

/// Look for the cycle that adding `source --link_type--> target` would close.
///
/// Depth-first search from `target` over `link_type` edges, trying to reach
/// `source`. Returns the cycle as `[source, target, ..., source]`.
#[must_use]
pub fn find_cycle(
    graph: &impl LinkGraph,
    source: &str,
    link_type: &LinkType,
    target: &str,
) -> Option<Vec<String>> {
    if target == source {
        return Some(vec![source.to_string(), source.to_string()]);
    }

    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(target.to_string());
    // Each frame is (node, index of the next child to visit); the frames
    // form the current path from `target`.
    let mut stack: Vec<(String, usize)> = vec![(target.to_string(), 0)];

    while let Some(frame) = stack.last_mut() {
        let index = frame.1;
        frame.1 += 1;
        let node = frame.0.clone();

        let Some(next) = graph.targets(&node, link_type).get(index) else {
            stack.pop();
            continue;
        };

        if next == source {
            let mut path = Vec::with_capacity(stack.len() + 2);
            path.push(source.to_string());
            path.extend(stack.into_iter().map(|(id, _)| id));
            path.push(source.to_string());
            return Some(path);
        }

        if visited.insert(next.clone()) {
            stack.push((next.clone(), 0));
        }
    }

    None
}

/// Find cycles already present among `records` (e.g. from hand-edited
/// files). Each cycle is reported once.
#[must_use]
pub fn find_existing_cycles<'a>(
    graph: &impl LinkGraph,
    records: impl IntoIterator<Item = &'a Record>,
) -> Vec<Cycle> {
    let mut seen: HashSet<(LinkType, Vec<String>)> = HashSet::new();
    let mut cycles = Vec::new();

    for record in records {
        for (link_type, target) in record.links.iter() {
            if !link_type.is_hierarchical() {
                continue;
            }
            let Some(path) = find_cycle(graph, &record.id, link_type, target) else {
                continue;
            };
            if seen.insert((link_type.clone(), rotation_key(&path))) {
                cycles.push(Cycle {
                    link_type: link_type.clone(),
                    path,
                });
            }
        }
    }

    cycles
}

/// Rotate a closed path so the smallest id comes first, dropping the
/// closing repeat.
fn rotation_key(path: &[String]) -> Vec<String> {
    let open = &path[..path.len().saturating_sub(1)];
    let start = open
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.cmp(b.1))
        .map_or(0, |(i, _)| i);
    open[start..].iter().chain(&open[..start]).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct TestGraph {
        records: HashMap<String, Record>,
    }

    impl TestGraph {
        fn with(ids: &[&str]) -> Self {
            let mut graph = Self::default();
            for id in ids {
                graph.records.insert((*id).to_string(), Record::new(*id, *id));
            }
            graph
        }

        fn link(&mut self, from: &str, link_type: LinkType, to: &str) {
            self.records
                .get_mut(from)
                .unwrap()
                .links
                .add(link_type, to);
        }
    }

    impl LinkGraph for TestGraph {
        fn contains(&self, id: &str) -> bool {
            self.records.contains_key(id)
        }

        fn targets(&self, id: &str, link_type: &LinkType) -> &[String] {
            self.records
                .get(id)
                .map_or(&[], |r| r.links.targets(link_type))
        }
    }

    #[test]
    fn test_self_link_rejected() {
        let graph = TestGraph::with(&["a"]);
        let mut record = Record::new("a", "A");
        let result = add_link(&mut record, LinkType::Relates, "a", &graph);
        assert!(matches!(result, Err(BeansError::SelfLink { .. })));
    }

    #[test]
    fn test_second_parent_rejected_even_if_target_missing() {
        let graph = TestGraph::with(&["a", "p"]);
        let mut record = Record::new("a", "A");
        add_link(&mut record, LinkType::Parent, "p", &graph).unwrap();
        let result = add_link(&mut record, LinkType::Parent, "nowhere", &graph);
        assert!(matches!(result, Err(BeansError::DuplicateParent { .. })));
    }

    #[test]
    fn test_blocks_cycle_reports_path() {
        let mut graph = TestGraph::with(&["a", "b", "c"]);
        graph.link("a", LinkType::Blocks, "b");
        graph.link("b", LinkType::Blocks, "c");

        let mut record = graph.records["c"].clone();
        let err = add_link(&mut record, LinkType::Blocks, "a", &graph).unwrap_err();
        let BeansError::LinkCycle { link_type, path } = err else {
            panic!("expected cycle error");
        };
        assert_eq!(link_type, "blocks");
        assert_eq!(path, vec!["c", "a", "b", "c"]);
        assert!(record.links.is_empty());
    }

    #[test]
    fn test_parent_cycle_rejected() {
        let mut graph = TestGraph::with(&["child", "parent"]);
        graph.link("child", LinkType::Parent, "parent");
        let mut record = graph.records["parent"].clone();
        let result = add_link(&mut record, LinkType::Parent, "child", &graph);
        assert!(matches!(result, Err(BeansError::LinkCycle { .. })));
    }

    #[test]
    fn test_cycles_only_follow_same_type() {
        let mut graph = TestGraph::with(&["a", "b"]);
        graph.link("a", LinkType::Relates, "b");
        graph.link("a", LinkType::Parent, "b");
        let mut record = graph.records["b"].clone();
        // b blocks a is fine: no blocks path from a back to b.
        assert!(add_link(&mut record, LinkType::Blocks, "a", &graph).is_ok());
        // relates is not hierarchical, so the reverse edge is allowed.
        assert!(add_link(&mut record, LinkType::Relates, "a", &graph).is_ok());
    }

    #[test]
    fn test_dangling_target_warns_but_commits() {
        let graph = TestGraph::with(&["a"]);
        let mut record = Record::new("a", "A");
        let warnings = add_link(&mut record, LinkType::Blocks, "ghost", &graph).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0], Warning::DanglingLink { .. }));
        assert!(record.links.contains(&LinkType::Blocks, "ghost"));
    }

    #[test]
    fn test_add_existing_pair_is_noop() {
        let graph = TestGraph::with(&["a", "b"]);
        let mut record = Record::new("a", "A");
        add_link(&mut record, LinkType::Relates, "b", &graph).unwrap();
        let warnings = add_link(&mut record, LinkType::Relates, "b", &graph).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(record.links.len(), 1);
    }

    #[test]
    fn test_remove_missing_pair_is_noop() {
        let mut record = Record::new("a", "A");
        assert!(!remove_link(&mut record, &LinkType::Blocks, "b"));
        record.links.add(LinkType::Blocks, "b");
        assert!(remove_link(&mut record, &LinkType::Blocks, "b"));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let mut graph = TestGraph::with(&["a", "b", "c", "d"]);
        graph.link("a", LinkType::Blocks, "b");
        graph.link("a", LinkType::Blocks, "c");
        graph.link("b", LinkType::Blocks, "d");
        graph.link("c", LinkType::Blocks, "d");
        assert_eq!(find_cycle(&graph, "a", &LinkType::Blocks, "d"), None);
    }

    #[test]
    fn test_find_existing_cycles_dedups_rotations() {
        let mut graph = TestGraph::with(&["a", "b", "c"]);
        graph.link("a", LinkType::Blocks, "b");
        graph.link("b", LinkType::Blocks, "c");
        graph.link("c", LinkType::Blocks, "a");
        let cycles = find_existing_cycles(&graph, graph.records.values());
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].path.len(), 4);
        assert_eq!(cycles[0].path.first(), cycles[0].path.last());
    }
}

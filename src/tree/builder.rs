//! Forest construction from flat id / parent-id records

use super::node::{Forest, NodeId};
use crate::error::TreeError;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

/// Link a flat list of records into a forest.
///
/// Each record exposes an id and an optional parent id. Records whose parent
/// id resolves are attached to that record's node in input order; records with
/// no parent id stay roots. Returns the arena together with its roots, in the
/// order their records appeared.
///
/// Fails on a record that names itself as parent, on duplicate ids (checked
/// before any linking) and on a parent id that no record carries.
pub fn create_forest<T, K, I, P>(
    values: impl IntoIterator<Item = T>,
    id_selector: I,
    parent_id_selector: P,
) -> Result<(Forest<T>, Vec<NodeId>), TreeError>
where
    K: Eq + Hash + Display + Clone,
    I: Fn(&T) -> K,
    P: Fn(&T) -> Option<K>,
{
    let values: Vec<T> = values.into_iter().collect();

    if let Some(v) = values
        .iter()
        .find(|v| parent_id_selector(v).is_some_and(|p| p == id_selector(v)))
    {
        return Err(TreeError::SelfParent(id_selector(v).to_string()));
    }

    let mut forest = Forest::with_capacity(values.len());
    let mut by_id: HashMap<K, NodeId> = HashMap::with_capacity(values.len());
    let mut links: Vec<(NodeId, K, Option<K>)> = Vec::with_capacity(values.len());
    let mut duplicates = 0usize;
    let mut first_duplicate: Option<String> = None;

    for value in values {
        let id = id_selector(&value);
        let parent = parent_id_selector(&value);
        let node = forest.insert(value);
        if by_id.contains_key(&id) {
            duplicates += 1;
            first_duplicate.get_or_insert_with(|| id.to_string());
        } else {
            by_id.insert(id.clone(), node);
        }
        links.push((node, id, parent));
    }

    if let Some(first) = first_duplicate {
        return Err(TreeError::DuplicateKey {
            count: duplicates + 1,
            first,
        });
    }

    for (node, id, parent) in links {
        let Some(parent_id) = parent else {
            continue;
        };
        match by_id.get(&parent_id) {
            Some(&parent_node) => forest.attach(parent_node, node, None)?,
            None => {
                return Err(TreeError::DanglingParent {
                    id: id.to_string(),
                    parent: parent_id.to_string(),
                })
            }
        }
    }

    let roots = forest.ids().filter(|&id| forest.is_root(id)).collect();
    Ok((forest, roots))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    struct Record {
        id: &'static str,
        parent: Option<&'static str>,
    }

    fn rec(id: &'static str, parent: Option<&'static str>) -> Record {
        Record { id, parent }
    }

    fn build(records: Vec<Record>) -> Result<(Forest<Record>, Vec<NodeId>), TreeError> {
        create_forest(records, |r| r.id, |r| r.parent)
    }

    #[test]
    fn test_self_parent_rejected() {
        let err = build(vec![rec("X", Some("X"))]).unwrap_err();
        assert_eq!(err, TreeError::SelfParent("X".to_string()));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let err = build(vec![rec("A", None), rec("A", None)]).unwrap_err();
        assert_eq!(
            err,
            TreeError::DuplicateKey {
                count: 2,
                first: "A".to_string()
            }
        );
    }

    #[test]
    fn test_duplicate_detected_before_dangling_parent() {
        let err = build(vec![rec("B", Some("Z")), rec("A", None), rec("A", None)]).unwrap_err();
        assert!(matches!(err, TreeError::DuplicateKey { .. }));
    }

    #[test]
    fn test_dangling_parent_rejected() {
        let err = build(vec![rec("B", Some("Z"))]).unwrap_err();
        assert_eq!(
            err,
            TreeError::DanglingParent {
                id: "B".to_string(),
                parent: "Z".to_string()
            }
        );
    }

    #[test]
    fn test_parent_cycle_rejected() {
        let err = build(vec![rec("A", Some("B")), rec("B", Some("A"))]).unwrap_err();
        assert!(matches!(err, TreeError::RootOfTarget(_)));
    }

    #[test]
    fn test_empty_input_yields_no_roots() {
        let (forest, roots) = build(Vec::new()).unwrap();
        assert!(forest.is_empty());
        assert!(roots.is_empty());
    }

    #[test]
    fn test_children_keep_input_order_regardless_of_parent_position() {
        let (forest, roots) = build(vec![
            rec("c2", Some("p")),
            rec("p", None),
            rec("c1", Some("p")),
            rec("other", None),
        ])
        .unwrap();

        assert_eq!(roots.len(), 2);
        let p = roots[0];
        assert_eq!(forest.value(p).id, "p");
        assert_eq!(forest.value(roots[1]).id, "other");
        let children: Vec<_> = forest
            .children(p)
            .iter()
            .map(|&c| forest.value(c).id)
            .collect();
        assert_eq!(children, vec!["c2", "c1"]);
    }

    proptest! {
        /// Every record with a parent index ends up attached to that parent.
        #[test]
        fn prop_links_match_parent_ids(parents in proptest::collection::vec(proptest::option::of(0usize..64), 1..64)) {
            let records: Vec<(String, Option<String>)> = parents
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    // only link to earlier records so the input is acyclic
                    let parent = p.filter(|&p| p < i).map(|p| format!("n{}", p));
                    (format!("n{}", i), parent)
                })
                .collect();

            let (forest, roots) = create_forest(
                records.clone(),
                |r| r.0.clone(),
                |r| r.1.clone(),
            ).unwrap();

            let expected_roots = records.iter().filter(|r| r.1.is_none()).count();
            prop_assert_eq!(roots.len(), expected_roots);

            let total: usize = roots.iter().map(|&r| forest.self_and_descendants(r).count()).sum();
            prop_assert_eq!(total, records.len());

            for &root in &roots {
                for node in forest.descendants(root) {
                    let parent = forest.parent(node).unwrap();
                    prop_assert_eq!(
                        forest.value(node).1.as_deref(),
                        Some(forest.value(parent).0.as_str())
                    );
                }
            }
        }
    }
}

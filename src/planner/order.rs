//! Serial execution order for a change plan.

use std::cmp::Reverse;
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::graph::Digraph;

use super::changes::{ChangeId, ReconciliationChange};

/// Tie-break key: most dependents first, then most dependencies, then name.
type OrderKey<'a> = (Reverse<usize>, Reverse<usize>, &'a str, ChangeId);

/// Computes one total order of the changes consistent with the closure.
///
/// Changes run after everything they depend on. Among changes free to run,
/// the one with the most dependents goes first, then the one with the most
/// dependencies, then the smallest sort name. Changes caught in a cycle are
/// released one at a time, picking the one with the fewest unmet
/// dependencies.
#[must_use]
pub fn serialize_changes(
    changes: &[ReconciliationChange],
    closure: &Digraph<ChangeId>,
) -> Vec<ChangeId> {
    let dependents = closure.invert();
    let count = |graph: &Digraph<ChangeId>, id: &ChangeId| {
        graph.dependencies_of(id).filter(|other| *other != id).count()
    };

    let mut remaining: Vec<OrderKey<'_>> = changes
        .iter()
        .map(|change| {
            let id = change.id();
            (
                Reverse(count(&dependents, &id)),
                Reverse(count(closure, &id)),
                change.sort_name(),
                id,
            )
        })
        .collect();
    remaining.sort();

    let mut placed: BTreeSet<ChangeId> = BTreeSet::new();
    let mut order = Vec::with_capacity(remaining.len());
    while !remaining.is_empty() {
        let unmet = |id: &ChangeId| {
            closure
                .dependencies_of(id)
                .filter(|other| *other != id && !placed.contains(*other))
                .count()
        };
        let Some((index, blocked)) = remaining
            .iter()
            .enumerate()
            .map(|(index, key)| (index, unmet(&key.3)))
            .min_by_key(|(_, blocked)| *blocked)
        else {
            break;
        };
        if blocked > 0 {
            warn!(
                "Releasing change {} with {blocked} unmet dependencies",
                remaining[index].3
            );
        }
        let (_, _, _, id) = remaining.remove(index);
        placed.insert(id.clone());
        order.push(id);
    }

    debug!("Serialized {} changes", order.len());
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::changes::LiveStack;
    use crate::package::{PackageDefinition, ResolvedDeployment};

    fn add(name: &str) -> ReconciliationChange {
        let package = PackageDefinition {
            path: format!("example.com/{name}"),
            ..PackageDefinition::default()
        };
        ReconciliationChange::Add {
            name: name.to_string(),
            deployment: ResolvedDeployment::new(name, package, Vec::<String>::new()).unwrap(),
        }
    }

    fn remove(name: &str) -> ReconciliationChange {
        ReconciliationChange::Remove {
            name: name.to_string(),
            stack: LiveStack::new(name),
        }
    }

    fn closure(edges: &[(&str, &str)], changes: &[ReconciliationChange]) -> Digraph<ChangeId> {
        let mut graph = Digraph::new();
        for change in changes {
            graph.add_node(change.id());
        }
        for (from, to) in edges {
            graph.add_edge(ChangeId::new(*from), ChangeId::new(*to));
        }
        graph.compute_transitive_closure()
    }

    fn names(order: &[ChangeId]) -> Vec<&str> {
        order.iter().map(ChangeId::as_str).collect()
    }

    #[test]
    fn test_dependencies_come_first() {
        let changes = vec![add("web"), add("db")];
        let order = serialize_changes(&changes, &closure(&[("web", "db")], &changes));
        assert_eq!(names(&order), vec!["db", "web"]);
    }

    #[test]
    fn test_unordered_changes_sort_by_name() {
        let changes = vec![add("c"), add("a"), add("b")];
        let order = serialize_changes(&changes, &closure(&[], &changes));
        assert_eq!(names(&order), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_most_dependents_first() {
        // "z" has two dependents, "a" has one.
        let changes = vec![add("a"), add("z"), add("p"), add("q"), add("r")];
        let edges = [("p", "z"), ("q", "z"), ("r", "a")];
        let order = serialize_changes(&changes, &closure(&edges, &changes));
        assert_eq!(order[0].as_str(), "z");
        assert_eq!(order[1].as_str(), "a");
    }

    #[test]
    fn test_removals_run_before_dependents() {
        let changes = vec![add("web"), add("db"), remove("cache")];
        let edges = [("web", "db"), ("web", "cache"), ("db", "cache")];
        let order = serialize_changes(&changes, &closure(&edges, &changes));
        assert_eq!(names(&order), vec!["cache", "db", "web"]);
    }

    #[test]
    fn test_cycles_do_not_stall() {
        let changes = vec![add("a"), add("b"), add("c")];
        let edges = [("a", "b"), ("b", "a"), ("c", "a")];
        let order = serialize_changes(&changes, &closure(&edges, &changes));
        assert_eq!(order.len(), 3);
        assert_eq!(order[2].as_str(), "c");
    }
}

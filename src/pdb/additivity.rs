//! Additivity Analysis
//!
//! Two patterns are additive iff no operator has non-trivial effects on a
//! variable of each: then no plan step is counted by both projections and
//! their PDB values may be summed without losing admissibility.
//!
//! Additivity is precomputed as four boolean matrices over the variable
//! sides (prop/prop, prop/num, num/prop, num/num). Over a PDB collection
//! the relation induces a compatibility graph; its maximal cliques
//! (Bron–Kerbosch with pivoting) are the maximal additive subsets.

use std::rc::Rc;

use crate::task::NormalizedTask;
use crate::types::{MaxAdditiveSubsets, Pattern, PdbCollection};

/// Pairwise variable additivity over both variable spaces.
#[derive(Debug, Clone)]
pub struct VariableAdditivity {
    /// Indexed by propositional variable ids.
    pub prop_to_prop: Vec<Vec<bool>>,
    /// Propositional id x global numeric id.
    pub prop_to_num: Vec<Vec<bool>>,
    pub num_to_prop: Vec<Vec<bool>>,
    /// Global numeric id x global numeric id.
    pub num_to_num: Vec<Vec<bool>>,
}

/// Compute the additivity matrices of a task.
pub fn compute_additive_vars(task: &NormalizedTask) -> VariableAdditivity {
    let num_prop = task.prop_variables().len();
    let num_num = task.numeric_variables().len();
    let mut additive = VariableAdditivity {
        prop_to_prop: vec![vec![true; num_prop]; num_prop],
        prop_to_num: vec![vec![true; num_num]; num_prop],
        num_to_prop: vec![vec![true; num_prop]; num_num],
        num_to_num: vec![vec![true; num_num]; num_num],
    };

    for op in task.operators() {
        let prop_effects: Vec<usize> =
            op.propositional_effects.iter().map(|eff| eff.var).collect();
        let mut num_effects: Vec<usize> = op
            .additive_effects
            .iter()
            .enumerate()
            .filter(|&(_, &delta)| delta != 0.0)
            .map(|(idx, _)| task.global_of_regular(idx))
            .collect();
        num_effects.extend(op.assign_effects.iter().map(|&(var, _)| var));

        for &p1 in &prop_effects {
            for &p2 in &prop_effects {
                additive.prop_to_prop[p1][p2] = false;
            }
            for &n in &num_effects {
                additive.prop_to_num[p1][n] = false;
                additive.num_to_prop[n][p1] = false;
            }
        }
        for &n1 in &num_effects {
            for &n2 in &num_effects {
                additive.num_to_num[n1][n2] = false;
            }
        }
    }
    additive
}

/// True iff the two patterns may be summed admissibly.
pub fn are_patterns_additive(
    pattern1: &Pattern,
    pattern2: &Pattern,
    additive: &VariableAdditivity,
) -> bool {
    for &v1 in &pattern1.propositional {
        for &v2 in &pattern2.propositional {
            if !additive.prop_to_prop[v1][v2] {
                return false;
            }
        }
        for &v2 in &pattern2.numeric {
            if !additive.prop_to_num[v1][v2] {
                return false;
            }
        }
    }
    for &v1 in &pattern1.numeric {
        for &v2 in &pattern2.numeric {
            if !additive.num_to_num[v1][v2] {
                return false;
            }
        }
        for &v2 in &pattern2.propositional {
            if !additive.num_to_prop[v1][v2] {
                return false;
            }
        }
    }
    true
}

/// Maximal additive subsets of a PDB collection: the maximal cliques of
/// the pairwise-additivity graph.
pub fn compute_max_additive_subsets(
    pdbs: &PdbCollection,
    additive: &VariableAdditivity,
) -> MaxAdditiveSubsets {
    let n = pdbs.len();
    let mut graph: Vec<Vec<usize>> = vec![Vec::new(); n];
    for i in 0..n {
        for j in i + 1..n {
            if are_patterns_additive(pdbs[i].pattern(), pdbs[j].pattern(), additive) {
                graph[i].push(j);
                graph[j].push(i);
            }
        }
    }

    max_cliques(&graph)
        .into_iter()
        .map(|clique| clique.into_iter().map(|i| Rc::clone(&pdbs[i])).collect())
        .collect()
}

/// Restrict a known family to the members additive with `new_pattern`,
/// dropping emptied subsets. This updates the family incrementally when
/// hill climbing probes a candidate, without a full clique recomputation.
pub fn max_additive_subsets_with_pattern(
    known_subsets: &MaxAdditiveSubsets,
    new_pattern: &Pattern,
    additive: &VariableAdditivity,
) -> MaxAdditiveSubsets {
    let mut restricted: MaxAdditiveSubsets = Vec::new();
    for subset in known_subsets {
        let compatible: PdbCollection = subset
            .iter()
            .filter(|pdb| are_patterns_additive(new_pattern, pdb.pattern(), additive))
            .map(Rc::clone)
            .collect();
        if !compatible.is_empty() {
            restricted.push(compatible);
        }
    }
    if restricted.is_empty() {
        // Nothing is additive with the new pattern: the only additive
        // subset is the empty one.
        restricted.push(Vec::new());
    }
    restricted
}

/// Maximal cliques of an undirected graph, Bron–Kerbosch with pivoting.
pub fn max_cliques(graph: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let n = graph.len();
    let mut adjacent = vec![vec![false; n]; n];
    for (u, row) in graph.iter().enumerate() {
        for &v in row {
            adjacent[u][v] = true;
        }
    }

    let mut cliques = Vec::new();
    let mut current = Vec::new();
    bron_kerbosch(&adjacent, &mut current, (0..n).collect(), Vec::new(), &mut cliques);
    cliques
}

fn bron_kerbosch(
    adjacent: &[Vec<bool>],
    current: &mut Vec<usize>,
    mut candidates: Vec<usize>,
    mut excluded: Vec<usize>,
    cliques: &mut Vec<Vec<usize>>,
) {
    if candidates.is_empty() && excluded.is_empty() {
        cliques.push(current.clone());
        return;
    }

    // Pivot on the vertex covering the most candidates; only its
    // non-neighbors need to be branched on.
    let pivot = candidates
        .iter()
        .chain(excluded.iter())
        .copied()
        .max_by_key(|&u| candidates.iter().filter(|&&v| adjacent[u][v]).count())
        .expect("non-empty candidate or excluded set");
    let branch_vertices: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|&v| !adjacent[pivot][v])
        .collect();

    for v in branch_vertices {
        let next_candidates: Vec<usize> =
            candidates.iter().copied().filter(|&u| adjacent[v][u]).collect();
        let next_excluded: Vec<usize> =
            excluded.iter().copied().filter(|&u| adjacent[v][u]).collect();
        current.push(v);
        bron_kerbosch(adjacent, current, next_candidates, next_excluded, cliques);
        current.pop();
        candidates.retain(|&u| u != v);
        excluded.push(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Comparator;
    use crate::pdb::PatternDatabase;
    use crate::task::builder::{OperatorBuilder, TaskBuilder};

    #[test]
    fn test_max_cliques_triangle_plus_pendant() {
        // 0-1-2 triangle, 3 attached to 2 only.
        let graph = vec![vec![1, 2], vec![0, 2], vec![0, 1, 3], vec![2]];
        let mut cliques = max_cliques(&graph);
        for clique in &mut cliques {
            clique.sort_unstable();
        }
        cliques.sort();
        assert_eq!(cliques, vec![vec![0, 1, 2], vec![2, 3]]);
    }

    #[test]
    fn test_max_cliques_empty_graph() {
        assert_eq!(max_cliques(&[]), vec![Vec::<usize>::new()]);
    }

    #[test]
    fn test_additivity_matrices() {
        // One operator touches a and x together; b and y stay independent.
        let mut b = TaskBuilder::new();
        let a = b.prop_variable("a", 2);
        let bb = b.prop_variable("b", 2);
        let x = b.numeric_variable("x", 0.0);
        let y = b.numeric_variable("y", 0.0);
        let one = b.numeric_constant(1.0);
        b.add_operator(OperatorBuilder::new("both").effect(a, 1).increase(x, one));
        b.add_operator(OperatorBuilder::new("only_b").effect(bb, 1));
        b.add_operator(OperatorBuilder::new("only_y").increase(y, one));
        let task = crate::task::NormalizedTask::new(b.build()).unwrap();
        let additive = compute_additive_vars(&task);

        assert!(!additive.prop_to_num[a][x]);
        assert!(!additive.num_to_prop[x][a]);
        assert!(additive.prop_to_prop[a][bb]);
        assert!(additive.prop_to_num[bb][x]);
        assert!(additive.num_to_num[x][y]);

        let pa = Pattern::propositional(vec![a]);
        let px = Pattern::numeric(vec![x]);
        let py = Pattern::numeric(vec![y]);
        assert!(!are_patterns_additive(&pa, &px, &additive));
        assert!(are_patterns_additive(&pa, &py, &additive));
        assert!(are_patterns_additive(&px, &py, &additive));
    }

    #[test]
    fn test_max_additive_subsets_over_pdbs() {
        let mut b = TaskBuilder::new();
        let a = b.prop_variable("a", 2);
        let bb = b.prop_variable("b", 2);
        let x = b.numeric_variable("x", 0.0);
        let one = b.numeric_constant(1.0);
        let cmp = b.comparison("x_ge_1", x, Comparator::Ge, one);
        b.add_operator(OperatorBuilder::new("ab").effect(a, 1).effect(bb, 1));
        b.add_operator(OperatorBuilder::new("grow").increase(x, one));
        b.goal(a, 1).goal(bb, 1).goal(cmp, 1);
        let task = crate::task::NormalizedTask::new(b.build()).unwrap();
        let additive = compute_additive_vars(&task);

        let pdbs: PdbCollection = vec![
            Rc::new(
                PatternDatabase::new(Rc::clone(&task), Pattern::propositional(vec![a]), 100)
                    .unwrap(),
            ),
            Rc::new(
                PatternDatabase::new(Rc::clone(&task), Pattern::propositional(vec![bb]), 100)
                    .unwrap(),
            ),
            Rc::new(
                PatternDatabase::new(Rc::clone(&task), Pattern::numeric(vec![x]), 100).unwrap(),
            ),
        ];
        let subsets = compute_max_additive_subsets(&pdbs, &additive);

        // a and b conflict (operator "ab"); x is additive with both, so
        // the maximal cliques are {a, x} and {b, x}.
        assert_eq!(subsets.len(), 2);
        for subset in &subsets {
            assert_eq!(subset.len(), 2);
            assert!(subset.iter().any(|pdb| !pdb.pattern().numeric.is_empty()));
        }

        // Restricting by a pattern clashing with x keeps only a/b.
        let restricted = max_additive_subsets_with_pattern(
            &subsets,
            &Pattern::numeric(vec![x]),
            &additive,
        );
        for subset in &restricted {
            assert!(subset.iter().all(|pdb| pdb.pattern().numeric.is_empty()));
        }
    }
}

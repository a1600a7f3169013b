//! Generator-to-heuristic pipeline tests: each generator feeding the
//! heuristic façade on a task with both propositional structure and a
//! numeric resource, checked for admissibility and consistency against
//! the concrete state space.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use numplan::condition::Comparator;
use numplan::task::{NormalizedTask, OperatorBuilder, State, TaskBuilder};
use numplan::{
    CanonicalPdbsHeuristic, HeuristicValue, PatternCollectionGeneratorHillclimbing,
    PatternCollectionGeneratorSystematic, PatternGeneratorGreedy, PdbHeuristic,
    VariableOrderType,
};

/// Rover-flavored task: drive between three sites, collect two samples,
/// each drive burns energy.
fn rover_task() -> Rc<NormalizedTask> {
    let mut b = TaskBuilder::new();
    let at = b.prop_variable("rover_at", 3);
    let s1 = b.prop_variable("sample1", 2);
    let s2 = b.prop_variable("sample2", 2);
    let energy = b.numeric_variable("energy", 6.0);
    let one = b.numeric_constant(1.0);
    let zero = b.numeric_constant(0.0);
    let powered = b.comparison("powered", energy, Comparator::Gt, zero);

    for (from, to) in [(0usize, 1usize), (1, 0), (1, 2), (2, 1)] {
        b.add_operator(
            OperatorBuilder::new(&format!("drive_{from}_{to}"))
                .precondition(at, from)
                .precondition(powered, 1)
                .effect(at, to)
                .decrease(energy, one)
                .cost(1.0),
        );
    }
    b.add_operator(
        OperatorBuilder::new("collect1").precondition(at, 1).effect(s1, 1).cost(1.0),
    );
    b.add_operator(
        OperatorBuilder::new("collect2").precondition(at, 2).effect(s2, 1).cost(1.0),
    );
    b.goal(s1, 1).goal(s2, 1);
    NormalizedTask::new(b.build()).unwrap()
}

fn key(state: &State) -> (Vec<usize>, Vec<u64>) {
    (
        state.propositional.clone(),
        state.numeric.iter().map(|v| v.to_bits()).collect(),
    )
}

/// Concrete reachable states with exact goal distances and outgoing arcs.
fn explore(task: &NormalizedTask) -> (Vec<(State, f64)>, Vec<Vec<(usize, f64)>>) {
    let mut states = vec![task.initial_state()];
    let mut ids = HashMap::new();
    ids.insert(key(&states[0]), 0);
    let mut arcs: Vec<Vec<(usize, f64)>> = vec![Vec::new()];

    let mut index = 0;
    while index < states.len() {
        let state = states[index].clone();
        for op_id in task.applicable_operators(&state) {
            let successor = task.apply(&state, op_id);
            let id = *ids.entry(key(&successor)).or_insert_with(|| {
                states.push(successor);
                arcs.push(Vec::new());
                states.len() - 1
            });
            arcs[index].push((id, task.operators()[op_id].cost));
        }
        index += 1;
    }

    let mut distances = vec![f64::INFINITY; states.len()];
    for (id, state) in states.iter().enumerate() {
        if task.is_goal_state(state) {
            distances[id] = 0.0;
        }
    }
    loop {
        let mut changed = false;
        for (id, outgoing) in arcs.iter().enumerate() {
            for &(succ, cost) in outgoing {
                if distances[succ] + cost < distances[id] {
                    distances[id] = distances[succ] + cost;
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
    (states.into_iter().zip(distances).collect(), arcs)
}

fn value_of(eval: &numplan::Evaluation) -> f64 {
    match eval.value {
        HeuristicValue::Estimate(h) => h,
        HeuristicValue::DeadEnd => f64::INFINITY,
    }
}

#[test]
fn systematic_canonical_heuristic_is_admissible_and_consistent() -> anyhow::Result<()> {
    let task = rover_task();
    let generator = PatternCollectionGeneratorSystematic::new(2, true, 10_000);
    let heuristic = CanonicalPdbsHeuristic::new(&task, &generator, true)?;

    let (concrete, arcs) = explore(&task);
    for (state, true_distance) in &concrete {
        let h = value_of(&heuristic.evaluate(state));
        assert!(h <= true_distance + 1e-9, "h={h} > g*={true_distance}");
    }
    // Consistency: h(s) <= cost + h(s') along every concrete arc.
    for (id, outgoing) in arcs.iter().enumerate() {
        let h = value_of(&heuristic.evaluate(&concrete[id].0));
        for &(succ, cost) in outgoing {
            let h_succ = value_of(&heuristic.evaluate(&concrete[succ].0));
            assert!(
                h <= cost + h_succ + 1e-9,
                "inconsistent: h(s)={h}, cost={cost}, h(s')={h_succ}"
            );
        }
    }
    Ok(())
}

#[test]
fn hillclimbing_canonical_heuristic_is_admissible() -> anyhow::Result<()> {
    let task = rover_task();
    let generator = PatternCollectionGeneratorHillclimbing::new(
        10_000,
        1_000_000,
        10_000_000,
        100,
        1,
        Some(Duration::from_secs(10)),
        42,
    );
    let heuristic = CanonicalPdbsHeuristic::new(&task, &generator, true)?;
    let (concrete, _) = explore(&task);
    for (state, true_distance) in &concrete {
        let h = value_of(&heuristic.evaluate(state));
        assert!(h <= true_distance + 1e-9, "h={h} > g*={true_distance}");
    }
    Ok(())
}

#[test]
fn greedy_pdb_heuristic_is_admissible() {
    let task = rover_task();
    let generator =
        PatternGeneratorGreedy::new(100_000, VariableOrderType::GoalCausalLevel, true, 0);
    let heuristic = PdbHeuristic::new(&task, &generator, 10_000).unwrap();
    let (concrete, _) = explore(&task);
    for (state, true_distance) in &concrete {
        let h = value_of(&heuristic.evaluate(state));
        assert!(h <= true_distance + 1e-9, "h={h} > g*={true_distance}");
    }
    // The initial state needs at least a drive and two collects.
    let h0 = value_of(&heuristic.evaluate(&task.initial_state()));
    assert!(h0 >= 1.0);
}

#[test]
fn expired_timer_still_yields_a_usable_heuristic() {
    let task = rover_task();
    // A zero-ish budget expires during the first iteration; the initial
    // goal collection must still come back intact.
    let generator = PatternCollectionGeneratorHillclimbing::new(
        10_000,
        1_000_000,
        10_000_000,
        100,
        1,
        Some(Duration::from_nanos(1)),
        0,
    );
    let heuristic = CanonicalPdbsHeuristic::new(&task, &generator, false).unwrap();
    let eval = heuristic.evaluate(&task.initial_state());
    match eval.value {
        HeuristicValue::Estimate(h) => assert!(h >= 2.0),
        HeuristicValue::DeadEnd => panic!("initial state is solvable"),
    }
}

//! Random-Walk State Sampling
//!
//! Draws sample states for hill climbing by random walks from the
//! initial state. The walk length is binomially distributed around twice
//! the estimated solution depth `h(s0) / avg_cost`; walks restart from
//! the initial state when they hit a dead end or a state without
//! applicable operators.

use rand::rngs::StdRng;
use rand::Rng;

use crate::errors::Result;
use crate::task::{NormalizedTask, State};
use crate::timeout::CountdownTimer;

/// Sample `num_samples` states by random walks.
///
/// `init_h` is the heuristic estimate of the initial state and
/// `average_operator_cost` the task-wide mean cost; together they set
/// the expected walk length. `is_dead_end` restarts walks that strayed
/// into a provably dead region. Unwinds with a timeout error when the
/// timer expires mid-sampling.
pub fn sample_states_with_random_walks(
    task: &NormalizedTask,
    num_samples: usize,
    init_h: f64,
    average_operator_cost: f64,
    is_dead_end: impl Fn(&State) -> bool,
    timer: &CountdownTimer,
    rng: &mut StdRng,
) -> Result<Vec<State>> {
    let n = if init_h == 0.0 {
        10
    } else {
        // Expected solution depth, in steps.
        (init_h / average_operator_cost.max(f64::MIN_POSITIVE)).ceil() as usize + 1
    };

    let initial = task.initial_state();
    let mut samples = Vec::with_capacity(num_samples);
    for _ in 0..num_samples {
        timer.check()?;

        // Binomial(2n, 0.5), expectation n.
        let mut length = 0usize;
        for _ in 0..2 * n {
            if rng.gen_bool(0.5) {
                length += 1;
            }
        }

        let mut current = initial.clone();
        for _ in 0..length {
            let applicable = task.applicable_operators(&current);
            if applicable.is_empty() {
                // Stuck: restart the walk.
                current = initial.clone();
                continue;
            }
            let op = applicable[rng.gen_range(0..applicable.len())];
            current = task.apply(&current, op);
            if is_dead_end(&current) {
                current = initial.clone();
            }
        }
        samples.push(current);
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Comparator;
    use crate::task::builder::{OperatorBuilder, TaskBuilder};
    use rand::SeedableRng;
    use std::time::Duration;

    fn counter_task() -> std::rc::Rc<NormalizedTask> {
        let mut b = TaskBuilder::new();
        let x = b.numeric_variable("x", 0.0);
        let one = b.numeric_constant(1.0);
        let five = b.numeric_constant(5.0);
        let cmp = b.comparison("x_ge_5", x, Comparator::Ge, five);
        b.add_operator(OperatorBuilder::new("up").increase(x, one).cost(1.0));
        b.goal(cmp, 1);
        NormalizedTask::new(b.build()).unwrap()
    }

    #[test]
    fn test_samples_are_reachable_states() {
        let task = counter_task();
        let mut rng = StdRng::seed_from_u64(7);
        let samples = sample_states_with_random_walks(
            &task,
            25,
            5.0,
            1.0,
            |_| false,
            &CountdownTimer::infinite(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(samples.len(), 25);
        // Only "up" exists, so every sample has x in [0, walk length].
        for sample in &samples {
            assert!(sample.numeric[0] >= 0.0);
        }
    }

    #[test]
    fn test_sampling_is_seed_deterministic() {
        let task = counter_task();
        let mut rng1 = StdRng::seed_from_u64(11);
        let mut rng2 = StdRng::seed_from_u64(11);
        let timer = CountdownTimer::infinite();
        let a = sample_states_with_random_walks(&task, 10, 3.0, 1.0, |_| false, &timer, &mut rng1)
            .unwrap();
        let b = sample_states_with_random_walks(&task, 10, 3.0, 1.0, |_| false, &timer, &mut rng2)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_dead_end_restarts_walk() {
        let task = counter_task();
        let mut rng = StdRng::seed_from_u64(3);
        // Everything is "dead": walks always restart, so every sample is
        // the initial state.
        let samples = sample_states_with_random_walks(
            &task,
            5,
            5.0,
            1.0,
            |_| true,
            &CountdownTimer::infinite(),
            &mut rng,
        )
        .unwrap();
        for sample in samples {
            assert_eq!(sample, task.initial_state());
        }
    }

    #[test]
    fn test_timeout_propagates() {
        let task = counter_task();
        let mut rng = StdRng::seed_from_u64(3);
        let timer = CountdownTimer::new(Some(Duration::ZERO));
        std::thread::sleep(Duration::from_millis(2));
        let result = sample_states_with_random_walks(
            &task,
            5,
            5.0,
            1.0,
            |_| false,
            &timer,
            &mut rng,
        );
        assert!(result.unwrap_err().is_timeout());
    }
}

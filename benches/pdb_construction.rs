//! Pattern database construction benchmarks.

use std::rc::Rc;

use criterion::{criterion_group, criterion_main, Criterion};

use numplan::condition::Comparator;
use numplan::task::{NormalizedTask, OperatorBuilder, TaskBuilder};
use numplan::{Pattern, PatternDatabase};

/// A chain of binary switches plus one fuel-style counter.
fn build_task(num_switches: usize) -> Rc<NormalizedTask> {
    let mut b = TaskBuilder::new();
    let switches: Vec<usize> = (0..num_switches)
        .map(|i| b.prop_variable(&format!("s{i}"), 2))
        .collect();
    let fuel = b.numeric_variable("fuel", 0.0);
    let one = b.numeric_constant(1.0);
    let target = b.numeric_constant(20.0);
    let fueled = b.comparison("fueled", fuel, Comparator::Ge, target);

    for (i, &s) in switches.iter().enumerate() {
        let mut op = OperatorBuilder::new(&format!("flip{i}")).effect(s, 1).cost(1.0);
        if i > 0 {
            op = op.precondition(switches[i - 1], 1);
        }
        b.add_operator(op);
        b.goal(s, 1);
    }
    b.add_operator(OperatorBuilder::new("refuel").increase(fuel, one).cost(1.0));
    b.goal(fueled, 1);
    NormalizedTask::new(b.build()).unwrap()
}

fn bench_propositional_pdb(c: &mut Criterion) {
    let task = build_task(12);
    let pattern = Pattern::propositional((0..12).collect());
    c.bench_function("propositional_pdb_12_vars", |bencher| {
        bencher.iter(|| {
            PatternDatabase::new(Rc::clone(&task), pattern.clone(), 100_000).unwrap()
        })
    });
}

fn bench_numeric_pdb(c: &mut Criterion) {
    let task = build_task(4);
    let pattern = Pattern::new(vec![0, 1], vec![0]);
    c.bench_function("numeric_pdb_budget_5000", |bencher| {
        bencher.iter(|| PatternDatabase::new(Rc::clone(&task), pattern.clone(), 5_000).unwrap())
    });
}

criterion_group!(benches, bench_propositional_pdb, bench_numeric_pdb);
criterion_main!(benches);

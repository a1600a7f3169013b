//! End-to-end scenarios over small hand-built tasks: expression algebra,
//! auxiliary variables, propositional and budgeted numeric pattern
//! databases, and canonical additivity.

use std::rc::Rc;

use numplan::condition::{Comparator, RegularNumericCondition};
use numplan::expression::{ArithExpr, ArithOp};
use numplan::task::{NormalizedTask, OperatorBuilder, State, TaskBuilder};
use numplan::pdb::additivity::{compute_additive_vars, compute_max_additive_subsets};
use numplan::{CanonicalPdbs, Pattern, PatternDatabase, PdbCollection};

/// Constant expressions fold to a leaf and ignore the substituted value.
#[test]
fn scenario_constant_expression() {
    let e = ArithExpr::binary(
        ArithOp::Add,
        ArithExpr::constant(2.0),
        ArithExpr::binary(ArithOp::Mul, ArithExpr::constant(3.0), ArithExpr::constant(4.0)),
    );
    for v in [-1.0, 0.0, 99.0] {
        assert_eq!(e.evaluate(v), 14.0);
    }
    assert!(e.is_constant());
    assert_eq!(*e.simplify().unwrap(), numplan::expression::ArithExpr::Const(14.0));
}

/// Affine form and condition normalization: (var0 * 2) + 5 >= 11 is
/// var0 >= 3.
#[test]
fn scenario_affine_expression() {
    let e = ArithExpr::binary(
        ArithOp::Add,
        ArithExpr::binary(ArithOp::Mul, ArithExpr::var(0), ArithExpr::constant(2.0)),
        ArithExpr::constant(5.0),
    );
    assert_eq!(e.multiplier().unwrap(), 2.0);
    assert_eq!(e.summand().unwrap(), 5.0);
    assert_eq!(e.evaluate(3.0), 11.0);

    let cond =
        RegularNumericCondition::new(e, Comparator::Ge, ArithExpr::constant(11.0)).unwrap();
    let (cmp, bound) = cond.normalized().unwrap();
    assert_eq!(cmp, Comparator::Ge);
    assert_eq!(bound, 3.0);
    assert!(!cond.satisfied(2.0));
    assert!(cond.satisfied(3.0));
}

/// The comparison var0 - var1 >= 0 synthesizes z := var0 - var1; an
/// operator adding +1 to var0 and +2 to var1 induces -1 on z, and the
/// initial values 5 and 4 seed z to 1.
#[test]
fn scenario_auxiliary_variable() {
    let mut b = TaskBuilder::new();
    let v0 = b.numeric_variable("var0", 5.0);
    let v1 = b.numeric_variable("var1", 4.0);
    let one = b.numeric_constant(1.0);
    let two = b.numeric_constant(2.0);
    let cmp = b.comparison("v0_ge_v1", v0, Comparator::Ge, v1);
    b.add_operator(
        OperatorBuilder::new("drift").increase(v0, one).increase(v1, two).cost(1.0),
    );
    b.goal(cmp, 1);
    let task = NormalizedTask::new(b.build()).unwrap();

    let (aux_id, _) = task.auxiliary_variables()[0];
    let aux_index = task.regular_index(aux_id).unwrap();
    assert_eq!(task.initial_state().numeric[aux_index], 1.0);
    assert_eq!(task.operators()[0].additive_effects[aux_index], -1.0);
}

/// Two binary variables, goal a=1 and b=1, where a's achiever requires
/// b: the dense distance table is [2, 1, 1, 0] in mixed-radix order.
#[test]
fn scenario_propositional_pdb() {
    let mut b = TaskBuilder::new();
    let a = b.prop_variable("a", 2);
    let bb = b.prop_variable("b", 2);
    b.add_operator(OperatorBuilder::new("set_a").precondition(bb, 1).effect(a, 1).cost(1.0));
    b.add_operator(OperatorBuilder::new("set_b").effect(bb, 1).cost(1.0));
    b.goal(a, 1).goal(bb, 1);
    let task = NormalizedTask::new(b.build()).unwrap();

    let pdb =
        PatternDatabase::new(Rc::clone(&task), Pattern::propositional(vec![a, bb]), 1000).unwrap();
    let table: Vec<f64> = (0..4)
        .map(|index| pdb.value(&State::new(vec![index & 1, index >> 1], vec![])))
        .collect();
    assert_eq!(table, vec![2.0, 1.0, 1.0, 0.0]);
}

/// One numeric counter with +1/+2 operators toward x >= 3: small values
/// get exact distances under a generous budget; under a tiny budget,
/// projections outside the explored ball fall back admissibly.
#[test]
fn scenario_numeric_pdb_with_budget() {
    let mut b = TaskBuilder::new();
    let x = b.numeric_variable("x", 0.0);
    let one = b.numeric_constant(1.0);
    let two = b.numeric_constant(2.0);
    let three = b.numeric_constant(3.0);
    let cmp = b.comparison("x_ge_3", x, Comparator::Ge, three);
    b.add_operator(OperatorBuilder::new("plus1").increase(x, one).cost(1.0));
    b.add_operator(OperatorBuilder::new("plus2").increase(x, two).cost(1.0));
    b.goal(cmp, 1);
    let task = NormalizedTask::new(b.build()).unwrap();

    let state = |v: f64| {
        let mut s = task.initial_state();
        s.numeric[0] = v;
        s
    };

    let generous =
        PatternDatabase::new(Rc::clone(&task), Pattern::numeric(vec![x]), 1000).unwrap();
    for (v, h) in [(0.0, 2.0), (1.0, 1.0), (2.0, 1.0), (3.0, 0.0), (4.0, 0.0), (5.0, 0.0)] {
        assert_eq!(generous.value(&state(v)), h, "h(x={v})");
    }

    let tiny = PatternDatabase::new(Rc::clone(&task), Pattern::numeric(vec![x]), 2).unwrap();
    assert!(!tiny.construction_stats().exhausted_abstract_state_space);
    // A non-goal projection never reached: minimum action cost.
    let (found, h) = tiny.lookup(&state(-4.0));
    assert!(!found);
    assert_eq!(h, 1.0);
    // A goal projection never reached: zero.
    let (found, h) = tiny.lookup(&state(40.0));
    assert!(!found);
    assert_eq!(h, 0.0);
}

/// Two PDBs over disjoint patterns with no shared operator sum exactly.
#[test]
fn scenario_canonical_additivity() {
    let mut b = TaskBuilder::new();
    let a = b.prop_variable("a", 3);
    let x = b.numeric_variable("x", 0.0);
    let one = b.numeric_constant(1.0);
    let four = b.numeric_constant(4.0);
    let cmp = b.comparison("x_ge_4", x, Comparator::Ge, four);
    b.add_operator(OperatorBuilder::new("a1").effect(a, 1).cost(1.0));
    b.add_operator(OperatorBuilder::new("a2").precondition(a, 1).effect(a, 2).cost(1.0));
    b.add_operator(OperatorBuilder::new("gx").increase(x, one).cost(1.0));
    b.goal(a, 2).goal(cmp, 1);
    let task = NormalizedTask::new(b.build()).unwrap();

    let pdbs: PdbCollection = vec![
        Rc::new(
            PatternDatabase::new(Rc::clone(&task), Pattern::propositional(vec![a]), 1000).unwrap(),
        ),
        Rc::new(PatternDatabase::new(Rc::clone(&task), Pattern::numeric(vec![x]), 1000).unwrap()),
    ];
    let additive = compute_additive_vars(&task);
    let subsets = compute_max_additive_subsets(&pdbs, &additive);
    assert_eq!(subsets.len(), 1);
    let canonical = CanonicalPdbs::new(subsets, false);

    let initial = task.initial_state();
    let expected = pdbs[0].value(&initial) + pdbs[1].value(&initial);
    assert_eq!(canonical.value(&initial), expected);
    assert_eq!(expected, 2.0 + 4.0);
}

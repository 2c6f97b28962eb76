// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Tessella Inc.

//! Integration tests for the expression core: interpreter/compiler
//! equivalence, constant folding, and tolerance semantics

use std::cell::RefCell;
use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tessella::{
    compile, evaluate, BoolExpr, BuildError, Edge, Expr, ExprKind, NumExpr, Shape, ShapeSet,
    Value, Vertex,
};

/// Shape set that fails every lookup
struct NoShapes;

impl ShapeSet for NoShapes {
    fn edge(&self, _name: &str) -> Option<&Edge> {
        None
    }
    fn vertex(&self, _name: &str) -> Option<&Vertex> {
        None
    }
}

/// Shape set that records how often each feature is resolved
struct CountingShapes {
    inner: Shape,
    lookups: RefCell<HashMap<String, usize>>,
}

impl CountingShapes {
    fn new(inner: Shape) -> Self {
        Self {
            inner,
            lookups: RefCell::new(HashMap::new()),
        }
    }

    fn lookups_of(&self, name: &str) -> usize {
        self.lookups.borrow().get(name).copied().unwrap_or(0)
    }
}

impl ShapeSet for CountingShapes {
    fn edge(&self, name: &str) -> Option<&Edge> {
        *self.lookups.borrow_mut().entry(name.to_string()).or_default() += 1;
        self.inner.edge(name)
    }
    fn vertex(&self, name: &str) -> Option<&Vertex> {
        *self.lookups.borrow_mut().entry(name.to_string()).or_default() += 1;
        self.inner.vertex(name)
    }
}

fn num(v: f64) -> NumExpr {
    NumExpr::number(v)
}

fn edge(name: &str) -> NumExpr {
    NumExpr::edge_length(name).unwrap()
}

fn shape_with_edges(pairs: &[(&str, f64)]) -> Shape {
    let mut s = Shape::new("test");
    for (name, length) in pairs {
        s.add_edge(*name, *length).unwrap();
    }
    s
}

#[test]
fn test_constant_tree_is_independent_of_shapes() {
    let tree = Expr::Bool(BoolExpr::equal(vec![num(1.0), num(1.0)]).unwrap());
    // interpreting against a shape set with no features still succeeds
    assert_eq!(evaluate(&tree, &NoShapes).unwrap(), Value::Bool(true));
    // and the compiled closure never performs a lookup at all
    let code = compile(&tree);
    assert!(code.is_const());
    assert_eq!(code.evaluate(&NoShapes).unwrap(), Value::Bool(true));
}

#[test]
fn test_tolerance_examples() {
    let s = NoShapes;
    let eq = BoolExpr::equal(vec![num(1.0), num(1.00005), num(0.99998)]).unwrap();
    assert!(eq.evaluate(&s).unwrap());
    let eq = BoolExpr::equal(vec![num(1.0), num(1.0002)]).unwrap();
    assert!(!eq.evaluate(&s).unwrap());

    let ne = BoolExpr::not_equal(vec![num(1.0), num(2.0), num(1.0)]).unwrap();
    assert!(!ne.evaluate(&s).unwrap());
    let ne = BoolExpr::not_equal(vec![num(1.0), num(1.00005)]).unwrap();
    assert!(ne.evaluate(&s).unwrap());

    let gt = BoolExpr::greater_than(vec![num(3.0), num(2.0), num(1.0)]).unwrap();
    assert!(gt.evaluate(&s).unwrap());
    let gt = BoolExpr::greater_than(vec![num(3.0), num(3.00005)]).unwrap();
    assert!(!gt.evaluate(&s).unwrap());

    let ge = BoolExpr::greater_or_equal(vec![num(3.0), num(3.0), num(2.0)]).unwrap();
    assert!(ge.evaluate(&s).unwrap());
}

#[test]
fn test_construction_fails_before_evaluation() {
    let err = BoolExpr::comparison(ExprKind::Add, vec![num(1.0), num(2.0)]).unwrap_err();
    assert!(matches!(err, BuildError::InvalidKind { kind: ExprKind::Add, .. }));

    let err = NumExpr::arithmetic(ExprKind::And, vec![num(1.0)]).unwrap_err();
    assert!(matches!(err, BuildError::InvalidKind { kind: ExprKind::And, .. }));

    assert!(matches!(NumExpr::edge_length(" "), Err(BuildError::EmptyName)));
}

#[test]
fn test_evaluation_is_idempotent() {
    let shape = shape_with_edges(&[("AB", 1.0), ("BC", 1.5)]);
    let tree = Expr::Bool(BoolExpr::less_than(vec![edge("AB"), edge("BC")]).unwrap());
    let first = evaluate(&tree, &shape).unwrap();
    let second = evaluate(&tree, &shape).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, Value::Bool(true));
}

#[test]
fn test_not_equal_special_and_general_paths_agree() {
    let cases = [(1.0, 1.0), (1.0, 2.0), (1.0, 1.00005), (0.0, -0.0)];
    for (a, b) in cases {
        let shape = shape_with_edges(&[("x", a), ("y", b)]);

        // const/const, const/var, var/var all describe the same comparison
        let const_const = BoolExpr::not_equal(vec![num(a), num(b)]).unwrap();
        let const_var = BoolExpr::not_equal(vec![num(a), edge("y")]).unwrap();
        let var_var = BoolExpr::not_equal(vec![edge("x"), edge("y")]).unwrap();

        let expected = var_var.evaluate(&shape).unwrap();
        for tree in [&const_const, &const_var, &var_var] {
            assert_eq!(tree.evaluate(&shape).unwrap(), expected, "interp {a} vs {b}");
            assert_eq!(
                tree.compile().evaluate(&shape).unwrap(),
                expected,
                "compiled {a} vs {b}"
            );
        }
    }
}

#[test]
fn test_ordered_chain_evaluates_shared_operand_once() {
    let shape = CountingShapes::new(shape_with_edges(&[("a", 3.0), ("x", 2.0), ("b", 1.0)]));
    let chain = BoolExpr::greater_than(vec![edge("a"), edge("x"), edge("b")]).unwrap();

    let code = chain.compile();
    assert!(code.evaluate(&shape).unwrap());
    // "x" sits in both runtime pairs but is bound to a temporary once
    assert_eq!(shape.lookups_of("x"), 1);
}

#[test]
fn test_violated_constant_pair_skips_all_lookups() {
    let chain = BoolExpr::greater_than(vec![edge("m"), num(3.0), num(5.0)]).unwrap();
    let code = chain.compile();
    assert!(code.is_const());
    assert!(!code.evaluate(&NoShapes).unwrap());
}

#[test]
fn test_compiled_closure_outlives_source_tree() {
    let shape = shape_with_edges(&[("AB", 2.0)]);
    let code = {
        let tree = BoolExpr::equal(vec![edge("AB"), num(2.0)]).unwrap();
        tree.compile()
    };
    assert!(code.evaluate(&shape).unwrap());
}

#[test]
fn test_serde_round_trip() {
    let shape = shape_with_edges(&[("AB", 2.0), ("BC", 2.0)]);
    let tree = Expr::Bool(
        BoolExpr::and(vec![
            BoolExpr::equal(vec![edge("AB"), edge("BC")]).unwrap(),
            BoolExpr::greater_than(vec![edge("AB"), num(1.0)]).unwrap(),
        ])
        .unwrap(),
    );

    let json = serde_json::to_string(&tree).unwrap();
    let back: Expr = serde_json::from_str(&json).unwrap();
    assert_eq!(
        evaluate(&back, &shape).unwrap(),
        evaluate(&tree, &shape).unwrap()
    );
}

// ── Randomized interpreter/compiler equivalence ──────────────────────────

const EDGE_NAMES: [&str; 4] = ["E0", "E1", "E2", "E3"];
const VERTEX_NAMES: [&str; 3] = ["V0", "V1", "V2"];

fn random_shape(rng: &mut StdRng) -> Shape {
    let mut s = Shape::new("random");
    for name in EDGE_NAMES {
        s.add_edge(name, rng.gen_range(0.5..3.0)).unwrap();
    }
    for name in VERTEX_NAMES {
        s.add_vertex(name, rng.gen_range(30.0..150.0)).unwrap();
    }
    s
}

/// Positive leaf, safe as a divisor
fn random_leaf(rng: &mut StdRng) -> NumExpr {
    match rng.gen_range(0..3) {
        0 => num(rng.gen_range(0.5..3.0)),
        1 => edge(EDGE_NAMES[rng.gen_range(0..EDGE_NAMES.len())]),
        _ => NumExpr::vertex_angle(VERTEX_NAMES[rng.gen_range(0..VERTEX_NAMES.len())]).unwrap(),
    }
}

fn random_num(rng: &mut StdRng, depth: u32) -> NumExpr {
    if depth == 0 || rng.gen_bool(0.4) {
        return random_leaf(rng);
    }
    let kind = [
        ExprKind::Add,
        ExprKind::Subtract,
        ExprKind::Multiply,
        ExprKind::Divide,
    ][rng.gen_range(0..4)];
    let count = rng.gen_range(2..=3);
    let operands = if kind == ExprKind::Divide {
        // keep divisors away from zero so no NaN can arise downstream
        let mut ops = vec![random_num(rng, depth - 1)];
        ops.extend((1..count).map(|_| random_leaf(rng)));
        ops
    } else {
        (0..count).map(|_| random_num(rng, depth - 1)).collect()
    };
    NumExpr::arithmetic(kind, operands).unwrap()
}

fn random_bool(rng: &mut StdRng, depth: u32) -> BoolExpr {
    if depth == 0 || rng.gen_bool(0.5) {
        let kind = [
            ExprKind::Equal,
            ExprKind::NotEqual,
            ExprKind::GreaterThan,
            ExprKind::LessThan,
            ExprKind::GreaterOrEqual,
            ExprKind::LessOrEqual,
        ][rng.gen_range(0..6)];
        let count = rng.gen_range(2..=4);
        let operands = (0..count).map(|_| random_num(rng, 2)).collect();
        return BoolExpr::comparison(kind, operands).unwrap();
    }
    match rng.gen_range(0..5) {
        0 => BoolExpr::negate(random_bool(rng, depth - 1)),
        n => {
            let kind = [ExprKind::And, ExprKind::Or, ExprKind::Xor, ExprKind::BoolEqual]
                [n as usize - 1];
            let count = rng.gen_range(2..=3);
            let operands = (0..count).map(|_| random_bool(rng, depth - 1)).collect();
            BoolExpr::logical(kind, operands).unwrap()
        }
    }
}

#[test]
fn test_randomized_numeric_equivalence() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let shape = random_shape(&mut rng);
        let tree = random_num(&mut rng, 3);
        let walked = tree.evaluate(&shape).unwrap();
        let compiled = tree.compile().evaluate(&shape).unwrap();
        assert_eq!(walked, compiled, "tree {tree:?}");
    }
}

#[test]
fn test_randomized_boolean_equivalence() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..300 {
        let shape = random_shape(&mut rng);
        let tree = random_bool(&mut rng, 3);
        let walked = tree.evaluate(&shape).unwrap();
        let compiled = tree.compile().evaluate(&shape).unwrap();
        assert_eq!(walked, compiled, "tree {tree:?}");
    }
}

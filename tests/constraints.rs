// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Tessella Inc.

//! Integration tests for constraint checking over polygon-derived shapes

use nalgebra::Point2;
use tessella::{BoolExpr, Constraint, ConstraintSet, NumExpr, Shape};

fn edge(name: &str) -> NumExpr {
    NumExpr::edge_length(name).unwrap()
}

fn vertex(name: &str) -> NumExpr {
    NumExpr::vertex_angle(name).unwrap()
}

fn pentagon_rules() -> ConstraintSet {
    let edges: Vec<NumExpr> = ["AB", "BC", "CD", "DE", "EA"].map(edge).into();
    let angles: Vec<NumExpr> = ["A", "B", "C", "D", "E"].map(vertex).into();

    [
        Constraint::new("edges-equal", BoolExpr::equal(edges).unwrap()),
        Constraint::new(
            "angles-are-108",
            BoolExpr::equal(
                angles
                    .iter()
                    .cloned()
                    .chain([NumExpr::number(108.0)])
                    .collect(),
            )
            .unwrap(),
        ),
        Constraint::new(
            "angle-sum-is-540",
            BoolExpr::equal(vec![
                NumExpr::add(angles).unwrap(),
                NumExpr::number(540.0),
            ])
            .unwrap(),
        ),
    ]
    .into_iter()
    .collect()
}

#[test]
fn test_regular_pentagon_satisfies_rules() {
    let rules = pentagon_rules();
    let pentagon = Shape::regular("pentagon", 5, 1.0).unwrap();
    assert!(rules.is_satisfied(&pentagon).unwrap());
    assert!(rules.compile().is_satisfied(&pentagon).unwrap());
}

#[test]
fn test_irregular_pentagon_violates_named_rules() {
    let rules = pentagon_rules();
    let points = [
        Point2::new(0.0, 0.0),
        Point2::new(2.0, 0.0),
        Point2::new(2.5, 1.0),
        Point2::new(1.0, 2.0),
        Point2::new(-0.5, 1.0),
    ];
    let lopsided = Shape::from_polygon("lopsided", &["A", "B", "C", "D", "E"], &points).unwrap();

    let violations = rules.check_all(&lopsided).unwrap();
    let names: Vec<&str> = violations.iter().map(|v| v.constraint.as_str()).collect();
    assert!(names.contains(&"edges-equal"));
    assert!(names.contains(&"angles-are-108"));
    // interior angles of any simple pentagon still sum to 540
    assert!(!names.contains(&"angle-sum-is-540"));
}

#[test]
fn test_compiled_set_agrees_with_walked_set() {
    let rules = pentagon_rules();
    let compiled = rules.compile();
    let shapes = [
        Shape::regular("p1", 5, 1.0).unwrap(),
        Shape::regular("p2", 5, 2.5).unwrap(),
    ];
    for shape in &shapes {
        assert_eq!(
            rules.check_all(shape).unwrap(),
            compiled.check_all(shape).unwrap()
        );
    }
}

#[test]
fn test_batch_check_over_candidates() {
    let mut rules = ConstraintSet::new();
    rules.push(Constraint::new(
        "edges-equal",
        BoolExpr::equal(vec![edge("AB"), edge("BC"), edge("CD")]).unwrap(),
    ));

    let mut candidates = Vec::new();
    for i in 0..16 {
        let mut s = Shape::new(format!("candidate-{i}"));
        s.add_edge("AB", 1.0).unwrap();
        s.add_edge("BC", 1.0).unwrap();
        // every fourth candidate breaks the rule
        let cd = if i % 4 == 0 { 2.0 } else { 1.0 };
        s.add_edge("CD", cd).unwrap();
        candidates.push(s);
    }

    let reports = rules.check_shapes(&candidates).unwrap();
    assert_eq!(reports.len(), candidates.len());
    for (i, report) in reports.iter().enumerate() {
        assert_eq!(report.shape, format!("candidate-{i}"));
        assert_eq!(report.passed(), i % 4 != 0);
    }
}

#[test]
fn test_shape_serde_round_trip() {
    let pentagon = Shape::regular("pentagon", 5, 1.0).unwrap();
    let json = serde_json::to_string(&pentagon).unwrap();
    let back: Shape = serde_json::from_str(&json).unwrap();

    assert_eq!(back.name(), "pentagon");
    assert_eq!(back.edge_count(), 5);
    let rules = pentagon_rules();
    assert!(rules.is_satisfied(&back).unwrap());
}

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Tessella Inc.

//! Tessella constraint expression engine
//!
//! Evaluates boolean and numeric constraint expressions over named shape
//! features (edge lengths, vertex angles) to decide whether a tiling
//! configuration satisfies its rules. Rule trees are built once and
//! evaluated many times: either interpreted per call, or compiled once
//! into a constant-folded closure for hot paths.

pub mod constraint;
pub mod error;
pub mod expr;
pub mod shape;
pub mod utils;

pub use constraint::{
    CompiledConstraint, CompiledConstraintSet, Constraint, ConstraintSet, ShapeReport, Violation,
};
pub use error::{BuildError, EvalError};
pub use expr::{BoolExpr, CompiledBool, CompiledExpr, CompiledNum, Expr, ExprKind, NumExpr, Value};
pub use shape::{Edge, Shape, ShapeSet, Vertex};

use error::EvalResult;

/// Evaluate an expression tree against a shape set, re-walking the tree
pub fn evaluate(expr: &Expr, shapes: &dyn ShapeSet) -> EvalResult<Value> {
    expr.evaluate(shapes)
}

/// Compile an expression tree once into a reusable closure
pub fn compile(expr: &Expr) -> CompiledExpr {
    expr.compile()
}

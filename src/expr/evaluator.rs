// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Tessella Inc.

//! Tree-walking expression evaluator
//!
//! Walks a node tree against a [`ShapeSet`] on every call. Operands are
//! always evaluated left to right, each at most once per call; the chain
//! operators stop at the first violated link.

use ahash::AHashSet;

use super::{BoolExpr, Expr, ExprKind, NumExpr, Value};
use crate::error::{EvalError, EvalResult};
use crate::shape::ShapeSet;
use crate::utils::math::TOLERANCE;

impl NumExpr {
    /// Evaluate this node against `shapes`
    pub fn evaluate(&self, shapes: &dyn ShapeSet) -> EvalResult<f64> {
        match self {
            Self::Number(v) => Ok(*v),
            Self::EdgeLength(name) => shapes
                .edge(name)
                .map(|e| e.length)
                .ok_or_else(|| EvalError::EdgeNotFound(name.clone())),
            Self::VertexAngle(name) => shapes
                .vertex(name)
                .map(|v| v.angle)
                .ok_or_else(|| EvalError::VertexNotFound(name.clone())),
            Self::Arithmetic { kind, operands } => eval_arithmetic(*kind, operands, shapes),
            Self::Compiled(code) => code.evaluate(shapes),
        }
    }
}

impl BoolExpr {
    /// Evaluate this node against `shapes`
    pub fn evaluate(&self, shapes: &dyn ShapeSet) -> EvalResult<bool> {
        match self {
            Self::Comparison { kind, operands } => eval_comparison(*kind, operands, shapes),
            Self::Logical { kind, operands } => eval_logical(*kind, operands, shapes),
            Self::Compiled(code) => code.evaluate(shapes),
        }
    }
}

impl Expr {
    /// Evaluate this tree against `shapes`
    pub fn evaluate(&self, shapes: &dyn ShapeSet) -> EvalResult<Value> {
        match self {
            Self::Num(e) => e.evaluate(shapes).map(Value::Number),
            Self::Bool(e) => e.evaluate(shapes).map(Value::Bool),
        }
    }
}

fn eval_arithmetic(kind: ExprKind, operands: &[NumExpr], shapes: &dyn ShapeSet) -> EvalResult<f64> {
    let mut iter = operands.iter();
    let first = iter.next().expect("aggregate holds at least one operand");
    let mut acc = first.evaluate(shapes)?;
    for operand in iter {
        acc = arith_step(kind, acc, operand.evaluate(shapes)?);
    }
    Ok(acc)
}

/// One left-fold step of an arithmetic aggregate
pub(super) fn arith_step(kind: ExprKind, acc: f64, v: f64) -> f64 {
    match kind {
        ExprKind::Add => acc + v,
        ExprKind::Subtract => acc - v,
        ExprKind::Multiply => acc * v,
        ExprKind::Divide => acc / v,
        _ => unreachable!("arithmetic node holds non-arithmetic kind {kind:?}"),
    }
}

fn eval_comparison(
    kind: ExprKind,
    operands: &[NumExpr],
    shapes: &dyn ShapeSet,
) -> EvalResult<bool> {
    match kind {
        ExprKind::Equal => {
            let mut iter = operands.iter();
            let first = iter.next().expect("aggregate holds at least one operand");
            let v = first.evaluate(shapes)?;
            let (mut min, mut max) = (v, v);
            for operand in iter {
                let v = operand.evaluate(shapes)?;
                if v < min {
                    min = v;
                } else if v > max {
                    max = v;
                }
            }
            Ok(max - min <= TOLERANCE)
        }
        ExprKind::NotEqual => {
            let mut seen = AHashSet::with_capacity(operands.len());
            for operand in operands {
                if !seen.insert(float_key(operand.evaluate(shapes)?)) {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        ExprKind::GreaterThan
        | ExprKind::LessThan
        | ExprKind::GreaterOrEqual
        | ExprKind::LessOrEqual => {
            let mut iter = operands.iter();
            let first = iter.next().expect("aggregate holds at least one operand");
            let mut last = first.evaluate(shapes)?;
            for operand in iter {
                let v = operand.evaluate(shapes)?;
                if !ordered_pair_holds(kind, last, v) {
                    return Ok(false);
                }
                last = v;
            }
            Ok(true)
        }
        _ => unreachable!("comparison node holds non-comparison kind {kind:?}"),
    }
}

/// Exact-equality key for a float: bit identity, with both zeros collapsed
/// so `0.0` and `-0.0` collide as numeric `==` would.
pub(super) fn float_key(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

/// Whether one link of an ordered chain holds between `last` and `v`.
///
/// The strict operators additionally fail when the two values sit within
/// [`TOLERANCE`] of each other; the non-strict operators apply no tolerance.
pub(super) fn ordered_pair_holds(kind: ExprKind, last: f64, v: f64) -> bool {
    match kind {
        ExprKind::GreaterThan => last > v && (last - v).abs() > TOLERANCE,
        ExprKind::LessThan => last < v && (last - v).abs() > TOLERANCE,
        ExprKind::GreaterOrEqual => last >= v,
        ExprKind::LessOrEqual => last <= v,
        _ => unreachable!("ordered chain holds non-ordered kind {kind:?}"),
    }
}

fn eval_logical(kind: ExprKind, operands: &[BoolExpr], shapes: &dyn ShapeSet) -> EvalResult<bool> {
    match kind {
        ExprKind::Not => {
            let operand = operands.first().expect("Not holds exactly one operand");
            Ok(!operand.evaluate(shapes)?)
        }
        ExprKind::And => {
            let mut acc = true;
            for operand in operands {
                acc &= operand.evaluate(shapes)?;
            }
            Ok(acc)
        }
        ExprKind::Or => {
            let mut acc = false;
            for operand in operands {
                acc |= operand.evaluate(shapes)?;
            }
            Ok(acc)
        }
        ExprKind::Xor => {
            let mut iter = operands.iter();
            let first = iter.next().expect("aggregate holds at least one operand");
            let mut acc = first.evaluate(shapes)?;
            for operand in iter {
                acc ^= operand.evaluate(shapes)?;
            }
            Ok(acc)
        }
        ExprKind::BoolEqual => {
            let mut iter = operands.iter();
            let first = iter.next().expect("aggregate holds at least one operand");
            let first = first.evaluate(shapes)?;
            let mut acc = true;
            for operand in iter {
                acc &= operand.evaluate(shapes)? == first;
            }
            Ok(acc)
        }
        _ => unreachable!("logical node holds non-logical kind {kind:?}"),
    }
}

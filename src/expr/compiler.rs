// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Tessella Inc.

//! Compiling code generator
//!
//! Transforms a node tree once into a reusable closure over a [`ShapeSet`].
//! Constant sub-expressions are folded at compile time; comparisons whose
//! outcome is already decided by their constant operands collapse to a
//! constant closure that never touches the shape set. The emitted closures
//! reproduce the tree-walking evaluator's results exactly, including its
//! tolerance handling and operand evaluation order.

use std::fmt;
use std::sync::Arc;

use ahash::AHashSet;
use tracing::{debug, trace};

use super::evaluator::{arith_step, float_key, ordered_pair_holds};
use super::{BoolExpr, Expr, ExprKind, NumExpr, Value};
use crate::error::{EvalError, EvalResult};
use crate::shape::ShapeSet;
use crate::utils::math::TOLERANCE;

type NumFn = dyn Fn(&dyn ShapeSet) -> EvalResult<f64> + Send + Sync;
type BoolFn = dyn Fn(&dyn ShapeSet) -> EvalResult<bool> + Send + Sync;

/// Compiled form of a numeric node: a folded constant or a thunk
#[derive(Clone)]
enum NumCode {
    Const(f64),
    Thunk(Arc<NumFn>),
}

impl NumCode {
    fn evaluate(&self, shapes: &dyn ShapeSet) -> EvalResult<f64> {
        match self {
            Self::Const(v) => Ok(*v),
            Self::Thunk(f) => f(shapes),
        }
    }
}

/// Compiled form of a boolean node
#[derive(Clone)]
enum BoolCode {
    Const(bool),
    Thunk(Arc<BoolFn>),
}

impl BoolCode {
    fn evaluate(&self, shapes: &dyn ShapeSet) -> EvalResult<bool> {
        match self {
            Self::Const(b) => Ok(*b),
            Self::Thunk(f) => f(shapes),
        }
    }
}

/// A compiled numeric expression: a pure function of the shape set,
/// independent of the tree it was generated from
#[derive(Clone)]
pub struct CompiledNum(NumCode);

impl CompiledNum {
    /// Run the compiled code against `shapes`
    pub fn evaluate(&self, shapes: &dyn ShapeSet) -> EvalResult<f64> {
        self.0.evaluate(shapes)
    }

    /// True if compilation folded the whole expression to a constant
    pub fn is_const(&self) -> bool {
        matches!(self.0, NumCode::Const(_))
    }

    /// The folded constant, if the expression collapsed to one
    pub fn as_const(&self) -> Option<f64> {
        match self.0 {
            NumCode::Const(v) => Some(v),
            NumCode::Thunk(_) => None,
        }
    }
}

impl fmt::Debug for CompiledNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            NumCode::Const(v) => write!(f, "CompiledNum({v})"),
            NumCode::Thunk(_) => write!(f, "CompiledNum(<thunk>)"),
        }
    }
}

/// A compiled boolean expression
#[derive(Clone)]
pub struct CompiledBool(BoolCode);

impl CompiledBool {
    /// Run the compiled code against `shapes`
    pub fn evaluate(&self, shapes: &dyn ShapeSet) -> EvalResult<bool> {
        self.0.evaluate(shapes)
    }

    /// True if compilation folded the whole expression to a constant
    pub fn is_const(&self) -> bool {
        matches!(self.0, BoolCode::Const(_))
    }

    /// The folded constant, if the expression collapsed to one
    pub fn as_const(&self) -> Option<bool> {
        match self.0 {
            BoolCode::Const(b) => Some(b),
            BoolCode::Thunk(_) => None,
        }
    }
}

impl fmt::Debug for CompiledBool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            BoolCode::Const(b) => write!(f, "CompiledBool({b})"),
            BoolCode::Thunk(_) => write!(f, "CompiledBool(<thunk>)"),
        }
    }
}

/// Compiled form of an [`Expr`]
#[derive(Debug, Clone)]
pub enum CompiledExpr {
    Num(CompiledNum),
    Bool(CompiledBool),
}

impl CompiledExpr {
    /// Run the compiled code against `shapes`
    pub fn evaluate(&self, shapes: &dyn ShapeSet) -> EvalResult<Value> {
        match self {
            Self::Num(c) => c.evaluate(shapes).map(Value::Number),
            Self::Bool(c) => c.evaluate(shapes).map(Value::Bool),
        }
    }

    /// True if compilation folded the whole expression to a constant
    pub fn is_const(&self) -> bool {
        match self {
            Self::Num(c) => c.is_const(),
            Self::Bool(c) => c.is_const(),
        }
    }
}

impl NumExpr {
    /// Compile this tree into a reusable closure
    pub fn compile(&self) -> CompiledNum {
        CompiledNum(compile_num(self))
    }
}

impl BoolExpr {
    /// Compile this tree into a reusable closure
    pub fn compile(&self) -> CompiledBool {
        CompiledBool(compile_bool(self))
    }
}

impl Expr {
    /// Compile this tree into a reusable closure
    pub fn compile(&self) -> CompiledExpr {
        match self {
            Self::Num(e) => CompiledExpr::Num(e.compile()),
            Self::Bool(e) => CompiledExpr::Bool(e.compile()),
        }
    }
}

impl From<CompiledNum> for NumExpr {
    fn from(code: CompiledNum) -> Self {
        Self::Compiled(code)
    }
}

impl From<CompiledBool> for BoolExpr {
    fn from(code: CompiledBool) -> Self {
        Self::Compiled(code)
    }
}

fn compile_num(expr: &NumExpr) -> NumCode {
    match expr {
        NumExpr::Number(v) => NumCode::Const(*v),
        NumExpr::EdgeLength(name) => {
            let name = name.clone();
            NumCode::Thunk(Arc::new(move |shapes| {
                shapes
                    .edge(&name)
                    .map(|e| e.length)
                    .ok_or_else(|| EvalError::EdgeNotFound(name.clone()))
            }))
        }
        NumExpr::VertexAngle(name) => {
            let name = name.clone();
            NumCode::Thunk(Arc::new(move |shapes| {
                shapes
                    .vertex(&name)
                    .map(|v| v.angle)
                    .ok_or_else(|| EvalError::VertexNotFound(name.clone()))
            }))
        }
        NumExpr::Arithmetic { kind, operands } => compile_arithmetic(*kind, operands),
        NumExpr::Compiled(code) => code.0.clone(),
    }
}

fn compile_bool(expr: &BoolExpr) -> BoolCode {
    match expr {
        BoolExpr::Comparison { kind, operands } => compile_comparison(*kind, operands),
        BoolExpr::Logical { kind, operands } => compile_logical(*kind, operands),
        BoolExpr::Compiled(code) => code.0.clone(),
    }
}

fn compile_arithmetic(kind: ExprKind, operands: &[NumExpr]) -> NumCode {
    let codes: Vec<NumCode> = operands.iter().map(compile_num).collect();

    // Fully constant: fold the whole aggregate now. Partially constant
    // operands stay in place so the fold order (and therefore the exact
    // float result) matches the tree-walking evaluator.
    if codes.iter().all(|c| matches!(c, NumCode::Const(_))) {
        let folded = fold_arith(kind, &codes);
        trace!(?kind, value = folded, "folded constant arithmetic aggregate");
        return NumCode::Const(folded);
    }

    NumCode::Thunk(Arc::new(move |shapes| {
        let mut iter = codes.iter();
        let first = iter.next().expect("aggregate holds at least one operand");
        let mut acc = first.evaluate(shapes)?;
        for code in iter {
            acc = arith_step(kind, acc, code.evaluate(shapes)?);
        }
        Ok(acc)
    }))
}

fn fold_arith(kind: ExprKind, codes: &[NumCode]) -> f64 {
    let mut iter = codes.iter().map(|c| match c {
        NumCode::Const(v) => *v,
        NumCode::Thunk(_) => unreachable!("fold_arith called with variable operand"),
    });
    let first = iter.next().expect("aggregate holds at least one operand");
    iter.fold(first, |acc, v| arith_step(kind, acc, v))
}

fn compile_comparison(kind: ExprKind, operands: &[NumExpr]) -> BoolCode {
    let codes: Vec<NumCode> = operands.iter().map(compile_num).collect();
    match kind {
        ExprKind::Equal => compile_equal(codes),
        ExprKind::NotEqual => compile_not_equal(codes),
        ExprKind::GreaterThan
        | ExprKind::LessThan
        | ExprKind::GreaterOrEqual
        | ExprKind::LessOrEqual => compile_ordered(kind, codes),
        _ => unreachable!("comparison node holds non-comparison kind {kind:?}"),
    }
}

/// Equal: all operands within [`TOLERANCE`] of each other.
///
/// Constant operands fold into min/max bounds at compile time; the runtime
/// range tracking starts from those bounds (or from the first variable
/// operand when there are none) and widens per remaining variable operand.
fn compile_equal(codes: Vec<NumCode>) -> BoolCode {
    let mut bounds: Option<(f64, f64)> = None;
    let mut vars: Vec<Arc<NumFn>> = Vec::new();
    for code in codes {
        match code {
            NumCode::Const(v) => match &mut bounds {
                None => bounds = Some((v, v)),
                Some((min, max)) => {
                    if v < *min {
                        *min = v;
                    } else if v > *max {
                        *max = v;
                    }
                }
            },
            NumCode::Thunk(f) => vars.push(f),
        }
    }

    if vars.is_empty() {
        let (min, max) = bounds.expect("aggregate holds at least one operand");
        debug!(min, max, "equality chain folded to constant");
        return BoolCode::Const(max - min <= TOLERANCE);
    }

    BoolCode::Thunk(Arc::new(move |shapes| {
        let mut iter = vars.iter();
        let (mut min, mut max) = match bounds {
            Some(b) => b,
            None => {
                let f = iter.next().expect("at least one variable operand");
                let v = f(shapes)?;
                (v, v)
            }
        };
        for f in iter {
            let v = f(shapes)?;
            if v < min {
                min = v;
            } else if v > max {
                max = v;
            }
        }
        Ok(max - min <= TOLERANCE)
    }))
}

/// NotEqual: no two operands share the exact same value.
///
/// Two operands compile to a direct inequality test when either side is
/// constant. The general path folds constants into a seed set: a duplicate
/// among the constants decides the whole expression, and the runtime code
/// only has to insert-or-fail the variable operands.
fn compile_not_equal(codes: Vec<NumCode>) -> BoolCode {
    if codes.len() == 2 {
        match (&codes[0], &codes[1]) {
            (NumCode::Const(a), NumCode::Const(b)) => {
                return BoolCode::Const(a != b);
            }
            (NumCode::Const(c), NumCode::Thunk(f)) | (NumCode::Thunk(f), NumCode::Const(c)) => {
                let (c, f) = (*c, f.clone());
                return BoolCode::Thunk(Arc::new(move |shapes| Ok(f(shapes)? != c)));
            }
            _ => {} // both variable: general path below
        }
    }

    let mut seed: AHashSet<u64> = AHashSet::with_capacity(codes.len());
    let mut vars: Vec<Arc<NumFn>> = Vec::new();
    for code in codes {
        match code {
            NumCode::Const(v) => {
                if !seed.insert(float_key(v)) {
                    debug!(value = v, "duplicate constant folds inequality chain to false");
                    return BoolCode::Const(false);
                }
            }
            NumCode::Thunk(f) => vars.push(f),
        }
    }

    if vars.is_empty() {
        return BoolCode::Const(true);
    }

    BoolCode::Thunk(Arc::new(move |shapes| {
        let mut seen = seed.clone();
        for f in &vars {
            if !seen.insert(float_key(f(shapes)?)) {
                return Ok(false);
            }
        }
        Ok(true)
    }))
}

/// Ordered chains (>, <, >=, <=): every adjacent pair must hold.
///
/// Adjacent constant pairs are decided at compile time: a violated pair
/// collapses the whole chain to constant false, a satisfied pair is
/// omitted from the runtime code. Variable operands are bound to a
/// temporary so an operand shared by two pairs is evaluated once per call.
fn compile_ordered(kind: ExprKind, codes: Vec<NumCode>) -> BoolCode {
    let mut pairs: Vec<(usize, usize)> = Vec::new();
    for i in 0..codes.len().saturating_sub(1) {
        match (&codes[i], &codes[i + 1]) {
            (NumCode::Const(a), NumCode::Const(b)) => {
                if !ordered_pair_holds(kind, *a, *b) {
                    debug!(?kind, a, b, "ordered chain folded to constant false");
                    return BoolCode::Const(false);
                }
                // Omitted from the runtime chain; internal consistency only.
                debug_assert!(ordered_pair_holds(kind, *a, *b));
            }
            _ => pairs.push((i, i + 1)),
        }
    }

    if pairs.is_empty() {
        return BoolCode::Const(true);
    }

    BoolCode::Thunk(Arc::new(move |shapes| {
        let mut memo: Vec<Option<f64>> = vec![None; codes.len()];
        for &(l, r) in &pairs {
            let a = fetch(&codes, &mut memo, l, shapes)?;
            let b = fetch(&codes, &mut memo, r, shapes)?;
            if !ordered_pair_holds(kind, a, b) {
                return Ok(false);
            }
        }
        Ok(true)
    }))
}

/// Evaluate operand `i`, memoizing so chains never evaluate an operand twice
fn fetch(
    codes: &[NumCode],
    memo: &mut [Option<f64>],
    i: usize,
    shapes: &dyn ShapeSet,
) -> EvalResult<f64> {
    if let Some(v) = memo[i] {
        return Ok(v);
    }
    let v = codes[i].evaluate(shapes)?;
    memo[i] = Some(v);
    Ok(v)
}

fn compile_logical(kind: ExprKind, operands: &[BoolExpr]) -> BoolCode {
    let codes: Vec<BoolCode> = operands.iter().map(compile_bool).collect();
    match kind {
        ExprKind::Not => match codes
            .into_iter()
            .next()
            .expect("Not holds exactly one operand")
        {
            BoolCode::Const(b) => BoolCode::Const(!b),
            BoolCode::Thunk(f) => BoolCode::Thunk(Arc::new(move |shapes| Ok(!f(shapes)?))),
        },
        ExprKind::And => compile_conjunction(codes, true),
        ExprKind::Or => compile_conjunction(codes, false),
        ExprKind::Xor => {
            let mut parity = false;
            let mut vars: Vec<Arc<BoolFn>> = Vec::new();
            for code in codes {
                match code {
                    BoolCode::Const(b) => parity ^= b,
                    BoolCode::Thunk(f) => vars.push(f),
                }
            }
            if vars.is_empty() {
                return BoolCode::Const(parity);
            }
            BoolCode::Thunk(Arc::new(move |shapes| {
                let mut acc = parity;
                for f in &vars {
                    acc ^= f(shapes)?;
                }
                Ok(acc)
            }))
        }
        ExprKind::BoolEqual => {
            let mut cval: Option<bool> = None;
            let mut vars: Vec<Arc<BoolFn>> = Vec::new();
            for code in codes {
                match code {
                    BoolCode::Const(b) => match cval {
                        None => cval = Some(b),
                        Some(c) if c != b => {
                            debug!("disagreeing constants fold boolean equality to false");
                            return BoolCode::Const(false);
                        }
                        Some(_) => {}
                    },
                    BoolCode::Thunk(f) => vars.push(f),
                }
            }
            if vars.is_empty() {
                return BoolCode::Const(true);
            }
            BoolCode::Thunk(Arc::new(move |shapes| {
                let mut iter = vars.iter();
                let first = match cval {
                    Some(c) => c,
                    None => {
                        let f = iter.next().expect("at least one variable operand");
                        f(shapes)?
                    }
                };
                let mut acc = true;
                for f in iter {
                    acc &= f(shapes)? == first;
                }
                Ok(acc)
            }))
        }
        _ => unreachable!("logical node holds non-logical kind {kind:?}"),
    }
}

/// And (`absorb = true`) / Or (`absorb = false`): a constant operand equal
/// to `!absorb` decides the aggregate; constants equal to `absorb` drop out.
/// Remaining operands are all evaluated, like the tree-walking fold.
fn compile_conjunction(codes: Vec<BoolCode>, absorb: bool) -> BoolCode {
    let mut vars: Vec<Arc<BoolFn>> = Vec::new();
    for code in codes {
        match code {
            BoolCode::Const(b) => {
                if b != absorb {
                    return BoolCode::Const(!absorb);
                }
            }
            BoolCode::Thunk(f) => vars.push(f),
        }
    }
    if vars.is_empty() {
        return BoolCode::Const(absorb);
    }
    BoolCode::Thunk(Arc::new(move |shapes| {
        let mut acc = absorb;
        for f in &vars {
            let v = f(shapes)?;
            if absorb {
                acc &= v;
            } else {
                acc |= v;
            }
        }
        Ok(acc)
    }))
}

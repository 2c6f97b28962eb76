// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Tessella Inc.

//! Constraint checking over shapes
//!
//! Thin caller layer over the expression core: named boolean rules,
//! batch checking, and a compiled form for hot paths where the same
//! rules are re-checked for many candidate shapes.

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BuildError, BuildResult, EvalResult};
use crate::expr::{BoolExpr, CompiledBool, Expr};
use crate::shape::{Shape, ShapeSet};

/// A named boolean rule over shape features
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraint {
    name: String,
    expr: BoolExpr,
}

impl Constraint {
    /// Create a constraint from a boolean expression
    pub fn new(name: impl Into<String>, expr: BoolExpr) -> Self {
        Self {
            name: name.into(),
            expr,
        }
    }

    /// Create a constraint from a deserialized tree; numeric-rooted trees
    /// are rejected
    pub fn from_expr(name: impl Into<String>, expr: Expr) -> BuildResult<Self> {
        match expr {
            Expr::Bool(expr) => Ok(Self::new(name, expr)),
            Expr::Num(expr) => Err(BuildError::NotBoolean { kind: expr.kind() }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expr(&self) -> &BoolExpr {
        &self.expr
    }

    /// Re-walk the rule tree against `shapes`
    pub fn check(&self, shapes: &dyn ShapeSet) -> EvalResult<bool> {
        self.expr.evaluate(shapes)
    }

    /// Pay the folding cost once and reuse the closure per check
    pub fn compile(&self) -> CompiledConstraint {
        CompiledConstraint {
            name: self.name.clone(),
            code: self.expr.compile(),
        }
    }
}

/// A constraint compiled into a closure
#[derive(Debug, Clone)]
pub struct CompiledConstraint {
    name: String,
    code: CompiledBool,
}

impl CompiledConstraint {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn check(&self, shapes: &dyn ShapeSet) -> EvalResult<bool> {
        self.code.evaluate(shapes)
    }
}

/// A constraint that evaluated to false for some shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub constraint: String,
}

/// Per-shape outcome of checking a rule set against many shapes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeReport {
    pub shape: String,
    pub violations: Vec<Violation>,
}

impl ShapeReport {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// An ordered collection of constraints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstraintSet {
    constraints: Vec<Constraint>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }

    /// Check every constraint in order, collecting the violated ones
    pub fn check_all(&self, shapes: &dyn ShapeSet) -> Result<Vec<Violation>> {
        let mut violations = Vec::new();
        for constraint in &self.constraints {
            let ok = constraint
                .check(shapes)
                .with_context(|| format!("checking constraint {}", constraint.name))?;
            if !ok {
                debug!(constraint = %constraint.name, "constraint violated");
                violations.push(Violation {
                    constraint: constraint.name.clone(),
                });
            }
        }
        Ok(violations)
    }

    /// True when every constraint holds
    pub fn is_satisfied(&self, shapes: &dyn ShapeSet) -> Result<bool> {
        Ok(self.check_all(shapes)?.is_empty())
    }

    /// Compile every constraint once
    pub fn compile(&self) -> CompiledConstraintSet {
        CompiledConstraintSet {
            constraints: self.constraints.iter().map(Constraint::compile).collect(),
        }
    }

    /// Check many candidate shapes, compiling once and fanning out
    pub fn check_shapes(&self, shapes: &[Shape]) -> Result<Vec<ShapeReport>> {
        self.compile().check_shapes(shapes)
    }
}

impl FromIterator<Constraint> for ConstraintSet {
    fn from_iter<T: IntoIterator<Item = Constraint>>(iter: T) -> Self {
        Self {
            constraints: iter.into_iter().collect(),
        }
    }
}

/// A rule set compiled into closures, reusable across many shapes
#[derive(Debug, Clone)]
pub struct CompiledConstraintSet {
    constraints: Vec<CompiledConstraint>,
}

impl CompiledConstraintSet {
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Check every compiled constraint in order, collecting the violated ones
    pub fn check_all(&self, shapes: &dyn ShapeSet) -> Result<Vec<Violation>> {
        let mut violations = Vec::new();
        for constraint in &self.constraints {
            let ok = constraint
                .check(shapes)
                .with_context(|| format!("checking constraint {}", constraint.name))?;
            if !ok {
                debug!(constraint = %constraint.name, "constraint violated");
                violations.push(Violation {
                    constraint: constraint.name.clone(),
                });
            }
        }
        Ok(violations)
    }

    /// True when every constraint holds
    pub fn is_satisfied(&self, shapes: &dyn ShapeSet) -> Result<bool> {
        Ok(self.check_all(shapes)?.is_empty())
    }

    /// Check many candidate shapes in parallel
    pub fn check_shapes(&self, shapes: &[Shape]) -> Result<Vec<ShapeReport>> {
        shapes
            .par_iter()
            .map(|shape| {
                let violations = self
                    .check_all(shape)
                    .with_context(|| format!("checking shape {}", shape.name()))?;
                Ok(ShapeReport {
                    shape: shape.name().to_string(),
                    violations,
                })
            })
            .collect()
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Tessella Inc.

//! Error types for expression construction and evaluation

use crate::expr::ExprKind;
use thiserror::Error;

/// Errors raised while constructing expression nodes or shapes.
///
/// A tree that constructed successfully never produces one of these again;
/// everything here is detectable before the first evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// Operator tag incompatible with the node family it was passed to.
    #[error("invalid expression kind: {kind:?} is not {family} operator")]
    InvalidKind { kind: ExprKind, family: &'static str },

    /// Name-bearing leaf constructed with an empty or whitespace-only name.
    #[error("expression name must not be empty")]
    EmptyName,

    /// Composite node constructed with no operands.
    #[error("{kind:?} requires at least one operand")]
    NoOperands { kind: ExprKind },

    /// Operator with a fixed arity received the wrong operand count.
    #[error("{kind:?} takes exactly {expected} operand(s), got {got}")]
    BadArity {
        kind: ExprKind,
        expected: usize,
        got: usize,
    },

    /// Constraint defined over a numeric-rooted expression.
    #[error("constraint expression must be boolean, root is {kind:?}")]
    NotBoolean { kind: ExprKind },

    /// Polygon with fewer than three vertices or coincident neighbours.
    #[error("degenerate polygon: {0}")]
    DegeneratePolygon(String),

    /// Duplicate feature name within one shape.
    #[error("duplicate {family} name: {name}")]
    DuplicateName { family: &'static str, name: String },
}

/// Errors raised while evaluating an expression against a [`ShapeSet`].
///
/// [`ShapeSet`]: crate::shape::ShapeSet
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// The shape set has no edge with the requested name.
    #[error("edge not found: {0}")]
    EdgeNotFound(String),

    /// The shape set has no vertex with the requested name.
    #[error("vertex not found: {0}")]
    VertexNotFound(String),
}

/// Result alias for construction.
pub type BuildResult<T> = Result<T, BuildError>;

/// Result alias for evaluation.
pub type EvalResult<T> = Result<T, EvalError>;

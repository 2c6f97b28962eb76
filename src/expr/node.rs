// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Tessella Inc.

//! Expression node definitions
//!
//! Constraint rules are trees of immutable nodes: numeric leaves and
//! aggregates ([`NumExpr`]), boolean aggregates over them ([`BoolExpr`]),
//! and a uniform handle for deserialized rules ([`Expr`]). Trees never
//! mutate after construction and may be shared freely across threads.

use serde::{Deserialize, Serialize};

use super::compiler::{CompiledBool, CompiledNum};
use crate::error::{BuildError, BuildResult};

/// Operator/leaf tag carried by every expression node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExprKind {
    // Numeric leaves
    Number,
    EdgeLength,
    VertexAngle,

    // Arithmetic aggregates
    Add,
    Subtract,
    Multiply,
    Divide,

    // Comparison aggregates
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,

    // Logical aggregates
    And,
    Or,
    Xor,
    Not,
    BoolEqual,

    // Wrapper around an already-compiled node
    Compiled,
}

impl ExprKind {
    /// True for the four arithmetic operators
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Self::Add | Self::Subtract | Self::Multiply | Self::Divide
        )
    }

    /// True for the six comparison operators
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Equal
                | Self::NotEqual
                | Self::GreaterThan
                | Self::LessThan
                | Self::GreaterOrEqual
                | Self::LessOrEqual
        )
    }

    /// True for the five logical operators
    pub fn is_logical(self) -> bool {
        matches!(
            self,
            Self::And | Self::Or | Self::Xor | Self::Not | Self::BoolEqual
        )
    }
}

/// A float-valued expression node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NumExpr {
    /// Constant value
    Number(f64),
    /// Length of the named edge in the shape set
    EdgeLength(String),
    /// Angle of the named vertex in the shape set, in degrees
    VertexAngle(String),
    /// Arithmetic aggregate over one or more operands, folded left to right
    Arithmetic {
        kind: ExprKind,
        operands: Vec<NumExpr>,
    },
    /// Already-compiled numeric node
    #[serde(skip)]
    Compiled(CompiledNum),
}

impl NumExpr {
    /// Constant leaf
    pub fn number(value: f64) -> Self {
        Self::Number(value)
    }

    /// Edge-length reference; the name must not be empty or whitespace
    pub fn edge_length(name: impl Into<String>) -> BuildResult<Self> {
        Ok(Self::EdgeLength(validated_name(name)?))
    }

    /// Vertex-angle reference; the name must not be empty or whitespace
    pub fn vertex_angle(name: impl Into<String>) -> BuildResult<Self> {
        Ok(Self::VertexAngle(validated_name(name)?))
    }

    /// Arithmetic aggregate; `kind` must be one of the four arithmetic
    /// operators and at least one operand is required
    pub fn arithmetic(kind: ExprKind, operands: Vec<NumExpr>) -> BuildResult<Self> {
        if !kind.is_arithmetic() {
            return Err(BuildError::InvalidKind {
                kind,
                family: "an arithmetic",
            });
        }
        if operands.is_empty() {
            return Err(BuildError::NoOperands { kind });
        }
        Ok(Self::Arithmetic { kind, operands })
    }

    pub fn add(operands: Vec<NumExpr>) -> BuildResult<Self> {
        Self::arithmetic(ExprKind::Add, operands)
    }

    pub fn subtract(operands: Vec<NumExpr>) -> BuildResult<Self> {
        Self::arithmetic(ExprKind::Subtract, operands)
    }

    pub fn multiply(operands: Vec<NumExpr>) -> BuildResult<Self> {
        Self::arithmetic(ExprKind::Multiply, operands)
    }

    pub fn divide(operands: Vec<NumExpr>) -> BuildResult<Self> {
        Self::arithmetic(ExprKind::Divide, operands)
    }

    /// Tag of this node
    pub fn kind(&self) -> ExprKind {
        match self {
            Self::Number(_) => ExprKind::Number,
            Self::EdgeLength(_) => ExprKind::EdgeLength,
            Self::VertexAngle(_) => ExprKind::VertexAngle,
            Self::Arithmetic { kind, .. } => *kind,
            Self::Compiled(_) => ExprKind::Compiled,
        }
    }
}

/// A bool-valued expression node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BoolExpr {
    /// Comparison aggregate over one or more numeric operands
    Comparison {
        kind: ExprKind,
        operands: Vec<NumExpr>,
    },
    /// Logical aggregate over one or more boolean operands
    Logical {
        kind: ExprKind,
        operands: Vec<BoolExpr>,
    },
    /// Already-compiled boolean node
    #[serde(skip)]
    Compiled(CompiledBool),
}

impl BoolExpr {
    /// Comparison aggregate; `kind` must be one of the six comparison
    /// operators and at least one operand is required
    pub fn comparison(kind: ExprKind, operands: Vec<NumExpr>) -> BuildResult<Self> {
        if !kind.is_comparison() {
            return Err(BuildError::InvalidKind {
                kind,
                family: "a comparison",
            });
        }
        if operands.is_empty() {
            return Err(BuildError::NoOperands { kind });
        }
        Ok(Self::Comparison { kind, operands })
    }

    /// Logical aggregate; `kind` must be one of the five logical operators.
    /// `Not` takes exactly one operand, the rest take one or more.
    pub fn logical(kind: ExprKind, operands: Vec<BoolExpr>) -> BuildResult<Self> {
        if !kind.is_logical() {
            return Err(BuildError::InvalidKind {
                kind,
                family: "a logical",
            });
        }
        if kind == ExprKind::Not && operands.len() != 1 {
            return Err(BuildError::BadArity {
                kind,
                expected: 1,
                got: operands.len(),
            });
        }
        if operands.is_empty() {
            return Err(BuildError::NoOperands { kind });
        }
        Ok(Self::Logical { kind, operands })
    }

    pub fn equal(operands: Vec<NumExpr>) -> BuildResult<Self> {
        Self::comparison(ExprKind::Equal, operands)
    }

    pub fn not_equal(operands: Vec<NumExpr>) -> BuildResult<Self> {
        Self::comparison(ExprKind::NotEqual, operands)
    }

    pub fn greater_than(operands: Vec<NumExpr>) -> BuildResult<Self> {
        Self::comparison(ExprKind::GreaterThan, operands)
    }

    pub fn less_than(operands: Vec<NumExpr>) -> BuildResult<Self> {
        Self::comparison(ExprKind::LessThan, operands)
    }

    pub fn greater_or_equal(operands: Vec<NumExpr>) -> BuildResult<Self> {
        Self::comparison(ExprKind::GreaterOrEqual, operands)
    }

    pub fn less_or_equal(operands: Vec<NumExpr>) -> BuildResult<Self> {
        Self::comparison(ExprKind::LessOrEqual, operands)
    }

    pub fn and(operands: Vec<BoolExpr>) -> BuildResult<Self> {
        Self::logical(ExprKind::And, operands)
    }

    pub fn or(operands: Vec<BoolExpr>) -> BuildResult<Self> {
        Self::logical(ExprKind::Or, operands)
    }

    pub fn xor(operands: Vec<BoolExpr>) -> BuildResult<Self> {
        Self::logical(ExprKind::Xor, operands)
    }

    pub fn negate(operand: BoolExpr) -> Self {
        Self::Logical {
            kind: ExprKind::Not,
            operands: vec![operand],
        }
    }

    pub fn bool_equal(operands: Vec<BoolExpr>) -> BuildResult<Self> {
        Self::logical(ExprKind::BoolEqual, operands)
    }

    /// Tag of this node
    pub fn kind(&self) -> ExprKind {
        match self {
            Self::Comparison { kind, .. } => *kind,
            Self::Logical { kind, .. } => *kind,
            Self::Compiled(_) => ExprKind::Compiled,
        }
    }
}

/// Uniform handle over numeric and boolean trees, as handed over by the
/// rule deserializer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    Num(NumExpr),
    Bool(BoolExpr),
}

impl Expr {
    /// Tag of the root node
    pub fn kind(&self) -> ExprKind {
        match self {
            Self::Num(e) => e.kind(),
            Self::Bool(e) => e.kind(),
        }
    }
}

impl From<NumExpr> for Expr {
    fn from(e: NumExpr) -> Self {
        Self::Num(e)
    }
}

impl From<BoolExpr> for Expr {
    fn from(e: BoolExpr) -> Self {
        Self::Bool(e)
    }
}

/// Result of evaluating an [`Expr`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Bool(bool),
}

impl Value {
    pub fn as_number(self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(v),
            Self::Bool(_) => None,
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(b),
            Self::Number(_) => None,
        }
    }
}

fn validated_name(name: impl Into<String>) -> BuildResult<String> {
    let name = name.into();
    if name.trim().is_empty() {
        return Err(BuildError::EmptyName);
    }
    Ok(name)
}

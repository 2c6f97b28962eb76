// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Tessella Inc.

//! Constraint expression module
//!
//! Immutable expression trees over shape features, with two equivalent
//! execution strategies: per-call tree walking and one-time compilation
//! into a constant-folded closure.

mod compiler;
mod evaluator;
mod node;

pub use compiler::{CompiledBool, CompiledExpr, CompiledNum};
pub use node::{BoolExpr, Expr, ExprKind, NumExpr, Value};

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Tessella Inc.

//! Shape module - named feature lookup for constraint evaluation

mod polygon;
mod set;

pub use set::{Edge, Shape, ShapeSet, Vertex};

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Tessella Inc.

//! Shape feature tables

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{BuildError, BuildResult};

/// A named edge of a shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub name: String,
    pub length: f64,
}

/// A named vertex of a shape, with its interior angle in degrees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub name: String,
    pub angle: f64,
}

/// Read-only lookup of named edges and vertices.
///
/// Constraint evaluation only ever reads through this trait; implementors
/// are never mutated by the expression core.
pub trait ShapeSet {
    fn edge(&self, name: &str) -> Option<&Edge>;
    fn vertex(&self, name: &str) -> Option<&Vertex>;
}

/// A concrete shape: a table of named edges and vertices
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Shape {
    name: String,
    edges: AHashMap<String, Edge>,
    vertices: AHashMap<String, Vertex>,
}

impl Shape {
    /// Create an empty shape
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            edges: AHashMap::new(),
            vertices: AHashMap::new(),
        }
    }

    /// Add a named edge; duplicate names within one shape are rejected
    pub fn add_edge(&mut self, name: impl Into<String>, length: f64) -> BuildResult<()> {
        let name = name.into();
        if self.edges.contains_key(&name) {
            return Err(BuildError::DuplicateName {
                family: "edge",
                name,
            });
        }
        self.edges.insert(name.clone(), Edge { name, length });
        Ok(())
    }

    /// Add a named vertex; duplicate names within one shape are rejected
    pub fn add_vertex(&mut self, name: impl Into<String>, angle: f64) -> BuildResult<()> {
        let name = name.into();
        if self.vertices.contains_key(&name) {
            return Err(BuildError::DuplicateName {
                family: "vertex",
                name,
            });
        }
        self.vertices.insert(name.clone(), Vertex { name, angle });
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Iterate edges in arbitrary order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Iterate vertices in arbitrary order
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }
}

impl ShapeSet for Shape {
    fn edge(&self, name: &str) -> Option<&Edge> {
        self.edges.get(name)
    }

    fn vertex(&self, name: &str) -> Option<&Vertex> {
        self.vertices.get(name)
    }
}

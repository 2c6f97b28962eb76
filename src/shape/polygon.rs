// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Tessella Inc.

//! Polygon-derived shapes
//!
//! Builds feature tables geometrically: edge lengths from vertex distances,
//! vertex angles as interior angles between adjacent edges.

use nalgebra::Point2;

use super::Shape;
use crate::error::{BuildError, BuildResult};
use crate::utils::math::{rad_to_deg, TOLERANCE};

impl Shape {
    /// Build a shape from a closed polygon.
    ///
    /// `labels[i]` names the vertex at `points[i]`; the edge from vertex
    /// `i` to vertex `i + 1` is named by concatenating their labels
    /// (`"A"`, `"B"` -> edge `"AB"`). Angles are unsigned interior angles,
    /// so the winding direction does not matter for convex polygons.
    pub fn from_polygon(
        name: impl Into<String>,
        labels: &[&str],
        points: &[Point2<f64>],
    ) -> BuildResult<Self> {
        if points.len() < 3 {
            return Err(BuildError::DegeneratePolygon(format!(
                "{} vertices, need at least 3",
                points.len()
            )));
        }
        if labels.len() != points.len() {
            return Err(BuildError::DegeneratePolygon(format!(
                "{} labels for {} vertices",
                labels.len(),
                points.len()
            )));
        }
        if labels.iter().any(|l| l.trim().is_empty()) {
            return Err(BuildError::EmptyName);
        }

        let n = points.len();
        let mut shape = Shape::new(name);

        for i in 0..n {
            let prev = (i + n - 1) % n;
            let next = (i + 1) % n;

            let to_next = points[next] - points[i];
            if to_next.norm() <= TOLERANCE {
                return Err(BuildError::DegeneratePolygon(format!(
                    "vertices {} and {} coincide",
                    labels[i], labels[next]
                )));
            }

            let to_prev = points[prev] - points[i];
            let angle = rad_to_deg(to_prev.angle(&to_next));

            shape.add_vertex(labels[i], angle)?;
            shape.add_edge(format!("{}{}", labels[i], labels[next]), to_next.norm())?;
        }

        Ok(shape)
    }

    /// Build a regular polygon with `sides` sides of length `side`, with
    /// vertices labelled `A`, `B`, `C`, ... counter-clockwise
    pub fn regular(name: impl Into<String>, sides: usize, side: f64) -> BuildResult<Self> {
        if sides < 3 {
            return Err(BuildError::DegeneratePolygon(format!(
                "{sides} sides, need at least 3"
            )));
        }
        if sides > 26 {
            return Err(BuildError::DegeneratePolygon(format!(
                "{sides} sides exceeds single-letter labelling"
            )));
        }
        if side <= TOLERANCE {
            return Err(BuildError::DegeneratePolygon(format!(
                "side length {side} too small"
            )));
        }

        let n = sides as f64;
        let circumradius = side / (2.0 * (std::f64::consts::PI / n).sin());
        let labels: Vec<String> = (0..sides)
            .map(|i| ((b'A' + i as u8) as char).to_string())
            .collect();
        let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();
        let points: Vec<Point2<f64>> = (0..sides)
            .map(|i| {
                let theta = 2.0 * std::f64::consts::PI * i as f64 / n;
                Point2::new(circumradius * theta.cos(), circumradius * theta.sin())
            })
            .collect();

        Self::from_polygon(name, &label_refs, &points)
    }
}

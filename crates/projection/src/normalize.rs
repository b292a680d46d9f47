//! Per-axis min-max normalization of projected coordinates.
//!
//! Each axis is mapped independently onto `[-scale, +scale]`:
//!
//! ```text
//! v' = -scale + (v - min) / (max - min) * 2 * scale
//! ```
//!
//! An axis whose values are all equal, or whose range is not finite, cannot be
//! stretched. Every point gets `0.0` on that axis and the axis is listed in
//! [`NormalizationReport::degenerate_axes`].
//!
//! ```
//! use projection::{normalize_points, Axis, SpatialPoint};
//!
//! let mut points = vec![SpatialPoint::new(0.0, 5.0, 1.0), SpatialPoint::new(10.0, 5.0, 3.0)];
//! let report = normalize_points(&mut points, 100.0).unwrap();
//!
//! assert_eq!(points[0].x, -100.0);
//! assert_eq!(points[1].x, 100.0);
//! assert_eq!(points[0].y, 0.0);
//! assert_eq!(report.degenerate_axes, vec![Axis::Y]);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{ProjectionError, SpatialPoint};

/// Default half-width of the normalized cube.
pub const DEFAULT_SCALE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    fn get(self, p: &SpatialPoint) -> f64 {
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
            Axis::Z => p.z,
        }
    }

    fn set(self, p: &mut SpatialPoint, value: f64) {
        match self {
            Axis::X => p.x = value,
            Axis::Y => p.y = value,
            Axis::Z => p.z = value,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        })
    }
}

/// Raw extent of one axis before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    fn is_degenerate(&self) -> bool {
        let span = self.span();
        !span.is_finite() || span <= 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationReport {
    pub scale: f64,
    /// Raw ranges in x, y, z order. Empty when there were no points.
    pub ranges: Vec<(Axis, AxisRange)>,
    /// Axes that collapsed to `0.0`.
    pub degenerate_axes: Vec<Axis>,
}

impl NormalizationReport {
    pub fn is_degenerate(&self, axis: Axis) -> bool {
        self.degenerate_axes.contains(&axis)
    }
}

fn axis_range(points: &[SpatialPoint], axis: Axis) -> AxisRange {
    let mut range = AxisRange {
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
    };
    for p in points {
        let v = axis.get(p);
        if v.is_nan() {
            return AxisRange {
                min: f64::NAN,
                max: f64::NAN,
            };
        }
        range.min = range.min.min(v);
        range.max = range.max.max(v);
    }
    range
}

/// Rescales `points` in place so each axis spans `[-scale, scale]`.
pub fn normalize_points(
    points: &mut [SpatialPoint],
    scale: f64,
) -> Result<NormalizationReport, ProjectionError> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(ProjectionError::InvalidScale { scale });
    }

    let mut report = NormalizationReport {
        scale,
        ranges: Vec::with_capacity(3),
        degenerate_axes: Vec::new(),
    };
    if points.is_empty() {
        return Ok(report);
    }

    for axis in Axis::ALL {
        let range = axis_range(points, axis);
        info!(axis = %axis, min = range.min, max = range.max, "axis_range");
        report.ranges.push((axis, range));

        if range.is_degenerate() {
            warn!(
                axis = %axis,
                min = range.min,
                max = range.max,
                "degenerate axis, mapping every point to 0.0"
            );
            report.degenerate_axes.push(axis);
            for p in points.iter_mut() {
                axis.set(p, 0.0);
            }
            continue;
        }

        let span = range.span();
        for p in points.iter_mut() {
            let v = -scale + (axis.get(p) - range.min) / span * 2.0 * scale;
            axis.set(p, v.clamp(-scale, scale));
        }
    }

    Ok(report)
}

use std::f64::consts::PI;

use tracing::info;

use crate::config::ShellParams;
use crate::{stream_rng, ProjectionError, SpatialPoint, SpatialStrategy};

/// Scatters points uniformly over directions inside a spherical shell.
///
/// Radius is drawn from `U[base_radius, base_radius + shell_thickness]`,
/// polar angle as `acos(2u - 1)` so directions are uniform on the sphere, and
/// azimuth from `U[0, 2pi)`. Points are independent; there is no repulsion.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShellPlacement {
    params: ShellParams,
}

impl ShellPlacement {
    pub fn new(params: ShellParams) -> Result<Self, ProjectionError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &ShellParams {
        &self.params
    }
}

impl SpatialStrategy for ShellPlacement {
    fn project(
        &self,
        count: usize,
        _embeddings: Option<&[Vec<f32>]>,
    ) -> Result<Vec<SpatialPoint>, ProjectionError> {
        let ShellParams {
            base_radius,
            shell_thickness,
            seed,
        } = self.params;
        let mut rng = stream_rng(seed, b"shell\0\0\0");

        let points: Vec<SpatialPoint> = (0..count)
            .map(|_| {
                let r = base_radius + rng.f64() * shell_thickness;
                let phi = (2.0 * rng.f64() - 1.0).acos();
                let theta = rng.f64() * 2.0 * PI;
                SpatialPoint::new(
                    r * theta.cos() * phi.sin(),
                    r * theta.sin() * phi.sin(),
                    r * phi.cos(),
                )
            })
            .collect();

        info!(
            count,
            base_radius,
            shell_thickness,
            "shell_placement_complete"
        );
        Ok(points)
    }

    fn requires_normalization(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "shell"
    }
}

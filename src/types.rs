use std::sync::Arc;

use crate::error::ProviderError;
use crate::provider::GridDataProvider;

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn GridDataProvider>,
}

/// Geographic box in degrees. `south < north` and `west < east`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
}

/// Dense row-major grid of one variable. Missing cells hold NaN.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    pub rows: usize,
    pub cols: usize,
    pub values: Vec<f64>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize, values: Vec<f64>) -> anyhow::Result<Self> {
        if rows.checked_mul(cols) != Some(values.len()) {
            anyhow::bail!(
                "Grid shape ({rows}, {cols}) does not hold {} values",
                values.len()
            );
        }
        Ok(Self { rows, cols, values })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.values
            .get(row * self.cols + col)
            .copied()
            .unwrap_or(f64::NAN)
    }
}

/// CAPE and SRH grids for one valid time, guaranteed to share a shape.
#[derive(Clone, Debug, PartialEq)]
pub struct GridPair {
    cape: Grid,
    srh: Grid,
}

impl GridPair {
    pub fn new(cape: Grid, srh: Grid) -> Result<Self, ProviderError> {
        if cape.shape() != srh.shape() {
            return Err(ProviderError::ShapeMismatch {
                cape: cape.shape(),
                srh: srh.shape(),
            });
        }
        Ok(Self { cape, srh })
    }

    pub fn cape(&self) -> &Grid {
        &self.cape
    }

    pub fn srh(&self) -> &Grid {
        &self.srh
    }

    pub fn shape(&self) -> (usize, usize) {
        self.cape.shape()
    }
}

//! Downsampling of the drawing surface into the model's 28x28 input.

use image::imageops::{self, FilterType};
use ndarray::{ArrayD, IxDyn};

use crate::surface::StrokeSurface;
use crate::types::{SketchError, SketchResult, FEATURE_LEN, FEATURE_SIDE};

/// Resampling filter. Triangle is bilinear and widens its support when
/// shrinking, which averages over the covered area.
const RESAMPLE_FILTER: FilterType = FilterType::Triangle;

/// 784 normalized intensities in row-major order, each in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    /// Wrap raw values, checking the length.
    pub fn from_values(values: Vec<f32>) -> SketchResult<Self> {
        if values.len() != FEATURE_LEN {
            return Err(SketchError::InvalidInput(format!(
                "feature vector needs {FEATURE_LEN} values, got {}",
                values.len()
            )));
        }
        Ok(Self(values))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value at grid cell (`row`, `col`).
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.0[row * FEATURE_SIDE as usize + col]
    }

    /// Reshape into a tensor of the given dimensions.
    pub fn to_tensor(&self, shape: &[usize]) -> SketchResult<ArrayD<f32>> {
        ArrayD::from_shape_vec(IxDyn(shape), self.0.clone()).map_err(|e| {
            tracing::debug!("Reshape to {shape:?} failed: {e}");
            SketchError::ShapeMismatch {
                model: shape.iter().product(),
                features: self.0.len(),
            }
        })
    }
}

/// Resample `surface` to 28x28 and scale intensities into [0, 1].
pub fn extract_features(surface: &StrokeSurface) -> FeatureVector {
    let small = imageops::resize(surface.pixels(), FEATURE_SIDE, FEATURE_SIDE, RESAMPLE_FILTER);
    let values = small
        .pixels()
        .map(|p| p.0[0] as f32 / 255.0)
        .collect::<Vec<f32>>();
    FeatureVector(values)
}

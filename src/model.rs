//! Pre-trained AQI regression model.
//!
//! The model is a black box behind the `AqiModel` trait: a vector goes in,
//! a list of scalars comes out. `LoadedModel` is the implementation backed by
//! a JSON artifact on disk:
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "feature_names": ["pm25", "pm10", "..."],
//!   "scaler": { "mean": [...], "std": [...] },
//!   "model": { "type": "linear", "intercept": 3.2, "coefficients": [...] }
//! }
//! ```
//!
//! `"model"` may instead be `{ "type": "mlp", "layers": [{ "weights": [[..]], "bias": [..] }] }`
//! where `weights` is `inputs × outputs`, hidden layers use ReLU and the final
//! layer is linear with a single output. `feature_names` and `scaler` are optional.

use std::path::Path;

use ndarray::{Array1, Array2};
use serde::Deserialize;

use crate::encoder::FEATURE_SCHEMA_VERSION;
use crate::error::{ConfigurationError, ModelError};

/// Anything that can turn a feature vector into AQI output(s).
///
/// Implementations must be safe to share across request handlers.
pub trait AqiModel: Send + Sync {
    /// Number of features the model expects.
    fn input_width(&self) -> usize;

    fn predict(&self, features: &[f64]) -> Result<Vec<f64>, ModelError>;
}

// ============================================================================
// Artifact (on-disk format)
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifact {
    pub schema_version: u32,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    #[serde(default)]
    pub scaler: Option<ScalerSpec>,
    pub model: ModelSpec,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScalerSpec {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ModelSpec {
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    Mlp {
        layers: Vec<LayerSpec>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayerSpec {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

// ============================================================================
// Loaded model
// ============================================================================

#[derive(Debug, Clone)]
struct Standardizer {
    mean: Array1<f64>,
    std: Array1<f64>,
}

impl Standardizer {
    fn transform(&self, x: Array1<f64>) -> Array1<f64> {
        (x - &self.mean) / &self.std
    }
}

#[derive(Debug, Clone)]
struct DenseLayer {
    weights: Array2<f64>,
    bias: Array1<f64>,
}

#[derive(Debug, Clone)]
enum Regressor {
    Linear {
        intercept: f64,
        coefficients: Array1<f64>,
    },
    Mlp(Vec<DenseLayer>),
}

/// A validated, ready-to-run model artifact.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    feature_names: Option<Vec<String>>,
    scaler: Option<Standardizer>,
    regressor: Regressor,
}

impl LoadedModel {
    /// Read and validate the artifact at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| {
            ConfigurationError::ModelRead {
                path: path.display().to_string(),
                source,
            }
        })?;
        let model = Self::from_json_str(&contents)?;

        tracing::info!(
            "Loaded {} model from {} ({} input features)",
            model.kind(),
            path.display(),
            model.input_width()
        );
        Ok(model)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        let artifact: ModelArtifact = serde_json::from_str(json)?;
        Self::from_artifact(artifact)
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ConfigurationError> {
        if artifact.schema_version != FEATURE_SCHEMA_VERSION {
            return Err(ConfigurationError::SchemaVersion {
                expected: FEATURE_SCHEMA_VERSION,
                found: artifact.schema_version,
            });
        }

        let regressor = match artifact.model {
            ModelSpec::Linear {
                intercept,
                coefficients,
            } => {
                if coefficients.is_empty() {
                    return Err(ConfigurationError::Model(
                        "linear model has no coefficients".to_string(),
                    ));
                }
                Regressor::Linear {
                    intercept,
                    coefficients: Array1::from(coefficients),
                }
            }
            ModelSpec::Mlp { layers } => Regressor::Mlp(build_layers(layers)?),
        };
        let width = regressor_width(&regressor);

        let scaler = match artifact.scaler {
            Some(spec) => Some(build_scaler(spec, width)?),
            None => None,
        };

        if let Some(names) = &artifact.feature_names {
            if names.len() != width {
                return Err(ConfigurationError::Model(format!(
                    "artifact lists {} feature names but the model takes {} inputs",
                    names.len(),
                    width
                )));
            }
        }

        Ok(Self {
            feature_names: artifact.feature_names,
            scaler,
            regressor,
        })
    }

    pub fn kind(&self) -> &'static str {
        match self.regressor {
            Regressor::Linear { .. } => "linear",
            Regressor::Mlp(_) => "mlp",
        }
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    /// Compare the artifact's declared column order with the encoder's.
    ///
    /// A mismatch is logged, not rejected: the column names are documentation
    /// and the artifact may predate them. Returns `true` when they agree or
    /// the artifact declares none.
    pub fn audit_feature_names(&self, expected: &[String]) -> bool {
        let Some(names) = &self.feature_names else {
            tracing::warn!("Model artifact does not declare feature names; column order is unaudited");
            return true;
        };

        match names.iter().zip(expected).position(|(a, b)| a != b) {
            None if names.len() == expected.len() => true,
            None => {
                tracing::warn!(
                    "Model declares {} features, encoder produces {}",
                    names.len(),
                    expected.len()
                );
                false
            }
            Some(i) => {
                tracing::warn!(
                    "Feature order mismatch at column {}: model '{}', encoder '{}'",
                    i,
                    names[i],
                    expected[i]
                );
                false
            }
        }
    }
}

impl AqiModel for LoadedModel {
    fn input_width(&self) -> usize {
        regressor_width(&self.regressor)
    }

    fn predict(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        let expected = self.input_width();
        if features.len() != expected {
            return Err(ModelError::ShapeMismatch {
                expected,
                actual: features.len(),
            });
        }

        let mut x = Array1::from(features.to_vec());
        if let Some(scaler) = &self.scaler {
            x = scaler.transform(x);
        }

        let output = match &self.regressor {
            Regressor::Linear {
                intercept,
                coefficients,
            } => vec![coefficients.dot(&x) + intercept],
            Regressor::Mlp(layers) => {
                let last = layers.len() - 1;
                for (i, layer) in layers.iter().enumerate() {
                    x = x.dot(&layer.weights) + &layer.bias;
                    if i < last {
                        x.mapv_inplace(relu);
                    }
                }
                x.to_vec()
            }
        };

        Ok(output)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn relu(v: f64) -> f64 {
    if v > 0.0 { v } else { 0.0 }
}

fn regressor_width(regressor: &Regressor) -> usize {
    match regressor {
        Regressor::Linear { coefficients, .. } => coefficients.len(),
        Regressor::Mlp(layers) => layers.first().map(|l| l.weights.nrows()).unwrap_or(0),
    }
}

fn to_matrix(rows: Vec<Vec<f64>>, layer: usize) -> Result<Array2<f64>, ConfigurationError> {
    let n_rows = rows.len();
    let n_cols = rows.first().map(Vec::len).unwrap_or(0);
    if n_rows == 0 || n_cols == 0 {
        return Err(ConfigurationError::Model(format!(
            "layer {} has an empty weight matrix",
            layer
        )));
    }
    if rows.iter().any(|r| r.len() != n_cols) {
        return Err(ConfigurationError::Model(format!(
            "layer {} weight matrix is ragged",
            layer
        )));
    }

    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n_rows, n_cols), flat)
        .map_err(|e| ConfigurationError::Model(format!("layer {}: {}", layer, e)))
}

fn build_layers(specs: Vec<LayerSpec>) -> Result<Vec<DenseLayer>, ConfigurationError> {
    if specs.is_empty() {
        return Err(ConfigurationError::Model("mlp has no layers".to_string()));
    }

    let mut layers: Vec<DenseLayer> = Vec::with_capacity(specs.len());
    for (i, spec) in specs.into_iter().enumerate() {
        let weights = to_matrix(spec.weights, i)?;
        if spec.bias.len() != weights.ncols() {
            return Err(ConfigurationError::Model(format!(
                "layer {} has {} outputs but {} bias terms",
                i,
                weights.ncols(),
                spec.bias.len()
            )));
        }
        if let Some(prev) = layers.last() {
            if prev.weights.ncols() != weights.nrows() {
                return Err(ConfigurationError::Model(format!(
                    "layer {} expects {} inputs but layer {} produces {}",
                    i,
                    weights.nrows(),
                    i - 1,
                    prev.weights.ncols()
                )));
            }
        }
        layers.push(DenseLayer {
            weights,
            bias: Array1::from(spec.bias),
        });
    }

    let outputs = layers.last().map(|l| l.weights.ncols()).unwrap_or(0);
    if outputs != 1 {
        return Err(ConfigurationError::Model(format!(
            "final layer must have exactly 1 output, found {}",
            outputs
        )));
    }
    Ok(layers)
}

fn build_scaler(spec: ScalerSpec, width: usize) -> Result<Standardizer, ConfigurationError> {
    if spec.mean.len() != width || spec.std.len() != width {
        return Err(ConfigurationError::Model(format!(
            "scaler has {} means and {} deviations for {} inputs",
            spec.mean.len(),
            spec.std.len(),
            width
        )));
    }
    // Constant training columns have zero deviation; leave them unscaled.
    let std = spec
        .std
        .into_iter()
        .map(|s| if s == 0.0 { 1.0 } else { s })
        .collect::<Array1<f64>>();

    Ok(Standardizer {
        mean: Array1::from(spec.mean),
        std,
    })
}

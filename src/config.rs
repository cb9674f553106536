//! Model-wide configuration

use crate::error::BuildResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Parameters shared by every registry of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Number of spatial dimensions passed to the engine
    pub ndm: u8,
    /// Degrees of freedom per node
    pub ndf: u8,
    /// Distance below which two nodes are considered the same point
    pub node_merge_tolerance: f64,
    /// Vertical distance below which an element joins an existing floor
    pub floor_height_tolerance: f64,
    /// Directory where stage results are written as JSON (None = keep in memory only)
    pub results_dir: Option<PathBuf>,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            ndm: 3,
            ndf: 6,
            node_merge_tolerance: 1e-6,
            floor_height_tolerance: 0.1,
            results_dir: None,
        }
    }
}

impl ModelParams {
    pub fn from_json_str(json: &str) -> BuildResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> BuildResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Set the node merge tolerance
    pub fn with_node_tolerance(mut self, tol: f64) -> Self {
        self.node_merge_tolerance = tol;
        self
    }

    /// Set the floor height tolerance
    pub fn with_floor_tolerance(mut self, tol: f64) -> Self {
        self.floor_height_tolerance = tol;
        self
    }

    /// Persist stage results under `dir`
    pub fn with_results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = Some(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = ModelParams::default();
        assert_eq!(params.ndm, 3);
        assert_eq!(params.ndf, 6);
        assert!((params.node_merge_tolerance - 1e-6).abs() < 1e-18);
        assert!((params.floor_height_tolerance - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let params = ModelParams::from_json_str(r#"{"floor_height_tolerance": 0.25}"#).unwrap();
        assert!((params.floor_height_tolerance - 0.25).abs() < 1e-12);
        assert_eq!(params.ndf, 6);
        assert!(params.results_dir.is_none());
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(ModelParams::from_json_str("{ndm: 3").is_err());
    }
}

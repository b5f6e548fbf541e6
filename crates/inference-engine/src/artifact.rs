//! Model Artifact Loading
//!
//! The artifact is a JSON bundle holding the fitted classifier, the mapping
//! from encoded class to label, and optionally the expected feature names and
//! an embedded reference dataset.

use crate::model::{Classifier, ClassifierModel};
use crate::InferenceError;
use feature_engine::ReferenceDataset;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

/// Keys every artifact must carry
pub const REQUIRED_KEYS: [&str; 2] = ["model", "label_encoder_mapping"];

#[derive(Deserialize)]
struct RawArtifact {
    model: ClassifierModel,
    label_encoder_mapping: BTreeMap<String, Value>,
    #[serde(default)]
    feature_names: Option<Vec<String>>,
    #[serde(default)]
    reference_dataset: Option<ReferenceDataset>,
}

/// Encoded class code to human-readable label
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelDecoder {
    labels: BTreeMap<i64, String>,
}

impl LabelDecoder {
    pub fn new(labels: BTreeMap<i64, String>) -> Self {
        Self { labels }
    }

    /// Parse the serialized mapping. Keys are integer codes written as strings.
    fn from_mapping(mapping: BTreeMap<String, Value>) -> Result<Self, InferenceError> {
        let mut labels = BTreeMap::new();
        for (key, value) in mapping {
            let code = key.trim().parse::<i64>().map_err(|_| {
                InferenceError::InvalidArtifact(format!(
                    "label_encoder_mapping key '{}' is not an integer class code",
                    key
                ))
            })?;
            let label = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            labels.insert(code, label);
        }
        Ok(Self { labels })
    }

    pub fn decode(&self, code: i64) -> Option<&str> {
        self.labels.get(&code).map(String::as_str)
    }

    /// Every known label, ordered by class code
    pub fn labels(&self) -> impl Iterator<Item = (i64, &str)> {
        self.labels.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Immutable bundle loaded from the artifact file
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    pub classifier: ClassifierModel,
    pub labels: LabelDecoder,
    pub feature_names: Option<Vec<String>>,
    pub reference_dataset: Option<ReferenceDataset>,
    pub source: Option<PathBuf>,
}

impl ModelArtifact {
    /// Read and validate an artifact file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| InferenceError::ArtifactLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut artifact = Self::from_json(&json)?;
        artifact.source = Some(path.to_path_buf());

        info!(
            "Loaded {} model from {} ({} features, {} labels)",
            artifact.classifier.kind(),
            path.display(),
            artifact.classifier.n_features(),
            artifact.labels.len()
        );
        Ok(artifact)
    }

    /// Parse and validate an artifact document
    pub fn from_json(json: &str) -> Result<Self, InferenceError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| InferenceError::InvalidArtifact(e.to_string()))?;

        let object = value
            .as_object()
            .ok_or_else(|| InferenceError::InvalidArtifact("artifact is not a JSON object".to_string()))?;
        for key in REQUIRED_KEYS {
            if !object.contains_key(key) {
                return Err(InferenceError::MissingKey(key));
            }
        }

        let raw: RawArtifact = serde_json::from_value(value)
            .map_err(|e| InferenceError::InvalidArtifact(e.to_string()))?;

        raw.model.validate()?;
        let labels = LabelDecoder::from_mapping(raw.label_encoder_mapping)?;

        if let Some(names) = &raw.feature_names {
            if raw.model.n_features() > names.len() {
                return Err(InferenceError::InvalidArtifact(format!(
                    "model expects {} features but feature_names lists {}",
                    raw.model.n_features(),
                    names.len()
                )));
            }
        }
        if let Some(dataset) = &raw.reference_dataset {
            dataset
                .validate()
                .map_err(|e| InferenceError::InvalidArtifact(e.to_string()))?;
        }

        debug!("Artifact parsed: model={}", raw.model.kind());
        Ok(Self {
            classifier: raw.model,
            labels,
            feature_names: raw.feature_names,
            reference_dataset: raw.reference_dataset,
            source: None,
        })
    }
}

/// Process-lifetime holder for a loaded artifact.
///
/// The first successful load is kept and every later call returns the same
/// `Arc`, whatever path it passes. A failed load leaves the cache empty.
#[derive(Debug, Default)]
pub struct ArtifactCache {
    cell: OnceLock<Arc<ModelArtifact>>,
}

static GLOBAL_ARTIFACT: ArtifactCache = ArtifactCache::new();

impl ArtifactCache {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Cache shared by the whole process
    pub fn global() -> &'static ArtifactCache {
        &GLOBAL_ARTIFACT
    }

    pub fn get(&self) -> Option<Arc<ModelArtifact>> {
        self.cell.get().cloned()
    }

    pub fn get_or_load(&self, path: impl AsRef<Path>) -> Result<Arc<ModelArtifact>, InferenceError> {
        if let Some(artifact) = self.cell.get() {
            debug!("Model artifact served from cache");
            return Ok(Arc::clone(artifact));
        }

        let loaded = Arc::new(ModelArtifact::from_path(path)?);
        // A concurrent loader may have won; keep whichever landed first
        Ok(Arc::clone(self.cell.get_or_init(|| loaded)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ARTIFACT: &str = r#"{
        "model": {
            "type": "decision_tree",
            "n_features": 2,
            "nodes": [
                {"split": {"feature": 1, "threshold": 2.5, "left": 1, "right": 2}},
                {"leaf": {"class": 0}},
                {"leaf": {"class": 1}}
            ]
        },
        "label_encoder_mapping": {"0": "Activo", "1": "Cancelado"},
        "feature_names": ["Edad", "Cantidad de quejas"]
    }"#;

    fn write_artifact(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_artifact() {
        let artifact = ModelArtifact::from_json(ARTIFACT).unwrap();
        assert_eq!(artifact.labels.decode(1), Some("Cancelado"));
        assert_eq!(artifact.labels.decode(5), None);
        assert_eq!(artifact.feature_names.as_ref().map(Vec::len), Some(2));
        assert!(artifact.reference_dataset.is_none());
    }

    #[test]
    fn test_missing_label_mapping() {
        let json = r#"{"model": {"type": "decision_tree", "n_features": 1, "nodes": [{"leaf": {"class": 0}}]}}"#;
        let err = ModelArtifact::from_json(json).unwrap_err();
        assert!(matches!(err, InferenceError::MissingKey("label_encoder_mapping")));
        assert!(err.to_string().contains("label_encoder_mapping"));
    }

    #[test]
    fn test_missing_model() {
        let json = r#"{"label_encoder_mapping": {"0": "Activo"}}"#;
        assert!(matches!(
            ModelArtifact::from_json(json),
            Err(InferenceError::MissingKey("model"))
        ));
    }

    #[test]
    fn test_non_integer_label_key() {
        let json = ARTIFACT.replace(r#""1": "Cancelado""#, r#""uno": "Cancelado""#);
        assert!(matches!(
            ModelArtifact::from_json(&json),
            Err(InferenceError::InvalidArtifact(_))
        ));
    }

    #[test]
    fn test_numeric_label_values_stringified() {
        let json = ARTIFACT.replace(r#""1": "Cancelado""#, r#""1": 42"#);
        let artifact = ModelArtifact::from_json(&json).unwrap();
        assert_eq!(artifact.labels.decode(1), Some("42"));
    }

    #[test]
    fn test_too_few_feature_names() {
        let json = ARTIFACT.replace(r#"["Edad", "Cantidad de quejas"]"#, r#"["Edad"]"#);
        assert!(matches!(
            ModelArtifact::from_json(&json),
            Err(InferenceError::InvalidArtifact(_))
        ));
    }

    #[test]
    fn test_corrupt_artifact() {
        assert!(matches!(
            ModelArtifact::from_json("{not json"),
            Err(InferenceError::InvalidArtifact(_))
        ));
        assert!(matches!(
            ModelArtifact::from_json("[1, 2]"),
            Err(InferenceError::InvalidArtifact(_))
        ));
    }

    #[test]
    fn test_embedded_reference_dataset() {
        let json = ARTIFACT.replace(
            r#""feature_names""#,
            r#""reference_dataset": {"columns": ["Edad", "Estado Aprendiz"], "rows": [[20, "Activo"]]},
               "feature_names""#,
        );
        let artifact = ModelArtifact::from_json(&json).unwrap();
        let dataset = artifact.reference_dataset.unwrap();
        assert_eq!(dataset.columns, vec!["Edad", "Estado Aprendiz"]);
    }

    #[test]
    fn test_missing_file() {
        let err = ModelArtifact::from_path("/nonexistent/best_model.json").unwrap_err();
        assert!(matches!(err, InferenceError::ArtifactLoad { .. }));
    }

    #[test]
    fn test_cache_returns_same_artifact() {
        let file = write_artifact(ARTIFACT);
        let cache = ArtifactCache::new();
        assert!(cache.get().is_none());

        let first = cache.get_or_load(file.path()).unwrap();
        let second = cache.get_or_load("/ignored/after/first/load.json").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.source.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_cache_does_not_keep_failures() {
        let cache = ArtifactCache::new();
        assert!(cache.get_or_load("/nonexistent/best_model.json").is_err());
        assert!(cache.get().is_none());

        let file = write_artifact(ARTIFACT);
        assert!(cache.get_or_load(file.path()).is_ok());
    }
}

// ============================================================
// Layer 4 — Label Encoder
// ============================================================
// Maps emotion label strings to class indices 0..K-1 and back.
//
// Classes are sorted lexicographically at fit time, so the
// same set of labels always produces the same index order.
// Once a model has been trained against an encoder, that
// encoder must be loaded and reused for every later run
// (see ArtifactStore::load_or_fit_encoder); refitting on a
// different label set would silently reorder the classes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::error::PipelineError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    /// Class names; position in this Vec is the class index
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit an encoder over every distinct label in `labels`.
    pub fn fit<S: AsRef<str>>(labels: &[S]) -> Self {
        let classes: BTreeSet<&str> = labels.iter().map(|l| l.as_ref()).collect();
        Self {
            classes: classes.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn encode(&self, label: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == label)
    }

    /// Encode a whole column, failing on the first label the encoder has never seen.
    pub fn encode_all<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>, PipelineError> {
        labels
            .iter()
            .map(|l| {
                self.encode(l.as_ref())
                    .ok_or_else(|| PipelineError::UnknownLabel(l.as_ref().to_string()))
            })
            .collect()
    }

    pub fn decode(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }
}

//! Per-exercise file roles read from `.meta/config.json`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{CatalogError, Result};

/// Location of the metadata file relative to an exercise directory.
pub const METADATA_FILE: &str = ".meta/config.json";

/// File role lists of an exercise.
///
/// Only `files` matters to the pipeline; every other key of the metadata
/// document (authors, blurb, source, ...) is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExerciseMetadata {
    pub files: ExerciseFiles,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExerciseFiles {
    /// Learner-facing stub paths, in order. Never empty.
    pub solution: Vec<String>,

    /// Test suite paths, always copied.
    pub test: Vec<String>,

    /// Helper files shipped to the learner's editor, always copied.
    #[serde(default)]
    pub editor: Vec<String>,

    /// Reference implementation of a concept exercise.
    #[serde(default)]
    pub exemplar: Vec<String>,

    /// Reference implementation of a practice exercise.
    #[serde(default)]
    pub example: Vec<String>,
}

impl ExerciseMetadata {
    /// Read and validate `<exercise_dir>/.meta/config.json`.
    pub fn load(exercise_dir: &Path, slug: &str) -> Result<Self> {
        let path = exercise_dir.join(METADATA_FILE);
        let data = std::fs::read_to_string(&path).map_err(|source| CatalogError::Read {
            path: path.clone(),
            source,
        })?;
        Self::parse(&data, &path, slug)
    }

    /// Parse and validate a metadata document already in memory.
    pub fn parse(data: &str, path: &Path, slug: &str) -> Result<Self> {
        let metadata: ExerciseMetadata =
            serde_json::from_str(data).map_err(|source| CatalogError::Parse {
                path: PathBuf::from(path),
                source,
            })?;
        metadata.validate(slug)?;
        Ok(metadata)
    }

    fn validate(&self, slug: &str) -> Result<()> {
        if self.files.solution.is_empty() {
            return Err(CatalogError::InvalidMetadata {
                slug: slug.to_string(),
                reason: "solution file list is empty".to_string(),
            });
        }
        Ok(())
    }
}

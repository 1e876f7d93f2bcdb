//! Track catalog reader.
//!
//! Reads the track-level `config.json` and resolves each listed exercise to
//! its directory and metadata. Every failure here is fatal for the run.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::domain::{
    CatalogError, Exercise, ExerciseDescriptor, ExerciseKind, ExerciseMetadata, Result,
};

/// Track configuration file name, relative to the track root.
pub const TRACK_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Default, Deserialize)]
struct TrackConfig {
    #[serde(default)]
    exercises: TrackExercises,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TrackExercises {
    #[serde(default)]
    concept: Vec<ExerciseDescriptor>,
    #[serde(default)]
    practice: Vec<ExerciseDescriptor>,
}

/// The exercise catalog of one track.
#[derive(Debug, Clone)]
pub struct Catalog {
    root: PathBuf,
    config: TrackConfig,
}

impl Catalog {
    /// Open the catalog at `<root>/config.json`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let path = root.join(TRACK_CONFIG_FILE);
        debug!(path = %path.display(), "Reading track config");

        let data = std::fs::read_to_string(&path).map_err(|source| CatalogError::Read {
            path: path.clone(),
            source,
        })?;
        let config =
            serde_json::from_str(&data).map_err(|source| CatalogError::Parse { path, source })?;

        Ok(Self { root, config })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Catalog entries of one kind, in catalog order.
    pub fn descriptors(&self, kind: ExerciseKind) -> &[ExerciseDescriptor] {
        match kind {
            ExerciseKind::Concept => &self.config.exercises.concept,
            ExerciseKind::Practice => &self.config.exercises.practice,
        }
    }

    /// Resolve every exercise of `kind` against the track tree, reading
    /// its metadata.
    pub fn for_kind(&self, kind: ExerciseKind) -> Result<Vec<Exercise>> {
        let base = self.root.join(kind.directory());
        self.descriptors(kind)
            .iter()
            .map(|descriptor| {
                let path = base.join(&descriptor.slug);
                let metadata = ExerciseMetadata::load(&path, &descriptor.slug)?;
                Ok(Exercise {
                    descriptor: descriptor.clone(),
                    kind,
                    path,
                    metadata,
                })
            })
            .collect()
    }
}

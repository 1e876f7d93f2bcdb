//! Exercise identity, lifecycle status and kind.

use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;

use icu_collator::{Collator, CollatorOptions, Strength};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::metadata::ExerciseMetadata;

/// The two exercise families of a track.
///
/// The kind decides which metadata list holds the reference implementation
/// and the directory the exercises live in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Concept,
    Practice,
}

impl ExerciseKind {
    /// All kinds in report order.
    pub const ALL: [ExerciseKind; 2] = [ExerciseKind::Concept, ExerciseKind::Practice];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseKind::Concept => "concept",
            ExerciseKind::Practice => "practice",
        }
    }

    /// Capitalised name used in report headings.
    pub fn title(&self) -> &'static str {
        match self {
            ExerciseKind::Concept => "Concept",
            ExerciseKind::Practice => "Practice",
        }
    }

    /// Directory, relative to the track root, holding exercises of this kind.
    pub fn directory(&self) -> PathBuf {
        PathBuf::from("exercises").join(self.as_str())
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an exercise. A missing status means `Active`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseStatus {
    #[serde(rename = "wip")]
    WorkInProgress,
    Beta,
    #[default]
    Active,
    Deprecated,
}

impl ExerciseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseStatus::WorkInProgress => "work-in-progress",
            ExerciseStatus::Beta => "beta",
            ExerciseStatus::Active => "active",
            ExerciseStatus::Deprecated => "deprecated",
        }
    }
}

/// One entry of the track catalog (`exercises.concept[]` / `exercises.practice[]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExerciseDescriptor {
    pub uuid: Uuid,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub status: ExerciseStatus,
}

/// A catalog entry resolved against the track tree: where it lives on disk
/// and which files play which role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exercise {
    pub descriptor: ExerciseDescriptor,
    pub kind: ExerciseKind,
    /// Absolute (or track-root relative) exercise directory.
    pub path: PathBuf,
    pub metadata: ExerciseMetadata,
}

impl Exercise {
    pub fn slug(&self) -> &str {
        &self.descriptor.slug
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn status(&self) -> ExerciseStatus {
        self.descriptor.status
    }

    /// Reference implementation paths: `exemplar` for concept exercises,
    /// `example` for practice exercises.
    pub fn reference_files(&self) -> &[String] {
        match self.kind {
            ExerciseKind::Concept => &self.metadata.files.exemplar,
            ExerciseKind::Practice => &self.metadata.files.example,
        }
    }
}

/// Report ordering of exercises: display name ascending, compared with
/// root-locale collation at secondary strength (case-insensitive, accents
/// sort next to their base letter).
///
/// Names that collate equal fall back to the exact name and then the slug
/// so the order is total.
pub struct NameOrder {
    collator: Option<Collator>,
}

impl Default for NameOrder {
    fn default() -> Self {
        let mut options = CollatorOptions::new();
        options.strength = Some(Strength::Secondary);
        let collator = Collator::try_new(&Default::default(), options)
            .map_err(|e| warn!("Collation unavailable, ordering by lowercase name: {e}"))
            .ok();
        Self { collator }
    }
}

impl NameOrder {
    pub fn compare_names(&self, a: &str, b: &str) -> Ordering {
        match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => a.to_lowercase().cmp(&b.to_lowercase()),
        }
    }

    pub fn compare(&self, a: &Exercise, b: &Exercise) -> Ordering {
        self.compare_names(a.name(), b.name())
            .then_with(|| a.name().cmp(b.name()))
            .then_with(|| a.slug().cmp(b.slug()))
    }

    pub fn sort(&self, exercises: &mut [Exercise]) {
        exercises.sort_by(|a, b| self.compare(a, b));
    }
}

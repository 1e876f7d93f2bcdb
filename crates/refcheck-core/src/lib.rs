//! refcheck core library
//!
//! Typed view of an exercise track: the catalog of exercises, the
//! per-exercise file roles from `.meta/config.json`, and the verdict a
//! test-runner harness writes to `results.json`.

pub mod catalog;
pub mod domain;
pub mod telemetry;

pub use catalog::{Catalog, TRACK_CONFIG_FILE};
pub use domain::{
    CatalogError, Exercise, ExerciseDescriptor, ExerciseKind, ExerciseMetadata, ExerciseStatus,
    ExerciseFiles, HarnessVerdict, NameOrder, Result, TestCaseResult, TestStatus, METADATA_FILE,
};
pub use telemetry::init_tracing;

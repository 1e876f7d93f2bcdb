//! Domain types shared by the catalog reader and the test pipeline.

pub mod error;
pub mod exercise;
pub mod metadata;
pub mod verdict;

pub use error::{CatalogError, Result};
pub use exercise::{Exercise, ExerciseDescriptor, ExerciseKind, ExerciseStatus, NameOrder};
pub use metadata::{ExerciseFiles, ExerciseMetadata, METADATA_FILE};
pub use verdict::{HarnessVerdict, TestCaseResult, TestStatus};

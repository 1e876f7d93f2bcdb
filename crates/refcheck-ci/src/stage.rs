//! Workspace staging.
//!
//! A workspace is a disposable directory holding exactly what the harness
//! needs: the exercise metadata, its tests and editor helpers, and the
//! reference implementation copied over the learner stub.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use futures::future::try_join_all;
use refcheck_core::{Exercise, METADATA_FILE};
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::StageError;

/// Why a file is copied into the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileRole {
    Metadata,
    Test,
    Editor,
    /// Reference implementation placed at a stub location.
    Implementation,
    /// Stub copied verbatim because no reference file pairs with it.
    Stub,
}

/// A single planned copy from the exercise tree into the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOp {
    /// Source path, relative to the exercise directory.
    pub from: PathBuf,
    /// Destination path, relative to the workspace root.
    pub to: PathBuf,
    pub role: FileRole,
}

impl CopyOp {
    fn new(from: PathBuf, to: PathBuf, role: FileRole) -> Self {
        Self { from, to, role }
    }
}

/// Plan every copy needed to stage `exercise`.
///
/// Implementation files depend on the list lengths:
/// - more reference files than stubs: every reference file lands next to
///   the first solution file under its own file name and no stub is staged
/// - otherwise the lists are walked in lockstep; a paired reference file
///   lands on the solution path and an unpaired stub is copied unchanged
///
/// When two copies target the same destination only the later one is kept,
/// in role order metadata, test, editor, implementation.
pub fn plan_copies(exercise: &Exercise) -> Result<Vec<CopyOp>, StageError> {
    let files = &exercise.metadata.files;
    let mut ops = vec![CopyOp::new(
        PathBuf::from(METADATA_FILE),
        PathBuf::from(METADATA_FILE),
        FileRole::Metadata,
    )];

    for file in &files.test {
        let path = relative_path(file)?;
        ops.push(CopyOp::new(path.clone(), path, FileRole::Test));
    }
    for file in &files.editor {
        let path = relative_path(file)?;
        ops.push(CopyOp::new(path.clone(), path, FileRole::Editor));
    }

    let solutions = files
        .solution
        .iter()
        .map(|f| relative_path(f))
        .collect::<Result<Vec<_>, _>>()?;
    let references = exercise
        .reference_files()
        .iter()
        .map(|f| relative_path(f))
        .collect::<Result<Vec<_>, _>>()?;

    // Java-style tracks keep stubs under src/main/java and references under
    // .meta/src/reference/java, so split references follow the stub layout.
    let solution_dir = solutions
        .first()
        .and_then(|p| p.parent())
        .map(Path::to_path_buf)
        .unwrap_or_default();

    if references.len() > solutions.len() {
        for reference in references {
            let name = reference
                .file_name()
                .ok_or_else(|| StageError::UnsafePath {
                    path: reference.display().to_string(),
                })?
                .to_owned();
            ops.push(CopyOp::new(
                reference,
                solution_dir.join(name),
                FileRole::Implementation,
            ));
        }
    } else {
        let mut reference_iter = references.into_iter();
        for solution in solutions {
            match reference_iter.next() {
                Some(reference) => {
                    ops.push(CopyOp::new(reference, solution, FileRole::Implementation))
                }
                None => ops.push(CopyOp::new(solution.clone(), solution, FileRole::Stub)),
            }
        }
    }

    Ok(dedupe_destinations(ops))
}

/// Keep only the last copy per destination, preserving plan order.
fn dedupe_destinations(ops: Vec<CopyOp>) -> Vec<CopyOp> {
    let last: HashMap<PathBuf, usize> = ops
        .iter()
        .enumerate()
        .map(|(i, op)| (op.to.clone(), i))
        .collect();

    ops.into_iter()
        .enumerate()
        .filter(|(i, op)| last.get(&op.to) == Some(i))
        .map(|(_, op)| op)
        .collect()
}

/// Validate a metadata path: relative, non-empty, no `..`.
fn relative_path(raw: &str) -> Result<PathBuf, StageError> {
    let path = Path::new(raw);
    let normal = path.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if raw.is_empty() || !normal || path.file_name().is_none() {
        return Err(StageError::UnsafePath {
            path: raw.to_string(),
        });
    }
    Ok(path.to_path_buf())
}

/// A staged exercise directory. Removed from disk when dropped.
#[derive(Debug)]
pub struct Workspace {
    slug: String,
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh, uniquely named, empty workspace under `root`.
    pub fn create(root: &Path, slug: &str) -> Result<Self, StageError> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("{slug}-"))
            .tempdir_in(root)
            .map_err(|source| StageError::CreateWorkspace {
                root: root.to_path_buf(),
                source,
            })?;
        debug!(slug, path = %dir.path().display(), "Created workspace");
        Ok(Self {
            slug: slug.to_string(),
            dir,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }
}

/// Stages exercise workspaces.
#[async_trait]
pub trait WorkspaceStager: Send + Sync {
    async fn stage(&self, exercise: &Exercise) -> Result<Workspace, StageError>;
}

/// Stager that copies from the exercise tree on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsStager {
    root: PathBuf,
}

impl FsStager {
    /// Create a stager placing workspaces under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for FsStager {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

#[async_trait]
impl WorkspaceStager for FsStager {
    async fn stage(&self, exercise: &Exercise) -> Result<Workspace, StageError> {
        let ops = plan_copies(exercise)?;
        if exercise.reference_files().is_empty() {
            warn!(
                exercise = %exercise.name(),
                "Exercise lists no reference implementation; testing the stub"
            );
        }

        let workspace = Workspace::create(&self.root, exercise.slug())?;
        try_join_all(ops.iter().map(|op| {
            copy_file(exercise.path.join(&op.from), workspace.path().join(&op.to))
        }))
        .await?;

        debug!(
            exercise = %exercise.name(),
            files = ops.len(),
            path = %workspace.path().display(),
            "Staged workspace"
        );
        Ok(workspace)
    }
}

async fn copy_file(from: PathBuf, to: PathBuf) -> Result<(), StageError> {
    debug!("Copying {} to {}", from.display(), to.display());
    let copy_err = |source| StageError::Copy {
        from: from.clone(),
        to: to.clone(),
        source,
    };

    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(copy_err)?;
    }
    tokio::fs::copy(&from, &to).await.map_err(copy_err)?;
    Ok(())
}

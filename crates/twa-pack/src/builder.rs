use crate::api::{BuildType, Receipt};
use crate::errors::PackError;
use crate::runner::ToolRunner;
use std::path::{Path, PathBuf};

const ARTIFACT_SEARCH_DEPTH: usize = 8;

#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub receipt: Receipt,
    pub artifacts: Vec<PathBuf>,
}

pub fn build_args(build_type: BuildType) -> Vec<String> {
    let mut args = vec!["build".to_string()];
    if build_type == BuildType::Aab {
        args.push("--skipSigning".to_string());
    }
    args
}

/// Files under `project_dir` with the build type's extension, sorted.
pub fn find_artifacts(project_dir: &Path, build_type: BuildType) -> Vec<PathBuf> {
    let ext = build_type.extension();
    let mut out: Vec<PathBuf> = walkdir::WalkDir::new(project_dir)
        .max_depth(ARTIFACT_SEARCH_DEPTH)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .is_some_and(|x| x.eq_ignore_ascii_case(ext))
        })
        .map(|e| e.into_path())
        .collect();
    out.sort();
    out
}

pub async fn build<T: ToolRunner>(
    tool: &T,
    build_type: BuildType,
    project_dir: &Path,
) -> Result<BuildOutcome, PackError> {
    tracing::info!(build_type = build_type.label(), dir = %project_dir.display(), "building");
    let receipt = tool
        .run(&build_args(build_type), project_dir)
        .await
        .map_err(|e| PackError::BuildFailed {
            build_type: build_type.label().to_string(),
            reason: format!("failed to start packaging tool: {e}"),
        })?;
    if !receipt.success {
        return Err(PackError::BuildFailed {
            build_type: build_type.label().to_string(),
            reason: receipt.failure_reason(),
        });
    }

    let artifacts = find_artifacts(project_dir, build_type);
    if artifacts.is_empty() {
        tracing::warn!(dir = %project_dir.display(), "build succeeded but no artifacts were found");
    }
    for a in &artifacts {
        tracing::info!(artifact = %a.display(), "artifact");
    }
    Ok(BuildOutcome { receipt, artifacts })
}

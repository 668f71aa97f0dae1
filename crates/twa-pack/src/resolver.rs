use crate::api::{ManifestSource, Receipt};
use crate::errors::PackError;
use crate::files::reset_dir;
use crate::manifest::{WebAppManifest, write_local_manifest};
use crate::runner::ToolRunner;
use std::path::{Path, PathBuf};

/// Inputs of project initialization.
#[derive(Debug, Clone)]
pub struct InitPlan {
    pub remote_manifest_url: String,
    pub local_manifest_path: PathBuf,
    pub manifest: WebAppManifest,
    pub project_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct InitOutcome {
    pub source: ManifestSource,
    pub receipts: Vec<Receipt>,
}

fn init_args(manifest: &str) -> Vec<String> {
    vec![
        "init".to_string(),
        "--manifest".to_string(),
        manifest.to_string(),
    ]
}

async fn try_init<T: ToolRunner>(
    tool: &T,
    manifest: &str,
    project_dir: &Path,
    receipts: &mut Vec<Receipt>,
) -> Result<(), String> {
    match tool.run(&init_args(manifest), project_dir).await {
        Ok(receipt) => {
            let ok = receipt.success;
            let reason = receipt.failure_reason();
            receipts.push(receipt);
            if ok { Ok(()) } else { Err(reason) }
        }
        Err(e) => Err(format!("failed to start packaging tool: {e}")),
    }
}

/// Initializes the packaging project from the remote manifest, falling back to a
/// locally generated manifest when that fails.
///
/// The project dir is emptied before each attempt. The local manifest is only
/// written when the remote attempt failed, after the second reset.
pub async fn resolve_manifest_and_init<T: ToolRunner>(
    tool: &T,
    plan: &InitPlan,
) -> Result<InitOutcome, PackError> {
    let mut receipts = Vec::new();

    reset_dir(&plan.project_dir)?;
    tracing::info!(url = %plan.remote_manifest_url, "initializing project from remote manifest");
    let remote_failure =
        match try_init(tool, &plan.remote_manifest_url, &plan.project_dir, &mut receipts).await {
            Ok(()) => {
                return Ok(InitOutcome {
                    source: ManifestSource::Remote {
                        url: plan.remote_manifest_url.clone(),
                    },
                    receipts,
                });
            }
            Err(reason) => reason,
        };

    tracing::warn!(
        url = %plan.remote_manifest_url,
        reason = %remote_failure,
        "remote manifest unavailable, falling back to local manifest"
    );
    reset_dir(&plan.project_dir)?;
    write_local_manifest(&plan.local_manifest_path, &plan.manifest)?;

    let local = plan.local_manifest_path.to_string_lossy().into_owned();
    try_init(tool, &local, &plan.project_dir, &mut receipts)
        .await
        .map_err(|reason| PackError::LocalInitFailed {
            manifest: local.clone(),
            reason,
        })?;

    Ok(InitOutcome {
        source: ManifestSource::LocalFallback {
            path: plan.local_manifest_path.clone(),
            remote_url: plan.remote_manifest_url.clone(),
            remote_failure,
        },
        receipts,
    })
}

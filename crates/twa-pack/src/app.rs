use crate::{
    api::{BuildType, ManifestSource, PackOutput, PatchOutcome, PrerequisiteStatus},
    builder,
    config::{Profile, load_profile},
    errors::PackError,
    manifest::write_local_manifest,
    prerequisites::{check_prerequisites, ensure_required},
    project_config::patch_project_config,
    resolver::{InitPlan, resolve_manifest_and_init},
    runner::{Bubblewrap, ToolRunner},
};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Prerequisites, init with manifest fallback, config patch, build.
    Build,
    /// Everything `Build` does except the build itself.
    Init,
    /// Write the local web manifest only.
    Manifest,
    /// Patch an already initialized project config.
    Configure,
    /// Prerequisite report.
    Doctor,
}

impl Action {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "build" => Some(Self::Build),
            "init" => Some(Self::Init),
            "manifest" => Some(Self::Manifest),
            "configure" => Some(Self::Configure),
            "doctor" => Some(Self::Doctor),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::Build => "build",
            Action::Init => "init",
            Action::Manifest => "manifest",
            Action::Configure => "configure",
            Action::Doctor => "doctor",
        }
    }

    fn checks_prerequisites(self) -> bool {
        matches!(self, Action::Build | Action::Init | Action::Doctor)
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub work_dir: PathBuf,
    pub profile_path: PathBuf,
    pub build_type: Option<BuildType>,
    /// Skip spawning the packaging tool; filesystem steps still run.
    pub dry_run: bool,
    pub skip_prerequisites: bool,
}

impl RunOptions {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        RunOptions {
            profile_path: work_dir.join(crate::config::DEFAULT_PROFILE_PATH),
            work_dir,
            build_type: None,
            dry_run: false,
            skip_prerequisites: false,
        }
    }
}

pub fn load_run_profile(opts: &RunOptions) -> Result<Profile, PackError> {
    // The packaging tool runs inside the output dir, so profile paths must not stay relative.
    let work_dir = std::path::absolute(&opts.work_dir)
        .map_err(|e| PackError::io("failed to resolve work dir", &opts.work_dir, e))?;
    let mut profile = load_profile(&opts.profile_path, &work_dir)?;
    if let Some(bt) = opts.build_type {
        profile.build_type = bt;
    }
    Ok(profile)
}

/// Loads the profile and runs `action` against the real packaging tool.
pub async fn run(action: Action, opts: &RunOptions) -> PackOutput {
    let out = PackOutput::new(action.name(), &opts.work_dir.display().to_string());
    let profile = match load_run_profile(opts) {
        Ok(p) => p,
        Err(e) => return out.fail(&e),
    };
    let tool = Bubblewrap {
        spec: profile.tool.clone(),
        dry_run: opts.dry_run,
    };
    run_with(action, &profile, &tool, opts, out).await
}

pub async fn run_with<T: ToolRunner>(
    action: Action,
    profile: &Profile,
    tool: &T,
    opts: &RunOptions,
    mut out: PackOutput,
) -> PackOutput {
    out.app = Some(profile.summary());
    tracing::info!(
        action = action.name(),
        app = %profile.name,
        package = %profile.package_id,
        url = %profile.web_url,
        "starting"
    );
    match execute(action, profile, tool, opts, &mut out).await {
        Ok(()) => {
            tracing::info!(action = action.name(), "done");
            out
        }
        Err(e) => out.fail(&e),
    }
}

fn icon_status(icon_path: &Path) -> PrerequisiteStatus {
    PrerequisiteStatus {
        name: "icon".to_string(),
        required: false,
        found: icon_path.is_file(),
        detail: icon_path.display().to_string(),
        hint: "the packaging tool falls back to the icons listed in the web manifest".to_string(),
    }
}

fn patch_stage(profile: &Profile) -> Result<PatchOutcome, PackError> {
    tracing::info!(path = %profile.project_config_path.display(), "configuring project");
    let outcome = patch_project_config(&profile.project_config_path, &profile.config_patch())?;
    match &outcome {
        PatchOutcome::Patched { fields, .. } => {
            tracing::info!(fields = fields.len(), "project config patched");
        }
        PatchOutcome::NotInitialized { path } => {
            tracing::warn!(path = %path.display(), "project config not found, skipping patch");
        }
    }
    Ok(outcome)
}

async fn execute<T: ToolRunner>(
    action: Action,
    profile: &Profile,
    tool: &T,
    opts: &RunOptions,
    out: &mut PackOutput,
) -> Result<(), PackError> {
    if action.checks_prerequisites() && !opts.skip_prerequisites {
        out.prerequisites =
            check_prerequisites(&profile.prerequisites, &profile.tool, &opts.work_dir).await;
        out.prerequisites.push(icon_status(&profile.icon_path));
        ensure_required(&out.prerequisites)?;
    }

    match action {
        Action::Doctor => return Ok(()),
        Action::Manifest => {
            write_local_manifest(&profile.local_manifest_path, &profile.web_manifest())?;
            out.local_manifest = Some(profile.local_manifest_path.clone());
            return Ok(());
        }
        Action::Configure => {
            out.project_config = Some(patch_stage(profile)?);
            return Ok(());
        }
        Action::Init | Action::Build => {}
    }

    let plan = InitPlan {
        remote_manifest_url: profile.remote_manifest_url.clone(),
        local_manifest_path: profile.local_manifest_path.clone(),
        manifest: profile.web_manifest(),
        project_dir: profile.output_dir.clone(),
    };
    let init = resolve_manifest_and_init(tool, &plan).await?;
    out.receipts.extend(init.receipts);
    if let ManifestSource::LocalFallback { path, .. } = &init.source {
        out.local_manifest = Some(path.clone());
    }
    out.manifest_source = Some(init.source);
    out.project_config = Some(patch_stage(profile)?);

    if action == Action::Init {
        return Ok(());
    }

    let built = builder::build(tool, profile.build_type, &profile.output_dir).await?;
    out.receipts.push(built.receipt);
    out.artifacts = built.artifacts;
    Ok(())
}

use crate::api::PrerequisiteStatus;
use crate::config::PrerequisiteConfig;
use crate::errors::PackError;
use crate::runner::{ToolSpec, run_tool};
use std::path::{Path, PathBuf};

const SDK_ENV_VARS: [&str; 2] = ["ANDROID_HOME", "ANDROID_SDK_ROOT"];

/// Resolves `command` the way a shell would: explicit paths must exist, bare names go through PATH.
pub fn locate_command(command: &str) -> Option<PathBuf> {
    if command.contains('/') || command.contains('\\') {
        let p = PathBuf::from(command);
        return p.is_file().then_some(p);
    }
    which::which(command).ok()
}

/// First SDK command on PATH, else the first SDK env var pointing at a directory.
pub fn find_android_sdk(
    commands: &[String],
    env_lookup: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    for c in commands {
        if let Some(p) = locate_command(c) {
            return Some(p.display().to_string());
        }
    }
    SDK_ENV_VARS.iter().find_map(|var| {
        env_lookup(var)
            .filter(|v| !v.trim().is_empty() && Path::new(v).is_dir())
            .map(|v| format!("{var}={v}"))
    })
}

async fn check_java(cfg: &PrerequisiteConfig, work_dir: &Path) -> PrerequisiteStatus {
    let mut spec = ToolSpec::new("prereq.java", &cfg.java_command);
    spec.timeout_ms = Some(cfg.probe_timeout_ms);
    spec.max_stdout_bytes = Some(2_000);
    spec.max_stderr_bytes = Some(2_000);
    let (found, detail) = match run_tool(&spec, &["-version".to_string()], work_dir, false).await {
        Ok(r) if r.success => {
            // `java -version` reports on stderr.
            let first = r
                .stderr_tail
                .lines()
                .chain(r.stdout_tail.lines())
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or("java")
                .to_string();
            (true, first)
        }
        Ok(r) => (false, r.failure_reason()),
        Err(e) => (false, e.to_string()),
    };
    PrerequisiteStatus {
        name: "java".to_string(),
        required: true,
        found,
        detail,
        hint: "install a Java JDK 8 or newer and put `java` on PATH".to_string(),
    }
}

fn check_sdk(cfg: &PrerequisiteConfig) -> PrerequisiteStatus {
    let found = find_android_sdk(&cfg.sdk_commands, |k| std::env::var(k).ok());
    PrerequisiteStatus {
        name: "android-sdk".to_string(),
        required: false,
        found: found.is_some(),
        detail: found.unwrap_or_else(|| "not found".to_string()),
        hint: "the packaging tool will offer to download an SDK".to_string(),
    }
}

fn check_packaging_tool(tool: &ToolSpec) -> PrerequisiteStatus {
    let found = locate_command(&tool.command);
    PrerequisiteStatus {
        name: tool.command.clone(),
        required: true,
        found: found.is_some(),
        detail: found
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "not found".to_string()),
        hint: "install it with `npm i -g @bubblewrap/cli` or set [tool].command".to_string(),
    }
}

pub async fn check_prerequisites(
    cfg: &PrerequisiteConfig,
    tool: &ToolSpec,
    work_dir: &Path,
) -> Vec<PrerequisiteStatus> {
    tracing::info!("checking prerequisites");
    let entries = vec![
        check_java(cfg, work_dir).await,
        check_sdk(cfg),
        check_packaging_tool(tool),
    ];
    for e in &entries {
        if e.found {
            tracing::info!(name = %e.name, detail = %e.detail, "found");
        } else if e.required {
            tracing::error!(name = %e.name, detail = %e.detail, hint = %e.hint, "missing");
        } else {
            tracing::warn!(name = %e.name, hint = %e.hint, "not found, continuing");
        }
    }
    entries
}

/// Fails on the first missing required prerequisite; optional ones never fail.
pub fn ensure_required(entries: &[PrerequisiteStatus]) -> Result<(), PackError> {
    match entries.iter().find(|e| e.required && !e.found) {
        Some(e) => Err(PackError::PrerequisiteMissing {
            name: e.name.clone(),
            hint: e.hint.clone(),
        }),
        None => Ok(()),
    }
}

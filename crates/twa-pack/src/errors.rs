use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("required tool not found: {name} ({hint})")]
    PrerequisiteMissing { name: String, hint: String },
    #[error("project init failed with local manifest {manifest}: {reason}")]
    LocalInitFailed { manifest: String, reason: String },
    #[error("{build_type} build failed: {reason}")]
    BuildFailed { build_type: String, reason: String },
    #[error(
        "project configuration is not a valid JSON object: {path}: {message} (fix: delete the output directory and re-run init)"
    )]
    MalformedConfig { path: PathBuf, message: String },
    #[error("failed to read profile: {path}: {source}")]
    ReadProfile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse profile TOML: {path}: {message}")]
    ParseProfile { path: PathBuf, message: String },
    #[error("invalid profile field {field}: {message}")]
    InvalidProfile { field: String, message: String },
    #[error("{action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

impl PackError {
    pub fn code(&self) -> &'static str {
        match self {
            PackError::PrerequisiteMissing { .. } => "prerequisite.missing",
            PackError::LocalInitFailed { .. } => "init.local_failed",
            PackError::BuildFailed { .. } => "build.failed",
            PackError::MalformedConfig { .. } => "project_config.malformed",
            PackError::ReadProfile { .. } => "profile.read_failed",
            PackError::ParseProfile { .. } => "profile.parse_failed",
            PackError::InvalidProfile { .. } => "profile.invalid",
            PackError::Io { .. } => "io.failed",
        }
    }

    pub(crate) fn io(
        action: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        PackError::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        PackError::InvalidProfile {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

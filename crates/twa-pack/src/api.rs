use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl From<&crate::errors::PackError> for ApiError {
    fn from(e: &crate::errors::PackError) -> Self {
        ApiError {
            code: e.code().to_string(),
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BuildType {
    #[default]
    Apk,
    Aab,
}

impl BuildType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apk" => Some(Self::Apk),
            "aab" => Some(Self::Aab),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            BuildType::Apk => "apk",
            BuildType::Aab => "aab",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BuildType::Apk => "APK",
            BuildType::Aab => "AAB",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub tool_id: String,
    pub success: bool,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub duration_ms: u64,
    pub command: String,
    pub args: Vec<String>,
    pub stdout_tail: String,
    pub stderr_tail: String,
    pub stdout_bytes: usize,
    pub stderr_bytes: usize,
    pub stdout_sha256: String,
    pub stderr_sha256: String,
}

impl Receipt {
    /// Human-readable reason for a failed run: exit status plus the last stderr line, if any.
    pub fn failure_reason(&self) -> String {
        let status = if self.timed_out {
            format!("timed out after {} ms", self.duration_ms)
        } else {
            match self.exit_code {
                Some(code) => format!("exit code {code}"),
                None => "terminated by signal".to_string(),
            }
        };
        match self
            .stderr_tail
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty())
        {
            Some(line) => format!("{status}: {line}"),
            None => status,
        }
    }
}

/// Which manifest the packaging project was initialized from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ManifestSource {
    Remote {
        url: String,
    },
    LocalFallback {
        path: PathBuf,
        remote_url: String,
        remote_failure: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PatchOutcome {
    Patched { path: PathBuf, fields: Vec<String> },
    NotInitialized { path: PathBuf },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrerequisiteStatus {
    pub name: String,
    pub required: bool,
    pub found: bool,
    pub detail: String,
    pub hint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSummary {
    pub name: String,
    pub package_id: String,
    pub web_url: String,
    pub build_type: BuildType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackOutput {
    pub ok: bool,
    pub error: Option<ApiError>,
    pub command: String,
    pub started_at: String,
    pub work_dir: String,
    pub app: Option<AppSummary>,
    #[serde(default)]
    pub prerequisites: Vec<PrerequisiteStatus>,
    pub manifest_source: Option<ManifestSource>,
    pub local_manifest: Option<PathBuf>,
    pub project_config: Option<PatchOutcome>,
    #[serde(default)]
    pub receipts: Vec<Receipt>,
    #[serde(default)]
    pub artifacts: Vec<PathBuf>,
}

impl PackOutput {
    pub fn new(command: &str, work_dir: &str) -> Self {
        PackOutput {
            ok: true,
            error: None,
            command: command.to_string(),
            started_at: chrono::Utc::now().to_rfc3339(),
            work_dir: work_dir.to_string(),
            app: None,
            prerequisites: vec![],
            manifest_source: None,
            local_manifest: None,
            project_config: None,
            receipts: vec![],
            artifacts: vec![],
        }
    }

    pub fn fail(mut self, err: &crate::errors::PackError) -> Self {
        self.ok = false;
        self.error = Some(ApiError::from(err));
        self
    }
}

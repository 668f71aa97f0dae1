use crate::api::{AppSummary, BuildType};
use crate::errors::PackError;
use crate::manifest::{DisplayMode, ManifestIcon, Orientation, WebAppManifest};
use crate::project_config::{ProjectConfigPatch, SigningKey};
use crate::runner::{DEFAULT_TOOL_TIMEOUT_MS, ToolSpec};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_PROFILE_PATH: &str = "twa-pack.toml";

/// On-disk profile (`twa-pack.toml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileFile {
    pub app: AppSection,
    #[serde(default)]
    pub manifest: ManifestSection,
    #[serde(default)]
    pub project: ProjectSection,
    #[serde(default)]
    pub signing: SigningSection,
    #[serde(default)]
    pub tool: ToolSection,
    #[serde(default)]
    pub prerequisites: PrerequisiteConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppSection {
    pub name: String,
    pub short_name: Option<String>,
    pub launcher_name: Option<String>,
    pub package_id: String,
    pub web_url: String,
    pub start_url: Option<String>,
    pub host: Option<String>,
    #[serde(default = "default_icon_path")]
    pub icon_path: String,
    pub theme_color: String,
    pub background_color: String,
    #[serde(default)]
    pub display: DisplayMode,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default = "default_true")]
    pub enable_notifications: bool,
    #[serde(default = "default_icons")]
    pub icons: Vec<ManifestIcon>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestSection {
    pub remote_url: Option<String>,
    #[serde(default = "default_local_manifest")]
    pub local_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_config_file")]
    pub config_file: String,
    #[serde(default)]
    pub build_type: BuildType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SigningSection {
    #[serde(default = "default_keystore")]
    pub path: String,
    #[serde(default = "default_key_alias")]
    pub alias: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolSection {
    #[serde(default = "default_tool_command")]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_tool_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_true")]
    pub passthrough_output: bool,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrerequisiteConfig {
    #[serde(default = "default_java_command")]
    pub java_command: String,
    #[serde(default = "default_sdk_commands")]
    pub sdk_commands: Vec<String>,
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,
}

impl Default for ManifestSection {
    fn default() -> Self {
        Self {
            remote_url: None,
            local_path: default_local_manifest(),
        }
    }
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            config_file: default_config_file(),
            build_type: BuildType::Apk,
        }
    }
}

impl Default for SigningSection {
    fn default() -> Self {
        Self {
            path: default_keystore(),
            alias: default_key_alias(),
        }
    }
}

impl Default for ToolSection {
    fn default() -> Self {
        Self {
            command: default_tool_command(),
            args: vec![],
            timeout_ms: default_tool_timeout(),
            passthrough_output: true,
            env: BTreeMap::new(),
        }
    }
}

impl Default for PrerequisiteConfig {
    fn default() -> Self {
        Self {
            java_command: default_java_command(),
            sdk_commands: default_sdk_commands(),
            probe_timeout_ms: default_probe_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_icon_path() -> String {
    "assets/icon.png".to_string()
}
fn default_icons() -> Vec<ManifestIcon> {
    vec![
        ManifestIcon::png("icon-192.png", "192x192"),
        ManifestIcon::png("icon-512.png", "512x512"),
    ]
}
fn default_local_manifest() -> String {
    "assets/manifest.json".to_string()
}
fn default_output_dir() -> String {
    "twa".to_string()
}
fn default_config_file() -> String {
    "twa-manifest.json".to_string()
}
fn default_keystore() -> String {
    "./android.keystore".to_string()
}
fn default_key_alias() -> String {
    "android".to_string()
}
fn default_tool_command() -> String {
    "bubblewrap".to_string()
}
fn default_tool_timeout() -> u64 {
    DEFAULT_TOOL_TIMEOUT_MS
}
fn default_java_command() -> String {
    "java".to_string()
}
fn default_sdk_commands() -> Vec<String> {
    vec!["android".to_string(), "sdkmanager".to_string()]
}
fn default_probe_timeout() -> u64 {
    30_000
}

/// Validated profile with defaults applied and paths resolved against the work dir.
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: String,
    pub short_name: String,
    pub launcher_name: String,
    pub package_id: String,
    pub web_url: String,
    pub start_url: String,
    pub host: String,
    pub icon_path: PathBuf,
    pub theme_color: String,
    pub background_color: String,
    pub display: DisplayMode,
    pub orientation: Orientation,
    pub enable_notifications: bool,
    pub icons: Vec<ManifestIcon>,
    pub remote_manifest_url: String,
    pub local_manifest_path: PathBuf,
    pub output_dir: PathBuf,
    pub project_config_path: PathBuf,
    pub build_type: BuildType,
    pub signing_key: SigningKey,
    pub tool: ToolSpec,
    pub prerequisites: PrerequisiteConfig,
}

fn package_id_regex() -> Regex {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\.[A-Za-z][A-Za-z0-9_]*)+$").expect("valid package regex")
}

fn color_regex() -> Regex {
    Regex::new(r"^#([0-9A-Fa-f]{3}|[0-9A-Fa-f]{4}|[0-9A-Fa-f]{6}|[0-9A-Fa-f]{8})$")
        .expect("valid color regex")
}

fn validate_http_url(field: &str, url: &str) -> Result<(), PackError> {
    if host_of(url).is_none() {
        return Err(PackError::invalid(
            field,
            format!("expected an http(s) URL with a host, got {url:?}"),
        ));
    }
    Ok(())
}

fn validate_color(field: &str, color: &str) -> Result<(), PackError> {
    if !color_regex().is_match(color) {
        return Err(PackError::invalid(
            field,
            format!("expected #rgb, #rgba, #rrggbb or #rrggbbaa, got {color:?}"),
        ));
    }
    Ok(())
}

/// Host part of an http(s) URL, without port, path, query or userinfo.
pub fn host_of(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let authority = rest.split(['/', '?', '#']).next()?;
    let host_port = authority.rsplit('@').next()?;
    let host = match host_port.strip_prefix('[') {
        Some(v6) => v6.split(']').next()?,
        None => host_port.split(':').next()?,
    };
    if host.is_empty() {
        None
    } else {
        Some(host.to_ascii_lowercase())
    }
}

/// Resolves `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for c in path.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => {
                if out.file_name().is_some() {
                    out.pop();
                } else if !out.has_root() {
                    out.push(c);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// The output dir is wiped on every init, so it must not hold the work dir or any profile input.
fn validate_output_dir(
    work_dir: &Path,
    output_dir: &Path,
    inputs: &[(&str, &Path)],
) -> Result<(), PackError> {
    let out = normalize(output_dir);
    if normalize(work_dir).starts_with(&out) {
        return Err(PackError::invalid(
            "project.output_dir",
            format!(
                "{} is the work dir or one of its parents; it is deleted on every init",
                output_dir.display()
            ),
        ));
    }
    for (field, path) in inputs {
        if normalize(path).starts_with(&out) {
            return Err(PackError::invalid(
                "project.output_dir",
                format!(
                    "{field} ({}) lies inside {}, which is deleted on every init",
                    path.display(),
                    output_dir.display()
                ),
            ));
        }
    }
    Ok(())
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl Profile {
    pub fn from_file(file: ProfileFile, work_dir: &Path) -> Result<Self, PackError> {
        let app = file.app;
        let name = app.name.trim().to_string();
        if name.is_empty() {
            return Err(PackError::invalid("app.name", "must be non-empty"));
        }
        if !package_id_regex().is_match(&app.package_id) {
            return Err(PackError::invalid(
                "app.package_id",
                format!(
                    "expected a dotted Java package name such as com.example.app, got {:?}",
                    app.package_id
                ),
            ));
        }
        validate_http_url("app.web_url", &app.web_url)?;
        let start_url = non_empty(app.start_url).unwrap_or_else(|| app.web_url.clone());
        validate_http_url("app.start_url", &start_url)?;
        validate_color("app.theme_color", &app.theme_color)?;
        validate_color("app.background_color", &app.background_color)?;

        let host = match non_empty(app.host) {
            Some(h) => h,
            None => host_of(&app.web_url).unwrap_or_default(),
        };
        let remote_manifest_url = non_empty(file.manifest.remote_url).unwrap_or_else(|| {
            format!("{}/manifest.json", app.web_url.trim_end_matches('/'))
        });
        validate_http_url("manifest.remote_url", &remote_manifest_url)?;

        if file.tool.command.trim().is_empty() {
            return Err(PackError::invalid("tool.command", "must be non-empty"));
        }
        if file.prerequisites.java_command.trim().is_empty() {
            return Err(PackError::invalid(
                "prerequisites.java_command",
                "must be non-empty",
            ));
        }

        let output_dir = work_dir.join(&file.project.output_dir);
        let project_config_path = output_dir.join(&file.project.config_file);
        let icon_path = work_dir.join(app.icon_path);
        let local_manifest_path = work_dir.join(file.manifest.local_path);
        validate_output_dir(
            work_dir,
            &output_dir,
            &[
                ("manifest.local_path", local_manifest_path.as_path()),
                ("app.icon_path", icon_path.as_path()),
            ],
        )?;

        let tool = ToolSpec {
            id: "bubblewrap".to_string(),
            command: file.tool.command,
            args: file.tool.args,
            timeout_ms: Some(file.tool.timeout_ms),
            max_stdout_bytes: None,
            max_stderr_bytes: None,
            passthrough: file.tool.passthrough_output,
            env: file.tool.env,
        };

        Ok(Profile {
            short_name: non_empty(app.short_name).unwrap_or_else(|| name.clone()),
            launcher_name: non_empty(app.launcher_name).unwrap_or_else(|| name.clone()),
            name,
            package_id: app.package_id,
            web_url: app.web_url,
            start_url,
            host,
            icon_path,
            theme_color: app.theme_color,
            background_color: app.background_color,
            display: app.display,
            orientation: app.orientation,
            enable_notifications: app.enable_notifications,
            icons: app.icons,
            remote_manifest_url,
            local_manifest_path,
            output_dir,
            project_config_path,
            build_type: file.project.build_type,
            signing_key: SigningKey {
                path: file.signing.path,
                alias: file.signing.alias,
            },
            tool,
            prerequisites: file.prerequisites,
        })
    }

    /// Manifest written locally when the remote manifest can't be used.
    pub fn web_manifest(&self) -> WebAppManifest {
        WebAppManifest {
            name: self.name.clone(),
            short_name: self.short_name.clone(),
            start_url: self.start_url.clone(),
            display: self.display,
            orientation: self.orientation,
            theme_color: self.theme_color.clone(),
            background_color: self.background_color.clone(),
            icons: self.icons.clone(),
        }
    }

    pub fn config_patch(&self) -> ProjectConfigPatch {
        ProjectConfigPatch {
            package_id: self.package_id.clone(),
            name: self.name.clone(),
            launcher_name: self.launcher_name.clone(),
            host: self.host.clone(),
            start_url: self.start_url.clone(),
            theme_color: self.theme_color.clone(),
            background_color: self.background_color.clone(),
            enable_notifications: self.enable_notifications,
            signing_key: self.signing_key.clone(),
        }
    }

    pub fn summary(&self) -> AppSummary {
        AppSummary {
            name: self.name.clone(),
            package_id: self.package_id.clone(),
            web_url: self.web_url.clone(),
            build_type: self.build_type,
        }
    }
}

pub fn parse_profile(raw: &str, path: &Path, work_dir: &Path) -> Result<Profile, PackError> {
    let file: ProfileFile = toml::from_str(raw).map_err(|e| PackError::ParseProfile {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Profile::from_file(file, work_dir)
}

pub fn load_profile(path: &Path, work_dir: &Path) -> Result<Profile, PackError> {
    let raw = std::fs::read_to_string(path).map_err(|e| PackError::ReadProfile {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_profile(&raw, path, work_dir)
}

#[cfg(test)]
mod tests;

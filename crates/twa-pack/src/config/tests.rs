use super::*;

const MINIMAL: &str = r##"
[app]
name = "Brimind Chat"
package_id = "ai.brimind.pro"
web_url = "https://ai.brimind.pro"
theme_color = "#1976d2"
background_color = "#ffffff"
"##;

fn parse(raw: &str) -> Result<Profile, PackError> {
    parse_profile(raw, Path::new("twa-pack.toml"), Path::new("/work"))
}

#[test]
fn minimal_profile_fills_defaults() {
    let p = parse(MINIMAL).expect("profile");
    assert_eq!(p.short_name, "Brimind Chat");
    assert_eq!(p.launcher_name, "Brimind Chat");
    assert_eq!(p.start_url, "https://ai.brimind.pro");
    assert_eq!(p.host, "ai.brimind.pro");
    assert_eq!(p.remote_manifest_url, "https://ai.brimind.pro/manifest.json");
    assert_eq!(p.local_manifest_path, PathBuf::from("/work/assets/manifest.json"));
    assert_eq!(p.output_dir, PathBuf::from("/work/twa"));
    assert_eq!(p.project_config_path, PathBuf::from("/work/twa/twa-manifest.json"));
    assert_eq!(p.build_type, BuildType::Apk);
    assert_eq!(p.display, DisplayMode::Standalone);
    assert_eq!(p.orientation, Orientation::Portrait);
    assert!(p.enable_notifications);
    assert_eq!(p.icons.len(), 2);
    assert_eq!(p.signing_key.alias, "android");
    assert_eq!(p.tool.command, "bubblewrap");
    assert_eq!(p.tool.timeout_ms, Some(DEFAULT_TOOL_TIMEOUT_MS));
    assert!(p.tool.passthrough);
    assert_eq!(p.prerequisites.java_command, "java");
    assert_eq!(p.prerequisites.sdk_commands, vec!["android", "sdkmanager"]);
}

#[test]
fn full_profile_deserialize() {
    let raw = r##"
[app]
name = "Demo"
short_name = "D"
launcher_name = "Demo App"
package_id = "com.example.demo"
web_url = "https://demo.example.com/app/"
start_url = "https://demo.example.com/app/?source=twa"
host = "demo.example.com"
theme_color = "#000"
background_color = "#FFFFFFFF"
display = "minimal-ui"
orientation = "landscape"
enable_notifications = false
icons = [{ src = "a.png", sizes = "48x48", type = "image/png" }]

[manifest]
remote_url = "https://cdn.example.com/manifest.webmanifest"
local_path = "build/manifest.json"

[project]
output_dir = "out/twa"
config_file = "twa-manifest.json"
build_type = "aab"

[signing]
path = "/keys/release.keystore"
alias = "release"

[tool]
command = "npx"
args = ["@bubblewrap/cli"]
timeout_ms = 60000
passthrough_output = false
env = { BUBBLEWRAP_LOG = "debug" }

[prerequisites]
java_command = "/opt/jdk/bin/java"
sdk_commands = ["sdkmanager"]
probe_timeout_ms = 5000
"##;
    let p = parse(raw).expect("profile");
    assert_eq!(p.short_name, "D");
    assert_eq!(p.launcher_name, "Demo App");
    assert_eq!(p.display, DisplayMode::MinimalUi);
    assert_eq!(p.orientation, Orientation::Landscape);
    assert!(!p.enable_notifications);
    assert_eq!(p.icons, vec![ManifestIcon::png("a.png", "48x48")]);
    assert_eq!(p.remote_manifest_url, "https://cdn.example.com/manifest.webmanifest");
    assert_eq!(p.project_config_path, PathBuf::from("/work/out/twa/twa-manifest.json"));
    assert_eq!(p.build_type, BuildType::Aab);
    assert_eq!(p.signing_key.path, "/keys/release.keystore");
    assert_eq!(p.tool.args, vec!["@bubblewrap/cli"]);
    assert!(!p.tool.passthrough);
    assert_eq!(p.tool.env.get("BUBBLEWRAP_LOG").map(String::as_str), Some("debug"));
    assert_eq!(p.prerequisites.probe_timeout_ms, 5000);
}

#[test]
fn derived_values_flow_into_manifest_and_patch() {
    let p = parse(MINIMAL).expect("profile");
    let m = p.web_manifest();
    assert_eq!(m.name, "Brimind Chat");
    assert_eq!(m.start_url, "https://ai.brimind.pro");
    assert_eq!(m.theme_color, "#1976d2");

    let patch = p.config_patch();
    assert_eq!(patch.package_id, "ai.brimind.pro");
    assert_eq!(patch.host, "ai.brimind.pro");
    assert_eq!(patch.signing_key.path, "./android.keystore");
}

#[test]
fn unknown_fields_are_rejected() {
    let raw = format!("{MINIMAL}\n[tool]\ncommandd = \"bubblewrap\"\n");
    let err = parse(&raw).expect_err("unknown field");
    assert_eq!(err.code(), "profile.parse_failed");
}

#[test]
fn invalid_values_are_rejected() {
    let cases = [
        ("package_id = \"ai.brimind.pro\"", "package_id = \"brimind\"", "app.package_id"),
        ("package_id = \"ai.brimind.pro\"", "package_id = \"ai.9lives\"", "app.package_id"),
        ("theme_color = \"#1976d2\"", "theme_color = \"blue\"", "app.theme_color"),
        ("background_color = \"#ffffff\"", "background_color = \"#fffff\"", "app.background_color"),
        (
            "web_url = \"https://ai.brimind.pro\"",
            "web_url = \"ftp://ai.brimind.pro\"",
            "app.web_url",
        ),
        ("name = \"Brimind Chat\"", "name = \"  \"", "app.name"),
    ];
    for (from, to, field) in cases {
        let raw = MINIMAL.replace(from, to);
        match parse(&raw) {
            Err(PackError::InvalidProfile { field: f, .. }) => assert_eq!(f, field, "case {to}"),
            other => panic!("expected InvalidProfile for {to}, got {other:?}"),
        }
    }
}

#[test]
fn output_dir_must_not_cover_work_dir_or_inputs() {
    let cases = [
        "[project]\noutput_dir = \".\"",
        "[project]\noutput_dir = \"\"",
        "[project]\noutput_dir = \"..\"",
        "[project]\noutput_dir = \"/\"",
        "[project]\noutput_dir = \"twa/..\"",
        "[manifest]\nlocal_path = \"twa/manifest.json\"",
        "[project]\noutput_dir = \"assets\"",
    ];
    for extra in cases {
        let raw = format!("{MINIMAL}\n{extra}\n");
        match parse(&raw) {
            Err(PackError::InvalidProfile { field, .. }) => {
                assert_eq!(field, "project.output_dir", "case {extra}")
            }
            other => panic!("expected InvalidProfile for {extra}, got {other:?}"),
        }
    }

    let icon_inside = MINIMAL.replace(
        "name = \"Brimind Chat\"",
        "name = \"Brimind Chat\"\nicon_path = \"twa/icon.png\"",
    );
    assert_eq!(
        parse(&icon_inside).expect_err("icon inside output").code(),
        "profile.invalid"
    );

    let sibling = format!("{MINIMAL}\n[project]\noutput_dir = \"build/../twa-out\"\n");
    let p = parse(&sibling).expect("sibling output dir");
    assert_eq!(p.output_dir, PathBuf::from("/work/build/../twa-out"));
}

#[test]
fn normalize_is_lexical() {
    assert_eq!(normalize(Path::new("/work/./twa/..")), PathBuf::from("/work"));
    assert_eq!(normalize(Path::new("/work/../../..")), PathBuf::from("/"));
    assert_eq!(normalize(Path::new("../a/./b")), PathBuf::from("../a/b"));
}

#[test]
fn host_of_strips_port_path_and_userinfo() {
    assert_eq!(host_of("https://Example.com"), Some("example.com".to_string()));
    assert_eq!(host_of("https://example.com:8443/a?b#c"), Some("example.com".to_string()));
    assert_eq!(host_of("http://user:pw@example.com/"), Some("example.com".to_string()));
    assert_eq!(host_of("https://[::1]:8080/"), Some("::1".to_string()));
    assert_eq!(host_of("https:///path"), None);
    assert_eq!(host_of("example.com"), None);
}

#[test]
fn load_profile_reports_missing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("twa-pack.toml");
    let err = load_profile(&path, dir.path()).expect_err("missing");
    assert_eq!(err.code(), "profile.read_failed");

    std::fs::write(&path, MINIMAL).expect("write");
    let p = load_profile(&path, dir.path()).expect("profile");
    assert_eq!(p.output_dir, dir.path().join("twa"));
}

#[test]
fn example_profile_parses() {
    let p = parse(include_str!("../../twa-pack.example.toml")).expect("example profile");
    assert_eq!(p.package_id, "ai.brimind.pro");
    assert_eq!(p.host, "ai.btimind.pro");
    assert_eq!(p.output_dir, PathBuf::from("/work/brimind-twa"));
}

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use twa_pack::api::Receipt;
use twa_pack::runner::ToolRunner;

pub const REMOTE_URL: &str = "https://x/manifest.json";

/// Stands in for the packaging tool: records every call and writes the files the real tool would.
pub struct FakeBubblewrap {
    pub remote_ok: bool,
    pub local_ok: bool,
    pub build_ok: bool,
    pub generated_config: String,
    pub calls: Mutex<Vec<(Vec<String>, PathBuf)>>,
}

impl FakeBubblewrap {
    pub fn new(remote_ok: bool, local_ok: bool) -> Self {
        FakeBubblewrap {
            remote_ok,
            local_ok,
            build_ok: true,
            generated_config: concat!(
                r#"{"packageId":"com.generated","appVersion":"3","#,
                r#""host":"generated.example","name":"Generated"}"#
            )
            .to_string(),
            calls: Mutex::new(vec![]),
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .map(|(args, _)| args.clone())
            .collect()
    }
}

pub fn receipt(args: &[String], success: bool) -> Receipt {
    Receipt {
        tool_id: format!("fake.{}", args.first().map(String::as_str).unwrap_or("")),
        success,
        exit_code: Some(if success { 0 } else { 1 }),
        timed_out: false,
        duration_ms: 1,
        command: "bubblewrap".to_string(),
        args: args.to_vec(),
        stdout_tail: String::new(),
        stderr_tail: if success {
            String::new()
        } else {
            "cli ERROR Failed to download manifest\n".to_string()
        },
        stdout_bytes: 0,
        stderr_bytes: 0,
        stdout_sha256: String::new(),
        stderr_sha256: String::new(),
    }
}

impl ToolRunner for FakeBubblewrap {
    async fn run(&self, args: &[String], cwd: &Path) -> Result<Receipt, std::io::Error> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((args.to_vec(), cwd.to_path_buf()));
        let ok = match args.first().map(String::as_str) {
            Some("init") => {
                let ok = match args.get(2).map(String::as_str) {
                    Some(REMOTE_URL) => self.remote_ok,
                    // The real tool reads the manifest file it is given.
                    Some(local) => self.local_ok && Path::new(local).is_file(),
                    None => false,
                };
                if ok {
                    std::fs::write(cwd.join("twa-manifest.json"), &self.generated_config)?;
                } else {
                    std::fs::write(cwd.join("partial.gradle"), "half-written")?;
                }
                ok
            }
            Some("build") => {
                if self.build_ok {
                    std::fs::write(cwd.join("app-release-signed.apk"), b"apk")?;
                    std::fs::write(cwd.join("app-release-bundle.aab"), b"aab")?;
                }
                self.build_ok
            }
            _ => false,
        };
        Ok(receipt(args, ok))
    }
}

pub const PROFILE: &str = r##"
[app]
name = "X"
short_name = "X"
package_id = "ai.example.x"
web_url = "https://x/"
start_url = "https://x/"
host = "x.example"
theme_color = "#111"
background_color = "#fff"
display = "standalone"
orientation = "portrait"
icons = []

[manifest]
remote_url = "https://x/manifest.json"
local_path = "assets/manifest.json"

[project]
output_dir = "twa"
"##;

pub fn write_profile(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("twa-pack.toml");
    std::fs::write(&path, body).expect("write profile");
    path
}

use std::path::PathBuf;
use twa_pack::api::BuildType;
use twa_pack::app::RunOptions;
use twa_pack::config::DEFAULT_PROFILE_PATH;

const CONFIG_ENV: &str = "TWA_PACK_CONFIG";
const WORK_DIR_ENV: &str = "TWA_PACK_WORK_DIR";

pub(crate) fn print_help() {
    println!(
        "Usage:\n  twa-pack help\n  twa-pack version\n  twa-pack build [--build-type apk|aab] [--config <path>] [--work-dir <path>] [--dry-run] [--skip-prerequisites]\n  twa-pack init [--config <path>] [--work-dir <path>] [--dry-run] [--skip-prerequisites]\n  twa-pack manifest [--config <path>] [--work-dir <path>]\n  twa-pack configure [--config <path>] [--work-dir <path>]\n  twa-pack doctor [--config <path>] [--work-dir <path>]\n\nCommands:\n  build      check prerequisites, init the TWA project (remote manifest, local fallback), patch twa-manifest.json, build\n  init       same as build without the final build step\n  manifest   write the local web manifest from the profile\n  configure  patch an existing twa-manifest.json from the profile\n  doctor     report Java / Android SDK / packaging tool availability\n\nNotes:\n  - The JSON report goes to stdout, logs go to stderr (RUST_LOG=debug for more).\n  - --config is resolved against --work-dir.\n  - --dry-run does not spawn the packaging tool; the output dir is still reset.\n  - Defaults via env:\n      {CONFIG_ENV}=<path>      (default {DEFAULT_PROFILE_PATH})\n      {WORK_DIR_ENV}=<path>    (default .)\n\nExamples:\n  twa-pack doctor\n  twa-pack build --build-type aab\n  twa-pack init --work-dir ./packaging --dry-run\n"
    );
}

fn env_or(name: &str, value: Option<String>) -> Option<String> {
    value
        .or_else(|| std::env::var(name).ok())
        .filter(|s| !s.trim().is_empty())
}

fn take_value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a String, String> {
    let v = args
        .get(i + 1)
        .ok_or_else(|| format!("{flag} requires a value"))?;
    if v.starts_with("--") {
        return Err(format!("{flag} requires a value"));
    }
    Ok(v)
}

pub(crate) fn parse_run_cli(args: &[String]) -> Result<RunOptions, String> {
    let mut config: Option<String> = None;
    let mut work_dir: Option<String> = None;
    let mut build_type: Option<BuildType> = None;
    let mut dry_run = false;
    let mut skip_prerequisites = false;

    let mut i = 0usize;
    while i < args.len() {
        let a = &args[i];
        match a.as_str() {
            "--config" => {
                config = Some(take_value(args, i, "--config")?.clone());
                i += 2;
            }
            "--work-dir" => {
                work_dir = Some(take_value(args, i, "--work-dir")?.clone());
                i += 2;
            }
            "--build-type" => {
                let v = take_value(args, i, "--build-type")?;
                build_type = Some(
                    BuildType::parse(v).ok_or_else(|| format!("unknown build type: {v}"))?,
                );
                i += 2;
            }
            "--dry-run" => {
                dry_run = true;
                i += 1;
            }
            "--skip-prerequisites" => {
                skip_prerequisites = true;
                i += 1;
            }
            _ => return Err(format!("unknown argument: {a}")),
        }
    }

    let work_dir = PathBuf::from(env_or(WORK_DIR_ENV, work_dir).unwrap_or_else(|| ".".to_string()));
    let config = env_or(CONFIG_ENV, config).unwrap_or_else(|| DEFAULT_PROFILE_PATH.to_string());
    Ok(RunOptions {
        profile_path: work_dir.join(config),
        work_dir,
        build_type,
        dry_run,
        skip_prerequisites,
    })
}

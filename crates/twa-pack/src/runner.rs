use crate::api::Receipt;
use crate::hash::sha256_hex;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;
use std::time::Instant;
use tokio::io::AsyncReadExt;

pub const DEFAULT_TOOL_TIMEOUT_MS: u64 = 1_800_000;
const DEFAULT_TAIL_BYTES: usize = 20_000;

/// How an external command is launched.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub id: String,
    pub command: String,
    /// Prefix arguments placed before the per-invocation ones.
    pub args: Vec<String>,
    pub timeout_ms: Option<u64>,
    pub max_stdout_bytes: Option<usize>,
    pub max_stderr_bytes: Option<usize>,
    /// Share the terminal with the child instead of capturing its output.
    pub passthrough: bool,
    pub env: BTreeMap<String, String>,
}

impl ToolSpec {
    pub fn new(id: &str, command: &str) -> Self {
        ToolSpec {
            id: id.to_string(),
            command: command.to_string(),
            args: vec![],
            timeout_ms: None,
            max_stdout_bytes: None,
            max_stderr_bytes: None,
            passthrough: false,
            env: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunnerLimits {
    pub timeout_ms: u64,
    pub max_stdout_bytes: usize,
    pub max_stderr_bytes: usize,
}

#[derive(Debug, Default)]
struct TailBuffer {
    max: usize,
    buf: Vec<u8>,
}

impl TailBuffer {
    fn new(max: usize) -> Self {
        Self { max, buf: vec![] }
    }

    fn push(&mut self, chunk: &[u8]) {
        if self.max == 0 {
            return;
        }
        if chunk.len() >= self.max {
            self.buf.clear();
            self.buf
                .extend_from_slice(&chunk[chunk.len().saturating_sub(self.max)..]);
            return;
        }
        self.buf.extend_from_slice(chunk);
        if self.buf.len() > self.max {
            let excess = self.buf.len() - self.max;
            self.buf.drain(0..excess);
        }
    }

    fn into_string(self) -> String {
        String::from_utf8_lossy(&self.buf).into_owned()
    }
}

#[derive(Debug)]
struct StreamCapture {
    tail: String,
    total_bytes: usize,
    sha256: String,
}

impl StreamCapture {
    fn empty(tail: String) -> Self {
        StreamCapture {
            tail,
            total_bytes: 0,
            sha256: sha256_hex(&[]),
        }
    }
}

async fn read_stream<R: tokio::io::AsyncRead + Unpin>(
    mut r: R,
    max_tail: usize,
) -> std::io::Result<StreamCapture> {
    let mut tail = TailBuffer::new(max_tail);
    let mut hasher = Sha256::new();
    let mut total_bytes = 0usize;
    let mut buf = vec![0u8; 8 * 1024];
    loop {
        let n = r.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        let chunk = &buf[..n];
        tail.push(chunk);
        hasher.update(chunk);
        total_bytes += n;
    }

    Ok(StreamCapture {
        tail: tail.into_string(),
        total_bytes,
        sha256: format!("{:x}", hasher.finalize()),
    })
}

type CaptureTask = tokio::task::JoinHandle<std::io::Result<StreamCapture>>;

async fn finalize_capture_task(
    task: Option<CaptureTask>,
    stream_name: &str,
    timed_out: bool,
) -> std::io::Result<StreamCapture> {
    let Some(mut task) = task else {
        return Ok(StreamCapture::empty(String::new()));
    };
    let joined = if timed_out {
        match tokio::time::timeout(std::time::Duration::from_millis(250), &mut task).await {
            Ok(joined) => Some(joined),
            Err(_) => {
                task.abort();
                None
            }
        }
    } else {
        Some(task.await)
    };

    match joined {
        Some(Ok(Ok(capture))) => Ok(capture),
        Some(Ok(Err(err))) => Err(err),
        Some(Err(_join_err)) => Ok(StreamCapture::empty(format!("<{stream_name} join error>"))),
        None => Ok(StreamCapture::empty(format!(
            "<{stream_name} capture aborted after timeout>"
        ))),
    }
}

fn dry_run_receipt(tool: &ToolSpec, argv: Vec<String>) -> Receipt {
    let stdout = b"[dry_run]";
    Receipt {
        tool_id: tool.id.clone(),
        success: true,
        exit_code: Some(0),
        timed_out: false,
        duration_ms: 0,
        command: tool.command.clone(),
        args: argv,
        stdout_tail: "[dry_run]".to_string(),
        stderr_tail: "".to_string(),
        stdout_bytes: stdout.len(),
        stderr_bytes: 0,
        stdout_sha256: sha256_hex(stdout),
        stderr_sha256: sha256_hex(b""),
    }
}

/// Runs `tool` with `extra_args` in `cwd`, killing it once `timeout_ms` elapses.
pub async fn run_tool(
    tool: &ToolSpec,
    extra_args: &[String],
    cwd: &Path,
    dry_run: bool,
) -> Result<Receipt, std::io::Error> {
    let limits = RunnerLimits {
        timeout_ms: tool.timeout_ms.unwrap_or(DEFAULT_TOOL_TIMEOUT_MS).max(1),
        max_stdout_bytes: tool.max_stdout_bytes.unwrap_or(DEFAULT_TAIL_BYTES),
        max_stderr_bytes: tool.max_stderr_bytes.unwrap_or(DEFAULT_TAIL_BYTES),
    };

    let mut argv: Vec<String> = vec![];
    argv.extend(tool.args.clone());
    argv.extend(extra_args.iter().cloned());

    if dry_run {
        tracing::info!(
            tool = %tool.id,
            command = %tool.command,
            args = ?argv,
            "dry run, not spawning"
        );
        return Ok(dry_run_receipt(tool, argv));
    }

    tracing::debug!(
        tool = %tool.id,
        command = %tool.command,
        args = ?argv,
        cwd = %cwd.display(),
        "spawning"
    );
    let start = Instant::now();
    let mut cmd = tokio::process::Command::new(&tool.command);
    cmd.args(&argv);
    cmd.current_dir(cwd);
    if !tool.env.is_empty() {
        cmd.envs(tool.env.clone());
    }
    if tool.passthrough {
        // stdout is reserved for the JSON report.
        cmd.stdout(std::io::stderr());
        cmd.stderr(std::process::Stdio::inherit());
    } else {
        cmd.stdin(std::process::Stdio::null());
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());
    }
    cmd.kill_on_drop(true);

    let mut child = cmd.spawn()?;
    let stdout_task = child
        .stdout
        .take()
        .map(|s| tokio::spawn(read_stream(s, limits.max_stdout_bytes)));
    let stderr_task = child
        .stderr
        .take()
        .map(|s| tokio::spawn(read_stream(s, limits.max_stderr_bytes)));

    let timeout = std::time::Duration::from_millis(limits.timeout_ms);
    let mut timed_out = false;
    let status = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(res) => res?,
        Err(_) => {
            timed_out = true;
            tracing::warn!(tool = %tool.id, timeout_ms = limits.timeout_ms, "timed out, killing");
            let _ = child.kill().await;
            child.wait().await?
        }
    };

    let stdout = finalize_capture_task(stdout_task, "stdout", timed_out).await?;
    let stderr = finalize_capture_task(stderr_task, "stderr", timed_out).await?;

    Ok(Receipt {
        tool_id: tool.id.clone(),
        success: status.success() && !timed_out,
        exit_code: status.code(),
        timed_out,
        duration_ms: start.elapsed().as_millis() as u64,
        command: tool.command.clone(),
        args: argv,
        stdout_tail: stdout.tail,
        stderr_tail: stderr.tail,
        stdout_bytes: stdout.total_bytes,
        stderr_bytes: stderr.total_bytes,
        stdout_sha256: stdout.sha256,
        stderr_sha256: stderr.sha256,
    })
}

/// The packaging tool as seen by the workflow: run a subcommand in a project dir.
pub trait ToolRunner {
    fn run(
        &self,
        args: &[String],
        cwd: &Path,
    ) -> impl Future<Output = Result<Receipt, std::io::Error>>;
}

/// Bubblewrap CLI (`bubblewrap init`, `bubblewrap build`).
#[derive(Debug, Clone)]
pub struct Bubblewrap {
    pub spec: ToolSpec,
    pub dry_run: bool,
}

impl ToolRunner for Bubblewrap {
    async fn run(&self, args: &[String], cwd: &Path) -> Result<Receipt, std::io::Error> {
        let mut spec = self.spec.clone();
        if let Some(sub) = args.first() {
            spec.id = format!("{}.{sub}", self.spec.id);
        }
        run_tool(&spec, args, cwd, self.dry_run).await
    }
}

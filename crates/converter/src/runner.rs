use std::ffi::OsString;
use std::future::Future;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use humansize::{format_size, DECIMAL};
use log::{debug, error, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::time::timeout;
use crate::codec::Codec;
use crate::config::ConvertConfig;
use crate::error::{ConvertError, Result};
use crate::job::Job;

/// Stderr lines kept for the failure message
const STDERR_TAIL_LINES: usize = 8;

/// What a single conversion reports while it runs.
/// `Started` always comes first, then exactly one of `Finished` or `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionEvent {
    Started { source_path: PathBuf, command: String },
    Finished { source_path: PathBuf, output_path: PathBuf },
    Failed { source_path: PathBuf, message: String },
}

/// Optional observer for conversion events
pub type EventHook = Arc<dyn Fn(&ConversionEvent) + Send + Sync>;

/// A conversion that finished successfully
#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    pub job: Job,
    pub elapsed: Duration,
    /// Size of the written file, if it could be read back
    pub output_bytes: Option<u64>,
}

/// Runs one job to completion
pub trait ConversionRunner: Send + Sync {
    fn run(&self, job: &Job) -> impl Future<Output = Result<ConversionOutcome>> + Send;
}

/// Runs jobs through an ffmpeg process each
pub struct FfmpegRunner {
    pub ffmpeg_bin: PathBuf,
    pub codec: Codec,
    pub bitrate_kbps: u32,
    pub timeout: Option<Duration>,
    hook: Option<EventHook>,
}

impl FfmpegRunner {
    pub fn new(cfg: &ConvertConfig) -> Self {
        Self {
            ffmpeg_bin: cfg.ffmpeg_bin.clone(),
            codec: cfg.codec,
            bitrate_kbps: cfg.bitrate_kbps,
            timeout: cfg.job_timeout(),
            hook: None,
        }
    }

    pub fn with_event_hook(mut self, hook: EventHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Engine arguments for `job`
    pub fn build_args(&self, job: &Job) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-hide_banner".into(),
            "-nostdin".into(),
            "-y".into(),
            "-i".into(),
            job.source_path.clone().into_os_string(),
            "-vn".into(),
            "-c:a".into(),
            self.codec.ffmpeg_name().into(),
        ];
        // PCM has no bitrate knob
        if self.codec.is_lossy() {
            args.push("-b:a".into());
            args.push(format!("{}k", self.bitrate_kbps).into());
        }
        args.push(job.output_path.clone().into_os_string());
        args
    }

    fn emit(&self, event: ConversionEvent) {
        match &event {
            ConversionEvent::Started { command, .. } => debug!("Spawned ffmpeg with command: {}", command),
            ConversionEvent::Finished { source_path, output_path } => {
                debug!("Finished {} -> {}", source_path.display(), output_path.display())
            }
            ConversionEvent::Failed { source_path, message } => {
                error!("❌ Conversion failed for {}: {}", source_path.display(), message)
            }
        }
        if let Some(hook) = &self.hook {
            hook(&event);
        }
    }

    fn fail(&self, job: &Job, err: ConvertError) -> ConvertError {
        let message = match &err {
            ConvertError::Engine { message, .. } => message.clone(),
            other => other.to_string(),
        };
        self.emit(ConversionEvent::Failed {
            source_path: job.source_path.clone(),
            message,
        });
        err
    }

    async fn execute(&self, job: &Job) -> Result<()> {
        let args = self.build_args(job);

        let mut cmd = Command::new(&self.ffmpeg_bin);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            ConvertError::io(
                format!("Failed to spawn ffmpeg at: {}. Ensure ffmpeg is installed and accessible.",
                        self.ffmpeg_bin.display()),
                e,
            )
        })?;

        let stderr = child.stderr.take();
        let stderr_handle = tokio::spawn(async move {
            match stderr {
                Some(stderr) => drain_lines(stderr).await,
                None => Vec::new(),
            }
        });

        let status = match self.timeout {
            Some(limit) => match timeout(limit, child.wait()).await {
                Ok(result) => result,
                Err(_) => {
                    if let Err(e) = child.kill().await {
                        warn!("Failed to kill stuck ffmpeg process for {}: {}", job.source_path.display(), e);
                    }
                    return Err(ConvertError::Timeout {
                        source_path: job.source_path.clone(),
                        secs: limit.as_secs(),
                    });
                }
            },
            None => child.wait().await,
        }
        .map_err(|e| ConvertError::io("Failed to wait for ffmpeg process", e))?;

        let stderr_lines = stderr_handle.await.unwrap_or_default();

        if !status.success() {
            return Err(ConvertError::Engine {
                source_path: job.source_path.clone(),
                message: engine_message(&describe_exit(&status), &stderr_lines),
            });
        }
        Ok(())
    }
}

impl ConversionRunner for FfmpegRunner {
    async fn run(&self, job: &Job) -> Result<ConversionOutcome> {
        let command = format!(
            "{} {}",
            self.ffmpeg_bin.display(),
            self.build_args(job)
                .iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );
        self.emit(ConversionEvent::Started {
            source_path: job.source_path.clone(),
            command,
        });

        let started = Instant::now();
        if let Err(e) = self.execute(job).await {
            return Err(self.fail(job, e));
        }
        let elapsed = started.elapsed();

        let output_bytes = std::fs::metadata(&job.output_path).ok().map(|m| m.len());
        info!("✅ Converted {} -> {} ({}, {:.1}s)",
              job.source_path.display(),
              job.output_path.display(),
              output_bytes.map(|b| format_size(b, DECIMAL)).unwrap_or_else(|| "size unknown".to_string()),
              elapsed.as_secs_f64());

        self.emit(ConversionEvent::Finished {
            source_path: job.source_path.clone(),
            output_path: job.output_path.clone(),
        });

        Ok(ConversionOutcome {
            job: job.clone(),
            elapsed,
            output_bytes,
        })
    }
}

/// Read `reader` to EOF line by line. Non-UTF-8 bytes (Latin-1 metadata tags
/// echoed by ffmpeg) are replaced; the pipe must stay drained until EOF.
async fn drain_lines<R: AsyncRead + Unpin>(reader: R) -> Vec<String> {
    let mut reader = BufReader::new(reader);
    let mut lines = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                lines.push(line.trim_end_matches(['\r', '\n']).to_string());
            }
            Err(e) => {
                warn!("Stopped reading ffmpeg stderr: {}", e);
                break;
            }
        }
    }
    lines
}

/// How the engine ended, for the failure message
fn describe_exit(status: &ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("exited with code {}", code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return format!("killed by signal {}", signal);
        }
    }
    "exited abnormally".to_string()
}

/// Failure text in the engine's own words: how it exited plus the tail of stderr
fn engine_message(exit: &str, stderr_lines: &[String]) -> String {
    let tail: Vec<&str> = stderr_lines
        .iter()
        .map(|l| l.trim_end())
        .filter(|l| !l.is_empty())
        .collect();
    let start = tail.len().saturating_sub(STDERR_TAIL_LINES);
    let tail = tail[start..].join("\n");

    if tail.is_empty() {
        format!("ffmpeg {}", exit)
    } else {
        format!("ffmpeg {}: {}", exit, tail)
    }
}

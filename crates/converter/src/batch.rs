use std::path::PathBuf;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use log::{error, info};
use serde::Serialize;
use crate::config::ConversionOptions;
use crate::error::{ConvertError, Result};
use crate::job::Job;
use crate::runner::ConversionRunner;

/// Progress after a window has fully settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// 1-based index of the window that just finished
    pub window: usize,
    pub windows: usize,
    pub processed: usize,
    pub total: usize,
}

pub type ProgressHook = Arc<dyn Fn(&BatchProgress) + Send + Sync>;

/// Totals for a completed run
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub processed: usize,
    pub windows: usize,
    pub output_bytes: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Runs targets in fixed-size windows.
///
/// Every job in a window is launched together and the window is only
/// considered done once all of them have succeeded or failed. A failed window
/// ends the run: its first failure is returned and no later window starts.
pub struct BatchExecutor<R> {
    runner: R,
    options: Arc<ConversionOptions>,
    max_parallel: usize,
    progress_hook: Option<ProgressHook>,
}

impl<R: ConversionRunner> BatchExecutor<R> {
    pub fn new(runner: R, options: Arc<ConversionOptions>, max_parallel: usize) -> Result<Self> {
        if max_parallel == 0 {
            return Err(ConvertError::Config("max_parallel must be at least 1".to_string()));
        }
        Ok(Self {
            runner,
            options,
            max_parallel,
            progress_hook: None,
        })
    }

    pub fn with_progress_hook(mut self, hook: ProgressHook) -> Self {
        self.progress_hook = Some(hook);
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn window_count(&self, total: usize) -> usize {
        total.div_ceil(self.max_parallel)
    }

    pub async fn run(&self, targets: &[PathBuf]) -> Result<BatchSummary> {
        let started_at = Utc::now();
        let total = targets.len();
        let windows = self.window_count(total);
        let mut processed = 0;
        let mut output_bytes = 0;

        info!("Converting {} file(s) in {} window(s) of up to {}", total, windows, self.max_parallel);

        for (index, window) in targets.chunks(self.max_parallel).enumerate() {
            let jobs = window
                .iter()
                .map(|source| Job::plan(source, &self.options))
                .collect::<Result<Vec<_>>>()?;

            info!("Window {}/{}: starting {} job(s)", index + 1, windows, jobs.len());
            for job in &jobs {
                info!("Converting {} -> {}", job.source_path.display(), job.output_path.display());
            }

            let results = join_all(jobs.iter().map(|job| self.runner.run(job))).await;

            let mut first_failure = None;
            for result in results {
                match result {
                    Ok(outcome) => output_bytes += outcome.output_bytes.unwrap_or(0),
                    Err(e) => {
                        error!("Window {}/{}: {}", index + 1, windows, e);
                        first_failure.get_or_insert(e);
                    }
                }
            }
            if let Some(e) = first_failure {
                error!("Aborting after window {}/{}; {} of {} file(s) were processed before it",
                       index + 1, windows, processed, total);
                return Err(e);
            }

            processed += window.len();
            let progress = BatchProgress {
                window: index + 1,
                windows,
                processed,
                total,
            };
            info!("Processed {}/{}", processed, total);
            if let Some(hook) = &self.progress_hook {
                hook(&progress);
            }
        }

        Ok(BatchSummary {
            total,
            processed,
            windows,
            output_bytes,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

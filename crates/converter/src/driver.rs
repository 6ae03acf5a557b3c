use std::path::{Path, PathBuf};
use std::sync::Arc;
use log::{info, warn};
use crate::batch::{BatchExecutor, BatchSummary};
use crate::config::ConvertConfig;
use crate::error::{ConvertError, Result};
use crate::runner::{ConversionRunner, FfmpegRunner};
use crate::{matcher, scan};

/// Convert every target under `root` with ffmpeg
pub async fn convert_tree(root: &Path, cfg: &ConvertConfig) -> Result<BatchSummary> {
    convert_tree_with(root, cfg, FfmpegRunner::new(cfg)).await
}

/// Convert a single file with ffmpeg, regardless of its name
pub async fn convert_file(path: &Path, cfg: &ConvertConfig) -> Result<BatchSummary> {
    convert_file_with(path, cfg, FfmpegRunner::new(cfg)).await
}

pub async fn convert_tree_with<R: ConversionRunner>(
    root: &Path,
    cfg: &ConvertConfig,
    runner: R,
) -> Result<BatchSummary> {
    cfg.validate()?;
    if !root.is_dir() {
        return Err(ConvertError::NotFound(root.to_path_buf()));
    }

    let targets = scan::scan_targets(root)?;
    if targets.is_empty() {
        return Err(ConvertError::EmptyResult(root.to_path_buf()));
    }
    info!("Found {} file(s) to convert under {}", targets.len(), root.display());

    run_targets(&targets, cfg, runner).await
}

pub async fn convert_file_with<R: ConversionRunner>(
    path: &Path,
    cfg: &ConvertConfig,
    runner: R,
) -> Result<BatchSummary> {
    cfg.validate()?;
    if !path.is_file() {
        return Err(ConvertError::NotFound(path.to_path_buf()));
    }
    if !matcher::is_target_path(path) {
        warn!("{} does not end in {}, converting anyway", path.display(), matcher::TARGET_SUFFIX);
    }
    run_targets(&[path.to_path_buf()], cfg, runner).await
}

async fn run_targets<R: ConversionRunner>(
    targets: &[PathBuf],
    cfg: &ConvertConfig,
    runner: R,
) -> Result<BatchSummary> {
    let executor = BatchExecutor::new(runner, Arc::new(cfg.options()), cfg.max_parallel)?;
    executor.run(targets).await
}

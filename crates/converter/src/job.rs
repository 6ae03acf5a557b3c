use std::fs;
use std::path::{Path, PathBuf};
use serde::Serialize;
use crate::config::ConversionOptions;
use crate::error::{ConvertError, Result};

/// One source-to-output conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    pub source_path: PathBuf,
    pub output_path: PathBuf,
}

impl Job {
    /// Build the job for `source_path`, creating its output directory if needed.
    ///
    /// Refuses a job whose output would be the source itself (PCM written
    /// beside a `.wav` source), compared ignoring ASCII case so
    /// case-insensitive filesystems are covered too.
    pub fn plan(source_path: &Path, options: &ConversionOptions) -> Result<Job> {
        let output_path = output_path_for(source_path, options)?;
        if same_file_name(&output_path, source_path) {
            return Err(ConvertError::Config(format!(
                "output for {} would overwrite the source; set an output directory for {} output",
                source_path.display(),
                options.codec
            )));
        }
        if let Some(dir) = output_path.parent() {
            ensure_output_dir(dir)?;
        }
        Ok(Job {
            source_path: source_path.to_path_buf(),
            output_path,
        })
    }
}

/// Where the converted file for `source_path` goes. Pure, touches nothing on disk.
///
/// Two sources with the same stem and an `output_dir` map to the same path;
/// the later conversion overwrites the earlier one.
pub fn output_path_for(source_path: &Path, options: &ConversionOptions) -> Result<PathBuf> {
    let file_name = source_path
        .file_name()
        .ok_or_else(|| ConvertError::Config(format!("source has no file name: {}", source_path.display())))?;

    let mut output_name = PathBuf::from(file_name);
    output_name.set_extension(options.codec.extension());

    let dir = match &options.output_dir {
        Some(dir) => dir.clone(),
        None => source_path.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    Ok(dir.join(output_name))
}

fn same_file_name(a: &Path, b: &Path) -> bool {
    a == b || a.to_string_lossy().eq_ignore_ascii_case(&b.to_string_lossy())
}

/// Create `dir` and any missing ancestors. Succeeds if it already exists,
/// including when a sibling job created it a moment earlier.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(dir)
        .map_err(|e| ConvertError::io(format!("Failed to create output directory: {}", dir.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Codec;
    use proptest::prelude::*;

    fn opts(codec: Codec, output_dir: Option<&str>) -> ConversionOptions {
        ConversionOptions {
            codec,
            bitrate_kbps: 256,
            output_dir: output_dir.map(PathBuf::from),
        }
    }

    #[test]
    fn test_output_dir_replaces_parent() {
        let out = output_path_for(Path::new("in/song_TrLR.WAV"), &opts(Codec::Mp3, Some("out"))).unwrap();
        assert_eq!(out, PathBuf::from("out/song_TrLR.mp3"));
    }

    #[test]
    fn test_beside_source_by_default() {
        let out = output_path_for(Path::new("/rec/day1/take_TrLR.wav"), &opts(Codec::Aac, None)).unwrap();
        assert_eq!(out, PathBuf::from("/rec/day1/take_TrLR.m4a"));
    }

    #[test]
    fn test_pcm_keeps_wav_extension() {
        let out = output_path_for(Path::new("/rec/take_TrLR.WAV"), &opts(Codec::Pcm, Some("/pcm"))).unwrap();
        assert_eq!(out, PathBuf::from("/pcm/take_TrLR.wav"));
    }

    #[test]
    fn test_no_file_name_rejected() {
        assert!(matches!(
            output_path_for(Path::new("/"), &opts(Codec::Mp3, None)),
            Err(ConvertError::Config(_))
        ));
    }

    #[test]
    fn test_plan_creates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out_root = dir.path().join("out");
        let options = ConversionOptions {
            output_dir: Some(out_root.clone()),
            ..Default::default()
        };

        let job = Job::plan(Path::new("in/song_TrLR.WAV"), &options).unwrap();
        assert_eq!(job.output_path, out_root.join("song_TrLR.mp3"));
        assert_eq!(job.source_path, PathBuf::from("in/song_TrLR.WAV"));
        assert!(out_root.is_dir());
    }

    #[test]
    fn test_pcm_beside_source_refused() {
        let dir = tempfile::tempdir().unwrap();
        let options = ConversionOptions { codec: Codec::Pcm, ..Default::default() };

        for name in ["take_TrLR.wav", "take_TrLR.WAV"] {
            let source = dir.path().join(name);
            let result = Job::plan(&source, &options);
            assert!(matches!(result, Err(ConvertError::Config(_))), "{} should be refused", name);
        }
    }

    #[test]
    fn test_pcm_into_output_dir_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let options = ConversionOptions {
            codec: Codec::Pcm,
            output_dir: Some(dir.path().join("pcm")),
            ..Default::default()
        };
        let job = Job::plan(&dir.path().join("take_TrLR.wav"), &options).unwrap();
        assert_eq!(job.output_path, dir.path().join("pcm/take_TrLR.wav"));
    }

    #[test]
    fn test_ensure_output_dir_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a/b/c");
        ensure_output_dir(&target).unwrap();
        ensure_output_dir(&target).unwrap();
        assert!(target.is_dir());
        assert_eq!(fs::read_dir(dir.path().join("a/b")).unwrap().count(), 1);
    }

    #[test]
    fn test_ensure_output_dir_concurrent() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("shared/out");
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| ensure_output_dir(&target).unwrap());
            }
        });
        assert!(target.is_dir());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Same inputs always give the same output, with the codec's extension
        #[test]
        fn test_output_path_deterministic(
            dirs in proptest::collection::vec("[a-z0-9]{1,8}", 0..4),
            stem in "[a-zA-Z0-9 _-]{1,16}",
            codec in prop_oneof![Just(Codec::Mp3), Just(Codec::Aac), Just(Codec::Pcm)],
            out in proptest::option::of("[a-z]{1,8}"),
        ) {
            let mut source = PathBuf::from("/in");
            for d in &dirs {
                source.push(d);
            }
            source.push(format!("{}_TrLR.WAV", stem));
            let options = opts(codec, out.as_deref());

            let first = output_path_for(&source, &options).unwrap();
            let second = output_path_for(&source, &options).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.extension().and_then(|e| e.to_str()), Some(codec.extension()));
            let expected_name = format!("{}_TrLR.{}", stem, codec.extension());
            prop_assert_eq!(first.file_name().and_then(|n| n.to_str()), Some(expected_name.as_str()));
            match out {
                Some(o) => prop_assert_eq!(first.parent(), Some(Path::new(&o))),
                None => prop_assert_eq!(first.parent(), source.parent()),
            }
        }
    }
}

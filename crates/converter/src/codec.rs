use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::ConvertError;

/// Output audio codecs understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    #[default]
    Mp3,
    Aac,
    Pcm,
}

impl Codec {
    pub const ALL: [Codec; 3] = [Codec::Mp3, Codec::Aac, Codec::Pcm];

    /// Get the FFmpeg encoder name for this codec
    pub fn ffmpeg_name(&self) -> &'static str {
        match self {
            Codec::Mp3 => "libmp3lame",
            Codec::Aac => "aac",
            Codec::Pcm => "pcm_s16le",
        }
    }

    /// File extension (without the dot) written for this codec
    pub fn extension(&self) -> &'static str {
        match self {
            Codec::Mp3 => "mp3",
            Codec::Aac => "m4a",
            Codec::Pcm => "wav",
        }
    }

    /// Whether the encoder takes a target bitrate
    pub fn is_lossy(&self) -> bool {
        !matches!(self, Codec::Pcm)
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Codec::Mp3 => "mp3",
            Codec::Aac => "aac",
            Codec::Pcm => "pcm",
        };
        f.write_str(name)
    }
}

impl FromStr for Codec {
    type Err = ConvertError;

    /// Accepts the short name or the engine identifier, any case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Codec::ALL
            .into_iter()
            .find(|c| c.to_string() == wanted || c.ffmpeg_name() == wanted)
            .ok_or_else(|| {
                ConvertError::Config(format!(
                    "unknown codec '{}' (expected one of: mp3, aac, pcm)",
                    s
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_table() {
        assert_eq!(Codec::Mp3.extension(), "mp3");
        assert_eq!(Codec::Aac.extension(), "m4a");
        assert_eq!(Codec::Pcm.extension(), "wav");
    }

    #[test]
    fn test_parse_short_and_engine_names() {
        assert_eq!("mp3".parse::<Codec>().unwrap(), Codec::Mp3);
        assert_eq!("AAC".parse::<Codec>().unwrap(), Codec::Aac);
        assert_eq!("libmp3lame".parse::<Codec>().unwrap(), Codec::Mp3);
        assert_eq!("pcm_s16le".parse::<Codec>().unwrap(), Codec::Pcm);
        assert!(matches!("flac".parse::<Codec>(), Err(ConvertError::Config(_))));
    }

    #[test]
    fn test_default_is_mp3() {
        assert_eq!(Codec::default(), Codec::Mp3);
        assert!(Codec::Mp3.is_lossy());
        assert!(!Codec::Pcm.is_lossy());
    }
}

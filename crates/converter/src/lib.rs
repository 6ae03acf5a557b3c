pub mod batch;
pub mod codec;
pub mod config;
pub mod driver;
pub mod error;
pub mod job;
pub mod matcher;
pub mod runner;
pub mod scan;

pub use batch::{BatchExecutor, BatchProgress, BatchSummary};
pub use codec::Codec;
pub use config::{ConversionOptions, ConvertConfig};
pub use error::ConvertError;
pub use job::Job;
pub use runner::{ConversionEvent, ConversionOutcome, ConversionRunner, FfmpegRunner};

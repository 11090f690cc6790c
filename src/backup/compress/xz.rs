use crate::backup::compress::CompressionOptions;
use crate::backup::result_error::result::Result;
use liblzma::stream::{Check, MtStreamBuilder};
use liblzma::write::XzEncoder;
use std::io::Write;
use std::num::NonZero;

/// Default compression level (balance of speed vs size)
static DEFAULT_COMPRESSION_LEVEL: u32 = 3;
/// Maximum threads to prevent resource exhaustion
static DEFAULT_MAX_PARALLELIZATION: usize = 32;

/// Half of the available cores, at least one, at most [`DEFAULT_MAX_PARALLELIZATION`]
fn default_thread_count() -> u32 {
    std::thread::available_parallelism()
        .map(NonZero::get)
        .map(|core| core / 2)
        .map(|t| t.max(1))
        .map(|t| t.min(DEFAULT_MAX_PARALLELIZATION) as u32)
        .unwrap_or(1)
}

/// Creates an XZ encoder for the given options
///
/// One thread uses the plain single-threaded encoder, anything more goes
/// through the multi-threaded stream encoder with CRC64 checks.
pub fn build_xz_encoder<W: Write>(writer: W, options: &CompressionOptions) -> Result<XzEncoder<W>> {
    let level = options.level.unwrap_or(DEFAULT_COMPRESSION_LEVEL);
    let thread = options.threads.unwrap_or_else(default_thread_count);

    tracing::debug!("Creating XZ compressor with level={}, threads={}", level, thread);

    if thread == 1 {
        Ok(XzEncoder::new(writer, level))
    } else {
        let stream = MtStreamBuilder::new()
            .preset(level)
            .check(Check::Crc64)
            .threads(thread)
            .encoder()?;
        Ok(XzEncoder::new_stream(writer, stream))
    }
}

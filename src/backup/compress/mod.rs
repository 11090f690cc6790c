pub mod xz;

use crate::backup::finish::Finish;
use bon::Builder;
use io_enum::{Read, Write};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::io;
use std::io::{Read, Write};
use validator::Validate;

#[derive(Write)]
pub enum Compressor<W: Write> {
    None(W),
    Lz4(lz4_flex::frame::FrameEncoder<W>),
    Bzip2(bzip2::write::BzEncoder<W>),
    Gzip(flate2::write::GzEncoder<W>),
    Sz(snap::write::FrameEncoder<W>),
    Xz(liblzma::write::XzEncoder<W>),
}

#[derive(Read)]
pub enum Decompressor<R: Read> {
    None(R),
    Lz4(lz4_flex::frame::FrameDecoder<R>),
    Bzip2(bzip2::read::MultiBzDecoder<R>),
    Gzip(flate2::read::MultiGzDecoder<R>),
    Sz(snap::read::FrameDecoder<R>),
    Xz(liblzma::read::XzDecoder<R>),
}

/// Tuning shared by all compressed formats
#[skip_serializing_none]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Validate, Serialize, Deserialize, Builder)]
#[serde(deny_unknown_fields)]
pub struct CompressionOptions {
    /// Compression level (0-9), ignored by lz4 and sz
    #[validate(range(min = 0, max = 9))]
    pub level: Option<u32>,
    /// Encoder threads, xz only
    #[validate(range(min = 1))]
    pub threads: Option<u32>,
}

impl<W: Write> Finish<W> for Compressor<W> {
    fn finish(self) -> io::Result<W> {
        match self {
            Compressor::None(w) => Ok(w),
            Compressor::Lz4(w) => Finish::finish(w),
            Compressor::Bzip2(w) => Finish::finish(w),
            Compressor::Gzip(w) => Finish::finish(w),
            Compressor::Sz(w) => Finish::finish(w),
            Compressor::Xz(w) => Finish::finish(w),
        }
    }
}

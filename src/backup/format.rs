//! Archive format identifiers and their writer/reader strategies.

use crate::backup::compress::xz::build_xz_encoder;
use crate::backup::compress::{CompressionOptions, Compressor, Decompressor};
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithDebugObjectAndFnName;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::fmt::{Display, Formatter};
use std::io::{Read, Write};
use std::str::FromStr;

/// Default level of the gzip and bzip2 encoders
static DEFAULT_LEVEL: u32 = 6;

/// Tar, optionally wrapped in one compression algorithm
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ArchiveFormat {
    #[default]
    Tar,
    Lz4,
    Bzip2,
    Gzip,
    /// Snappy framed stream
    Sz,
    Xz,
}

pub static SUPPORTED_FORMATS: [ArchiveFormat; 6] = [
    ArchiveFormat::Tar,
    ArchiveFormat::Lz4,
    ArchiveFormat::Bzip2,
    ArchiveFormat::Gzip,
    ArchiveFormat::Sz,
    ArchiveFormat::Xz,
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("wrong compression format {format:?}, supported: {}", supported_list())]
pub struct UnknownFormatError {
    pub format: String,
}

fn supported_list() -> String {
    SUPPORTED_FORMATS
        .iter()
        .map(|f| format!("'{}'", f.id()))
        .join(", ")
}

impl ArchiveFormat {
    pub fn id(&self) -> &'static str {
        match self {
            ArchiveFormat::Tar => "tar",
            ArchiveFormat::Lz4 => "lz4",
            ArchiveFormat::Bzip2 => "bzip2",
            ArchiveFormat::Gzip => "gzip",
            ArchiveFormat::Sz => "sz",
            ArchiveFormat::Xz => "xz",
        }
    }

    /// File extension of archives in this format, without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Tar => "tar",
            ArchiveFormat::Lz4 => "tar.lz4",
            ArchiveFormat::Bzip2 => "tar.bz2",
            ArchiveFormat::Gzip => "tar.gz",
            ArchiveFormat::Sz => "tar.sz",
            ArchiveFormat::Xz => "tar.xz",
        }
    }

    /// Guesses the format from an archive file name by its extension
    pub fn from_file_name<S: AsRef<str>>(name: S) -> Option<Self> {
        let name = name.as_ref();
        SUPPORTED_FORMATS
            .iter()
            .copied()
            .filter(|f| name.ends_with(&format!(".{}", f.extension())))
            .max_by_key(|f| f.extension().len())
    }

    /// Wraps `writer` so that everything written to it is compressed
    ///
    /// The returned writer must be finished with [`crate::backup::finish::Finish`]
    /// to flush the stream trailer.
    pub fn open_writer<W: Write>(
        &self,
        writer: W,
        options: &CompressionOptions,
    ) -> Result<Compressor<W>> {
        let level = options.level.unwrap_or(DEFAULT_LEVEL);
        let compressor = match self {
            ArchiveFormat::Tar => Compressor::None(writer),
            ArchiveFormat::Lz4 => {
                Compressor::Lz4(lz4_flex::frame::FrameEncoder::new(writer))
            }
            ArchiveFormat::Bzip2 => Compressor::Bzip2(bzip2::write::BzEncoder::new(
                writer,
                bzip2::Compression::new(level.clamp(1, 9)),
            )),
            ArchiveFormat::Gzip => Compressor::Gzip(flate2::write::GzEncoder::new(
                writer,
                flate2::Compression::new(level),
            )),
            ArchiveFormat::Sz => Compressor::Sz(snap::write::FrameEncoder::new(writer)),
            ArchiveFormat::Xz => Compressor::Xz(
                build_xz_encoder(writer, options)
                    .with_debug_object_and_fn_name(*options, "build_xz_encoder")?,
            ),
        };

        if options.level.is_some() && matches!(self, ArchiveFormat::Lz4 | ArchiveFormat::Sz) {
            tracing::debug!("Compression level is ignored for {}", self);
        }
        tracing::debug!("Opened {} writer", self);
        Ok(compressor)
    }

    /// Wraps `reader` so that reads yield the decompressed tar stream
    pub fn open_reader<R: Read>(&self, reader: R) -> Decompressor<R> {
        match self {
            ArchiveFormat::Tar => Decompressor::None(reader),
            ArchiveFormat::Lz4 => {
                Decompressor::Lz4(lz4_flex::frame::FrameDecoder::new(reader))
            }
            ArchiveFormat::Bzip2 => {
                Decompressor::Bzip2(bzip2::read::MultiBzDecoder::new(reader))
            }
            ArchiveFormat::Gzip => {
                Decompressor::Gzip(flate2::read::MultiGzDecoder::new(reader))
            }
            ArchiveFormat::Sz => Decompressor::Sz(snap::read::FrameDecoder::new(reader)),
            ArchiveFormat::Xz => Decompressor::Xz(liblzma::read::XzDecoder::new(reader)),
        }
    }
}

impl Display for ArchiveFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ArchiveFormat {
    type Err = UnknownFormatError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        SUPPORTED_FORMATS
            .iter()
            .copied()
            .find(|f| f.id() == s)
            .ok_or_else(|| UnknownFormatError {
                format: s.to_string(),
            })
    }
}

impl TryFrom<String> for ArchiveFormat {
    type Error = UnknownFormatError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ArchiveFormat> for String {
    fn from(value: ArchiveFormat) -> Self {
        value.id().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::finish::Finish;
    use std::io::Cursor;

    #[test]
    fn test_parse_known_ids() {
        for format in SUPPORTED_FORMATS {
            assert_eq!(format.id().parse::<ArchiveFormat>().unwrap(), format);
        }
    }

    #[test]
    fn test_unknown_id_lists_supported() {
        let err = "zip".parse::<ArchiveFormat>().unwrap_err();
        assert_eq!(err.format, "zip");
        assert_eq!(
            err.to_string(),
            "wrong compression format \"zip\", supported: 'tar', 'lz4', 'bzip2', 'gzip', 'sz', 'xz'"
        );
    }

    #[test]
    fn test_extensions() {
        let extensions = SUPPORTED_FORMATS.iter().map(|f| f.extension()).collect_vec();
        assert_eq!(
            extensions,
            vec!["tar", "tar.lz4", "tar.bz2", "tar.gz", "tar.sz", "tar.xz"]
        );
    }

    #[test]
    fn test_from_file_name() {
        assert_eq!(
            ArchiveFormat::from_file_name("2023-01-01T00-00-00.tar"),
            Some(ArchiveFormat::Tar)
        );
        assert_eq!(
            ArchiveFormat::from_file_name("2023-01-01T00-00-00.tar.gz"),
            Some(ArchiveFormat::Gzip)
        );
        assert_eq!(
            ArchiveFormat::from_file_name("backup.tar.bz2"),
            Some(ArchiveFormat::Bzip2)
        );
        assert_eq!(ArchiveFormat::from_file_name("backup.zip"), None);
        assert_eq!(ArchiveFormat::from_file_name("backup.gz"), None);
    }

    #[test]
    fn test_serde_uses_id() {
        let serialized = serde_json::to_string(&ArchiveFormat::Bzip2).unwrap();
        assert_eq!(serialized, "\"bzip2\"");

        let deserialized: ArchiveFormat = serde_json::from_str("\"sz\"").unwrap();
        assert_eq!(deserialized, ArchiveFormat::Sz);

        let err = serde_json::from_str::<ArchiveFormat>("\"zip\"").unwrap_err();
        assert!(err.to_string().contains("supported"));
    }

    #[test]
    fn test_writer_and_reader_agree() {
        let payload = "some text that compresses well. ".repeat(64);
        let options = CompressionOptions::builder().level(1).threads(1).build();

        for format in SUPPORTED_FORMATS {
            let mut writer = format.open_writer(Cursor::new(Vec::new()), &options).unwrap();
            writer.write_all(payload.as_bytes()).unwrap();
            let encoded = writer.finish().unwrap().into_inner();

            if format != ArchiveFormat::Tar {
                assert!(encoded.len() < payload.len(), "{format} did not compress");
            }

            let mut decoded = String::new();
            format
                .open_reader(Cursor::new(encoded))
                .read_to_string(&mut decoded)
                .unwrap();
            assert_eq!(decoded, payload, "{format} round trip failed");
        }
    }

    #[test]
    fn test_gzip_writes_gzip_magic() {
        let mut writer = ArchiveFormat::Gzip
            .open_writer(Vec::new(), &CompressionOptions::default())
            .unwrap();
        writer.write_all(b"data").unwrap();
        let encoded = writer.finish().unwrap();

        assert_eq!(&encoded[..2], &[0x1f, 0x8b]);
    }
}

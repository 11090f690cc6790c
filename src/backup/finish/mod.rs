use bzip2::write::BzEncoder;
use flate2::write::GzEncoder;
use liblzma::write::XzEncoder;
use std::io::{Error, Write};

/// Flushes a stream's trailer and hands back the wrapped writer
pub trait Finish<O> {
    fn finish(self) -> Result<O, Error>;
}

impl<W: Write> Finish<W> for XzEncoder<W> {
    fn finish(self) -> Result<W, Error> {
        self.finish()
    }
}

impl<W: Write> Finish<W> for GzEncoder<W> {
    fn finish(self) -> Result<W, Error> {
        self.finish()
    }
}

impl<W: Write> Finish<W> for BzEncoder<W> {
    fn finish(self) -> Result<W, Error> {
        self.finish()
    }
}

impl<W: Write> Finish<W> for lz4_flex::frame::FrameEncoder<W> {
    fn finish(self) -> Result<W, Error> {
        self.finish().map_err(Error::from)
    }
}

impl<W: Write> Finish<W> for snap::write::FrameEncoder<W> {
    fn finish(self) -> Result<W, Error> {
        self.into_inner()
            .map_err(|e| Error::new(e.error().kind(), e.error().to_string()))
    }
}

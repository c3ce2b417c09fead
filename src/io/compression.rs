//! Transparent compression for JSONL files.
//!
//! Built-in codecs, enabled via feature flags:
//! - **Gzip** (`.gz`) via `flate2` (feature: `compression-gzip`)
//! - **Zstd** (`.zst`) via `zstd` (feature: `compression-zstd`)
//!
//! Readers are detected by file extension first and by magic bytes second, so a
//! compressed file with an unusual name still opens. Writers are detected by
//! extension only.

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// A compression format the crate can read and write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Codec {
    #[cfg(feature = "compression-gzip")]
    Gzip,
    #[cfg(feature = "compression-zstd")]
    Zstd,
}

impl Codec {
    /// Every codec compiled into this build.
    pub const ALL: &'static [Codec] = &[
        #[cfg(feature = "compression-gzip")]
        Codec::Gzip,
        #[cfg(feature = "compression-zstd")]
        Codec::Zstd,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            #[cfg(feature = "compression-gzip")]
            Codec::Gzip => "gzip",
            #[cfg(feature = "compression-zstd")]
            Codec::Zstd => "zstd",
        }
    }

    fn extensions(self) -> &'static [&'static str] {
        match self {
            #[cfg(feature = "compression-gzip")]
            Codec::Gzip => &[".gz", ".gzip"],
            #[cfg(feature = "compression-zstd")]
            Codec::Zstd => &[".zst", ".zstd"],
        }
    }

    fn magic_bytes(self) -> &'static [u8] {
        match self {
            #[cfg(feature = "compression-gzip")]
            Codec::Gzip => &[0x1f, 0x8b],
            #[cfg(feature = "compression-zstd")]
            Codec::Zstd => &[0x28, 0xb5, 0x2f, 0xfd],
        }
    }

    /// Codec matching the path's extension, case-insensitively.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Option<Codec> {
        let lower = path.as_ref().to_string_lossy().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.extensions().iter().any(|ext| lower.ends_with(ext)))
    }

    /// Codec whose signature starts `header`.
    #[must_use]
    pub fn from_magic(header: &[u8]) -> Option<Codec> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| header.starts_with(c.magic_bytes()))
    }

    fn wrap_reader(self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        match self {
            #[cfg(feature = "compression-gzip")]
            Codec::Gzip => Ok(Box::new(flate2::read::MultiGzDecoder::new(reader))),
            #[cfg(feature = "compression-zstd")]
            Codec::Zstd => {
                zstd::stream::read::Decoder::new(reader).map(|d| Box::new(d) as Box<dyn Read>)
            }
        }
    }

    fn wrap_writer(self, writer: BufWriter<Box<dyn Write>>) -> std::io::Result<Sink> {
        match self {
            #[cfg(feature = "compression-gzip")]
            Codec::Gzip => Ok(Sink::Gzip(flate2::write::GzEncoder::new(
                writer,
                flate2::Compression::default(),
            ))),
            #[cfg(feature = "compression-zstd")]
            Codec::Zstd => zstd::stream::write::Encoder::new(writer, 3).map(Sink::Zstd),
        }
    }
}

enum Sink {
    Plain(BufWriter<Box<dyn Write>>),
    #[cfg(feature = "compression-gzip")]
    Gzip(flate2::write::GzEncoder<BufWriter<Box<dyn Write>>>),
    #[cfg(feature = "compression-zstd")]
    Zstd(zstd::stream::write::Encoder<'static, BufWriter<Box<dyn Write>>>),
}

/// Output stream that may compress. Call [`finish`](Self::finish) when done:
/// dropping it without finishing can leave a compressed file without its
/// trailer and hides the error.
pub struct CodecWriter {
    sink: Sink,
}

impl CodecWriter {
    /// Write any codec trailer and flush everything to the underlying writer.
    ///
    /// # Errors
    /// If the trailer or the final flush cannot be written.
    pub fn finish(self) -> std::io::Result<()> {
        let mut inner = match self.sink {
            Sink::Plain(w) => w,
            #[cfg(feature = "compression-gzip")]
            Sink::Gzip(e) => e.finish()?,
            #[cfg(feature = "compression-zstd")]
            Sink::Zstd(e) => e.finish()?,
        };
        inner.flush()
    }
}

impl Write for CodecWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.sink {
            Sink::Plain(w) => w.write(buf),
            #[cfg(feature = "compression-gzip")]
            Sink::Gzip(e) => e.write(buf),
            #[cfg(feature = "compression-zstd")]
            Sink::Zstd(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.sink {
            Sink::Plain(w) => w.flush(),
            #[cfg(feature = "compression-gzip")]
            Sink::Gzip(e) => e.flush(),
            #[cfg(feature = "compression-zstd")]
            Sink::Zstd(e) => e.flush(),
        }
    }
}

/// Wrap `reader` with decompression when `path_hint` or the stream header calls for it.
///
/// # Errors
/// If the codec cannot initialize its decoder.
pub fn auto_detect_reader<R: Read + 'static>(
    reader: R,
    path_hint: impl AsRef<Path>,
) -> Result<Box<dyn BufRead>> {
    let mut buffered = BufReader::new(reader);
    let codec = match Codec::from_path(&path_hint) {
        Some(codec) => Some(codec),
        None => Codec::from_magic(buffered.fill_buf().context("peek stream header")?),
    };
    match codec {
        Some(codec) => {
            let inner = codec
                .wrap_reader(Box::new(buffered))
                .with_context(|| format!("wrap reader with {} codec", codec.name()))?;
            Ok(Box::new(BufReader::new(inner)))
        }
        None => Ok(Box::new(buffered)),
    }
}

/// Wrap `writer` with compression when `path_hint` has a codec extension.
///
/// # Errors
/// If the codec cannot initialize its encoder.
pub fn auto_detect_writer<W: Write + 'static>(
    writer: W,
    path_hint: impl AsRef<Path>,
) -> Result<CodecWriter> {
    let buffered: BufWriter<Box<dyn Write>> = BufWriter::new(Box::new(writer));
    let sink = match Codec::from_path(&path_hint) {
        Some(codec) => codec
            .wrap_writer(buffered)
            .with_context(|| format!("wrap writer with {} codec", codec.name()))?,
        None => Sink::Plain(buffered),
    };
    Ok(CodecWriter { sink })
}

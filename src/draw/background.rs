use anyhow::{anyhow, bail, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use image::RgbaImage;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::JoinHandle;

/// Where the background photo comes from. Remote URLs are the host's business;
/// only local files and in-memory data are decoded here.
#[derive(Clone, PartialEq, Eq)]
pub enum BackgroundSource {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

impl std::fmt::Debug for BackgroundSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

impl BackgroundSource {
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Accepts a filesystem path, a `file://` URL or a `data:` URL.
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            bail!("empty background reference");
        }
        if let Some(rest) = reference.strip_prefix("data:") {
            return Ok(Self::Bytes(decode_data_url(rest)?.into()));
        }
        if reference.contains("://") {
            let url = url::Url::parse(reference)
                .with_context(|| format!("parse background url {reference}"))?;
            if url.scheme() != "file" {
                bail!(
                    "unsupported background url scheme {:?}; fetch it and pass the bytes",
                    url.scheme()
                );
            }
            let path = url
                .to_file_path()
                .map_err(|_| anyhow!("file url has no local path: {reference}"))?;
            return Ok(Self::Path(path));
        }
        Ok(Self::Path(PathBuf::from(reference)))
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Path(path) => format!("path {}", path.display()),
            Self::Bytes(bytes) => format!("{} in-memory bytes", bytes.len()),
        }
    }
}

fn decode_data_url(rest: &str) -> Result<Vec<u8>> {
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| anyhow!("data url has no payload separator"))?;
    if header.ends_with(";base64") {
        general_purpose::STANDARD
            .decode(payload.trim())
            .context("decode base64 data url payload")
    } else {
        Ok(urlencoding::decode_binary(payload.as_bytes()).into_owned())
    }
}

/// Decodes the source into an RGBA image at its natural size.
pub fn decode_background(source: &BackgroundSource) -> Result<RgbaImage> {
    let decoded = match source {
        BackgroundSource::Path(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("read background image {}", path.display()))?;
            image::load_from_memory(&bytes)
                .with_context(|| format!("decode background image {}", path.display()))?
        }
        BackgroundSource::Bytes(bytes) => {
            image::load_from_memory(bytes).context("decode in-memory background image")?
        }
    };
    let rgba = decoded.into_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        bail!("background image has no pixels");
    }
    Ok(rgba)
}

#[derive(Debug)]
pub struct DecodedBackground {
    pub generation: u64,
    pub result: Result<RgbaImage>,
}

/// Decodes on a worker thread and reports back through `tx`. The generation
/// lets the receiver drop results of loads that were superseded meanwhile.
pub fn spawn_decode(
    generation: u64,
    source: BackgroundSource,
    tx: Sender<DecodedBackground>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let result = decode_background(&source);
        if tx.send(DecodedBackground { generation, result }).is_err() {
            tracing::debug!(generation, "background decode finished after receiver closed");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        image
            .write_to(&mut out, ImageOutputFormat::Png)
            .expect("encode png");
        out.into_inner()
    }

    #[test]
    fn plain_reference_is_a_path() {
        assert_eq!(
            BackgroundSource::parse("photos/card.png").expect("path"),
            BackgroundSource::Path(PathBuf::from("photos/card.png"))
        );
    }

    #[test]
    fn remote_urls_are_rejected() {
        assert!(BackgroundSource::parse("https://example.com/a.png").is_err());
        assert!(BackgroundSource::parse("").is_err());
    }

    #[test]
    fn base64_data_url_decodes_to_image() {
        let encoded = general_purpose::STANDARD.encode(png_bytes(3, 2));
        let source =
            BackgroundSource::parse(&format!("data:image/png;base64,{encoded}")).expect("data url");
        let image = decode_background(&source).expect("decode");
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn percent_encoded_data_url_keeps_raw_bytes() {
        let source = BackgroundSource::parse("data:text/plain,a%20b").expect("data url");
        assert_eq!(source, BackgroundSource::from_bytes(b"a b".to_vec()));
    }

    #[test]
    fn file_url_and_path_decode_the_same_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("bg.png");
        std::fs::write(&path, png_bytes(4, 5)).expect("write png");

        let url = url::Url::from_file_path(&path).expect("file url");
        let from_url = BackgroundSource::parse(url.as_str()).expect("file url source");
        assert_eq!(from_url, BackgroundSource::Path(path.clone()));
        assert_eq!(decode_background(&from_url).expect("decode").dimensions(), (4, 5));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let source = BackgroundSource::from_bytes(vec![1u8, 2, 3, 4]);
        assert!(decode_background(&source).is_err());
    }

    #[test]
    fn missing_file_fails_with_context() {
        let err = decode_background(&BackgroundSource::Path(PathBuf::from(
            "/definitely/not/here.png",
        )))
        .expect_err("missing file");
        assert!(format!("{err:#}").contains("read background image"));
    }

    #[test]
    fn worker_reports_generation_back() {
        let (tx, rx) = std::sync::mpsc::channel();
        let handle = spawn_decode(7, BackgroundSource::from_bytes(png_bytes(2, 2)), tx);
        let decoded = rx.recv().expect("decode result");
        handle.join().expect("worker join");
        assert_eq!(decoded.generation, 7);
        assert_eq!(decoded.result.expect("image").dimensions(), (2, 2));
    }
}

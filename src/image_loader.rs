//! # Image Loading
//!
//! Resolves `<img src>` values to bytes and reads their intrinsic size.
//! Data URIs and local files are supported; remote URLs are never fetched,
//! so an image pointing at one is treated as unavailable.
//!
//! Only the header is decoded to get dimensions. Pixels are not needed for
//! measurement, and exporters embed the original bytes.

use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Container format detected from magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Gif,
    Other,
}

impl ImageKind {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Other => "bin",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Other => "application/octet-stream",
        }
    }
}

/// Raw image bytes with their intrinsic size.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub data: Vec<u8>,
    pub kind: ImageKind,
    pub width_px: u32,
    pub height_px: u32,
}

/// Loads images relative to an optional base directory.
#[derive(Debug, Clone, Default)]
pub struct ImageLoader {
    base_dir: Option<PathBuf>,
}

impl ImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative file paths against `dir` instead of the working directory.
    pub fn with_base_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(dir.into()),
        }
    }

    pub fn load(&self, src: &str) -> Result<LoadedImage, String> {
        let data = self.read_source_bytes(src)?;
        let (width_px, height_px) = read_dimensions(&data)?;
        Ok(LoadedImage {
            kind: detect_kind(&data),
            data,
            width_px,
            height_px,
        })
    }

    /// Intrinsic `(width, height)` in px.
    pub fn dimensions(&self, src: &str) -> Result<(u32, u32), String> {
        let data = self.read_source_bytes(src)?;
        read_dimensions(&data)
    }

    fn read_source_bytes(&self, src: &str) -> Result<Vec<u8>, String> {
        let src = src.trim();
        if src.is_empty() {
            return Err("Image has no source".to_string());
        }

        // data:image/png;base64,iVBOR...
        if let Some(rest) = src.strip_prefix("data:") {
            let comma_pos = rest
                .find(',')
                .ok_or_else(|| "Invalid data URI: missing comma".to_string())?;
            let (header, payload) = (&rest[..comma_pos], &rest[comma_pos + 1..]);
            if !header.ends_with(";base64") {
                return Err("Only base64 data URIs are supported".to_string());
            }
            return base64_decode(payload);
        }

        if src.starts_with("http://") || src.starts_with("https://") || src.starts_with("//") {
            return Err(format!("Remote image '{}' is not fetched", src));
        }

        let path = src.strip_prefix("file://").unwrap_or(src);
        self.read_file(Path::new(path))
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn read_file(&self, path: &Path) -> Result<Vec<u8>, String> {
        let resolved = match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        };
        std::fs::read(&resolved)
            .map_err(|e| format!("Failed to read image file '{}': {}", resolved.display(), e))
    }

    #[cfg(target_arch = "wasm32")]
    fn read_file(&self, path: &Path) -> Result<Vec<u8>, String> {
        Err(format!(
            "File path images not supported in WASM: '{}'. Use data URIs.",
            path.display()
        ))
    }
}

fn base64_decode(input: &str) -> Result<Vec<u8>, String> {
    use base64::Engine;
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(cleaned)
        .map_err(|e| format!("Base64 decode error: {}", e))
}

fn detect_kind(data: &[u8]) -> ImageKind {
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        ImageKind::Png
    } else if data.starts_with(&[0xFF, 0xD8]) {
        ImageKind::Jpeg
    } else if data.starts_with(b"GIF8") {
        ImageKind::Gif
    } else {
        ImageKind::Other
    }
}

fn read_dimensions(data: &[u8]) -> Result<(u32, u32), String> {
    if data.len() < 4 {
        return Err("Image data too short".to_string());
    }
    image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("Failed to detect image format: {}", e))?
        .into_dimensions()
        .map_err(|e| format!("Failed to read image header: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::new(width, height);
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), width, height, image::ColorType::Rgba8)
            .unwrap();
        buf
    }

    #[test]
    fn test_detect_kind() {
        assert_eq!(detect_kind(&[0xFF, 0xD8, 0xFF, 0xE0]), ImageKind::Jpeg);
        assert_eq!(detect_kind(&[0x89, 0x50, 0x4E, 0x47]), ImageKind::Png);
        assert_eq!(detect_kind(b"GIF89a"), ImageKind::Gif);
        assert_eq!(detect_kind(&[0x00, 0x01]), ImageKind::Other);
    }

    #[test]
    fn test_invalid_data_uri() {
        assert!(ImageLoader::new().dimensions("data:image/png;base64").is_err());
    }

    #[test]
    fn test_too_short_data() {
        assert!(read_dimensions(&[0x00, 0x01]).is_err());
    }

    #[test]
    fn test_remote_urls_are_not_fetched() {
        let err = ImageLoader::new()
            .dimensions("https://example.com/a.png")
            .unwrap_err();
        assert!(err.contains("not fetched"));
    }

    #[test]
    fn test_missing_file() {
        assert!(ImageLoader::new().dimensions("definitely-missing.png").is_err());
    }

    #[test]
    fn test_base64_data_uri_dimensions() {
        use base64::Engine;
        let b64 = base64::engine::general_purpose::STANDARD.encode(png_bytes(3, 2));
        let data_uri = format!("data:image/png;base64,{}", b64);

        let loaded = ImageLoader::new().load(&data_uri).unwrap();
        assert_eq!((loaded.width_px, loaded.height_px), (3, 2));
        assert_eq!(loaded.kind, ImageKind::Png);
    }

    #[test]
    fn test_relative_path_uses_base_dir() {
        let dir = std::env::temp_dir().join("folio-image-loader-test");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("pic.png"), png_bytes(4, 5)).unwrap();

        let loader = ImageLoader::with_base_dir(&dir);
        assert_eq!(loader.dimensions("pic.png").unwrap(), (4, 5));
    }
}

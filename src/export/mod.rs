//! # Export Bridge
//!
//! Two ways out of the system:
//!
//! - **PDF** wraps the original HTML in a print document and hands it to a
//!   [`PrintEngine`]. The print engine paginates; the pagination engine is
//!   not involved. Only the base stylesheet is shared.
//! - **DOCX / PPTX** parse the HTML into blocks and map each block's layout
//!   and inline runs onto format-native structures, which a
//!   [`PackageWriter`] turns into the final file. [`OpcWriter`] zips them
//!   into real `.docx` / `.pptx` packages.
//!
//! Either the whole payload is produced or an [`FolioError::Export`] is
//! returned; partial output never escapes.

pub mod docx;
pub mod package;
pub mod pptx;
pub mod print;

use std::fmt;
use std::str::FromStr;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

pub use docx::DocxBody;
pub use package::OpcWriter;
pub use pptx::SlideDeck;

use crate::error::{FolioError, Result};
use crate::image_loader::ImageLoader;
use crate::model::PageConfig;
use crate::parser::{BlockParser, ListPolicy};
use crate::style::StyleResolver;

/// Fixed px to native-unit factors (96 DPI).
pub mod units {
    /// Twentieths of a point.
    pub const TWIPS_PER_PX: f64 = 15.0;
    /// Font sizes in WordprocessingML.
    pub const HALF_POINTS_PER_PX: f64 = 1.5;
    /// Border widths in WordprocessingML.
    pub const EIGHTH_POINTS_PER_PX: f64 = 6.0;
    /// DrawingML extents.
    pub const EMU_PER_PX: f64 = 9525.0;
    /// Font sizes in DrawingML.
    pub const CENTIPOINTS_PER_PX: f64 = 75.0;

    pub fn twips(px: f64) -> i64 {
        (px * TWIPS_PER_PX).round() as i64
    }

    pub fn half_points(px: f64) -> u32 {
        (px * HALF_POINTS_PER_PX).round().max(1.0) as u32
    }

    pub fn eighth_points(px: f64) -> u32 {
        (px * EIGHTH_POINTS_PER_PX).round() as u32
    }

    pub fn emu(px: f64) -> i64 {
        (px * EMU_PER_PX).round() as i64
    }

    pub fn centipoints(px: f64) -> u32 {
        (px * CENTIPOINTS_PER_PX).round().max(100.0) as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Docx,
    Pptx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Pptx => "pptx",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "pptx" => Ok(Self::Pptx),
            other => Err(FolioError::Export(format!("Unknown export format '{}'", other))),
        }
    }
}

/// Renders a print document to PDF bytes.
pub trait PrintEngine {
    fn print_to_pdf(&self, document_html: &str, page: &PageConfig) -> Result<Vec<u8>>;
}

/// Packages format-native parts into a file.
pub trait PackageWriter {
    fn write_docx(&self, title: &str, body: &DocxBody, document_xml: &str) -> Result<Vec<u8>>;
    fn write_pptx(&self, title: &str, deck: &SlideDeck, slides_xml: &[String]) -> Result<Vec<u8>>;
}

pub struct Exporter<'a> {
    resolver: &'a StyleResolver,
    page: PageConfig,
    print: &'a dyn PrintEngine,
    packages: &'a dyn PackageWriter,
    images: ImageLoader,
}

impl<'a> Exporter<'a> {
    pub fn new(
        resolver: &'a StyleResolver,
        page: PageConfig,
        print: &'a dyn PrintEngine,
        packages: &'a dyn PackageWriter,
    ) -> Self {
        Self {
            resolver,
            page,
            print,
            packages,
            images: ImageLoader::new(),
        }
    }

    pub fn with_image_loader(mut self, images: ImageLoader) -> Self {
        self.images = images;
        self
    }

    pub fn export_as(&self, format: ExportFormat, title: &str, html: &str) -> Result<Vec<u8>> {
        let payload = self.build(format, title, html).map_err(|e| match e {
            FolioError::Export(_) => e,
            other => FolioError::Export(format!("{} export failed: {}", format, other)),
        })?;
        if payload.is_empty() {
            return Err(FolioError::Export(format!(
                "{} export produced an empty payload",
                format
            )));
        }
        log::info!("exported '{}' as {} ({} bytes)", title, format, payload.len());
        Ok(payload)
    }

    fn build(&self, format: ExportFormat, title: &str, html: &str) -> Result<Vec<u8>> {
        match format {
            ExportFormat::Pdf => {
                let document = print::print_document(
                    title,
                    html,
                    self.resolver.stylesheet().source(),
                    &self.page,
                );
                self.print.print_to_pdf(&document, &self.page)
            }
            ExportFormat::Docx => {
                let blocks = self.parser(ListPolicy::WholeList).parse(html);
                let body = DocxBody::from_blocks(&blocks, &self.page);
                let xml = body.to_document_xml()?;
                self.packages.write_docx(title, &body, &xml)
            }
            ExportFormat::Pptx => {
                let blocks = self.parser(ListPolicy::PerItem).parse(html);
                let deck = SlideDeck::from_blocks(title, &blocks);
                let slides = deck.slides_xml()?;
                self.packages.write_pptx(title, &deck, &slides)
            }
        }
    }

    fn parser(&self, policy: ListPolicy) -> BlockParser<'a> {
        BlockParser::new(self.resolver, self.page.content_width)
            .with_policy(policy)
            .with_image_loader(self.images.clone())
    }
}

/// Thin event writer over quick-xml that reports failures as export errors.
pub(crate) struct XmlOut {
    writer: Writer<Vec<u8>>,
}

fn xml_error(e: impl fmt::Display) -> FolioError {
    FolioError::Export(format!("XML write error: {}", e))
}

impl XmlOut {
    pub(crate) fn new() -> Result<Self> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(xml_error)?;
        Ok(Self { writer })
    }

    pub(crate) fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Start(elem)).map_err(xml_error)
    }

    pub(crate) fn end(&mut self, name: &str) -> Result<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_error)
    }

    pub(crate) fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Empty(elem)).map_err(xml_error)
    }

    pub(crate) fn text(&mut self, text: &str) -> Result<()> {
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_error)
    }

    /// `<name attrs>text</name>`
    pub(crate) fn text_element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
        self.start(name, attrs)?;
        self.text(text)?;
        self.end(name)
    }

    pub(crate) fn finish(self) -> Result<String> {
        String::from_utf8(self.writer.into_inner()).map_err(xml_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        printed: RefCell<Option<String>>,
        docx: RefCell<Option<String>>,
        slides: RefCell<usize>,
        empty: bool,
    }

    impl PrintEngine for Recorder {
        fn print_to_pdf(&self, document_html: &str, _page: &PageConfig) -> Result<Vec<u8>> {
            *self.printed.borrow_mut() = Some(document_html.to_string());
            Ok(if self.empty { Vec::new() } else { b"%PDF-1.7".to_vec() })
        }
    }

    impl PackageWriter for Recorder {
        fn write_docx(&self, _title: &str, _body: &DocxBody, document_xml: &str) -> Result<Vec<u8>> {
            *self.docx.borrow_mut() = Some(document_xml.to_string());
            Ok(b"PK".to_vec())
        }

        fn write_pptx(&self, _title: &str, _deck: &SlideDeck, slides_xml: &[String]) -> Result<Vec<u8>> {
            *self.slides.borrow_mut() = slides_xml.len();
            Err(FolioError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")))
        }
    }

    fn export(recorder: &Recorder, format: ExportFormat, html: &str) -> Result<Vec<u8>> {
        let resolver = StyleResolver::new(crate::style::Stylesheet::parse("p { color: #123456 }"));
        Exporter::new(&resolver, PageConfig::a4(), recorder, recorder).export_as(format, "Notes", html)
    }

    #[test]
    fn pdf_goes_through_print_document() {
        let recorder = Recorder::default();
        let bytes = export(&recorder, ExportFormat::Pdf, "<p>hello</p>").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        let doc = recorder.printed.borrow().clone().unwrap();
        assert!(doc.contains("<p>hello</p>"));
        assert!(doc.contains("p { color: #123456 }"));
    }

    #[test]
    fn empty_payload_is_an_error() {
        let recorder = Recorder {
            empty: true,
            ..Recorder::default()
        };
        let err = export(&recorder, ExportFormat::Pdf, "<p>x</p>").unwrap_err();
        assert!(matches!(err, FolioError::Export(_)));
    }

    #[test]
    fn docx_body_is_wordprocessingml() {
        let recorder = Recorder::default();
        export(&recorder, ExportFormat::Docx, "<h1>T</h1><p>body</p>").unwrap();
        let xml = recorder.docx.borrow().clone().unwrap();
        assert!(xml.contains("<w:document"));
        assert!(xml.contains("<w:t xml:space=\"preserve\">body</w:t>"));
    }

    #[test]
    fn writer_failures_become_export_errors() {
        let recorder = Recorder::default();
        let err = export(&recorder, ExportFormat::Pptx, "<ul><li>a</li><li>b</li></ul>").unwrap_err();
        assert!(matches!(err, FolioError::Export(ref m) if m.contains("disk full")));
        assert_eq!(*recorder.slides.borrow(), 1);
    }

    #[test]
    fn formats_parse() {
        assert_eq!("DOCX".parse::<ExportFormat>().unwrap(), ExportFormat::Docx);
        assert!("odt".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn unit_factors() {
        assert_eq!(units::twips(10.0), 150);
        assert_eq!(units::half_points(16.0), 24);
        assert_eq!(units::emu(1.0), 9525);
        assert_eq!(units::centipoints(16.0), 1200);
    }
}

//! OPC packaging: `.docx` and `.pptx` files as ZIP archives.
//!
//! An Office file is a ZIP of XML parts tied together by relationship
//! parts (`_rels/*.rels`) and typed by `[Content_Types].xml`. [`OpcWriter`]
//! collects the parts in memory, then writes the content-type map first
//! and every part after it.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::pptx::SlideItem;
use super::{DocxBody, PackageWriter, SlideDeck, XmlOut};
use crate::error::{FolioError, Result};
use crate::image_loader::{ImageLoader, LoadedImage};

const CT_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const P_NS: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const RELS_TYPE: &str = "application/vnd.openxmlformats-package.relationships+xml";
const CORE_TYPE: &str = "application/vnd.openxmlformats-package.core-properties+xml";
const DOCUMENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
const STYLES_TYPE: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
const PRESENTATION_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const SLIDE_TYPE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
const MASTER_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
const LAYOUT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
const THEME_TYPE: &str = "application/vnd.openxmlformats-officedocument.theme+xml";

const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const CORE_REL: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";

fn rel(kind: &str) -> String {
    format!("{}/{}", REL_BASE, kind)
}

/// Writes DOCX and PPTX packages. Images are read through the loader and
/// stored under `media/`; one that cannot be read fails the whole package.
#[derive(Debug, Clone, Default)]
pub struct OpcWriter {
    images: ImageLoader,
}

impl OpcWriter {
    pub fn new(images: ImageLoader) -> Self {
        Self { images }
    }

    fn load(&self, src: &str) -> Result<LoadedImage> {
        self.images
            .load(src)
            .map_err(|e| FolioError::Export(format!("cannot embed image '{}': {}", src, e)))
    }
}

impl PackageWriter for OpcWriter {
    fn write_docx(&self, title: &str, body: &DocxBody, document_xml: &str) -> Result<Vec<u8>> {
        let mut pkg = Package::default();
        let mut doc_rels = vec![(
            "rIdStyles".to_string(),
            rel("styles"),
            "styles.xml".to_string(),
        )];

        for img in body.media() {
            let loaded = self.load(&img.src)?;
            let name = format!("image{}.{}", img.id, loaded.kind.extension());
            doc_rels.push((img.rel_id.clone(), rel("image"), format!("media/{}", name)));
            pkg.binary(&format!("word/media/{}", name), &loaded);
        }

        pkg.part("_rels/.rels", RELS_TYPE, package_relationships("word/document.xml")?);
        pkg.part("word/document.xml", DOCUMENT_TYPE, document_xml.to_string());
        pkg.part("word/styles.xml", STYLES_TYPE, docx_styles()?);
        pkg.part("word/_rels/document.xml.rels", RELS_TYPE, owned_relationships(&doc_rels)?);
        pkg.part("docProps/core.xml", CORE_TYPE, core_properties(title)?);

        log::debug!("packaged docx with {} part(s)", pkg.parts.len());
        pkg.finish()
    }

    fn write_pptx(&self, title: &str, deck: &SlideDeck, slides_xml: &[String]) -> Result<Vec<u8>> {
        if slides_xml.len() != deck.slides.len() {
            return Err(FolioError::Export(format!(
                "{} slide part(s) for {} slide(s)",
                slides_xml.len(),
                deck.slides.len()
            )));
        }
        let mut pkg = Package::default();

        let mut presentation_rels = vec![
            ("rIdMaster".to_string(), rel("slideMaster"), "slideMasters/slideMaster1.xml".to_string()),
            ("rIdTheme".to_string(), rel("theme"), "theme/theme1.xml".to_string()),
        ];

        for (i, (slide, xml)) in deck.slides.iter().zip(slides_xml).enumerate() {
            let n = i + 1;
            let mut slide_rels = vec![(
                "rIdLayout".to_string(),
                rel("slideLayout"),
                "../slideLayouts/slideLayout1.xml".to_string(),
            )];
            let pictures = slide.items.iter().filter_map(|item| match item {
                SlideItem::Picture { src, .. } => Some(src),
                _ => None,
            });
            for (p, src) in pictures.enumerate() {
                let loaded = self.load(src)?;
                let name = format!("slide{}-image{}.{}", n, p + 1, loaded.kind.extension());
                slide_rels.push((format!("rIdImage{}", p + 1), rel("image"), format!("../media/{}", name)));
                pkg.binary(&format!("ppt/media/{}", name), &loaded);
            }

            pkg.part(&format!("ppt/slides/slide{}.xml", n), SLIDE_TYPE, xml.clone());
            pkg.part(
                &format!("ppt/slides/_rels/slide{}.xml.rels", n),
                RELS_TYPE,
                owned_relationships(&slide_rels)?,
            );
            presentation_rels.push((format!("rIdSlide{}", n), rel("slide"), format!("slides/slide{}.xml", n)));
        }

        pkg.part("_rels/.rels", RELS_TYPE, package_relationships("ppt/presentation.xml")?);
        pkg.part("ppt/presentation.xml", PRESENTATION_TYPE, presentation(deck)?);
        pkg.part(
            "ppt/_rels/presentation.xml.rels",
            RELS_TYPE,
            owned_relationships(&presentation_rels)?,
        );
        pkg.part("ppt/slideMasters/slideMaster1.xml", MASTER_TYPE, slide_master()?);
        pkg.part(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            RELS_TYPE,
            owned_relationships(&[
                ("rIdLayout1".to_string(), rel("slideLayout"), "../slideLayouts/slideLayout1.xml".to_string()),
                ("rIdTheme".to_string(), rel("theme"), "../theme/theme1.xml".to_string()),
            ])?,
        );
        pkg.part("ppt/slideLayouts/slideLayout1.xml", LAYOUT_TYPE, slide_layout()?);
        pkg.part(
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            RELS_TYPE,
            owned_relationships(&[(
                "rIdMaster".to_string(),
                rel("slideMaster"),
                "../slideMasters/slideMaster1.xml".to_string(),
            )])?,
        );
        pkg.part("ppt/theme/theme1.xml", THEME_TYPE, theme()?);
        pkg.part("docProps/core.xml", CORE_TYPE, core_properties(title)?);

        log::debug!(
            "packaged pptx with {} slide(s) and {} part(s)",
            deck.slides.len(),
            pkg.parts.len()
        );
        pkg.finish()
    }
}

// ─── Archive ────────────────────────────────────────────────────

struct Part {
    name: String,
    content_type: Option<&'static str>,
    data: Vec<u8>,
}

/// Parts waiting to be zipped. XML parts get a content-type override;
/// binary parts are typed by extension.
#[derive(Default)]
struct Package {
    parts: Vec<Part>,
    defaults: Vec<(&'static str, &'static str)>,
}

impl Package {
    fn part(&mut self, name: &str, content_type: &'static str, xml: String) {
        self.parts.push(Part {
            name: name.to_string(),
            content_type: Some(content_type),
            data: xml.into_bytes(),
        });
    }

    fn binary(&mut self, name: &str, image: &LoadedImage) {
        let default = (image.kind.extension(), image.kind.mime_type());
        if !self.defaults.contains(&default) {
            self.defaults.push(default);
        }
        self.parts.push(Part {
            name: name.to_string(),
            content_type: None,
            data: image.data.clone(),
        });
    }

    fn content_types(&self) -> Result<String> {
        let mut out = XmlOut::new()?;
        out.start("Types", &[("xmlns", CT_NS)])?;
        out.empty("Default", &[("Extension", "rels"), ("ContentType", RELS_TYPE)])?;
        out.empty("Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;
        for &(extension, mime) in &self.defaults {
            out.empty("Default", &[("Extension", extension), ("ContentType", mime)])?;
        }
        for part in &self.parts {
            if let Some(content_type) = part.content_type {
                if part.name.ends_with(".rels") {
                    continue;
                }
                let name = format!("/{}", part.name);
                out.empty("Override", &[("PartName", &name), ("ContentType", content_type)])?;
            }
        }
        out.end("Types")?;
        out.finish()
    }

    fn finish(self) -> Result<Vec<u8>> {
        let content_types = self.content_types()?;
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let opts = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", opts).map_err(zip_error)?;
        zip.write_all(content_types.as_bytes())?;
        for part in &self.parts {
            zip.start_file(part.name.as_str(), opts).map_err(zip_error)?;
            zip.write_all(&part.data)?;
        }
        Ok(zip.finish().map_err(zip_error)?.into_inner())
    }
}

fn zip_error(e: zip::result::ZipError) -> FolioError {
    FolioError::Export(format!("ZIP write error: {}", e))
}

// ─── Shared parts ───────────────────────────────────────────────

fn relationships(rels: &[(&str, &str, &str)]) -> Result<String> {
    let mut out = XmlOut::new()?;
    out.start("Relationships", &[("xmlns", RELS_NS)])?;
    for (id, kind, target) in rels {
        out.empty("Relationship", &[("Id", id), ("Type", kind), ("Target", target)])?;
    }
    out.end("Relationships")?;
    out.finish()
}

/// `_rels/.rels`: the main part and the core properties.
fn package_relationships(main_part: &str) -> Result<String> {
    let office = rel("officeDocument");
    relationships(&[
        ("rId1", office.as_str(), main_part),
        ("rId2", CORE_REL, "docProps/core.xml"),
    ])
}

fn owned_relationships(rels: &[(String, String, String)]) -> Result<String> {
    let borrowed: Vec<(&str, &str, &str)> = rels
        .iter()
        .map(|(id, kind, target)| (id.as_str(), kind.as_str(), target.as_str()))
        .collect();
    relationships(&borrowed)
}

fn core_properties(title: &str) -> Result<String> {
    let mut out = XmlOut::new()?;
    out.start(
        "cp:coreProperties",
        &[
            (
                "xmlns:cp",
                "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
            ),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
        ],
    )?;
    out.text_element("dc:title", &[], title)?;
    out.end("cp:coreProperties")?;
    out.finish()
}

// ─── WordprocessingML ───────────────────────────────────────────

/// `Normal` plus `Heading1`..`Heading6`, which carry the outline level.
/// Run sizes and weights are written on the runs themselves.
fn docx_styles() -> Result<String> {
    let mut out = XmlOut::new()?;
    out.start("w:styles", &[("xmlns:w", W_NS)])?;

    out.start("w:style", &[("w:type", "paragraph"), ("w:default", "1"), ("w:styleId", "Normal")])?;
    out.empty("w:name", &[("w:val", "Normal")])?;
    out.empty("w:qFormat", &[])?;
    out.end("w:style")?;

    for level in 1..=6 {
        let id = format!("Heading{}", level);
        let name = format!("heading {}", level);
        let outline = (level - 1).to_string();
        out.start("w:style", &[("w:type", "paragraph"), ("w:styleId", &id)])?;
        out.empty("w:name", &[("w:val", &name)])?;
        out.empty("w:basedOn", &[("w:val", "Normal")])?;
        out.empty("w:next", &[("w:val", "Normal")])?;
        out.empty("w:qFormat", &[])?;
        out.start("w:pPr", &[])?;
        out.empty("w:keepNext", &[])?;
        out.empty("w:outlineLvl", &[("w:val", &outline)])?;
        out.end("w:pPr")?;
        out.start("w:rPr", &[])?;
        out.empty("w:b", &[])?;
        out.end("w:rPr")?;
        out.end("w:style")?;
    }

    out.end("w:styles")?;
    out.finish()
}

// ─── PresentationML ─────────────────────────────────────────────

fn presentation(deck: &SlideDeck) -> Result<String> {
    let mut out = XmlOut::new()?;
    out.start("p:presentation", &[("xmlns:a", A_NS), ("xmlns:r", R_NS), ("xmlns:p", P_NS)])?;
    out.start("p:sldMasterIdLst", &[])?;
    out.empty("p:sldMasterId", &[("id", "2147483648"), ("r:id", "rIdMaster")])?;
    out.end("p:sldMasterIdLst")?;
    out.start("p:sldIdLst", &[])?;
    for i in 0..deck.slides.len() {
        let id = (256 + i).to_string();
        let rel_id = format!("rIdSlide{}", i + 1);
        out.empty("p:sldId", &[("id", &id), ("r:id", &rel_id)])?;
    }
    out.end("p:sldIdLst")?;
    out.empty(
        "p:sldSz",
        &[("cx", &deck.width_emu.to_string()), ("cy", &deck.height_emu.to_string())],
    )?;
    out.empty("p:notesSz", &[("cx", "6858000"), ("cy", "9144000")])?;
    out.end("p:presentation")?;
    out.finish()
}

fn empty_shape_tree(out: &mut XmlOut, name: Option<&str>) -> Result<()> {
    match name {
        Some(name) => out.start("p:cSld", &[("name", name)])?,
        None => out.start("p:cSld", &[])?,
    }
    out.start("p:spTree", &[])?;
    out.start("p:nvGrpSpPr", &[])?;
    out.empty("p:cNvPr", &[("id", "1"), ("name", "")])?;
    out.empty("p:cNvGrpSpPr", &[])?;
    out.empty("p:nvPr", &[])?;
    out.end("p:nvGrpSpPr")?;
    out.empty("p:grpSpPr", &[])?;
    out.end("p:spTree")?;
    out.end("p:cSld")
}

fn slide_master() -> Result<String> {
    let mut out = XmlOut::new()?;
    out.start("p:sldMaster", &[("xmlns:a", A_NS), ("xmlns:r", R_NS), ("xmlns:p", P_NS)])?;
    empty_shape_tree(&mut out, None)?;
    out.empty(
        "p:clrMap",
        &[
            ("bg1", "lt1"),
            ("tx1", "dk1"),
            ("bg2", "lt2"),
            ("tx2", "dk2"),
            ("accent1", "accent1"),
            ("accent2", "accent2"),
            ("accent3", "accent3"),
            ("accent4", "accent4"),
            ("accent5", "accent5"),
            ("accent6", "accent6"),
            ("hlink", "hlink"),
            ("folHlink", "folHlink"),
        ],
    )?;
    out.start("p:sldLayoutIdLst", &[])?;
    out.empty("p:sldLayoutId", &[("id", "2147483649"), ("r:id", "rIdLayout1")])?;
    out.end("p:sldLayoutIdLst")?;
    out.end("p:sldMaster")?;
    out.finish()
}

fn slide_layout() -> Result<String> {
    let mut out = XmlOut::new()?;
    out.start(
        "p:sldLayout",
        &[("xmlns:a", A_NS), ("xmlns:r", R_NS), ("xmlns:p", P_NS), ("type", "blank"), ("preserve", "1")],
    )?;
    empty_shape_tree(&mut out, Some("Blank"))?;
    out.start("p:clrMapOvr", &[])?;
    out.empty("a:masterClrMapping", &[])?;
    out.end("p:clrMapOvr")?;
    out.end("p:sldLayout")?;
    out.finish()
}

const THEME_COLORS: [(&str, &str); 12] = [
    ("a:dk1", "000000"),
    ("a:lt1", "FFFFFF"),
    ("a:dk2", "1F2937"),
    ("a:lt2", "F3F4F6"),
    ("a:accent1", "2563EB"),
    ("a:accent2", "DC2626"),
    ("a:accent3", "16A34A"),
    ("a:accent4", "CA8A04"),
    ("a:accent5", "9333EA"),
    ("a:accent6", "0891B2"),
    ("a:hlink", "2563EB"),
    ("a:folHlink", "7C3AED"),
];

fn theme() -> Result<String> {
    let mut out = XmlOut::new()?;
    out.start("a:theme", &[("xmlns:a", A_NS), ("name", "Folio")])?;
    out.start("a:themeElements", &[])?;

    out.start("a:clrScheme", &[("name", "Folio")])?;
    for (slot, hex) in THEME_COLORS {
        out.start(slot, &[])?;
        out.empty("a:srgbClr", &[("val", hex)])?;
        out.end(slot)?;
    }
    out.end("a:clrScheme")?;

    out.start("a:fontScheme", &[("name", "Folio")])?;
    for slot in ["a:majorFont", "a:minorFont"] {
        out.start(slot, &[])?;
        out.empty("a:latin", &[("typeface", "Helvetica")])?;
        out.empty("a:ea", &[("typeface", "")])?;
        out.empty("a:cs", &[("typeface", "")])?;
        out.end(slot)?;
    }
    out.end("a:fontScheme")?;

    // The format scheme needs three entries in each list.
    out.start("a:fmtScheme", &[("name", "Folio")])?;
    for list in ["a:fillStyleLst", "a:bgFillStyleLst"] {
        out.start(list, &[])?;
        for _ in 0..3 {
            placeholder_fill(&mut out)?;
        }
        out.end(list)?;
    }
    out.start("a:lnStyleLst", &[])?;
    for _ in 0..3 {
        out.start("a:ln", &[("w", "6350")])?;
        placeholder_fill(&mut out)?;
        out.end("a:ln")?;
    }
    out.end("a:lnStyleLst")?;
    out.start("a:effectStyleLst", &[])?;
    for _ in 0..3 {
        out.start("a:effectStyle", &[])?;
        out.empty("a:effectLst", &[])?;
        out.end("a:effectStyle")?;
    }
    out.end("a:effectStyleLst")?;
    out.end("a:fmtScheme")?;

    out.end("a:themeElements")?;
    out.end("a:theme")?;
    out.finish()
}

fn placeholder_fill(out: &mut XmlOut) -> Result<()> {
    out.start("a:solidFill", &[])?;
    out.empty("a:schemeClr", &[("val", "phClr")])?;
    out.end("a:solidFill")
}

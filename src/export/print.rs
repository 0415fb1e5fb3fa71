//! Print document for PDF export.
//!
//! The print engine does its own pagination, so instead of pages this
//! carries page geometry and break-avoidance rules as CSS.

use crate::dom::escape_text;
use crate::model::PageConfig;

/// Break rules handed to the print engine.
const PRINT_CSS: &str = r#"
html, body { margin: 0; padding: 0; }
li, img, figure, tr, pre, blockquote { break-inside: avoid; page-break-inside: avoid; }
table { break-inside: auto; }
thead { display: table-header-group; }
h1, h2, h3 { break-after: avoid; page-break-after: avoid; }
p { orphans: 3; widows: 3; }
img { max-width: 100%; }
"#;

/// A standalone HTML document for the print engine.
pub fn print_document(title: &str, html: &str, base_css: &str, page: &PageConfig) -> String {
    let margin = page.margin();
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>\n@page {{ size: {w}px {h}px; margin: {mt}px {mr}px {mb}px {ml}px; }}\n{base}\n{print}</style>\n\
         </head>\n<body>\n<div class=\"page-content\">\n{html}\n</div>\n</body>\n</html>\n",
        title = escape_text(title),
        w = page.page_width,
        h = page.page_height,
        mt = margin.top,
        mr = margin.right,
        mb = margin.bottom,
        ml = margin.left,
        base = base_css,
        print = PRINT_CSS,
        html = html,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_page_geometry_and_content() {
        let doc = print_document("A <b>", "<p>x</p>", "body { color: red }", &PageConfig::a4());
        assert!(doc.contains("@page { size: 794px 1123px; margin: 85.5px 57px 85.5px 57px; }"));
        assert!(doc.contains("<title>A &lt;b&gt;</title>"));
        assert!(doc.contains("body { color: red }"));
        assert!(doc.contains("<p>x</p>"));
        assert!(doc.contains("orphans: 3"));
    }
}

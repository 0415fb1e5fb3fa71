//! Stylesheet parsing, selector matching and the cascade.
//!
//! Supported selectors: type, `.class`, `#id`, `*`, compounds of those, and
//! the descendant combinator. At-rules are skipped whole. Anything the parser
//! does not understand is dropped without failing the sheet.

use super::{ResolvedStyle, Style};
use crate::dom::Element;

/// Defaults every page starts from, below the base stylesheet.
const USER_AGENT_CSS: &str = r#"
p, div, section, article, header, footer, main, figure, figcaption, blockquote, pre,
h1, h2, h3, h4, h5, h6, hr, ul, ol, dl, dt, dd { display: block; }
li { display: list-item; }
table { display: table; }
thead, tbody, tfoot { display: table-row-group; }
tr { display: table-row; }
td, th { display: table-cell; padding: 1px; }
th { font-weight: bold; text-align: center; }
h1 { font-size: 2em; font-weight: bold; margin: 0.67em 0; }
h2 { font-size: 1.5em; font-weight: bold; margin: 0.83em 0; }
h3 { font-size: 1.17em; font-weight: bold; margin: 1em 0; }
h4 { font-weight: bold; margin: 1.33em 0; }
h5 { font-size: 0.83em; font-weight: bold; margin: 1.67em 0; }
h6 { font-size: 0.67em; font-weight: bold; margin: 2.33em 0; }
p, blockquote, figure, pre, ul, ol, dl { margin: 1em 0; }
blockquote, figure { margin-left: 40px; margin-right: 40px; }
ul, ol { padding-left: 40px; }
li ul, li ol { margin: 0; }
hr { border: 1px solid; margin: 0.5em 0; }
b, strong { font-weight: bold; }
i, em, cite, var { font-style: italic; }
u, ins { text-decoration: underline; }
s, del, strike { text-decoration: line-through; }
pre, code, kbd, samp, tt { font-family: monospace; }
pre { white-space: pre; }
small { font-size: 0.83em; }
mark { background-color: yellow; }
head, script, style, template, title { display: none; }
"#;

#[derive(Debug, Clone, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    fn parse(text: &str) -> Option<Self> {
        let mut compound = Compound {
            tag: None,
            id: None,
            classes: Vec::new(),
        };
        let mut rest = text;
        let head_len = rest.find(['.', '#']).unwrap_or(rest.len());
        let head = &rest[..head_len];
        if !head.is_empty() && head != "*" {
            if !head.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return None;
            }
            compound.tag = Some(head.to_ascii_lowercase());
        }
        rest = &rest[head_len..];
        while !rest.is_empty() {
            let marker = rest.as_bytes()[0];
            let body = &rest[1..];
            let len = body.find(['.', '#']).unwrap_or(body.len());
            let name = &body[..len];
            if name.is_empty()
                || !name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                return None;
            }
            if marker == b'.' {
                compound.classes.push(name.to_string());
            } else {
                compound.id = Some(name.to_string());
            }
            rest = &body[len..];
        }
        Some(compound)
    }

    fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if &element.tag != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|c| element.has_class(c))
    }
}

/// A descendant-combinator chain, subject last.
#[derive(Debug, Clone, PartialEq)]
struct Selector {
    parts: Vec<Compound>,
}

impl Selector {
    fn parse(text: &str) -> Option<Self> {
        let parts = text
            .split_whitespace()
            .map(Compound::parse)
            .collect::<Option<Vec<_>>>()?;
        if parts.is_empty() {
            return None;
        }
        Some(Selector { parts })
    }

    /// (ids, classes, types)
    fn specificity(&self) -> (u32, u32, u32) {
        self.parts.iter().fold((0, 0, 0), |(a, b, c), part| {
            (
                a + part.id.is_some() as u32,
                b + part.classes.len() as u32,
                c + part.tag.is_some() as u32,
            )
        })
    }

    /// `ancestors` is ordered outermost first.
    fn matches(&self, element: &Element, ancestors: &[&Element]) -> bool {
        let Some((subject, rest)) = self.parts.split_last() else {
            return false;
        };
        if !subject.matches(element) {
            return false;
        }
        let mut remaining = rest.iter().rev();
        let mut wanted = remaining.next();
        for ancestor in ancestors.iter().rev() {
            match wanted {
                Some(part) if part.matches(ancestor) => wanted = remaining.next(),
                Some(_) => {}
                None => break,
            }
        }
        wanted.is_none()
    }
}

#[derive(Debug, Clone)]
struct Rule {
    selector: Selector,
    specificity: (u32, u32, u32),
    order: usize,
    declarations: Vec<(String, String)>,
}

/// A parsed stylesheet.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    rules: Vec<Rule>,
    source: String,
}

impl Stylesheet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse CSS text. Never fails; unparseable rules are skipped.
    pub fn parse(css: &str) -> Self {
        let text = strip_comments(css);
        let mut rules = Vec::new();
        let mut rest = text.as_str();

        while let Some(open) = rest.find('{') {
            let prelude = rest[..open].trim();
            let Some(close) = matching_brace(rest, open) else {
                break;
            };
            let body = &rest[open + 1..close];
            rest = &rest[close + 1..];

            if prelude.starts_with('@') {
                continue;
            }
            let declarations = parse_declarations(body);
            for selector_text in prelude.split(',') {
                if let Some(selector) = Selector::parse(selector_text.trim()) {
                    let order = rules.len();
                    rules.push(Rule {
                        specificity: selector.specificity(),
                        selector,
                        order,
                        declarations: declarations.clone(),
                    });
                }
            }
        }

        Self {
            rules,
            source: css.to_string(),
        }
    }

    /// The original CSS text, for embedding into preview and print output.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Declarations of every matching rule in cascade order (lowest
    /// precedence first).
    fn matching_declarations<'a>(
        &'a self,
        element: &Element,
        ancestors: &[&Element],
    ) -> Vec<&'a (String, String)> {
        let mut matched: Vec<&Rule> = self
            .rules
            .iter()
            .filter(|r| r.selector.matches(element, ancestors))
            .collect();
        matched.sort_by_key(|r| (r.specificity, r.order));
        matched.iter().flat_map(|r| r.declarations.iter()).collect()
    }
}

/// Cascades the user-agent defaults, the base stylesheet and inline styles.
#[derive(Debug, Clone)]
pub struct StyleResolver {
    user_agent: Stylesheet,
    author: Stylesheet,
}

impl Default for StyleResolver {
    fn default() -> Self {
        Self::new(Stylesheet::empty())
    }
}

impl StyleResolver {
    pub fn new(author: Stylesheet) -> Self {
        Self {
            user_agent: Stylesheet::parse(USER_AGENT_CSS),
            author,
        }
    }

    pub fn stylesheet(&self) -> &Stylesheet {
        &self.author
    }

    /// Declared style of `element`. `ancestors` is ordered outermost first.
    pub fn cascade(&self, element: &Element, ancestors: &[&Element]) -> Style {
        let mut declarations: Vec<(&str, &str)> = Vec::new();
        for sheet in [&self.user_agent, &self.author] {
            declarations.extend(
                sheet
                    .matching_declarations(element, ancestors)
                    .into_iter()
                    .map(|(k, v)| (k.as_str(), v.as_str())),
            );
        }
        let inline = parse_declarations(element.attr("style").unwrap_or(""));
        declarations.extend(inline.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let mut style = Style::default();
        for (name, value) in declarations {
            style.apply(name, value);
        }
        style
    }

    /// Cascade and resolve in one step.
    pub fn resolve(
        &self,
        element: &Element,
        ancestors: &[&Element],
        parent: Option<&ResolvedStyle>,
        available_width: f64,
    ) -> ResolvedStyle {
        self.cascade(element, ancestors)
            .resolve(parent, available_width)
    }
}

/// Split a declaration block (`a: b; c: d`) into lowercase names and values.
pub fn parse_declarations(block: &str) -> Vec<(String, String)> {
    block
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            if name.is_empty() || value.is_empty() {
                None
            } else {
                Some((name, value.to_string()))
            }
        })
        .collect()
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in text[open..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

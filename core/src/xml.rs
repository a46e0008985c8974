//! XML codec for the band API wire format.
//!
//! # Design
//! Responses are read into a small owned element tree built from `quick-xml`
//! events, then queried by tag name. Decoding is deliberately lenient: a
//! missing or unparsable scalar takes a default instead of failing, an
//! unknown genre becomes `MusicGenre::default()`, and a partially present
//! label is normalized. Only a document that is not well-formed XML is an
//! error.
//!
//! Encoding writes fixed-order documents by hand and escapes every
//! interpolated text value.

use std::borrow::Cow;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ApiError;
use crate::types::{
    BandRequest, BandSearchRequest, Coordinates, Label, MusicBand, MusicGenre, Page, Pagination,
};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Deepest element nesting `parse_document` accepts. The tree is walked
/// recursively, so this bounds stack use.
pub const MAX_DEPTH: usize = 64;

/// Nested value objects whose children must not be mistaken for band fields.
const NESTED_VALUE_TAGS: [&str; 2] = ["coordinates", "label"];

// ---------------------------------------------------------------------------
// Element tree
// ---------------------------------------------------------------------------

/// An element with its concatenated text and child elements. Attributes are
/// not part of the wire format and are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    fn new(name: &[u8]) -> Self {
        Self {
            name: String::from_utf8_lossy(name).into_owned(),
            ..Self::default()
        }
    }

    /// First direct child with the given tag.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// First descendant (document order, excluding `self`) with the given tag.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.find_skipping(name, &[])
    }

    /// Like `find`, but does not descend into elements named in `skip`.
    pub fn find_skipping(&self, name: &str, skip: &[&str]) -> Option<&Element> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if skip.contains(&child.name.as_str()) {
                continue;
            }
            if let Some(found) = child.find_skipping(name, skip) {
                return Some(found);
            }
        }
        None
    }

    /// Trimmed text of the element, `None` if blank.
    pub fn non_blank_text(&self) -> Option<&str> {
        let text = self.text.trim();
        (!text.is_empty()).then_some(text)
    }

    fn collect_children_of<'a>(&'a self, selector: &ItemSelector, out: &mut Vec<&'a Element>) {
        if self.name == selector.parent {
            out.extend(self.children.iter().filter(|c| c.name == selector.item));
        }
        for child in &self.children {
            child.collect_children_of(selector, out);
        }
    }
}

/// Parse a whole document into a synthetic document node whose only child is
/// the root element.
pub fn parse_document(xml: &str) -> Result<Element, ApiError> {
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(ApiError::Parse(format!(
                        "elements nested deeper than {MAX_DEPTH}"
                    )));
                }
                stack.push(Element::new(e.local_name().as_ref()));
            }
            Event::Empty(e) => attach(&mut stack, &mut root, Element::new(e.local_name().as_ref()))?,
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ApiError::Parse("unexpected closing tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(|e| ApiError::Parse(e.to_string()))?;
                push_text(&mut stack, &text)?;
            }
            Event::CData(c) => {
                let raw = c.into_inner();
                push_text(&mut stack, &String::from_utf8_lossy(&raw))?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ApiError::Parse(format!("unclosed element <{}>", open.name)));
    }
    let root = root.ok_or_else(|| ApiError::Parse("document has no root element".to_string()))?;
    Ok(Element {
        children: vec![root],
        ..Element::default()
    })
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<(), ApiError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(ApiError::Parse(format!(
            "second root element <{}>",
            element.name
        )));
    }
    *root = Some(element);
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) -> Result<(), ApiError> {
    match stack.last_mut() {
        Some(top) => {
            top.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(ApiError::Parse("text outside of the root element".to_string())),
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Tag path identifying list items inside an envelope: `item` elements whose
/// direct parent is `parent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemSelector {
    pub parent: &'static str,
    pub item: &'static str,
}

/// `bands > band`, the shape produced by the paged endpoints.
pub const PRIMARY_ITEM_SELECTOR: ItemSelector = ItemSelector {
    parent: "bands",
    item: "band",
};

/// `bands > bands`, the shape some list endpoints still emit.
pub const LEGACY_ITEM_SELECTOR: ItemSelector = ItemSelector {
    parent: "bands",
    item: "bands",
};

/// Precedence order: the first selector that yields any item wins.
pub const ITEM_SELECTORS: [ItemSelector; 2] = [PRIMARY_ITEM_SELECTOR, LEGACY_ITEM_SELECTOR];

/// Decode a single band document.
pub fn parse_band(xml: &str) -> Result<MusicBand, ApiError> {
    let doc = parse_document(xml)?;
    Ok(parse_band_element(&doc))
}

/// Decode a band from an element that contains its fields as descendants.
pub fn parse_band_element(element: &Element) -> MusicBand {
    let field = |name: &str| element.find_skipping(name, &NESTED_VALUE_TAGS);

    let coordinates = field("coordinates")
        .map(|c| Coordinates {
            x: number(c.find("x")),
            y: number(c.find("y")),
        })
        .unwrap_or_default();

    let genre = field("genre")
        .or_else(|| field("musicGenre"))
        .map(|g| MusicGenre::from_tag(&g.text))
        .unwrap_or_default();

    MusicBand {
        id: number(field("id")),
        name: field("name").map(|n| n.text.clone()).unwrap_or_default(),
        coordinates,
        creation_date: field("creationDate")
            .map(|d| parse_timestamp(&d.text))
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        number_of_participants: number(field("numberOfParticipants")),
        singles_count: number(field("singlesCount")),
        albums_count: number(field("albumsCount")),
        genre,
        label: field("label").and_then(parse_label),
    }
}

fn parse_label(element: &Element) -> Option<Label> {
    let name = element.find("name").filter(|e| e.non_blank_text().is_some());
    let sales = element.find("sales").and_then(Element::non_blank_text);
    if name.is_none() && sales.is_none() {
        return None;
    }
    Some(Label {
        name: name.map(|e| e.text.clone()).unwrap_or_default(),
        sales: sales.and_then(|s| s.parse().ok()).unwrap_or_default(),
    })
}

/// Decode a paged list envelope.
pub fn parse_band_page(xml: &str) -> Result<Page<MusicBand>, ApiError> {
    let doc = parse_document(xml)?;

    let pagination = doc.find("pagination");
    let meta = |name: &str, default: i64| {
        pagination
            .and_then(|p| p.find(name))
            .and_then(|e| e.text.trim().parse().ok())
            .unwrap_or(default)
    };
    let pagination = Pagination {
        page: meta("page", 1),
        total_pages: meta("totalPages", 1),
        total_count: meta("totalCount", 0),
        size: meta("size", 10),
    };

    let items = select_items(&doc)
        .into_iter()
        .map(parse_band_element)
        .collect();

    Ok(Page { items, pagination })
}

/// Apply `ITEM_SELECTORS` in order and return the first non-empty match.
pub fn select_items(doc: &Element) -> Vec<&Element> {
    for selector in &ITEM_SELECTORS {
        let mut found = Vec::new();
        doc.collect_children_of(selector, &mut found);
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

/// Decode a `<count><value>n</value></count>` envelope.
pub fn parse_count(xml: &str) -> Result<i64, ApiError> {
    let doc = parse_document(xml)?;
    Ok(number(doc.find("value")))
}

/// Pull a human-readable message out of an error body: `message` first, then
/// `error`. Returns `None` for non-XML bodies or when neither is present.
pub fn extract_error_message(body: &str) -> Option<String> {
    let doc = parse_document(body).ok()?;
    let root = doc.children.first()?;
    ["message", "error"].into_iter().find_map(|tag| {
        root.child(tag)
            .or_else(|| doc.find(tag))
            .and_then(Element::non_blank_text)
            .map(str::to_string)
    })
}

fn number<T: FromStr + Default>(element: Option<&Element>) -> T {
    element
        .and_then(|e| e.text.trim().parse().ok())
        .unwrap_or_default()
}

/// Accepts RFC 3339, zone-less ISO date-times (treated as UTC) and bare
/// dates. Anything else is the Unix epoch.
fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.and_utc();
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|n| n.and_utc())
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a create/update payload.
pub fn band_request_to_xml(request: &BandRequest) -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str("<bandRequest>");
    push_element(&mut xml, "name", &request.name);
    xml.push_str("<coordinates>");
    push_element(&mut xml, "x", &request.coordinates.x.to_string());
    push_element(&mut xml, "y", &request.coordinates.y.to_string());
    xml.push_str("</coordinates>");
    push_element(
        &mut xml,
        "numberOfParticipants",
        &request.number_of_participants.to_string(),
    );
    push_element(&mut xml, "albumsCount", &request.albums_count.to_string());
    push_element(&mut xml, "singlesCount", &request.singles_count.to_string());
    push_element(&mut xml, "musicGenre", request.music_genre.as_ref());
    match &request.label {
        Some(label) => {
            xml.push_str("<label>");
            push_element(&mut xml, "name", &label.name);
            push_element(&mut xml, "sales", &label.sales.to_string());
            xml.push_str("</label>");
        }
        None => xml.push_str("<label/>"),
    }
    xml.push_str("</bandRequest>");
    xml
}

/// Encode filter criteria. Only truthy fields are written: `None`, empty
/// strings and numeric zero are all omitted, so a zero filter cannot be
/// expressed.
pub fn search_request_to_xml(request: &BandSearchRequest) -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str("<bandSearchRequest>");
    if let Some(name) = request.name.as_deref().filter(|n| !n.is_empty()) {
        push_element(&mut xml, "name", name);
    }
    if let Some(genre) = request.genre {
        push_element(&mut xml, "genre", genre.as_ref());
    }
    let numbers = [
        ("numberOfParticipants", request.number_of_participants),
        ("singlesCount", request.singles_count),
        ("albumsCount", request.albums_count),
    ];
    for (tag, value) in numbers {
        if let Some(value) = value.filter(|v| *v != 0) {
            push_element(&mut xml, tag, &value.to_string());
        }
    }
    xml.push_str("</bandSearchRequest>");
    xml
}

/// Body of the search-by-name endpoint.
pub fn substring_to_xml(substring: &str) -> String {
    let mut xml = String::from("<substring>");
    push_element(&mut xml, "value", substring);
    xml.push_str("</substring>");
    xml
}

fn push_element(xml: &mut String, tag: &str, text: &str) {
    let escaped: Cow<'_, str> = escape(text);
    xml.push('<');
    xml.push_str(tag);
    xml.push('>');
    xml.push_str(&escaped);
    xml.push_str("</");
    xml.push_str(tag);
    xml.push('>');
}

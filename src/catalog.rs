//! Catalog Document Model
//!
//! A library catalog is kept as owned `quick_xml` events rather than a full DOM.
//! Every direct child of the root element is captured as one [`CatalogNode`]
//! holding the child's complete event span plus its tail text (the text that
//! follows it up to the next sibling), so reordering nodes moves an element and
//! its trailing whitespace together.
//!
//! Start tags are re-serialized with double-quoted attributes. Attribute values
//! keep their original escaping; only a literal `"` inside a single-quoted value
//! is rewritten as `&quot;`.
//!
//! quick-xml leaves entity references and `<` inside attribute values to the
//! caller, so both are checked here: a reference must name a predefined entity,
//! a character, or an entity declared in the DOCTYPE internal subset.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::OnceLock;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::escape::{resolve_predefined_entity, unescape_with};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use regex::Regex;

use crate::error::{CatalogError, CatalogResult};

/// Element name of a catalog entry
pub const BOOK_TAG: &[u8] = b"book";

/// Cached regex for internal general entity declarations
static ENTITY_DECL_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_entity_decl_regex() -> &'static Regex {
    ENTITY_DECL_REGEX.get_or_init(|| {
        Regex::new(r#"<!ENTITY\s+([^\s%"'>]+)\s+(?:"([^"]*)"|'([^']*)')\s*>"#)
            .expect("Failed to compile entity declaration regex")
    })
}

/// Entities a reference may name besides the predefined five
#[derive(Debug, Default)]
struct Entities {
    declared: HashMap<String, String>,
}

impl Entities {
    /// Record the internal entities of a DOCTYPE. External and parameter
    /// entities are not declared and stay unresolvable.
    fn declare_from_doctype(&mut self, doctype: &[u8]) -> CatalogResult<()> {
        let text = std::str::from_utf8(doctype)?;
        for caps in get_entity_decl_regex().captures_iter(text) {
            let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            // The first declaration of a name is binding
            self.declared
                .entry(caps[1].to_owned())
                .or_insert_with(|| value.to_owned());
        }
        Ok(())
    }

    fn resolve(&self, name: &str) -> Option<&str> {
        resolve_predefined_entity(name).or_else(|| self.declared.get(name).map(String::as_str))
    }

    fn unescape<'a>(&self, raw: &'a str) -> CatalogResult<Cow<'a, str>> {
        unescape_with(raw, |name| self.resolve(name))
            .map_err(|e| CatalogError::malformed(e.to_string()))
    }

    /// Fail on a `&name;` in text that resolves to nothing
    fn check_reference(&self, name: &[u8]) -> CatalogResult<()> {
        let reference = format!("&{};", std::str::from_utf8(name)?);
        self.unescape(&reference)?;
        Ok(())
    }
}

/// A `book` element's attributes, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookEntry {
    attributes: Vec<(String, String)>,
}

impl BookEntry {
    fn from_start(start: &BytesStart<'_>, entities: &Entities) -> CatalogResult<Self> {
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| CatalogError::malformed(e.to_string()))?;
            let key = std::str::from_utf8(attr.key.as_ref())?.to_owned();
            let raw = std::str::from_utf8(&attr.value)?;
            let value = entities.unescape(raw)?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self { attributes })
    }

    /// Unescaped value of the named attribute
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    pub fn path(&self) -> Option<&str> {
        self.attribute("path")
    }

    /// The `path` attribute, or the empty string when absent
    pub fn sort_key(&self) -> &str {
        self.path().unwrap_or("")
    }
}

/// One direct child of the root element together with its tail text
#[derive(Debug, Clone)]
pub enum CatalogNode {
    Book {
        entry: BookEntry,
        events: Vec<Event<'static>>,
    },
    Other {
        events: Vec<Event<'static>>,
    },
}

impl CatalogNode {
    pub fn is_book(&self) -> bool {
        matches!(self, CatalogNode::Book { .. })
    }

    pub fn book(&self) -> Option<&BookEntry> {
        match self {
            CatalogNode::Book { entry, .. } => Some(entry),
            CatalogNode::Other { .. } => None,
        }
    }

    fn events(&self) -> &[Event<'static>] {
        match self {
            CatalogNode::Book { events, .. } | CatalogNode::Other { events } => events,
        }
    }

    fn events_mut(&mut self) -> &mut Vec<Event<'static>> {
        match self {
            CatalogNode::Book { events, .. } | CatalogNode::Other { events } => events,
        }
    }
}

/// Parsed catalog document
#[derive(Debug, Clone)]
pub struct Catalog {
    prolog: Vec<Event<'static>>,
    root: BytesStart<'static>,
    self_closing: bool,
    leading: Vec<Event<'static>>,
    nodes: Vec<CatalogNode>,
    epilog: Vec<Event<'static>>,
}

impl Catalog {
    /// Parse a catalog from its full text
    pub fn parse(content: &str) -> CatalogResult<Self> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(false);

        let mut builder = CatalogBuilder::default();
        loop {
            let event = reader.read_event().map_err(|e| {
                CatalogError::malformed(format!("{} at position {}", e, reader.buffer_position()))
            })?;
            if let Event::Eof = event {
                break;
            }
            builder.push(event).map_err(|e| match e {
                CatalogError::Malformed { details } => CatalogError::malformed(format!(
                    "{} at position {}",
                    details,
                    reader.buffer_position()
                )),
                other => other,
            })?;
        }

        builder.finish()
    }

    /// Name of the root element
    pub fn root_name(&self) -> String {
        String::from_utf8_lossy(self.root.name().as_ref()).into_owned()
    }

    pub fn nodes(&self) -> &[CatalogNode] {
        &self.nodes
    }

    /// Direct-child books in current order
    pub fn books(&self) -> impl Iterator<Item = &BookEntry> {
        self.nodes.iter().filter_map(CatalogNode::book)
    }

    pub fn book_count(&self) -> usize {
        self.books().count()
    }

    /// Number of direct children that are not books (elements, comments, PIs)
    pub fn other_count(&self) -> usize {
        self.nodes.len() - self.book_count()
    }

    pub fn books_without_path(&self) -> usize {
        self.books().filter(|book| book.path().is_none()).count()
    }

    /// Stable ascending sort of books by `path`, relocating all of them after
    /// the remaining children.
    pub fn sort_books_by_path(&mut self) {
        let (mut books, others): (Vec<_>, Vec<_>) = std::mem::take(&mut self.nodes)
            .into_iter()
            .partition(CatalogNode::is_book);

        books.sort_by(|a, b| {
            let a = a.book().map(BookEntry::sort_key).unwrap_or("");
            let b = b.book().map(BookEntry::sort_key).unwrap_or("");
            a.cmp(b)
        });

        self.nodes = others;
        self.nodes.extend(books);
    }

    /// Serialize as UTF-8 with a fresh XML declaration
    pub fn to_xml(&self) -> CatalogResult<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());

        emit(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
        )?;
        emit(&mut writer, newline())?;

        for event in &self.prolog {
            emit(&mut writer, event.clone())?;
            emit(&mut writer, newline())?;
        }

        if self.self_closing {
            emit(&mut writer, Event::Empty(self.root.clone()))?;
        } else {
            emit(&mut writer, Event::Start(self.root.clone()))?;
            for event in &self.leading {
                emit(&mut writer, event.clone())?;
            }
            for node in &self.nodes {
                for event in node.events() {
                    emit(&mut writer, event.clone())?;
                }
            }
            emit(&mut writer, Event::End(self.root.to_end()))?;
        }

        for event in &self.epilog {
            emit(&mut writer, newline())?;
            emit(&mut writer, event.clone())?;
        }
        emit(&mut writer, newline())?;

        Ok(writer.into_inner())
    }

    pub fn to_xml_string(&self) -> CatalogResult<String> {
        let bytes = self.to_xml()?;
        String::from_utf8(bytes).map_err(|e| CatalogError::Utf8(e.utf8_error()))
    }
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> CatalogResult<()> {
    writer
        .write_event(event)
        .map_err(|e| CatalogError::Write(e.to_string()))
}

fn newline() -> Event<'static> {
    Event::Text(BytesText::new("\n"))
}

fn is_blank(text: &[u8]) -> bool {
    text.iter().all(u8::is_ascii_whitespace)
}

/// Rebuild a start tag with every attribute double-quoted
fn normalize_start(
    start: &BytesStart<'_>,
    entities: &Entities,
) -> CatalogResult<BytesStart<'static>> {
    let name = std::str::from_utf8(start.name().as_ref())?.to_owned();
    let mut normalized = BytesStart::new(name);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| CatalogError::malformed(e.to_string()))?;
        if attr.value.contains(&b'<') {
            return Err(CatalogError::malformed(format!(
                "'<' is not allowed in the value of attribute '{}'",
                String::from_utf8_lossy(attr.key.as_ref())
            )));
        }
        entities.unescape(std::str::from_utf8(&attr.value)?)?;

        let mut value = Vec::with_capacity(attr.value.len());
        for &byte in attr.value.iter() {
            if byte == b'"' {
                value.extend_from_slice(b"&quot;");
            } else {
                value.push(byte);
            }
        }
        normalized.push_attribute(Attribute {
            key: QName(attr.key.as_ref()),
            value: Cow::Owned(value),
        });
    }

    Ok(normalized)
}

fn own_event(event: Event<'_>, entities: &Entities) -> CatalogResult<Event<'static>> {
    Ok(match event {
        Event::Start(start) => Event::Start(normalize_start(&start, entities)?),
        Event::Empty(start) => Event::Empty(normalize_start(&start, entities)?),
        Event::GeneralRef(reference) => {
            entities.check_reference(reference.as_ref())?;
            Event::GeneralRef(reference.into_owned())
        }
        other => other.into_owned(),
    })
}

/// A direct child of the root whose end tag has not been seen yet
struct OpenNode {
    entry: Option<BookEntry>,
    events: Vec<Event<'static>>,
    depth: usize,
}

impl OpenNode {
    fn finish(self) -> CatalogNode {
        match self.entry {
            Some(entry) => CatalogNode::Book {
                entry,
                events: self.events,
            },
            None => CatalogNode::Other {
                events: self.events,
            },
        }
    }
}

#[derive(Default)]
struct CatalogBuilder {
    prolog: Vec<Event<'static>>,
    root: Option<BytesStart<'static>>,
    self_closing: bool,
    closed: bool,
    leading: Vec<Event<'static>>,
    nodes: Vec<CatalogNode>,
    open: Option<OpenNode>,
    epilog: Vec<Event<'static>>,
    entities: Entities,
}

impl CatalogBuilder {
    fn push(&mut self, event: Event<'_>) -> CatalogResult<()> {
        if let Some(open) = self.open.as_mut() {
            match &event {
                Event::Start(_) => open.depth += 1,
                Event::End(_) => open.depth -= 1,
                _ => {}
            }
            open.events.push(own_event(event, &self.entities)?);
            if open.depth == 0
                && let Some(done) = self.open.take()
            {
                self.nodes.push(done.finish());
            }
            return Ok(());
        }

        if self.root.is_none() {
            self.push_prolog(event)
        } else if !self.closed {
            self.push_child(event)
        } else {
            self.push_epilog(event)
        }
    }

    fn push_prolog(&mut self, event: Event<'_>) -> CatalogResult<()> {
        match event {
            // Replaced by our own declaration on output
            Event::Decl(_) => {}
            Event::Text(text) if is_blank(&text) => {}
            Event::DocType(doctype) => {
                self.entities.declare_from_doctype(&doctype)?;
                self.prolog.push(Event::DocType(doctype.into_owned()));
            }
            Event::Comment(_) | Event::PI(_) => {
                self.prolog.push(event.into_owned());
            }
            Event::Start(start) => {
                self.root = Some(normalize_start(&start, &self.entities)?);
            }
            Event::Empty(start) => {
                self.root = Some(normalize_start(&start, &self.entities)?);
                self.self_closing = true;
                self.closed = true;
            }
            _ => {
                return Err(CatalogError::malformed(
                    "content before the root element",
                ));
            }
        }
        Ok(())
    }

    fn push_child(&mut self, event: Event<'_>) -> CatalogResult<()> {
        match event {
            Event::Start(start) => {
                let entry = if start.name().as_ref() == BOOK_TAG {
                    Some(BookEntry::from_start(&start, &self.entities)?)
                } else {
                    None
                };
                self.open = Some(OpenNode {
                    entry,
                    events: vec![Event::Start(normalize_start(&start, &self.entities)?)],
                    depth: 1,
                });
            }
            Event::Empty(start) => {
                let events = vec![Event::Empty(normalize_start(&start, &self.entities)?)];
                let node = if start.name().as_ref() == BOOK_TAG {
                    CatalogNode::Book {
                        entry: BookEntry::from_start(&start, &self.entities)?,
                        events,
                    }
                } else {
                    CatalogNode::Other { events }
                };
                self.nodes.push(node);
            }
            Event::End(_) => self.closed = true,
            Event::Text(_) | Event::GeneralRef(_) | Event::CData(_) => {
                let event = own_event(event, &self.entities)?;
                match self.nodes.last_mut() {
                    Some(node) => node.events_mut().push(event),
                    None => self.leading.push(event),
                }
            }
            Event::Comment(_) | Event::PI(_) => {
                self.nodes.push(CatalogNode::Other {
                    events: vec![event.into_owned()],
                });
            }
            _ => {
                return Err(CatalogError::malformed(
                    "unexpected declaration inside the root element",
                ));
            }
        }
        Ok(())
    }

    fn push_epilog(&mut self, event: Event<'_>) -> CatalogResult<()> {
        match event {
            Event::Text(text) if is_blank(&text) => {}
            Event::Comment(_) | Event::PI(_) => self.epilog.push(event.into_owned()),
            _ => {
                return Err(CatalogError::malformed(
                    "junk after the document element",
                ));
            }
        }
        Ok(())
    }

    fn finish(self) -> CatalogResult<Catalog> {
        let Some(root) = self.root else {
            return Err(CatalogError::malformed("no root element found"));
        };
        if !self.closed || self.open.is_some() {
            return Err(CatalogError::malformed(
                "unexpected end of document: unclosed element",
            ));
        }

        Ok(Catalog {
            prolog: self.prolog,
            root,
            self_closing: self.self_closing,
            leading: self.leading,
            nodes: self.nodes,
            epilog: self.epilog,
        })
    }
}

//! # Output Sinks
//!
//! The exporter hands each record to an [`ElementSink`] as a flat
//! [`Element`]: a name plus ordered `(attribute, value)` pairs.
//!
//! - `XmlSink` writes escaped XML to any `io::Write`
//! - `MemorySink` buffers elements in memory

use crate::DynexError;
use std::borrow::Cow;
use std::io::Write;

// =============================================================================
// ELEMENT
// =============================================================================

/// A structured output element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: &'static str,
    pub attributes: Vec<(&'static str, String)>,
}

impl Element {
    /// Create an element with no attributes.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            attributes: Vec::new(),
        }
    }

    /// Builder-style attribute append. Order is preserved on output.
    #[must_use]
    pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.attributes.push((key, value.into()));
        self
    }

    /// Look up an attribute value.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Check whether an attribute is present.
    #[must_use]
    pub fn has_attribute(&self, key: &str) -> bool {
        self.attribute(key).is_some()
    }
}

// =============================================================================
// SINK TRAIT
// =============================================================================

/// Destination for exported elements.
///
/// Callers abort the export pass on the first failed write.
pub trait ElementSink {
    /// Accept one element, or fail with `SerializationError`.
    fn write_element(&mut self, element: &Element) -> Result<(), DynexError>;
}

impl<S: ElementSink + ?Sized> ElementSink for &mut S {
    fn write_element(&mut self, element: &Element) -> Result<(), DynexError> {
        (**self).write_element(element)
    }
}

// =============================================================================
// MEMORY SINK
// =============================================================================

/// Buffers elements in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    elements: Vec<Element>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    #[must_use]
    pub fn into_elements(self) -> Vec<Element> {
        self.elements
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl ElementSink for MemorySink {
    fn write_element(&mut self, element: &Element) -> Result<(), DynexError> {
        self.elements.push(element.clone());
        Ok(())
    }
}

// =============================================================================
// XML SINK
// =============================================================================

/// Escape a string for use inside a double-quoted XML attribute.
#[must_use]
pub fn escape_attribute(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['&', '<', '>', '"', '\'', '\n', '\r', '\t']) {
        return Cow::Borrowed(raw);
    }
    let mut escaped = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' => escaped.push_str("&#9;"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

/// Returns true if XML 1.0 can represent `c`, escaped or not.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

fn io_error(e: std::io::Error) -> DynexError {
    DynexError::SerializationError(e.to_string())
}

/// Writes elements as XML to an `io::Write`.
///
/// Each element is rendered into a buffer first and handed to the writer
/// with a single `write_all`. Attribute values holding characters XML 1.0
/// cannot represent (most C0 controls, U+FFFE, U+FFFF) are rejected with
/// `SerializationError` before anything is written.
/// Container elements opened with [`XmlSink::begin`] must be closed with
/// [`XmlSink::end`] before [`XmlSink::finish`].
#[derive(Debug)]
pub struct XmlSink<W: Write> {
    writer: W,
    indent: usize,
    open: Vec<&'static str>,
}

impl<W: Write> XmlSink<W> {
    /// Create a sink with two-space indentation.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            indent: 2,
            open: Vec::new(),
        }
    }

    /// Spaces per nesting level. Zero writes everything on one line.
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Write the `<?xml ...?>` declaration.
    pub fn declaration(&mut self) -> Result<(), DynexError> {
        let line = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>{}",
            self.newline()
        );
        self.writer.write_all(line.as_bytes()).map_err(io_error)
    }

    /// Open a container element.
    pub fn begin(
        &mut self,
        name: &'static str,
        attributes: &[(&'static str, String)],
    ) -> Result<(), DynexError> {
        let mut out = self.padding();
        out.push('<');
        out.push_str(name);
        push_attributes(&mut out, attributes)?;
        out.push('>');
        out.push_str(self.newline());
        self.writer.write_all(out.as_bytes()).map_err(io_error)?;
        self.open.push(name);
        Ok(())
    }

    /// Close the innermost container element.
    pub fn end(&mut self) -> Result<(), DynexError> {
        let name = self.open.pop().ok_or_else(|| {
            DynexError::SerializationError("No open element to close".to_string())
        })?;
        let out = format!("{}</{}>{}", self.padding(), name, self.newline());
        self.writer.write_all(out.as_bytes()).map_err(io_error)
    }

    /// Current nesting depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Flush and return the underlying writer.
    ///
    /// Fails if container elements are still open.
    pub fn finish(mut self) -> Result<W, DynexError> {
        if let Some(name) = self.open.last() {
            return Err(DynexError::SerializationError(format!(
                "Element <{}> was never closed",
                name
            )));
        }
        self.writer.flush().map_err(io_error)?;
        Ok(self.writer)
    }

    fn padding(&self) -> String {
        " ".repeat(self.indent.saturating_mul(self.open.len()))
    }

    fn newline(&self) -> &'static str {
        if self.indent > 0 { "\n" } else { "" }
    }
}

fn push_attributes(
    out: &mut String,
    attributes: &[(&'static str, String)],
) -> Result<(), DynexError> {
    for (key, value) in attributes {
        if let Some(bad) = value.chars().find(|c| !is_xml_char(*c)) {
            return Err(DynexError::SerializationError(format!(
                "Attribute '{}' contains U+{:04X}, which XML 1.0 cannot represent",
                key,
                u32::from(bad)
            )));
        }
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_attribute(value));
        out.push('"');
    }
    Ok(())
}

impl<W: Write> ElementSink for XmlSink<W> {
    fn write_element(&mut self, element: &Element) -> Result<(), DynexError> {
        let mut out = self.padding();
        out.push('<');
        out.push_str(element.name);
        push_attributes(&mut out, &element.attributes)?;
        out.push_str("/>");
        out.push_str(self.newline());
        self.writer.write_all(out.as_bytes()).map_err(io_error)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn attvalue(owner: &str, value: &str) -> Element {
        Element::new("attvalue").with("for", owner).with("value", value)
    }

    #[test]
    fn element_attribute_lookup() {
        let element = attvalue("n1", "red");
        assert_eq!(element.attribute("for"), Some("n1"));
        assert_eq!(element.attribute("value"), Some("red"));
        assert!(!element.has_attribute("start"));
    }

    #[test]
    fn memory_sink_buffers_in_order() {
        let mut sink = MemorySink::new();
        assert!(sink.is_empty());

        sink.write_element(&attvalue("a", "1")).unwrap();
        sink.write_element(&attvalue("b", "2")).unwrap();

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.elements()[0].attribute("for"), Some("a"));
        assert_eq!(sink.into_elements()[1].attribute("for"), Some("b"));
    }

    #[test]
    fn escape_leaves_plain_text_borrowed() {
        assert!(matches!(escape_attribute("plain"), Cow::Borrowed("plain")));
        assert_eq!(
            escape_attribute(r#"a<b & "c" 'd'>"#),
            "a&lt;b &amp; &quot;c&quot; &apos;d&apos;&gt;"
        );
        assert_eq!(escape_attribute("x\ny"), "x&#10;y");
    }

    #[test]
    fn xml_sink_writes_self_closing_element() {
        let mut sink = XmlSink::new(Vec::new()).with_indent(0);
        sink.write_element(&attvalue("n1", "R&D")).unwrap();

        let bytes = sink.finish().unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"<attvalue for="n1" value="R&amp;D"/>"#
        );
    }

    #[test]
    fn xml_sink_indents_nested_elements() {
        let mut sink = XmlSink::new(Vec::new());
        sink.begin("attvalues", &[]).unwrap();
        assert_eq!(sink.depth(), 1);
        sink.write_element(&attvalue("n1", "red")).unwrap();
        sink.end().unwrap();

        let text = String::from_utf8(sink.finish().unwrap()).unwrap();
        assert_eq!(
            text,
            "<attvalues>\n  <attvalue for=\"n1\" value=\"red\"/>\n</attvalues>\n"
        );
    }

    #[test]
    fn xml_sink_rejects_unbalanced_finish() {
        let mut sink = XmlSink::new(Vec::new());
        sink.begin("attvalues", &[]).unwrap();
        assert!(matches!(
            sink.finish(),
            Err(DynexError::SerializationError(_))
        ));
    }

    #[test]
    fn xml_sink_rejects_stray_end() {
        let mut sink = XmlSink::new(Vec::new());
        assert!(sink.end().is_err());
    }

    #[test]
    fn xml_sink_propagates_io_failure() {
        struct Full;
        impl Write for Full {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk full"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut sink = XmlSink::new(Full);
        let result = sink.write_element(&attvalue("n1", "red"));
        match result {
            Err(DynexError::SerializationError(msg)) => assert!(msg.contains("disk full")),
            other => panic!("expected serialization error, got {:?}", other),
        }
    }

    #[test]
    fn xml_sink_rejects_unrepresentable_characters() {
        let mut sink = XmlSink::new(Vec::new()).with_indent(0);
        sink.write_element(&attvalue("n1", "ok")).unwrap();

        for bad in ["a\u{1}b", "\u{0}", "x\u{1F}", "\u{FFFE}", "\u{FFFF}"] {
            assert!(matches!(
                sink.write_element(&attvalue("n1", bad)),
                Err(DynexError::SerializationError(_))
            ));
        }
        assert!(matches!(
            sink.begin("attvalues", &[("label", "\u{8}".to_string())]),
            Err(DynexError::SerializationError(_))
        ));
        assert_eq!(sink.depth(), 0);

        let bytes = sink.finish().unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"<attvalue for="n1" value="ok"/>"#
        );
    }

    #[test]
    fn xml_sink_accepts_whitespace_controls_and_astral_chars() {
        let mut sink = XmlSink::new(Vec::new()).with_indent(0);
        sink.write_element(&attvalue("n1", "a\tb\u{1F600}")).unwrap();

        let bytes = sink.finish().unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "<attvalue for=\"n1\" value=\"a&#9;b\u{1F600}\"/>"
        );
    }
}

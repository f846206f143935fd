//! Markup template parser
//!
//! Reads with `quick-xml` into the order-preserving [`XmlDocument`] model and
//! writes it back by hand. Whitespace text, comments, processing
//! instructions and the declaration survive so that untouched regions come
//! out as they went in. Start tags keep their authored quoting and spacing
//! until an attribute changes; new or edited tags use double quotes. A
//! childless element keeps the `<tag></tag>` or `<tag/>` form it was read in.

use super::TemplateParser;
use crate::error::ParseError;
use optfile_artifact::{Attribute, Element, Node, XmlDeclaration, XmlDocument};
use quick_xml::escape::{escape, minimal_escape};
use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;

/// Structured job descriptor parser
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlParser;

impl TemplateParser for XmlParser {
    type Output = XmlDocument;

    fn parse(&self, content: &str) -> Result<Self::Output, ParseError> {
        let mut reader = Reader::from_str(content);
        let mut builder = TreeBuilder::default();

        loop {
            let event = reader.read_event().map_err(|e| {
                ParseError::syntax(format!("{e} at byte {}", reader.buffer_position()))
            })?;
            match event {
                Event::Decl(decl) => builder.declaration(&decl)?,
                Event::Start(start) => builder.open(element_from(&start)?),
                Event::Empty(start) => builder.attach(Node::Element(element_from(&start)?))?,
                Event::End(_) => builder.close()?,
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|e| ParseError::syntax(e.to_string()))?;
                    builder.text(text.into_owned())?;
                }
                Event::CData(data) => {
                    builder.attach(Node::CData(String::from_utf8_lossy(&data).into_owned()))?;
                }
                Event::Comment(comment) => {
                    builder.attach(Node::Comment(lossy(&comment)))?;
                }
                Event::PI(pi) => {
                    builder.attach(Node::ProcessingInstruction(lossy(&pi)))?;
                }
                Event::DocType(doctype) => {
                    builder.attach(Node::DocType(lossy(&doctype)))?;
                }
                Event::Eof => break,
            }
        }

        builder.finish()
    }

    fn serialize(&self, document: &Self::Output) -> String {
        let mut out = String::new();
        if let Some(decl) = &document.declaration {
            write_declaration(&mut out, decl);
        }
        for node in &document.prolog {
            write_node(&mut out, node);
        }
        write_element(&mut out, &document.root);
        for node in &document.epilog {
            write_node(&mut out, node);
        }
        out
    }

    fn extensions(&self) -> &[&str] {
        &["xml", "lcsim", "gear", "lcdd"]
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn utf8<'a>(bytes: &'a [u8], what: &str) -> Result<&'a str, ParseError> {
    std::str::from_utf8(bytes).map_err(|_| ParseError::syntax(format!("{what} is not valid UTF-8")))
}

fn element_from(start: &BytesStart<'_>) -> Result<Element, ParseError> {
    let name = utf8(start.name().as_ref(), "element name")?.to_string();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ParseError::syntax(format!("<{name}>: {e}")))?;
        let key = utf8(attr.key.as_ref(), "attribute name")?.to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| ParseError::syntax(format!("<{name} {key}>: {e}")))?
            .into_owned();
        attributes.push(Attribute { name: key, value });
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
        source_tag: Some(utf8(start, "start tag")?.to_string()),
        expanded_empty: false,
    })
}

#[derive(Debug, Default)]
struct TreeBuilder {
    declaration: Option<XmlDeclaration>,
    prolog: Vec<Node>,
    stack: Vec<Element>,
    root: Option<Element>,
    epilog: Vec<Node>,
}

impl TreeBuilder {
    fn declaration(&mut self, decl: &BytesDecl<'_>) -> Result<(), ParseError> {
        let field = |value: Cow<'_, [u8]>| lossy(&value);
        let version = decl
            .version()
            .map_err(|e| ParseError::syntax(format!("declaration: {e}")))?;
        self.declaration = Some(XmlDeclaration {
            version: field(version),
            encoding: decl.encoding().and_then(Result::ok).map(field),
            standalone: decl.standalone().and_then(Result::ok).map(field),
        });
        Ok(())
    }

    fn open(&mut self, element: Element) {
        self.stack.push(element);
    }

    fn close(&mut self) -> Result<(), ParseError> {
        let mut element = self
            .stack
            .pop()
            .ok_or_else(|| ParseError::syntax("closing tag without matching open tag"))?;
        element.expanded_empty = element.children.is_empty();
        self.attach(Node::Element(element))
    }

    fn text(&mut self, text: String) -> Result<(), ParseError> {
        if self.stack.is_empty() && !text.trim().is_empty() {
            return Err(ParseError::syntax("text outside the root element"));
        }
        self.attach(Node::Text(text))
    }

    fn attach(&mut self, node: Node) -> Result<(), ParseError> {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(node);
            return Ok(());
        }
        match node {
            Node::Element(element) => {
                if self.root.is_some() {
                    return Err(ParseError::syntax(format!(
                        "second root element <{}>",
                        element.name
                    )));
                }
                self.root = Some(element);
            }
            other if self.root.is_none() => self.prolog.push(other),
            other => self.epilog.push(other),
        }
        Ok(())
    }

    fn finish(self) -> Result<XmlDocument, ParseError> {
        if let Some(open) = self.stack.last() {
            return Err(ParseError::syntax(format!("unclosed element <{}>", open.name)));
        }
        let root = self
            .root
            .ok_or_else(|| ParseError::syntax("document has no root element"))?;
        Ok(XmlDocument {
            declaration: self.declaration,
            prolog: self.prolog,
            root,
            epilog: self.epilog,
        })
    }
}

fn write_declaration(out: &mut String, decl: &XmlDeclaration) {
    out.push_str("<?xml version=\"");
    out.push_str(&decl.version);
    out.push('"');
    if let Some(encoding) = &decl.encoding {
        out.push_str(" encoding=\"");
        out.push_str(encoding);
        out.push('"');
    }
    if let Some(standalone) = &decl.standalone {
        out.push_str(" standalone=\"");
        out.push_str(standalone);
        out.push('"');
    }
    out.push_str("?>");
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Element(element) => write_element(out, element),
        Node::Text(text) => out.push_str(&minimal_escape(text.as_str())),
        Node::CData(data) => {
            out.push_str("<![CDATA[");
            out.push_str(data);
            out.push_str("]]>");
        }
        Node::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
        Node::ProcessingInstruction(pi) => {
            out.push_str("<?");
            out.push_str(pi);
            out.push_str("?>");
        }
        Node::DocType(doctype) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(doctype);
            out.push('>');
        }
    }
}

fn write_element(out: &mut String, element: &Element) {
    out.push('<');
    match element.source_tag.as_deref().filter(|raw| spells(raw, element)) {
        Some(raw) => out.push_str(raw),
        None => {
            out.push_str(&element.name);
            for attr in &element.attributes {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                out.push_str(&escape(attr.value.as_str()));
                out.push('"');
            }
        }
    }
    if element.children.is_empty() && !element.expanded_empty {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &element.children {
        write_node(out, child);
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

/// Does the start tag `raw` still spell this element's name and attributes?
fn spells(raw: &str, element: &Element) -> bool {
    let Some(rest) = raw.strip_prefix(element.name.as_str()) else {
        return false;
    };
    if rest.chars().next().is_some_and(|c| !c.is_ascii_whitespace()) {
        return false;
    }
    let start = BytesStart::from_content(raw, element.name.len());
    let mut expected = element.attributes.iter();
    for attr in start.attributes() {
        let (Ok(attr), Some(want)) = (attr, expected.next()) else {
            return false;
        };
        if attr.key.as_ref() != want.name.as_bytes() {
            return false;
        }
        match attr.unescape_value() {
            Ok(value) if *value == *want.value => {}
            _ => return false,
        }
    }
    expected.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use optfile_artifact::ElementPath;
    use pretty_assertions::assert_eq;

    const MARLIN: &str = r#"<?xml version="1.0" encoding="us-ascii"?>
<!-- ?xml-stylesheet type="text/xsl" href="marlin.xsl"? -->
<marlin xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <execute>
    <processor name="MyLCIOOutputProcessor"/>
  </execute>
  <global>
    <parameter name="LCIOInputFiles"> in.slcio </parameter>
    <parameter name="MaxRecordNumber" value="10"/>
    <parameter name="Verbosity" options="DEBUG0-4,MESSAGE0-4">DEBUG</parameter>
  </global>
</marlin>
"#;

    #[test]
    fn canonical_input_is_reproduced() {
        let doc = XmlParser.parse(MARLIN).unwrap();
        assert_eq!(XmlParser.serialize(&doc), MARLIN);
    }

    #[test]
    fn declaration_and_prolog_kept() {
        let doc = XmlParser.parse(MARLIN).unwrap();
        let decl = doc.declaration.as_ref().unwrap();
        assert_eq!(decl.version, "1.0");
        assert_eq!(decl.encoding.as_deref(), Some("us-ascii"));
        assert!(doc
            .prolog
            .iter()
            .any(|n| matches!(n, Node::Comment(c) if c.contains("xml-stylesheet"))));
        assert_eq!(doc.root.name, "marlin");
    }

    #[test]
    fn attributes_are_unescaped_and_reescaped() {
        let doc = XmlParser
            .parse(r#"<a cut="x &lt; 3 &amp;&amp; y">1 &lt; 2</a>"#)
            .unwrap();
        assert_eq!(doc.root.attribute("cut"), Some("x < 3 && y"));
        assert_eq!(doc.root.text().as_deref(), Some("1 < 2"));
        assert_eq!(
            XmlParser.serialize(&doc),
            r#"<a cut="x &lt; 3 &amp;&amp; y">1 &lt; 2</a>"#
        );
    }

    #[test]
    fn lookup_after_parse() {
        let doc = XmlParser.parse(MARLIN).unwrap();
        let path = ElementPath::parse("global/parameter[@name='MaxRecordNumber']").unwrap();
        assert_eq!(doc.find(&path).unwrap().attribute("value"), Some("10"));
    }

    #[test]
    fn cdata_and_pi_survive() {
        let text = "<?proc keep?><lcsim><![CDATA[a<b]]></lcsim>";
        let doc = XmlParser.parse(text).unwrap();
        assert_eq!(XmlParser.serialize(&doc), text);
    }

    #[test]
    fn unclosed_element_is_syntax_error() {
        let err = XmlParser.parse("<lcsim><inputFiles></lcsim>").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
        let err = XmlParser.parse("<lcsim><control>").unwrap_err();
        assert!(err.to_string().contains("unclosed element <control>"));
    }

    #[test]
    fn empty_document_is_syntax_error() {
        let err = XmlParser.parse("  \n").unwrap_err();
        assert!(err.to_string().contains("no root element"));
    }

    #[test]
    fn two_roots_rejected() {
        assert!(XmlParser.parse("<a/><b/>").is_err());
    }

    #[test]
    fn authored_start_tags_are_reproduced() {
        let text = concat!(
            "<marlin >\n",
            "  <global>\n",
            "    <parameter name='Verbosity' >DEBUG</parameter>\n",
            "    <parameter name=\"Empty\"></parameter>\n",
            "    <parameter  name=\"Flag\"  value='on' />\n",
            "    <cut expr=\"E > 5 &amp;&amp; q != 'x'\">pt > 2</cut>\n",
            "  </global>\n",
            "</marlin>\n"
        );
        let doc = XmlParser.parse(text).unwrap();
        assert_eq!(XmlParser.serialize(&doc), text);
        let empty = doc
            .find(&ElementPath::parse("global/parameter[@name='Empty']").unwrap())
            .unwrap();
        assert!(empty.expanded_empty);
    }

    #[test]
    fn edited_start_tag_falls_back_to_double_quotes() {
        let mut doc = XmlParser
            .parse("<marlin><parameter name='MaxRecordNumber' value='10'/><p  a='1'/></marlin>")
            .unwrap();
        let Some(Node::Element(param)) = doc.root.children.first_mut() else {
            panic!("first child is not an element");
        };
        param.set_attribute("value", "250");
        assert_eq!(
            XmlParser.serialize(&doc),
            "<marlin><parameter name=\"MaxRecordNumber\" value=\"250\"/><p  a='1'/></marlin>"
        );
    }

    #[test]
    fn built_elements_use_canonical_form() {
        let mut doc = XmlParser.parse("<lcsim><drivers></drivers></lcsim>").unwrap();
        let Some(Node::Element(drivers)) = doc.root.children.first_mut() else {
            panic!("first child is not an element");
        };
        drivers.push_element(Element::new("driver").with_attribute("name", "Writer"));
        assert_eq!(
            XmlParser.serialize(&doc),
            "<lcsim><drivers><driver name=\"Writer\"/></drivers></lcsim>"
        );
    }
}

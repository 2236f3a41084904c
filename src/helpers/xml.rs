//! XML writing utilities for the Office Open XML (.xlsx) exporter
//! Provides a thin writer wrapper with helpers for the handful of node shapes a worksheet needs

use crate::error::UpdError;
use quick_xml::events::BytesDecl;
use quick_xml::events::BytesEnd;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Writer;
use std::io::Write;

/// XML writer wrapper producing compact, escaped output
pub(crate) struct XmlWriter<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> XmlWriter<W> {
    pub(crate) fn new(inner: W) -> XmlWriter<W> {
        XmlWriter {
            writer: Writer::new(inner),
        }
    }

    /// Writes the standalone UTF-8 declaration expected by spreadsheet readers
    pub(crate) fn declaration(&mut self) -> Result<(), UpdError> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(())
    }

    /// Opens an element with the given attributes
    pub(crate) fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), UpdError> {
        let node = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.writer.write_event(Event::Start(node))?;
        Ok(())
    }

    /// Closes an element
    pub(crate) fn end(&mut self, name: &str) -> Result<(), UpdError> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    /// Writes a self-closing element
    pub(crate) fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), UpdError> {
        let node = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.writer.write_event(Event::Empty(node))?;
        Ok(())
    }

    /// Writes an element containing only escaped text
    pub(crate) fn text_element(
        &mut self,
        name: &str,
        attributes: &[(&str, &str)],
        text: &str,
    ) -> Result<(), UpdError> {
        self.start(name, attributes)?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_escaped_text() {
        let mut buffer = Vec::new();
        {
            let mut writer = XmlWriter::new(&mut buffer);
            writer.start("row", &[("r", "1")]).unwrap();
            writer.text_element("t", &[], "ООО \"Рога & Копыта\" <1>").unwrap();
            writer.empty("c", &[("r", "B1")]).unwrap();
            writer.end("row").unwrap();
        }
        let xml = String::from_utf8(buffer).unwrap();
        assert!(xml.starts_with("<row r=\"1\"><t>ООО"));
        assert!(xml.contains("&amp;"));
        assert!(xml.contains("&lt;1&gt;"));
        assert!(xml.ends_with("<c r=\"B1\"/></row>"));
    }
}

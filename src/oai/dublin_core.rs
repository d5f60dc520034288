//! Simple Dublin Core (`oai_dc`) serialization.
//!
//! Produces the fixed-schema `oai_dc:dc` document OAI-PMH repositories accept for
//! the `oai_dc` metadata prefix. Only non-blank fields become elements, so the
//! output never contains empty tags.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

use crate::models::Record;

/// Metadata prefix the serialized documents are registered under
pub const METADATA_PREFIX: &str = "oai_dc";

pub const OAI_DC_NAMESPACE: &str = "http://www.openarchives.org/OAI/2.0/oai_dc/";
pub const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const OAI_DC_SCHEMA_LOCATION: &str =
    "http://www.openarchives.org/OAI/2.0/oai_dc/ http://www.openarchives.org/OAI/2.0/oai_dc.xsd";

const ROOT: &str = "oai_dc:dc";

/// Errors raised while writing the XML document
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("XML write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML output is not UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// Text holds a control character XML 1.0 cannot represent
    #[error("Invalid character {ch:?} in {element}")]
    InvalidChar { element: &'static str, ch: char },
}

/// Serialize a record as an indented `oai_dc` document
///
/// Elements are written in a fixed order: title, creator, description, date, then
/// the DOI (as `DOI: <doi>`) and the URL as `dc:identifier`s.
pub fn serialize(record: &Record) -> Result<String, SerializeError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let root = BytesStart::new(ROOT).with_attributes([
        ("xmlns:oai_dc", OAI_DC_NAMESPACE),
        ("xmlns:dc", DC_NAMESPACE),
        ("xmlns:xsi", XSI_NAMESPACE),
        ("xsi:schemaLocation", OAI_DC_SCHEMA_LOCATION),
    ]);
    writer.write_event(Event::Start(root))?;

    let doi = record.doi.as_deref().map(|doi| format!("DOI: {}", doi.trim()));
    let elements = [
        ("dc:title", Some(record.title.as_str())),
        ("dc:creator", Some(record.creator.as_str())),
        ("dc:description", Some(record.description.as_str())),
        ("dc:date", Some(record.datestamp.as_str())),
        ("dc:identifier", doi.as_deref()),
        ("dc:identifier", record.url.as_deref()),
    ];

    for (name, value) in elements {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            continue;
        };
        if let Some(ch) = value.chars().find(|&c| !is_xml_char(c)) {
            return Err(SerializeError::InvalidChar { element: name, ch });
        }
        writer
            .create_element(name)
            .write_text_content(BytesText::new(value))?;
    }

    writer.write_event(Event::End(BytesEnd::new(ROOT)))?;

    Ok(String::from_utf8(writer.into_inner().into_inner())?)
}

/// Characters allowed by the XML 1.0 `Char` production
fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

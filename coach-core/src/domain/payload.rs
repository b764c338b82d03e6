//! XML write payloads
//!
//! Reads from the service are JSON, writes are XML with a single root
//! element per entity type. Each resource lists the fields it sends
//! explicitly; ownership references never appear in a payload.

use std::fmt::Display;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::result::{Error, Result};

/// An ordered set of `<name>value</name>` children under one root tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    tag: String,
    fields: Vec<(&'static str, String)>,
}

impl Payload {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field, skipping values that are absent or render empty
    pub fn field<T: Display>(mut self, name: &'static str, value: Option<T>) -> Self {
        self.push(name, value);
        self
    }

    /// In-place variant of [`Payload::field`]
    pub fn push<T: Display>(&mut self, name: &'static str, value: Option<T>) {
        if let Some(value) = value {
            let rendered = value.to_string();
            if !rendered.is_empty() {
                self.fields.push((name, rendered));
            }
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render the payload as an XML document body
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());

        write(&mut writer, Event::Start(BytesStart::new(self.tag.as_str())))?;
        for (name, value) in &self.fields {
            write(&mut writer, Event::Start(BytesStart::new(*name)))?;
            write(&mut writer, Event::Text(BytesText::new(value)))?;
            write(&mut writer, Event::End(BytesEnd::new(*name)))?;
        }
        write(&mut writer, Event::End(BytesEnd::new(self.tag.as_str())))?;

        String::from_utf8(writer.into_inner())
            .map_err(|e| Error::Encode(format!("payload is not UTF-8: {}", e)))
    }
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_absent_and_empty_values() {
        let payload = Payload::new("user")
            .field("realname", Some("Jane Doe"))
            .field("email", None::<String>)
            .field("password", Some(""))
            .field("publicvisible", Some(2));

        assert_eq!(payload.get("realname"), Some("Jane Doe"));
        assert_eq!(payload.get("email"), None);
        assert_eq!(payload.get("password"), None);
        assert_eq!(
            payload.to_xml().unwrap(),
            "<user><realname>Jane Doe</realname><publicvisible>2</publicvisible></user>"
        );
    }

    #[test]
    fn test_escapes_text() {
        let payload = Payload::new("entryrunning").field("comment", Some("fast & <far>"));
        assert_eq!(
            payload.to_xml().unwrap(),
            "<entryrunning><comment>fast &amp; &lt;far&gt;</comment></entryrunning>"
        );
    }

    #[test]
    fn test_empty_payload_renders_root_only() {
        let payload = Payload::new("partnership");
        assert!(payload.is_empty());
        assert_eq!(payload.to_xml().unwrap(), "<partnership></partnership>");
    }
}

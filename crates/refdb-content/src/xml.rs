//! XML resources: references are the text of `contentPath` elements

use crate::atomic::write_atomic;
use quick_xml::events::{BytesCData, BytesText, Event};
use quick_xml::{Reader, Writer};
use refdb_core::{normalize_separators, ContentError, ContentPathModifier};
use std::path::Path;

/// Element name that holds a content path in serialized resources.
pub const CONTENT_PATH_ELEMENT: &str = "contentPath";

#[derive(Debug, Clone)]
pub struct XmlContentPathModifier {
    element: String,
}

impl Default for XmlContentPathModifier {
    fn default() -> Self {
        Self::new(CONTENT_PATH_ELEMENT)
    }
}

impl XmlContentPathModifier {
    pub fn new(element: impl Into<String>) -> Self {
        Self { element: element.into() }
    }

    fn is_content_path(&self, name: &[u8]) -> bool {
        name == self.element.as_bytes()
    }

    /// References in `xml`, in document order. Empty elements are null
    /// references and are skipped.
    pub fn find_in_str(&self, xml: &str, file: &Path) -> Result<Vec<String>, ContentError> {
        let mut reader = Reader::from_str(xml);
        let mut references = Vec::new();
        let mut current: Option<String> = None;

        loop {
            match reader.read_event().map_err(|e| ContentError::malformed(file, e))? {
                Event::Start(e) if self.is_content_path(e.name().as_ref()) => {
                    current = Some(String::new());
                }
                Event::End(e) if self.is_content_path(e.name().as_ref()) => {
                    if let Some(value) = current.take() {
                        let value = value.trim();
                        if !value.is_empty() {
                            references.push(normalize_separators(value));
                        }
                    }
                }
                Event::Text(text) => {
                    if let Some(value) = current.as_mut() {
                        let text = text.unescape().map_err(|e| ContentError::malformed(file, e))?;
                        value.push_str(&text);
                    }
                }
                Event::CData(data) => {
                    if let Some(value) = current.as_mut() {
                        value.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(references)
    }

    /// Rewrite `xml`, replacing references equal to `old_path`. Everything
    /// else is passed through untouched.
    pub fn replace_in_str(
        &self,
        xml: &str,
        new_path: &str,
        old_path: &str,
        file: &Path,
    ) -> Result<(Vec<u8>, usize), ContentError> {
        let mut reader = Reader::from_str(xml);
        let mut writer = Writer::new(Vec::with_capacity(xml.len()));
        let mut inside = false;
        let mut count = 0;
        let old_path = normalize_separators(old_path);
        let matches = |value: &str| normalize_separators(value.trim()) == old_path;

        loop {
            let event = match reader.read_event().map_err(|e| ContentError::malformed(file, e))? {
                Event::Eof => break,
                Event::Start(e) => {
                    if self.is_content_path(e.name().as_ref()) {
                        inside = true;
                    }
                    Event::Start(e)
                }
                Event::End(e) => {
                    if self.is_content_path(e.name().as_ref()) {
                        inside = false;
                    }
                    Event::End(e)
                }
                Event::Text(text) if inside => {
                    let found = matches(&text.unescape().map_err(|e| ContentError::malformed(file, e))?);
                    if found {
                        count += 1;
                        Event::Text(BytesText::new(new_path))
                    } else {
                        Event::Text(text)
                    }
                }
                Event::CData(data) if inside => {
                    if matches(&String::from_utf8_lossy(&data)) {
                        count += 1;
                        Event::CData(BytesCData::new(new_path))
                    } else {
                        Event::CData(data)
                    }
                }
                other => other,
            };
            writer
                .write_event(event)
                .map_err(|e| ContentError::malformed(file, e))?;
        }

        Ok((writer.into_inner(), count))
    }
}

impl ContentPathModifier for XmlContentPathModifier {
    fn find_referenced_resources(&self, file: &Path) -> Result<Vec<String>, ContentError> {
        let xml = std::fs::read_to_string(file).map_err(|e| ContentError::io(file, e))?;
        self.find_in_str(&xml, file)
    }

    fn update_content_paths(
        &self,
        new_path: &str,
        old_path: &str,
        file: &Path,
    ) -> Result<usize, ContentError> {
        let xml = std::fs::read_to_string(file).map_err(|e| ContentError::io(file, e))?;
        let (bytes, count) = self.replace_in_str(&xml, new_path, old_path, file)?;
        if count > 0 {
            write_atomic(file, &bytes)?;
            tracing::debug!("Replaced {} content paths in {}", count, file.display());
        }
        Ok(count)
    }
}

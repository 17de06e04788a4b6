/*! Sentence normalization

Annotated documents hold one or more `<alpino_ds>` sentences, possibly wrapped in a `<treebank>` root.
Each sentence is extracted with its namespaces stripped, gets a corpus-local id (`component:file:index`)
and a word count.

The word count is the `end` attribute of the `top` node, falling back to the number of
nodes having a `begin` attribute when the top node has no `end`.
!*/
use std::collections::HashSet;
use std::path::Path;

use log::{debug, error};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::Error;
use crate::io::reader::InputFormat;

use super::convert::Converter;
use super::metadata::MetadataDiscovery;

const SENTENCE_TAG: &[u8] = b"alpino_ds";

/// A `<meta>` entry of a sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaEntry {
    pub name: String,
    pub kind: Option<String>,
    pub value: String,
}

/// A normalized sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    id: String,
    xml: String,
    words: u64,
    metadata: Vec<MetaEntry>,
}

impl Sentence {
    pub(crate) fn new(id: String, xml: String, words: u64, metadata: Vec<MetaEntry>) -> Self {
        Self {
            id,
            xml,
            words,
            metadata,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Serialized `<alpino_ds>` element.
    pub fn xml(&self) -> &str {
        &self.xml
    }

    pub fn words(&self) -> u64 {
        self.words
    }

    pub fn metadata(&self) -> &[MetaEntry] {
        &self.metadata
    }
}

/// Produces the sentences of a file, converting it first if needed.
pub struct Normalizer<'a> {
    converter: &'a dyn Converter,
    format: InputFormat,
}

impl<'a> Normalizer<'a> {
    pub fn new(converter: &'a dyn Converter, format: InputFormat) -> Self {
        Self { converter, format }
    }

    /// Normalize a file.
    ///
    /// `file_id` is the 1-based position of the file in its component.
    /// Every sentence is observed by `discovery`.
    ///
    /// A file the converter chokes on is logged and yields no sentences.
    pub fn normalize(
        &self,
        file: &Path,
        file_id: usize,
        component: &str,
        discovery: &mut MetadataDiscovery,
    ) -> Result<Vec<Sentence>, Error> {
        let documents = if self.format.needs_conversion() {
            match self.converter.convert(file, self.format) {
                Ok(documents) => documents,
                Err(e) => {
                    error!("Could not process file {:?} - skipping: {}", file, e);
                    return Ok(Vec::new());
                }
            }
        } else {
            vec![std::fs::read_to_string(file)?]
        };

        let mut sentences = Vec::new();
        for document in &documents {
            let mut found = split_sentences(document, file_id, component, sentences.len())?;
            sentences.append(&mut found);
        }

        for sentence in &sentences {
            discovery.observe(sentence);
        }

        Ok(sentences)
    }
}

/// Build the id of a sentence.
pub fn sentence_id(component: &str, file_id: usize, index: usize) -> String {
    format!("{}:{}:{}", component, file_id, index)
}

/// Extract the sentences of an annotated document.
///
/// Sentence indices start at `first_index`.
pub fn split_sentences(
    document: &str,
    file_id: usize,
    component: &str,
    first_index: usize,
) -> Result<Vec<Sentence>, Error> {
    let mut reader = Reader::from_str(document);
    let mut sentences = Vec::new();
    let mut current: Option<SentenceBuilder> = None;

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) => {
                if let Some(builder) = current.as_mut() {
                    let cleaned = clean_start(&e, None)?;
                    builder.inspect(&cleaned)?;
                    builder.stack.push(local_name(&cleaned));
                    builder.writer.write_event(Event::Start(cleaned))?;
                } else if e.local_name().as_ref() == SENTENCE_TAG {
                    let id = sentence_id(component, file_id, first_index + sentences.len());
                    let cleaned = clean_start(&e, Some(&id))?;
                    let mut builder = SentenceBuilder::new(id);
                    builder.stack.push(local_name(&cleaned));
                    builder.writer.write_event(Event::Start(cleaned))?;
                    current = Some(builder);
                }
            }
            Event::Empty(e) => {
                if let Some(builder) = current.as_mut() {
                    let cleaned = clean_start(&e, None)?;
                    builder.inspect(&cleaned)?;
                    builder.writer.write_event(Event::Empty(cleaned))?;
                } else if e.local_name().as_ref() == SENTENCE_TAG {
                    let id = sentence_id(component, file_id, first_index + sentences.len());
                    let cleaned = clean_start(&e, Some(&id))?;
                    let mut builder = SentenceBuilder::new(id);
                    builder.writer.write_event(Event::Empty(cleaned))?;
                    sentences.push(builder.finish()?);
                }
            }
            Event::End(e) => {
                if let Some(mut builder) = current.take() {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    builder.stack.pop();
                    builder.writer.write_event(Event::End(BytesEnd::new(name)))?;
                    if builder.stack.is_empty() {
                        sentences.push(builder.finish()?);
                    } else {
                        current = Some(builder);
                    }
                }
            }
            // text, comments, processing instructions: kept as-is inside sentences
            event => {
                if let Some(builder) = current.as_mut() {
                    builder.writer.write_event(event)?;
                }
            }
        }
    }

    if let Some(builder) = current {
        return Err(Error::Custom(format!(
            "unclosed sentence {} in file {} of {}",
            builder.id, file_id, component
        )));
    }

    Ok(sentences)
}

/// A sentence being serialized.
struct SentenceBuilder {
    id: String,
    writer: Writer<Vec<u8>>,
    /// open elements, sentence root included
    stack: Vec<String>,
    top_end: Option<u64>,
    begin_nodes: u64,
    metadata: Vec<MetaEntry>,
}

impl SentenceBuilder {
    fn new(id: String) -> Self {
        Self {
            id,
            writer: Writer::new(Vec::new()),
            stack: Vec::new(),
            top_end: None,
            begin_nodes: 0,
            metadata: Vec::new(),
        }
    }

    /// Gather word count and metadata information from an opening element.
    fn inspect(&mut self, e: &BytesStart) -> Result<(), Error> {
        match e.name().as_ref() {
            b"node" => {
                if attribute(e, b"begin")?.is_some() {
                    self.begin_nodes += 1;
                }
                if self.top_end.is_none() && attribute(e, b"cat")?.as_deref() == Some("top") {
                    self.top_end = attribute(e, b"end")?.and_then(|end| end.parse().ok());
                }
            }
            // only <alpino_ds><metadata><meta/>
            b"meta" if self.in_metadata() => {
                let name = attribute(e, b"name")?;
                let value = attribute(e, b"value")?;
                if let (Some(name), Some(value)) = (name, value) {
                    self.metadata.push(MetaEntry {
                        name,
                        kind: attribute(e, b"type")?,
                        value,
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// whether the next element is a direct child of the sentence's `<metadata>`.
    fn in_metadata(&self) -> bool {
        self.stack.len() == 2 && self.stack.last().map(String::as_str) == Some("metadata")
    }

    fn finish(self) -> Result<Sentence, Error> {
        let words = self.top_end.unwrap_or(self.begin_nodes);
        let xml = String::from_utf8(self.writer.into_inner())
            .map_err(|e| Error::Custom(format!("sentence {} is not UTF-8: {}", self.id, e)))?;
        Ok(Sentence::new(self.id, xml, words, self.metadata))
    }
}

fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

/// Unescaped value of an attribute.
fn attribute(e: &BytesStart, name: &[u8]) -> Result<Option<String>, Error> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Copy of an opening element without namespace declarations and prefixes.
///
/// If an `id` is provided, it replaces the existing one or is appended.
/// Attributes that end up with the same name once unprefixed are kept once, first one wins.
fn clean_start(e: &BytesStart, id: Option<&str>) -> Result<BytesStart<'static>, Error> {
    let mut cleaned = BytesStart::new(local_name(e));
    let mut has_id = false;
    let mut emitted: HashSet<&[u8]> = HashSet::new();

    for attr in e.attributes() {
        let attr = attr?;
        let raw_key = attr.key.as_ref();
        if raw_key == b"xmlns" || raw_key.starts_with(b"xmlns:") {
            continue;
        }

        // xml:lang and friends are bound by definition
        let key = match attr.key.prefix() {
            Some(prefix) if prefix.as_ref() == b"xml" => attr.key.into_inner(),
            _ => attr.key.local_name().into_inner(),
        };
        if !emitted.insert(key) {
            debug!(
                "dropping duplicate attribute {} of <{}>",
                String::from_utf8_lossy(key),
                local_name(e)
            );
            continue;
        }

        match id {
            Some(id) if key == b"id" => {
                cleaned.push_attribute(("id", id));
                has_id = true;
            }
            _ => push_attribute(&mut cleaned, key, &attr)?,
        }
    }

    if let Some(id) = id {
        if !has_id {
            cleaned.push_attribute(("id", id));
        }
    }

    Ok(cleaned)
}

/// Push an attribute, keeping its raw value unless it contains a double quote.
fn push_attribute(start: &mut BytesStart, key: &[u8], attr: &Attribute) -> Result<(), Error> {
    if attr.value.contains(&b'"') {
        let key = String::from_utf8_lossy(key);
        let value = attr.unescape_value()?;
        start.push_attribute((&*key, &*value));
    } else {
        start.push_attribute((key, &*attr.value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::processing::convert::NoConverter;

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<treebank>
<alpino_ds version="1.3">
  <metadata>
    <meta type="int" name="year" value="1990"/>
    <meta type="text" name="speaker" value="Jan &amp; Piet"/>
  </metadata>
  <node begin="0" cat="top" end="3" id="0" rel="--">
    <node begin="0" end="1" id="1" rel="su" word="Ik"/>
    <node begin="1" end="2" id="2" rel="hd" word="slaap"/>
    <node begin="2" end="3" id="3" rel="mod" word="nu"/>
  </node>
  <sentence>Ik slaap nu</sentence>
</alpino_ds>
<alpino_ds version="1.3" id="keep-me-not">
  <!-- no top end -->
  <node cat="top" id="0" rel="--">
    <node begin="0" end="1" id="1" rel="--" word="Ja"/>
  </node>
  <sentence>Ja</sentence>
</alpino_ds>
</treebank>"#;

    #[test]
    fn split_and_count() {
        let sentences = split_sentences(DOCUMENT, 1, "main", 0).unwrap();
        assert_eq!(sentences.len(), 2);

        assert_eq!(sentences[0].id(), "main:1:0");
        assert_eq!(sentences[0].words(), 3);
        assert!(sentences[0]
            .xml()
            .starts_with(r#"<alpino_ds version="1.3" id="main:1:0">"#));
        assert!(sentences[0].xml().ends_with("</alpino_ds>"));

        // existing ids are replaced in place
        assert_eq!(sentences[1].id(), "main:1:1");
        assert!(sentences[1]
            .xml()
            .starts_with(r#"<alpino_ds version="1.3" id="main:1:1">"#));
        assert!(!sentences[1].xml().contains("keep-me-not"));
        // counted manually
        assert_eq!(sentences[1].words(), 1);
        // comments are kept
        assert!(sentences[1].xml().contains("<!-- no top end -->"));
    }

    #[test]
    fn metadata_entries() {
        let sentences = split_sentences(DOCUMENT, 1, "main", 0).unwrap();
        assert_eq!(
            sentences[0].metadata(),
            &[
                MetaEntry {
                    name: "year".to_string(),
                    kind: Some("int".to_string()),
                    value: "1990".to_string()
                },
                MetaEntry {
                    name: "speaker".to_string(),
                    kind: Some("text".to_string()),
                    value: "Jan & Piet".to_string()
                },
            ]
        );
        assert!(sentences[1].metadata().is_empty());
    }

    #[test]
    fn namespaces_are_stripped() {
        let doc = r#"<a:alpino_ds xmlns:a="urn:alpino" xmlns="urn:default" a:version="1.3"><a:node a:begin="0" xml:lang="nl"/></a:alpino_ds>"#;
        let sentences = split_sentences(doc, 2, "sub", 0).unwrap();
        assert_eq!(
            sentences[0].xml(),
            r#"<alpino_ds version="1.3" id="sub:2:0"><node begin="0" xml:lang="nl"/></alpino_ds>"#
        );
        assert_eq!(sentences[0].words(), 1);
    }

    #[test]
    fn unprefixed_duplicates_are_dropped() {
        let doc = r#"<alpino_ds xmlns:a="urn:a" xmlns:b="urn:b"><node a:begin="0" b:begin="1" end="1"/></alpino_ds>"#;
        let sentences = split_sentences(doc, 1, "main", 0).unwrap();
        assert_eq!(
            sentences[0].xml(),
            r#"<alpino_ds id="main:1:0"><node begin="0" end="1"/></alpino_ds>"#
        );
        // still well-formed
        assert!(split_sentences(sentences[0].xml(), 1, "main", 0).is_ok());
    }

    #[test]
    fn first_index_offsets_ids() {
        let doc = "<alpino_ds/>";
        let sentences = split_sentences(doc, 4, "main", 7).unwrap();
        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].id(), "main:4:7");
        assert_eq!(sentences[0].xml(), r#"<alpino_ds id="main:4:7"/>"#);
        assert_eq!(sentences[0].words(), 0);
    }

    #[test]
    fn malformed_document() {
        let doc = "<alpino_ds><node begin=\"0\"></alpino_ds>";
        assert!(split_sentences(doc, 1, "main", 0).is_err());
    }

    #[test]
    fn normalize_alpino_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.xml");
        std::fs::write(&file, DOCUMENT).unwrap();

        let converter = NoConverter;
        let normalizer = Normalizer::new(&converter, InputFormat::Alpino);
        let mut discovery = MetadataDiscovery::new(100);
        let sentences = normalizer
            .normalize(&file, 3, "main", &mut discovery)
            .unwrap();

        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].id(), "main:3:0");
        assert_eq!(discovery.snapshot().len(), 2);
    }

    #[test]
    fn conversion_failure_skips_file() {
        let converter = NoConverter;
        let normalizer = Normalizer::new(&converter, InputFormat::Txt);
        let mut discovery = MetadataDiscovery::new(100);
        let sentences = normalizer
            .normalize(&PathBuf::from("missing.txt"), 1, "main", &mut discovery)
            .unwrap();
        assert!(sentences.is_empty());
    }
}

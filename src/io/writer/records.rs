/*! Corpus records

The pipeline reports what it creates (components, document sets, metadata facets) to a [CorpusRecords] implementation.
Their storage is up to the caller: [ManifestRecords] keeps them in a JSON manifest per corpus.
!*/
use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::processing::FieldDescriptor;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub slug: String,
    pub title: String,
    pub nr_sentences: u64,
    pub nr_words: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSetRecord {
    pub dbname: String,
    /// Slug of the owning component.
    pub component: String,
    /// Size in KiB.
    pub size: u64,
}

/// Persistence of corpus, component and document set records.
pub trait CorpusRecords {
    fn create_corpus(&mut self, slug: &str, title: &str) -> Result<(), Error>;
    /// Create or update a component record.
    fn save_component(&mut self, corpus: &str, component: &ComponentRecord) -> Result<(), Error>;
    fn save_document_set(&mut self, corpus: &str, record: &DocumentSetRecord)
        -> Result<(), Error>;
    fn save_metadata(&mut self, corpus: &str, fields: &[FieldDescriptor]) -> Result<(), Error>;
    fn mark_processed(&mut self, corpus: &str) -> Result<(), Error>;
    /// Delete a corpus and everything below it.
    ///
    /// Returns the names of the document sets that belonged to it.
    fn delete_corpus(&mut self, corpus: &str) -> Result<Vec<String>, Error>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentEntry {
    #[serde(flatten)]
    pub record: ComponentRecord,
    pub databases: Vec<DocumentSetRecord>,
}

/// Serialized form of a corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub slug: String,
    pub title: String,
    pub metadata: Vec<FieldDescriptor>,
    pub components: Vec<ComponentEntry>,
    /// Seconds since epoch.
    pub processed: Option<u64>,
}

impl Manifest {
    fn new(slug: &str, title: &str) -> Self {
        Self {
            slug: slug.to_string(),
            title: title.to_string(),
            metadata: Vec::new(),
            components: Vec::new(),
            processed: None,
        }
    }

    fn component_mut(&mut self, slug: &str) -> Option<&mut ComponentEntry> {
        self.components.iter_mut().find(|c| c.record.slug == slug)
    }
}

/// Keeps records in memory and writes `<dst>/<corpus>.json` after each change.
pub struct ManifestRecords {
    dst: PathBuf,
    manifests: HashMap<String, Manifest>,
}

impl ManifestRecords {
    pub fn new(dst: &Path) -> Self {
        Self {
            dst: dst.to_path_buf(),
            manifests: HashMap::new(),
        }
    }

    fn path(&self, corpus: &str) -> PathBuf {
        self.dst.join(format!("{}.json", corpus))
    }

    /// Whether a corpus is known, either in memory or on disk.
    pub fn contains(&self, corpus: &str) -> bool {
        self.manifests.contains_key(corpus) || self.path(corpus).exists()
    }

    pub fn get(&self, corpus: &str) -> Option<&Manifest> {
        self.manifests.get(corpus)
    }

    fn manifest_mut(&mut self, corpus: &str) -> Result<&mut Manifest, Error> {
        self.manifests
            .get_mut(corpus)
            .ok_or_else(|| Error::Custom(format!("unknown corpus {}", corpus)))
    }

    fn persist(&self, corpus: &str) -> Result<(), Error> {
        if let Some(manifest) = self.manifests.get(corpus) {
            let path = self.path(corpus);
            debug!("writing manifest {:?}", path);
            let w = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(w, manifest)?;
        }
        Ok(())
    }
}

impl CorpusRecords for ManifestRecords {
    fn create_corpus(&mut self, slug: &str, title: &str) -> Result<(), Error> {
        if self.contains(slug) {
            return Err(Error::Input(format!("Corpus {} already exists.", slug)));
        }
        self.manifests
            .insert(slug.to_string(), Manifest::new(slug, title));
        self.persist(slug)
    }

    fn save_component(&mut self, corpus: &str, component: &ComponentRecord) -> Result<(), Error> {
        let manifest = self.manifest_mut(corpus)?;
        match manifest.component_mut(&component.slug) {
            Some(entry) => entry.record = component.clone(),
            None => manifest.components.push(ComponentEntry {
                record: component.clone(),
                databases: Vec::new(),
            }),
        }
        self.persist(corpus)
    }

    fn save_document_set(
        &mut self,
        corpus: &str,
        record: &DocumentSetRecord,
    ) -> Result<(), Error> {
        let manifest = self.manifest_mut(corpus)?;
        let entry = manifest.component_mut(&record.component).ok_or_else(|| {
            Error::Custom(format!(
                "document set {} refers to unknown component {}",
                record.dbname, record.component
            ))
        })?;
        entry.databases.push(record.clone());
        self.persist(corpus)
    }

    fn save_metadata(&mut self, corpus: &str, fields: &[FieldDescriptor]) -> Result<(), Error> {
        self.manifest_mut(corpus)?.metadata = fields.to_vec();
        self.persist(corpus)
    }

    fn mark_processed(&mut self, corpus: &str) -> Result<(), Error> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.manifest_mut(corpus)?.processed = Some(now);
        self.persist(corpus)
    }

    fn delete_corpus(&mut self, corpus: &str) -> Result<Vec<String>, Error> {
        let names = self
            .manifests
            .remove(corpus)
            .map(|m| {
                m.components
                    .into_iter()
                    .flat_map(|c| c.databases.into_iter().map(|db| db.dbname))
                    .collect()
            })
            .unwrap_or_default();

        let path = self.path(corpus);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        info!("Deleted corpus {}", corpus);
        Ok(names)
    }
}

//! Corpus ingestion pipeline
//!
//! Ingests a corpus (single file, directory tree or archive of those) into the document store.
//!
//! # Processing
//! 1. [Upload::prepare] unpacks archives into a temporary directory, then groups the input files into components
//!   and resolves the input format.
//! 1. [Upload::process] normalizes the files of each component into sentences, gathers them into
//!   size-bounded blocks and writes each block as a document set. Metadata found along the way
//!   is turned into filter descriptors at the end of the run.
//! 1. [Upload::cleanup] removes the temporary directory and, if configured, the input.
//!
//! Every fatal error goes through a single path that marks the progress as failed, cleans up,
//! reports a failure event and hands the error back to the caller.
//! Records already written are left in place: rolling back is the caller's job.
use std::backtrace::Backtrace;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use tempfile::TempDir;

use crate::config::IngestConfig;
use crate::error::Error;
use crate::io::reader::{ComponentSet, InputFormat, Organizer, Unpacker};
use crate::io::writer::{ComponentRecord, CorpusRecords, DocumentSetRecord, DocumentStore};
use crate::processing::{chunk, Converter, FieldDescriptor, MetadataDiscovery, Normalizer};
use crate::progress::{Event, ProgressState, Reporter};
use crate::slug::SlugSet;

use super::pipeline::Pipeline;

/// External capabilities used by a run.
pub struct Services<'a> {
    pub converter: &'a dyn Converter,
    pub store: &'a mut dyn DocumentStore,
    pub records: &'a mut dyn CorpusRecords,
    pub unpacker: &'a dyn Unpacker,
    pub reporter: &'a dyn Reporter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Created,
    Prepared,
    Processing,
    Completed,
    Failed,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub format: InputFormat,
    pub components: Vec<ComponentRecord>,
    pub document_sets: Vec<DocumentSetRecord>,
    pub metadata: Vec<FieldDescriptor>,
    pub progress: ProgressState,
}

pub struct Upload<'a> {
    /// Corpus slug.
    corpus: String,
    input: Option<PathBuf>,
    format: InputFormat,
    config: IngestConfig,
    services: Services<'a>,

    state: State,
    progress: ProgressState,
    /// Where files are read from, once prepared.
    input_path: Option<PathBuf>,
    unpack_dir: Option<TempDir>,
    components: ComponentSet,
    input_deleted: bool,
}

impl<'a> Upload<'a> {
    /// `corpus` is the slug of an existing corpus record.
    pub fn new(
        corpus: &str,
        input: Option<PathBuf>,
        format: InputFormat,
        config: IngestConfig,
        services: Services<'a>,
    ) -> Self {
        Self {
            corpus: corpus.to_string(),
            input,
            format,
            config,
            services,
            state: State::Created,
            progress: ProgressState::default(),
            input_path: None,
            unpack_dir: None,
            components: ComponentSet::new(),
            input_deleted: false,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    /// Resolved format. Only meaningful after [Upload::prepare].
    pub fn format(&self) -> InputFormat {
        self.format
    }

    /// Components found by [Upload::prepare].
    pub fn components(&self) -> &ComponentSet {
        &self.components
    }

    /// Location files are read from (the unpack directory for archives).
    pub fn input_path(&self) -> Option<&Path> {
        self.input_path.as_deref()
    }

    /// Unpack (if the input is an archive) and inspect the input files.
    ///
    /// On success, components and format are available and processing can start.
    pub fn prepare(&mut self) -> Result<(), Error> {
        if self.state != State::Created {
            return Err(Error::State(format!(
                "prepare() can't be called in state {:?}",
                self.state
            )));
        }

        match self.prepare_files().and_then(|_| self.read_input_files()) {
            Ok(()) => {
                self.state = State::Prepared;
                Ok(())
            }
            Err(e) => Err(self.fail("Could not prepare upload", e)),
        }
    }

    /// Resolve the location of the input files, unpacking archives.
    fn prepare_files(&mut self) -> Result<(), Error> {
        let input = self.input.clone().ok_or_else(|| {
            Error::Input("No input file, archive or directory to read.".to_string())
        })?;

        if !input.exists() {
            return Err(Error::Input("Input file does not exist.".to_string()));
        }

        if !self.services.unpacker.is_archive(&input) {
            // directory or plain file, used as-is
            self.input_path = Some(input);
            return Ok(());
        }

        let dir = TempDir::new()?;
        let out_dir = dir.path().to_path_buf();
        self.unpack_dir = Some(dir);
        self.report_progress(Some("Unpacking"));

        if let Err(e) = self.services.unpacker.extract(&input, &out_dir) {
            debug!("could not unpack {:?}: {}", input, e);
            return Err(Error::Input(
                "Error unpacking file. Is it a valid archive?".to_string(),
            ));
        }

        self.input_path = Some(out_dir);
        Ok(())
    }

    /// Divide input files into components and probe the input format.
    fn read_input_files(&mut self) -> Result<(), Error> {
        let root = self.input_path.clone().ok_or_else(|| {
            Error::State("No input file or directory to read. Did you call prepare()?".to_string())
        })?;

        self.report_progress(Some("Reading input files"));
        let (format, components) = Organizer::new(self.format).organize(&root)?;
        if components.is_empty() {
            return Err(Error::Input("No input files found.".to_string()));
        }

        self.format = format;
        self.progress.total_files = components.total_files();
        self.progress.total_components = components.len();
        self.components = components;
        self.report_progress(None);
        Ok(())
    }

    /// Convert, chunk and store the prepared input files.
    pub fn process(&mut self) -> Result<Summary, Error> {
        match self.state {
            State::Prepared => (),
            State::Created => {
                let e = Error::State("prepare() has to be called first".to_string());
                return Err(self.fail("Could not process corpus", e));
            }
            state => {
                return Err(Error::State(format!(
                    "process() can't be called in state {:?}",
                    state
                )))
            }
        }

        self.process_components()
            .map_err(|e| self.fail("Could not process corpus", e))
    }

    fn process_components(&mut self) -> Result<Summary, Error> {
        if self.format.needs_conversion() && self.components.total_files() > 0 {
            self.services.converter.check()?;
        }
        self.services.store.check()?;
        self.state = State::Processing;

        let components = self.components.clone();
        let normalizer = Normalizer::new(self.services.converter, self.format);
        let mut discovery = MetadataDiscovery::new(self.config.max_metadata_options);
        let mut records = Vec::new();
        let mut document_sets = Vec::new();
        let mut slugs = SlugSet::new();

        for (idx, component) in components.iter().enumerate() {
            self.progress.processed_components += 1;
            self.report_progress(Some(&format!("Processing component {}", component.name)));

            let slug = slugs.insert(&component.name, idx);
            let mut record = ComponentRecord {
                slug: slug.clone(),
                title: component.name.clone(),
                nr_sentences: 0,
                nr_words: 0,
            };
            let files_before = self.progress.processed_files;
            let mut sequence = 0;

            let blocks = chunk(
                &normalizer,
                &mut discovery,
                &component.files,
                &slug,
                self.config.max_block_size,
            );
            for block in blocks {
                let block = block?;

                self.progress.words += block.words;
                self.progress.sentences += block.sentences;
                self.progress.processed_files = files_before + block.files;
                record.nr_words += block.words;
                record.nr_sentences += block.sentences;
                self.services.records.save_component(&self.corpus, &record)?;

                let dbname = format!(
                    "{}_{}_{}_{}",
                    self.config.database_prefix, self.corpus, slug, sequence
                )
                .to_uppercase();
                self.services.store.create_document_set(&dbname, &block.xml)?;
                let size = self.services.store.size_of(&dbname)? / 1024;

                let document_set = DocumentSetRecord {
                    dbname,
                    component: slug.clone(),
                    size,
                };
                self.services
                    .records
                    .save_document_set(&self.corpus, &document_set)?;
                document_sets.push(document_set);
                sequence += 1;

                // blocks can take a while to generate
                self.report_progress(None);
            }

            self.progress.processed_files = files_before + component.files.len();
            if sequence == 0 {
                warn!("Component {} has no sentences.", component.name);
            } else {
                records.push(record);
            }
        }

        let metadata = discovery.snapshot();
        self.services.records.save_metadata(&self.corpus, &metadata)?;
        self.services.records.mark_processed(&self.corpus)?;

        self.progress.done = true;
        self.state = State::Completed;
        self.report_progress(Some("Processing finished"));

        Ok(Summary {
            format: self.format,
            components: records,
            document_sets,
            metadata,
            progress: self.progress.clone(),
        })
    }

    /// Remove temporary files and, if configured, the input.
    ///
    /// Can be called any number of times, in any state.
    pub fn cleanup(&mut self) {
        if let Some(dir) = self.unpack_dir.take() {
            info!("Cleaning up {:?}", dir.path());
            if let Err(e) = dir.close() {
                warn!("Could not remove unpack directory: {}", e);
            }
        }

        if self.config.delete_input_files && !self.input_deleted {
            self.input_deleted = true;
            if let Some(input) = self.input.as_ref().filter(|p| p.exists()) {
                info!("Deleting input {:?}", input);
                let removed = if input.is_dir() {
                    std::fs::remove_dir_all(input)
                } else {
                    std::fs::remove_file(input)
                };
                if let Err(e) = removed {
                    warn!("Could not delete input {:?}: {}", input, e);
                }
            }
        }
    }

    fn report_progress(&mut self, message: Option<&str>) {
        if let Some(message) = message {
            self.progress.message = message.to_string();
        }
        info!("{}", self.progress);
        self.services
            .reporter
            .report(&Event::Progress(self.progress.clone()));
    }

    /// Abort the run: mark progress as failed, clean up and report the failure.
    ///
    /// Returns the error to hand back to the caller.
    fn fail(&mut self, context: &str, e: Error) -> Error {
        let message = format!("{}: {}", context, e);
        let backtrace = Backtrace::force_capture();
        error!("{}\n{}", message, backtrace);

        self.state = State::Failed;
        self.progress.error = Some(message);
        self.progress.done = true;
        self.progress.stack = Some(backtrace.to_string());
        self.cleanup();

        self.services.reporter.report(&Event::Failure {
            exc_type: e.kind().to_string(),
            exc_message: e.to_string(),
            progress: self.progress.clone(),
        });
        e
    }
}

impl<'a> Pipeline<Summary> for Upload<'a> {
    fn run(&mut self) -> Result<Summary, Error> {
        self.prepare()?;
        let summary = self.process()?;
        self.cleanup();
        Ok(summary)
    }
}

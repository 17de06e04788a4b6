//! # treebank-ingest
//!
//! Ingests linguistic corpora into a document store.
//!
//! ## Getting started
//!
//! ```sh
//! treebank-ingest 0.1.0
//! treebank ingestion tool.
//!
//! USAGE:
//!     treebank-ingest <SUBCOMMAND>
//!
//! FLAGS:
//!     -h, --help       Prints help information
//!     -V, --version    Prints version information
//!
//! SUBCOMMANDS:
//!     help       Prints this message or the help of the given subcommand(s)
//!     ingest     Ingest a corpus
//!     inspect    Show the detected format and components of a corpus
//! ```
//!
//! Document sets are written as `<dst>/<NAME>.xml`, records as `<dst>/<corpus>.json`.
//! Set `RUST_LOG=info` to follow progress.

use itertools::Itertools;
use structopt::StructOpt;
use tempfile::TempDir;
use treebank_ingest::error::Error;
use treebank_ingest::io::reader::ArchiveUnpacker;
use treebank_ingest::io::writer::{CorpusRecords, DirectoryStore, DocumentStore, ManifestRecords};
use treebank_ingest::pipelines::{Pipeline, Services, Upload};
use treebank_ingest::processing::{Converter, NoConverter, ProcessConverter};
use treebank_ingest::progress::LogReporter;
use treebank_ingest::slug::slugify;

#[macro_use]
extern crate log;

mod cli;

fn main() -> Result<(), Error> {
    env_logger::init();

    let opt = cli::TreebankIngest::from_args();
    debug!("cli args\n{:#?}", opt);

    match opt {
        cli::TreebankIngest::Ingest(i) => ingest(i)?,
        cli::TreebankIngest::Inspect(i) => inspect(i)?,
    };
    Ok(())
}

fn ingest(opt: cli::Ingest) -> Result<(), Error> {
    let config = opt.config()?;
    let slug = slugify(&opt.name);
    if slug.is_empty() {
        return Err(Error::Input(format!(
            "Corpus name {:?} has no usable characters.",
            opt.name
        )));
    }

    if !opt.dst.exists() {
        warn!("Destination does not exist. Creating");
        std::fs::create_dir_all(&opt.dst)?;
    }

    let converter: Box<dyn Converter> = match &opt.converter {
        Some(program) => Box::new(ProcessConverter::new(
            program.clone(),
            opt.converter_args.clone(),
        )),
        None => Box::new(NoConverter),
    };
    let mut store = DirectoryStore::new(&opt.dst);
    let mut records = ManifestRecords::new(&opt.dst);
    records.create_corpus(&slug, &opt.name)?;

    let result = {
        let services = Services {
            converter: &*converter,
            store: &mut store,
            records: &mut records,
            unpacker: &ArchiveUnpacker,
            reporter: &LogReporter,
        };
        Upload::new(&slug, Some(opt.input.clone()), opt.format, config, services).run()
    };

    match result {
        Ok(summary) => {
            info!(
                "Ingested {} ({}): {} components, {} document sets, {} metadata fields",
                slug,
                summary.format,
                summary.components.len(),
                summary.document_sets.len(),
                summary.metadata.len()
            );
            Ok(())
        }
        Err(e) => {
            rollback(&slug, &mut records, &mut store);
            Err(e)
        }
    }
}

/// Delete the corpus records and the document sets they refer to.
fn rollback(corpus: &str, records: &mut dyn CorpusRecords, store: &mut dyn DocumentStore) {
    match records.delete_corpus(corpus) {
        Ok(names) => {
            for name in names {
                if let Err(e) = store.drop_document_set(&name) {
                    error!("Could not delete document set {}: {}", name, e);
                }
            }
        }
        Err(e) => error!("Could not delete corpus {}: {}", corpus, e),
    }
}

fn inspect(opt: cli::Inspect) -> Result<(), Error> {
    // prepare() doesn't write anything
    let scratch = TempDir::new()?;
    let mut store = DirectoryStore::new(scratch.path());
    let mut records = ManifestRecords::new(scratch.path());
    let services = Services {
        converter: &NoConverter,
        store: &mut store,
        records: &mut records,
        unpacker: &ArchiveUnpacker,
        reporter: &LogReporter,
    };

    let mut upload = Upload::new(
        "inspect",
        Some(opt.input),
        opt.format,
        Default::default(),
        services,
    );
    upload.prepare()?;

    println!("format: {}", upload.format());
    for component in upload.components().iter() {
        println!(
            "{} ({} files): {}",
            component.name,
            component.files.len(),
            component.files.iter().map(|f| f.display()).join(", ")
        );
    }
    upload.cleanup();
    Ok(())
}

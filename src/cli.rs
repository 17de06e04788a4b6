//! Command line arguments and parameters management/parsing.
use std::path::PathBuf;

use structopt::StructOpt;
use treebank_ingest::config::IngestConfig;
use treebank_ingest::error::Error;
use treebank_ingest::io::InputFormat;

#[derive(Debug, StructOpt)]
#[structopt(name = "treebank-ingest", about = "treebank ingestion tool.")]
/// Holds every command that is callable by the `treebank-ingest` command.
pub enum TreebankIngest {
    #[structopt(about = "Ingest a corpus")]
    Ingest(Ingest),
    #[structopt(about = "Show the detected format and components of a corpus")]
    Inspect(Inspect),
}

#[derive(Debug, StructOpt)]
/// Ingest command and parameters.
///
/// ```sh
/// treebank-ingest-ingest 0.1.0
/// Ingest a corpus
///
/// USAGE:
///     treebank-ingest ingest [FLAGS] [OPTIONS] <input> <name> <dst>
///
/// ARGS:
///     <input>    input file, archive or directory
///     <name>     corpus name
///     <dst>      destination of document sets and manifest
/// ```
pub struct Ingest {
    #[structopt(parse(from_os_str), help = "input file, archive or directory")]
    pub input: PathBuf,
    #[structopt(help = "corpus name")]
    pub name: String,
    #[structopt(
        parse(from_os_str),
        help = "destination of document sets and manifest"
    )]
    pub dst: PathBuf,
    #[structopt(
        short = "f",
        long = "format",
        default_value = "auto",
        help = "input format (txt, chat, folia, alpino or auto)"
    )]
    pub format: InputFormat,
    #[structopt(
        parse(from_os_str),
        long = "converter",
        help = "program converting input files to Alpino XML. Called as <converter> [args..] <format> <file>"
    )]
    pub converter: Option<PathBuf>,
    #[structopt(
        long = "converter-arg",
        number_of_values = 1,
        help = "argument passed to the converter before format and file. Can be repeated."
    )]
    pub converter_args: Vec<String>,
    #[structopt(long = "max-block-size", help = "maximum block size (in bytes)")]
    pub max_block_size: Option<usize>,
    #[structopt(
        long = "max-metadata-options",
        help = "maximum number of distinct values of a checkbox metadata field"
    )]
    pub max_metadata_options: Option<usize>,
    #[structopt(long = "delete-input", help = "delete the input once processed")]
    pub delete_input: bool,
    #[structopt(
        parse(from_os_str),
        long = "config",
        help = "JSON configuration file. Command line options take precedence."
    )]
    pub config: Option<PathBuf>,
    #[structopt(long = "prefix", help = "prefix of document set names")]
    pub prefix: Option<String>,
}

impl Ingest {
    /// Configuration file (or defaults) overridden by command line options.
    pub fn config(&self) -> Result<IngestConfig, Error> {
        let mut config = match &self.config {
            Some(path) => IngestConfig::from_path(path)?,
            None => IngestConfig::default(),
        };

        if let Some(max_block_size) = self.max_block_size {
            config.max_block_size = max_block_size;
        }
        if let Some(max_metadata_options) = self.max_metadata_options {
            config.max_metadata_options = max_metadata_options;
        }
        if self.delete_input {
            config.delete_input_files = true;
        }
        if let Some(prefix) = &self.prefix {
            config.database_prefix = prefix.clone();
        }
        Ok(config)
    }
}

#[derive(Debug, StructOpt)]
/// Inspect command and parameters.
pub struct Inspect {
    #[structopt(parse(from_os_str), help = "input file, archive or directory")]
    pub input: PathBuf,
    #[structopt(
        short = "f",
        long = "format",
        default_value = "auto",
        help = "input format (txt, chat, folia, alpino or auto)"
    )]
    pub format: InputFormat,
}

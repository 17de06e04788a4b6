/*! Converter capability.

Turns a raw input file (plain text, CHAT, FoLiA) into annotated Alpino XML documents.
Parsing itself is out of our hands: [ProcessConverter] delegates it to an external program.
!*/
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;

use crate::error::Error;
use crate::io::reader::InputFormat;

pub trait Converter {
    /// Errors with [Error::Unavailable] if the converter can't be used.
    fn check(&self) -> Result<(), Error>;
    /// Convert a file, returning its annotated documents.
    fn convert(&self, file: &Path, format: InputFormat) -> Result<Vec<String>, Error>;
}

/// Runs `program [args..] <format> <file>` and reads one document from its standard output.
#[derive(Debug, Clone)]
pub struct ProcessConverter {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessConverter {
    pub fn new(program: PathBuf, args: Vec<String>) -> Self {
        Self { program, args }
    }
}

impl Converter for ProcessConverter {
    fn check(&self) -> Result<(), Error> {
        // only spawnability matters, not the exit status.
        Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|_| ())
            .map_err(|e| {
                Error::Unavailable(format!("Converter {:?} not available: {}", self.program, e))
            })
    }

    fn convert(&self, file: &Path, format: InputFormat) -> Result<Vec<String>, Error> {
        debug!("converting {:?} ({}) with {:?}", file, format, self.program);
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(format.annotator())
            .arg(file)
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(Error::Custom(format!(
                "converter exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let document = String::from_utf8(output.stdout)
            .map_err(|e| Error::Custom(format!("converter output is not UTF-8: {}", e)))?;
        Ok(vec![document])
    }
}

/// Stand-in when no converter is configured. Only Alpino corpora can be processed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoConverter;

impl Converter for NoConverter {
    fn check(&self) -> Result<(), Error> {
        Err(Error::Unavailable("No converter configured".to_string()))
    }

    fn convert(&self, file: &Path, _format: InputFormat) -> Result<Vec<String>, Error> {
        Err(Error::Unavailable(format!(
            "No converter configured to convert {:?}",
            file
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_converter() {
        assert!(NoConverter.check().is_err());
        assert!(NoConverter
            .convert(Path::new("a.txt"), InputFormat::Txt)
            .is_err());
    }

    #[test]
    fn missing_program() {
        let c = ProcessConverter::new(PathBuf::from("/no/such/converter"), vec![]);
        assert!(matches!(c.check(), Err(Error::Unavailable(_))));
        assert!(c.convert(Path::new("a.txt"), InputFormat::Txt).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn reads_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "<alpino_ds/>").unwrap();

        // $1 is the format, $2 the file
        let c = ProcessConverter::new(
            PathBuf::from("sh"),
            vec!["-c".to_string(), "cat \"$2\"".to_string(), "sh".to_string()],
        );
        c.check().unwrap();
        let docs = c.convert(&file, InputFormat::Txt).unwrap();
        assert_eq!(docs, vec!["<alpino_ds/>".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn failing_program() {
        let c = ProcessConverter::new(
            PathBuf::from("sh"),
            vec!["-c".to_string(), "echo boom >&2; exit 3".to_string(), "sh".to_string()],
        );
        match c.convert(Path::new("a.txt"), InputFormat::Txt) {
            Err(Error::Custom(msg)) => assert!(msg.contains("boom")),
            other => panic!("expected failure, got {:?}", other),
        }
    }
}

/*! Input format probing.

Files are classified by extension, and `.xml` files by a marker in their first two lines.
!*/
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Input formats a corpus can be made of.
///
/// [InputFormat::Auto] is resolved to a concrete format by the first recognized file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Txt,
    Chat,
    Folia,
    Alpino,
    #[default]
    Auto,
}

impl InputFormat {
    /// Whether files of this format must go through the converter.
    pub fn needs_conversion(&self) -> bool {
        !matches!(self, InputFormat::Alpino)
    }

    /// Name handed to the converter to pick a reader/annotator.
    pub fn annotator(&self) -> &'static str {
        match self {
            InputFormat::Txt => "txt",
            InputFormat::Chat => "chat",
            InputFormat::Folia => "folia",
            InputFormat::Alpino => "alpino",
            InputFormat::Auto => "auto",
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputFormat::Txt => "plain text",
            InputFormat::Chat => "CHAT",
            InputFormat::Folia => "FoLiA",
            InputFormat::Alpino => "Alpino",
            InputFormat::Auto => "auto-detect",
        };
        f.write_str(name)
    }
}

impl FromStr for InputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "txt" | "text" | "t" => Ok(InputFormat::Txt),
            "chat" | "cha" | "c" => Ok(InputFormat::Chat),
            "folia" | "f" => Ok(InputFormat::Folia),
            "alpino" | "a" => Ok(InputFormat::Alpino),
            "auto" | "" => Ok(InputFormat::Auto),
            other => Err(Error::Custom(format!("unknown input format: {}", other))),
        }
    }
}

/// Probe the format of a single file.
///
/// Returns `None` for unrecognized files, including `.xml` files that can't be read.
pub fn probe(path: &Path) -> Option<InputFormat> {
    let filename = path.to_string_lossy().to_lowercase();
    if filename.ends_with(".txt") {
        Some(InputFormat::Txt)
    } else if filename.ends_with(".cha") {
        Some(InputFormat::Chat)
    } else if filename.ends_with(".xml") {
        probe_xml(path).unwrap_or_else(|e| {
            debug!("could not read {:?} for probing: {}", path, e);
            None
        })
    } else {
        None
    }
}

/// look for a FoLiA or Alpino root marker in the first two lines.
fn probe_xml(path: &Path) -> Result<Option<InputFormat>, Error> {
    let f = BufReader::new(File::open(path)?);
    let mut head = String::new();
    for line in f.lines().take(2) {
        head.push_str(&line?);
        head.push('\n');
    }

    if head.contains("<FoLiA") {
        Ok(Some(InputFormat::Folia))
    } else if head.contains("<alpino_ds") {
        Ok(Some(InputFormat::Alpino))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::tempdir;

    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn by_extension() {
        let dir = tempdir().unwrap();
        let txt = write(dir.path(), "a.txt", "Hallo.");
        let cha = write(dir.path(), "b.CHA", "@Begin");
        let doc = write(dir.path(), "c.docx", "");

        assert_eq!(probe(&txt), Some(InputFormat::Txt));
        assert_eq!(probe(&cha), Some(InputFormat::Chat));
        assert_eq!(probe(&doc), None);
    }

    #[test]
    fn xml_markers() {
        let dir = tempdir().unwrap();
        let folia = write(
            dir.path(),
            "folia.xml",
            "<?xml version=\"1.0\"?>\n<FoLiA xmlns=\"http://ilk.uvt.nl/folia\">\n</FoLiA>",
        );
        let alpino = write(
            dir.path(),
            "alpino.xml",
            "<?xml version=\"1.0\"?>\n<treebank><alpino_ds version=\"1.3\">",
        );
        let other = write(dir.path(), "other.xml", "<?xml version=\"1.0\"?>\n<html>");

        assert_eq!(probe(&folia), Some(InputFormat::Folia));
        assert_eq!(probe(&alpino), Some(InputFormat::Alpino));
        assert_eq!(probe(&other), None);
    }

    #[test]
    fn marker_after_second_line() {
        let dir = tempdir().unwrap();
        let late = write(dir.path(), "late.xml", "<?xml?>\n<!-- c -->\n<alpino_ds>");
        assert_eq!(probe(&late), None);
    }

    #[test]
    fn parse_names() {
        assert_eq!("FoLiA".parse::<InputFormat>().unwrap(), InputFormat::Folia);
        assert_eq!("".parse::<InputFormat>().unwrap(), InputFormat::Auto);
        assert!("pdf".parse::<InputFormat>().is_err());
    }
}

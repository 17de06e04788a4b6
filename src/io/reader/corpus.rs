/*! Corpus organization

Groups the files of an input location into components:
files at the root go into `main`, each direct subdirectory becomes a component
holding every file found below it.
!*/
use std::path::{Path, PathBuf};

use glob::Pattern;
use log::{debug, warn};

use crate::error::Error;

use super::format::{probe, InputFormat};

/// Name of the component holding top-level files.
pub const MAIN_COMPONENT: &str = "main";

/// A named group of files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub name: String,
    pub files: Vec<PathBuf>,
}

/// Components, in discovery order. File order within a component is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentSet {
    components: Vec<Component>,
}

impl ComponentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file to a component, creating the component if needed.
    pub fn push(&mut self, component: &str, path: PathBuf) {
        match self.components.iter_mut().find(|c| c.name == component) {
            Some(c) => c.files.push(path),
            None => self.components.push(Component {
                name: component.to_string(),
                files: vec![path],
            }),
        }
    }

    pub fn get(&self, component: &str) -> Option<&[PathBuf]> {
        self.components
            .iter()
            .find(|c| c.name == component)
            .map(|c| c.files.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.components.iter()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn total_files(&self) -> usize {
        self.components.iter().map(|c| c.files.len()).sum()
    }
}

/// Walks an input location and sorts its files into a [ComponentSet].
///
/// The organizer locks the corpus format on the first recognized file.
/// Any later file of another format makes the whole corpus invalid.
pub struct Organizer {
    format: InputFormat,
    components: ComponentSet,
}

impl Organizer {
    /// `format` may be [InputFormat::Auto].
    pub fn new(format: InputFormat) -> Self {
        Self {
            format,
            components: ComponentSet::new(),
        }
    }

    /// Organize files found at `root`.
    ///
    /// Returns the (resolved) format with the components.
    /// The format stays [InputFormat::Auto] when no file was recognized.
    pub fn organize(mut self, root: &Path) -> Result<(InputFormat, ComponentSet), Error> {
        if root.is_file() {
            self.add_file(root, MAIN_COMPONENT)?;
            return Ok((self.format, self.components));
        }

        let escaped = Pattern::escape(&root.to_string_lossy());
        for entry in glob::glob(&format!("{}/*", escaped))? {
            let entry = entry?;
            if entry.is_file() {
                self.add_file(&entry, MAIN_COMPONENT)?;
            } else if entry.is_dir() {
                let name = match entry.file_name() {
                    Some(name) => name.to_string_lossy().into_owned(),
                    None => continue,
                };
                let subdir = Pattern::escape(&entry.to_string_lossy());
                for f in glob::glob(&format!("{}/**/*", subdir))? {
                    let f = f?;
                    if f.is_file() {
                        self.add_file(&f, &name)?;
                    }
                }
            }
        }

        Ok((self.format, self.components))
    }

    /// Include a file if its format is recognized and matches the corpus format.
    fn add_file(&mut self, path: &Path, component: &str) -> Result<(), Error> {
        let format = match probe(path) {
            Some(f) => f,
            None => {
                warn!("Unrecognized format for file {:?}", path);
                return Ok(());
            }
        };

        if self.format == InputFormat::Auto {
            debug!("detected input format {} from {:?}", format, path);
            self.format = format;
        }

        if self.format != format {
            return Err(Error::Input(format!(
                "Different input formats found ({} and {}).",
                format, self.format
            )));
        }

        self.components.push(component, path.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn main_and_subdir() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "Een zin.").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("b.txt"), "Nog een zin.").unwrap();

        let (format, components) = Organizer::new(InputFormat::Auto)
            .organize(dir.path())
            .unwrap();

        assert_eq!(format, InputFormat::Txt);
        assert_eq!(components.len(), 2);
        assert_eq!(
            components.get("main").unwrap(),
            &[dir.path().join("a.txt")][..]
        );
        assert_eq!(
            components.get("sub").unwrap(),
            &[dir.path().join("sub").join("b.txt")][..]
        );
    }

    #[test]
    fn nested_files_belong_to_top_subdir() {
        let dir = tempdir().unwrap();
        let deep = dir.path().join("interviews").join("2019").join("may");
        fs::create_dir_all(&deep).unwrap();
        fs::write(deep.join("x.cha"), "@Begin").unwrap();
        fs::write(dir.path().join("interviews").join("y.cha"), "@Begin").unwrap();

        let (format, components) = Organizer::new(InputFormat::Auto)
            .organize(dir.path())
            .unwrap();

        assert_eq!(format, InputFormat::Chat);
        assert_eq!(components.len(), 1);
        assert_eq!(components.get("interviews").unwrap().len(), 2);
        assert!(components.get("main").is_none());
    }

    #[test]
    fn single_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("only.cha");
        fs::write(&file, "@Begin").unwrap();

        let (format, components) = Organizer::new(InputFormat::Auto).organize(&file).unwrap();
        assert_eq!(format, InputFormat::Chat);
        assert_eq!(components.get("main").unwrap(), &[file][..]);
    }

    #[test]
    fn unrecognized_files_are_skipped() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "Een zin.").unwrap();
        fs::write(dir.path().join("README.md"), "# readme").unwrap();

        let (_, components) = Organizer::new(InputFormat::Auto)
            .organize(dir.path())
            .unwrap();
        assert_eq!(components.total_files(), 1);
    }

    #[test]
    fn mixed_formats() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "Een zin.").unwrap();
        fs::write(
            dir.path().join("b.xml"),
            "<FoLiA xmlns=\"http://ilk.uvt.nl/folia\">\n</FoLiA>",
        )
        .unwrap();

        let r = Organizer::new(InputFormat::Auto).organize(dir.path());
        match r {
            Err(Error::Input(msg)) => assert!(msg.starts_with("Different input formats found")),
            other => panic!("expected input error, got {:?}", other),
        }
    }

    #[test]
    fn declared_format_is_enforced() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "Een zin.").unwrap();

        let r = Organizer::new(InputFormat::Chat).organize(dir.path());
        assert!(matches!(r, Err(Error::Input(_))));
    }

    #[test]
    fn empty_dir() {
        let dir = tempdir().unwrap();
        let (format, components) = Organizer::new(InputFormat::Auto)
            .organize(dir.path())
            .unwrap();
        assert_eq!(format, InputFormat::Auto);
        assert!(components.is_empty());
    }
}

/*! Archive unpacking

Uploaded corpora may come as a zip file, a tarball (`.tar`, `.tar.gz`, `.tgz`) or as a single gzipped file.
!*/
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use flate2::read::MultiGzDecoder;
use log::debug;

use crate::error::Error;

/// Archive extraction capability.
pub trait Unpacker {
    fn is_archive(&self, path: &Path) -> bool;
    /// Extract the archive at `path` into the existing directory `out_dir`.
    fn extract(&self, path: &Path, out_dir: &Path) -> Result<(), Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveKind {
    Tar,
    TarGz,
    Gz,
    Zip,
}

impl ArchiveKind {
    fn of(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveKind::TarGz)
        } else if name.ends_with(".tar") {
            Some(ArchiveKind::Tar)
        } else if name.ends_with(".gz") {
            Some(ArchiveKind::Gz)
        } else if name.ends_with(".zip") {
            Some(ArchiveKind::Zip)
        } else {
            None
        }
    }
}

/// [Unpacker] for zip files, tarballs and gzipped files.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArchiveUnpacker;

impl Unpacker for ArchiveUnpacker {
    fn is_archive(&self, path: &Path) -> bool {
        path.is_file() && ArchiveKind::of(path).is_some()
    }

    fn extract(&self, path: &Path, out_dir: &Path) -> Result<(), Error> {
        let kind = ArchiveKind::of(path)
            .ok_or_else(|| Error::Input(format!("{:?} is not an archive", path)))?;
        debug!("extracting {:?} ({:?}) into {:?}", path, kind, out_dir);

        let f = BufReader::new(File::open(path)?);
        match kind {
            ArchiveKind::Tar => tar::Archive::new(f).unpack(out_dir)?,
            ArchiveKind::TarGz => tar::Archive::new(MultiGzDecoder::new(f)).unpack(out_dir)?,
            ArchiveKind::Gz => {
                // foo.txt.gz -> out_dir/foo.txt
                let stem = path
                    .file_stem()
                    .ok_or_else(|| Error::Input(format!("no file name: {:?}", path)))?;
                let mut dst = File::create(out_dir.join(stem))?;
                std::io::copy(&mut MultiGzDecoder::new(f), &mut dst)?;
            }
            ArchiveKind::Zip => zip::ZipArchive::new(f)?.extract(out_dir)?,
        }
        Ok(())
    }
}

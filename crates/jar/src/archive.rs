use std::{
    fmt,
    fs::File,
    io::{BufReader, Read, Seek},
    path::Path,
};

use log::{debug, trace};
use rebyte_class_file::ClassFile;
use zip::ZipArchive;

use crate::{ClassSource, JarError};

const CLASS_EXTENSION: &str = ".class";
const MAX_SIZE_HINT: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JarEntry {
    path: String,
    index: usize,
    size: u64,
}
impl JarEntry {
    /// Path inside the archive, without a leading slash, e.g. `META-INF/MANIFEST.MF`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Uncompressed size.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_class(&self) -> bool {
        self.path.ends_with(CLASS_EXTENSION)
    }

    /// `my/pkg/MyClass` for `my/pkg/MyClass.class`.
    pub fn class_name(&self) -> Option<&str> {
        self.path.strip_suffix(CLASS_EXTENSION)
    }
}

/// A jar (or any zip) split into class entries and everything else.
///
/// Both lists are sorted by path and leave out directories.
pub struct JarFile<R> {
    archive: ZipArchive<R>,
    class_entries: Vec<JarEntry>,
    auxiliary_entries: Vec<JarEntry>,
}
impl JarFile<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, JarError> {
        debug!("Opening {}", path.as_ref().display());
        JarFile::new(BufReader::new(File::open(path)?))
    }
}
impl<R: Read + Seek> JarFile<R> {
    pub fn new(reader: R) -> Result<Self, JarError> {
        let mut archive = ZipArchive::new(reader)?;

        let mut class_entries = Vec::new();
        let mut auxiliary_entries = Vec::new();
        for index in 0..archive.len() {
            let file = archive.by_index(index)?;
            if file.is_dir() || file.name().ends_with('/') || file.name().ends_with('\\') {
                continue;
            }

            let entry = JarEntry {
                path: file.name().to_owned(),
                index,
                size: file.size(),
            };
            trace!("Found {} ({} bytes)", entry.path, entry.size);

            if entry.is_class() {
                class_entries.push(entry);
            } else {
                auxiliary_entries.push(entry);
            }
        }

        class_entries.sort_by(|a, b| a.path.cmp(&b.path));
        auxiliary_entries.sort_by(|a, b| a.path.cmp(&b.path));

        debug!(
            "Read {} class entries and {} other entries",
            class_entries.len(),
            auxiliary_entries.len()
        );

        Ok(Self {
            archive,
            class_entries,
            auxiliary_entries,
        })
    }

    pub fn class_entries(&self) -> &[JarEntry] {
        &self.class_entries
    }

    pub fn auxiliary_entries(&self) -> &[JarEntry] {
        &self.auxiliary_entries
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.class_entries.iter().filter_map(JarEntry::class_name)
    }

    pub fn entry(&self, path: &str) -> Option<&JarEntry> {
        let entries = if path.ends_with(CLASS_EXTENSION) {
            &self.class_entries
        } else {
            &self.auxiliary_entries
        };

        entries
            .binary_search_by(|e| e.path.as_str().cmp(path))
            .ok()
            .map(|i| &entries[i])
    }

    /// Parses every class entry in path order. One bad class does not stop the others.
    pub fn parse_classes(&mut self) -> Vec<(String, Result<ClassFile, JarError>)> {
        let names = self.class_names().map(str::to_owned).collect::<Vec<_>>();
        names
            .into_iter()
            .map(|name| {
                let class_file = self.parse_class(&name);
                (name, class_file)
            })
            .collect()
    }
}
impl<R: Read + Seek> ClassSource for JarFile<R> {
    fn fetch_bytes(&mut self, path: &str) -> Result<Vec<u8>, JarError> {
        let index = self
            .entry(path)
            .map(|e| e.index)
            .ok_or_else(|| JarError::NotFound(path.to_owned()))?;

        read_entry(&mut self.archive, index)
    }
}
impl<R> fmt::Debug for JarFile<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JarFile")
            .field("class_entries", &self.class_entries.len())
            .field("auxiliary_entries", &self.auxiliary_entries.len())
            .finish()
    }
}

// The entry handle only lives for this call, whichever way it returns.
fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, index: usize) -> Result<Vec<u8>, JarError> {
    let mut file = archive.by_index(index)?;

    let mut data = Vec::with_capacity(size_hint(file.size()));
    file.read_to_end(&mut data)?;
    trace!("Read {} bytes from {}", data.len(), file.name());

    Ok(data)
}

// The size in the entry header is untrusted; read_to_end grows past the hint.
fn size_hint(declared: u64) -> usize {
    usize::try_from(declared).map_or(MAX_SIZE_HINT, |n| n.min(MAX_SIZE_HINT))
}

#[cfg(test)]
mod size_hint_tests {
    use super::*;

    #[test]
    fn it_should_trust_small_sizes() {
        assert_eq!(size_hint(0), 0);
        assert_eq!(size_hint(1234), 1234);
    }

    #[test]
    fn it_should_cap_declared_sizes() {
        assert_eq!(size_hint(1 << 21), MAX_SIZE_HINT);
        assert_eq!(size_hint(u64::MAX), MAX_SIZE_HINT);
    }
}

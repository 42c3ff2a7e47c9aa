use std::{fs, io::ErrorKind, path::PathBuf};

use rebyte_class_file::ClassFile;

use crate::JarError;

/// Something that can hand over the complete bytes of a named entry.
pub trait ClassSource {
    fn fetch_bytes(&mut self, path: &str) -> Result<Vec<u8>, JarError>;

    /// Looks up `my/pkg/MyClass` as `my/pkg/MyClass.class` and parses it.
    fn parse_class(&mut self, class_name: &str) -> Result<ClassFile, JarError> {
        let path = format!("{}.class", class_name);
        let bytes = self.fetch_bytes(&path)?;
        ClassFile::parse(&bytes).map_err(|e| JarError::ClassFile(path, e))
    }
}

/// Entries are files below a root directory.
pub struct DirectorySource {
    dir: PathBuf,
}
impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}
impl ClassSource for DirectorySource {
    fn fetch_bytes(&mut self, path: &str) -> Result<Vec<u8>, JarError> {
        match fs::read(self.dir.join(path)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(JarError::NotFound(path.to_owned())),
            Err(e) => Err(e.into()),
        }
    }
}

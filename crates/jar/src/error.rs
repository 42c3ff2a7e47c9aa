use rebyte_class_file::ClassFileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JarError {
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    #[error("Entry not found: {0}")]
    NotFound(String),
    #[error("Failed to parse {0}: {1}")]
    ClassFile(String, #[source] ClassFileError),
}

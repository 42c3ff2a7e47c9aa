// https://docs.oracle.com/javase/8/docs/technotes/guides/jar/jar.html

mod archive;
mod error;
mod source;

pub use archive::{JarEntry, JarFile};
pub use error::JarError;
pub use source::{ClassSource, DirectorySource};

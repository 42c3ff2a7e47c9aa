// https://docs.oracle.com/javase/specs/jvms/se19/html/jvms-4.html

mod access_flags;
pub mod attributes;
mod class_file;
#[macro_use]
pub mod constant_pool;
mod cursor;
mod error;
pub mod mutf8;
mod parser;

pub use self::class_file::{ClassFile, FieldInfo, MethodInfo};
pub use access_flags::{ClassAccessFlags, FieldAccessFlags, MethodAccessFlags};
pub use constant_pool::ConstantPool;
pub use cursor::ByteCursor;
pub use error::{ClassFileError, Stage};
pub use mutf8::JavaString;
pub use parser::Parser;

pub type Result<T, E = ClassFileError> = std::result::Result<T, E>;

use std::fmt;

use thiserror::Error;

use crate::{constant_pool::CpTag, mutf8::MalformedTextError};

#[derive(Error, Debug)]
pub enum ClassFileError {
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    #[error("{stage} stage starting at byte {offset} failed: {source}")]
    Structural {
        stage: Stage,
        offset: usize,
        #[source]
        source: Box<ClassFileError>,
    },
    #[error("Unexpected end of input at byte {offset}: needed {needed} bytes, {remaining} left")]
    UnexpectedEndOfInput {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    #[error("Invalid magic identifier: 0x{0:X}")]
    InvalidMagicIdentifier(u32),
    #[error("Invalid cp info tag {tag} at byte {offset}")]
    UnknownConstantTag { tag: u8, offset: usize },
    #[error("{0} trailing bytes after the last attribute")]
    TrailingBytes(usize),
    #[error("Invalid constant pool reference: {0}")]
    InvalidReference(u16),
    #[error("Expected {expected}, found {actual}")]
    TypeMismatch { expected: CpTag, actual: CpTag },
    #[error(transparent)]
    MalformedText(#[from] MalformedTextError),
}
impl ClassFileError {
    /// The error beneath any stage context.
    pub fn root_cause(&self) -> &ClassFileError {
        match self {
            ClassFileError::Structural { source, .. } => source.root_cause(),
            e => e,
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            ClassFileError::Structural { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// The parser's states, in the order the class file lays them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Magic,
    Version,
    ConstantPoolCount,
    ConstantPoolEntries,
    AccessFlags,
    ThisAndSuper,
    Interfaces,
    Fields,
    Methods,
    Attributes,
    Done,
}
impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Magic => "magic",
            Stage::Version => "version",
            Stage::ConstantPoolCount => "constant pool count",
            Stage::ConstantPoolEntries => "constant pool entries",
            Stage::AccessFlags => "access flags",
            Stage::ThisAndSuper => "this/super class",
            Stage::Interfaces => "interfaces",
            Stage::Fields => "fields",
            Stage::Methods => "methods",
            Stage::Attributes => "attributes",
            Stage::Done => "end of class",
        })
    }
}

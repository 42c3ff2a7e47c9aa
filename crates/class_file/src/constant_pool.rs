use std::{convert::TryFrom, fmt, sync::OnceLock};

use crate::{
    mutf8::{self, JavaString, MalformedTextError},
    ClassFileError, Result,
};

/// Typed access to a constant pool entry by variant name.
///
/// Evaluates to `Result<&Inner, ClassFileError>`, failing with
/// `InvalidReference` for unusable indices and `TypeMismatch` when the entry
/// is of another kind.
#[macro_export]
macro_rules! matches_cp_info {
    ($cp:expr, $index:expr, $i:ident) => {
        match $cp.get($index) {
            Ok($crate::constant_pool::CpInfo::$i(n)) => Ok(n),
            Ok(c) => Err($crate::ClassFileError::TypeMismatch {
                expected: $crate::constant_pool::CpTag::$i,
                actual: c.tag(),
            }),
            Err(e) => Err(e),
        }
    };
}

#[derive(Debug)]
enum Slot {
    Entry(CpInfo),
    // The index after a Long or Double
    Unusable,
}

/// The constant pool, addressed with the format's 1-based indices.
#[derive(Debug)]
pub struct ConstantPool {
    count: u16,
    slots: Vec<Slot>,
}
impl ConstantPool {
    pub(crate) fn with_count(count: u16) -> Self {
        Self {
            count,
            slots: Vec::with_capacity(count.saturating_sub(1) as usize),
        }
    }

    pub(crate) fn push(&mut self, cp_info: CpInfo) {
        let slot_size = cp_info.tag().slot_size();
        self.slots.push(Slot::Entry(cp_info));
        (1..slot_size).for_each(|_| self.slots.push(Slot::Unusable));
    }

    /// The declared `constant_pool_count`, one more than the highest valid index.
    pub fn len(&self) -> u16 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count <= 1
    }

    pub fn get(&self, index: u16) -> Result<&CpInfo> {
        if index == 0 || index >= self.count {
            return Err(ClassFileError::InvalidReference(index));
        }

        match self.slots.get(index as usize - 1) {
            Some(Slot::Entry(cp_info)) => Ok(cp_info),
            _ => Err(ClassFileError::InvalidReference(index)),
        }
    }

    pub fn get_utf8(&self, index: u16) -> Result<&JavaString> {
        Ok(matches_cp_info!(self, index, Utf8)?.text()?)
    }

    pub fn get_class(&self, index: u16) -> Result<&ClassInfo> {
        matches_cp_info!(self, index, Class)
    }

    /// Resolves a `CONSTANT_Class` entry to its name.
    pub fn get_class_name(&self, index: u16) -> Result<&JavaString> {
        let ClassInfo { name_index } = self.get_class(index)?;
        self.get_utf8(*name_index)
    }

    pub fn get_string(&self, index: u16) -> Result<&JavaString> {
        let StringInfo { string_index } = matches_cp_info!(self, index, String)?;
        self.get_utf8(*string_index)
    }

    pub fn get_name_and_type(&self, index: u16) -> Result<&NameAndTypeInfo> {
        matches_cp_info!(self, index, NameAndType)
    }

    /// Entries with their external index, skipping the slots after wide entries.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &CpInfo)> + '_ {
        self.slots
            .iter()
            .take(self.count.saturating_sub(1) as usize)
            .enumerate()
            .filter_map(|(i, slot)| match slot {
                Slot::Entry(cp_info) => Some((i as u16 + 1, cp_info)),
                Slot::Unusable => None,
            })
    }
}
impl FromIterator<CpInfo> for ConstantPool {
    fn from_iter<I: IntoIterator<Item = CpInfo>>(iter: I) -> Self {
        let mut pool = ConstantPool::with_count(1);
        for cp_info in iter {
            pool.push(cp_info);
        }
        // Indices are u16, so anything past 65534 slots is out of reach.
        pool.count = u16::try_from(pool.slots.len() + 1).unwrap_or(u16::MAX);
        pool
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpTag {
    Utf8 = 1,
    Integer = 3,
    Float = 4,
    Long = 5,
    Double = 6,
    Class = 7,
    String = 8,
    FieldRef = 9,
    MethodRef = 10,
    InterfaceMethodRef = 11,
    NameAndType = 12,
    MethodHandle = 15,
    MethodType = 16,
    Dynamic = 17,
    InvokeDynamic = 18,
    Module = 19,
    Package = 20,
}
impl CpTag {
    /// Number of pool indices an entry of this kind takes up.
    pub fn slot_size(self) -> usize {
        match self {
            CpTag::Long | CpTag::Double => 2,
            _ => 1,
        }
    }
}
impl TryFrom<u8> for CpTag {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(CpTag::Utf8),
            3 => Ok(CpTag::Integer),
            4 => Ok(CpTag::Float),
            5 => Ok(CpTag::Long),
            6 => Ok(CpTag::Double),
            7 => Ok(CpTag::Class),
            8 => Ok(CpTag::String),
            9 => Ok(CpTag::FieldRef),
            10 => Ok(CpTag::MethodRef),
            11 => Ok(CpTag::InterfaceMethodRef),
            12 => Ok(CpTag::NameAndType),
            15 => Ok(CpTag::MethodHandle),
            16 => Ok(CpTag::MethodType),
            17 => Ok(CpTag::Dynamic),
            18 => Ok(CpTag::InvokeDynamic),
            19 => Ok(CpTag::Module),
            20 => Ok(CpTag::Package),
            _ => Err(value),
        }
    }
}
impl fmt::Display for CpTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CpTag::Utf8 => "Utf8",
            CpTag::Integer => "Integer",
            CpTag::Float => "Float",
            CpTag::Long => "Long",
            CpTag::Double => "Double",
            CpTag::Class => "Class",
            CpTag::String => "String",
            CpTag::FieldRef => "Fieldref",
            CpTag::MethodRef => "Methodref",
            CpTag::InterfaceMethodRef => "InterfaceMethodref",
            CpTag::NameAndType => "NameAndType",
            CpTag::MethodHandle => "MethodHandle",
            CpTag::MethodType => "MethodType",
            CpTag::Dynamic => "Dynamic",
            CpTag::InvokeDynamic => "InvokeDynamic",
            CpTag::Module => "Module",
            CpTag::Package => "Package",
        };
        write!(f, "CONSTANT_{}", name)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum CpInfo {
    Utf8(Utf8Info),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(ClassInfo),
    String(StringInfo),
    FieldRef(RefInfo),
    MethodRef(RefInfo),
    InterfaceMethodRef(RefInfo),
    NameAndType(NameAndTypeInfo),
    MethodHandle(MethodHandleInfo),
    MethodType(MethodTypeInfo),
    Dynamic(DynamicInfo),
    InvokeDynamic(DynamicInfo),
    Module(ModuleInfo),
    Package(PackageInfo),
}
impl CpInfo {
    pub fn tag(&self) -> CpTag {
        match self {
            CpInfo::Utf8(_) => CpTag::Utf8,
            CpInfo::Integer(_) => CpTag::Integer,
            CpInfo::Float(_) => CpTag::Float,
            CpInfo::Long(_) => CpTag::Long,
            CpInfo::Double(_) => CpTag::Double,
            CpInfo::Class(_) => CpTag::Class,
            CpInfo::String(_) => CpTag::String,
            CpInfo::FieldRef(_) => CpTag::FieldRef,
            CpInfo::MethodRef(_) => CpTag::MethodRef,
            CpInfo::InterfaceMethodRef(_) => CpTag::InterfaceMethodRef,
            CpInfo::NameAndType(_) => CpTag::NameAndType,
            CpInfo::MethodHandle(_) => CpTag::MethodHandle,
            CpInfo::MethodType(_) => CpTag::MethodType,
            CpInfo::Dynamic(_) => CpTag::Dynamic,
            CpInfo::InvokeDynamic(_) => CpTag::InvokeDynamic,
            CpInfo::Module(_) => CpTag::Module,
            CpInfo::Package(_) => CpTag::Package,
        }
    }
}

/// Raw modified UTF-8 bytes, decoded on first use.
///
/// The decoded text (or the decode error) is computed once and shared by
/// every later reader, from any thread.
#[derive(Clone)]
pub struct Utf8Info {
    bytes: Vec<u8>,
    text: OnceLock<std::result::Result<JavaString, MalformedTextError>>,
}
impl Utf8Info {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            text: OnceLock::new(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn text(&self) -> std::result::Result<&JavaString, MalformedTextError> {
        self.text
            .get_or_init(|| mutf8::decode(&self.bytes))
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn is_decoded(&self) -> bool {
        self.text.get().is_some()
    }
}
impl From<&str> for Utf8Info {
    fn from(s: &str) -> Self {
        Self::new(mutf8::encode_str(s))
    }
}
impl PartialEq for Utf8Info {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}
impl fmt::Debug for Utf8Info {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text() {
            Ok(text) => write!(f, "Utf8Info({:?})", text),
            Err(_) => write!(f, "Utf8Info(malformed {:?})", self.bytes),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct RefInfo {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ClassInfo {
    // Must point at a CONSTANT_Utf8 holding a binary name in internal form;
    // checked on first typed access, not while parsing.
    pub name_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct StringInfo {
    pub string_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct NameAndTypeInfo {
    pub name_index: u16,
    pub descriptor_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct DynamicInfo {
    pub bootstrap_method_attr_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct MethodHandleInfo {
    pub reference_kind: u8,
    pub reference_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct MethodTypeInfo {
    pub descriptor_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ModuleInfo {
    pub name_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct PackageInfo {
    pub name_index: u16,
}

#[cfg(test)]
mod get_tests {
    use super::*;

    fn pool() -> ConstantPool {
        vec![
            CpInfo::Long(1 << 40),
            CpInfo::Class(ClassInfo { name_index: 4 }),
            CpInfo::Utf8(Utf8Info::from("java/lang/Object")),
            CpInfo::Double(0.5),
            CpInfo::Integer(-7),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn it_should_count_wide_entries_twice() {
        assert_eq!(pool().len(), 8);
    }

    #[test]
    fn it_should_saturate_the_count_of_an_oversized_pool() {
        let pool = (0..=u16::MAX as i32)
            .map(CpInfo::Integer)
            .collect::<ConstantPool>();

        assert_eq!(pool.len(), u16::MAX);
        assert_eq!(pool.get(u16::MAX - 1).unwrap(), &CpInfo::Integer(65533));
        assert!(matches!(
            pool.get(u16::MAX),
            Err(ClassFileError::InvalidReference(u16::MAX))
        ));
        assert_eq!(pool.iter().count(), u16::MAX as usize - 1);
        assert_eq!(pool.iter().last().map(|(i, _)| i), Some(u16::MAX - 1));
    }

    #[test]
    fn it_should_reject_index_zero() {
        assert!(matches!(
            pool().get(0),
            Err(ClassFileError::InvalidReference(0))
        ));
        assert!(matches!(
            ConstantPool::with_count(1).get(0),
            Err(ClassFileError::InvalidReference(0))
        ));
    }

    #[test]
    fn it_should_skip_the_slot_after_a_wide_entry() {
        let pool = pool();

        assert_eq!(pool.get(1).unwrap(), &CpInfo::Long(1 << 40));
        assert!(matches!(
            pool.get(2),
            Err(ClassFileError::InvalidReference(2))
        ));
        assert_eq!(
            pool.get(3).unwrap(),
            &CpInfo::Class(ClassInfo { name_index: 4 })
        );
        assert!(matches!(
            pool.get(6),
            Err(ClassFileError::InvalidReference(6))
        ));
        assert_eq!(pool.get(7).unwrap(), &CpInfo::Integer(-7));
    }

    #[test]
    fn it_should_reject_indices_past_the_end() {
        assert!(matches!(
            pool().get(8),
            Err(ClassFileError::InvalidReference(8))
        ));
    }

    #[test]
    fn it_should_list_entries_with_their_indices() {
        let indices = pool().iter().map(|(i, _)| i).collect::<Vec<_>>();

        assert_eq!(indices, vec![1, 3, 4, 5, 7]);
    }
}


#[cfg(test)]
mod cp_tag_tests {
    use super::*;

    #[test]
    fn it_should_map_every_tag_in_the_table() {
        for tag in [1, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 15, 16, 17, 18, 19, 20] {
            assert_eq!(CpTag::try_from(tag).unwrap() as u8, tag);
        }
    }

    #[test]
    fn it_should_reject_unassigned_tags() {
        for tag in [0, 2, 13, 14, 21, 255] {
            assert_eq!(CpTag::try_from(tag), Err(tag));
        }
    }
}

use std::io::Read;

use crate::{
    access_flags::{ClassAccessFlags, FieldAccessFlags, MethodAccessFlags},
    attributes::Attributes,
    mutf8::JavaString,
    parser::Parser,
    ConstantPool, Result,
};

/// A fully decoded class file. Built in one go by [`Parser`] and read-only
/// afterwards, so it can be shared between threads as is.
#[derive(Debug)]
pub struct ClassFile {
    pub(crate) magic: u32,
    pub(crate) minor_version: u16,
    pub(crate) major_version: u16,
    pub(crate) constant_pool: ConstantPool,
    pub(crate) access_flags: ClassAccessFlags,
    pub(crate) raw_access_flags: u16,
    pub(crate) this_class: u16,
    pub(crate) super_class: u16,
    pub(crate) interfaces: Vec<u16>,
    pub(crate) fields: Vec<FieldInfo>,
    pub(crate) methods: Vec<MethodInfo>,
    pub(crate) attributes: Attributes,
}
impl ClassFile {
    pub fn parse(bytes: &[u8]) -> Result<ClassFile> {
        Parser::new(bytes).parse()
    }

    /// Buffers the whole of `r` before parsing.
    pub fn read_from(mut r: impl Read) -> Result<ClassFile> {
        let mut bytes = Vec::new();
        r.read_to_end(&mut bytes)?;
        Self::parse(&bytes)
    }

    pub fn magic(&self) -> u32 {
        self.magic
    }

    pub fn minor_version(&self) -> u16 {
        self.minor_version
    }

    pub fn major_version(&self) -> u16 {
        self.major_version
    }

    pub fn constant_pool(&self) -> &ConstantPool {
        &self.constant_pool
    }

    pub fn access_flags(&self) -> ClassAccessFlags {
        self.access_flags
    }

    /// The access flags as stored, bits without a named flag included.
    pub fn raw_access_flags(&self) -> u16 {
        self.raw_access_flags
    }

    pub fn this_class(&self) -> u16 {
        self.this_class
    }

    /// Zero when there is no superclass.
    pub fn super_class_index(&self) -> u16 {
        self.super_class
    }

    pub fn interfaces(&self) -> &[u16] {
        &self.interfaces
    }

    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    pub fn methods(&self) -> &[MethodInfo] {
        &self.methods
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn class_name(&self) -> Result<&JavaString> {
        // The this_class item must point at a CONSTANT_Class entry naming the
        // class or interface defined by this file.
        self.constant_pool.get_class_name(self.this_class)
    }

    pub fn super_class(&self) -> Result<Option<&JavaString>> {
        // Only java/lang/Object has no direct superclass, and it says so with
        // a zero index rather than a CONSTANT_Class entry.
        if self.super_class == 0 {
            return Ok(None);
        }

        Ok(Some(self.constant_pool.get_class_name(self.super_class)?))
    }

    pub fn interface_names(&self) -> Result<Vec<&JavaString>> {
        self.interfaces
            .iter()
            .map(|&i| self.constant_pool.get_class_name(i))
            .collect()
    }

    pub fn field_name(&self, field: &FieldInfo) -> Result<&JavaString> {
        self.constant_pool.get_utf8(field.name_index)
    }

    pub fn field_descriptor(&self, field: &FieldInfo) -> Result<&JavaString> {
        self.constant_pool.get_utf8(field.descriptor_index)
    }

    pub fn method_name(&self, method: &MethodInfo) -> Result<&JavaString> {
        self.constant_pool.get_utf8(method.name_index)
    }

    pub fn method_descriptor(&self, method: &MethodInfo) -> Result<&JavaString> {
        self.constant_pool.get_utf8(method.descriptor_index)
    }

    pub fn find_field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields
            .iter()
            .find(|f| matches!(self.field_name(f), Ok(n) if n == name))
    }

    pub fn find_method(&self, name: &str, descriptor: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| {
            matches!(self.method_name(m), Ok(n) if n == name)
                && matches!(self.method_descriptor(m), Ok(d) if d == descriptor)
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub access_flags: FieldAccessFlags,
    pub raw_access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    pub access_flags: MethodAccessFlags,
    pub raw_access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Attributes,
}

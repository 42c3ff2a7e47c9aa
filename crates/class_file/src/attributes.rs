use std::fmt;

use crate::{mutf8::JavaString, ConstantPool, Result};

/// A named attribute whose payload is kept as opaque bytes.
#[derive(Clone, PartialEq)]
pub struct AttributeInfo {
    pub attribute_name_index: u16,
    pub info: Vec<u8>,
}
impl AttributeInfo {
    pub fn name<'a>(&self, constant_pool: &'a ConstantPool) -> Result<&'a JavaString> {
        constant_pool.get_utf8(self.attribute_name_index)
    }
}
impl fmt::Debug for AttributeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeInfo")
            .field("attribute_name_index", &self.attribute_name_index)
            .field("info", &format!("({} bytes)", self.info.len()))
            .finish()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Attributes(pub Vec<AttributeInfo>);
impl Attributes {
    pub fn find_by_name(&self, name: &str, constant_pool: &ConstantPool) -> Option<&AttributeInfo> {
        for a in &self.0 {
            let Ok(s) = a.name(constant_pool) else {
                continue;
            };

            if s == name {
                return Some(a);
            }
        }

        None
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AttributeInfo> {
        self.0.iter()
    }
}
impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a AttributeInfo;
    type IntoIter = std::slice::Iter<'a, AttributeInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

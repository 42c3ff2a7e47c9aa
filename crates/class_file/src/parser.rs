use std::convert::TryFrom;

use log::{debug, trace};

use crate::{
    access_flags::{ClassAccessFlags, FieldAccessFlags, MethodAccessFlags},
    attributes::{AttributeInfo, Attributes},
    class_file::{FieldInfo, MethodInfo},
    constant_pool::{
        ClassInfo, CpInfo, CpTag, DynamicInfo, MethodHandleInfo, MethodTypeInfo, ModuleInfo,
        NameAndTypeInfo, PackageInfo, RefInfo, StringInfo, Utf8Info,
    },
    cursor::ByteCursor,
    ClassFile, ClassFileError, ConstantPool, Result, Stage,
};

const MAGIC: u32 = 0xCAFEBABE;

/// Decodes one class file, stage by stage, from a complete buffer.
///
/// Any failure aborts the whole parse and is reported once, wrapped in
/// [`ClassFileError::Structural`] with the stage it happened in.
pub struct Parser<'a> {
    r: ByteCursor<'a>,
}
impl<'a> Parser<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            r: ByteCursor::new(bytes),
        }
    }

    pub fn parse(mut self) -> Result<ClassFile> {
        let magic = self.stage(Stage::Magic, Self::parse_magic_identifier)?;
        let (minor_version, major_version) = self.stage(Stage::Version, Self::parse_version)?;

        let constant_pool_count = self.stage(Stage::ConstantPoolCount, |p| p.r.read_u16())?;
        let constant_pool = self.stage(Stage::ConstantPoolEntries, |p| {
            p.parse_constant_pool(constant_pool_count)
        })?;

        // A buffer that stops right after the pool carries no class body.
        if self.r.is_empty() {
            debug!(
                "Class file v{}.{} ends after its {} constant pool slots",
                major_version, minor_version, constant_pool_count
            );
            return Ok(ClassFile {
                magic,
                minor_version,
                major_version,
                constant_pool,
                access_flags: ClassAccessFlags::empty(),
                raw_access_flags: 0,
                this_class: 0,
                super_class: 0,
                interfaces: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
                attributes: Attributes::default(),
            });
        }

        let raw_access_flags = self.stage(Stage::AccessFlags, |p| p.r.read_u16())?;
        let access_flags = ClassAccessFlags::from_raw(raw_access_flags);
        let (this_class, super_class) = self.stage(Stage::ThisAndSuper, |p| {
            Ok((p.r.read_u16()?, p.r.read_u16()?))
        })?;

        let interfaces = self.stage(Stage::Interfaces, |p| {
            let interfaces_count = p.r.read_u16()?;
            p.r.read_u16_list(interfaces_count)
        })?;

        let fields = self.stage(Stage::Fields, |p| {
            let fields_count = p.r.read_u16()?;
            (0..fields_count)
                .map(|_| p.parse_field_info())
                .collect::<Result<Vec<_>>>()
        })?;

        let methods = self.stage(Stage::Methods, |p| {
            let methods_count = p.r.read_u16()?;
            (0..methods_count)
                .map(|_| p.parse_method_info())
                .collect::<Result<Vec<_>>>()
        })?;

        let attributes = self.stage(Stage::Attributes, Self::parse_attributes)?;

        self.stage(Stage::Done, |p| match p.r.remaining() {
            0 => Ok(()),
            n => Err(ClassFileError::TrailingBytes(n)),
        })?;

        debug!(
            "Parsed class file v{}.{}: {} constant pool slots, {} interfaces, {} fields, {} methods, {} attributes",
            major_version,
            minor_version,
            constant_pool_count,
            interfaces.len(),
            fields.len(),
            methods.len(),
            attributes.len()
        );

        Ok(ClassFile {
            magic,
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            raw_access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    fn stage<T>(&mut self, stage: Stage, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let offset = self.r.position();
        trace!("Entering {} stage at byte {}", stage, offset);

        f(self).map_err(|source| ClassFileError::Structural {
            stage,
            offset,
            source: Box::new(source),
        })
    }

    fn parse_magic_identifier(&mut self) -> Result<u32> {
        match self.r.read_u32()? {
            MAGIC => Ok(MAGIC),
            magic_identifier => Err(ClassFileError::InvalidMagicIdentifier(magic_identifier)),
        }
    }

    // (minor, major), in file order
    fn parse_version(&mut self) -> Result<(u16, u16)> {
        let minor = self.r.read_u16()?;
        let major = self.r.read_u16()?;
        Ok((minor, major))
    }

    fn parse_constant_pool(&mut self, constant_pool_count: u16) -> Result<ConstantPool> {
        let mut constant_pool = ConstantPool::with_count(constant_pool_count);

        // Index 0 is never stored, and a Long or Double also claims the index after it.
        let mut index = 1u32;
        while index < constant_pool_count as u32 {
            let cp_info = self.parse_cp_info()?;
            trace!("#{} = {:?}", index, cp_info);

            index += cp_info.tag().slot_size() as u32;
            constant_pool.push(cp_info);
        }

        Ok(constant_pool)
    }

    fn parse_cp_info(&mut self) -> Result<CpInfo> {
        let offset = self.r.position();
        let tag = CpTag::try_from(self.r.read_u8()?)
            .map_err(|tag| ClassFileError::UnknownConstantTag { tag, offset })?;

        Ok(match tag {
            CpTag::Utf8 => self.parse_utf8()?,
            CpTag::Integer => CpInfo::Integer(self.r.read_i32()?),
            CpTag::Float => CpInfo::Float(self.r.read_f32()?),
            CpTag::Long => CpInfo::Long(self.r.read_i64()?),
            CpTag::Double => CpInfo::Double(self.r.read_f64()?),
            CpTag::Class => self.parse_class_info()?,
            CpTag::String => self.parse_string()?,
            CpTag::FieldRef => CpInfo::FieldRef(self.parse_ref_info()?),
            CpTag::MethodRef => CpInfo::MethodRef(self.parse_ref_info()?),
            CpTag::InterfaceMethodRef => CpInfo::InterfaceMethodRef(self.parse_ref_info()?),
            CpTag::NameAndType => self.parse_name_and_type_info()?,
            CpTag::MethodHandle => self.parse_method_handle()?,
            CpTag::MethodType => self.parse_method_type_info()?,
            CpTag::Dynamic => CpInfo::Dynamic(self.parse_dynamic_info()?),
            CpTag::InvokeDynamic => CpInfo::InvokeDynamic(self.parse_dynamic_info()?),
            CpTag::Module => CpInfo::Module(ModuleInfo {
                name_index: self.r.read_u16()?,
            }),
            CpTag::Package => CpInfo::Package(PackageInfo {
                name_index: self.r.read_u16()?,
            }),
        })
    }

    // Decoding is left to the first reader of the entry.
    fn parse_utf8(&mut self) -> Result<CpInfo> {
        let bytes = self.r.read_text_blob()?;

        Ok(CpInfo::Utf8(Utf8Info::new(bytes.to_vec())))
    }

    fn parse_class_info(&mut self) -> Result<CpInfo> {
        let name_index = self.r.read_u16()?;

        Ok(CpInfo::Class(ClassInfo { name_index }))
    }

    fn parse_string(&mut self) -> Result<CpInfo> {
        let string_index = self.r.read_u16()?;

        Ok(CpInfo::String(StringInfo { string_index }))
    }

    fn parse_name_and_type_info(&mut self) -> Result<CpInfo> {
        let name_index = self.r.read_u16()?;
        let descriptor_index = self.r.read_u16()?;

        Ok(CpInfo::NameAndType(NameAndTypeInfo {
            name_index,
            descriptor_index,
        }))
    }

    fn parse_method_handle(&mut self) -> Result<CpInfo> {
        let reference_kind = self.r.read_u8()?;
        let reference_index = self.r.read_u16()?;

        Ok(CpInfo::MethodHandle(MethodHandleInfo {
            reference_kind,
            reference_index,
        }))
    }

    fn parse_method_type_info(&mut self) -> Result<CpInfo> {
        let descriptor_index = self.r.read_u16()?;

        Ok(CpInfo::MethodType(MethodTypeInfo { descriptor_index }))
    }

    fn parse_dynamic_info(&mut self) -> Result<DynamicInfo> {
        let bootstrap_method_attr_index = self.r.read_u16()?;
        let name_and_type_index = self.r.read_u16()?;

        Ok(DynamicInfo {
            bootstrap_method_attr_index,
            name_and_type_index,
        })
    }

    fn parse_ref_info(&mut self) -> Result<RefInfo> {
        let class_index = self.r.read_u16()?;
        let name_and_type_index = self.r.read_u16()?;

        Ok(RefInfo {
            class_index,
            name_and_type_index,
        })
    }

    fn parse_field_info(&mut self) -> Result<FieldInfo> {
        let raw_access_flags = self.r.read_u16()?;
        let access_flags = FieldAccessFlags::from_raw(raw_access_flags);
        let name_index = self.r.read_u16()?;
        let descriptor_index = self.r.read_u16()?;
        let attributes = self.parse_attributes()?;

        Ok(FieldInfo {
            access_flags,
            raw_access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }

    fn parse_method_info(&mut self) -> Result<MethodInfo> {
        let raw_access_flags = self.r.read_u16()?;
        let access_flags = MethodAccessFlags::from_raw(raw_access_flags);
        let name_index = self.r.read_u16()?;
        let descriptor_index = self.r.read_u16()?;
        let attributes = self.parse_attributes()?;

        Ok(MethodInfo {
            access_flags,
            raw_access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }

    fn parse_attribute(&mut self) -> Result<AttributeInfo> {
        let attribute_name_index = self.r.read_u16()?;
        let attribute_length = self.r.read_u32()?;
        let info = self.r.read_bytes(attribute_length as usize)?.to_vec();

        Ok(AttributeInfo {
            attribute_name_index,
            info,
        })
    }

    fn parse_attributes(&mut self) -> Result<Attributes> {
        let attributes_count = self.r.read_u16()?;
        (0..attributes_count)
            .map(|_| self.parse_attribute())
            .collect::<Result<Vec<_>>>()
            .map(Attributes)
    }
}

#[cfg(test)]
mod parse_magic_identifier_tests {
    use super::*;

    #[test]
    fn it_should_be_able_to_parse_the_correct_identifier() {
        assert!(Parser::new(&[0xca, 0xfe, 0xba, 0xbe])
            .parse_magic_identifier()
            .is_ok());
    }

    #[test]
    fn it_should_fail_if_there_is_not_enough_data() {
        assert!(matches!(
            Parser::new(&[0xca, 0xfe, 0xba]).parse_magic_identifier(),
            Err(ClassFileError::UnexpectedEndOfInput { .. })
        ));
    }

    #[test]
    fn it_should_fail_if_the_magic_identifier_is_incorrect() {
        assert!(matches!(
            Parser::new(&[0xca, 0xfe, 0xda, 0xda]).parse_magic_identifier(),
            Err(ClassFileError::InvalidMagicIdentifier(0xCAFEDADA))
        ));
    }
}


#[cfg(test)]
mod parse_cp_info_tests {
    use super::*;

    #[test]
    fn it_should_parse_a_method_handle() {
        assert_eq!(
            Parser::new(&[0x0f, 0x06, 0x00, 0x11]).parse_cp_info().unwrap(),
            CpInfo::MethodHandle(MethodHandleInfo {
                reference_kind: 6,
                reference_index: 17
            })
        );
    }

    #[test]
    fn it_should_parse_dynamic_entries() {
        let mut parser = Parser::new(&[0x11, 0x00, 0x00, 0x00, 0x05, 0x12, 0x00, 0x01, 0x00, 0x06]);

        assert_eq!(
            parser.parse_cp_info().unwrap(),
            CpInfo::Dynamic(DynamicInfo {
                bootstrap_method_attr_index: 0,
                name_and_type_index: 5
            })
        );
        assert_eq!(
            parser.parse_cp_info().unwrap(),
            CpInfo::InvokeDynamic(DynamicInfo {
                bootstrap_method_attr_index: 1,
                name_and_type_index: 6
            })
        );
    }

    #[test]
    fn it_should_parse_module_and_package_entries() {
        let mut parser = Parser::new(&[0x13, 0x00, 0x02, 0x14, 0x00, 0x03]);

        assert_eq!(
            parser.parse_cp_info().unwrap(),
            CpInfo::Module(ModuleInfo { name_index: 2 })
        );
        assert_eq!(
            parser.parse_cp_info().unwrap(),
            CpInfo::Package(PackageInfo { name_index: 3 })
        );
    }

    #[test]
    fn it_should_parse_wide_numbers() {
        let mut parser = Parser::new(&[
            0x05, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe, 0x06, 0x3f, 0xf8, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ]);

        assert_eq!(parser.parse_cp_info().unwrap(), CpInfo::Long(-2));
        assert_eq!(parser.parse_cp_info().unwrap(), CpInfo::Double(1.5));
    }

    #[test]
    fn it_should_report_the_offset_of_an_unknown_tag() {
        let mut parser = Parser::new(&[0x03, 0x00, 0x00, 0x00, 0x01, 0x0d]);
        parser.parse_cp_info().unwrap();

        assert!(matches!(
            parser.parse_cp_info(),
            Err(ClassFileError::UnknownConstantTag { tag: 13, offset: 5 })
        ));
    }
}

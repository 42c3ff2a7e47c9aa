use bitflags::bitflags;

bitflags! {
    /// Access and property flags of a class or interface (JVMS §4.1).
    pub struct ClassAccessFlags: u16 {
        /// Declared `public`; may be accessed from outside its package.
        const PUBLIC = 0x0001;
        /// Declared `final`; no subclasses allowed.
        const FINAL = 0x0010;
        /// Treat superclass methods specially when invoked by `invokespecial`.
        const SUPER = 0x0020;
        /// Is an interface, not a class.
        const INTERFACE = 0x0200;
        /// Declared `abstract`; must not be instantiated.
        const ABSTRACT = 0x0400;
        /// Not present in the source code.
        const SYNTHETIC = 0x1000;
        /// Declared as an annotation interface.
        const ANNOTATION = 0x2000;
        /// Declared as an `enum` class.
        const ENUM = 0x4000;
        /// Is a module, not a class or interface.
        const MODULE = 0x8000;
    }
}

bitflags! {
    /// JVMS §4.5
    pub struct FieldAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const VOLATILE = 0x0040;
        const TRANSIENT = 0x0080;
        const SYNTHETIC = 0x1000;
        const ENUM = 0x4000;
    }
}

bitflags! {
    /// JVMS §4.6
    pub struct MethodAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const BRIDGE = 0x0040;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
    }
}

macro_rules! from_bits_logged {
    ($flags:ty, $bits:expr) => {{
        let bits: u16 = $bits;
        let flags = <$flags>::from_bits_truncate(bits);
        if flags.bits() != bits {
            log::warn!(
                "Dropping unknown {} bits: 0x{:04X}",
                stringify!($flags),
                bits & !flags.bits()
            );
        }
        flags
    }};
}

impl ClassAccessFlags {
    pub(crate) fn from_raw(bits: u16) -> Self {
        from_bits_logged!(ClassAccessFlags, bits)
    }
}

impl FieldAccessFlags {
    pub(crate) fn from_raw(bits: u16) -> Self {
        from_bits_logged!(FieldAccessFlags, bits)
    }
}

impl MethodAccessFlags {
    pub(crate) fn from_raw(bits: u16) -> Self {
        from_bits_logged!(MethodAccessFlags, bits)
    }
}

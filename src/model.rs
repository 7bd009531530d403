use std::fmt;

use bitflags::bitflags;
use serde::Serialize;

bitflags! {
    /// Class-level access flags from the `access_flags` item of a class file.
    pub struct ClassFlags: u16 {
        const PUBLIC     = 0x0001;
        const FINAL      = 0x0010;
        const SUPER      = 0x0020;
        const INTERFACE  = 0x0200;
        const ABSTRACT   = 0x0400;
        const SYNTHETIC  = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM       = 0x4000;
    }
}

bitflags! {
    /// Field access flags.
    pub struct FieldFlags: u16 {
        const PUBLIC    = 0x0001;
        const PRIVATE   = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC    = 0x0008;
        const FINAL     = 0x0010;
        const VOLATILE  = 0x0040;
        const TRANSIENT = 0x0080;
        const SYNTHETIC = 0x1000;
        const ENUM      = 0x4000;
    }
}

bitflags! {
    /// Method access flags.
    pub struct MethodFlags: u16 {
        const PUBLIC       = 0x0001;
        const PRIVATE      = 0x0002;
        const PROTECTED    = 0x0004;
        const STATIC       = 0x0008;
        const FINAL        = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const BRIDGE       = 0x0040;
        const VARARGS      = 0x0080;
        const NATIVE       = 0x0100;
        const ABSTRACT     = 0x0400;
        const STRICT       = 0x0800;
        const SYNTHETIC    = 0x1000;
    }
}

/// Declared visibility of a class member, widest-last so instances order by reach.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AccessLevel {
    Private,
    PackagePrivate,
    Protected,
    Public,
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AccessLevel::Private => "private",
            AccessLevel::PackagePrivate => "package-private",
            AccessLevel::Protected => "protected",
            AccessLevel::Public => "public",
        };
        f.write_str(text)
    }
}

fn access_level(public: bool, protected: bool, private: bool) -> AccessLevel {
    if public {
        AccessLevel::Public
    } else if protected {
        AccessLevel::Protected
    } else if private {
        AccessLevel::Private
    } else {
        AccessLevel::PackagePrivate
    }
}

/// Immutable structural facts parsed from one class file.
///
/// Names are in internal binary form (slash-separated). Parsing never
/// resolves any of the symbolic references held here.
#[derive(Clone, Debug)]
pub struct BinaryClass {
    pub name: String,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub flags: ClassFlags,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
}

impl BinaryClass {
    pub fn is_interface(&self) -> bool {
        self.flags.contains(ClassFlags::INTERFACE)
    }

    pub fn is_abstract(&self) -> bool {
        self.flags.contains(ClassFlags::ABSTRACT)
    }

    pub fn is_final(&self) -> bool {
        self.flags.contains(ClassFlags::FINAL)
    }

    /// Package prefix of the binary name, empty for the default package.
    pub fn package(&self) -> &str {
        package_of(&self.name)
    }

    pub fn find_method(&self, name: &str, descriptor: &str) -> Option<&Method> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.descriptor == descriptor)
    }

    pub fn find_field(&self, name: &str, descriptor: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.name == name && f.descriptor == descriptor)
    }
}

/// Package prefix of a binary name, empty for the default package.
pub fn package_of(name: &str) -> &str {
    match name.rfind('/') {
        Some(index) => &name[..index],
        None => "",
    }
}

/// One declared field of a [`BinaryClass`].
#[derive(Clone, Debug)]
pub struct Field {
    pub name: String,
    pub descriptor: String,
    pub flags: FieldFlags,
}

impl Field {
    pub fn is_static(&self) -> bool {
        self.flags.contains(FieldFlags::STATIC)
    }

    pub fn is_final(&self) -> bool {
        self.flags.contains(FieldFlags::FINAL)
    }

    pub fn access_level(&self) -> AccessLevel {
        access_level(
            self.flags.contains(FieldFlags::PUBLIC),
            self.flags.contains(FieldFlags::PROTECTED),
            self.flags.contains(FieldFlags::PRIVATE),
        )
    }
}

/// One declared method of a [`BinaryClass`], with its linkage-relevant
/// instruction list and the reference types its metadata mentions.
#[derive(Clone, Debug)]
pub struct Method {
    pub name: String,
    pub descriptor: String,
    pub flags: MethodFlags,
    pub instructions: Vec<Instruction>,
    /// Classes named by the `Exceptions` attribute (declared `throws`).
    pub declared_exceptions: Vec<String>,
    /// Classes named by try/catch handler entries.
    pub catch_types: Vec<String>,
    /// Reference types named by the local variable table.
    pub local_variable_types: Vec<String>,
}

impl Method {
    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::STATIC)
    }

    pub fn is_final(&self) -> bool {
        self.flags.contains(MethodFlags::FINAL)
    }

    pub fn is_abstract(&self) -> bool {
        self.flags.contains(MethodFlags::ABSTRACT)
    }

    pub fn is_private(&self) -> bool {
        self.flags.contains(MethodFlags::PRIVATE)
    }

    pub fn is_bridge(&self) -> bool {
        self.flags.contains(MethodFlags::BRIDGE)
    }

    pub fn is_synthetic(&self) -> bool {
        self.flags.contains(MethodFlags::SYNTHETIC)
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    pub fn is_class_initializer(&self) -> bool {
        self.name == "<clinit>"
    }

    /// Compiler-generated accessor bridging a private member to a nested class.
    pub fn is_accessor_stub(&self) -> bool {
        self.name.starts_with("access$")
    }

    pub fn access_level(&self) -> AccessLevel {
        access_level(
            self.flags.contains(MethodFlags::PUBLIC),
            self.flags.contains(MethodFlags::PROTECTED),
            self.flags.contains(MethodFlags::PRIVATE),
        )
    }
}

/// Invocation opcode category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InvokeKind {
    Virtual,
    Static,
    Special,
    Interface,
}

impl InvokeKind {
    pub fn is_instance(self) -> bool {
        self != InvokeKind::Static
    }
}

/// Field access opcode category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldAccessKind {
    GetStatic,
    PutStatic,
    GetField,
    PutField,
}

impl FieldAccessKind {
    pub fn is_static(self) -> bool {
        matches!(self, FieldAccessKind::GetStatic | FieldAccessKind::PutStatic)
    }

    pub fn is_put(self) -> bool {
        matches!(self, FieldAccessKind::PutStatic | FieldAccessKind::PutField)
    }
}

/// Type reference opcode category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeRefKind {
    New,
    CheckCast,
    InstanceOf,
    ANewArray,
    MultiANewArray,
}

/// A bytecode instruction carrying a symbolic reference.
///
/// Opcodes without linkage relevance are discarded at parse time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    InvokeMethod {
        owner: String,
        name: String,
        descriptor: String,
        kind: InvokeKind,
    },
    FieldAccess {
        owner: String,
        name: String,
        descriptor: String,
        kind: FieldAccessKind,
    },
    TypeReference {
        class_name: String,
        kind: TypeRefKind,
    },
}

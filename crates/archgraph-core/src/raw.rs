//! Raw structural records produced by the class-file parser.
//!
//! One [`RawClassRecord`] is produced per class file and is immutable once
//! parsed. Records carry names, not resolved references; resolution happens
//! later in the two-phase import.

use serde::Serialize;

use crate::parser::signature::{ClassSignature, MethodSignature, TypeSig};

/// JVM access flags for classes and members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AccessFlags(pub u16);

impl AccessFlags {
    /// `ACC_PUBLIC`
    pub const PUBLIC: u16 = 0x0001;
    /// `ACC_PRIVATE`
    pub const PRIVATE: u16 = 0x0002;
    /// `ACC_PROTECTED`
    pub const PROTECTED: u16 = 0x0004;
    /// `ACC_STATIC`
    pub const STATIC: u16 = 0x0008;
    /// `ACC_FINAL`
    pub const FINAL: u16 = 0x0010;
    /// `ACC_INTERFACE`
    pub const INTERFACE: u16 = 0x0200;
    /// `ACC_ABSTRACT`
    pub const ABSTRACT: u16 = 0x0400;
    /// `ACC_SYNTHETIC`
    pub const SYNTHETIC: u16 = 0x1000;
    /// `ACC_ANNOTATION`
    pub const ANNOTATION: u16 = 0x2000;
    /// `ACC_ENUM`
    pub const ENUM: u16 = 0x4000;
    /// `ACC_BRIDGE` (methods only)
    pub const BRIDGE: u16 = 0x0040;

    fn has(self, flag: u16) -> bool {
        self.0 & flag != 0
    }

    /// Whether `ACC_PUBLIC` is set.
    #[must_use]
    pub fn is_public(self) -> bool {
        self.has(Self::PUBLIC)
    }

    /// Whether `ACC_PRIVATE` is set.
    #[must_use]
    pub fn is_private(self) -> bool {
        self.has(Self::PRIVATE)
    }

    /// Whether `ACC_STATIC` is set.
    #[must_use]
    pub fn is_static(self) -> bool {
        self.has(Self::STATIC)
    }

    /// Whether `ACC_INTERFACE` is set.
    #[must_use]
    pub fn is_interface(self) -> bool {
        self.has(Self::INTERFACE)
    }

    /// Whether `ACC_ABSTRACT` is set.
    #[must_use]
    pub fn is_abstract(self) -> bool {
        self.has(Self::ABSTRACT)
    }

    /// Whether `ACC_ANNOTATION` is set.
    #[must_use]
    pub fn is_annotation(self) -> bool {
        self.has(Self::ANNOTATION)
    }

    /// Whether `ACC_SYNTHETIC` is set.
    #[must_use]
    pub fn is_synthetic(self) -> bool {
        self.has(Self::SYNTHETIC)
    }

    /// Whether `ACC_BRIDGE` is set (meaningful for methods).
    #[must_use]
    pub fn is_bridge(self) -> bool {
        self.has(Self::BRIDGE)
    }
}

/// A decoded annotation: type name plus named element values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawAnnotation {
    /// Fully qualified annotation type name.
    pub type_name: String,
    /// Element name / value pairs in declaration order.
    pub elements: Vec<(String, AnnotationValue)>,
}

/// A recursively decoded annotation element value.
///
/// The recursion terminates on the class file's own declared structure;
/// no artificial depth limit is applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AnnotationValue {
    /// `boolean` constant.
    Boolean(bool),
    /// `byte` constant.
    Byte(i8),
    /// `char` constant.
    Char(char),
    /// `short` constant.
    Short(i16),
    /// `int` constant.
    Int(i32),
    /// `long` constant.
    Long(i64),
    /// `float` constant.
    Float(f32),
    /// `double` constant.
    Double(f64),
    /// String constant.
    String(String),
    /// Enum constant reference.
    EnumConstant {
        /// Fully qualified enum type name.
        type_name: String,
        /// Constant name within the enum.
        constant: String,
    },
    /// Class literal reference (fully qualified name, or a primitive name
    /// such as `void` for primitive class literals).
    ClassRef(String),
    /// Nested annotation.
    Nested(RawAnnotation),
    /// Array of element values.
    Array(Vec<AnnotationValue>),
}

/// The kind of access site extracted from a method body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RawAccessKind {
    /// Field read (`getfield` / `getstatic`).
    FieldRead,
    /// Field write (`putfield` / `putstatic`).
    FieldWrite,
    /// Method invocation.
    MethodCall,
    /// Constructor invocation (`invokespecial` of `<init>`).
    ConstructorCall,
    /// `checkcast` instruction.
    TypeCast,
    /// `instanceof` instruction.
    InstanceOf,
    /// Array creation referencing a component type.
    ArrayComponent,
}

/// Referenced member signature at an access site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawMemberRef {
    /// Member name (`<init>` for constructors).
    pub name: String,
    /// Raw field or method descriptor.
    pub descriptor: String,
}

/// One access site extracted from a method body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawAccess {
    /// What kind of access this is.
    pub kind: RawAccessKind,
    /// Fully qualified name of the referenced owner class.
    pub target_class: String,
    /// Referenced member, when the access targets one.
    pub member: Option<RawMemberRef>,
    /// Source line of the access site, when a line-number table was present.
    pub line: Option<u32>,
}

/// A field as declared in the class file.
#[derive(Debug, Clone, Serialize)]
pub struct RawField {
    /// Field name.
    pub name: String,
    /// Raw type descriptor.
    pub descriptor: String,
    /// Access flags.
    pub access: AccessFlags,
    /// Declared annotations.
    pub annotations: Vec<RawAnnotation>,
    /// Parsed generic signature, if the field declares one.
    pub signature: Option<TypeSig>,
}

/// A method or constructor as declared in the class file.
#[derive(Debug, Clone, Serialize)]
pub struct RawMethod {
    /// Method name (`<init>` for constructors, `<clinit>` for initializers).
    pub name: String,
    /// Raw method descriptor.
    pub descriptor: String,
    /// Access flags.
    pub access: AccessFlags,
    /// Declared annotations.
    pub annotations: Vec<RawAnnotation>,
    /// Parsed generic signature, if the method declares one.
    pub signature: Option<MethodSignature>,
    /// Declared thrown exception class names.
    pub throws: Vec<String>,
    /// Default value, for annotation interface methods.
    pub annotation_default: Option<AnnotationValue>,
    /// Access sites extracted from the method body, in bytecode order.
    pub accesses: Vec<RawAccess>,
    /// First line of the method body, when known.
    pub line: Option<u32>,
}

/// The complete raw structural record for one class file.
#[derive(Debug, Clone, Serialize)]
pub struct RawClassRecord {
    /// Fully qualified class name.
    pub name: String,
    /// Fully qualified superclass name; `None` only for `java.lang.Object`
    /// and module-info files.
    pub superclass: Option<String>,
    /// Fully qualified names of directly implemented interfaces, in
    /// declaration order.
    pub interfaces: Vec<String>,
    /// Class access flags.
    pub access: AccessFlags,
    /// Class-level annotations.
    pub annotations: Vec<RawAnnotation>,
    /// Parsed generic class signature, if declared.
    pub signature: Option<ClassSignature>,
    /// Declared fields.
    pub fields: Vec<RawField>,
    /// Declared methods and constructors.
    pub methods: Vec<RawMethod>,
    /// Source file name from the `SourceFile` attribute.
    pub source_file: Option<String>,
}

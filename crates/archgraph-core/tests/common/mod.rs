//! Programmatic class-file fixture builder.
//!
//! Emits real class-file byte buffers so integration tests exercise the
//! whole parse → import → resolve pipeline instead of hand-built records.
//! Only the structures the parser reads are emitted; bodies are not
//! verifiable JVM code, just decodable instruction sequences.

// Each integration test binary uses its own slice of the fixture API.
#![allow(dead_code)]

use std::collections::HashMap;

const MAJOR_VERSION: u16 = 52; // Java 8

/// Builder for one class-file buffer.
pub struct ClassBytes {
    name: String,
    superclass: Option<String>,
    interfaces: Vec<String>,
    access: u16,
    annotations: Vec<Annotation>,
    signature: Option<String>,
    source_file: Option<String>,
    fields: Vec<Field>,
    methods: Vec<Method>,
}

impl ClassBytes {
    /// A public class extending `java.lang.Object`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            superclass: Some("java.lang.Object".to_owned()),
            interfaces: Vec::new(),
            access: 0x0001, // ACC_PUBLIC
            annotations: Vec::new(),
            signature: None,
            source_file: None,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// A public interface (no superclass edge beyond `Object`).
    pub fn interface_type(name: &str) -> Self {
        let mut class = Self::new(name);
        class.access = 0x0601; // ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT
        class
    }

    pub fn superclass(mut self, name: &str) -> Self {
        self.superclass = Some(name.to_owned());
        self
    }

    pub fn implements(mut self, name: &str) -> Self {
        self.interfaces.push(name.to_owned());
        self
    }

    pub fn annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Generic signature in class-file syntax.
    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_owned());
        self
    }

    pub fn source_file(mut self, name: &str) -> Self {
        self.source_file = Some(name.to_owned());
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    /// Serializes the class file.
    pub fn build(self) -> Vec<u8> {
        let mut pool = Pool::default();
        let mut body = Vec::new();

        push_u16(&mut body, self.access);
        let this_class = pool.class(&self.name);
        push_u16(&mut body, this_class);
        let super_class = self.superclass.as_deref().map_or(0, |name| pool.class(name));
        push_u16(&mut body, super_class);

        push_u16(&mut body, as_u16(self.interfaces.len()));
        for interface in &self.interfaces {
            let index = pool.class(interface);
            push_u16(&mut body, index);
        }

        push_u16(&mut body, as_u16(self.fields.len()));
        for field in &self.fields {
            field.write(&mut body, &mut pool);
        }

        push_u16(&mut body, as_u16(self.methods.len()));
        for method in &self.methods {
            method.write(&mut body, &mut pool);
        }

        let mut attributes = Vec::new();
        if let Some(signature) = &self.signature {
            attributes.push(signature_attribute(&mut pool, signature));
        }
        if let Some(source_file) = &self.source_file {
            let name = pool.utf8("SourceFile");
            let value = pool.utf8(source_file);
            attributes.push(attribute(name, &value.to_be_bytes()));
        }
        if !self.annotations.is_empty() {
            attributes.push(annotations_attribute(&mut pool, &self.annotations));
        }
        write_attributes(&mut body, &attributes);

        let mut bytes = Vec::new();
        push_u32(&mut bytes, 0xCAFE_BABE);
        push_u16(&mut bytes, 0); // minor
        push_u16(&mut bytes, MAJOR_VERSION);
        pool.write(&mut bytes);
        bytes.extend_from_slice(&body);
        bytes
    }
}

/// One field declaration.
pub struct Field {
    name: String,
    descriptor: String,
    access: u16,
    annotations: Vec<Annotation>,
    signature: Option<String>,
}

impl Field {
    pub fn new(name: &str, descriptor: &str) -> Self {
        Self {
            name: name.to_owned(),
            descriptor: descriptor.to_owned(),
            access: 0x0002, // ACC_PRIVATE
            annotations: Vec::new(),
            signature: None,
        }
    }

    pub fn annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_owned());
        self
    }

    fn write(&self, body: &mut Vec<u8>, pool: &mut Pool) {
        push_u16(body, self.access);
        let name = pool.utf8(&self.name);
        push_u16(body, name);
        let descriptor = pool.utf8(&self.descriptor);
        push_u16(body, descriptor);

        let mut attributes = Vec::new();
        if let Some(signature) = &self.signature {
            attributes.push(signature_attribute(pool, signature));
        }
        if !self.annotations.is_empty() {
            attributes.push(annotations_attribute(pool, &self.annotations));
        }
        write_attributes(body, &attributes);
    }
}

/// One method declaration with an optional decodable body.
pub struct Method {
    name: String,
    descriptor: String,
    access: u16,
    code: Option<Vec<Op>>,
    line: Option<u16>,
    annotations: Vec<Annotation>,
    signature: Option<String>,
    throws: Vec<String>,
    annotation_default: Option<Value>,
}

impl Method {
    /// A concrete public method with an empty body.
    pub fn new(name: &str, descriptor: &str) -> Self {
        Self {
            name: name.to_owned(),
            descriptor: descriptor.to_owned(),
            access: 0x0001, // ACC_PUBLIC
            code: Some(Vec::new()),
            line: None,
            annotations: Vec::new(),
            signature: None,
            throws: Vec::new(),
            annotation_default: None,
        }
    }

    /// An abstract method without a `Code` attribute.
    pub fn abstract_method(name: &str, descriptor: &str) -> Self {
        let mut method = Self::new(name, descriptor);
        method.access = 0x0401; // ACC_PUBLIC | ACC_ABSTRACT
        method.code = None;
        method
    }

    pub fn op(mut self, op: Op) -> Self {
        self.code.get_or_insert_with(Vec::new).push(op);
        self
    }

    /// Declares the source line of the whole body.
    pub fn line(mut self, line: u16) -> Self {
        self.line = Some(line);
        self
    }

    pub fn annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_owned());
        self
    }

    pub fn throws(mut self, class: &str) -> Self {
        self.throws.push(class.to_owned());
        self
    }

    /// Default value for an annotation interface member.
    pub fn annotation_default(mut self, value: Value) -> Self {
        self.annotation_default = Some(value);
        self
    }

    fn write(&self, body: &mut Vec<u8>, pool: &mut Pool) {
        push_u16(body, self.access);
        let name = pool.utf8(&self.name);
        push_u16(body, name);
        let descriptor = pool.utf8(&self.descriptor);
        push_u16(body, descriptor);

        let mut attributes = Vec::new();
        if let Some(ops) = &self.code {
            attributes.push(code_attribute(pool, ops, self.line));
        }
        if let Some(signature) = &self.signature {
            attributes.push(signature_attribute(pool, signature));
        }
        if !self.throws.is_empty() {
            let name = pool.utf8("Exceptions");
            let mut payload = Vec::new();
            push_u16(&mut payload, as_u16(self.throws.len()));
            for class in &self.throws {
                let index = pool.class(class);
                push_u16(&mut payload, index);
            }
            attributes.push(attribute(name, &payload));
        }
        if let Some(default) = &self.annotation_default {
            let name = pool.utf8("AnnotationDefault");
            let mut payload = Vec::new();
            default.write(&mut payload, pool);
            attributes.push(attribute(name, &payload));
        }
        if !self.annotations.is_empty() {
            attributes.push(annotations_attribute(pool, &self.annotations));
        }
        write_attributes(body, &attributes);
    }
}

/// One body instruction.
pub enum Op {
    InvokeVirtual { owner: String, name: String, descriptor: String },
    InvokeStatic { owner: String, name: String, descriptor: String },
    InvokeInterface { owner: String, name: String, descriptor: String },
    /// `new` plus `dup` plus `invokespecial <init>`.
    Construct { owner: String, descriptor: String },
    GetField { owner: String, name: String, descriptor: String },
    PutField { owner: String, name: String, descriptor: String },
    Checkcast { class: String },
    InstanceOf { class: String },
}

impl Op {
    pub fn call(owner: &str, name: &str, descriptor: &str) -> Self {
        Self::InvokeVirtual {
            owner: owner.to_owned(),
            name: name.to_owned(),
            descriptor: descriptor.to_owned(),
        }
    }

    pub fn call_static(owner: &str, name: &str, descriptor: &str) -> Self {
        Self::InvokeStatic {
            owner: owner.to_owned(),
            name: name.to_owned(),
            descriptor: descriptor.to_owned(),
        }
    }

    pub fn call_interface(owner: &str, name: &str, descriptor: &str) -> Self {
        Self::InvokeInterface {
            owner: owner.to_owned(),
            name: name.to_owned(),
            descriptor: descriptor.to_owned(),
        }
    }

    pub fn construct(owner: &str, descriptor: &str) -> Self {
        Self::Construct { owner: owner.to_owned(), descriptor: descriptor.to_owned() }
    }

    pub fn get_field(owner: &str, name: &str, descriptor: &str) -> Self {
        Self::GetField {
            owner: owner.to_owned(),
            name: name.to_owned(),
            descriptor: descriptor.to_owned(),
        }
    }

    pub fn put_field(owner: &str, name: &str, descriptor: &str) -> Self {
        Self::PutField {
            owner: owner.to_owned(),
            name: name.to_owned(),
            descriptor: descriptor.to_owned(),
        }
    }

    pub fn checkcast(class: &str) -> Self {
        Self::Checkcast { class: class.to_owned() }
    }

    pub fn instance_of(class: &str) -> Self {
        Self::InstanceOf { class: class.to_owned() }
    }

    fn write(&self, code: &mut Vec<u8>, pool: &mut Pool) {
        match self {
            Self::InvokeVirtual { owner, name, descriptor } => {
                let index = pool.method_ref(owner, name, descriptor);
                code.push(0xb6);
                push_u16(code, index);
            }
            Self::InvokeStatic { owner, name, descriptor } => {
                let index = pool.method_ref(owner, name, descriptor);
                code.push(0xb8);
                push_u16(code, index);
            }
            Self::InvokeInterface { owner, name, descriptor } => {
                let index = pool.interface_method_ref(owner, name, descriptor);
                code.push(0xb9);
                push_u16(code, index);
                code.push(1); // count
                code.push(0);
            }
            Self::Construct { owner, descriptor } => {
                let class = pool.class(owner);
                code.push(0xbb);
                push_u16(code, class);
                code.push(0x59); // dup
                let init = pool.method_ref(owner, "<init>", descriptor);
                code.push(0xb7);
                push_u16(code, init);
            }
            Self::GetField { owner, name, descriptor } => {
                let index = pool.field_ref(owner, name, descriptor);
                code.push(0xb4);
                push_u16(code, index);
            }
            Self::PutField { owner, name, descriptor } => {
                let index = pool.field_ref(owner, name, descriptor);
                code.push(0xb5);
                push_u16(code, index);
            }
            Self::Checkcast { class } => {
                let index = pool.class(class);
                code.push(0xc0);
                push_u16(code, index);
            }
            Self::InstanceOf { class } => {
                let index = pool.class(class);
                code.push(0xc1);
                push_u16(code, index);
            }
        }
    }
}

/// One annotation with named element values.
pub struct Annotation {
    type_name: String,
    elements: Vec<(String, Value)>,
}

impl Annotation {
    /// `type_name` is the fully qualified dotted name.
    pub fn new(type_name: &str) -> Self {
        Self { type_name: type_name.to_owned(), elements: Vec::new() }
    }

    pub fn value(mut self, name: &str, value: Value) -> Self {
        self.elements.push((name.to_owned(), value));
        self
    }

    fn write(&self, payload: &mut Vec<u8>, pool: &mut Pool) {
        let type_index = pool.utf8(&class_descriptor(&self.type_name));
        push_u16(payload, type_index);
        push_u16(payload, as_u16(self.elements.len()));
        for (name, value) in &self.elements {
            let name_index = pool.utf8(name);
            push_u16(payload, name_index);
            value.write(payload, pool);
        }
    }
}

/// One annotation element value.
pub enum Value {
    Bool(bool),
    Int(i32),
    Str(String),
    /// Enum constant; the type is a dotted class name.
    Enum { type_name: String, constant: String },
    /// Class literal; holds the raw descriptor such as `[Ljava/lang/String;`.
    ClassLiteral(String),
    Nested(Annotation),
    Array(Vec<Value>),
}

impl Value {
    pub fn string(value: &str) -> Self {
        Self::Str(value.to_owned())
    }

    pub fn enum_constant(type_name: &str, constant: &str) -> Self {
        Self::Enum { type_name: type_name.to_owned(), constant: constant.to_owned() }
    }

    pub fn class_literal(descriptor: &str) -> Self {
        Self::ClassLiteral(descriptor.to_owned())
    }

    fn write(&self, payload: &mut Vec<u8>, pool: &mut Pool) {
        match self {
            Self::Bool(value) => {
                payload.push(b'Z');
                let index = pool.integer(i32::from(*value));
                push_u16(payload, index);
            }
            Self::Int(value) => {
                payload.push(b'I');
                let index = pool.integer(*value);
                push_u16(payload, index);
            }
            Self::Str(value) => {
                payload.push(b's');
                let index = pool.utf8(value);
                push_u16(payload, index);
            }
            Self::Enum { type_name, constant } => {
                payload.push(b'e');
                let type_index = pool.utf8(&class_descriptor(type_name));
                push_u16(payload, type_index);
                let constant_index = pool.utf8(constant);
                push_u16(payload, constant_index);
            }
            Self::ClassLiteral(descriptor) => {
                payload.push(b'c');
                let index = pool.utf8(descriptor);
                push_u16(payload, index);
            }
            Self::Nested(annotation) => {
                payload.push(b'@');
                annotation.write(payload, pool);
            }
            Self::Array(values) => {
                payload.push(b'[');
                push_u16(payload, as_u16(values.len()));
                for value in values {
                    value.write(payload, pool);
                }
            }
        }
    }
}

#[derive(Default)]
struct Pool {
    entries: Vec<Vec<u8>>,
    utf8: HashMap<String, u16>,
    classes: HashMap<String, u16>,
    name_and_types: HashMap<(u16, u16), u16>,
    refs: HashMap<(u8, u16, u16), u16>,
    integers: HashMap<i32, u16>,
}

impl Pool {
    fn push(&mut self, entry: Vec<u8>) -> u16 {
        self.entries.push(entry);
        as_u16(self.entries.len())
    }

    fn utf8(&mut self, value: &str) -> u16 {
        if let Some(&index) = self.utf8.get(value) {
            return index;
        }
        let mut entry = vec![1];
        push_u16(&mut entry, as_u16(value.len()));
        entry.extend_from_slice(value.as_bytes());
        let index = self.push(entry);
        self.utf8.insert(value.to_owned(), index);
        index
    }

    fn integer(&mut self, value: i32) -> u16 {
        if let Some(&index) = self.integers.get(&value) {
            return index;
        }
        let mut entry = vec![3];
        entry.extend_from_slice(&value.to_be_bytes());
        let index = self.push(entry);
        self.integers.insert(value, index);
        index
    }

    /// Interns a class constant; `name` is dotted.
    fn class(&mut self, name: &str) -> u16 {
        if let Some(&index) = self.classes.get(name) {
            return index;
        }
        let internal = name.replace('.', "/");
        let name_index = self.utf8(&internal);
        let mut entry = vec![7];
        push_u16(&mut entry, name_index);
        let index = self.push(entry);
        self.classes.insert(name.to_owned(), index);
        index
    }

    fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        if let Some(&index) = self.name_and_types.get(&(name_index, descriptor_index)) {
            return index;
        }
        let mut entry = vec![12];
        push_u16(&mut entry, name_index);
        push_u16(&mut entry, descriptor_index);
        let index = self.push(entry);
        self.name_and_types.insert((name_index, descriptor_index), index);
        index
    }

    fn member_ref(&mut self, tag: u8, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.class(owner);
        let nat_index = self.name_and_type(name, descriptor);
        if let Some(&index) = self.refs.get(&(tag, class_index, nat_index)) {
            return index;
        }
        let mut entry = vec![tag];
        push_u16(&mut entry, class_index);
        push_u16(&mut entry, nat_index);
        let index = self.push(entry);
        self.refs.insert((tag, class_index, nat_index), index);
        index
    }

    fn field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref(9, owner, name, descriptor)
    }

    fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref(10, owner, name, descriptor)
    }

    fn interface_method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref(11, owner, name, descriptor)
    }

    fn write(&self, bytes: &mut Vec<u8>) {
        push_u16(bytes, as_u16(self.entries.len() + 1));
        for entry in &self.entries {
            bytes.extend_from_slice(entry);
        }
    }
}

fn code_attribute(pool: &mut Pool, ops: &[Op], line: Option<u16>) -> (u16, Vec<u8>) {
    let name = pool.utf8("Code");

    let mut code = Vec::new();
    for op in ops {
        op.write(&mut code, pool);
    }
    code.push(0xb1); // return

    let mut payload = Vec::new();
    push_u16(&mut payload, 8); // max_stack
    push_u16(&mut payload, 8); // max_locals
    push_u32(&mut payload, as_u32(code.len()));
    payload.extend_from_slice(&code);
    push_u16(&mut payload, 0); // exception table

    match line {
        None => push_u16(&mut payload, 0),
        Some(line) => {
            push_u16(&mut payload, 1);
            let table_name = pool.utf8("LineNumberTable");
            push_u16(&mut payload, table_name);
            push_u32(&mut payload, 6);
            push_u16(&mut payload, 1); // entry count
            push_u16(&mut payload, 0); // start_pc
            push_u16(&mut payload, line);
        }
    }
    (name, payload)
}

fn signature_attribute(pool: &mut Pool, signature: &str) -> (u16, Vec<u8>) {
    let name = pool.utf8("Signature");
    let value = pool.utf8(signature);
    attribute(name, &value.to_be_bytes())
}

fn annotations_attribute(pool: &mut Pool, annotations: &[Annotation]) -> (u16, Vec<u8>) {
    let name = pool.utf8("RuntimeVisibleAnnotations");
    let mut payload = Vec::new();
    push_u16(&mut payload, as_u16(annotations.len()));
    for annotation in annotations {
        annotation.write(&mut payload, pool);
    }
    (name, payload)
}

fn attribute(name: u16, payload: &[u8]) -> (u16, Vec<u8>) {
    (name, payload.to_vec())
}

fn write_attributes(body: &mut Vec<u8>, attributes: &[(u16, Vec<u8>)]) {
    push_u16(body, as_u16(attributes.len()));
    for (name, payload) in attributes {
        push_u16(body, *name);
        push_u32(body, as_u32(payload.len()));
        body.extend_from_slice(payload);
    }
}

fn class_descriptor(dotted: &str) -> String {
    format!("L{};", dotted.replace('.', "/"))
}

fn push_u16(bytes: &mut Vec<u8>, value: u16) {
    bytes.extend_from_slice(&value.to_be_bytes());
}

fn push_u32(bytes: &mut Vec<u8>, value: u32) {
    bytes.extend_from_slice(&value.to_be_bytes());
}

fn as_u16(value: usize) -> u16 {
    u16::try_from(value).expect("fixture too large for u16")
}

fn as_u32(value: usize) -> u32 {
    u32::try_from(value).expect("fixture too large for u32")
}

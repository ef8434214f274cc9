//! Generic signature grammar.
//!
//! Signatures carry the generic type information erased from descriptors
//! (`<T:Ljava/lang/Object;>(TT;)Ljava/util/List<TT;>;`). The grammar here
//! follows the class-file `Signature` attribute; malformed signatures are
//! reported rather than silently dropped so the caller can decide whether
//! to degrade.

use serde::Serialize;

use super::descriptor::PrimitiveKind;
use super::ParseError;

/// A type as it appears in a generic signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TypeSig {
    /// A primitive type.
    Primitive(PrimitiveKind),
    /// A class or interface type, possibly parameterized.
    Class(ClassTypeSig),
    /// A reference to a type variable declared in scope.
    TypeVariable(String),
    /// An array type.
    Array(Box<TypeSig>),
}

impl TypeSig {
    /// Collects every class name referenced by this type into `out`.
    pub fn collect_class_names(&self, out: &mut Vec<String>) {
        match self {
            Self::Primitive(_) | Self::TypeVariable(_) => {}
            Self::Class(class) => class.collect_class_names(out),
            Self::Array(component) => component.collect_class_names(out),
        }
    }

    /// Collects only the class names appearing inside type arguments,
    /// skipping the erased outer type itself.
    pub fn collect_argument_class_names(&self, out: &mut Vec<String>) {
        match self {
            Self::Primitive(_) | Self::TypeVariable(_) => {}
            Self::Class(class) => class.collect_argument_class_names(out),
            Self::Array(component) => component.collect_argument_class_names(out),
        }
    }
}

/// A possibly-parameterized class type within a signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassTypeSig {
    /// Fully qualified name, inner classes joined with `$`.
    pub name: String,
    /// Type arguments applied to the class, empty when raw.
    pub type_arguments: Vec<TypeArg>,
}

impl ClassTypeSig {
    fn collect_class_names(&self, out: &mut Vec<String>) {
        out.push(self.name.clone());
        self.collect_argument_class_names(out);
    }

    fn collect_argument_class_names(&self, out: &mut Vec<String>) {
        for arg in &self.type_arguments {
            match arg {
                TypeArg::Wildcard => {}
                TypeArg::Extends(ty) | TypeArg::Super(ty) | TypeArg::Exact(ty) => {
                    ty.collect_class_names(out);
                }
            }
        }
    }
}

/// One type argument of a parameterized class type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TypeArg {
    /// Unbounded wildcard `?`.
    Wildcard,
    /// Upper-bounded wildcard `? extends T`.
    Extends(TypeSig),
    /// Lower-bounded wildcard `? super T`.
    Super(TypeSig),
    /// An exact type argument.
    Exact(TypeSig),
}

/// A declared type parameter with its bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeParameter {
    /// Parameter name (`T`, `K`, ...).
    pub name: String,
    /// Class bound, when declared.
    pub class_bound: Option<TypeSig>,
    /// Interface bounds, in declaration order.
    pub interface_bounds: Vec<TypeSig>,
}

impl TypeParameter {
    fn collect_class_names(&self, out: &mut Vec<String>) {
        if let Some(bound) = &self.class_bound {
            bound.collect_class_names(out);
        }
        for bound in &self.interface_bounds {
            bound.collect_class_names(out);
        }
    }
}

/// Parsed class-level generic signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassSignature {
    /// Declared type parameters.
    pub type_parameters: Vec<TypeParameter>,
    /// Generic superclass type.
    pub superclass: ClassTypeSig,
    /// Generic superinterface types, in declaration order.
    pub interfaces: Vec<ClassTypeSig>,
}

impl ClassSignature {
    /// Class names referenced by type-parameter bounds only.
    ///
    /// Superclass and interface names are already covered by the erased
    /// hierarchy, so only the bounds contribute new references.
    #[must_use]
    pub fn bound_class_names(&self) -> Vec<String> {
        let mut out = Vec::new();
        for param in &self.type_parameters {
            param.collect_class_names(&mut out);
        }
        out
    }

    /// Class names referenced generically: type-parameter bounds plus the
    /// type arguments applied to the superclass and interfaces.
    #[must_use]
    pub fn generic_reference_names(&self) -> Vec<String> {
        let mut out = self.bound_class_names();
        self.superclass.collect_argument_class_names(&mut out);
        for interface in &self.interfaces {
            interface.collect_argument_class_names(&mut out);
        }
        out
    }
}

/// Parsed method-level generic signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodSignature {
    /// Declared type parameters.
    pub type_parameters: Vec<TypeParameter>,
    /// Generic parameter types.
    pub parameters: Vec<TypeSig>,
    /// Generic return type; `None` for `void`.
    pub return_type: Option<TypeSig>,
    /// Generic thrown types.
    pub throws: Vec<TypeSig>,
}

impl MethodSignature {
    /// Class names referenced by type-parameter bounds only.
    #[must_use]
    pub fn bound_class_names(&self) -> Vec<String> {
        let mut out = Vec::new();
        for param in &self.type_parameters {
            param.collect_class_names(&mut out);
        }
        out
    }

    /// Class names referenced generically: type-parameter bounds plus the
    /// type arguments inside parameter, return and thrown types.
    #[must_use]
    pub fn generic_reference_names(&self) -> Vec<String> {
        let mut out = self.bound_class_names();
        for param in &self.parameters {
            param.collect_argument_class_names(&mut out);
        }
        if let Some(ret) = &self.return_type {
            ret.collect_argument_class_names(&mut out);
        }
        for thrown in &self.throws {
            thrown.collect_argument_class_names(&mut out);
        }
        out
    }
}

struct SignatureCursor<'a> {
    raw: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SignatureCursor<'a> {
    fn new(raw: &'a str) -> Self {
        Self { raw, bytes: raw.as_bytes(), pos: 0 }
    }

    fn error(&self) -> ParseError {
        ParseError::BadSignature { signature: self.raw.to_owned() }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Result<u8, ParseError> {
        let b = self.peek().ok_or_else(|| self.error())?;
        self.pos += 1;
        Ok(b)
    }

    fn expect(&mut self, b: u8) -> Result<(), ParseError> {
        if self.bump()? == b {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn identifier(&mut self) -> Result<&'a str, ParseError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| !matches!(b, b'.' | b';' | b'[' | b'/' | b'<' | b'>' | b':'))
        {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error());
        }
        Ok(&self.raw[start..self.pos])
    }

    fn type_parameters(&mut self) -> Result<Vec<TypeParameter>, ParseError> {
        if self.peek() != Some(b'<') {
            return Ok(Vec::new());
        }
        self.pos += 1;
        let mut params = Vec::new();
        while self.peek() != Some(b'>') {
            let name = self.identifier()?.to_owned();
            self.expect(b':')?;
            // The class bound may be empty when only interface bounds exist.
            let class_bound = if self.peek() == Some(b':') {
                None
            } else {
                Some(self.type_sig()?)
            };
            let mut interface_bounds = Vec::new();
            while self.peek() == Some(b':') {
                self.pos += 1;
                interface_bounds.push(self.type_sig()?);
            }
            params.push(TypeParameter { name, class_bound, interface_bounds });
        }
        self.expect(b'>')?;
        if params.is_empty() {
            return Err(self.error());
        }
        Ok(params)
    }

    fn type_sig(&mut self) -> Result<TypeSig, ParseError> {
        match self.peek().ok_or_else(|| self.error())? {
            b'[' => {
                self.pos += 1;
                Ok(TypeSig::Array(Box::new(self.type_sig()?)))
            }
            b'T' => {
                self.pos += 1;
                let name = self.identifier()?.to_owned();
                self.expect(b';')?;
                Ok(TypeSig::TypeVariable(name))
            }
            b'L' => Ok(TypeSig::Class(self.class_type_sig()?)),
            tag => {
                let prim = PrimitiveKind::from_tag(tag).ok_or_else(|| self.error())?;
                self.pos += 1;
                Ok(TypeSig::Primitive(prim))
            }
        }
    }

    fn class_type_sig(&mut self) -> Result<ClassTypeSig, ParseError> {
        self.expect(b'L')?;
        let mut name = String::new();
        loop {
            let segment = self.identifier()?;
            name.push_str(segment);
            match self.peek() {
                Some(b'/') => {
                    self.pos += 1;
                    name.push('.');
                }
                _ => break,
            }
        }
        let mut type_arguments = self.type_arguments()?;
        // Inner-class suffixes each carry their own optional arguments; the
        // referenced class is the innermost one, so later suffixes win.
        while self.peek() == Some(b'.') {
            self.pos += 1;
            let segment = self.identifier()?;
            name.push('$');
            name.push_str(segment);
            type_arguments = self.type_arguments()?;
        }
        self.expect(b';')?;
        Ok(ClassTypeSig { name, type_arguments })
    }

    fn type_arguments(&mut self) -> Result<Vec<TypeArg>, ParseError> {
        if self.peek() != Some(b'<') {
            return Ok(Vec::new());
        }
        self.pos += 1;
        let mut args = Vec::new();
        while self.peek() != Some(b'>') {
            let arg = match self.peek().ok_or_else(|| self.error())? {
                b'*' => {
                    self.pos += 1;
                    TypeArg::Wildcard
                }
                b'+' => {
                    self.pos += 1;
                    TypeArg::Extends(self.type_sig()?)
                }
                b'-' => {
                    self.pos += 1;
                    TypeArg::Super(self.type_sig()?)
                }
                _ => TypeArg::Exact(self.type_sig()?),
            };
            args.push(arg);
        }
        self.expect(b'>')?;
        if args.is_empty() {
            return Err(self.error());
        }
        Ok(args)
    }

    fn at_end(&self) -> bool {
        self.pos == self.bytes.len()
    }
}

/// Parses a class `Signature` attribute value.
///
/// # Errors
///
/// Returns [`ParseError::BadSignature`] on malformed input.
pub fn parse_class_signature(raw: &str) -> Result<ClassSignature, ParseError> {
    let mut cur = SignatureCursor::new(raw);
    let type_parameters = cur.type_parameters()?;
    let superclass = cur.class_type_sig()?;
    let mut interfaces = Vec::new();
    while !cur.at_end() {
        interfaces.push(cur.class_type_sig()?);
    }
    Ok(ClassSignature { type_parameters, superclass, interfaces })
}

/// Parses a method `Signature` attribute value.
///
/// # Errors
///
/// Returns [`ParseError::BadSignature`] on malformed input.
pub fn parse_method_signature(raw: &str) -> Result<MethodSignature, ParseError> {
    let mut cur = SignatureCursor::new(raw);
    let type_parameters = cur.type_parameters()?;
    cur.expect(b'(')?;
    let mut parameters = Vec::new();
    while cur.peek().is_some_and(|b| b != b')') {
        parameters.push(cur.type_sig()?);
    }
    cur.expect(b')')?;
    let return_type = if cur.peek() == Some(b'V') {
        cur.pos += 1;
        None
    } else {
        Some(cur.type_sig()?)
    };
    let mut throws = Vec::new();
    while cur.peek() == Some(b'^') {
        cur.pos += 1;
        throws.push(cur.type_sig()?);
    }
    if !cur.at_end() {
        return Err(cur.error());
    }
    Ok(MethodSignature { type_parameters, parameters, return_type, throws })
}

/// Parses a field `Signature` attribute value.
///
/// # Errors
///
/// Returns [`ParseError::BadSignature`] on malformed input.
pub fn parse_field_signature(raw: &str) -> Result<TypeSig, ParseError> {
    let mut cur = SignatureCursor::new(raw);
    let sig = cur.type_sig()?;
    if !cur.at_end() {
        return Err(cur.error());
    }
    Ok(sig)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_class_signature() {
        let sig = parse_class_signature("Ljava/lang/Object;Ljava/lang/Comparable;").unwrap();
        assert!(sig.type_parameters.is_empty());
        assert_eq!(sig.superclass.name, "java.lang.Object");
        assert_eq!(sig.interfaces.len(), 1);
        assert_eq!(sig.interfaces[0].name, "java.lang.Comparable");
    }

    #[test]
    fn parses_bounded_type_parameter() {
        let sig =
            parse_class_signature("<T:Ljava/lang/Number;:Ljava/io/Serializable;>Ljava/lang/Object;")
                .unwrap();
        assert_eq!(sig.type_parameters.len(), 1);
        let param = &sig.type_parameters[0];
        assert_eq!(param.name, "T");
        assert!(param.class_bound.is_some());
        assert_eq!(param.interface_bounds.len(), 1);
        assert_eq!(
            sig.bound_class_names(),
            vec!["java.lang.Number".to_owned(), "java.io.Serializable".to_owned()]
        );
    }

    #[test]
    fn parses_interface_only_bound() {
        let sig =
            parse_class_signature("<E:Ljava/lang/Object;T::Ljava/lang/Runnable;>Ljava/lang/Object;")
                .unwrap();
        let param = &sig.type_parameters[1];
        assert!(param.class_bound.is_none());
        assert_eq!(param.interface_bounds.len(), 1);
    }

    #[test]
    fn parses_parameterized_superclass() {
        let sig = parse_class_signature(
            "Ljava/util/AbstractList<Ljava/lang/String;>;Ljava/util/RandomAccess;",
        )
        .unwrap();
        assert_eq!(sig.superclass.name, "java.util.AbstractList");
        assert_eq!(sig.superclass.type_arguments.len(), 1);
    }

    #[test]
    fn parses_method_signature_with_throws() {
        let sig = parse_method_signature(
            "<T:Ljava/lang/Object;>(TT;Ljava/util/List<+Ljava/lang/Number;>;)TT;^Ljava/io/IOException;",
        )
        .unwrap();
        assert_eq!(sig.type_parameters.len(), 1);
        assert_eq!(sig.parameters.len(), 2);
        assert!(matches!(sig.return_type, Some(TypeSig::TypeVariable(ref n)) if n == "T"));
        assert_eq!(sig.throws.len(), 1);
        assert_eq!(sig.bound_class_names(), vec!["java.lang.Object".to_owned()]);
    }

    #[test]
    fn parses_void_method_signature() {
        let sig = parse_method_signature("(Ljava/util/Map<TK;TV;>;)V").unwrap();
        assert_eq!(sig.return_type, None);
        assert_eq!(sig.parameters.len(), 1);
    }

    #[test]
    fn parses_wildcards() {
        let sig = parse_field_signature("Ljava/util/Map<*-Ljava/lang/Integer;>;").unwrap();
        let TypeSig::Class(class) = sig else {
            panic!("expected class type");
        };
        assert_eq!(class.type_arguments.len(), 2);
        assert!(matches!(class.type_arguments[0], TypeArg::Wildcard));
        assert!(matches!(class.type_arguments[1], TypeArg::Super(_)));
    }

    #[test]
    fn inner_class_name_uses_dollar() {
        let sig = parse_field_signature("Ljava/util/Map$Entry<TK;TV;>;").unwrap();
        let TypeSig::Class(class) = sig else {
            panic!("expected class type");
        };
        assert_eq!(class.name, "java.util.Map$Entry");
    }

    #[test]
    fn nested_suffix_after_arguments() {
        let sig = parse_field_signature("Lcom/example/Outer<TT;>.Inner;").unwrap();
        let TypeSig::Class(class) = sig else {
            panic!("expected class type");
        };
        assert_eq!(class.name, "com.example.Outer$Inner");
        assert!(class.type_arguments.is_empty());
    }

    #[test]
    fn rejects_malformed_signature() {
        assert!(parse_class_signature("<T:>Ljava/lang/Object;").is_err());
        assert!(parse_method_signature("(TT;").is_err());
        assert!(parse_field_signature("Q;").is_err());
    }

    #[test]
    fn generic_references_skip_erased_outer_types() {
        let sig = parse_method_signature(
            "(Ljava/util/List<Ljava/lang/Long;>;)Ljava/util/Map<TK;Lcom/example/Foo;>;",
        )
        .unwrap();
        // List and Map are erased types; only their arguments are generic
        // references.
        assert_eq!(
            sig.generic_reference_names(),
            vec!["java.lang.Long".to_owned(), "com.example.Foo".to_owned()]
        );
    }

    #[test]
    fn collects_array_and_nested_argument_names() {
        let sig = parse_class_signature(
            "<T:[Ljava/lang/String;:Ljava/util/List<Ljava/lang/Long;>;>Ljava/lang/Object;",
        )
        .unwrap();
        assert_eq!(
            sig.bound_class_names(),
            vec![
                "java.lang.String".to_owned(),
                "java.util.List".to_owned(),
                "java.lang.Long".to_owned(),
            ]
        );
    }
}

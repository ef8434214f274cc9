//! The resolved class graph.
//!
//! A [`ClassUniverse`] is an arena of [`ClassNode`]s indexed by fully
//! qualified name. Nodes reference each other by [`ClassId`], which keeps
//! the inevitable hierarchy and dependency cycles representable without
//! ownership cycles. The universe is mutated only during the two-phase
//! import; the public surface is read-only.

use std::collections::HashMap;

use serde::Serialize;

use crate::parser::signature::ClassSignature;
use crate::raw::{AccessFlags, RawAnnotation, RawClassRecord};

/// Arena index of a class node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClassId(pub(crate) usize);

impl ClassId {
    /// The underlying arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Arena index of a member within its owner class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MemberId {
    /// Owning class.
    pub class: ClassId,
    /// Position in the owner's member list.
    pub index: usize,
}

/// What kind of member a [`MemberNode`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MemberKind {
    /// A field.
    Field,
    /// A method.
    Method,
    /// A constructor (`<init>`).
    Constructor,
    /// A static initializer (`<clinit>`).
    Initializer,
}

impl MemberKind {
    pub(crate) fn of_method(name: &str) -> Self {
        match name {
            "<init>" => Self::Constructor,
            "<clinit>" => Self::Initializer,
            _ => Self::Method,
        }
    }
}

/// A field, method, constructor or initializer of a resolved class.
#[derive(Debug, Clone, Serialize)]
pub struct MemberNode {
    /// Owning class (back-reference).
    pub owner: ClassId,
    /// Member kind.
    pub kind: MemberKind,
    /// Member name as declared (`<init>` for constructors).
    pub name: String,
    /// Raw field or method descriptor.
    pub descriptor: String,
    /// Access flags.
    pub access: AccessFlags,
    /// Declared annotations.
    pub annotations: Vec<RawAnnotation>,
    /// First source line of the declaration, when known.
    pub line: Option<u32>,
}

/// The kind of a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DependencyKind {
    /// Superclass edge.
    Extends,
    /// Interface implementation edge.
    Implements,
    /// Field read access.
    FieldRead,
    /// Field write access.
    FieldWrite,
    /// Method invocation.
    MethodCall,
    /// Constructor invocation.
    ConstructorCall,
    /// Annotation applied to a class or member.
    AnnotationUse,
    /// Type referenced by a generic type-parameter bound or argument.
    GenericBound,
    /// `checkcast` target.
    TypeCast,
    /// `instanceof` target.
    InstanceOfCheck,
    /// Array creation component type.
    ArrayComponentType,
}

impl DependencyKind {
    /// Stable display name used in reports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Extends => "extends",
            Self::Implements => "implements",
            Self::FieldRead => "field read",
            Self::FieldWrite => "field write",
            Self::MethodCall => "method call",
            Self::ConstructorCall => "constructor call",
            Self::AnnotationUse => "annotation",
            Self::GenericBound => "generic bound",
            Self::TypeCast => "type cast",
            Self::InstanceOfCheck => "instanceof",
            Self::ArrayComponentType => "array component",
        }
    }
}

/// How a dependency target was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Resolution {
    /// Exact member (or class) match.
    Exact,
    /// Name and arity matched but not the full signature.
    BestEffort,
    /// Target class was never parsed; the edge points at a stub.
    External,
}

/// The origin of a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DependencyOrigin {
    /// The class itself (hierarchy, class-level annotations, bounds).
    Class(ClassId),
    /// A specific member body or declaration.
    Member(MemberId),
}

impl DependencyOrigin {
    /// The class the dependency originates from.
    #[must_use]
    pub fn class_id(self) -> ClassId {
        match self {
            Self::Class(id) => id,
            Self::Member(member) => member.class,
        }
    }
}

/// One resolved dependency edge.
#[derive(Debug, Clone, Serialize)]
pub struct Dependency {
    /// Where the dependency originates.
    pub origin: DependencyOrigin,
    /// Referenced class.
    pub target_class: ClassId,
    /// Referenced member, when the dependency targets one.
    pub target_member: Option<MemberId>,
    /// Edge kind.
    pub kind: DependencyKind,
    /// Source line of the access site, when known.
    pub line: Option<u32>,
    /// Resolution quality.
    pub resolution: Resolution,
}

/// Incoming edge back-reference: `dependencies()[index]` of `origin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BackRef {
    /// Class the edge originates from.
    pub origin: ClassId,
    /// Index into the origin's dependency list.
    pub index: usize,
}

/// Hierarchy, members and metadata of a fully resolved class.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedClass {
    /// Class access flags.
    pub access: AccessFlags,
    /// Resolved superclass, `None` for `java.lang.Object` and module-info.
    pub superclass: Option<ClassId>,
    /// Resolved directly implemented interfaces, in declaration order.
    pub interfaces: Vec<ClassId>,
    /// Class-level annotations.
    pub annotations: Vec<RawAnnotation>,
    /// Parsed generic class signature, if declared.
    pub signature: Option<ClassSignature>,
    /// Members in declaration order, fields first.
    pub members: Vec<MemberNode>,
    /// Source file name, when recorded.
    pub source_file: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
enum NodeState {
    /// Pass-1 shell still carrying its raw record.
    Shell(Box<RawClassRecord>),
    /// Fully resolved after pass 2.
    Resolved(Box<ResolvedClass>),
    /// Referenced but never parsed. Permanent.
    Stub,
}

/// One class in the universe.
#[derive(Debug, Clone, Serialize)]
pub struct ClassNode {
    /// Fully qualified class name.
    pub name: String,
    state: NodeState,
    dependencies: Vec<Dependency>,
    dependents: Vec<BackRef>,
}

impl ClassNode {
    /// Whether this class was referenced but never parsed.
    #[must_use]
    pub fn is_stub(&self) -> bool {
        matches!(self.state, NodeState::Stub)
    }

    /// Resolved data, `None` for stubs (and shells mid-import).
    #[must_use]
    pub fn resolved(&self) -> Option<&ResolvedClass> {
        match &self.state {
            NodeState::Resolved(resolved) => Some(resolved),
            _ => None,
        }
    }

    /// Outgoing dependency edges in resolution order.
    #[must_use]
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Incoming edge back-references.
    #[must_use]
    pub fn dependents(&self) -> &[BackRef] {
        &self.dependents
    }
}

/// Aggregate universe statistics for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct UniverseStats {
    /// Number of analyzed (resolved) classes.
    pub classes: usize,
    /// Number of stub classes.
    pub stubs: usize,
    /// Total member count across resolved classes.
    pub members: usize,
    /// Total dependency edge count.
    pub dependencies: usize,
    /// Edge counts per kind, in a stable order.
    pub by_kind: Vec<(DependencyKind, usize)>,
}

/// Arena of class nodes with a name index.
///
/// Exactly one node exists per fully qualified name. After the import
/// freezes the universe, [`ClassUniverse::get`] of an unknown name returns
/// `None`; nothing creates nodes afterwards.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ClassUniverse {
    nodes: Vec<ClassNode>,
    #[serde(skip)]
    index: HashMap<String, ClassId>,
}

impl ClassUniverse {
    /// Looks up a class by fully qualified name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ClassId> {
        self.index.get(name).copied()
    }

    /// The node behind an id.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this universe.
    #[must_use]
    pub fn node(&self, id: ClassId) -> &ClassNode {
        &self.nodes[id.0]
    }

    /// The member behind an id.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this universe.
    #[must_use]
    pub fn member(&self, id: MemberId) -> &MemberNode {
        let resolved = self.nodes[id.class.0]
            .resolved()
            .unwrap_or_else(|| panic!("member id on unresolved class"));
        &resolved.members[id.index]
    }

    /// All class ids in arena (import) order.
    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        (0..self.nodes.len()).map(ClassId)
    }

    /// All nodes in arena order.
    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &ClassNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (ClassId(i), n))
    }

    /// Number of nodes, stubs included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the universe holds no nodes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Aggregate statistics over the whole universe.
    #[must_use]
    pub fn stats(&self) -> UniverseStats {
        let mut classes = 0;
        let mut stubs = 0;
        let mut members = 0;
        let mut dependencies = 0;
        let mut kinds: HashMap<DependencyKind, usize> = HashMap::new();
        for node in &self.nodes {
            if node.is_stub() {
                stubs += 1;
            } else {
                classes += 1;
            }
            if let Some(resolved) = node.resolved() {
                members += resolved.members.len();
            }
            dependencies += node.dependencies.len();
            for dep in &node.dependencies {
                *kinds.entry(dep.kind).or_default() += 1;
            }
        }
        let mut by_kind: Vec<_> = kinds.into_iter().collect();
        by_kind.sort_by_key(|&(kind, _)| kind.label());
        UniverseStats { classes, stubs, members, dependencies, by_kind }
    }

    pub(crate) fn insert_shell(
        &mut self,
        record: RawClassRecord,
    ) -> Result<ClassId, ClassId> {
        if let Some(&existing) = self.index.get(&record.name) {
            return Err(existing);
        }
        let id = ClassId(self.nodes.len());
        self.index.insert(record.name.clone(), id);
        self.nodes.push(ClassNode {
            name: record.name.clone(),
            state: NodeState::Shell(Box::new(record)),
            dependencies: Vec::new(),
            dependents: Vec::new(),
        });
        Ok(id)
    }

    /// Gets the node for `name`, creating a stub when absent. Existing
    /// shells and resolved nodes are never downgraded.
    pub(crate) fn intern(&mut self, name: &str) -> ClassId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = ClassId(self.nodes.len());
        self.index.insert(name.to_owned(), id);
        self.nodes.push(ClassNode {
            name: name.to_owned(),
            state: NodeState::Stub,
            dependencies: Vec::new(),
            dependents: Vec::new(),
        });
        id
    }

    /// Takes a shell's raw record for resolution, leaving a stub marker
    /// that [`promote`](Self::promote) replaces.
    pub(crate) fn take_record(&mut self, id: ClassId) -> Option<RawClassRecord> {
        let node = &mut self.nodes[id.0];
        if !matches!(node.state, NodeState::Shell(_)) {
            return None;
        }
        match std::mem::replace(&mut node.state, NodeState::Stub) {
            NodeState::Shell(record) => Some(*record),
            _ => None,
        }
    }

    pub(crate) fn promote(&mut self, id: ClassId, resolved: ResolvedClass) {
        self.nodes[id.0].state = NodeState::Resolved(Box::new(resolved));
    }

    /// Appends a dependency edge, wiring the target's back-reference.
    pub(crate) fn push_dependency(&mut self, dep: Dependency) {
        let origin = dep.origin.class_id();
        let target = dep.target_class;
        let index = self.nodes[origin.0].dependencies.len();
        self.nodes[origin.0].dependencies.push(dep);
        self.nodes[target.0].dependents.push(BackRef { origin, index });
    }
}

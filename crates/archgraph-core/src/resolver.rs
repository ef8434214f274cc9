//! Pass-2 resolution: hierarchy linking, member construction and
//! dependency edges.
//!
//! Structure resolution ([`build_structure`]) runs for every shell before
//! any dependency is linked, so member lookups during
//! [`link_dependencies`] always see the complete hierarchy.

use std::collections::HashSet;

use tracing::warn;

use crate::importer::ImportWarning;
use crate::parser::descriptor::parameter_count;
use crate::raw::{RawAccess, RawAccessKind, RawAnnotation, RawClassRecord};
use crate::universe::{
    ClassId, ClassUniverse, Dependency, DependencyKind, DependencyOrigin, MemberId, MemberKind,
    MemberNode, Resolution, ResolvedClass,
};

/// Builds the resolved structure for one shell: supertype and interface
/// names become ids (stubs interned on first sight) and declared members
/// become [`MemberNode`]s.
pub(crate) fn build_structure(
    universe: &mut ClassUniverse,
    id: ClassId,
    record: &RawClassRecord,
) -> ResolvedClass {
    let superclass = record.superclass.as_deref().map(|name| universe.intern(name));
    let interfaces = record
        .interfaces
        .iter()
        .map(|name| universe.intern(name))
        .collect();

    let mut members = Vec::with_capacity(record.fields.len() + record.methods.len());
    for field in &record.fields {
        members.push(MemberNode {
            owner: id,
            kind: MemberKind::Field,
            name: field.name.clone(),
            descriptor: field.descriptor.clone(),
            access: field.access,
            annotations: field.annotations.clone(),
            line: None,
        });
    }
    for method in &record.methods {
        members.push(MemberNode {
            owner: id,
            kind: MemberKind::of_method(&method.name),
            name: method.name.clone(),
            descriptor: method.descriptor.clone(),
            access: method.access,
            annotations: method.annotations.clone(),
            line: method.line,
        });
    }

    ResolvedClass {
        access: record.access,
        superclass,
        interfaces,
        annotations: record.annotations.clone(),
        signature: record.signature.clone(),
        members,
        source_file: record.source_file.clone(),
    }
}

/// Links every dependency edge originating from one resolved class.
pub(crate) fn link_dependencies(
    universe: &mut ClassUniverse,
    id: ClassId,
    record: &RawClassRecord,
    warnings: &mut Vec<ImportWarning>,
) {
    let (superclass, interfaces) = {
        let resolved = universe
            .node(id)
            .resolved()
            .map(|r| (r.superclass, r.interfaces.clone()));
        resolved.map_or((None, Vec::new()), |(s, i)| (s, i))
    };

    if let Some(target) = superclass {
        push_class_edge(universe, DependencyOrigin::Class(id), target, DependencyKind::Extends);
    }
    for target in interfaces {
        push_class_edge(universe, DependencyOrigin::Class(id), target, DependencyKind::Implements);
    }

    link_annotations(universe, DependencyOrigin::Class(id), &record.annotations);
    if let Some(signature) = &record.signature {
        link_generic_names(universe, DependencyOrigin::Class(id), signature.generic_reference_names());
    }

    for (index, field) in record.fields.iter().enumerate() {
        let origin = DependencyOrigin::Member(MemberId { class: id, index });
        link_annotations(universe, origin, &field.annotations);
        if let Some(signature) = &field.signature {
            let mut names = Vec::new();
            signature.collect_argument_class_names(&mut names);
            link_generic_names(universe, origin, names);
        }
    }

    let field_count = record.fields.len();
    for (offset, method) in record.methods.iter().enumerate() {
        let origin = DependencyOrigin::Member(MemberId { class: id, index: field_count + offset });
        link_annotations(universe, origin, &method.annotations);
        if let Some(signature) = &method.signature {
            link_generic_names(universe, origin, signature.generic_reference_names());
        }
        for access in &method.accesses {
            link_access(universe, origin, access, warnings);
        }
    }
}

fn push_class_edge(
    universe: &mut ClassUniverse,
    origin: DependencyOrigin,
    target: ClassId,
    kind: DependencyKind,
) {
    let resolution = if universe.node(target).is_stub() {
        Resolution::External
    } else {
        Resolution::Exact
    };
    universe.push_dependency(Dependency {
        origin,
        target_class: target,
        target_member: None,
        kind,
        line: None,
        resolution,
    });
}

fn link_annotations(
    universe: &mut ClassUniverse,
    origin: DependencyOrigin,
    annotations: &[RawAnnotation],
) {
    for annotation in annotations {
        let target = universe.intern(&annotation.type_name);
        push_class_edge(universe, origin, target, DependencyKind::AnnotationUse);
    }
}

fn link_generic_names(universe: &mut ClassUniverse, origin: DependencyOrigin, names: Vec<String>) {
    for name in names {
        let target = universe.intern(&name);
        push_class_edge(universe, origin, target, DependencyKind::GenericBound);
    }
}

fn link_access(
    universe: &mut ClassUniverse,
    origin: DependencyOrigin,
    access: &RawAccess,
    warnings: &mut Vec<ImportWarning>,
) {
    let target = universe.intern(&access.target_class);
    let kind = match access.kind {
        RawAccessKind::FieldRead => DependencyKind::FieldRead,
        RawAccessKind::FieldWrite => DependencyKind::FieldWrite,
        RawAccessKind::MethodCall => DependencyKind::MethodCall,
        RawAccessKind::ConstructorCall => DependencyKind::ConstructorCall,
        RawAccessKind::TypeCast => DependencyKind::TypeCast,
        RawAccessKind::InstanceOf => DependencyKind::InstanceOfCheck,
        RawAccessKind::ArrayComponent => DependencyKind::ArrayComponentType,
    };

    let Some(member_ref) = &access.member else {
        universe.push_dependency(Dependency {
            origin,
            target_class: target,
            target_member: None,
            kind,
            line: access.line,
            resolution: if universe.node(target).is_stub() {
                Resolution::External
            } else {
                Resolution::Exact
            },
        });
        return;
    };

    if universe.node(target).is_stub() {
        universe.push_dependency(Dependency {
            origin,
            target_class: target,
            target_member: None,
            kind,
            line: access.line,
            resolution: Resolution::External,
        });
        return;
    }

    let want_field =
        matches!(access.kind, RawAccessKind::FieldRead | RawAccessKind::FieldWrite);
    let (target_member, resolution) = match resolve_member(
        universe,
        target,
        &member_ref.name,
        &member_ref.descriptor,
        want_field,
    ) {
        Some(member) => (Some(member), Resolution::Exact),
        None => {
            let fallback = best_effort_member(
                universe,
                target,
                &member_ref.name,
                &member_ref.descriptor,
                want_field,
            );
            let origin_name = universe.node(origin.class_id()).name.clone();
            let target_name = universe.node(target).name.clone();
            warn!(
                origin = %origin_name,
                target = %target_name,
                member = %member_ref.name,
                "member signature not found, using best-effort match"
            );
            warnings.push(ImportWarning::AmbiguousMember {
                origin: origin_name,
                target: target_name,
                member: member_ref.name.clone(),
                descriptor: member_ref.descriptor.clone(),
            });
            (fallback, Resolution::BestEffort)
        }
    };

    universe.push_dependency(Dependency {
        origin,
        target_class: target,
        target_member,
        kind,
        line: access.line,
        resolution,
    });
}

/// Hierarchy traversal order from a static receiver type: the type itself,
/// then the superclass subtree, then each declared interface subtree left
/// to right. Each type is visited once at its first position.
fn hierarchy_preorder(universe: &ClassUniverse, start: ClassId) -> Vec<ClassId> {
    fn visit(
        universe: &ClassUniverse,
        id: ClassId,
        seen: &mut HashSet<ClassId>,
        order: &mut Vec<ClassId>,
    ) {
        if !seen.insert(id) {
            return;
        }
        order.push(id);
        if let Some(resolved) = universe.node(id).resolved() {
            if let Some(superclass) = resolved.superclass {
                visit(universe, superclass, seen, order);
            }
            for &interface in &resolved.interfaces {
                visit(universe, interface, seen, order);
            }
        }
    }
    let mut order = Vec::new();
    visit(universe, start, &mut HashSet::new(), &mut order);
    order
}

/// Whether `sub` is a strict subtype of `sup`.
fn is_strict_subtype(universe: &ClassUniverse, sub: ClassId, sup: ClassId) -> bool {
    sub != sup && hierarchy_preorder(universe, sub).contains(&sup)
}

/// Resolves `(name, descriptor)` from the static type `start`.
///
/// Candidates are every declaration reachable through the hierarchy. A
/// candidate whose owner is a strict subtype of another candidate's owner
/// shadows it; among unshadowed candidates the first in hierarchy preorder
/// wins.
pub(crate) fn resolve_member(
    universe: &ClassUniverse,
    start: ClassId,
    name: &str,
    descriptor: &str,
    want_field: bool,
) -> Option<MemberId> {
    let candidates = collect_candidates(universe, start, |member| {
        member_matches_kind(member, want_field) && member.name == name && member.descriptor == descriptor
    });
    select_unshadowed(universe, &candidates)
}

/// Name-plus-arity fallback used when no exact signature exists in the
/// target hierarchy.
fn best_effort_member(
    universe: &ClassUniverse,
    start: ClassId,
    name: &str,
    descriptor: &str,
    want_field: bool,
) -> Option<MemberId> {
    let arity = parameter_count(descriptor);
    let candidates = collect_candidates(universe, start, |member| {
        if !member_matches_kind(member, want_field) || member.name != name {
            return false;
        }
        if want_field {
            return true;
        }
        match (arity, parameter_count(&member.descriptor)) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    });
    select_unshadowed(universe, &candidates)
}

fn member_matches_kind(member: &MemberNode, want_field: bool) -> bool {
    if want_field {
        member.kind == MemberKind::Field
    } else {
        matches!(member.kind, MemberKind::Method | MemberKind::Constructor)
    }
}

fn collect_candidates(
    universe: &ClassUniverse,
    start: ClassId,
    matches: impl Fn(&MemberNode) -> bool,
) -> Vec<MemberId> {
    let mut candidates = Vec::new();
    for class in hierarchy_preorder(universe, start) {
        if let Some(resolved) = universe.node(class).resolved() {
            for (index, member) in resolved.members.iter().enumerate() {
                if matches(member) {
                    candidates.push(MemberId { class, index });
                }
            }
        }
    }
    candidates
}

fn select_unshadowed(universe: &ClassUniverse, candidates: &[MemberId]) -> Option<MemberId> {
    candidates
        .iter()
        .find(|candidate| {
            !candidates.iter().any(|other| {
                other.class != candidate.class
                    && is_strict_subtype(universe, other.class, candidate.class)
            })
        })
        .copied()
}

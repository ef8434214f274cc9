//! Slice partitioning and cycle detection.
//!
//! A slice pattern groups classes by regex capture values over their fully
//! qualified names. The derived values form a pipeline of pure stages:
//! [`SlicePartition`] assigns classes to slices, [`SliceGraph`] aggregates
//! class dependencies into slice edges with bounded evidence, and
//! [`SliceGraph::find_cycles`] reports one minimal closed walk per
//! strongly connected component. Every stage is re-derivable from the
//! frozen universe and immutable once built.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::universe::{ClassId, ClassUniverse, DependencyKind};

/// An invalid slice rule.
#[derive(Debug, Error)]
pub enum SliceError {
    /// The pattern is not a valid regex.
    #[error("invalid slice pattern {pattern:?}")]
    InvalidPattern {
        /// The offending pattern text.
        pattern: String,
        /// The regex compile error.
        #[source]
        source: Box<regex::Error>,
    },
    /// The pattern has no capture group to slice by.
    #[error("slice pattern {pattern:?} must contain at least one capture group")]
    NoCaptureGroup {
        /// The offending pattern text.
        pattern: String,
    },
    /// The name template references a capture group the pattern lacks.
    #[error("name template references group ${index} but the pattern captures {groups}")]
    BadTemplateIndex {
        /// The referenced group number.
        index: usize,
        /// Number of groups the pattern actually captures.
        groups: usize,
    },
}

/// A compiled slice rule: anchored capture-group pattern plus an optional
/// display-name template with `$1`-style placeholders.
#[derive(Debug, Clone)]
pub struct SlicePattern {
    regex: Regex,
    groups: usize,
    template: Option<String>,
}

impl SlicePattern {
    /// Compiles a pattern. The regex is matched against whole class names.
    ///
    /// # Errors
    ///
    /// Returns [`SliceError::InvalidPattern`] for malformed regexes and
    /// [`SliceError::NoCaptureGroup`] when nothing is captured.
    pub fn new(pattern: &str) -> Result<Self, SliceError> {
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
            SliceError::InvalidPattern {
                pattern: pattern.to_owned(),
                source: Box::new(source),
            }
        })?;
        let groups = regex.captures_len() - 1;
        if groups == 0 {
            return Err(SliceError::NoCaptureGroup { pattern: pattern.to_owned() });
        }
        Ok(Self { regex, groups, template: None })
    }

    /// Sets a display-name template such as `"module $1"`.
    ///
    /// # Errors
    ///
    /// Returns [`SliceError::BadTemplateIndex`] when the template references
    /// a group the pattern does not capture.
    pub fn with_name_template(mut self, template: &str) -> Result<Self, SliceError> {
        for index in template_group_refs(template) {
            if index == 0 || index > self.groups {
                return Err(SliceError::BadTemplateIndex { index, groups: self.groups });
            }
        }
        self.template = Some(template.to_owned());
        Ok(self)
    }

    /// The slice key for a class name, `None` when the name does not match.
    #[must_use]
    pub fn slice_key(&self, class_name: &str) -> Option<SliceKey> {
        let captures = self.regex.captures(class_name)?;
        let values = (1..=self.groups)
            .map(|i| captures.get(i).map_or(String::new(), |m| m.as_str().to_owned()))
            .collect();
        Some(SliceKey(values))
    }

    fn display_name(&self, key: &SliceKey) -> String {
        match &self.template {
            None => key.to_string(),
            Some(template) => {
                let mut name = template.clone();
                // Replace higher group numbers first so $12 is not eaten
                // by $1.
                for index in (1..=self.groups).rev() {
                    name = name.replace(
                        &format!("${index}"),
                        key.0.get(index - 1).map_or("", String::as_str),
                    );
                }
                name
            }
        }
    }
}

fn template_group_refs(template: &str) -> Vec<usize> {
    let mut refs = Vec::new();
    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' {
            let digits: String = template[i + 1..]
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            if let Ok(index) = digits.parse::<usize>() {
                refs.push(index);
                i += digits.len();
            }
        }
        i += 1;
    }
    refs
}

/// Ordered captured group values identifying one slice.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SliceKey(pub Vec<String>);

impl fmt::Display for SliceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// One slice: its key, display name and member classes.
#[derive(Debug, Clone, Serialize)]
pub struct Slice {
    /// Captured group values.
    pub key: SliceKey,
    /// Human-readable name (template-rendered when one was given).
    pub name: String,
    /// Member classes in universe order.
    pub classes: Vec<ClassId>,
}

/// The result of assigning every matching class to exactly one slice.
#[derive(Debug, Clone)]
pub struct SlicePartition {
    slices: Vec<Slice>,
    membership: HashMap<ClassId, usize>,
}

impl SlicePartition {
    /// Partitions the universe's classes by the pattern. Non-matching
    /// classes are excluded from the slice universe.
    #[must_use]
    pub fn partition(universe: &ClassUniverse, pattern: &SlicePattern) -> Self {
        let mut by_key: HashMap<SliceKey, Vec<ClassId>> = HashMap::new();
        for (id, node) in universe.classes() {
            if let Some(key) = pattern.slice_key(&node.name) {
                by_key.entry(key).or_default().push(id);
            }
        }
        let mut slices: Vec<Slice> = by_key
            .into_iter()
            .map(|(key, classes)| Slice {
                name: pattern.display_name(&key),
                key,
                classes,
            })
            .collect();
        slices.sort_by(|a, b| a.key.cmp(&b.key));

        let mut membership = HashMap::new();
        for (index, slice) in slices.iter().enumerate() {
            for &class in &slice.classes {
                membership.insert(class, index);
            }
        }
        debug!(slices = slices.len(), "partitioned universe into slices");
        Self { slices, membership }
    }

    /// Slices in key order.
    #[must_use]
    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    /// The slice a class belongs to, if it matched the pattern.
    #[must_use]
    pub fn slice_of(&self, class: ClassId) -> Option<usize> {
        self.membership.get(&class).copied()
    }
}

/// One example dependency carried as edge evidence.
#[derive(Debug, Clone, Serialize)]
pub struct Evidence {
    /// Originating class name.
    pub origin: String,
    /// Target class name.
    pub target: String,
    /// Dependency kind.
    pub kind: DependencyKind,
    /// Referenced member name, when the dependency targets one.
    pub member: Option<String>,
    /// Source line of the access site, when known.
    pub line: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
struct EdgeData {
    evidence: Vec<Evidence>,
    total: usize,
}

/// Directed graph of slices with bounded per-edge evidence.
#[derive(Debug)]
pub struct SliceGraph {
    slice_names: Vec<String>,
    graph: DiGraph<usize, EdgeData>,
    nodes: Vec<NodeIndex>,
}

impl SliceGraph {
    /// Aggregates class dependencies into slice edges. An edge exists for
    /// every ordered slice pair with at least one underlying dependency;
    /// dependencies within one slice are not edges. Each edge keeps at most
    /// `evidence_limit` examples; the remainder is counted, not retained.
    #[must_use]
    pub fn build(
        universe: &ClassUniverse,
        partition: &SlicePartition,
        evidence_limit: usize,
    ) -> Self {
        let mut graph = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..partition.slices().len())
            .map(|index| graph.add_node(index))
            .collect();

        for slice in partition.slices() {
            for &class in &slice.classes {
                let Some(from) = partition.slice_of(class) else { continue };
                for dep in universe.node(class).dependencies() {
                    let Some(to) = partition.slice_of(dep.target_class) else {
                        continue;
                    };
                    if from == to {
                        continue;
                    }
                    let edge = match graph.find_edge(nodes[from], nodes[to]) {
                        Some(edge) => edge,
                        None => graph.add_edge(
                            nodes[from],
                            nodes[to],
                            EdgeData { evidence: Vec::new(), total: 0 },
                        ),
                    };
                    let data = &mut graph[edge];
                    data.total += 1;
                    if data.evidence.len() < evidence_limit {
                        data.evidence.push(Evidence {
                            origin: universe.node(dep.origin.class_id()).name.clone(),
                            target: universe.node(dep.target_class).name.clone(),
                            kind: dep.kind,
                            member: dep
                                .target_member
                                .map(|member| universe.member(member).name.clone()),
                            line: dep.line,
                        });
                    }
                }
            }
        }

        let slice_names = partition
            .slices()
            .iter()
            .map(|slice| slice.name.clone())
            .collect();
        Self { slice_names, graph, nodes }
    }

    /// Number of slice nodes.
    #[must_use]
    pub fn slice_count(&self) -> usize {
        self.slice_names.len()
    }

    /// Detects slice cycles: every strongly connected component with more
    /// than one slice is a violation, reported as one minimal closed walk
    /// through each participating slice.
    #[must_use]
    pub fn find_cycles(&self) -> Vec<SliceCycle> {
        let mut cycles = Vec::new();
        for mut component in tarjan_scc(&self.graph) {
            if component.len() < 2 {
                continue;
            }
            component.sort_by(|&a, &b| {
                self.slice_names[self.graph[a]].cmp(&self.slice_names[self.graph[b]])
            });
            if let Some(cycle) = self.minimal_walk(&component) {
                cycles.push(cycle);
            }
        }
        cycles.sort_by(|a, b| a.slices.cmp(&b.slices));
        cycles
    }

    /// Builds a closed walk visiting every component member: successive
    /// shortest paths inside the component, closed back to the start.
    fn minimal_walk(&self, component: &[NodeIndex]) -> Option<SliceCycle> {
        let members: HashSet<NodeIndex> = component.iter().copied().collect();
        let start = *component.first()?;
        let mut walk = vec![start];
        let mut current = start;
        for &next in &component[1..] {
            if walk.contains(&next) {
                continue;
            }
            let path = self.shortest_path(current, next, &members)?;
            walk.extend(path.into_iter().skip(1));
            current = next;
        }
        let closing = self.shortest_path(current, start, &members)?;
        walk.extend(closing.into_iter().skip(1));

        let mut edges = Vec::with_capacity(walk.len().saturating_sub(1));
        for pair in walk.windows(2) {
            let edge = self.graph.find_edge(pair[0], pair[1])?;
            let data = &self.graph[edge];
            edges.push(CycleEdge {
                from: self.slice_names[self.graph[pair[0]]].clone(),
                to: self.slice_names[self.graph[pair[1]]].clone(),
                evidence: data.evidence.clone(),
                total: data.total,
            });
        }
        let slices = walk
            .iter()
            .map(|&node| self.slice_names[self.graph[node]].clone())
            .collect();
        Some(SliceCycle { slices, edges })
    }

    /// BFS shortest path restricted to component members.
    fn shortest_path(
        &self,
        from: NodeIndex,
        to: NodeIndex,
        members: &HashSet<NodeIndex>,
    ) -> Option<Vec<NodeIndex>> {
        let mut queue = VecDeque::new();
        let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        queue.push_back(from);
        let mut seen = HashSet::new();
        seen.insert(from);
        while let Some(node) = queue.pop_front() {
            let mut neighbors: Vec<NodeIndex> = self
                .graph
                .neighbors(node)
                .filter(|n| members.contains(n))
                .collect();
            neighbors.sort_by(|&a, &b| {
                self.slice_names[self.graph[a]].cmp(&self.slice_names[self.graph[b]])
            });
            for next in neighbors {
                if next == to {
                    let mut path = vec![to, node];
                    let mut back = node;
                    while back != from {
                        back = parent[&back];
                        path.push(back);
                    }
                    path.reverse();
                    return Some(path);
                }
                if seen.insert(next) {
                    parent.insert(next, node);
                    queue.push_back(next);
                }
            }
        }
        None
    }
}

/// One edge of a reported cycle walk.
#[derive(Debug, Clone, Serialize)]
pub struct CycleEdge {
    /// Origin slice name.
    pub from: String,
    /// Target slice name.
    pub to: String,
    /// Up to the configured cap of example dependencies.
    pub evidence: Vec<Evidence>,
    /// True number of underlying dependencies on this edge.
    pub total: usize,
}

/// A slice cycle violation: one closed walk through every slice of an SCC.
#[derive(Debug, Clone, Serialize)]
pub struct SliceCycle {
    /// Slice names along the walk; first and last are equal.
    pub slices: Vec<String>,
    /// Walk edges with evidence.
    pub edges: Vec<CycleEdge>,
}

impl SliceCycle {
    /// Human-readable walk description such as `a -> b -> c -> a`.
    #[must_use]
    pub fn describe(&self) -> String {
        self.slices.join(" -> ")
    }
}

//! Dependency cycle detection and breaking
//!
//! Edges run from a consumer configuration to the enabled configuration whose
//! provided service would satisfy one of its references. A cycle containing
//! an optional edge is broken by noting "do not eagerly activate the
//! producer" on that edge's consumer. A cycle of required edges cannot be
//! broken; its terminal configuration is removed from the enabled set and
//! detection restarts on the reduced graph.

use crate::configuration::ComponentConfiguration;
use crate::reference::Reference;
use scr_domain::ConfigurationId;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::error;

/// A delay-activate note added by cycle breaking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleNote {
    /// Configuration holding the note
    pub consumer: ConfigurationId,
    /// Producer the consumer must not eagerly activate
    pub producer: ConfigurationId,
    /// Reference forming the edge
    pub reference: String,
}

/// Outcome of one cycle resolution pass
#[derive(Debug, Default)]
pub struct CycleResolution {
    /// Notes that did not exist before this pass
    pub notes: Vec<CycleNote>,
    /// Configurations removed from the enabled set
    pub removed: Vec<Arc<ComponentConfiguration>>,
}

struct Edge {
    producer: ConfigurationId,
    reference: Arc<Reference>,
}

/// Position of an edge: (consumer, index into its adjacency list)
type EdgeKey = (ConfigurationId, usize);

/// Raised by the traversal when a cycle has no optional edge
struct UnbreakableCycle {
    terminal: ConfigurationId,
    members: Vec<ConfigurationId>,
}

struct DependencyGraph {
    adjacency: BTreeMap<ConfigurationId, Vec<Edge>>,
    cut: HashSet<EdgeKey>,
}

impl DependencyGraph {
    fn build(enabled: &BTreeMap<ConfigurationId, Arc<ComponentConfiguration>>) -> Self {
        let providers: Vec<&Arc<ComponentConfiguration>> = enabled
            .values()
            .filter(|c| !c.provided_interfaces().is_empty())
            .filter(|c| !c.description().is_component_factory() || c.is_factory_instance())
            .collect();

        let adjacency = enabled
            .values()
            .map(|consumer| {
                let edges = consumer
                    .references()
                    .iter()
                    .filter_map(|reference| {
                        reference
                            .find_provider_configuration(providers.iter().copied())
                            .map(|producer| Edge {
                                producer: producer.id(),
                                reference: Arc::clone(reference),
                            })
                    })
                    .collect();
                (consumer.id(), edges)
            })
            .collect();

        Self {
            adjacency,
            cut: HashSet::new(),
        }
    }

    fn edge(&self, (consumer, index): EdgeKey) -> &Edge {
        &self.adjacency[&consumer][index]
    }

    /// Break every breakable cycle; fail on the first unbreakable one
    fn break_cycles(&mut self) -> Result<Vec<CycleNote>, UnbreakableCycle> {
        let mut notes = Vec::new();
        while let Some(cycle) = self.find_cycle() {
            let optional = cycle
                .iter()
                .copied()
                .find(|key| !self.edge(*key).reference.is_required());
            match optional {
                Some(key) => {
                    let edge = self.edge(key);
                    notes.push(CycleNote {
                        consumer: key.0,
                        producer: edge.producer,
                        reference: edge.reference.name().to_string(),
                    });
                    self.cut.insert(key);
                }
                None => {
                    let members: Vec<ConfigurationId> = cycle.iter().map(|(consumer, _)| *consumer).collect();
                    // The consumer of the closing edge
                    let Some(&terminal) = members.last() else {
                        return Ok(notes);
                    };
                    return Err(UnbreakableCycle { terminal, members });
                }
            }
        }
        Ok(notes)
    }

    /// Edges of the first cycle found, in traversal order
    fn find_cycle(&self) -> Option<Vec<EdgeKey>> {
        let mut visited = HashSet::new();
        for &start in self.adjacency.keys() {
            if visited.contains(&start) {
                continue;
            }
            let mut path = Vec::new();
            let mut path_edges = Vec::new();
            if let Some(cycle) = self.visit(start, &mut visited, &mut path, &mut path_edges) {
                return Some(cycle);
            }
        }
        None
    }

    fn visit(
        &self,
        node: ConfigurationId,
        visited: &mut HashSet<ConfigurationId>,
        path: &mut Vec<ConfigurationId>,
        path_edges: &mut Vec<EdgeKey>,
    ) -> Option<Vec<EdgeKey>> {
        visited.insert(node);
        path.push(node);

        let edges = self.adjacency.get(&node).map_or(&[][..], Vec::as_slice);
        for (index, edge) in edges.iter().enumerate() {
            let key = (node, index);
            if self.cut.contains(&key) {
                continue;
            }
            if let Some(position) = path.iter().position(|n| *n == edge.producer) {
                // path_edges[k] leads from path[k] to path[k + 1]
                let mut cycle = path_edges[position..].to_vec();
                cycle.push(key);
                return Some(cycle);
            }
            if !visited.contains(&edge.producer) {
                path_edges.push(key);
                if let Some(cycle) = self.visit(edge.producer, visited, path, path_edges) {
                    return Some(cycle);
                }
                path_edges.pop();
            }
        }

        path.pop();
        None
    }
}

/// Break or remove every dependency cycle among `enabled`
///
/// Removed configurations are taken out of `enabled`; notes are written to
/// the consumer configurations.
pub fn resolve_cycles(enabled: &mut BTreeMap<ConfigurationId, Arc<ComponentConfiguration>>) -> CycleResolution {
    let mut resolution = CycleResolution::default();
    loop {
        let mut graph = DependencyGraph::build(enabled);
        match graph.break_cycles() {
            Ok(notes) => {
                resolution.notes = notes
                    .into_iter()
                    .filter(|note| {
                        enabled
                            .get(&note.consumer)
                            .is_some_and(|consumer| consumer.add_delay_note(note.producer))
                    })
                    .collect();
                return resolution;
            }
            Err(UnbreakableCycle { terminal, members }) => {
                if let Some(configuration) = enabled.remove(&terminal) {
                    error!(
                        component = configuration.name(),
                        component_id = %terminal,
                        cycle = ?members,
                        "unbreakable dependency cycle; removing component configuration"
                    );
                    resolution.removed.push(configuration);
                }
            }
        }
    }
}

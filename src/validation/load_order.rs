//! Load-order validation
//!
//! Builds a directed graph of table references (referenced table → dependent
//! table) with petgraph and checks that the plan lists every referenced
//! table before the tables that depend on it. The plan order is never
//! changed here.

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::{Directed, Graph};
use serde::{Deserialize, Serialize};

use crate::load::LoadPlan;

/// Problems found in a load plan's ordering
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum PlanValidationError {
    #[error("Table '{0}' appears more than once in the load plan")]
    DuplicateTable(String),

    #[error("Circular table references involving '{table}'")]
    CyclicReferences { table: String },

    #[error("Table '{table}' references '{dependency}', which is loaded after it")]
    OrderViolation { table: String, dependency: String },
}

/// Check the plan's table order against its declared references
///
/// References to tables outside the plan are assumed to be loaded already and
/// only produce a warning.
pub fn validate_load_order(plan: &LoadPlan) -> Result<(), PlanValidationError> {
    let mut graph = Graph::<&str, (), Directed>::new();
    let mut positions = HashMap::new();
    let mut nodes = HashMap::new();

    for (position, descriptor) in plan.descriptors.iter().enumerate() {
        let table = descriptor.table.as_str();
        if positions.insert(table, position).is_some() {
            return Err(PlanValidationError::DuplicateTable(table.to_string()));
        }
        nodes.insert(table, graph.add_node(table));
    }

    for descriptor in &plan.descriptors {
        let dependent = nodes[descriptor.table.as_str()];
        for reference in &descriptor.references {
            match nodes.get(reference.as_str()) {
                Some(&referenced) => {
                    graph.add_edge(referenced, dependent, ());
                }
                None => tracing::warn!(
                    table = %descriptor.table,
                    reference = %reference,
                    "referenced table is not in the load plan; assuming it is already loaded"
                ),
            }
        }
    }

    if let Err(cycle) = toposort(&graph, None) {
        return Err(PlanValidationError::CyclicReferences {
            table: graph[cycle.node_id()].to_string(),
        });
    }

    for edge in graph.raw_edges() {
        let dependency = graph[edge.source()];
        let table = graph[edge.target()];
        if positions[dependency] > positions[table] {
            return Err(PlanValidationError::OrderViolation {
                table: table.to_string(),
                dependency: dependency.to_string(),
            });
        }
    }

    Ok(())
}

// src/clustering.rs
//
// Connected components over accepted match relations, computed by
// iterative label propagation in bulk-synchronous supersteps.
//
// Identifiers are mapped once into a dense index space; labels live in a
// flat array with a second buffer swapped in per superstep, so every
// neighbor read in superstep k+1 observes the fully settled labels from
// superstep k.

use std::collections::{BTreeSet, HashMap};

use log::{debug, info};

use crate::models::{Cluster, DocumentId, MatchRelation};

/// Partitions `ids` into clusters induced by `relations`.
///
/// Every input identifier lands in exactly one cluster; identifiers that
/// no relation touches become singletons. Relations referencing unknown
/// identifiers are ignored. Duplicate and mirrored relations are
/// harmless: edge insertion is idempotent with respect to the fixed
/// point.
///
/// Label propagation stops at the fixed point or after `max_iterations`
/// supersteps, whichever comes first. An exhausted bound can leave a true
/// component split across several clusters (under-merging); that is the
/// documented trade-off for bounded convergence cost, and it is never
/// silently corrected. `max_iterations = 0` yields all singletons.
pub fn connected_components(
    ids: &[DocumentId],
    relations: &[MatchRelation],
    max_iterations: usize,
) -> Vec<Cluster> {
    // Dense, deterministic vertex space: sorted unique identifiers,
    // vertex index = rank. The component label at the fixed point is the
    // minimum rank, i.e. the lexicographically smallest member id.
    let sorted: BTreeSet<&DocumentId> = ids.iter().collect();
    let vertices: Vec<&DocumentId> = sorted.into_iter().collect();
    let index_of: HashMap<&DocumentId, usize> = vertices
        .iter()
        .enumerate()
        .map(|(index, id)| (*id, index))
        .collect();

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); vertices.len()];
    let mut edges = 0usize;
    for relation in relations {
        let (Some(&a), Some(&b)) = (index_of.get(&relation.first), index_of.get(&relation.second))
        else {
            debug!(
                "Ignoring relation over unknown identifiers ({}, {})",
                relation.first, relation.second
            );
            continue;
        };
        if a == b || adjacency[a].contains(&b) {
            continue;
        }
        adjacency[a].push(b);
        adjacency[b].push(a);
        edges += 1;
    }
    debug!(
        "Clustering graph: {} vertices, {} unique edges",
        vertices.len(),
        edges
    );

    let mut labels: Vec<usize> = (0..vertices.len()).collect();
    let mut next = labels.clone();
    let mut iterations = 0usize;
    let mut converged = vertices.is_empty();

    while iterations < max_iterations {
        let mut changed = false;
        for vertex in 0..vertices.len() {
            let mut label = labels[vertex];
            for &neighbor in &adjacency[vertex] {
                if labels[neighbor] < label {
                    label = labels[neighbor];
                }
            }
            if label != labels[vertex] {
                changed = true;
            }
            next[vertex] = label;
        }
        std::mem::swap(&mut labels, &mut next);
        iterations += 1;
        if !changed {
            converged = true;
            break;
        }
    }
    if converged {
        debug!("Label propagation converged after {} supersteps", iterations);
    } else {
        info!(
            "Label propagation stopped at the {}-superstep bound; components may remain split",
            max_iterations
        );
    }

    // Regroup labels into clusters.
    let mut members_by_label: HashMap<usize, BTreeSet<DocumentId>> = HashMap::new();
    for (vertex, &label) in labels.iter().enumerate() {
        members_by_label
            .entry(label)
            .or_default()
            .insert(vertices[vertex].clone());
    }

    let mut clusters: Vec<Cluster> = members_by_label
        .into_values()
        .map(|members| {
            // Non-empty by construction.
            let id = members.iter().next().map(|m| m.0.clone()).unwrap_or_default();
            Cluster { id, members }
        })
        .collect();
    clusters.sort_by(|a, b| a.id.cmp(&b.id));
    clusters
}

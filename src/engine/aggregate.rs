use std::collections::HashSet;

use crate::model::*;

/// Turn the scanned clusters into a set of consolidated event specs plus
/// the ids of every original that must be deleted.
///
/// Singleton clusters are dropped on the floor: their source event never
/// merged, so it is neither deleted nor recreated. This keeps consolidation
/// idempotent — a second run over an already-consolidated member finds only
/// singletons and produces an empty plan.
pub fn materialize(clusters: Vec<Cluster>) -> (Vec<EventSpec>, HashSet<EventId>) {
    let mut specs = Vec::new();
    let mut touched = HashSet::new();

    for cluster in clusters {
        if !cluster.is_merged() {
            continue;
        }
        touched.extend(cluster.source_ids.iter().copied());
        let description = cluster.descriptions.concat();
        specs.push(EventSpec {
            // No separator: fragments concatenate verbatim, in scan order.
            title: cluster.titles.concat(),
            description: (!description.is_empty()).then_some(description),
            status: EventStatus::default(),
            span: cluster.span,
            participant_ids: cluster.participant_ids,
        });
    }

    (specs, touched)
}

use crate::model::*;

/// Sweep sorted intervals into maximal clusters of touching-or-overlapping
/// runs.
///
/// An interval merges into the open cluster when its start is at or before
/// the cluster's running end (closed intervals: exact boundary contact
/// merges). Chains are transitive — a bridging interval connects neighbors
/// that don't themselves overlap. An interval past the running end closes
/// the cluster and seeds the next one.
pub fn scan(sorted: &[Interval]) -> Vec<Cluster> {
    let mut clusters: Vec<Cluster> = Vec::new();
    for interval in sorted {
        if let Some(open) = clusters.last_mut()
            && interval.span.start <= open.span.end
        {
            open.absorb(interval);
            continue;
        }
        clusters.push(Cluster::seed(interval));
    }
    clusters
}

use crate::model::*;

/// Convert a member's loaded events into canonical intervals, sorted
/// ascending by start. The sort is stable, so events sharing a start keep
/// the order the store returned them in — repeated runs over identical
/// input are deterministic.
pub fn normalize(events: &[StoredEvent]) -> Vec<Interval> {
    let mut intervals: Vec<Interval> = events
        .iter()
        .map(|e| Interval {
            id: e.id,
            span: e.span,
            title: e.title.clone(),
            description: e.description.clone(),
            participant_ids: e.participant_ids.clone(),
        })
        .collect();
    intervals.sort_by_key(|i| i.span.start);
    intervals
}

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Unix milliseconds — the only time type.
pub type Ms = i64;

/// Integer surrogate keys, assigned by the store.
pub type EventId = i64;
pub type ParticipantId = i64;
/// A member is just a participant who owns a consolidation request.
pub type MemberId = ParticipantId;

/// Closed interval `[start, end]`. Two spans that touch at a boundary
/// (`a.end == b.start`) count as overlapping for consolidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start <= end, "Span start must not be after end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    /// True if the spans overlap or touch at a boundary.
    pub fn touches(&self, other: &Span) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Members and invitees are the same entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EventStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

/// An event as persisted — participants are kept as an id set and resolved
/// to full records only when building a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub id: EventId,
    pub title: String,
    pub description: Option<String>,
    pub status: EventStatus,
    pub span: Span,
    pub participant_ids: HashSet<ParticipantId>,
}

/// Canonical in-memory form the engine sweeps over. Read-only once built;
/// the engine aggregates from intervals, it never mutates one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub id: EventId,
    pub span: Span,
    pub title: String,
    pub description: Option<String>,
    pub participant_ids: HashSet<ParticipantId>,
}

/// Transient accumulator for one run of touching-or-overlapping intervals.
///
/// `span.start` is fixed by the seeding interval; `span.end` is a running
/// maximum. Titles keep scan order; descriptions keep only non-empty
/// fragments. `source_ids` records every original event absorbed, so
/// "participated in a merge" is simply `source_ids.len() >= 2`.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub span: Span,
    pub participant_ids: HashSet<ParticipantId>,
    pub titles: Vec<String>,
    pub descriptions: Vec<String>,
    pub source_ids: Vec<EventId>,
}

impl Cluster {
    pub fn seed(interval: &Interval) -> Self {
        let mut cluster = Self {
            span: interval.span,
            participant_ids: interval.participant_ids.clone(),
            titles: vec![interval.title.clone()],
            descriptions: Vec::new(),
            source_ids: vec![interval.id],
        };
        cluster.push_description(interval);
        cluster
    }

    /// Merge an interval whose start touches or precedes the cluster end.
    pub fn absorb(&mut self, interval: &Interval) {
        self.span.end = self.span.end.max(interval.span.end);
        self.participant_ids
            .extend(interval.participant_ids.iter().copied());
        self.titles.push(interval.title.clone());
        self.push_description(interval);
        self.source_ids.push(interval.id);
    }

    fn push_description(&mut self, interval: &Interval) {
        if let Some(d) = &interval.description
            && !d.is_empty()
        {
            self.descriptions.push(d.clone());
        }
    }

    /// A cluster of size >= 2 replaces its sources; a singleton leaves its
    /// source untouched in storage.
    pub fn is_merged(&self) -> bool {
        self.source_ids.len() >= 2
    }
}

/// Creation payload for one consolidated event. Never shares identity with
/// any source event; the store assigns a fresh id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSpec {
    pub title: String,
    pub description: Option<String>,
    pub status: EventStatus,
    pub span: Span,
    pub participant_ids: HashSet<ParticipantId>,
}

// ── View types returned to the service layer ─────────────────────

/// An event with its participant relations resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventView {
    pub id: EventId,
    pub title: String,
    pub description: Option<String>,
    pub status: EventStatus,
    pub span: Span,
    pub participants: Vec<Participant>,
}

/// A member with its full event list, re-fetched after consolidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberView {
    pub id: MemberId,
    pub name: String,
    pub events: Vec<EventView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(id: EventId, start: Ms, end: Ms, description: Option<&str>) -> Interval {
        Interval {
            id,
            span: Span::new(start, end),
            title: format!("t{id}"),
            description: description.map(Into::into),
            participant_ids: HashSet::from([id]),
        }
    }

    #[test]
    fn span_basics() {
        let s = Span::new(100, 200);
        assert_eq!(s.duration_ms(), 100);
    }

    #[test]
    fn span_touching_counts_as_overlap() {
        let a = Span::new(100, 200);
        let b = Span::new(200, 300);
        let c = Span::new(201, 300);
        assert!(a.touches(&b)); // closed intervals: shared boundary merges
        assert!(b.touches(&a));
        assert!(!a.touches(&c));
    }

    #[test]
    fn status_default_is_not_started() {
        assert_eq!(EventStatus::default(), EventStatus::NotStarted);
    }

    #[test]
    fn cluster_absorb_extends_end_and_unions() {
        let mut c = Cluster::seed(&interval(1, 100, 200, Some("a")));
        c.absorb(&interval(2, 150, 300, None));
        c.absorb(&interval(3, 250, 280, Some("b"))); // contained: end stays 300
        assert_eq!(c.span, Span::new(100, 300));
        assert_eq!(c.titles, vec!["t1", "t2", "t3"]);
        assert_eq!(c.descriptions, vec!["a", "b"]);
        assert_eq!(c.source_ids, vec![1, 2, 3]);
        assert_eq!(c.participant_ids, HashSet::from([1, 2, 3]));
        assert!(c.is_merged());
    }

    #[test]
    fn cluster_skips_empty_descriptions() {
        let mut c = Cluster::seed(&interval(1, 0, 10, Some("")));
        c.absorb(&interval(2, 5, 20, None));
        assert!(c.descriptions.is_empty());
    }

    #[test]
    fn singleton_cluster_is_not_merged() {
        let c = Cluster::seed(&interval(7, 0, 10, None));
        assert!(!c.is_merged());
    }
}

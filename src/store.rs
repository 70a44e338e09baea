use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::model::*;

/// One reconciliation's writes, applied as a single logical unit: either all
/// touched originals are deleted and all consolidated events created, or
/// nothing changes.
#[derive(Debug, Clone, Default)]
pub struct ReconcilePlan {
    pub delete: HashSet<EventId>,
    pub create: Vec<EventSpec>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.delete.is_empty() && self.create.is_empty()
    }
}

#[derive(Debug)]
pub enum StoreError {
    NotFound(i64),
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "not found: {id}"),
            StoreError::Unavailable(e) => write!(f, "store unavailable: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Storage capability the engine is built against. Injected, never ambient,
/// so the pipeline stays testable with an in-memory implementation.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Member plus every event it participates in, in stable storage order.
    async fn load_member(
        &self,
        id: MemberId,
    ) -> Result<Option<(Participant, Vec<StoredEvent>)>, StoreError>;

    /// Resolve ids to participant records; unknown ids are silently dropped.
    async fn resolve_participants(
        &self,
        ids: &HashSet<ParticipantId>,
    ) -> Result<Vec<Participant>, StoreError>;

    /// Apply deletes and creates atomically. On error the store must be
    /// left at its pre-plan state.
    async fn apply(&self, plan: &ReconcilePlan) -> Result<(), StoreError>;

    /// Re-fetch the member's full event list with participants resolved.
    async fn member_view(&self, id: MemberId) -> Result<Option<MemberView>, StoreError>;
}

// ── In-memory store ──────────────────────────────────────────────

#[derive(Debug, Default)]
struct MemState {
    participants: BTreeMap<ParticipantId, Participant>,
    events: BTreeMap<EventId, StoredEvent>,
    next_participant_id: ParticipantId,
    next_event_id: EventId,
}

impl MemState {
    fn resolve(&self, ids: &HashSet<ParticipantId>) -> Vec<Participant> {
        // BTreeMap iteration gives ascending id order.
        self.participants
            .values()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect()
    }

    fn view_of(&self, event: &StoredEvent) -> EventView {
        EventView {
            id: event.id,
            title: event.title.clone(),
            description: event.description.clone(),
            status: event.status,
            span: event.span,
            participants: self.resolve(&event.participant_ids),
        }
    }
}

/// In-memory event store. Single `RwLock` over the whole state so a
/// `ReconcilePlan` applies under one write guard.
///
/// Besides the `EventStore` capability it carries the plain CRUD surface of
/// the surrounding service layer, used for seeding and direct event
/// management.
#[derive(Debug, Default)]
pub struct MemStore {
    inner: RwLock<MemState>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Participant CRUD ─────────────────────────────────────

    pub async fn create_participant(&self, name: &str) -> Participant {
        let mut state = self.inner.write().await;
        state.next_participant_id += 1;
        let participant = Participant {
            id: state.next_participant_id,
            name: name.to_string(),
        };
        state
            .participants
            .insert(participant.id, participant.clone());
        participant
    }

    pub async fn participant(&self, id: ParticipantId) -> Option<Participant> {
        self.inner.read().await.participants.get(&id).cloned()
    }

    pub async fn participants(&self) -> Vec<Participant> {
        self.inner.read().await.participants.values().cloned().collect()
    }

    pub async fn remove_participant(&self, id: ParticipantId) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        state
            .participants
            .remove(&id)
            .ok_or(StoreError::NotFound(id))?;
        for event in state.events.values_mut() {
            event.participant_ids.remove(&id);
        }
        Ok(())
    }

    // ── Event CRUD ───────────────────────────────────────────

    /// Create an event. Invitee ids that don't resolve to a participant are
    /// dropped rather than rejected, mirroring best-effort resolution.
    pub async fn create_event(
        &self,
        title: &str,
        description: Option<&str>,
        span: Span,
        invitees: &[ParticipantId],
    ) -> StoredEvent {
        let mut state = self.inner.write().await;
        state.next_event_id += 1;
        let event = StoredEvent {
            id: state.next_event_id,
            title: title.to_string(),
            description: description.map(Into::into),
            status: EventStatus::default(),
            span,
            participant_ids: invitees
                .iter()
                .copied()
                .filter(|id| state.participants.contains_key(id))
                .collect(),
        };
        state.events.insert(event.id, event.clone());
        event
    }

    pub async fn event(&self, id: EventId) -> Option<StoredEvent> {
        self.inner.read().await.events.get(&id).cloned()
    }

    pub async fn events(&self) -> Vec<StoredEvent> {
        self.inner.read().await.events.values().cloned().collect()
    }

    pub async fn event_count(&self) -> usize {
        self.inner.read().await.events.len()
    }

    pub async fn delete_event(&self, id: EventId) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        state.events.remove(&id).ok_or(StoreError::NotFound(id))?;
        Ok(())
    }
}

#[async_trait]
impl EventStore for MemStore {
    async fn load_member(
        &self,
        id: MemberId,
    ) -> Result<Option<(Participant, Vec<StoredEvent>)>, StoreError> {
        let state = self.inner.read().await;
        let Some(member) = state.participants.get(&id) else {
            return Ok(None);
        };
        let events = state
            .events
            .values()
            .filter(|e| e.participant_ids.contains(&id))
            .cloned()
            .collect();
        Ok(Some((member.clone(), events)))
    }

    async fn resolve_participants(
        &self,
        ids: &HashSet<ParticipantId>,
    ) -> Result<Vec<Participant>, StoreError> {
        Ok(self.inner.read().await.resolve(ids))
    }

    async fn apply(&self, plan: &ReconcilePlan) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        for id in &plan.delete {
            state.events.remove(id);
        }
        for spec in &plan.create {
            state.next_event_id += 1;
            let event = StoredEvent {
                id: state.next_event_id,
                title: spec.title.clone(),
                description: spec.description.clone(),
                status: spec.status,
                span: spec.span,
                // Resolution at persistence time: ids that vanished since
                // the plan was built are dropped here as well.
                participant_ids: spec
                    .participant_ids
                    .iter()
                    .copied()
                    .filter(|id| state.participants.contains_key(id))
                    .collect(),
            };
            state.events.insert(event.id, event);
        }
        Ok(())
    }

    async fn member_view(&self, id: MemberId) -> Result<Option<MemberView>, StoreError> {
        let state = self.inner.read().await;
        let Some(member) = state.participants.get(&id) else {
            return Ok(None);
        };
        let mut events: Vec<EventView> = state
            .events
            .values()
            .filter(|e| e.participant_ids.contains(&id))
            .map(|e| state.view_of(e))
            .collect();
        events.sort_by_key(|e| (e.span.start, e.id));
        Ok(Some(MemberView {
            id: member.id,
            name: member.name.clone(),
            events,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_event_drops_unknown_invitees() {
        let store = MemStore::new();
        let alice = store.create_participant("alice").await;
        let event = store
            .create_event("standup", None, Span::new(0, 100), &[alice.id, 999])
            .await;
        assert_eq!(event.participant_ids, HashSet::from([alice.id]));
    }

    #[tokio::test]
    async fn load_member_filters_by_participation() {
        let store = MemStore::new();
        let alice = store.create_participant("alice").await;
        let bob = store.create_participant("bob").await;
        store
            .create_event("a", None, Span::new(0, 10), &[alice.id])
            .await;
        store
            .create_event("b", None, Span::new(20, 30), &[bob.id])
            .await;
        store
            .create_event("c", None, Span::new(40, 50), &[alice.id, bob.id])
            .await;

        let (member, events) = store.load_member(alice.id).await.unwrap().unwrap();
        assert_eq!(member.name, "alice");
        let titles: Vec<_> = events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn load_member_unknown_is_none() {
        let store = MemStore::new();
        assert!(store.load_member(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn apply_plan_deletes_then_creates() {
        let store = MemStore::new();
        let alice = store.create_participant("alice").await;
        let e1 = store
            .create_event("a", None, Span::new(0, 10), &[alice.id])
            .await;
        let plan = ReconcilePlan {
            delete: HashSet::from([e1.id]),
            create: vec![EventSpec {
                title: "merged".into(),
                description: None,
                status: EventStatus::default(),
                span: Span::new(0, 20),
                participant_ids: HashSet::from([alice.id]),
            }],
        };
        store.apply(&plan).await.unwrap();
        assert_eq!(store.event_count().await, 1);
        let remaining = store.events().await;
        assert_eq!(remaining[0].title, "merged");
        assert_ne!(remaining[0].id, e1.id); // fresh identity
    }

    #[tokio::test]
    async fn resolve_drops_unknown_and_sorts_by_id() {
        let store = MemStore::new();
        let a = store.create_participant("a").await;
        let b = store.create_participant("b").await;
        let resolved = store
            .resolve_participants(&HashSet::from([b.id, a.id, 777]))
            .await
            .unwrap();
        let ids: Vec<_> = resolved.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn remove_participant_detaches_from_events() {
        let store = MemStore::new();
        let a = store.create_participant("a").await;
        let b = store.create_participant("b").await;
        let e = store
            .create_event("x", None, Span::new(0, 10), &[a.id, b.id])
            .await;
        store.remove_participant(b.id).await.unwrap();
        let event = store.event(e.id).await.unwrap();
        assert_eq!(event.participant_ids, HashSet::from([a.id]));
    }

    #[tokio::test]
    async fn delete_event_unknown_errors() {
        let store = MemStore::new();
        assert!(matches!(
            store.delete_event(5).await,
            Err(StoreError::NotFound(5))
        ));
    }
}

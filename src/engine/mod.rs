mod aggregate;
mod error;
mod normalize;
mod scan;

pub use aggregate::materialize;
pub use error::EngineError;
pub use normalize::normalize;
pub use scan::scan;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::model::*;
use crate::observability;
use crate::store::{EventStore, ReconcilePlan};

/// The consolidation engine. Pure pipeline stages (normalize → scan →
/// materialize) over a snapshot, bracketed by calls into the injected
/// storage capability.
pub struct Engine {
    store: Arc<dyn EventStore>,
    /// Advisory per-member locks: at most one in-flight consolidation per
    /// member. The reconcile sequence is read-compute-write against shared
    /// storage, so two racing runs for the same member could both delete
    /// and recreate the other's output. Distinct members run in parallel.
    member_locks: DashMap<MemberId, Arc<Mutex<()>>>,
}

impl Engine {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            member_locks: DashMap::new(),
        }
    }

    fn member_lock(&self, id: MemberId) -> Arc<Mutex<()>> {
        self.member_locks.entry(id).or_default().value().clone()
    }

    /// Merge all touching-or-overlapping events of one member and return
    /// the refreshed member view.
    ///
    /// A member with no events is a successful no-op. Isolated events are
    /// never deleted or recreated, so running this twice in a row leaves
    /// the second run with nothing to do.
    pub async fn consolidate(&self, member_id: MemberId) -> Result<MemberView, EngineError> {
        let lock = self.member_lock(member_id);
        let _guard = lock.lock().await;
        let started = Instant::now();

        let (member, events) = self
            .store
            .load_member(member_id)
            .await?
            .ok_or(EngineError::MemberNotFound(member_id))?;

        if events.is_empty() {
            tracing::debug!("consolidate member {member_id}: no events, no-op");
            return Ok(MemberView {
                id: member.id,
                name: member.name,
                events: Vec::new(),
            });
        }

        let intervals = normalize(&events);
        let clusters = scan(&intervals);
        let (specs, touched) = materialize(clusters);

        tracing::debug!(
            "consolidate member {member_id}: {} events, {} touched, {} consolidated",
            events.len(),
            touched.len(),
            specs.len()
        );

        let view = self.reconcile(member_id, specs, touched).await?;

        metrics::counter!(observability::CONSOLIDATIONS_TOTAL).increment(1);
        metrics::histogram!(observability::CONSOLIDATION_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        Ok(view)
    }

    /// Delete touched originals and create their consolidated replacements
    /// as one atomic plan, then re-fetch the member.
    async fn reconcile(
        &self,
        member_id: MemberId,
        mut specs: Vec<EventSpec>,
        touched: HashSet<EventId>,
    ) -> Result<MemberView, EngineError> {
        // Resolution at persistence time: shrink each union to the ids the
        // store still knows. Unknown ids are dropped, never an error.
        for spec in &mut specs {
            let resolved = self
                .store
                .resolve_participants(&spec.participant_ids)
                .await?;
            spec.participant_ids = resolved.into_iter().map(|p| p.id).collect();
        }

        let deleted = touched.len();
        let created = specs.len();
        let plan = ReconcilePlan {
            delete: touched,
            create: specs,
        };
        if !plan.is_empty() {
            self.store.apply(&plan).await?;
            metrics::counter!(observability::EVENTS_DELETED_TOTAL).increment(deleted as u64);
            metrics::counter!(observability::EVENTS_CREATED_TOTAL).increment(created as u64);
        }

        self.store
            .member_view(member_id)
            .await?
            .ok_or(EngineError::MemberNotFound(member_id))
    }
}

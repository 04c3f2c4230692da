//! # Job store: in-memory `JobId → JobRecord`.
//!
//! Owned exclusively by the queue actor. Records are created on admission and
//! mutated only by the scheduler's transitions; no API removes a record.
//!
//! The only thing that drops records is the [`RetentionPolicy`]: finished
//! (`done`/`error`) records are evicted oldest-first once they exceed the
//! count bound or their age since completion exceeds the age bound. Pending
//! and processing records are never evicted.

mod record;

pub use record::{JobId, JobRecord, JobStatus, JobView, Transition};

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Local};

use crate::{clock::to_delta, config::RetentionPolicy, error::TransitionError};

/// In-memory job records with bounded retention of finished ones.
#[derive(Debug)]
pub struct JobStore {
    jobs: HashMap<JobId, JobRecord>,
    /// Finished ids in completion order (eviction order).
    finished: VecDeque<JobId>,
    retention: RetentionPolicy,
}

impl JobStore {
    /// Creates an empty store.
    pub fn new(retention: RetentionPolicy) -> Self {
        Self {
            jobs: HashMap::new(),
            finished: VecDeque::new(),
            retention,
        }
    }

    /// Inserts a new pending record and returns a copy of it.
    pub fn create(&mut self, caller: &str, query: &str, now: DateTime<Local>) -> JobRecord {
        let record = JobRecord::new(caller, query, now);
        self.jobs.insert(record.id, record.clone());
        record
    }

    /// Looks up a record.
    pub fn get(&self, id: &JobId) -> Option<&JobRecord> {
        self.jobs.get(id)
    }

    /// Applies a status transition to `id`.
    pub fn transition(
        &mut self,
        id: JobId,
        t: Transition,
        now: DateTime<Local>,
    ) -> Result<&JobRecord, TransitionError> {
        let record = self
            .jobs
            .get_mut(&id)
            .ok_or(TransitionError::UnknownJob(id))?;
        record.apply(t, now)?;
        if record.status.is_terminal() {
            self.finished.push_back(id);
        }
        Ok(record)
    }

    /// Drops finished records outside the retention bounds; returns how many.
    pub fn evict_expired(&mut self, now: DateTime<Local>) -> usize {
        let max_records = self.retention.record_limit();
        let max_age = self.retention.age_limit().map(to_delta);
        let mut evicted = 0;

        while let Some(&id) = self.finished.front() {
            let over_count = max_records.is_some_and(|max| self.finished.len() > max);
            let too_old = match (max_age, self.jobs.get(&id).and_then(|r| r.finished_at)) {
                (Some(age), Some(at)) => now - at >= age,
                (_, None) => true,
                _ => false,
            };
            if !over_count && !too_old {
                break;
            }
            self.finished.pop_front();
            if self.jobs.remove(&id).is_some() {
                evicted += 1;
            }
        }
        evicted
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// True if no records are held.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use serde_json::json;
    use std::time::Duration;

    fn t0() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 4, 20, 9, 0, 0).single().unwrap()
    }

    fn finish(store: &mut JobStore, id: JobId, at: DateTime<Local>) {
        store.transition(id, Transition::Start, at).unwrap();
        store
            .transition(id, Transition::Complete(json!("ok")), at)
            .unwrap();
    }

    #[test]
    fn create_then_get() {
        let mut store = JobStore::new(RetentionPolicy::UNBOUNDED);
        let rec = store.create("u1", "ocean sunset", t0());
        let got = store.get(&rec.id).unwrap();
        assert_eq!(got.status, JobStatus::Pending);
        assert_eq!(got.query, "ocean sunset");
        assert!(store.get(&JobId::new()).is_none());
    }

    #[test]
    fn transition_on_unknown_id_is_an_error() {
        let mut store = JobStore::new(RetentionPolicy::UNBOUNDED);
        let id = JobId::new();
        assert_eq!(
            store.transition(id, Transition::Start, t0()).unwrap_err(),
            TransitionError::UnknownJob(id)
        );
    }

    #[test]
    fn unbounded_retention_keeps_everything() {
        let mut store = JobStore::new(RetentionPolicy::UNBOUNDED);
        for _ in 0..20 {
            let id = store.create("u", "q", t0()).id;
            finish(&mut store, id, t0());
        }
        assert_eq!(store.evict_expired(t0() + TimeDelta::days(365)), 0);
        assert_eq!(store.len(), 20);
    }

    #[test]
    fn count_bound_evicts_oldest_finished_first() {
        let mut store = JobStore::new(RetentionPolicy {
            max_records: 2,
            max_age: Duration::ZERO,
        });
        let ids: Vec<JobId> = (0..3).map(|_| store.create("u", "q", t0()).id).collect();
        for (i, id) in ids.iter().enumerate() {
            finish(&mut store, *id, t0() + TimeDelta::seconds(i as i64));
        }
        let pending = store.create("u", "still waiting", t0()).id;

        assert_eq!(store.evict_expired(t0()), 1);
        assert!(store.get(&ids[0]).is_none());
        assert!(store.get(&ids[1]).is_some());
        assert!(store.get(&ids[2]).is_some());
        assert!(store.get(&pending).is_some());
    }

    #[test]
    fn age_bound_measured_from_completion() {
        let mut store = JobStore::new(RetentionPolicy {
            max_records: 0,
            max_age: Duration::from_secs(3600),
        });
        let old = store.create("u", "q", t0()).id;
        finish(&mut store, old, t0());
        let young = store.create("u", "q", t0()).id;
        finish(&mut store, young, t0() + TimeDelta::minutes(30));
        let running = store.create("u", "q", t0()).id;
        store.transition(running, Transition::Start, t0()).unwrap();

        let now = t0() + TimeDelta::minutes(61);
        assert_eq!(store.evict_expired(now), 1);
        assert!(store.get(&old).is_none());
        assert!(store.get(&young).is_some());
        assert_eq!(store.get(&running).unwrap().status, JobStatus::Processing);
    }
}

//! # Admission controller.
//!
//! Decides whether a submission becomes a job. Runs inside a single actor
//! message handler, so no other submission or status query can observe a
//! partially applied admission.
//!
//! ## Order (first failure wins)
//! ```text
//! 1. ledger.check_and_reset_if_expired(now)
//!    caller id empty             → InvalidInput
//! 2. ledger.check_global()       → GlobalLimitReached
//! 3. ledger.check_caller()       → CallerLimitReached | CallerCoolingDown
//! 4. query empty                 → InvalidInput
//! 5. ledger.commit(); store.create(); scheduler.enqueue()
//! ```
//! Steps 1-4 never write (the reset in step 1 aside), so a rejection leaves
//! every counter and the job store untouched.

use chrono::{DateTime, Local};

use crate::{
    error::RejectReason,
    ledger::QuotaLedger,
    store::{JobRecord, JobStore},
};

use super::scheduler::Scheduler;

/// Result of a successful admission.
#[derive(Debug)]
pub(crate) struct Admitted {
    /// The new pending record.
    pub record: JobRecord,
    /// Scheduler was idle; a drainer must be started.
    pub start_drainer: bool,
}

/// Full outcome, including whether the daily reset fired on the way.
#[derive(Debug)]
pub(crate) struct AdmissionOutcome {
    pub reset: bool,
    pub result: Result<Admitted, RejectReason>,
}

/// Mutable state admission operates on; all of it is owned by the actor.
pub(crate) struct AdmissionState<'a> {
    pub ledger: &'a mut QuotaLedger,
    pub store: &'a mut JobStore,
    pub scheduler: &'a mut Scheduler,
}

impl AdmissionState<'_> {
    /// Runs the admission algorithm for one submission.
    pub fn admit(&mut self, caller: &str, query: &str, now: DateTime<Local>) -> AdmissionOutcome {
        let reset = self.ledger.check_and_reset_if_expired(now);
        let result = if caller.trim().is_empty() {
            Err(RejectReason::InvalidInput("missing caller id".into()))
        } else {
            self.check_and_commit(caller, query, now)
        };
        AdmissionOutcome { reset, result }
    }

    fn check_and_commit(
        &mut self,
        caller: &str,
        query: &str,
        now: DateTime<Local>,
    ) -> Result<Admitted, RejectReason> {
        self.ledger.check_global()?;
        self.ledger.check_caller(caller, now)?;
        if query.trim().is_empty() {
            return Err(RejectReason::InvalidInput("missing query".into()));
        }

        self.ledger.commit(caller, now);
        let record = self.store.create(caller, query, now);
        let start_drainer = self.scheduler.enqueue(record.id);
        Ok(Admitted {
            record,
            start_drainer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{QuotaPolicy, RetentionPolicy};
    use crate::store::JobStatus;
    use chrono::{TimeDelta, TimeZone};

    struct Fixture {
        ledger: QuotaLedger,
        store: JobStore,
        scheduler: Scheduler,
    }

    impl Fixture {
        fn new(policy: QuotaPolicy) -> Self {
            Self {
                ledger: QuotaLedger::new(policy, t0()),
                store: JobStore::new(RetentionPolicy::UNBOUNDED),
                scheduler: Scheduler::new(),
            }
        }

        fn admit(&mut self, caller: &str, query: &str, now: DateTime<Local>) -> AdmissionOutcome {
            AdmissionState {
                ledger: &mut self.ledger,
                store: &mut self.store,
                scheduler: &mut self.scheduler,
            }
            .admit(caller, query, now)
        }
    }

    fn t0() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 7, 1, 14, 0, 0).single().unwrap()
    }

    #[test]
    fn admitted_job_is_pending_and_queued() {
        let mut f = Fixture::new(QuotaPolicy::default());
        let out = f.admit("u1", "ocean sunset", t0());
        let admitted = out.result.unwrap();

        assert!(admitted.start_drainer);
        assert_eq!(admitted.record.status, JobStatus::Pending);
        assert_eq!(f.store.get(&admitted.record.id).unwrap().caller, "u1");
        assert_eq!(f.scheduler.depth(), 1);
        assert_eq!(f.ledger.global_usage().count, 1);
    }

    #[test]
    fn missing_caller_is_rejected_before_quota() {
        let mut f = Fixture::new(QuotaPolicy {
            global_daily_limit: 0,
            ..QuotaPolicy::default()
        });
        let out = f.admit("  ", "q", t0());
        assert_eq!(
            out.result.unwrap_err(),
            RejectReason::InvalidInput("missing caller id".into())
        );
    }

    #[test]
    fn empty_query_consumes_nothing() {
        let mut f = Fixture::new(QuotaPolicy::default());
        let out = f.admit("u1", "", t0());
        assert_eq!(
            out.result.unwrap_err(),
            RejectReason::InvalidInput("missing query".into())
        );
        assert!(f.store.is_empty());
        assert_eq!(f.scheduler.depth(), 0);
        assert_eq!(f.ledger.global_usage().count, 0);
        assert!(f.ledger.caller_usage("u1").is_none());

        // No cooldown was started either.
        assert!(f.admit("u1", "real query", t0()).result.is_ok());
    }

    #[test]
    fn quota_rejection_precedes_input_validation() {
        let mut f = Fixture::new(QuotaPolicy::default());
        f.admit("u1", "first", t0()).result.unwrap();
        let out = f.admit("u1", "", t0() + TimeDelta::seconds(1));
        assert_eq!(
            out.result.unwrap_err(),
            RejectReason::CallerCoolingDown {
                retry_after_secs: 59
            }
        );
    }

    #[test]
    fn second_admission_joins_running_drainer() {
        let mut f = Fixture::new(QuotaPolicy::default());
        assert!(f.admit("u1", "a", t0()).result.unwrap().start_drainer);
        assert!(!f.admit("u2", "b", t0()).result.unwrap().start_drainer);
    }

    #[test]
    fn reset_flag_reported_even_on_rejection() {
        let mut f = Fixture::new(QuotaPolicy::default());
        let out = f.admit("u1", "", t0() + TimeDelta::days(1));
        assert!(out.reset);
        assert!(out.result.is_err());
    }

    #[test]
    fn missing_caller_after_midnight_still_resets() {
        let mut f = Fixture::new(QuotaPolicy::default());
        f.admit("u1", "a", t0()).result.unwrap();
        assert_eq!(f.ledger.global_usage().count, 1);

        let out = f.admit("", "q", t0() + TimeDelta::days(1));
        assert!(out.reset);
        assert_eq!(
            out.result.unwrap_err(),
            RejectReason::InvalidInput("missing caller id".into())
        );
        assert_eq!(f.ledger.global_usage().count, 0);
        assert_eq!(f.ledger.caller_usage("u1").unwrap().daily_count, 0);
    }
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use serde_json::json;
use tokio::task::JoinSet;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use ratequeue::{
    EventKind, HandlerError, HandlerFn, HandlerRef, JobId, JobStatus, JobView, ManualClock,
    QueueBuilder, QueueConfig, QueueHandle, RejectReason, StatusError, SubmitError,
};

fn t0() -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2024, 3, 14, 12, 0, 0)
        .single()
        .expect("unambiguous local time")
}

fn spawn(cfg: QueueConfig, handler: HandlerRef, clock: &Arc<ManualClock>) -> QueueHandle {
    QueueBuilder::new(cfg, handler)
        .with_clock(clock.clone())
        .spawn(CancellationToken::new())
}

async fn wait_terminal(q: &QueueHandle, id: JobId) -> JobView {
    for _ in 0..10_000 {
        let view = q.status(id).await.expect("job exists");
        if view.status.is_terminal() {
            return view;
        }
        time::sleep(Duration::from_secs(1)).await;
    }
    panic!("job {id} never finished");
}

#[tokio::test(start_paused = true)]
async fn single_caller_walkthrough() {
    let clock = Arc::new(ManualClock::new(t0()));
    let handler = HandlerFn::arc("gen", |q: String| async move {
        time::sleep(Duration::from_secs(3)).await;
        Ok::<_, HandlerError>(json!({ "answer": format!("Echo: {q}") }))
    });
    let q = spawn(QueueConfig::default(), handler, &clock);

    let id = q.submit("u1", "ocean sunset").await.unwrap().job_id;

    time::sleep(Duration::from_secs(1)).await;
    let view = q.status(id).await.unwrap();
    assert_eq!(view.status, JobStatus::Processing);
    assert_eq!(view.result, None);
    assert_eq!(view.error, None);

    time::sleep(Duration::from_millis(2500)).await;
    let view = q.status(id).await.unwrap();
    assert_eq!(view.status, JobStatus::Done);
    assert_eq!(view.result, Some(json!({ "answer": "Echo: ocean sunset" })));
    assert_eq!(view.error, None);

    clock.advance(Duration::from_secs(3));
    let err = q.submit("u1", "another").await.unwrap_err();
    assert_eq!(
        err,
        SubmitError::Rejected(RejectReason::CallerCoolingDown {
            retry_after_secs: 57
        })
    );
}

#[tokio::test(start_paused = true)]
async fn jobs_run_in_fifo_order_with_cooldown_between() {
    let clock = Arc::new(ManualClock::new(t0()));
    let starts: Arc<Mutex<Vec<(String, Instant)>>> = Arc::default();
    let seen = starts.clone();
    let handler = HandlerFn::arc("record", move |q: String| {
        let seen = seen.clone();
        async move {
            seen.lock().unwrap().push((q, Instant::now()));
            time::sleep(Duration::from_secs(2)).await;
            Ok::<_, HandlerError>(json!(null))
        }
    });
    let q = spawn(QueueConfig::default(), handler, &clock);

    let a = q.submit("alice", "first").await.unwrap().job_id;
    let b = q.submit("bob", "second").await.unwrap().job_id;
    let c = q.submit("carol", "third").await.unwrap().job_id;

    assert_eq!(q.status(c).await.unwrap().status, JobStatus::Pending);

    for id in [a, b, c] {
        assert_eq!(wait_terminal(&q, id).await.status, JobStatus::Done);
    }

    let starts = starts.lock().unwrap().clone();
    let order: Vec<&str> = starts.iter().map(|(q, _)| q.as_str()).collect();
    assert_eq!(order, ["first", "second", "third"]);
    for pair in starts.windows(2) {
        let gap = pair[1].1 - pair[0].1;
        // 2s of work plus the 60s pause
        assert!(gap >= Duration::from_secs(62), "gap too short: {gap:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn rejected_submissions_leave_no_trace() {
    let clock = Arc::new(ManualClock::new(t0()));
    let handler = HandlerFn::arc("noop", |_q: String| async move {
        Ok::<_, HandlerError>(json!(null))
    });
    let q = spawn(QueueConfig::default(), handler, &clock);

    let err = q.submit("u1", "   ").await.unwrap_err();
    assert!(matches!(
        err,
        SubmitError::Rejected(RejectReason::InvalidInput(_))
    ));
    let err = q.submit("", "query").await.unwrap_err();
    assert!(matches!(
        err,
        SubmitError::Rejected(RejectReason::InvalidInput(_))
    ));

    let usage = q.usage("u1").await.unwrap();
    assert_eq!(usage.caller_count, 0);
    assert_eq!(usage.global_count, 0);

    let stats = q.stats().await.unwrap();
    assert_eq!(stats.jobs, 0);
    assert_eq!(stats.depth, 0);

    // A rejected attempt does not start the caller's cooldown either.
    q.submit("u1", "real").await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn caller_daily_limit_and_global_limit() {
    let clock = Arc::new(ManualClock::new(t0()));
    let handler = HandlerFn::arc("noop", |_q: String| async move {
        Ok::<_, HandlerError>(json!(null))
    });
    let cfg = QueueConfig {
        global_daily_limit: 4,
        caller_daily_limit: 2,
        caller_cooldown: Duration::ZERO,
        ..QueueConfig::default()
    };
    let q = spawn(cfg, handler, &clock);

    q.submit("u1", "a").await.unwrap();
    q.submit("u1", "b").await.unwrap();
    assert_eq!(
        q.submit("u1", "c").await.unwrap_err(),
        SubmitError::Rejected(RejectReason::CallerLimitReached { limit: 2 })
    );

    q.submit("u2", "a").await.unwrap();
    q.submit("u3", "a").await.unwrap();
    assert_eq!(
        q.submit("u4", "a").await.unwrap_err(),
        SubmitError::Rejected(RejectReason::GlobalLimitReached { limit: 4 })
    );
}

#[tokio::test(start_paused = true)]
async fn quota_resets_after_local_midnight() {
    let before_midnight = Local
        .with_ymd_and_hms(2024, 3, 14, 23, 59, 0)
        .single()
        .expect("unambiguous local time");
    let clock = Arc::new(ManualClock::new(before_midnight));
    let handler = HandlerFn::arc("noop", |_q: String| async move {
        Ok::<_, HandlerError>(json!(null))
    });
    let cfg = QueueConfig {
        global_daily_limit: 1,
        ..QueueConfig::default()
    };
    let q = spawn(cfg, handler, &clock);
    let mut events = q.events();

    q.submit("u1", "a").await.unwrap();
    assert!(matches!(
        q.submit("u2", "b").await.unwrap_err(),
        SubmitError::Rejected(RejectReason::GlobalLimitReached { .. })
    ));

    clock.advance(Duration::from_secs(120));
    q.submit("u2", "b").await.unwrap();

    let mut saw_reset = false;
    while let Ok(ev) = events.try_recv() {
        saw_reset |= ev.kind == EventKind::QuotaReset;
    }
    assert!(saw_reset);

    let usage = q.usage("u1").await.unwrap();
    assert_eq!(usage.caller_count, 0);
    assert_eq!(usage.global_count, 1);
}

#[tokio::test(start_paused = true)]
async fn timed_out_job_errors_and_queue_advances() {
    let clock = Arc::new(ManualClock::new(t0()));
    let handler = HandlerFn::arc("maybe-hang", |q: String| async move {
        if q == "hang" {
            time::sleep(Duration::from_secs(3600)).await;
        }
        Ok::<_, HandlerError>(json!({ "answer": q }))
    });
    let cfg = QueueConfig {
        handler_timeout: Duration::from_secs(5),
        job_cooldown: Duration::from_secs(1),
        ..QueueConfig::default()
    };
    let q = spawn(cfg, handler, &clock);

    let stuck = q.submit("u1", "hang").await.unwrap().job_id;
    let next = q.submit("u2", "fine").await.unwrap().job_id;

    let view = wait_terminal(&q, next).await;
    assert_eq!(view.status, JobStatus::Done);

    let view = q.status(stuck).await.unwrap();
    assert_eq!(view.status, JobStatus::Error);
    assert_eq!(view.error.as_deref(), Some("timed out after 5s"));
    assert_eq!(view.result, None);
}

#[tokio::test(start_paused = true)]
async fn handler_failures_become_job_errors() {
    let clock = Arc::new(ManualClock::new(t0()));
    let handler = HandlerFn::arc("flaky", |q: String| async move {
        match q.as_str() {
            "silent" => Err(HandlerError::fail("")),
            "loud" => Err(HandlerError::fail("upstream 502")),
            _ => Ok(json!("ok")),
        }
    });
    let cfg = QueueConfig {
        job_cooldown: Duration::from_secs(1),
        ..QueueConfig::default()
    };
    let q = spawn(cfg, handler, &clock);

    let silent = q.submit("u1", "silent").await.unwrap().job_id;
    let loud = q.submit("u2", "loud").await.unwrap().job_id;
    let fine = q.submit("u3", "fine").await.unwrap().job_id;

    let view = wait_terminal(&q, silent).await;
    assert_eq!(view.error.as_deref(), Some("Unknown error"));
    let view = wait_terminal(&q, loud).await;
    assert_eq!(view.error.as_deref(), Some("upstream 502"));
    let view = wait_terminal(&q, fine).await;
    assert_eq!(view.status, JobStatus::Done);
}

#[tokio::test(start_paused = true)]
async fn lifecycle_events_are_published_in_order() {
    let clock = Arc::new(ManualClock::new(t0()));
    let handler = HandlerFn::arc("noop", |_q: String| async move {
        Ok::<_, HandlerError>(json!(null))
    });
    let q = spawn(QueueConfig::default(), handler, &clock);
    let mut events = q.events();

    let id = q.submit("u1", "q").await.unwrap().job_id;

    let mut kinds = Vec::new();
    loop {
        let ev = events.recv().await.unwrap();
        if ev.kind != EventKind::QueueIdle {
            assert_eq!(ev.job, Some(id));
        }
        kinds.push(ev.kind);
        if ev.kind == EventKind::QueueIdle {
            break;
        }
    }
    assert_eq!(
        kinds,
        [
            EventKind::JobAdmitted,
            EventKind::JobStarted,
            EventKind::JobCompleted,
            EventKind::CooldownScheduled,
            EventKind::QueueIdle,
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submissions_never_exceed_global_limit() {
    let clock = Arc::new(ManualClock::new(t0()));
    let handler = HandlerFn::arc("noop", |_q: String| async move {
        Ok::<_, HandlerError>(json!(null))
    });
    let q = spawn(QueueConfig::default(), handler, &clock);

    let mut set = JoinSet::new();
    for n in 0..120 {
        let q = q.clone();
        set.spawn(async move { q.submit(format!("user-{n}"), "q").await });
    }

    let (mut admitted, mut over_limit) = (0, 0);
    while let Some(res) = set.join_next().await {
        match res.unwrap() {
            Ok(_) => admitted += 1,
            Err(SubmitError::Rejected(RejectReason::GlobalLimitReached { limit: 50 })) => {
                over_limit += 1
            }
            Err(other) => panic!("unexpected rejection: {other:?}"),
        }
    }
    assert_eq!(admitted, 50);
    assert_eq!(over_limit, 70);

    let stats = q.stats().await.unwrap();
    assert_eq!(stats.global_count, 50);
    assert_eq!(stats.callers, 50);
    assert_eq!(stats.jobs, 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submissions_admit_one_per_caller() {
    let clock = Arc::new(ManualClock::new(t0()));
    let handler = HandlerFn::arc("noop", |_q: String| async move {
        Ok::<_, HandlerError>(json!(null))
    });
    let q = spawn(QueueConfig::default(), handler, &clock);

    let mut set = JoinSet::new();
    for n in 0..40 {
        for attempt in 0..10 {
            let q = q.clone();
            let caller = format!("user-{n}");
            set.spawn(async move {
                let res = q.submit(caller.clone(), format!("q{attempt}")).await;
                (caller, res)
            });
        }
    }

    let mut admitted: HashMap<String, u32> = HashMap::new();
    let mut cooling = 0;
    while let Some(res) = set.join_next().await {
        let (caller, res) = res.unwrap();
        match res {
            Ok(_) => *admitted.entry(caller).or_default() += 1,
            Err(SubmitError::Rejected(RejectReason::CallerCoolingDown { retry_after_secs })) => {
                assert_eq!(retry_after_secs, 60);
                cooling += 1;
            }
            Err(other) => panic!("unexpected rejection: {other:?}"),
        }
    }
    assert_eq!(admitted.len(), 40);
    assert!(admitted.values().all(|&n| n == 1), "{admitted:?}");
    assert_eq!(cooling, 360);

    let stats = q.stats().await.unwrap();
    assert_eq!(stats.global_count, 40);
    for n in 0..40 {
        let usage = q.usage(format!("user-{n}")).await.unwrap();
        assert_eq!(usage.caller_count, 1);
    }
}

#[tokio::test]
async fn unknown_jobs_are_not_found() {
    let clock = Arc::new(ManualClock::new(t0()));
    let handler = HandlerFn::arc("noop", |_q: String| async move {
        Ok::<_, HandlerError>(json!(null))
    });
    let q = spawn(QueueConfig::default(), handler, &clock);

    assert!(matches!(
        q.status(JobId::new()).await,
        Err(StatusError::NotFound(_))
    ));
    assert!(matches!(
        q.status_by_str("not-a-uuid").await,
        Err(StatusError::NotFound(_))
    ));
}

#[tokio::test]
async fn cancelled_queue_reports_closed() {
    let clock = Arc::new(ManualClock::new(t0()));
    let handler = HandlerFn::arc("noop", |_q: String| async move {
        Ok::<_, HandlerError>(json!(null))
    });
    let token = CancellationToken::new();
    let q = QueueBuilder::new(QueueConfig::default(), handler)
        .with_clock(clock)
        .spawn(token.clone());

    token.cancel();
    while !q.is_closed() {
        tokio::task::yield_now().await;
    }

    assert_eq!(q.submit("u1", "q").await.unwrap_err(), SubmitError::Closed);
    assert_eq!(q.status(JobId::new()).await.unwrap_err(), StatusError::Closed);
}

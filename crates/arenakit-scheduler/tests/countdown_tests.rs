use std::sync::{Arc, Mutex};
use std::time::Duration;

use arenakit_scheduler::{
    Countdown, CountdownPhase, ManualScheduler, TickConfig, TickScheduler, TokioScheduler,
};

/// Records (tick, seconds_remaining) for every callback
fn recording(
    scheduler: &Arc<ManualScheduler>,
    continue_on: bool,
) -> (Arc<Mutex<Vec<(u64, i64)>>>, impl FnMut(i64) -> bool + Send + 'static) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let clock = Arc::clone(scheduler);
    let callback = move |remaining: i64| {
        sink.lock().unwrap().push((clock.now(), remaining));
        continue_on
    };
    (log, callback)
}

#[test]
fn test_remainder_is_consumed_by_first_tick() {
    let scheduler = Arc::new(ManualScheduler::new());
    let (log, callback) = recording(&scheduler, true);

    let countdown =
        Countdown::start(scheduler.clone(), TickConfig::default(), 7, Some(3), callback).unwrap();

    scheduler.run_until_idle(10_000);

    assert_eq!(*log.lock().unwrap(), vec![(20, 6), (80, 3), (140, 0)]);
    assert_eq!(countdown.phase(), CountdownPhase::Expired);
    assert_eq!(scheduler.pending_count(), 0);
}

#[test]
fn test_even_division_ticks_every_interval() {
    let scheduler = Arc::new(ManualScheduler::new());
    let (log, callback) = recording(&scheduler, true);

    Countdown::start(scheduler.clone(), TickConfig::default(), 6, Some(2), callback).unwrap();
    scheduler.run_until_idle(10_000);

    assert_eq!(*log.lock().unwrap(), vec![(40, 4), (80, 2), (120, 0)]);
}

#[test]
fn test_tick_multiplier_shortens_delays() {
    let scheduler = Arc::new(ManualScheduler::new());
    let (log, callback) = recording(&scheduler, true);
    let config = TickConfig {
        ticks_per_second: 20,
        tick_multiplier: 0.5,
    };

    Countdown::start(scheduler.clone(), config, 4, Some(2), callback).unwrap();
    scheduler.run_until_idle(10_000);

    assert_eq!(*log.lock().unwrap(), vec![(20, 2), (40, 0)]);
}

#[test]
fn test_non_expiring_countdown_runs_until_stopped() {
    let scheduler = Arc::new(ManualScheduler::new());
    let (log, callback) = recording(&scheduler, true);

    let countdown = Countdown::builder(2)
        .interval(2)
        .cancel_on_expire(false)
        .start(scheduler.clone(), TickConfig::default(), callback)
        .unwrap();

    scheduler.advance(40 * 3);
    let seen: Vec<i64> = log.lock().unwrap().iter().map(|&(_, s)| s).collect();
    assert_eq!(seen, vec![0, -2, -4]);
    assert_eq!(countdown.phase(), CountdownPhase::Scheduled);

    countdown.stop();
    scheduler.advance(40 * 10);
    assert_eq!(log.lock().unwrap().len(), 3);
    assert_eq!(countdown.phase(), CountdownPhase::Stopped);
}

#[test]
fn test_cancel_on_expire_can_be_cleared_while_running() {
    let scheduler = Arc::new(ManualScheduler::new());
    let (log, callback) = recording(&scheduler, true);

    let countdown =
        Countdown::start(scheduler.clone(), TickConfig::default(), 2, Some(1), callback).unwrap();
    countdown.set_cancel_on_expire(false);

    scheduler.advance(20 * 4);
    assert_eq!(log.lock().unwrap().len(), 4);
    assert!(!countdown.is_stopped());
    countdown.stop();
}

#[test]
fn test_stop_prevents_further_ticks_and_is_idempotent() {
    let scheduler = Arc::new(ManualScheduler::new());
    let (log, callback) = recording(&scheduler, true);

    let countdown =
        Countdown::start(scheduler.clone(), TickConfig::default(), 10, Some(2), callback).unwrap();
    scheduler.advance(40);
    assert_eq!(log.lock().unwrap().len(), 1);

    countdown.stop();
    countdown.stop();
    assert!(countdown.is_stopped());
    assert_eq!(scheduler.pending_count(), 0);

    scheduler.advance(1_000);
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[test]
fn test_stop_from_inside_callback() {
    let scheduler = Arc::new(ManualScheduler::new());
    let slot: Arc<Mutex<Option<Countdown>>> = Arc::new(Mutex::new(None));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let callback = {
        let slot = Arc::clone(&slot);
        let seen = Arc::clone(&seen);
        move |remaining: i64| {
            seen.lock().unwrap().push(remaining);
            if remaining == 3 {
                if let Some(countdown) = slot.lock().unwrap().as_ref() {
                    countdown.stop();
                    countdown.stop();
                }
            }
            true
        }
    };

    let countdown =
        Countdown::start(scheduler.clone(), TickConfig::default(), 9, Some(3), callback).unwrap();
    *slot.lock().unwrap() = Some(countdown.clone());

    scheduler.run_until_idle(10_000);

    assert_eq!(*seen.lock().unwrap(), vec![6, 3]);
    assert_eq!(countdown.phase(), CountdownPhase::Stopped);
    assert_eq!(scheduler.pending_count(), 0);
}

#[test]
fn test_callback_returning_false_ends_countdown() {
    let scheduler = Arc::new(ManualScheduler::new());
    let (log, callback) = recording(&scheduler, false);

    let countdown =
        Countdown::start(scheduler.clone(), TickConfig::default(), 10, Some(2), callback).unwrap();
    scheduler.run_until_idle(10_000);

    assert_eq!(*log.lock().unwrap(), vec![(40, 8)]);
    assert_eq!(countdown.phase(), CountdownPhase::Finished);
    assert!(!countdown.is_stopped());
}

#[test]
fn test_stop_after_expiry_keeps_expired_phase() {
    let scheduler = Arc::new(ManualScheduler::new());
    let (_log, callback) = recording(&scheduler, true);

    let countdown =
        Countdown::start(scheduler.clone(), TickConfig::default(), 1, None, callback).unwrap();
    scheduler.advance(20);
    assert_eq!(countdown.phase(), CountdownPhase::Expired);

    countdown.stop();
    assert_eq!(countdown.phase(), CountdownPhase::Expired);
    assert!(countdown.is_stopped());
}

#[test]
fn test_countdowns_get_distinct_ids() {
    let scheduler: Arc<dyn TickScheduler> = Arc::new(ManualScheduler::new());
    let a = Countdown::start(scheduler.clone(), TickConfig::default(), 5, None, |_: i64| true)
        .unwrap();
    let b = Countdown::start(scheduler, TickConfig::default(), 5, None, |_: i64| true).unwrap();
    assert_ne!(a.id(), b.id());
}

#[tokio::test(start_paused = true)]
async fn test_countdown_on_tokio_scheduler() {
    let config = TickConfig::default();
    let scheduler = Arc::new(TokioScheduler::new(config.tick_duration()));
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let countdown = Countdown::start(scheduler.clone(), config, 3, Some(1), move |remaining: i64| {
        let _ = tx.send((tokio::time::Instant::now(), remaining));
        true
    })
    .unwrap();

    let started = tokio::time::Instant::now();
    let mut seen = Vec::new();
    for _ in 0..3 {
        let (at, remaining) = rx.recv().await.unwrap();
        seen.push((at - started, remaining));
    }

    assert_eq!(
        seen.iter().map(|&(_, s)| s).collect::<Vec<_>>(),
        vec![2, 1, 0]
    );
    assert!(seen[0].0 >= Duration::from_secs(1));
    assert!(seen[2].0 >= Duration::from_secs(3));

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(countdown.phase(), CountdownPhase::Expired);
    assert_eq!(scheduler.pending_count(), 0);
}

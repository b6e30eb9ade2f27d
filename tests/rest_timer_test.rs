use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use fittrack_lib::rest_timer::format_countdown;
use fittrack_lib::{RestAlert, RestTimer, Silent, TimerError, TimerTick};
use std::cell::Cell;

#[derive(Default)]
struct CountingAlert {
    fired: Cell<u32>,
}

impl RestAlert for CountingAlert {
    fn alert(&self) -> bool {
        self.fired.set(self.fired.get() + 1);
        true
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 18, 0, 0).unwrap()
}

#[test]
fn test_start_rejects_zero_duration() {
    let mut timer = RestTimer::with_default_duration(90);
    assert_eq!(timer.start(0, t0()), Err(TimerError::ZeroDuration));
    assert!(!timer.is_running());
    assert_eq!(timer.set_default_duration(0), Err(TimerError::ZeroDuration));
    assert_eq!(timer.duration_seconds(), 90);
}

#[test]
fn test_remaining_rounds_up() -> Result<()> {
    let mut timer = RestTimer::default();
    timer.start(90, t0())?;
    assert_eq!(timer.remaining(t0()), 90);
    assert_eq!(timer.remaining(t0() + Duration::milliseconds(500)), 90);
    assert_eq!(timer.remaining(t0() + Duration::milliseconds(1_001)), 89);
    assert_eq!(timer.remaining(t0() + Duration::seconds(90)), 0);
    assert_eq!(timer.remaining(t0() + Duration::seconds(500)), 0);
    Ok(())
}

#[test]
fn test_progress() -> Result<()> {
    let mut timer = RestTimer::default();
    assert!(timer.progress(t0()).abs() < f64::EPSILON);
    timer.start(60, t0())?;
    assert!((timer.progress(t0() + Duration::seconds(30)) - 0.5).abs() < 1e-9);
    assert!((timer.progress(t0() + Duration::seconds(120)) - 1.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_start_sets_new_default() -> Result<()> {
    let mut timer = RestTimer::with_default_duration(90);
    timer.start(120, t0())?;
    timer.stop();
    timer.start_default(t0());
    assert_eq!(timer.remaining(t0()), 120);
    Ok(())
}

#[test]
fn test_extend() -> Result<()> {
    let mut timer = RestTimer::with_default_duration(60);
    assert_eq!(timer.extend(15, t0()), Err(TimerError::NotRunning));

    timer.start(60, t0())?;
    let later = t0() + Duration::seconds(10);
    timer.extend(15, later)?;
    assert_eq!(timer.remaining(later), 65);
    assert_eq!(timer.end(), Some(t0() + Duration::seconds(75)));
    Ok(())
}

#[test]
fn test_set_default_duration_leaves_running_countdown() -> Result<()> {
    let mut timer = RestTimer::with_default_duration(60);
    timer.start(60, t0())?;
    timer.set_default_duration(180)?;
    assert_eq!(timer.duration_seconds(), 180);
    assert_eq!(timer.remaining(t0()), 60);
    Ok(())
}

#[test]
fn test_tick_alerts_once_then_stops_after_grace() -> Result<()> {
    let alert = CountingAlert::default();
    let mut timer = RestTimer::default();
    assert_eq!(timer.tick(t0(), &alert), TimerTick::Idle);

    timer.start(1, t0())?;
    assert_eq!(timer.tick(t0(), &alert), TimerTick::Counting(1));
    assert_eq!(alert.fired.get(), 0);

    let expired_at = t0() + Duration::seconds(1);
    assert_eq!(timer.tick(expired_at, &alert), TimerTick::Expired);
    assert_eq!(alert.fired.get(), 1);

    assert_eq!(
        timer.tick(expired_at + Duration::milliseconds(500), &alert),
        TimerTick::Expired
    );
    assert_eq!(alert.fired.get(), 1);
    assert!(timer.is_running());

    assert_eq!(
        timer.tick(expired_at + Duration::seconds(2), &alert),
        TimerTick::Finished
    );
    assert!(!timer.is_running());
    assert_eq!(timer.tick(expired_at + Duration::seconds(3), &alert), TimerTick::Idle);
    assert_eq!(alert.fired.get(), 1);
    Ok(())
}

#[test]
fn test_missing_alert_does_not_block_expiry() -> Result<()> {
    let mut timer = RestTimer::default();
    timer.start(1, t0())?;
    let expired_at = t0() + Duration::seconds(2);
    assert_eq!(timer.tick(expired_at, &Silent), TimerTick::Expired);
    assert_eq!(
        timer.tick(expired_at + Duration::seconds(2), &Silent),
        TimerTick::Finished
    );
    Ok(())
}

#[test]
fn test_restart_clears_alert_state() -> Result<()> {
    let alert = CountingAlert::default();
    let mut timer = RestTimer::default();
    timer.start(1, t0())?;
    timer.tick(t0() + Duration::seconds(1), &alert);

    let restart = t0() + Duration::seconds(5);
    timer.start(1, restart)?;
    assert_eq!(timer.tick(restart + Duration::seconds(1), &alert), TimerTick::Expired);
    assert_eq!(alert.fired.get(), 2);
    Ok(())
}

#[test]
fn test_format_countdown() {
    assert_eq!(format_countdown(0), "0:00");
    assert_eq!(format_countdown(5), "0:05");
    assert_eq!(format_countdown(90), "1:30");
    assert_eq!(format_countdown(600), "10:00");
}

#[test]
fn test_overdue_timer_alerts_exactly_once() -> Result<()> {
    let alert = CountingAlert::default();
    let mut timer = RestTimer::default();
    timer.start(90, t0())?;
    let late = t0() + Duration::seconds(95);
    assert_eq!(timer.remaining(late), 0);
    for offset in 0..5 {
        timer.tick(late + Duration::milliseconds(offset * 200), &alert);
    }
    assert_eq!(alert.fired.get(), 1);
    Ok(())
}

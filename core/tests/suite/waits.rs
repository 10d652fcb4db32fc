use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use futures_util::{StreamExt, stream};
use tarry::producer::{self, EventSink};
use tarry::{
    AssertionFailure, EmptyCompletionPolicy, Event, PanicReporter, Recorder, Subscription, Wait,
    WaitConfig, WaitOutcome, wait_for_failure, wait_for_value,
};
use tokio::time;

use crate::common::{self, LONG, Late, SHORT, TeardownProbe};

#[test]
fn single_value_completes() {
    common::init();
    let recorder = Recorder::new();

    let outcome = wait_for_value(&recorder, LONG, || producer::just::<u32, String>(42));

    assert_eq!(outcome, WaitOutcome::Completed(42));
    recorder.assert_clean();
}

#[test]
fn last_of_several_values_wins() {
    common::init();
    let recorder = Recorder::new();

    let outcome = wait_for_value(&recorder, LONG, || {
        producer::sequence::<_, String>(vec!["a", "b", "c"])
    });

    assert_eq!(outcome.into_value(), Some("c"));
    recorder.assert_clean();
}

#[test]
fn silent_producer_times_out_with_one_failure() {
    common::init();
    let recorder = Recorder::new();

    let outcome = wait_for_value(&recorder, SHORT, producer::never::<u8, String>);

    assert_eq!(outcome, WaitOutcome::TimedOut);
    assert_eq!(
        recorder.messages(),
        vec!["failed to get publisher result before timeout of 0.1 seconds".to_string()]
    );
}

#[test]
fn producer_failure_is_reported_with_its_error() {
    common::init();
    let recorder = Recorder::new();

    let outcome = wait_for_value(&recorder, LONG, || {
        producer::fail::<u8, String>("connection reset".to_string())
    });

    assert_eq!(outcome, WaitOutcome::Failed("connection reset".to_string()));
    let failures = recorder.take();
    assert_eq!(failures.len(), 1);
    assert_eq!(
        failures[0].kind(),
        &AssertionFailure::ProducerFailure {
            error: "connection reset".to_string()
        }
    );
    assert_eq!(failures[0].message(), "Failed with connection reset");
}

#[test]
fn empty_completion_is_reported_by_default() {
    common::init();
    let recorder = Recorder::new();
    let config = WaitConfig::default().with_timeout(LONG);

    let outcome = Wait::new(&recorder)
        .with_config(config)
        .for_value(producer::empty::<u8, String>);

    assert_eq!(outcome, WaitOutcome::CompletedNoValue);
    assert_eq!(
        recorder.messages(),
        vec!["finished without emitting a value".to_string()]
    );
}

#[test]
fn empty_completion_can_be_allowed() {
    common::init();
    let recorder = Recorder::new();
    let config = WaitConfig::default()
        .with_timeout(LONG)
        .with_empty_completion(EmptyCompletionPolicy::Allow);

    let outcome = Wait::new(&recorder)
        .with_config(config)
        .for_value(producer::empty::<u8, String>);

    assert_eq!(outcome, WaitOutcome::CompletedNoValue);
    recorder.assert_clean();
}

#[test]
fn values_pushed_from_another_thread_are_received() {
    common::init();
    let recorder = Recorder::new();

    let outcome = wait_for_value(&recorder, LONG, || {
        common::threaded::<u32, String>(
            vec![Event::Value(1), Event::Value(2), Event::Finished],
            Duration::from_millis(20),
        )
    });

    assert_eq!(outcome, WaitOutcome::Completed(2));
    recorder.assert_clean();
}

#[test]
fn values_sent_after_timeout_are_dropped() {
    common::init();
    let recorder = Recorder::new();
    let late = Late::new();
    let producer_side = late.clone();

    let outcome = wait_for_value(&recorder, SHORT, move || {
        producer::from_fn(move |sink: EventSink<u32, String>| {
            producer_side.spawn(move || {
                thread::sleep(Duration::from_millis(300));
                let delivered = sink.send(7);
                sink.finish();
                delivered
            });
            Subscription::detached()
        })
    });

    assert_eq!(outcome, WaitOutcome::TimedOut);
    assert!(!late.join(), "late value reached a released waiter");
    assert_eq!(recorder.len(), 1);
}

#[test]
fn subscription_is_cancelled_after_timeout() {
    common::init();
    let recorder = Recorder::new();
    let probe = TeardownProbe::new();
    let subscription = probe.subscription();

    let outcome = wait_for_value(&recorder, SHORT, move || {
        producer::from_fn(move |sink: EventSink<u8, String>| {
            // Hold the sink open past the deadline.
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(300));
                drop(sink);
            });
            subscription
        })
    });

    assert_eq!(outcome, WaitOutcome::TimedOut);
    assert!(probe.cancelled());
}

#[test]
fn subscription_is_cancelled_after_completion() {
    common::init();
    let recorder = Recorder::new();
    let probe = TeardownProbe::new();
    let subscription = probe.subscription();

    let outcome = wait_for_value(&recorder, LONG, move || {
        producer::from_fn(move |sink: EventSink<u8, String>| {
            sink.send(5);
            sink.finish();
            subscription
        })
    });

    assert_eq!(outcome, WaitOutcome::Completed(5));
    assert!(probe.cancelled());
    recorder.assert_clean();
}

#[test]
fn stream_driven_by_tokio_timers_completes() {
    common::init();
    let recorder = Recorder::new();

    let outcome = wait_for_value(&recorder, LONG, || {
        producer::from_stream(stream::unfold(0_u32, |n| async move {
            if n == 3 {
                return None;
            }
            time::sleep(Duration::from_millis(10)).await;
            Some((Ok::<u32, String>(n + 1), n + 1))
        }))
    });

    assert_eq!(outcome, WaitOutcome::Completed(3));
    recorder.assert_clean();
}

#[test]
fn factory_may_create_tokio_timers() {
    common::init();
    let recorder = Recorder::new();

    let outcome = wait_for_value(&recorder, LONG, || {
        // Built eagerly, before subscribe, so it needs the runtime context.
        let delay = time::sleep(Duration::from_millis(10));
        producer::from_stream(stream::once(delay).map(|()| Ok::<u32, String>(7)))
    });

    assert_eq!(outcome, WaitOutcome::Completed(7));
    recorder.assert_clean();
}

#[test]
fn failure_wait_factory_may_create_tokio_timers() {
    common::init();
    let recorder = Recorder::new();

    let error = wait_for_failure(&recorder, LONG, "must fail", || {
        let delay = time::sleep(Duration::from_millis(10));
        producer::from_stream(
            stream::once(delay).map(|()| Err::<u32, String>("late".to_string())),
        )
    });

    assert_eq!(error.as_deref(), Some("late"));
    recorder.assert_clean();
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[test]
fn stream_is_dropped_after_timeout() {
    common::init();
    let recorder = Recorder::new();
    let dropped = Arc::new(AtomicBool::new(false));
    let guard = DropFlag(Arc::clone(&dropped));

    let outcome = wait_for_value(&recorder, SHORT, move || {
        producer::from_stream(stream::unfold(guard, |guard| async move {
            time::sleep(Duration::from_secs(3600)).await;
            Some((Ok::<u8, String>(1), guard))
        }))
    });

    assert_eq!(outcome, WaitOutcome::TimedOut);
    assert!(common::eventually(LONG, || dropped.load(Ordering::SeqCst)));
}

#[test]
fn failure_points_at_the_calling_line() {
    common::init();
    let recorder = Recorder::new();

    let line = line!() + 1;
    let _ = wait_for_value(&recorder, SHORT, producer::never::<u8, String>);

    let failures = recorder.take();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].location().file(), file!());
    assert_eq!(failures[0].location().line(), line);
}

#[test]
fn configured_default_timeout_is_used() {
    common::init();
    let recorder = Recorder::new();
    let config = WaitConfig::default().with_timeout(Duration::from_millis(50));

    let outcome = Wait::new(&recorder)
        .with_config(config)
        .for_value(producer::never::<u8, String>);

    assert_eq!(outcome, WaitOutcome::TimedOut);
    assert_eq!(
        recorder.messages(),
        vec!["failed to get publisher result before timeout of 0.05 seconds".to_string()]
    );
}

#[test]
fn zero_timeout_still_sees_synchronous_events() {
    common::init();
    let recorder = Recorder::new();

    let outcome = wait_for_value(&recorder, Duration::ZERO, || {
        producer::from_fn(|sink: EventSink<u8, String>| {
            sink.send(9);
            sink.finish();
            Subscription::detached()
        })
    });

    assert_eq!(outcome, WaitOutcome::Completed(9));
    recorder.assert_clean();
}

#[test]
fn zero_timeout_on_silent_producer_times_out() {
    common::init();
    let recorder = Recorder::new();

    let outcome = wait_for_value(&recorder, Duration::ZERO, producer::never::<u8, String>);

    assert_eq!(outcome, WaitOutcome::TimedOut);
    assert_eq!(recorder.len(), 1);
}

#[test]
fn dropped_sink_is_abandoned_not_timed_out() {
    common::init();
    let recorder = Recorder::new();

    let outcome = wait_for_value(&recorder, LONG, || {
        common::threaded::<u8, String>(vec![Event::Value(1)], Duration::from_millis(10))
    });

    assert_eq!(outcome, WaitOutcome::Abandoned);
    let failures = recorder.take();
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        failures[0].kind(),
        AssertionFailure::ProducerAbandoned { .. }
    ));
}

#[test]
#[should_panic(expected = "failed to get publisher result before timeout")]
fn panic_reporter_fails_the_test() {
    common::init();
    let _ = wait_for_value(&PanicReporter, SHORT, producer::never::<u8, String>);
}

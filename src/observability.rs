use biometrics::{Collector, Counter, Moments};

pub(crate) static CLASSIFY_REQUESTS: Counter = Counter::new("chatstream.classify.requests");
pub(crate) static CLASSIFY_FAILURES: Counter = Counter::new("chatstream.classify.failures");
pub(crate) static CLASSIFY_CODING: Counter = Counter::new("chatstream.classify.coding");

pub(crate) static STREAM_REQUESTS: Counter = Counter::new("chatstream.stream.requests");
pub(crate) static STREAM_REJECTED: Counter = Counter::new("chatstream.stream.rejected");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("chatstream.stream.errors");
pub(crate) static STREAM_FRAMES: Counter = Counter::new("chatstream.stream.frames");
pub(crate) static STREAM_MALFORMED_FRAMES: Counter =
    Counter::new("chatstream.stream.malformed_frames");
pub(crate) static STREAM_BYTES: Counter = Counter::new("chatstream.stream.bytes");
pub(crate) static STREAM_TTFB: Moments = Moments::new("chatstream.stream.ttfb_seconds");
pub(crate) static STREAM_DURATION: Moments = Moments::new("chatstream.stream.duration_seconds");

pub(crate) static TURNS_COMPLETED: Counter = Counter::new("chatstream.turn.completed");
pub(crate) static TURNS_FAILED: Counter = Counter::new("chatstream.turn.failed");
pub(crate) static TURN_DURATION: Moments = Moments::new("chatstream.turn.duration_seconds");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLASSIFY_REQUESTS);
    collector.register_counter(&CLASSIFY_FAILURES);
    collector.register_counter(&CLASSIFY_CODING);

    collector.register_counter(&STREAM_REQUESTS);
    collector.register_counter(&STREAM_REJECTED);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_FRAMES);
    collector.register_counter(&STREAM_MALFORMED_FRAMES);
    collector.register_counter(&STREAM_BYTES);
    collector.register_moments(&STREAM_TTFB);
    collector.register_moments(&STREAM_DURATION);

    collector.register_counter(&TURNS_COMPLETED);
    collector.register_counter(&TURNS_FAILED);
    collector.register_moments(&TURN_DURATION);
}

//! End-to-end tests for the threaded render path.

use crossbeam_channel::{unbounded, Receiver};
use inkstream::{
    encode_event, render_stream, DisplaySink, MemorySink, PacingConfig, ProtocolEvent, RenderError,
    RenderHandle, RenderHooks, RendererConfig, StructuredText,
};
use serde_json::json;
use std::io::{self, Cursor, Read};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Pacing fast enough that tests finish in milliseconds.
fn fast_config() -> RendererConfig {
    RendererConfig {
        pacing: PacingConfig {
            tiers: Vec::new(),
            base_rate: 200_000.0,
            step_cap: 64,
            frame_interval: Duration::from_millis(1),
        },
        ..RendererConfig::default()
    }
}

fn wire(events: &[ProtocolEvent]) -> Vec<u8> {
    events.iter().map(encode_event).collect::<String>().into_bytes()
}

fn content(text: &str) -> ProtocolEvent {
    ProtocolEvent::Content(text.to_string())
}

/// Reader that hands out its data in small, uneven chunks.
struct ChunkedBody {
    data: Vec<u8>,
    pos: usize,
    sizes: Vec<usize>,
    reads: usize,
}

impl ChunkedBody {
    fn new(data: Vec<u8>, sizes: &[usize]) -> Self {
        Self {
            data,
            pos: 0,
            sizes: sizes.to_vec(),
            reads: 0,
        }
    }
}

impl Read for ChunkedBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let size = self.sizes[self.reads % self.sizes.len()].min(buf.len());
        self.reads += 1;
        let end = (self.pos + size).min(self.data.len());
        let n = end - self.pos;
        buf[..n].copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(n)
    }
}

/// Reader that delivers its first payload, then fails.
struct FailingBody {
    first: Option<Vec<u8>>,
}

impl Read for FailingBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.first.take() {
            Some(data) => {
                buf[..data.len()].copy_from_slice(&data);
                Ok(data.len())
            }
            None => Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
        }
    }
}

/// Reader fed by a channel; blocks until data arrives or the sender drops.
struct ChannelBody {
    rx: Receiver<Vec<u8>>,
}

impl Read for ChannelBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.rx.recv() {
            Ok(data) => {
                buf[..data.len()].copy_from_slice(&data);
                Ok(data.len())
            }
            Err(_) => Ok(0),
        }
    }
}

/// Sink that logs each call into a shared timeline.
struct TimelineSink {
    log: Arc<Mutex<Vec<String>>>,
}

impl DisplaySink for TimelineSink {
    fn begin(&mut self) -> io::Result<()> {
        self.log.lock().unwrap().push("begin".to_string());
        Ok(())
    }

    fn append(&mut self, text: &str) -> io::Result<()> {
        self.log.lock().unwrap().push(format!("append:{text}"));
        Ok(())
    }

    fn keep_latest_visible(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn replace_structured(&mut self, story: &StructuredText) -> io::Result<()> {
        self.log.lock().unwrap().push(format!("finalize:{}", story.to_plain()));
        Ok(())
    }
}

#[test]
fn test_chunked_stream_renders_and_finalizes() {
    let body = wire(&[
        content("Once upon a time,\n\n"),
        content("a fox — café ☕ — "),
        content("slept.\nThe end."),
        ProtocolEvent::Done,
    ]);
    let expected = "Once upon a time,\n\na fox — café ☕ — slept.\nThe end.";

    for sizes in [&[1][..], &[2, 3, 5], &[7, 1, 13], &[4096]] {
        let mut sink = MemorySink::new();
        let summary = render_stream(
            Some(ChunkedBody::new(body.clone(), sizes)),
            &mut sink,
            &fast_config(),
            RenderHooks::new(),
        )
        .unwrap();

        assert_eq!(sink.raw(), expected, "chunk sizes {sizes:?}");
        assert_eq!(sink.replace_calls(), 1);
        assert_eq!(
            sink.structured().unwrap().to_html(),
            "<p>Once upon a time,</p><p>a fox — café ☕ — slept.<br>The end.</p>"
        );
        assert_eq!(summary.fragments, 3);
        assert_eq!(summary.bytes_read, body.len() as u64);
        assert_eq!(summary.visible_chars, expected.chars().count());
    }
}

#[test]
fn test_body_end_without_done_still_settles() {
    let mut body = wire(&[content("no explicit done")]);
    // Trailing line with no newline is dispatched as the residual
    body.extend_from_slice(b"data: {\"type\":\"content\",\"content\":\"!\"}");

    let mut sink = MemorySink::new();
    render_stream(Some(Cursor::new(body)), &mut sink, &fast_config(), RenderHooks::new()).unwrap();

    assert_eq!(sink.raw(), "no explicit done!");
    assert_eq!(sink.structured().unwrap().to_plain(), "no explicit done!");
}

#[test]
fn test_noise_lines_are_skipped() {
    let mut body = b": keep-alive\n\ndata: not json\n\nevent: ping\n".to_vec();
    body.extend(wire(&[content("kept")]));
    body.extend_from_slice(b"data: [DONE]\n\n");

    let mut sink = MemorySink::new();
    render_stream(Some(Cursor::new(body)), &mut sink, &fast_config(), RenderHooks::new()).unwrap();

    assert_eq!(sink.raw(), "kept");
}

#[test]
fn test_error_event_fails_without_finalize() {
    let body = wire(&[
        content("Hi"),
        ProtocolEvent::Error("boom".to_string()),
        content("never shown"),
    ]);

    let mut sink = MemorySink::new();
    let err = render_stream(Some(Cursor::new(body)), &mut sink, &fast_config(), RenderHooks::new())
        .unwrap_err();

    assert!(matches!(&err, RenderError::Remote(m) if m == "boom"));
    assert_eq!(err.to_string(), "boom");
    assert!("Hi".starts_with(sink.raw()));
    assert_eq!(sink.replace_calls(), 0);
    assert!(sink.structured().is_none());
}

#[test]
fn test_error_event_with_forced_finalize() {
    let body = wire(&[content("Hi"), ProtocolEvent::Error("boom".to_string())]);
    let config = RendererConfig {
        finalize_on_teardown: true,
        ..fast_config()
    };

    let mut sink = MemorySink::new();
    let err = render_stream(Some(Cursor::new(body)), &mut sink, &config, RenderHooks::new())
        .unwrap_err();

    assert!(err.is_remote());
    assert_eq!(sink.replace_calls(), 1);
    assert_eq!(sink.structured().unwrap().to_plain(), sink.raw());
}

#[test]
fn test_missing_body_leaves_sink_untouched() {
    let mut sink = MemorySink::new();
    let err = render_stream(None::<Cursor<Vec<u8>>>, &mut sink, &fast_config(), RenderHooks::new())
        .unwrap_err();

    assert!(matches!(err, RenderError::MissingBody));
    assert_eq!(sink.begin_calls(), 0);
}

#[test]
fn test_transport_failure_is_reported() {
    let body = FailingBody {
        first: Some(wire(&[content("partial")])),
    };

    let mut sink = MemorySink::new();
    let err = render_stream(Some(body), &mut sink, &fast_config(), RenderHooks::new()).unwrap_err();

    match err {
        RenderError::Transport(e) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
        other => panic!("unexpected error: {other}"),
    }
    assert!(sink.structured().is_none());
}

#[test]
fn test_first_content_hook_runs_before_any_append() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let hook_log = Arc::clone(&log);
    let hooks = RenderHooks::new().with_first_content(move || {
        hook_log.lock().unwrap().push("first-content".to_string());
    });

    let body = wire(&[content("ab"), content("cd"), ProtocolEvent::Done]);
    let mut sink = TimelineSink {
        log: Arc::clone(&log),
    };
    render_stream(Some(Cursor::new(body)), &mut sink, &fast_config(), hooks).unwrap();

    let log = log.lock().unwrap();
    assert_eq!(log[0], "begin");
    assert_eq!(log[1], "first-content");
    assert_eq!(log.iter().filter(|e| *e == "first-content").count(), 1);
    assert!(log[2].starts_with("append:"));
    assert_eq!(log.last().map(String::as_str), Some("finalize:abcd"));
}

#[test]
fn test_analysis_events_reach_hook() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&seen);
    let hooks = RenderHooks::new().with_analysis(move |payload| {
        recorded.lock().unwrap().push(payload.clone());
    });

    let analysis = json!({"type": "analysis", "life_type": "wanderer", "stability_score": 72});
    let body = wire(&[
        content("text"),
        ProtocolEvent::Analysis(analysis.clone()),
        ProtocolEvent::Done,
    ]);

    let mut sink = MemorySink::new();
    render_stream(Some(Cursor::new(body)), &mut sink, &fast_config(), hooks).unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![analysis]);
    assert_eq!(sink.raw(), "text");
}

#[test]
fn test_large_burst_is_revealed_in_bounded_steps() {
    let burst = "w".repeat(5000);
    let body = wire(&[content(&burst), ProtocolEvent::Done]);

    let mut sink = MemorySink::new();
    let summary =
        render_stream(Some(Cursor::new(body)), &mut sink, &fast_config(), RenderHooks::new())
            .unwrap();

    assert_eq!(sink.raw(), burst);
    assert!(sink.appends().iter().all(|a| a.len() <= 64));
    assert!(summary.frames >= 5000 / 64);
}

#[test]
fn test_handle_settles_and_returns_sink() {
    let body = wire(&[content("handled"), ProtocolEvent::Done]);
    let mut handle = RenderHandle::spawn(
        Some(Cursor::new(body)),
        MemorySink::new(),
        fast_config(),
        RenderHooks::new(),
    )
    .unwrap();

    while !handle.is_finished() {
        std::thread::sleep(Duration::from_millis(1));
    }
    assert!(handle.is_settled());

    let (sink, result) = handle.join();
    assert_eq!(result.unwrap().visible_chars, 7);
    assert_eq!(sink.structured().unwrap().to_plain(), "handled");
}

#[test]
fn test_cancel_stops_rendering() {
    let (tx, rx) = unbounded();
    tx.send(wire(&[content("waiting for more")])).unwrap();

    let mut handle = RenderHandle::spawn(
        Some(ChannelBody { rx }),
        MemorySink::new(),
        fast_config(),
        RenderHooks::new(),
    )
    .unwrap();

    std::thread::sleep(Duration::from_millis(50));
    assert!(!handle.is_settled());
    handle.cancel();

    let (sink, result) = handle.join();
    assert!(matches!(result, Err(RenderError::Cancelled)));
    assert!(sink.structured().is_none());
    assert!("waiting for more".starts_with(sink.raw()));

    // Late data goes nowhere
    let _ = tx.send(wire(&[content("late"), ProtocolEvent::Done]));
    drop(tx);
}

#[test]
fn test_summary_waits_for_body_end_after_settle() {
    let (tx, rx) = unbounded();
    let story = wire(&[content("hi"), ProtocolEvent::Done]);
    let trailer = b": keep-alive\n\n".to_vec();
    let expected_bytes = (story.len() + trailer.len()) as u64;
    tx.send(story).unwrap();

    // The connection stays open well past the drain, then sends a trailer
    let writer = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(150));
        tx.send(trailer).unwrap();
    });

    let mut sink = MemorySink::new();
    let summary =
        render_stream(Some(ChannelBody { rx }), &mut sink, &fast_config(), RenderHooks::new())
            .unwrap();
    writer.join().unwrap();

    assert_eq!(summary.bytes_read, expected_bytes);
    assert!(summary.elapsed >= Duration::from_millis(150));
    assert_eq!(sink.raw(), "hi");
    assert_eq!(sink.replace_calls(), 1);
}

#[test]
fn test_events_after_settle_are_not_dispatched() {
    let (tx, rx) = unbounded();
    tx.send(wire(&[content("hi"), ProtocolEvent::Done])).unwrap();

    let mut handle = RenderHandle::spawn(
        Some(ChannelBody { rx }),
        MemorySink::new(),
        fast_config(),
        RenderHooks::new(),
    )
    .unwrap();

    while !handle.is_settled() {
        std::thread::sleep(Duration::from_millis(1));
    }
    tx.send(wire(&[content("late"), ProtocolEvent::Error("late".to_string())])).unwrap();
    drop(tx);

    let (sink, result) = handle.join();
    let summary = result.unwrap();
    assert_eq!(summary.fragments, 1);
    assert_eq!(sink.raw(), "hi");
    assert_eq!(sink.structured().unwrap().to_plain(), "hi");
}

#[test]
fn test_cancel_after_settle_keeps_result() {
    let (tx, rx) = unbounded();
    tx.send(wire(&[content("done early"), ProtocolEvent::Done])).unwrap();

    let mut handle = RenderHandle::spawn(
        Some(ChannelBody { rx }),
        MemorySink::new(),
        fast_config(),
        RenderHooks::new(),
    )
    .unwrap();

    while !handle.is_settled() {
        std::thread::sleep(Duration::from_millis(1));
    }
    // The body is still open; stop waiting for it
    handle.cancel();

    let (sink, result) = handle.join();
    assert_eq!(result.unwrap().visible_chars, 10);
    assert_eq!(sink.structured().unwrap().to_plain(), "done early");
    drop(tx);
}

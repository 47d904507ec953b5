//! Replay Demo: Streams a story into the terminal at reading pace.
//!
//! Replays an SSE transcript (`data: {...}` lines) through the renderer,
//! feeding it in small, irregular bursts like a real network would.
//!
//! Usage:
//!
//! ```text
//! cargo run --example replay                  # built-in sample
//! cargo run --example replay -- story.sse     # your own transcript
//! RUST_LOG=inkstream=debug cargo run --example replay
//! ```

use inkstream::{
    encode_event, render_stream, ProtocolEvent, RenderHooks, RendererConfig, TerminalSink,
};
use serde_json::json;
use std::io::{self, Read};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Sample story, split the way a generator would emit it.
const SAMPLE_FRAGMENTS: &[&str] = &[
    "The lighthouse keeper had not spoken to anyone in eleven days. ",
    "Each morning she climbed the stairs, wound the clockwork, ",
    "and wrote a single line in the log.\n\n",
    "On the twelfth day the log wrote back.\n",
    "\"You missed a ship,\" it said, in handwriting that was almost hers.\n\n",
    "She did not sleep that night. ",
    "She sat by the lamp and counted the hulls on the horizon, ",
    "and there were always one more than there should have been.",
];

/// A body that hands out its bytes in small bursts with pauses between them.
struct JitteryBody {
    data: Vec<u8>,
    pos: usize,
    burst: usize,
}

impl Read for JitteryBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.data.len() {
            return Ok(0);
        }

        // Alternate between quick trickles and slow stalls
        let pause = if self.burst % 7 == 6 { 400 } else { 40 };
        std::thread::sleep(Duration::from_millis(pause));

        let size = 16 + (self.burst * 37) % 96;
        self.burst += 1;

        let end = (self.pos + size).min(self.data.len()).min(self.pos + buf.len());
        let n = end - self.pos;
        buf[..n].copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(n)
    }
}

fn sample_transcript() -> Vec<u8> {
    let mut wire = String::new();
    wire.push_str(": generation started\n\n");
    for fragment in SAMPLE_FRAGMENTS {
        wire.push_str(&encode_event(&ProtocolEvent::Content((*fragment).to_string())));
    }
    wire.push_str(&encode_event(&ProtocolEvent::Analysis(json!({
        "life_type": "keeper",
        "stability_score": 41,
    }))));
    wire.push_str(&encode_event(&ProtocolEvent::Done));
    wire.into_bytes()
}

fn main() -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let data = match std::env::args().nth(1) {
        Some(path) => std::fs::read(path)?,
        None => sample_transcript(),
    };

    println!("Inkstream Replay Demo");
    println!("=====================");
    println!();

    let body = JitteryBody {
        data,
        pos: 0,
        burst: 0,
    };
    let hooks = RenderHooks::new()
        .with_first_content(|| tracing::info!("first content arrived"))
        .with_analysis(|payload| tracing::info!(%payload, "analysis"));

    let mut sink = TerminalSink::stdout();
    match render_stream(Some(body), &mut sink, &RendererConfig::default(), hooks) {
        Ok(summary) => {
            println!();
            println!();
            println!(
                "{} characters in {} fragments, {} frames, {:.1}s",
                summary.visible_chars,
                summary.fragments,
                summary.frames,
                summary.elapsed.as_secs_f64()
            );
            Ok(())
        }
        Err(e) => {
            println!();
            eprintln!("render failed: {e}");
            Err(io::Error::other(e))
        }
    }
}

//! Typewriter Demo: Streams a canned assistant response through the full
//! reveal pipeline and prints it to the terminal.
//!
//! Packets arrive in bursts (simulating irregular network cadence) while
//! the reveal advances at a steady pace; once the stream finishes, catch-up
//! kicks in and the completion callback reports how long the reveal took.
//!
//! Press 'q' or Escape to quit early.

use crossterm::{
    cursor,
    event::{self, Event, KeyCode},
    execute, terminal,
};
use serde_json::{json, Value};
use std::io::{self, Write};
use std::time::{Duration, Instant};
use unspool::{FrameTicker, RevealConfig, StreamPipeline};

/// Sample response to stream.
const SAMPLE_TEXT: &str = "Streaming text straight to the screen as packets arrive looks \
jittery: tokens come in bursts, stall, then arrive all at once. Unspool decouples the \
two cadences. Internally the reveal advances every frame at a configured pace, with \
fractional carry so slow rates stay accurate. Externally, commits are batched and \
snapped to word boundaries, so you never see half a word flicker into place. When the \
stream finishes (or falls far behind), a fast catch-up rate takes over and the text \
fast-forwards to the end.\n\nThat is what you are watching right now.";

fn main() -> io::Result<()> {
    println!("Unspool Typewriter Demo");
    println!("=======================");
    println!("Press 'q' or Escape to quit.\n");
    std::thread::sleep(Duration::from_secs(1));

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen, cursor::Hide)?;

    let result = run(&mut stdout);

    execute!(stdout, cursor::Show, terminal::LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    result
}

fn run(stdout: &mut io::Stdout) -> io::Result<()> {
    let mut pipeline = StreamPipeline::new(RevealConfig {
        base_chars_per_second: 120.0,
        ..RevealConfig::default()
    });

    let started = Instant::now();
    pipeline.set_on_complete(move || {
        tracing::debug!(elapsed = ?started.elapsed(), "reveal complete");
    });

    let ticker = FrameTicker::spawn(Duration::from_millis(16));
    let chars: Vec<char> = SAMPLE_TEXT.chars().collect();

    // The simulated transport: bursts of deltas at irregular intervals.
    let mut packets: Vec<Value> = vec![json!({
        "kind": "text_start", "id": "demo-1", "content": ""
    })];
    let mut sent = 0;
    let mut next_burst = Instant::now();
    let mut complete_at: Option<Instant> = None;

    loop {
        if event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                    return Ok(());
                }
            }
        }

        let Ok(tick) = ticker.receiver().recv() else {
            return Ok(());
        };

        // Emit a burst of 5-40 chars every 30-200ms.
        if sent < chars.len() && tick.at >= next_burst {
            let burst = 5 + (sent * 13) % 36;
            let end = (sent + burst).min(chars.len());
            let content: String = chars[sent..end].iter().collect();
            packets.push(json!({ "kind": "text_delta", "content": content }));
            sent = end;
            next_burst = tick.at + Duration::from_millis(30 + (sent as u64 * 7) % 170);
        }

        let done = sent >= chars.len();
        pipeline
            .update(&packets, done, tick.at)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

        let outcome = pipeline.on_frame(tick.at);
        if outcome.committed {
            execute!(
                stdout,
                cursor::MoveTo(0, 0),
                terminal::Clear(terminal::ClearType::All)
            )?;
            // Raw mode needs explicit carriage returns.
            for line in pipeline.revealed_text().lines() {
                write!(stdout, "{line}\r\n")?;
            }
            let status = if pipeline.is_caught_up() {
                "caught up"
            } else {
                "revealing..."
            };
            write!(stdout, "\r\n[{status}] press 'q' to quit\r")?;
            stdout.flush()?;
        }

        if done && pipeline.is_caught_up() {
            // Linger briefly so the final frame is visible.
            match complete_at {
                None => complete_at = Some(tick.at),
                Some(at) if tick.at - at > Duration::from_secs(3) => return Ok(()),
                Some(_) => {}
            }
        }
    }
}

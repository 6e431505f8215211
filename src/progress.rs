//! Live progress line for concurrent work.
//!
//! A [`Spinner`] is shared (`Arc`) between the task that renders it and every
//! worker that reports into it. Counters are atomics and the message sits
//! behind a mutex, so workers never coordinate among themselves.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Interval between two rendered frames.
pub const TICK_INTERVAL: Duration = Duration::from_millis(80);

// Ten animation frames, then the glyph shown once finished.
const FRAMES: [&str; 11] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"];

/// Where a spinner draws.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProgressOutput {
    /// Standard error. Nothing is drawn when stderr is not a terminal.
    #[default]
    Stderr,
    /// Nothing is drawn.
    Hidden,
}

impl ProgressOutput {
    fn draw_target(self) -> ProgressDrawTarget {
        match self {
            ProgressOutput::Stderr => ProgressDrawTarget::stderr(),
            ProgressOutput::Hidden => ProgressDrawTarget::hidden(),
        }
    }
}

/// Lifecycle of a spinner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinnerState {
    /// Created, not yet rendering.
    Idle,
    /// Render loop is ticking.
    Running,
    /// Terminal; the render loop has exited.
    Stopped,
}

struct Ticker {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Animated status line with done/total counters and an ETA.
pub struct Spinner {
    message: Mutex<String>,
    start: Instant,
    total: AtomicUsize,
    done: AtomicUsize,
    state: Mutex<SpinnerState>,
    ticker: Mutex<Option<Ticker>>,
    output: ProgressOutput,
    bar: ProgressBar,
}

impl Spinner {
    /// Creates an idle spinner drawing to stderr.
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_output(message, ProgressOutput::Stderr)
    }

    /// Creates an idle spinner drawing to `output`.
    pub fn with_output(message: impl Into<String>, output: ProgressOutput) -> Self {
        let bar = ProgressBar::with_draw_target(None, output.draw_target());
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            bar.set_style(style.tick_strings(&FRAMES));
        }
        Self {
            message: Mutex::new(message.into()),
            start: Instant::now(),
            total: AtomicUsize::new(0),
            done: AtomicUsize::new(0),
            state: Mutex::new(SpinnerState::Idle),
            ticker: Mutex::new(None),
            output,
            bar,
        }
    }

    /// Sets the number of tasks.
    pub fn set_total(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
    }

    /// Marks one task as completed.
    pub fn incr_done(&self) {
        self.done.fetch_add(1, Ordering::SeqCst);
    }

    /// Resets the completed counter for a new stage.
    pub fn reset_done(&self) {
        self.done.store(0, Ordering::SeqCst);
    }

    /// Returns a guard that marks one task completed when dropped, including
    /// when the task unwinds.
    pub fn completion(self: &Arc<Self>) -> Completion {
        Completion(Arc::clone(self))
    }

    /// Replaces the status message.
    pub fn update_message(&self, message: impl Into<String>) {
        if let Ok(mut current) = self.message.lock() {
            *current = message.into();
        }
    }

    /// Number of tasks.
    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Number of completed tasks.
    pub fn done(&self) -> usize {
        self.done.load(Ordering::SeqCst)
    }

    /// Current status message.
    pub fn message(&self) -> String {
        self.message
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Time since the spinner was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SpinnerState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(SpinnerState::Stopped)
    }

    /// Starts the render loop. Must be called inside a tokio runtime.
    ///
    /// Only an idle spinner starts; later calls do nothing.
    pub fn start(self: &Arc<Self>) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if *state != SpinnerState::Idle {
            return;
        }
        *state = SpinnerState::Running;

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let spinner = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = interval.tick() => spinner.render(),
                }
            }
        });

        if let Ok(mut ticker) = self.ticker.lock() {
            *ticker = Some(Ticker {
                stop: stop_tx,
                handle,
            });
        }
    }

    /// Stops the render loop and clears the line.
    pub async fn stop(&self) {
        if self.halt().await {
            self.bar.finish_and_clear();
        }
    }

    /// Stops the render loop and prints a final line with the total elapsed time.
    ///
    /// The final line goes to stderr even when it is not a terminal.
    pub async fn stop_with_message(&self, message: &str) {
        if self.halt().await {
            self.bar.finish_and_clear();
            if self.output == ProgressOutput::Stderr {
                eprintln!("{}", final_line(message, self.elapsed()));
            }
        }
    }

    /// Moves to `Stopped` and waits for the loop to exit. Returns `false` if
    /// the spinner was already stopped.
    async fn halt(&self) -> bool {
        {
            let Ok(mut state) = self.state.lock() else {
                return false;
            };
            if *state == SpinnerState::Stopped {
                return false;
            }
            *state = SpinnerState::Stopped;
        }

        let ticker = self.ticker.lock().ok().and_then(|mut t| t.take());
        if let Some(ticker) = ticker {
            let _ = ticker.stop.send(());
            let _ = ticker.handle.await;
        }
        true
    }

    fn render(&self) {
        self.bar.set_message(status_line(
            &self.message(),
            self.done(),
            self.total(),
            self.elapsed(),
        ));
        self.bar.tick();
    }
}

/// Drop guard returned by [`Spinner::completion`].
pub struct Completion(Arc<Spinner>);

impl Drop for Completion {
    fn drop(&mut self) {
        self.0.incr_done();
    }
}

/// Estimated time remaining: average time per completed task times the
/// number of outstanding tasks. `None` until something has completed.
pub fn eta(elapsed: Duration, done: usize, total: usize) -> Option<Duration> {
    if done == 0 || total == 0 {
        return None;
    }
    let done_u32 = u32::try_from(done).unwrap_or(u32::MAX);
    let remaining = u32::try_from(total.saturating_sub(done)).unwrap_or(u32::MAX);
    Some((elapsed / done_u32) * remaining)
}

/// Composes the text drawn after the spinner frame.
pub fn status_line(message: &str, done: usize, total: usize, elapsed: Duration) -> String {
    let elapsed_str = format_duration(elapsed);
    match (total, eta(elapsed, done, total)) {
        (0, _) => format!("{} {}", message, elapsed_str),
        (_, Some(eta)) => format!(
            "{} [{}/{}] {} (ETA: {})",
            message,
            done,
            total,
            elapsed_str,
            format_duration(eta)
        ),
        (_, None) => format!("{} [0/{}] {}", message, total, elapsed_str),
    }
}

/// The line printed by [`Spinner::stop_with_message`].
pub fn final_line(message: &str, elapsed: Duration) -> String {
    format!("✓ {} ({})", message, format_duration(elapsed))
}

/// Formats a duration as `850ms`, `2.5s` or `3m7s`.
pub fn format_duration(d: Duration) -> String {
    if d < Duration::from_secs(1) {
        return format!("{}ms", d.as_millis());
    }
    if d < Duration::from_secs(60) {
        return format!("{:.1}s", d.as_secs_f64());
    }
    format!("{}m{}s", d.as_secs() / 60, d.as_secs() % 60)
}

//! Turns a supervised run into either a live record stream or a single
//! buffered result.

use std::collections::VecDeque;

use futures_core::Stream;

use crate::process::{BuildResult, Completion, OutputChannel, OutputEvent, ProcessEvent, ProcessHandle};
use crate::stage::{Stage, StageTracker};

use super::StreamRecord;

/// How the client receives build output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Records are pushed while the build runs.
    Live,
    /// One aggregated result after the build exits.
    Buffered,
}

impl DeliveryMode {
    /// Live if the client accepts `text/event-stream` or asked for it with
    /// the `stream` flag; buffered otherwise.
    #[must_use]
    pub fn negotiate(accept: Option<&str>, stream_flag: bool) -> Self {
        let wants_events = accept.is_some_and(|accept| {
            accept
                .split(',')
                .filter_map(|media| media.split(';').next())
                .any(|media| media.trim().eq_ignore_ascii_case("text/event-stream"))
        });
        if wants_events || stream_flag {
            Self::Live
        } else {
            Self::Buffered
        }
    }
}

/// Converts process events into client-facing output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Emitter {
    stages: bool,
}

impl Emitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interleave `stage` records with raw output in live mode.
    #[must_use]
    pub fn with_stages(mut self, stages: bool) -> Self {
        self.stages = stages;
        self
    }

    /// Live record stream for `handle`.
    ///
    /// Chunks are forwarded raw in arrival order. A start failure yields an
    /// `error` record; every stream ends with exactly one `done` record.
    /// `guard` is held until the stream finishes or is dropped, which lets
    /// callers tie cancellation or a run lock to the stream's lifetime.
    pub fn live<G>(&self, handle: ProcessHandle, guard: G) -> impl Stream<Item = StreamRecord> + Send
    where
        G: Send + 'static,
    {
        let state = LiveState {
            handle,
            pending: VecDeque::new(),
            stdout: String::new(),
            stderr: String::new(),
            tracker: StageTracker::new(),
            stages: self.stages,
            done: false,
            _guard: guard,
        };

        futures_util::stream::unfold(state, |mut state| async move {
            loop {
                if let Some(record) = state.pending.pop_front() {
                    return Some((record, state));
                }
                if state.done {
                    return None;
                }
                match state.handle.next_event().await {
                    Some(ProcessEvent::Output(output)) => state.push_output(output),
                    Some(ProcessEvent::Completed(completion)) => state.push_completion(&completion),
                    None => state.done = true,
                }
            }
        })
    }

    /// Wait for the run to finish and aggregate its output.
    ///
    /// The stdout and stderr strings equal the concatenation of the chunks
    /// live mode would have delivered for the same run.
    pub async fn collect(&self, handle: ProcessHandle) -> BuildResult {
        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut tracker = StageTracker::new();

        let completion = handle
            .drive(
                |output| {
                    if let Some(stage) = tracker.observe(&output.text) {
                        log_stage(stage);
                    }
                    match output.channel {
                        OutputChannel::Stdout => stdout.push_str(&output.text),
                        OutputChannel::Stderr => stderr.push_str(&output.text),
                    }
                },
                |_| {},
            )
            .await;

        if let Some(stage) = tracker.finish(completion.is_success()) {
            log_stage(stage);
        }
        finish_log(&completion);
        BuildResult::new(&completion, stdout, stderr)
    }
}

struct LiveState<G> {
    handle: ProcessHandle,
    pending: VecDeque<StreamRecord>,
    stdout: String,
    stderr: String,
    tracker: StageTracker,
    stages: bool,
    done: bool,
    _guard: G,
}

impl<G> LiveState<G> {
    fn push_output(&mut self, output: OutputEvent) {
        let stage = self.tracker.observe(&output.text);
        let record = match output.channel {
            OutputChannel::Stdout => {
                self.stdout.push_str(&output.text);
                StreamRecord::Stdout(output.text)
            }
            OutputChannel::Stderr => {
                self.stderr.push_str(&output.text);
                StreamRecord::Stderr(output.text)
            }
        };
        self.pending.push_back(record);
        if let Some(stage) = stage {
            self.push_stage(stage);
        }
    }

    fn push_completion(&mut self, completion: &Completion) {
        if let Completion::StartFailed(message) = completion {
            self.pending.push_back(StreamRecord::Error(format!(
                "Failed to start build script: {message}"
            )));
        }
        if let Some(stage) = self.tracker.finish(completion.is_success()) {
            self.push_stage(stage);
        }
        finish_log(completion);

        let result = BuildResult::new(
            completion,
            std::mem::take(&mut self.stdout),
            std::mem::take(&mut self.stderr),
        );
        self.pending.push_back(StreamRecord::Done(result));
        self.done = true;
    }

    fn push_stage(&mut self, stage: Stage) {
        log_stage(stage);
        if self.stages {
            self.pending.push_back(StreamRecord::Stage(stage.info()));
        }
    }
}

fn log_stage(stage: Stage) {
    tracing::info!(stage = %stage, progress = stage.progress(), "Build stage");
}

fn finish_log(completion: &Completion) {
    match completion {
        Completion::Exited(code) => {
            tracing::info!(exit_code = code, ok = completion.is_success(), "Build finished");
        }
        Completion::StartFailed(message) => {
            tracing::warn!(error = %message, "Build did not start");
        }
    }
}

//! Supervision of a single build process.
//!
//! `Supervisor::start` spawns the child and hands back a `ProcessHandle`.
//! A background task pumps stdout and stderr independently into an
//! unbounded channel, waits for exit (or cancellation), drains both pipes
//! and finally emits exactly one `Completed` event.
//!
//! The channel is unbounded so a slow consumer never stalls output
//! collection; a consumer that stops reading lets memory grow until the
//! run ends.

use std::sync::Arc;

use futures_core::Stream;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::{
    exit_code, BuildProcess, Completion, OutputChannel, OutputEvent, ProcessEvent, ProcessState,
    Utf8Decoder, DEFAULT_TERMINATE_TIMEOUT,
};
use crate::shell::InvocationPlan;

/// Size of a single pipe read.
pub const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Target used when mirroring child output into the server log.
pub const OUTPUT_LOG_TARGET: &str = "build_output";

/// What the background tasks send to the handle. Output gets its index
/// when the handle receives it.
#[derive(Debug)]
enum Message {
    Output(OutputChannel, String),
    Completed(Completion),
}

/// Entry point for running supervised build processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Supervisor;

impl Supervisor {
    /// Spawn one child for `plan` and start supervising it.
    ///
    /// Spawn failures are not returned here: they arrive as the single
    /// `Completed(StartFailed)` event on the handle. Cancelling `cancel`
    /// terminates the child. Must be called from within a Tokio runtime.
    #[must_use]
    pub fn start(plan: InvocationPlan, cancel: CancellationToken) -> ProcessHandle {
        let plan = Arc::new(plan);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ProcessState::Running);

        let pid = match BuildProcess::spawn(&plan) {
            Ok(process) => {
                let pid = process.id();
                tracing::info!(pid, command = %plan.display_command(), "Build process started");
                tokio::spawn(supervise(process, event_tx, state_tx, cancel).in_current_span());
                pid
            }
            Err(e) => {
                tracing::warn!(error = %e, command = %plan.display_command(), "Failed to start build process");
                let message = e.to_string();
                state_tx.send_replace(ProcessState::Failed(message.clone()));
                let _ = event_tx.send(Message::Completed(Completion::StartFailed(message)));
                None
            }
        };

        ProcessHandle {
            pid,
            plan,
            events: event_rx,
            state: state_rx,
            received: 0,
            finished: false,
        }
    }
}

/// Consumer side of one supervised process.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: Option<u32>,
    plan: Arc<InvocationPlan>,
    events: mpsc::UnboundedReceiver<Message>,
    state: watch::Receiver<ProcessState>,
    received: u64,
    finished: bool,
}

impl ProcessHandle {
    /// OS process id, `None` if the process never started.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    #[must_use]
    pub fn plan(&self) -> &InvocationPlan {
        &self.plan
    }

    /// Current live state.
    #[must_use]
    pub fn state(&self) -> ProcessState {
        self.state.borrow().clone()
    }

    /// Next event, or `None` once the completion event has been delivered.
    pub async fn next_event(&mut self) -> Option<ProcessEvent> {
        if self.finished {
            return None;
        }
        match self.events.recv().await {
            Some(Message::Output(channel, text)) => {
                let index = self.received;
                self.received += 1;
                Some(ProcessEvent::Output(OutputEvent {
                    channel,
                    text,
                    index,
                }))
            }
            Some(Message::Completed(completion)) => {
                self.finished = true;
                Some(ProcessEvent::Completed(completion))
            }
            None => {
                tracing::warn!("Supervision task ended without a completion event");
                self.finished = true;
                Some(ProcessEvent::Completed(Completion::Exited(-1)))
            }
        }
    }

    /// Drive the run to completion, invoking `on_output` for every chunk and
    /// `on_exit` once at the end.
    pub async fn drive<F, G>(mut self, mut on_output: F, on_exit: G) -> Completion
    where
        F: FnMut(&OutputEvent),
        G: FnOnce(&Completion),
    {
        while let Some(event) = self.next_event().await {
            match event {
                ProcessEvent::Output(output) => on_output(&output),
                ProcessEvent::Completed(completion) => {
                    on_exit(&completion);
                    return completion;
                }
            }
        }
        // next_event always yields a completion before returning None.
        Completion::Exited(-1)
    }

    /// View the handle as a stream of events ending with the completion.
    pub fn into_stream(self) -> impl Stream<Item = ProcessEvent> + Send {
        futures_util::stream::unfold(self, |mut handle| async move {
            handle.next_event().await.map(|event| (event, handle))
        })
    }
}

async fn supervise(
    mut process: BuildProcess,
    event_tx: mpsc::UnboundedSender<Message>,
    state_tx: watch::Sender<ProcessState>,
    cancel: CancellationToken,
) {
    let readers = [
        process.take_stdout().map(|out| {
            tokio::spawn(
                pump(out, OutputChannel::Stdout, event_tx.clone()).in_current_span(),
            )
        }),
        process.take_stderr().map(|err| {
            tokio::spawn(
                pump(err, OutputChannel::Stderr, event_tx.clone()).in_current_span(),
            )
        }),
    ];

    let waited = tokio::select! {
        status = process.wait() => Some(status),
        () = cancel.cancelled() => None,
    };
    let status = match waited {
        Some(status) => status,
        None => {
            tracing::info!(pid = process.id(), "Cancelling build process");
            if let Err(e) = process.graceful_terminate(DEFAULT_TERMINATE_TIMEOUT).await {
                tracing::warn!(error = %e, "Failed to terminate build process");
            }
            process.wait().await
        }
    };

    for reader in readers.into_iter().flatten() {
        if let Err(e) = reader.await {
            tracing::warn!(error = %e, "Output reader task failed");
        }
    }

    let code = match status {
        Ok(status) => exit_code(status),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to wait for build process");
            -1
        }
    };
    tracing::info!(exit_code = code, "Build process exited");

    state_tx.send_replace(ProcessState::Exited(code));
    let _ = event_tx.send(Message::Completed(Completion::Exited(code)));
}

async fn pump<R>(
    mut reader: R,
    channel: OutputChannel,
    event_tx: mpsc::UnboundedSender<Message>,
) where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let mut decoder = Utf8Decoder::new();

    loop {
        let text = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => decoder.decode(&buf[..n]),
            Err(e) => {
                tracing::warn!(%channel, error = %e, "Failed to read build output");
                break;
            }
        };
        emit(channel, text, &event_tx);
    }
    emit(channel, decoder.finish(), &event_tx);
}

fn emit(
    channel: OutputChannel,
    text: String,
    event_tx: &mpsc::UnboundedSender<Message>,
) {
    if text.is_empty() {
        return;
    }
    tracing::debug!(target: OUTPUT_LOG_TARGET, %channel, "{}", text.trim_end());
    // The consumer may have gone away; output is still drained.
    let _ = event_tx.send(Message::Output(channel, text));
}

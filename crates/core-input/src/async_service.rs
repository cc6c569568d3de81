use crate::key_token::map_key_event;
use crate::{TerminalInput, log_paste};
use crossterm::event::{Event as CEvent, EventStream};
use std::io;
use std::sync::Arc;
use tokio::sync::{Notify, mpsc::Sender};
use tokio::task;
use tokio_stream::{Stream, StreamExt};
use tracing::{Instrument, debug, info, trace, warn};

#[derive(Clone, Debug)]
pub struct AsyncInputShutdown {
    notify: Arc<Notify>,
}

impl AsyncInputShutdown {
    pub fn signal(&self) {
        self.notify.notify_one();
    }
}

#[derive(Clone, Debug)]
struct ShutdownListener {
    notify: Arc<Notify>,
}

impl ShutdownListener {
    fn new_pair() -> (AsyncInputShutdown, Self) {
        let notify = Arc::new(Notify::new());
        (
            AsyncInputShutdown {
                notify: notify.clone(),
            },
            ShutdownListener { notify },
        )
    }

    async fn wait(&self) {
        self.notify.notified().await;
    }
}

/// Spawn a Tokio task forwarding terminal key and paste events to `sender`.
///
/// Returns the task handle alongside a shutdown handle that stops the task at
/// its next poll.
pub fn spawn_async_input(
    sender: Sender<TerminalInput>,
) -> (task::JoinHandle<()>, AsyncInputShutdown) {
    let (shutdown, listener) = ShutdownListener::new_pair();
    let span = tracing::debug_span!(target: "input.thread", "input_async_task");
    let handle = task::spawn(
        async move {
            InputTask::new(sender, EventStream::new(), listener).run().await;
        }
        .instrument(span),
    );
    (handle, shutdown)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ExitReason {
    ShutdownSignal,
    ChannelClosed,
    StreamEnded,
    StreamError,
}

impl ExitReason {
    fn as_str(&self) -> &'static str {
        match self {
            ExitReason::ShutdownSignal => "shutdown_signal",
            ExitReason::ChannelClosed => "channel_closed",
            ExitReason::StreamEnded => "stream_ended",
            ExitReason::StreamError => "stream_error",
        }
    }
}

struct InputTask<S> {
    sender: Sender<TerminalInput>,
    stream: S,
    shutdown: ShutdownListener,
}

impl<S> InputTask<S>
where
    S: Stream<Item = io::Result<CEvent>> + Send + Unpin + 'static,
{
    fn new(sender: Sender<TerminalInput>, stream: S, shutdown: ShutdownListener) -> Self {
        Self {
            sender,
            stream,
            shutdown,
        }
    }

    async fn run(mut self) -> ExitReason {
        info!(target: "input.thread", "async_input_task_started");
        let reason = loop {
            let next = tokio::select! {
                biased;
                _ = self.shutdown.wait() => break ExitReason::ShutdownSignal,
                next = self.stream.next() => next,
            };
            let input = match next {
                None => break ExitReason::StreamEnded,
                Some(Err(err)) => {
                    warn!(
                        target: "input.thread",
                        error_kind = ?err.kind(),
                        "async_input_task_stream_error"
                    );
                    break ExitReason::StreamError;
                }
                Some(Ok(CEvent::Key(key))) => match map_key_event(&key) {
                    Some(token) => {
                        trace!(target: "input.event", key = %token, "keypress");
                        TerminalInput::Key(token)
                    }
                    None => continue,
                },
                Some(Ok(CEvent::Paste(data))) => {
                    log_paste(&data);
                    TerminalInput::Paste(data)
                }
                Some(Ok(_)) => continue,
            };
            if self.sender.send(input).await.is_err() {
                debug!(target: "input.thread", "receiver_dropped");
                break ExitReason::ChannelClosed;
            }
        };
        info!(target: "input.thread", reason = reason.as_str(), "async_input_task_stopped");
        reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::KeyToken;
    use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
    use tokio::sync::mpsc;

    fn key(c: char, kind: KeyEventKind) -> io::Result<CEvent> {
        let mut event = KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE);
        event.kind = kind;
        Ok(CEvent::Key(event))
    }

    fn task<S>(stream: S) -> (InputTask<S>, mpsc::Receiver<TerminalInput>, AsyncInputShutdown)
    where
        S: Stream<Item = io::Result<CEvent>> + Send + Unpin + 'static,
    {
        let (tx, rx) = mpsc::channel(16);
        let (shutdown, listener) = ShutdownListener::new_pair();
        (InputTask::new(tx, stream, listener), rx, shutdown)
    }

    #[tokio::test]
    async fn forwards_presses_and_pastes() {
        let events = vec![
            key('d', KeyEventKind::Press),
            key('d', KeyEventKind::Release),
            Ok(CEvent::FocusGained),
            Ok(CEvent::Paste("hi".into())),
        ];
        let (task, mut rx, _shutdown) = task(tokio_stream::iter(events));
        assert_eq!(task.run().await, ExitReason::StreamEnded);
        assert_eq!(rx.recv().await, Some(TerminalInput::Key(KeyToken::Char('d'))));
        assert_eq!(rx.recv().await, Some(TerminalInput::Paste("hi".into())));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn stream_error_stops_the_task() {
        let events = vec![
            Err(io::Error::other("tty gone")),
            key('x', KeyEventKind::Press),
        ];
        let (task, mut rx, _shutdown) = task(tokio_stream::iter(events));
        assert_eq!(task.run().await, ExitReason::StreamError);
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn dropped_receiver_stops_the_task() {
        let (task, rx, _shutdown) = task(tokio_stream::iter(vec![key('x', KeyEventKind::Press)]));
        drop(rx);
        assert_eq!(task.run().await, ExitReason::ChannelClosed);
    }

    #[tokio::test]
    async fn shutdown_signal_wins() {
        let (task, _rx, shutdown) = task(tokio_stream::pending::<io::Result<CEvent>>());
        shutdown.signal();
        assert_eq!(task.run().await, ExitReason::ShutdownSignal);
    }
}

//! The inbound activity.
//!
//! A spawned task blocks on the datagram source and feeds each datagram
//! through the receive pipeline. Read errors are logged and the loop keeps
//! going; it ends when the source reports closure or shutdown is requested,
//! and the source (and its socket) is dropped with the task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::chat::error::ChatError;
use crate::chat::presenter::Presenter;
use crate::chat::session::ChatSession;
use crate::chat::transport::DatagramSource;

/// Pause after a failed read so a persistent error cannot spin the task.
const READ_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Handle to a running inbound task.
pub struct InboundHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl InboundHandle {
    /// Stop the task and wait for it to release its socket.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "inbound task ended abnormally");
        }
    }

    /// Whether the task has already exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn the inbound task on the current tokio runtime.
pub fn spawn_inbound<S, P>(
    session: Arc<ChatSession>,
    mut source: S,
    presenter: P,
) -> InboundHandle
where
    S: DatagramSource + 'static,
    P: Presenter + 'static,
{
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    debug!("inbound task shutting down");
                    break;
                }
                result = source.recv() => match result {
                    Ok(datagram) => {
                        session.handle_datagram(&datagram, &presenter);
                    }
                    Err(ChatError::TransportClosed) => {
                        debug!("datagram source closed");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "error reading datagram");
                        tokio::time::sleep(READ_ERROR_BACKOFF).await;
                    }
                },
            }
        }
    });

    InboundHandle { shutdown, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::chat::config::ChatConfig;
    use crate::chat::presenter::NoticeKind;
    use crate::chat::protocol::{ChatRecord, Timestamp};
    use crate::chat::transport::memory_link;
    use crate::crypto::SessionKey;

    #[derive(Default)]
    struct Recorder {
        records: Mutex<Vec<ChatRecord>>,
    }

    impl Presenter for Recorder {
        fn deliver(&self, record: &ChatRecord) {
            self.records.lock().unwrap().push(record.clone());
        }

        fn notice(&self, _kind: NoticeKind, _text: &str) {}

        fn debug_enabled(&self) -> bool {
            false
        }
    }

    fn session(name: &str) -> Arc<ChatSession> {
        let key = Arc::new(SessionKey::derive("hunter2"));
        Arc::new(ChatSession::new(name, key, &ChatConfig::default()).unwrap())
    }

    #[tokio::test]
    async fn test_delivers_in_arrival_order_and_exits_on_close() {
        let (sink, source) = memory_link();
        let alice = session("alice");
        let bob = session("bob");
        let presenter = Arc::new(Recorder::default());

        let handle = spawn_inbound(bob, source, presenter.clone());

        let ts = Timestamp::from_hms(9, 0, 0).unwrap();
        for body in ["one", "two", "three"] {
            let (_, frame) = alice.prepare_outgoing(body, ts.clone()).unwrap();
            crate::chat::transport::DatagramSink::send(&sink, &frame)
                .await
                .unwrap();
        }
        sink.close();

        tokio::time::timeout(Duration::from_secs(2), async {
            while !handle.is_finished() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        let bodies: Vec<String> = presenter
            .records
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.body.clone())
            .collect();
        assert_eq!(bodies, vec!["one", "two", "three"]);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_idle_task() {
        let (_sink, source) = memory_link();
        let handle = spawn_inbound(session("bob"), source, Arc::new(Recorder::default()));
        tokio::time::timeout(Duration::from_secs(2), handle.shutdown())
            .await
            .unwrap();
    }
}

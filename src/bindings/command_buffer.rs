//! Ordered UI command buffer shared by the script side and the native consumer.
//!
//! Commands are numbered at append time. Numbering and sending happen under
//! the same lock, so the order of sequence numbers is the order in which the
//! consumer receives them.

use crossbeam_channel::{unbounded, Receiver, RecvError, Sender, TryRecvError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::protocol::{TargetId, UiCommand, UiCommandKind};

/// Creates a connected command buffer pair.
pub fn command_buffer() -> (CommandSender, CommandReceiver) {
    let (tx, rx) = unbounded();
    let consumed = Arc::new(AtomicU64::new(0));
    (
        CommandSender {
            tx: Arc::new(Mutex::new(SequencedSender { tx, last_issued: 0 })),
            consumed: Arc::clone(&consumed),
        },
        CommandReceiver { rx, consumed },
    )
}

struct SequencedSender {
    tx: Sender<UiCommand>,
    last_issued: u64,
}

/// Script-side handle of the command buffer. Cheap to clone.
#[derive(Clone)]
pub struct CommandSender {
    tx: Arc<Mutex<SequencedSender>>,
    consumed: Arc<AtomicU64>,
}

impl CommandSender {
    /// Appends a command. Never blocks on the consumer.
    pub fn append(&self, target: TargetId, kind: UiCommandKind) {
        let mut inner = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        inner.last_issued += 1;
        let command = UiCommand {
            seq: inner.last_issued,
            target,
            kind,
        };
        tracing::trace!(target: "bridge::commands", seq = command.seq, id = %target, op = command.kind.tag(), "append");
        if inner.tx.send(command).is_err() {
            tracing::warn!(target: "bridge::commands", id = %target, "command consumer is gone, command dropped");
        }
    }

    /// Sequence number of the most recently appended command, 0 if none.
    pub fn last_issued(&self) -> u64 {
        self.tx.lock().unwrap_or_else(PoisonError::into_inner).last_issued
    }

    /// Highest sequence number the consumer has marked as applied.
    pub fn consumed(&self) -> u64 {
        self.consumed.load(Ordering::Acquire)
    }
}

/// Consumer-side handle of the command buffer.
pub struct CommandReceiver {
    rx: Receiver<UiCommand>,
    consumed: Arc<AtomicU64>,
}

impl CommandReceiver {
    pub fn try_recv(&self) -> Result<UiCommand, TryRecvError> {
        self.rx.try_recv()
    }

    pub fn recv(&self) -> Result<UiCommand, RecvError> {
        self.rx.recv()
    }

    pub(crate) fn channel(&self) -> &Receiver<UiCommand> {
        &self.rx
    }

    /// Marks every command up to and including `seq` as applied.
    pub fn mark_consumed(&self, seq: u64) {
        self.consumed.fetch_max(seq, Ordering::AcqRel);
    }

    pub fn consumed(&self) -> u64 {
        self.consumed.load(Ordering::Acquire)
    }

    /// Takes every command currently queued, in order.
    pub fn drain(&self) -> Vec<UiCommand> {
        self.rx.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn set(name: &str) -> UiCommandKind {
        UiCommandKind::SetProperty {
            name: name.to_string(),
            value: "1.000000".to_string(),
        }
    }

    #[test]
    fn test_sequence_numbers_follow_append_order() {
        let (tx, rx) = command_buffer();
        tx.append(TargetId(1), set("width"));
        tx.append(TargetId(2), set("height"));
        tx.append(TargetId(1), set("height"));

        let seqs: Vec<u64> = rx.drain().iter().map(|c| c.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert_eq!(tx.last_issued(), 3);
    }

    #[test]
    fn test_consumed_watermark_is_shared() {
        let (tx, rx) = command_buffer();
        tx.append(TargetId(1), set("width"));
        assert_eq!(tx.consumed(), 0);

        let cmd = rx.recv().unwrap();
        rx.mark_consumed(cmd.seq);
        rx.mark_consumed(0);
        assert_eq!(tx.consumed(), 1);
    }

    #[test]
    fn test_append_after_consumer_dropped_is_silent() {
        let (tx, rx) = command_buffer();
        drop(rx);
        tx.append(TargetId(1), set("width"));
        assert_eq!(tx.last_issued(), 1);
    }

    #[test]
    fn test_concurrent_producers_keep_receive_order_monotonic() {
        let (tx, rx) = command_buffer();
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let tx = tx.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        tx.append(TargetId(t), set("width"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let seqs: Vec<u64> = rx.drain().iter().map(|c| c.seq).collect();
        assert_eq!(seqs.len(), 400);
        assert!(seqs.windows(2).all(|w| w[1] == w[0] + 1));
    }
}

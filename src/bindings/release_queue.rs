//! Deferred release of native element handles.
//!
//! A handle is never freed where its binding dies. The binding hands it over
//! together with a fence: the sequence number of the last command appended
//! before the hand-over. The consumer only runs the destructor once it has
//! applied every command up to that fence.

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::VecDeque;

use super::command_buffer::CommandSender;
use super::native::NativeElement;
use super::protocol::TargetId;

pub type Destructor = Box<dyn FnOnce(Box<NativeElement>) + Send>;

/// A native handle waiting for its destructor.
pub struct ReleaseEntry {
    target: TargetId,
    fence: u64,
    element: Box<NativeElement>,
    destructor: Destructor,
}

impl ReleaseEntry {
    pub fn target(&self) -> TargetId {
        self.target
    }

    pub fn fence(&self) -> u64 {
        self.fence
    }

    fn run(self) {
        tracing::debug!(target: "bridge::release", id = %self.target, fence = self.fence, "running destructor");
        (self.destructor)(self.element);
    }
}

/// Creates the release queue for the commands issued through `commands`.
pub fn release_queue(commands: CommandSender) -> (ReleaseQueue, ReleaseReceiver) {
    let (tx, rx) = unbounded();
    (
        ReleaseQueue { tx, commands },
        ReleaseReceiver {
            rx,
            pending: VecDeque::new(),
        },
    )
}

/// Script-side handle of the release queue.
#[derive(Clone)]
pub struct ReleaseQueue {
    tx: Sender<ReleaseEntry>,
    commands: CommandSender,
}

impl ReleaseQueue {
    /// Hands `element` over for destruction after the command stream drains
    /// past everything issued so far.
    pub fn enqueue(&self, element: Box<NativeElement>, destructor: Destructor) {
        let entry = ReleaseEntry {
            target: element.target(),
            fence: self.commands.last_issued(),
            element,
            destructor,
        };
        tracing::trace!(target: "bridge::release", id = %entry.target, fence = entry.fence, "release enqueued");

        if let Err(err) = self.tx.send(entry) {
            // No consumer left to race with.
            tracing::warn!(target: "bridge::release", "release consumer is gone, freeing in place");
            err.into_inner().run();
        }
    }
}

/// Consumer-side handle of the release queue.
pub struct ReleaseReceiver {
    rx: Receiver<ReleaseEntry>,
    pending: VecDeque<ReleaseEntry>,
}

impl ReleaseReceiver {
    pub(crate) fn channel(&self) -> &Receiver<ReleaseEntry> {
        &self.rx
    }

    pub(crate) fn push(&mut self, entry: ReleaseEntry) {
        self.pending.push_back(entry);
    }

    /// Entries received but still waiting for their fence.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Runs, in FIFO order, every destructor whose fence is at or below
    /// `consumed`. Returns how many ran.
    pub fn flush(&mut self, consumed: u64) -> usize {
        self.pending.extend(self.rx.try_iter());

        let mut ran = 0;
        while self
            .pending
            .front()
            .is_some_and(|entry| entry.fence <= consumed)
        {
            if let Some(entry) = self.pending.pop_front() {
                entry.run();
                ran += 1;
            }
        }
        ran
    }

    /// Runs every remaining destructor regardless of fences. Only valid once
    /// no further commands can be applied.
    pub fn flush_all(&mut self) -> usize {
        self.flush(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::command_buffer::command_buffer;
    use crate::bindings::property::ElementKind;
    use crate::bindings::protocol::UiCommandKind;
    use std::sync::{Arc, Mutex};

    fn element(id: u64) -> Box<NativeElement> {
        Box::new(NativeElement::new(TargetId(id), ElementKind::Iframe, vec![]))
    }

    fn recording(log: &Arc<Mutex<Vec<u64>>>) -> Destructor {
        let log = Arc::clone(log);
        Box::new(move |element: Box<NativeElement>| {
            log.lock().unwrap().push(element.target().0);
        })
    }

    #[test]
    fn test_destructor_waits_for_fence() {
        let (commands, receiver) = command_buffer();
        let (queue, mut releases) = release_queue(commands.clone());
        let log = Arc::new(Mutex::new(Vec::new()));

        commands.append(
            TargetId(1),
            UiCommandKind::CreateElement {
                tag: "iframe".to_string(),
            },
        );
        queue.enqueue(element(1), recording(&log));

        assert_eq!(releases.flush(receiver.consumed()), 0);
        assert_eq!(releases.pending(), 1);
        assert!(log.lock().unwrap().is_empty());

        let cmd = receiver.recv().unwrap();
        receiver.mark_consumed(cmd.seq);
        assert_eq!(releases.flush(receiver.consumed()), 1);
        assert_eq!(*log.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_release_order_is_fifo() {
        let (commands, _receiver) = command_buffer();
        let (queue, mut releases) = release_queue(commands);
        let log = Arc::new(Mutex::new(Vec::new()));

        for id in [3, 1, 2] {
            queue.enqueue(element(id), recording(&log));
        }
        assert_eq!(releases.flush(0), 3);
        assert_eq!(*log.lock().unwrap(), vec![3, 1, 2]);
    }

    #[test]
    fn test_enqueue_without_consumer_frees_immediately() {
        let (commands, _receiver) = command_buffer();
        let (queue, releases) = release_queue(commands);
        drop(releases);

        let log = Arc::new(Mutex::new(Vec::new()));
        queue.enqueue(element(9), recording(&log));
        assert_eq!(*log.lock().unwrap(), vec![9]);
    }
}

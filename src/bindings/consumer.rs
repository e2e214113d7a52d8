//! Native-side consumer of the command buffer and release queue.
//!
//! The consumer applies commands to a [`NativeHost`] strictly in sequence
//! order, marks them consumed, and then runs every deferred release whose
//! fence has been reached. It can be driven tick by tick with
//! [`NativeConsumer::drain`] or on a dedicated thread with
//! [`NativeConsumer::spawn`].

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use crossbeam_channel::select;

use super::command_buffer::CommandReceiver;
use super::context::ConsumerQueues;
use super::protocol::{TargetId, UiCommand, UiCommandKind};
use super::release_queue::ReleaseReceiver;
use crate::config::ConsumerConfig;
use crate::core::error::{BridgeError, BridgeResult};

/// Receiver of commands on the native side.
pub trait NativeHost: Send {
    fn apply(&mut self, command: &UiCommand);
}

/// Counters for one drain step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    pub applied: usize,
    pub released: usize,
}

pub struct NativeConsumer {
    commands: CommandReceiver,
    releases: ReleaseReceiver,
    host: Box<dyn NativeHost>,
    batch_size: usize,
    thread_name: String,
}

impl NativeConsumer {
    pub fn new(queues: ConsumerQueues, host: Box<dyn NativeHost>, config: &ConsumerConfig) -> Self {
        Self {
            commands: queues.commands,
            releases: queues.releases,
            host,
            batch_size: config.batch_size.max(1),
            thread_name: config.thread_name.clone(),
        }
    }

    fn apply(&mut self, command: UiCommand) {
        tracing::trace!(target: "bridge::consumer", seq = command.seq, id = %command.target, op = command.kind.tag(), "apply");
        self.host.apply(&command);
        self.commands.mark_consumed(command.seq);
    }

    /// Applies every queued command and runs the releases they unblock.
    /// Never blocks.
    pub fn drain(&mut self) -> DrainStats {
        let mut stats = DrainStats::default();
        loop {
            let mut batch = 0;
            while batch < self.batch_size {
                match self.commands.try_recv() {
                    Ok(command) => {
                        self.apply(command);
                        batch += 1;
                    }
                    Err(_) => break,
                }
            }
            stats.applied += batch;
            stats.released += self.releases.flush(self.commands.consumed());
            if batch < self.batch_size {
                return stats;
            }
        }
    }

    /// Blocking loop. Returns once every script-side handle is gone and all
    /// pending releases have run.
    pub fn run(mut self) {
        tracing::debug!(target: "bridge::consumer", thread = %self.thread_name, "consumer started");
        let commands = self.commands.channel().clone();
        let releases = self.releases.channel().clone();
        let mut commands_open = true;
        let mut releases_open = true;

        while commands_open && releases_open {
            select! {
                recv(commands) -> msg => match msg {
                    Ok(command) => self.apply(command),
                    Err(_) => commands_open = false,
                },
                recv(releases) -> msg => match msg {
                    Ok(entry) => self.releases.push(entry),
                    Err(_) => releases_open = false,
                },
            }
            self.releases.flush(self.commands.consumed());
        }

        if commands_open {
            for command in commands.iter() {
                self.apply(command);
                self.releases.flush(self.commands.consumed());
            }
        }
        if releases_open {
            for entry in releases.iter() {
                self.releases.push(entry);
                self.releases.flush(self.commands.consumed());
            }
        }

        // Nothing can be appended any more, every command has been applied.
        let released = self.releases.flush_all();
        tracing::debug!(target: "bridge::consumer", released, "consumer stopped");
    }

    /// Runs [`NativeConsumer::run`] on a named thread.
    pub fn spawn(self) -> BridgeResult<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || self.run())
            .map_err(|e| BridgeError::Consumer(e.to_string()))
    }
}

/// Native element state mirrored from the command stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MirroredElement {
    pub tag: String,
    pub properties: BTreeMap<String, String>,
    pub messages: Vec<String>,
}

/// What a [`MirrorHost`] has seen so far.
#[derive(Debug, Default)]
pub struct MirrorState {
    pub elements: HashMap<TargetId, MirroredElement>,
    pub log: Vec<UiCommand>,
    /// Commands that referenced an identity before its `create`.
    pub orphans: Vec<UiCommand>,
}

/// Host that materializes elements in memory. Cloning shares the state.
#[derive(Debug, Clone, Default)]
pub struct MirrorHost {
    state: Arc<Mutex<MirrorState>>,
}

impl MirrorHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` against the current state.
    pub fn with_state<R>(&self, f: impl FnOnce(&MirrorState) -> R) -> R {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }
}

impl NativeHost for MirrorHost {
    fn apply(&mut self, command: &UiCommand) {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let state = &mut *guard;
        state.log.push(command.clone());

        match &command.kind {
            UiCommandKind::CreateElement { tag } => {
                state.elements.insert(
                    command.target,
                    MirroredElement {
                        tag: tag.clone(),
                        ..Default::default()
                    },
                );
            }
            UiCommandKind::SetProperty { name, value } => {
                match state.elements.get_mut(&command.target) {
                    Some(element) => {
                        element.properties.insert(name.clone(), value.clone());
                    }
                    None => {
                        tracing::error!(target: "bridge::consumer", id = %command.target, "set-property before create");
                        state.orphans.push(command.clone());
                    }
                }
            }
            UiCommandKind::Invoke { method, payload } => {
                match state.elements.get_mut(&command.target) {
                    Some(element) if method == "postMessage" => {
                        element.messages.push(payload.clone());
                    }
                    Some(_) => {
                        tracing::warn!(target: "bridge::consumer", id = %command.target, method = %method, "unknown native method");
                    }
                    None => {
                        tracing::error!(target: "bridge::consumer", id = %command.target, "invoke before create");
                        state.orphans.push(command.clone());
                    }
                }
            }
        }
    }
}

/// Host that only logs what it receives.
#[derive(Debug, Default)]
pub struct LoggingHost;

impl NativeHost for LoggingHost {
    fn apply(&mut self, command: &UiCommand) {
        match &command.kind {
            UiCommandKind::CreateElement { tag } => {
                tracing::info!(target: "bridge::native", seq = command.seq, id = %command.target, tag = %tag, "create");
            }
            UiCommandKind::SetProperty { name, value } => {
                tracing::info!(target: "bridge::native", seq = command.seq, id = %command.target, name = %name, value = %value, "set-property");
            }
            UiCommandKind::Invoke { method, payload } => {
                tracing::info!(target: "bridge::native", seq = command.seq, id = %command.target, method = %method, payload = %payload, "invoke");
            }
        }
    }
}

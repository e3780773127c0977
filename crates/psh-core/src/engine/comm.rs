//! Typed rendezvous channels between the coordinator and the worker ranks.
//!
//! Every exchanged structure has its own [`Outbox`]/[`Inbox`] pair built on a zero-capacity
//! `sync_channel`, so a send blocks until the peer receives it. A peer that disappears
//! surfaces as [`EngineError::Transport`].

use super::config::RunParameters;
use super::error::EngineError;
use super::partition::WorkSlice;
use crate::core::basis::QiClass;
use std::fmt;
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::sync::Arc;

pub struct Outbox<T> {
    peer: usize,
    sender: SyncSender<T>,
}

pub struct Inbox<T> {
    peer: usize,
    receiver: Receiver<T>,
}

/// A rendezvous channel whose failures are attributed to rank `peer`.
pub fn rendezvous<T>(peer: usize) -> (Outbox<T>, Inbox<T>) {
    let (sender, receiver) = sync_channel(0);
    (Outbox { peer, sender }, Inbox { peer, receiver })
}

impl<T> Outbox<T> {
    pub fn send(&self, message: T, expected: &'static str) -> Result<(), EngineError> {
        self.sender.send(message).map_err(|_| EngineError::Transport {
            rank: self.peer,
            expected,
        })
    }
}

impl<T> Inbox<T> {
    pub fn recv(&self, expected: &'static str) -> Result<T, EngineError> {
        self.receiver.recv().map_err(|_| EngineError::Transport {
            rank: self.peer,
            expected,
        })
    }
}

/// Where a rank runs, reported to the coordinator at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    pub rank: usize,
    pub ranks: usize,
    pub threads: usize,
    pub host: String,
}

impl Topology {
    pub fn current(rank: usize, ranks: usize, threads: usize) -> Self {
        let host = std::env::var("HOSTNAME")
            .ok()
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "localhost".to_string());
        Self {
            rank,
            ranks,
            threads,
            host,
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} threads on Node {} of {} on {}",
            self.threads, self.rank, self.ranks, self.host
        )
    }
}

/// Which half of a subset's result vectors a block carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultHalf {
    Primary,
    Partner,
}

/// One contiguous block of partial results: A and B entries of one half of one subset.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialBlock {
    pub rank: usize,
    pub class: QiClass,
    pub half: ResultHalf,
    pub a: Vec<f64>,
    pub b: Vec<f64>,
}

/// The four blocks a rank returns, in the order they are sent.
pub const BLOCK_ORDER: [(QiClass, ResultHalf); 4] = [
    (QiClass::Zero, ResultHalf::Primary),
    (QiClass::Zero, ResultHalf::Partner),
    (QiClass::Positive, ResultHalf::Primary),
    (QiClass::Positive, ResultHalf::Partner),
];

/// The coordinator's ends of the channels to one worker rank.
pub struct RootLink {
    pub rank: usize,
    pub topology: Inbox<Topology>,
    pub params: Outbox<Arc<RunParameters>>,
    pub slice: Outbox<WorkSlice>,
    /// Released once every rank holds its slice.
    pub start: Outbox<()>,
    pub results: Inbox<PartialBlock>,
}

/// A worker rank's ends of its channels to the coordinator.
pub struct WorkerLink {
    pub rank: usize,
    pub ranks: usize,
    pub topology: Outbox<Topology>,
    pub params: Inbox<Arc<RunParameters>>,
    pub slice: Inbox<WorkSlice>,
    pub start: Inbox<()>,
    pub results: Outbox<PartialBlock>,
}

/// The coordinator's side of a wired run.
pub struct RootEndpoints {
    pub links: Vec<RootLink>,
}

/// Connects rank 0 with ranks `1..ranks`.
pub fn wire(ranks: usize) -> (RootEndpoints, Vec<WorkerLink>) {
    let mut links = Vec::with_capacity(ranks.saturating_sub(1));
    let mut workers = Vec::with_capacity(ranks.saturating_sub(1));

    for rank in 1..ranks {
        let (topology_tx, topology_rx) = rendezvous(rank);
        let (params_tx, params_rx) = rendezvous(0);
        let (slice_tx, slice_rx) = rendezvous(0);
        let (start_tx, start_rx) = rendezvous(0);
        let (results_tx, results_rx) = rendezvous(rank);
        links.push(RootLink {
            rank,
            topology: topology_rx,
            params: params_tx,
            slice: slice_tx,
            start: start_tx,
            results: results_rx,
        });
        workers.push(WorkerLink {
            rank,
            ranks,
            topology: topology_tx,
            params: params_rx,
            slice: slice_rx,
            start: start_rx,
            results: results_tx,
        });
    }

    (RootEndpoints { links }, workers)
}

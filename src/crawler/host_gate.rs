//! Per-host admission control
//!
//! Every distinct host gets one gate bounding how many downloads to that
//! host run at once. Admission never blocks: a job that cannot run
//! immediately queues inside the gate and is handed to the download pool
//! when a slot frees up. Within one host jobs run in submission order;
//! different hosts are independent.

use crate::crawler::pool::{Job, JobSender};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Admission controller for a single host
///
/// Count bookkeeping and queue mutation happen under one mutex, so a job is
/// always either occupying a slot or sitting in `pending`, never both.
pub struct HostGate {
    limit: usize,
    downloads: JobSender,
    inner: Mutex<GateInner>,
}

struct GateInner {
    active: usize,
    pending: VecDeque<Job>,
}

impl HostGate {
    fn new(limit: usize, downloads: JobSender) -> Self {
        Self {
            limit,
            downloads,
            inner: Mutex::new(GateInner {
                active: 0,
                pending: VecDeque::new(),
            }),
        }
    }

    /// Submits a download job, running it now or queueing it FIFO
    pub fn submit(&self, job: Job) {
        let mut inner = self.inner.lock().unwrap();
        if inner.active < self.limit {
            inner.active += 1;
            self.dispatch(job);
        } else {
            inner.pending.push_back(job);
        }
    }

    /// Releases the slot held by a finishing download
    ///
    /// Called exactly once per admitted job. If another job is queued it
    /// takes over the freed slot, keeping the active count unchanged.
    pub fn release(&self) {
        let mut inner = self.inner.lock().unwrap();
        match inner.pending.pop_front() {
            Some(job) => self.dispatch(job),
            None => inner.active -= 1,
        }
    }

    fn dispatch(&self, job: Job) {
        if self.downloads.send(job).is_err() {
            tracing::debug!("download job discarded: pool is shut down");
        }
    }

    #[cfg(test)]
    fn active(&self) -> usize {
        self.inner.lock().unwrap().active
    }

    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.inner.lock().unwrap().pending.len()
    }
}

/// Lazily-created registry of one gate per host
///
/// Gates live as long as the crawler, since the same host recurs across
/// levels and crawl invocations. Creation is atomic under the registry
/// lock: concurrent discovery of the same host yields one gate.
pub struct HostGates {
    per_host_limit: usize,
    downloads: JobSender,
    gates: Mutex<HashMap<String, Arc<HostGate>>>,
}

impl HostGates {
    pub fn new(per_host_limit: usize, downloads: JobSender) -> Self {
        Self {
            per_host_limit,
            downloads,
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the gate for `host`, creating it on first use
    pub fn gate_for(&self, host: &str) -> Arc<HostGate> {
        let mut gates = self.gates.lock().unwrap();
        Arc::clone(gates.entry(host.to_string()).or_insert_with(|| {
            Arc::new(HostGate::new(self.per_host_limit, self.downloads.clone()))
        }))
    }
}

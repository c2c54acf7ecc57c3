//! Shared test doubles for the install queue

#![allow(dead_code)]

use projsetup::{PackageIdentifier, PackageService, RequestHandle, RequestStatus};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

/// How a scripted package behaves: completes on the n-th check with an outcome
#[derive(Debug, Clone)]
pub struct Script {
    pub polls: u32,
    pub outcome: Result<String, String>,
}

impl Script {
    pub fn success(polls: u32, resolved: &str) -> Self {
        Self {
            polls,
            outcome: Ok(resolved.to_string()),
        }
    }

    pub fn failure(polls: u32, message: &str) -> Self {
        Self {
            polls,
            outcome: Err(message.to_string()),
        }
    }
}

#[derive(Debug, Default)]
pub struct ServiceLog {
    pub scripts: HashMap<String, Script>,
    /// (identifier, time of submit)
    pub submissions: Vec<(String, Instant)>,
    /// (identifier, time its terminal status was read)
    pub completions: Vec<(String, Instant)>,
    pub in_flight: bool,
    pub overlapped: bool,
    pub status_reads: usize,
}

/// Package service that follows per-identifier scripts and records every call.
///
/// Unscripted identifiers succeed on the first check with `<id>-resolved`.
#[derive(Debug, Clone, Default)]
pub struct MockService {
    pub log: Arc<Mutex<ServiceLog>>,
}

impl MockService {
    pub fn with_scripts<'a>(scripts: impl IntoIterator<Item = (&'a str, Script)>) -> Self {
        let service = Self::default();
        service.log.lock().unwrap().scripts = scripts
            .into_iter()
            .map(|(id, script)| (id.to_string(), script))
            .collect();
        service
    }

    pub fn submitted_ids(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .submissions
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn overlapped(&self) -> bool {
        self.log.lock().unwrap().overlapped
    }
}

pub struct MockHandle {
    id: String,
    polls_left: u32,
    outcome: Result<String, String>,
    log: Arc<Mutex<ServiceLog>>,
}

impl PackageService for MockService {
    type Handle = MockHandle;

    fn submit(&self, id: &PackageIdentifier) -> MockHandle {
        let mut log = self.log.lock().unwrap();
        if log.in_flight {
            log.overlapped = true;
        }
        log.in_flight = true;
        log.submissions.push((id.to_string(), Instant::now()));

        let script = log
            .scripts
            .get(id.as_str())
            .cloned()
            .unwrap_or_else(|| Script::success(1, &format!("{id}-resolved")));

        MockHandle {
            id: id.to_string(),
            polls_left: script.polls.max(1),
            outcome: script.outcome,
            log: Arc::clone(&self.log),
        }
    }
}

impl RequestHandle for MockHandle {
    fn is_complete(&mut self) -> bool {
        self.polls_left = self.polls_left.saturating_sub(1);
        self.polls_left == 0
    }

    fn status(&self) -> RequestStatus {
        if self.polls_left > 0 {
            return RequestStatus::InProgress;
        }

        let mut log = self.log.lock().unwrap();
        log.status_reads += 1;
        log.in_flight = false;
        log.completions.push((self.id.clone(), Instant::now()));

        match self.outcome {
            Ok(_) => RequestStatus::Success,
            Err(_) => RequestStatus::Failure,
        }
    }

    fn resolved_id(&self) -> Option<String> {
        self.outcome.as_ref().ok().cloned()
    }

    fn error_message(&self) -> Option<String> {
        self.outcome.as_ref().err().cloned()
    }
}

/// Drain everything currently buffered on an event stream
pub fn collect_events(events: &mut projsetup::InstallEvents) -> Vec<projsetup::InstallEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

//! Package service contract and the manifest-backed implementation
//!
//! The install queue only ever talks to a [`PackageService`]: `submit` hands
//! back a [`RequestHandle`] immediately, and the caller polls the handle until
//! it reports completion. There is no callback and no blocking wait.
//!
//! [`ManifestPackageService`] records each package as a dependency in the
//! project's `Packages/manifest.json`. The work runs on a worker thread; the
//! handle checks a oneshot channel for the result.

use crate::types::PackageIdentifier;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use strum::Display;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::debug;

/// Terminal or in-progress status of a request.
///
/// Services with several failure codes map all of them to `Failure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RequestStatus {
    InProgress,
    Success,
    Failure,
}

/// Correlation handle for one submitted package
pub trait RequestHandle {
    /// Check for completion; must not block
    fn is_complete(&mut self) -> bool;

    fn status(&self) -> RequestStatus;

    /// Normalized package id, available once `status` is `Success`
    fn resolved_id(&self) -> Option<String>;

    /// Failure reason, available once `status` is `Failure`
    fn error_message(&self) -> Option<String>;
}

/// External service that resolves and installs packages
pub trait PackageService: Send + Sync + 'static {
    type Handle: RequestHandle + Send + 'static;

    /// Start installing `id` and return at once
    fn submit(&self, id: &PackageIdentifier) -> Self::Handle;
}

/// Result of a request: resolved id or error message
pub type RequestOutcome = std::result::Result<String, String>;

/// Handle whose result arrives over a oneshot channel
#[derive(Debug)]
pub struct ChannelRequest {
    rx: oneshot::Receiver<RequestOutcome>,
    outcome: Option<RequestOutcome>,
}

impl ChannelRequest {
    pub fn new(rx: oneshot::Receiver<RequestOutcome>) -> Self {
        Self { rx, outcome: None }
    }
}

impl RequestHandle for ChannelRequest {
    fn is_complete(&mut self) -> bool {
        if self.outcome.is_some() {
            return true;
        }
        match self.rx.try_recv() {
            Ok(outcome) => self.outcome = Some(outcome),
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Closed) => {
                self.outcome = Some(Err("Package service worker exited without a result".to_string()));
            }
        }
        true
    }

    fn status(&self) -> RequestStatus {
        match &self.outcome {
            None => RequestStatus::InProgress,
            Some(Ok(_)) => RequestStatus::Success,
            Some(Err(_)) => RequestStatus::Failure,
        }
    }

    fn resolved_id(&self) -> Option<String> {
        self.outcome.as_ref()?.as_ref().ok().cloned()
    }

    fn error_message(&self) -> Option<String> {
        self.outcome.as_ref()?.as_ref().err().cloned()
    }
}

/// Installs packages by adding them to `Packages/manifest.json`
#[derive(Debug, Clone)]
pub struct ManifestPackageService {
    manifest_path: PathBuf,
}

impl ManifestPackageService {
    pub fn for_project(project_root: &Path) -> Self {
        Self {
            manifest_path: project_root.join("Packages").join("manifest.json"),
        }
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }
}

impl PackageService for ManifestPackageService {
    type Handle = ChannelRequest;

    fn submit(&self, id: &PackageIdentifier) -> ChannelRequest {
        let (tx, rx) = oneshot::channel();
        let manifest_path = self.manifest_path.clone();
        let id = id.clone();

        thread::spawn(move || {
            let outcome = add_dependency(&manifest_path, &id);
            // Receiver dropped means nobody is waiting any more
            let _ = tx.send(outcome);
        });

        ChannelRequest::new(rx)
    }
}

fn add_dependency(manifest_path: &Path, id: &PackageIdentifier) -> RequestOutcome {
    let (name, source) = resolve_identifier(id.as_str())?;

    let mut manifest = if manifest_path.exists() {
        let content = fs::read_to_string(manifest_path)
            .map_err(|e| format!("Cannot read {}: {e}", manifest_path.display()))?;
        serde_json::from_str::<Value>(&content)
            .map_err(|e| format!("Invalid manifest {}: {e}", manifest_path.display()))?
    } else {
        Value::Object(Map::new())
    };

    let root = manifest
        .as_object_mut()
        .ok_or_else(|| format!("Manifest {} is not a JSON object", manifest_path.display()))?;
    let dependencies = root
        .entry("dependencies")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| "Manifest \"dependencies\" is not a JSON object".to_string())?;
    dependencies.insert(name.clone(), Value::String(source.clone()));

    if let Some(parent) = manifest_path.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("Cannot create {}: {e}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&manifest).map_err(|e| e.to_string())?;
    fs::write(manifest_path, json)
        .map_err(|e| format!("Cannot write {}: {e}", manifest_path.display()))?;

    debug!("Added {} = {} to {}", name, source, manifest_path.display());
    Ok(format!("{name}@{source}"))
}

const URL_PREFIXES: &[&str] = &["git+", "git:", "ssh://", "file:", "https://", "http://"];

/// Split an identifier into `(package name, manifest source)`.
///
/// URL identifiers take their name from the `?path=` qualifier when present,
/// otherwise from the repository path. `name@version` identifiers split at the
/// last `@`.
pub fn resolve_identifier(id: &str) -> std::result::Result<(String, String), String> {
    let id = id.trim();
    let unresolvable = || format!("Unable to resolve package identifier: {id}");

    if URL_PREFIXES.iter().any(|prefix| id.starts_with(prefix)) {
        let without_fragment = id.split('#').next().unwrap_or(id);
        let (location, query) = match without_fragment.split_once('?') {
            Some((location, query)) => (location, Some(query)),
            None => (without_fragment, None),
        };

        let sub_path = query.and_then(|q| {
            q.split('&')
                .find_map(|pair| pair.strip_prefix("path="))
                .filter(|p| !p.is_empty())
        });

        let name = last_segment(sub_path.unwrap_or(location))
            .map(|seg| seg.trim_end_matches(".git").to_lowercase())
            .filter(|seg| !seg.is_empty() && !seg.contains(':'))
            .ok_or_else(unresolvable)?;

        return Ok((name, id.to_string()));
    }

    match id.rsplit_once('@') {
        Some((name, version))
            if !name.is_empty()
                && !version.is_empty()
                && !id.contains(char::is_whitespace)
                && !name.contains(':') =>
        {
            Ok((name.to_string(), version.to_string()))
        }
        _ => Err(unresolvable()),
    }
}

fn last_segment(path: &str) -> Option<&str> {
    path.trim_end_matches('/').rsplit('/').next()
}

use async_trait::async_trait;
use cloudsweep_cloud::{
    CloudError, DeleteOutcome, Deleter, Enumerator, ResourceDescriptor, ResourceKind, ResourceSet,
    Result,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// What a scripted enumerator returns on one call
#[derive(Clone)]
pub enum Listing {
    Keys(Vec<&'static str>),
    Fail(&'static str),
    /// Never return
    Hang,
}

/// Enumerator that replays a script, repeating the last entry forever
pub struct ScriptedEnumerator {
    kind: ResourceKind,
    script: Vec<Listing>,
    calls: AtomicUsize,
}

impl ScriptedEnumerator {
    pub fn new(kind: ResourceKind, script: Vec<Listing>) -> Arc<Self> {
        assert!(!script.is_empty(), "script must not be empty");
        Arc::new(Self {
            kind,
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Enumerator for ScriptedEnumerator {
    async fn enumerate(&self) -> Result<ResourceSet> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let step = &self.script[call.min(self.script.len() - 1)];
        match step {
            Listing::Keys(keys) => Ok(keys
                .iter()
                .map(|key| ResourceDescriptor::new(self.kind, *key, format!("{}.mycluster.example.com", key)))
                .collect()),
            Listing::Fail(message) => Err(CloudError::ApiError(message.to_string())),
            Listing::Hang => std::future::pending().await,
        }
    }
}

/// What a scripted deleter does for one call
#[derive(Clone)]
pub enum Outcome {
    Requested,
    Gone,
    Transient,
    Fail(&'static str),
    Invalid,
    /// Trip the cancellation token, then report the delete as requested
    CancelRun,
    /// Never return
    Hang,
}

/// Deleter that replays a per-key script, repeating the last entry forever.
/// Keys without a script report `Requested`.
pub struct ScriptedDeleter {
    scripts: HashMap<&'static str, Vec<Outcome>>,
    cancel: Option<CancellationToken>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedDeleter {
    pub fn new(scripts: Vec<(&'static str, Vec<Outcome>)>) -> Arc<Self> {
        Self::with_cancel(scripts, None)
    }

    pub fn with_cancel(
        scripts: Vec<(&'static str, Vec<Outcome>)>,
        cancel: Option<CancellationToken>,
    ) -> Arc<Self> {
        Arc::new(Self {
            scripts: scripts.into_iter().collect(),
            cancel,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Keys passed to `delete`, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, key: &str) -> usize {
        self.calls().iter().filter(|k| k.as_str() == key).count()
    }
}

#[async_trait]
impl Deleter for ScriptedDeleter {
    async fn delete(&self, item: &ResourceDescriptor) -> Result<DeleteOutcome> {
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            let attempt = calls.iter().filter(|k| **k == item.key).count();
            calls.push(item.key.clone());
            attempt
        };

        let outcome = self
            .scripts
            .get(item.key.as_str())
            .map(|script| script[attempt.min(script.len() - 1)].clone())
            .unwrap_or(Outcome::Requested);

        match outcome {
            Outcome::Requested => Ok(DeleteOutcome::Requested),
            Outcome::Gone => Ok(DeleteOutcome::AlreadyGone),
            Outcome::Transient => Ok(DeleteOutcome::Transient("internal server error".to_string())),
            Outcome::Fail(message) => Err(CloudError::ApiError(message.to_string())),
            Outcome::Invalid => Err(CloudError::InvalidInput(format!("bad id {}", item.key))),
            Outcome::CancelRun => {
                if let Some(token) = &self.cancel {
                    token.cancel();
                }
                Ok(DeleteOutcome::Requested)
            }
            Outcome::Hang => std::future::pending().await,
        }
    }
}

pub fn sorted_keys(items: Vec<ResourceDescriptor>) -> Vec<String> {
    let mut keys: Vec<String> = items.into_iter().map(|d| d.key).collect();
    keys.sort();
    keys
}

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;

use crate::detect::backend::CandidateSource;
use crate::detect::result::Candidate;
use crate::frame::Frame;

/// Back-end that replays a fixed script. Used in tests and dry runs.
///
/// Once the script is exhausted it keeps returning the `repeat` set (empty by
/// default).
pub struct ScriptedBackend {
    script: VecDeque<Result<Vec<Candidate>>>,
    repeat: Vec<Candidate>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedBackend {
    pub fn from_script(script: Vec<Result<Vec<Candidate>>>) -> Self {
        Self {
            script: script.into(),
            repeat: Vec::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Same candidates on every frame.
    pub fn repeating(candidates: Vec<Candidate>) -> Self {
        Self {
            script: VecDeque::new(),
            repeat: candidates,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared handle counting `candidates()` calls, still readable after the
    /// backend has been moved into a detector.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl CandidateSource for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn candidates(&mut self, _frame: &Frame) -> Result<Vec<Candidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.pop_front() {
            Some(step) => step,
            None => Ok(self.repeat.clone()),
        }
    }
}

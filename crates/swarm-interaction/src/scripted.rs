//! Deterministic provider that replays a prepared transcript.
//!
//! Used by tests and by the CLI `replay` command to drive sessions without
//! a network.

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use swarm_core::Reference;
use swarm_core::session::{QueryRequest, SessionFailure, StreamUpdate};
use swarm_core::task::TaskMutation;

use crate::provider::{StreamProvider, UpdateStream};

/// Replays a fixed sequence of updates for every request.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    steps: Vec<Result<StreamUpdate, SessionFailure>>,
    open_failure: Option<SessionFailure>,
    delay: Option<Duration>,
    opened: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    /// Replays exactly these steps.
    pub fn new(steps: Vec<Result<StreamUpdate, SessionFailure>>) -> Self {
        Self {
            steps,
            ..Self::default()
        }
    }

    /// Splits `transcript` into fragments of `chunk_size` characters and
    /// emits one cumulative update per fragment; the last one is final.
    pub fn from_transcript(transcript: &str, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        let mut ends: Vec<usize> = transcript
            .char_indices()
            .map(|(idx, _)| idx)
            .skip(chunk_size)
            .step_by(chunk_size)
            .collect();
        ends.push(transcript.len());

        let mut steps: Vec<_> = ends
            .into_iter()
            .map(|end| Ok(StreamUpdate::text(&transcript[..end])))
            .collect();
        if let Some(Ok(last)) = steps.last_mut() {
            last.is_final = true;
        }
        Self::new(steps)
    }

    /// Attaches task mutations to the update at `index`.
    pub fn with_mutations_at(mut self, index: usize, mutations: Vec<TaskMutation>) -> Self {
        if let Some(Ok(update)) = self.steps.get_mut(index) {
            update.task_mutations.extend(mutations);
        }
        self
    }

    /// Sends `references` as the reference set from update `index` onwards.
    pub fn with_references_from(mut self, index: usize, references: Vec<Reference>) -> Self {
        for update in self.steps.iter_mut().skip(index).flatten() {
            update.references = references.clone();
        }
        self
    }

    /// Keeps the first `count` updates, then fails with `failure`.
    pub fn failing_after(mut self, count: usize, failure: SessionFailure) -> Self {
        self.steps.truncate(count);
        for update in self.steps.iter_mut().flatten() {
            update.is_final = false;
        }
        self.steps.push(Err(failure));
        self
    }

    /// Makes `open` itself fail.
    pub fn failing_on_open(mut self, failure: SessionFailure) -> Self {
        self.open_failure = Some(failure);
        self
    }

    /// Waits `delay` before every update.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many streams have been opened.
    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn steps(&self) -> &[Result<StreamUpdate, SessionFailure>] {
        &self.steps
    }
}

#[async_trait]
impl StreamProvider for ScriptedProvider {
    async fn open(&self, request: &QueryRequest) -> Result<UpdateStream, SessionFailure> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = &self.open_failure {
            return Err(failure.clone());
        }

        tracing::debug!(
            "[ScriptedProvider] replaying {} steps for query={:?}",
            self.steps.len(),
            request.query
        );

        let delay = self.delay;
        Ok(stream::iter(self.steps.clone())
            .then(move |step| async move {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                step
            })
            .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_core::session::FailureKind;
    use swarm_core::task::TaskStatus;

    fn texts(provider: &ScriptedProvider) -> Vec<String> {
        provider
            .steps()
            .iter()
            .map(|step| step.as_ref().unwrap().raw_text.clone())
            .collect()
    }

    #[test]
    fn test_transcript_fragments_are_cumulative() {
        let provider = ScriptedProvider::from_transcript("abcdefg", 3);
        assert_eq!(texts(&provider), vec!["abc", "abcdef", "abcdefg"]);

        let flags: Vec<bool> = provider
            .steps()
            .iter()
            .map(|step| step.as_ref().unwrap().is_final)
            .collect();
        assert_eq!(flags, vec![false, false, true]);
    }

    #[test]
    fn test_transcript_splits_on_char_boundaries() {
        let provider = ScriptedProvider::from_transcript("äöü€", 1);
        assert_eq!(texts(&provider), vec!["ä", "äö", "äöü", "äöü€"]);

        let provider = ScriptedProvider::from_transcript("ab", 10);
        assert_eq!(texts(&provider), vec!["ab"]);
    }

    #[test]
    fn test_failing_after_clears_final() {
        let provider = ScriptedProvider::from_transcript("abcdef", 2)
            .failing_after(2, SessionFailure::new(FailureKind::Network, "reset"));

        let steps = provider.steps();
        assert_eq!(steps.len(), 3);
        assert!(!steps[1].as_ref().unwrap().is_final);
        assert_eq!(steps[2].as_ref().unwrap_err().kind, FailureKind::Network);
    }

    #[tokio::test]
    async fn test_open_replays_steps() {
        let provider = ScriptedProvider::from_transcript("hello\n", 3)
            .with_mutations_at(0, vec![TaskMutation::create("t1", "Say hi", TaskStatus::Pending)])
            .with_references_from(1, vec![Reference::web("https://a.example", "A")]);

        let updates: Vec<_> = provider
            .open(&QueryRequest::new("q"))
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(provider.open_count(), 1);
        assert_eq!(updates.len(), 2);
        let first = updates[0].as_ref().unwrap();
        assert_eq!(first.task_mutations.len(), 1);
        assert!(first.references.is_empty());
        assert_eq!(updates[1].as_ref().unwrap().references.len(), 1);
    }

    #[tokio::test]
    async fn test_open_failure() {
        let provider = ScriptedProvider::default()
            .failing_on_open(SessionFailure::new(FailureKind::Unauthorized, "bad key"));
        let result = provider.open(&QueryRequest::new("q")).await;
        assert_eq!(result.err().unwrap().kind, FailureKind::Unauthorized);
        assert_eq!(provider.open_count(), 1);
    }
}

use dashmap::DashMap;
use salesvoice_db::models::{TranscriptEntry, Verdict};

/// Process-wide append-only transcript buffer, keyed by session id.
/// Created once at startup; an entry appears on a session's first utterance
/// and is removed by finalization. There is no other expiry: a process
/// restart loses unfinalized buffers, which is why every append is also
/// mirrored to the durable store by the ingest path.
///
/// Per-session order is arrival order at this process, which is not
/// guaranteed to equal `sent_ts` order across speakers.
pub struct UtteranceBuffer {
    entries: DashMap<String, Vec<TranscriptEntry>>,
}

impl UtteranceBuffer {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Appends to the session's buffer, returning the 1-based count of
    /// buffered utterances for that session after the insert.
    pub fn append(&self, session_id: &str, entry: TranscriptEntry) -> usize {
        let mut entries = self.entries.entry(session_id.to_string()).or_default();
        entries.push(entry);
        entries.len()
    }

    /// What is currently buffered for the session; empty if unknown.
    pub fn snapshot(&self, session_id: &str) -> Vec<TranscriptEntry> {
        self.entries
            .get(session_id)
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    pub fn len(&self, session_id: &str) -> usize {
        self.entries.get(session_id).map(|e| e.len()).unwrap_or(0)
    }

    /// Removes the session's buffer entry; no-op if absent.
    pub fn clear(&self, session_id: &str) {
        self.entries.remove(session_id);
    }

    /// (session_id, buffered count) for every live session.
    pub fn sessions(&self) -> Vec<(String, usize)> {
        self.entries
            .iter()
            .map(|r| (r.key().clone(), r.value().len()))
            .collect()
    }

    pub fn session_count(&self) -> usize {
        self.entries.len()
    }
}

impl Default for UtteranceBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Latest per-utterance sentiment verdict per session. Overwritten on each
/// classified user utterance, read by status endpoints, dropped on finalize.
/// Advisory only; never durable on its own.
pub struct VerdictCache {
    verdicts: DashMap<String, Verdict>,
}

impl VerdictCache {
    pub fn new() -> Self {
        Self {
            verdicts: DashMap::new(),
        }
    }

    pub fn store(&self, session_id: &str, verdict: Verdict) {
        self.verdicts.insert(session_id.to_string(), verdict);
    }

    pub fn latest(&self, session_id: &str) -> Option<Verdict> {
        self.verdicts.get(session_id).map(|v| v.clone())
    }

    pub fn clear(&self, session_id: &str) {
        self.verdicts.remove(session_id);
    }
}

impl Default for VerdictCache {
    fn default() -> Self {
        Self::new()
    }
}

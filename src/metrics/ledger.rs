use std::collections::BTreeMap;

use super::types::ErrorEntry;

/// Collapses repeated failures into one row per (method, name,
/// normalized exception) with an occurrence count. Flushing resets the
/// ledger so each batch carries only new occurrences.
#[derive(Debug)]
pub struct ErrorLedger {
    execution_id: String,
    entries: BTreeMap<String, ErrorEntry>,
}

impl ErrorLedger {
    #[must_use]
    pub fn new(execution_id: String) -> Self {
        Self {
            execution_id,
            entries: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, method: &str, name: &str, exception: &str) {
        self.record_occurrences(method, name, exception, 1);
    }

    pub fn record_occurrences(&mut self, method: &str, name: &str, exception: &str, count: u64) {
        let normalized = normalize_exception(exception);
        let key = format!("{method}/{name}/{normalized}");
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.occurrences = entry.occurrences.saturating_add(count);
        } else {
            self.entries.insert(
                key,
                ErrorEntry {
                    execution_id: self.execution_id.clone(),
                    method: method.to_owned(),
                    name: name.to_owned(),
                    exception: normalized,
                    occurrences: count,
                },
            );
        }
    }

    /// Takes every accumulated entry, leaving the ledger empty.
    pub fn flush(&mut self) -> Vec<ErrorEntry> {
        std::mem::take(&mut self.entries).into_values().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Strips volatile `0x...` hex fragments (addresses, object ids) so the
/// same failure dedupes to one ledger row regardless of where it
/// happened in memory.
#[must_use]
pub fn normalize_exception(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '0' && matches!(chars.peek(), Some('x' | 'X')) {
            let mut lookahead = chars.clone();
            let _ = lookahead.next();
            let mut digits = 0usize;
            while lookahead.next_if(char::is_ascii_hexdigit).is_some() {
                digits += 1;
            }
            if digits > 0 {
                out.push_str("0x?");
                chars = lookahead;
                continue;
            }
        }
        out.push(ch);
    }
    out
}

//! Incremental filter that strips hidden reasoning spans (`<think>…</think>`)
//! from streamed model output.
//!
//! Fragments arrive with arbitrary boundaries, so either marker may be split
//! across two or more of them. The filter holds back only the longest buffer
//! suffix that could still grow into a marker; everything else is decided as
//! soon as it arrives.
//!
//! At end of stream an unterminated hidden span is dropped, while a held-back
//! partial start marker is flushed verbatim.

use super::config::HiddenMarkers;

/// Per-stream filter state. Create one per streamed reply; never share.
#[derive(Debug, Clone)]
pub struct ThinkFilter {
    markers: HiddenMarkers,
    in_hidden_block: bool,
    pending: String,
}

impl ThinkFilter {
    pub fn new(markers: &HiddenMarkers) -> Self {
        Self {
            markers: markers.clone(),
            in_hidden_block: false,
            pending: String::new(),
        }
    }

    /// Feed one fragment; returns the text that is now known to be visible
    /// (possibly empty).
    pub fn push(&mut self, fragment: &str) -> String {
        // An empty start marker would match everywhere
        if self.markers.start.is_empty() {
            return fragment.to_string();
        }

        self.pending.push_str(fragment);
        let mut visible = String::new();

        loop {
            if self.in_hidden_block {
                let end = self.markers.end.as_str();
                if let Some(pos) = self.pending.find(end) {
                    self.pending.drain(..pos + end.len());
                    self.in_hidden_block = false;
                    continue;
                }
                // Hidden text is dropped; keep only a possible split end marker
                let keep = partial_marker_suffix(&self.pending, end);
                let cut = self.pending.len() - keep;
                self.pending.drain(..cut);
                break;
            }

            let start = self.markers.start.as_str();
            if let Some(pos) = self.pending.find(start) {
                visible.push_str(&self.pending[..pos]);
                self.pending.drain(..pos + start.len());
                self.in_hidden_block = true;
                continue;
            }

            let keep = partial_marker_suffix(&self.pending, start);
            let cut = self.pending.len() - keep;
            visible.push_str(&self.pending[..cut]);
            self.pending.drain(..cut);
            break;
        }

        visible
    }

    /// End of stream. Returns held-back visible text and resets the filter.
    pub fn finish(&mut self) -> String {
        let pending = std::mem::take(&mut self.pending);
        let was_hidden = std::mem::replace(&mut self.in_hidden_block, false);
        if was_hidden {
            String::new()
        } else {
            pending
        }
    }

    /// Filter a complete text in one go.
    pub fn filter_complete(markers: &HiddenMarkers, text: &str) -> String {
        let mut filter = Self::new(markers);
        let mut out = filter.push(text);
        out.push_str(&filter.finish());
        out
    }

    pub fn in_hidden_block(&self) -> bool {
        self.in_hidden_block
    }
}

/// Length in bytes of the longest suffix of `buffer` that is a strict prefix
/// of `marker`.
fn partial_marker_suffix(buffer: &str, marker: &str) -> usize {
    let max = buffer.len().min(marker.len().saturating_sub(1));
    (1..=max)
        .rev()
        .find(|&k| marker.is_char_boundary(k) && buffer.ends_with(&marker[..k]))
        .unwrap_or(0)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

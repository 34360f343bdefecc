//! Grounding metadata extraction.
//!
//! Streamed responses repeat and extend `groundingMetadata` as the answer
//! grows, so references are collected across chunks and deduplicated by URI.

use serde_json::Value;
use std::collections::HashSet;
use swarm_core::Reference;

/// Accumulates the references seen so far in one response.
#[derive(Debug, Default)]
pub struct ReferenceCollector {
    seen: HashSet<String>,
    references: Vec<Reference>,
}

impl ReferenceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects references from one response chunk. Returns `true` if any
    /// were new.
    pub fn collect(&mut self, root: &Value) -> bool {
        let before = self.references.len();

        let candidates = match root.get("candidates").and_then(|c| c.as_array()) {
            Some(list) => list,
            None => return false,
        };

        for candidate in candidates {
            let chunks = match candidate
                .get("groundingMetadata")
                .and_then(|metadata| metadata.get("groundingChunks"))
                .and_then(|chunks| chunks.as_array())
            {
                Some(list) => list,
                None => continue,
            };

            for chunk in chunks {
                if let Some(reference) = web_reference(chunk).or_else(|| map_reference(chunk)) {
                    if self.seen.insert(reference.uri.clone()) {
                        self.references.push(reference);
                    }
                }
            }
        }

        self.references.len() > before
    }

    /// Every reference collected so far, in first-seen order.
    pub fn references(&self) -> &[Reference] {
        &self.references
    }
}

fn web_reference(chunk: &Value) -> Option<Reference> {
    let web = chunk
        .get("web")
        .or_else(|| chunk.get("webSearch"))
        .or_else(|| chunk.get("retrievedReference"))?;

    let uri = web
        .get("uri")
        .or_else(|| web.get("url"))
        .and_then(|v| v.as_str())?;
    let title = web
        .get("title")
        .or_else(|| web.get("pageTitle"))
        .and_then(|v| v.as_str())
        .unwrap_or(uri);

    Some(Reference::web(uri, title))
}

fn map_reference(chunk: &Value) -> Option<Reference> {
    let place = chunk.get("maps")?;

    let uri = match place.get("uri").and_then(|v| v.as_str()) {
        Some(uri) => uri.to_string(),
        None => {
            let place_id = place.get("placeId").and_then(|v| v.as_str())?;
            format!("https://www.google.com/maps/place/?q=place_id:{place_id}")
        }
    };
    let title = place
        .get("title")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| uri.clone());

    Some(Reference::map(uri, title))
}

// ai
//! 📦 Common data structures — the building blocks of factoid
//!
//! 🎬 COLD OPEN — INT. SOMEBODY'S LAPTOP — 2:13 AM
//!
//! Six requests leave the building at once. They do not know each other.
//! They do not come back in the order they left. One of them learns that
//! a group of owls is called a parliament. None of them will ever forget it.
//!
//! 🦆
//!
//! This module defines the two structs that everything else pushes around:
//! one [`Fact`], and the [`FactCollection`] they pile into on the way to disk.

use serde::{Deserialize, Serialize};

/// 🎯 A singular `Fact` — one fetched item, four strings, zero opinions.
///
/// Field order here IS the field order on disk. serde serializes in declaration
/// order, so shuffling these lines is a breaking change to the output file.
/// Unknown fields in the upstream response are ignored (the API sends
/// `language` and `permalink` too, and we simply do not care).
/// A missing field, on the other hand, is a decode failure. No field, no fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    /// 🏷️ upstream identifier. opaque. we never parse it, we just carry it.
    pub id: String,
    /// 📜 the fact itself, the whole reason we're here
    pub text: String,
    /// 📚 where the fact claims to come from
    pub source: String,
    /// 🔗 and a link, so you can go argue with the source directly
    pub source_url: String,
}

impl Fact {
    /// 🏗️ Convenience constructor, mostly so tests don't drown in `String::from`.
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        source: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            source: source.into(),
            source_url: source_url.into(),
        }
    }
}

/// 📦 The ordered pile of facts for one run.
///
/// Order = arrival order on the aggregation channel, NOT launch order.
/// Fetch latencies vary, so the worker that left first may well come home last.
/// Once the aggregator hands this over it is frozen: nobody pushes after the drain.
///
/// Serializes as `{"facts": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactCollection {
    pub facts: Vec<Fact>,
}

impl FactCollection {
    /// 🏗️ An empty collection, with room for `capacity` arrivals.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            facts: Vec::with_capacity(capacity),
        }
    }

    /// 📥 Append one arrival at the back. The only way this thing grows.
    pub(crate) fn push(&mut self, fact: Fact) {
        self.facts.push(fact);
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// 🔢 The ids in collection order. Tests love this one.
    pub fn ids(&self) -> Vec<&str> {
        self.facts.iter().map(|fact| fact.id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn the_one_where_extra_upstream_fields_are_politely_ignored() -> Result<()> {
        // 🧪 the real API sends language + permalink. we shrug and move on.
        let raw = r#"{
            "id": "abc123",
            "text": "Owls don't have eyeballs.",
            "source": "djtech.net",
            "source_url": "http://www.djtech.net/humor/useless_facts.htm",
            "language": "en",
            "permalink": "https://uselessfacts.jsph.pl/api/v2/facts/abc123"
        }"#;
        let fact: Fact = serde_json::from_str(raw)?;
        assert_eq!(fact.id, "abc123");
        assert_eq!(fact.source, "djtech.net");
        Ok(())
    }

    #[test]
    fn the_one_where_a_missing_field_is_not_a_fact() {
        // 🧪 no source_url, no service
        let raw = r#"{"id":"x","text":"t","source":"s"}"#;
        let decoded = serde_json::from_str::<Fact>(raw);
        assert!(decoded.is_err(), "💀 a fact without source_url should not decode");
    }

    #[test]
    fn the_one_where_the_collection_keeps_arrival_order() {
        let mut collection = FactCollection::with_capacity(3);
        assert!(collection.is_empty());
        collection.push(Fact::new("c", "", "", ""));
        collection.push(Fact::new("a", "", "", ""));
        collection.push(Fact::new("b", "", "", ""));
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.ids(), vec!["c", "a", "b"]);
    }
}

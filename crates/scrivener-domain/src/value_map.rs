//! Flat path → value map produced from generated output

use crate::{DocNode, FieldPath, Segment};
use serde_json::{Map, Value};

/// Flat mapping from field path (bare or indexed) to a generated value
///
/// Entries keep the order in which the provider emitted them. The content
/// reconstructor drains the map as it matches entries, so whatever remains
/// afterwards is exactly the set of unmatched keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueMap {
    entries: Vec<(String, DocNode)>,
}

impl ValueMap {
    /// Empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value
    pub fn insert(&mut self, key: impl Into<String>, value: DocNode) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Borrow the value stored under an exact key
    pub fn get(&self, key: &str) -> Option<&DocNode> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Whether an exact key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    /// Remove and return the value stored under an exact key
    pub fn remove(&mut self, key: &str) -> Option<DocNode> {
        let pos = self.position(key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Remove the first entry whose key matches a type-level catalog path
    ///
    /// The bare path is tried first; after that every remaining key is scanned
    /// in emission order for an indexed instance of the path. Returns the
    /// value together with the captured item index, if the key carried one.
    pub fn take_instance(&mut self, pattern: &FieldPath) -> Option<(DocNode, Option<usize>)> {
        if let Some(value) = self.remove(&pattern.to_string()) {
            return Some((value, None));
        }
        let (pos, index) = self.entries.iter().enumerate().find_map(|(pos, (key, _))| {
            let candidate = FieldPath::parse(key).ok()?;
            pattern.match_instance(&candidate).map(|index| (pos, index))
        })?;
        Some((self.entries.remove(pos).1, index))
    }

    /// Whether any key equals `path` or addresses something beneath it
    pub fn addresses(&self, path: &FieldPath) -> bool {
        self.entries.iter().any(|(k, _)| path.is_addressed_by(k))
    }

    /// Whether a value for `path` was generated
    ///
    /// Either a key addresses the path directly, or a bare ancestor key holds
    /// an object that contains it. An ancestor holding anything else, or an
    /// object without the child property, does not count.
    pub fn holds(&self, path: &FieldPath) -> bool {
        if self.addresses(path) {
            return true;
        }
        let segments = path.segments();
        (1..segments.len()).any(|split| {
            let ancestor = FieldPath::from_segments(segments[..split].to_vec());
            self.get(&ancestor.to_string())
                .is_some_and(|node| contains(node, &segments[split..]))
        })
    }

    /// Keys in emission order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Entries in emission order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DocNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the map back to a JSON object
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone().into_value()))
                .collect(),
        )
    }
}

fn contains(node: &DocNode, rest: &[Segment]) -> bool {
    match rest {
        [] => true,
        [Segment::Property(name), tail @ ..] => node
            .fields()
            .and_then(|fields| fields.get(name))
            .is_some_and(|child| contains(child, tail)),
        [Segment::Array { .. }, ..] => false,
    }
}

impl From<Map<String, Value>> for ValueMap {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            entries: map.into_iter().map(|(k, v)| (k, DocNode::from(v))).collect(),
        }
    }
}

impl FromIterator<(String, DocNode)> for ValueMap {
    fn from_iter<T: IntoIterator<Item = (String, DocNode)>>(iter: T) -> Self {
        let mut map = ValueMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl IntoIterator for ValueMap {
    type Item = (String, DocNode);
    type IntoIter = std::vec::IntoIter<(String, DocNode)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

//! Module that allows to (de-)serialize a map as a `Vec<(K, V)>`, keeping the order in which the
//! keys appear in the document.
//!
//! `serde_json` sorts object keys when deserializing into a `HashMap` or `BTreeMap`. Whenever the
//! position of a key carries meaning (e.g., "first entry wins"), use this module instead.

use std::{fmt, marker::PhantomData};

use serde::{
    de::{MapAccess, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};

/// Helper struct that allows (de-)serialization of an ordered list of key-value pairs as a map.
///
/// Example:
/// ```ignore
/// let map: OrderedMap<String, u32> = serde_json::from_str(r#"{"b": 1, "a": 2}"#).unwrap();
/// assert_eq!(map.0[0].0, "b");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderedMap<K, V>(
    #[serde(with = "crate::serde::ordered_map")]
    #[serde(bound(
        deserialize = "K: Deserialize<'de>, V: Deserialize<'de>",
        serialize = "K: Serialize, V: Serialize",
    ))]
    pub Vec<(K, V)>,
);

impl<K, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<K, V> From<Vec<(K, V)>> for OrderedMap<K, V> {
    fn from(entries: Vec<(K, V)>) -> Self {
        Self(entries)
    }
}

impl<K, V> From<OrderedMap<K, V>> for Vec<(K, V)> {
    fn from(val: OrderedMap<K, V>) -> Self {
        val.0
    }
}

/// Serialize the key-value pairs as a map, in the order of the slice.
pub fn serialize<K: Serialize, V: Serialize, S: Serializer>(
    entries: &[(K, V)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(entries.iter().map(|(k, v)| (k, v)))
}

/// Deserialize a map into a `Vec` of key-value pairs, in document order. Duplicate keys are kept.
pub fn deserialize<'de, K: Deserialize<'de>, V: Deserialize<'de>, D>(
    deserializer: D,
) -> Result<Vec<(K, V)>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
}

struct OrderedMapVisitor<K, V>(PhantomData<(K, V)>);

impl<'de, K: Deserialize<'de>, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<K, V> {
    type Value = Vec<(K, V)>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((k, v)) = map.next_entry()? {
            entries.push((k, v));
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod test {
    use super::OrderedMap;

    #[test]
    fn keeps_document_order() {
        let map: OrderedMap<String, u32> =
            serde_json::from_str(r#"{"zeta": 1, "alpha": 2, "mid": 3}"#).unwrap();
        let keys = map.0.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);

        let serialized = serde_json::to_string(&map).unwrap();
        assert_eq!(serialized, r#"{"zeta":1,"alpha":2,"mid":3}"#);
    }

    #[test]
    fn empty_map() {
        let map: OrderedMap<String, u32> = serde_json::from_str("{}").unwrap();
        assert!(map.0.is_empty());
        assert_eq!(map, OrderedMap::default());
    }
}

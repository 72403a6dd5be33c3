use std::collections::HashMap;

/// Read-only table of exact-match URI substitutions.
///
/// Keys and targets are compared as raw bytes, the same form the request
/// target arrives in.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: HashMap<Vec<u8>, Vec<u8>>,
}

impl AliasTable {
    pub fn new(entries: HashMap<String, String>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(from, to)| (from.into_bytes(), to.into_bytes()))
            .collect();
        Self { entries }
    }

    /// Returns the substitute for `uri`, or `uri` itself when no alias matches.
    ///
    /// Only one substitution is applied; aliases are not chained.
    pub fn apply<'a>(&'a self, uri: &'a [u8]) -> &'a [u8] {
        self.entries.get(uri).map(Vec::as_slice).unwrap_or(uri)
    }
}

impl From<HashMap<String, String>> for AliasTable {
    fn from(entries: HashMap<String, String>) -> Self {
        Self::new(entries)
    }
}

impl<const N: usize> From<[(&str, &str); N]> for AliasTable {
    fn from(pairs: [(&str, &str); N]) -> Self {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>()
            .into()
    }
}

//! Query-string handling for connection links

use std::collections::HashMap;
use url::form_urlencoded;

/// Where a recognized key takes its value from when the link omits it
#[derive(Debug, Clone, Copy)]
pub(crate) enum Fallback {
    Literal(&'static str),
    /// The parsed host
    Host,
}

/// Every query key the parser understands, with its default.
pub(crate) const RECOGNIZED: &[(&str, Fallback)] = &[
    ("security", Fallback::Literal("none")),
    ("flow", Fallback::Literal("")),
    ("fp", Fallback::Literal("chrome")),
    ("pbk", Fallback::Literal("")),
    ("sni", Fallback::Host),
    ("type", Fallback::Literal("tcp")),
    ("path", Fallback::Literal("/")),
    ("sid", Fallback::Literal("")),
    ("spx", Fallback::Literal("")),
];

/// Query values resolved against [`RECOGNIZED`]
pub(crate) struct QueryParams {
    values: HashMap<&'static str, String>,
}

impl QueryParams {
    /// Decode `query` and fill every recognized key, falling back to its default.
    ///
    /// Repeated keys keep their first value; `key=` and a bare `key` both
    /// yield an empty string rather than the default.
    pub(crate) fn resolve(query: &str, host: &str) -> Self {
        let mut raw: HashMap<String, String> = HashMap::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            raw.entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }

        let values = RECOGNIZED
            .iter()
            .map(|&(key, fallback)| {
                let value = raw.remove(key).unwrap_or_else(|| match fallback {
                    Fallback::Literal(default) => default.to_string(),
                    Fallback::Host => host.to_string(),
                });
                (key, value)
            })
            .collect();

        if !raw.is_empty() {
            let mut ignored: Vec<_> = raw.into_keys().collect();
            ignored.sort();
            tracing::debug!(?ignored, "ignoring unrecognized query keys");
        }

        Self { values }
    }

    /// Take the resolved value of a recognized key
    pub(crate) fn take(&mut self, key: &str) -> String {
        self.values.remove(key).unwrap_or_default()
    }
}

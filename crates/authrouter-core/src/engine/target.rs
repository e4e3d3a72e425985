//! Helpers for taking a raw request target (`path?query`) apart and
//! putting it back together.

use std::borrow::Cow;

use url::form_urlencoded;

/// A raw request target split at the first `?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RequestTarget<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
}

impl<'a> RequestTarget<'a> {
    pub fn parse(uri: &'a str) -> Self {
        match uri.split_once('?') {
            Some((path, query)) => Self {
                path,
                query: Some(query),
            },
            None => Self {
                path: uri,
                query: None,
            },
        }
    }

    /// First non-empty value of query parameter `name`.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query?;
        form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    }

    /// Target with `name` set to `value`.
    ///
    /// The first occurrence is replaced in place and later ones dropped; a
    /// missing parameter is appended. Other parameters keep their order.
    pub fn with_query_param(&self, name: &str, value: &str) -> String {
        let mut pairs: Vec<(Cow<'_, str>, Cow<'_, str>)> = Vec::new();
        let mut replaced = false;

        if let Some(query) = self.query {
            for (key, current) in form_urlencoded::parse(query.as_bytes()) {
                if key != name {
                    pairs.push((key, current));
                } else if !replaced {
                    pairs.push((key, Cow::Borrowed(value)));
                    replaced = true;
                }
            }
        }
        if !replaced {
            pairs.push((Cow::Borrowed(name), Cow::Borrowed(value)));
        }

        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        join(self.path, Some(&query))
    }

    /// Target with the `index`-th `/`-separated path segment replaced.
    ///
    /// Segment 0 is the empty string before the leading slash. Returns
    /// `None` if the path has no such segment.
    pub fn with_segment(&self, index: usize, value: &str) -> Option<String> {
        let mut segments: Vec<&str> = self.path.split('/').collect();
        let segment = segments.get_mut(index)?;
        *segment = value;
        Some(join(&segments.join("/"), self.query))
    }

    pub fn segment(&self, index: usize) -> Option<&'a str> {
        self.path.split('/').nth(index)
    }
}

pub(crate) fn join(path: &str, query: Option<&str>) -> String {
    match query {
        Some(query) if !query.is_empty() => format!("{path}?{query}"),
        _ => path.to_string(),
    }
}

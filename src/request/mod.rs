//! Inbound GET/POST parameters, sanitized once and queried by name.
//!
//! A `Request` is built in one step from the query string and the form body.
//! Every value is HTML-escaped and trimmed before it is stored, so callers only
//! ever see the sanitized form. Lookups can be restricted to one origin and run
//! through a validation [`filter`].
//!
//! ```rust
//! use sqlweb::request::{Method, Request};
//!
//! let req = Request::from_encoded("id=42&q=%3Cb%3E", "id=7")?;
//! assert_eq!(req.get_int("id", None), Some(42));
//! assert_eq!(req.get_int("id", Some(Method::Post)), Some(7));
//! assert_eq!(req.get("q", None), Some("&lt;b&gt;"));
//! # Ok::<(), sqlweb::SqlWebError>(())
//! ```

pub mod filter;
pub mod sanitize;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::error::SqlWebError;
pub use filter::{FailurePolicy, FilterKind, FilterOptions, FilteredValue};
use sanitize::{normalize_name, sanitize_value};

/// Where a parameter came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

impl Method {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored parameter. `value` is already sanitized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestParam {
    pub method: Method,
    pub name: String,
    pub value: String,
}

/// The sanitized parameters of one inbound call, GET entries first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    params: Vec<RequestParam>,
}

impl Request {
    /// Build from already-decoded query-string and form pairs.
    pub fn from_pairs<G, GK, GV, P, PK, PV>(get: G, post: P) -> Request
    where
        G: IntoIterator<Item = (GK, GV)>,
        GK: AsRef<str>,
        GV: AsRef<str>,
        P: IntoIterator<Item = (PK, PV)>,
        PK: AsRef<str>,
        PV: AsRef<str>,
    {
        let mut params = Vec::new();
        collect_origin(&mut params, Method::Get, get);
        collect_origin(&mut params, Method::Post, post);
        debug!(count = params.len(), "request parameters collected");
        Request { params }
    }

    /// Build from raw `application/x-www-form-urlencoded` text: the query
    /// string (a leading `?` is ignored) and the form body.
    ///
    /// # Errors
    /// Returns `SqlWebError::RequestError` if either part is not valid urlencoded text.
    pub fn from_encoded(query_string: &str, form_body: &str) -> Result<Request, SqlWebError> {
        let query_string = query_string.strip_prefix('?').unwrap_or(query_string);
        let get: Vec<(String, String)> = serde_urlencoded::from_str(query_string)?;
        let post: Vec<(String, String)> = serde_urlencoded::from_str(form_body)?;
        Ok(Self::from_pairs(get, post))
    }

    /// Every stored parameter, in arrival order.
    #[must_use]
    pub fn params(&self) -> &[RequestParam] {
        &self.params
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// First parameter called `name`, from `method` when one is given.
    #[must_use]
    pub fn find(&self, name: &str, method: Option<Method>) -> Option<&RequestParam> {
        self.params
            .iter()
            .find(|p| p.name == name && method.is_none_or(|m| p.method == m))
    }

    /// Look a parameter up and run it through `filter`.
    ///
    /// `None` both when the parameter is absent and when it fails the filter
    /// under the default failure policy.
    #[must_use]
    pub fn lookup(
        &self,
        name: &str,
        method: Option<Method>,
        filter: FilterKind,
        options: &FilterOptions,
    ) -> Option<FilteredValue> {
        let found = self.find(name, method)?;
        filter::apply(filter, &found.value, options)
    }

    /// Sanitized text of a parameter, unfiltered.
    #[must_use]
    pub fn get(&self, name: &str, method: Option<Method>) -> Option<&str> {
        self.find(name, method).map(|p| p.value.as_str())
    }

    #[must_use]
    pub fn get_int(&self, name: &str, method: Option<Method>) -> Option<i64> {
        self.lookup(name, method, FilterKind::Int, &FilterOptions::default())?
            .as_int()
    }

    #[must_use]
    pub fn get_float(&self, name: &str, method: Option<Method>) -> Option<f64> {
        self.lookup(name, method, FilterKind::Float, &FilterOptions::default())?
            .as_float()
    }

    #[must_use]
    pub fn get_bool(&self, name: &str, method: Option<Method>) -> Option<bool> {
        self.lookup(name, method, FilterKind::Bool, &FilterOptions::default())?
            .as_bool()
    }

    #[must_use]
    pub fn get_email(&self, name: &str, method: Option<Method>) -> Option<String> {
        self.text_filter(name, method, FilterKind::Email, &FilterOptions::default())
    }

    #[must_use]
    pub fn get_url(&self, name: &str, method: Option<Method>) -> Option<String> {
        self.text_filter(name, method, FilterKind::Url, &FilterOptions::default())
    }

    #[must_use]
    pub fn get_domain(&self, name: &str, method: Option<Method>) -> Option<String> {
        self.text_filter(name, method, FilterKind::Domain, &FilterOptions::default())
    }

    #[must_use]
    pub fn get_ip(&self, name: &str, method: Option<Method>) -> Option<String> {
        self.text_filter(name, method, FilterKind::Ip, &FilterOptions::default())
    }

    #[must_use]
    pub fn get_mac(&self, name: &str, method: Option<Method>) -> Option<String> {
        self.text_filter(name, method, FilterKind::Mac, &FilterOptions::default())
    }

    /// Parameter text if `pattern` matches somewhere in the sanitized value.
    ///
    /// Anchor the pattern with `^...$` when the whole value must match.
    #[must_use]
    pub fn get_regexp(&self, name: &str, method: Option<Method>, pattern: &Regex) -> Option<String> {
        let options = FilterOptions::new().with_regexp(pattern.clone());
        self.text_filter(name, method, FilterKind::Regexp, &options)
    }

    fn text_filter(
        &self,
        name: &str,
        method: Option<Method>,
        kind: FilterKind,
        options: &FilterOptions,
    ) -> Option<String> {
        self.lookup(name, method, kind, options)?.into_text()
    }
}

// A repeated name within one origin keeps its first position and its last value.
fn collect_origin<I, K, V>(params: &mut Vec<RequestParam>, method: Method, pairs: I)
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut seen: HashMap<String, usize> = HashMap::new();
    for (name, value) in pairs {
        let name = normalize_name(name.as_ref());
        let value = sanitize_value(value.as_ref());
        match seen.entry(name) {
            Entry::Occupied(slot) => params[*slot.get()].value = value,
            Entry::Vacant(slot) => {
                let name = slot.key().clone();
                slot.insert(params.len());
                params.push(RequestParam {
                    method,
                    name,
                    value,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: [(&str, &str); 0] = [];

    #[test]
    fn get_entries_come_before_post() {
        let req = Request::from_pairs([("a", "1")], [("b", "2"), ("a", "3")]);
        let order: Vec<(Method, &str)> = req
            .params()
            .iter()
            .map(|p| (p.method, p.name.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![(Method::Get, "a"), (Method::Post, "b"), (Method::Post, "a")]
        );
        assert_eq!(req.get("a", None), Some("1"));
        assert_eq!(req.get("a", Some(Method::Post)), Some("3"));
    }

    #[test]
    fn repeated_names_keep_the_last_value() {
        let req = Request::from_pairs([("x", "1"), ("y", "2"), ("x", "3")], NONE);
        assert_eq!(req.len(), 2);
        assert_eq!(req.params()[0].name, "x");
        assert_eq!(req.params()[0].value, "3");
    }

    #[test]
    fn many_repeated_names_collapse_in_place() {
        let body: Vec<String> = (0..20_000).map(|i| format!("k{}=v{i}", i % 1_000)).collect();
        let req = Request::from_encoded("", &body.join("&")).unwrap();
        assert_eq!(req.len(), 1_000);
        assert_eq!(req.params()[0].name, "k0");
        assert_eq!(req.get("k0", None), Some("v19000"));
        assert_eq!(req.get("k999", Some(Method::Post)), Some("v19999"));
    }

    #[test]
    fn regexp_matches_anywhere_unless_anchored() {
        let req = Request::from_pairs([("code", "xAB-12y")], NONE);
        let loose = Regex::new(r"[A-Z]{2}-\d+").unwrap();
        let anchored = Regex::new(r"^[A-Z]{2}-\d+$").unwrap();
        assert_eq!(req.get_regexp("code", None, &loose).as_deref(), Some("xAB-12y"));
        assert_eq!(req.get_regexp("code", None, &anchored), None);
    }

    #[test]
    fn method_restriction() {
        let req = Request::from_pairs([("id", "5")], NONE);
        assert_eq!(req.get("id", Some(Method::Post)), None);
        assert_eq!(req.get("id", Some(Method::Get)), Some("5"));
        assert_eq!(req.get("id", None), Some("5"));
    }

    #[test]
    fn names_are_normalized_and_values_sanitized() {
        let req = Request::from_pairs([(" user.name", "  <i>bob</i> ")], NONE);
        assert_eq!(req.get("user_name", None), Some("&lt;i&gt;bob&lt;/i&gt;"));
    }

    #[test]
    fn encoded_input_is_decoded_first() {
        let req = Request::from_encoded("?name=J%C3%BCrgen+M&tag=a%26b", "note=it%27s").unwrap();
        assert_eq!(req.get("name", None), Some("Jürgen M"));
        assert_eq!(req.get("tag", Some(Method::Get)), Some("a&amp;b"));
        assert_eq!(req.get("note", Some(Method::Post)), Some("it&#039;s"));
    }

    #[test]
    fn typed_accessors() {
        let req = Request::from_pairs(
            [
                ("age", "42"),
                ("bad", "abc"),
                ("ratio", "0.25"),
                ("flag", "yes"),
                ("mail", "a@example.org"),
                ("site", "https://example.org/x"),
                ("host", "example.org"),
                ("ip", "10.0.0.1"),
                ("mac", "00:1a:2b:3c:4d:5e"),
                ("code", "AB-12"),
            ],
            NONE,
        );
        assert_eq!(req.get_int("age", None), Some(42));
        assert_eq!(req.get_int("bad", None), None);
        assert_eq!(req.get_int("missing", None), None);
        assert_eq!(req.get_float("ratio", None), Some(0.25));
        assert_eq!(req.get_bool("flag", None), Some(true));
        assert_eq!(req.get_bool("missing", None), None);
        assert_eq!(req.get_email("mail", None).as_deref(), Some("a@example.org"));
        assert_eq!(req.get_email("host", None), None);
        assert_eq!(req.get_url("site", None).as_deref(), Some("https://example.org/x"));
        assert_eq!(req.get_domain("host", None).as_deref(), Some("example.org"));
        assert_eq!(req.get_ip("ip", None).as_deref(), Some("10.0.0.1"));
        assert_eq!(req.get_mac("mac", None).as_deref(), Some("00:1a:2b:3c:4d:5e"));

        let code = Regex::new(r"^[A-Z]{2}-\d+$").unwrap();
        assert_eq!(req.get_regexp("code", None, &code).as_deref(), Some("AB-12"));
        assert_eq!(req.get_regexp("age", None, &code), None);
    }

    #[test]
    fn lookup_with_options() {
        let req = Request::from_pairs([("n", "0")], NONE);
        let positive = FilterOptions::new().with_range(Some(1.0), None);
        assert_eq!(req.lookup("n", None, FilterKind::Int, &positive), None);
        assert_eq!(
            req.lookup("n", None, FilterKind::Int, &positive.clone().false_on_failure()),
            Some(FilteredValue::Bool(false))
        );
        assert_eq!(
            req.lookup("n", None, FilterKind::Unfiltered, &FilterOptions::default()),
            Some(FilteredValue::Text("0".into()))
        );
    }
}

//! Validation filters applied to already-sanitized parameter text.
//!
//! Each filter either accepts the text, possibly converting it
//! (`Int`, `Float`, `Bool`), or fails. What a failure yields is decided by the
//! [`FailurePolicy`] and `default` in [`FilterOptions`].

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::warn;

/// Which validation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterKind {
    /// Return the sanitized text as-is.
    #[default]
    Unfiltered,
    Int,
    Float,
    Bool,
    Email,
    Url,
    Ip,
    Mac,
    Domain,
    /// Match `FilterOptions::regexp`.
    Regexp,
}

/// What a failed filter yields when no `default` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    NullOnFailure,
    FalseOnFailure,
}

/// A value that passed its filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilteredValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl FilteredValue {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FilteredValue::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FilteredValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            FilteredValue::Float(f) => Some(*f),
            #[allow(clippy::cast_precision_loss)]
            FilteredValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FilteredValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_text(self) -> Option<String> {
        match self {
            FilteredValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Per-call filter settings.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub failure: FailurePolicy,
    /// Returned instead of the failure sentinel when set.
    pub default: Option<FilteredValue>,
    /// Inclusive bounds for `Int` and `Float`.
    pub min_range: Option<f64>,
    pub max_range: Option<f64>,
    pub regexp: Option<Regex>,
    /// `Ip`: accept only IPv4 (combined with `ipv6`, accept either).
    pub ipv4: bool,
    /// `Ip`: accept only IPv6 (combined with `ipv4`, accept either).
    pub ipv6: bool,
    pub no_priv_range: bool,
    pub no_res_range: bool,
    /// `Domain`: also require hostname syntax for every label.
    pub hostname: bool,
}

impl FilterOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn false_on_failure(mut self) -> Self {
        self.failure = FailurePolicy::FalseOnFailure;
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: FilteredValue) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_range = min;
        self.max_range = max;
        self
    }

    #[must_use]
    pub fn with_regexp(mut self, pattern: Regex) -> Self {
        self.regexp = Some(pattern);
        self
    }

    #[must_use]
    pub fn ipv4_only(mut self) -> Self {
        self.ipv4 = true;
        self
    }

    #[must_use]
    pub fn ipv6_only(mut self) -> Self {
        self.ipv6 = true;
        self
    }

    #[must_use]
    pub fn public_only(mut self) -> Self {
        self.no_priv_range = true;
        self.no_res_range = true;
        self
    }

    #[must_use]
    pub fn hostname(mut self) -> Self {
        self.hostname = true;
        self
    }

    fn in_range(&self, value: f64) -> bool {
        self.min_range.is_none_or(|min| value >= min) && self.max_range.is_none_or(|max| value <= max)
    }

    // Bounds are rounded inward to whole numbers so the comparison stays in i64.
    fn in_int_range(&self, value: i64) -> bool {
        self.min_range.is_none_or(|min| int_at_least(value, min))
            && self.max_range.is_none_or(|max| int_at_most(value, max))
    }

    fn on_failure(&self) -> Option<FilteredValue> {
        if let Some(default) = &self.default {
            return Some(default.clone());
        }
        match self.failure {
            FailurePolicy::NullOnFailure => None,
            FailurePolicy::FalseOnFailure => Some(FilteredValue::Bool(false)),
        }
    }
}

// Patterns are literals; a `None` here would only mean a typo in this file.
static INT_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[+-]?(0|[1-9][0-9]*)$").ok());
static FLOAT_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?$").ok()
});
static EMAIL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*",
        r"@([A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$",
    ))
    .ok()
});
static URL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^[A-Za-z][A-Za-z0-9+.\-]*://",
        r"([^\s/?#@]+@)?",
        r"(\[[0-9A-Fa-f:.]+\]|[^\s/?#@:\[\]]+)",
        r"(:[0-9]{1,5})?",
        r"([/?#]\S*)?$",
    ))
    .ok()
});
static URL_OPAQUE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(?i:mailto|news|file):\S+$").ok());
static MAC_COLON_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Fa-f]{2}(:[0-9A-Fa-f]{2}){5}$").ok());
static MAC_DASH_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Fa-f]{2}(-[0-9A-Fa-f]{2}){5}$").ok());
static MAC_DOT_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Fa-f]{4}(\.[0-9A-Fa-f]{4}){2}$").ok());
static HOST_LABEL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?$").ok());

fn is_match(re: &LazyLock<Option<Regex>>, text: &str) -> bool {
    Option::as_ref(re).is_some_and(|re| re.is_match(text))
}

/// Run `kind` over `value` and apply the failure policy.
#[must_use]
pub fn apply(kind: FilterKind, value: &str, options: &FilterOptions) -> Option<FilteredValue> {
    validate(kind, value, options).or_else(|| options.on_failure())
}

fn validate(kind: FilterKind, value: &str, options: &FilterOptions) -> Option<FilteredValue> {
    match kind {
        FilterKind::Unfiltered => Some(FilteredValue::Text(value.to_owned())),
        FilterKind::Int => validate_int(value, options).map(FilteredValue::Int),
        FilterKind::Float => validate_float(value, options).map(FilteredValue::Float),
        FilterKind::Bool => validate_bool(value).map(FilteredValue::Bool),
        FilterKind::Email => validate_email(value).then(|| text(value)),
        FilterKind::Url => validate_url(value).then(|| text(value)),
        FilterKind::Ip => validate_ip(value, options).then(|| text(value)),
        FilterKind::Mac => validate_mac(value).then(|| text(value)),
        FilterKind::Domain => validate_domain(value, options.hostname).then(|| text(value)),
        FilterKind::Regexp => match &options.regexp {
            Some(re) => re.is_match(value).then(|| text(value)),
            None => {
                warn!("regexp filter used without a pattern");
                None
            }
        },
    }
}

fn text(value: &str) -> FilteredValue {
    FilteredValue::Text(value.to_owned())
}

fn validate_int(value: &str, options: &FilterOptions) -> Option<i64> {
    if !is_match(&INT_RE, value) {
        return None;
    }
    let parsed = value.parse::<i64>().ok()?;
    options.in_int_range(parsed).then_some(parsed)
}

// 2^63: every f64 strictly between -TWO_POW_63 and TWO_POW_63 that is whole fits an i64.
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

#[allow(clippy::cast_possible_truncation)]
fn int_at_least(value: i64, min: f64) -> bool {
    let min = min.ceil();
    if min.is_nan() || min >= TWO_POW_63 {
        false
    } else if min <= -TWO_POW_63 {
        true
    } else {
        value >= min as i64
    }
}

#[allow(clippy::cast_possible_truncation)]
fn int_at_most(value: i64, max: f64) -> bool {
    let max = max.floor();
    if max.is_nan() || max < -TWO_POW_63 {
        false
    } else if max >= TWO_POW_63 {
        true
    } else {
        value <= max as i64
    }
}

fn validate_float(value: &str, options: &FilterOptions) -> Option<f64> {
    if !is_match(&FLOAT_RE, value) {
        return None;
    }
    let parsed = value.parse::<f64>().ok().filter(|f| f.is_finite())?;
    options.in_range(parsed).then_some(parsed)
}

fn validate_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" | "" => Some(false),
        _ => None,
    }
}

fn validate_email(value: &str) -> bool {
    let Some((local, _)) = value.rsplit_once('@') else {
        return false;
    };
    value.len() <= 320 && local.len() <= 64 && is_match(&EMAIL_RE, value)
}

fn validate_url(value: &str) -> bool {
    is_match(&URL_RE, value) || is_match(&URL_OPAQUE_RE, value)
}

fn validate_mac(value: &str) -> bool {
    is_match(&MAC_COLON_RE, value) || is_match(&MAC_DASH_RE, value) || is_match(&MAC_DOT_RE, value)
}

fn validate_domain(value: &str, hostname: bool) -> bool {
    let name = value.strip_suffix('.').unwrap_or(value);
    if name.is_empty() || name.len() > 253 {
        return false;
    }
    name.split('.').all(|label| {
        !label.is_empty() && label.len() <= 63 && (!hostname || is_match(&HOST_LABEL_RE, label))
    })
}

fn validate_ip(value: &str, options: &FilterOptions) -> bool {
    let Ok(addr) = value.parse::<IpAddr>() else {
        return false;
    };
    let family_ok = match (options.ipv4, options.ipv6, addr) {
        (true, false, IpAddr::V6(_)) | (false, true, IpAddr::V4(_)) => false,
        _ => true,
    };
    if !family_ok {
        return false;
    }
    match addr {
        IpAddr::V4(v4) => {
            !((options.no_priv_range && is_private_v4(v4)) || (options.no_res_range && is_reserved_v4(v4)))
        }
        IpAddr::V6(v6) => {
            !((options.no_priv_range && is_private_v6(v6)) || (options.no_res_range && is_reserved_v6(v6)))
        }
    }
}

fn is_private_v4(addr: Ipv4Addr) -> bool {
    addr.is_private()
}

fn is_reserved_v4(addr: Ipv4Addr) -> bool {
    let [a, b, ..] = addr.octets();
    a == 0 || addr.is_loopback() || addr.is_link_local() || a >= 240 || (a == 100 && (64..128).contains(&b))
}

fn is_private_v6(addr: Ipv6Addr) -> bool {
    // fc00::/7
    (addr.segments()[0] & 0xfe00) == 0xfc00
}

fn is_reserved_v6(addr: Ipv6Addr) -> bool {
    let first = addr.segments()[0];
    addr.is_unspecified()
        || addr.is_loopback()
        || (first & 0xffc0) == 0xfe80
        || addr.to_ipv4_mapped().is_some()
        || (first == 0x2001 && addr.segments()[1] == 0x0db8)
}

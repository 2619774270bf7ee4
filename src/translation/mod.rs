//! Placeholder rewriting for backends that only understand `$N`.
//!
//! `SQLite` binds `?` and `:name` natively. Postgres does not, so query text is
//! rewritten before it is prepared and named parameters are reordered to match.

use std::borrow::Cow;

mod parsers;
mod scanner;

use parsers::{
    is_block_comment_end, is_block_comment_start, is_cast, is_line_comment_start, matches_tag,
    try_start_dollar_quote,
};
use scanner::{State, scan_digits, scan_identifier};

use crate::error::SqlWebError;
use crate::types::{Params, RowValues};

/// Which placeholder style a query text uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// No placeholders at all.
    None,
    /// `?` / `?N` placeholders; holds the highest index referenced.
    Positional(usize),
    /// `:name` placeholders; holds the distinct names in `$N` order.
    Named(Vec<String>),
}

/// Query text rewritten to `$N` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translated<'a> {
    pub sql: Cow<'a, str>,
    pub style: PlaceholderStyle,
}

impl Translated<'_> {
    /// Arrange `params` in the order the rewritten `$N` placeholders expect.
    ///
    /// # Errors
    /// See [`PlaceholderStyle::bind_order`].
    pub fn bind_order(&self, params: &Params) -> Result<Vec<RowValues>, SqlWebError> {
        self.style.bind_order(params)
    }
}

impl PlaceholderStyle {
    /// Arrange `params` in the order the rewritten `$N` placeholders expect.
    ///
    /// # Errors
    /// Returns `SqlWebError::ParameterError` when named parameters are missing or the
    /// parameter style does not match the query text.
    pub fn bind_order(&self, params: &Params) -> Result<Vec<RowValues>, SqlWebError> {
        match (self, params) {
            (PlaceholderStyle::Named(names), Params::Named(_)) => names
                .iter()
                .map(|name| {
                    params.named_value(name).cloned().ok_or_else(|| {
                        SqlWebError::ParameterError(format!("missing value for :{name}"))
                    })
                })
                .collect(),
            (PlaceholderStyle::Named(_), Params::Positional(values)) if values.is_empty() => {
                Err(SqlWebError::ParameterError(
                    "query uses named placeholders but no parameters were given".into(),
                ))
            }
            (PlaceholderStyle::Named(_), Params::Positional(_)) => Err(
                SqlWebError::ParameterError("query uses named placeholders; pass named parameters".into()),
            ),
            (PlaceholderStyle::Positional(_) | PlaceholderStyle::None, Params::Positional(values)) => {
                Ok(values.clone())
            }
            (_, Params::Named(pairs)) if pairs.is_empty() => Ok(Vec::new()),
            (_, Params::Named(_)) => Err(SqlWebError::ParameterError(
                "named parameters given but query has no :name placeholders".into(),
            )),
        }
    }
}

/// Rewrite `?`, `?N` and `:name` placeholders to Postgres `$N`.
///
/// Quoted strings, quoted identifiers, comments, dollar-quoted bodies and `::`
/// casts are copied untouched. Returns a borrowed `Cow` when nothing changed.
///
/// # Errors
/// Returns `SqlWebError::ParameterError` if the text mixes `?` and `:name`.
pub fn translate_for_postgres(sql: &str) -> Result<Translated<'_>, SqlWebError> {
    let bytes = sql.as_bytes();
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut state = State::Normal;
    let mut idx = 0;

    let mut max_positional = 0usize;
    let mut names: Vec<String> = Vec::new();

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'$' => {
                    if let Some((tag, close)) = try_start_dollar_quote(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = close;
                    }
                }
                _ if is_cast(bytes, idx) => idx += 1,
                b'?' => {
                    if !names.is_empty() {
                        return Err(mixed_styles());
                    }
                    let (end, position) = match scan_digits(bytes, idx + 1) {
                        Some((end, digits)) => {
                            let n = digits.parse::<usize>().map_err(|e| {
                                SqlWebError::ParameterError(format!("bad placeholder ?{digits}: {e}"))
                            })?;
                            (end, n)
                        }
                        // A bare `?` takes one past the largest index so far, as SQLite numbers it.
                        None => (idx + 1, max_positional + 1),
                    };
                    max_positional = max_positional.max(position);
                    let buf = out.get_or_insert_with(String::new);
                    buf.push_str(&sql[copied..idx]);
                    buf.push('$');
                    buf.push_str(&position.to_string());
                    copied = end;
                    idx = end;
                    continue;
                }
                b':' => {
                    if let Some((end, name)) = scan_identifier(bytes, idx + 1) {
                        if max_positional > 0 {
                            return Err(mixed_styles());
                        }
                        let position = match names.iter().position(|n| n == name) {
                            Some(existing) => existing + 1,
                            None => {
                                names.push(name.to_owned());
                                names.len()
                            }
                        };
                        let buf = out.get_or_insert_with(String::new);
                        buf.push_str(&sql[copied..idx]);
                        buf.push('$');
                        buf.push_str(&position.to_string());
                        copied = end;
                        idx = end;
                        continue;
                    }
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                if matches_tag(bytes, idx, tag) {
                    idx += tag.len() + 1;
                    state = State::Normal;
                }
            }
        }
        idx += 1;
    }

    let style = if !names.is_empty() {
        PlaceholderStyle::Named(names)
    } else if max_positional > 0 {
        PlaceholderStyle::Positional(max_positional)
    } else {
        PlaceholderStyle::None
    };

    let sql = match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    };
    Ok(Translated { sql, style })
}

fn mixed_styles() -> SqlWebError {
    SqlWebError::ParameterError("query mixes ? and :name placeholders".into())
}

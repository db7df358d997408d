use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    str::FromStr,
};

pub type Map = BTreeMap<String, String>;

pub type Expressions = Vec<Expression>;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct Expression {
    key: String,
    operator: Operator,
    #[serde(default)]
    values: BTreeSet<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum Operator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

/// Selects the set of resources a controller instance is responsible for.
///
/// All `matchLabels` entries and all `matchExpressions` must hold.
#[derive(Clone, Debug, Eq, PartialEq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Selector {
    match_labels: Option<Map>,
    match_expressions: Option<Expressions>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty requirement in label selector")]
    EmptyRequirement,
    #[error("invalid label key {0:?}")]
    InvalidKey(String),
    #[error("invalid label value {0:?}")]
    InvalidValue(String),
    #[error("unbalanced parentheses in label selector")]
    Unbalanced,
    #[error("set-based requirement on {0:?} must list values in parentheses")]
    MissingValues(String),
}

// === Selector ===

impl Selector {
    pub fn from_expressions(exprs: Expressions) -> Self {
        Self {
            match_labels: None,
            match_expressions: Some(exprs),
        }
    }

    pub fn from_map(map: Map) -> Self {
        Self {
            match_labels: Some(map),
            match_expressions: None,
        }
    }

    pub fn matches(&self, labels: &Map) -> bool {
        for expr in self.match_expressions.iter().flatten() {
            if !expr.matches(labels) {
                return false;
            }
        }

        if let Some(match_labels) = self.match_labels.as_ref() {
            for (k, v) in match_labels.iter() {
                if labels.get(k) != Some(v) {
                    return false;
                }
            }
        }

        true
    }
}

/// Parses the selector string syntax accepted by `kubectl -l`:
/// `k=v`, `k==v`, `k!=v`, `k in (a,b)`, `k notin (a,b)`, `k` and `!k`,
/// joined by commas.
impl FromStr for Selector {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // An empty selector selects everything.
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        let exprs = split_requirements(s)?
            .into_iter()
            .map(Expression::parse)
            .collect::<Result<Expressions, _>>()?;
        Ok(Self::from_expressions(exprs))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let mut sep = |f: &mut fmt::Formatter<'_>| {
            if first {
                first = false;
                Ok(())
            } else {
                f.write_str(",")
            }
        };

        for (k, v) in self.match_labels.iter().flatten() {
            sep(f)?;
            write!(f, "{k}={v}")?;
        }
        for expr in self.match_expressions.iter().flatten() {
            sep(f)?;
            fmt::Display::fmt(expr, f)?;
        }
        Ok(())
    }
}

impl std::iter::FromIterator<(String, String)> for Selector {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self::from_map(iter.into_iter().collect())
    }
}

impl std::iter::FromIterator<(&'static str, &'static str)> for Selector {
    fn from_iter<T: IntoIterator<Item = (&'static str, &'static str)>>(iter: T) -> Self {
        Self::from_map(
            iter.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl std::iter::FromIterator<Expression> for Selector {
    fn from_iter<T: IntoIterator<Item = Expression>>(iter: T) -> Self {
        Self::from_expressions(iter.into_iter().collect())
    }
}

// === Expression ===

impl Expression {
    pub fn new<V: Into<String>>(
        key: impl Into<String>,
        operator: Operator,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            key: key.into(),
            operator,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    fn matches(&self, labels: &Map) -> bool {
        match self.operator {
            Operator::In => labels
                .get(&self.key)
                .map_or(false, |v| self.values.contains(v)),
            Operator::NotIn => labels
                .get(&self.key)
                .map_or(true, |v| !self.values.contains(v)),
            Operator::Exists => labels.contains_key(&self.key),
            Operator::DoesNotExist => !labels.contains_key(&self.key),
        }
    }

    fn parse(req: &str) -> Result<Self, ParseError> {
        let req = req.trim();
        if req.is_empty() {
            return Err(ParseError::EmptyRequirement);
        }

        if let Some(key) = req.strip_prefix('!') {
            return Ok(Self::new(
                parse_key(key)?,
                Operator::DoesNotExist,
                None::<String>,
            ));
        }

        if let Some((key, value)) = req.split_once("!=") {
            return Ok(Self::new(
                parse_key(key)?,
                Operator::NotIn,
                Some(parse_value(value)?),
            ));
        }

        if let Some((key, value)) = req.split_once('=') {
            let value = value.strip_prefix('=').unwrap_or(value);
            return Ok(Self::new(
                parse_key(key)?,
                Operator::In,
                Some(parse_value(value)?),
            ));
        }

        let mut words = req.splitn(2, char::is_whitespace);
        let key = parse_key(words.next().unwrap_or_default())?;
        let rest = match words.next().map(str::trim) {
            None => return Ok(Self::new(key, Operator::Exists, None::<String>)),
            Some(rest) => rest,
        };

        let (operator, set) = if let Some(set) = rest.strip_prefix("notin") {
            (Operator::NotIn, set)
        } else if let Some(set) = rest.strip_prefix("in") {
            (Operator::In, set)
        } else {
            return Err(ParseError::InvalidKey(req.to_string()));
        };

        let set = set
            .trim()
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .ok_or_else(|| ParseError::MissingValues(key.clone()))?;
        let values = set
            .split(',')
            .map(parse_value)
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self::new(key, operator, values))
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = || self.values.iter().cloned().collect::<Vec<_>>().join(",");
        match self.operator {
            Operator::In if self.values.len() == 1 => write!(f, "{}={}", self.key, values()),
            Operator::NotIn if self.values.len() == 1 => write!(f, "{}!={}", self.key, values()),
            Operator::In => write!(f, "{} in ({})", self.key, values()),
            Operator::NotIn => write!(f, "{} notin ({})", self.key, values()),
            Operator::Exists => write!(f, "{}", self.key),
            Operator::DoesNotExist => write!(f, "!{}", self.key),
        }
    }
}

/// Splits a selector string on the commas that separate requirements,
/// leaving commas inside a parenthesized value set intact.
fn split_requirements(s: &str) -> Result<Vec<&str>, ParseError> {
    let mut reqs = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1).ok_or(ParseError::Unbalanced)?,
            ',' if depth == 0 => {
                reqs.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(ParseError::Unbalanced);
    }
    reqs.push(&s[start..]);
    Ok(reqs)
}

/// Accepts `name` or `prefix/name`, where neither part is empty.
fn parse_key(key: &str) -> Result<String, ParseError> {
    let key = key.trim();
    let (prefix, name) = match key.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, key),
    };
    let valid_prefix = prefix.map_or(true, |p| {
        !p.is_empty() && p.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.'))
    });
    let valid_name = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !(valid_prefix && valid_name) {
        return Err(ParseError::InvalidKey(key.to_string()));
    }
    Ok(key.to_string())
}

fn parse_value(value: &str) -> Result<String, ParseError> {
    let value = value.trim();
    let valid = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid {
        return Err(ParseError::InvalidValue(value.to_string()));
    }
    Ok(value.to_string())
}

//! crates/palabra_core/src/query.rs
//!
//! Options for the per-book word-frequency query and the lenient rules used to
//! resolve them from raw request parameters.

/// Default page size for word-frequency queries.
pub const DEFAULT_LIMIT: i64 = 50;

/// Direction of the ordering on occurrence count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Case-insensitive; anything other than `asc` or `desc` resolves to `Desc`.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()) {
            Some(s) if s == "asc" => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// A fully resolved word-frequency query. Filters left as `None` contribute no
/// predicate at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordQuery {
    pub difficulty: Option<i32>,
    pub min_count: Option<i32>,
    pub max_count: Option<i32>,
    pub sort: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

impl Default for WordQuery {
    fn default() -> Self {
        Self {
            difficulty: None,
            min_count: None,
            max_count: None,
            sort: SortOrder::Desc,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// Raw, unvalidated query-string values as they arrive from a client.
#[derive(Debug, Clone, Default)]
pub struct RawWordQuery<'a> {
    pub sort: Option<&'a str>,
    pub difficulty: Option<&'a str>,
    pub min_count: Option<&'a str>,
    pub max_count: Option<&'a str>,
    pub limit: Option<&'a str>,
    pub offset: Option<&'a str>,
}

impl WordQuery {
    /// Resolves raw values. Unparsable filters count as omitted, a
    /// non-positive limit becomes [`DEFAULT_LIMIT`] and a negative offset 0.
    pub fn resolve(raw: RawWordQuery<'_>) -> Self {
        let limit = parse_int::<i64>(raw.limit)
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_LIMIT);
        let offset = parse_int::<i64>(raw.offset).filter(|o| *o >= 0).unwrap_or(0);

        Self {
            difficulty: parse_int(raw.difficulty),
            min_count: parse_int(raw.min_count),
            max_count: parse_int(raw.max_count),
            sort: SortOrder::parse_lenient(raw.sort),
            limit,
            offset,
        }
    }
}

fn parse_int<T: std::str::FromStr>(raw: Option<&str>) -> Option<T> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

//! Turning free-text queries into lookup terms and confirmed catalog entries.

pub trait Titled {
    fn title(&self) -> &str;
    fn year(&self) -> Option<i32>;
}

pub fn parse_imdb_id(input: &str) -> Option<String> {
    let lower = input.trim().to_lowercase();
    let lower = lower.strip_prefix("imdb:").unwrap_or(&lower).trim().to_string();
    if lower.starts_with("tt") && lower.len() > 2 && lower[2..].chars().all(|c| c.is_ascii_digit())
    {
        return Some(lower);
    }
    None
}

/// Parses `<prefix>:<digits>`, e.g. `tmdb:603`. Bare numbers are titles ("1917"), not ids.
pub fn parse_prefixed_id(input: &str, prefix: &str) -> Option<i64> {
    let trimmed = input.trim();
    let (head, rest) = trimmed.split_once(':')?;
    if !head.trim().eq_ignore_ascii_case(prefix) {
        return None;
    }
    let digits = rest.trim();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|id| *id > 0)
}

pub fn movie_lookup_term(query: &str) -> String {
    if let Some(id) = parse_prefixed_id(query, "tmdb") {
        return format!("tmdb:{id}");
    }
    if let Some(imdb) = parse_imdb_id(query) {
        return format!("imdb:{imdb}");
    }
    query.trim().to_string()
}

pub fn show_lookup_term(query: &str) -> String {
    if let Some(id) = parse_prefixed_id(query, "tvdb") {
        return format!("tvdb:{id}");
    }
    query.trim().to_string()
}

/// Splits a parenthesised trailing year off a query: `Primer (2004)` -> (`Primer`, 2004).
pub fn split_title_year(query: &str) -> (&str, Option<i32>) {
    let trimmed = query.trim();
    let Some(open) = trimmed.rfind('(') else {
        return (trimmed, None);
    };
    let Some(inner) = trimmed[open + 1..].strip_suffix(')') else {
        return (trimmed, None);
    };
    match inner.trim().parse::<i32>() {
        Ok(year) if (1870..=2100).contains(&year) => (trimmed[..open].trim_end(), Some(year)),
        _ => (trimmed, None),
    }
}

pub fn normalize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect();
    let mut words: Vec<&str> = cleaned.split_whitespace().collect();
    if words.len() > 1 && words[0] == "the" {
        words.remove(0);
    }
    words.join(" ")
}

/// Returns the single candidate the query unambiguously refers to, if any.
///
/// A lone candidate is always confirmed. Otherwise exactly one candidate must
/// match the normalised title (and the year, when the query carries one).
pub fn confirm_match<'a, T: Titled>(query: &str, candidates: &'a [T]) -> Option<&'a T> {
    if let [only] = candidates {
        return Some(only);
    }
    let (title, year) = split_title_year(query);
    let wanted = normalize_title(title);
    if wanted.is_empty() {
        return None;
    }
    let mut hits = candidates.iter().filter(|c| {
        normalize_title(c.title()) == wanted && year.map_or(true, |y| c.year() == Some(y))
    });
    match (hits.next(), hits.next()) {
        (Some(hit), None) => Some(hit),
        _ => None,
    }
}

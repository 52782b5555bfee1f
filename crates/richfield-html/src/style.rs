//! Inline `style` attribute handling.

use std::fmt;

/// Ordered `property: value` declarations. Property names are lowercased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleMap {
    decls: Vec<(String, String)>,
}

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a declaration list. Declarations without a colon or with an empty
    /// side are skipped; a repeated property keeps its last value.
    pub fn parse(input: &str) -> Self {
        let mut map = Self::new();
        for decl in split_declarations(input) {
            let Some((prop, value)) = decl.split_once(':') else {
                continue;
            };
            let prop = prop.trim().to_ascii_lowercase();
            let value = value.trim();
            if prop.is_empty() || value.is_empty() {
                continue;
            }
            map.set(prop, value);
        }
        map
    }

    pub fn get(&self, prop: &str) -> Option<&str> {
        self.decls
            .iter()
            .find(|(p, _)| p == prop)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, prop: impl Into<String>, value: impl Into<String>) {
        let prop = prop.into();
        let value = value.into();
        match self.decls.iter_mut().find(|(p, _)| *p == prop) {
            Some(existing) => existing.1 = value,
            None => self.decls.push((prop, value)),
        }
    }

    pub fn remove(&mut self, prop: &str) -> Option<String> {
        let ix = self.decls.iter().position(|(p, _)| p == prop)?;
        Some(self.decls.remove(ix).1)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, &str) -> bool) {
        self.decls.retain(|(p, v)| keep(p, v));
    }

    /// Copies declarations from `other` whose property is not set here.
    pub fn merge_missing(&mut self, other: &StyleMap) {
        for (prop, value) in &other.decls {
            if self.get(prop).is_none() {
                self.decls.push((prop.clone(), value.clone()));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.decls.iter().map(|(p, v)| (p.as_str(), v.as_str()))
    }
}

impl fmt::Display for StyleMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (ix, (prop, value)) in self.decls.iter().enumerate() {
            if ix > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{prop}: {value};")?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StyleMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (prop, value) in iter {
            map.set(prop, value);
        }
        map
    }
}

// Splits on `;` outside of parentheses and quotes, so `url(a;b)` stays whole.
// A quote that never closes does not hide the `;` after it.
fn split_declarations(input: &str) -> Vec<&str> {
    split_with(input, true).unwrap_or_else(|| split_with(input, false).unwrap_or_default())
}

fn split_with(input: &str, honor_quotes: bool) -> Option<Vec<&str>> {
    let mut out = Vec::new();
    let mut depth = 0_i32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (ix, ch) in input.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') if honor_quotes => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') => depth = (depth - 1).max(0),
            (None, ';') if depth == 0 => {
                out.push(&input[start..ix]);
                start = ix + 1;
            }
            _ => {}
        }
    }
    if quote.is_some() {
        return None;
    }
    out.push(&input[start..]);
    Some(out)
}

/// True when every `"` and `'` opened in `value` is closed again.
pub fn has_balanced_quotes(value: &str) -> bool {
    let mut quote: Option<char> = None;
    for ch in value.chars() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (None, '"' | '\'') => quote = Some(ch),
            _ => {}
        }
    }
    quote.is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unclosed_quotes_do_not_swallow_declarations() {
        let map = StyleMap::parse("color: red\"; font-size: 12px");
        assert_eq!(map.get("color"), Some("red\""));
        assert_eq!(map.get("font-size"), Some("12px"));
        assert!(!has_balanced_quotes("red\""));
        assert!(has_balanced_quotes("\"a;b\" 'c'"));
    }

    #[test]
    fn parse_and_display() {
        let map = StyleMap::parse("COLOR: red ; ; font-size:12px;bogus");
        assert_eq!(map.get("color"), Some("red"));
        assert_eq!(map.to_string(), "color: red; font-size: 12px;");
    }

    #[test]
    fn merge_missing_keeps_existing() {
        let mut inner = StyleMap::parse("color: red");
        inner.merge_missing(&StyleMap::parse("color: blue; font-weight: bold"));
        assert_eq!(inner.to_string(), "color: red; font-weight: bold;");
    }

    #[test]
    fn semicolons_in_parens_do_not_split() {
        let map = StyleMap::parse("background: url(a;b); color: red");
        assert_eq!(map.get("background"), Some("url(a;b)"));
        assert_eq!(map.len(), 2);
    }
}

//! Lenient HTML fragment parsing into the owned DOM.
//!
//! The tree builder only applies the implied end tags needed to keep lists and
//! tables well formed. Any tree it produces serializes back to markup that
//! parses into the same tree.

use crate::dom::{Attribute, DomNode, Element, is_void_element};

const MAX_DEPTH: usize = 512;
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];
const ESCAPABLE_RAW_TEXT_ELEMENTS: &[&str] = &["textarea", "title"];

/// Parses an HTML fragment (or a whole document) into DOM nodes.
pub fn parse_fragment(input: &str) -> Vec<DomNode> {
    let bytes = input.as_bytes();
    let mut builder = TreeBuilder::default();
    let mut idx = 0_usize;

    while idx < bytes.len() {
        if bytes[idx] != b'<' {
            let next = find_byte(bytes, idx, b'<').unwrap_or(bytes.len());
            builder.text(decode_entities(&input[idx..next]));
            idx = next;
            continue;
        }

        if starts_with(bytes, idx, b"<!--") {
            let body_start = idx.saturating_add(4);
            match find_subslice(bytes, body_start, b"-->") {
                Some(end) => {
                    builder.comment(input[body_start..end].to_string());
                    idx = end.saturating_add(3);
                }
                None => {
                    builder.comment(input.get(body_start..).unwrap_or("").to_string());
                    idx = bytes.len();
                }
            }
            continue;
        }

        if starts_with(bytes, idx, b"<!") {
            idx = skip_to_gt(bytes, idx.saturating_add(2));
            continue;
        }

        if starts_with(bytes, idx, b"<?") {
            idx = skip_processing_instruction(bytes, idx);
            continue;
        }

        let Some((tag, next_idx)) = parse_tag(input, idx) else {
            builder.text("<".to_string());
            idx = idx.saturating_add(1);
            continue;
        };

        if tag.is_end {
            builder.end(&tag.name);
            idx = next_idx;
            continue;
        }

        let name = tag.name.clone();
        let raw = RAW_TEXT_ELEMENTS.contains(&name.as_str());
        let escapable = ESCAPABLE_RAW_TEXT_ELEMENTS.contains(&name.as_str());
        if (raw || escapable) && !tag.self_closing {
            let (text, after) = read_raw_text_until_end_tag(input, next_idx, &name);
            builder.start(tag);
            if raw {
                builder.text(text.to_string());
            } else {
                builder.text(decode_entities(text));
            }
            builder.end(&name);
            idx = after;
            continue;
        }

        let self_closing = tag.self_closing;
        builder.start(tag);
        if self_closing && !is_void_element(&name) {
            builder.end(&name);
        }
        idx = next_idx;
    }

    builder.finish()
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedTag {
    name: String,
    attrs: Vec<Attribute>,
    is_end: bool,
    self_closing: bool,
}

#[derive(Default)]
struct TreeBuilder {
    root: Vec<DomNode>,
    stack: Vec<Element>,
}

impl TreeBuilder {
    fn children_mut(&mut self) -> &mut Vec<DomNode> {
        match self.stack.last_mut() {
            Some(el) => &mut el.children,
            None => &mut self.root,
        }
    }

    fn append(&mut self, node: DomNode) {
        self.children_mut().push(node);
    }

    fn text(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        let children = self.children_mut();
        if let Some(DomNode::Text(prev)) = children.last_mut() {
            prev.push_str(&text);
            return;
        }
        children.push(DomNode::Text(text));
    }

    fn comment(&mut self, text: String) {
        self.append(DomNode::Comment(text));
    }

    fn start(&mut self, tag: ParsedTag) {
        self.close_implied(&tag.name);

        if self.stack.len() >= MAX_DEPTH {
            return;
        }

        let el = Element {
            tag: tag.name,
            attrs: tag.attrs,
            children: Vec::new(),
        };
        if el.is_void() {
            self.append(DomNode::Element(el));
        } else {
            self.stack.push(el);
        }
    }

    fn close_implied(&mut self, name: &str) {
        let (targets, boundaries): (&[&str], &[&str]) = match name {
            "li" => (&["li"], &["ul", "ol"]),
            "td" | "th" => (&["td", "th"], &["tr", "table"]),
            "tr" => (&["tr"], &["table", "thead", "tbody", "tfoot"]),
            "thead" | "tbody" | "tfoot" => (&["thead", "tbody", "tfoot"], &["table"]),
            "dt" | "dd" => (&["dt", "dd"], &["dl"]),
            _ => return,
        };

        for pos in (0..self.stack.len()).rev() {
            let tag = self.stack[pos].tag.as_str();
            if boundaries.contains(&tag) {
                return;
            }
            if targets.contains(&tag) {
                self.pop_to(pos);
                return;
            }
        }
    }

    fn end(&mut self, name: &str) {
        if let Some(pos) = self.stack.iter().rposition(|el| el.tag == name) {
            self.pop_to(pos);
        }
    }

    fn pop_to(&mut self, pos: usize) {
        while self.stack.len() > pos {
            self.pop();
        }
    }

    fn pop(&mut self) {
        if let Some(el) = self.stack.pop() {
            self.append(DomNode::Element(el));
        }
    }

    fn finish(mut self) -> Vec<DomNode> {
        while !self.stack.is_empty() {
            self.pop();
        }
        self.root
    }
}

fn parse_tag(input: &str, start: usize) -> Option<(ParsedTag, usize)> {
    let bytes = input.as_bytes();
    if bytes.get(start).copied() != Some(b'<') {
        return None;
    }

    let mut idx = start.saturating_add(1);
    let mut is_end = false;
    if bytes.get(idx).copied() == Some(b'/') {
        is_end = true;
        idx = idx.saturating_add(1);
    }

    if !bytes.get(idx).is_some_and(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    let name_start = idx;
    while idx < bytes.len() && is_tag_name_char(bytes[idx]) {
        idx = idx.saturating_add(1);
    }
    let name = input[name_start..idx].to_ascii_lowercase();

    let mut attrs: Vec<Attribute> = Vec::new();
    let mut self_closing = false;

    loop {
        idx = skip_spaces(bytes, idx);
        match bytes.get(idx).copied() {
            None => return None,
            Some(b'>') => {
                return Some((
                    ParsedTag {
                        name,
                        attrs,
                        is_end,
                        self_closing,
                    },
                    idx.saturating_add(1),
                ));
            }
            Some(b'/') => {
                self_closing = bytes.get(idx.saturating_add(1)).copied() == Some(b'>');
                idx = idx.saturating_add(1);
                continue;
            }
            Some(_) => {}
        }

        self_closing = false;
        let attr_start = idx;
        while idx < bytes.len() && !is_attr_name_terminator(bytes[idx]) {
            idx = idx.saturating_add(1);
        }
        if idx == attr_start {
            idx = idx.saturating_add(1);
            continue;
        }
        let attr_name = input[attr_start..idx].to_ascii_lowercase();

        idx = skip_spaces(bytes, idx);
        let mut value = String::new();
        if bytes.get(idx).copied() == Some(b'=') {
            idx = skip_spaces(bytes, idx.saturating_add(1));
            match bytes.get(idx).copied() {
                Some(quote @ (b'"' | b'\'')) => {
                    let value_start = idx.saturating_add(1);
                    let end = find_byte(bytes, value_start, quote)?;
                    value = decode_entities(&input[value_start..end]);
                    idx = end.saturating_add(1);
                }
                Some(_) => {
                    let value_start = idx;
                    while idx < bytes.len()
                        && !bytes[idx].is_ascii_whitespace()
                        && bytes[idx] != b'>'
                    {
                        idx = idx.saturating_add(1);
                    }
                    value = decode_entities(&input[value_start..idx]);
                }
                None => return None,
            }
        }

        if !is_end && !attrs.iter().any(|a| a.name == attr_name) {
            attrs.push(Attribute {
                name: attr_name,
                value,
            });
        }
    }
}

fn read_raw_text_until_end_tag<'a>(
    input: &'a str,
    start: usize,
    tag_name: &str,
) -> (&'a str, usize) {
    let bytes = input.as_bytes();
    let tag_bytes = tag_name.as_bytes();
    let mut idx = start;

    while idx < bytes.len() {
        if bytes[idx] == b'<'
            && bytes.get(idx.saturating_add(1)).copied() == Some(b'/')
            && starts_with_ignore_ascii_case(bytes, idx.saturating_add(2), tag_bytes)
            && tag_name_boundary(bytes, idx.saturating_add(2 + tag_bytes.len()))
        {
            let end = skip_to_gt(bytes, idx.saturating_add(2));
            return (&input[start..idx], end);
        }
        idx = idx.saturating_add(1);
    }

    (input.get(start..).unwrap_or(""), bytes.len())
}

/// Decodes character references. Unknown or malformed references are kept verbatim.
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.as_bytes()[1..]
            .iter()
            .take(32)
            .position(|b| *b == b';')
            .and_then(|semi| {
                let name = &tail[1..semi + 1];
                decode_reference(name).map(|ch| (ch, semi + 2))
            });
        match decoded {
            Some((ch, consumed)) => {
                out.push_str(&ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<String> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        let ch = char::from_u32(code).filter(|c| *c != '\0')?;
        return Some(ch.to_string());
    }

    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "copy" => '©',
        "reg" => '®',
        "trade" => '™',
        "hellip" => '…',
        "mdash" => '—',
        "ndash" => '–',
        "lsquo" => '‘',
        "rsquo" => '’',
        "ldquo" => '“',
        "rdquo" => '”',
        "laquo" => '«',
        "raquo" => '»',
        "bull" => '•',
        "middot" => '·',
        "times" => '×',
        "divide" => '÷',
        "deg" => '°',
        "euro" => '€',
        "pound" => '£',
        "yen" => '¥',
        "cent" => '¢',
        "sect" => '§',
        "para" => '¶',
        "shy" => '\u{ad}',
        _ => return None,
    };
    Some(ch.to_string())
}

fn skip_processing_instruction(bytes: &[u8], start: usize) -> usize {
    if let Some(end) = find_subslice(bytes, start.saturating_add(2), b"?>") {
        return end.saturating_add(2);
    }

    skip_to_gt(bytes, start.saturating_add(2))
}

fn skip_to_gt(bytes: &[u8], mut idx: usize) -> usize {
    while idx < bytes.len() {
        if bytes[idx] == b'>' {
            return idx.saturating_add(1);
        }
        idx = idx.saturating_add(1);
    }

    bytes.len()
}

fn tag_name_boundary(bytes: &[u8], idx: usize) -> bool {
    match bytes.get(idx).copied() {
        None => true,
        Some(byte) => byte.is_ascii_whitespace() || byte == b'>' || byte == b'/',
    }
}

fn skip_spaces(bytes: &[u8], mut idx: usize) -> usize {
    while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
        idx = idx.saturating_add(1);
    }
    idx
}

fn is_tag_name_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b':')
}

fn is_attr_name_terminator(byte: u8) -> bool {
    byte.is_ascii_whitespace() || matches!(byte, b'=' | b'>' | b'/')
}

fn starts_with(bytes: &[u8], idx: usize, pattern: &[u8]) -> bool {
    let end = idx.saturating_add(pattern.len());
    end <= bytes.len() && bytes[idx..end] == *pattern
}

fn starts_with_ignore_ascii_case(bytes: &[u8], idx: usize, pattern: &[u8]) -> bool {
    let end = idx.saturating_add(pattern.len());
    if end > bytes.len() {
        return false;
    }

    bytes[idx..end]
        .iter()
        .zip(pattern.iter())
        .all(|(left, right)| left.eq_ignore_ascii_case(right))
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }

    bytes[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

fn find_byte(bytes: &[u8], from: usize, byte: u8) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|candidate| *candidate == byte)
        .map(|offset| from + offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::serialize;

    #[test]
    fn decodes_named_and_numeric_references() {
        assert_eq!(decode_entities("a &amp; b &#65;&#x42; &bogus; &"), "a & b AB &bogus; &");
    }

    #[test]
    fn closes_list_items_and_cells_implicitly() {
        let nodes = parse_fragment("<ul><li>a<li>b</ul><table><tr><td>1<td>2</table>");
        assert_eq!(
            serialize(&nodes),
            "<ul><li>a</li><li>b</li></ul><table><tr><td>1</td><td>2</td></tr></table>"
        );
    }

    #[test]
    fn stray_angle_bracket_is_text() {
        let nodes = parse_fragment("1 < 2 <p>x</p>");
        assert_eq!(serialize(&nodes), "1 &lt; 2 <p>x</p>");
    }

    #[test]
    fn raw_text_elements_are_not_parsed() {
        let nodes = parse_fragment("<script>if (a < b) { x = '</p>'; }</script>");
        let el = nodes[0].as_element().unwrap();
        assert_eq!(el.tag, "script");
        assert_eq!(el.text_content(), "if (a < b) { x = '</p>'; }");
    }

    #[test]
    fn attributes_are_lowercased_and_first_wins() {
        let nodes = parse_fragment("<IMG SRC=/a.png src=/b.png alt='x y' hidden>");
        let el = nodes[0].as_element().unwrap();
        assert_eq!(el.attr("src"), Some("/a.png"));
        assert_eq!(el.attr("alt"), Some("x y"));
        assert_eq!(el.attr("hidden"), Some(""));
    }

    #[test]
    fn reparse_of_serialized_tree_is_stable() {
        let input = "<p>a<span><div>b</div></span></p><li><em><li>c</li></em>";
        let once = serialize(&parse_fragment(input));
        let twice = serialize(&parse_fragment(&once));
        assert_eq!(once, twice);
    }
}

//! Command-Line Tokenizer
//!
//! Splits a raw input line into words on whitespace while honouring
//! encapsulation pairs — double quotes, parentheses, and curly braces —
//! so that delimiters inside an open pair are preserved verbatim:
//!
//! - `print "hello world"` → `print`, `"hello world"`
//! - `while ({i} < 3)`     → `while`, `({i} < 3)`
//!
//! A `#` outside any open pair starts a comment; it and everything after
//! it are discarded. Encapsulation characters are kept in the token text,
//! so joining tokens with a single space and re-tokenizing yields the
//! same tokens.

/// Whitespace characters that separate tokens.
pub const DELIMITERS: &[char] = &[' ', '\t', '\n', '\r', '\x0b', '\x0c'];

const COMMENT: char = '#';

/// A token's byte range within the original line. The token text is the
/// verbatim slice — nothing is unescaped or stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
}

impl TokenSpan {
    pub fn text<'a>(&self, line: &'a str) -> &'a str {
        &line[self.start..self.end]
    }
}

/// Expected closer for an opening encapsulation character, if any.
fn closer_for(c: char) -> Option<char> {
    match c {
        '"' => Some('"'),
        '(' => Some(')'),
        '{' => Some('}'),
        _ => None,
    }
}

/// Tokenize, returning byte spans into `line`. The span-preserving form
/// is what the completion engine needs to locate the word under the
/// cursor; `tokenize` is the plain-text convenience over it.
pub fn tokenize_spans(line: &str) -> Vec<TokenSpan> {
    let mut spans = Vec::new();
    let mut open: Vec<char> = Vec::new();
    let mut start: Option<usize> = None;

    for (pos, c) in line.char_indices() {
        if open.is_empty() {
            if DELIMITERS.contains(&c) {
                if let Some(s) = start.take() {
                    spans.push(TokenSpan { start: s, end: pos });
                }
                continue;
            }
            if c == COMMENT {
                if let Some(s) = start.take() {
                    spans.push(TokenSpan { start: s, end: pos });
                }
                return spans;
            }
        }

        if start.is_none() {
            start = Some(pos);
        }

        // Track pair nesting. A closer only closes the innermost open
        // pair, and a quoted span is opaque: nothing but the closing
        // quote matters inside it.
        if open.last() == Some(&c) {
            open.pop();
        } else if open.last() != Some(&'"') {
            if let Some(close) = closer_for(c) {
                open.push(close);
            }
        }
    }

    if let Some(s) = start {
        spans.push(TokenSpan {
            start: s,
            end: line.len(),
        });
    }
    spans
}

/// Tokenize into owned words.
pub fn tokenize(line: &str) -> Vec<String> {
    tokenize_spans(line)
        .iter()
        .map(|span| span.text(line).to_string())
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(line: &str) -> Vec<String> {
        tokenize(line)
    }

    #[test]
    fn test_plain_split() {
        assert_eq!(toks("assign i 0"), vec!["assign", "i", "0"]);
        assert_eq!(toks("  spaced \t out  "), vec!["spaced", "out"]);
    }

    #[test]
    fn test_empty_and_blank() {
        assert!(toks("").is_empty());
        assert!(toks("   \t ").is_empty());
    }

    #[test]
    fn test_quoted_strings_kept_verbatim() {
        assert_eq!(toks(r#"print "hello world""#), vec!["print", r#""hello world""#]);
    }

    #[test]
    fn test_parenthetical_expression_is_one_token() {
        assert_eq!(toks("while ({i} < 3)"), vec!["while", "({i} < 3)"]);
        assert_eq!(toks("print ({x}*6)"), vec!["print", "({x}*6)"]);
    }

    #[test]
    fn test_nested_pairs_across_types() {
        assert_eq!(toks(r#"if ("foo" == "foo")"#), vec!["if", r#"("foo" == "foo")"#]);
        assert_eq!(toks("print ((1+2) * {n})"), vec!["print", "((1+2) * {n})"]);
    }

    #[test]
    fn test_comment_discards_rest() {
        assert_eq!(toks("print 1 # the rest is gone"), vec!["print", "1"]);
        assert!(toks("# whole line comment").is_empty());
    }

    #[test]
    fn test_comment_inert_inside_encapsulation() {
        assert_eq!(toks(r#"print "not # a comment""#), vec!["print", r#""not # a comment""#]);
        assert_eq!(toks("print (1 # 2)"), vec!["print", "(1 # 2)"]);
    }

    #[test]
    fn test_unterminated_pair_runs_to_end_of_line() {
        assert_eq!(toks("print (1 + 2"), vec!["print", "(1 + 2"]);
    }

    #[test]
    fn test_quoted_span_is_opaque() {
        // An unbalanced opener inside quotes does not open a pair.
        assert_eq!(
            toks(r#"print "a (b" c"#),
            vec!["print", r#""a (b""#, "c"]
        );
    }

    #[test]
    fn test_spans_point_into_line() {
        let line = "log level 3";
        let spans = tokenize_spans(line);
        let words: Vec<&str> = spans.iter().map(|s| s.text(line)).collect();
        assert_eq!(words, vec!["log", "level", "3"]);
        assert_eq!(spans[1].start, 4);
    }

    #[test]
    fn test_rejoin_round_trip() {
        // Tokenizing the single-space join of tokens yields the same
        // tokens, provided no token holds an unescaped encap character.
        for line in [
            "assign i 0",
            "while ({i} < 3)",
            r#"if ("foo" == "foo")"#,
            "print hello {%1}",
        ] {
            let first = toks(line);
            let rejoined = first.join(" ");
            assert_eq!(toks(&rejoined), first);
        }
    }
}

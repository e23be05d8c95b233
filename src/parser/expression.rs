//! Expression Evaluator
//!
//! A recursive-descent evaluator over integer arithmetic, comparisons,
//! logical operators, and short string literals, used by `assign`,
//! `print`, `while`, and `if`. Precedence, lowest first:
//!
//! - logical `&&` `||` (short-circuiting)
//! - comparison `==` `!=` `<` `<=` `>` `>=`
//! - additive `+` `-`
//! - multiplicative `*` `/`
//! - unary `!` `-`
//! - primary: `( expr )`, decimal integer, string
//!
//! Strings are optionally double-quoted runs of letters and underscores.
//! A string's numeric value packs its first three bytes
//! (`b0<<16 | b1<<8 | b2`) so ordered comparison alphabetizes up to
//! three characters deep; the evaluator additionally remembers the last
//! two string terms so `==` and `!=` compare byte-exact when both
//! operands are strings.
//!
//! Arithmetic is wrapping i64. Division by zero is an error unless it
//! occurs on the dead side of a short-circuited operator.

use thiserror::Error;

/// Recursion bound preventing stack exhaustion on adversarial input.
pub const MAX_EXPR_DEPTH: usize = 64;

/// An invalid expression, with a 1-based byte offset into the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid expression: {message} (offset {offset})")]
pub struct ExprError {
    pub message: String,
    pub offset: usize,
}

/// Fast-path heuristic for "should this token be evaluated": true iff
/// the string contains both `(` and `)`. Callers treat it as a hint,
/// not a proof.
pub fn is_expression(s: &str) -> bool {
    s.contains('(') && s.contains(')')
}

/// Evaluate an expression string. Trailing input after a complete
/// expression is ignored, except a stray `)` which is an error.
pub fn evaluate(expr: &str) -> Result<i64, ExprError> {
    let mut parser = ExprParser::new(expr);
    let value = parser.expression()?;
    parser.skip_whitespace();
    if parser.peek() == Some(b')') {
        return Err(parser.error_here("unexpected ')'"));
    }
    Ok(value)
}

/// Byte range of a string term within the input.
type Term = (usize, usize);

struct ExprParser<'a> {
    src: &'a str,
    input: &'a [u8],
    pos: usize,
    depth: usize,
    /// Non-zero while evaluating the dead side of a short-circuited
    /// operator: syntax is still checked, value faults are not raised.
    muted: usize,
    /// Two-slot queue of the most recent terms; `Some` marks a string
    /// term, `None` a numeric one.
    first: Option<Term>,
    second: Option<Term>,
}

impl<'a> ExprParser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            input: src.as_bytes(),
            pos: 0,
            depth: 0,
            muted: 0,
            first: None,
            second: None,
        }
    }

    fn error_here(&self, message: impl Into<String>) -> ExprError {
        ExprError {
            message: message.into(),
            offset: self.pos + 1,
        }
    }

    fn depth_error(&self) -> ExprError {
        self.error_here(format!("maximum recursion depth {MAX_EXPR_DEPTH} reached"))
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Consume `token` if it is next (after whitespace).
    fn match_token(&mut self, token: &str) -> bool {
        self.skip_whitespace();
        if self.src[self.pos..].starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    /// Record a term in the two-slot queue.
    fn push_term(&mut self, term: Option<Term>) {
        self.second = self.first;
        self.first = term;
    }

    /// The last two terms as byte slices, when both were strings.
    fn string_operands(&self) -> Option<(&[u8], &[u8])> {
        let (a_start, a_len) = self.first?;
        let (b_start, b_len) = self.second?;
        Some((
            &self.input[a_start..a_start + a_len],
            &self.input[b_start..b_start + b_len],
        ))
    }

    // ------------------------------------------------------------------
    // Grammar, lowest precedence first
    // ------------------------------------------------------------------

    fn expression(&mut self) -> Result<i64, ExprError> {
        self.depth += 1;
        if self.depth > MAX_EXPR_DEPTH {
            return Err(self.depth_error());
        }
        let value = self.logical()?;
        self.depth -= 1;
        Ok(value)
    }

    fn logical(&mut self) -> Result<i64, ExprError> {
        let mut left = self.comparison()?;
        loop {
            if self.match_token("&&") {
                let dead = left == 0;
                if dead {
                    self.muted += 1;
                }
                let right = self.comparison()?;
                if dead {
                    self.muted -= 1;
                }
                left = i64::from(left != 0 && right != 0);
            } else if self.match_token("||") {
                let dead = left != 0;
                if dead {
                    self.muted += 1;
                }
                let right = self.comparison()?;
                if dead {
                    self.muted -= 1;
                }
                left = i64::from(left != 0 || right != 0);
            } else {
                return Ok(left);
            }
        }
    }

    fn comparison(&mut self) -> Result<i64, ExprError> {
        let mut left = self.additive()?;
        loop {
            if self.match_token("==") {
                let right = self.additive()?;
                left = match self.string_operands() {
                    Some((a, b)) => i64::from(a == b),
                    None => i64::from(left == right),
                };
            } else if self.match_token("!=") {
                let right = self.additive()?;
                left = match self.string_operands() {
                    Some((a, b)) => i64::from(a != b),
                    None => i64::from(left != right),
                };
            } else if self.match_token(">=") {
                let right = self.additive()?;
                left = i64::from(left >= right);
            } else if self.match_token("<=") {
                let right = self.additive()?;
                left = i64::from(left <= right);
            } else if self.match_token(">") {
                let right = self.additive()?;
                left = i64::from(left > right);
            } else if self.match_token("<") {
                let right = self.additive()?;
                left = i64::from(left < right);
            } else {
                return Ok(left);
            }
        }
    }

    fn additive(&mut self) -> Result<i64, ExprError> {
        let mut left = self.multiplicative()?;
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b'+') => {
                    self.pos += 1;
                    left = left.wrapping_add(self.multiplicative()?);
                }
                // A '-' here is binary; unary minus is consumed below.
                Some(b'-') => {
                    self.pos += 1;
                    left = left.wrapping_sub(self.multiplicative()?);
                }
                _ => return Ok(left),
            }
        }
    }

    fn multiplicative(&mut self) -> Result<i64, ExprError> {
        let mut left = self.unary()?;
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    left = left.wrapping_mul(self.unary()?);
                }
                Some(b'/') => {
                    let op_pos = self.pos;
                    self.pos += 1;
                    let right = self.unary()?;
                    if right == 0 {
                        if self.muted == 0 {
                            return Err(ExprError {
                                message: "division by zero".to_string(),
                                offset: op_pos + 1,
                            });
                        }
                        left = 0;
                    } else {
                        left = left.wrapping_div(right);
                    }
                }
                _ => return Ok(left),
            }
        }
    }

    fn unary(&mut self) -> Result<i64, ExprError> {
        self.depth += 1;
        if self.depth > MAX_EXPR_DEPTH {
            return Err(self.depth_error());
        }
        self.skip_whitespace();
        let value = match self.peek() {
            Some(b'!') => {
                self.pos += 1;
                i64::from(self.unary()? == 0)
            }
            Some(b'-') => {
                self.pos += 1;
                self.unary()?.wrapping_neg()
            }
            _ => self.primary()?,
        };
        self.depth -= 1;
        Ok(value)
    }

    fn primary(&mut self) -> Result<i64, ExprError> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'(') => {
                self.pos += 1;
                let value = self.expression()?;
                self.skip_whitespace();
                if self.peek() == Some(b')') {
                    self.pos += 1;
                    Ok(value)
                } else {
                    Err(self.error_here("expected ')'"))
                }
            }
            Some(b) if b.is_ascii_digit() => Ok(self.number()),
            Some(b) if b == b'"' || b.is_ascii_alphabetic() || b == b'_' => Ok(self.string()),
            Some(_) => {
                let c = self.src[self.pos..].chars().next().unwrap();
                Err(self.error_here(format!("invalid character '{c}'")))
            }
            None => Err(self.error_here("unexpected end of expression")),
        }
    }

    fn number(&mut self) -> i64 {
        let mut value: i64 = 0;
        while let Some(b) = self.peek() {
            if !b.is_ascii_digit() {
                break;
            }
            value = value.wrapping_mul(10).wrapping_add(i64::from(b - b'0'));
            self.pos += 1;
        }
        self.push_term(None);
        value
    }

    fn string(&mut self) -> i64 {
        let quoted = self.peek() == Some(b'"');
        if quoted {
            self.pos += 1;
        }

        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphabetic() || b == b'_')
        {
            self.pos += 1;
        }
        let len = self.pos - start;

        // Closing quote is consumed when present; an unmatched opening
        // quote still yields the bare word.
        if quoted && self.peek() == Some(b'"') {
            self.pos += 1;
        }

        if len > 0 || quoted {
            self.push_term(Some((start, len)));
        }

        // Alphabetization up to three characters deep for the ordered
        // comparators.
        let bytes = &self.input[start..start + len];
        let mut value: i64 = 0;
        if len >= 1 {
            value += i64::from(bytes[0]) << 16;
        }
        if len >= 2 {
            value += i64::from(bytes[1]) << 8;
        }
        if len >= 3 {
            value += i64::from(bytes[2]);
        }
        value
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_expression_heuristic() {
        assert!(is_expression("(1+2)"));
        assert!(is_expression("({i} < 3)"));
        assert!(!is_expression("42"));
        assert!(!is_expression("hello"));
    }

    #[test]
    fn test_integer_literals_and_parens() {
        assert_eq!(evaluate("7").unwrap(), 7);
        assert_eq!(evaluate("(7)").unwrap(), 7);
        assert_eq!(evaluate("((1234))").unwrap(), 1234);
    }

    #[test]
    fn test_precedence() {
        assert_eq!(evaluate("(1+2*3)").unwrap(), 7);
        assert_eq!(evaluate("(2*3+1)").unwrap(), 7);
        assert_eq!(evaluate("((1+2)*3)").unwrap(), 9);
        assert_eq!(evaluate("(10-2-3)").unwrap(), 5);
        assert_eq!(evaluate("(20/2/5)").unwrap(), 2);
        assert_eq!(evaluate("(7*6)").unwrap(), 42);
    }

    #[test]
    fn test_unary() {
        assert_eq!(evaluate("(-5)").unwrap(), -5);
        assert_eq!(evaluate("(--5)").unwrap(), 5);
        assert_eq!(evaluate("(!0)").unwrap(), 1);
        assert_eq!(evaluate("(!7)").unwrap(), 0);
        // !!x normalizes to (x != 0)
        assert_eq!(evaluate("(!!9)").unwrap(), 1);
        assert_eq!(evaluate("(!!0)").unwrap(), 0);
        assert_eq!(evaluate("(3 - -2)").unwrap(), 5);
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(evaluate("(1 < 2)").unwrap(), 1);
        assert_eq!(evaluate("(2 < 1)").unwrap(), 0);
        assert_eq!(evaluate("(2 <= 2)").unwrap(), 1);
        assert_eq!(evaluate("(3 > 2)").unwrap(), 1);
        assert_eq!(evaluate("(3 >= 4)").unwrap(), 0);
        assert_eq!(evaluate("(1+1 == 2)").unwrap(), 1);
        assert_eq!(evaluate("(1 != 2)").unwrap(), 1);
    }

    #[test]
    fn test_logical_and_precedence() {
        assert_eq!(evaluate("(1 == 1 && 2 == 2)").unwrap(), 1);
        assert_eq!(evaluate("(1 == 1 && 2 == 3)").unwrap(), 0);
        assert_eq!(evaluate("(0 || 3)").unwrap(), 1);
        assert_eq!(evaluate("(2 && 3)").unwrap(), 1);
        assert_eq!(evaluate("(0 && 3)").unwrap(), 0);
    }

    #[test]
    fn test_short_circuit_suppresses_dead_side_faults() {
        assert_eq!(evaluate("(0 && (1/0))").unwrap(), 0);
        assert_eq!(evaluate("(1 || (1/0))").unwrap(), 1);
        // The live side still faults.
        assert!(evaluate("(1 && (1/0))").is_err());
    }

    #[test]
    fn test_division_by_zero_is_an_error() {
        let err = evaluate("(1/(1-1))").unwrap_err();
        assert!(err.message.contains("division by zero"));
        assert!(err.offset > 0);
    }

    #[test]
    fn test_string_equality_is_byte_exact() {
        assert_eq!(evaluate(r#"("foo" == "foo")"#).unwrap(), 1);
        assert_eq!(evaluate(r#"("foo" == "bar")"#).unwrap(), 0);
        assert_eq!(evaluate(r#"("foo" != "bar")"#).unwrap(), 1);
        assert_eq!(evaluate("(abc == abc)").unwrap(), 1);
        // Prefix-equal but different length strings are not equal even
        // though the packed 3-byte values match.
        assert_eq!(evaluate(r#"("abcd" == "abce")"#).unwrap(), 0);
    }

    #[test]
    fn test_string_ordering_uses_packed_prefix() {
        assert_eq!(evaluate(r#"("abc" < "abd")"#).unwrap(), 1);
        assert_eq!(evaluate(r#"("b" > "a")"#).unwrap(), 1);
    }

    #[test]
    fn test_string_versus_number_compares_numerically() {
        // One numeric operand falls back to the packed encoding.
        assert_eq!(evaluate(r#"("foo" == 3)"#).unwrap(), 0);
        assert_eq!(evaluate("(a == 6356992)").unwrap(), 1); // 'a' << 16
    }

    #[test]
    fn test_syntax_errors_carry_offsets() {
        let err = evaluate("(1 + 2").unwrap_err();
        assert_eq!(err.message, "expected ')'");

        let err = evaluate("1) ").unwrap_err();
        assert_eq!(err.message, "unexpected ')'");
        assert_eq!(err.offset, 2);

        let err = evaluate("(1 + $)").unwrap_err();
        assert!(err.message.contains("invalid character"));
    }

    #[test]
    fn test_depth_bound() {
        let deep = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        let err = evaluate(&deep).unwrap_err();
        assert!(err.message.contains("recursion depth"));

        let bangs = format!("{}1", "!".repeat(500));
        assert!(evaluate(&bangs).is_err());
    }

    #[test]
    fn test_wrapping_arithmetic() {
        assert_eq!(
            evaluate("(9223372036854775807 + 1)").unwrap(),
            i64::MIN
        );
    }
}

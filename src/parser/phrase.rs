//! RFC 822 phrase unquoting: quoted-strings, comments and backslash escapes.

/// Structural token of a phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Quote,
    OpenParen,
    CloseParen,
    Backslash,
    Run(&'a [u8]),
}

/// Splits a phrase into quote / paren / backslash tokens and maximal literal runs.
struct Tokens<'a> {
    rest: &'a [u8],
}

impl<'a> Tokens<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { rest: input }
    }

    /// Take the byte following a backslash, if any.
    fn take_escaped(&mut self) -> Option<u8> {
        let (&first, rest) = self.rest.split_first()?;
        self.rest = rest;
        Some(first)
    }
}

fn is_special(b: u8) -> bool {
    matches!(b, b'"' | b'(' | b')' | b'\\')
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let (&first, rest) = self.rest.split_first()?;
        let token = match first {
            b'"' => Token::Quote,
            b'(' => Token::OpenParen,
            b')' => Token::CloseParen,
            b'\\' => Token::Backslash,
            _ => {
                let len = self
                    .rest
                    .iter()
                    .position(|&b| is_special(b))
                    .unwrap_or(self.rest.len());
                let (run, rest) = self.rest.split_at(len);
                self.rest = rest;
                return Some(Token::Run(run));
            }
        };
        self.rest = rest;
        Some(token)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Raw,
    Quoted,
    Commented,
}

/// Remove quoting, comments and escapes from a phrase and return its literal value.
///
/// Unterminated quotes or comments are tolerated; whatever was emitted
/// before the input ran out is returned.
///
/// - `"\"foo \\\"bar\\\" baz\""` → `foo "bar" baz`
/// - `TOKI(comment) Yoshinori` → `TOKI Yoshinori`
pub fn unquote_phrase(phrase: &[u8]) -> Vec<u8> {
    let mut tokens = Tokens::new(phrase);
    let mut state = State::Raw;
    let mut out = Vec::with_capacity(phrase.len());

    while let Some(token) = tokens.next() {
        state = match (state, token) {
            (State::Raw, Token::Quote) => State::Quoted,
            (State::Raw, Token::OpenParen) => State::Commented,
            (State::Quoted, Token::Quote) => State::Raw,
            (State::Commented, Token::CloseParen) => State::Raw,
            (State::Raw | State::Quoted, Token::Backslash) => {
                if let Some(b) = tokens.take_escaped() {
                    out.push(b);
                }
                state
            }
            (State::Commented, Token::Backslash) => {
                tokens.take_escaped();
                state
            }
            (State::Commented, _) => state,
            (State::Raw | State::Quoted, Token::Run(run)) => {
                out.extend_from_slice(run);
                state
            }
            // A stray `)` outside a comment or a `(` inside quotes is literal text.
            (State::Raw, Token::CloseParen) => {
                out.push(b')');
                state
            }
            (State::Quoted, Token::OpenParen) => {
                out.push(b'(');
                state
            }
            (State::Quoted, Token::CloseParen) => {
                out.push(b')');
                state
            }
        };
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unquote(s: &str) -> String {
        String::from_utf8(unquote_phrase(s.as_bytes())).unwrap()
    }

    #[test]
    fn test_raw_text_unchanged() {
        assert_eq!(unquote(""), "");
        assert_eq!(unquote("Hello world."), "Hello world.");
    }

    #[test]
    fn test_raw_escapes() {
        assert_eq!(unquote("\\\" \\( \\) \\\\"), "\" ( ) \\");
    }

    #[test]
    fn test_quoted() {
        assert_eq!(unquote("\"\""), "");
        assert_eq!(unquote("\"Hello world.\""), "Hello world.");
        assert_eq!(unquote("\"foo \\\"bar\\\" baz\""), "foo \"bar\" baz");
        assert_eq!(unquote("\"foo (bar) baz\""), "foo (bar) baz");
    }

    #[test]
    fn test_comments_dropped() {
        assert_eq!(unquote("()"), "");
        assert_eq!(unquote("(Hello world.)"), "");
        assert_eq!(unquote("( \" \\( \\) \\\\ )"), "");
        assert_eq!(unquote("TOKI(comment) Yoshinori"), "TOKI Yoshinori");
    }

    #[test]
    fn test_malformed_is_tolerated() {
        assert_eq!(unquote("\\"), "");
        assert_eq!(unquote("\"foo"), "foo");
        assert_eq!(unquote("foo\""), "foo");
        assert_eq!(unquote("\"foo\\"), "foo");
        assert_eq!(unquote("(foo"), "");
        assert_eq!(unquote("(foo\\"), "");
    }

    #[test]
    fn test_non_ascii_bytes_pass_through() {
        let input = "\"\u{571F}\u{5C90}\"".as_bytes();
        assert_eq!(unquote_phrase(input), "\u{571F}\u{5C90}".as_bytes());
    }
}

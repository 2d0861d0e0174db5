use crate::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    IntLiteral,
    LongLiteral,
    FloatLiteral,
    DoubleLiteral,
    CharLiteral,
    StringLiteral,
    TextBlock,
    Punct,
    Eof,
}

/// A `//` or `/* */` comment.
///
/// Continuation lines of block comments are stored without the indentation
/// of the line the comment starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
    /// Byte offset of the opening `//` or `/*`.
    pub offset: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Byte offset of the first character.
    pub offset: usize,
}

impl Token {
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}

// `>` is always lexed on its own (except `>=`) so that nested type arguments
// close cleanly; the parser glues adjacent `>` tokens back into shifts.
const PUNCTUATION: &[&str] = &[
    "<<=", "...", "->", "::", "++", "--", "&&", "||", "==", "!=", "<=", ">=", "+=", "-=", "*=",
    "/=", "%=", "&=", "|=", "^=", "<<", "(", ")", "{", "}", "[", "]", ";", ",", ".", "@", "=",
    ">", "<", "!", "~", "?", ":", "+", "-", "*", "/", "&", "|", "^", "%",
];

/// Splits Java source into tokens, dropping whitespace and comments.
pub fn lex(text: &str) -> Result<Vec<Token>, ParseError> {
    lex_with_comments(text).map(|(tokens, _)| tokens)
}

/// Like [`lex`], but also returns the comments in source order.
pub fn lex_with_comments(text: &str) -> Result<(Vec<Token>, Vec<Comment>), ParseError> {
    let mut lexer = Lexer {
        text,
        bytes: text.as_bytes(),
        pos: 0,
        tokens: Vec::new(),
        comments: Vec::new(),
    };
    lexer.run()?;
    Ok((lexer.tokens, lexer.comments))
}

/// Width of the whitespace that starts the line holding `offset`.
pub(crate) fn line_indent(text: &str, offset: usize) -> usize {
    let line_start = text[..offset].rfind('\n').map_or(0, |nl| nl + 1);
    text[line_start..]
        .bytes()
        .take_while(|b| *b == b' ' || *b == b'\t')
        .count()
}

/// Strips up to `width` bytes of leading blanks from every line after the first.
pub(crate) fn dedent_tail(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
            let blanks = line
                .bytes()
                .take(width)
                .take_while(|b| *b == b' ' || *b == b'\t')
                .count();
            out.push_str(&line[blanks..]);
        } else {
            out.push_str(line);
        }
    }
    out
}

struct Lexer<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
    comments: Vec<Comment>,
}

impl<'a> Lexer<'a> {
    fn run(&mut self) -> Result<(), ParseError> {
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            if b.is_ascii_whitespace() {
                self.pos += 1;
                continue;
            }
            if self.starts_with("//") {
                let start = self.pos;
                while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                    self.pos += 1;
                }
                let end = self.text[start..self.pos].trim_end().len() + start;
                self.comment(start, end);
                continue;
            }
            if self.starts_with("/*") {
                let start = self.pos;
                match self.text[self.pos + 2..].find("*/") {
                    Some(end) => self.pos += 2 + end + 2,
                    None => return Err(ParseError::new("unterminated block comment", start)),
                }
                self.comment(start, self.pos);
                continue;
            }
            if self.starts_with("\"\"\"") {
                self.text_block()?;
                continue;
            }
            if b == b'"' {
                self.quoted(b'"', TokenKind::StringLiteral)?;
                continue;
            }
            if b == b'\'' {
                self.quoted(b'\'', TokenKind::CharLiteral)?;
                continue;
            }
            if b.is_ascii_digit()
                || (b == b'.' && self.bytes.get(self.pos + 1).is_some_and(u8::is_ascii_digit))
            {
                self.number();
                continue;
            }
            if is_ident_start(self.current_char()) {
                self.ident();
                continue;
            }
            if let Some(punct) = PUNCTUATION.iter().find(|p| self.starts_with(p)) {
                self.push(TokenKind::Punct, self.pos, self.pos + punct.len());
                continue;
            }
            return Err(ParseError::new(
                format!("unexpected character `{}`", self.current_char()),
                self.pos,
            ));
        }
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            text: String::new(),
            offset: self.bytes.len(),
        });
        Ok(())
    }

    fn starts_with(&self, pat: &str) -> bool {
        self.text[self.pos..].starts_with(pat)
    }

    fn current_char(&self) -> char {
        self.text[self.pos..].chars().next().unwrap_or('\0')
    }

    fn comment(&mut self, start: usize, end: usize) {
        let indent = line_indent(self.text, start);
        self.comments.push(Comment {
            text: dedent_tail(&self.text[start..end], indent),
            offset: start,
            end,
        });
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.tokens.push(Token {
            kind,
            text: self.text[start..end].to_string(),
            offset: start,
        });
        self.pos = end;
    }

    fn ident(&mut self) {
        let start = self.pos;
        let mut end = self.pos;
        for (offset, ch) in self.text[start..].char_indices() {
            if is_ident_continue(ch) {
                end = start + offset + ch.len_utf8();
            } else {
                break;
            }
        }
        // `non-sealed` is the only hyphenated keyword.
        if &self.text[start..end] == "non" && self.text[end..].starts_with("-sealed") {
            end += "-sealed".len();
        }
        self.push(TokenKind::Ident, start, end);
    }

    fn quoted(&mut self, quote: u8, kind: TokenKind) -> Result<(), ParseError> {
        let start = self.pos;
        let mut i = self.pos + 1;
        while i < self.bytes.len() {
            match self.bytes[i] {
                b'\\' => i += 2,
                b'\n' => break,
                b if b == quote => {
                    self.push(kind, start, i + 1);
                    return Ok(());
                }
                _ => i += 1,
            }
        }
        Err(ParseError::new("unterminated literal", start))
    }

    fn text_block(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        let mut i = self.pos + 3;
        while i + 3 <= self.bytes.len() {
            if self.bytes[i] == b'\\' {
                i += 2;
                continue;
            }
            if &self.bytes[i..i + 3] == b"\"\"\"" {
                self.push(TokenKind::TextBlock, start, i + 3);
                return Ok(());
            }
            i += 1;
        }
        Err(ParseError::new("unterminated text block", start))
    }

    fn number(&mut self) {
        let start = self.pos;
        let bytes = self.bytes;
        let mut i = self.pos;
        let mut floating = false;

        let radix_prefix = bytes[i] == b'0'
            && matches!(bytes.get(i + 1), Some(b'x' | b'X' | b'b' | b'B'));
        if radix_prefix {
            i += 2;
            while i < bytes.len() && (bytes[i].is_ascii_hexdigit() || bytes[i] == b'_') {
                i += 1;
            }
        } else {
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
                i += 1;
            }
            let fraction_follows = bytes.get(i + 1).map_or(true, |b| {
                b.is_ascii_digit() || !(b.is_ascii_alphabetic() || *b == b'_' || *b == b'.')
            });
            if i < bytes.len() && bytes[i] == b'.' && fraction_follows {
                floating = true;
                i += 1;
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
                    i += 1;
                }
            }
            if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
                floating = true;
                i += 1;
                if i < bytes.len() && matches!(bytes[i], b'+' | b'-') {
                    i += 1;
                }
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
            }
        }

        let kind = match bytes.get(i) {
            Some(b'l' | b'L') => {
                i += 1;
                TokenKind::LongLiteral
            }
            Some(b'f' | b'F') if !radix_prefix => {
                i += 1;
                TokenKind::FloatLiteral
            }
            Some(b'd' | b'D') if !radix_prefix => {
                i += 1;
                TokenKind::DoubleLiteral
            }
            _ if floating => TokenKind::DoubleLiteral,
            _ => TokenKind::IntLiteral,
        };
        self.push(kind, start, i);
    }
}

fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch == '$' || unicode_ident::is_xid_start(ch)
}

fn is_ident_continue(ch: char) -> bool {
    ch == '$' || unicode_ident::is_xid_continue(ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<(TokenKind, String)> {
        lex(text)
            .unwrap()
            .into_iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn lexes_numeric_suffixes() {
        assert_eq!(
            kinds("1 2L 3.5 4f 0x1F 1e3 .5"),
            vec![
                (TokenKind::IntLiteral, "1".to_string()),
                (TokenKind::LongLiteral, "2L".to_string()),
                (TokenKind::DoubleLiteral, "3.5".to_string()),
                (TokenKind::FloatLiteral, "4f".to_string()),
                (TokenKind::IntLiteral, "0x1F".to_string()),
                (TokenKind::DoubleLiteral, "1e3".to_string()),
                (TokenKind::DoubleLiteral, ".5".to_string()),
            ]
        );
    }

    #[test]
    fn skips_comments_and_keeps_strings() {
        let tokens = kinds("a /* x */ = \"b // c\"; // tail");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Ident, "a".to_string()),
                (TokenKind::Punct, "=".to_string()),
                (TokenKind::StringLiteral, "\"b // c\"".to_string()),
                (TokenKind::Punct, ";".to_string()),
            ]
        );
    }

    #[test]
    fn comments_are_collected_with_their_offsets() {
        let source = "class A {\n    /**\n     * Docs.\n     */\n    int x; // tail\n}\n";
        let (tokens, comments) = lex_with_comments(source).unwrap();
        assert_eq!(tokens.iter().filter(|t| t.kind != TokenKind::Eof).count(), 6);
        let texts: Vec<&str> = comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["/**\n * Docs.\n */", "// tail"]);
        assert_eq!(&source[comments[1].offset..comments[1].end], "// tail");
    }

    #[test]
    fn identifiers_accept_unicode_letters() {
        let tokens = kinds("int größe = $x + _y;");
        assert_eq!(tokens[1], (TokenKind::Ident, "größe".to_string()));
        assert_eq!(tokens[3], (TokenKind::Ident, "$x".to_string()));
        assert_eq!(tokens[5], (TokenKind::Ident, "_y".to_string()));
    }

    #[test]
    fn closing_angles_are_split() {
        let tokens = kinds("List<List<String>>");
        assert_eq!(tokens.iter().filter(|(_, t)| t == ">").count(), 2);
    }

    #[test]
    fn text_blocks_are_single_tokens() {
        let tokens = kinds("String s = \"\"\"\n  hi\n\"\"\";");
        assert_eq!(tokens[3].0, TokenKind::TextBlock);
        assert_eq!(tokens.len(), 5);
    }
}

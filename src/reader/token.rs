//! Module for extracting R tokens from a character stream.

use tracing::trace;

use crate::data::{na_real, Ptr, Storage};
use crate::reader::{ReadErr, ReadResult};

/// Kinds of R tokens.
///
/// Whitespace and comments are dropped; newlines are tokens, since they end
/// statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    EndOfInput,
    Newline,

    /// Numbers, and the constant keywords `TRUE`, `NA`, `Inf` etc.
    NumConst,
    StrConst,
    NullConst,
    Symbol,
    DotDotDot,

    Function,
    If,
    Else,
    For,
    In,
    While,
    Repeat,
    Next,
    Break,

    /// `<-`, `<<-`, `:=`, `-=`
    LeftAssign,
    EqAssign,
    /// `->`, `->>`
    RightAssign,

    Question,
    Tilde,
    Or,
    Or2,
    And,
    And2,
    Not,
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
    Plus,
    Minus,
    Star,
    Divide,
    /// `%op%`
    Special,
    Colon,
    Caret,
    /// `**`, another spelling of `^`.
    Star2,
    Dollar,
    At,
    NsGet,
    NsGetInt,

    LParen,
    RParen,
    LBracket,
    /// `[[`
    Lbb,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semicolon,
}

impl TokenKind {
    /// The fixed spelling of punctuation and keywords.
    pub fn spelling(self) -> Option<&'static str> {
        use TokenKind::*;
        Some(match self {
            NullConst => "NULL",
            DotDotDot => "...",
            Function => "function",
            If => "if",
            Else => "else",
            For => "for",
            In => "in",
            While => "while",
            Repeat => "repeat",
            Next => "next",
            Break => "break",
            EqAssign => "=",
            Question => "?",
            Tilde => "~",
            Or => "|",
            Or2 => "||",
            And => "&",
            And2 => "&&",
            Not => "!",
            Gt => ">",
            Ge => ">=",
            Lt => "<",
            Le => "<=",
            Eq => "==",
            Ne => "!=",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Divide => "/",
            Colon => ":",
            Caret => "^",
            Star2 => "**",
            Dollar => "$",
            At => "@",
            NsGet => "::",
            NsGetInt => ":::",
            LParen => "(",
            RParen => ")",
            LBracket => "[",
            Lbb => "[[",
            RBracket => "]",
            LBrace => "{",
            RBrace => "}",
            Comma => ",",
            Semicolon => ";",
            EndOfInput | Newline | NumConst | StrConst | Symbol | LeftAssign | RightAssign
            | Special => return None,
        })
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(spelling) = self.spelling() {
            return write!(f, "'{spelling}'");
        }
        f.write_str(match self {
            TokenKind::EndOfInput => "end of input",
            TokenKind::Newline => "newline",
            TokenKind::NumConst => "numeric constant",
            TokenKind::StrConst => "string constant",
            TokenKind::Symbol => "symbol",
            TokenKind::LeftAssign => "left assignment",
            TokenKind::RightAssign => "right assignment",
            _ => "special operator",
        })
    }
}

/// An R token, with its starting position in the input stream.
#[derive(Debug, Clone)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Source text of the token.
    pub lexeme: String,
    /// Node for literals and symbols; `nil` otherwise.
    pub value: Ptr<'a>,
    pub line: usize,
    pub column: usize,
}

/// Pull-based tokenizer over a character stream.
///
/// Reads one character ahead. Literal and symbol nodes are allocated in the
/// storage as their tokens are scanned. Reaching the end of input, or an
/// error, is sticky: every later call returns the same result.
pub struct Tokenizer<'a, I: Iterator<Item = char>> {
    store: &'a Storage,
    input: I,
    chr: Option<char>,
    // Position of `chr`; 1-indexed.
    line: usize,
    column: usize,
    lexeme: String,
    start: (usize, usize),
    done: Option<ReadResult<Token<'a>>>,
    exhausted: bool,
}

impl<'a, I: Iterator<Item = char>> Tokenizer<'a, I> {
    pub fn new(store: &'a Storage, mut input: I) -> Self {
        let chr = input.next();
        Tokenizer {
            store,
            input,
            chr,
            line: 1,
            column: 1,
            lexeme: String::new(),
            start: (1, 1),
            done: None,
            exhausted: false,
        }
    }

    /// Scan the next token.
    pub fn next_token(&mut self) -> ReadResult<Token<'a>> {
        if let Some(done) = &self.done {
            return done.clone();
        }
        let result = self.scan();
        match &result {
            Ok(token) => {
                trace!(
                    kind = ?token.kind,
                    lexeme = %token.lexeme,
                    line = token.line,
                    column = token.column,
                    "token"
                );
                if token.kind == TokenKind::EndOfInput {
                    self.done = Some(result.clone());
                }
            }
            Err(err) => {
                trace!(%err, "tokenizer failed");
                self.done = Some(result.clone());
            }
        }
        result
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chr.take()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.chr = self.input.next();
        Some(c)
    }

    fn consume(&mut self) {
        if let Some(c) = self.advance() {
            self.lexeme.push(c);
        }
    }

    fn consume_if(&mut self, c: char) -> bool {
        if self.chr == Some(c) {
            self.consume();
            true
        } else {
            false
        }
    }

    /// A lexical error at the start of the current token.
    fn error(&self, message: impl Into<String>) -> ReadErr {
        ReadErr::Lexical {
            message: message.into(),
            line: self.start.0,
            column: self.start.1,
            at_end: self.chr.is_none(),
        }
    }

    fn skip_blanks(&mut self) {
        loop {
            match self.chr {
                Some(' ' | '\t' | '\x0c' | '\r') => {
                    self.advance();
                }
                Some('#') => {
                    while self.chr.is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    fn scan(&mut self) -> ReadResult<Token<'a>> {
        self.skip_blanks();
        self.lexeme.clear();
        self.start = (self.line, self.column);

        let (kind, value) = match self.chr {
            None => (TokenKind::EndOfInput, Ptr::nil()),
            Some('\n') => {
                self.consume();
                (TokenKind::Newline, Ptr::nil())
            }
            Some(quote @ ('"' | '\'')) => {
                let bytes = self.quoted(quote)?;
                (TokenKind::StrConst, self.store.scalar_string(&bytes))
            }
            Some('`') => {
                let bytes = self.quoted('`')?;
                if bytes.is_empty() {
                    return Err(self.error("attempt to use zero-length variable name"));
                }
                let name = String::from_utf8_lossy(&bytes);
                (TokenKind::Symbol, self.store.make_symbol(&name))
            }
            Some('%') => {
                self.special()?;
                (TokenKind::Special, self.store.make_symbol(&self.lexeme))
            }
            Some('.') => {
                self.consume();
                if self.chr.is_some_and(|c| c.is_ascii_digit()) {
                    self.number()?
                } else {
                    self.identifier()
                }
            }
            Some(c) if c.is_ascii_digit() => self.number()?,
            Some(c) if c.is_alphabetic() => self.identifier(),
            Some(c) => (self.punctuation(c)?, Ptr::nil()),
        };

        Ok(Token {
            kind,
            lexeme: self.lexeme.clone(),
            value,
            line: self.start.0,
            column: self.start.1,
        })
    }

    fn punctuation(&mut self, c: char) -> ReadResult<TokenKind> {
        use TokenKind::*;

        if !"<>!=&|[]*-:{}(),;+/^~$@?".contains(c) {
            return Err(self.error(format!("unexpected input '{}'", c.escape_default())));
        }
        self.consume();
        Ok(match c {
            '>' if self.consume_if('=') => Ge,
            '>' => Gt,
            '!' if self.consume_if('=') => Ne,
            '!' => Not,
            '=' if self.consume_if('=') => Eq,
            '=' => EqAssign,
            '&' if self.consume_if('&') => And2,
            '&' => And,
            '|' if self.consume_if('|') => Or2,
            '|' => Or,
            '[' if self.consume_if('[') => Lbb,
            '[' => LBracket,
            '*' if self.consume_if('*') => Star2,
            '*' => Star,
            '<' if self.consume_if('=') => Le,
            '<' if self.consume_if('-') => LeftAssign,
            '<' if self.consume_if('<') => {
                if !self.consume_if('-') {
                    return Err(self.error("unexpected '<<'"));
                }
                LeftAssign
            }
            '<' => Lt,
            '-' if self.consume_if('>') => {
                self.consume_if('>');
                RightAssign
            }
            '-' if self.consume_if('=') => LeftAssign,
            '-' => Minus,
            ':' if self.consume_if(':') => {
                if self.consume_if(':') {
                    NsGetInt
                } else {
                    NsGet
                }
            }
            ':' if self.consume_if('=') => LeftAssign,
            ':' => Colon,
            '{' => LBrace,
            '}' => RBrace,
            '(' => LParen,
            ')' => RParen,
            ']' => RBracket,
            ',' => Comma,
            ';' => Semicolon,
            '+' => Plus,
            '/' => Divide,
            '^' => Caret,
            '~' => Tilde,
            '$' => Dollar,
            '@' => At,
            _ => Question,
        })
    }

    /// Scan `%...%`.
    fn special(&mut self) -> ReadResult<()> {
        self.consume();
        loop {
            match self.chr {
                None | Some('\n') => return Err(self.error("unterminated special operator")),
                Some('%') => {
                    self.consume();
                    return Ok(());
                }
                Some(_) => self.consume(),
            }
        }
    }

    fn identifier(&mut self) -> (TokenKind, Ptr<'a>) {
        while self
            .chr
            .is_some_and(|c| c.is_alphanumeric() || c == '.' || c == '_')
        {
            self.consume();
        }
        let store = self.store;
        use TokenKind::*;
        match self.lexeme.as_str() {
            "NULL" => (NullConst, Ptr::nil()),
            "NA" => (NumConst, store.scalar_logical(None)),
            "TRUE" => (NumConst, store.scalar_logical(Some(true))),
            "FALSE" => (NumConst, store.scalar_logical(Some(false))),
            "Inf" => (NumConst, store.scalar_real(f64::INFINITY)),
            "NaN" => (NumConst, store.scalar_real(f64::NAN)),
            "NA_integer_" => (NumConst, store.scalar_integer(None)),
            "NA_real_" => (NumConst, store.scalar_real(na_real())),
            "NA_complex_" => (NumConst, store.scalar_complex(na_real(), na_real())),
            "function" => (Function, Ptr::nil()),
            "if" => (If, Ptr::nil()),
            "else" => (Else, Ptr::nil()),
            "for" => (For, Ptr::nil()),
            "in" => (In, Ptr::nil()),
            "while" => (While, Ptr::nil()),
            "repeat" => (Repeat, Ptr::nil()),
            "next" => (Next, Ptr::nil()),
            "break" => (Break, Ptr::nil()),
            "..." => (DotDotDot, store.make_symbol("...")),
            name => (Symbol, store.make_symbol(name)),
        }
    }

    /// Scan a numeric constant. The lexeme already holds a leading `.`, if
    /// there is one.
    fn number(&mut self) -> ReadResult<(TokenKind, Ptr<'a>)> {
        let mut seen_dot = !self.lexeme.is_empty();
        let mut hex = false;
        let mut digits = 0;
        if !seen_dot && self.chr == Some('0') {
            self.consume();
            digits = 1;
            if matches!(self.chr, Some('x' | 'X')) {
                self.consume();
                hex = true;
                digits = 0;
            }
        }
        while let Some(c) = self.chr {
            if c.is_ascii_digit() || (hex && c.is_ascii_hexdigit()) {
                digits += 1;
            } else if c == '.' && !seen_dot {
                seen_dot = true;
            } else {
                break;
            }
            self.consume();
        }
        if digits == 0 {
            return Err(self.error("hex constant without digits"));
        }

        let marker = if hex { 'p' } else { 'e' };
        if self.chr.map(|c| c.to_ascii_lowercase()) == Some(marker) {
            self.consume();
            if matches!(self.chr, Some('+' | '-')) {
                self.consume();
            }
            if !self.chr.is_some_and(|c| c.is_ascii_digit()) {
                return Err(self.error(format!(
                    "malformed exponent in numeric constant '{}'",
                    self.lexeme
                )));
            }
            while self.chr.is_some_and(|c| c.is_ascii_digit()) {
                self.consume();
            }
        } else if hex && seen_dot {
            return Err(self.error("hex constant with a fraction needs a 'p' exponent"));
        }

        let value = if hex {
            hex_value(&self.lexeme)
        } else {
            self.lexeme.parse::<f64>().map_err(|e| {
                self.error(format!("malformed numeric constant '{}': {e}", self.lexeme))
            })?
        };

        let store = self.store;
        let node = if self.consume_if('L') {
            if value.fract() == 0.0 && value > i32::MIN as f64 && value <= i32::MAX as f64 {
                store.scalar_integer(Some(value as i32))
            } else {
                tracing::debug!(lexeme = %self.lexeme, "integer constant is not a valid integer; using a real");
                store.scalar_real(value)
            }
        } else if self.consume_if('i') {
            store.scalar_complex(0.0, value)
        } else {
            store.scalar_real(value)
        };
        Ok((TokenKind::NumConst, node))
    }

    /// Scan a quoted string or symbol, decoding escapes.
    /// Returns the decoded bytes; the lexeme keeps the source text.
    fn quoted(&mut self, quote: char) -> ReadResult<Vec<u8>> {
        self.consume();
        let mut out = Vec::new();
        loop {
            let Some(c) = self.chr else {
                return Err(self.error(if quote == '`' {
                    "unterminated quoted symbol"
                } else {
                    "unterminated string constant"
                }));
            };
            self.consume();
            if c == quote {
                return Ok(out);
            }
            if c == '\\' {
                self.escape(&mut out)?;
            } else {
                push_char(&mut out, c);
            }
        }
    }

    fn escape(&mut self, out: &mut Vec<u8>) -> ReadResult<()> {
        let Some(c) = self.chr else {
            return Err(self.error("unterminated string constant"));
        };
        match c {
            '0'..='7' => {
                let mut v = 0u32;
                for _ in 0..3 {
                    let Some(d) = self.chr.and_then(|c| c.to_digit(8)) else {
                        break;
                    };
                    v = v * 8 + d;
                    self.consume();
                }
                let byte =
                    u8::try_from(v).map_err(|_| self.error("octal escape out of range"))?;
                self.push_byte(out, byte)?;
            }
            'x' => {
                self.consume();
                let v = self.hex_escape(2, false)?;
                // Two digits always fit.
                self.push_byte(out, v as u8)?;
            }
            'u' | 'U' => {
                self.consume();
                let width = if c == 'u' { 4 } else { 8 };
                let braced = self.consume_if('{');
                let v = self.hex_escape(width, braced)?;
                if braced && !self.consume_if('}') {
                    return Err(self.error(format!("invalid \\{c}{{xxxx}} sequence")));
                }
                let ch = char::from_u32(v)
                    .filter(|ch| *ch != '\0')
                    .ok_or_else(|| self.error(format!("invalid unicode escape \\{c}{v:x}")))?;
                push_char(out, ch);
            }
            _ => {
                let byte = match c {
                    'a' => 0x07,
                    'b' => 0x08,
                    'f' => 0x0c,
                    'n' => b'\n',
                    'r' => b'\r',
                    't' => b'\t',
                    'v' => 0x0b,
                    '\\' | '"' | '\'' | '`' | ' ' | '\n' => c as u8,
                    other => {
                        return Err(self.error(format!(
                            "'\\{}' is an unrecognized escape",
                            other.escape_default()
                        )))
                    }
                };
                self.consume();
                out.push(byte);
            }
        }
        Ok(())
    }

    /// Read up to `max` hex digits; all of them unless `braced`.
    fn hex_escape(&mut self, max: usize, braced: bool) -> ReadResult<u32> {
        let mut v = 0u32;
        let mut n = 0;
        while n < max {
            let Some(d) = self.chr.and_then(|c| c.to_digit(16)) else {
                break;
            };
            v = v * 16 + d;
            n += 1;
            self.consume();
        }
        let min = if braced { 1 } else { max };
        if n < min {
            return Err(self.error(format!("escape sequence needs {min} hex digits")));
        }
        Ok(v)
    }

    fn push_byte(&self, out: &mut Vec<u8>, byte: u8) -> ReadResult<()> {
        if byte == 0 {
            return Err(self.error("nul character not allowed"));
        }
        out.push(byte);
        Ok(())
    }
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

/// Value of a hex constant: `0x` mantissa, with optional fraction and binary
/// exponent.
fn hex_value(text: &str) -> f64 {
    let body = &text[2..];
    let (mantissa, exponent) = match body.find(|c| c == 'p' || c == 'P') {
        Some(i) => (&body[..i], &body[i + 1..]),
        None => (body, ""),
    };
    let mut value = 0f64;
    let mut scale: Option<f64> = None;
    for c in mantissa.chars() {
        if c == '.' {
            scale = Some(1.0);
            continue;
        }
        let d = f64::from(c.to_digit(16).unwrap_or(0));
        match &mut scale {
            None => value = value * 16.0 + d,
            Some(s) => {
                *s /= 16.0;
                value += d * *s;
            }
        }
    }
    let exponent = if exponent.is_empty() {
        0
    } else {
        exponent.parse::<i32>().unwrap_or(if exponent.starts_with('-') {
            i32::MIN
        } else {
            i32::MAX
        })
    };
    value * 2f64.powi(exponent)
}

impl<'a, I: Iterator<Item = char>> Iterator for Tokenizer<'a, I> {
    type Item = ReadResult<Token<'a>>;

    /// Yields tokens up to and including the end-of-input token, or up to
    /// the first error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let result = self.next_token();
        self.exhausted = !matches!(&result, Ok(t) if t.kind != TokenKind::EndOfInput);
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::{Token, TokenKind, TokenKind::*, Tokenizer};
    use crate::data::{is_na_real, Kind, Storage};
    use crate::reader::{ReadErr, ReadResult};
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let store = Storage::default();
        Tokenizer::new(&store, input.chars())
            .map(|t| t.unwrap().kind)
            .collect()
    }

    fn one<'a>(store: &'a Storage, input: &str) -> ReadResult<Token<'a>> {
        Tokenizer::new(store, input.chars()).next_token()
    }

    fn real(input: &str) -> f64 {
        let store = Storage::default();
        let token = one(&store, input).unwrap();
        assert_eq!(token.kind, NumConst, "{input}");
        let v = token.value.as_vector().unwrap();
        assert_eq!(v.kind(), Kind::Real, "{input}");
        v.real(0).unwrap()
    }

    fn string(input: &str) -> ReadResult<String> {
        let store = Storage::default();
        let token = one(&store, input)?;
        assert_eq!(token.kind, StrConst);
        Ok(token.value.as_text().unwrap())
    }

    fn lexical_error(input: &str) -> String {
        let store = Storage::default();
        match Tokenizer::new(&store, input.chars()).find_map(|t| t.err()) {
            Some(ReadErr::Lexical { message, .. }) => message,
            v => panic!("unexpected result for {input}: {v:?}"),
        }
    }

    #[test]
    fn empty_input() {
        assert_eq!(kinds(""), vec![EndOfInput]);
        assert_eq!(kinds("  \t\r # comment"), vec![EndOfInput]);
    }

    #[test]
    fn assignment() {
        assert_eq!(kinds("x <- 1\n"), vec![Symbol, LeftAssign, NumConst, Newline, EndOfInput]);
    }

    #[test]
    fn longest_match() {
        assert_eq!(
            kinds(">= > != ! == = && & || | [[ [ ** * <= <- <<- < -> ->> -= - :: ::: := :"),
            vec![
                Ge, Gt, Ne, Not, Eq, EqAssign, And2, And, Or2, Or, Lbb, LBracket, Star2, Star,
                Le, LeftAssign, LeftAssign, Lt, RightAssign, RightAssign, LeftAssign, Minus,
                NsGet, NsGetInt, LeftAssign, Colon, EndOfInput
            ]
        );
        assert_eq!(
            kinds("{}()],;+/^~$@?"),
            vec![
                LBrace, RBrace, LParen, RParen, RBracket, Comma, Semicolon, Plus, Divide, Caret,
                Tilde, Dollar, At, Question, EndOfInput
            ]
        );
    }

    #[test]
    fn lexemes_keep_spelling() {
        let store = Storage::default();
        let lexemes: Vec<String> = Tokenizer::new(&store, "a ->> b %in% c".chars())
            .map(|t| t.unwrap().lexeme)
            .collect();
        assert_eq!(lexemes, vec!["a", "->>", "b", "%in%", "c", ""]);
    }

    #[test]
    fn keywords() {
        assert_eq!(
            kinds("function if else for in while repeat next break NULL ... iffy"),
            vec![
                Function, If, Else, For, In, While, Repeat, Next, Break, NullConst, DotDotDot,
                Symbol, EndOfInput
            ]
        );
    }

    #[test]
    fn constant_keywords() {
        let store = Storage::default();
        let values: Vec<String> = Tokenizer::new(
            &store,
            "TRUE FALSE NA NA_integer_ Inf NaN NULL".chars(),
        )
        .map(|t| t.unwrap())
        .filter(|t| t.kind != EndOfInput)
        .map(|t| t.value.sexpr().to_string())
        .collect();
        assert_eq!(values, vec!["TRUE", "FALSE", "NA", "NA_integer_", "Inf", "NaN", "NULL"]);

        let token = one(&store, "NA_real_").unwrap();
        assert!(is_na_real(token.value.as_vector().unwrap().real(0).unwrap()));
        let token = one(&store, "NA_complex_").unwrap();
        assert_eq!(token.value.kind(), Kind::Complex);
    }

    #[test]
    fn symbols() {
        let store = Storage::default();
        for (input, name) in [
            ("abc", "abc"),
            (".hidden", ".hidden"),
            ("a.b_c2", "a.b_c2"),
            (".", "."),
            ("`my var`", "my var"),
            ("`a\\`b`", "a`b"),
            ("%in%", "%in%"),
        ] {
            let token = one(&store, input).unwrap();
            assert_eq!(token.value.symbol_name().as_deref(), Some(name), "{input}");
        }
        assert_eq!(one(&store, "`x`").unwrap().kind, Symbol);
        assert_eq!(one(&store, "%o%").unwrap().kind, Special);
    }

    #[test]
    fn numbers() {
        assert_eq!(real("1"), 1.0);
        assert_eq!(real("2.5"), 2.5);
        assert_eq!(real(".5"), 0.5);
        assert_eq!(real("5."), 5.0);
        assert_eq!(real("1e3"), 1000.0);
        assert_eq!(real("1.5E-2"), 0.015);
        assert_eq!(real("0x10"), 16.0);
        assert_eq!(real("0XfF"), 255.0);
        assert_eq!(real("0x1A"), 26.0);
        assert_eq!(real("0x1p4"), 16.0);
        assert_eq!(real("0x1.8p1"), 3.0);
        assert_eq!(real("0x1P-2"), 0.25);
        assert_eq!(real("0"), 0.0);
    }

    #[test]
    fn simple_sum() -> ReadResult<()> {
        let store = Storage::default();
        let tokens = Tokenizer::new(&store, "1+2".chars()).collect::<ReadResult<Vec<_>>>()?;
        let got: Vec<(TokenKind, &str)> = tokens.iter().map(|t| (t.kind, t.lexeme.as_str())).collect();
        assert_eq!(
            got,
            vec![(NumConst, "1"), (Plus, "+"), (NumConst, "2"), (EndOfInput, "")]
        );
        let real = |t: &Token| t.value.as_vector().and_then(|v| v.real(0));
        assert_eq!(real(&tokens[0]), Some(1.0));
        assert!(tokens[1].value.is_nil());
        assert_eq!(real(&tokens[2]), Some(2.0));
        Ok(())
    }

    #[test]
    fn number_suffixes() {
        let store = Storage::default();
        let int = |input: &str| {
            let token = one(&store, input).unwrap();
            token.value.as_vector().unwrap().integer(0)
        };
        assert_eq!(int("5L"), Some(Some(5)));
        assert_eq!(int("0x10L"), Some(Some(16)));
        assert_eq!(int("1e3L"), Some(Some(1000)));
        // Not whole, or too large: real.
        assert_eq!(int("1.5L"), None);
        assert_eq!(int("3000000000L"), None);
        assert_eq!(one(&store, "1.5L").unwrap().value.kind(), Kind::Real);

        let token = one(&store, "2i").unwrap();
        assert_eq!(token.value.as_vector().unwrap().complex(0), Some((0.0, 2.0)));
        assert_eq!(token.lexeme, "2i");
    }

    #[test]
    fn malformed_numbers() {
        assert!(lexical_error("0x").contains("without digits"));
        assert!(lexical_error("0x1p").contains("malformed exponent"));
        assert!(lexical_error("0x1p+").contains("malformed exponent"));
        assert!(lexical_error("1e").contains("malformed exponent"));
        assert!(lexical_error("0x1.8").contains("'p' exponent"));
    }

    #[test]
    fn number_then_dot() {
        assert_eq!(kinds("1.5.x"), vec![NumConst, Symbol, EndOfInput]);
    }

    #[test]
    fn strings() -> ReadResult<()> {
        assert_eq!(string(r#""hello""#)?, "hello");
        assert_eq!(string("'it''")?, "it");
        assert_eq!(string(r#"'say "hi"'"#)?, "say \"hi\"");
        assert_eq!(string(r#""a\tb\nc\\d\"e\'f\`g""#)?, "a\tb\nc\\d\"e'f`g");
        assert_eq!(string(r#""\a\b\f\v\r""#)?, "\x07\x08\x0c\x0b\r");
        assert_eq!(string("\"line\\\nbreak\"")?, "line\nbreak");
        assert_eq!(string(r#""\ ""#)?, " ");
        Ok(())
    }

    #[test]
    fn numeric_escapes() -> ReadResult<()> {
        assert_eq!(string(r#""\101\x42\103""#)?, "ABC");
        assert_eq!(string(r#""\7""#)?, "\x07");
        assert_eq!(string(r#""\1012""#)?, "A2");
        assert_eq!(string(r#""é""#)?, "é");
        assert_eq!(string(r#""\u{e9}!""#)?, "é!");
        assert_eq!(string(r#""\U0001F600""#)?, "😀");
        assert_eq!(string(r#""\U{1F600}""#)?, "😀");
        Ok(())
    }

    #[test]
    fn bad_escapes() {
        assert!(lexical_error(r#""\q""#).contains("unrecognized escape"));
        assert!(lexical_error(r#""\0""#).contains("nul"));
        assert!(lexical_error(r#""\x4""#).contains("hex digits"));
        assert!(lexical_error(r#""\xg1""#).contains("hex digits"));
        assert!(lexical_error(r#""\u{0}""#).contains("invalid unicode"));
        assert!(lexical_error(r#""\uD800""#).contains("invalid unicode"));
        assert!(lexical_error(r#""\u{e9""#).contains("sequence"));
        assert!(lexical_error(r#""\777""#).contains("out of range"));
    }

    #[test]
    fn unterminated() {
        let store = Storage::default();
        match one(&store, "\n  'abc") {
            Ok(t) => assert_eq!(t.kind, Newline),
            v => panic!("unexpected result: {v:?}"),
        }
        match Tokenizer::new(&store, "\n  'abc".chars()).nth(1) {
            Some(Err(ReadErr::Lexical {
                line: 2,
                column: 3,
                at_end: true,
                ..
            })) => (),
            v => panic!("unexpected result: {v:?}"),
        }
        assert!(lexical_error("%abc").contains("unterminated special"));
        assert!(lexical_error("%ab\nc%").contains("unterminated special"));
        assert!(lexical_error("`abc").contains("unterminated quoted symbol"));
    }

    #[test]
    fn unexpected_input() {
        assert!(lexical_error("a << b").contains("'<<'"));
        assert!(lexical_error("a \\ b").contains("unexpected input"));
        assert!(lexical_error("``").contains("zero-length"));
    }

    #[test]
    fn positions() {
        let store = Storage::default();
        let positions: Vec<(TokenKind, usize, usize)> =
            Tokenizer::new(&store, "ab <- 1 # note\n  f(x)".chars())
                .map(|t| t.unwrap())
                .map(|t| (t.kind, t.line, t.column))
                .collect();
        assert_eq!(
            positions,
            vec![
                (Symbol, 1, 1),
                (LeftAssign, 1, 4),
                (NumConst, 1, 7),
                (Newline, 1, 15),
                (Symbol, 2, 3),
                (LParen, 2, 4),
                (Symbol, 2, 5),
                (RParen, 2, 6),
                (EndOfInput, 2, 7),
            ]
        );
    }

    #[test]
    fn end_is_sticky() {
        let store = Storage::default();
        let mut tokens = Tokenizer::new(&store, "a".chars());
        assert_eq!(tokens.next_token().unwrap().kind, Symbol);
        for _ in 0..3 {
            assert_eq!(tokens.next_token().unwrap().kind, EndOfInput);
        }
        assert!(tokens.next().is_some());
        assert!(tokens.next().is_none());
    }

    #[test]
    fn errors_are_sticky() {
        let store = Storage::default();
        let mut tokens = Tokenizer::new(&store, "a ` b` 'oops".chars());
        assert_eq!(tokens.next_token().unwrap().kind, Symbol);
        assert_eq!(tokens.next_token().unwrap().kind, Symbol);
        let first = tokens.next_token().unwrap_err();
        assert_eq!(tokens.next_token().unwrap_err(), first);
        assert_eq!(tokens.next_token().unwrap_err(), first);
    }
}

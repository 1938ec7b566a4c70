//! Operator-precedence parser for R.
//!
//! Binding strengths, loosest first:
//!
//! | prec | operators                      | assoc    |
//! |------|--------------------------------|----------|
//! | 100  | `?`                            | left     |
//! | 110  | `while` `for` `repeat`         | left     |
//! | 120  | `if`                           | right    |
//! | 130  | `else`                         | left     |
//! | 140  | `<-` `<<-` `:=` `-=`           | right    |
//! | 150  | `=`                            | right    |
//! | 160  | `->` `->>`                     | left     |
//! | 170  | `~`                            | left     |
//! | 180  | `\|` `\|\|`                    | left     |
//! | 190  | `&` `&&`                       | left     |
//! | 200  | unary `!`                      | left     |
//! | 210  | `<` `<=` `==` `!=` `>=` `>`    | none     |
//! | 220  | `+` `-`                        | left     |
//! | 230  | `*` `/`                        | left     |
//! | 240  | `%op%`                         | left     |
//! | 250  | `:`                            | left     |
//! | 260  | unary `+` `-`                  | left     |
//! | 270  | `^` `**`                       | right    |
//! | 280  | `$` `@`                        | left     |
//! | 290  | `::` `:::`                     | left     |
//! | 300  | call `(`, index `[` `[[`       | left     |
//!
//! The compound statements (`function`, `if`, loops) take bodies that extend
//! over every operator except `?`.
//!
//! Newlines end an expression, except inside parentheses and brackets.

use crate::data::{Kind, Ptr, Storage, StretchyList};
use crate::reader::token::{Token, TokenKind, TokenKind::*, Tokenizer};
use crate::reader::{Expected, ReadErr, ReadResult};

const QUESTION: u16 = 100;
const LEFT_ASSIGN: u16 = 140;
const EQ_ASSIGN: u16 = 150;
const RIGHT_ASSIGN: u16 = 160;
const TILDE: u16 = 170;
const OR: u16 = 180;
const AND: u16 = 190;
const NOT: u16 = 200;
const COMPARE: u16 = 210;
const SUM: u16 = 220;
const PRODUCT: u16 = 230;
const SPECIAL: u16 = 240;
const COLON: u16 = 250;
const UNARY: u16 = 260;
const POWER: u16 = 270;
const DOLLAR: u16 = 280;
const POSTFIX: u16 = 300;

/// Deepest expression nesting accepted before the parser gives up.
const MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
    Right,
    None,
}

/// Binding of a token in infix or postfix position.
fn binding(kind: TokenKind) -> Option<(u16, Assoc)> {
    Some(match kind {
        Question => (QUESTION, Assoc::Left),
        LeftAssign => (LEFT_ASSIGN, Assoc::Right),
        EqAssign => (EQ_ASSIGN, Assoc::Right),
        RightAssign => (RIGHT_ASSIGN, Assoc::Left),
        Tilde => (TILDE, Assoc::Left),
        Or | Or2 => (OR, Assoc::Left),
        And | And2 => (AND, Assoc::Left),
        Gt | Ge | Lt | Le | Eq | Ne => (COMPARE, Assoc::None),
        Plus | Minus => (SUM, Assoc::Left),
        Star | Divide => (PRODUCT, Assoc::Left),
        Special => (SPECIAL, Assoc::Left),
        Colon => (COLON, Assoc::Left),
        Caret | Star2 => (POWER, Assoc::Right),
        Dollar | At => (DOLLAR, Assoc::Left),
        LParen | LBracket | Lbb => (POSTFIX, Assoc::Left),
        _ => return None,
    })
}

/// Enclosing delimiters, which decide whether a newline is significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nesting {
    /// Parentheses or brackets: newlines are skipped.
    Paren,
    /// Braces: newlines separate expressions.
    Brace,
}

/// Parser over a token stream, holding one token of lookahead.
pub struct Parser<'a, I: Iterator<Item = char>> {
    store: &'a Storage,
    tokens: Tokenizer<'a, I>,
    current: Token<'a>,
    nesting: Vec<Nesting>,
    /// Expressions currently being parsed, innermost included.
    depth: usize,
    /// A newline was consumed looking for `else`, so the current expression
    /// has ended.
    separator_pending: bool,
}

impl<'a, I: Iterator<Item = char>> Parser<'a, I> {
    pub fn new(store: &'a Storage, input: I) -> ReadResult<Self> {
        let mut tokens = Tokenizer::new(store, input);
        let current = tokens.next_token()?;
        Ok(Parser {
            store,
            tokens,
            current,
            nesting: Vec::new(),
            depth: 0,
            separator_pending: false,
        })
    }

    /// Parse top-level expressions, separated by newlines or `;`, to the end
    /// of input. Returns them as a pairlist; `nil` if there are none.
    pub fn parse_program(&mut self) -> ReadResult<Ptr<'a>> {
        self.expression_list(EndOfInput)
    }

    /// Parse one expression, binding operators tighter than `min_precedence`.
    /// Returns `nil` if the input is exhausted.
    pub fn parse_expression(&mut self, min_precedence: u16) -> ReadResult<Ptr<'a>> {
        self.skip_newlines()?;
        if self.current.kind == EndOfInput {
            return Ok(Ptr::nil());
        }
        self.expression(min_precedence, true)
    }

    /// Move to the next token, returning the one that was current.
    fn advance(&mut self) -> ReadResult<Token<'a>> {
        let mut next = self.tokens.next_token()?;
        if self.nesting.last() == Some(&Nesting::Paren) {
            while next.kind == Newline {
                next = self.tokens.next_token()?;
            }
        }
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn skip_newlines(&mut self) -> ReadResult<()> {
        while self.current.kind == Newline {
            self.advance()?;
        }
        Ok(())
    }

    fn unexpected(&self, expected: Expected) -> ReadErr {
        ReadErr::Syntax {
            expected,
            found: self.current.kind,
            line: self.current.line,
            column: self.current.column,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ReadResult<Token<'a>> {
        if self.current.kind != kind {
            return Err(self.unexpected(Expected::Token(kind)));
        }
        self.advance()
    }

    /// Step past an opening delimiter.
    fn open(&mut self, kind: TokenKind, nesting: Nesting) -> ReadResult<()> {
        if self.current.kind != kind {
            return Err(self.unexpected(Expected::Token(kind)));
        }
        self.nesting.push(nesting);
        self.advance()?;
        Ok(())
    }

    /// Step past a closing delimiter; the token after it is read in the
    /// enclosing context.
    fn close(&mut self, kind: TokenKind) -> ReadResult<()> {
        if self.current.kind != kind {
            return Err(self.unexpected(Expected::Token(kind)));
        }
        self.nesting.pop();
        self.advance()?;
        Ok(())
    }

    fn symbol(&self, name: &str) -> Ptr<'a> {
        self.store.make_symbol(name)
    }

    /// Build the call `name(args...)`.
    fn call_named(&self, name: &str, args: impl IntoIterator<Item = Ptr<'a>>) -> Ptr<'a> {
        let function = self.symbol(name);
        self.store.lang(function, self.store.list(args))
    }

    fn expression_list(&mut self, terminator: TokenKind) -> ReadResult<Ptr<'a>> {
        let mut list = StretchyList::new(self.store);
        loop {
            while matches!(self.current.kind, Newline | Semicolon) {
                self.advance()?;
            }
            if self.current.kind == terminator {
                break;
            }
            self.separator_pending = false;
            let expression = self.expression(0, true)?;
            list.append(expression);
            if self.separator_pending {
                self.separator_pending = false;
                continue;
            }
            match self.current.kind {
                Newline | Semicolon => continue,
                kind if kind == terminator => break,
                _ => return Err(self.unexpected(Expected::Operator)),
            }
        }
        Ok(list.finalize())
    }

    fn expression(&mut self, min: u16, allow_eq: bool) -> ReadResult<Ptr<'a>> {
        if self.depth >= MAX_DEPTH {
            return Err(self.unexpected(Expected::Description("less deeply nested expression")));
        }
        self.depth += 1;
        let result = self.operators(min, allow_eq);
        self.depth -= 1;
        result
    }

    #[tracing::instrument(level = "trace", skip(self), fields(token = ?self.current.kind))]
    fn operators(&mut self, min: u16, allow_eq: bool) -> ReadResult<Ptr<'a>> {
        self.skip_newlines()?;
        let mut lhs = self.prefix()?;
        let mut compared = false;
        while !self.separator_pending {
            let kind = self.current.kind;
            let Some((prec, assoc)) = binding(kind) else {
                break;
            };
            if prec <= min || (kind == EqAssign && !allow_eq) {
                break;
            }
            if assoc == Assoc::None {
                if compared {
                    return Err(self.unexpected(Expected::Description(
                        "end of comparison (comparisons do not chain)",
                    )));
                }
                compared = true;
            } else if prec < COMPARE {
                compared = false;
            }
            lhs = match kind {
                LParen => self.call(lhs)?,
                LBracket | Lbb => self.subscript(lhs)?,
                Dollar | At => self.member(lhs)?,
                _ => self.binary(lhs, prec, assoc, allow_eq)?,
            };
        }
        Ok(lhs)
    }

    fn prefix(&mut self) -> ReadResult<Ptr<'a>> {
        match self.current.kind {
            NumConst | StrConst | NullConst | Symbol | DotDotDot => self.primary(),
            LBrace => self.block(),
            LParen => {
                self.open(LParen, Nesting::Paren)?;
                let inner = self.expression(0, true)?;
                self.close(RParen)?;
                Ok(self.call_named("(", [inner]))
            }
            Minus | Plus => self.unary(UNARY),
            Not => self.unary(NOT),
            Tilde => self.unary(TILDE),
            Question => self.unary(QUESTION),
            Function => self.function(),
            If => self.if_else(),
            For => self.for_loop(),
            While => self.while_loop(),
            Repeat => self.repeat_loop(),
            Next | Break => {
                let keyword = self.advance()?;
                Ok(self.store.lang(self.symbol(&keyword.lexeme), Ptr::nil()))
            }
            _ => Err(self.unexpected(Expected::Expression)),
        }
    }

    /// A literal or symbol, with an optional namespace access.
    fn primary(&mut self) -> ReadResult<Ptr<'a>> {
        let token = self.advance()?;
        if matches!(self.current.kind, NsGet | NsGetInt) && matches!(token.kind, Symbol | StrConst)
        {
            let op = self.advance()?;
            if !matches!(self.current.kind, Symbol | StrConst) {
                return Err(self.unexpected(Expected::Token(Symbol)));
            }
            let name = self.advance()?;
            return Ok(self.call_named(&op.lexeme, [token.value, name.value]));
        }
        Ok(token.value)
    }

    fn unary(&mut self, prec: u16) -> ReadResult<Ptr<'a>> {
        let op = self.advance()?;
        let operand = self.expression(prec, true)?;
        Ok(self.call_named(&op.lexeme, [operand]))
    }

    fn binary(&mut self, lhs: Ptr<'a>, prec: u16, assoc: Assoc, allow_eq: bool) -> ReadResult<Ptr<'a>> {
        let op = self.advance()?;
        let rhs_min = if assoc == Assoc::Right { prec - 1 } else { prec };
        let rhs = self.expression(rhs_min, allow_eq || op.kind == EqAssign)?;
        let (name, first, second) = match op.kind {
            Star2 => ("^", lhs, rhs),
            // The assignment target always comes first.
            RightAssign if op.lexeme == "->>" => ("<<-", rhs, lhs),
            RightAssign => ("<-", rhs, lhs),
            _ => (op.lexeme.as_str(), lhs, rhs),
        };
        Ok(self.call_named(name, [first, second]))
    }

    fn block(&mut self) -> ReadResult<Ptr<'a>> {
        let brace = self.symbol("{");
        self.open(LBrace, Nesting::Brace)?;
        let body = self.expression_list(RBrace)?;
        self.close(RBrace)?;
        Ok(self.store.lang(brace, body))
    }

    fn call(&mut self, function: Ptr<'a>) -> ReadResult<Ptr<'a>> {
        self.open(LParen, Nesting::Paren)?;
        let args = self.sublist(RParen)?;
        self.close(RParen)?;
        Ok(self.store.lang(function, args))
    }

    /// `x[args]` or `x[[args]]`.
    fn subscript(&mut self, object: Ptr<'a>) -> ReadResult<Ptr<'a>> {
        let kind = self.current.kind;
        let op = self.symbol(if kind == Lbb { "[[" } else { "[" });
        self.open(kind, Nesting::Paren)?;
        let args = self.sublist(RBracket)?;
        if kind == Lbb {
            self.expect(RBracket)?;
        }
        self.close(RBracket)?;
        Ok(self.store.lang(op, self.store.cons(object, args)))
    }

    /// `x$name` or `x@name`; a string name is made a symbol.
    fn member(&mut self, object: Ptr<'a>) -> ReadResult<Ptr<'a>> {
        let op = self.advance()?;
        self.skip_newlines()?;
        let name = match self.current.kind {
            Symbol => self.advance()?.value,
            StrConst => {
                let token = self.advance()?;
                let text = token.value.as_text().unwrap_or_default();
                if text.is_empty() {
                    return Err(ReadErr::Lexical {
                        message: "attempt to use zero-length variable name".to_owned(),
                        line: token.line,
                        column: token.column,
                        at_end: false,
                    });
                }
                self.symbol(&text)
            }
            _ => return Err(self.unexpected(Expected::Token(Symbol))),
        };
        Ok(self.call_named(&op.lexeme, [object, name]))
    }

    /// Comma-separated arguments, up to (not including) `closer`.
    fn sublist(&mut self, closer: TokenKind) -> ReadResult<Ptr<'a>> {
        let mut list = StretchyList::new(self.store);
        if self.current.kind == closer {
            return Ok(list.finalize());
        }
        loop {
            if self.current.kind == Comma || self.current.kind == closer {
                list.append(self.store.missing_arg());
            } else {
                let item = self.expression(0, false)?;
                if self.current.kind == EqAssign {
                    let tag = self.argument_name(item)?;
                    self.advance()?;
                    let value = if self.current.kind == Comma || self.current.kind == closer {
                        self.store.missing_arg()
                    } else {
                        self.expression(0, false)?
                    };
                    list.append_tagged(value, tag);
                } else {
                    list.append(item);
                }
            }
            match self.current.kind {
                Comma => {
                    self.advance()?;
                }
                kind if kind == closer => break,
                _ => return Err(self.unexpected(Expected::Token(closer))),
            }
        }
        Ok(list.finalize())
    }

    /// The tag for `item = value`: a symbol, a string's text, or `NULL`.
    fn argument_name(&self, item: Ptr<'a>) -> ReadResult<Ptr<'a>> {
        match item.kind() {
            Kind::Symbol => Ok(item),
            Kind::Nil => Ok(self.symbol("NULL")),
            Kind::String => match item.as_text() {
                Some(text) => Ok(self.symbol(&text)),
                None => Err(self.unexpected(Expected::Description("a non-empty string name"))),
            },
            _ => Err(self.unexpected(Expected::Description(
                "a name, string, or NULL before '='",
            ))),
        }
    }

    /// `function(formals) body`
    fn function(&mut self) -> ReadResult<Ptr<'a>> {
        let keyword = self.advance()?;
        self.open(LParen, Nesting::Paren)?;
        let formals = self.formals()?;
        self.close(RParen)?;
        let body = self.expression(QUESTION, true)?;
        Ok(self.call_named(&keyword.lexeme, [formals, body]))
    }

    /// Formal arguments, as a pairlist tagged with their names. Arguments
    /// without a default hold the missing-argument marker.
    fn formals(&mut self) -> ReadResult<Ptr<'a>> {
        let mut list = StretchyList::new(self.store);
        let mut names = Vec::new();
        if self.current.kind == RParen {
            return Ok(list.finalize());
        }
        loop {
            if !matches!(self.current.kind, Symbol | DotDotDot) {
                return Err(self.unexpected(Expected::Token(Symbol)));
            }
            let name = self.advance()?;
            let text = name.value.symbol_name().unwrap_or_default();
            if names.contains(&text) {
                return Err(ReadErr::Syntax {
                    expected: Expected::Description("distinct formal argument names"),
                    found: name.kind,
                    line: name.line,
                    column: name.column,
                });
            }
            names.push(text);

            let default = if self.current.kind == EqAssign {
                self.advance()?;
                self.expression(0, false)?
            } else {
                self.store.missing_arg()
            };
            list.append_tagged(default, name.value);

            match self.current.kind {
                Comma => {
                    self.advance()?;
                }
                RParen => break,
                _ => return Err(self.unexpected(Expected::Token(RParen))),
            }
        }
        Ok(list.finalize())
    }

    /// A parenthesized condition, for `if` and `while`.
    fn condition(&mut self) -> ReadResult<Ptr<'a>> {
        self.open(LParen, Nesting::Paren)?;
        let condition = self.expression(0, true)?;
        self.close(RParen)?;
        Ok(condition)
    }

    /// `if (cond) a [else b]`
    fn if_else(&mut self) -> ReadResult<Ptr<'a>> {
        let keyword = self.advance()?;
        let condition = self.condition()?;
        let consequent = self.expression(QUESTION, true)?;
        let mut args = vec![condition, consequent];
        if let Some(alternative) = self.alternative()? {
            args.push(alternative);
        }
        Ok(self.call_named(&keyword.lexeme, args))
    }

    /// An `else` branch. Inside braces it may start on a later line.
    fn alternative(&mut self) -> ReadResult<Option<Ptr<'a>>> {
        if self.current.kind == Newline && self.nesting.last() == Some(&Nesting::Brace) {
            self.skip_newlines()?;
            if self.current.kind != Else {
                self.separator_pending = true;
                return Ok(None);
            }
        }
        if self.current.kind != Else {
            return Ok(None);
        }
        self.advance()?;
        Ok(Some(self.expression(QUESTION, true)?))
    }

    /// `for (var in seq) body`
    fn for_loop(&mut self) -> ReadResult<Ptr<'a>> {
        let keyword = self.advance()?;
        self.open(LParen, Nesting::Paren)?;
        let var = self.expect(Symbol)?.value;
        self.expect(In)?;
        let seq = self.expression(0, true)?;
        self.close(RParen)?;
        let body = self.expression(QUESTION, true)?;
        Ok(self.call_named(&keyword.lexeme, [var, seq, body]))
    }

    /// `while (cond) body`
    fn while_loop(&mut self) -> ReadResult<Ptr<'a>> {
        let keyword = self.advance()?;
        let condition = self.condition()?;
        let body = self.expression(QUESTION, true)?;
        Ok(self.call_named(&keyword.lexeme, [condition, body]))
    }

    fn repeat_loop(&mut self) -> ReadResult<Ptr<'a>> {
        let keyword = self.advance()?;
        let body = self.expression(QUESTION, true)?;
        Ok(self.call_named(&keyword.lexeme, [body]))
    }
}

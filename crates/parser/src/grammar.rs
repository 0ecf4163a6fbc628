use sliderule_common::error::{Error, Result};
use sliderule_common::types::Value;
use sliderule_ir::{
    Argument, NullOrdering, OrderByClause, OrderByElement, PartitionClause, SortDirection,
    WindowClause, WindowType,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::tokenizer::{Token, Tokenizer};

use crate::spec::AggregatorSpec;

/// Parses `name(arg, ...) [partitionBy(..)] [orderBy(..)] [rows|range(..)]`.
///
/// Clauses may appear in any order but each at most once, and at most one
/// of `rows`/`range`.
pub fn parse_aggregator_spec(input: &str) -> Result<AggregatorSpec> {
    let dialect = GenericDialect {};
    let tokens = Tokenizer::new(&dialect, input)
        .tokenize()
        .map_err(|e| Error::parse_error(format!("Tokenization error: {}", e)))?;

    let tokens: Vec<Token> = tokens
        .into_iter()
        .filter(|t| !matches!(t, Token::Whitespace(_) | Token::EOF))
        .collect();

    check_balanced(&tokens, input)?;

    let mut parser = SpecParser::new(tokens, input);
    let spec = parser.parse_spec()?;
    parser.expect_end()?;
    Ok(spec)
}

fn check_balanced(tokens: &[Token], input: &str) -> Result<()> {
    let mut depth: i64 = 0;
    for token in tokens {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => {
                depth -= 1;
                if depth < 0 {
                    break;
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(Error::parse_error(format!(
            "unbalanced parentheses in '{}'",
            input
        )));
    }
    Ok(())
}

fn normalize_keyword(word: &str) -> String {
    word.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

struct SpecParser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    input: &'a str,
}

impl<'a> SpecParser<'a> {
    fn new(tokens: Vec<Token>, input: &'a str) -> Self {
        Self {
            tokens,
            pos: 0,
            input,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, msg: impl std::fmt::Display) -> Error {
        Error::parse_error(format!("{} in '{}'", msg, self.input))
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.next() {
            Some(ref token) if *token == expected => Ok(()),
            Some(token) => Err(self.error(format!("expected {}, found {}", expected, token))),
            None => Err(self.error(format!("expected {}, found end of input", expected))),
        }
    }

    fn consume(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_end(&self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(self.error(format!("unexpected trailing token {}", token))),
        }
    }

    fn expect_word(&mut self, what: &str) -> Result<String> {
        match self.next() {
            Some(Token::Word(word)) => Ok(word.value),
            Some(token) => Err(self.error(format!("expected {}, found {}", what, token))),
            None => Err(self.error(format!("expected {}, found end of input", what))),
        }
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(w)) if w.quote_style.is_none() && w.value.eq_ignore_ascii_case(keyword))
    }

    fn parse_spec(&mut self) -> Result<AggregatorSpec> {
        let function = self.expect_word("function name")?;
        self.expect(Token::LParen)?;
        let arguments = self.parse_arguments()?;
        self.expect(Token::RParen)?;

        let mut spec = AggregatorSpec::new(function, arguments);

        while let Some(token) = self.peek() {
            let clause = match token {
                Token::Word(w) if w.quote_style.is_none() => normalize_keyword(&w.value),
                other => return Err(self.error(format!("unexpected token {}", other))),
            };
            self.pos += 1;

            match clause.as_str() {
                "partitionby" => {
                    if spec.partition.is_some() {
                        return Err(self.error("duplicate partitionBy clause"));
                    }
                    spec.partition = Some(self.parse_partition()?);
                }
                "orderby" => {
                    if spec.order_by.is_some() {
                        return Err(self.error("duplicate orderBy clause"));
                    }
                    spec.order_by = Some(self.parse_order_by()?);
                }
                "rows" | "range" => {
                    if spec.window.is_some() {
                        return Err(self.error("only one rows/range clause is allowed"));
                    }
                    let window_type = if clause == "rows" {
                        WindowType::Rows
                    } else {
                        WindowType::Range
                    };
                    spec.window = Some(self.parse_window(window_type)?);
                }
                other => return Err(self.error(format!("unknown clause '{}'", other))),
            }
        }

        Ok(spec)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Argument>> {
        let mut arguments = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            return Ok(arguments);
        }
        loop {
            arguments.push(self.parse_argument()?);
            if !self.consume(&Token::Comma) {
                break;
            }
        }
        Ok(arguments)
    }

    fn parse_argument(&mut self) -> Result<Argument> {
        match self.peek() {
            Some(Token::Mul) => {
                self.pos += 1;
                Ok(Argument::All)
            }
            Some(Token::Number(_, _)) | Some(Token::Minus) | Some(Token::Plus) => {
                Ok(Argument::Literal(self.parse_number()?))
            }
            Some(Token::SingleQuotedString(_)) => match self.next() {
                Some(Token::SingleQuotedString(s)) => Ok(Argument::Literal(Value::String(s))),
                _ => Err(self.error("expected string literal")),
            },
            Some(Token::Word(w)) if w.quote_style.is_none() => {
                match w.value.to_ascii_uppercase().as_str() {
                    "TRUE" => {
                        self.pos += 1;
                        Ok(Argument::Literal(Value::Bool(true)))
                    }
                    "FALSE" => {
                        self.pos += 1;
                        Ok(Argument::Literal(Value::Bool(false)))
                    }
                    "NULL" => {
                        self.pos += 1;
                        Ok(Argument::Literal(Value::Null))
                    }
                    _ => Ok(Argument::Field(self.parse_field()?)),
                }
            }
            Some(Token::Word(_)) => Ok(Argument::Field(self.parse_field()?)),
            Some(other) => Err(self.error(format!("unexpected argument {}", other))),
            None => Err(self.error("unexpected end of input in argument list")),
        }
    }

    fn parse_field(&mut self) -> Result<String> {
        let mut name = self.expect_word("field name")?;
        while self.consume(&Token::Period) {
            name.push('.');
            name.push_str(&self.expect_word("field name after '.'")?);
        }
        Ok(name)
    }

    fn parse_number(&mut self) -> Result<Value> {
        let negative = match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                true
            }
            Some(Token::Plus) => {
                self.pos += 1;
                false
            }
            _ => false,
        };

        let text = match self.next() {
            Some(Token::Number(text, _)) => text,
            Some(token) => return Err(self.error(format!("expected number, found {}", token))),
            None => return Err(self.error("expected number, found end of input")),
        };

        let is_float = text.contains(['.', 'e', 'E']);
        if !is_float && let Ok(n) = text.parse::<i64>() {
            return Ok(Value::Int64(if negative { -n } else { n }));
        }

        let f = text
            .parse::<f64>()
            .map_err(|_| self.error(format!("invalid number '{}'", text)))?;
        Ok(Value::float64(if negative { -f } else { f }))
    }

    fn parse_partition(&mut self) -> Result<PartitionClause> {
        self.expect(Token::LParen)?;
        let mut fields = vec![self.parse_field()?];
        while self.consume(&Token::Comma) {
            fields.push(self.parse_field()?);
        }
        self.expect(Token::RParen)?;
        Ok(PartitionClause::new(fields))
    }

    fn parse_order_by(&mut self) -> Result<OrderByClause> {
        self.expect(Token::LParen)?;
        let mut elements = vec![self.parse_order_by_element()?];
        while self.consume(&Token::Comma) {
            elements.push(self.parse_order_by_element()?);
        }
        self.expect(Token::RParen)?;
        Ok(OrderByClause::new(elements))
    }

    fn parse_order_by_element(&mut self) -> Result<OrderByElement> {
        let field = self.parse_field()?;

        let direction = if self.peek_keyword("ASC") {
            self.pos += 1;
            SortDirection::Asc
        } else if self.peek_keyword("DESC") {
            self.pos += 1;
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };

        let mut element = OrderByElement::new(field, direction);

        if self.peek_keyword("NULLS") {
            self.pos += 1;
            let nulls = if self.peek_keyword("FIRST") {
                NullOrdering::First
            } else if self.peek_keyword("LAST") {
                NullOrdering::Last
            } else {
                return Err(self.error("expected FIRST or LAST after NULLS"));
            };
            self.pos += 1;
            element = element.nulls(nulls);
        }

        Ok(element)
    }

    fn parse_bound(&mut self) -> Result<Option<f64>> {
        match self.peek() {
            Some(Token::Comma) | Some(Token::RParen) => Ok(None),
            _ => {
                let value = self.parse_number()?;
                value
                    .as_f64()
                    .map(Some)
                    .ok_or_else(|| self.error("window bound must be numeric"))
            }
        }
    }

    // `()` leaves both ends open; `(a)` is shorthand for `(a, 0)`.
    fn parse_window(&mut self, window_type: WindowType) -> Result<WindowClause> {
        self.expect(Token::LParen)?;
        if self.consume(&Token::RParen) {
            return Ok(WindowClause::new(window_type, None, None));
        }

        let start = self.parse_bound()?;
        let end = if self.consume(&Token::Comma) {
            self.parse_bound()?
        } else if start.is_some() {
            Some(0.0)
        } else {
            None
        };
        self.expect(Token::RParen)?;

        Ok(WindowClause::new(window_type, start, end))
    }
}

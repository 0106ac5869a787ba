//! Statement parser
//!
//! Covers exactly the statements the ODBC layer issues against a test
//! database:
//!
//! ```text
//! CREATE TABLE t (col type [NOT NULL | NULL | AUTO_INCREMENT | PRIMARY KEY]..)
//! DROP TABLE t
//! INSERT INTO t [(col, ..)] VALUES (literal | ? | NULL, ..)
//! SELECT COUNT(*) | col [, col].. FROM t [WHERE col = literal | ?]
//! ```
//!
//! Keywords and unquoted identifiers are case-insensitive; identifiers are
//! folded to lower case. `?` placeholders are numbered left to right.

use actian_odbc_core::{Error, Result, Value};

/// Declared column type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// INT, INTEGER, BIGINT, SMALLINT
    Int,
    /// VARCHAR(n) or CHAR(n); `None` means unbounded
    Varchar(Option<usize>),
    /// TIME
    Time,
}

impl ColumnType {
    /// Check a value against the declared type
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (ColumnType::Int, Value::Int(_)) => true,
            (ColumnType::Varchar(_), Value::String(_)) => true,
            (ColumnType::Time, Value::Time(_)) => true,
            _ => false,
        }
    }
}

/// Column definition from CREATE TABLE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name
    pub name: String,
    /// Declared type
    pub ty: ColumnType,
    /// False when declared NOT NULL or PRIMARY KEY
    pub nullable: bool,
    /// Filled from the table's counter when omitted on insert
    pub auto_increment: bool,
    /// Declared PRIMARY KEY
    pub primary_key: bool,
}

/// Literal or placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Inline literal
    Literal(Value),
    /// Zero-based placeholder index
    Param(usize),
}

impl Expr {
    /// Resolve against bound parameters
    pub fn resolve(&self, params: &[Value]) -> Result<Value> {
        match self {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Param(i) => params.get(*i).cloned().ok_or_else(|| {
                Error::Execution(format!(
                    "parameter {} not bound ({} supplied)",
                    i + 1,
                    params.len()
                ))
            }),
        }
    }
}

/// SELECT list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// COUNT(*)
    CountStar,
    /// Named columns
    Columns(Vec<String>),
}

/// Equality filter from WHERE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Column compared
    pub column: String,
    /// Value compared against
    pub value: Expr,
}

/// A parsed statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// CREATE TABLE
    CreateTable {
        /// Table name
        name: String,
        /// Column definitions in order
        columns: Vec<ColumnDef>,
    },
    /// DROP TABLE
    DropTable {
        /// Table name
        name: String,
    },
    /// INSERT
    Insert {
        /// Target table
        table: String,
        /// Explicit column list, or all columns in order
        columns: Option<Vec<String>>,
        /// One row of values
        values: Vec<Expr>,
    },
    /// SELECT
    Select {
        /// What to return
        projection: Projection,
        /// Source table
        table: String,
        /// Optional equality filter
        filter: Option<Filter>,
    },
}

impl Statement {
    /// Check if the statement returns rows
    pub fn is_query(&self) -> bool {
        matches!(self, Statement::Select { .. })
    }

    /// Number of `?` placeholders
    pub fn param_count(&self) -> usize {
        let count = |e: &Expr| usize::from(matches!(e, Expr::Param(_)));
        match self {
            Statement::Insert { values, .. } => values.iter().map(count).sum(),
            Statement::Select {
                filter: Some(f), ..
            } => count(&f.value),
            _ => 0,
        }
    }
}

/// Parse one statement
pub fn parse(sql: &str) -> Result<Statement> {
    let tokens = tokenize(sql)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        next_param: 0,
    };
    let stmt = parser.statement()?;
    parser.eat(&Token::Semicolon);
    if let Some(tok) = parser.peek() {
        return Err(syntax(format!("unexpected {:?} after statement", tok)));
    }
    Ok(stmt)
}

fn syntax(msg: impl Into<String>) -> Error {
    Error::Execution(format!("syntax error: {}", msg.into()))
}

// ============================================================================
// Tokenizer
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Int(i64),
    Str(String),
    LParen,
    RParen,
    Comma,
    Star,
    Eq,
    Question,
    Semicolon,
}

fn tokenize(sql: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = sql.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' | ')' | ',' | '*' | '=' | '?' | ';' => {
                chars.next();
                tokens.push(match c {
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    ',' => Token::Comma,
                    '*' => Token::Star,
                    '=' => Token::Eq,
                    '?' => Token::Question,
                    _ => Token::Semicolon,
                });
            }
            '\'' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('\'') if chars.peek() == Some(&'\'') => {
                            chars.next();
                            s.push('\'');
                        }
                        Some('\'') => break,
                        Some(ch) => s.push(ch),
                        None => return Err(syntax("unterminated string literal")),
                    }
                }
                tokens.push(Token::Str(s));
            }
            '-' | '0'..='9' => {
                let mut digits = String::new();
                digits.push(c);
                chars.next();
                while let Some(&d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                    digits.push(d);
                    chars.next();
                }
                let n = digits
                    .parse::<i64>()
                    .map_err(|_| syntax(format!("invalid number '{}'", digits)))?;
                tokens.push(Token::Int(n));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&d) = chars
                    .peek()
                    .filter(|d| d.is_ascii_alphanumeric() || **d == '_')
                {
                    ident.push(d.to_ascii_lowercase());
                    chars.next();
                }
                tokens.push(Token::Ident(ident));
            }
            other => return Err(syntax(format!("unexpected character '{}'", other))),
        }
    }
    Ok(tokens)
}

// ============================================================================
// Parser
// ============================================================================

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    next_param: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn eat(&mut self, tok: &Token) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: Token) -> Result<()> {
        match self.next() {
            Some(t) if t == tok => Ok(()),
            other => Err(syntax(format!("expected {:?}, found {:?}", tok, other))),
        }
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        match self.peek() {
            Some(Token::Ident(s)) if s == kw => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<()> {
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            Err(syntax(format!(
                "expected {}, found {:?}",
                kw.to_uppercase(),
                self.peek()
            )))
        }
    }

    fn ident(&mut self) -> Result<String> {
        match self.next() {
            Some(Token::Ident(s)) => Ok(s),
            other => Err(syntax(format!("expected identifier, found {:?}", other))),
        }
    }

    fn statement(&mut self) -> Result<Statement> {
        match self.next() {
            Some(Token::Ident(kw)) => match kw.as_str() {
                "create" => self.create_table(),
                "drop" => self.drop_table(),
                "insert" => self.insert(),
                "select" => self.select(),
                other => Err(Error::Execution(format!(
                    "unsupported statement '{}'",
                    other.to_uppercase()
                ))),
            },
            other => Err(syntax(format!("expected statement, found {:?}", other))),
        }
    }

    fn create_table(&mut self) -> Result<Statement> {
        self.expect_keyword("table")?;
        let name = self.ident()?;
        self.expect(Token::LParen)?;
        let mut columns = vec![self.column_def()?];
        while self.eat(&Token::Comma) {
            columns.push(self.column_def()?);
        }
        self.expect(Token::RParen)?;
        Ok(Statement::CreateTable { name, columns })
    }

    fn column_def(&mut self) -> Result<ColumnDef> {
        let name = self.ident()?;
        let ty = match self.ident()?.as_str() {
            "int" | "integer" | "bigint" | "smallint" => ColumnType::Int,
            "varchar" | "char" => {
                let len = if self.eat(&Token::LParen) {
                    let n = match self.next() {
                        Some(Token::Int(n)) if n > 0 => n as usize,
                        other => {
                            return Err(syntax(format!("invalid length {:?}", other)));
                        }
                    };
                    self.expect(Token::RParen)?;
                    Some(n)
                } else {
                    None
                };
                ColumnType::Varchar(len)
            }
            "time" => ColumnType::Time,
            other => {
                return Err(Error::Execution(format!(
                    "unsupported column type '{}'",
                    other
                )))
            }
        };

        let mut col = ColumnDef {
            name,
            ty,
            nullable: true,
            auto_increment: false,
            primary_key: false,
        };
        loop {
            if self.eat_keyword("not") {
                self.expect_keyword("null")?;
                col.nullable = false;
            } else if self.eat_keyword("null") {
                col.nullable = true;
            } else if self.eat_keyword("auto_increment") {
                col.auto_increment = true;
            } else if self.eat_keyword("primary") {
                self.expect_keyword("key")?;
                col.primary_key = true;
                col.nullable = false;
            } else {
                break;
            }
        }
        if col.auto_increment && col.ty != ColumnType::Int {
            return Err(Error::Execution(format!(
                "AUTO_INCREMENT column '{}' must be an integer",
                col.name
            )));
        }
        Ok(col)
    }

    fn drop_table(&mut self) -> Result<Statement> {
        self.expect_keyword("table")?;
        Ok(Statement::DropTable { name: self.ident()? })
    }

    fn insert(&mut self) -> Result<Statement> {
        self.expect_keyword("into")?;
        let table = self.ident()?;

        let columns = if self.eat(&Token::LParen) {
            let mut cols = vec![self.ident()?];
            while self.eat(&Token::Comma) {
                cols.push(self.ident()?);
            }
            self.expect(Token::RParen)?;
            Some(cols)
        } else {
            None
        };

        self.expect_keyword("values")?;
        self.expect(Token::LParen)?;
        let mut values = vec![self.expr()?];
        while self.eat(&Token::Comma) {
            values.push(self.expr()?);
        }
        self.expect(Token::RParen)?;

        if let Some(cols) = &columns {
            if cols.len() != values.len() {
                return Err(Error::Execution(format!(
                    "{} columns but {} values",
                    cols.len(),
                    values.len()
                )));
            }
        }
        Ok(Statement::Insert {
            table,
            columns,
            values,
        })
    }

    fn select(&mut self) -> Result<Statement> {
        let projection = if self.eat_keyword("count") {
            self.expect(Token::LParen)?;
            self.expect(Token::Star)?;
            self.expect(Token::RParen)?;
            Projection::CountStar
        } else {
            let mut cols = vec![self.ident()?];
            while self.eat(&Token::Comma) {
                cols.push(self.ident()?);
            }
            Projection::Columns(cols)
        };

        self.expect_keyword("from")?;
        let table = self.ident()?;

        let filter = if self.eat_keyword("where") {
            let column = self.ident()?;
            self.expect(Token::Eq)?;
            Some(Filter {
                column,
                value: self.expr()?,
            })
        } else {
            None
        };

        Ok(Statement::Select {
            projection,
            table,
            filter,
        })
    }

    fn expr(&mut self) -> Result<Expr> {
        match self.next() {
            Some(Token::Question) => {
                let idx = self.next_param;
                self.next_param += 1;
                Ok(Expr::Param(idx))
            }
            Some(Token::Int(n)) => Ok(Expr::Literal(Value::Int(n))),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::String(s))),
            Some(Token::Ident(kw)) if kw == "null" => Ok(Expr::Literal(Value::Null)),
            other => Err(syntax(format!("expected value, found {:?}", other))),
        }
    }
}

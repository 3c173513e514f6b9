/*!
Recursive‑descent parser for Monkey.

Consumes the token slice produced by [`Scanner`](crate::scanner::Scanner)
and builds an owned [`Program`].  Each token is consumed once, so the parse
is Θ(n) in the number of tokens.  Call‑stack depth grows with syntactic
nesting; the recursive entry points grow the stack on demand, so deeply
nested input parses instead of overflowing.

Logging: `info` for lifecycle milestones, `debug` on grammar descent and
just before a structured error is returned.

Grammar (EBNF)
--------------

```text
program        → statement* EOF ;
statement      → letStmt | returnStmt | exprStmt ;
letStmt        → "let" IDENT "=" expression ";"? ;
returnStmt     → "return" expression ";"? ;
exprStmt       → expression ";"? ;
block          → "{" statement* "}" ;
expression     → equality ;
equality       → comparison ( ( "!=" | "==" ) comparison )* ;
comparison     → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term           → factor ( ( "-" | "+" ) factor )* ;
factor         → unary ( ( "/" | "*" ) unary )* ;
unary          → ( "!" | "-" ) unary | postfix ;
postfix        → primary ( "(" arguments? ")" | "[" expression "]" )* ;
arguments      → expression ( "," expression )* ;
primary        → INT | STRING | "true" | "false" | IDENT
               | "(" expression ")" | "[" arguments? "]"
               | "if" expression block ( "else" block )?
               | "fn" "(" parameters? ")" block ;
parameters     → IDENT ( "," IDENT )* ;
```
*/

use std::rc::Rc;

use crate::ast::{
    BlockStatement, Expression, Identifier, InfixOperator, PrefixOperator, Program, Statement,
};
use crate::error::{MonkeyError, Result};
use crate::scanner::Scanner;
use crate::stack::ensure_sufficient_stack;
use crate::token::{Token, TokenType};

use log::{debug, info};

/// Guard returned by [`Parser::peek`] when the slice has no trailing `EOF`.
static EOF_TOKEN: Token<'static> = Token {
    token_type: TokenType::EOF,
    lexeme: "",
    line: 0,
};

/// Scan and parse `source` in one step.
pub fn parse_program(source: &str) -> Result<Program> {
    let tokens: Vec<Token<'_>> = Scanner::new(source).collect::<Result<_>>()?;

    Parser::new(&tokens).parse()
}

/// Top‑level parser over an immutable slice of tokens.
pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    current: usize,
}

impl<'a> Parser<'a> {
    /// Construct a new parser.  `tokens` is expected to end with `EOF`.
    pub fn new(tokens: &'a [Token<'a>]) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self { tokens, current: 0 }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program.  Stops at the first syntax error.
    pub fn parse(&mut self) -> Result<Program> {
        info!("Beginning parse phase");

        let mut statements: Vec<Statement> = Vec::new();

        while !self.is_at_end() {
            statements.push(self.statement()?);
        }

        info!("Parsed {} top-level statements", statements.len());

        Ok(Program { statements })
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Statement> {
        debug!("Entering statement at line {}", self.peek().line);

        if self.matches(TokenType::LET) {
            self.let_statement()
        } else if self.matches(TokenType::RETURN) {
            self.return_statement()
        } else {
            self.expression_statement()
        }
    }

    fn let_statement(&mut self) -> Result<Statement> {
        let name: &Token<'_> = self.consume(TokenType::IDENTIFIER, "Expected variable name")?;

        self.consume(TokenType::EQUAL, "Expected '=' after variable name")?;

        let value: Expression = self.expression()?;

        self.matches(TokenType::SEMICOLON);

        Ok(Statement::Let {
            name: Identifier::new(name.lexeme),
            value,
        })
    }

    fn return_statement(&mut self) -> Result<Statement> {
        let value: Expression = self.expression()?;

        self.matches(TokenType::SEMICOLON);

        Ok(Statement::Return(value))
    }

    fn expression_statement(&mut self) -> Result<Statement> {
        let expr: Expression = self.expression()?;

        self.matches(TokenType::SEMICOLON);

        Ok(Statement::Expression(expr))
    }

    fn block(&mut self) -> Result<BlockStatement> {
        self.consume(TokenType::LEFT_BRACE, "Expected '{' before block")?;

        let mut statements: Vec<Statement> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            statements.push(self.statement()?);
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after block")?;

        Ok(BlockStatement { statements })
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> Result<Expression> {
        ensure_sufficient_stack(|| self.equality())
    }

    /// Folds `next (op next)*` left‑associatively for the operators `ops`
    /// accepts.
    fn binary(
        &mut self,
        next: fn(&mut Self) -> Result<Expression>,
        ops: fn(&TokenType) -> Option<InfixOperator>,
    ) -> Result<Expression> {
        let mut expr: Expression = next(self)?;

        while let Some(operator) = ops(&self.peek().token_type) {
            self.advance();

            let right: Expression = next(self)?;

            expr = Expression::Infix {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expression> {
        self.binary(Self::comparison, |tt| match tt {
            TokenType::EQUAL_EQUAL => Some(InfixOperator::Equal),
            TokenType::BANG_EQUAL => Some(InfixOperator::NotEqual),
            _ => None,
        })
    }

    fn comparison(&mut self) -> Result<Expression> {
        self.binary(Self::term, |tt| match tt {
            TokenType::LESS => Some(InfixOperator::Less),
            TokenType::LESS_EQUAL => Some(InfixOperator::LessEqual),
            TokenType::GREATER => Some(InfixOperator::Greater),
            TokenType::GREATER_EQUAL => Some(InfixOperator::GreaterEqual),
            _ => None,
        })
    }

    fn term(&mut self) -> Result<Expression> {
        self.binary(Self::factor, |tt| match tt {
            TokenType::PLUS => Some(InfixOperator::Plus),
            TokenType::MINUS => Some(InfixOperator::Minus),
            _ => None,
        })
    }

    fn factor(&mut self) -> Result<Expression> {
        self.binary(Self::unary, |tt| match tt {
            TokenType::STAR => Some(InfixOperator::Star),
            TokenType::SLASH => Some(InfixOperator::Slash),
            _ => None,
        })
    }

    fn unary(&mut self) -> Result<Expression> {
        let operator: Option<PrefixOperator> = match self.peek().token_type {
            TokenType::BANG => Some(PrefixOperator::Bang),
            TokenType::MINUS => Some(PrefixOperator::Minus),
            _ => None,
        };

        if let Some(operator) = operator {
            self.advance();

            let right: Expression = ensure_sufficient_stack(|| self.unary())?;

            return Ok(Expression::Prefix {
                operator,
                right: Box::new(right),
            });
        }

        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expression> {
        let mut expr: Expression = self.primary()?;

        loop {
            if self.matches(TokenType::LEFT_PAREN) {
                let arguments: Vec<Expression> =
                    self.expression_list(TokenType::RIGHT_PAREN, "Expected ')' after arguments")?;

                expr = Expression::Call {
                    function: Box::new(expr),
                    arguments,
                };
            } else if self.matches(TokenType::LEFT_BRACKET) {
                let index: Expression = self.expression()?;

                self.consume(TokenType::RIGHT_BRACKET, "Expected ']' after index")?;

                expr = Expression::Index {
                    left: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Comma‑separated expressions up to and including `close`.
    fn expression_list(&mut self, close: TokenType, message: &str) -> Result<Vec<Expression>> {
        let mut items: Vec<Expression> = Vec::new();

        if !self.check(close.clone()) {
            loop {
                items.push(self.expression()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(close, message)?;

        Ok(items)
    }

    fn primary(&mut self) -> Result<Expression> {
        let token: &'a Token<'a> = self.peek();

        match &token.token_type {
            TokenType::INT(n) => {
                self.advance();
                Ok(Expression::Integer(*n))
            }

            TokenType::STRING(s) => {
                self.advance();
                Ok(Expression::String(s.clone()))
            }

            TokenType::TRUE => {
                self.advance();
                Ok(Expression::Boolean(true))
            }

            TokenType::FALSE => {
                self.advance();
                Ok(Expression::Boolean(false))
            }

            TokenType::IDENTIFIER => {
                self.advance();
                Ok(Expression::Identifier(Identifier::new(token.lexeme)))
            }

            TokenType::LEFT_PAREN => {
                self.advance();

                let expr: Expression = self.expression()?;

                self.consume(TokenType::RIGHT_PAREN, "Expected ')' after expression")?;

                Ok(expr)
            }

            TokenType::LEFT_BRACKET => {
                self.advance();

                let elements: Vec<Expression> = self.expression_list(
                    TokenType::RIGHT_BRACKET,
                    "Expected ']' after array elements",
                )?;

                Ok(Expression::Array(elements))
            }

            TokenType::IF => {
                self.advance();
                self.if_expression()
            }

            TokenType::FUNCTION => {
                self.advance();
                self.function_literal()
            }

            _ => {
                debug!("No primary expression at {:?}", token);

                Err(MonkeyError::parse(
                    token.line,
                    format!("Expected expression, found '{}'", token.lexeme),
                ))
            }
        }
    }

    fn if_expression(&mut self) -> Result<Expression> {
        let condition: Expression = self.expression()?;
        let consequence: BlockStatement = self.block()?;

        let alternative: Option<BlockStatement> = if self.matches(TokenType::ELSE) {
            Some(self.block()?)
        } else {
            None
        };

        Ok(Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn function_literal(&mut self) -> Result<Expression> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'fn'")?;

        let mut parameters: Vec<Identifier> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                let param: &Token<'_> =
                    self.consume(TokenType::IDENTIFIER, "Expected parameter name")?;

                parameters.push(Identifier::new(param.lexeme));

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after parameters")?;

        let body: BlockStatement = self.block()?;

        Ok(Expression::Function {
            parameters,
            body: Rc::new(body),
        })
    }

    // ────────────────────── utility helpers ───────────────────────

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<&'a Token<'a>> {
        if self.check(ttype) {
            return Ok(self.advance());
        }

        let found: &Token<'_> = self.peek();

        debug!("consume failed: {} (found {:?})", message, found.token_type);

        Err(MonkeyError::parse(
            found.line,
            format!("{}, found '{}'", message, found.lexeme),
        ))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    #[inline(always)]
    fn advance(&mut self) -> &'a Token<'a> {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &'a Token<'a> {
        self.tokens.get(self.current).unwrap_or(&EOF_TOKEN)
    }

    #[inline(always)]
    fn previous(&self) -> &'a Token<'a> {
        &self.tokens[self.current - 1]
    }
}

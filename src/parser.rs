use crate::{
    ast::{BinaryExpr, CallExpr, Expr, LiteralExpr, LogicalExpr, Stmt, UnaryExpr},
    scanner::{Literal, Token, TokenKind},
};

use std::iter::Peekable;

/// Recursive-descent parser with panic-mode recovery: a parse error discards
/// the offending declaration, resynchronizes, and parsing continues, so the
/// returned program is always runnable.
pub struct Parser<I>
where
    I: Iterator<Item = Token>,
{
    tokens: Peekable<I>,
}

#[derive(thiserror::Error, Debug)]
#[error("Parse error on line {line}: {message}")]
pub struct ParseError {
    pub line: u32,
    pub message: String,
}

impl<I: Iterator<Item = Token>> Parser<I> {
    pub fn new(tokens: I) -> Self {
        Parser {
            tokens: tokens.peekable(),
        }
    }

    pub fn parse(&mut self) -> (Vec<Stmt>, Vec<ParseError>) {
        let mut statements = vec![];
        let mut errors = vec![];
        while !self.at_end() {
            match self.declaration() {
                Ok(statement) => statements.push(statement),
                Err(error) => {
                    errors.push(error);
                    self.synchronize();
                }
            }
        }
        (statements, errors)
    }

    fn declaration(&mut self) -> Result<Stmt, ParseError> {
        if self.advance_on_match(&[TokenKind::Function]).is_some() {
            self.function_declaration()
        } else if self
            .advance_on_match(&[TokenKind::Var, TokenKind::Let, TokenKind::Const])
            .is_some()
        {
            self.var_declaration()
        } else {
            self.statement()
        }
    }

    fn function_declaration(&mut self) -> Result<Stmt, ParseError> {
        let name = self.consume(TokenKind::Identifier, "Expect function name.")?;
        self.consume(TokenKind::LeftParen, "Expect '(' after function name.")?;
        let mut params = vec![];
        if !self.check(TokenKind::RightParen) {
            loop {
                params.push(self.consume(TokenKind::Variable, "Expect parameter name.")?);
                if self.advance_on_match(&[TokenKind::Comma]).is_none() {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.")?;
        self.consume(TokenKind::LeftBrace, "Expect '{' before function body.")?;
        let body = self.block_statements()?;
        Ok(Stmt::Function { name, params, body })
    }

    fn var_declaration(&mut self) -> Result<Stmt, ParseError> {
        let name = self.consume(TokenKind::Variable, "Expect variable name.")?;
        let initializer = if self.advance_on_match(&[TokenKind::Equal]).is_some() {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var { name, initializer })
    }

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        if self.advance_on_match(&[TokenKind::If]).is_some() {
            return self.if_statement();
        }
        if self.advance_on_match(&[TokenKind::Echo]).is_some() {
            return self.echo_statement();
        }
        if let Some(keyword) = self.advance_on_match(&[TokenKind::Return]) {
            return self.return_statement(keyword);
        }
        if self.advance_on_match(&[TokenKind::While]).is_some() {
            return self.while_statement();
        }
        if self.advance_on_match(&[TokenKind::For]).is_some() {
            return self.for_statement();
        }
        if self.advance_on_match(&[TokenKind::Foreach]).is_some() {
            return self.foreach_statement();
        }
        if self.advance_on_match(&[TokenKind::LeftBrace]).is_some() {
            return Ok(Stmt::Block(self.block_statements()?));
        }
        self.expression_statement()
    }

    fn if_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after if condition.")?;
        let then_branch = Box::new(self.statement()?);

        let else_branch = if self.advance_on_match(&[TokenKind::Elseif]).is_some() {
            Some(Box::new(self.if_statement()?))
        } else if self.advance_on_match(&[TokenKind::Else]).is_some() {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::IfElse {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn echo_statement(&mut self) -> Result<Stmt, ParseError> {
        let value = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after echo value.")?;
        Ok(Stmt::Echo(value))
    }

    fn return_statement(&mut self, keyword: Token) -> Result<Stmt, ParseError> {
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after while condition.")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::WhileLoop { condition, body })
    }

    /// `for (init; cond; step) body` desugars into
    /// `{ init; while (cond) { body; step; } }` with a missing condition
    /// read as `true`.
    fn for_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.advance_on_match(&[TokenKind::Semicolon]).is_some() {
            None
        } else if self
            .advance_on_match(&[TokenKind::Var, TokenKind::Let, TokenKind::Const])
            .is_some()
        {
            Some(self.var_declaration()?)
        } else {
            let expr = self.expression()?;
            self.consume(TokenKind::Semicolon, "Expect ';' after loop initializer.")?;
            Some(Stmt::Expression(expr))
        };

        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;
        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }
        let condition = condition.unwrap_or(Expr::Literal(LiteralExpr::Boolean(true)));
        body = Stmt::WhileLoop {
            condition,
            body: Box::new(body),
        };
        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }
        Ok(body)
    }

    fn foreach_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'foreach'.")?;
        let array = self.expression()?;
        self.consume(TokenKind::As, "Expect 'as' after foreach array.")?;
        let item = self.consume(TokenKind::Variable, "Expect item variable after 'as'.")?;
        self.consume(TokenKind::RightParen, "Expect ')' after foreach item.")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::Foreach { array, item, body })
    }

    fn block_statements(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = vec![];
        while !self.check(TokenKind::RightBrace) && !self.at_end() {
            statements.push(self.declaration()?);
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn expression_statement(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, ParseError> {
        let expr = self.logic_or()?;

        if let Some(equals) = self.advance_on_match(&[TokenKind::Equal]) {
            let value = self.assignment()?;
            if let Expr::Variable(name) = expr {
                return Ok(Expr::Assign {
                    name,
                    value: Box::new(value),
                });
            }
            return Err(ParseError {
                line: equals.line,
                message: "Invalid assignment target.".into(),
            });
        }

        Ok(expr)
    }

    fn logic_or(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.logic_and()?;
        while let Some(operator) = self.advance_on_match(&[TokenKind::Or]) {
            let right = self.logic_and()?;
            expr = Expr::Logical(Box::new(LogicalExpr {
                left: expr,
                operator,
                right,
            }));
        }
        Ok(expr)
    }

    fn logic_and(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.equality()?;
        while let Some(operator) = self.advance_on_match(&[TokenKind::And]) {
            let right = self.equality()?;
            expr = Expr::Logical(Box::new(LogicalExpr {
                left: expr,
                operator,
                right,
            }));
        }
        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.comparison()?;
        while let Some(operator) = self.advance_on_match(&[
            TokenKind::BangEqual,
            TokenKind::EqualEqual,
            TokenKind::BangEqualEqual,
            TokenKind::EqualEqualEqual,
        ]) {
            let right = self.comparison()?;
            expr = Expr::Binary(Box::new(BinaryExpr {
                left: expr,
                operator,
                right,
            }));
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.term()?;
        while let Some(operator) = self.advance_on_match(&[
            TokenKind::Greater,
            TokenKind::GreaterEqual,
            TokenKind::Less,
            TokenKind::LessEqual,
        ]) {
            let right = self.term()?;
            expr = Expr::Binary(Box::new(BinaryExpr {
                left: expr,
                operator,
                right,
            }));
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.factor()?;
        while let Some(operator) =
            self.advance_on_match(&[TokenKind::Plus, TokenKind::Minus, TokenKind::Dot])
        {
            let right = self.factor()?;
            expr = Expr::Binary(Box::new(BinaryExpr {
                left: expr,
                operator,
                right,
            }));
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.unary()?;
        while let Some(operator) = self.advance_on_match(&[
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::Percent,
            TokenKind::StarStar,
        ]) {
            let right = self.unary()?;
            expr = Expr::Binary(Box::new(BinaryExpr {
                left: expr,
                operator,
                right,
            }));
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if let Some(operator) = self.advance_on_match(&[TokenKind::Bang, TokenKind::Minus]) {
            let right = self.unary()?;
            return Ok(Expr::Unary(Box::new(UnaryExpr { operator, right })));
        }
        self.call()
    }

    fn call(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;
        while self.advance_on_match(&[TokenKind::LeftParen]).is_some() {
            expr = self.finish_call(expr)?;
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr, ParseError> {
        let mut arguments = vec![];
        if !self.check(TokenKind::RightParen) {
            loop {
                arguments.push(self.expression()?);
                if self.advance_on_match(&[TokenKind::Comma]).is_none() {
                    break;
                }
            }
        }
        let paren = self.consume(TokenKind::RightParen, "Expect ')' after arguments.")?;
        Ok(Expr::Call(Box::new(CallExpr {
            callee,
            paren,
            arguments,
        })))
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let token = match self.tokens.next_if(|token| token.kind != TokenKind::Eof) {
            Some(token) => token,
            None => {
                return Err(ParseError {
                    line: self.peek_line(),
                    message: "Expect expression.".into(),
                })
            }
        };

        let expr = match token.kind {
            TokenKind::True => Expr::Literal(LiteralExpr::Boolean(true)),
            TokenKind::False => Expr::Literal(LiteralExpr::Boolean(false)),
            TokenKind::Null => Expr::Literal(LiteralExpr::Null),
            TokenKind::Number => match token.literal {
                Some(Literal::Number(value)) => Expr::Literal(LiteralExpr::Number(value)),
                _ => unreachable!("number token always carries its value"),
            },
            TokenKind::String => match token.literal {
                Some(Literal::Text(body)) => Expr::Literal(LiteralExpr::String(body)),
                _ => unreachable!("string token always carries its body"),
            },
            TokenKind::Variable | TokenKind::Identifier => Expr::Variable(token),
            TokenKind::LeftBracket => {
                let mut elements = vec![];
                if !self.check(TokenKind::RightBracket) {
                    loop {
                        elements.push(self.expression()?);
                        if self.advance_on_match(&[TokenKind::Comma]).is_none() {
                            break;
                        }
                    }
                }
                self.consume(TokenKind::RightBracket, "Expect ']' after array elements.")?;
                Expr::Array(elements)
            }
            TokenKind::LeftParen => {
                let expr = self.expression()?;
                self.consume(TokenKind::RightParen, "Expect ')' after expression.")?;
                Expr::Grouping(Box::new(expr))
            }
            _ => {
                return Err(ParseError {
                    line: token.line,
                    message: "Expect expression.".into(),
                })
            }
        };
        Ok(expr)
    }

    /// Skips past a semicolon or stops just before a token that can begin a
    /// declaration, so the next parse attempt starts on a clean boundary.
    fn synchronize(&mut self) {
        while let Some(token) = self.tokens.peek() {
            match token.kind {
                TokenKind::Eof => return,
                TokenKind::Semicolon => {
                    self.tokens.next();
                    return;
                }
                TokenKind::Function
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Echo
                | TokenKind::Return => return,
                _ => {
                    self.tokens.next();
                }
            }
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token, ParseError> {
        match self.tokens.next_if(|token| token.kind == kind) {
            Some(token) => Ok(token),
            None => Err(ParseError {
                line: self.peek_line(),
                message: message.to_string(),
            }),
        }
    }

    fn check(&mut self, kind: TokenKind) -> bool {
        self.tokens
            .peek()
            .map(|token| token.kind == kind)
            .unwrap_or(false)
    }

    fn at_end(&mut self) -> bool {
        self.tokens
            .peek()
            .map(|token| token.kind == TokenKind::Eof)
            .unwrap_or(true)
    }

    fn peek_line(&mut self) -> u32 {
        self.tokens.peek().map(|token| token.line).unwrap_or(0)
    }

    fn advance_on_match(&mut self, kinds: &[TokenKind]) -> Option<Token> {
        self.tokens.next_if(|token| kinds.contains(&token.kind))
    }
}

use crate::ast::*;
use crate::error::{Error, Result, SourceLocation};
use crate::lexer::{Token, TokenKind};

/// Result of looking for a pattern segment: the block may instead start
/// its action, or the program may simply end.
enum SegmentStart {
    Segment(PatternSegment),
    ActionStart,
    Eof,
}

/// The tawk parser.
///
/// Patterns are parsed by simple dispatch; actions and filters are parsed
/// by a Pratt precedence loop that compiles directly to the evaluator's
/// instruction list, so there is no separate expression tree.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    /// Parse a complete program
    pub fn parse(&mut self) -> Result<Program> {
        let mut program = Program::new();
        loop {
            let Some(pattern) = self.parse_pattern()? else {
                break;
            };
            let action = if self.match_token(&TokenKind::LBrace) {
                let action = self.parse_expression(0)?.unwrap_or_default();
                self.expect(&TokenKind::RBrace, "missing } at end of action")?;
                action
            } else {
                // A trailing pattern with no braces gets the implicit action
                Vec::new()
            };
            program.blocks.push(Block { pattern, action });
        }
        Ok(program)
    }

    /// Parse a pattern; `None` means end of input before any pattern
    fn parse_pattern(&mut self) -> Result<Option<Pattern>> {
        let mut pattern = Pattern {
            is_first: self.match_token(&TokenKind::Circum),
            segments: Vec::new(),
        };
        match self.parse_pattern_segment()? {
            SegmentStart::Eof => return Ok(None),
            SegmentStart::ActionStart => return Ok(Some(pattern)),
            SegmentStart::Segment(segment) => pattern.segments.push(segment),
        }
        while self.match_token(&TokenKind::Dot) {
            match self.parse_pattern_segment()? {
                SegmentStart::Segment(segment) => pattern.segments.push(segment),
                _ => {
                    return Err(Error::parser(
                        "expected pattern segment after '.'",
                        self.current_location(),
                    ))
                }
            }
        }
        Ok(Some(pattern))
    }

    fn parse_pattern_segment(&mut self) -> Result<SegmentStart> {
        match self.peek_kind().clone() {
            TokenKind::Eof => Ok(SegmentStart::Eof),
            TokenKind::LBrace => Ok(SegmentStart::ActionStart),
            TokenKind::IndexPattern(name) => {
                self.advance();
                Ok(SegmentStart::Segment(PatternSegment::Index(name)))
            }
            TokenKind::Ast => {
                self.advance();
                Ok(SegmentStart::Segment(PatternSegment::Wildcard))
            }
            TokenKind::LParen => {
                self.advance();
                let filter = self.parse_expression(0)?.ok_or_else(|| {
                    Error::parser("missing expression in filter", self.current_location())
                })?;
                self.expect(&TokenKind::RParen, "missing ) after filter")?;
                Ok(SegmentStart::Segment(PatternSegment::Filter(filter)))
            }
            _ => Err(Error::parser(
                "expected pattern segment",
                self.current_location(),
            )),
        }
    }

    /// Pratt-parse an expression with the given minimum binding power,
    /// compiling it to instructions. `None` means no expression was found
    /// (and nothing was consumed).
    fn parse_expression(&mut self, min_power: u8) -> Result<Option<Expression>> {
        let mut expr = Expression::new();

        // Atom
        match self.peek_kind().clone() {
            TokenKind::Not => {
                self.advance();
                let operand = self.require_expression(14, "missing expression after '!'")?;
                expr.extend(operand);
                expr.push(Instruction::Not);
            }
            TokenKind::Number(value) => {
                self.advance();
                expr.push(Instruction::PushNumber(value));
            }
            TokenKind::DoubleQuote => {
                self.advance();
                let literal = match self.advance() {
                    Some(TokenKind::StringLiteral(s)) => s,
                    _ => {
                        return Err(Error::parser(
                            "missing string literal",
                            self.current_location(),
                        ))
                    }
                };
                self.expect(&TokenKind::DoubleQuote, "missing closing quote")?;
                expr.push(Instruction::PushString(literal));
            }
            TokenKind::Identifier(name) => {
                self.advance();
                if self.match_token(&TokenKind::LParen) {
                    self.parse_call(&name, &mut expr)?;
                } else {
                    expr.push(Instruction::PushVariable(name));
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.require_expression(0, "missing expression in ()")?;
                self.expect(&TokenKind::RParen, "missing ) in expression")?;
                expr.extend(inner);
            }
            TokenKind::LBrack => {
                self.advance();
                self.parse_array_literal(&mut expr)?;
            }
            _ => return Ok(None),
        }

        // Operator loop
        loop {
            let kind = self.peek_kind().clone();
            if let Some((op, left, right)) = binary_op(&kind) {
                if left < min_power {
                    break;
                }
                self.advance();
                let rhs = self.require_expression(right, "missing expression after operator")?;
                expr.extend(rhs);
                expr.push(op);
                continue;
            }
            if let Some(op) = compound_assign_op(&kind) {
                if min_power > 3 {
                    break;
                }
                self.advance();
                expr.push(Instruction::Dup);
                let rhs = self.require_expression(2, "missing expression after operator")?;
                expr.extend(rhs);
                expr.push(op);
                expr.push(Instruction::Assign);
                continue;
            }
            match kind {
                // `a ; b` evaluates a for effect; a bare trailing `;`
                // yields null so the expression still produces one value
                TokenKind::Semicolon if min_power == 0 => {
                    self.advance();
                    let rhs = self.parse_expression(1)?;
                    expr.push(Instruction::Ignore);
                    match rhs {
                        Some(rest) => expr.extend(rest),
                        None => expr.push(Instruction::PushNull),
                    }
                }
                TokenKind::Dot if min_power <= 20 => {
                    self.advance();
                    let field = match self.advance() {
                        Some(TokenKind::Identifier(name)) => name,
                        _ => {
                            return Err(Error::parser(
                                "expected identifier after '.'",
                                self.current_location(),
                            ))
                        }
                    };
                    expr.push(Instruction::PushString(field));
                    expr.push(Instruction::Index);
                }
                TokenKind::NotEqual if min_power <= 8 => {
                    self.advance();
                    let rhs = self.require_expression(9, "missing expression after operator")?;
                    expr.extend(rhs);
                    expr.push(Instruction::Equal);
                    expr.push(Instruction::Not);
                }
                _ => break,
            }
        }

        Ok(Some(expr))
    }

    /// Arguments of `name(...)`, compiled in source order and capped with
    /// a Call carrying the argument count
    fn parse_call(&mut self, name: &str, expr: &mut Expression) -> Result<()> {
        let subroutine = Subroutine::from_name(name).ok_or_else(|| {
            Error::parser(
                format!("unknown subroutine {:?}", name),
                self.current_location(),
            )
        })?;
        let mut nargs = 0;
        loop {
            let Some(arg) = self.parse_expression(0)? else {
                break;
            };
            expr.extend(arg);
            nargs += 1;
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "missing ) after subroutine call")?;
        expr.push(Instruction::Call { subroutine, nargs });
        Ok(())
    }

    /// Elements of `[...]`, compiled in order and capped with MakeArray
    fn parse_array_literal(&mut self, expr: &mut Expression) -> Result<()> {
        let mut count = 0;
        loop {
            let Some(element) = self.parse_expression(0)? else {
                break;
            };
            expr.extend(element);
            count += 1;
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrack, "missing ] after array literal")?;
        expr.push(Instruction::MakeArray(count));
        Ok(())
    }

    fn require_expression(&mut self, min_power: u8, message: &str) -> Result<Expression> {
        self.parse_expression(min_power)?
            .ok_or_else(|| Error::parser(message, self.current_location()))
    }

    fn peek_kind(&self) -> &TokenKind {
        static EOF: TokenKind = TokenKind::Eof;
        self.tokens
            .get(self.current)
            .map(|t| &t.kind)
            .unwrap_or(&EOF)
    }

    fn current_location(&self) -> SourceLocation {
        self.tokens
            .get(self.current)
            .or_else(|| self.tokens.last())
            .map(|t| t.location)
            .unwrap_or(SourceLocation::new(0, 0))
    }

    fn advance(&mut self) -> Option<TokenKind> {
        let token = self.tokens.get(self.current)?;
        self.current += 1;
        Some(token.kind.clone())
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, message: &str) -> Result<()> {
        if self.match_token(kind) {
            Ok(())
        } else {
            Err(Error::parser(message, self.current_location()))
        }
    }
}

/// Left/right binding powers and opcode for the plain binary operators
fn binary_op(kind: &TokenKind) -> Option<(Instruction, u8, u8)> {
    match kind {
        TokenKind::Add => Some((Instruction::Add, 10, 11)),
        TokenKind::Sub => Some((Instruction::Sub, 10, 11)),
        TokenKind::Ast => Some((Instruction::Mul, 12, 13)),
        TokenKind::Div => Some((Instruction::Div, 12, 13)),
        TokenKind::Assign => Some((Instruction::Assign, 3, 2)),
        TokenKind::Equal => Some((Instruction::Equal, 8, 9)),
        _ => None,
    }
}

/// The operation a compound assignment applies before assigning
fn compound_assign_op(kind: &TokenKind) -> Option<Instruction> {
    match kind {
        TokenKind::AddAssign => Some(Instruction::Add),
        TokenKind::SubAssign => Some(Instruction::Sub),
        TokenKind::AstAssign => Some(Instruction::Mul),
        TokenKind::DivAssign => Some(Instruction::Div),
        _ => None,
    }
}

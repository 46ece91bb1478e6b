//! Constant-expression evaluation for `#if` and expression-valued pragmas.
//!
//! The evaluator pulls directive tokens straight from the lexer, draining any macro expansions
//! first, and computes over 32-bit wrapping integers. It stops at the end of the directive line;
//! the terminating `Eol` is left for the caller's line chew.

use pawnc_lex::{LexCtx, Token, TokenKind};
use pawnc_source::DResult;

use crate::lexer::Lexer;
use crate::state::PpState;

/// Evaluates a constant integer expression from the rest of the directive line.
///
/// Returns `None` if the expression was malformed; a diagnostic has been reported in that case.
pub(crate) fn eval_directive_expr(
    lexer: &mut Lexer,
    ctx: &mut LexCtx<'_, '_>,
    state: &mut PpState,
) -> DResult<Option<i32>> {
    EvalCtx {
        lexer,
        ctx,
        state,
        lookahead: None,
        errored: false,
    }
    .eval()
}

fn binary_prec(kind: TokenKind) -> Option<u8> {
    let prec = match kind {
        TokenKind::Or => 1,
        TokenKind::And => 2,
        TokenKind::BitOr => 3,
        TokenKind::BitXor => 4,
        TokenKind::BitAnd => 5,
        TokenKind::Equals | TokenKind::NotEquals => 6,
        TokenKind::Lt | TokenKind::Le | TokenKind::Gt | TokenKind::Ge => 7,
        TokenKind::Shl | TokenKind::Shr | TokenKind::Ushr => 8,
        TokenKind::Plus | TokenKind::Minus => 9,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => 10,
        _ => return None,
    };
    Some(prec)
}

struct EvalCtx<'a, 'b, 'h> {
    lexer: &'a mut Lexer,
    ctx: &'a mut LexCtx<'b, 'h>,
    state: &'a mut PpState,
    lookahead: Option<Token>,
    errored: bool,
}

impl EvalCtx<'_, '_, '_> {
    fn eval(mut self) -> DResult<Option<i32>> {
        let val = self.ternary()?;
        Ok(if self.errored { None } else { Some(val) })
    }

    fn bump(&mut self) -> DResult<Token> {
        if let Some(tok) = self.lookahead.take() {
            return Ok(tok);
        }

        loop {
            if let Some(tok) = self.state.next_expansion_token(self.ctx)? {
                return Ok(tok);
            }

            let tok = self.lexer.directive_next(self.ctx, self.state)?;
            if tok.kind != TokenKind::None {
                return Ok(tok);
            }
        }
    }

    fn peek(&mut self) -> DResult<Token> {
        if self.lookahead.is_none() {
            let tok = self.bump()?;
            self.lookahead = Some(tok);
        }
        Ok(self.lookahead.unwrap())
    }

    fn error(&mut self, tok: &Token, msg: impl Into<String>) -> DResult<()> {
        if !self.errored {
            self.ctx.reporter().error(tok.range(), msg).emit()?;
            self.errored = true;
        }
        Ok(())
    }

    fn ternary(&mut self) -> DResult<i32> {
        let cond = self.binary(1)?;
        if self.peek()?.kind != TokenKind::QMark {
            return Ok(cond);
        }
        self.bump()?;

        let on_true = self.ternary()?;

        let tok = self.bump()?;
        if tok.kind != TokenKind::Colon {
            self.error(&tok, "expected ':' in conditional expression")?;
            return Ok(0);
        }

        let on_false = self.ternary()?;
        Ok(if cond != 0 { on_true } else { on_false })
    }

    fn binary(&mut self, min_prec: u8) -> DResult<i32> {
        let mut lhs = self.unary()?;

        loop {
            let tok = self.peek()?;
            match binary_prec(tok.kind) {
                Some(prec) if prec >= min_prec => {
                    self.bump()?;
                    let rhs = self.binary(prec + 1)?;
                    lhs = self.apply_binary(&tok, lhs, rhs)?;
                }
                _ => break,
            }
        }

        Ok(lhs)
    }

    fn apply_binary(&mut self, tok: &Token, lhs: i32, rhs: i32) -> DResult<i32> {
        use TokenKind::*;

        let val = match tok.kind {
            Or => ((lhs != 0) || (rhs != 0)) as i32,
            And => ((lhs != 0) && (rhs != 0)) as i32,
            BitOr => lhs | rhs,
            BitXor => lhs ^ rhs,
            BitAnd => lhs & rhs,
            Equals => (lhs == rhs) as i32,
            NotEquals => (lhs != rhs) as i32,
            Lt => (lhs < rhs) as i32,
            Le => (lhs <= rhs) as i32,
            Gt => (lhs > rhs) as i32,
            Ge => (lhs >= rhs) as i32,
            Shl => lhs.wrapping_shl(rhs as u32),
            Shr => lhs.wrapping_shr(rhs as u32),
            Ushr => ((lhs as u32).wrapping_shr(rhs as u32)) as i32,
            Plus => lhs.wrapping_add(rhs),
            Minus => lhs.wrapping_sub(rhs),
            Star => lhs.wrapping_mul(rhs),
            Slash | Percent => {
                if rhs == 0 {
                    self.error(tok, "division by zero in preprocessor expression")?;
                    0
                } else if tok.kind == Slash {
                    lhs.wrapping_div(rhs)
                } else {
                    lhs.wrapping_rem(rhs)
                }
            }
            _ => unreachable!("not a binary operator"),
        };

        Ok(val)
    }

    fn unary(&mut self) -> DResult<i32> {
        let tok = self.peek()?;
        let val = match tok.kind {
            TokenKind::Not => {
                self.bump()?;
                (self.unary()? == 0) as i32
            }
            TokenKind::Tilde => {
                self.bump()?;
                !self.unary()?
            }
            TokenKind::Minus => {
                self.bump()?;
                self.unary()?.wrapping_neg()
            }
            TokenKind::Plus => {
                self.bump()?;
                self.unary()?
            }
            _ => self.primary()?,
        };
        Ok(val)
    }

    fn primary(&mut self) -> DResult<i32> {
        let tok = self.bump()?;
        match tok.kind {
            TokenKind::IntLit(val) => Ok(val as i32),
            TokenKind::HexLit(val) => Ok(val as i32),
            TokenKind::CharLit(val) => Ok(val),
            TokenKind::True => Ok(1),
            TokenKind::False => Ok(0),

            // An identifier that survived macro expansion has no definition; it evaluates to 0.
            TokenKind::Name(_) => Ok(0),

            TokenKind::LParen => {
                let val = self.ternary()?;
                let close = self.bump()?;
                if close.kind != TokenKind::RParen {
                    self.error(&close, "expected ')' in preprocessor expression")?;
                }
                Ok(val)
            }

            _ => {
                let msg = format!("expected an expression, got {}", tok.kind.name());
                self.error(&tok, msg)?;
                Ok(0)
            }
        }
    }
}

//! Parser
//!
//! Recursive descent over the token stream. Binary operator precedence, lowest first: `or`, `and`,
//! comparisons, `..` (right associative), `+ -`, `* / %`, then the unary operators `- not #`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use super::{
    lexer::{Token, TokenKind},
    ScriptError,
};
use crate::engine::binding;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Reserved words. None of them may name a variable.
const KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if", "in",
    "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

/// Reserved words the language recognises but scripts may not use.
const UNSUPPORTED: &[&str] = &["function", "goto"];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A parsed script.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub args: Vec<Expr>,
    pub line: usize,
}

/// One `if`/`elseif` arm.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub cond: Expr,
    pub body: Vec<Stmt>,
    pub line: usize,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,

    /// Number of loops enclosing the current statement
    loop_depth: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Call(Call),
    Assign {
        name: String,
        value: Expr,
        line: usize,
    },
    /// `local name [= value]`
    Local {
        name: String,
        value: Option<Expr>,
        line: usize,
    },
    If {
        branches: Vec<Branch>,
        otherwise: Option<Vec<Stmt>>,
        line: usize,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
        line: usize,
    },
    /// `repeat body until cond`, `line` is the line of the `until`
    Repeat {
        body: Vec<Stmt>,
        cond: Expr,
        line: usize,
    },
    /// Numeric `for var = start, stop[, step] do body end`
    For {
        var: String,
        start: Expr,
        stop: Expr,
        step: Option<Expr>,
        body: Vec<Stmt>,
        line: usize,
    },
    Do {
        body: Vec<Stmt>,
        line: usize,
    },
    Break {
        line: usize,
    },
    /// Ends the script early, as a completed run
    Return {
        line: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Nil,
    Bool(bool),
    Int(i64),
    Num(f64),
    Str(String),
    Var(String),
    Call(Call),
    List(Vec<Expr>),
    /// `list[index]`, indices start at 1
    Index(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    Not(Box<Expr>),
    Len(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Short circuit, evaluates to the deciding operand
    And,
    Or,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Program {
    /// Check every call, at any depth, names a catalog function.
    pub fn check_calls(&self) -> Result<(), ScriptError> {
        check_block(&self.stmts)
    }
}

impl Stmt {
    /// Line the statement starts on.
    pub fn line(&self) -> usize {
        match self {
            Stmt::Call(call) => call.line,
            Stmt::Assign { line, .. }
            | Stmt::Local { line, .. }
            | Stmt::If { line, .. }
            | Stmt::While { line, .. }
            | Stmt::Repeat { line, .. }
            | Stmt::For { line, .. }
            | Stmt::Do { line, .. }
            | Stmt::Break { line }
            | Stmt::Return { line } => *line,
        }
    }
}

impl Parser {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    /// Line of the current token, or of the last token at the end of input.
    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn next(&mut self) -> Option<TokenKind> {
        let tok = self.tokens.get(self.pos).map(|t| t.kind.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn error<T>(&self, msg: String) -> Result<T, ScriptError> {
        Err(ScriptError::Syntax {
            line: self.line(),
            msg,
        })
    }

    fn is_op(&self, op: &str) -> bool {
        matches!(self.peek(), Some(TokenKind::Op(o)) if *o == op)
    }

    fn is_keyword(&self, kw: &str) -> bool {
        matches!(self.peek(), Some(TokenKind::Ident(w)) if w == kw)
    }

    /// Consume the operator or keyword if it is next.
    fn accept(&mut self, word: &str) -> bool {
        let found = self.is_op(word) || self.is_keyword(word);
        if found {
            self.pos += 1;
        }
        found
    }

    fn expect(&mut self, word: &str) -> Result<(), ScriptError> {
        if self.accept(word) {
            Ok(())
        } else {
            let found = describe(self.peek());
            self.error(format!("expected '{}' near {}", word, found))
        }
    }

    /// Take an identifier that is not a reserved word.
    fn name(&mut self) -> Result<String, ScriptError> {
        match self.peek() {
            Some(TokenKind::Ident(name)) if !KEYWORDS.contains(&name.as_str()) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            Some(TokenKind::Ident(kw)) if UNSUPPORTED.contains(&kw.as_str()) => {
                let kw = kw.clone();
                self.error(format!("unsupported construct '{}'", kw))
            }
            other => {
                let found = describe(other);
                self.error(format!("expected a name near {}", found))
            }
        }
    }

    fn program(&mut self) -> Result<Program, ScriptError> {
        let stmts = self.block()?;

        match self.peek() {
            None => Ok(Program { stmts }),
            other => {
                let found = describe(other);
                self.error(format!("unexpected {}", found))
            }
        }
    }

    /// Statements up to (not including) a block terminator or the end of input.
    fn block(&mut self) -> Result<Vec<Stmt>, ScriptError> {
        let mut stmts = Vec::new();

        loop {
            if self.accept(";") {
                continue;
            }
            if self.peek().is_none()
                || ["end", "else", "elseif", "until"]
                    .iter()
                    .any(|kw| self.is_keyword(kw))
            {
                return Ok(stmts);
            }

            let stmt = self.statement()?;
            let is_return = matches!(stmt, Stmt::Return { .. });
            stmts.push(stmt);

            if is_return {
                self.accept(";");
                return Ok(stmts);
            }
        }
    }

    /// Body of a loop, `break` is allowed inside it.
    fn loop_body(&mut self) -> Result<Vec<Stmt>, ScriptError> {
        self.loop_depth += 1;
        let body = self.block();
        self.loop_depth -= 1;
        body
    }

    fn statement(&mut self) -> Result<Stmt, ScriptError> {
        let line = self.line();

        let keyword = match self.peek() {
            Some(TokenKind::Ident(w)) if KEYWORDS.contains(&w.as_str()) => Some(w.clone()),
            _ => None,
        };

        match keyword.as_deref() {
            Some("local") => {
                self.pos += 1;
                let name = self.name()?;
                let value = if self.accept("=") {
                    Some(self.expr()?)
                } else {
                    None
                };
                Ok(Stmt::Local { name, value, line })
            }
            Some("if") => {
                self.pos += 1;
                let mut branches = vec![self.branch(line)?];
                let mut otherwise = None;

                loop {
                    let arm_line = self.line();
                    if self.accept("elseif") {
                        branches.push(self.branch(arm_line)?);
                    } else if self.accept("else") {
                        otherwise = Some(self.block()?);
                        self.expect("end")?;
                        break;
                    } else {
                        self.expect("end")?;
                        break;
                    }
                }

                Ok(Stmt::If {
                    branches,
                    otherwise,
                    line,
                })
            }
            Some("while") => {
                self.pos += 1;
                let cond = self.expr()?;
                self.expect("do")?;
                let body = self.loop_body()?;
                self.expect("end")?;
                Ok(Stmt::While { cond, body, line })
            }
            Some("repeat") => {
                self.pos += 1;
                let body = self.loop_body()?;
                let line = self.line();
                self.expect("until")?;
                let cond = self.expr()?;
                Ok(Stmt::Repeat { body, cond, line })
            }
            Some("for") => {
                self.pos += 1;
                let var = self.name()?;
                if self.is_op(",") || self.is_keyword("in") {
                    return self.error("unsupported construct 'for ... in'".into());
                }
                self.expect("=")?;
                let start = self.expr()?;
                self.expect(",")?;
                let stop = self.expr()?;
                let step = if self.accept(",") {
                    Some(self.expr()?)
                } else {
                    None
                };
                self.expect("do")?;
                let body = self.loop_body()?;
                self.expect("end")?;
                Ok(Stmt::For {
                    var,
                    start,
                    stop,
                    step,
                    body,
                    line,
                })
            }
            Some("do") => {
                self.pos += 1;
                let body = self.block()?;
                self.expect("end")?;
                Ok(Stmt::Do { body, line })
            }
            Some("break") => {
                if self.loop_depth == 0 {
                    return self.error("'break' outside a loop".into());
                }
                self.pos += 1;
                Ok(Stmt::Break { line })
            }
            Some("return") => {
                self.pos += 1;
                let at_block_end = self.peek().is_none()
                    || self.is_op(";")
                    || ["end", "else", "elseif", "until"]
                        .iter()
                        .any(|kw| self.is_keyword(kw));
                if !at_block_end {
                    return self.error("unsupported construct 'return' with values".into());
                }
                Ok(Stmt::Return { line })
            }
            Some(kw) if UNSUPPORTED.contains(&kw) => {
                self.error(format!("unsupported construct '{}'", kw))
            }
            Some(kw) => self.error(format!("unexpected '{}'", kw)),
            None => {
                let name = self.name()?;

                match self.peek() {
                    Some(TokenKind::Op("(")) => Ok(Stmt::Call(self.call(name, line)?)),
                    Some(TokenKind::Op("=")) => {
                        self.pos += 1;
                        let value = self.expr()?;
                        Ok(Stmt::Assign { name, value, line })
                    }
                    other => {
                        let found = describe(other);
                        self.error(format!(
                            "expected '(' or '=' after '{}' near {}",
                            name, found
                        ))
                    }
                }
            }
        }
    }

    /// `cond then block` of an `if` or `elseif` whose keyword has been consumed.
    fn branch(&mut self, line: usize) -> Result<Branch, ScriptError> {
        let cond = self.expr()?;
        self.expect("then")?;
        let body = self.block()?;
        Ok(Branch { cond, body, line })
    }

    /// Parse the argument list of a call whose name has been consumed.
    fn call(&mut self, name: String, line: usize) -> Result<Call, ScriptError> {
        self.expect("(")?;
        let args = self.expr_list(")")?;
        Ok(Call { name, args, line })
    }

    /// Comma separated expressions up to and including the closing operator.
    fn expr_list(&mut self, close: &str) -> Result<Vec<Expr>, ScriptError> {
        let mut items = Vec::new();

        loop {
            if self.accept(close) {
                return Ok(items);
            }
            items.push(self.expr()?);

            if self.accept(",") {
                // Trailing separator only allowed in list constructors
                if close == ")" && self.is_op(close) {
                    return self.error("unexpected ')' after ','".into());
                }
            } else {
                self.expect(close)?;
                return Ok(items);
            }
        }
    }

    fn expr(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.conjunction()?;

        while self.accept("or") {
            let rhs = self.conjunction()?;
            lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }

        Ok(lhs)
    }

    fn conjunction(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.comparison()?;

        while self.accept("and") {
            let rhs = self.comparison()?;
            lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
        }

        Ok(lhs)
    }

    fn comparison(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.concat()?;

        loop {
            let op = match self.peek() {
                Some(TokenKind::Op("==")) => BinOp::Eq,
                Some(TokenKind::Op("~=")) => BinOp::Ne,
                Some(TokenKind::Op("<")) => BinOp::Lt,
                Some(TokenKind::Op("<=")) => BinOp::Le,
                Some(TokenKind::Op(">")) => BinOp::Gt,
                Some(TokenKind::Op(">=")) => BinOp::Ge,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.concat()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn concat(&mut self) -> Result<Expr, ScriptError> {
        let lhs = self.additive()?;

        if self.accept("..") {
            let rhs = self.concat()?;
            return Ok(Expr::Binary(BinOp::Concat, Box::new(lhs), Box::new(rhs)));
        }

        Ok(lhs)
    }

    fn additive(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.multiplicative()?;

        loop {
            let op = match self.peek() {
                Some(TokenKind::Op("+")) => BinOp::Add,
                Some(TokenKind::Op("-")) => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn multiplicative(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.unary()?;

        loop {
            let op = match self.peek() {
                Some(TokenKind::Op("*")) => BinOp::Mul,
                Some(TokenKind::Op("/")) => BinOp::Div,
                Some(TokenKind::Op("%")) => BinOp::Mod,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> Result<Expr, ScriptError> {
        if self.accept("-") {
            return Ok(match self.unary()? {
                Expr::Int(i) => Expr::Int(i.wrapping_neg()),
                Expr::Num(n) => Expr::Num(-n),
                other => Expr::Neg(Box::new(other)),
            });
        }
        if self.accept("not") {
            return Ok(Expr::Not(Box::new(self.unary()?)));
        }
        if self.accept("#") {
            return Ok(Expr::Len(Box::new(self.unary()?)));
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, ScriptError> {
        let mut expr = self.primary()?;

        while self.accept("[") {
            let index = self.expr()?;
            self.expect("]")?;
            expr = Expr::Index(Box::new(expr), Box::new(index));
        }

        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, ScriptError> {
        let line = self.line();

        match self.peek() {
            Some(TokenKind::Ident(word)) => match word.as_str() {
                "nil" => {
                    self.pos += 1;
                    Ok(Expr::Nil)
                }
                "true" | "false" => {
                    let b = word == "true";
                    self.pos += 1;
                    Ok(Expr::Bool(b))
                }
                _ => {
                    let name = self.name()?;
                    if self.is_op("(") {
                        Ok(Expr::Call(self.call(name, line)?))
                    } else {
                        Ok(Expr::Var(name))
                    }
                }
            },
            Some(TokenKind::Op("(")) => {
                self.pos += 1;
                let inner = self.expr()?;
                self.expect(")")?;
                Ok(inner)
            }
            Some(TokenKind::Op("{")) => {
                self.pos += 1;
                Ok(Expr::List(self.expr_list("}")?))
            }
            Some(_) => match self.next() {
                Some(TokenKind::Int(i)) => Ok(Expr::Int(i)),
                Some(TokenKind::Num(n)) => Ok(Expr::Num(n)),
                Some(TokenKind::Str(s)) => Ok(Expr::Str(s)),
                other => {
                    self.pos -= 1;
                    let found = describe(other.as_ref());
                    self.error(format!("unexpected {}", found))
                }
            },
            None => self.error("unexpected end of script".into()),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

pub fn parse(tokens: Vec<Token>) -> Result<Program, ScriptError> {
    Parser {
        tokens,
        pos: 0,
        loop_depth: 0,
    }
    .program()
}

fn check_block(stmts: &[Stmt]) -> Result<(), ScriptError> {
    stmts.iter().try_for_each(check_stmt)
}

fn check_stmt(stmt: &Stmt) -> Result<(), ScriptError> {
    match stmt {
        Stmt::Call(call) => check_call(call),
        Stmt::Assign { value, .. } => check_expr(value),
        Stmt::Local { value, .. } => value.iter().try_for_each(check_expr),
        Stmt::If {
            branches,
            otherwise,
            ..
        } => {
            for branch in branches {
                check_expr(&branch.cond)?;
                check_block(&branch.body)?;
            }
            otherwise.iter().try_for_each(|body| check_block(body))
        }
        Stmt::While { cond, body, .. } | Stmt::Repeat { body, cond, .. } => {
            check_expr(cond)?;
            check_block(body)
        }
        Stmt::For {
            start,
            stop,
            step,
            body,
            ..
        } => {
            check_expr(start)?;
            check_expr(stop)?;
            step.iter().try_for_each(check_expr)?;
            check_block(body)
        }
        Stmt::Do { body, .. } => check_block(body),
        Stmt::Break { .. } | Stmt::Return { .. } => Ok(()),
    }
}

fn check_call(call: &Call) -> Result<(), ScriptError> {
    if binding::lookup(&call.name).is_none() {
        return Err(ScriptError::UnknownFunction {
            line: call.line,
            name: call.name.clone(),
        });
    }
    call.args.iter().try_for_each(check_expr)
}

fn check_expr(expr: &Expr) -> Result<(), ScriptError> {
    match expr {
        Expr::Call(call) => check_call(call),
        Expr::List(items) => items.iter().try_for_each(check_expr),
        Expr::Neg(inner) | Expr::Not(inner) | Expr::Len(inner) => check_expr(inner),
        Expr::Binary(_, lhs, rhs) | Expr::Index(lhs, rhs) => {
            check_expr(lhs)?;
            check_expr(rhs)
        }
        _ => Ok(()),
    }
}

fn describe(tok: Option<&TokenKind>) -> String {
    match tok {
        None => "end of script".into(),
        Some(TokenKind::Int(i)) => format!("'{}'", i),
        Some(TokenKind::Num(n)) => format!("'{}'", n),
        Some(TokenKind::Str(s)) => format!("'\"{}\"'", s),
        Some(TokenKind::Ident(s)) => format!("'{}'", s),
        Some(TokenKind::Op(o)) => format!("'{}'", o),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::script::lexer::tokenize;

    fn parse_src(src: &str) -> Result<Program, ScriptError> {
        parse(tokenize(src)?)
    }

    #[test]
    fn test_statements() {
        let program = parse_src("local x = 1\nDO(x, ON);\ny = {1, 2,}\nlocal z\n").unwrap();

        assert_eq!(program.stmts.len(), 4);
        assert_eq!(
            program.stmts[0],
            Stmt::Local {
                name: "x".into(),
                value: Some(Expr::Int(1)),
                line: 1
            }
        );
        assert_eq!(program.stmts[1].line(), 2);
        assert!(matches!(
            &program.stmts[2],
            Stmt::Assign { value: Expr::List(items), .. } if items.len() == 2
        ));
        assert!(matches!(
            &program.stmts[3],
            Stmt::Local { value: None, line: 4, .. }
        ));
    }

    #[test]
    fn test_precedence() {
        let program = parse_src("x = \"a\" .. 1 + 2 * -3").unwrap();

        let expected = Expr::Binary(
            BinOp::Concat,
            Box::new(Expr::Str("a".into())),
            Box::new(Expr::Binary(
                BinOp::Add,
                Box::new(Expr::Int(1)),
                Box::new(Expr::Binary(
                    BinOp::Mul,
                    Box::new(Expr::Int(2)),
                    Box::new(Expr::Int(-3)),
                )),
            )),
        );
        assert_eq!(
            program.stmts[0],
            Stmt::Assign {
                name: "x".into(),
                value: expected,
                line: 1
            }
        );
    }

    #[test]
    fn test_logical_precedence() {
        let program = parse_src("x = not a == b or c < 1 and #t > 2").unwrap();

        let var = |n: &str| Box::new(Expr::Var(n.into()));
        let expected = Expr::Binary(
            BinOp::Or,
            Box::new(Expr::Binary(
                BinOp::Eq,
                Box::new(Expr::Not(var("a"))),
                var("b"),
            )),
            Box::new(Expr::Binary(
                BinOp::And,
                Box::new(Expr::Binary(BinOp::Lt, var("c"), Box::new(Expr::Int(1)))),
                Box::new(Expr::Binary(
                    BinOp::Gt,
                    Box::new(Expr::Len(var("t"))),
                    Box::new(Expr::Int(2)),
                )),
            )),
        );
        assert!(matches!(&program.stmts[0], Stmt::Assign { value, .. } if *value == expected));
    }

    #[test]
    fn test_nested_calls() {
        let program = parse_src("print(\"Value: \" .. ReadModbus(0x1000, \"W\"))").unwrap();

        match &program.stmts[0] {
            Stmt::Call(call) => {
                assert_eq!(call.name, "print");
                assert!(matches!(
                    &call.args[0],
                    Expr::Binary(BinOp::Concat, _, rhs) if matches!(**rhs, Expr::Call(_))
                ));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_control_flow() {
        let program = parse_src(
            "if DI(1) == \"OFF\" then\n\
                 DO(2, ON)\n\
             elseif x then\n\
                 DO(3, ON)\n\
             else\n\
                 DO(4, ON)\n\
             end\n\
             for i = 1, 3 do DO(i, ON) end\n\
             while true do break end\n\
             repeat x = x + 1 until x >= 3\n\
             do local y = pts[2] end\n\
             return",
        )
        .unwrap();

        assert_eq!(program.stmts.len(), 6);
        match &program.stmts[0] {
            Stmt::If {
                branches,
                otherwise,
                line,
            } => {
                assert_eq!(*line, 1);
                assert_eq!(branches.len(), 2);
                assert_eq!(branches[1].line, 3);
                assert_eq!(otherwise.as_ref().map(Vec::len), Some(1));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            &program.stmts[1],
            Stmt::For { var, step: None, body, line: 8, .. } if var == "i" && body.len() == 1
        ));
        assert!(matches!(
            &program.stmts[2],
            Stmt::While { body, .. } if body == &vec![Stmt::Break { line: 9 }]
        ));
        assert!(matches!(&program.stmts[3], Stmt::Repeat { line: 10, .. }));
        assert!(matches!(
            &program.stmts[4],
            Stmt::Do { body, .. } if matches!(
                &body[0],
                Stmt::Local { value: Some(Expr::Index(..)), .. }
            )
        ));
        assert_eq!(program.stmts[5], Stmt::Return { line: 12 });
    }

    #[test]
    fn test_calls_checked_inside_blocks() {
        let program = parse_src("for i = 1, 2 do if i > 1 then Launch(i) end end").unwrap();
        assert_eq!(
            program.check_calls(),
            Err(ScriptError::UnknownFunction {
                line: 1,
                name: "Launch".into()
            })
        );
    }

    #[test]
    fn test_unsupported_constructs() {
        for src in [
            "function f() end",
            "local function f() end",
            "for k, v in pairs(t) do end",
            "goto done",
            "break",
            "if x then DO(1, ON)",
            "while x DO(1, ON) end",
            "return 1",
            "DO(1, ON)\nend",
            "x",
            "DO(1,)",
            "DO(1, ON",
            "local true = 1",
        ] {
            assert!(
                matches!(parse_src(src), Err(ScriptError::Syntax { .. })),
                "accepted {:?}",
                src
            );
        }
    }
}

//! # Script front-end
//!
//! Tokenizer, parser and interpreter for the robot scripting language, a Lua subset:
//!
//! - statements are catalog calls, `[local] name = expr` assignments, `if`/`elseif`/`else`,
//!   `while`, `repeat ... until`, numeric `for`, `do ... end`, `break` and a bare `return`,
//! - expressions are literals (including `[[long strings]]`), variables, calls, `{...}` lists and
//!   `list[i]` indexing, arithmetic, comparisons, `and`/`or`/`not`, `#` length and `..`
//!   concatenation,
//! - `--` line comments and `--[[ ... ]]` block comments.
//!
//! Function definitions, `goto` and generic `for ... in` loops are rejected before the run starts,
//! as is any call to a function outside the catalog.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod interp;
mod lexer;
mod parser;

// ------------------------------------------------------------------------------------------------
// REEXPORTS
// ------------------------------------------------------------------------------------------------

pub use interp::{Interpreter, RunError};
pub use parser::{BinOp, Branch, Call, Expr, Program, Stmt};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScriptError {
    #[error("line {line}: {msg}")]
    Syntax { line: usize, msg: String },

    #[error("line {line}: attempt to call unknown function '{name}'")]
    UnknownFunction { line: usize, name: String },

    #[error("line {line}: {msg}")]
    Runtime { line: usize, msg: String },

    #[error("Invalid token pattern: {0}")]
    Pattern(#[from] regex::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ScriptError {
    /// Script line the error was raised on, numbered from 1.
    pub fn line(&self) -> Option<usize> {
        match self {
            ScriptError::Syntax { line, .. }
            | ScriptError::UnknownFunction { line, .. }
            | ScriptError::Runtime { line, .. } => Some(*line),
            ScriptError::Pattern(_) => None,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Parse a script and check that every function it calls is in the catalog.
pub fn parse(source: &str) -> Result<Program, ScriptError> {
    let tokens = lexer::tokenize(source)?;
    let program = parser::parse(tokens)?;
    program.check_calls()?;
    Ok(program)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_checks_calls() {
        assert!(parse("DO(1, ON)\nprint(DI(1))").is_ok());
        assert!(parse("--[[ Pick job\n author: ops ]]\nif DI(1) == OFF then DO(2, ON) end").is_ok());

        let err = parse("DO(1, ON)\nos.exit(1)").unwrap_err();
        assert!(matches!(err, ScriptError::Syntax { line: 2, .. }));

        let err = parse("DO(1, ON)\nprint(Explode(3))").unwrap_err();
        assert_eq!(
            err,
            ScriptError::UnknownFunction {
                line: 2,
                name: "Explode".into()
            }
        );
        assert_eq!(err.line(), Some(2));
    }
}

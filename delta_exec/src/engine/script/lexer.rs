//! Tokenizer

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use regex::RegexBuilder;

use super::ScriptError;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// One token (or skippable run of whitespace/comment) anchored at the start of the input.
const TOKEN_PATTERN: &str = r#"\A(?:
    (?P<ws>\s+)
    |(?P<comment>--[^\n]*)
    |(?P<hex>0[xX][0-9A-Fa-f]+)
    |(?P<float>\d+\.\d*(?:[eE][+-]?\d+)?|\d+[eE][+-]?\d+|\.\d+(?:[eE][+-]?\d+)?)
    |(?P<int>\d+)
    |(?P<str>"(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*')
    |(?P<ident>[A-Za-z_][A-Za-z0-9_]*)
    |(?P<op>\.\.|==|~=|<=|>=|[(){}\[\],;=+\-*/%\#<>])
)"#;

/// Opening bracket of a long comment (`--[[`, `--[==[`) or long string (`[[`, `[=[`).
const LONG_OPEN_PATTERN: &str = r"\A(?P<comment>--)?\[(?P<level>=*)\[";

/// Every operator and punctuation token.
const OPS: &[&str] = &[
    "..", "==", "~=", "<=", ">=", "(", ")", "{", "}", "[", "]", ",", ";", "=", "+", "-", "*", "/",
    "%", "#", "<", ">",
];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,

    /// Line the token starts on, numbered from 1
    pub line: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Int(i64),
    Num(f64),
    Str(String),
    Ident(String),
    /// Single or double character operator or punctuation
    Op(&'static str),
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

pub fn tokenize(source: &str) -> Result<Vec<Token>, ScriptError> {
    let re = RegexBuilder::new(TOKEN_PATTERN)
        .ignore_whitespace(true)
        .build()?;
    let long_open = RegexBuilder::new(LONG_OPEN_PATTERN).build()?;

    let mut tokens = Vec::new();
    let mut rest = source;
    let mut line = 1;

    while !rest.is_empty() {
        // Long brackets first, a plain `--` comment would otherwise swallow `--[[`
        if let Some(caps) = long_open.captures(rest) {
            let open = caps.get(0).map_or(0, |m| m.end());
            let level = caps.name("level").map_or(0, |m| m.as_str().len());
            let is_comment = caps.name("comment").is_some();

            let close = format!("]{}]", "=".repeat(level));
            let body_len = match rest[open..].find(&close) {
                Some(n) => n,
                None => {
                    return Err(ScriptError::Syntax {
                        line,
                        msg: format!(
                            "unfinished long {}",
                            if is_comment { "comment" } else { "string" }
                        ),
                    })
                }
            };

            if !is_comment {
                let body = &rest[open..open + body_len];
                // A newline directly after the opening bracket is not part of the string
                let body = body
                    .strip_prefix("\r\n")
                    .or_else(|| body.strip_prefix('\n'))
                    .unwrap_or(body);
                tokens.push(Token {
                    kind: TokenKind::Str(body.to_string()),
                    line,
                });
            }

            let text = &rest[..open + body_len + close.len()];
            line += text.matches('\n').count();
            rest = &rest[text.len()..];
            continue;
        }

        let caps = match re.captures(rest) {
            Some(c) => c,
            None => {
                let found = rest.chars().next().unwrap_or_default();
                return Err(ScriptError::Syntax {
                    line,
                    msg: format!("unexpected character '{}'", found),
                });
            }
        };

        let text = caps.get(0).map_or("", |m| m.as_str());
        let syntax = |msg: String| ScriptError::Syntax { line, msg };

        let kind = if caps.name("ws").is_some() || caps.name("comment").is_some() {
            None
        } else if caps.name("hex").is_some() {
            i64::from_str_radix(&text[2..], 16)
                .map(TokenKind::Int)
                .map(Some)
                .map_err(|_| syntax(format!("hex literal {} is too large", text)))?
        } else if caps.name("float").is_some() {
            text.parse()
                .map(|n| Some(TokenKind::Num(n)))
                .map_err(|_| syntax(format!("malformed number {}", text)))?
        } else if caps.name("int").is_some() {
            // Integers too large for 64 bits become floats
            match text.parse() {
                Ok(i) => Some(TokenKind::Int(i)),
                Err(_) => text
                    .parse()
                    .map(|n| Some(TokenKind::Num(n)))
                    .map_err(|_| syntax(format!("malformed number {}", text)))?,
            }
        } else if caps.name("str").is_some() {
            Some(TokenKind::Str(unescape(&text[1..text.len() - 1]).map_err(syntax)?))
        } else if caps.name("ident").is_some() {
            Some(TokenKind::Ident(text.to_string()))
        } else {
            Some(TokenKind::Op(operator(text)))
        };

        if let Some(kind) = kind {
            tokens.push(Token { kind, line });
        }

        line += text.matches('\n').count();
        rest = &rest[text.len()..];
    }

    Ok(tokens)
}

/// Intern an operator so tokens can carry it as a static string.
fn operator(text: &str) -> &'static str {
    OPS.iter().copied().find(|op| *op == text).unwrap_or("?")
}

fn unescape(body: &str) -> Result<String, String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(c @ ('\\' | '"' | '\'')) => out.push(c),
            Some(c) => return Err(format!("invalid escape sequence '\\{}'", c)),
            None => return Err("unfinished escape sequence".into()),
        }
    }

    Ok(out)
}

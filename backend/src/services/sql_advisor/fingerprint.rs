//! SQL fingerprint, SQL ID and statement splitting
//!
//! Built on the sqlparser tokenizer so quoting and comments are handled the
//! same way MySQL would read them.

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use sqlparser::dialect::MySqlDialect;
use sqlparser::tokenizer::{Token, Tokenizer, Whitespace};

use super::error::{AdvisorError, AdvisorResult};

/// Number of hex digits kept for an SQL ID
pub const SQL_ID_LEN: usize = 16;

static IN_LIST_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bin\s*\(\s*\?(?:\s*,\s*\?)*\s*\)").unwrap());

static VALUES_LIST_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bvalues\s*\(\s*\?(?:\s*,\s*\?)*\s*\)(?:\s*,\s*\(\s*\?(?:\s*,\s*\?)*\s*\))*")
        .unwrap()
});

fn tokenize(sql: &str) -> AdvisorResult<Vec<Token>> {
    let dialect = MySqlDialect {};
    Tokenizer::new(&dialect, sql)
        .tokenize()
        .map_err(|e| AdvisorError::InvalidSql(e.to_string()))
}

fn is_literal(token: &Token) -> bool {
    matches!(
        token,
        Token::Number(_, _)
            | Token::SingleQuotedString(_)
            | Token::DoubleQuotedString(_)
            | Token::NationalStringLiteral(_)
            | Token::EscapedStringLiteral(_)
            | Token::HexStringLiteral(_)
            | Token::SingleQuotedByteStringLiteral(_)
            | Token::DoubleQuotedByteStringLiteral(_)
    )
}

/// Normalized signature of a statement
///
/// Literals become `?`, comments are dropped, keywords and identifiers are
/// lowercased and spacing is rebuilt from the token stream, so statements
/// that differ only in literal values or layout share one fingerprint.
pub fn fingerprint(sql: &str) -> AdvisorResult<String> {
    let tokens = tokenize(sql)?;

    let mut out = String::with_capacity(sql.len());
    let mut prev: Option<&Token> = None;

    for token in &tokens {
        let piece = match token {
            Token::Whitespace(_) | Token::EOF | Token::SemiColon => continue,
            t if is_literal(t) => "?".to_string(),
            t => t.to_string().to_lowercase(),
        };

        if let Some(p) = prev {
            let glued = matches!(p, Token::LParen | Token::Period)
                || matches!(token, Token::Comma | Token::RParen | Token::Period)
                || (matches!(token, Token::LParen) && matches!(p, Token::Word(_)));
            if !glued {
                out.push(' ');
            }
        }
        out.push_str(&piece);
        prev = Some(token);
    }

    let out = IN_LIST_REGEX.replace_all(&out, "in(?+)");
    let out = VALUES_LIST_REGEX.replace_all(&out, "values(?+)");
    Ok(out.into_owned())
}

/// Short fixed-width identifier of a statement, derived from its fingerprint
pub fn sql_id(sql: &str) -> AdvisorResult<String> {
    let fp = fingerprint(sql)?;
    Ok(sql_id_of_fingerprint(&fp))
}

pub fn sql_id_of_fingerprint(fingerprint: &str) -> String {
    let digest = Sha256::digest(fingerprint.as_bytes());
    digest
        .iter()
        .take(SQL_ID_LEN / 2)
        .map(|b| format!("{:02X}", b))
        .collect()
}

/// Split SQL text into statements at top-level semicolons
///
/// Semicolons inside quoted strings or comments do not split. Blank
/// statements are dropped.
pub fn split_statements(sql: &str) -> AdvisorResult<Vec<String>> {
    let tokens = tokenize(sql)?;

    let mut statements = Vec::new();
    let mut current = String::new();
    let mut has_content = false;

    for token in &tokens {
        match token {
            Token::SemiColon => {
                if has_content {
                    statements.push(current.trim().to_string());
                }
                current.clear();
                has_content = false;
            },
            Token::EOF => {},
            Token::Whitespace(Whitespace::SingleLineComment { .. })
            | Token::Whitespace(Whitespace::MultiLineComment(_)) => {
                current.push_str(&token.to_string());
            },
            Token::Whitespace(_) => current.push_str(&token.to_string()),
            _ => {
                has_content = true;
                current.push_str(&token.to_string());
            },
        }
    }

    if has_content {
        statements.push(current.trim().to_string());
    }

    Ok(statements)
}

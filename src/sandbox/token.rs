//! Lexer for the snippet language.

use std::fmt;

/// A lexical or syntactic error with the user-source line it occurred on.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub line: u32,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (line {})", self.message, self.line)
    }
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: u32) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Num(f64),
    Str(String),
    Ident(String),

    // Keywords
    Let,
    Fn,
    If,
    Else,
    While,
    For,
    Return,
    Break,
    Continue,
    True,
    False,
    Null,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semi,
    Colon,
    Question,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PlusPlus,
    MinusMinus,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,
    Not,
}

#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub line: u32,
}

/// Splits `source` into tokens, tracking 1-based line numbers.
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, ParseError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;
    let mut line = 1_u32;

    while i < chars.len() {
        let c = chars[i];

        if c == '\n' {
            line += 1;
            i += 1;
            continue;
        }
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        // Comments
        if c == '/' && i + 1 < chars.len() {
            if chars[i + 1] == '/' {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            if chars[i + 1] == '*' {
                let start_line = line;
                i += 2;
                loop {
                    if i + 1 >= chars.len() {
                        return Err(ParseError::new("unterminated block comment", start_line));
                    }
                    if chars[i] == '\n' {
                        line += 1;
                    }
                    if chars[i] == '*' && chars[i + 1] == '/' {
                        i += 2;
                        break;
                    }
                    i += 1;
                }
                continue;
            }
        }

        // Numbers
        if c.is_ascii_digit() || (c == '.' && i + 1 < chars.len() && chars[i + 1].is_ascii_digit())
        {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            // Exponent part
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                let mut j = i + 1;
                if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    i = j;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let text: String = chars[start..i].iter().collect();
            let value = text
                .parse::<f64>()
                .map_err(|_| ParseError::new(format!("invalid number literal '{text}'"), line))?;
            tokens.push(SpannedToken {
                token: Token::Num(value),
                line,
            });
            continue;
        }

        // Identifiers and keywords
        if c.is_ascii_alphabetic() || c == '_' || c == '$' {
            let start = i;
            while i < chars.len()
                && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '$')
            {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            let token = match text.as_str() {
                "let" | "var" | "const" => Token::Let,
                "fn" | "function" => Token::Fn,
                "if" => Token::If,
                "else" => Token::Else,
                "while" => Token::While,
                "for" => Token::For,
                "return" => Token::Return,
                "break" => Token::Break,
                "continue" => Token::Continue,
                "true" => Token::True,
                "false" => Token::False,
                "null" | "undefined" => Token::Null,
                _ => Token::Ident(text),
            };
            tokens.push(SpannedToken { token, line });
            continue;
        }

        // Strings
        if c == '"' || c == '\'' {
            let quote = c;
            let start_line = line;
            i += 1;
            let mut text = String::new();
            loop {
                if i >= chars.len() {
                    return Err(ParseError::new("unterminated string literal", start_line));
                }
                let ch = chars[i];
                if ch == quote {
                    i += 1;
                    break;
                }
                if ch == '\n' {
                    return Err(ParseError::new("unterminated string literal", start_line));
                }
                if ch == '\\' && i + 1 < chars.len() {
                    i += 1;
                    text.push(match chars[i] {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => other,
                    });
                } else {
                    text.push(ch);
                }
                i += 1;
            }
            tokens.push(SpannedToken {
                token: Token::Str(text),
                line: start_line,
            });
            continue;
        }

        // Operators and punctuation, longest match first
        let two: Option<Token> = if i + 1 < chars.len() {
            match (c, chars[i + 1]) {
                ('=', '=') => Some(Token::EqEq),
                ('!', '=') => Some(Token::NotEq),
                ('<', '=') => Some(Token::LtEq),
                ('>', '=') => Some(Token::GtEq),
                ('&', '&') => Some(Token::AndAnd),
                ('|', '|') => Some(Token::OrOr),
                ('+', '+') => Some(Token::PlusPlus),
                ('-', '-') => Some(Token::MinusMinus),
                ('+', '=') => Some(Token::PlusAssign),
                ('-', '=') => Some(Token::MinusAssign),
                ('*', '=') => Some(Token::StarAssign),
                ('/', '=') => Some(Token::SlashAssign),
                _ => None,
            }
        } else {
            None
        };
        if let Some(token) = two {
            // `===` / `!==` collapse to their two-character forms
            if matches!(token, Token::EqEq | Token::NotEq)
                && i + 2 < chars.len()
                && chars[i + 2] == '='
            {
                i += 1;
            }
            tokens.push(SpannedToken { token, line });
            i += 2;
            continue;
        }

        let single = match c {
            '(' => Token::LParen,
            ')' => Token::RParen,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ',' => Token::Comma,
            ';' => Token::Semi,
            ':' => Token::Colon,
            '?' => Token::Question,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '=' => Token::Assign,
            '<' => Token::Lt,
            '>' => Token::Gt,
            '!' => Token::Not,
            other => {
                return Err(ParseError::new(
                    format!("unexpected character '{other}'"),
                    line,
                ));
            }
        };
        tokens.push(SpannedToken {
            token: single,
            line,
        });
        i += 1;
    }

    Ok(tokens)
}

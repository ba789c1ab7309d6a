//! C-subset tokenizer for headers and initializer blocks
//!
//! Converts header text like "typedef struct { int mass; } paramFull;" into a
//! sequence of tokens consumed by the struct parser and the initializer parser.
//! Numeric lexemes are kept verbatim so initializer values survive projection
//! byte-for-byte.

use std::iter::Peekable;
use std::str::Chars;

/// A token in header or initializer text
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// An identifier or keyword (e.g., typedef, struct, paramFull, mass)
    Identifier(String),
    /// A numeric literal, raw lexeme preserved (e.g., "10.5", "-3", "0")
    Number(String),
    /// A string literal, contents without the surrounding quotes
    Text(String),
    /// Opening brace
    OpenBrace,
    /// Closing brace
    CloseBrace,
    /// Opening bracket for array dimensions
    OpenBracket,
    /// Closing bracket
    CloseBracket,
    /// Opening parenthesis
    OpenParen,
    /// Closing parenthesis
    CloseParen,
    /// Statement terminator
    Semicolon,
    /// Value separator
    Comma,
    /// Member access / designated-initializer dot
    Dot,
    /// Assignment
    Assign,
}

/// Error during tokenization
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizeError {
    pub message: String,
    pub position: usize,
}

impl TokenizeError {
    fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl std::fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Tokenize error at position {}: {}",
            self.position, self.message
        )
    }
}

impl std::error::Error for TokenizeError {}

/// Tokenizer for the C subset the tool consumes
pub struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
    position: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            position: 0,
        }
    }

    /// Tokenize the entire input into a vector of tokens
    pub fn tokenize(mut self) -> Result<Vec<Token>, TokenizeError> {
        let mut tokens = Vec::new();

        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }

        Ok(tokens)
    }

    /// Get the next token, or None at end of input
    fn next_token(&mut self) -> Result<Option<Token>, TokenizeError> {
        loop {
            self.skip_whitespace();
            if !self.skip_comment()? {
                break;
            }
        }

        let c = match self.peek() {
            None => return Ok(None),
            Some(c) => c,
        };

        let token = match c {
            '"' | '\'' => self.read_string()?,

            '{' => {
                self.advance();
                Token::OpenBrace
            }
            '}' => {
                self.advance();
                Token::CloseBrace
            }
            '[' => {
                self.advance();
                Token::OpenBracket
            }
            ']' => {
                self.advance();
                Token::CloseBracket
            }
            '(' => {
                self.advance();
                Token::OpenParen
            }
            ')' => {
                self.advance();
                Token::CloseParen
            }
            ';' => {
                self.advance();
                Token::Semicolon
            }
            ',' => {
                self.advance();
                Token::Comma
            }
            '=' => {
                self.advance();
                Token::Assign
            }

            // A dot is either member access or the start of a fraction (.5)
            '.' => self.read_dot_or_fraction(),

            // A minus only appears in front of a numeric literal in this subset
            '-' => self.read_number(),

            c if c.is_ascii_digit() => self.read_number(),

            c if c.is_alphabetic() || c == '_' => self.read_identifier(),

            // Anything else (preprocessor noise, stray punctuation) is skipped,
            // matching the permissive scan of header files
            _ => {
                self.advance();
                return self.next_token();
            }
        };

        Ok(Some(token))
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c.is_some() {
            self.position += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Skip a `//` or `/* */` comment if one starts here.
    /// Returns true if a comment was consumed.
    fn skip_comment(&mut self) -> Result<bool, TokenizeError> {
        if self.peek() != Some('/') {
            return Ok(false);
        }

        // Need two-char lookahead; clone is cheap on a char iterator
        let mut ahead = self.chars.clone();
        ahead.next();
        match ahead.next() {
            Some('/') => {
                while let Some(c) = self.advance() {
                    if c == '\n' {
                        break;
                    }
                }
                Ok(true)
            }
            Some('*') => {
                let start_pos = self.position;
                self.advance();
                self.advance();
                let mut prev = '\0';
                loop {
                    match self.advance() {
                        None => {
                            return Err(TokenizeError::new(
                                "Unterminated block comment",
                                start_pos,
                            ));
                        }
                        Some('/') if prev == '*' => break,
                        Some(c) => prev = c,
                    }
                }
                Ok(true)
            }
            _ => {
                // A lone slash has no meaning in this subset; drop it
                self.advance();
                Ok(true)
            }
        }
    }

    /// Read a string literal (double or single quoted)
    fn read_string(&mut self) -> Result<Token, TokenizeError> {
        let quote = self.advance().unwrap();
        let start_pos = self.position;
        let mut value = String::new();

        loop {
            match self.advance() {
                None => {
                    return Err(TokenizeError::new("Unterminated string literal", start_pos));
                }
                Some('\\') => {
                    // Keep escapes verbatim so the value re-emits unchanged
                    value.push('\\');
                    if let Some(c) = self.advance() {
                        value.push(c);
                    }
                }
                Some(c) if c == quote => break,
                Some(c) => value.push(c),
            }
        }

        Ok(Token::Text(value))
    }

    /// Read a numeric literal, keeping the raw lexeme (sign, fraction, suffix)
    fn read_number(&mut self) -> Token {
        let mut lexeme = String::new();

        if self.peek() == Some('-') {
            lexeme.push(self.advance().unwrap());
        }

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                lexeme.push(self.advance().unwrap());
            } else {
                break;
            }
        }

        if self.peek() == Some('.') {
            lexeme.push(self.advance().unwrap());
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    lexeme.push(self.advance().unwrap());
                } else {
                    break;
                }
            }
        }

        // Literal suffixes (0.5f, 10UL) ride along with the lexeme
        while let Some(c) = self.peek() {
            if c.is_ascii_alphabetic() {
                lexeme.push(self.advance().unwrap());
            } else {
                break;
            }
        }

        Token::Number(lexeme)
    }

    /// A leading dot starts a fraction (.5) or stands alone (designators)
    fn read_dot_or_fraction(&mut self) -> Token {
        let mut ahead = self.chars.clone();
        ahead.next();
        if matches!(ahead.next(), Some(c) if c.is_ascii_digit()) {
            let mut lexeme = String::new();
            lexeme.push(self.advance().unwrap());
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    lexeme.push(self.advance().unwrap());
                } else {
                    break;
                }
            }
            Token::Number(lexeme)
        } else {
            self.advance();
            Token::Dot
        }
    }

    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();

        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                ident.push(self.advance().unwrap());
            } else {
                break;
            }
        }

        Token::Identifier(ident)
    }
}

/// Convenience function to tokenize a text fragment
pub fn tokenize(text: &str) -> Result<Vec<Token>, TokenizeError> {
    Tokenizer::new(text).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_simple_number() {
        let tokens = tokenize("42").unwrap();
        assert_eq!(tokens, vec![Token::Number("42".to_string())]);
    }

    #[test]
    fn test_tokenize_decimal_keeps_lexeme() {
        let tokens = tokenize("10.50").unwrap();
        assert_eq!(tokens, vec![Token::Number("10.50".to_string())]);
    }

    #[test]
    fn test_tokenize_negative_number() {
        let tokens = tokenize("-3.5").unwrap();
        assert_eq!(tokens, vec![Token::Number("-3.5".to_string())]);
    }

    #[test]
    fn test_tokenize_leading_dot_fraction() {
        let tokens = tokenize(".5").unwrap();
        assert_eq!(tokens, vec![Token::Number(".5".to_string())]);
    }

    #[test]
    fn test_tokenize_float_suffix() {
        let tokens = tokenize("0.5f").unwrap();
        assert_eq!(tokens, vec![Token::Number("0.5f".to_string())]);
    }

    #[test]
    fn test_tokenize_identifier() {
        let tokens = tokenize("paramFull").unwrap();
        assert_eq!(tokens, vec![Token::Identifier("paramFull".to_string())]);
    }

    #[test]
    fn test_tokenize_field_declaration() {
        let tokens = tokenize("float capacity[2];").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("float".to_string()),
                Token::Identifier("capacity".to_string()),
                Token::OpenBracket,
                Token::Number("2".to_string()),
                Token::CloseBracket,
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_tokenize_initializer_block() {
        let tokens = tokenize("{1, 10.5, {2, 3}}").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::OpenBrace,
                Token::Number("1".to_string()),
                Token::Comma,
                Token::Number("10.5".to_string()),
                Token::Comma,
                Token::OpenBrace,
                Token::Number("2".to_string()),
                Token::Comma,
                Token::Number("3".to_string()),
                Token::CloseBrace,
                Token::CloseBrace,
            ]
        );
    }

    #[test]
    fn test_tokenize_string_literal() {
        let tokens = tokenize("\"boiler A\"").unwrap();
        assert_eq!(tokens, vec![Token::Text("boiler A".to_string())]);
    }

    #[test]
    fn test_tokenize_skips_line_comment() {
        let tokens = tokenize("int mass; // grams\nint volume;").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("int".to_string()),
                Token::Identifier("mass".to_string()),
                Token::Semicolon,
                Token::Identifier("int".to_string()),
                Token::Identifier("volume".to_string()),
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_tokenize_skips_block_comment() {
        let tokens = tokenize("{1, /* legacy */ 2}").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::OpenBrace,
                Token::Number("1".to_string()),
                Token::Comma,
                Token::Number("2".to_string()),
                Token::CloseBrace,
            ]
        );
    }

    #[test]
    fn test_tokenize_skips_unknown_characters() {
        // Preprocessor noise must not derail the scan
        let tokens = tokenize("#pragma once\nint id;").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("pragma".to_string()),
                Token::Identifier("once".to_string()),
                Token::Identifier("int".to_string()),
                Token::Identifier("id".to_string()),
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_tokenize_empty_input() {
        let tokens = tokenize("").unwrap();
        assert_eq!(tokens, vec![]);
    }

    #[test]
    fn test_tokenize_error_unterminated_string() {
        let result = tokenize("\"boiler");
        assert!(result.is_err());
        assert!(result.unwrap_err().message.contains("Unterminated"));
    }

    #[test]
    fn test_tokenize_error_unterminated_block_comment() {
        let result = tokenize("/* no end");
        assert!(result.is_err());
        assert!(result.unwrap_err().message.contains("block comment"));
    }
}

//! Shell-like tokenization of operator input.

/// Tokenize one input line using a simple, shell-like lexer.
///
/// Single and double quotes group text (including whitespace and commas,
/// which matters for X.500 names) into one token; a backslash escapes the
/// next character outside single quotes. Quote characters themselves are
/// stripped from the returned tokens. An unterminated quote runs to the end
/// of the line rather than failing; the shell has no better recovery to
/// offer mid-line.
pub fn lex_line(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut has_token = false;
    let mut in_single = false;
    let mut in_double = false;
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' if !in_double => {
                in_single = !in_single;
                has_token = true;
            }
            '"' if !in_single => {
                in_double = !in_double;
                has_token = true;
            }
            '\\' if !in_single => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                    has_token = true;
                }
            }
            c if c.is_whitespace() && !in_single && !in_double => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        tokens.push(current);
    }
    tokens
}

#[derive(PartialEq, Debug, Clone)]
pub enum Token {
    Defines,
    Or,
    // Everything between two separators, trimmed at both ends
    Text(String)
}

fn lex_section(section: &str, tokens: &mut Vec<Token>) {
    for (i, alternative) in section.split('|').enumerate() {
        if i > 0 {
            tokens.push(Token::Or);
        }
        tokens.push(Token::Text(alternative.trim().to_string()));
    }
}

// Splits a rule line at `:=` and `|`. There is always a text token between
// two separators, possibly an empty one.
pub fn lex_line(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();

    for (i, section) in line.split(":=").enumerate() {
        if i > 0 {
            tokens.push(Token::Defines);
        }
        lex_section(section, &mut tokens);
    }

    return tokens;
}

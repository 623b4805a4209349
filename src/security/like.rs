//! SQL `LIKE` pattern escaping and evaluation.
//!
//! User text placed inside a `LIKE`/`ILIKE` pattern must have its
//! wildcards neutralized, otherwise a subject such as `100%` matches far
//! more rows than intended. Patterns here use `\` as the escape character,
//! the PostgreSQL default.

/// Escape `\`, `%` and `_` so `input` matches only itself.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 4);
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `%<escaped input>%`: substring search for the literal text.
pub fn contains_pattern(input: &str) -> String {
    format!("%{}%", escape_like(input))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyOne,
    AnyMany,
}

fn tokenize(pattern: &str, case_insensitive: bool) -> Vec<Token> {
    let fold = |c: char| {
        if case_insensitive {
            c.to_lowercase().next().unwrap_or(c)
        } else {
            c
        }
    };

    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        let token = match c {
            '\\' => match chars.next() {
                Some(escaped) => Token::Literal(fold(escaped)),
                // A trailing escape matches a literal backslash.
                None => Token::Literal('\\'),
            },
            '%' => Token::AnyMany,
            '_' => Token::AnyOne,
            other => Token::Literal(fold(other)),
        };
        if token == Token::AnyMany && tokens.last() == Some(&Token::AnyMany) {
            continue;
        }
        tokens.push(token);
    }
    tokens
}

/// Evaluate `text LIKE pattern` (or `ILIKE` when `case_insensitive`).
pub fn like_match(pattern: &str, text: &str, case_insensitive: bool) -> bool {
    let tokens = tokenize(pattern, case_insensitive);
    let text: Vec<char> = if case_insensitive {
        text.chars().map(|c| c.to_lowercase().next().unwrap_or(c)).collect()
    } else {
        text.chars().collect()
    };

    // Greedy matcher with single backtrack point on the last `%`.
    let (mut t, mut p) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        match tokens.get(p) {
            Some(Token::AnyMany) => {
                star = Some((p, t));
                p += 1;
            }
            Some(Token::AnyOne) => {
                t += 1;
                p += 1;
            }
            Some(Token::Literal(c)) if *c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match star {
                Some((sp, st)) => {
                    p = sp + 1;
                    t = st + 1;
                    star = Some((sp, st + 1));
                }
                None => return false,
            },
        }
    }

    tokens[p..].iter().all(|tok| *tok == Token::AnyMany)
}

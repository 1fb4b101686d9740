//! String-aware bracket scanning shared by the healing passes and SSR.

pub const OPENERS: [char; 3] = ['(', '[', '{'];
pub const CLOSERS: [char; 3] = [')', ']', '}'];

pub fn closer_for(opener: char) -> char {
    match opener {
        '(' => ')',
        '[' => ']',
        '{' => '}',
        _ => opener,
    }
}

pub fn is_opener(c: char) -> bool {
    OPENERS.contains(&c)
}

pub fn is_closer(c: char) -> bool {
    CLOSERS.contains(&c)
}

/// The closers still expected at end of input, in opening order. Brackets
/// inside string literals are ignored; backslash escapes and both quote
/// styles are tracked.
pub fn residual_closers(source: &str) -> Vec<char> {
    let mut stack: Vec<char> = Vec::new();
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;
    for c in source.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            _ if in_single || in_double => {}
            _ if is_opener(c) => stack.push(closer_for(c)),
            _ if is_closer(c) => {
                if stack.last() == Some(&c) {
                    stack.pop();
                }
                // An unmatched closer is somebody else's problem.
            }
            _ => {}
        }
    }
    stack
}

/// Count of unmatched openers across the whole source. Lower is better.
pub fn unmatched_opener_count(source: &str) -> usize {
    residual_closers(source).len()
}

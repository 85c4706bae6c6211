use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

static STRIP_COMMENTS_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_strip_comments_regex() -> &'static Regex {
    STRIP_COMMENTS_REGEX.get_or_init(|| {
        // Group 1 is a quoted literal, group 2 a comment. Literals never span
        // lines, so a stray apostrophe cannot swallow the comments after it.
        Regex::new(
            r#"(?s)("(?:\\.|[^"\\\r\n])*"|'(?:\\.|[^'\\\r\n])*')|(/\*.*?\*/|//[^\r\n]*)"#,
        )
        .expect("STRIP_COMMENTS_REGEX pattern is invalid - this is a bug")
    })
}

/// Remove `//` and `/* */` comments from `text`, leaving quoted literals intact.
///
/// Returns the input unchanged (borrowed) when it contains no comments.
/// Unterminated block comments are left as they are.
pub fn strip_comments(text: &str) -> Cow<'_, str> {
    let regex = get_strip_comments_regex();

    let mut result: Option<String> = None;
    let mut index = 0;
    for captures in regex.captures_iter(text) {
        let Some(comment) = captures.get(2) else {
            continue;
        };
        let buffer = result.get_or_insert_with(|| String::with_capacity(text.len()));
        buffer.push_str(&text[index..comment.start()]);
        index = comment.end();
    }

    match result {
        Some(mut buffer) => {
            buffer.push_str(&text[index..]);
            Cow::Owned(buffer)
        }
        None => Cow::Borrowed(text),
    }
}

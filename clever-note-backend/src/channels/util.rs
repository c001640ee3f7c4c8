//! Shared utilities for channel implementations.

/// Split a message into chunks respecting a platform's character limit.
/// Splits on line boundaries; lines exceeding `max_chars` are hard-split.
/// Lengths are counted in characters, so multi-byte text is never cut
/// inside a code point.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines() {
        let line_len = line.chars().count();
        if current_len + line_len + 1 > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if line_len > max_chars {
                let chars: Vec<char> = line.chars().collect();
                let mut pieces = chars.chunks(max_chars).peekable();
                while let Some(piece) = pieces.next() {
                    let piece: String = piece.iter().collect();
                    if pieces.peek().is_some() {
                        chunks.push(piece);
                    } else {
                        current_len = piece.chars().count();
                        current = piece;
                    }
                }
            } else {
                current = line.to_string();
                current_len = line_len;
            }
        } else {
            if !current.is_empty() {
                current.push('\n');
                current_len += 1;
            }
            current.push_str(line);
            current_len += line_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

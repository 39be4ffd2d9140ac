/// Splits an escaped PO string into pieces of at most `max_width` characters.
///
/// Breaks go after the first escaped newline in the window, otherwise after
/// the last run of whitespace, otherwise after the last punctuation mark. An
/// escape pair such as `\"` is never split, so a piece may run one character
/// over when the window ends inside one. `max_width == 0` disables folding.
/// Concatenating the pieces always yields `text`.
pub fn fold_line(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 || text.is_empty() {
        return vec![text.to_string()];
    }
    let units = split_units(text);
    let mut pieces = Vec::new();
    let mut start = 0usize;
    while start < units.len() {
        let mut end = start;
        let mut width = 0usize;
        while end < units.len() {
            let unit_width = units[end].chars().count();
            if end > start && width + unit_width > max_width {
                break;
            }
            width += unit_width;
            end += 1;
        }
        let window = &units[start..end];
        let at_end = end == units.len();
        let cut = if let Some(idx) = window.iter().position(|unit| *unit == "\\n") {
            idx + 1
        } else if !at_end {
            preferred_break(window).unwrap_or(window.len())
        } else {
            window.len()
        };
        pieces.push(window[..cut].concat());
        start += cut;
    }
    pieces
}

fn preferred_break(window: &[&str]) -> Option<usize> {
    let last_space = window.iter().rposition(|unit| is_space(unit));
    if let Some(idx) = last_space {
        if window[..idx].iter().any(|unit| !is_space(unit)) {
            return Some(idx + 1);
        }
    }
    let last_special = window.iter().rposition(|unit| is_special(unit));
    if let Some(idx) = last_special {
        if window[..idx].iter().any(|unit| !is_special(unit)) {
            return Some(idx + 1);
        }
    }
    None
}

fn split_units(text: &str) -> Vec<&str> {
    let mut units = Vec::with_capacity(text.len());
    let mut iter = text.char_indices();
    while let Some((idx, ch)) = iter.next() {
        let mut end = idx + ch.len_utf8();
        if ch == '\\' {
            if let Some((next_idx, next)) = iter.next() {
                end = next_idx + next.len_utf8();
            }
        }
        units.push(&text[idx..end]);
    }
    units
}

fn is_space(unit: &str) -> bool {
    unit.chars().all(char::is_whitespace)
}

fn is_special(unit: &str) -> bool {
    if unit.starts_with('\\') {
        return true;
    }
    unit.chars().all(|ch| {
        matches!(ch, '\x21'..='\x2f' | '0'..='9' | '\x5b'..='\x60' | '\x7b'..='\x7e')
    })
}

#[cfg(test)]
mod tests {
    use super::fold_line;

    #[test]
    fn zero_width_disables_folding() {
        let text = "a fairly long line that would otherwise be folded";
        assert_eq!(fold_line(text, 0), vec![text.to_string()]);
    }

    #[test]
    fn short_text_is_one_piece() {
        assert_eq!(fold_line("short", 76), vec!["short".to_string()]);
    }

    #[test]
    fn breaks_after_whitespace() {
        let pieces = fold_line("the quick brown fox jumps", 12);
        assert_eq!(pieces, vec!["the quick ", "brown fox ", "jumps"]);
    }

    #[test]
    fn breaks_after_escaped_newline_first() {
        let pieces = fold_line("Language: de\\nPlural-Forms: nplurals=2\\n", 76);
        assert_eq!(pieces, vec!["Language: de\\n", "Plural-Forms: nplurals=2\\n"]);
    }

    #[test]
    fn never_splits_escape_pairs() {
        let text = "abcd\\\"efgh\\\\ijkl";
        for width in 1..=text.len() {
            for piece in fold_line(text, width) {
                let trailing = piece.chars().rev().take_while(|ch| *ch == '\\').count();
                assert_eq!(trailing % 2, 0, "split escape at width {width}: {piece:?}");
            }
        }
    }

    #[test]
    fn pieces_reconstruct_input() {
        let samples = [
            "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod tempor",
            "no_spaces_here_at_all_just_one_very_long_identifier_like_thing_that_keeps_going",
            "multi\\nline\\ttext with \\\"quotes\\\" and unicode ümlauts ü ü ü ü ü ü",
            "   leading spaces and trailing   ",
        ];
        for sample in samples {
            for width in 1..=90 {
                assert_eq!(fold_line(sample, width).concat(), sample, "width {width}");
            }
        }
    }

    #[test]
    fn folding_is_deterministic() {
        let text = "same input, same width, same pieces every time it is folded";
        assert_eq!(fold_line(text, 20), fold_line(text, 20));
    }
}

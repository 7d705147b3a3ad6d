//! Help text normalization
//!
//! Command help is written as indented multi-line literals; this strips the
//! common leading whitespace so listings line up regardless of how deeply the
//! source text was indented. Blank lines are kept verbatim.

/// Strip the longest whitespace prefix shared by every non-blank line
pub fn normalize_help(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();

    let prefix_len = common_prefix_len(&lines);

    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if line.trim().is_empty() {
            out.push_str(line);
        } else {
            out.push_str(&line[prefix_len..]);
        }
    }
    out
}

fn common_prefix_len(lines: &[&str]) -> usize {
    let mut prefix: Option<&str> = None;

    for line in lines.iter().filter(|l| !l.trim().is_empty()) {
        let indent = &line[..line.len() - line.trim_start().len()];
        prefix = Some(match prefix {
            None => indent,
            Some(p) => {
                let common: usize = p
                    .chars()
                    .zip(indent.chars())
                    .take_while(|(a, b)| a == b)
                    .map(|(a, _)| a.len_utf8())
                    .sum();
                &p[..common]
            }
        });
    }

    prefix.map_or(0, str::len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_indentation_is_stripped() {
        let text = "    stick - set stick position\n    usage: stick <side> <direction>";
        assert_eq!(
            normalize_help(text),
            "stick - set stick position\nusage: stick <side> <direction>"
        );
    }

    #[test]
    fn test_deeper_indentation_is_preserved_relative() {
        let text = "  top\n    nested\n  top again";
        assert_eq!(normalize_help(text), "top\n  nested\ntop again");
    }

    #[test]
    fn test_blank_lines_kept_verbatim() {
        let text = "  a\n\n  b";
        assert_eq!(normalize_help(text), "a\n\nb");
    }

    #[test]
    fn test_unindented_text_unchanged() {
        let text = "plain\ntext";
        assert_eq!(normalize_help(text), text);
    }

    #[test]
    fn test_whitespace_only_input() {
        assert_eq!(normalize_help("   "), "   ");
        assert_eq!(normalize_help(""), "");
    }
}

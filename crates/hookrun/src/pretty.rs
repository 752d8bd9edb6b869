/// Render `exe args...` for display, quoting arguments that contain whitespace.
pub fn pretty(exe: &str, args: &[String]) -> String {
    let mut out = String::from(exe);
    for arg in args {
        out.push(' ');
        if arg.chars().any(is_space) {
            out.push_str(&format!("{arg:?}"));
        } else {
            out.push_str(arg);
        }
    }
    out
}

/// Latin-1 whitespace: the ASCII set plus NEL and NBSP.
pub fn is_space(c: char) -> bool {
    matches!(
        c,
        ' ' | '\t' | '\n' | '\u{0B}' | '\u{0C}' | '\r' | '\u{85}' | '\u{A0}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// Minimal reader for the quoting `pretty` produces.
    fn unquote(quoted: &str) -> String {
        let inner = quoted
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap();
        let mut out = String::new();
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next().unwrap() {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '0' => out.push('\0'),
                'u' => {
                    let hex: String = chars
                        .by_ref()
                        .skip_while(|c| *c == '{')
                        .take_while(|c| *c != '}')
                        .collect();
                    out.push(char::from_u32(u32::from_str_radix(&hex, 16).unwrap()).unwrap());
                }
                other => out.push(other),
            }
        }
        out
    }

    #[test]
    fn plain_arguments_are_verbatim() {
        assert_eq!(pretty("ls", &args(&["-la", "/tmp"])), "ls -la /tmp");
        assert_eq!(pretty("true", &[]), "true");
        assert_eq!(pretty("echo", &args(&["it's", "a\"b"])), "echo it's a\"b");
    }

    #[test]
    fn argument_with_space_is_quoted() {
        assert_eq!(pretty("ls", &args(&["-la", "my dir"])), r#"ls -la "my dir""#);
    }

    #[test]
    fn control_whitespace_is_escaped() {
        assert_eq!(pretty("printf", &args(&["a\tb\n"])), r#"printf "a\tb\n""#);
    }

    #[test]
    fn quoted_form_round_trips() {
        for original in [
            "my dir",
            "tab\there",
            "line\nbreak",
            "cr\r",
            "vt\u{0B}ff\u{0C}",
            "nel\u{85}",
            "nbsp\u{A0}x",
            "quote \" and \\ slash",
        ] {
            let rendered = pretty("x", &[original.to_string()]);
            let quoted = rendered.strip_prefix("x ").unwrap();
            assert!(quoted.starts_with('"'), "{original:?} was not quoted");
            assert_eq!(unquote(quoted), original);
        }
    }

    #[test]
    fn other_unicode_spaces_are_not_quoted() {
        assert_eq!(pretty("x", &args(&["em\u{2003}space"])), "x em\u{2003}space");
    }

    #[test]
    fn is_space_matches_latin1_set() {
        for c in [' ', '\t', '\n', '\u{0B}', '\u{0C}', '\r', '\u{85}', '\u{A0}'] {
            assert!(is_space(c), "{c:?}");
        }
        for c in ['a', '_', '\u{2003}', '\u{3000}'] {
            assert!(!is_space(c), "{c:?}");
        }
    }
}

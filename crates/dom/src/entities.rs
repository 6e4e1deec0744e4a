/// Decode the character references that show up in hand-written template markup.
///
/// Named: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&nbsp;`. Numeric: `&#123;` and
/// `&#x7B;`, only when semicolon-terminated and naming a valid scalar value. Anything else
/// is copied through unchanged.
pub(crate) fn decode_entities(s: &str) -> String {
    const NAMED: &[(&str, char)] = &[
        ("&amp;", '&'),
        ("&lt;", '<'),
        ("&gt;", '>'),
        ("&quot;", '"'),
        ("&apos;", '\''),
        ("&nbsp;", '\u{00A0}'),
    ];
    // 0x10FFFF / 1114111
    const MAX_HEX_DIGITS: usize = 6;
    const MAX_DEC_DIGITS: usize = 7;

    if memchr::memchr(b'&', s.as_bytes()).is_none() {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        if let Some((entity, ch)) = NAMED.iter().find(|(entity, _)| rest.starts_with(entity)) {
            out.push(*ch);
            rest = &rest[entity.len()..];
            continue;
        }

        let numeric = if let Some(hex) = rest
            .strip_prefix("&#x")
            .or_else(|| rest.strip_prefix("&#X"))
        {
            numeric_reference(hex, 16, MAX_HEX_DIGITS).map(|(ch, len)| (ch, len + 3))
        } else if let Some(dec) = rest.strip_prefix("&#") {
            numeric_reference(dec, 10, MAX_DEC_DIGITS).map(|(ch, len)| (ch, len + 2))
        } else {
            None
        };

        match numeric {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Parses `digits;` and returns the decoded char with the number of bytes consumed.
fn numeric_reference(input: &str, radix: u32, max_digits: usize) -> Option<(char, usize)> {
    let end = input.find(';')?;
    let digits = &input[..end];
    if digits.is_empty()
        || digits.len() > max_digits
        || !digits.chars().all(|c| c.is_digit(radix))
    {
        return None;
    }
    let ch = u32::from_str_radix(digits, radix)
        .ok()
        .and_then(char::from_u32)?;
    Some((ch, end + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_named_and_numeric_references() {
        let cases = [
            ("Tom &amp; Jerry", "Tom & Jerry"),
            ("&lt;b&gt;bold&lt;/b&gt;", "<b>bold</b>"),
            ("say &quot;hi&quot;", "say \"hi\""),
            ("x&nbsp;y", "x\u{00A0}y"),
            ("&#65;&#x42;&#X43;", "ABC"),
        ];
        for (input, expected) in cases {
            assert_eq!(decode_entities(input), expected, "input {input:?}");
        }
    }

    #[test]
    fn leaves_unknown_and_malformed_references() {
        for input in ["&bogus;", "&lt", "&#xDFFF;", "&#1114112;", "&#x;", "& alone"] {
            assert_eq!(decode_entities(input), input);
        }
        assert_eq!(decode_entities("&#xG1;&gt;"), "&#xG1;>");
    }

    #[test]
    fn keeps_multibyte_text_intact() {
        assert_eq!(decode_entities("é &lt; ü"), "é < ü");
        assert_eq!(decode_entities("日本$v0$語"), "日本$v0$語");
    }
}

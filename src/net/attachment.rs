use axum::http::HeaderValue;

use crate::net::error;

/// builds a `Content-Disposition: attachment` value
///
/// ascii names are sent as `filename="<name>"`. anything else gets an ascii
/// fallback in `filename` and the exact name in `filename*` (RFC 5987)
pub fn content_disposition(filename: &str) -> error::Result<HeaderValue> {
    let mut fallback = String::with_capacity(filename.len());
    let mut plain = true;

    for ch in filename.chars() {
        match ch {
            '"' | '\\' => {
                fallback.push('\\');
                fallback.push(ch);
            }
            ' '..='~' => fallback.push(ch),
            _ => {
                plain = false;
                fallback.push('_');
            }
        }
    }

    let value = if plain {
        format!("attachment; filename=\"{fallback}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            urlencoding::encode(filename)
        )
    };

    Ok(HeaderValue::from_str(&value)?)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ascii_names() {
        let cases = [
            ("report.pdf", "attachment; filename=\"report.pdf\""),
            ("files.zip", "attachment; filename=\"files.zip\""),
            ("my \"quoted\" file.txt", "attachment; filename=\"my \\\"quoted\\\" file.txt\""),
        ];

        for (name, expected) in cases {
            assert_eq!(content_disposition(name).unwrap(), expected, "name {:?}", name);
        }
    }

    #[test]
    fn non_ascii_names_get_extended_param() {
        let value = content_disposition("отчёт.pdf").unwrap();

        assert_eq!(
            value.to_str().unwrap(),
            "attachment; filename=\"_____.pdf\"; filename*=UTF-8''%D0%BE%D1%82%D1%87%D1%91%D1%82.pdf"
        );
    }

    #[test]
    fn control_chars_are_replaced() {
        let value = content_disposition("a\nb.txt").unwrap();

        assert!(value.to_str().unwrap().starts_with("attachment; filename=\"a_b.txt\""));
    }
}

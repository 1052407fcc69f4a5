//! Form body encoders.
//!
//! Multipart bodies follow RFC 7578 with text-only parts: one
//! `Content-Disposition: form-data; name="..."` part per entry, CRLF line
//! endings and a random boundary.

use uuid::Uuid;

use crate::http::RequestBody;

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Wrap an already-encoded query string as a urlencoded form body.
pub fn urlencoded(query: &str) -> RequestBody {
    RequestBody {
        content_type: format!("{FORM_URLENCODED};charset=UTF-8"),
        bytes: query.trim_start_matches('?').as_bytes().to_vec(),
    }
}

/// Encode `entries` as `multipart/form-data` with a fresh boundary.
pub fn multipart(entries: &[(&str, &str)]) -> RequestBody {
    let boundary = format!("----ShopFormBoundary{}", Uuid::new_v4().simple());
    multipart_with_boundary(entries, &boundary)
}

pub fn multipart_with_boundary(entries: &[(&str, &str)], boundary: &str) -> RequestBody {
    let mut body = String::new();
    for (name, value) in entries {
        body.push_str("--");
        body.push_str(boundary);
        body.push_str("\r\n");
        body.push_str("Content-Disposition: form-data; name=\"");
        body.push_str(&escape_name(name));
        body.push_str("\"\r\n\r\n");
        body.push_str(value);
        body.push_str("\r\n");
    }
    body.push_str("--");
    body.push_str(boundary);
    body.push_str("--\r\n");
    RequestBody {
        content_type: format!("multipart/form-data; boundary={boundary}"),
        bytes: body.into_bytes(),
    }
}

// Percent-escape the characters that would break the quoted name.
fn escape_name(name: &str) -> String {
    name.replace('\r', "%0D").replace('\n', "%0A").replace('"', "%22")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multipart_layout() {
        let body = multipart_with_boundary(&[("tags", "1"), ("tags", "2")], "XYZ");
        assert_eq!(body.content_type, "multipart/form-data; boundary=XYZ");
        assert_eq!(
            body.as_text(),
            "--XYZ\r\nContent-Disposition: form-data; name=\"tags\"\r\n\r\n1\r\n\
             --XYZ\r\nContent-Disposition: form-data; name=\"tags\"\r\n\r\n2\r\n\
             --XYZ--\r\n"
        );
    }

    #[test]
    fn multipart_of_nothing_is_just_the_terminator() {
        let body = multipart_with_boundary(&[], "B");
        assert_eq!(body.as_text(), "--B--\r\n");
    }

    #[test]
    fn quotes_in_names_are_escaped() {
        let body = multipart_with_boundary(&[("a\"b", "v")], "B");
        assert!(body.as_text().contains("name=\"a%22b\""));
    }

    #[test]
    fn fresh_boundaries_differ() {
        let a = multipart(&[("k", "v")]);
        let b = multipart(&[("k", "v")]);
        assert_ne!(a.content_type, b.content_type);
    }

    #[test]
    fn urlencoded_keeps_query_verbatim() {
        let body = urlencoded("foo=1&bar=2");
        assert_eq!(body.as_text(), "foo=1&bar=2");
        assert!(body.content_type.starts_with(FORM_URLENCODED));
    }
}

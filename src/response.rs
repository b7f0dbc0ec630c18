use actix_web::cookie::{time::Duration, Cookie};
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse};

/// One-shot message attached to a redirect, shown once on the next
/// rendered page.
pub const FLASH_COOKIE: &str = "flash";

pub fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

/// Render a page after consuming a flash message: the removal cookie
/// rides along with the body.
pub fn html_clearing_flash(body: String) -> HttpResponse {
    let mut removal = Cookie::new(FLASH_COOKIE, "");
    removal.set_path("/");
    removal.set_max_age(Duration::ZERO);
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .cookie(removal)
        .body(body)
}

pub fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

pub fn see_other_with_flash(location: &str, message: &str) -> HttpResponse {
    let mut cookie = Cookie::new(FLASH_COOKIE, encode_cookie_value(message));
    cookie.set_path("/");
    cookie.set_http_only(true);
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .cookie(cookie)
        .finish()
}

pub fn take_flash(req: &HttpRequest) -> Option<String> {
    req.cookie(FLASH_COOKIE)
        .map(|c| decode_cookie_value(c.value()))
        .filter(|v| !v.is_empty())
}

pub fn internal_error() -> HttpResponse {
    HttpResponse::InternalServerError()
        .content_type("text/html; charset=utf-8")
        .body("<h1>Something went wrong</h1><p>The error has been logged.</p>")
}

// Flash messages carry spaces and punctuation; cookie values may not.
fn encode_cookie_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'.' | b'_' | b'-' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

// Works on raw bytes throughout: the cookie value is client-controlled
// and slicing the &str could land inside a multibyte character.
fn decode_cookie_value(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                out.push(hi * 16 + lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_digit(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_encoding_round_trips() {
        let msg = "Employee added successfully.";
        assert_eq!(decode_cookie_value(&encode_cookie_value(msg)), msg);
    }

    #[test]
    fn decoding_tolerates_arbitrary_client_values() {
        // A multibyte character right after '%' must not split a char.
        assert_eq!(decode_cookie_value("%aé"), "%aé");
        assert_eq!(decode_cookie_value("%é0"), "%é0");
        // Truncated and non-hex escapes pass through untouched.
        assert_eq!(decode_cookie_value("%"), "%");
        assert_eq!(decode_cookie_value("%2"), "%2");
        assert_eq!(decode_cookie_value("%zz"), "%zz");
        assert_eq!(decode_cookie_value("100%25"), "100%");
    }

    #[test]
    fn encoded_value_is_cookie_safe() {
        let encoded = encode_cookie_value("a b;c=d");
        assert!(!encoded.contains(' '));
        assert!(!encoded.contains(';'));
        assert!(!encoded.contains('='));
    }
}

// Copyright 2025 Janek Bevendorff
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! Small parsers for WARC and HTTP header values.

use std::net::IpAddr;

use uuid::Uuid;

/// Charset families reported by [`canonicalize_charset`].
const CHARSET_FAMILIES: &[(&str, &str)] = &[
    ("utf", "utf"),
    ("windows", "windows"),
    ("cp", "windows"),
    ("iso", "iso"),
    ("latin", "iso"),
    ("us-ascii", "ascii"),
    ("ascii", "ascii"),
    ("shift_jis", "shift_jis"),
    ("sjis", "shift_jis"),
    ("euc", "euc"),
    ("gb", "gb"),
    ("big5", "big5"),
    ("koi8", "koi8"),
];

/// Server families reported by [`canonicalize_server`].
const SERVERS: &[&str] = &[
    "nginx",
    "apache",
    "microsoft-iis",
    "cloudflare",
    "litespeed",
    "openresty",
    "gws",
    "gse",
    "lighttpd",
    "tengine",
    "caddy",
    "envoy",
    "varnish",
    "akamaighost",
    "amazons3",
    "awselb",
];

/// Host name fragments of well-known content delivery networks.
const CDN_HOSTS: &[&str] = &[
    "cloudfront.net",
    "akamaihd.net",
    "akamaized.net",
    "akamai.net",
    "edgesuite.net",
    "edgekey.net",
    "fastly.net",
    "fastly.com",
    "cloudflare.com",
    "cdnjs.com",
    "jsdelivr.net",
    "unpkg.com",
    "azureedge.net",
    "llnwd.net",
    "cdn77.org",
    "stackpathdns.com",
    "googleusercontent.com",
    "gstatic.com",
    "b-cdn.net",
];

const COMPRESSIONS: &[&str] = &["gzip", "x-gzip", "deflate", "br", "compress", "x-compress", "zstd"];

/// Parse a WARC record ID URN into its 32 hex digit form.
///
/// `<urn:uuid:ffbfb0c0-6456-42b0-af03-3867be6fc09f>` becomes
/// `ffbfb0c0645642b0af033867be6fc09f`. Returns `None` for anything that is not a UUID.
pub fn parse_id(uri: &str) -> Option<String> {
    let uri = uri.trim();
    let uri = uri.strip_prefix('<').unwrap_or(uri);
    let uri = uri.strip_suffix('>').unwrap_or(uri);
    Uuid::parse_str(uri).ok().map(|id| id.simple().to_string())
}

/// Top-level domain of a host name (`amazon.co.uk` becomes `uk`).
///
/// IP addresses and empty hosts have no TLD.
pub fn extract_tld(hostname: &str) -> String {
    let host = hostname.trim_end_matches('.');
    if host.is_empty() || is_ip_literal(host) {
        return String::new();
    }
    host.rsplit('.').next().unwrap_or_default().to_ascii_lowercase()
}

/// Number of non-empty segments in a URL path, saturating at `u8::MAX`.
pub fn extract_path_depth(path: &str) -> u8 {
    let depth = path.split('/').filter(|s| !s.is_empty()).count();
    depth.min(u8::MAX as usize) as u8
}

/// `msgtype` parameter of a WARC `Content-Type` header.
///
/// `application/http;msgtype=request` becomes `request`, anything without a
/// `msgtype` parameter yields an empty string.
pub fn extract_warc_msgtype(content_type: &str) -> String {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("msgtype"))
        .map(|(_, value)| value.trim().trim_matches('"').to_ascii_lowercase())
        .unwrap_or_default()
}

/// MIME type of a `Content-Type` header without parameters.
pub fn extract_mime(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Lower-cased `charset` parameter of a `Content-Type` header, or an empty string.
pub fn extract_charset(content_type: &str) -> String {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
        .map(|(_, value)| {
            value
                .trim()
                .trim_matches(|c: char| c == '"' || c == '\'')
                .to_ascii_lowercase()
        })
        .unwrap_or_default()
}

/// Reduce a charset name to its family (`utf-16` becomes `utf`).
///
/// Unknown charsets become `other`, an empty charset stays empty.
pub fn canonicalize_charset(charset: &str) -> String {
    let charset = charset.trim().to_ascii_lowercase();
    if charset.is_empty() {
        return charset;
    }
    CHARSET_FAMILIES
        .iter()
        .find(|(prefix, _)| charset.starts_with(*prefix))
        .map_or("other", |&(_, family)| family)
        .to_string()
}

/// Reduce an HTTP `Server` header to the server product without version.
///
/// `Nginx/1.9.2` becomes `nginx`. Unknown servers become `other`, an empty
/// header stays empty.
pub fn canonicalize_server(server: &str) -> String {
    let server = server.trim().to_ascii_lowercase();
    if server.is_empty() {
        return server;
    }
    let product = server
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .unwrap_or_default();
    SERVERS
        .iter()
        .find(|s| product.starts_with(**s))
        .map_or("other", |s| *s)
        .to_string()
}

/// Whether an address looks like IPv6. No syntax check is done.
pub fn is_ipv6(ip: &str) -> bool {
    ip.bytes().filter(|&b| b == b':').count() >= 2
}

/// Whether a `Content-Encoding` header names any compression.
pub fn uses_compression(content_encoding: &str) -> bool {
    content_encoding
        .split(',')
        .map(|enc| enc.trim())
        .any(|enc| COMPRESSIONS.iter().any(|c| enc.eq_ignore_ascii_case(c)))
}

/// Whether a URL points to a known CDN host.
pub fn check_cdn(url: &str) -> bool {
    let url = url.to_ascii_lowercase();
    CDN_HOSTS.iter().any(|cdn| url.contains(cdn))
}

/// Whether a host is an IPv4 or IPv6 address, with or without brackets.
pub fn is_ip_literal(host: &str) -> bool {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    host.parse::<IpAddr>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(
            parse_id("<urn:uuid:ffbfb0c0-6456-42b0-af03-3867be6fc09f>").as_deref(),
            Some("ffbfb0c0645642b0af033867be6fc09f")
        );
        assert_eq!(
            parse_id("urn:uuid:FFBFB0C0-6456-42B0-AF03-3867BE6FC09F").as_deref(),
            Some("ffbfb0c0645642b0af033867be6fc09f")
        );
        assert_eq!(parse_id("<urn:uuid:not-a-uuid>"), None);
        assert_eq!(parse_id(""), None);
    }

    #[test]
    fn test_extract_tld() {
        assert_eq!(extract_tld("amazon.co.uk"), "uk");
        assert_eq!(extract_tld("Example.COM."), "com");
        assert_eq!(extract_tld("localhost"), "localhost");
        assert_eq!(extract_tld("10.0.23.19"), "");
        assert_eq!(extract_tld("[2001:a30::11]"), "");
        assert_eq!(extract_tld(""), "");
    }

    #[test]
    fn test_is_ip_literal() {
        assert!(is_ip_literal("10.0.23.19"));
        assert!(is_ip_literal("[2001:a30::11]"));
        assert!(is_ip_literal("2001:a30::11"));
        assert!(!is_ip_literal("example.com"));
        assert!(!is_ip_literal("[example.com]"));
        assert!(!is_ip_literal(""));
    }

    #[test]
    fn test_extract_path_depth() {
        assert_eq!(extract_path_depth(""), 0);
        assert_eq!(extract_path_depth("/"), 0);
        assert_eq!(extract_path_depth("/index.html"), 1);
        assert_eq!(extract_path_depth("/a/b/c/"), 3);
        assert_eq!(extract_path_depth(&"/a".repeat(300)), u8::MAX);
    }

    #[test]
    fn test_extract_warc_msgtype() {
        assert_eq!(extract_warc_msgtype("application/http;msgtype=request"), "request");
        assert_eq!(extract_warc_msgtype("application/http; msgtype=response"), "response");
        assert_eq!(extract_warc_msgtype("text/html; charset=UTF-8"), "");
        assert_eq!(extract_warc_msgtype("text/html"), "");
    }

    #[test]
    fn test_extract_mime_and_charset() {
        assert_eq!(extract_mime("text/html; charset=UTF-8"), "text/html");
        assert_eq!(extract_mime("text/html"), "text/html");
        assert_eq!(extract_charset("text/html; charset=UTF-8"), "utf-8");
        assert_eq!(extract_charset("text/html; charset=\"ISO-8859-1\""), "iso-8859-1");
        assert_eq!(extract_charset("text/html"), "");
    }

    #[test]
    fn test_canonicalize_charset() {
        assert_eq!(canonicalize_charset("utf-8"), "utf");
        assert_eq!(canonicalize_charset("UTF-16"), "utf");
        assert_eq!(canonicalize_charset("windows-1256"), "windows");
        assert_eq!(canonicalize_charset("iso-8859-1"), "iso");
        assert_eq!(canonicalize_charset("tis-620"), "other");
        assert_eq!(canonicalize_charset(""), "");
    }

    #[test]
    fn test_canonicalize_server() {
        assert_eq!(canonicalize_server("Nginx/1.9.2"), "nginx");
        assert_eq!(canonicalize_server("Apache/2.4.41 (Ubuntu)"), "apache");
        assert_eq!(canonicalize_server("Microsoft-IIS/10.0"), "microsoft-iis");
        assert_eq!(canonicalize_server("My cool server"), "other");
        assert_eq!(canonicalize_server("  "), "");
    }

    #[test]
    fn test_is_ipv6() {
        assert!(!is_ipv6("10.0.23.19"));
        assert!(!is_ipv6("82.44.120.203:8080"));
        assert!(is_ipv6("2001:a30::11"));
    }

    #[test]
    fn test_uses_compression() {
        assert!(uses_compression("deflate"));
        assert!(uses_compression("identity, GZIP"));
        assert!(!uses_compression("identity"));
        assert!(!uses_compression(""));
    }

    #[test]
    fn test_check_cdn() {
        assert!(check_cdn("https://d111111abcdef8.cloudfront.net/image.jpg"));
        assert!(check_cdn("http://cdn.jsdelivr.net/npm/jquery"));
        assert!(!check_cdn("http://example.com/"));
    }
}

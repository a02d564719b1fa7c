// SPDX-License-Identifier: MIT OR Apache-2.0
//! `Accept`/`Link`/`ETag` parsing and response-header construction,
//! including the recognised `Link rel="type"` IRIs.

use axum::http::{HeaderMap, HeaderValue};
use pkgs_error::{Error, Result};

/// The four LDP interaction-model IRIs this server recognises in a
/// request's `Link: <…>; rel="type"` header.
pub const LDP_RESOURCE: &str = "http://www.w3.org/ns/ldp#Resource";
pub const LDP_DIRECT_CONTAINER: &str = "http://www.w3.org/ns/ldp#DirectContainer";
pub const LDP_RDF_SOURCE: &str = "http://www.w3.org/ns/ldp#RDFSource";
pub const LDP_NON_RDF_SOURCE: &str = "http://www.w3.org/ns/ldp#NonRDFSource";

pub const N_QUADS: &str = "application/n-quads";
pub const LD_JSON: &str = "application/ld+json";
pub const TEXT_HTML: &str = "text/html";

/// The interaction model a `PUT`'s `Link: rel="type"` header selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    DirectContainer,
    RdfSource,
    NonRdfSource,
}

/// Scan `headers` for `Link` values carrying `rel="type"` and return the
/// single recognised interaction model. `Unprocessable` if none or more
/// than one of `DirectContainer`/`RDFSource`/`NonRDFSource` is present:
/// exactly one is required.
pub fn parse_link_type(headers: &HeaderMap) -> Result<LinkType> {
    let mut found = Vec::new();
    for value in headers.get_all("link").iter() {
        let Ok(text) = value.to_str() else { continue };
        for entry in text.split(',') {
            if !entry.contains("rel=\"type\"") && !entry.contains("rel=type") {
                continue;
            }
            let iri = entry.trim().trim_start_matches('<');
            let iri = iri.split('>').next().unwrap_or("").trim();
            match iri {
                LDP_DIRECT_CONTAINER => found.push(LinkType::DirectContainer),
                LDP_RDF_SOURCE => found.push(LinkType::RdfSource),
                LDP_NON_RDF_SOURCE => found.push(LinkType::NonRdfSource),
                _ => {}
            }
        }
    }
    match found.len() {
        1 => Ok(found.remove(0)),
        0 => Err(Error::Unprocessable("missing Link: rel=\"type\" header".to_string())),
        _ => Err(Error::Unprocessable("ambiguous Link: rel=\"type\" header".to_string())),
    }
}

/// Pick the best representation among `offers` (in server preference
/// order) for the client's `Accept` header, defaulting to `offers[0]`
/// when the header is absent, empty, or `*/*`.
pub fn negotiate(accept: Option<&HeaderValue>, offers: &[&'static str]) -> Option<&'static str> {
    let Some(accept) = accept.and_then(|v| v.to_str().ok()) else {
        return offers.first().copied();
    };
    let requested: Vec<String> = accept
        .split(',')
        .map(|part| part.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    if requested.is_empty() || requested.iter().any(|r| r == "*/*") {
        return offers.first().copied();
    }
    for want in &requested {
        if let Some(offer) = offers.iter().find(|o| o.eq_ignore_ascii_case(want)) {
            return Some(offer);
        }
    }
    None
}

/// Quote an etag value (the server always stores/compares unquoted
/// base32).
pub fn quote_etag(tag: &str) -> String {
    format!("\"{tag}\"")
}

/// Strip surrounding quotes and whitespace from a header-supplied
/// `If-Match`/`If-None-Match` value, which is compared against the
/// unquoted value.
pub fn unquote_etag(raw: &str) -> &str {
    raw.trim().trim_matches('"')
}

/// Does `header` (an `If-Match` value) match `current`? `*` matches any
/// existing resource.
pub fn if_match_ok(header: &str, current: &str) -> bool {
    let header = header.trim();
    header == "*" || unquote_etag(header) == current
}

/// Does `header` (an `If-None-Match` value) indicate the client's cached
/// copy is still fresh?
pub fn if_none_match_hit(header: &str, current: &str) -> bool {
    let header = header.trim();
    header == "*" || unquote_etag(header) == current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negotiate_prefers_first_requested_offer() {
        let accept = HeaderValue::from_static("application/ld+json, application/n-quads");
        let picked = negotiate(Some(&accept), &[N_QUADS, LD_JSON]);
        assert_eq!(picked, Some(LD_JSON));
    }

    #[test]
    fn negotiate_falls_back_to_default_offer() {
        let picked = negotiate(None, &[N_QUADS, LD_JSON]);
        assert_eq!(picked, Some(N_QUADS));
    }

    #[test]
    fn negotiate_rejects_unsatisfiable_accept() {
        let accept = HeaderValue::from_static("application/xml");
        let picked = negotiate(Some(&accept), &[N_QUADS, LD_JSON]);
        assert_eq!(picked, None);
    }

    #[test]
    fn if_match_wildcard_always_matches() {
        assert!(if_match_ok("*", "anything"));
        assert!(if_match_ok("\"abc\"", "abc"));
        assert!(!if_match_ok("\"abc\"", "xyz"));
    }

    #[test]
    fn parse_link_type_reads_non_rdf_source() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "link",
            HeaderValue::from_str(&format!("<{LDP_NON_RDF_SOURCE}>; rel=\"type\"")).unwrap(),
        );
        assert_eq!(parse_link_type(&headers).unwrap(), LinkType::NonRdfSource);
    }

    #[test]
    fn parse_link_type_rejects_missing_header() {
        let headers = HeaderMap::new();
        assert!(parse_link_type(&headers).is_err());
    }
}

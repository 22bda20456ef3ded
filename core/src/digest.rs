//! HTTP Digest authentication, MD5 with `qop=auth` (RFC 2617 §3.2).
//!
//! # Design
//! Nothing here is cached. A challenge is parsed from the 401 that just
//! arrived, answered once, and dropped. The nonce count is therefore always
//! `00000001`: a server nonce is never used for more than one request.

use std::collections::BTreeMap;

use rand::rngs::OsRng;
use rand::RngCore;
use tracing::warn;

use crate::config::Credentials;
use crate::error::RpcError;

/// Nonce count sent with every response. Never advances; see module docs.
pub const NONCE_COUNT: &str = "00000001";

const CNONCE_BYTES: usize = 8;

/// Fields of a `WWW-Authenticate: Digest ...` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub qop: String,
    pub opaque: Option<String>,
    pub algorithm: Option<String>,
    /// Every pair found in the header, known keys included.
    pub params: BTreeMap<String, String>,
}

impl DigestChallenge {
    /// Parse a `WWW-Authenticate` header value.
    ///
    /// The `Digest ` scheme prefix is optional. `realm` and `nonce` are
    /// required; a challenge missing either cannot produce a response the
    /// server would accept, so it is reported as `MissingChallenge` instead.
    pub fn parse(header: &str) -> Result<Self, RpcError> {
        let params = parse_params(strip_scheme(header.trim()));
        if params.is_empty() {
            return Err(RpcError::missing_challenge("", "no key=value pairs in challenge"));
        }

        let required = |key: &str| -> Result<String, RpcError> {
            match params.get(key) {
                Some(v) if !v.is_empty() => Ok(v.clone()),
                _ => Err(RpcError::missing_challenge("", format!("challenge has no {key}"))),
            }
        };
        let realm = required("realm")?;
        let nonce = required("nonce")?;

        Ok(Self {
            realm,
            nonce,
            qop: select_qop(params.get("qop").map(String::as_str)),
            opaque: params.get("opaque").cloned(),
            algorithm: params.get("algorithm").cloned(),
            params,
        })
    }

    /// Build an `Authorization` header value with a freshly drawn cnonce.
    pub fn authorize(&self, method: &str, uri: &str, credentials: &Credentials) -> String {
        digest_authorization(self, method, uri, credentials, &generate_cnonce())
    }
}

/// Hex-encoded client nonce from the OS random source.
pub fn generate_cnonce() -> String {
    let mut bytes = [0u8; CNONCE_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Compute the `Authorization` header value for `challenge`.
///
/// Deterministic for a given `cnonce`.
pub fn digest_authorization(
    challenge: &DigestChallenge,
    method: &str,
    uri: &str,
    credentials: &Credentials,
    cnonce: &str,
) -> String {
    if let Some(algorithm) = challenge.algorithm.as_deref() {
        if !algorithm.eq_ignore_ascii_case("MD5") {
            warn!(algorithm, "unsupported digest algorithm, answering with MD5");
        }
    }

    let response = response_hash(challenge, method, uri, credentials, cnonce);

    let mut header = format!(
        "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\", response=\"{}\", qop={}, nc={}, cnonce=\"{}\"",
        credentials.username,
        challenge.realm,
        challenge.nonce,
        uri,
        response,
        challenge.qop,
        NONCE_COUNT,
        cnonce,
    );
    if let Some(opaque) = &challenge.opaque {
        header.push_str(&format!(", opaque=\"{opaque}\""));
    }
    header
}

/// The `response=` value alone.
pub fn response_hash(
    challenge: &DigestChallenge,
    method: &str,
    uri: &str,
    credentials: &Credentials,
    cnonce: &str,
) -> String {
    let ha1 = md5_hex(&format!(
        "{}:{}:{}",
        credentials.username, challenge.realm, credentials.secret
    ));
    let ha2 = md5_hex(&format!("{method}:{uri}"));
    md5_hex(&format!(
        "{ha1}:{}:{NONCE_COUNT}:{cnonce}:{}:{ha2}",
        challenge.nonce, challenge.qop
    ))
}

fn md5_hex(input: &str) -> String {
    format!("{:x}", md5::compute(input.as_bytes()))
}

fn strip_scheme(header: &str) -> &str {
    match header.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("Digest") => rest,
        _ => header,
    }
}

/// Pick `auth` out of an offered qop list; default to `auth` when absent.
fn select_qop(offered: Option<&str>) -> String {
    match offered {
        None => "auth".to_string(),
        Some(list) => {
            let options: Vec<&str> = list.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
            if options.is_empty() || options.contains(&"auth") {
                "auth".to_string()
            } else {
                options[0].to_string()
            }
        }
    }
}

/// Split `k1="v1", k2=v2, ...` into a map.
///
/// Quoted values keep everything between the quotes, commas included, with
/// no unescaping. Unquoted values run to the next comma.
fn parse_params(input: &str) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    let mut rest = input;

    loop {
        rest = rest.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
        let Some(eq) = rest.find('=') else {
            break;
        };
        let key = rest[..eq].trim();
        // A stray token without '=' before the next pair: skip past it.
        if key.contains(',') {
            let comma = rest.find(',').unwrap_or(rest.len());
            rest = &rest[comma..];
            continue;
        }
        let after = rest[eq + 1..].trim_start();

        let (value, remainder) = if let Some(quoted) = after.strip_prefix('"') {
            match quoted.find('"') {
                Some(end) => (&quoted[..end], &quoted[end + 1..]),
                None => (quoted, ""),
            }
        } else {
            match after.find(',') {
                Some(end) => (after[..end].trim(), &after[end..]),
                None => (after.trim(), ""),
            }
        };

        if !key.is_empty() {
            params.insert(key.to_ascii_lowercase(), value.to_string());
        }
        rest = remainder;
    }

    params
}

//! Verify the digest builder against JSON vectors stored in `test-vectors/`.
//!
//! Each case gives a raw challenge, request method and URI, credentials and
//! a fixed cnonce, plus either the expected response hash and header or the
//! expected error.

use slide_core::digest::{digest_authorization, response_hash};
use slide_core::{Credentials, DigestChallenge, RpcError};

#[test]
fn digest_test_vectors() {
    let raw = include_str!("../../test-vectors/digest.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let parsed = DigestChallenge::parse(case["challenge"].as_str().unwrap());

        if let Some(expected_error) = case.get("expected_error") {
            let err = parsed.unwrap_err();
            match expected_error.as_str().unwrap() {
                "MissingChallenge" => {
                    assert!(matches!(err, RpcError::MissingChallenge { .. }), "{name}: expected MissingChallenge")
                }
                other => panic!("{name}: unknown expected_error: {other}"),
            }
            continue;
        }

        let challenge = parsed.unwrap();
        let credentials = Credentials::from_parts(
            case["username"].as_str().map(str::to_string),
            case["secret"].as_str().map(str::to_string),
        )
        .unwrap();
        let method = case["method"].as_str().unwrap();
        let uri = case["uri"].as_str().unwrap();
        let cnonce = case["cnonce"].as_str().unwrap();

        assert_eq!(
            response_hash(&challenge, method, uri, &credentials, cnonce),
            case["expected_response"].as_str().unwrap(),
            "{name}: response"
        );
        assert_eq!(
            digest_authorization(&challenge, method, uri, &credentials, cnonce),
            case["expected_header"].as_str().unwrap(),
            "{name}: header"
        );
    }
}

//! Property-based tests for compact token encoding and verification.

use auth_core::jwt::encoding::{base64url_decode, base64url_encode};
use auth_core::jwt::{ClaimSet, CompactTokenCodec};
use proptest::prelude::*;

fn codec() -> CompactTokenCodec {
    CompactTokenCodec::new("jwt-property-test-secret").unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// URL-safe base64 round-trips arbitrary bytes, including empty input,
    /// and never emits `+`, `/`, or `=`.
    #[test]
    fn prop_base64url_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let encoded = base64url_encode(&bytes);
        prop_assert!(!encoded.contains('+'));
        prop_assert!(!encoded.contains('/'));
        prop_assert!(!encoded.contains('='));
        prop_assert_eq!(base64url_decode(&encoded).unwrap(), bytes);
    }

    /// Encode then decode returns the original claims for arbitrary
    /// string claims with a future expiry.
    #[test]
    fn prop_encode_decode_round_trip(
        sub in "[a-zA-Z0-9_-]{1,32}",
        extra in "[a-zA-Z0-9 ]{0,64}",
    ) {
        let codec = codec();
        let exp = chrono::Utc::now().timestamp() + 3600;
        let claims = ClaimSet::new()
            .with_claim("sub", sub)
            .with_claim("note", extra)
            .with_claim("exp", exp);

        let token = codec.encode(&claims).unwrap();
        prop_assert_eq!(token.split('.').count(), 3);

        let decoded = codec.decode(&token);
        prop_assert_eq!(decoded, Some(claims));
    }

    /// A codec with a different secret never accepts the token.
    #[test]
    fn prop_wrong_secret_rejected(sub in "[a-zA-Z0-9]{1,32}") {
        let claims = ClaimSet::new().with_claim("sub", sub);
        let token = codec().encode(&claims).unwrap();

        let other = CompactTokenCodec::new("a-completely-different-secret").unwrap();
        prop_assert!(other.decode(&token).is_none());
    }

    /// Fewer or more than three dot-segments is always invalid.
    #[test]
    fn prop_wrong_segment_count_rejected(garbage in "[a-zA-Z0-9]{0,64}") {
        let codec = codec();
        prop_assert!(codec.decode(&garbage).is_none());
        prop_assert!(codec.decode(&format!("{0}.{0}", garbage)).is_none(), "two segments accepted");
        prop_assert!(codec.decode(&format!("{0}.{0}.{0}.{0}", garbage)).is_none(), "four segments accepted");
    }

    /// Any expiry at or before the clock reading is invalid; any future
    /// one is valid.
    #[test]
    fn prop_expiry_window_closed_open(offset in -3600i64..3600) {
        let codec = codec();
        let now = 1_700_000_000i64;
        let claims = ClaimSet::new().with_claim("exp", now + offset);
        let token = codec.encode(&claims).unwrap();

        let decoded = codec.decode_at(&token, now);
        if offset > 0 {
            prop_assert!(decoded.is_some());
        } else {
            prop_assert!(decoded.is_none());
        }
    }
}

#[test]
fn test_numeric_subject_round_trip() {
    let codec = codec();
    let exp = chrono::Utc::now().timestamp() + 3600;
    let claims = ClaimSet::new().with_claim("sub", 123).with_claim("exp", exp);

    let token = codec.encode(&claims).unwrap();
    let decoded = codec.decode(&token).unwrap();
    assert_eq!(decoded.get("sub").unwrap().as_i64(), Some(123));
    assert_eq!(decoded.expires_at(), Some(exp));
}

#[test]
fn test_past_expiry_rejected() {
    let codec = codec();
    let claims = ClaimSet::new()
        .with_claim("sub", 123)
        .with_claim("exp", chrono::Utc::now().timestamp() - 10);
    let token = codec.encode(&claims).unwrap();
    assert!(codec.decode(&token).is_none());
}

#[test]
fn test_tampered_segment_rejected() {
    let codec = codec();
    let claims = ClaimSet::new().with_claim("role", "user");
    let token = codec.encode(&claims).unwrap();

    let segments: Vec<&str> = token.split('.').collect();
    let forged_claims = base64url_encode(br#"{"role":"admin"}"#);
    let forged = format!("{}.{}.{}", segments[0], forged_claims, segments[2]);
    assert!(codec.decode(&forged).is_none());
}

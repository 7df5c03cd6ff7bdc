use base64::{
    alphabet,
    engine::{
        general_purpose::{GeneralPurpose, GeneralPurposeConfig},
        DecodePaddingMode,
    },
    Engine,
};
use serde::{Deserialize, Serialize};

use super::error::TokenError;

/// Separator between the header, payload and signature segments
const SEGMENT_SEPARATOR: char = '.';

/// Standard-alphabet decoder that accepts padded and unpadded input and
/// ignores non-zero trailing bits, the same leniency a browser `atob` has.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// The `token_type` claim. Unrecognised values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Group {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub permissions: Option<Vec<i64>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Identity {
    pub username: Option<String>,
    /// `null` for the list or for an entry is tolerated
    pub groups: Option<Vec<Option<Group>>>,
}

impl Identity {
    /// The effective role. Only the first group counts, even when it is `null`.
    pub fn primary_group(&self) -> Option<&Group> {
        self.groups
            .as_ref()
            .and_then(|groups| groups.first())
            .and_then(Option::as_ref)
    }
}

/// Claims carried in the payload segment of an access or refresh token.
///
/// Every field is optional: a payload missing some claims still decodes,
/// and whatever depends on the missing claims is simply absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct TokenClaims {
    pub exp: Option<i64>,
    pub iat: Option<i64>,
    pub jti: Option<String>,
    pub token_type: Option<TokenType>,
    pub user_id: Option<i64>,
    pub identity: Option<Identity>,
}

impl TokenClaims {
    pub fn primary_group(&self) -> Option<&Group> {
        self.identity.as_ref().and_then(Identity::primary_group)
    }

    pub fn username(&self) -> Option<&str> {
        self.identity.as_ref().and_then(|i| i.username.as_deref())
    }
}

/// Decode the claims from the payload segment of `token`.
///
/// The header and signature segments are ignored; nothing is verified.
pub fn decode(token: &str) -> Result<TokenClaims, TokenError> {
    let payload = token
        .split(SEGMENT_SEPARATOR)
        .nth(1)
        .ok_or(TokenError::MissingPayload)?;

    // base64url -> base64; whitespace is dropped like atob does
    let standard: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    let bytes = PAYLOAD_ENGINE.decode(standard)?;
    let json = String::from_utf8(bytes)?;
    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde_json::json;

    fn make_token(payload: &serde_json::Value) -> String {
        format!(
            "eyJhbGciOiJIUzI1NiJ9.{}.c2lnbmF0dXJl",
            URL_SAFE_NO_PAD.encode(payload.to_string())
        )
    }

    #[test]
    fn test_decode_full_payload() {
        let token = make_token(&json!({
            "exp": 200,
            "iat": 100,
            "jti": "abc123",
            "token_type": "access",
            "user_id": 42,
            "identity": {
                "username": "alice",
                "groups": [{
                    "id": 1,
                    "name": "admin",
                    "description": "Admins",
                    "is_active": true,
                    "permissions": [1, 2, 3]
                }]
            }
        }));

        let claims = decode(&token).unwrap();
        assert_eq!(claims.exp, Some(200));
        assert_eq!(claims.iat, Some(100));
        assert_eq!(claims.jti.as_deref(), Some("abc123"));
        assert_eq!(claims.token_type, Some(TokenType::Access));
        assert_eq!(claims.user_id, Some(42));
        assert_eq!(claims.username(), Some("alice"));

        let group = claims.primary_group().unwrap();
        assert_eq!(group.id, Some(1));
        assert_eq!(group.name.as_deref(), Some("admin"));
        assert_eq!(group.description.as_deref(), Some("Admins"));
        assert_eq!(group.is_active, Some(true));
        assert_eq!(group.permissions, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_decode_url_safe_characters() {
        // payload encodes to text containing both '-' and '_' style characters
        let claims = decode("h.eyJpZGVudGl0eSI6eyJ1c2VybmFtZSI6Ilpvw6sgfn5-Pj4-IiwiZ3JvdXBzIjpbXX19.s").unwrap();
        assert_eq!(claims.username(), Some("Zoë ~~~>>>"));

        let claims = decode("h.eyJqdGkiOiI_Pz8ifQ.s").unwrap();
        assert_eq!(claims.jti.as_deref(), Some("???"));
    }

    #[test]
    fn test_decode_padded_payload() {
        let claims = decode("h.eyJqdGkiOiI_Pz8ifQ==.s").unwrap();
        assert_eq!(claims.jti.as_deref(), Some("???"));
    }

    #[test]
    fn test_decode_only_needs_two_segments() {
        let claims = decode("h.eyJqdGkiOiI_Pz8ifQ").unwrap();
        assert_eq!(claims.jti.as_deref(), Some("???"));
    }

    #[test]
    fn test_decode_missing_fields_is_not_an_error() {
        let claims = decode(&make_token(&json!({}))).unwrap();
        assert_eq!(claims, TokenClaims::default());
        assert!(claims.primary_group().is_none());
        assert!(claims.username().is_none());
    }

    #[test]
    fn test_decode_unknown_token_type() {
        let claims = decode(&make_token(&json!({ "token_type": "id" }))).unwrap();
        assert_eq!(claims.token_type, Some(TokenType::Other("id".to_string())));

        // the unknown value survives re-serialization
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["token_type"], "id");

        let claims = decode(&make_token(&json!({ "token_type": "refresh" }))).unwrap();
        assert_eq!(claims.token_type, Some(TokenType::Refresh));
    }

    #[test]
    fn test_decode_known_token_type_serializes_lowercase() {
        let claims = decode(&make_token(&json!({ "token_type": "access" }))).unwrap();
        assert_eq!(claims.token_type, Some(TokenType::Access));
        assert_eq!(serde_json::to_value(&claims).unwrap()["token_type"], "access");
    }

    #[test]
    fn test_decode_null_groups() {
        let claims = decode(&make_token(&json!({
            "identity": { "username": "dave", "groups": null }
        })))
        .unwrap();
        assert_eq!(claims.username(), Some("dave"));
        assert!(claims.primary_group().is_none());
    }

    #[test]
    fn test_decode_null_group_entry() {
        let claims = decode(&make_token(&json!({
            "identity": {
                "username": "dave",
                "groups": [null, { "id": 2, "name": "viewer" }]
            }
        })))
        .unwrap();
        assert_eq!(claims.username(), Some("dave"));
        // a null first group is not skipped over
        assert!(claims.primary_group().is_none());
    }

    #[test]
    fn test_decode_null_identity() {
        let claims = decode(&make_token(&json!({ "identity": null, "iat": 5 }))).unwrap();
        assert_eq!(claims.iat, Some(5));
        assert!(claims.username().is_none());
    }

    #[test]
    fn test_decode_missing_payload_segment() {
        assert!(matches!(decode("nodots"), Err(TokenError::MissingPayload)));
        assert!(matches!(decode(""), Err(TokenError::MissingPayload)));
    }

    #[test]
    fn test_decode_invalid_base64() {
        assert!(matches!(decode("h.!!!!.s"), Err(TokenError::InvalidBase64(_))));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let token = format!("h.{}.s", URL_SAFE_NO_PAD.encode([0xff, 0xfe, 0xfd]));
        assert!(matches!(decode(&token), Err(TokenError::InvalidUtf8(_))));
    }

    #[test]
    fn test_decode_invalid_claims() {
        let not_json = format!("h.{}.s", URL_SAFE_NO_PAD.encode("not json"));
        assert!(matches!(decode(&not_json), Err(TokenError::InvalidClaims(_))));

        // valid JSON but not an object
        let number = format!("h.{}.s", URL_SAFE_NO_PAD.encode("42"));
        assert!(matches!(decode(&number), Err(TokenError::InvalidClaims(_))));

        // empty payload segment decodes to empty text
        assert!(matches!(decode("h..s"), Err(TokenError::InvalidClaims(_))));
    }
}

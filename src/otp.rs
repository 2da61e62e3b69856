//! OTP token parsing.
//!
//! A raw token is `[password][delimiter]<prefix><ciphertext>` where the
//! password and delimiter are optional, the device prefix is 0-16 symbols
//! and the ciphertext exactly 32. Both regions are drawn from a single
//! 16-symbol alphabet: either modhex, or the characters the same key
//! positions produce on a Dvorak layout. Dvorak input is transliterated to
//! modhex so downstream code only ever sees the canonical alphabet.

use crate::error::{Result, VerifyError};

/// Canonical modhex alphabet.
const MODHEX: &[u8; 16] = b"cbdefghijklnrtuv";

/// The same key positions as typed on a Dvorak keyboard layout.
const DVORAK: &[u8; 16] = b"jxe.uidchtnbpygk";

const CIPHERTEXT_LEN: usize = 32;
const MAX_PREFIX_LEN: usize = 16;

/// Delimiter between password and OTP, unless the caller picks another.
pub const DEFAULT_DELIMITER: char = ':';

/// Components of a parsed token, normalized to lowercase modhex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOtp {
    /// Password typed before the delimiter; may be empty.
    pub password: String,
    /// Device public id, 0-16 chars.
    pub prefix: String,
    /// 32-char ciphertext.
    pub ciphertext: String,
    /// Full OTP: `prefix + ciphertext`.
    pub otp: String,
}

impl ParsedOtp {
    /// Parse a raw token using the default `:` delimiter.
    pub fn parse(token: &str) -> Result<Self> {
        Self::parse_with_delimiter(token, DEFAULT_DELIMITER)
    }

    /// Parse a raw token with a custom password delimiter.
    ///
    /// The password may itself contain the delimiter: the split point is
    /// the last occurrence whose suffix is a valid 32-48 char run in one
    /// of the supported alphabets. Matching is case-insensitive.
    pub fn parse_with_delimiter(token: &str, delimiter: char) -> Result<Self> {
        try_alphabet(token, delimiter, MODHEX)
            .or_else(|| try_alphabet(token, delimiter, DVORAK))
            .ok_or(VerifyError::BadOtp)
    }
}

fn try_alphabet(token: &str, delimiter: char, alphabet: &[u8; 16]) -> Option<ParsedOtp> {
    let mut split = None;
    for (pos, _) in token.char_indices().rev().filter(|&(_, c)| c == delimiter) {
        if let Some(region) = normalize_region(&token[pos + delimiter.len_utf8()..], alphabet) {
            split = Some((token[..pos].to_owned(), region));
            break;
        }
    }

    let (password, otp) =
        split.or_else(|| normalize_region(token, alphabet).map(|r| (String::new(), r)))?;

    let prefix_len = otp.len() - CIPHERTEXT_LEN;
    Some(ParsedOtp {
        password,
        prefix: otp[..prefix_len].to_owned(),
        ciphertext: otp[prefix_len..].to_owned(),
        otp,
    })
}

/// Validate that `region` is a 32-48 char run in `alphabet` and map each
/// symbol to its modhex counterpart by alphabet position.
fn normalize_region(region: &str, alphabet: &[u8; 16]) -> Option<String> {
    if !(CIPHERTEXT_LEN..=CIPHERTEXT_LEN + MAX_PREFIX_LEN).contains(&region.len()) {
        return None;
    }
    region
        .bytes()
        .map(|b| {
            let lower = b.to_ascii_lowercase();
            alphabet
                .iter()
                .position(|&a| a == lower)
                .map(|i| MODHEX[i] as char)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const OTP: &str = "ccccccbcgujhingjrdejhgfnuetrgigvejhhgbkugded";

    #[test]
    fn parses_bare_otp() {
        let parsed = ParsedOtp::parse(OTP).unwrap();
        assert_eq!(parsed.password, "");
        assert_eq!(parsed.prefix, "ccccccbcgujh");
        assert_eq!(parsed.ciphertext, &OTP[12..]);
        assert_eq!(parsed.otp, OTP);
    }

    #[test]
    fn parses_password_and_delimiter() {
        let token = format!("hunter2:{OTP}");
        let parsed = ParsedOtp::parse(&token).unwrap();
        assert_eq!(parsed.password, "hunter2");
        assert_eq!(parsed.otp, OTP);
    }

    #[test]
    fn password_may_contain_delimiter() {
        let token = format!("a:b:{OTP}");
        let parsed = ParsedOtp::parse(&token).unwrap();
        assert_eq!(parsed.password, "a:b");
        assert_eq!(parsed.otp, OTP);
    }

    #[test]
    fn password_may_be_empty() {
        let token = format!(":{OTP}");
        let parsed = ParsedOtp::parse(&token).unwrap();
        assert_eq!(parsed.password, "");
        assert_eq!(parsed.otp, OTP);
    }

    #[test]
    fn custom_delimiter() {
        let token = format!("pw%{OTP}");
        let parsed = ParsedOtp::parse_with_delimiter(&token, '%').unwrap();
        assert_eq!(parsed.password, "pw");
        assert_eq!(parsed.otp, OTP);
    }

    #[test]
    fn bare_ciphertext_has_empty_prefix() {
        let parsed = ParsedOtp::parse(&OTP[12..]).unwrap();
        assert_eq!(parsed.prefix, "");
        assert_eq!(parsed.ciphertext, &OTP[12..]);
    }

    #[test]
    fn uppercase_input_is_lowercased() {
        let parsed = ParsedOtp::parse(&OTP.to_uppercase()).unwrap();
        assert_eq!(parsed.otp, OTP);
    }

    #[test]
    fn dvorak_input_is_remapped_positionally() {
        // Every Dvorak symbol twice maps to every modhex symbol twice.
        let dvorak = "jxe.uidchtnbpygkjxe.uidchtnbpygk";
        let parsed = ParsedOtp::parse(dvorak).unwrap();
        assert_eq!(parsed.otp, "cbdefghijklnrtuvcbdefghijklnrtuv");
        assert_eq!(parsed.prefix, "");
    }

    #[test]
    fn dvorak_uppercase_is_remapped_too() {
        let parsed = ParsedOtp::parse("JXE.UIDCHTNBPYGKJXE.UIDCHTNBPYGK").unwrap();
        assert_eq!(parsed.otp, "cbdefghijklnrtuvcbdefghijklnrtuv");
    }

    #[test]
    fn symbols_shared_by_both_alphabets_stay_modhex() {
        // 'c' exists in both alphabets; the modhex reading wins.
        let token = "c".repeat(32);
        let parsed = ParsedOtp::parse(&token).unwrap();
        assert_eq!(parsed.otp, token);
    }

    #[test]
    fn rejects_too_short() {
        assert!(ParsedOtp::parse(&"c".repeat(31)).is_err());
    }

    #[test]
    fn rejects_too_long() {
        assert!(ParsedOtp::parse(&"c".repeat(49)).is_err());
    }

    #[test]
    fn rejects_foreign_characters() {
        let mut token = OTP.to_owned();
        token.replace_range(20..21, "a");
        assert!(ParsedOtp::parse(&token).is_err());
    }

    #[test]
    fn rejects_mixed_alphabets() {
        // 'r' is modhex-only, 'x' is Dvorak-only; no single alphabet matches.
        let token = format!("rx{}", "c".repeat(30));
        assert!(ParsedOtp::parse(&token).is_err());
    }

    #[test]
    fn rejects_empty_input() {
        assert!(ParsedOtp::parse("").is_err());
    }
}

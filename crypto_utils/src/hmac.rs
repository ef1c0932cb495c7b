use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::Zeroizing;

type HmacSha512 = Hmac<Sha512>;

/// HMAC-SHA512 over the concatenation of `parts`.
///
/// Taking the message in pieces lets callers feed key material straight into
/// the MAC instead of assembling it in a temporary buffer. The output holds
/// derived secrets and is wiped on drop.
pub fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> Zeroizing<[u8; 64]> {
    let mut mac =
        HmacSha512::new_from_slice(key).expect("HMAC accepts keys of any length");
    for part in parts {
        mac.update(part);
    }
    Zeroizing::new(mac.finalize().into_bytes().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn empty_message() {
        let expected = hex!(
            "84fa5aa0279bbc473267d05a53ea03310a987cecc4c1535ff29b6d76b8f1444a728df3aadb89d4a9a6709e1998f373566e8f824a8ca93b1821f0b69bc2a2f65e"
        );
        assert_eq!(*hmac_sha512(b"key", &[]), expected);
    }

    /// RFC 4231 test case 2
    #[test]
    fn rfc4231_case2() {
        let expected = hex!(
            "164b7a7bfcf819e2e395fbe73b56e0a387bd64222e831fd610270cd7ea2505549758bf75c05a994a6d034f65f8f0e6fdcaeab1a34d4a6b4b636e070a38bce737"
        );
        assert_eq!(
            *hmac_sha512(b"Jefe", &[b"what do ya want for nothing?"]),
            expected
        );
    }

    #[test]
    fn split_message_matches_contiguous() {
        let key = [0x0b; 20];
        let whole = hmac_sha512(&key, &[b"Hi There"]);
        let split = hmac_sha512(&key, &[b"Hi", b" ", b"There"]);
        assert_eq!(*whole, *split);
        assert_eq!(
            *whole,
            hex!(
                "87aa7cdea5ef619d4ff0b4241a1d6cb02379f4e2ce4ec2787ad0b30545e17cdedaa833b7d6b8a702038b274eaea3f4e4be9d914eeb61f1702e696c203a126854"
            )
        );
    }
}

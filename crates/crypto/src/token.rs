//! Korrelations-Tokens fuer Nachrichten
//!
//! Moderatoren sehen statt Identitaeten nur diesen Token. Er ist ein
//! UI-Handle und keine Sicherheitsgrenze.
//!
//! ## Format
//! ```text
//! XXXXXX-XXX   (Grossbuchstaben + Ziffern, Basis 36)
//! ```

use rand::Rng;

const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Erzeugt einen neuen Token im Format `XXXXXX-XXX`
pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let mut zeichen = |anzahl: usize| -> String {
        (0..anzahl)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    };
    let vorne = zeichen(6);
    let hinten = zeichen(3);
    format!("{vorne}-{hinten}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn token_format() {
        let token = generate_token();
        assert_eq!(token.len(), 10);
        assert_eq!(&token[6..7], "-");
        assert!(token
            .chars()
            .filter(|c| *c != '-')
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn tokens_unterscheiden_sich() {
        let tokens: HashSet<String> = (0..1000).map(|_| generate_token()).collect();
        assert_eq!(tokens.len(), 1000);
    }
}

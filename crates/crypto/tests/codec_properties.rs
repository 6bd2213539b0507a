//! Property-Tests fuer den Nachrichten-Codec
//!
//! 1. **Roundtrip**: decrypt(encrypt(m)) == m fuer jeden passenden Klartext
//! 2. **Format zuerst**: Eingaben ausserhalb des Base64-Alphabets sind immer
//!    `UngueltigesFormat`, egal ob ein Schluessel existiert

use std::sync::{Arc, OnceLock};

use proptest::prelude::*;
use stillpost_crypto::codec::{decrypt_with_key, encrypt};
use stillpost_crypto::{
    generate_key_pair, ist_gueltiges_base64, CryptoCodec, EntschluesselungsFehler, KeyPair,
    KeyStore, MemoryKeyStorage, RSA_BITS,
};

fn paar() -> &'static KeyPair {
    static PAAR: OnceLock<KeyPair> = OnceLock::new();
    PAAR.get_or_init(|| generate_key_pair(RSA_BITS).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn roundtrip_fuer_beliebigen_text(text in "\\PC{1,40}") {
        let paar = paar();
        let ciphertext = encrypt(&text, paar.public_key.as_str()).unwrap();
        prop_assert!(ist_gueltiges_base64(&ciphertext));
        prop_assert_eq!(decrypt_with_key(&ciphertext, &paar.private_key).unwrap(), text);
    }

    #[test]
    fn fremde_zeichen_sind_ungueltiges_format(
        vorne in "[A-Za-z0-9]{0,8}",
        fremd in "[!#$%&*\\-_.:;~]",
        hinten in "[A-Za-z0-9]{0,8}",
    ) {
        let eingabe = format!("{vorne}{fremd}{hinten}x");
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let ergebnis = rt.block_on(async {
            let store = KeyStore::oeffnen(Arc::new(MemoryKeyStorage::new())).await;
            CryptoCodec::neu(store).decrypt(&eingabe, "a@x.com").await
        });
        prop_assert_eq!(ergebnis, Err(EntschluesselungsFehler::UngueltigesFormat));
    }
}

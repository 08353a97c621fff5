use evtag_hash::hex::{from_hex, is_lower_hex, to_hex};
use evtag_hash::{HashAlgorithm, ObjectId};
use proptest::prelude::*;

proptest! {
    #[test]
    fn encoded_hex_is_lowercase_and_decodes(bytes in proptest::collection::vec(any::<u8>(), 1..96)) {
        let hex = to_hex(&bytes);
        prop_assert_eq!(hex.len(), bytes.len() * 2);
        prop_assert!(is_lower_hex(&hex));
        prop_assert_eq!(from_hex(&hex).unwrap(), bytes);
    }

    #[test]
    fn sha1_ids_parse_from_any_case(raw in proptest::array::uniform20(any::<u8>())) {
        let oid = ObjectId::from_bytes(&raw, HashAlgorithm::Sha1).unwrap();
        let upper = oid.to_hex().to_uppercase();
        prop_assert_eq!(ObjectId::from_hex(&upper).unwrap(), oid);
    }

    #[test]
    fn non_hex_characters_are_rejected(s in "[g-z]{40}") {
        prop_assert!(ObjectId::from_hex(&s).is_err());
    }
}

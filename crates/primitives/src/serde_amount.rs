//! Serde helpers for [`Amount`] values in human-edited formats.
//!
//! Formats such as TOML cannot represent integers beyond `i64::MAX`, which is well within the range
//! of realistic token amounts. Amounts are therefore written as decimal strings and read back from
//! either a string or a plain integer.

use serde::{de, Deserialize, Deserializer, Serializer};

use crate::types::Amount;

#[derive(Deserialize)]
#[serde(untagged)]
enum AmountRepr {
    Int(u64),
    Str(String),
}

/// Serializes an [`Amount`] as a decimal string.
pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&amount.to_string())
}

/// Deserializes an [`Amount`] from a decimal string or an unsigned integer.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
    match AmountRepr::deserialize(deserializer)? {
        AmountRepr::Int(value) => Ok(Amount::from(value)),
        AmountRepr::Str(s) => s.trim().parse().map_err(de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Wrapper(#[serde(with = "crate::serde_amount")] Amount);

    #[test]
    fn reads_strings_and_integers() {
        assert_eq!(
            serde_json::from_str::<Wrapper>("\"1000000000000000000000000000\"").unwrap(),
            Wrapper(10u128.pow(27))
        );
        assert_eq!(serde_json::from_str::<Wrapper>("42").unwrap(), Wrapper(42));
        assert!(serde_json::from_str::<Wrapper>("\"-1\"").is_err());
    }

    #[test]
    fn writes_strings() {
        assert_eq!(serde_json::to_string(&Wrapper(7)).unwrap(), "\"7\"");
    }
}

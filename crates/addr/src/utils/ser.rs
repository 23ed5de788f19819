//! Serialization utilities for the `pagewise-addr` crate.

/// {De}serialization for `u64` <-> `0x`-prefixed hex string.
pub mod hex_u64 {
    use serde::{self, Deserialize, Deserializer, Serializer};

    /// Serialize a `u64` to a hex string.
    pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{value:#x}"))
    }

    /// Deserialize a `u64` from a hex string.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let digits = s.strip_prefix("0x").unwrap_or(&s);
        u64::from_str_radix(digits, 16).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "super::hex_u64")]
        address: u64,
    }

    #[test]
    fn accepts_unprefixed() {
        let w: Wrapper = serde_json::from_str(r#"{"address":"7fff0000"}"#).unwrap();
        assert_eq!(w.address, 0x7fff_0000);
    }

    #[test]
    fn rejects_non_hex() {
        assert!(serde_json::from_str::<Wrapper>(r#"{"address":"0xzz"}"#).is_err());
        assert!(serde_json::from_str::<Wrapper>(r#"{"address":12}"#).is_err());
    }
}

//! Token amounts and identifiers

use num_bigint::BigUint;

use crate::error::{CoreError, Result};

/// Token or native-coin amount in base units (18 decimals)
pub type Amount = u128;

pub type ProjectId = u64;

pub type ProposalId = u64;

/// One whole token (10^18 base units)
pub const ONE_TOKEN: Amount = 1_000_000_000_000_000_000;

/// Computes `a * b / denominator` with a wide intermediate, rounding down.
///
/// A zero denominator yields zero so that empty supplies pay nothing.
pub fn mul_div(a: Amount, b: Amount, denominator: Amount) -> Result<Amount> {
    if denominator == 0 {
        return Ok(0);
    }
    let wide = BigUint::from(a) * BigUint::from(b) / BigUint::from(denominator);
    Amount::try_from(wide).map_err(|_| CoreError::Overflow)
}

/// Serde adapter writing amounts as decimal strings.
///
/// JSON and TOML numbers cannot carry the full `u128` range, so amounts
/// cross text formats as strings, e.g. `"1000000000000000000"`.
pub mod decimal {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use super::Amount;

    pub fn serialize<S: Serializer>(value: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.trim().parse().map_err(D::Error::custom)
    }

    pub mod option {
        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        use crate::amount::Amount;

        pub fn serialize<S: Serializer>(
            value: &Option<Amount>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => super::serialize(value, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Amount>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|text| text.trim().parse().map_err(D::Error::custom))
                .transpose()
        }
    }

    pub mod list {
        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        use crate::amount::Amount;

        pub fn serialize<S: Serializer>(
            values: &[Amount],
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            serializer.collect_seq(values.iter().map(|value| value.to_string()))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Vec<Amount>, D::Error> {
            Vec::<String>::deserialize(deserializer)?
                .iter()
                .map(|text| text.trim().parse().map_err(D::Error::custom))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_exceeds_u128_intermediate() {
        let big = 1_000_000 * ONE_TOKEN;
        assert_eq!(mul_div(big, big, big).unwrap(), big);
        assert_eq!(mul_div(100 * ONE_TOKEN, 50, 100).unwrap(), 50 * ONE_TOKEN);
    }

    #[test]
    fn test_mul_div_rounds_down() {
        assert_eq!(mul_div(10, 1, 3).unwrap(), 3);
        assert_eq!(mul_div(10, 1, 0).unwrap(), 0);
    }

    #[test]
    fn test_mul_div_overflow() {
        assert_eq!(mul_div(Amount::MAX, 2, 1), Err(CoreError::Overflow));
    }

    #[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq)]
    struct Payment {
        #[serde(with = "decimal")]
        amount: Amount,
        #[serde(default, with = "decimal::option")]
        tip: Option<Amount>,
        #[serde(with = "decimal::list")]
        legs: Vec<Amount>,
    }

    #[test]
    fn test_decimal_strings() {
        let payment: Payment =
            serde_json::from_str(r#"{"amount": "340282366920938463463374607431768211455", "legs": ["1", "2"]}"#)
                .unwrap();
        assert_eq!(payment.amount, Amount::MAX);
        assert_eq!(payment.tip, None);
        assert_eq!(payment.legs, vec![1, 2]);

        let json = serde_json::to_string(&Payment {
            amount: ONE_TOKEN,
            tip: Some(5),
            legs: vec![],
        })
        .unwrap();
        assert_eq!(json, r#"{"amount":"1000000000000000000","tip":"5","legs":[]}"#);
        assert!(serde_json::from_str::<Payment>(r#"{"amount": "-1", "legs": []}"#).is_err());
    }
}

use serde::{Deserialize, Deserializer, Serialize};

/// One ERC-20 transfer as reported by Etherscan's `tokentx` action.
///
/// Etherscan returns every field as a string; numeric-looking fields are kept
/// verbatim here and only parsed (with validated failure modes) by the ledger
/// transform. `timeStamp` and `tokenDecimal` additionally tolerate JSON
/// numbers, which some gateway deployments emit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenTransfer {
    pub hash: String,
    pub from: String,
    pub to: String,
    /// Raw token amount as a decimal-string integer, unscaled.
    pub value: String,
    #[serde(rename = "tokenDecimal", deserialize_with = "string_or_number")]
    pub token_decimal: String,
    #[serde(rename = "timeStamp", deserialize_with = "string_or_number")]
    pub time_stamp: String,
}

/// The full response envelope from Etherscan. Cached wholesale by the fetch
/// endpoint; `status` is "1" on success and "0" on provider-side failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenTxResponse {
    pub status: String,
    pub message: String,
    pub result: Vec<TokenTransfer>,
}

/// Accept either a JSON string or a JSON integer, normalizing to String.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(u64),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_etherscan_envelope() {
        let payload = r#"{
            "status": "1",
            "message": "OK",
            "result": [{
                "blockNumber": "18765432",
                "timeStamp": "1700000000",
                "hash": "0x1",
                "from": "0x8a9d0C64F708A2feEa843eCF7d92f63522775e94",
                "to": "0xabc",
                "value": "1500000000000000000",
                "tokenDecimal": "18",
                "gasUsed": "51234"
            }]
        }"#;

        let envelope: TokenTxResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(envelope.status, "1");
        assert_eq!(envelope.result.len(), 1);
        let record = &envelope.result[0];
        assert_eq!(record.value, "1500000000000000000");
        assert_eq!(record.token_decimal, "18");
        assert_eq!(record.time_stamp, "1700000000");
    }

    #[test]
    fn tolerates_numeric_timestamp_and_decimals() {
        let payload = r#"{
            "hash": "0x2",
            "from": "0xaa",
            "to": "0xbb",
            "value": "42",
            "tokenDecimal": 18,
            "timeStamp": 1700000000
        }"#;

        let record: TokenTransfer = serde_json::from_str(payload).unwrap();
        assert_eq!(record.token_decimal, "18");
        assert_eq!(record.time_stamp, "1700000000");
    }
}

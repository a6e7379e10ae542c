use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Render format for ledger timestamps, both in API responses and in the
/// exported sheet. Second precision, UTC, no timezone suffix.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Transfer direction relative to the staking contract: the contract sending
/// tokens out is an unstake, everything else is a stake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransferKind {
    Stake,
    UnStake,
}

impl TransferKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferKind::Stake => "Stake",
            TransferKind::UnStake => "UnStake",
        }
    }
}

/// One normalized stake/unstake event, derived 1:1 from a raw transfer record.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    #[serde(serialize_with = "serialize_time")]
    pub time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: TransferKind,
    /// The counterparty wallet, whichever side of the transfer is not the
    /// staking contract.
    pub wallet: String,
    /// Scaled token amount, non-negative, one decimal place.
    pub amount: f64,
    /// Signed amount: negative for UnStake, positive for Stake.
    pub balance: f64,
    pub hash: String,
}

impl LedgerEntry {
    pub fn time_string(&self) -> String {
        self.time.format(TIME_FORMAT).to_string()
    }
}

fn serialize_time<S>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&time.format(TIME_FORMAT).to_string())
}

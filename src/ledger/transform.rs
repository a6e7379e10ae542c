use bigdecimal::num_bigint::BigInt;
use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::AppError;
use crate::etherscan::models::TokenTransfer;
use crate::ledger::models::{LedgerEntry, TransferKind};

/// Transform raw transfer records into the normalized stake/unstake ledger.
///
/// Input order (most recent first, as fetched) is preserved; no resorting.
/// Any per-field parse failure aborts the whole transform, so a partial
/// ledger is never produced.
///
/// Classification is a closed two-way split on the sender: a record where
/// neither side is the staking contract would land in Stake, and one where
/// both sides are would keep the contract itself as the wallet. Neither case
/// is reachable through the address-filtered fetch.
pub fn build_ledger(
    transfers: &[TokenTransfer],
    staking_address: &str,
) -> Result<Vec<LedgerEntry>, AppError> {
    let mut ledger = Vec::with_capacity(transfers.len());

    for transfer in transfers {
        let amount = parse_scaled_amount(&transfer.value, &transfer.token_decimal)?;
        let time = parse_timestamp(&transfer.time_stamp)?;

        let from_is_staking = transfer.from.eq_ignore_ascii_case(staking_address);
        let kind = if from_is_staking {
            TransferKind::UnStake
        } else {
            TransferKind::Stake
        };
        let wallet = if from_is_staking {
            transfer.to.clone()
        } else {
            transfer.from.clone()
        };
        let balance = match kind {
            TransferKind::UnStake => -amount,
            TransferKind::Stake => amount,
        };

        ledger.push(LedgerEntry {
            time,
            kind,
            wallet,
            amount,
            balance,
            hash: transfer.hash.clone(),
        });
    }

    debug!(entries = ledger.len(), "built ledger");
    Ok(ledger)
}

/// Scale a raw decimal-string amount by 10^decimals and round to one decimal
/// place, half-even.
///
/// The raw value is carried through arbitrary-precision decimals end to end;
/// it only becomes a binary float after rounding, so large integer amounts
/// never drift.
fn parse_scaled_amount(value: &str, decimals: &str) -> Result<f64, AppError> {
    let digits: BigInt = value
        .trim()
        .parse()
        .map_err(|_| AppError::Parse(format!("invalid token value: {:?}", value)))?;

    let scale: i64 = decimals
        .trim()
        .parse()
        .map_err(|_| AppError::Parse(format!("invalid tokenDecimal: {:?}", decimals)))?;

    let amount = BigDecimal::new(digits, scale).with_scale_round(1, RoundingMode::HalfEven);

    amount
        .to_f64()
        .ok_or_else(|| AppError::Parse(format!("amount out of range: {}", amount)))
}

/// Interpret a raw timestamp as Unix epoch seconds in UTC.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, AppError> {
    let seconds: i64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::Parse(format!("invalid timeStamp: {:?}", raw)))?;

    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| AppError::Parse(format!("timeStamp out of range: {}", seconds)))
}

//! # lottery_abi
//!
//! Pinned Syndicate lottery contract interface for the settlement daemon.
//! Function signatures and the record layout are hardcoded; no user-supplied
//! selectors or arbitrary call forwarding.

pub mod calls;
pub mod constants;

pub use constants::*;

use std::fmt;
use std::str::FromStr;

/// A 20-byte EVM account address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl FromStr for Address {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(stripped).map_err(|e| format!("invalid address hex: {e}"))?;
        let bytes: [u8; 20] = raw
            .as_slice()
            .try_into()
            .map_err(|_| format!("address wrong length: {} != 20", raw.len()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// One lottery instance as returned by `lotteries(uint256)`.
///
/// The return tuple is all-static, seven 32-byte words in this order:
/// creator, ticketPrice, prizePool, startTime, duration, ended, winner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotteryRecord {
    pub creator: Address,
    /// Entry fee in wei.
    pub ticket_price: u128,
    /// Accumulated pot in wei.
    pub prize_pool: u128,
    /// Unix timestamp (seconds) the instance became active.
    pub start_time: u64,
    /// Seconds the instance remains open for entries.
    pub duration: u64,
    /// Set by the contract once a closing transaction has been processed.
    pub ended: bool,
    /// Zero address until the contract has drawn a winner.
    pub winner: Address,
}

impl LotteryRecord {
    /// Decode from raw `eth_call` return data.
    pub fn from_return_data(data: &[u8]) -> Result<Self, String> {
        if data.len() < RECORD_RETURN_LEN {
            return Err(format!(
                "return data too short: {} < {}",
                data.len(),
                RECORD_RETURN_LEN
            ));
        }
        let word = |i: usize| &data[i * WORD..(i + 1) * WORD];
        Ok(Self {
            creator: decode_address_word(word(0))?,
            ticket_price: decode_u128_word(word(1))?,
            prize_pool: decode_u128_word(word(2))?,
            start_time: decode_u64_word(word(3))?,
            duration: decode_u64_word(word(4))?,
            ended: decode_bool_word(word(5))?,
            winner: decode_address_word(word(6))?,
        })
    }

    /// Timestamp at which the entry window closes.
    pub fn deadline(&self) -> u64 {
        self.start_time.saturating_add(self.duration)
    }

    /// Returns true once the entry window has elapsed.
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.deadline()
    }

    /// Expired but not yet closed on the ledger.
    pub fn is_actionable(&self, now: u64) -> bool {
        !self.ended && self.is_expired(now)
    }
}

fn check_word(word: &[u8]) -> Result<(), String> {
    if word.len() != WORD {
        return Err(format!("abi word wrong length: {} != {}", word.len(), WORD));
    }
    Ok(())
}

/// Decode a 32-byte ABI word into a `u64`, rejecting values that overflow.
pub fn decode_u64_word(word: &[u8]) -> Result<u64, String> {
    check_word(word)?;
    if !word[..WORD - 8].iter().all(|b| *b == 0) {
        return Err("uint word overflows u64".to_string());
    }
    Ok(u64::from_be_bytes(word[WORD - 8..].try_into().expect("slice length is 8")))
}

/// Decode a 32-byte ABI word into a `u128`, rejecting values that overflow.
pub fn decode_u128_word(word: &[u8]) -> Result<u128, String> {
    check_word(word)?;
    if !word[..WORD - 16].iter().all(|b| *b == 0) {
        return Err("uint word overflows u128".to_string());
    }
    Ok(u128::from_be_bytes(
        word[WORD - 16..].try_into().expect("slice length is 16"),
    ))
}

/// Decode a 32-byte ABI bool word (0 or 1 in the last byte).
pub fn decode_bool_word(word: &[u8]) -> Result<bool, String> {
    check_word(word)?;
    if !word[..WORD - 1].iter().all(|b| *b == 0) || word[WORD - 1] > 1 {
        return Err("malformed bool word".to_string());
    }
    Ok(word[WORD - 1] == 1)
}

/// Decode a 32-byte ABI word into an [`Address`] (last 20 bytes).
pub fn decode_address_word(word: &[u8]) -> Result<Address, String> {
    check_word(word)?;
    if !word[..WORD - 20].iter().all(|b| *b == 0) {
        return Err("malformed address word".to_string());
    }
    let mut out = [0u8; 20];
    out.copy_from_slice(&word[WORD - 20..]);
    Ok(Address(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_u64_word(buf: &mut Vec<u8>, v: u64) {
        buf.extend_from_slice(&[0u8; 24]);
        buf.extend_from_slice(&v.to_be_bytes());
    }

    fn sample_return_data(start_time: u64, duration: u64, ended: bool) -> Vec<u8> {
        let mut buf = Vec::with_capacity(RECORD_RETURN_LEN);
        // creator
        buf.extend_from_slice(&[0u8; 12]);
        buf.extend_from_slice(&[0xaa; 20]);
        push_u64_word(&mut buf, 10_000_000_000_000_000); // ticketPrice: 0.01 ETH
        push_u64_word(&mut buf, 50_000_000_000_000_000); // prizePool
        push_u64_word(&mut buf, start_time);
        push_u64_word(&mut buf, duration);
        // ended
        buf.extend_from_slice(&[0u8; 31]);
        buf.push(ended as u8);
        // winner (zero until drawn)
        buf.extend_from_slice(&[0u8; 32]);
        buf
    }

    #[test]
    fn test_record_decode() {
        let record = LotteryRecord::from_return_data(&sample_return_data(1000, 3600, false)).unwrap();
        assert_eq!(record.creator, Address([0xaa; 20]));
        assert_eq!(record.ticket_price, 10_000_000_000_000_000);
        assert_eq!(record.prize_pool, 50_000_000_000_000_000);
        assert_eq!(record.start_time, 1000);
        assert_eq!(record.duration, 3600);
        assert!(!record.ended);
        assert!(record.winner.is_zero());
    }

    #[test]
    fn test_record_decode_short_buffer() {
        let mut data = sample_return_data(1000, 3600, false);
        data.truncate(RECORD_RETURN_LEN - 1);
        assert!(LotteryRecord::from_return_data(&data).is_err());
    }

    #[test]
    fn test_record_decode_rejects_oversized_uint() {
        let mut data = sample_return_data(1000, 3600, false);
        // Dirty a high byte of the startTime word (word index 3).
        data[3 * WORD] = 1;
        assert!(LotteryRecord::from_return_data(&data).is_err());
    }

    #[test]
    fn test_record_decode_rejects_malformed_bool() {
        let mut data = sample_return_data(1000, 3600, false);
        data[5 * WORD + 31] = 2;
        assert!(LotteryRecord::from_return_data(&data).is_err());
    }

    #[test]
    fn test_expiry_boundaries() {
        let record = LotteryRecord::from_return_data(&sample_return_data(1000, 3600, false)).unwrap();
        assert_eq!(record.deadline(), 4600);
        assert!(!record.is_expired(4000));
        assert!(record.is_expired(4600));
        assert!(record.is_expired(5000));
        assert!(record.is_actionable(5000));
        assert!(!record.is_actionable(4000));
    }

    #[test]
    fn test_ended_record_never_actionable() {
        let record = LotteryRecord::from_return_data(&sample_return_data(1000, 3600, true)).unwrap();
        assert!(record.is_expired(5000));
        assert!(!record.is_actionable(5000));
        assert!(!record.is_actionable(u64::MAX));
    }

    #[test]
    fn test_deadline_saturates() {
        let record = LotteryRecord::from_return_data(&sample_return_data(u64::MAX, 10, false)).unwrap();
        assert_eq!(record.deadline(), u64::MAX);
    }

    #[test]
    fn test_address_roundtrip() {
        let s = "0x5b16f42282b4f16c3fafcc0986b56c6e5d0f4745";
        let addr: Address = s.parse().unwrap();
        assert_eq!(addr.to_string(), s);

        assert!("0x1234".parse::<Address>().is_err());
        assert!("zz".parse::<Address>().is_err());
    }
}

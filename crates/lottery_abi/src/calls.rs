//! Call-data builders for the pinned contract functions.
//!
//! A call is the 4-byte Keccak-256 selector of the function signature
//! followed by each argument left-padded to a 32-byte word.

use sha3::{Digest, Keccak256};

use crate::constants::{END_LOTTERY_SIG, LOTTERIES_SIG, LOTTERY_COUNT_SIG, WORD};

/// Keccak-256 digest, as used for selectors and transaction hashing.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut h = Keccak256::new();
    h.update(data);
    h.finalize().into()
}

fn selector(signature: &str) -> [u8; 4] {
    let digest = keccak256(signature.as_bytes());
    digest[..4].try_into().expect("slice length is 4")
}

fn encode_u256_arg(value: u64) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Call data for `lotteryCount()`.
pub fn lottery_count_call() -> Vec<u8> {
    selector(LOTTERY_COUNT_SIG).to_vec()
}

/// Call data for `lotteries(id)`.
pub fn lotteries_call(id: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + WORD);
    data.extend_from_slice(&selector(LOTTERIES_SIG));
    data.extend_from_slice(&encode_u256_arg(id));
    data
}

/// Call data for `endLottery(id)`.
pub fn end_lottery_call(id: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + WORD);
    data.extend_from_slice(&selector(END_LOTTERY_SIG));
    data.extend_from_slice(&encode_u256_arg(id));
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_empty_vector() {
        // Known Keccak-256 digest of the empty input.
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_call_shapes() {
        assert_eq!(lottery_count_call().len(), 4);
        assert_eq!(lotteries_call(1).len(), 4 + WORD);
        assert_eq!(end_lottery_call(1).len(), 4 + WORD);
    }

    #[test]
    fn test_argument_encoding() {
        let data = end_lottery_call(7);
        // Argument is a single big-endian word after the selector.
        assert_eq!(&data[4..4 + WORD - 8], &[0u8; 24]);
        assert_eq!(&data[4 + WORD - 8..], &7u64.to_be_bytes());
    }

    #[test]
    fn test_calls_differ_only_in_argument() {
        let a = end_lottery_call(1);
        let b = end_lottery_call(2);
        assert_eq!(a[..4], b[..4]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_selectors_are_distinct() {
        assert_ne!(lottery_count_call()[..4], lotteries_call(0)[..4]);
        assert_ne!(lotteries_call(0)[..4], end_lottery_call(0)[..4]);
    }
}

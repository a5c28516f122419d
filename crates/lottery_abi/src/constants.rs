//! Hardcoded constants for the Syndicate lottery contract surface.
//!
//! These MUST NOT be configurable at runtime.

/// Solidity ABI word size in bytes.
pub const WORD: usize = 32;

/// `lotteries(uint256)` returns seven static words.
pub const RECORD_RETURN_LEN: usize = 7 * WORD;

/// Read: total number of lottery instances ever created.
pub const LOTTERY_COUNT_SIG: &str = "lotteryCount()";

/// Read: one instance record by id.
pub const LOTTERIES_SIG: &str = "lotteries(uint256)";

/// Write: close an expired instance. The contract rejects the call if the
/// instance is already ended or its window has not elapsed, which is the
/// concurrency backstop when several settlers race.
pub const END_LOTTERY_SIG: &str = "endLottery(uint256)";

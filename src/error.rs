use solana_program::{program_error::ProgramError, decode_error::DecodeError, msg, program_error::PrintProgramError};
use thiserror::Error;

/// Errors that may be returned by the Lottery program
#[derive(Error, Debug, Copy, Clone, PartialEq)]
pub enum LotteryError {
    /// Lottery is not open for entries
    #[error("Lottery is not open")]
    NotOpen,

    /// Entrance payment below the entrance fee
    #[error("Payment is below the entrance fee")]
    NotEnoughFunds,

    /// Upkeep performed while no draw is due
    #[error("Upkeep is not needed")]
    UpkeepNotNeeded,

    /// Fulfillment carried a request id that was never issued or is stale
    #[error("No such randomness request")]
    NonexistentRequest,

    /// Prize payout could not be applied
    #[error("Prize transfer failed")]
    TransferFailed,

    /// Player registry is at capacity for this round
    #[error("Lottery round is full")]
    LotteryFull,

    /// Fulfillment was not signed by the registered oracle
    #[error("Caller is not the registered randomness oracle")]
    InvalidOracle,

    /// Payout account does not match the selected player
    #[error("Winner account does not match the selected player")]
    WinnerMismatch,
}

impl From<LotteryError> for ProgramError {
    fn from(e: LotteryError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for LotteryError {
    fn type_of() -> &'static str {
        "Lottery Error"
    }
}

impl PrintProgramError for LotteryError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}

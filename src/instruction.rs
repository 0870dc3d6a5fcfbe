use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};
use arrayref::array_ref;

#[derive(Clone, Debug, PartialEq)]
pub enum LotteryInstruction {
    /// Initialize the lottery with its immutable configuration
    ///
    /// Accounts expected:
    /// 0. `[signer]` The authority creating the lottery
    /// 1. `[writable]` The lottery account, program-owned and uninitialized
    /// 2. `[]` The randomness oracle identity trusted for fulfillment
    Initialize {
        /// Minimum payment to enter, in lamports
        entrance_fee: u64,
        /// Oracle gas-lane key hash
        key_hash: [u8; 32],
        /// Oracle subscription funding the randomness requests
        subscription_id: u64,
        /// Gas limit for the oracle's fulfillment callback
        callback_gas_limit: u32,
        /// Seconds between draws
        interval: u64,
    },

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player entering (pays `amount`)
    /// 1. `[writable]` The lottery account
    /// 2. `[]` The system program
    Enter {
        /// Payment in lamports; must be at least the entrance fee
        amount: u64,
    },

    /// Evaluate whether a draw is due and log the result. Read-only.
    ///
    /// Accounts expected:
    /// 0. `[]` The lottery account
    CheckUpkeep,

    /// Freeze the round and issue a randomness request
    ///
    /// Accounts expected:
    /// 0. `[signer]` Any caller (automation agent or user)
    /// 1. `[writable]` The lottery account
    PerformUpkeep,

    /// Deliver random words for an outstanding request and settle the round
    ///
    /// Accounts expected:
    /// 0. `[signer]` The registered randomness oracle
    /// 1. `[writable]` The lottery account
    /// 2. `[writable]` The winner's account (verified against the registry)
    FulfillRandomWords {
        /// Identifier issued by the matching upkeep call
        request_id: u64,
        /// Random words delivered by the oracle; the first selects the winner
        random_words: Vec<u64>,
    },
}

impl LotteryInstruction {
    /// Unpacks a byte buffer into a LotteryInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input.split_first().ok_or(ProgramError::InvalidInstructionData)?;

        Ok(match tag {
            0 => {
                let (entrance_fee, rest) = Self::unpack_u64(rest)?;
                let (key_hash, rest) = Self::unpack_bytes32(rest)?;
                let (subscription_id, rest) = Self::unpack_u64(rest)?;
                let (callback_gas_limit, rest) = Self::unpack_u32(rest)?;
                let (interval, _) = Self::unpack_u64(rest)?;
                Self::Initialize {
                    entrance_fee,
                    key_hash,
                    subscription_id,
                    callback_gas_limit,
                    interval,
                }
            }
            1 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::Enter { amount }
            }
            2 => Self::CheckUpkeep,
            3 => Self::PerformUpkeep,
            4 => {
                let (request_id, rest) = Self::unpack_u64(rest)?;
                let (word_count, mut rest) = Self::unpack_u32(rest)?;
                let mut random_words = Vec::new();
                for _ in 0..word_count {
                    let (word, remainder) = Self::unpack_u64(rest)?;
                    random_words.push(word);
                    rest = remainder;
                }
                Self::FulfillRandomWords {
                    request_id,
                    random_words,
                }
            }
            _ => return Err(ProgramError::InvalidInstructionData),
        })
    }

    /// Packs a LotteryInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Self::Initialize {
                entrance_fee,
                key_hash,
                subscription_id,
                callback_gas_limit,
                interval,
            } => {
                buf.push(0);
                buf.extend_from_slice(&entrance_fee.to_le_bytes());
                buf.extend_from_slice(key_hash);
                buf.extend_from_slice(&subscription_id.to_le_bytes());
                buf.extend_from_slice(&callback_gas_limit.to_le_bytes());
                buf.extend_from_slice(&interval.to_le_bytes());
            }
            Self::Enter { amount } => {
                buf.push(1);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::CheckUpkeep => buf.push(2),
            Self::PerformUpkeep => buf.push(3),
            Self::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                buf.push(4);
                buf.extend_from_slice(&request_id.to_le_bytes());
                buf.extend_from_slice(&(random_words.len() as u32).to_le_bytes());
                for word in random_words {
                    buf.extend_from_slice(&word.to_le_bytes());
                }
            }
        }
        buf
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        if input.len() < 8 {
            return Err(ProgramError::InvalidInstructionData);
        }
        let (bytes, rest) = input.split_at(8);
        Ok((u64::from_le_bytes(*array_ref![bytes, 0, 8]), rest))
    }

    fn unpack_u32(input: &[u8]) -> Result<(u32, &[u8]), ProgramError> {
        if input.len() < 4 {
            return Err(ProgramError::InvalidInstructionData);
        }
        let (bytes, rest) = input.split_at(4);
        Ok((u32::from_le_bytes(*array_ref![bytes, 0, 4]), rest))
    }

    fn unpack_bytes32(input: &[u8]) -> Result<([u8; 32], &[u8]), ProgramError> {
        if input.len() < 32 {
            return Err(ProgramError::InvalidInstructionData);
        }
        let (bytes, rest) = input.split_at(32);
        Ok((*array_ref![bytes, 0, 32], rest))
    }
}

/// Create an initialize instruction
pub fn initialize(
    program_id: &Pubkey,
    authority: &Pubkey,
    lottery_account: &Pubkey,
    oracle: &Pubkey,
    entrance_fee: u64,
    key_hash: [u8; 32],
    subscription_id: u64,
    callback_gas_limit: u32,
    interval: u64,
) -> Instruction {
    let data = LotteryInstruction::Initialize {
        entrance_fee,
        key_hash,
        subscription_id,
        callback_gas_limit,
        interval,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new_readonly(*authority, true),
        AccountMeta::new(*lottery_account, false),
        AccountMeta::new_readonly(*oracle, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create an enter instruction
pub fn enter(
    program_id: &Pubkey,
    player: &Pubkey,
    lottery_account: &Pubkey,
    amount: u64,
) -> Instruction {
    let data = LotteryInstruction::Enter { amount }.pack();

    let accounts = vec![
        AccountMeta::new(*player, true),
        AccountMeta::new(*lottery_account, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create a check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey, lottery_account: &Pubkey) -> Instruction {
    let data = LotteryInstruction::CheckUpkeep.pack();

    let accounts = vec![AccountMeta::new_readonly(*lottery_account, false)];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create a perform_upkeep instruction
pub fn perform_upkeep(
    program_id: &Pubkey,
    caller: &Pubkey,
    lottery_account: &Pubkey,
) -> Instruction {
    let data = LotteryInstruction::PerformUpkeep.pack();

    let accounts = vec![
        AccountMeta::new_readonly(*caller, true),
        AccountMeta::new(*lottery_account, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create a fulfill_random_words instruction
pub fn fulfill_random_words(
    program_id: &Pubkey,
    oracle: &Pubkey,
    lottery_account: &Pubkey,
    winner: &Pubkey,
    request_id: u64,
    random_words: Vec<u64>,
) -> Instruction {
    let data = LotteryInstruction::FulfillRandomWords {
        request_id,
        random_words,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new_readonly(*oracle, true),
        AccountMeta::new(*lottery_account, false),
        AccountMeta::new(*winner, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fulfill_round_trips_with_words() {
        let original = LotteryInstruction::FulfillRandomWords {
            request_id: 9,
            random_words: vec![42, u64::MAX],
        };
        let unpacked = LotteryInstruction::unpack(&original.pack()).unwrap();
        assert_eq!(unpacked, original);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert_eq!(
            LotteryInstruction::unpack(&[99]),
            Err(ProgramError::InvalidInstructionData)
        );
        assert_eq!(
            LotteryInstruction::unpack(&[]),
            Err(ProgramError::InvalidInstructionData)
        );
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let mut data = LotteryInstruction::Enter { amount: 5 }.pack();
        data.truncate(4);
        assert_eq!(
            LotteryInstruction::unpack(&data),
            Err(ProgramError::InvalidInstructionData)
        );
    }
}

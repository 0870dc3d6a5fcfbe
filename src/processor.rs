use crate::error::LotteryError;
use crate::instruction::LotteryInstruction;
use crate::state::{winner_index, Lottery, LotteryStatus, MAX_PLAYERS, NUM_WORDS, REQUEST_CONFIRMATIONS};

use solana_program::{
    account_info::{next_account_info, AccountInfo},
    clock::Clock,
    entrypoint::ProgramResult,
    msg,
    program::invoke,
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    system_instruction,
    sysvar::Sysvar,
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = LotteryInstruction::unpack(instruction_data)?;

        match instruction {
            LotteryInstruction::Initialize {
                entrance_fee,
                key_hash,
                subscription_id,
                callback_gas_limit,
                interval,
            } => {
                msg!("Instruction: Initialize");
                Self::process_initialize(
                    accounts,
                    entrance_fee,
                    key_hash,
                    subscription_id,
                    callback_gas_limit,
                    interval,
                    program_id,
                )
            }
            LotteryInstruction::Enter { amount } => {
                msg!("Instruction: Enter");
                Self::process_enter(accounts, amount, program_id)
            }
            LotteryInstruction::CheckUpkeep => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(accounts, program_id)
            }
            LotteryInstruction::PerformUpkeep => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(accounts, program_id)
            }
            LotteryInstruction::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(accounts, request_id, &random_words, program_id)
            }
        }
    }

    /// Record the immutable configuration and open the first round.
    fn process_initialize(
        accounts: &[AccountInfo],
        entrance_fee: u64,
        key_hash: [u8; 32],
        subscription_id: u64,
        callback_gas_limit: u32,
        interval: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let oracle_info = next_account_info(account_info_iter)?;

        if !authority_info.is_signer {
            msg!("Authority must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if lottery_info.owner != program_id {
            msg!("Lottery account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let lottery = Lottery::unpack_unchecked(&lottery_info.data.borrow())?;
        if lottery.is_initialized {
            msg!("Lottery account is already initialized");
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        let clock = Clock::get()?;

        let lottery = Lottery {
            is_initialized: true,
            authority: *authority_info.key,
            oracle: *oracle_info.key,
            entrance_fee,
            key_hash,
            subscription_id,
            callback_gas_limit,
            interval,
            last_timestamp: clock.unix_timestamp,
            status: LotteryStatus::Open,
            request_counter: 0,
            pending_request: 0,
            recent_winner: Pubkey::default(),
            prize_pool: 0,
            player_count: 0,
            players: [Pubkey::default(); MAX_PLAYERS],
        };
        Lottery::pack(lottery, &mut lottery_info.data.borrow_mut())?;

        msg!(
            "Lottery initialized: fee={} lamports, interval={}s, oracle={}, subscription={}",
            entrance_fee,
            interval,
            oracle_info.key,
            subscription_id
        );
        Ok(())
    }

    /// Enter the current round by paying at least the entrance fee.
    fn process_enter(accounts: &[AccountInfo], amount: u64, program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if lottery_info.owner != program_id {
            msg!("Lottery account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut lottery = Lottery::unpack(&lottery_info.data.borrow())?;

        if amount < lottery.entrance_fee {
            msg!(
                "Payment of {} lamports is below the entrance fee of {}",
                amount,
                lottery.entrance_fee
            );
            return Err(LotteryError::NotEnoughFunds.into());
        }

        if lottery.status != LotteryStatus::Open {
            msg!("Lottery is not open for entries");
            return Err(LotteryError::NotOpen.into());
        }

        if lottery.player_count as usize >= MAX_PLAYERS {
            msg!("Round already holds {} players", MAX_PLAYERS);
            return Err(LotteryError::LotteryFull.into());
        }

        // Collect the payment into the pot held by the lottery account.
        invoke(
            &system_instruction::transfer(player_info.key, lottery_info.key, amount),
            &[
                player_info.clone(),
                lottery_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        lottery.players[lottery.player_count as usize] = *player_info.key;
        lottery.player_count = lottery
            .player_count
            .checked_add(1)
            .ok_or(ProgramError::InvalidArgument)?;
        lottery.prize_pool = lottery
            .prize_pool
            .checked_add(amount)
            .ok_or(ProgramError::InvalidArgument)?;
        Lottery::pack(lottery, &mut lottery_info.data.borrow_mut())?;

        msg!("Player entered the lottery: {}", player_info.key);
        Ok(())
    }

    /// Evaluate the upkeep predicate against the current clock. Read-only.
    fn process_check_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let lottery_info = next_account_info(account_info_iter)?;

        if lottery_info.owner != program_id {
            msg!("Lottery account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let lottery = Lottery::unpack(&lottery_info.data.borrow())?;
        let clock = Clock::get()?;

        msg!("Upkeep needed: {}", lottery.check_upkeep(clock.unix_timestamp));
        Ok(())
    }

    /// Freeze the round and announce a randomness request to the oracle.
    fn process_perform_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;

        if !caller_info.is_signer {
            msg!("Caller must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if lottery_info.owner != program_id {
            msg!("Lottery account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut lottery = Lottery::unpack(&lottery_info.data.borrow())?;
        let clock = Clock::get()?;

        if !lottery.check_upkeep(clock.unix_timestamp) {
            msg!(
                "Upkeep not needed: balance={}, players={}, status={}",
                lottery.prize_pool,
                lottery.player_count,
                u8::from(lottery.status)
            );
            return Err(LotteryError::UpkeepNotNeeded.into());
        }

        lottery.status = LotteryStatus::Calculating;
        lottery.request_counter = lottery
            .request_counter
            .checked_add(1)
            .ok_or(ProgramError::InvalidArgument)?;
        lottery.pending_request = lottery.request_counter;
        Lottery::pack(lottery.clone(), &mut lottery_info.data.borrow_mut())?;

        msg!("Requested lottery winner: request_id={}", lottery.pending_request);
        msg!(
            "Randomness request parameters: key_hash={:?}, subscription={}, confirmations={}, gas_limit={}, words={}",
            lottery.key_hash,
            lottery.subscription_id,
            REQUEST_CONFIRMATIONS,
            lottery.callback_gas_limit,
            NUM_WORDS
        );
        Ok(())
    }

    /// Settle the round with the words delivered by the oracle: pick the
    /// winner by modulo, pay out the pot, and reopen.
    fn process_fulfill_random_words(
        accounts: &[AccountInfo],
        request_id: u64,
        random_words: &[u64],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let oracle_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        if !oracle_info.is_signer {
            msg!("Oracle must sign the fulfillment");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if lottery_info.owner != program_id {
            msg!("Lottery account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut lottery = Lottery::unpack(&lottery_info.data.borrow())?;

        if *oracle_info.key != lottery.oracle {
            msg!("Fulfillment signed by {} instead of the registered oracle", oracle_info.key);
            return Err(LotteryError::InvalidOracle.into());
        }

        if lottery.status != LotteryStatus::Calculating
            || lottery.pending_request == 0
            || request_id != lottery.pending_request
        {
            msg!(
                "Request {} does not match the outstanding request {}",
                request_id,
                lottery.pending_request
            );
            return Err(LotteryError::NonexistentRequest.into());
        }

        if random_words.is_empty() {
            msg!("Fulfillment carried no random words");
            return Err(ProgramError::InvalidInstructionData);
        }

        let index = winner_index(random_words[0], lottery.player_count as u64);
        let winner = lottery.players[index as usize];

        // A Solana instruction can only credit accounts present in the
        // transaction, so the caller supplies the payout account and the
        // program verifies it against the registry.
        if *winner_info.key != winner {
            msg!("Expected winner account {}", winner);
            return Err(LotteryError::WinnerMismatch.into());
        }

        let prize = lottery.prize_pool;
        let remaining = lottery_info
            .lamports()
            .checked_sub(prize)
            .ok_or(LotteryError::TransferFailed)?;
        let credited = winner_info
            .lamports()
            .checked_add(prize)
            .ok_or(LotteryError::TransferFailed)?;
        **lottery_info.lamports.borrow_mut() = remaining;
        **winner_info.lamports.borrow_mut() = credited;

        let clock = Clock::get()?;
        lottery.recent_winner = winner;
        lottery.players = [Pubkey::default(); MAX_PLAYERS];
        lottery.player_count = 0;
        lottery.prize_pool = 0;
        lottery.pending_request = 0;
        lottery.last_timestamp = clock.unix_timestamp;
        lottery.status = LotteryStatus::Open;
        Lottery::pack(lottery, &mut lottery_info.data.borrow_mut())?;

        msg!("Winner picked: {} won {} lamports", winner, prize);
        Ok(())
    }
}

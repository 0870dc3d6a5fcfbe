use solana_program::{
    clock::UnixTimestamp,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::{Pubkey, PUBKEY_BYTES},
};
use arrayref::{array_ref, array_refs, mut_array_refs, array_mut_ref};
use std::convert::TryFrom;

/// Most entrants a single round can hold. The lottery account is fixed-size,
/// so the registry capacity is set at construction time.
pub const MAX_PLAYERS: usize = 64;

/// Confirmations the randomness oracle waits for before delivering.
pub const REQUEST_CONFIRMATIONS: u16 = 3;

/// Random words requested per draw.
pub const NUM_WORDS: u32 = 1;

/// Status of a lottery round
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LotteryStatus {
    /// Round is open for entries
    Open,
    /// Randomness requested, waiting for the oracle to deliver
    Calculating,
}

impl TryFrom<u8> for LotteryStatus {
    type Error = &'static str;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            0 => Ok(LotteryStatus::Open),
            1 => Ok(LotteryStatus::Calculating),
            _ => Err("Invalid lottery status"),
        }
    }
}

impl From<LotteryStatus> for u8 {
    fn from(status: LotteryStatus) -> Self {
        match status {
            LotteryStatus::Open => 0,
            LotteryStatus::Calculating => 1,
        }
    }
}

/// Lottery account data
#[derive(Clone, Debug, PartialEq)]
pub struct Lottery {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Creator of the lottery, recorded at construction
    pub authority: Pubkey,
    /// Randomness oracle identity; the only signer accepted for fulfillment
    pub oracle: Pubkey,
    /// Minimum payment to enter, in lamports
    pub entrance_fee: u64,
    /// Oracle gas-lane key hash, stored opaquely and echoed on each request
    pub key_hash: [u8; 32],
    /// Oracle subscription funding the requests
    pub subscription_id: u64,
    /// Gas limit for the oracle's fulfillment callback
    pub callback_gas_limit: u32,
    /// Seconds that must elapse between draws
    pub interval: u64,
    /// When the current round started (Unix timestamp)
    pub last_timestamp: UnixTimestamp,
    /// Status of the round
    pub status: LotteryStatus,
    /// Total randomness requests ever issued; ids start at 1
    pub request_counter: u64,
    /// Outstanding request id, 0 when none is in flight
    pub pending_request: u64,
    /// Winner of the last settled round (zero before the first draw)
    pub recent_winner: Pubkey,
    /// Lamports collected from entrants this round
    pub prize_pool: u64,
    /// Number of live entries in `players`
    pub player_count: u32,
    /// Ordered registry of entrants for the current round
    pub players: [Pubkey; MAX_PLAYERS],
}

impl Lottery {
    /// Whether a draw is due: open round, interval elapsed, at least one
    /// player, and a non-empty pot. All four must hold at once.
    pub fn check_upkeep(&self, now: UnixTimestamp) -> bool {
        self.status == LotteryStatus::Open
            && now.saturating_sub(self.last_timestamp) >= self.interval as i64
            && self.player_count > 0
            && self.prize_pool > 0
    }

    /// The live prefix of the registry.
    pub fn players(&self) -> &[Pubkey] {
        &self.players[..self.player_count as usize]
    }
}

/// Map a random word onto the registry. Plain modulo, so a given word always
/// selects the same index for a given entrant count.
pub fn winner_index(random_word: u64, total_players: u64) -> u64 {
    if total_players == 0 {
        return 0;
    }
    random_word % total_players
}

impl Sealed for Lottery {}

impl IsInitialized for Lottery {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for Lottery {
    const LEN: usize =
        1 + 32 + 32 + 8 + 32 + 8 + 4 + 8 + 8 + 1 + 8 + 8 + 32 + 8 + 4 + PUBKEY_BYTES * MAX_PLAYERS;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, solana_program::program_error::ProgramError> {
        let src = array_ref![src, 0, Lottery::LEN];
        let (
            is_initialized,
            authority,
            oracle,
            entrance_fee,
            key_hash,
            subscription_id,
            callback_gas_limit,
            interval,
            last_timestamp,
            status,
            request_counter,
            pending_request,
            recent_winner,
            prize_pool,
            player_count,
            players_flat,
        ) = array_refs![src, 1, 32, 32, 8, 32, 8, 4, 8, 8, 1, 8, 8, 32, 8, 4, PUBKEY_BYTES * MAX_PLAYERS];

        let status = match LotteryStatus::try_from(status[0]) {
            Ok(status) => status,
            Err(_) => return Err(solana_program::program_error::ProgramError::InvalidAccountData),
        };

        let mut players = [Pubkey::default(); MAX_PLAYERS];
        for (i, player) in players.iter_mut().enumerate() {
            *player = Pubkey::new_from_array(*array_ref![players_flat, i * PUBKEY_BYTES, PUBKEY_BYTES]);
        }

        Ok(Lottery {
            is_initialized: is_initialized[0] != 0,
            authority: Pubkey::new_from_array(*authority),
            oracle: Pubkey::new_from_array(*oracle),
            entrance_fee: u64::from_le_bytes(*entrance_fee),
            key_hash: *key_hash,
            subscription_id: u64::from_le_bytes(*subscription_id),
            callback_gas_limit: u32::from_le_bytes(*callback_gas_limit),
            interval: u64::from_le_bytes(*interval),
            last_timestamp: UnixTimestamp::from_le_bytes(*last_timestamp),
            status,
            request_counter: u64::from_le_bytes(*request_counter),
            pending_request: u64::from_le_bytes(*pending_request),
            recent_winner: Pubkey::new_from_array(*recent_winner),
            prize_pool: u64::from_le_bytes(*prize_pool),
            player_count: u32::from_le_bytes(*player_count),
            players,
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Lottery::LEN];
        let (
            is_initialized_dst,
            authority_dst,
            oracle_dst,
            entrance_fee_dst,
            key_hash_dst,
            subscription_id_dst,
            callback_gas_limit_dst,
            interval_dst,
            last_timestamp_dst,
            status_dst,
            request_counter_dst,
            pending_request_dst,
            recent_winner_dst,
            prize_pool_dst,
            player_count_dst,
            players_dst,
        ) = mut_array_refs![dst, 1, 32, 32, 8, 32, 8, 4, 8, 8, 1, 8, 8, 32, 8, 4, PUBKEY_BYTES * MAX_PLAYERS];

        is_initialized_dst[0] = self.is_initialized as u8;
        authority_dst.copy_from_slice(self.authority.as_ref());
        oracle_dst.copy_from_slice(self.oracle.as_ref());
        *entrance_fee_dst = self.entrance_fee.to_le_bytes();
        key_hash_dst.copy_from_slice(&self.key_hash);
        *subscription_id_dst = self.subscription_id.to_le_bytes();
        *callback_gas_limit_dst = self.callback_gas_limit.to_le_bytes();
        *interval_dst = self.interval.to_le_bytes();
        *last_timestamp_dst = self.last_timestamp.to_le_bytes();
        status_dst[0] = self.status.into();
        *request_counter_dst = self.request_counter.to_le_bytes();
        *pending_request_dst = self.pending_request.to_le_bytes();
        recent_winner_dst.copy_from_slice(self.recent_winner.as_ref());
        *prize_pool_dst = self.prize_pool.to_le_bytes();
        *player_count_dst = self.player_count.to_le_bytes();
        for (i, player) in self.players.iter().enumerate() {
            players_dst[i * PUBKEY_BYTES..(i + 1) * PUBKEY_BYTES].copy_from_slice(player.as_ref());
        }
    }
}

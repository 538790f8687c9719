use ethereum_types::H256;
use ssz::{FixedVector, VariableList};
use typenum::Unsigned;

use helper_functions::beacon_state_accessors::get_active_validator_indices;
use helper_functions::crypto::hash_tree_root;
use types::config::Config;
use types::consts::GENESIS_EPOCH;
use types::primitives::*;
use types::types::{BeaconBlockHeader, Deposit, DepositData, Eth1Data, Fork};
use types::{phase0, BeaconState};

use crate::blocks::block_processing::process_deposit;
use crate::error::Error;

/// The deposit tree holds at most `2^DEPOSIT_CONTRACT_TREE_DEPTH` entries.
type DepositDataList = VariableList<DepositData, typenum::U4294967296>;

/// Builds the phase0 genesis state from an Eth1 block and its deposit
/// sequence. With `skip_proofs_and_signatures` the deposit tree is taken on
/// faith, which is how kickstarted test networks begin.
pub fn initialize_beacon_state_from_eth1<C: Config>(
    eth1_block_hash: H256,
    eth1_timestamp: UnixSeconds,
    deposits: &[Deposit],
    skip_proofs_and_signatures: bool,
) -> Result<BeaconState<C>, Error> {
    let genesis_fork = Fork {
        previous_version: C::genesis_fork_version(),
        current_version: C::genesis_fork_version(),
        epoch: GENESIS_EPOCH,
    };

    let inner = phase0::BeaconState::<C> {
        genesis_time: eth1_timestamp + C::genesis_delay(),
        fork: genesis_fork,
        latest_block_header: BeaconBlockHeader {
            body_root: hash_tree_root(&phase0::BeaconBlockBody::<C>::default()),
            ..BeaconBlockHeader::default()
        },
        eth1_data: Eth1Data {
            deposit_root: H256::zero(),
            deposit_count: deposits.len() as u64,
            block_hash: eth1_block_hash,
        },
        randao_mixes: FixedVector::from(vec![
            eth1_block_hash;
            C::EpochsPerHistoricalVector::to_usize()
        ]),
        ..phase0::BeaconState::default()
    };
    let mut state = BeaconState::Phase0(inner);

    // The deposit root grows with each processed deposit, mirroring the
    // Eth1 contract's incremental tree.
    let mut processed = DepositDataList::empty();
    for deposit in deposits {
        processed
            .push(deposit.data.clone())
            .map_err(|_| Error::BadDeposit("deposit tree overflow"))?;
        state.eth1_data_mut().deposit_root = hash_tree_root(&processed);
        process_deposit(&mut state, deposit, skip_proofs_and_signatures)?;
    }

    // Genesis activations bypass the churn queue.
    let increment = C::effective_balance_increment();
    let balances: Vec<Gwei> = state.balances().to_vec();
    for (index, validator) in state.validators_mut().iter_mut().enumerate() {
        let balance = balances[index];
        validator.effective_balance =
            (balance - balance % increment).min(C::max_effective_balance());
        if validator.effective_balance == C::max_effective_balance() {
            validator.activation_eligibility_epoch = GENESIS_EPOCH;
            validator.activation_epoch = GENESIS_EPOCH;
        }
    }

    let validators_root = hash_tree_root(state.validators());
    *state.genesis_validators_root_mut() = validators_root;

    Ok(state)
}

pub fn is_valid_genesis_state<C: Config>(state: &BeaconState<C>) -> bool {
    state.genesis_time() >= C::min_genesis_time()
        && get_active_validator_indices(state, GENESIS_EPOCH).len() as u64
            >= C::min_genesis_active_validator_count()
}

/// Minimal per-validator input for starting a chain without real Eth1
/// deposits.
#[derive(Clone, Debug)]
pub struct KickstartValidatorData {
    pub pubkey: PublicKeyBytes,
    pub withdrawal_credentials: H256,
    pub balance: Gwei,
}

/// Builds a genesis state directly from validator data, bypassing deposit
/// signature verification entirely.
pub fn kick_start_state<C: Config>(
    eth1_block_hash: H256,
    genesis_time: UnixSeconds,
    validators: &[KickstartValidatorData],
) -> Result<BeaconState<C>, Error> {
    let deposits: Vec<Deposit> = validators
        .iter()
        .map(|validator| Deposit {
            proof: Default::default(),
            data: DepositData {
                pubkey: validator.pubkey,
                withdrawal_credentials: validator.withdrawal_credentials,
                amount: validator.balance,
                signature: SignatureBytes::empty(),
            },
        })
        .collect();

    let mut state = initialize_beacon_state_from_eth1::<C>(eth1_block_hash, 0, &deposits, true)?;
    *state.genesis_time_mut() = genesis_time;
    Ok(state)
}

use std::collections::{BTreeSet, HashMap};

use ethereum_types::H256;
use integer_sqrt::IntegerSquareRoot;
use typenum::Unsigned;

use helper_functions::beacon_state_accessors::{
    get_beacon_committee, get_beacon_proposer_index, get_committee_count_per_slot,
    get_current_epoch, get_domain, get_indexed_attestation, get_previous_epoch, get_randao_mix,
    get_total_active_balance,
};
use helper_functions::beacon_state_mutators::{
    decrease_balance, increase_balance, initiate_validator_exit, slash_validator,
};
use helper_functions::crypto::{bls_verify, bls_verify_aggregate, hash, hash_tree_root};
use helper_functions::math::xor;
use helper_functions::misc::{
    compute_domain, compute_epoch_at_slot, compute_signing_root, compute_time_at_slot,
};
use helper_functions::predicates::{
    is_active_validator, is_slashable_attestation_data, is_slashable_validator,
    is_valid_merkle_branch, validate_indexed_attestation,
};
use types::cancel::Cancellation;
use types::config::Config;
use types::consts::*;
use types::primitives::*;
use types::types::*;
use types::{altair, merge, phase0, BeaconState, SignedBeaconBlock};

use crate::error::Error;
use crate::execution_engine::ExecutionEngine;

/// Applies a signed block to a state already advanced to the block's slot.
/// The caller works on a disposable copy: on any `Err` the state must be
/// discarded.
pub fn process_block<C: Config>(
    state: &mut BeaconState<C>,
    block: &SignedBeaconBlock<C>,
    engine: &dyn ExecutionEngine<C>,
    verify_signatures: bool,
    cancellation: &Cancellation,
) -> Result<(), Error> {
    if state.fork_name() != block.fork_name() {
        return Err(Error::ForkMismatch {
            state: state.fork_name(),
            block: block.fork_name(),
        });
    }

    process_block_header(state, block, verify_signatures)?;

    match block {
        SignedBeaconBlock::Phase0(signed) => {
            let body = &signed.message.body;
            process_randao(state, &body.randao_reveal, verify_signatures)?;
            process_eth1_data(state, &body.eth1_data)?;
            check_phase0_body_limits(state, body)?;
            process_phase0_operations(state, body, verify_signatures, cancellation)?;
        }
        SignedBeaconBlock::Altair(signed) => {
            let body = &signed.message.body;
            process_randao(state, &body.randao_reveal, verify_signatures)?;
            process_eth1_data(state, &body.eth1_data)?;
            check_altair_body_limits(state, body)?;
            process_altair_operations(state, body, verify_signatures, cancellation)?;
            cancellation.checkpoint()?;
            process_sync_aggregate(state, &body.sync_aggregate, verify_signatures)?;
        }
        SignedBeaconBlock::Merge(signed) => {
            let body = &signed.message.body;
            process_randao(state, &body.randao_reveal, verify_signatures)?;
            process_eth1_data(state, &body.eth1_data)?;
            check_merge_body_limits(state, body)?;
            process_merge_operations(state, body, verify_signatures, cancellation)?;
            cancellation.checkpoint()?;
            process_sync_aggregate(state, &body.sync_aggregate, verify_signatures)?;
            cancellation.checkpoint()?;
            process_execution_payload(state, &body.execution_payload, engine)?;
        }
    }

    Ok(())
}

fn process_block_header<C: Config>(
    state: &mut BeaconState<C>,
    block: &SignedBeaconBlock<C>,
    verify_signatures: bool,
) -> Result<(), Error> {
    if block.slot() != state.slot() {
        return Err(Error::BadHeader("block slot does not match state slot"));
    }
    if block.slot() <= state.latest_block_header().slot {
        return Err(Error::BadHeader("a header was already applied at this slot"));
    }
    if block.parent_root() != hash_tree_root(state.latest_block_header()) {
        return Err(Error::BadHeader("parent root mismatch"));
    }

    let proposer_index = get_beacon_proposer_index(state)?;
    if block.proposer_index() != proposer_index {
        return Err(Error::BadHeader("wrong proposer"));
    }
    let proposer = &state.validators()[proposer_index as usize];
    if proposer.slashed {
        return Err(Error::BadHeader("proposer is slashed"));
    }

    if verify_signatures {
        let domain = get_domain(state, C::domain_beacon_proposer(), None);
        let signing_root = SigningData {
            object_root: block.message_root(),
            domain,
        };
        if !bls_verify(
            &proposer.pubkey,
            hash_tree_root(&signing_root),
            block.signature(),
        ) {
            return Err(Error::BadSignature {
                domain: "beacon proposer",
            });
        }
    }

    *state.latest_block_header_mut() = block.temporary_header();
    Ok(())
}

fn process_randao<C: Config>(
    state: &mut BeaconState<C>,
    randao_reveal: &SignatureBytes,
    verify_signatures: bool,
) -> Result<(), Error> {
    let epoch = get_current_epoch(state);

    if verify_signatures {
        let proposer_index = get_beacon_proposer_index(state)?;
        let proposer_pubkey = state.validators()[proposer_index as usize].pubkey;
        let domain = get_domain(state, C::domain_randao(), None);
        let signing_root = compute_signing_root(&epoch, domain);
        if !bls_verify(&proposer_pubkey, signing_root, randao_reveal) {
            return Err(Error::BadRandao);
        }
    }

    let mix = get_randao_mix(state, epoch)?;
    let mut reveal_digest = [0; 32];
    reveal_digest.copy_from_slice(&hash(randao_reveal.as_bytes()));
    let new_mix = xor(mix.as_fixed_bytes(), &reveal_digest);

    let index = (epoch % C::EpochsPerHistoricalVector::to_u64()) as usize;
    state.randao_mixes_mut()[index] = H256::from(new_mix);
    Ok(())
}

fn process_eth1_data<C: Config>(
    state: &mut BeaconState<C>,
    eth1_data: &Eth1Data,
) -> Result<(), Error> {
    state
        .eth1_data_votes_mut()
        .push(eth1_data.clone())
        .map_err(|_| Error::BadEth1Vote("voting window overflow"))?;

    let num_votes = state
        .eth1_data_votes()
        .iter()
        .filter(|vote| *vote == eth1_data)
        .count();
    if num_votes * 2 > C::SlotsPerEth1VotingPeriod::to_usize() {
        *state.eth1_data_mut() = eth1_data.clone();
    }
    Ok(())
}

macro_rules! check_limit {
    ($kind: expr, $list: expr, $max: ty) => {
        if $list.len() > <$max>::to_usize() {
            return Err(Error::BodyLimit {
                kind: $kind,
                count: $list.len(),
                limit: <$max>::to_usize(),
            });
        }
    };
}

fn check_deposit_count<C: Config>(
    state: &BeaconState<C>,
    deposits_in_body: usize,
) -> Result<(), Error> {
    let outstanding = state
        .eth1_data()
        .deposit_count
        .saturating_sub(state.eth1_deposit_index());
    let expected = C::MaxDeposits::to_u64().min(outstanding);
    if deposits_in_body as u64 != expected {
        return Err(Error::BadDeposit("unexpected number of deposits in block"));
    }
    Ok(())
}

fn check_phase0_body_limits<C: Config>(
    state: &BeaconState<C>,
    body: &phase0::BeaconBlockBody<C>,
) -> Result<(), Error> {
    check_limit!("proposer slashings", body.proposer_slashings, C::MaxProposerSlashings);
    check_limit!("attester slashings", body.attester_slashings, C::MaxAttesterSlashings);
    check_limit!("attestations", body.attestations, C::MaxAttestations);
    check_limit!("deposits", body.deposits, C::MaxDeposits);
    check_limit!("voluntary exits", body.voluntary_exits, C::MaxVoluntaryExits);
    check_deposit_count(state, body.deposits.len())
}

fn check_altair_body_limits<C: Config>(
    state: &BeaconState<C>,
    body: &altair::BeaconBlockBody<C>,
) -> Result<(), Error> {
    check_limit!("proposer slashings", body.proposer_slashings, C::MaxProposerSlashings);
    check_limit!("attester slashings", body.attester_slashings, C::MaxAttesterSlashings);
    check_limit!("attestations", body.attestations, C::MaxAttestations);
    check_limit!("deposits", body.deposits, C::MaxDeposits);
    check_limit!("voluntary exits", body.voluntary_exits, C::MaxVoluntaryExits);
    check_deposit_count(state, body.deposits.len())
}

fn check_merge_body_limits<C: Config>(
    state: &BeaconState<C>,
    body: &merge::BeaconBlockBody<C>,
) -> Result<(), Error> {
    check_limit!("proposer slashings", body.proposer_slashings, C::MaxProposerSlashings);
    check_limit!("attester slashings", body.attester_slashings, C::MaxAttesterSlashings);
    check_limit!("attestations", body.attestations, C::MaxAttestations);
    check_limit!("deposits", body.deposits, C::MaxDeposits);
    check_limit!("voluntary exits", body.voluntary_exits, C::MaxVoluntaryExits);
    check_deposit_count(state, body.deposits.len())
}

fn process_phase0_operations<C: Config>(
    state: &mut BeaconState<C>,
    body: &phase0::BeaconBlockBody<C>,
    verify_signatures: bool,
    cancellation: &Cancellation,
) -> Result<(), Error> {
    for proposer_slashing in body.proposer_slashings.iter() {
        process_proposer_slashing(state, proposer_slashing, verify_signatures)?;
    }
    for attester_slashing in body.attester_slashings.iter() {
        process_attester_slashing(state, attester_slashing, verify_signatures)?;
    }
    cancellation.checkpoint()?;
    for attestation in body.attestations.iter() {
        process_attestation_phase0(state, attestation, verify_signatures)?;
    }
    cancellation.checkpoint()?;
    for deposit in body.deposits.iter() {
        process_deposit(state, deposit, false)?;
    }
    for voluntary_exit in body.voluntary_exits.iter() {
        process_voluntary_exit(state, voluntary_exit, verify_signatures)?;
    }
    Ok(())
}

fn process_altair_operations<C: Config>(
    state: &mut BeaconState<C>,
    body: &altair::BeaconBlockBody<C>,
    verify_signatures: bool,
    cancellation: &Cancellation,
) -> Result<(), Error> {
    for proposer_slashing in body.proposer_slashings.iter() {
        process_proposer_slashing(state, proposer_slashing, verify_signatures)?;
    }
    for attester_slashing in body.attester_slashings.iter() {
        process_attester_slashing(state, attester_slashing, verify_signatures)?;
    }
    cancellation.checkpoint()?;
    for attestation in body.attestations.iter() {
        process_attestation_altair(state, attestation, verify_signatures)?;
    }
    cancellation.checkpoint()?;
    for deposit in body.deposits.iter() {
        process_deposit(state, deposit, false)?;
    }
    for voluntary_exit in body.voluntary_exits.iter() {
        process_voluntary_exit(state, voluntary_exit, verify_signatures)?;
    }
    Ok(())
}

// The merge fork reuses altair's attestation semantics wholesale.
fn process_merge_operations<C: Config>(
    state: &mut BeaconState<C>,
    body: &merge::BeaconBlockBody<C>,
    verify_signatures: bool,
    cancellation: &Cancellation,
) -> Result<(), Error> {
    for proposer_slashing in body.proposer_slashings.iter() {
        process_proposer_slashing(state, proposer_slashing, verify_signatures)?;
    }
    for attester_slashing in body.attester_slashings.iter() {
        process_attester_slashing(state, attester_slashing, verify_signatures)?;
    }
    cancellation.checkpoint()?;
    for attestation in body.attestations.iter() {
        process_attestation_altair(state, attestation, verify_signatures)?;
    }
    cancellation.checkpoint()?;
    for deposit in body.deposits.iter() {
        process_deposit(state, deposit, false)?;
    }
    for voluntary_exit in body.voluntary_exits.iter() {
        process_voluntary_exit(state, voluntary_exit, verify_signatures)?;
    }
    Ok(())
}

pub fn process_proposer_slashing<C: Config>(
    state: &mut BeaconState<C>,
    proposer_slashing: &ProposerSlashing,
    verify_signatures: bool,
) -> Result<(), Error> {
    let header_1 = &proposer_slashing.signed_header_1.message;
    let header_2 = &proposer_slashing.signed_header_2.message;

    if header_1.slot != header_2.slot {
        return Err(Error::BadSlashing("proposal slots differ"));
    }
    if header_1.proposer_index != header_2.proposer_index {
        return Err(Error::BadSlashing("proposer indices differ"));
    }
    if header_1 == header_2 {
        return Err(Error::BadSlashing("headers are identical"));
    }

    let proposer_index = header_1.proposer_index;
    let proposer = state
        .validators()
        .get(proposer_index as usize)
        .ok_or(helper_functions::Error::IndexOutOfRange)?;
    if !is_slashable_validator(proposer, get_current_epoch(state)) {
        return Err(Error::BadSlashing("proposer is not slashable"));
    }

    if verify_signatures {
        let pubkey = proposer.pubkey;
        for signed_header in [
            &proposer_slashing.signed_header_1,
            &proposer_slashing.signed_header_2,
        ]
        .iter()
        {
            let domain = get_domain(
                state,
                C::domain_beacon_proposer(),
                Some(compute_epoch_at_slot::<C>(signed_header.message.slot)),
            );
            let signing_root = compute_signing_root(&signed_header.message, domain);
            if !bls_verify(&pubkey, signing_root, &signed_header.signature) {
                return Err(Error::BadSignature {
                    domain: "beacon proposer",
                });
            }
        }
    }

    slash_validator(state, proposer_index, None)?;
    Ok(())
}

pub fn process_attester_slashing<C: Config>(
    state: &mut BeaconState<C>,
    attester_slashing: &AttesterSlashing<C>,
    verify_signatures: bool,
) -> Result<(), Error> {
    let attestation_1 = &attester_slashing.attestation_1;
    let attestation_2 = &attester_slashing.attestation_2;

    if !is_slashable_attestation_data(&attestation_1.data, &attestation_2.data) {
        return Err(Error::BadSlashing("attestations are not slashable"));
    }

    for attestation in [attestation_1, attestation_2].iter() {
        validate_indexed_attestation(state, attestation, verify_signatures).map_err(
            |error| match error {
                helper_functions::Error::SignatureInvalid => Error::BadSignature {
                    domain: "beacon attester",
                },
                other => Error::from(other),
            },
        )?;
    }

    let indices_1: BTreeSet<u64> = attestation_1.attesting_indices.iter().copied().collect();
    let indices_2: BTreeSet<u64> = attestation_2.attesting_indices.iter().copied().collect();

    let mut slashed_any = false;
    // `BTreeSet` intersection comes out in ascending order.
    let common: Vec<u64> = indices_1.intersection(&indices_2).copied().collect();
    for index in common {
        if is_slashable_validator(
            &state.validators()[index as usize],
            get_current_epoch(state),
        ) {
            slash_validator(state, index, None)?;
            slashed_any = true;
        }
    }

    if !slashed_any {
        return Err(Error::BadSlashing("no slashable participant in common"));
    }
    Ok(())
}

fn validate_attestation_common<C: Config>(
    state: &BeaconState<C>,
    attestation: &Attestation<C>,
) -> Result<(), Error> {
    let data = &attestation.data;

    if data.target.epoch != get_previous_epoch(state)
        && data.target.epoch != get_current_epoch(state)
    {
        return Err(Error::BadAttestation("target epoch is not current or previous"));
    }
    if data.target.epoch != compute_epoch_at_slot::<C>(data.slot) {
        return Err(Error::BadAttestation("target epoch does not match slot"));
    }
    if data.index >= get_committee_count_per_slot(state, data.target.epoch) {
        return Err(Error::BadAttestation("committee index out of range"));
    }

    let earliest = data.slot + C::min_attestation_inclusion_delay();
    let latest = data.slot + C::SlotsPerEpoch::to_u64();
    if !(earliest..=latest).contains(&state.slot()) {
        return Err(Error::BadAttestation("inclusion delay out of range"));
    }

    let committee = get_beacon_committee(state, data.slot, data.index)?;
    if attestation.aggregation_bits.len() != committee.len() {
        return Err(Error::BadAttestation("aggregation bits do not match committee"));
    }

    Ok(())
}

fn validate_attestation_signature<C: Config>(
    state: &BeaconState<C>,
    attestation: &Attestation<C>,
    verify_signatures: bool,
) -> Result<(), Error> {
    let indexed = get_indexed_attestation(state, attestation)?;
    validate_indexed_attestation(state, &indexed, verify_signatures).map_err(|error| {
        match error {
            helper_functions::Error::SignatureInvalid => Error::BadSignature {
                domain: "beacon attester",
            },
            other => Error::from(other),
        }
    })
}

pub fn process_attestation_phase0<C: Config>(
    state: &mut BeaconState<C>,
    attestation: &Attestation<C>,
    verify_signatures: bool,
) -> Result<(), Error> {
    validate_attestation_common(state, attestation)?;

    let data = &attestation.data;
    let pending = PendingAttestation {
        aggregation_bits: attestation.aggregation_bits.clone(),
        data: data.clone(),
        inclusion_delay: state.slot() - data.slot,
        proposer_index: get_beacon_proposer_index(state)?,
    };

    if data.target.epoch == get_current_epoch(state) {
        if data.source != *state.current_justified_checkpoint() {
            return Err(Error::BadAttestation("source is not the justified checkpoint"));
        }
    } else if data.source != *state.previous_justified_checkpoint() {
        return Err(Error::BadAttestation("source is not the justified checkpoint"));
    }

    validate_attestation_signature(state, attestation, verify_signatures)?;

    let inner = state
        .as_phase0_mut()
        .ok_or(helper_functions::Error::WrongFork)?;
    let list = if data.target.epoch == compute_epoch_at_slot::<C>(inner.slot) {
        &mut inner.current_epoch_attestations
    } else {
        &mut inner.previous_epoch_attestations
    };
    list.push(pending)
        .map_err(|_| Error::BadAttestation("pending attestation window overflow"))?;

    Ok(())
}

pub fn process_attestation_altair<C: Config>(
    state: &mut BeaconState<C>,
    attestation: &Attestation<C>,
    verify_signatures: bool,
) -> Result<(), Error> {
    validate_attestation_common(state, attestation)?;

    let data = &attestation.data;
    let is_current = data.target.epoch == get_current_epoch(state);
    let justified = if is_current {
        *state.current_justified_checkpoint()
    } else {
        *state.previous_justified_checkpoint()
    };
    if data.source != justified {
        return Err(Error::BadAttestation("source is not the justified checkpoint"));
    }

    validate_attestation_signature(state, attestation, verify_signatures)?;

    let inclusion_delay = state.slot() - data.slot;
    let is_matching_target = helper_functions::beacon_state_accessors::get_block_root(
        state,
        data.target.epoch,
    )
    .map(|root| root == data.target.root)
    .unwrap_or(false);
    let is_matching_head = is_matching_target
        && helper_functions::beacon_state_accessors::get_block_root_at_slot(state, data.slot)
            .map(|root| root == data.beacon_block_root)
            .unwrap_or(false);

    let mut flags_earned = 0;
    if inclusion_delay <= C::SlotsPerEpoch::to_u64().integer_sqrt() {
        flags_earned = add_flag(flags_earned, TIMELY_SOURCE_FLAG_INDEX);
    }
    if is_matching_target && inclusion_delay <= C::SlotsPerEpoch::to_u64() {
        flags_earned = add_flag(flags_earned, TIMELY_TARGET_FLAG_INDEX);
    }
    if is_matching_head && inclusion_delay == C::min_attestation_inclusion_delay() {
        flags_earned = add_flag(flags_earned, TIMELY_HEAD_FLAG_INDEX);
    }

    let attesting_indices: Vec<u64> = get_indexed_attestation(state, attestation)?
        .attesting_indices
        .to_vec();

    let total_balance = get_total_active_balance(state)?;
    let total_balance_sqrt = total_balance.integer_sqrt();
    let increment = C::effective_balance_increment();
    let base_reward_per_increment =
        increment * C::base_reward_factor() / total_balance_sqrt;

    let mut proposer_reward_numerator = 0_u64;
    {
        let validators_effective: Vec<Gwei> = attesting_indices
            .iter()
            .map(|index| state.validators()[*index as usize].effective_balance)
            .collect();
        let participation = if is_current {
            state.current_epoch_participation_mut()
        } else {
            state.previous_epoch_participation_mut()
        }
        .ok_or(helper_functions::Error::WrongFork)?;

        for (position, index) in attesting_indices.iter().enumerate() {
            let flags = &mut participation[*index as usize];
            for (flag_index, weight) in PARTICIPATION_FLAG_WEIGHTS.iter() {
                if has_flag(flags_earned, *flag_index) && !has_flag(*flags, *flag_index) {
                    *flags = add_flag(*flags, *flag_index);
                    let base_reward =
                        validators_effective[position] / increment * base_reward_per_increment;
                    proposer_reward_numerator += base_reward * weight;
                }
            }
        }
    }

    if proposer_reward_numerator > 0 {
        let proposer_reward_denominator =
            (WEIGHT_DENOMINATOR - PROPOSER_WEIGHT) * WEIGHT_DENOMINATOR / PROPOSER_WEIGHT;
        let proposer_index = get_beacon_proposer_index(state)?;
        increase_balance(
            state,
            proposer_index,
            proposer_reward_numerator / proposer_reward_denominator,
        )?;
    }

    Ok(())
}

/// Applies a deposit. The Merkle proof and the signature of new validators
/// are skipped on the genesis path, where the deposit tree is rebuilt from
/// scratch.
pub fn process_deposit<C: Config>(
    state: &mut BeaconState<C>,
    deposit: &Deposit,
    skip_proof_and_signature: bool,
) -> Result<(), Error> {
    if !skip_proof_and_signature {
        let leaf = hash_tree_root(&deposit.data);
        if !is_valid_merkle_branch(
            leaf,
            &deposit.proof,
            DEPOSIT_CONTRACT_TREE_DEPTH + 1,
            state.eth1_deposit_index(),
            state.eth1_data().deposit_root,
        ) {
            return Err(Error::BadDeposit("invalid Merkle proof"));
        }
    }

    // Deposits must be processed in order.
    *state.eth1_deposit_index_mut() += 1;

    let pubkey = deposit.data.pubkey;
    let amount = deposit.data.amount;

    let existing = state
        .validators()
        .iter()
        .position(|validator| validator.pubkey == pubkey);
    if let Some(index) = existing {
        return increase_balance(state, index as u64, amount).map_err(Error::from);
    }

    if !skip_proof_and_signature {
        // Deposits are valid across forks, so the domain is computed from
        // the genesis fork version with an empty validators root.
        let domain = compute_domain(C::domain_deposit(), C::genesis_fork_version(), H256::zero());
        let signing_root = compute_signing_root(&deposit.data.message(), domain);
        if !bls_verify(&pubkey, signing_root, &deposit.data.signature) {
            // An invalid proof of possession burns the deposit without
            // failing the block.
            return Ok(());
        }
    }

    let validator = Validator {
        pubkey,
        withdrawal_credentials: deposit.data.withdrawal_credentials,
        effective_balance: (amount - amount % C::effective_balance_increment())
            .min(C::max_effective_balance()),
        slashed: false,
        activation_eligibility_epoch: C::far_future_epoch(),
        activation_epoch: C::far_future_epoch(),
        exit_epoch: C::far_future_epoch(),
        withdrawable_epoch: C::far_future_epoch(),
    };
    append_validator(state, validator, amount)
}

/// Extends the registry and every registry-parallel list in lock-step.
fn append_validator<C: Config>(
    state: &mut BeaconState<C>,
    validator: Validator,
    balance: Gwei,
) -> Result<(), Error> {
    let full = |_| Error::BadDeposit("validator registry is full");

    match state {
        BeaconState::Phase0(inner) => {
            inner.validators.push(validator).map_err(full)?;
            inner.balances.push(balance).map_err(full)?;
        }
        BeaconState::Altair(inner) => {
            inner.validators.push(validator).map_err(full)?;
            inner.balances.push(balance).map_err(full)?;
            inner.previous_epoch_participation.push(0).map_err(full)?;
            inner.current_epoch_participation.push(0).map_err(full)?;
            inner.inactivity_scores.push(0).map_err(full)?;
        }
        BeaconState::Merge(inner) => {
            inner.validators.push(validator).map_err(full)?;
            inner.balances.push(balance).map_err(full)?;
            inner.previous_epoch_participation.push(0).map_err(full)?;
            inner.current_epoch_participation.push(0).map_err(full)?;
            inner.inactivity_scores.push(0).map_err(full)?;
        }
    }
    Ok(())
}

pub fn process_voluntary_exit<C: Config>(
    state: &mut BeaconState<C>,
    signed_exit: &SignedVoluntaryExit,
    verify_signatures: bool,
) -> Result<(), Error> {
    let exit = &signed_exit.message;
    let current_epoch = get_current_epoch(state);

    let validator = state
        .validators()
        .get(exit.validator_index as usize)
        .ok_or(helper_functions::Error::IndexOutOfRange)?;

    if !is_active_validator(validator, current_epoch) {
        return Err(Error::BadExit("validator is not active"));
    }
    if validator.exit_epoch != C::far_future_epoch() {
        return Err(Error::BadExit("exit already initiated"));
    }
    if current_epoch < exit.epoch {
        return Err(Error::BadExit("exit epoch is in the future"));
    }
    if current_epoch < validator.activation_epoch + C::shard_committee_period() {
        return Err(Error::BadExit("validator has not been active long enough"));
    }

    if verify_signatures {
        let domain = get_domain(state, C::domain_voluntary_exit(), Some(exit.epoch));
        let signing_root = compute_signing_root(exit, domain);
        if !bls_verify(&validator.pubkey, signing_root, &signed_exit.signature) {
            return Err(Error::BadSignature {
                domain: "voluntary exit",
            });
        }
    }

    initiate_validator_exit(state, exit.validator_index)?;
    Ok(())
}

pub fn process_sync_aggregate<C: Config>(
    state: &mut BeaconState<C>,
    aggregate: &altair::SyncAggregate<C>,
    verify_signatures: bool,
) -> Result<(), Error> {
    let committee_pubkeys: Vec<PublicKeyBytes> = state
        .current_sync_committee()
        .ok_or(helper_functions::Error::WrongFork)?
        .pubkeys
        .to_vec();

    let previous_slot = state.slot().max(1) - 1;

    if verify_signatures {
        let participants: Vec<PublicKeyBytes> = committee_pubkeys
            .iter()
            .zip(aggregate.sync_committee_bits.iter())
            .filter(|(_, bit)| *bit)
            .map(|(pubkey, _)| *pubkey)
            .collect();

        let domain = get_domain(
            state,
            C::domain_sync_committee(),
            Some(compute_epoch_at_slot::<C>(previous_slot)),
        );
        let block_root =
            helper_functions::beacon_state_accessors::get_block_root_at_slot(state, previous_slot)?;
        let signing_root = compute_signing_root(&block_root, domain);
        if !bls_verify_aggregate(
            &participants,
            signing_root,
            &aggregate.sync_committee_signature,
        ) {
            return Err(Error::BadSignature {
                domain: "sync committee",
            });
        }
    }

    let total_active_balance = get_total_active_balance(state)?;
    let increment = C::effective_balance_increment();
    let base_reward_per_increment =
        increment * C::base_reward_factor() / total_active_balance.integer_sqrt();
    let total_base_rewards = base_reward_per_increment * (total_active_balance / increment);
    let max_participant_rewards = total_base_rewards * SYNC_REWARD_WEIGHT
        / WEIGHT_DENOMINATOR
        / C::SlotsPerEpoch::to_u64();
    let participant_reward = max_participant_rewards / C::SyncCommitteeSize::to_u64();
    let proposer_reward =
        participant_reward * PROPOSER_WEIGHT / (WEIGHT_DENOMINATOR - PROPOSER_WEIGHT);

    let pubkey_to_index: HashMap<PublicKeyBytes, u64> = state
        .validators()
        .iter()
        .enumerate()
        .map(|(index, validator)| (validator.pubkey, index as u64))
        .collect();

    let proposer_index = get_beacon_proposer_index(state)?;
    for (pubkey, bit) in committee_pubkeys
        .iter()
        .zip(aggregate.sync_committee_bits.iter())
    {
        let participant_index = *pubkey_to_index
            .get(pubkey)
            .ok_or(Error::BadSyncAggregate("committee member not in registry"))?;
        if bit {
            increase_balance(state, participant_index, participant_reward)?;
            increase_balance(state, proposer_index, proposer_reward)?;
        } else {
            decrease_balance(state, participant_index, participant_reward)?;
        }
    }

    Ok(())
}

pub fn process_execution_payload<C: Config>(
    state: &mut BeaconState<C>,
    payload: &merge::ExecutionPayload<C>,
    engine: &dyn ExecutionEngine<C>,
) -> Result<(), Error> {
    let current_epoch = get_current_epoch(state);
    let random = get_randao_mix(state, current_epoch)?;
    let expected_timestamp = compute_time_at_slot::<C>(state.genesis_time(), state.slot());

    let header = state
        .latest_execution_payload_header()
        .ok_or(helper_functions::Error::WrongFork)?;

    // Before the transition completes the header is empty and any parent is
    // acceptable.
    if !header.is_empty() && payload.parent_hash != header.block_hash {
        return Err(Error::BadExecutionPayload(
            "parent hash does not extend the latest payload",
        ));
    }
    if payload.random != random {
        return Err(Error::BadExecutionPayload("randao mix mismatch"));
    }
    if payload.timestamp != expected_timestamp {
        return Err(Error::BadExecutionPayload("timestamp mismatch"));
    }

    engine
        .execute_payload(payload)
        .map_err(Error::BadExecutionPayload)?;

    *state
        .latest_execution_payload_header_mut()
        .ok_or(helper_functions::Error::WrongFork)? = payload.header();
    Ok(())
}

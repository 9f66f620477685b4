use gitswarm_core::{
    Address, Amount, CoreError, Erc20Token, Event, ManualClock, TokenCapability, ONE_TOKEN,
};
use gitswarm_platform::{Platform, PlatformError, TokenSpec};
use governance::config::{DEFAULT_BUFFER, DEFAULT_VOTE_DURATION};
use governance::{GovernanceError, ModuleKind, ParameterKey};
use std::collections::BTreeMap;
use std::thread;
use treasury::{TreasuryError, NATIVE_COIN};

const START: u64 = 1_700_000_000;
const PROJECT: u64 = 1;

struct Fixture {
    platform: Platform<ManualClock>,
    clock: ManualClock,
    gitswarm: Address,
    alice: Address,
    bob: Address,
    carol: Address,
    token: Address,
}

impl Fixture {
    /// Project 1 with an expandable token: alice 50, bob 30, carol 20, treasury 50.
    /// Circulating supply is 100 since the treasury is burn address 0.
    fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let clock = ManualClock::new(START);
        let mut platform = Platform::with_clock(clock.clone());
        platform.initialize().unwrap();
        let gitswarm = platform.config().gitswarm_address;

        let alice = Address::from_label("alice");
        let bob = Address::from_label("bob");
        let carol = Address::from_label("carol");
        let (project, token) = platform
            .deploy_project_token(alice, "repo-1", spec(true))
            .unwrap();
        assert_eq!(project, PROJECT);
        platform.transfer(alice, token, bob, 30 * ONE_TOKEN).unwrap();
        platform.transfer(alice, token, carol, 20 * ONE_TOKEN).unwrap();

        Self {
            platform,
            clock,
            gitswarm,
            alice,
            bob,
            carol,
            token,
        }
    }

    /// Ends voting and locks the count; the proposal must pass
    fn lock(&mut self, project: u64, id: u64) {
        self.clock.advance(DEFAULT_VOTE_DURATION + 1);
        assert!(self.platform.lock_vote_count(self.alice, project, id).unwrap());
    }

    /// Locks and waits out the contest buffer
    fn pass(&mut self, project: u64, id: u64) {
        self.lock(project, id);
        self.clock.advance(DEFAULT_BUFFER);
    }
}

fn spec(expandable: bool) -> TokenSpec {
    TokenSpec {
        name: "Repo".to_string(),
        symbol: "RPO".to_string(),
        expandable,
        initial_supply: 100 * ONE_TOKEN,
        buffer: 50 * ONE_TOKEN,
    }
}

fn governance_err(err: GovernanceError) -> PlatformError {
    PlatformError::Governance(err)
}

#[test]
fn test_parameter_change_lifecycle() {
    let mut f = Fixture::new();
    let id = f
        .platform
        .propose_parameter_change(f.alice, PROJECT, ParameterKey::VoteDuration, 3_600)
        .unwrap();
    assert_eq!(id, 0);
    assert_eq!(f.platform.next_proposal_id(PROJECT), 1);
    assert_eq!(f.platform.get_votes(PROJECT, id, &f.alice), (true, true));

    f.platform.vote(f.bob, PROJECT, id, false).unwrap();
    let tally = f.platform.get_vote_count(PROJECT, id).unwrap();
    assert_eq!((tally.yes, tally.no), (50 * ONE_TOKEN, 30 * ONE_TOKEN));
    assert!(tally.passed);

    assert_eq!(
        f.platform.lock_vote_count(f.carol, PROJECT, id),
        Err(governance_err(GovernanceError::VotingOngoing))
    );

    f.lock(PROJECT, id);
    assert_eq!(
        f.platform.vote(f.carol, PROJECT, id, false),
        Err(governance_err(GovernanceError::ProposalInactive))
    );
    assert_eq!(
        f.platform
            .execute_proposal(f.alice, ModuleKind::Parameters, PROJECT, id),
        Err(governance_err(GovernanceError::BufferNotEnded))
    );

    f.clock.advance(DEFAULT_BUFFER);
    f.platform
        .execute_proposal(f.alice, ModuleKind::Parameters, PROJECT, id)
        .unwrap();
    assert_eq!(f.platform.parameter(PROJECT, ParameterKey::VoteDuration), 3_600);
    assert_eq!(
        f.platform.parameter(0, ParameterKey::VoteDuration),
        u128::from(DEFAULT_VOTE_DURATION)
    );
    assert_eq!(
        f.platform.events().last(),
        Some(&Event::ProposalExecuted {
            project_id: PROJECT,
            proposal_id: id
        })
    );

    assert_eq!(
        f.platform
            .execute_proposal(f.alice, ModuleKind::Parameters, PROJECT, id),
        Err(governance_err(GovernanceError::ProposalDoesNotExist))
    );
}

#[test]
fn test_rejected_proposal_is_deleted() {
    let mut f = Fixture::new();
    let id = f
        .platform
        .propose_parameter_change(f.carol, PROJECT, ParameterKey::VetoMinimumPercentage, 40)
        .unwrap();
    f.platform.vote(f.alice, PROJECT, id, false).unwrap();

    f.clock.advance(DEFAULT_VOTE_DURATION + 1);
    assert!(!f.platform.lock_vote_count(f.carol, PROJECT, id).unwrap());
    assert!(f.platform.proposal(PROJECT, id).unwrap().voters().is_empty());

    f.clock.advance(DEFAULT_BUFFER);
    assert_eq!(
        f.platform
            .execute_proposal(f.carol, ModuleKind::Parameters, PROJECT, id),
        Err(governance_err(GovernanceError::NotApproved))
    );
}

#[test]
fn test_execute_through_wrong_module() {
    let mut f = Fixture::new();
    let id = f
        .platform
        .propose_parameter_change(f.alice, PROJECT, ParameterKey::MaxNrOfDelegators, 5)
        .unwrap();
    f.pass(PROJECT, id);

    let err = f
        .platform
        .execute_proposal(f.alice, ModuleKind::FundsManager, PROJECT, id)
        .unwrap_err();
    assert_eq!(
        err,
        PlatformError::Treasury(TreasuryError::Governance(
            GovernanceError::UnexpectedProposalType
        ))
    );
    assert_eq!(
        f.platform
            .execute_proposal(f.alice, ModuleKind::Delegates, PROJECT, id),
        Err(governance_err(GovernanceError::UnexpectedProposalType))
    );

    f.platform
        .execute_proposal(f.alice, ModuleKind::Parameters, PROJECT, id)
        .unwrap();
    assert_eq!(f.platform.parameter(PROJECT, ParameterKey::MaxNrOfDelegators), 5);
}

#[test]
fn test_contest_overturns_decision() {
    let mut f = Fixture::new();
    let id = f
        .platform
        .propose_parameter_change(f.alice, PROJECT, ParameterKey::VetoMinimumPercentage, 10)
        .unwrap();
    f.lock(PROJECT, id);
    // 30% of the 100 circulating
    assert_eq!(f.platform.needed_to_contest(PROJECT).unwrap(), 30 * ONE_TOKEN);

    // a contester's flag does not matter, the vote counts as an objection
    assert!(f.platform.contest_proposal(f.carol, PROJECT, id, true).unwrap());
    assert_eq!(f.platform.get_votes(PROJECT, id, &f.carol), (true, false));
    assert!(!f.platform.contest_proposal(f.bob, PROJECT, id, false).unwrap());
    assert!(f.platform.events().contains(&Event::ProposalContested {
        project_id: PROJECT,
        proposal_id: id,
        contester: f.bob,
        will_execute: false,
    }));

    f.clock.advance(DEFAULT_BUFFER);
    assert_eq!(
        f.platform.contest_proposal(f.alice, PROJECT, id, false),
        Err(governance_err(GovernanceError::NotContestable))
    );
    assert_eq!(
        f.platform
            .execute_proposal(f.alice, ModuleKind::Parameters, PROJECT, id),
        Err(governance_err(GovernanceError::NotApproved))
    );
}

#[test]
fn test_expired_proposal_cannot_be_locked() {
    let mut f = Fixture::new();
    let id = f
        .platform
        .propose_parameter_change(f.alice, PROJECT, ParameterKey::VoteDuration, 7_200)
        .unwrap();
    let expiration = governance::config::DEFAULT_EXPIRATION_PERIOD;
    f.clock.advance(DEFAULT_VOTE_DURATION + expiration + 1);
    assert_eq!(
        f.platform.lock_vote_count(f.alice, PROJECT, id),
        Err(governance_err(GovernanceError::ProposalExpired))
    );
}

#[test]
fn test_trusted_address_and_transaction_proposal() {
    let mut f = Fixture::new();
    let operator = Address::from_label("operator");
    let recipient = Address::from_label("recipient");
    f.platform.fund_native(f.alice, 10 * ONE_TOKEN).unwrap();
    f.platform
        .deposit_eth(f.alice, PROJECT, 10 * ONE_TOKEN)
        .unwrap();
    assert_eq!(f.platform.treasury_balance(PROJECT, &NATIVE_COIN), 10 * ONE_TOKEN);

    assert_eq!(
        f.platform
            .send_ether(operator, PROJECT, recipient, ONE_TOKEN),
        Err(PlatformError::Treasury(TreasuryError::Governance(
            GovernanceError::RestrictedFunction
        )))
    );

    let id = f
        .platform
        .propose_change_trusted_address(f.alice, PROJECT, operator, true)
        .unwrap();
    f.pass(PROJECT, id);
    f.platform
        .execute_proposal(f.bob, ModuleKind::Parameters, PROJECT, id)
        .unwrap();
    assert!(f.platform.is_trusted_address(PROJECT, &operator));
    assert!(!f.platform.is_trusted_address(2, &operator));

    f.platform
        .send_ether(operator, PROJECT, recipient, ONE_TOKEN)
        .unwrap();
    assert_eq!(f.platform.native_balance(&recipient), ONE_TOKEN);

    let id = f
        .platform
        .propose_transaction(
            f.alice,
            PROJECT,
            &[NATIVE_COIN, f.token],
            &[2 * ONE_TOKEN, 5 * ONE_TOKEN],
            &[recipient, recipient],
            &[0, 0],
        )
        .unwrap();
    f.pass(PROJECT, id);
    f.platform
        .execute_proposal(f.alice, ModuleKind::FundsManager, PROJECT, id)
        .unwrap();

    assert_eq!(f.platform.native_balance(&recipient), 3 * ONE_TOKEN);
    assert_eq!(f.platform.token_balance(&f.token, &recipient), 5 * ONE_TOKEN);
    assert_eq!(f.platform.treasury_balance(PROJECT, &NATIVE_COIN), 7 * ONE_TOKEN);
    assert_eq!(f.platform.treasury_balance(PROJECT, &f.token), 45 * ONE_TOKEN);
}

#[test]
fn test_create_tokens_and_disable() {
    let mut f = Fixture::new();
    let id = f
        .platform
        .propose_create_tokens(f.alice, PROJECT, 10 * ONE_TOKEN)
        .unwrap();
    f.pass(PROJECT, id);
    f.platform
        .execute_proposal(f.alice, ModuleKind::TokenSupply, PROJECT, id)
        .unwrap();
    assert_eq!(f.platform.token_supply(&f.token).unwrap(), 160 * ONE_TOKEN);
    assert_eq!(f.platform.treasury_balance(PROJECT, &f.token), 60 * ONE_TOKEN);

    let id = f
        .platform
        .propose_disable_token_creation(f.alice, PROJECT)
        .unwrap();
    f.pass(PROJECT, id);
    f.platform
        .execute_proposal(f.alice, ModuleKind::TokenSupply, PROJECT, id)
        .unwrap();

    assert_eq!(
        f.platform.propose_create_tokens(f.alice, PROJECT, ONE_TOKEN),
        Err(PlatformError::TokenCreationDisabled)
    );
}

#[test]
fn test_create_tokens_threshold_rechecked_at_execution() {
    let mut f = Fixture::new();
    let id = f
        .platform
        .propose_create_tokens(f.alice, PROJECT, 10 * ONE_TOKEN)
        .unwrap();
    f.lock(PROJECT, id);

    // 20 against 50 keeps the majority and stays under the veto share,
    // but drops support below 80%
    assert!(f.platform.contest_proposal(f.carol, PROJECT, id, false).unwrap());
    f.clock.advance(DEFAULT_BUFFER);

    assert_eq!(
        f.platform
            .execute_proposal(f.alice, ModuleKind::TokenSupply, PROJECT, id),
        Err(governance_err(GovernanceError::CreateTokensThresholdNotMet))
    );
    assert_eq!(f.platform.token_supply(&f.token).unwrap(), 150 * ONE_TOKEN);
}

#[test]
fn test_fixed_supply_token() {
    let mut f = Fixture::new();
    let (project, _) = f
        .platform
        .deploy_project_token(f.alice, "repo-2", spec(false))
        .unwrap();
    assert_eq!(
        f.platform.propose_create_tokens(f.alice, project, ONE_TOKEN),
        Err(PlatformError::FixedSupply)
    );
}

#[test]
fn test_burn_address_reduces_circulating_supply() {
    let mut f = Fixture::new();
    let fm = ModuleKind::FundsManager.address();
    assert_eq!(f.platform.burn_addresses(PROJECT), &[fm]);
    assert_eq!(f.platform.circulating_supply(PROJECT).unwrap(), 100 * ONE_TOKEN);

    let burn = Address::from_label("burn");
    let id = f
        .platform
        .propose_add_burn_address(f.alice, PROJECT, burn)
        .unwrap();
    f.pass(PROJECT, id);
    f.platform
        .execute_proposal(f.alice, ModuleKind::ContractsManager, PROJECT, id)
        .unwrap();
    assert_eq!(f.platform.burn_addresses(PROJECT), &[fm, burn]);
    assert_eq!(f.platform.burn_addresses(PROJECT)[1], burn);

    f.platform.transfer(f.alice, f.token, burn, 10 * ONE_TOKEN).unwrap();
    assert_eq!(f.platform.circulating_supply(PROJECT).unwrap(), 90 * ONE_TOKEN);
    assert_eq!(f.platform.needed_to_contest(PROJECT).unwrap(), 27 * ONE_TOKEN);

    let id = f
        .platform
        .propose_add_burn_address(f.alice, PROJECT, burn)
        .unwrap();
    f.pass(PROJECT, id);
    assert_eq!(
        f.platform
            .execute_proposal(f.alice, ModuleKind::ContractsManager, PROJECT, id),
        Err(PlatformError::DuplicateBurnAddress)
    );
}

#[test]
fn test_change_voting_token() {
    let mut f = Fixture::new();
    let replacement = Address::from_label("replacement-token");
    let mut token = Erc20Token::new("Replacement", "RPL");
    token.mint(f.bob, 100 * ONE_TOKEN).unwrap();
    f.platform.deploy_token(replacement, token).unwrap();

    let id = f
        .platform
        .propose_change_voting_token(f.alice, PROJECT, replacement)
        .unwrap();
    f.pass(PROJECT, id);
    f.platform
        .execute_proposal(f.alice, ModuleKind::ContractsManager, PROJECT, id)
        .unwrap();

    assert_eq!(f.platform.voting_token(PROJECT).unwrap(), replacement);
    assert!(f.platform.is_trusted_address(PROJECT, &replacement));
    assert!(!f.platform.is_trusted_address(PROJECT, &f.token));
    assert_eq!(f.platform.circulating_supply(PROJECT).unwrap(), 100 * ONE_TOKEN);

    // alice holds none of the new token
    assert_eq!(
        f.platform
            .propose_parameter_change(f.alice, PROJECT, ParameterKey::VoteDuration, 600),
        Err(governance_err(GovernanceError::NotEnoughVotingPower))
    );
}

#[test]
fn test_upgrade_contracts() {
    let mut f = Fixture::new();
    let target = Address::from_label("funds-manager-v2");
    let implementations = BTreeMap::from([(ModuleKind::FundsManager, target)]);
    let id = f
        .platform
        .propose_upgrade_contracts(f.gitswarm, implementations)
        .unwrap();
    f.clock.advance(DEFAULT_VOTE_DURATION + 1);
    assert!(f.platform.lock_vote_count(f.gitswarm, 0, id).unwrap());
    f.clock.advance(DEFAULT_BUFFER);
    f.platform
        .execute_proposal(f.gitswarm, ModuleKind::ContractsManager, 0, id)
        .unwrap();

    let upgraded = f
        .platform
        .state()
        .registry
        .implementation(ModuleKind::FundsManager)
        .unwrap();
    assert_eq!((upgraded.address, upgraded.version), (target, 2));
    assert_eq!(
        f.platform
            .state()
            .registry
            .implementation(ModuleKind::GasStation)
            .unwrap()
            .version,
        1
    );
    assert!(f
        .platform
        .events()
        .contains(&Event::ContractsUpgraded { proposal_id: id }));
}

#[test]
fn test_delegation_and_spam_delegates() {
    let mut f = Fixture::new();
    f.platform.delegate(f.bob, PROJECT, f.alice).unwrap();
    f.platform.delegate(f.carol, PROJECT, f.alice).unwrap();
    assert_eq!(
        f.platform
            .get_delegated_voting_power(PROJECT, &f.alice)
            .unwrap(),
        50 * ONE_TOKEN
    );
    assert_eq!(
        f.platform.delegate(f.alice, PROJECT, f.bob),
        Err(governance_err(GovernanceError::SelfDelegation))
    );

    f.platform.transfer(f.bob, f.token, f.carol, 30 * ONE_TOKEN).unwrap();
    let (addresses, indexes) = f.platform.get_spam_delegates(PROJECT, &f.alice).unwrap();
    assert_eq!((addresses.clone(), indexes.clone()), (vec![f.bob], vec![0]));

    let removed = f
        .platform
        .remove_spam_delegates(f.gitswarm, PROJECT, f.alice, &addresses, &indexes)
        .unwrap();
    assert_eq!(removed, vec![f.bob]);
    assert_eq!(f.platform.delegators_of(PROJECT, &f.alice), &[f.carol]);
    assert_eq!(f.platform.delegate_of(PROJECT, &f.bob), None);

    let released = f
        .platform
        .undelegate_all_from_address(f.alice, PROJECT)
        .unwrap();
    assert_eq!(released, vec![f.carol]);
    assert_eq!(
        f.platform.undelegate(f.carol, PROJECT),
        Err(governance_err(GovernanceError::NotDelegated))
    );
}

#[test]
fn test_delegated_power_counts_in_votes() {
    let mut f = Fixture::new();
    f.platform.delegate(f.carol, PROJECT, f.bob).unwrap();
    let id = f
        .platform
        .propose_parameter_change(f.alice, PROJECT, ParameterKey::VoteDuration, 600)
        .unwrap();
    f.platform.vote(f.bob, PROJECT, id, false).unwrap();
    let tally = f.platform.get_vote_count(PROJECT, id).unwrap();
    assert_eq!((tally.yes, tally.no), (50 * ONE_TOKEN, 50 * ONE_TOKEN));

    // a delegator voting directly takes their weight out of the delegate's count
    f.platform.vote(f.carol, PROJECT, id, true).unwrap();
    let tally = f.platform.get_vote_count(PROJECT, id).unwrap();
    assert_eq!((tally.yes, tally.no), (70 * ONE_TOKEN, 30 * ONE_TOKEN));
}

#[test]
fn test_remove_spam_voters() {
    let mut f = Fixture::new();
    let id = f
        .platform
        .propose_parameter_change(f.alice, PROJECT, ParameterKey::VoteDuration, 600)
        .unwrap();
    f.platform.vote(f.bob, PROJECT, id, false).unwrap();
    f.platform.vote(f.carol, PROJECT, id, false).unwrap();
    f.platform.transfer(f.bob, f.token, f.alice, 30 * ONE_TOKEN).unwrap();

    assert_eq!(f.platform.get_spam_voters(PROJECT, id).unwrap(), vec![1]);
    assert_eq!(
        f.platform.remove_spam_voters(f.carol, PROJECT, id, &[2, 1]),
        Err(governance_err(GovernanceError::UnsortedIndexes))
    );
    let removed = f
        .platform
        .remove_spam_voters(f.carol, PROJECT, id, &[1, 2])
        .unwrap();
    assert_eq!(removed, vec![f.bob]);
    assert_eq!(f.platform.get_votes(PROJECT, id, &f.bob), (false, false));
    assert_eq!(
        f.platform.proposal(PROJECT, id).unwrap().voters(),
        &[f.alice, f.carol]
    );
}

#[test]
fn test_reclaim_funds() {
    let mut f = Fixture::new();
    let asset = Address::from_label("asset");
    let mut token = Erc20Token::new("Asset", "AST");
    token.mint(f.alice, 100 * ONE_TOKEN).unwrap();
    f.platform.deploy_token(asset, token).unwrap();

    let fm = ModuleKind::FundsManager.address();
    f.platform.approve(f.alice, asset, fm, 40 * ONE_TOKEN).unwrap();
    f.platform
        .deposit_token(f.alice, PROJECT, asset, 40 * ONE_TOKEN)
        .unwrap();
    f.platform.fund_native(f.alice, 10 * ONE_TOKEN).unwrap();
    f.platform
        .deposit_eth(f.alice, PROJECT, 10 * ONE_TOKEN)
        .unwrap();

    assert_eq!(
        f.platform.reclaim_funds(f.bob, PROJECT, 10 * ONE_TOKEN, &[asset]),
        Err(PlatformError::Treasury(TreasuryError::Core(CoreError::InsufficientTokenAllowance)))
    );

    // 10 of 100 circulating is a tenth of the treasury; its own 50 do not count
    f.platform.approve(f.bob, f.token, fm, 10 * ONE_TOKEN).unwrap();
    let payouts = f
        .platform
        .reclaim_funds(f.bob, PROJECT, 10 * ONE_TOKEN, &[asset, asset])
        .unwrap();
    assert_eq!(payouts.len(), 2);
    assert!(payouts.contains(&(asset, 4 * ONE_TOKEN)));
    assert!(payouts.contains(&(NATIVE_COIN, ONE_TOKEN)));

    assert_eq!(f.platform.token_balance(&asset, &f.bob), 4 * ONE_TOKEN);
    assert_eq!(f.platform.native_balance(&f.bob), ONE_TOKEN);
    assert_eq!(f.platform.token_balance(&f.token, &f.bob), 20 * ONE_TOKEN);
    assert_eq!(f.platform.token_supply(&f.token).unwrap(), 140 * ONE_TOKEN);
    assert_eq!(f.platform.treasury_balance(PROJECT, &asset), 36 * ONE_TOKEN);
    assert_eq!(f.platform.treasury_balance(PROJECT, &NATIVE_COIN), 9 * ONE_TOKEN);
}

#[test]
fn test_reclaim_half_of_circulating_pays_half_the_treasury() {
    let mut f = Fixture::new();
    let (project, token) = f
        .platform
        .deploy_project_token(
            f.alice,
            "repo-2",
            TokenSpec {
                buffer: 100 * ONE_TOKEN,
                ..spec(true)
            },
        )
        .unwrap();
    f.platform.transfer(f.alice, token, f.bob, 75 * ONE_TOKEN).unwrap();
    assert_eq!(f.platform.token_supply(&token).unwrap(), 200 * ONE_TOKEN);
    assert_eq!(f.platform.circulating_supply(project).unwrap(), 100 * ONE_TOKEN);

    let neptune = Address::from_label("neptune");
    let mut erc20 = Erc20Token::new("Neptune", "NEP");
    erc20.mint(f.alice, 100 * ONE_TOKEN).unwrap();
    f.platform.deploy_token(neptune, erc20).unwrap();
    let fm = ModuleKind::FundsManager.address();
    f.platform.approve(f.alice, neptune, fm, 100 * ONE_TOKEN).unwrap();
    f.platform
        .deposit_token(f.alice, project, neptune, 100 * ONE_TOKEN)
        .unwrap();

    f.platform.approve(f.bob, token, fm, 50 * ONE_TOKEN).unwrap();
    let payouts = f
        .platform
        .reclaim_funds(f.bob, project, 50 * ONE_TOKEN, &[neptune])
        .unwrap();
    assert_eq!(payouts, vec![(neptune, 50 * ONE_TOKEN)]);
    assert_eq!(f.platform.token_balance(&neptune, &f.bob), 50 * ONE_TOKEN);
    assert_eq!(f.platform.treasury_balance(project, &neptune), 50 * ONE_TOKEN);
    assert_eq!(f.platform.circulating_supply(project).unwrap(), 50 * ONE_TOKEN);
}

#[test]
fn test_gas_station_flow() {
    let mut f = Fixture::new();
    let relayer = Address::from_label("relayer");
    f.platform.fund_native(f.alice, 5 * ONE_TOKEN).unwrap();
    f.platform
        .buy_gas_for_project(f.alice, PROJECT, 2 * ONE_TOKEN)
        .unwrap();
    assert_eq!(f.platform.gas_balance(PROJECT), 2 * ONE_TOKEN);

    let id = f
        .platform
        .propose_transfer_to_gas_address(f.gitswarm, ONE_TOKEN, relayer)
        .unwrap();
    f.clock.advance(DEFAULT_VOTE_DURATION + 1);
    assert!(f.platform.lock_vote_count(f.gitswarm, 0, id).unwrap());
    f.clock.advance(DEFAULT_BUFFER);

    assert_eq!(
        f.platform
            .execute_proposal(f.gitswarm, ModuleKind::GasStation, PROJECT, id),
        Err(governance_err(GovernanceError::ProposalDoesNotExist))
    );
    f.platform
        .execute_proposal(f.gitswarm, ModuleKind::GasStation, 0, id)
        .unwrap();
    assert_eq!(f.platform.native_balance(&relayer), ONE_TOKEN);
    assert_eq!(
        f.platform.native_balance(&ModuleKind::GasStation.address()),
        ONE_TOKEN
    );
}

#[test]
fn test_failed_call_leaves_no_trace() {
    let mut f = Fixture::new();
    let events = f.platform.events().len();
    let next = f.platform.next_proposal_id(PROJECT);

    let nobody = Address::from_label("nobody");
    assert_eq!(
        f.platform
            .propose_parameter_change(nobody, PROJECT, ParameterKey::VoteDuration, 600),
        Err(governance_err(GovernanceError::NotEnoughVotingPower))
    );
    assert_eq!(
        f.platform
            .propose_parameter_change(f.alice, PROJECT, ParameterKey::VoteDuration, 1),
        Err(governance_err(GovernanceError::ValueOutOfRange))
    );
    assert_eq!(
        f.platform.deposit_token(f.alice, PROJECT, f.token, ONE_TOKEN),
        Err(PlatformError::Treasury(TreasuryError::Core(CoreError::InsufficientTokenAllowance)))
    );

    assert_eq!(f.platform.events().len(), events);
    assert_eq!(f.platform.next_proposal_id(PROJECT), next);
    assert_eq!(f.platform.token_balance(&f.token, &f.alice), 50 * ONE_TOKEN);
}

#[test]
fn test_gitswarm_address_can_be_removed_once() {
    let mut f = Fixture::new();
    assert_eq!(
        f.platform.remove_gitswarm_address(f.alice),
        Err(governance_err(GovernanceError::RestrictedFunction))
    );
    f.platform.remove_gitswarm_address(f.gitswarm).unwrap();
    assert_eq!(
        f.platform.remove_gitswarm_address(f.gitswarm),
        Err(governance_err(GovernanceError::RestrictedFunction))
    );
}

#[test]
fn test_shared_platform_serializes_calls() {
    let f = Fixture::new();
    let shared = f.platform.into_shared();
    let depositors: Vec<Address> = (0..4)
        .map(|i| Address::from_label(&format!("depositor-{i}")))
        .collect();

    let handles: Vec<_> = depositors
        .iter()
        .map(|depositor| {
            let shared = shared.clone();
            let depositor = *depositor;
            thread::spawn(move || {
                let mut platform = shared.lock();
                platform.fund_native(depositor, ONE_TOKEN).unwrap();
                platform.deposit_eth(depositor, PROJECT, ONE_TOKEN).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let platform = shared.lock();
    let expected: Amount = 4 * ONE_TOKEN;
    assert_eq!(platform.treasury_balance(PROJECT, &NATIVE_COIN), expected);
    let deposits = platform
        .events()
        .iter()
        .filter(|event| matches!(event, Event::Deposited { .. }))
        .count();
    assert_eq!(deposits, 4);
}

#[test]
fn test_token_balances_are_live() {
    let f = Fixture::new();
    let token = f.platform.state().chain.token(&f.token).unwrap();
    assert_eq!(token.balance_of(&f.alice), 50 * ONE_TOKEN);
    assert_eq!(token.total_supply(), 150 * ONE_TOKEN);
}

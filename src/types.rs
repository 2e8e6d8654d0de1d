use alloy::primitives::Address;
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The NFT a name should point at. Fixed for the lifetime of a planning session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct NameBindingTarget {
    #[new(into)]
    pub name: String,
    pub nft_contract_address: Address,
    #[new(into)]
    pub token_id: String,
}

/// One of the three writes that bind a name to an NFT, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingStep {
    SetResolver,
    SetAddress,
    SetTokenId,
}

impl BindingStep {
    pub const ALL: [BindingStep; 3] = [
        BindingStep::SetResolver,
        BindingStep::SetAddress,
        BindingStep::SetTokenId,
    ];

    fn index(self) -> usize {
        match self {
            BindingStep::SetResolver => 0,
            BindingStep::SetAddress => 1,
            BindingStep::SetTokenId => 2,
        }
    }
}

impl fmt::Display for BindingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BindingStep::SetResolver => "set resolver",
            BindingStep::SetAddress => "set address",
            BindingStep::SetTokenId => "set token id",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepState {
    AlreadySatisfied,
    Pending,
    InProgress,
    Succeeded,
    Failed,
}

impl StepState {
    /// Whether the user may trigger the step's write right now.
    pub fn is_actionable(self) -> bool {
        matches!(self, StepState::Pending | StepState::Failed)
    }

    pub fn is_done(self) -> bool {
        matches!(self, StepState::AlreadySatisfied | StepState::Succeeded)
    }
}

/// Per-step lifecycle for one planning session.
///
/// Which steps are required is decided once, by the preflight that created the
/// plan. Only the step states move afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingPlan {
    pub target: NameBindingTarget,
    states: [StepState; 3],
}

impl BindingPlan {
    pub(crate) fn from_preflight(target: NameBindingTarget, satisfied: [bool; 3]) -> Self {
        let states = satisfied.map(|done| {
            if done {
                StepState::AlreadySatisfied
            } else {
                StepState::Pending
            }
        });
        Self { target, states }
    }

    pub fn state(&self, step: BindingStep) -> StepState {
        self.states[step.index()]
    }

    pub fn is_required(&self, step: BindingStep) -> bool {
        self.state(step) != StepState::AlreadySatisfied
    }

    pub fn steps(&self) -> impl Iterator<Item = (BindingStep, StepState)> + '_ {
        BindingStep::ALL.into_iter().map(|step| (step, self.state(step)))
    }

    /// Transactions the user still has to send.
    pub fn remaining(&self) -> usize {
        self.states.iter().filter(|state| !state.is_done()).count()
    }

    pub(crate) fn transition(&mut self, step: BindingStep, next: StepState) {
        let current = &mut self.states[step.index()];
        debug_assert!(
            matches!(
                (*current, next),
                (StepState::Pending | StepState::Failed, StepState::InProgress)
                    | (StepState::InProgress, StepState::Succeeded | StepState::Failed)
            ),
            "invalid transition {current:?} -> {next:?}"
        );
        *current = next;
    }
}

impl fmt::Display for BindingPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Set {} to point at this NFT", self.target.name)?;
        writeln!(f, "  NFT address: {}", self.target.nft_contract_address)?;
        writeln!(f, "  Token ID:    {}", self.target.token_id)?;
        for (step, state) in self.steps() {
            writeln!(f, "  [{state:?}] {step}")?;
        }
        write!(f, "{} transaction(s) remaining", self.remaining())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NftKind {
    Erc721,
    Erc1155,
    Unknown,
}

/// What a name resolves to. Filled field by field while the lookup progresses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftDescriptor {
    pub contract_address: Option<Address>,
    pub token_id: Option<String>,
    pub nft_owner: Option<Address>,
    pub name_owner: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionOutcome {
    Found(NftDescriptor),
    NotAnEnsName,
    NameNotFound,
    NoAddressSet,
    NotAnNftContract(NftKind),
    ResolverDoesNotSupportBinding,
    TokenIdNotSet,
    QueryError,
}

impl ResolutionOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, ResolutionOutcome::Found(_))
    }
}

impl fmt::Display for ResolutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResolutionOutcome::Found(_) => "NFT found",
            ResolutionOutcome::NotAnEnsName => "Not a valid ENS name",
            ResolutionOutcome::NameNotFound => "This name does not exist",
            ResolutionOutcome::NoAddressSet => "This name does not point at any address",
            ResolutionOutcome::NotAnNftContract(NftKind::Erc1155) => {
                "This name points at an ERC-1155 contract, which has no single owner"
            }
            ResolutionOutcome::NotAnNftContract(_) => {
                "This name does not point at an NFT contract"
            }
            ResolutionOutcome::ResolverDoesNotSupportBinding => {
                "The resolver for this name cannot point at an NFT"
            }
            ResolutionOutcome::TokenIdNotSet => "No token ID is set for this name",
            ResolutionOutcome::QueryError => "Something went wrong while looking this name up",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchStatus {
    Idle,
    Resolving,
    Resolved(ResolutionOutcome),
}

/// Snapshot of one resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub attempt: u64,
    pub name: String,
    pub status: SearchStatus,
    pub descriptor: NftDescriptor,
    /// Reverse-resolved name of `descriptor.name_owner`, or its checksummed address
    pub name_owner_display: Option<String>,
    pub nft_owner_display: Option<String>,
}

impl Resolution {
    pub(crate) fn new(attempt: u64, name: impl Into<String>, status: SearchStatus) -> Self {
        Self {
            attempt,
            name: name.into(),
            status,
            descriptor: NftDescriptor::default(),
            name_owner_display: None,
            nft_owner_display: None,
        }
    }

    pub fn outcome(&self) -> Option<&ResolutionOutcome> {
        match &self.status {
            SearchStatus::Resolved(outcome) => Some(outcome),
            _ => None,
        }
    }
}

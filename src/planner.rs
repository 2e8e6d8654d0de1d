use crate::{
    config::NftResolverTable,
    consts,
    errors::{GatewayError, PlannerError},
    gateway::ChainQueryGateway,
    name::check_search_input,
    types::{BindingPlan, BindingStep, NameBindingTarget, StepState},
};
use alloy::primitives::{Address, TxHash};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Walks a user through the writes that point a name at an NFT.
///
/// [`open`](Self::open) reads the chain once to find out which of the three
/// writes are already in place. After that the planner never reads the chain
/// again for that session: each step only moves through its own lifecycle as
/// the user triggers it.
pub struct BindingPlanner<G> {
    gateway: G,
    resolvers: NftResolverTable,
    /// Id of the current session. Bumped by every open and close.
    sessions: AtomicU64,
    session: Mutex<Option<Session>>,
}

#[derive(Debug)]
struct Session {
    id: u64,
    plan: BindingPlan,
    /// ERC-2381 resolver writes go to, once one is known
    resolver: Option<Address>,
}

#[derive(Debug, Default)]
struct Preflight {
    resolver: Option<Address>,
    satisfied: [bool; 3],
}

/// What a step needs from its session to send its write.
struct Ticket {
    session: u64,
    target: NameBindingTarget,
    resolver: Option<Address>,
}

impl<G> BindingPlanner<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            resolvers: NftResolverTable::default(),
            sessions: AtomicU64::new(0),
            session: Mutex::new(None),
        }
    }

    pub fn with_resolver_table(mut self, resolvers: NftResolverTable) -> Self {
        self.resolvers = resolvers;
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Current plan, without touching the chain.
    pub async fn plan(&self) -> Option<BindingPlan> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|session| session.plan.clone())
    }

    /// Ends the session. Writes still in flight will not update anything.
    pub async fn close(&self) {
        let mut session = self.session.lock().await;
        self.sessions.fetch_add(1, Ordering::SeqCst);
        *session = None;
    }
}

impl<G: ChainQueryGateway> BindingPlanner<G> {
    /// Starts a session for `target` and works out which steps it needs.
    ///
    /// The target name is normalized first; names that cannot be normalized
    /// fail without touching the chain or the current session.
    #[tracing::instrument(skip_all, fields(name = %target.name))]
    pub async fn open(&self, mut target: NameBindingTarget) -> Result<BindingPlan, PlannerError> {
        target.name = check_search_input(&target.name)?;
        let id = {
            let mut session = self.session.lock().await;
            *session = None;
            self.sessions.fetch_add(1, Ordering::SeqCst) + 1
        };

        let preflight = self.preflight(&target).await;

        let mut session = self.session.lock().await;
        if self.sessions.load(Ordering::SeqCst) != id {
            return Err(PlannerError::SessionClosed);
        }
        let plan = BindingPlan::from_preflight(target, preflight.satisfied);
        tracing::info!(remaining = plan.remaining(), "planning session opened");
        *session = Some(Session {
            id,
            plan: plan.clone(),
            resolver: preflight.resolver,
        });
        Ok(plan)
    }

    async fn preflight(&self, target: &NameBindingTarget) -> Preflight {
        let name = target.name.as_str();
        let resolver = match self.gateway.registry_resolver(name).await {
            Ok(Some(resolver)) => resolver,
            Ok(None) => return Preflight::default(),
            Err(err) => {
                tracing::warn!("resolver lookup failed, assuming none: {err}");
                return Preflight::default();
            }
        };

        let conformant = self
            .gateway
            .supports_interface(resolver, consts::ERC2381_RESOLVER_INTERFACE)
            .await
            .unwrap_or_else(|err| {
                tracing::warn!(%resolver, "supportsInterface failed: {err}");
                false
            });
        if !conformant {
            tracing::debug!(%resolver, "resolver cannot store token ids");
            return Preflight::default();
        }

        let (address, token_id) = tokio::join!(
            self.gateway.address_record(name),
            self.gateway.token_id(resolver, name)
        );
        let address_set = matches!(address, Ok(Some(address)) if address == target.nft_contract_address);
        let token_id_set = matches!(&token_id, Ok(Some(token_id)) if *token_id == target.token_id);

        Preflight {
            resolver: Some(resolver),
            satisfied: [true, address_set, token_id_set],
        }
    }

    /// Points the name at the NFT resolver deployed on the connected chain.
    pub async fn set_resolver(&self) -> Result<StepState, PlannerError> {
        let step = BindingStep::SetResolver;
        let ticket = self.ticket(step).await?;

        let chain_id = self.gateway.chain_id().await?;
        let resolver = self
            .resolvers
            .resolver_for(chain_id)
            .ok_or(PlannerError::UnsupportedChain(chain_id))?;

        self.start(&ticket, step).await?;
        let result = self
            .gateway
            .set_registry_resolver(&ticket.target.name, resolver)
            .await;
        self.complete(&ticket, step, result, Some(resolver)).await
    }

    pub async fn set_address(&self) -> Result<StepState, PlannerError> {
        let step = BindingStep::SetAddress;
        let ticket = self.ticket(step).await?;
        let resolver = ticket.resolver.ok_or(PlannerError::NoConformantResolver)?;

        self.start(&ticket, step).await?;
        let result = self
            .gateway
            .set_address_record(
                resolver,
                &ticket.target.name,
                ticket.target.nft_contract_address,
            )
            .await;
        self.complete(&ticket, step, result, None).await
    }

    pub async fn set_token_id(&self) -> Result<StepState, PlannerError> {
        let step = BindingStep::SetTokenId;
        let ticket = self.ticket(step).await?;
        let resolver = ticket.resolver.ok_or(PlannerError::NoConformantResolver)?;

        self.start(&ticket, step).await?;
        let result = self
            .gateway
            .set_token_id(resolver, &ticket.target.name, &ticket.target.token_id)
            .await;
        self.complete(&ticket, step, result, None).await
    }

    pub async fn run(&self, step: BindingStep) -> Result<StepState, PlannerError> {
        match step {
            BindingStep::SetResolver => self.set_resolver().await,
            BindingStep::SetAddress => self.set_address().await,
            BindingStep::SetTokenId => self.set_token_id().await,
        }
    }

    async fn ticket(&self, step: BindingStep) -> Result<Ticket, PlannerError> {
        let session = self.session.lock().await;
        let session = session.as_ref().ok_or(PlannerError::NoSession)?;
        if !session.plan.state(step).is_actionable() {
            return Err(PlannerError::StepNotEnabled(step));
        }
        Ok(Ticket {
            session: session.id,
            target: session.plan.target.clone(),
            resolver: session.resolver,
        })
    }

    /// Marks `step` in progress, re-checking that nothing changed since the ticket was issued.
    async fn start(&self, ticket: &Ticket, step: BindingStep) -> Result<(), PlannerError> {
        let mut session = self.session.lock().await;
        let session = session
            .as_mut()
            .filter(|session| session.id == ticket.session)
            .ok_or(PlannerError::SessionClosed)?;
        if !session.plan.state(step).is_actionable() {
            return Err(PlannerError::StepNotEnabled(step));
        }
        session.plan.transition(step, StepState::InProgress);
        tracing::info!(%step, name = %ticket.target.name, "sending transaction");
        Ok(())
    }

    async fn complete(
        &self,
        ticket: &Ticket,
        step: BindingStep,
        result: Result<TxHash, GatewayError>,
        resolver: Option<Address>,
    ) -> Result<StepState, PlannerError> {
        let mut session = self.session.lock().await;
        let Some(session) = session
            .as_mut()
            .filter(|session| session.id == ticket.session)
        else {
            tracing::debug!(%step, "discarding result for closed session");
            return Err(PlannerError::SessionClosed);
        };

        let next = match result {
            Ok(tx_hash) => {
                tracing::info!(%step, %tx_hash, "transaction confirmed");
                if resolver.is_some() {
                    session.resolver = resolver;
                }
                StepState::Succeeded
            }
            Err(err) => {
                tracing::warn!(%step, "transaction failed: {err}");
                StepState::Failed
            }
        };
        session.plan.transition(step, next);
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::NameError,
        fake::{ChainState, FakeChain},
    };
    use alloy::primitives::address;
    use pretty_assertions::assert_eq;

    const NAME: &str = "devcon5.oisin.eth";
    const NFT: Address = address!("22C1f6050E56d2876009903609a2cC3fEf83B415");
    const OLD_RESOLVER: Address = address!("231b0Ee14048e9dCcD1d247744d114a4EB5E8E63");
    const LOCAL_RESOLVER: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");

    fn target() -> NameBindingTarget {
        NameBindingTarget::new(NAME, NFT, "42")
    }

    fn planner(state: ChainState) -> BindingPlanner<FakeChain> {
        BindingPlanner::new(FakeChain::new(state))
            .with_resolver_table(NftResolverTable::empty().with_resolver(1337, LOCAL_RESOLVER))
    }

    fn fresh_name() -> ChainState {
        ChainState {
            chain_id: 1337,
            ..Default::default()
        }
    }

    fn bound_name() -> ChainState {
        let mut state = fresh_name();
        state.resolvers.insert(NAME.into(), LOCAL_RESOLVER);
        state
            .interfaces
            .insert(LOCAL_RESOLVER, vec![consts::ERC2381_RESOLVER_INTERFACE]);
        state.address_records.insert(NAME.into(), NFT);
        state.token_ids.insert(NAME.into(), "42".into());
        state
    }

    #[tokio::test]
    async fn test_fully_bound_name_needs_nothing() {
        let planner = planner(bound_name());
        let plan = planner.open(target()).await.unwrap();

        assert_eq!(plan.remaining(), 0);
        for (step, state) in plan.steps() {
            assert_eq!(state, StepState::AlreadySatisfied, "{step}");
            assert!(!plan.is_required(step));
            assert!(matches!(
                planner.run(step).await,
                Err(PlannerError::StepNotEnabled(s)) if s == step
            ));
        }
        assert_eq!(planner.gateway().call_count("chain_id"), 0);
    }

    #[tokio::test]
    async fn test_fresh_name_needs_three_steps_and_is_not_rederived() {
        let planner = planner(fresh_name());
        let plan = planner.open(target()).await.unwrap();
        assert_eq!(plan.remaining(), 3);
        let reads = planner.gateway().call_count("registry_resolver");

        assert_eq!(planner.set_resolver().await.unwrap(), StepState::Succeeded);

        let plan = planner.plan().await.unwrap();
        assert_eq!(plan.state(BindingStep::SetResolver), StepState::Succeeded);
        assert_eq!(plan.state(BindingStep::SetAddress), StepState::Pending);
        assert_eq!(plan.state(BindingStep::SetTokenId), StepState::Pending);
        assert_eq!(plan.remaining(), 2);
        assert!(plan.is_required(BindingStep::SetResolver));
        assert_eq!(planner.gateway().call_count("registry_resolver"), reads);
        assert_eq!(planner.gateway().call_count("supports_interface"), 0);
    }

    #[tokio::test]
    async fn test_all_steps_in_user_order() {
        let planner = planner(fresh_name());
        planner.open(target()).await.unwrap();

        // address and token id need a resolver that can store them
        assert!(matches!(
            planner.set_token_id().await,
            Err(PlannerError::NoConformantResolver)
        ));

        planner.set_resolver().await.unwrap();
        assert_eq!(planner.set_token_id().await.unwrap(), StepState::Succeeded);
        assert_eq!(planner.set_address().await.unwrap(), StepState::Succeeded);
        assert_eq!(planner.plan().await.unwrap().remaining(), 0);

        assert_eq!(
            planner.gateway().calls(),
            vec![
                "registry_resolver",
                "chain_id",
                "set_registry_resolver",
                "set_token_id",
                "set_address_record",
            ]
        );
    }

    #[tokio::test]
    async fn test_conformant_resolver_from_preflight_enables_writes() {
        let mut state = bound_name();
        state.address_records.insert(NAME.into(), OLD_RESOLVER);
        state.token_ids.insert(NAME.into(), "7".into());
        let planner = planner(state);

        let plan = planner.open(target()).await.unwrap();
        assert_eq!(plan.state(BindingStep::SetResolver), StepState::AlreadySatisfied);
        assert_eq!(plan.remaining(), 2);

        assert_eq!(planner.set_address().await.unwrap(), StepState::Succeeded);
        assert_eq!(planner.set_token_id().await.unwrap(), StepState::Succeeded);
        assert_eq!(planner.plan().await.unwrap().remaining(), 0);
    }

    #[tokio::test]
    async fn test_non_conformant_resolver_needs_all_steps() {
        let mut state = bound_name();
        state.interfaces.clear();
        let planner = planner(state);

        let plan = planner.open(target()).await.unwrap();
        assert_eq!(plan.remaining(), 3);
        assert_eq!(planner.gateway().call_count("address_record"), 0);
    }

    #[tokio::test]
    async fn test_address_compare_ignores_case_but_token_id_is_exact() {
        let mut state = bound_name();
        state.token_ids.insert(NAME.into(), "042".into());
        let planner = planner(state);

        let target = NameBindingTarget::new(
            NAME,
            "0x22c1f6050e56d2876009903609a2cc3fef83b415".parse().unwrap(),
            "42",
        );
        let plan = planner.open(target).await.unwrap();
        assert_eq!(plan.state(BindingStep::SetAddress), StepState::AlreadySatisfied);
        assert_eq!(plan.state(BindingStep::SetTokenId), StepState::Pending);
    }

    #[tokio::test]
    async fn test_target_name_is_normalized_before_preflight() {
        let planner = planner(bound_name());
        let plan = planner
            .open(NameBindingTarget::new("DevCon5.Oisin.ETH", NFT, "42"))
            .await
            .unwrap();

        assert_eq!(plan.target.name, NAME);
        assert_eq!(plan.remaining(), 0);
    }

    #[tokio::test]
    async fn test_unnormalizable_target_is_rejected_without_reads() {
        let planner = planner(bound_name());
        planner.open(target()).await.unwrap();
        let reads = planner.gateway().calls().len();

        let result = planner
            .open(NameBindingTarget::new("p\u{0430}ypal.eth", NFT, "42"))
            .await;

        assert!(matches!(
            result,
            Err(PlannerError::InvalidName(NameError::Invalid(_)))
        ));
        assert_eq!(planner.gateway().calls().len(), reads);
        assert_eq!(planner.plan().await.unwrap().target, target());
    }

    #[tokio::test]
    async fn test_failed_write_is_retryable() {
        let mut state = fresh_name();
        state.failing.insert("set_registry_resolver");
        let planner = planner(state);
        planner.open(target()).await.unwrap();

        assert_eq!(planner.set_resolver().await.unwrap(), StepState::Failed);
        assert_eq!(planner.plan().await.unwrap().remaining(), 3);

        planner
            .gateway()
            .update(|state| state.failing.clear());
        assert_eq!(planner.set_resolver().await.unwrap(), StepState::Succeeded);
        assert_eq!(planner.plan().await.unwrap().remaining(), 2);
    }

    #[tokio::test]
    async fn test_unsupported_chain_leaves_step_pending() {
        let mut state = fresh_name();
        state.chain_id = 10;
        let planner = planner(state);
        planner.open(target()).await.unwrap();

        assert!(matches!(
            planner.set_resolver().await,
            Err(PlannerError::UnsupportedChain(10))
        ));
        let plan = planner.plan().await.unwrap();
        assert_eq!(plan.state(BindingStep::SetResolver), StepState::Pending);
        assert_eq!(planner.gateway().call_count("set_registry_resolver"), 0);
    }

    #[tokio::test]
    async fn test_step_in_progress_cannot_be_triggered_twice() {
        let planner = planner(fresh_name());
        planner.open(target()).await.unwrap();
        let hold = planner.gateway().hold("set_registry_resolver");

        let first = planner.set_resolver();
        let second = async {
            hold.entered.notified().await;
            let plan = planner.plan().await.unwrap();
            let second = planner.set_resolver().await;
            hold.release.notify_one();
            (plan, second)
        };
        let (first, (plan, second)) = tokio::join!(first, second);

        assert_eq!(plan.state(BindingStep::SetResolver), StepState::InProgress);
        assert!(matches!(
            second,
            Err(PlannerError::StepNotEnabled(BindingStep::SetResolver))
        ));
        assert_eq!(first.unwrap(), StepState::Succeeded);
    }

    #[tokio::test]
    async fn test_closing_discards_late_write_results() {
        let planner = planner(fresh_name());
        planner.open(target()).await.unwrap();
        let hold = planner.gateway().hold("set_registry_resolver");

        let write = planner.set_resolver();
        let close = async {
            hold.entered.notified().await;
            planner.close().await;
            hold.release.notify_one();
        };
        let (write, ()) = tokio::join!(write, close);

        assert!(matches!(write, Err(PlannerError::SessionClosed)));
        assert_eq!(planner.plan().await, None);
        assert!(matches!(
            planner.set_address().await,
            Err(PlannerError::NoSession)
        ));
    }

    #[tokio::test]
    async fn test_reopening_supersedes_preflight_in_flight() {
        let planner = planner(bound_name());
        let hold = planner.gateway().hold("token_id");

        let first = planner.open(target());
        let second = async {
            hold.entered.notified().await;
            let plan = planner
                .open(NameBindingTarget::new("other.eth", NFT, "1"))
                .await;
            hold.release.notify_one();
            plan
        };
        let (first, second) = tokio::join!(first, second);

        assert!(matches!(first, Err(PlannerError::SessionClosed)));
        let second = second.unwrap();
        assert_eq!(second.remaining(), 3);
        assert_eq!(planner.plan().await, Some(second));
    }
}

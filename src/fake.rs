//! In-memory chain used by the unit tests.

use crate::{errors::GatewayError, gateway::ChainQueryGateway};
use alloy::primitives::{Address, TxHash, B256};
use anyhow::anyhow;
use async_trait::async_trait;
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};
use tokio::sync::Notify;

#[derive(Debug, Clone, Default)]
pub(crate) struct ChainState {
    pub chain_id: u64,
    pub owners: HashMap<String, Address>,
    pub resolvers: HashMap<String, Address>,
    pub interfaces: HashMap<Address, Vec<[u8; 4]>>,
    pub address_records: HashMap<String, Address>,
    pub token_ids: HashMap<String, String>,
    pub nft_owners: HashMap<(Address, String), Address>,
    pub reverse_names: HashMap<Address, String>,
    pub contracts: HashSet<Address>,
    /// Operations that error with a transport-like failure
    pub failing: HashSet<&'static str>,
}

/// Pauses the next call of one operation until released.
#[derive(Clone)]
pub(crate) struct Hold {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

#[derive(Default)]
pub(crate) struct FakeChain {
    state: Mutex<ChainState>,
    calls: Mutex<Vec<&'static str>>,
    holds: Mutex<HashMap<&'static str, Hold>>,
}

impl FakeChain {
    pub fn new(state: ChainState) -> Self {
        Self {
            state: Mutex::new(state),
            ..Default::default()
        }
    }

    pub fn update(&self, f: impl FnOnce(&mut ChainState)) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn hold(&self, op: &'static str) -> Hold {
        let hold = Hold {
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        };
        self.holds.lock().unwrap().insert(op, hold.clone());
        hold
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.calls().iter().filter(|call| **call == op).count()
    }

    fn record(&self, op: &'static str) -> Result<(), GatewayError> {
        self.calls.lock().unwrap().push(op);
        if self.state.lock().unwrap().failing.contains(op) {
            return Err(anyhow!("{op} failed").into());
        }
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&ChainState) -> T) -> T {
        f(&self.state.lock().unwrap())
    }

    async fn pause(&self, op: &'static str) {
        let hold = self.holds.lock().unwrap().remove(op);
        if let Some(hold) = hold {
            hold.entered.notify_one();
            hold.release.notified().await;
        }
    }

    async fn write(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut ChainState),
    ) -> Result<TxHash, GatewayError> {
        self.record(op)?;
        self.pause(op).await;
        self.update(f);
        let n = self.calls.lock().unwrap().len() as u64;
        Ok(B256::left_padding_from(&n.to_be_bytes()))
    }
}

#[async_trait]
impl ChainQueryGateway for FakeChain {
    async fn registry_owner(&self, name: &str) -> Result<Option<Address>, GatewayError> {
        self.record("registry_owner")?;
        let owner = self.read(|s| s.owners.get(name).copied());
        self.pause("registry_owner").await;
        Ok(owner)
    }

    async fn registry_resolver(&self, name: &str) -> Result<Option<Address>, GatewayError> {
        self.record("registry_resolver")?;
        let resolver = self.read(|s| s.resolvers.get(name).copied());
        self.pause("registry_resolver").await;
        Ok(resolver)
    }

    async fn address_record(&self, name: &str) -> Result<Option<Address>, GatewayError> {
        self.record("address_record")?;
        let address = self.read(|s| {
            s.resolvers
                .get(name)
                .and_then(|_| s.address_records.get(name).copied())
        });
        self.pause("address_record").await;
        Ok(address)
    }

    async fn set_registry_resolver(
        &self,
        name: &str,
        resolver: Address,
    ) -> Result<TxHash, GatewayError> {
        self.write("set_registry_resolver", |s| {
            s.resolvers.insert(name.to_string(), resolver);
        })
        .await
    }

    async fn supports_interface(
        &self,
        contract: Address,
        interface_id: [u8; 4],
    ) -> Result<bool, GatewayError> {
        self.record("supports_interface")?;
        let supported = self.read(|s| {
            s.interfaces
                .get(&contract)
                .is_some_and(|ids| ids.contains(&interface_id))
        });
        self.pause("supports_interface").await;
        Ok(supported)
    }

    async fn token_id(
        &self,
        _resolver: Address,
        name: &str,
    ) -> Result<Option<String>, GatewayError> {
        self.record("token_id")?;
        let token_id = self.read(|s| s.token_ids.get(name).cloned());
        self.pause("token_id").await;
        Ok(token_id)
    }

    async fn set_token_id(
        &self,
        _resolver: Address,
        name: &str,
        token_id: &str,
    ) -> Result<TxHash, GatewayError> {
        self.write("set_token_id", |s| {
            s.token_ids.insert(name.to_string(), token_id.to_string());
        })
        .await
    }

    async fn set_address_record(
        &self,
        _resolver: Address,
        name: &str,
        address: Address,
    ) -> Result<TxHash, GatewayError> {
        self.write("set_address_record", |s| {
            s.address_records.insert(name.to_string(), address);
        })
        .await
    }

    async fn owner_of(&self, contract: Address, token_id: &str) -> Result<Address, GatewayError> {
        self.record("owner_of")?;
        let owner = self.read(|s| {
            s.nft_owners
                .get(&(contract, token_id.to_string()))
                .copied()
        });
        self.pause("owner_of").await;
        owner.ok_or_else(|| anyhow!("ownerOf reverted").into())
    }

    async fn reverse_resolve(&self, address: Address) -> Result<Option<String>, GatewayError> {
        self.record("reverse_resolve")?;
        let name = self.read(|s| s.reverse_names.get(&address).cloned());
        self.pause("reverse_resolve").await;
        Ok(name)
    }

    async fn record_exists(&self, name: &str) -> Result<bool, GatewayError> {
        self.record("record_exists")?;
        Ok(self.read(|s| s.owners.contains_key(name)))
    }

    async fn contract_exists(&self, address: Address) -> Result<bool, GatewayError> {
        self.record("contract_exists")?;
        Ok(self.read(|s| s.contracts.contains(&address)))
    }

    async fn token_exists(&self, contract: Address, token_id: &str) -> Result<bool, GatewayError> {
        self.record("token_exists")?;
        Ok(self.read(|s| {
            s.nft_owners
                .contains_key(&(contract, token_id.to_string()))
        }))
    }

    async fn chain_id(&self) -> Result<u64, GatewayError> {
        self.record("chain_id")?;
        Ok(self.read(|s| s.chain_id))
    }
}

//! Native modules: built-in contracts implemented in host code.
//!
//! Each module is a pair of an action handler and an ABI supplier, routed by
//! the module's well-known regid. The routing tables are filled once when
//! the registry is built and never change afterwards; every controller gets
//! the registry by reference, so independent engines never share state.

pub mod bank;
pub mod commons;
pub mod setcode;
pub mod voting;

use std::collections::HashMap;
use std::fmt;

use anyhow::{bail, Result as AnyResult};

use crate::runtime::context::ExecutionContext;
use crate::types::{Name, Regid};
use crate::utils::errors::Result;

pub const SETCODE_ID: Regid = Regid::new(0, 100);
pub const BANK_ID: Regid = Regid::new(0, 800);
pub const VOTING_ID: Regid = Regid::new(0, 900);

pub type ActionHandler = fn(&mut ExecutionContext<'_, '_>, Name) -> Result<()>;
/// Returns the module's ABI in packed binary form.
pub type AbiSupplier = fn() -> Vec<u8>;

/// Routing table keyed by contract id; an id can be bound only once.
#[derive(Clone)]
pub struct Router<H> {
    routes: HashMap<Regid, H>,
}

impl<H: Copy> Router<H> {
    fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Returns false, leaving the existing route, if `id` is already bound.
    fn insert(&mut self, id: Regid, route: H) -> bool {
        if self.routes.contains_key(&id) {
            return false;
        }
        self.routes.insert(id, route);
        true
    }

    pub fn get(&self, id: Regid) -> Option<H> {
        self.routes.get(&id).copied()
    }

    pub fn contains(&self, id: Regid) -> bool {
        self.routes.contains_key(&id)
    }
}

#[derive(Clone)]
pub struct NativeRegistry {
    abi_router: Router<AbiSupplier>,
    action_router: Router<ActionHandler>,
}

impl NativeRegistry {
    pub fn builder() -> NativeRegistryBuilder {
        NativeRegistryBuilder {
            abi_router: Router::new(),
            action_router: Router::new(),
        }
    }

    /// Set-code, bank and voting modules.
    pub fn with_builtin_modules() -> Self {
        let mut abi_router = Router::new();
        let mut action_router = Router::new();
        for (id, handler, abi) in [
            (SETCODE_ID, setcode::dispatch as ActionHandler, setcode::abi as AbiSupplier),
            (BANK_ID, bank::dispatch, bank::abi),
            (VOTING_ID, voting::dispatch, voting::abi),
        ] {
            action_router.insert(id, handler);
            abi_router.insert(id, abi);
        }
        Self { abi_router, action_router }
    }

    pub fn handler(&self, id: Regid) -> Option<ActionHandler> {
        self.action_router.get(id)
    }

    pub fn abi(&self, id: Regid) -> Option<Vec<u8>> {
        self.abi_router.get(id).map(|supply| supply())
    }

    pub fn is_native(&self, id: Regid) -> bool {
        self.action_router.contains(id)
    }

    pub fn ids(&self) -> Vec<Regid> {
        let mut ids: Vec<Regid> = self.action_router.routes.keys().copied().collect();
        ids.sort();
        ids
    }
}

impl fmt::Debug for NativeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeRegistry").field("modules", &self.ids()).finish()
    }
}

pub struct NativeRegistryBuilder {
    abi_router: Router<AbiSupplier>,
    action_router: Router<ActionHandler>,
}

impl NativeRegistryBuilder {
    pub fn register(mut self, id: Regid, handler: ActionHandler, abi: AbiSupplier) -> AnyResult<Self> {
        if !self.action_router.insert(id, handler) || !self.abi_router.insert(id, abi) {
            bail!("native module {} registered twice", id);
        }
        Ok(self)
    }

    pub fn build(self) -> NativeRegistry {
        NativeRegistry {
            abi_router: self.abi_router,
            action_router: self.action_router,
        }
    }
}

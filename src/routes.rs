//! Route registration that remembers what it registered.
//!
//! axum routers cannot be enumerated after the fact, so every route goes
//! through [`RouteRegistry`], which records a `(path, method)` descriptor
//! next to the `Router::route` call. The resulting [`RouteInventory`] is the
//! set of permissions the server can ever check.

use crate::permissions::{PermissionSet, RouteDescriptor};
use axum::handler::Handler;
use axum::routing::{self, MethodRouter};
use axum::Router;
use serde::Serialize;

/// Path of the inventory endpoint, mounted after the registry is closed.
pub const INTROSPECTION_PATH: &str = "/routes";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RouteInventory(PermissionSet);

impl RouteInventory {
    /// Adds the introspection endpoint itself, which is registered after the
    /// registry has been turned into a router.
    pub fn with_introspection(mut self) -> Self {
        self.0.push(RouteDescriptor::new(INTROSPECTION_PATH, "GET"));
        self
    }

    pub fn permissions(&self) -> &PermissionSet {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<PermissionSet> for RouteInventory {
    fn from(value: PermissionSet) -> Self {
        Self(value)
    }
}

pub struct RouteRegistry<S> {
    router: Router<S>,
    inventory: PermissionSet,
}

impl<S> Default for RouteRegistry<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> RouteRegistry<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            inventory: PermissionSet::new(),
        }
    }

    fn add(mut self, path: &str, method: &str, method_router: MethodRouter<S>) -> Self {
        self.router = self.router.route(path, method_router);
        self.inventory.push(RouteDescriptor::new(path, method));
        self
    }

    pub fn get<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add(path, "GET", routing::get(handler))
    }

    pub fn post<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add(path, "POST", routing::post(handler))
    }

    pub fn put<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add(path, "PUT", routing::put(handler))
    }

    pub fn patch<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add(path, "PATCH", routing::patch(handler))
    }

    pub fn delete<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add(path, "DELETE", routing::delete(handler))
    }

    pub fn into_parts(self) -> (Router<S>, RouteInventory) {
        (self.router, RouteInventory(self.inventory))
    }
}

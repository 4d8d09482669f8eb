//! Render driver: re-guard the static route tree for each render.

use serde::Serialize;

use routeguard_auth::{
    AuthContext, GuardReport, MatchPolicy, RouteNode, RouteTree, transform_with_report,
};

use crate::PermissionState;

/// The output of one render: the guarded tree plus what was decided.
#[derive(Debug, Clone, Serialize)]
pub struct Render<F> {
    pub routes: Vec<RouteNode<F>>,
    pub report: GuardReport,
    /// Permission generation this render was computed from.
    pub generation: u64,
    pub is_validating: bool,
}

/// Owns the static route tree and turns permission state into router input.
#[derive(Debug, Clone)]
pub struct RouteHost<E> {
    routes: RouteTree<E>,
    policy: MatchPolicy,
}

impl<E> RouteHost<E> {
    pub fn new(routes: RouteTree<E>) -> Self {
        Self {
            routes,
            policy: MatchPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn routes(&self) -> &RouteTree<E> {
        &self.routes
    }

    /// Guard the route tree for one render.
    ///
    /// - `view` turns an allowed route's element into output.
    /// - `no_auth` builds the fallback for a denied route.
    /// - `loading` replaces allowed content while permissions are revalidating,
    ///   so pending state never feeds into the allow/deny decision.
    pub fn render<F, V, N, L>(
        &self,
        state: &PermissionState,
        mut view: V,
        no_auth: N,
        loading: L,
    ) -> Render<F>
    where
        V: FnMut(&E) -> F,
        N: FnMut(&RouteNode<E>) -> F,
        L: Fn() -> F,
    {
        let auth = state.auth();
        let validating = state.is_validating;

        let mut ctx = AuthContext::new(&self.routes, &auth, no_auth, |element: Option<&E>| {
            if validating {
                Some(loading())
            } else {
                element.map(&mut view)
            }
        })
        .with_policy(self.policy);

        let (routes, report) = transform_with_report(&self.routes, &mut ctx);
        tracing::debug!(
            generation = state.generation,
            validating,
            allowed = report.allowed(),
            denied = report.denied(),
            "routes rendered"
        );

        Render {
            routes,
            report,
            generation: state.generation,
            is_validating: validating,
        }
    }
}

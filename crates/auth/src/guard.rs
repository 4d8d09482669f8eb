//! The authorization-aware route tree transform.
//!
//! Given the static route tree, the permissions currently held, a fallback
//! factory for denied routes and a wrapper for allowed ones, produce a new tree
//! of identical shape for the downstream router.
//!
//! Every node is decided on its own requirements. A denied parent does not
//! hide its children: the router may deep-link straight to a child path, so
//! an unrestricted child stays reachable under a denied layout.

use serde::Serialize;

use routeguard_core::{RouteNode, join_path};

use crate::{Decision, MatchPolicy, PermissionSet, decide};

/// Per-render input to the transform.
///
/// - `no_auth_element` is called exactly once per denied node, with that node.
/// - `render` is called exactly once per allowed node, with its original
///   element. Hosts use it to overlay a pending-state placeholder while the
///   permission set is being revalidated.
pub struct AuthContext<'a, E, N, R> {
    pub routers: &'a [RouteNode<E>],
    pub auth: &'a PermissionSet,
    pub no_auth_element: N,
    pub render: R,
    pub policy: MatchPolicy,
}

impl<'a, E, N, R> AuthContext<'a, E, N, R> {
    /// Context with the default any-of policy.
    pub fn new<F>(
        routers: &'a [RouteNode<E>],
        auth: &'a PermissionSet,
        no_auth_element: N,
        render: R,
    ) -> Self
    where
        N: FnMut(&RouteNode<E>) -> F,
        R: FnMut(Option<&E>) -> Option<F>,
    {
        Self {
            routers,
            auth,
            no_auth_element,
            render,
            policy: MatchPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// One line of a [`GuardReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    /// Path resolved against ancestors (see [`join_path`]).
    pub full_path: String,
    pub depth: usize,
    pub decision: Decision,
}

/// Pre-order record of every decision made by one transform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GuardReport {
    pub entries: Vec<ReportEntry>,
}

impl GuardReport {
    pub fn allowed(&self) -> usize {
        self.entries.iter().filter(|e| e.decision.is_allowed()).count()
    }

    pub fn denied(&self) -> usize {
        self.entries.len() - self.allowed()
    }

    /// Decision for the first entry with the given full path.
    pub fn decision_for(&self, full_path: &str) -> Option<Decision> {
        self.entries
            .iter()
            .find(|e| e.full_path == full_path)
            .map(|e| e.decision)
    }
}

/// Transform `ctx.routers`.
pub fn guard_routes<E, F, N, R>(ctx: &mut AuthContext<'_, E, N, R>) -> Vec<RouteNode<F>>
where
    N: FnMut(&RouteNode<E>) -> F,
    R: FnMut(Option<&E>) -> Option<F>,
{
    let routers = ctx.routers;
    transform(routers, ctx)
}

/// Transform an arbitrary forest with the callbacks and permissions of `ctx`.
///
/// The input is never mutated. Output order, length and nesting match the
/// input exactly; `path`, `required_permissions` and metadata are copied
/// through unchanged.
pub fn transform<E, F, N, R>(
    nodes: &[RouteNode<E>],
    ctx: &mut AuthContext<'_, E, N, R>,
) -> Vec<RouteNode<F>>
where
    N: FnMut(&RouteNode<E>) -> F,
    R: FnMut(Option<&E>) -> Option<F>,
{
    let mut walk = Walk::default();
    let out = guard_forest(nodes, ctx, &mut walk);
    tracing::debug!(
        allowed = walk.allowed,
        denied = walk.denied,
        policy = %ctx.policy,
        "route tree guarded"
    );
    out
}

/// Same as [`transform`], also returning every decision made.
pub fn transform_with_report<E, F, N, R>(
    nodes: &[RouteNode<E>],
    ctx: &mut AuthContext<'_, E, N, R>,
) -> (Vec<RouteNode<F>>, GuardReport)
where
    N: FnMut(&RouteNode<E>) -> F,
    R: FnMut(Option<&E>) -> Option<F>,
{
    let mut walk = Walk {
        entries: Some(Vec::new()),
        ..Walk::default()
    };
    let out = guard_forest(nodes, ctx, &mut walk);
    tracing::debug!(
        allowed = walk.allowed,
        denied = walk.denied,
        policy = %ctx.policy,
        "route tree guarded"
    );
    let report = GuardReport {
        entries: walk.entries.unwrap_or_default(),
    };
    (out, report)
}

#[derive(Default)]
struct Walk {
    allowed: usize,
    denied: usize,
    entries: Option<Vec<ReportEntry>>,
}

/// A node whose children are still being transformed.
struct Frame<'n, E, F> {
    source: &'n RouteNode<E>,
    pending: std::slice::Iter<'n, RouteNode<E>>,
    full_path: String,
    depth: usize,
    element: Option<F>,
    children: Vec<RouteNode<F>>,
}

impl<E, F> Frame<'_, E, F> {
    fn finish(self) -> RouteNode<F> {
        RouteNode {
            path: self.source.path.clone(),
            element: self.element,
            required_permissions: self.source.required_permissions.clone(),
            children: self.children,
            meta: self.source.meta.clone(),
        }
    }
}

/// Pre-order transform with an explicit stack, so nesting depth is bounded
/// by memory rather than by the call stack.
fn guard_forest<'n, E, F, N, R>(
    nodes: &'n [RouteNode<E>],
    ctx: &mut AuthContext<'_, E, N, R>,
    walk: &mut Walk,
) -> Vec<RouteNode<F>>
where
    N: FnMut(&RouteNode<E>) -> F,
    R: FnMut(Option<&E>) -> Option<F>,
{
    let mut out = Vec::with_capacity(nodes.len());
    for root in nodes {
        let full_path = join_path("", root.path.as_deref());
        let mut stack = vec![enter(root, full_path, 0, ctx, walk)];

        while let Some(mut frame) = stack.pop() {
            if let Some(child) = frame.pending.next() {
                let full_path = join_path(&frame.full_path, child.path.as_deref());
                let depth = frame.depth + 1;
                stack.push(frame);
                stack.push(enter(child, full_path, depth, ctx, walk));
                continue;
            }

            let node = frame.finish();
            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => out.push(node),
            }
        }
    }
    out
}

/// Decide one node and produce its element. Children are decided later on
/// their own requirements, regardless of this decision.
fn enter<'n, E, F, N, R>(
    node: &'n RouteNode<E>,
    full_path: String,
    depth: usize,
    ctx: &mut AuthContext<'_, E, N, R>,
    walk: &mut Walk,
) -> Frame<'n, E, F>
where
    N: FnMut(&RouteNode<E>) -> F,
    R: FnMut(Option<&E>) -> Option<F>,
{
    let decision = decide(node, ctx.auth, ctx.policy);

    let element = match decision {
        Decision::Allowed => {
            walk.allowed += 1;
            (ctx.render)(node.element.as_ref())
        }
        Decision::Denied => {
            walk.denied += 1;
            tracing::trace!(path = %full_path, "route denied");
            Some((ctx.no_auth_element)(node))
        }
    };

    if let Some(entries) = walk.entries.as_mut() {
        entries.push(ReportEntry {
            full_path: full_path.clone(),
            depth,
            decision,
        });
    }

    Frame {
        source: node,
        pending: node.children.iter(),
        full_path,
        depth,
        element,
        children: Vec::with_capacity(node.children.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(names: &[&'static str]) -> PermissionSet {
        names.iter().copied().collect()
    }

    fn admin_tree() -> Vec<RouteNode<&'static str>> {
        vec![
            RouteNode::new("/admin")
                .with_element("AdminPage")
                .require("admin")
                .with_child(RouteNode::new("users").with_element("UsersPage")),
        ]
    }

    #[test]
    fn denied_parent_keeps_allowed_child() {
        let tree = admin_tree();
        let auth = held(&[]);
        let mut ctx = AuthContext::new(
            &tree,
            &auth,
            |node| format!("403:{}", node.path.as_deref().unwrap_or("")),
            |el| el.map(|e| format!("render:{e}")),
        );

        let out = guard_routes(&mut ctx);
        assert_eq!(out[0].element.as_deref(), Some("403:/admin"));
        assert_eq!(out[0].children[0].element.as_deref(), Some("render:UsersPage"));
    }

    #[test]
    fn report_lists_full_paths_in_pre_order() {
        let tree = admin_tree();
        let auth = held(&[]);
        let mut ctx = AuthContext::new(&tree, &auth, |_| "403", |el| el.copied());

        let (_, report) = transform_with_report(&tree, &mut ctx);
        assert_eq!(
            report.entries,
            vec![
                ReportEntry {
                    full_path: "/admin".into(),
                    depth: 0,
                    decision: Decision::Denied,
                },
                ReportEntry {
                    full_path: "/admin/users".into(),
                    depth: 1,
                    decision: Decision::Allowed,
                },
            ]
        );
        assert_eq!(report.allowed(), 1);
        assert_eq!(report.denied(), 1);
        assert_eq!(report.decision_for("/admin/users"), Some(Decision::Allowed));
        assert_eq!(report.decision_for("/missing"), None);
    }

    #[test]
    fn render_may_drop_or_supply_elements() {
        let tree: Vec<RouteNode<&'static str>> =
            vec![RouteNode::layout().with_child(RouteNode::new("a").with_element("A"))];
        let auth = held(&[]);
        let mut ctx = AuthContext::new(&tree, &auth, |_| "403", |_| Some("Loading"));

        let out = guard_routes(&mut ctx);
        assert_eq!(out[0].element, Some("Loading"));
        assert_eq!(out[0].children[0].element, Some("Loading"));
    }

    #[test]
    fn callbacks_run_in_pre_order() {
        let tree = vec![
            RouteNode::new("a")
                .with_element("A")
                .with_child(
                    RouteNode::new("b")
                        .require("admin")
                        .with_element("B")
                        .with_child(RouteNode::new("c").with_element("C")),
                )
                .with_child(RouteNode::new("d").with_element("D")),
            RouteNode::new("e").with_element("E"),
        ];
        let auth = held(&[]);
        let seen = std::cell::RefCell::new(Vec::new());
        let mut ctx = AuthContext::new(
            &tree,
            &auth,
            |node| {
                seen.borrow_mut().push(format!("deny:{}", node.element.unwrap_or("")));
            },
            |el| {
                seen.borrow_mut().push(format!("allow:{}", el.copied().unwrap_or("")));
                Some(())
            },
        );

        let (_, report) = transform_with_report(&tree, &mut ctx);
        drop(ctx);
        assert_eq!(
            seen.into_inner(),
            vec!["allow:A", "deny:B", "allow:C", "allow:D", "allow:E"]
        );
        let paths: Vec<_> = report.entries.iter().map(|e| e.full_path.as_str()).collect();
        assert_eq!(paths, vec!["/a", "/a/b", "/a/b/c", "/a/d", "/e"]);
    }

    #[test]
    fn deep_chain_keeps_depth_and_nesting() {
        const DEPTH: usize = 2_000;
        let mut node = RouteNode::new("leaf").with_element("Leaf");
        for level in (0..DEPTH - 1).rev() {
            let mut parent = RouteNode::new(format!("n{level}"));
            if level % 2 == 0 {
                parent = parent.require("admin");
            }
            node = parent.with_child(node);
        }
        let tree = vec![node];
        let auth = held(&[]);
        let mut ctx = AuthContext::new(&tree, &auth, |_| "403", |el| el.copied());

        let (out, report) = transform_with_report(&tree, &mut ctx);
        assert_eq!(report.entries.len(), DEPTH);
        assert_eq!(report.denied(), DEPTH / 2);
        assert_eq!(report.entries.last().map(|e| e.depth), Some(DEPTH - 1));

        let mut leaf = &out[0];
        while let Some(child) = leaf.children.first() {
            leaf = child;
        }
        assert_eq!(leaf.path.as_deref(), Some("leaf"));
        assert_eq!(leaf.element, Some("Leaf"));
    }
}

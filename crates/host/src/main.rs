//! Demo shell: guard a route tree before and after permissions resolve.
//!
//! Renders once with permissions still pending, fetches from a slow source
//! that grants `admin`, then renders again. Both trees are printed as JSON.

use std::time::Duration;

use anyhow::Context;
use serde::Serialize;

use routeguard_auth::{PermissionSet, RouteNode, RouteTree};
use routeguard_host::{
    DelayedSource, HostConfig, PermissionStore, RevalidateTrigger, RouteHost, StaticSource,
};

/// What the downstream router would mount for each route.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
enum View {
    Page(String),
    NotAuthorized,
    Loading,
}

fn builtin_routes() -> RouteTree<String> {
    RouteTree::new(vec![
        RouteNode::new("/")
            .with_element("Home".to_string())
            .with_child(RouteNode::new("about").with_element("About".to_string())),
        RouteNode::new("/admin")
            .require("admin")
            .with_element("AdminPage".to_string())
            .with_meta("errorElement", "ErrorPage")
            .with_child(RouteNode::new("users").with_element("UsersPage".to_string()))
            .with_child(
                RouteNode::new("audit")
                    .require("auditor")
                    .with_element("AuditPage".to_string()),
            ),
    ])
}

fn load_routes(config: &HostConfig) -> anyhow::Result<RouteTree<String>> {
    let Some(path) = &config.routes_path else {
        return Ok(builtin_routes());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read route tree from {}", path.display()))?;
    RouteTree::from_json_str(&text)
        .with_context(|| format!("invalid route tree in {}", path.display()))
}

fn render_json(
    host: &RouteHost<String>,
    state: &routeguard_host::PermissionState,
) -> anyhow::Result<String> {
    let render = host.render(
        state,
        |name| View::Page(name.clone()),
        |_| View::NotAuthorized,
        || View::Loading,
    );
    Ok(serde_json::to_string_pretty(&render)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = HostConfig::from_env()?;
    routeguard_observability::init_with(config.log_format);

    let host = RouteHost::new(load_routes(&config)?);
    tracing::info!(routes = host.routes().node_count(), "route tree ready");

    let granted: PermissionSet = ["admin"].into_iter().collect();
    let source = DelayedSource::new(StaticSource::granting(granted), Duration::from_secs(1));
    let store = PermissionStore::new(source, config.revalidate, config.fetch_timeout);

    // First paint: nothing resolved yet, fetch about to start.
    let mut pending = store.snapshot().await;
    pending.is_validating = true;
    println!("{}", render_json(&host, &pending)?);

    // Window focus does not refetch under the default policy.
    store.trigger(RevalidateTrigger::Focus).await;

    if let Some(outcome) = store.trigger(RevalidateTrigger::Mount).await {
        tracing::info!(?outcome, "initial permission fetch finished");
    }
    println!("{}", render_json(&host, &store.snapshot().await)?);

    Ok(())
}

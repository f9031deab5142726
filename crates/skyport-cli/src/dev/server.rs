use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{Method as HttpMethod, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use colored::Colorize;
use serde_json::json;
use skyport::watcher::DEFAULT_DEBOUNCE;
use skyport::{DevService, Dispatch, FunctionsWatcher};
use skyport_router::Method;
use tower_http::trace::TraceLayer;

/// Path of the built-in route listing
pub const ROUTES_PATH: &str = "/__skyport/routes";

#[derive(Clone)]
struct AppState {
    service: DevService,
}

/// Router serving every request through the dev routing table
pub fn app(service: DevService) -> Router {
    Router::new()
        .route(ROUTES_PATH, get(routes_handler))
        .fallback(dispatch_handler)
        .with_state(AppState { service })
        .layer(TraceLayer::new_for_http())
}

/// Start the development server
pub async fn start_dev_server(service: DevService) -> Result<()> {
    println!("{}", "🚀 Starting Skyport development server...".green().bold());
    println!();

    let config = service.config().clone();
    println!("  {} Routes: {}", "📂".cyan(), config.routes_root(service.root()).display());
    println!(
        "  {} Subscribers: {}",
        "📦".cyan(),
        config.subscribers_root(service.root()).display()
    );

    let summary = service.refresh().await?;
    println!(
        "  {} Loaded {} handlers, {} subscribers",
        "✓".green(),
        summary.routes,
        summary.subscribers
    );
    for diagnostic in &summary.diagnostics {
        println!("  {} Skipped {}", "⚠".yellow(), diagnostic);
    }

    let routes = service.routes().await;
    if !routes.is_empty() {
        println!();
        println!("{}", "Routes:".cyan().bold());
        for (key, target) in &routes {
            println!("  {} {} ({})", "→".green(), key, target.file.display());
        }
    }

    // Kept alive for as long as the server runs
    let _watcher = if config.dev.hot_reload {
        Some(FunctionsWatcher::start(service.clone(), DEFAULT_DEBOUNCE)?)
    } else {
        None
    };

    let addr = format!("{}:{}", config.dev.host, config.dev.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    println!();
    println!("{}", "✅ Server ready!".green().bold());
    println!();
    println!("  {} {}", "URL:".cyan(), format!("http://{}", addr).bold());
    println!("  {} {}", "Table:".cyan(), format!("http://{}{}", addr, ROUTES_PATH).bold());
    if config.dev.hot_reload {
        println!("  {} Watching functions for changes", "🔥".yellow());
    }
    println!();
    println!("  {} Press Ctrl+C to stop", "ℹ".cyan());
    println!();

    axum::serve(listener, app(service)).await?;

    Ok(())
}

async fn dispatch_handler(
    State(state): State<AppState>,
    method: HttpMethod,
    uri: Uri,
) -> Response {
    let Ok(requested) = method.as_str().parse::<Method>() else {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            Json(json!({ "error": "unsupported method", "method": method.as_str() })),
        )
            .into_response();
    };

    match state.service.dispatch(requested, uri.path()).await {
        Dispatch::Matched { target, params } => Json(json!({
            "route": target.route,
            "method": target.method,
            "file": target.file,
            "export": target.export,
            "params": params,
        }))
        .into_response(),
        Dispatch::NotFound { method, path } => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "not found", "method": method, "path": path })),
        )
            .into_response(),
    }
}

async fn routes_handler(State(state): State<AppState>) -> Response {
    let routes: Vec<_> = state
        .service
        .routes()
        .await
        .into_iter()
        .map(|(key, target)| json!({ "key": key, "target": target }))
        .collect();
    let subscribers = state.service.subscribers().await;

    Json(json!({ "routes": routes, "subscribers": subscribers })).into_response()
}

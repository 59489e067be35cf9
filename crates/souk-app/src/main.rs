// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Souk: marketplace catalog core.
//
// Entry point.  Initialises logging and services, performs the first-paint
// load, then keeps the marketplace state fresh from product change events
// until interrupted.

mod services;
mod state;

use std::process::ExitCode;

use souk_catalog::pricing::record_discount;
use tracing::{error, info};

use services::app_services::AppServices;
use state::MarketplaceState;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Souk starting");

    let svc = match AppServices::init() {
        Ok(svc) => svc,
        Err(e) => {
            error!(error = %e, "service initialisation failed");
            return ExitCode::FAILURE;
        }
    };

    let mut state = MarketplaceState::default();
    refresh(&svc, &mut state).await;
    summarise_listings(&svc).await;

    let (mut handle, changed) = match svc.watch_products() {
        Ok(Some(watch)) => watch,
        Ok(None) => {
            info!("store has no change feed; exiting after initial load");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            error!(error = %e, "could not subscribe to product changes");
            return ExitCode::FAILURE;
        }
    };

    loop {
        tokio::select! {
            _ = changed.notified() => refresh(&svc, &mut state).await,
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.unsubscribe().await;
    info!("Souk stopped");
    ExitCode::SUCCESS
}

/// Recompose the first-paint feeds and apply them if still current.
async fn refresh(svc: &AppServices, state: &mut MarketplaceState) {
    let token = state.begin_refresh();
    let load = svc.initial_load().await;
    if state.apply(token, load) {
        info!(
            new_arrivals = state.new_arrivals.len(),
            supplier = state.supplier.len(),
            categories = state.categories.len(),
            "marketplace refreshed"
        );
    }
}

async fn summarise_listings(svc: &AppServices) {
    let promo = svc.promo_products().await;
    let best = promo.iter().filter_map(|r| record_discount(&r.record)).max();
    info!(count = promo.len(), best_discount = ?best, "promotions loaded");

    let listing = svc.all_products("").await;
    for category in svc.taxonomy().categories() {
        let count = listing
            .iter()
            .filter(|r| svc.taxonomy().matches(&r.record.category, category.id()))
            .count();
        info!(category = category.id(), count, "listing by category");
    }

    let services = svc.freelance_services(None).await;
    let categories = svc.service_categories().await;
    info!(
        services = services.len(),
        categories = categories.len(),
        "freelance services loaded"
    );
}

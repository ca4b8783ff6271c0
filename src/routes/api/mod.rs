pub mod auth;
pub mod candidatures;
pub mod external_offers;
pub mod imports;
pub mod offers;
pub mod technologies;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};

use crate::auth::{require_admin, require_session};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/external-offers", get(external_offers::search))
        .route("/offers", get(offers::list))
        .route("/offers/{id}", get(offers::get))
        .route("/technologies", get(technologies::list))
        .route("/technologies/trends", get(technologies::trends))
        .route("/technologies/stats", get(technologies::stats))
        .route("/technologies/{id}", get(technologies::get));

    let session = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/offers", post(offers::create))
        .route("/offers/{id}", axum::routing::put(offers::update).delete(offers::delete))
        .route("/technologies", post(technologies::create))
        .route(
            "/technologies/{id}",
            axum::routing::put(technologies::update).delete(technologies::delete),
        )
        .route("/tech-extraction", post(technologies::extract))
        .route(
            "/candidatures",
            get(candidatures::list).post(candidatures::create),
        )
        .route(
            "/candidatures/{id}",
            get(candidatures::get)
                .put(candidatures::update)
                .delete(candidatures::delete),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    // require_session runs first so the role check sees the user.
    let admin = Router::new()
        .route("/imports/all", post(imports::import_all))
        .route("/imports/runs", get(imports::runs))
        .route("/imports/{source}", post(imports::import_source))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new().nest("/api", public.merge(session).merge(admin).with_state(state))
}

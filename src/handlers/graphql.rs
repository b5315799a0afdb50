use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{extract::State, routing::post, Extension, Router};

use crate::auth::AuthUser;
use crate::handlers::AppState;

/// GraphQL endpoint. The state and the authenticated user ride along as
/// per-request context data.
pub async fn graphql_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let request = req.into_inner().data(state.clone()).data(auth_user);
    state.schema.execute(request).await.into()
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/graphql", post(graphql_handler))
}

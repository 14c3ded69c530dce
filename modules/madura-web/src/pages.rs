use std::sync::Arc;

use axum::{
    extract::{Form, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use madura_client::{ClientError, MaduraClient};
use madura_common::{filter_lotes, filter_maduradores, Lote, MaduraError};

use crate::forms::{LoteForm, MaduradorForm};
use crate::settings::{api_base_cookie, api_base_override, validate_api_base};
use crate::state::AppState;
use crate::templates::*;
use crate::views::*;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub qm: String,
    pub ql: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SettingsForm {
    pub api_base: String,
}

async fn page_context(state: &AppState, client: &MaduraClient) -> PageContext {
    PageContext {
        status_label: state.status_for(client).await.label(),
        api_base: client.base_url().to_string(),
    }
}

fn client_failure(ctx: &PageContext, title: &str, err: &ClientError) -> Response {
    let status = match err {
        ClientError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
    };
    (status, Html(render_message(ctx, title, &err.user_message()))).into_response()
}

fn validation_message(err: &MaduraError) -> String {
    match err {
        MaduraError::Validation(message) => message.clone(),
        other => other.to_string(),
    }
}

/// Fresh batch list for a form, falling back to the last loaded one.
async fn batches_for_form(state: &AppState, client: &MaduraClient) -> Vec<Lote> {
    match client.find_all_lotes().await {
        Ok(lotes) => {
            state.remember_lotes(client.base_url(), lotes.clone()).await;
            lotes
        }
        Err(e) => {
            warn!(error = %e, "Failed to load batches for form, using cached list");
            state.cached_lotes(client.base_url()).await
        }
    }
}

// --- List ---

pub async fn index(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Html<String> {
    let client = state.client(&headers);
    let (status, maduradores, lotes) = tokio::join!(
        state.status_for(&client),
        client.find_all_maduradores(),
        client.find_all_lotes(),
    );
    let ctx = PageContext {
        status_label: status.label(),
        api_base: client.base_url().to_string(),
    };

    let mut cache = state.cache.write().await;
    let view = cache.entry(client.base_url().to_string()).or_default();
    let lotes_error = match lotes {
        Ok(list) => {
            view.replace_lotes(list);
            None
        }
        Err(e) => {
            warn!(error = %e, "Failed to load batches");
            Some(e.user_message())
        }
    };
    let maduradores_error = match maduradores {
        Ok(list) => {
            view.replace_maduradores(list);
            None
        }
        Err(e) => {
            warn!(error = %e, "Failed to load fermenters");
            Some(e.user_message())
        }
    };

    let label_lotes = view.cached_lotes();
    let mad_listing = match maduradores_error {
        Some(message) => Listing::Failed(message),
        None => {
            let hits = filter_maduradores(
                &query.qm,
                &view.maduradores,
                label_lotes.unwrap_or_default(),
            );
            madurador_listing(&hits, view.maduradores.len(), label_lotes)
        }
    };
    let lote_listing = match lotes_error {
        Some(message) => Listing::Failed(message),
        None => {
            let hits = filter_lotes(&query.ql, &view.lotes);
            lote_listing(&hits, view.lotes.len())
        }
    };

    Html(render_index(
        &ctx,
        &mad_listing,
        &lote_listing,
        &query.qm,
        &query.ql,
    ))
}

pub async fn health_json(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let client = state.client(&headers);
    let status = state.status_for(&client).await;
    Json(json!({
        "backend": status.label(),
        "api_base": client.base_url(),
    }))
}

// --- Fermenters ---

pub async fn madurador_detail(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let client = state.client(&headers);
    let ctx = page_context(&state, &client).await;
    match client.find_madurador(&id).await {
        Ok(record) => {
            let cache = state.cache.read().await;
            let view = cache.get(client.base_url());
            let position = view.and_then(|v| v.madurador_position(&record.id));
            let card = madurador_card(&record, position, view.and_then(|v| v.cached_lotes()));
            Html(render_madurador_detail(&ctx, &card)).into_response()
        }
        Err(e) => {
            warn!(id = %id, error = %e, "Failed to load fermenter");
            client_failure(&ctx, "Could not load fermenter", &e)
        }
    }
}

pub async fn new_madurador(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Html<String> {
    let client = state.client(&headers);
    let ctx = page_context(&state, &client).await;
    let (lotes, error) = match client.find_all_lotes().await {
        Ok(lotes) => {
            state.remember_lotes(client.base_url(), lotes.clone()).await;
            (lotes, None)
        }
        Err(e) => {
            warn!(error = %e, "Failed to load batches for new fermenter");
            (Vec::new(), Some(format!("Error loading batches: {}", e.user_message())))
        }
    };
    let form = MaduradorForm::blank(&lotes);
    let options = lote_options(&lotes, &form.lote);
    Html(render_madurador_form(
        &ctx,
        &MaduradorFormView {
            form,
            options,
            error,
        },
    ))
}

pub async fn edit_madurador(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let client = state.client(&headers);
    let ctx = page_context(&state, &client).await;
    let (record, lotes) = tokio::join!(client.find_madurador(&id), client.find_all_lotes());

    let record = match record {
        Ok(record) => record,
        Err(e) => {
            warn!(id = %id, error = %e, "Failed to load fermenter for edit");
            return client_failure(&ctx, "Could not load fermenter", &e);
        }
    };
    let lotes = match lotes {
        Ok(lotes) => {
            state.remember_lotes(client.base_url(), lotes.clone()).await;
            lotes
        }
        Err(e) => {
            warn!(error = %e, "Failed to load batches for edit, using cached list");
            state.cached_lotes(client.base_url()).await
        }
    };

    let form = MaduradorForm::from_record(&record);
    let options = lote_options(&lotes, &form.lote);
    Html(render_madurador_form(
        &ctx,
        &MaduradorFormView {
            form,
            options,
            error: None,
        },
    ))
    .into_response()
}

pub async fn save_madurador(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<MaduradorForm>,
) -> Response {
    let client = state.client(&headers);
    let lotes = batches_for_form(&state, &client).await;

    let input = match form.edit_id() {
        Some(_) => form.to_update_input(&lotes),
        None => form.to_create_input(&lotes),
    };
    let input = match input {
        Ok(input) => input,
        Err(e) => {
            let ctx = page_context(&state, &client).await;
            let options = lote_options(&lotes, &form.lote);
            let view = MaduradorFormView {
                form,
                options,
                error: Some(validation_message(&e)),
            };
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(render_madurador_form(&ctx, &view)),
            )
                .into_response();
        }
    };

    let result = match form.edit_id() {
        Some(id) => client.update_madurador(id, &input).await,
        None => client.create_madurador(&input).await,
    };
    match result {
        Ok(()) => Redirect::to("/").into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to save fermenter");
            let ctx = page_context(&state, &client).await;
            let options = lote_options(&lotes, &form.lote);
            let view = MaduradorFormView {
                form,
                options,
                error: Some(e.user_message()),
            };
            (StatusCode::BAD_GATEWAY, Html(render_madurador_form(&ctx, &view))).into_response()
        }
    }
}

pub async fn delete_madurador(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let client = state.client(&headers);
    match client.delete_madurador(&id).await {
        Ok(()) => Redirect::to("/").into_response(),
        Err(e) => {
            warn!(id = %id, error = %e, "Failed to delete fermenter");
            let ctx = page_context(&state, &client).await;
            client_failure(&ctx, "Could not delete fermenter", &e)
        }
    }
}

// --- Batches ---

pub async fn lote_detail(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let client = state.client(&headers);
    let ctx = page_context(&state, &client).await;
    match client.find_lote(&id).await {
        Ok(record) => {
            let position = state
                .cache
                .read()
                .await
                .get(client.base_url())
                .and_then(|view| view.lote_position(&record.id));
            Html(render_lote_detail(&ctx, &lote_card(&record, position))).into_response()
        }
        Err(e) => {
            warn!(id = %id, error = %e, "Failed to load batch");
            client_failure(&ctx, "Could not load batch", &e)
        }
    }
}

pub async fn new_lote(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Html<String> {
    let client = state.client(&headers);
    let ctx = page_context(&state, &client).await;
    Html(render_lote_form(
        &ctx,
        &LoteFormView {
            form: LoteForm::default(),
            error: None,
        },
    ))
}

pub async fn edit_lote(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let client = state.client(&headers);
    let ctx = page_context(&state, &client).await;
    match client.find_lote(&id).await {
        Ok(record) => Html(render_lote_form(
            &ctx,
            &LoteFormView {
                form: LoteForm::from_record(&record),
                error: None,
            },
        ))
        .into_response(),
        Err(e) => {
            warn!(id = %id, error = %e, "Failed to load batch for edit");
            client_failure(&ctx, "Could not load batch", &e)
        }
    }
}

pub async fn save_lote(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<LoteForm>,
) -> Response {
    let client = state.client(&headers);

    let input = match form.to_input() {
        Ok(input) => input,
        Err(e) => {
            let ctx = page_context(&state, &client).await;
            let view = LoteFormView {
                form,
                error: Some(validation_message(&e)),
            };
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(render_lote_form(&ctx, &view)),
            )
                .into_response();
        }
    };

    let result = match form.edit_id() {
        Some(id) => client.update_lote(id, &input).await,
        None => client.create_lote(&input).await,
    };
    match result {
        Ok(()) => Redirect::to("/").into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to save batch");
            let ctx = page_context(&state, &client).await;
            let view = LoteFormView {
                form,
                error: Some(e.user_message()),
            };
            (StatusCode::BAD_GATEWAY, Html(render_lote_form(&ctx, &view))).into_response()
        }
    }
}

pub async fn delete_lote(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let client = state.client(&headers);
    match client.delete_lote(&id).await {
        Ok(()) => Redirect::to("/").into_response(),
        Err(e) => {
            warn!(id = %id, error = %e, "Failed to delete batch");
            let ctx = page_context(&state, &client).await;
            client_failure(&ctx, "Could not delete batch", &e)
        }
    }
}

// --- Settings ---

pub async fn settings_page(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Html<String> {
    let client = state.client(&headers);
    let ctx = page_context(&state, &client).await;
    let overridden = api_base_override(&headers).is_some();
    Html(render_settings(&ctx, &state.default_api_base, overridden, None))
}

pub async fn save_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<SettingsForm>,
) -> Response {
    if form.api_base.trim().is_empty() {
        return (
            [(header::SET_COOKIE, api_base_cookie(None))],
            Redirect::to("/"),
        )
            .into_response();
    }

    match validate_api_base(&form.api_base) {
        Ok(base) => {
            tracing::info!(api_base = %base, "API base override set");
            (
                [(header::SET_COOKIE, api_base_cookie(Some(&base)))],
                Redirect::to("/"),
            )
                .into_response()
        }
        Err(message) => {
            let client = state.client(&headers);
            let ctx = page_context(&state, &client).await;
            let overridden = api_base_override(&headers).is_some();
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(render_settings(
                    &ctx,
                    &state.default_api_base,
                    overridden,
                    Some(message.as_str()),
                )),
            )
                .into_response()
        }
    }
}

use crate::errors::AppError;
use crate::forms::{FormState, ADD_DAY_FIELDS, ADD_HABIT_FIELDS, ADD_HABIT_RESET};
use crate::models::{HabitId, NewHabit, StateSnapshot, Target};
use crate::routing;
use crate::state::{AppState, Session};
use crate::storage::{save_habits, save_location};
use crate::store::HabitStore;
use crate::ui::render_page;
use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
    Form, Json,
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let session = state.session.lock().await;
    Html(render_page(&session))
}

pub async fn get_state(State(state): State<AppState>) -> Json<StateSnapshot> {
    let session = state.session.lock().await;
    Json(snapshot(&session))
}

pub async fn select_habit(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Redirect, AppError> {
    let mut session = state.session.lock().await;
    let mut next = session.store.clone();
    if next.select(HabitId(id)) {
        commit_location(&state, &mut session, next).await?;
        info!(id, "habit selected");
    }
    Ok(redirect(&session))
}

pub async fn follow_fragment(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Redirect, AppError> {
    let mut session = state.session.lock().await;
    let mut next = session.store.clone();
    let active = routing::restore(&mut next, Some(&raw));
    commit_location(&state, &mut session, next).await?;
    debug!(fragment = %raw, active = ?active, "followed location fragment");
    Ok(redirect(&session))
}

pub async fn create_habit(
    State(state): State<AppState>,
    Form(submission): Form<HashMap<String, String>>,
) -> Result<Redirect, AppError> {
    let mut session = state.session.lock().await;
    let Some(new) = validate_new_habit(&mut session.forms.add_habit, &submission) else {
        debug!("add-habit form rejected");
        return Ok(redirect(&session));
    };

    let mut next = session.store.clone();
    let Some(id) = next.create(new) else {
        warn!("no habit id left to assign");
        session.forms.add_habit.mark_invalid("name");
        return Ok(redirect(&session));
    };
    commit(&state, &mut session, next).await?;
    info!(%id, "habit created");

    session.forms.add_habit.reset(ADD_HABIT_RESET);
    session.forms.popup_open = false;
    Ok(redirect(&session))
}

pub async fn create_habit_json(
    State(state): State<AppState>,
    Json(payload): Json<HashMap<String, serde_json::Value>>,
) -> Result<Json<StateSnapshot>, AppError> {
    let submission: HashMap<String, String> = payload
        .into_iter()
        .map(|(field, value)| {
            let text = match value {
                serde_json::Value::String(text) => text,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            (field, text)
        })
        .collect();

    let mut form = FormState::default();
    let Some(new) = validate_new_habit(&mut form, &submission) else {
        let invalid: Vec<&str> = ADD_HABIT_FIELDS
            .iter()
            .copied()
            .filter(|field| form.is_invalid(field))
            .collect();
        return Err(AppError::bad_request(format!(
            "invalid fields: {}",
            invalid.join(", ")
        )));
    };

    let mut session = state.session.lock().await;
    let mut next = session.store.clone();
    let Some(id) = next.create(new) else {
        warn!("no habit id left to assign");
        return Err(AppError::bad_request("habit ids exhausted"));
    };
    commit(&state, &mut session, next).await?;
    info!(%id, "habit created");
    Ok(Json(snapshot(&session)))
}

pub async fn delete_habit(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Redirect, AppError> {
    let mut session = state.session.lock().await;
    let mut next = session.store.clone();
    match next.delete_active(HabitId(id)) {
        Some(removed) => {
            let active = next.active_id();
            commit(&state, &mut session, next).await?;
            info!(id = %removed.id, next = ?active, "habit deleted");
        }
        None => debug!(id, "no habit to delete"),
    }
    Ok(redirect(&session))
}

pub async fn add_day(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Form(submission): Form<HashMap<String, String>>,
) -> Result<Redirect, AppError> {
    let mut session = state.session.lock().await;
    let Some(mut data) = session.forms.add_day.validate(&submission, ADD_DAY_FIELDS) else {
        debug!("add-day form rejected");
        return Ok(redirect(&session));
    };

    let comment = data.remove("comment").unwrap_or_default();
    let mut next = session.store.clone();
    if let Some(number) = next.add_day(HabitId(id), comment) {
        commit(&state, &mut session, next).await?;
        info!(habit = id, number, "day added");
        session.forms.add_day.reset(ADD_DAY_FIELDS);
    }
    Ok(redirect(&session))
}

pub async fn delete_day(
    State(state): State<AppState>,
    Path((id, index)): Path<(u64, usize)>,
) -> Result<Redirect, AppError> {
    let mut session = state.session.lock().await;
    let mut next = session.store.clone();
    if next.delete_day(HabitId(id), index).is_some() {
        commit(&state, &mut session, next).await?;
        info!(habit = id, index, "day deleted");
    } else {
        debug!(habit = id, index, "no day to delete");
    }
    Ok(redirect(&session))
}

pub async fn pick_icon(State(state): State<AppState>, Path(tag): Path<String>) -> Redirect {
    let mut session = state.session.lock().await;
    if !session.forms.pick_icon(&tag) {
        debug!(%tag, "ignoring unknown icon");
    }
    redirect(&session)
}

pub async fn toggle_popup(State(state): State<AppState>) -> Redirect {
    let mut session = state.session.lock().await;
    session.forms.toggle_popup();
    redirect(&session)
}

fn validate_new_habit(
    form: &mut FormState,
    submission: &HashMap<String, String>,
) -> Option<NewHabit> {
    let mut data = form.validate(submission, ADD_HABIT_FIELDS)?;
    let Some(target) = data.get("target").and_then(|raw| Target::parse(raw)) else {
        form.mark_invalid("target");
        return None;
    };
    Some(NewHabit {
        name: data.remove("name").unwrap_or_default(),
        icon: data.remove("icon").unwrap_or_default(),
        target,
    })
}

// The session only sees `next` once the habit list is on disk.
async fn commit(
    state: &AppState,
    session: &mut Session,
    next: HabitStore,
) -> Result<(), AppError> {
    save_habits(&state.storage, next.habits()).await?;
    let fragment = routing::fragment(next.active_id());
    session.store = next;
    save_location(&state.storage, &fragment).await?;
    Ok(())
}

async fn commit_location(
    state: &AppState,
    session: &mut Session,
    next: HabitStore,
) -> Result<(), AppError> {
    save_location(&state.storage, &routing::fragment(next.active_id())).await?;
    session.store = next;
    Ok(())
}

fn redirect(session: &Session) -> Redirect {
    Redirect::to(&routing::location(session.store.active_id()))
}

fn snapshot(session: &Session) -> StateSnapshot {
    StateSnapshot {
        habits: session.store.habits().to_vec(),
        active_habit_id: session.store.active_id(),
        location: routing::fragment(session.store.active_id()),
    }
}

use axum::{
    extract::{Path, Query, State},
    response::{Html, Redirect},
    routing::{get, post},
    Form, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    error::AppError,
    records::{
        dto::{AddRecordForm, NoticeQuery, RecordRow},
        repo_types::DeleteOutcome,
        services::{aggregate, recent_trend},
    },
    state::AppState,
    views,
};

/// Rows shown on the dashboard.
pub const DASHBOARD_LIMIT: i64 = 10;
/// Points in the reports chart.
pub const TREND_WINDOW: usize = 7;

pub fn record_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/add", get(add_form).post(add_record))
        .route("/delete/:id", post(delete_record))
        .route("/reports", get(reports))
}

#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    Query(q): Query<NoticeQuery>,
) -> Result<Html<String>, AppError> {
    let recent = state.store.list_recent_descending(DASHBOARD_LIMIT).await?;
    let all = state.store.list_all().await?;
    let total_records = state.store.count().await?;
    let totals = aggregate(&all);

    let rows: Vec<RecordRow> = recent.iter().map(RecordRow::from).collect();
    Ok(Html(views::dashboard(
        &rows,
        total_records,
        &totals,
        q.notice.as_deref(),
    )))
}

pub async fn add_form() -> Html<String> {
    let today = OffsetDateTime::now_utc().date();
    Html(views::add_form(&today.to_string()))
}

#[instrument(skip(state, form))]
pub async fn add_record(
    State(state): State<AppState>,
    Form(form): Form<AddRecordForm>,
) -> Result<Redirect, AppError> {
    let new = form
        .into_new_record(OffsetDateTime::now_utc().date())
        .inspect_err(|e| warn!(error = %e, "rejected waste record"))?;
    let record = state.store.insert(new).await?;
    info!(id = record.id, school = %record.school_name, "waste record added");
    Ok(Redirect::to("/?notice=added"))
}

#[instrument(skip(state))]
pub async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Redirect, AppError> {
    match state.store.delete(id).await? {
        DeleteOutcome::Deleted => {
            info!(id, "waste record deleted");
            Ok(Redirect::to("/reports?notice=deleted"))
        }
        DeleteOutcome::NotFound => {
            warn!(id, "delete of unknown waste record");
            Err(AppError::NotFound)
        }
    }
}

#[instrument(skip(state))]
pub async fn reports(
    State(state): State<AppState>,
    Query(q): Query<NoticeQuery>,
) -> Result<Html<String>, AppError> {
    let records = state.store.list_all_descending_by_date().await?;
    // Tail of the date-descending listing, i.e. the oldest shown entries.
    let trend = recent_trend(&records, TREND_WINDOW);
    let chart_json = serde_json::to_string(&trend).map_err(anyhow::Error::from)?;

    let rows: Vec<RecordRow> = records.iter().map(RecordRow::from).collect();
    Ok(Html(views::reports(&rows, &chart_json, q.notice.as_deref())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{app::build_app, records::repo_types::NewWasteRecord};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use time::macros::date;
    use tower::ServiceExt;

    async fn body_text(res: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn post_form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn insert(state: &AppState, school: &str, day: time::Date, prepared: f64, served: f64) -> i64 {
        state
            .store
            .insert(NewWasteRecord {
                school_name: school.into(),
                meal_type: "lunch".into(),
                food_prepared: prepared,
                food_served: served,
                date: day,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn dashboard_shows_totals() {
        let state = AppState::fake().await;
        insert(&state, "Escola Municipal Centro", date!(2024 - 03 - 01), 50.0, 45.0).await;
        insert(&state, "Colégio Estadual Norte", date!(2024 - 03 - 02), 50.0, 40.0).await;

        let res = build_app(state).oneshot(get("/")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let html = body_text(res).await;
        assert!(html.contains("Records: <strong>2</strong>"));
        assert!(html.contains("Total wasted: <strong>15.0</strong>"));
        assert!(html.contains("Total prepared: <strong>100.0</strong>"));
        assert!(html.contains("Average waste: <strong>15.0%</strong>"));
    }

    #[tokio::test]
    async fn dashboard_lists_at_most_ten_records() {
        let state = AppState::fake().await;
        for d in 1..=12u8 {
            let day = date!(2024 - 03 - 01).replace_day(d).unwrap();
            insert(&state, &format!("School {d:02}"), day, 10.0, 9.0).await;
        }
        let html = body_text(build_app(state).oneshot(get("/")).await.unwrap()).await;
        assert!(html.contains("School 12"));
        assert!(html.contains("School 03"));
        assert!(!html.contains("School 02"));
        assert!(html.contains("Records: <strong>12</strong>"));
    }

    #[tokio::test]
    async fn add_form_renders() {
        let state = AppState::fake().await;
        let res = build_app(state).oneshot(get("/add")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(body_text(res).await.contains(r#"name="food_prepared""#));
    }

    #[tokio::test]
    async fn add_record_redirects_home_and_stores() {
        let state = AppState::fake().await;
        let app = build_app(state.clone());
        let res = app
            .oneshot(post_form(
                "/add",
                "school_name=EMEF+Sul&meal_type=lunch&food_prepared=40&food_served=35&date=2024-03-01",
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/?notice=added");

        let all = state.store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].school_name, "EMEF Sul");
        assert_eq!(all[0].date, date!(2024 - 03 - 01));
    }

    #[tokio::test]
    async fn add_record_without_date_uses_today() {
        let state = AppState::fake().await;
        let res = build_app(state.clone())
            .oneshot(post_form(
                "/add",
                "school_name=EMEF+Sul&meal_type=lunch&food_prepared=40&food_served=35",
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        let all = state.store.list_all().await.unwrap();
        assert_eq!(all[0].date, OffsetDateTime::now_utc().date());
    }

    #[tokio::test]
    async fn add_record_with_non_numeric_quantity_is_rejected() {
        let state = AppState::fake().await;
        let res = build_app(state.clone())
            .oneshot(post_form(
                "/add",
                "school_name=EMEF+Sul&meal_type=lunch&food_prepared=lots&food_served=35",
            ))
            .await
            .unwrap();
        assert!(res.status().is_client_error());
        assert_eq!(state.store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn add_record_with_bad_date_is_bad_request() {
        let state = AppState::fake().await;
        let res = build_app(state.clone())
            .oneshot(post_form(
                "/add",
                "school_name=EMEF+Sul&meal_type=lunch&food_prepared=40&food_served=35&date=tomorrow",
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_existing_redirects_to_reports() {
        let state = AppState::fake().await;
        let id = insert(&state, "EMEF Sul", date!(2024 - 03 - 01), 40.0, 35.0).await;
        let res = build_app(state.clone())
            .oneshot(post_form(&format!("/delete/{id}"), ""))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/reports?notice=deleted");
        assert_eq!(state.store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_missing_is_not_found_and_keeps_records() {
        let state = AppState::fake().await;
        insert(&state, "EMEF Sul", date!(2024 - 03 - 01), 40.0, 35.0).await;
        let res = build_app(state.clone())
            .oneshot(post_form("/delete/424242", ""))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(state.store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn reports_chart_uses_tail_of_descending_list() {
        let state = AppState::fake().await;
        for d in 1..=9u8 {
            let day = date!(2024 - 03 - 01).replace_day(d).unwrap();
            insert(&state, "EMEF Sul", day, 10.0, 10.0 - f64::from(d)).await;
        }
        let res = build_app(state).oneshot(get("/reports")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let html = body_text(res).await;
        // Listing runs 09/03 down to 01/03; the chart gets 07/03 .. 01/03.
        assert!(html.contains(r#"{"date":"07/03","waste":7.0}"#));
        assert!(html.contains(r#"{"date":"01/03","waste":1.0}"#));
        assert!(!html.contains(r#""date":"08/03""#));
        assert!(html.contains("2024-03-09"));
    }

    #[tokio::test]
    async fn health_is_ok() {
        let state = AppState::fake().await;
        let res = build_app(state).oneshot(get("/health")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_text(res).await, "ok");
    }
}

use actix_web::{
    delete, get,
    http::{
        header::{self, HeaderValue},
        StatusCode,
    },
    post, put, web, HttpRequest, HttpResponse, ResponseError,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::balance::{aggregate, compute_balance_from_group, Balance};
use crate::error::{SplitError, StoreError, ValidationError};
use crate::exchange::{plan, settlement_to_expense_record, Exchange};
use crate::fingerprint::content_key;
use crate::schemas::{ExpenseRecord, ExpenseTag, Group, Participant, RecordId};
use crate::store::GroupStore;
use crate::validation::{validate_against_group, validate_expense_tag, validate_roster};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Split(#[from] SplitError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to fingerprint group: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        Self::Split(value.into())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    kind: &'static str,
    error: String,
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::Split(SplitError::Invalid(_)) => "validation",
            ApiError::Split(SplitError::ZeroTotalWeight(_) | SplitError::Overflow(_)) => {
                "computation"
            }
            ApiError::Store(StoreError::NotFound(_)) => "not_found",
            ApiError::Store(StoreError::ExistingKey(_)) => "conflict",
            ApiError::Store(_) | ApiError::Fingerprint(_) => "internal",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Split(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::ExistingKey(_)) => StatusCode::CONFLICT,
            ApiError::Store(_) | ApiError::Fingerprint(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("request failed: {self}");
                "internal server error".to_string()
            }
            _ => self.to_string(),
        };
        HttpResponse::build(self.status_code()).json(ErrorBody {
            kind: self.kind(),
            error,
        })
    }
}

type ApiResult = Result<HttpResponse, ApiError>;

/// Refuses a record the group's balances could not be computed with once
/// stored. A stored record with the same id is treated as replaced.
fn check_write(group: &Group, record: &ExpenseRecord) -> Result<(), ApiError> {
    validate_against_group(record, group)?;
    let mut expenses: Vec<ExpenseRecord> = group
        .expenses
        .iter()
        .filter(|e| e.id != record.id)
        .cloned()
        .collect();
    expenses.push(record.clone());
    aggregate(&expenses, &group.participants)?;
    Ok(())
}

#[derive(Deserialize, Serialize)]
struct GroupNameJson {
    name: String,
}

#[derive(Deserialize, Serialize)]
pub struct ComputeRequest {
    pub participants: Vec<Participant>,
    pub expenses: Vec<ExpenseRecord>,
}

#[derive(Deserialize, Serialize)]
pub struct ComputeResponse {
    pub balances: Balance,
    pub settlement: Vec<Exchange>,
}

#[derive(Deserialize, Serialize)]
struct SettlementJson {
    #[serde(flatten)]
    exchange: Exchange,
    id: Option<RecordId>,
    date: Option<NaiveDate>,
}

// Answers 304 when the client already holds the representation for `key`.
fn with_etag<T: Serialize>(request: &HttpRequest, key: &str, body: &T) -> HttpResponse {
    let etag = format!("\"{key}\"");
    let fresh = request
        .headers()
        .get(header::IF_NONE_MATCH)
        .map(HeaderValue::to_str)
        .and_then(Result::ok)
        .is_some_and(|value| value == etag);
    if fresh {
        return HttpResponse::NotModified()
            .insert_header((header::ETAG, etag))
            .finish();
    }
    HttpResponse::Ok()
        .insert_header((header::ETAG, etag))
        .json(body)
}

#[get("/groups")]
async fn list_groups(store: web::Data<GroupStore>) -> ApiResult {
    Ok(HttpResponse::Ok().json(store.list_groups().await?))
}

#[put("/groups/{id}")]
async fn add_group(
    store: web::Data<GroupStore>,
    id: web::Path<String>,
    json: web::Json<GroupNameJson>,
) -> ApiResult {
    let group = store.create_group(&id, &json.name).await?;
    tracing::info!("created group {}", group.id);
    Ok(HttpResponse::Ok().json(group))
}

#[get("/groups/{id}")]
async fn get_group(store: web::Data<GroupStore>, id: web::Path<String>) -> ApiResult {
    Ok(HttpResponse::Ok().json(store.find_group(&id).await?))
}

#[post("/groups/{id}/participants")]
async fn add_participant(
    store: web::Data<GroupStore>,
    id: web::Path<String>,
    participant: web::Json<Participant>,
) -> ApiResult {
    let group = store.find_group(&id).await?;
    let participant = participant.into_inner();
    let mut roster = group.participants;
    roster.push(participant.clone());
    validate_roster(&roster)?;

    store.add_participant(&id, &participant).await?;
    Ok(HttpResponse::Ok().json(participant))
}

#[post("/groups/{id}/tags")]
async fn add_tag(
    store: web::Data<GroupStore>,
    id: web::Path<String>,
    tag: web::Json<ExpenseTag>,
) -> ApiResult {
    let group = store.find_group(&id).await?;
    let tag = tag.into_inner();
    validate_expense_tag(&tag)?;
    if group.tags.iter().any(|t| t.id == tag.id) {
        return Err(StoreError::ExistingKey(format!("tag {}", tag.id)).into());
    }

    store.add_tag(&id, &tag).await?;
    Ok(HttpResponse::Ok().json(tag))
}

#[post("/groups/{id}/expenses")]
async fn add_expense(
    store: web::Data<GroupStore>,
    id: web::Path<String>,
    expense: web::Json<ExpenseRecord>,
) -> ApiResult {
    let group = store.find_group(&id).await?;
    let expense = expense.into_inner();
    if group.expenses.iter().any(|e| e.id == expense.id) {
        return Err(StoreError::ExistingKey(format!("expense {}", expense.id)).into());
    }
    check_write(&group, &expense)?;

    store.add_expense(&id, &expense).await?;
    tracing::info!("added expense {} to group {}", expense.id, group.id);
    Ok(HttpResponse::Ok().json(expense))
}

#[put("/groups/{id}/expenses/{expense_id}")]
async fn replace_expense(
    store: web::Data<GroupStore>,
    path: web::Path<(String, String)>,
    expense: web::Json<ExpenseRecord>,
) -> ApiResult {
    let (id, expense_id) = path.into_inner();
    let group = store.find_group(&id).await?;
    let mut expense = expense.into_inner();
    expense.id = expense_id;
    check_write(&group, &expense)?;

    store.replace_expense(&id, &expense).await?;
    Ok(HttpResponse::Ok().json(expense))
}

#[delete("/groups/{id}/expenses/{expense_id}")]
async fn delete_expense(
    store: web::Data<GroupStore>,
    path: web::Path<(String, String)>,
) -> ApiResult {
    let (id, expense_id) = path.into_inner();
    store.delete_expense(&id, &expense_id).await?;
    tracing::info!("deleted expense {expense_id} from group {id}");
    Ok(HttpResponse::NoContent().finish())
}

#[get("/groups/{id}/balance")]
async fn get_balance(
    request: HttpRequest,
    store: web::Data<GroupStore>,
    id: web::Path<String>,
) -> ApiResult {
    let group = store.find_group(&id).await?;
    let balance = compute_balance_from_group(&group)?;
    let key = content_key(&group.participants, &group.expenses)?;
    Ok(with_etag(&request, &key, &balance))
}

#[get("/groups/{id}/settlement")]
async fn get_settlement(
    request: HttpRequest,
    store: web::Data<GroupStore>,
    id: web::Path<String>,
) -> ApiResult {
    let group = store.find_group(&id).await?;
    let exchanges = plan(&compute_balance_from_group(&group)?);
    let key = content_key(&group.participants, &group.expenses)?;
    Ok(with_etag(&request, &key, &exchanges))
}

/// Stores one planned exchange as a settlement record.
#[post("/groups/{id}/settlement")]
async fn record_settlement(
    store: web::Data<GroupStore>,
    id: web::Path<String>,
    json: web::Json<SettlementJson>,
) -> ApiResult {
    let group: Group = store.find_group(&id).await?;
    let SettlementJson { exchange, id: record_id, date } = json.into_inner();
    let now = chrono::Utc::now();
    let record_id =
        record_id.unwrap_or_else(|| format!("settlement-{}", now.timestamp_millis()));
    let record =
        settlement_to_expense_record(&exchange, record_id, date.unwrap_or(now.date_naive()));
    if group.expenses.iter().any(|e| e.id == record.id) {
        return Err(StoreError::ExistingKey(format!("expense {}", record.id)).into());
    }
    check_write(&group, &record)?;

    store.add_expense(&id, &record).await?;
    tracing::info!(
        "recorded settlement {} -> {} of {} in group {}",
        exchange.from,
        exchange.to,
        exchange.amount,
        group.id
    );
    Ok(HttpResponse::Ok().json(record))
}

/// Balances and settlement for a roster and records sent in the request.
#[post("/compute")]
async fn compute(json: web::Json<ComputeRequest>) -> ApiResult {
    let ComputeRequest {
        participants,
        expenses,
    } = json.into_inner();
    let balances = aggregate(&expenses, &participants)?;
    let settlement = plan(&balances);
    Ok(HttpResponse::Ok().json(ComputeResponse {
        balances,
        settlement,
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_groups)
        .service(add_group)
        .service(get_group)
        .service(add_participant)
        .service(add_tag)
        .service(add_expense)
        .service(replace_expense)
        .service(delete_expense)
        .service(get_balance)
        .service(get_settlement)
        .service(record_settlement)
        .service(compute);
}

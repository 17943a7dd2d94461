use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde_json::{Map, Value};

use crate::AppState;
use crate::constants::*;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::joins::list_payments_with_student_names;
use crate::models::{Payment, RecordPaymentPayload, Student};
use crate::repository::{fresh_id, position};
use crate::store::{DocumentStore, PendingWrite};
use crate::utils::{now_rfc3339, or_default_text, validate_amount};

/// Records a payment and charges it against the student's balance.
///
/// A payment whose `studentId` does not resolve is still recorded; only the
/// balance update is skipped. There is no way to reverse a payment.
pub async fn record_payment(
    store: &DocumentStore,
    payload: RecordPaymentPayload,
) -> Result<Payment, ApiError> {
    let amount = validate_amount(payload.amount)?;

    let _guard = store.lock().await;
    let mut payments: Vec<Payment> = store.load(PAYMENTS_COLLECTION).await?;
    let mut students: Vec<Student> = store.load(STUDENTS_COLLECTION).await?;

    let mut extra = payload.extra;
    for reserved in ["id", "createdAt"] {
        extra.remove(reserved);
    }

    let payment = Payment {
        id: fresh_id(store, &payments),
        student_id: payload.student_id,
        amount: Some(amount),
        payment_type: Some(or_default_text(payload.payment_type, PAYMENT_TYPE_CASH)),
        description: Some(payload.description.unwrap_or_else(|| Value::from(""))),
        created_at: Some(Value::from(now_rfc3339())),
        extra,
    };

    let mut writes = Vec::with_capacity(2);
    match payment.student_id.and_then(|id| position(&students, id)) {
        Some(si) => {
            let student = &mut students[si];
            let balance = student.balance.unwrap_or(0.0) - amount;
            student.balance = Some(balance);
            if balance <= 0.0 {
                student.payment = Some(Value::from(PAYMENT_STATUS_PAID));
            }
            tracing::info!(student_id = student.id, balance, "student balance charged");
            writes.push(PendingWrite::new(STUDENTS_COLLECTION, &students)?);
        }
        None => {
            tracing::warn!(
                student_id = ?payment.student_id,
                "payment for unknown student recorded without balance update"
            );
        }
    }

    payments.push(payment.clone());
    writes.push(PendingWrite::new(PAYMENTS_COLLECTION, &payments)?);
    store.commit(writes).await?;

    tracing::info!(payment_id = payment.id, amount, "payment recorded");
    Ok(payment)
}

pub async fn get_payments(
    State(app_state): State<AppState>,
) -> Result<(StatusCode, Json<Vec<Map<String, Value>>>), ApiError> {
    let payments = list_payments_with_student_names(&app_state.store).await?;
    Ok((StatusCode::OK, Json(payments)))
}

pub async fn create_payment(
    State(app_state): State<AppState>,
    JsonBody(payload): JsonBody<RecordPaymentPayload>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    let payment = record_payment(&app_state.store, payload).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

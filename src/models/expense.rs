use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Expense entity representing a single spending record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Expense {
    #[serde(rename = "expense_id")]
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing, default)]
    pub user_id: i64,
    pub category_id: i64,
    #[schema(value_type = String, example = "3.50")]
    pub amount: Decimal,
    #[schema(format = "date", example = "2024-01-15")]
    pub date: NaiveDate,
}

/// Request payload for creating a new expense
///
/// `amount` and `date` arrive as text and are parsed by the ledger, so a
/// malformed value is reported as `invalid_amount` / `invalid_date`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "name": "Coffee",
    "category_id": 1,
    "amount": "3.50",
    "date": "2024-01-15"
}))]
pub struct CreateExpenseRequest {
    #[serde(default)]
    #[validate(
        required(message = "Name is required"),
        length(min = 1, max = 255, message = "Name must be 1 to 255 characters")
    )]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "id_string_or_number")]
    #[validate(required(message = "Category is required"))]
    #[schema(value_type = Option<i64>, example = 1)]
    pub category_id: Option<i64>,

    #[serde(default, deserialize_with = "string_or_number")]
    #[validate(
        required(message = "Amount is required"),
        length(min = 1, message = "Amount is required")
    )]
    #[schema(value_type = Option<String>, example = "3.50")]
    pub amount: Option<String>,

    /// Calendar date as `YYYY-MM-DD`; today when omitted
    #[serde(default)]
    #[schema(example = "2024-01-15")]
    pub date: Option<String>,
}

/// Request payload for updating an existing expense
///
/// Absent or empty fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "amount": "4.20"
}))]
pub struct UpdateExpenseRequest {
    #[serde(default)]
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "id_string_or_number")]
    #[schema(value_type = Option<i64>, example = 2)]
    pub category_id: Option<i64>,

    #[serde(default, deserialize_with = "string_or_number")]
    #[schema(value_type = Option<String>, example = "4.20")]
    pub amount: Option<String>,

    #[serde(default)]
    pub date: Option<String>,
}

/// An expense row about to be inserted
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub name: String,
    pub user_id: i64,
    pub category_id: i64,
    pub amount: Decimal,
    pub date: NaiveDate,
}

/// Aggregate total of a user's expenses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExpenseSum {
    #[schema(value_type = String, example = "10.00")]
    pub sum: Decimal,
}

/// Accepts `"3.50"` as well as `3.5` for amount fields
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    }))
}

/// Accepts `1` as well as `"1"` for id fields; a blank string counts as absent
fn id_string_or_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(id)) => Ok(Some(id)),
        Some(Raw::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Raw::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| <D::Error as serde::de::Error>::custom("expected an integer id")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_amount_accepts_string_and_number() {
        let from_string: CreateExpenseRequest =
            serde_json::from_value(json!({"name": "Coffee", "category_id": 1, "amount": "3.50"}))
                .unwrap();
        assert_eq!(from_string.amount.as_deref(), Some("3.50"));

        let from_number: CreateExpenseRequest =
            serde_json::from_value(json!({"name": "Coffee", "category_id": 1, "amount": 3.5}))
                .unwrap();
        assert_eq!(from_number.amount.as_deref(), Some("3.5"));
    }

    #[test]
    fn test_category_id_accepts_string_and_number() {
        let from_number: CreateExpenseRequest =
            serde_json::from_value(json!({"name": "Coffee", "category_id": 1, "amount": "3.50"}))
                .unwrap();
        assert_eq!(from_number.category_id, Some(1));

        let from_string: CreateExpenseRequest =
            serde_json::from_value(json!({"name": "Coffee", "category_id": " 7 ", "amount": "3.50"}))
                .unwrap();
        assert_eq!(from_string.category_id, Some(7));

        let blank: UpdateExpenseRequest =
            serde_json::from_value(json!({"category_id": ""})).unwrap();
        assert_eq!(blank.category_id, None);

        let garbage =
            serde_json::from_value::<UpdateExpenseRequest>(json!({"category_id": "food"}));
        assert!(garbage.is_err());
    }

    #[test]
    fn test_name_longer_than_column_is_rejected() {
        let long_name = "x".repeat(256);

        let create = CreateExpenseRequest {
            name: Some(long_name.clone()),
            category_id: Some(1),
            amount: Some("1".to_string()),
            date: None,
        };
        assert!(create.validate().unwrap_err().field_errors().contains_key("name"));

        let update = UpdateExpenseRequest {
            name: Some(long_name),
            ..Default::default()
        };
        assert!(update.validate().unwrap_err().field_errors().contains_key("name"));

        let at_limit = UpdateExpenseRequest {
            name: Some("x".repeat(255)),
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_deserialize_as_none() {
        let request: UpdateExpenseRequest = serde_json::from_value(json!({})).unwrap();
        assert!(request.name.is_none());
        assert!(request.category_id.is_none());
        assert!(request.amount.is_none());
        assert!(request.date.is_none());
    }

    #[test]
    fn test_create_request_requires_name_category_and_amount() {
        let request: CreateExpenseRequest = serde_json::from_value(json!({})).unwrap();
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("category_id"));
        assert!(fields.contains_key("amount"));
    }

    #[test]
    fn test_expense_serialization_hides_owner() {
        let expense = Expense {
            id: 7,
            name: "Coffee".to_string(),
            user_id: 42,
            category_id: 1,
            amount: "3.50".parse().unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        };

        let value = serde_json::to_value(&expense).unwrap();
        assert_eq!(value["expense_id"], 7);
        assert_eq!(value["amount"], "3.50");
        assert_eq!(value["date"], "2024-01-15");
        assert!(value.get("user_id").is_none());
    }
}

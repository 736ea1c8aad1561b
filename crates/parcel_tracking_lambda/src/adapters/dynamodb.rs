//! DynamoDB-backed [`KeyValueStore`].
//!
//! DynamoDB carries numbers as decimal strings (`N`). They are parsed with
//! `rust_decimal` and turned into plain JSON numbers here, so nothing above
//! this module sees the storage representation.

use std::collections::HashMap;
use std::str::FromStr;

use aws_sdk_dynamodb::types::AttributeValue;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Number, Value};

use crate::adapters::block_on;
use crate::adapters::store::{Item, KeyQuery, KeyValueStore};
use crate::error::DependencyError;

const SERVICE: &str = "dynamodb";

#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: aws_sdk_dynamodb::Client,
}

impl DynamoDbStore {
    pub fn new(client: aws_sdk_dynamodb::Client) -> Self {
        Self { client }
    }
}

impl KeyValueStore for DynamoDbStore {
    fn put_item(&self, table: &str, item: Item) -> Result<(), DependencyError> {
        let client = self.client.clone();
        let table = table.to_string();
        let attributes = item_to_attributes(item)
            .map_err(|message| DependencyError::new(SERVICE, "put_item", message))?;

        block_on(async move {
            client
                .put_item()
                .table_name(table)
                .set_item(Some(attributes))
                .send()
                .await
                .map(|_| ())
                .map_err(|error| DependencyError::new(SERVICE, "put_item", error.to_string()))
        })
    }

    fn query(&self, table: &str, query: &KeyQuery) -> Result<Vec<Item>, DependencyError> {
        let client = self.client.clone();
        let table = table.to_string();
        let query = query.clone();

        let output = block_on(async move {
            client
                .query()
                .table_name(table)
                .set_index_name(query.index)
                .key_condition_expression("#pk = :pk")
                .expression_attribute_names("#pk", query.key_name)
                .expression_attribute_values(":pk", AttributeValue::S(query.key_value))
                .scan_index_forward(!query.newest_first)
                .set_limit(query.limit)
                .send()
                .await
                .map_err(|error| DependencyError::new(SERVICE, "query", error.to_string()))
        })?;

        output
            .items()
            .iter()
            .map(|attributes| {
                attributes_to_item(attributes)
                    .map_err(|message| DependencyError::new(SERVICE, "query", message))
            })
            .collect()
    }

    fn scan(&self, table: &str, limit: i32) -> Result<Vec<Item>, DependencyError> {
        let client = self.client.clone();
        let table = table.to_string();

        let output = block_on(async move {
            client
                .scan()
                .table_name(table)
                .limit(limit)
                .send()
                .await
                .map_err(|error| DependencyError::new(SERVICE, "scan", error.to_string()))
        })?;

        output
            .items()
            .iter()
            .map(|attributes| {
                attributes_to_item(attributes)
                    .map_err(|message| DependencyError::new(SERVICE, "scan", message))
            })
            .collect()
    }

    fn update_attribute(
        &self,
        table: &str,
        key: Item,
        attribute: &str,
        value: Value,
    ) -> Result<bool, DependencyError> {
        let client = self.client.clone();
        let table = table.to_string();
        let attribute = attribute.to_string();
        let (condition, key_names) = key_exists_condition(&key);
        let key = item_to_attributes(key)
            .map_err(|message| DependencyError::new(SERVICE, "update_item", message))?;
        let value = json_to_attribute(value)
            .map_err(|message| DependencyError::new(SERVICE, "update_item", message))?;

        let result = block_on(async move {
            let mut request = client
                .update_item()
                .table_name(table)
                .set_key(Some(key))
                .update_expression("SET #attr = :value")
                .condition_expression(condition)
                .expression_attribute_names("#attr", attribute)
                .expression_attribute_values(":value", value);
            for (placeholder, name) in key_names {
                request = request.expression_attribute_names(placeholder, name);
            }
            request.send().await
        });

        match result {
            Ok(_) => Ok(true),
            Err(error)
                if error
                    .as_service_error()
                    .is_some_and(|service| service.is_conditional_check_failed_exception()) =>
            {
                Ok(false)
            }
            Err(error) => Err(DependencyError::new(SERVICE, "update_item", error.to_string())),
        }
    }

    fn table_status(&self, table: &str) -> Result<String, DependencyError> {
        let client = self.client.clone();
        let table = table.to_string();

        let output = block_on(async move {
            client
                .describe_table()
                .table_name(table)
                .send()
                .await
                .map_err(|error| DependencyError::new(SERVICE, "describe_table", error.to_string()))
        })?;

        Ok(output
            .table()
            .and_then(|description| description.table_status())
            .map(|status| status.as_str().to_string())
            .unwrap_or_else(|| "UNKNOWN".to_string()))
    }
}

/// `attribute_exists` on every key attribute, so an update never creates an item.
fn key_exists_condition(key: &Item) -> (String, Vec<(String, String)>) {
    let names: Vec<(String, String)> = key
        .keys()
        .enumerate()
        .map(|(index, name)| (format!("#key{index}"), name.clone()))
        .collect();
    let condition = names
        .iter()
        .map(|(placeholder, _)| format!("attribute_exists({placeholder})"))
        .collect::<Vec<_>>()
        .join(" AND ");
    (condition, names)
}

/// Top-level `null` attributes are dropped; DynamoDB keys and sparse
/// indexes expect absent attributes rather than explicit nulls.
pub fn item_to_attributes(item: Item) -> Result<HashMap<String, AttributeValue>, String> {
    item.into_iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| json_to_attribute(value).map(|attribute| (name, attribute)))
        .collect()
}

pub fn attributes_to_item(attributes: &HashMap<String, AttributeValue>) -> Result<Item, String> {
    attributes
        .iter()
        .map(|(name, attribute)| attribute_to_json(attribute).map(|value| (name.clone(), value)))
        .collect()
}

pub fn json_to_attribute(value: Value) -> Result<AttributeValue, String> {
    Ok(match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(flag) => AttributeValue::Bool(flag),
        Value::Number(number) => AttributeValue::N(number.to_string()),
        Value::String(text) => AttributeValue::S(text),
        Value::Array(values) => AttributeValue::L(
            values
                .into_iter()
                .map(json_to_attribute)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Object(map) => AttributeValue::M(
            map.into_iter()
                .map(|(name, value)| json_to_attribute(value).map(|attribute| (name, attribute)))
                .collect::<Result<HashMap<_, _>, _>>()?,
        ),
    })
}

pub fn attribute_to_json(attribute: &AttributeValue) -> Result<Value, String> {
    match attribute {
        AttributeValue::S(text) => Ok(Value::String(text.clone())),
        AttributeValue::N(number) => number_to_json(number),
        AttributeValue::Bool(flag) => Ok(Value::Bool(*flag)),
        AttributeValue::Null(_) => Ok(Value::Null),
        AttributeValue::L(values) => values
            .iter()
            .map(attribute_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        AttributeValue::M(map) => attributes_to_item(map).map(Value::Object),
        AttributeValue::Ss(values) => Ok(Value::from(values.clone())),
        AttributeValue::Ns(values) => values
            .iter()
            .map(|number| number_to_json(number))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Err(format!("unsupported attribute type: {other:?}")),
    }
}

/// Integral values that fit in `i64` stay integers; everything else becomes a float.
pub fn number_to_json(number: &str) -> Result<Value, String> {
    let decimal = Decimal::from_str(number.trim())
        .or_else(|_| Decimal::from_scientific(number.trim()))
        .map_err(|error| format!("invalid number attribute '{number}': {error}"))?;

    let normalized = decimal.normalize();
    if normalized.scale() == 0 {
        if let Some(integer) = normalized.to_i64() {
            return Ok(Value::from(integer));
        }
    }

    normalized
        .to_string()
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| format!("number attribute '{number}' is not representable as JSON"))
}

//! DynamoDB-backed stores.
//!
//! Table layout: partition key `id`; GSIs `requester-index`, `status-index`,
//! `profile-index` (requests) and `invoker-index`, `status-index`,
//! `profile-index` (break-glass), each with `created_at` as the range key so
//! `scan_index_forward(false)` yields newest-first. TTL attribute:
//! `expires_at_unix`.

use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use jiff::Timestamp;
use sentinel_core::{BreakGlassEvent, BreakGlassStatus, Request, RequestStatus};

use crate::error::StoreError;
use crate::marshal::{self, Item};
use crate::{Bf, BreakGlassStore, RequestStore, next_version};

pub struct DynamoRequestStore {
    client: Client,
    table: String,
}

impl DynamoRequestStore {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

pub struct DynamoBreakGlassStore {
    client: Client,
    table: String,
}

impl DynamoBreakGlassStore {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

/// Build both stores over a shared client from the ambient AWS config.
pub async fn from_env(
    requests_table: impl Into<String>,
    break_glass_table: impl Into<String>,
) -> (DynamoRequestStore, DynamoBreakGlassStore) {
    let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let client = Client::new(&config);
    (
        DynamoRequestStore::new(client.clone(), requests_table),
        DynamoBreakGlassStore::new(client, break_glass_table),
    )
}

async fn put_new(client: &Client, table: &str, id: &str, item: Item) -> Result<(), StoreError> {
    client
        .put_item()
        .table_name(table)
        .set_item(Some(item))
        .condition_expression("attribute_not_exists(id)")
        .send()
        .await
        .map_err(|e| {
            let err = e.into_service_error();
            if err.is_conditional_check_failed_exception() {
                StoreError::AlreadyExists { id: id.to_string() }
            } else {
                StoreError::Dynamo(err.to_string())
            }
        })?;
    Ok(())
}

/// Replace the row iff its `updated_at` still matches `expected`. The
/// distinction between a missing row and a version mismatch needs a
/// follow-up read — DynamoDB reports both as the same condition failure.
async fn put_versioned(
    client: &Client,
    table: &str,
    id: &str,
    expected: Timestamp,
    item: Item,
) -> Result<(), StoreError> {
    let result = client
        .put_item()
        .table_name(table)
        .set_item(Some(item))
        .condition_expression("attribute_exists(id) AND updated_at = :expected")
        .expression_attribute_values(":expected", AttributeValue::S(expected.to_string()))
        .send()
        .await;

    let Err(e) = result else {
        return Ok(());
    };
    let err = e.into_service_error();
    if !err.is_conditional_check_failed_exception() {
        return Err(StoreError::Dynamo(err.to_string()));
    }

    let lookup = client
        .get_item()
        .table_name(table)
        .key("id", AttributeValue::S(id.to_string()))
        .consistent_read(true)
        .send()
        .await
        .map_err(|e| StoreError::Dynamo(e.into_service_error().to_string()))?;
    if lookup.item().is_some() {
        Err(StoreError::ConcurrentModification { id: id.to_string() })
    } else {
        Err(StoreError::NotFound { id: id.to_string() })
    }
}

async fn get_item(client: &Client, table: &str, id: &str) -> Result<Item, StoreError> {
    let resp = client
        .get_item()
        .table_name(table)
        .key("id", AttributeValue::S(id.to_string()))
        .consistent_read(true)
        .send()
        .await
        .map_err(|e| StoreError::Dynamo(e.into_service_error().to_string()))?;
    resp.item
        .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
}

async fn delete_item(client: &Client, table: &str, id: &str) -> Result<(), StoreError> {
    client
        .delete_item()
        .table_name(table)
        .key("id", AttributeValue::S(id.to_string()))
        .send()
        .await
        .map_err(|e| StoreError::Dynamo(e.into_service_error().to_string()))?;
    Ok(())
}

async fn query_index(
    client: &Client,
    table: &str,
    index: &str,
    key_attr: &str,
    value: AttributeValue,
    limit: i32,
) -> Result<Vec<Item>, StoreError> {
    let resp = client
        .query()
        .table_name(table)
        .index_name(index)
        .key_condition_expression("#k = :k")
        .expression_attribute_names("#k", key_attr)
        .expression_attribute_values(":k", value)
        .scan_index_forward(false)
        .limit(limit)
        .send()
        .await
        .map_err(|e| StoreError::Dynamo(e.into_service_error().to_string()))?;
    Ok(resp.items().to_vec())
}

impl RequestStore for DynamoRequestStore {
    fn create<'a>(&'a self, request: &'a Request) -> Bf<'a, Result<(), StoreError>> {
        Box::pin(async move {
            request.validate()?;
            let item = marshal::request_to_item(request);
            put_new(&self.client, &self.table, &request.id, item).await
        })
    }

    fn get<'a>(&'a self, id: &'a str) -> Bf<'a, Result<Request, StoreError>> {
        Box::pin(async move {
            let item = get_item(&self.client, &self.table, id).await?;
            marshal::request_from_item(&item)
        })
    }

    fn update<'a>(&'a self, request: &'a Request) -> Bf<'a, Result<Request, StoreError>> {
        Box::pin(async move {
            request.validate()?;
            let mut stored = request.clone();
            stored.updated_at = next_version(request.updated_at);
            let item = marshal::request_to_item(&stored);
            put_versioned(&self.client, &self.table, &request.id, request.updated_at, item)
                .await?;
            Ok(stored)
        })
    }

    fn delete<'a>(&'a self, id: &'a str) -> Bf<'a, Result<(), StoreError>> {
        Box::pin(async move { delete_item(&self.client, &self.table, id).await })
    }

    fn list_by_requester<'a>(
        &'a self,
        requester: &'a str,
        limit: i32,
    ) -> Bf<'a, Result<Vec<Request>, StoreError>> {
        Box::pin(async move {
            let items = query_index(
                &self.client,
                &self.table,
                "requester-index",
                "requester",
                AttributeValue::S(requester.to_string()),
                limit,
            )
            .await?;
            items.iter().map(marshal::request_from_item).collect()
        })
    }

    fn list_by_status<'a>(
        &'a self,
        status: RequestStatus,
        limit: i32,
    ) -> Bf<'a, Result<Vec<Request>, StoreError>> {
        Box::pin(async move {
            let items = query_index(
                &self.client,
                &self.table,
                "status-index",
                "status",
                AttributeValue::S(status.as_str().to_string()),
                limit,
            )
            .await?;
            items.iter().map(marshal::request_from_item).collect()
        })
    }

    fn list_by_profile<'a>(
        &'a self,
        profile: &'a str,
        limit: i32,
    ) -> Bf<'a, Result<Vec<Request>, StoreError>> {
        Box::pin(async move {
            let items = query_index(
                &self.client,
                &self.table,
                "profile-index",
                "profile",
                AttributeValue::S(profile.to_string()),
                limit,
            )
            .await?;
            items.iter().map(marshal::request_from_item).collect()
        })
    }
}

impl BreakGlassStore for DynamoBreakGlassStore {
    fn create<'a>(&'a self, event: &'a BreakGlassEvent) -> Bf<'a, Result<(), StoreError>> {
        Box::pin(async move {
            event.validate()?;
            if let Some(active) = self.find_active(&event.invoker, &event.profile).await? {
                tracing::warn!(
                    existing = %active.id,
                    invoker = %event.invoker,
                    profile = %event.profile,
                    "refusing break-glass create, an active event exists"
                );
                return Err(StoreError::ActiveExists {
                    invoker: event.invoker.clone(),
                    profile: event.profile.clone(),
                });
            }
            let item = marshal::break_glass_to_item(event);
            put_new(&self.client, &self.table, &event.id, item).await
        })
    }

    fn get<'a>(&'a self, id: &'a str) -> Bf<'a, Result<BreakGlassEvent, StoreError>> {
        Box::pin(async move {
            let item = get_item(&self.client, &self.table, id).await?;
            marshal::break_glass_from_item(&item)
        })
    }

    fn update<'a>(
        &'a self,
        event: &'a BreakGlassEvent,
    ) -> Bf<'a, Result<BreakGlassEvent, StoreError>> {
        Box::pin(async move {
            event.validate()?;
            let mut stored = event.clone();
            stored.updated_at = next_version(event.updated_at);
            let item = marshal::break_glass_to_item(&stored);
            put_versioned(&self.client, &self.table, &event.id, event.updated_at, item)
                .await?;
            Ok(stored)
        })
    }

    fn delete<'a>(&'a self, id: &'a str) -> Bf<'a, Result<(), StoreError>> {
        Box::pin(async move { delete_item(&self.client, &self.table, id).await })
    }

    fn list_by_invoker<'a>(
        &'a self,
        invoker: &'a str,
        limit: i32,
    ) -> Bf<'a, Result<Vec<BreakGlassEvent>, StoreError>> {
        Box::pin(async move {
            let items = query_index(
                &self.client,
                &self.table,
                "invoker-index",
                "invoker",
                AttributeValue::S(invoker.to_string()),
                limit,
            )
            .await?;
            items.iter().map(marshal::break_glass_from_item).collect()
        })
    }

    fn list_by_status<'a>(
        &'a self,
        status: BreakGlassStatus,
        limit: i32,
    ) -> Bf<'a, Result<Vec<BreakGlassEvent>, StoreError>> {
        Box::pin(async move {
            let items = query_index(
                &self.client,
                &self.table,
                "status-index",
                "status",
                AttributeValue::S(status.as_str().to_string()),
                limit,
            )
            .await?;
            items.iter().map(marshal::break_glass_from_item).collect()
        })
    }

    fn list_by_profile<'a>(
        &'a self,
        profile: &'a str,
        limit: i32,
    ) -> Bf<'a, Result<Vec<BreakGlassEvent>, StoreError>> {
        Box::pin(async move {
            let items = query_index(
                &self.client,
                &self.table,
                "profile-index",
                "profile",
                AttributeValue::S(profile.to_string()),
                limit,
            )
            .await?;
            items.iter().map(marshal::break_glass_from_item).collect()
        })
    }

    fn find_active<'a>(
        &'a self,
        invoker: &'a str,
        profile: &'a str,
    ) -> Bf<'a, Result<Option<BreakGlassEvent>, StoreError>> {
        Box::pin(async move {
            // A row whose expires_at has passed no longer counts as active,
            // even if the TTL purge has not caught up with it yet.
            let now = Timestamp::now();
            let resp = self
                .client
                .query()
                .table_name(&self.table)
                .index_name("invoker-index")
                .key_condition_expression("#i = :i")
                .filter_expression("#s = :active AND #p = :p AND expires_at_unix > :now")
                .expression_attribute_names("#i", "invoker")
                .expression_attribute_names("#s", "status")
                .expression_attribute_names("#p", "profile")
                .expression_attribute_values(":i", AttributeValue::S(invoker.to_string()))
                .expression_attribute_values(
                    ":active",
                    AttributeValue::S(BreakGlassStatus::Active.as_str().to_string()),
                )
                .expression_attribute_values(":p", AttributeValue::S(profile.to_string()))
                .expression_attribute_values(":now", AttributeValue::N(now.as_second().to_string()))
                .send()
                .await
                .map_err(|e| StoreError::Dynamo(e.into_service_error().to_string()))?;

            match resp.items().first() {
                Some(item) => Ok(Some(marshal::break_glass_from_item(item)?)),
                None => Ok(None),
            }
        })
    }
}

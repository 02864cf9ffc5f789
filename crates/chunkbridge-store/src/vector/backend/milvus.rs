//! Milvus vector store backend.
//!
//! Talks to the Milvus RESTful v2 API (`/v2/vectordb/...`), which Milvus
//! serves on the same port as gRPC. Every endpoint is a `POST` with a JSON
//! body and answers with an envelope of the form
//! `{"code": 0, "data": ..., "message": ...}`; a non-zero `code` is an error.

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, trace};

use super::super::schema::{
    CollectionDescription, CollectionSchema, FieldSchema, FieldType, IdRange, OutputFields,
};
use super::super::traits::{QueryRequest, VectorStore};
use crate::config::MilvusConfig;
use crate::error::{StoreError, StoreResult};
use crate::record::{ChunkRecord, FIELD_ID};

const STORE: &str = "Milvus";

/// Largest `limit` a single Milvus query accepts.
pub const MAX_QUERY_WINDOW: usize = 16_384;

/// Metric used for the embedding index.
const INDEX_METRIC: &str = "COSINE";

/// Milvus vector store over HTTP.
pub struct MilvusStore {
    client: Client,
    base_url: String,
}

impl MilvusStore {
    /// Connect to Milvus and verify the endpoint answers.
    pub fn connect(config: &MilvusConfig) -> StoreResult<Self> {
        let base_url = config.base_url();
        debug!("Connecting to Milvus at {}", base_url);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if !config.token.trim().is_empty() {
            let bearer = format!("Bearer {}", config.token.trim());
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&bearer).map_err(|e| StoreError::Config {
                    message: format!("invalid Milvus token: {}", e),
                })?,
            );
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| StoreError::connection(STORE, e.to_string()))?;

        let store = Self { client, base_url };
        store.list_collections()?;
        Ok(store)
    }

    /// Names of all collections in the default database.
    pub fn list_collections(&self) -> StoreResult<Vec<String>> {
        self.call("/v2/vectordb/collections/list", &json!({}))
    }

    /// POST `body` to `path` and unwrap the response envelope.
    fn call<T: DeserializeOwned>(&self, path: &str, body: &Value) -> StoreResult<T> {
        let url = format!("{}{}", self.base_url, path);
        trace!("POST {} {}", url, body);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            if status.is_server_error() {
                return Err(StoreError::connection(
                    STORE,
                    format!("{} from {}: {}", status, path, text),
                ));
            }
            return Err(StoreError::api(STORE, i64::from(status.as_u16()), text));
        }

        let envelope: Envelope = response.json().map_err(classify_transport)?;
        envelope.into_data(path)
    }
}

fn classify_transport(err: reqwest::Error) -> StoreError {
    if err.is_connect() || err.is_timeout() || err.is_request() || err.is_body() {
        StoreError::connection(STORE, err.to_string())
    } else {
        StoreError::decode("Milvus response", err.to_string())
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

impl Envelope {
    fn into_data<T: DeserializeOwned>(self, path: &str) -> StoreResult<T> {
        if self.code != 0 {
            return Err(StoreError::api(
                STORE,
                self.code,
                self.message.unwrap_or_default(),
            ));
        }
        let data = self.data.unwrap_or(Value::Null);
        serde_json::from_value(data).map_err(|e| StoreError::decode(path, e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct HasData {
    has: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertData {
    #[serde(default)]
    insert_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeData {
    #[serde(default)]
    collection_name: Option<String>,
    #[serde(default)]
    fields: Vec<DescribedField>,
    #[serde(default)]
    enable_dynamic_field: bool,
    #[serde(default)]
    load: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribedField {
    name: String,
    #[serde(rename = "type")]
    data_type: String,
    #[serde(default)]
    primary_key: bool,
    #[serde(default)]
    auto_id: bool,
    #[serde(default)]
    params: Vec<FieldParam>,
}

#[derive(Debug, Deserialize)]
struct FieldParam {
    key: String,
    value: Value,
}

impl FieldParam {
    fn as_number(&self) -> Option<u64> {
        match &self.value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl DescribedField {
    fn into_schema(self) -> FieldSchema {
        let param = |key: &str| {
            self.params
                .iter()
                .find(|p| p.key == key)
                .and_then(FieldParam::as_number)
        };
        FieldSchema {
            max_length: param("max_length").and_then(|v| u32::try_from(v).ok()),
            dim: param("dim").and_then(|v| usize::try_from(v).ok()),
            name: self.name,
            data_type: FieldType::parse(&self.data_type),
            is_primary: self.primary_key,
            auto_id: self.auto_id,
        }
    }
}

impl DescribeData {
    fn into_description(self, requested: &str) -> CollectionDescription {
        CollectionDescription {
            name: self
                .collection_name
                .unwrap_or_else(|| requested.to_string()),
            schema: CollectionSchema {
                fields: self
                    .fields
                    .into_iter()
                    .map(DescribedField::into_schema)
                    .collect(),
                enable_dynamic_field: self.enable_dynamic_field,
            },
            load_state: self.load,
        }
    }
}

fn create_body(name: &str, schema: &CollectionSchema) -> Value {
    let fields: Vec<Value> = schema
        .fields
        .iter()
        .map(|f| {
            let mut field = json!({
                "fieldName": f.name,
                "dataType": f.data_type.as_str(),
            });
            if f.is_primary {
                field["isPrimary"] = json!(true);
            }
            let mut params = serde_json::Map::new();
            if let Some(max_length) = f.max_length {
                params.insert("max_length".to_string(), json!(max_length));
            }
            if let Some(dim) = f.dim {
                params.insert("dim".to_string(), json!(dim));
            }
            if !params.is_empty() {
                field["elementTypeParams"] = Value::Object(params);
            }
            field
        })
        .collect();

    let index_params: Vec<Value> = schema
        .fields
        .iter()
        .filter(|f| f.data_type == FieldType::FloatVector)
        .map(|f| {
            json!({
                "fieldName": f.name,
                "indexName": f.name,
                "metricType": INDEX_METRIC,
                "indexType": "AUTOINDEX",
            })
        })
        .collect();

    json!({
        "collectionName": name,
        "schema": {
            "autoId": schema.fields.iter().any(|f| f.is_primary && f.auto_id),
            "enabledDynamicField": schema.enable_dynamic_field,
            "fields": fields,
        },
        "indexParams": index_params,
    })
}

// ============================================================================
// VectorStore impl
// ============================================================================

impl VectorStore for MilvusStore {
    fn has_collection(&self, name: &str) -> StoreResult<bool> {
        let data: HasData =
            self.call("/v2/vectordb/collections/has", &json!({ "collectionName": name }))?;
        Ok(data.has)
    }

    fn drop_collection(&self, name: &str) -> StoreResult<()> {
        debug!("Dropping collection '{}'", name);
        let _: Value =
            self.call("/v2/vectordb/collections/drop", &json!({ "collectionName": name }))?;
        Ok(())
    }

    fn create_collection(&self, name: &str, schema: &CollectionSchema) -> StoreResult<()> {
        debug!("Creating collection '{}' ({} fields)", name, schema.fields.len());
        let _: Value = self.call("/v2/vectordb/collections/create", &create_body(name, schema))?;
        Ok(())
    }

    fn describe_collection(&self, name: &str) -> StoreResult<CollectionDescription> {
        if !self.has_collection(name)? {
            return Err(StoreError::CollectionNotFound {
                name: name.to_string(),
            });
        }
        let data: DescribeData = self.call(
            "/v2/vectordb/collections/describe",
            &json!({ "collectionName": name }),
        )?;
        Ok(data.into_description(name))
    }

    fn load_collection(&self, name: &str) -> StoreResult<()> {
        let _: Value =
            self.call("/v2/vectordb/collections/load", &json!({ "collectionName": name }))?;
        Ok(())
    }

    fn flush(&self, name: &str) -> StoreResult<()> {
        let _: Value =
            self.call("/v2/vectordb/collections/flush", &json!({ "collectionName": name }))?;
        Ok(())
    }

    fn count(&self, name: &str) -> StoreResult<u64> {
        // count(*) sees growing segments; collection stats only see sealed ones.
        let rows: Vec<Value> = self.call(
            "/v2/vectordb/entities/query",
            &json!({
                "collectionName": name,
                "filter": "",
                "outputFields": ["count(*)"],
            }),
        )?;
        rows.first()
            .and_then(|row| row.get("count(*)"))
            .and_then(|v| match v {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            })
            .ok_or_else(|| StoreError::decode("count(*) result", format!("{:?}", rows)))
    }

    fn insert(&self, name: &str, rows: &[ChunkRecord]) -> StoreResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        debug!("Inserting {} rows into '{}'", rows.len(), name);
        let data: InsertData = self.call(
            "/v2/vectordb/entities/insert",
            &json!({
                "collectionName": name,
                "data": rows,
            }),
        )?;
        Ok(data.insert_count.unwrap_or(rows.len()))
    }

    fn query(&self, name: &str, request: &QueryRequest) -> StoreResult<Vec<ChunkRecord>> {
        if request.range.is_empty() || request.limit == 0 {
            return Ok(Vec::new());
        }
        let limit = request.limit.min(MAX_QUERY_WINDOW);
        trace!("Querying '{}' range={} limit={}", name, request.range, limit);

        let rows: Vec<Value> = self.call(
            "/v2/vectordb/entities/query",
            &json!({
                "collectionName": name,
                "filter": request.range.filter_expr(),
                "outputFields": request.fields.names(),
                "limit": limit,
            }),
        )?;

        decode_rows(rows, request.fields)
    }

    fn max_id(&self, name: &str) -> StoreResult<Option<i64>> {
        self.extreme_id(name, "", Extreme::Max)
    }

    fn min_id(&self, name: &str, range: IdRange) -> StoreResult<Option<i64>> {
        if range.is_empty() {
            return Ok(None);
        }
        self.extreme_id(name, &range.filter_expr(), Extreme::Min)
    }
}

impl MilvusStore {
    /// Smallest or largest id matching `base`.
    ///
    /// Query results are unordered, so keep asking for anything beyond the
    /// best id seen so far until a page brings nothing better.
    fn extreme_id(&self, name: &str, base: &str, extreme: Extreme) -> StoreResult<Option<i64>> {
        let mut best: Option<i64> = None;
        loop {
            let rows: Vec<Value> = self.call(
                "/v2/vectordb/entities/query",
                &json!({
                    "collectionName": name,
                    "filter": narrowing_filter(base, best, extreme),
                    "outputFields": [FIELD_ID],
                    "limit": MAX_QUERY_WINDOW,
                }),
            )?;
            match improve(best, rows, extreme) {
                Some(id) => best = Some(id),
                None => return Ok(best),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extreme {
    Min,
    Max,
}

/// `base` restricted to ids beyond `best` in the search direction.
fn narrowing_filter(base: &str, best: Option<i64>, extreme: Extreme) -> String {
    let beyond = best.map(|id| match extreme {
        Extreme::Min => format!("{FIELD_ID} < {id}"),
        Extreme::Max => format!("{FIELD_ID} > {id}"),
    });
    match (base.is_empty(), beyond) {
        (true, None) => String::new(),
        (true, Some(beyond)) => beyond,
        (false, None) => base.to_string(),
        (false, Some(beyond)) => format!("({}) && {}", base, beyond),
    }
}

/// Fold an id-only page into `best`. `None` means the page did not improve
/// on it and the search is over.
fn improve(best: Option<i64>, rows: Vec<Value>, extreme: Extreme) -> Option<i64> {
    let ids = rows
        .into_iter()
        .filter_map(|row| serde_json::from_value::<IdOnly>(row).ok())
        .map(|row| row.id);
    let candidate = match extreme {
        Extreme::Min => ids.min(),
        Extreme::Max => ids.max(),
    }?;
    let better = match (best, extreme) {
        (None, _) => true,
        (Some(b), Extreme::Min) => candidate < b,
        (Some(b), Extreme::Max) => candidate > b,
    };
    better.then_some(candidate)
}

fn decode_rows(rows: Vec<Value>, fields: OutputFields) -> StoreResult<Vec<ChunkRecord>> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value::<ChunkRecord>(row)
                .map(|record| strip_embedding(record, fields))
                .map_err(|e| StoreError::decode("chunk row", e.to_string()))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct IdOnly {
    #[serde(deserialize_with = "crate::record::int_or_string")]
    id: i64,
}

/// Keep the embedding out of scalar-only requests even if the store sends it.
fn strip_embedding(mut row: ChunkRecord, fields: OutputFields) -> ChunkRecord {
    if !fields.includes_embedding() {
        row.embedding.clear();
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FIELD_EMBEDDING;

    #[test]
    fn test_envelope_error() {
        let envelope: Envelope = serde_json::from_value(json!({
            "code": 100,
            "message": "collection not found[collection=chunk]"
        }))
        .unwrap();
        let err = envelope.into_data::<Value>("/x").unwrap_err();
        assert!(matches!(err, StoreError::Api { code: 100, .. }));
        assert!(!err.is_connection());
    }

    #[test]
    fn test_envelope_has() {
        let envelope: Envelope =
            serde_json::from_value(json!({ "code": 0, "data": { "has": true } })).unwrap();
        let data: HasData = envelope.into_data("/has").unwrap();
        assert!(data.has);
    }

    #[test]
    fn test_describe_decoding() {
        let data: DescribeData = serde_json::from_value(json!({
            "collectionName": "chunk",
            "enableDynamicField": true,
            "load": "LoadStateLoaded",
            "fields": [
                { "name": "id", "type": "Int64", "primaryKey": true, "autoId": false },
                { "name": "text", "type": "VarChar",
                  "params": [{ "key": "max_length", "value": "65535" }] },
                { "name": "embedding", "type": "FloatVector",
                  "params": [{ "key": "dim", "value": "1536" }] },
                { "name": "meta", "type": "JSON" }
            ]
        }))
        .unwrap();

        let desc = data.into_description("chunk");
        assert_eq!(desc.name, "chunk");
        assert_eq!(desc.load_state.as_deref(), Some("LoadStateLoaded"));
        assert!(desc.schema.enable_dynamic_field);
        assert_eq!(desc.schema.embedding_dim(), Some(1536));
        assert!(desc.schema.field("id").unwrap().is_primary);
        assert_eq!(desc.schema.field("text").unwrap().max_length, Some(65_535));
        assert_eq!(
            desc.schema.field("meta").unwrap().data_type,
            FieldType::Other("JSON".to_string())
        );
    }

    #[test]
    fn test_create_body() {
        let body = create_body("chunk", &CollectionSchema::chunk(4));
        assert_eq!(body["collectionName"], "chunk");
        assert_eq!(body["schema"]["autoId"], false);
        assert_eq!(body["schema"]["enabledDynamicField"], true);

        let fields = body["schema"]["fields"].as_array().unwrap();
        assert_eq!(fields[0]["fieldName"], "id");
        assert_eq!(fields[0]["isPrimary"], true);
        let embedding = fields
            .iter()
            .find(|f| f["fieldName"] == FIELD_EMBEDDING)
            .unwrap();
        assert_eq!(embedding["elementTypeParams"]["dim"], 4);

        let index = &body["indexParams"][0];
        assert_eq!(index["fieldName"], "embedding");
        assert_eq!(index["indexType"], "AUTOINDEX");
    }

    #[test]
    fn test_max_search_stops_when_page_brings_nothing_higher() {
        let first = vec![
            json!({ "id": 7 }),
            json!({ "id": "450000000000000001" }),
            json!({ "id": 3 }),
        ];
        let best = improve(None, first, Extreme::Max);
        assert_eq!(best, Some(450_000_000_000_000_001));
        assert_eq!(
            narrowing_filter("", best, Extreme::Max),
            "id > 450000000000000001"
        );

        assert_eq!(improve(best, Vec::new(), Extreme::Max), None);
        assert_eq!(improve(best, vec![json!({ "id": 5 })], Extreme::Max), None);
        assert_eq!(improve(None, Vec::new(), Extreme::Max), None);
    }

    #[test]
    fn test_min_search_narrows_inside_the_range() {
        let range = IdRange::new(10, 1_000_000);
        assert_eq!(
            narrowing_filter(&range.filter_expr(), None, Extreme::Min),
            "id >= 10 && id < 1000000"
        );

        let best = improve(None, vec![json!({ "id": 900 }), json!({ "id": 40 })], Extreme::Min);
        assert_eq!(best, Some(40));
        assert_eq!(
            narrowing_filter(&range.filter_expr(), best, Extreme::Min),
            "(id >= 10 && id < 1000000) && id < 40"
        );
        assert_eq!(improve(best, vec![json!({ "id": 12 })], Extreme::Min), Some(12));
        assert_eq!(improve(Some(12), vec![json!({ "id": "bad" })], Extreme::Min), None);
    }

    #[test]
    fn test_decode_rows_drops_unrequested_embedding() {
        let rows = vec![json!({
            "id": "42",
            "document_id": 8,
            "chunk_index": 2,
            "text": "[doc_0008] chunk=2",
            "source": "mock://doc_0008",
            "created_at": "2025-01-01T00:00:00+00:00",
            "embedding": [0.25, -0.5]
        })];

        let scalars = decode_rows(rows.clone(), OutputFields::Scalars).unwrap();
        assert_eq!(scalars[0].id, 42);
        assert_eq!(scalars[0].source, "mock://doc_0008");
        assert!(scalars[0].embedding.is_empty());

        let all = decode_rows(rows, OutputFields::All).unwrap();
        assert_eq!(all[0].embedding, vec![0.25, -0.5]);

        let err = decode_rows(vec![json!({ "text": "no id" })], OutputFields::All).unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }
}

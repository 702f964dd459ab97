//! Shared test doubles for the indexer integration tests.

#![allow(dead_code)]

use std::cmp::Ordering as SortOrdering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use house_geocoder::MockGeoService;
use house_indexer::dispatcher::RetryDispatcher;
use house_indexer::errors::IngestError;
use house_indexer::loader::IndexReconciler;
use house_indexer::processor::DocumentAssembler;
use house_indexer::producer::OperationPublisher;
use house_record_repository::{
    AddressLevel, HouseDetailRecord, HouseRecord, InMemoryHouseRecordRepository, SupportAddress,
};
use house_search_repository::{AnalyzedToken, DeleteOutcome, SearchIndexError, SearchIndexProvider};
use house_search_shared::{HouseDocument, IndexOperation};

/// Search provider that keeps documents in memory and evaluates the query shapes the
/// indexer and the search service produce: `term`, `range` and `geo_bounding_box` filters,
/// sorting, paging, `terms` aggregations and completion suggestions. Keyword `should`
/// clauses only score, so they are ignored.
#[derive(Default)]
pub struct InMemorySearchProvider {
    documents: Mutex<BTreeMap<String, HouseDocument>>,
    calls: Mutex<Vec<String>>,
    failing_deletes: Mutex<HashSet<String>>,
    analyzer_tokens: Mutex<Option<Vec<AnalyzedToken>>>,
    fail_analyze: AtomicBool,
    fail_search: AtomicBool,
    unacknowledged_deletes: AtomicBool,
}

impl InMemorySearchProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Store a document under an arbitrary id, bypassing the call log.
    pub fn insert_raw(&self, doc_id: &str, document: HouseDocument) {
        self.documents
            .lock()
            .unwrap()
            .insert(doc_id.to_string(), document);
    }

    pub fn documents_for(&self, house_id: i64) -> Vec<(String, HouseDocument)> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, doc)| doc.house_id == house_id)
            .map(|(id, doc)| (id.clone(), doc.clone()))
            .collect()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Calls that change documents, in order.
    pub fn writes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| !call.starts_with("search") && !call.starts_with("analyze"))
            .collect()
    }

    pub fn fail_delete_of(&self, doc_id: &str) {
        self.failing_deletes
            .lock()
            .unwrap()
            .insert(doc_id.to_string());
    }

    pub fn set_analyzer_tokens(&self, tokens: Vec<AnalyzedToken>) {
        *self.analyzer_tokens.lock().unwrap() = Some(tokens);
    }

    pub fn set_fail_analyze(&self, fail: bool) {
        self.fail_analyze.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_search(&self, fail: bool) {
        self.fail_search.store(fail, Ordering::SeqCst);
    }

    pub fn set_unacknowledged_deletes(&self, value: bool) {
        self.unacknowledged_deletes.store(value, Ordering::SeqCst);
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

fn filters_of(query: &Value) -> Vec<Value> {
    if let Some(term) = query.get("term") {
        return vec![json!({ "term": term })];
    }
    query
        .pointer("/bool/filter")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn matches_filter(doc: &Value, filter: &Value) -> bool {
    if let Some(term) = filter.get("term").and_then(Value::as_object) {
        return term.iter().all(|(field, value)| &doc[field] == value);
    }
    if let Some(range) = filter.get("range").and_then(Value::as_object) {
        return range.iter().all(|(field, bounds)| {
            let Some(actual) = doc[field].as_f64() else {
                return false;
            };
            let above = bounds["gte"].as_f64().map_or(true, |min| actual >= min);
            let below = bounds["lte"].as_f64().map_or(true, |max| actual <= max);
            above && below
        });
    }
    if let Some(bbox) = filter.pointer("/geo_bounding_box/location") {
        let (Some(lat), Some(lon)) = (doc["location"]["lat"].as_f64(), doc["location"]["lon"].as_f64())
        else {
            return false;
        };
        let top = bbox["top_left"]["lat"].as_f64().unwrap_or(f64::MAX);
        let left = bbox["top_left"]["lon"].as_f64().unwrap_or(f64::MIN);
        let bottom = bbox["bottom_right"]["lat"].as_f64().unwrap_or(f64::MIN);
        let right = bbox["bottom_right"]["lon"].as_f64().unwrap_or(f64::MAX);
        return lat <= top && lat >= bottom && lon >= left && lon <= right;
    }
    panic!("unsupported filter in test provider: {}", filter);
}

fn compare_by(sort: &Value, a: &Value, b: &Value) -> SortOrdering {
    let Some((field, order)) = sort
        .get(0)
        .and_then(Value::as_object)
        .and_then(|clause| clause.iter().next())
    else {
        return SortOrdering::Equal;
    };
    let ordering = match (a[field].as_f64(), b[field].as_f64()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        _ => a[field].as_str().cmp(&b[field].as_str()),
    };
    if order["order"] == "desc" {
        ordering.reverse()
    } else {
        ordering
    }
}

#[async_trait]
impl SearchIndexProvider for InMemorySearchProvider {
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
        Ok(())
    }

    async fn create_document(&self, document: &HouseDocument) -> Result<(), SearchIndexError> {
        let doc_id = document.document_id();
        self.log(format!("create:{}", doc_id));
        let mut documents = self.documents.lock().unwrap();
        if documents.contains_key(&doc_id) {
            return Err(SearchIndexError::conflict(doc_id));
        }
        documents.insert(doc_id, document.clone());
        Ok(())
    }

    async fn index_document(&self, document: &HouseDocument) -> Result<(), SearchIndexError> {
        let doc_id = document.document_id();
        self.log(format!("index:{}", doc_id));
        self.documents
            .lock()
            .unwrap()
            .insert(doc_id, document.clone());
        Ok(())
    }

    async fn update_document(
        &self,
        doc_id: &str,
        document: &HouseDocument,
    ) -> Result<(), SearchIndexError> {
        self.log(format!("update:{}", doc_id));
        let mut documents = self.documents.lock().unwrap();
        let Some(existing) = documents.get_mut(doc_id) else {
            return Err(SearchIndexError::update(format!("{} not found", doc_id)));
        };

        // Partial update: top-level fields of `doc` overwrite, absent ones are kept
        let mut merged = serde_json::to_value(&*existing).unwrap();
        if let (Value::Object(stored), Value::Object(changes)) =
            (&mut merged, document.update_fields().unwrap())
        {
            stored.extend(changes);
        }
        *existing = serde_json::from_value(merged).unwrap();
        Ok(())
    }

    async fn delete_document(&self, doc_id: &str) -> Result<DeleteOutcome, SearchIndexError> {
        self.log(format!("delete:{}", doc_id));
        if self.failing_deletes.lock().unwrap().contains(doc_id) {
            return Err(SearchIndexError::delete(format!("{} is locked", doc_id)));
        }
        if self.unacknowledged_deletes.load(Ordering::SeqCst) {
            return Ok(DeleteOutcome {
                shards_total: 0,
                found: false,
            });
        }
        let found = self.documents.lock().unwrap().remove(doc_id).is_some();
        Ok(DeleteOutcome {
            shards_total: 1,
            found,
        })
    }

    async fn analyze(&self, texts: &[String]) -> Result<Vec<AnalyzedToken>, SearchIndexError> {
        self.log("analyze".to_string());
        if self.fail_analyze.load(Ordering::SeqCst) {
            return Err(SearchIndexError::analyze("analyzer unavailable"));
        }
        if let Some(tokens) = self.analyzer_tokens.lock().unwrap().clone() {
            return Ok(tokens);
        }
        Ok(texts
            .iter()
            .flat_map(|text| text.split_whitespace())
            .map(|token| AnalyzedToken::new(token, "CN_WORD"))
            .collect())
    }

    async fn search(&self, body: &Value) -> Result<Value, SearchIndexError> {
        self.log("search".to_string());
        if self.fail_search.load(Ordering::SeqCst) {
            return Err(SearchIndexError::search(
                "Search failed with status 503 Service Unavailable",
            ));
        }

        let documents: Vec<(String, Value)> = self
            .documents
            .lock()
            .unwrap()
            .iter()
            .map(|(id, doc)| (id.clone(), serde_json::to_value(doc).unwrap()))
            .collect();

        if let Some(suggest) = body.get("suggest").and_then(Value::as_object) {
            let mut named = serde_json::Map::new();
            for (name, request) in suggest {
                let prefix = request["prefix"].as_str().unwrap_or_default();
                let size = request["completion"]["size"].as_u64().unwrap_or(5) as usize;
                let skip_duplicates = request["completion"]["skip_duplicates"] == json!(true);
                let mut seen = HashSet::new();
                let options: Vec<Value> = documents
                    .iter()
                    .flat_map(|(_, doc)| doc["suggest"].as_array().cloned().unwrap_or_default())
                    .filter_map(|s| s["input"].as_str().map(str::to_string))
                    .filter(|input| input.starts_with(prefix))
                    .filter(|input| !skip_duplicates || seen.insert(input.clone()))
                    .take(size)
                    .map(|text| json!({ "text": text }))
                    .collect();
                named.insert(name.clone(), json!([{ "text": prefix, "options": options }]));
            }
            return Ok(json!({ "hits": { "total": { "value": 0 }, "hits": [] }, "suggest": named }));
        }

        let query = body.get("query").cloned().unwrap_or(Value::Null);
        let filters = filters_of(&query);

        let mut matched: Vec<(String, Value)> = documents
            .into_iter()
            .filter(|(_, doc)| filters.iter().all(|f| matches_filter(doc, f)))
            .collect();
        let total = matched.len();

        let mut aggregations = serde_json::Map::new();
        if let Some(aggs) = body.get("aggs").and_then(Value::as_object) {
            for (name, agg) in aggs {
                let field = agg["terms"]["field"].as_str().unwrap_or_default();
                let mut counts: HashMap<String, u64> = HashMap::new();
                for (_, doc) in &matched {
                    if let Some(key) = doc[field].as_str() {
                        *counts.entry(key.to_string()).or_default() += 1;
                    }
                }
                let mut buckets: Vec<(String, u64)> = counts.into_iter().collect();
                buckets.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
                let buckets: Vec<Value> = buckets
                    .into_iter()
                    .map(|(key, count)| json!({ "key": key, "doc_count": count }))
                    .collect();
                aggregations.insert(name.clone(), json!({ "buckets": buckets }));
            }
        }

        if let Some(sort) = body.get("sort") {
            matched.sort_by(|(_, a), (_, b)| compare_by(sort, a, b));
        }

        let from = body["from"].as_u64().unwrap_or(0) as usize;
        let size = body["size"].as_u64().unwrap_or(10) as usize;
        let with_source = body["_source"] != json!(false);

        let hits: Vec<Value> = matched
            .into_iter()
            .skip(from)
            .take(size)
            .map(|(id, doc)| {
                if with_source {
                    json!({ "_id": id, "_source": { "house_id": doc["house_id"] } })
                } else {
                    json!({ "_id": id })
                }
            })
            .collect();

        Ok(json!({
            "hits": { "total": { "value": total }, "hits": hits },
            "aggregations": aggregations
        }))
    }
}

/// Publisher that records every operation instead of sending it.
#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<IndexOperation>>,
    fail: AtomicBool,
    failures_left: AtomicUsize,
}

impl RecordingPublisher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn published(&self) -> Vec<IndexOperation> {
        self.published.lock().unwrap().clone()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Fail only the next `count` publishes.
    pub fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl OperationPublisher for RecordingPublisher {
    async fn publish(&self, operation: &IndexOperation) -> Result<(), IngestError> {
        let failing_once = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing_once || self.fail.load(Ordering::SeqCst) {
            return Err(IngestError::publish("broker unreachable"));
        }
        self.published.lock().unwrap().push(*operation);
        Ok(())
    }
}

pub fn house(id: i64, price: i32, area: i32) -> HouseRecord {
    HouseRecord {
        id,
        title: "望京 精装 两居".to_string(),
        price,
        area,
        room: 2,
        floor: 5,
        direction: 2,
        distance_to_subway: 450,
        city_en_name: "bj".to_string(),
        region_en_name: "cy".to_string(),
        district: "望京".to_string(),
        street: "阜通东大街".to_string(),
        create_time: Utc::now(),
        last_update_time: Utc::now(),
    }
}

pub fn detail(house_id: i64) -> HouseDetailRecord {
    HouseDetailRecord {
        house_id,
        description: Some("南北 通透".to_string()),
        layout_desc: Some("两室 一厅".to_string()),
        traffic: Some("近14号线".to_string()),
        round_service: Some("商场 超市".to_string()),
        rent_way: 0,
        detail_address: "6号院".to_string(),
        subway_line_name: Some("14号线".to_string()),
        subway_station_name: Some("阜通".to_string()),
    }
}

fn address(en_name: &str, cn_name: &str, level: AddressLevel) -> SupportAddress {
    SupportAddress {
        id: 1,
        belong_to: "bj".to_string(),
        en_name: en_name.to_string(),
        cn_name: cn_name.to_string(),
        level: level.as_str().to_string(),
    }
}

/// A record store with the Beijing / Chaoyang reference data and no houses.
pub fn record_store() -> Arc<InMemoryHouseRecordRepository> {
    let records = Arc::new(InMemoryHouseRecordRepository::new());
    records.insert_address(address("bj", "北京", AddressLevel::City));
    records.insert_address(address("cy", "朝阳区", AddressLevel::Region));
    records
}

/// Add a house with its detail to the store.
pub fn seed_house(records: &InMemoryHouseRecordRepository, house: HouseRecord) {
    let id = house.id;
    records.insert_house(house);
    records.insert_detail(detail(id));
    records.insert_tags(id, vec!["近地铁".to_string()]);
}

/// The whole write path wired to in-memory collaborators.
pub struct Pipeline {
    pub records: Arc<InMemoryHouseRecordRepository>,
    pub search: Arc<InMemorySearchProvider>,
    pub geo: Arc<MockGeoService>,
    pub publisher: Arc<RecordingPublisher>,
    pub dispatcher: RetryDispatcher,
}

impl Pipeline {
    pub fn new() -> Self {
        let records = record_store();
        let search = InMemorySearchProvider::new();
        let geo = Arc::new(MockGeoService::new());
        let publisher = RecordingPublisher::new();

        let dispatcher = RetryDispatcher::new(
            DocumentAssembler::new(records.clone(), geo.clone()),
            IndexReconciler::new(search.clone(), geo.clone()),
            publisher.clone(),
        );

        Self {
            records,
            search,
            geo,
            publisher,
            dispatcher,
        }
    }

    pub fn reconciler(&self) -> IndexReconciler {
        IndexReconciler::new(self.search.clone(), self.geo.clone())
    }
}

pub fn payload(operation: &IndexOperation) -> Vec<u8> {
    operation.encode().unwrap()
}

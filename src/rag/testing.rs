//! In-memory `VectorIndex` used by tests across the crate.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::store::{Selection, VectorIndex};
use crate::core::errors::RagError;

#[derive(Default)]
pub struct InMemoryIndex {
    objects: Mutex<Vec<(String, Value)>>,
    next_id: AtomicUsize,
    scripted_search: Mutex<Option<Value>>,
    pub fail_reads: AtomicBool,
    pub batch_inserts: AtomicUsize,
    pub replaces: AtomicUsize,
    pub deletes: AtomicUsize,
    pub batch_deletes: AtomicUsize,
    pub searches: Mutex<Vec<String>>,
    pub near_text_args: Mutex<Vec<(f32, usize)>>,
    pub chapter_lookups: Mutex<Vec<(String, Selection, Option<usize>)>>,
    /// Report every matched object as failed and keep it.
    pub partial_deletes: AtomicBool,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `near_text` call return `envelope` verbatim.
    pub fn script_search(&self, envelope: Value) {
        *self.scripted_search.lock().unwrap() = Some(envelope);
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn chapters(&self) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .map(|(_, p)| p["chapter"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    pub fn properties(&self, id: &str) -> Option<Value> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .find(|(oid, _)| oid == id)
            .map(|(_, p)| p.clone())
    }

    fn project(id: &str, properties: &Value, selection: Selection) -> Value {
        match selection {
            Selection::Chapter => json!({ "chapter": properties["chapter"] }),
            Selection::Id => json!({ "_additional": { "id": id } }),
            Selection::Document => json!({
                "chapter": properties["chapter"],
                "subsections": properties["subsections"],
            }),
        }
    }

    fn envelope(items: Vec<Value>) -> Value {
        json!({ "data": { "Get": { "Book": items } } })
    }

    fn words(text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    fn class_name(&self) -> &str {
        "Book"
    }

    async fn find_by_chapter(
        &self,
        chapter: &str,
        selection: Selection,
        limit: Option<usize>,
    ) -> Result<Value, RagError> {
        self.chapter_lookups
            .lock()
            .unwrap()
            .push((chapter.to_string(), selection, limit));
        let objects = self.objects.lock().unwrap();
        let items: Vec<Value> = objects
            .iter()
            .filter(|(_, p)| p["chapter"] == chapter)
            .take(limit.unwrap_or(usize::MAX))
            .map(|(id, p)| Self::project(id, p, selection))
            .collect();
        Ok(Self::envelope(items))
    }

    async fn near_text(
        &self,
        query: &str,
        max_distance: f32,
        limit: usize,
    ) -> Result<Value, RagError> {
        self.searches.lock().unwrap().push(query.to_string());
        self.near_text_args.lock().unwrap().push((max_distance, limit));
        if let Some(scripted) = self.scripted_search.lock().unwrap().take() {
            return Ok(scripted);
        }

        let query_words = Self::words(query);
        let objects = self.objects.lock().unwrap();
        let items: Vec<Value> = objects
            .iter()
            .filter(|(_, p)| {
                let text = p["subsections"]
                    .as_array()
                    .map(|subs| {
                        subs.iter()
                            .map(|s| {
                                format!(
                                    "{} {}",
                                    s["title"].as_str().unwrap_or_default(),
                                    s["content"].as_str().unwrap_or_default()
                                )
                            })
                            .collect::<Vec<_>>()
                            .join(" ")
                    })
                    .unwrap_or_default();
                let stored = Self::words(&text);
                query_words.iter().any(|w| stored.contains(w))
            })
            .take(limit)
            .map(|(id, p)| Self::project(id, p, Selection::Document))
            .collect();
        Ok(Self::envelope(items))
    }

    async fn create_batch(&self, objects: Vec<Value>) -> Result<Vec<Value>, RagError> {
        self.batch_inserts.fetch_add(1, Ordering::SeqCst);
        let mut stored = self.objects.lock().unwrap();
        let mut results = Vec::with_capacity(objects.len());
        for properties in objects {
            let id = format!("obj-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
            results.push(json!({ "id": id, "result": {} }));
            stored.push((id, properties));
        }
        Ok(results)
    }

    async fn get_object(&self, id: &str) -> Result<Option<Value>, RagError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RagError::upstream(
                format!("read object {}", id),
                "connection reset",
            ));
        }
        Ok(self
            .properties(id)
            .map(|p| json!({ "id": id, "class": "Book", "properties": p })))
    }

    async fn replace_object(&self, id: &str, properties: Value) -> Result<(), RagError> {
        self.replaces.fetch_add(1, Ordering::SeqCst);
        let mut objects = self.objects.lock().unwrap();
        if let Some(entry) = objects.iter_mut().find(|(oid, _)| oid == id) {
            entry.1 = properties;
        }
        Ok(())
    }

    async fn delete_object(&self, id: &str) -> Result<(), RagError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.objects.lock().unwrap().retain(|(oid, _)| oid != id);
        Ok(())
    }

    async fn delete_where_chapter(&self, chapter: &str) -> Result<Value, RagError> {
        self.batch_deletes.fetch_add(1, Ordering::SeqCst);
        let mut objects = self.objects.lock().unwrap();
        if self.partial_deletes.load(Ordering::SeqCst) {
            let matched = objects.iter().filter(|(_, p)| p["chapter"] == chapter).count() as u64;
            return Ok(json!({
                "results": { "matches": matched, "successful": 0, "failed": matched }
            }));
        }
        let before = objects.len();
        objects.retain(|(_, p)| p["chapter"] != chapter);
        let removed = (before - objects.len()) as u64;
        Ok(json!({
            "results": { "matches": removed, "successful": removed, "failed": 0 }
        }))
    }
}

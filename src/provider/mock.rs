use super::{SentenceProvider, SentenceQuery};
use crate::models::SentenceRecord;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// In-memory provider. Applies the query's score bounds to its corpus the way
/// the sentence server does.
#[derive(Clone)]
pub struct MockSentenceProvider {
    sentences: Arc<Mutex<Vec<SentenceRecord>>>,
    should_fail: Arc<Mutex<bool>>,
    queries: Arc<Mutex<Vec<SentenceQuery>>>,
}

impl MockSentenceProvider {
    pub fn new() -> Self {
        Self {
            sentences: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(Mutex::new(false)),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_sentence(self, record: SentenceRecord) -> Self {
        self.sentences.lock().unwrap().push(record);
        self
    }

    pub fn with_sentences(self, records: Vec<SentenceRecord>) -> Self {
        self.sentences.lock().unwrap().extend(records);
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn get_queries(&self) -> Vec<SentenceQuery> {
        self.queries.lock().unwrap().clone()
    }
}

impl Default for MockSentenceProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SentenceProvider for MockSentenceProvider {
    async fn fetch_sentences(&self, query: &SentenceQuery) -> Result<Vec<SentenceRecord>> {
        self.queries.lock().unwrap().push(*query);

        if *self.should_fail.lock().unwrap() {
            return Err(Error::Provider("Mock failure".to_string()));
        }

        let sentences = self.sentences.lock().unwrap();
        Ok(sentences
            .iter()
            .filter(|r| query.min.map_or(true, |min| r.total_score >= min))
            .filter(|r| query.max.map_or(true, |max| r.total_score <= max))
            .cloned()
            .collect())
    }
}

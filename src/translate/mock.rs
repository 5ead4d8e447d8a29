use super::TranslationService;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Scripted translator. Clones share responses and counters, so a test can
/// keep a probe after handing the client to a session.
#[derive(Clone)]
pub struct MockTranslationClient {
    responses: Arc<Mutex<Vec<String>>>,
    should_fail: Arc<Mutex<bool>>,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockTranslationClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(Mutex::new(false)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_response(self, response: String) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// `(sentence, language)` pairs in call order.
    pub fn get_requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockTranslationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranslationService for MockTranslationClient {
    async fn translate(&self, sentence: &str, language: &str) -> Result<String> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push((sentence.to_string(), language.to_string()));
            requests.len()
        };

        if *self.should_fail.lock().unwrap() {
            return Err(Error::Translation("Mock failure".to_string()));
        }

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(format!("[{}] {}", language, sentence))
        } else {
            Ok(responses[(call - 1) % responses.len()].clone())
        }
    }
}

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
};

use aggregatable_attribution::encryption::traits::{Clock, HttpResponse, HttpTransport};

/// Transport replaying canned responses in order, recording requested URIs.
#[derive(Default)]
pub struct ScriptedTransport {
    pub responses: RefCell<VecDeque<Result<HttpResponse, String>>>,
    pub requested: RefCell<Vec<String>>,
}

impl ScriptedTransport {
    pub fn respond(&self, response: Result<HttpResponse, String>) {
        self.responses.borrow_mut().push_back(response);
    }

    pub fn request_count(&self) -> usize {
        self.requested.borrow().len()
    }
}

impl HttpTransport for ScriptedTransport {
    type Error = String;

    fn get(&self, uri: &str) -> Result<HttpResponse, String> {
        self.requested.borrow_mut().push(uri.to_string());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err("connection refused".to_string()))
    }
}

pub struct FixedClock(pub Cell<u64>);

impl FixedClock {
    pub fn new(now: u64) -> Self {
        Self(Cell::new(now))
    }

    pub fn advance(&self, millis: u64) {
        self.0.set(self.0.get() + millis);
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.0.get()
    }
}

pub fn keys_response(ids: &[&str], max_age: u64) -> Result<HttpResponse, String> {
    let keys: Vec<String> = ids
        .iter()
        .map(|id| format!(r#"{{"id":"{id}","key":"pk-{id}"}}"#))
        .collect();
    Ok(HttpResponse::new(200, format!(r#"{{"keys":[{}]}}"#, keys.join(",")))
        .with_header("Cache-Control", format!("max-age={max_age}")))
}

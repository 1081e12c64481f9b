//! Scripted in-memory card source for engine tests.

use std::collections::VecDeque;
use std::ops::Range;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::sync::{oneshot, watch};

use crate::clients::{CardSource, FetchError};
use crate::domain::PageRequest;
use crate::models::CardImage;

struct Step {
    result: Result<Vec<CardImage>, FetchError>,
    gate: Option<oneshot::Receiver<()>>,
}

/// Answers fetches from a queue of scripted responses, in call order.
/// Gated responses are held back until their sender fires.
pub(crate) struct ScriptedSource {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<PageRequest>>,
    fetches: watch::Sender<usize>,
}

impl ScriptedSource {
    pub(crate) fn new() -> Arc<Self> {
        let (fetches, _) = watch::channel(0);
        Arc::new(Self {
            steps: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            fetches,
        })
    }

    fn push(&self, result: Result<Vec<CardImage>, FetchError>, gated: bool) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.steps.lock().unwrap().push_back(Step {
            result,
            gate: gated.then_some(rx),
        });
        tx
    }

    pub(crate) fn push_ok(&self, items: Vec<CardImage>) {
        self.push(Ok(items), false);
    }

    pub(crate) fn push_err(&self, status: u16) {
        self.push(Err(status_error(status)), false);
    }

    pub(crate) fn push_gated(&self, items: Vec<CardImage>) -> oneshot::Sender<()> {
        self.push(Ok(items), true)
    }

    pub(crate) fn push_gated_err(&self, status: u16) -> oneshot::Sender<()> {
        self.push(Err(status_error(status)), true)
    }

    pub(crate) fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Resolves once at least `count` fetches have started.
    pub(crate) async fn wait_for_fetches(&self, count: usize) {
        let mut rx = self.fetches.subscribe();
        let _ = rx.wait_for(|started| *started >= count).await;
    }
}

fn status_error(status: u16) -> FetchError {
    FetchError::Status {
        status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        body: String::new(),
    }
}

#[async_trait]
impl CardSource for ScriptedSource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<CardImage>, FetchError> {
        let step = {
            self.requests.lock().unwrap().push(request.clone());
            self.steps.lock().unwrap().pop_front()
        };
        self.fetches.send_modify(|started| *started += 1);

        let Some(step) = step else {
            return Err(FetchError::Malformed("script exhausted".to_string()));
        };

        if let Some(gate) = step.gate {
            let _ = gate.await;
        }
        step.result
    }
}

/// Cards keyed `{prefix}-{n}` for every `n` in `range`.
pub(crate) fn cards(prefix: &str, range: Range<usize>) -> Vec<CardImage> {
    range
        .map(|n| {
            let mut card = CardImage::with_key(&format!("{prefix}-{n}"));
            card.card_title = format!("Card {n}");
            card.card_number = format!("{}/200", n + 1);
            card
        })
        .collect()
}

//! In-memory stand-ins for the network clients, shared by unit tests here and
//! by the server and CLI test suites.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::data::{DataClientError, MarketRecord, MarketSource, WeatherObservation, WeatherSource};
use crate::llm::{CompletionClient, ImagePayload};

#[derive(Clone, Debug)]
struct RecordedCall {
    prompt: String,
    image: Option<ImagePayload>,
}

/// Completion client that replays scripted replies in order, then echoes the
/// prompt once the script runs out. Every call is recorded.
#[derive(Debug, Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedCompletion {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            calls: Mutex::default(),
        }
    }

    pub fn echo() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|call| call.prompt.clone())
            .collect()
    }

    pub fn images_seen(&self) -> Vec<bool> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|call| call.image.is_some())
            .collect()
    }

    pub fn last_image(&self) -> Option<ImagePayload> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .and_then(|call| call.image.clone())
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(&self, prompt: &str, image: Option<&ImagePayload>) -> String {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall { prompt: prompt.to_string(), image: image.cloned() });
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| prompt.to_string())
    }
}

#[derive(Debug)]
pub struct StaticWeather {
    result: Result<WeatherObservation, DataClientError>,
    calls: AtomicUsize,
}

impl StaticWeather {
    pub fn returning(observation: WeatherObservation) -> Self {
        Self { result: Ok(observation), calls: AtomicUsize::new(0) }
    }

    pub fn failing(error: DataClientError) -> Self {
        Self { result: Err(error), calls: AtomicUsize::new(0) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherSource for StaticWeather {
    async fn current(&self, _city: &str) -> Result<WeatherObservation, DataClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

#[derive(Debug)]
pub struct StaticMarket {
    result: Result<Vec<MarketRecord>, DataClientError>,
    calls: AtomicUsize,
}

impl StaticMarket {
    pub fn returning(records: Vec<MarketRecord>) -> Self {
        Self { result: Ok(records), calls: AtomicUsize::new(0) }
    }

    pub fn failing(error: DataClientError) -> Self {
        Self { result: Err(error), calls: AtomicUsize::new(0) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketSource for StaticMarket {
    async fn prices(
        &self,
        _commodity: &str,
        _market: &str,
    ) -> Result<Vec<MarketRecord>, DataClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

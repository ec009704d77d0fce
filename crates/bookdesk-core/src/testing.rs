//! Scripted accessor for tests.
//!
//! Each call pops the next scripted reply. A reply is either ready or gated
//! on a oneshot channel, which lets a test decide the order in which
//! concurrent calls resolve.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::oneshot;

use crate::api::{ApiError, DetailSource, ListSource};
use crate::models::{BookingRequest, BookingStatus, GalleryItem, Record, StatusRecord};

enum Reply<T> {
    Ready(Result<T, ApiError>),
    Gated(oneshot::Receiver<Result<T, ApiError>>),
}

impl<T> Reply<T> {
    async fn resolve(self) -> Result<T, ApiError> {
        match self {
            Reply::Ready(result) => result,
            Reply::Gated(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ApiError::Remote("gate dropped".to_string()))),
        }
    }
}

pub struct ScriptedSource<R: Record> {
    fetch_replies: Mutex<VecDeque<Reply<Vec<R>>>>,
    update_replies: Mutex<VecDeque<Reply<()>>>,
    detail_replies: Mutex<VecDeque<Reply<R>>>,
    details: Mutex<HashMap<R::Id, R>>,
    fetch_log: Mutex<Vec<String>>,
    update_log: Mutex<Vec<(Vec<R::Id>, String)>>,
    detail_log: Mutex<Vec<R::Id>>,
}

impl<R: Record> ScriptedSource<R> {
    pub fn new() -> Self {
        Self {
            fetch_replies: Mutex::new(VecDeque::new()),
            update_replies: Mutex::new(VecDeque::new()),
            detail_replies: Mutex::new(VecDeque::new()),
            details: Mutex::new(HashMap::new()),
            fetch_log: Mutex::new(Vec::new()),
            update_log: Mutex::new(Vec::new()),
            detail_log: Mutex::new(Vec::new()),
        }
    }

    pub fn push_fetch(&self, result: Result<Vec<R>, ApiError>) {
        self.fetch_replies.lock().unwrap().push_back(Reply::Ready(result));
    }

    pub fn gate_fetch(&self) -> oneshot::Sender<Result<Vec<R>, ApiError>> {
        let (tx, rx) = oneshot::channel();
        self.fetch_replies.lock().unwrap().push_back(Reply::Gated(rx));
        tx
    }

    pub fn push_update(&self, result: Result<(), ApiError>) {
        self.update_replies.lock().unwrap().push_back(Reply::Ready(result));
    }

    pub fn gate_update(&self) -> oneshot::Sender<Result<(), ApiError>> {
        let (tx, rx) = oneshot::channel();
        self.update_replies.lock().unwrap().push_back(Reply::Gated(rx));
        tx
    }

    pub fn insert_detail(&self, record: R) {
        self.details.lock().unwrap().insert(record.id(), record);
    }

    pub fn gate_detail(&self) -> oneshot::Sender<Result<R, ApiError>> {
        let (tx, rx) = oneshot::channel();
        self.detail_replies.lock().unwrap().push_back(Reply::Gated(rx));
        tx
    }

    pub fn fetch_calls(&self) -> Vec<String> {
        self.fetch_log.lock().unwrap().clone()
    }

    pub fn update_calls(&self) -> Vec<(Vec<R::Id>, String)> {
        self.update_log.lock().unwrap().clone()
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_log.lock().unwrap().len()
    }

    fn next_update(&self, ids: Vec<R::Id>, status: String) -> Reply<()> {
        self.update_log.lock().unwrap().push((ids, status));
        self.update_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Ready(Ok(())))
    }
}

#[async_trait]
impl<R: StatusRecord> ListSource<R> for ScriptedSource<R> {
    async fn fetch_by_filter(&self, status: R::Status) -> Result<Vec<R>, ApiError> {
        self.fetch_log.lock().unwrap().push(status.to_string());
        let reply = self
            .fetch_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Ready(Ok(Vec::new())));
        reply.resolve().await
    }

    async fn update_status(&self, id: &R::Id, status: R::Status) -> Result<(), ApiError> {
        let reply = self.next_update(vec![id.clone()], status.to_string());
        reply.resolve().await
    }

    async fn update_status_many(&self, ids: &[R::Id], status: R::Status) -> Result<(), ApiError> {
        let reply = self.next_update(ids.to_vec(), status.to_string());
        reply.resolve().await
    }
}

#[async_trait]
impl<R: Record> DetailSource<R> for ScriptedSource<R> {
    async fn fetch_by_id(&self, id: &R::Id) -> Result<R, ApiError> {
        self.detail_log.lock().unwrap().push(id.clone());
        let scripted = self.detail_replies.lock().unwrap().pop_front();
        match scripted {
            Some(reply) => reply.resolve().await,
            None => self
                .details
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| ApiError::NotFound(format!("record {}", id))),
        }
    }
}

pub fn booking(id: i64, status: BookingStatus) -> BookingRequest {
    BookingRequest {
        id,
        name: format!("Guest {}", id),
        email: format!("guest{}@example.com", id),
        phone: None,
        event_type: Some("Wedding".to_string()),
        event_date: None,
        guest_count: Some(50),
        message: None,
        status,
        created_at: Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap(),
    }
}

pub fn bookings(ids: impl IntoIterator<Item = i64>, status: BookingStatus) -> Vec<BookingRequest> {
    ids.into_iter().map(|id| booking(id, status)).collect()
}

pub fn gallery_item(id: &str) -> GalleryItem {
    GalleryItem {
        id: id.to_string(),
        title: format!("Gallery {}", id),
        description: None,
        cover_image: None,
        images: vec![format!("{}/01.jpg", id)],
        created_at: Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap(),
    }
}

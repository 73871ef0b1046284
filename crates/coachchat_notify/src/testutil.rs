//! In-memory fakes shared by this crate's tests.

use chrono::Utc;
use coachchat_common::models::{
    LocalNotification, NotificationLogEntry, Platform, RegisteredDevice, UserActivity,
};
use coachchat_common::services::{BoxFuture, BoxedError, NotificationScheduler, RemotePushGateway};
use coachchat_common::models::PermissionStatus;
use coachchat_db::{DbError, NotificationLogRepository, PushTokenRepository, UserActivityRepository};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

pub(crate) struct MemoryActivityRepo {
    fail: bool,
    pub upserts: Mutex<Vec<UserActivity>>,
    pub notify: Mutex<Option<UnboundedSender<UserActivity>>>,
}

impl MemoryActivityRepo {
    pub fn new() -> Self {
        Self {
            fail: false,
            upserts: Mutex::new(Vec::new()),
            notify: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            upserts: Mutex::new(Vec::new()),
            notify: Mutex::new(None),
        }
    }

    pub fn with_notify(tx: UnboundedSender<UserActivity>) -> Self {
        Self {
            fail: false,
            upserts: Mutex::new(Vec::new()),
            notify: Mutex::new(Some(tx)),
        }
    }
}

impl UserActivityRepository for MemoryActivityRepo {
    async fn init_schema(&self) -> Result<(), DbError> {
        Ok(())
    }

    async fn upsert(&self, activity: UserActivity) -> Result<UserActivity, DbError> {
        if self.fail {
            return Err(DbError::QueryError("storage offline".to_string()));
        }
        self.upserts.lock().unwrap().push(activity.clone());
        if let Some(tx) = self.notify.lock().unwrap().as_ref() {
            let _ = tx.send(activity.clone());
        }
        Ok(activity)
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Option<UserActivity>, DbError> {
        Ok(self
            .upserts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.user_id == user_id)
            .max_by_key(|a| a.last_activity)
            .cloned())
    }

    async fn find_by_user_and_platform(
        &self,
        user_id: &str,
        platform: Platform,
    ) -> Result<Option<UserActivity>, DbError> {
        Ok(self
            .upserts
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|a| a.user_id == user_id && a.platform == platform)
            .cloned())
    }
}

pub(crate) struct MemoryTokenRepo {
    fail: bool,
    pub devices: Mutex<Vec<RegisteredDevice>>,
}

impl MemoryTokenRepo {
    pub fn new() -> Self {
        Self {
            fail: false,
            devices: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            devices: Mutex::new(Vec::new()),
        }
    }

    pub fn active_count(&self, user_id: &str) -> usize {
        self.devices
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.user_id == user_id && d.is_active)
            .count()
    }
}

impl PushTokenRepository for MemoryTokenRepo {
    async fn init_schema(&self) -> Result<(), DbError> {
        Ok(())
    }

    async fn upsert_token(&self, device: RegisteredDevice) -> Result<RegisteredDevice, DbError> {
        if self.fail {
            return Err(DbError::QueryError("storage offline".to_string()));
        }
        let mut devices = self.devices.lock().unwrap();
        for existing in devices.iter_mut() {
            if existing.user_id == device.user_id
                && existing.platform == device.platform
                && existing.is_active
            {
                existing.is_active = false;
            }
        }
        let mut stored = device;
        stored.id = Some(devices.len() as i64 + 1);
        stored.created_at = Some(Utc::now());
        devices.push(stored.clone());
        Ok(stored)
    }

    async fn find_active_by_user(&self, user_id: &str) -> Result<Vec<RegisteredDevice>, DbError> {
        if self.fail {
            return Err(DbError::QueryError("storage offline".to_string()));
        }
        Ok(self
            .devices
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.user_id == user_id && d.is_active)
            .cloned()
            .collect())
    }

    async fn find_active_by_user_and_platform(
        &self,
        user_id: &str,
        platform: Platform,
    ) -> Result<Option<RegisteredDevice>, DbError> {
        Ok(self
            .devices
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.user_id == user_id && d.platform == platform && d.is_active)
            .cloned())
    }

    async fn deactivate_tokens(&self, user_id: &str, platform: Platform) -> Result<bool, DbError> {
        let mut changed = false;
        for device in self.devices.lock().unwrap().iter_mut() {
            if device.user_id == user_id && device.platform == platform && device.is_active {
                device.is_active = false;
                changed = true;
            }
        }
        Ok(changed)
    }
}

pub(crate) struct MemoryLogRepo {
    pub entries: Mutex<Vec<NotificationLogEntry>>,
}

impl MemoryLogRepo {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn entries_for(&self, user_id: &str) -> Vec<NotificationLogEntry> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect()
    }
}

impl NotificationLogRepository for MemoryLogRepo {
    async fn init_schema(&self) -> Result<(), DbError> {
        Ok(())
    }

    async fn append(&self, entry: NotificationLogEntry) -> Result<NotificationLogEntry, DbError> {
        let mut entries = self.entries.lock().unwrap();
        let mut stored = entry;
        stored.id = Some(entries.len() as i64 + 1);
        stored.sent_at = Some(Utc::now());
        entries.push(stored.clone());
        Ok(stored)
    }

    async fn find_recent_by_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<NotificationLogEntry>, DbError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|e| e.user_id == user_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

/// Scheduler whose `schedule` always fails; permission is granted so the
/// dispatcher reaches the scheduling step.
pub(crate) struct FailingScheduler;

impl NotificationScheduler for FailingScheduler {
    type Error = BoxedError;

    fn permission_status(&self) -> BoxFuture<'_, PermissionStatus, Self::Error> {
        Box::pin(async { Ok(PermissionStatus::Granted) })
    }

    fn request_permission(&self) -> BoxFuture<'_, PermissionStatus, Self::Error> {
        Box::pin(async { Ok(PermissionStatus::Granted) })
    }

    fn schedule(&self, _notification: LocalNotification) -> BoxFuture<'_, String, Self::Error> {
        Box::pin(async { Err(BoxedError::msg("scheduling backend unavailable")) })
    }

    fn cancel(&self, _notification_id: &str) -> BoxFuture<'_, (), Self::Error> {
        Box::pin(async { Ok(()) })
    }

    fn cancel_all(&self) -> BoxFuture<'_, (), Self::Error> {
        Box::pin(async { Ok(()) })
    }
}

/// Gateway double that counts calls and either acks or fails.
pub(crate) struct MockGateway {
    succeed: bool,
    pub calls: AtomicUsize,
}

impl MockGateway {
    pub fn acking() -> Self {
        Self {
            succeed: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            succeed: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RemotePushGateway for MockGateway {
    type Error = BoxedError;

    fn dispatch(
        &self,
        _user_id: &str,
        _notification: &LocalNotification,
    ) -> BoxFuture<'_, String, Self::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let succeed = self.succeed;
        Box::pin(async move {
            if succeed {
                Ok("push-ack-1".to_string())
            } else {
                Err(BoxedError::msg("push provider unreachable"))
            }
        })
    }
}

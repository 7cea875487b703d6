//! Application context: one storage, the two stores and the session slot.
//!
//! The session is persisted under the `session` key as the logged-in user's
//! id so that separate `tb` invocations share a login.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::export::ExportDocument;
use crate::session::Session;
use crate::stats::{compute_stats, TaskStats};
use crate::storage::{Storage, SESSION_KEY};
use crate::task::{NewTask, Task, TaskPatch, TaskStore};
use crate::user::{CredentialHasher, IdentityStore, User};

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct SeedReport {
    pub demo_user_created: bool,
    pub demo_tasks_created: usize,
}

#[derive(Debug)]
pub struct App {
    config: Config,
    data_dir: Option<PathBuf>,
    storage: Storage,
    identity: IdentityStore,
    tasks: TaskStore,
    session: Session,
    seeded: SeedReport,
}

impl App {
    /// Open the data directory, seeding demo data when configured.
    pub fn open(data_dir: &Path) -> Result<Self> {
        let config = Config::load_from_dir(data_dir)?;
        let storage = Storage::open_dir(data_dir, config.storage.lock_timeout_ms)?;
        let mut app = Self::with_storage(storage, config)?;
        app.data_dir = Some(data_dir.to_path_buf());
        tracing::debug!(data_dir = %data_dir.display(), "app opened");
        Ok(app)
    }

    pub fn with_storage(storage: Storage, config: Config) -> Result<Self> {
        let hasher = CredentialHasher::new(&config.auth)?;
        let identity = IdentityStore::new(storage.clone(), hasher);
        let tasks = TaskStore::new(storage.clone());
        let mut app = Self {
            config,
            data_dir: None,
            storage,
            identity,
            tasks,
            session: Session::new(),
            seeded: SeedReport::default(),
        };
        if app.config.demo.seed {
            app.seeded = app.seed_demo(Utc::now())?;
        }
        app.restore_session()?;
        Ok(app)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn identity(&self) -> &IdentityStore {
        &self.identity
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// What demo seeding did while this app was opened
    pub fn seed_report(&self) -> SeedReport {
        self.seeded
    }

    /// Demo account first, then its tasks; both steps are no-ops once done.
    pub fn seed_demo(&self, now: DateTime<Utc>) -> Result<SeedReport> {
        let demo_user_created = self.identity.seed_demo()?;
        let demo_tasks_created = self.tasks.seed_demo_tasks(now)?;
        Ok(SeedReport {
            demo_user_created,
            demo_tasks_created,
        })
    }

    fn restore_session(&mut self) -> Result<()> {
        let user_id: Option<String> = self.storage.load(SESSION_KEY)?;
        let Some(user_id) = user_id else {
            return Ok(());
        };
        match self.identity.find_by_id(&user_id)? {
            Some(user) => self.session = Session::for_user(user),
            None => {
                tracing::warn!(user_id = %user_id, "dropping session for unknown user");
                self.storage.remove(SESSION_KEY)?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Identity
    // =========================================================================

    pub fn register(&self, email: &str, name: &str, secret: &str) -> Result<User> {
        self.identity.register(email, name, secret)
    }

    pub fn login(&mut self, email: &str, secret: &str) -> Result<User> {
        let user = self.session.login(&self.identity, email, secret)?;
        self.storage.save(SESSION_KEY, &Some(user.id.as_str()))?;
        Ok(user)
    }

    pub fn logout(&mut self) -> Result<()> {
        self.session.logout();
        self.storage.remove(SESSION_KEY)
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session.current_user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn require_user(&self) -> Result<User> {
        self.session.require_user().cloned()
    }

    pub fn rename_current(&mut self, name: &str) -> Result<User> {
        let user_id = self.session.require_user()?.id.clone();
        let user = self.identity.rename(&user_id, name)?;
        self.session.refresh(&user);
        Ok(user)
    }

    // =========================================================================
    // Tasks for the session user
    // =========================================================================

    pub fn my_tasks(&self) -> Result<Vec<Task>> {
        let user = self.session.require_user()?;
        self.tasks.list_for_user(&user.id)
    }

    /// A task owned by the session user; other users' tasks read as missing.
    pub fn my_task(&self, task_id: &str) -> Result<Task> {
        let user = self.session.require_user()?;
        self.tasks
            .get(task_id)?
            .filter(|task| task.user_id == user.id)
            .ok_or_else(|| Error::NotFound(task_id.to_string()))
    }

    pub fn create_task(&self, new: NewTask) -> Result<Task> {
        let user = self.session.require_user()?;
        self.tasks.create(&user.id, new)
    }

    pub fn update_task(&self, task_id: &str, patch: TaskPatch) -> Result<Task> {
        self.my_task(task_id)?;
        self.tasks
            .update(task_id, patch)?
            .ok_or_else(|| Error::NotFound(task_id.to_string()))
    }

    pub fn delete_task(&self, task_id: &str) -> Result<()> {
        self.my_task(task_id)?;
        if self.tasks.delete(task_id)? {
            Ok(())
        } else {
            Err(Error::NotFound(task_id.to_string()))
        }
    }

    pub fn stats(&self, as_of: DateTime<Utc>) -> Result<TaskStats> {
        Ok(compute_stats(&self.my_tasks()?, as_of))
    }

    pub fn export(&self, as_of: DateTime<Utc>) -> Result<ExportDocument> {
        let user = self.require_user()?;
        let tasks = self.tasks.list_for_user(&user.id)?;
        Ok(ExportDocument::build(user, tasks, as_of))
    }
}

//! Admin fixture with scripted collaborators
//!
//! Tests drive the public service facades only; the scripted directory and
//! capturing sink let them steer remote outcomes and observe notifications.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use classhub::repo::{RepoError, RepoResult};
use classhub::{
    AuditTrail, CacheConfig, CoherencyStore, Department, DepartmentService, DirectoryCommand,
    DirectoryExecutor, DirectoryOutcome, FixedPrincipal, GenerationMap, InMemoryOperationStore,
    InMemoryRepository, NotificationSink, Repository, SchoolUser, SchoolYear, SchoolYearService,
    ServiceContext, Subject, SubjectService, Team, TeamService, TeamTemplate, TemplateService,
    UserRole, UserService,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Planned response for the next directory command.
#[derive(Debug, Clone)]
pub enum Plan {
    Accept,
    Reject(String),
    Transport(String),
}

/// Directory executor with a plan queue. Commands pop the next plan; an
/// empty queue accepts with a fabricated remote id, like the dry-run
/// executor.
#[derive(Default)]
pub struct ScriptedDirectory {
    plans: Mutex<VecDeque<Plan>>,
    executed: Mutex<Vec<DirectoryCommand>>,
    counter: AtomicU64,
}

impl ScriptedDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, plan: Plan) {
        self.plans.lock().push_back(plan);
    }

    pub fn reject_next(&self, message: &str) {
        self.push(Plan::Reject(message.to_string()));
    }

    pub fn fail_next(&self, message: &str) {
        self.push(Plan::Transport(message.to_string()));
    }

    pub fn executed(&self) -> Vec<DirectoryCommand> {
        self.executed.lock().clone()
    }

    pub fn executed_count(&self) -> usize {
        self.executed.lock().len()
    }

    fn fabricate_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("remote-{}", n)
    }
}

#[async_trait]
impl DirectoryExecutor for ScriptedDirectory {
    async fn execute(
        &self,
        command: DirectoryCommand,
    ) -> Result<DirectoryOutcome, classhub::directory::DirectoryError> {
        let plan = self.plans.lock().pop_front().unwrap_or(Plan::Accept);
        self.executed.lock().push(command.clone());

        match plan {
            Plan::Accept => {
                let remote_id = match command {
                    DirectoryCommand::CreateTeam { .. }
                    | DirectoryCommand::CreateChannel { .. }
                    | DirectoryCommand::CreateUser { .. } => Some(self.fabricate_id()),
                    _ => None,
                };
                Ok(DirectoryOutcome::accepted(remote_id))
            }
            Plan::Reject(message) => Ok(DirectoryOutcome::rejected(message)),
            Plan::Transport(message) => {
                Err(classhub::directory::DirectoryError::Transport(message))
            }
        }
    }
}

/// Sink that captures every delivered notification.
#[derive(Default)]
pub struct CapturingSink {
    messages: Mutex<Vec<(String, String)>>,
}

impl CapturingSink {
    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().clone()
    }

    pub fn last_message(&self) -> Option<String> {
        self.messages.lock().last().map(|(_, m)| m.clone())
    }
}

#[async_trait]
impl NotificationSink for CapturingSink {
    async fn deliver(
        &self,
        recipient: &str,
        message: &str,
    ) -> Result<(), classhub::notify::NotifyError> {
        self.messages
            .lock()
            .push((recipient.to_string(), message.to_string()));
        Ok(())
    }
}

/// Repository wrapper that can be switched into a failing state to simulate
/// a broken persistence layer.
pub struct FlakyRepo<T> {
    inner: InMemoryRepository<T>,
    failing: AtomicBool,
}

impl<T> FlakyRepo<T>
where
    T: classhub::model::Entity + Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self {
            inner: InMemoryRepository::new(),
            failing: AtomicBool::new(false),
        }
    }

    pub fn seed(&self, entity: T) {
        self.inner.seed(entity);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> RepoResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(RepoError::Storage("simulated storage outage".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<T> Repository<T> for FlakyRepo<T>
where
    T: classhub::model::Entity + Clone + Send + Sync,
{
    async fn get(&self, id: Uuid) -> RepoResult<Option<T>> {
        self.check()?;
        self.inner.get(id).await
    }

    async fn list(&self) -> RepoResult<Vec<T>> {
        self.check()?;
        self.inner.list().await
    }

    async fn find(&self, predicate: &(dyn for<'a> Fn(&'a T) -> bool + Send + Sync)) -> RepoResult<Vec<T>> {
        self.check()?;
        self.inner.find(predicate).await
    }

    async fn add(&self, entity: T) -> RepoResult<()> {
        self.check()?;
        self.inner.add(entity).await
    }

    async fn update(&self, entity: T) -> RepoResult<()> {
        self.check()?;
        self.inner.update(entity).await
    }
}

/// Fully wired in-memory deployment of the administration core.
pub struct AdminFixture {
    pub store: Arc<CoherencyStore>,
    pub generations: Arc<GenerationMap>,
    pub audit: Arc<AuditTrail>,
    pub op_store: Arc<InMemoryOperationStore>,
    pub directory: Arc<ScriptedDirectory>,
    pub sink: Arc<CapturingSink>,

    pub departments_repo: Arc<InMemoryRepository<Department>>,
    pub users_repo: Arc<InMemoryRepository<SchoolUser>>,
    pub years_repo: Arc<InMemoryRepository<SchoolYear>>,
    pub subjects_repo: Arc<InMemoryRepository<Subject>>,
    pub templates_repo: Arc<InMemoryRepository<TeamTemplate>>,
    pub teams_repo: Arc<InMemoryRepository<Team>>,

    pub departments: DepartmentService,
    pub users: UserService,
    pub years: SchoolYearService,
    pub subjects: SubjectService,
    pub templates: TemplateService,
    pub teams: TeamService,
}

impl AdminFixture {
    pub fn new() -> Self {
        Self::with_principal("admin@school.edu")
    }

    pub fn with_principal(principal: &str) -> Self {
        init_logging();

        let generations = Arc::new(GenerationMap::new());
        let store = Arc::new(
            CoherencyStore::new(CacheConfig::default(), Arc::clone(&generations))
                .expect("default cache config"),
        );
        let op_store = Arc::new(InMemoryOperationStore::new());
        let audit = Arc::new(AuditTrail::new(
            Arc::clone(&op_store) as Arc<dyn classhub::audit::OperationStore>,
            Arc::new(FixedPrincipal(principal.to_string())),
        ));
        let directory = Arc::new(ScriptedDirectory::new());
        let sink = Arc::new(CapturingSink::default());

        let ctx = ServiceContext::new(
            Arc::clone(&store),
            Arc::clone(&audit),
            Arc::clone(&sink) as Arc<dyn NotificationSink>,
        );

        let departments_repo = Arc::new(InMemoryRepository::new());
        let users_repo = Arc::new(InMemoryRepository::new());
        let years_repo = Arc::new(InMemoryRepository::new());
        let subjects_repo = Arc::new(InMemoryRepository::new());
        let templates_repo = Arc::new(InMemoryRepository::new());
        let teams_repo = Arc::new(InMemoryRepository::new());

        let dyn_departments: Arc<dyn Repository<Department>> = departments_repo.clone();
        let dyn_users: Arc<dyn Repository<SchoolUser>> = users_repo.clone();
        let dyn_years: Arc<dyn Repository<SchoolYear>> = years_repo.clone();
        let dyn_subjects: Arc<dyn Repository<Subject>> = subjects_repo.clone();
        let dyn_templates: Arc<dyn Repository<TeamTemplate>> = templates_repo.clone();
        let dyn_teams: Arc<dyn Repository<Team>> = teams_repo.clone();
        let dyn_directory: Arc<dyn DirectoryExecutor> = directory.clone();

        let departments = DepartmentService::new(
            ctx.clone(),
            Arc::clone(&dyn_departments),
            Arc::clone(&dyn_users),
        );
        let users = UserService::new(
            ctx.clone(),
            Arc::clone(&dyn_users),
            Arc::clone(&dyn_departments),
            Arc::clone(&dyn_directory),
        );
        let years = SchoolYearService::new(ctx.clone(), Arc::clone(&dyn_years));
        let subjects = SubjectService::new(
            ctx.clone(),
            Arc::clone(&dyn_subjects),
            Arc::clone(&dyn_departments),
        );
        let templates = TemplateService::new(ctx.clone(), Arc::clone(&dyn_templates));
        let teams = TeamService::new(
            ctx,
            dyn_teams,
            dyn_templates,
            dyn_users,
            dyn_years,
            dyn_directory,
        );

        Self {
            store,
            generations,
            audit,
            op_store,
            directory,
            sink,
            departments_repo,
            users_repo,
            years_repo,
            subjects_repo,
            templates_repo,
            teams_repo,
            departments,
            users,
            years,
            subjects,
            templates,
            teams,
        }
    }

    /// A fresh context over the fixture's singletons, for wiring extra
    /// service instances against special repositories.
    pub fn ctx(&self) -> ServiceContext {
        ServiceContext::new(
            Arc::clone(&self.store),
            Arc::clone(&self.audit),
            Arc::clone(&self.sink) as Arc<dyn NotificationSink>,
        )
    }

    /// Seed a user directly into the repository, bypassing the directory.
    pub fn seed_user(&self, display_name: &str, role: UserRole) -> SchoolUser {
        let upn = format!("user{}@school.edu", fastrand::u64(..));
        let user = SchoolUser::new(display_name, upn, role);
        self.users_repo.seed(user.clone());
        user
    }

    /// Seed a department directly into the repository.
    pub fn seed_department(&self, name: &str) -> Department {
        let department = Department::new(name);
        self.departments_repo.seed(department.clone());
        department
    }

    /// Seed a template directly into the repository.
    pub fn seed_template(&self, name: &str, channels: &[&str]) -> TeamTemplate {
        let template =
            TeamTemplate::new(name, channels.iter().map(|c| c.to_string()).collect());
        self.templates_repo.seed(template.clone());
        template
    }
}

use chrono::NaiveDate;
use gigboard_core::{
    set_json, system_clock, Campaign, Frequency, KvProjectRepository, KvStore, Project,
    ProjectRepository, Recurrence, RecurrenceEngine, RecurrenceScheduler, Sprint, SqliteKvStore,
    SweepReport, Task, TaskStatus,
};
use std::sync::Arc;
use std::time::Duration;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const T0: i64 = 1_704_067_200_000; // 2024-01-01T00:00:00Z

type Repo = KvProjectRepository<Arc<SqliteKvStore>>;

fn repo() -> Repo {
    KvProjectRepository::new(Arc::new(SqliteKvStore::open_in_memory().expect("open in-memory store")))
}

fn project_with(tasks: Vec<Task>) -> Project {
    let day = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
    let mut campaign = Campaign::new("Chores", day, day);
    campaign.tasks = tasks;
    let mut sprint = Sprint::new("January", day, day);
    sprint.campaigns.push(campaign);
    let mut project = Project::new("employer-1", "Dorm upkeep", T0);
    project.sprints.push(sprint);
    project
}

fn recurring(title: &str, frequency: Frequency, status: TaskStatus, last_reset_at: i64) -> Task {
    let mut task = Task::new(title, 2_000, T0);
    task.recurrence = Some(Recurrence::new(frequency, last_reset_at));
    task.set_status(status, last_reset_at);
    task
}

fn only_task(project: &Project) -> &Task {
    project.tasks().next().expect("project has a task")
}

#[test]
fn elapsed_window_resets_status_and_advances() {
    let repo = repo();
    let project = project_with(vec![recurring(
        "Take out trash",
        Frequency::Daily,
        TaskStatus::Completed,
        T0,
    )]);
    repo.save_project(&project).expect("save project");

    let engine = RecurrenceEngine::new(repo);
    let now = T0 + 3 * DAY_MS + 5;
    let report = engine.sweep(now).expect("sweep");
    assert_eq!(
        report,
        SweepReport {
            projects_scanned: 1,
            tasks_reset: 1,
            projects_written: 1,
        }
    );
}

#[test]
fn reset_is_persisted_with_latest_boundary() {
    let store = Arc::new(SqliteKvStore::open_in_memory().expect("open in-memory store"));
    let repo = KvProjectRepository::new(Arc::clone(&store));
    let project = project_with(vec![recurring(
        "Take out trash",
        Frequency::Daily,
        TaskStatus::Completed,
        T0,
    )]);
    repo.save_project(&project).expect("save project");

    let now = T0 + 3 * DAY_MS + 5;
    RecurrenceEngine::new(KvProjectRepository::new(Arc::clone(&store)))
        .sweep(now)
        .expect("sweep");

    let stored = repo.load_project(project.id).expect("load project").expect("project exists");
    let task = only_task(&stored);
    assert_eq!(task.status, TaskStatus::Open);
    assert_eq!(task.completed_at, None);
    assert_eq!(task.recurrence.expect("task is recurring").last_reset_at, T0 + 3 * DAY_MS);
    assert_eq!(stored.updated_at, now);
}

#[test]
fn open_window_leaves_project_untouched() {
    let store = Arc::new(SqliteKvStore::open_in_memory().expect("open in-memory store"));
    let repo = KvProjectRepository::new(Arc::clone(&store));
    let project = project_with(vec![
        recurring("Weekly report", Frequency::Weekly, TaskStatus::Completed, T0),
        Task::new("One-off poster", 3_000, T0),
    ]);
    repo.save_project(&project).expect("save project");

    let report = RecurrenceEngine::new(KvProjectRepository::new(Arc::clone(&store)))
        .sweep(T0 + 6 * DAY_MS)
        .expect("sweep");
    assert_eq!(report.tasks_reset, 0);
    assert_eq!(report.projects_written, 0);

    let stored = repo.load_project(project.id).expect("load project").expect("project exists");
    assert_eq!(stored, project);
}

#[test]
fn cancelled_task_keeps_status_but_window_moves() {
    let store = Arc::new(SqliteKvStore::open_in_memory().expect("open in-memory store"));
    let repo = KvProjectRepository::new(Arc::clone(&store));
    let project = project_with(vec![recurring(
        "Retired chore",
        Frequency::Daily,
        TaskStatus::Cancelled,
        T0,
    )]);
    repo.save_project(&project).expect("save project");

    let report = RecurrenceEngine::new(KvProjectRepository::new(Arc::clone(&store)))
        .sweep(T0 + DAY_MS)
        .expect("sweep");
    assert_eq!(report.tasks_reset, 0);
    assert_eq!(report.projects_written, 1);

    let stored = repo.load_project(project.id).expect("load project").expect("project exists");
    let task = only_task(&stored);
    assert_eq!(task.status, TaskStatus::Cancelled);
    assert_eq!(task.recurrence.expect("task is recurring").last_reset_at, T0 + DAY_MS);
}

#[test]
fn reset_restores_configured_initial_status() {
    let store = Arc::new(SqliteKvStore::open_in_memory().expect("open in-memory store"));
    let repo = KvProjectRepository::new(Arc::clone(&store));
    let mut task = recurring("Monthly invoice", Frequency::Monthly, TaskStatus::Submitted, T0);
    if let Some(recurrence) = task.recurrence.as_mut() {
        recurrence.initial_status = TaskStatus::InProgress;
    }
    let project = project_with(vec![task]);
    repo.save_project(&project).expect("save project");

    // 2024-02-01T00:00:00Z
    let february = T0 + 31 * DAY_MS;
    RecurrenceEngine::new(KvProjectRepository::new(Arc::clone(&store)))
        .sweep(february)
        .expect("sweep");

    let stored = repo.load_project(project.id).expect("load project").expect("project exists");
    let task = only_task(&stored);
    assert_eq!(task.status, TaskStatus::InProgress);
    assert_eq!(task.recurrence.expect("task is recurring").last_reset_at, february);
}

#[test]
fn scheduler_sweeps_before_stopping() {
    let store = Arc::new(SqliteKvStore::open_in_memory().expect("open in-memory store"));
    let repo = KvProjectRepository::new(Arc::clone(&store));
    let two_days_ago = system_clock() - 2 * DAY_MS;
    let project = project_with(vec![recurring(
        "Feed the cat",
        Frequency::Daily,
        TaskStatus::Completed,
        two_days_ago,
    )]);
    repo.save_project(&project).expect("save project");

    let engine = Arc::new(RecurrenceEngine::new(KvProjectRepository::new(Arc::clone(
        &store,
    ))));
    let handle = RecurrenceScheduler::start(engine, Duration::from_secs(3600))
        .expect("start scheduler");
    handle.stop();

    let stored = repo.load_project(project.id).expect("load project").expect("project exists");
    assert_eq!(only_task(&stored).status, TaskStatus::Open);
}

#[test]
fn unreadable_project_does_not_block_other_resets() {
    let store = Arc::new(SqliteKvStore::open_in_memory().expect("open in-memory store"));
    let repo = KvProjectRepository::new(Arc::clone(&store));
    let project = project_with(vec![recurring(
        "Take out trash",
        Frequency::Daily,
        TaskStatus::Completed,
        T0,
    )]);
    repo.save_project(&project).expect("save project");
    store
        .set_raw("project:ffffffff-ffff-4fff-8fff-ffffffffffff", "{broken")
        .expect("write raw value");

    let report = RecurrenceEngine::new(KvProjectRepository::new(Arc::clone(&store)))
        .sweep(T0 + 3 * DAY_MS)
        .expect("sweep should skip the unreadable project");
    assert_eq!(report.projects_scanned, 1);
    assert_eq!(report.tasks_reset, 1);

    let stored = repo
        .load_project(project.id)
        .expect("load project")
        .expect("project exists");
    assert_eq!(only_task(&stored).status, TaskStatus::Open);
}

#[test]
fn duplicate_task_ids_are_still_swept() {
    let store = Arc::new(SqliteKvStore::open_in_memory().expect("open in-memory store"));
    let repo = KvProjectRepository::new(Arc::clone(&store));
    let task = recurring("Water plants", Frequency::Daily, TaskStatus::Completed, T0);
    let project = project_with(vec![task.clone(), task]);
    set_json(&*store, &format!("project:{}", project.id), &project).expect("write json value");

    let report = RecurrenceEngine::new(KvProjectRepository::new(Arc::clone(&store)))
        .sweep(T0 + DAY_MS)
        .expect("sweep");
    assert_eq!(report.tasks_reset, 2);
    assert_eq!(report.projects_written, 1);

    let stored = repo
        .load_project(project.id)
        .expect("duplicate ids should load")
        .expect("project exists");
    assert!(stored.tasks().all(|task| task.status == TaskStatus::Open));
}

use chrono::{Duration, Local};
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct DayStats {
    percentage: u8,
    is_streak: bool,
    completed: usize,
    total: usize,
}

#[derive(Debug, Deserialize)]
struct HabitView {
    id: String,
    done: bool,
}

#[derive(Debug, Deserialize)]
struct DayResponse {
    date: String,
    stats: DayStats,
    habits: Vec<HabitView>,
    tasks: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct StreakResponse {
    streak: u32,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("on_track_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + std::time::Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/streak")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(std::time::Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_on_track"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

fn days_ago(days: i64) -> String {
    (Local::now().date_naive() - Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}

/// Replaces the server state so each test starts from a known snapshot.
async fn reset(client: &Client, server: &TestServer, snapshot: Value) {
    let response = client
        .post(format!("{}/api/import", server.base_url))
        .body(snapshot.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

fn two_habits() -> Value {
    json!({
        "user": { "name": "Tester", "avatar": "", "goals": "" },
        "habits": [
            { "id": "A", "title": "Pray", "created_at": "2024-01-01" },
            { "id": "B", "title": "Read", "created_at": "2024-01-01" }
        ],
        "tasks": [],
        "habitLogs": {}
    })
}

#[tokio::test]
async fn http_habit_toggle_updates_day_stats() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    reset(&client, &server, two_habits()).await;

    let day: DayResponse = client
        .post(format!("{}/api/habits/A/toggle?date=2024-01-02", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(day.date, "2024-01-02");
    assert_eq!(day.stats.completed, 1);
    assert_eq!(day.stats.total, 2);
    assert_eq!(day.stats.percentage, 50);
    assert!(!day.stats.is_streak);
    assert!(day.habits.iter().any(|h| h.id == "A" && h.done));

    let day: DayResponse = client
        .post(format!("{}/api/habits/B/toggle?date=2024-01-02", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(day.stats.completed, 2);
    assert_eq!(day.stats.percentage, 100);
    assert!(day.stats.is_streak);
}

#[tokio::test]
async fn http_streak_counts_previous_days() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    reset(
        &client,
        &server,
        json!({
            "user": { "name": "Tester" },
            "habits": [{ "id": "h", "title": "Walk", "created_at": "2000-01-01" }],
            "tasks": [],
            "habitLogs": {
                days_ago(1): { "habitIds": ["h"] },
                days_ago(2): { "habitIds": ["h"] },
                days_ago(4): { "habitIds": ["h"] }
            }
        }),
    )
    .await;

    let streak: StreakResponse = client
        .get(format!("{}/api/streak", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(streak.streak, 2);

    client
        .post(format!("{}/api/habits/h/toggle", server.base_url))
        .send()
        .await
        .unwrap();
    let streak: StreakResponse = client
        .get(format!("{}/api/streak", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(streak.streak, 3);
}

#[tokio::test]
async fn http_task_lifecycle() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    reset(&client, &server, two_habits()).await;

    let response = client
        .post(format!("{}/api/tasks", server.base_url))
        .json(&json!({ "title": "Write report", "type": "weekly", "date": "2024-01-02" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let task: Value = response.json().await.unwrap();
    let id = task["id"].as_str().unwrap().to_string();
    assert_eq!(task["completed"], false);
    assert_eq!(task["type"], "weekly");

    let day: DayResponse = client
        .post(format!("{}/api/tasks/{id}/toggle", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(day.date, "2024-01-02");
    assert_eq!(day.tasks.len(), 1);
    assert_eq!(day.stats.total, 3);
    assert_eq!(day.stats.completed, 1);

    let renamed: Value = client
        .put(format!("{}/api/tasks/{id}", server.base_url))
        .json(&json!({ "title": "Send report" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(renamed["title"], "Send report");

    let weekly: Vec<Value> = client
        .get(format!("{}/api/tasks?filter=weekly", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(weekly.len(), 1);

    let response = client
        .delete(format!("{}/api/tasks/{id}", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let all: Vec<Value> = client
        .get(format!("{}/api/tasks?filter=all", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn http_unknown_ids_and_bad_input_are_rejected() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    reset(&client, &server, two_habits()).await;

    let response = client
        .post(format!("{}/api/tasks/missing/toggle", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .delete(format!("{}/api/habits/missing", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .get(format!("{}/api/day?date=2024-1-2", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/api/habits", server.base_url))
        .json(&json!({ "title": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_invalid_import_keeps_state() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    reset(&client, &server, two_habits()).await;

    let before: Value = client
        .get(format!("{}/api/export", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let response = client
        .post(format!("{}/api/import", server.base_url))
        .body(r#"{"user":{"name":"x"},"habits":[]}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let after: Value = client
        .get(format!("{}/api/export", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(before, after);
    assert_eq!(after["habits"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn http_habit_and_profile_edits() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    reset(&client, &server, two_habits()).await;

    let response = client
        .post(format!("{}/api/habits", server.base_url))
        .json(&json!({ "title": "Stretch", "date": "2024-02-01" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let habit: Value = response.json().await.unwrap();
    assert_eq!(habit["created_at"], "2024-02-01");

    let before_creation: DayResponse = client
        .get(format!("{}/api/day?date=2024-01-31", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(before_creation.stats.total, 2);

    let response = client
        .delete(format!("{}/api/habits/B", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let renamed: Value = client
        .put(format!("{}/api/habits/A", server.base_url))
        .json(&json!({ "title": "Morning Prayer" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(renamed["title"], "Morning Prayer");

    let profile: Value = client
        .patch(format!("{}/api/profile", server.base_url))
        .json(&json!({ "field": "goals", "value": "Finish the marathon" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["goals"], "Finish the marathon");
    assert_eq!(profile["name"], "Tester");

    let calendar: Value = client
        .get(format!("{}/api/calendar?year=2024&month=2", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(calendar["days"].as_array().unwrap().len(), 29);
}

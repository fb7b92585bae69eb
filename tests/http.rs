use reqwest::{redirect::Policy, Client, StatusCode};
use serde::Deserialize;
use std::net::TcpListener;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct Day {
    comment: String,
}

#[derive(Debug, Deserialize)]
struct Habit {
    id: u64,
    icon: String,
    name: String,
    target: u32,
    days: Vec<Day>,
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    habits: Vec<Habit>,
    active_habit_id: Option<u64>,
    location: String,
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

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn state(&self) -> Snapshot {
        Client::new()
            .get(self.url("/api/state"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    async fn page(&self) -> String {
        Client::new()
            .get(self.url("/"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap()
    }

    /// Posts a form without following the redirect; returns its location.
    async fn post(&self, path: &str, form: &[(&str, &str)]) -> String {
        let client = Client::builder().redirect(Policy::none()).build().unwrap();
        let response = client.post(self.url(path)).form(form).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "POST {path}");
        response
            .headers()
            .get("location")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }
}

#[cfg(unix)]
mod cleanup {
    use std::sync::{Mutex, Once};

    static REGISTER: Once = Once::new();
    static PIDS: Mutex<Vec<i32>> = Mutex::new(Vec::new());

    pub fn register(pid: u32) {
        if let Ok(mut pids) = PIDS.lock() {
            pids.push(pid as i32);
        }
        REGISTER.call_once(|| unsafe {
            libc::atexit(on_exit);
        });
    }

    extern "C" fn on_exit() {
        if let Ok(pids) = PIDS.lock() {
            for pid in pids.iter().copied().filter(|pid| *pid > 0) {
                unsafe {
                    libc::kill(pid, libc::SIGTERM);
                }
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

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/state")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server(data_dir: &Path, seed: bool) -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_habit_tracker"))
        .env("PORT", port.to_string())
        .env("APP_DATA_DIR", data_dir)
        .env("APP_SEED_DEFAULTS", if seed { "1" } else { "0" })
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

#[tokio::test]
async fn http_fresh_start_seeds_sample_habits() {
    let dir = TempDir::new().unwrap();
    let server = spawn_server(dir.path(), true).await;

    let state = server.state().await;
    let names: Vec<&str> = state.habits.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, vec!["Push-ups", "Water Balance", "Diet"]);
    assert_eq!(state.habits[0].icon, "Sport");
    assert!(state.habits.iter().all(|h| h.target == 10));
    assert_eq!(state.active_habit_id, Some(1));
    assert_eq!(state.location, "#1");
    assert!(dir.path().join("habits.json").exists());
}

#[tokio::test]
async fn http_add_and_delete_days() {
    let dir = TempDir::new().unwrap();
    let server = spawn_server(dir.path(), true).await;

    assert_eq!(server.post("/habits/1/days", &[("comment", "a")]).await, "/#1");
    server.post("/habits/1/days", &[("comment", "b")]).await;

    let page = server.page().await;
    assert!(page.contains(r#"<span class="progress__percent">20%</span>"#));
    assert!(page.contains("Day 3"));

    server.post("/habits/1/days/0/delete", &[]).await;
    let state = server.state().await;
    let comments: Vec<&str> = state.habits[0]
        .days
        .iter()
        .map(|d| d.comment.as_str())
        .collect();
    assert_eq!(comments, vec!["b"]);

    // Out of range is ignored.
    server.post("/habits/1/days/7/delete", &[]).await;
    assert_eq!(server.state().await.habits[0].days.len(), 1);

    let saved = std::fs::read_to_string(dir.path().join("habits.json")).unwrap();
    assert!(saved.contains(r#""comment": "b""#));
    assert!(!saved.contains(r#""comment": "a""#));
}

#[tokio::test]
async fn http_blank_comment_is_rejected() {
    let dir = TempDir::new().unwrap();
    let server = spawn_server(dir.path(), true).await;

    server.post("/habits/1/days", &[("comment", "")]).await;
    assert!(server.state().await.habits[0].days.is_empty());
    let page = server.page().await;
    assert!(page.contains(r#"class="input error" type="text" name="comment""#));

    server.post("/habits/1/days", &[("comment", "ok")]).await;
    let page = server.page().await;
    assert!(!page.contains(r#"class="input error""#));
}

#[tokio::test]
async fn http_create_habit_validates_and_selects() {
    let dir = TempDir::new().unwrap();
    let server = spawn_server(dir.path(), true).await;

    server.post("/popup/toggle", &[]).await;
    server.post("/icon/Book", &[]).await;
    server
        .post("/habits", &[("name", ""), ("icon", "Book"), ("target", "5")])
        .await;

    assert_eq!(server.state().await.habits.len(), 3);
    let page = server.page().await;
    assert!(page.contains(r#"class="input error" type="text" name="name""#));
    assert!(page.contains(r#"<div id="add-habit-popup" class="cover">"#));
    assert!(page.contains(r#"name="target" placeholder="Target" value="5""#));

    let location = server
        .post("/habits", &[("name", "Read"), ("icon", "Book"), ("target", "5")])
        .await;
    assert_eq!(location, "/#4");

    let state = server.state().await;
    assert_eq!(state.active_habit_id, Some(4));
    let created = &state.habits[3];
    assert_eq!((created.name.as_str(), created.icon.as_str()), ("Read", "Book"));
    assert_eq!(created.target, 5);

    let page = server.page().await;
    assert!(page.contains(r#"class="cover cover_hidden""#));
    assert!(page.contains(r#"name="name" placeholder="Name" value="""#));
    assert!(page.contains(r#"<input type="hidden" name="icon" value="Book" />"#));
}

#[tokio::test]
async fn http_non_numeric_target_is_rejected() {
    let dir = TempDir::new().unwrap();
    let server = spawn_server(dir.path(), true).await;

    server
        .post("/habits", &[("name", "Run"), ("icon", "Sport"), ("target", "0")])
        .await;
    assert_eq!(server.state().await.habits.len(), 3);
    let page = server.page().await;
    assert!(page.contains(r#"class="input error" type="number""#));

    let response = Client::new()
        .post(server.url("/api/habits"))
        .json(&serde_json::json!({ "name": "Run", "icon": "Sport", "target": "many" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.text().await.unwrap().contains("target"));
}

#[tokio::test]
async fn http_json_create_assigns_next_id() {
    let dir = TempDir::new().unwrap();
    let server = spawn_server(dir.path(), false).await;
    assert!(server.state().await.habits.is_empty());

    let state: Snapshot = Client::new()
        .post(server.url("/api/habits"))
        .json(&serde_json::json!({ "name": "Stretch", "icon": "Sport", "target": 3 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(state.habits.len(), 1);
    assert_eq!(state.habits[0].id, 1);
    assert_eq!(state.active_habit_id, Some(1));
}

#[tokio::test]
async fn http_deleting_every_habit_shows_empty_state() {
    let dir = TempDir::new().unwrap();
    let server = spawn_server(dir.path(), true).await;

    server.post("/habits/2/select", &[]).await;
    assert_eq!(server.post("/habits/2/delete", &[]).await, "/#1");
    let page = server.page().await;
    assert!(!page.contains(r#"data-habit-id="2""#));

    assert_eq!(server.post("/habits/1/delete", &[]).await, "/#3");
    assert_eq!(server.post("/habits/3/delete", &[]).await, "/");

    let state = server.state().await;
    assert!(state.habits.is_empty());
    assert_eq!(state.active_habit_id, None);

    let page = server.page().await;
    assert!(page.contains(r#"<h1 class="h1"></h1>"#));
    assert!(page.contains("width: 0%"));
    assert!(!page.contains("class=\"habit__comment\""));

    // Nothing active: further deletes are no-ops.
    assert_eq!(server.post("/habits/3/delete", &[]).await, "/");
    let saved = std::fs::read_to_string(dir.path().join("habits.json")).unwrap();
    assert_eq!(saved.trim(), "[]");
}

#[tokio::test]
async fn http_add_day_without_active_habit_keeps_the_comment() {
    let dir = TempDir::new().unwrap();
    let server = spawn_server(dir.path(), false).await;

    assert_eq!(server.post("/habits/1/days", &[("comment", "keep")]).await, "/");
    assert!(server.state().await.habits.is_empty());

    let page = server.page().await;
    assert!(page.contains(r#"name="comment" placeholder="Comment" value="keep""#));
    assert!(page.contains(r#"<fieldset class="habit__fields" disabled>"#));
}

#[tokio::test]
async fn http_controls_for_a_replaced_habit_do_nothing() {
    let dir = TempDir::new().unwrap();
    let server = spawn_server(dir.path(), true).await;
    server.post("/habits/1/days", &[("comment", "first")]).await;

    // The page showing habit 1 is now stale.
    server.post("/habits/2/select", &[]).await;

    assert_eq!(server.post("/habits/1/days/0/delete", &[]).await, "/#2");
    assert_eq!(server.post("/habits/1/days", &[("comment", "late")]).await, "/#2");
    assert_eq!(server.post("/habits/1/delete", &[]).await, "/#2");

    let state = server.state().await;
    assert_eq!(state.habits.len(), 3);
    assert_eq!(state.active_habit_id, Some(2));
    let comments: Vec<&str> = state.habits[0]
        .days
        .iter()
        .map(|d| d.comment.as_str())
        .collect();
    assert_eq!(comments, vec!["first"]);
    assert!(state.habits[1].days.is_empty());

    let page = server.page().await;
    assert!(page.contains(r#"value="late""#));
}

#[tokio::test]
async fn http_selection_survives_restart() {
    let dir = TempDir::new().unwrap();
    {
        let server = spawn_server(dir.path(), true).await;
        assert_eq!(server.post("/habits/3/select", &[]).await, "/#3");
        // Unknown ids keep the current selection.
        assert_eq!(server.post("/habits/42/select", &[]).await, "/#3");
    }

    let server = spawn_server(dir.path(), true).await;
    let state = server.state().await;
    assert_eq!(state.active_habit_id, Some(3));
    assert_eq!(state.habits.len(), 3);
}

#[tokio::test]
async fn http_stale_fragment_falls_back_to_first_habit() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("habits.json"),
        r#"[{"id":5,"icon":"Food","name":"Diet","target":"4","days":[]},
            {"id":8,"icon":"Water","name":"Water","target":2,"days":[{"comment":"x"}]}]"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("location.json"), r##""#9""##).unwrap();

    let server = spawn_server(dir.path(), true).await;
    assert_eq!(server.state().await.active_habit_id, Some(5));

    let client = Client::builder().redirect(Policy::none()).build().unwrap();
    let response = client.get(server.url("/select/8")).send().await.unwrap();
    assert_eq!(response.headers()["location"], "/#8");
    let response = client.get(server.url("/select/nope")).send().await.unwrap();
    assert_eq!(response.headers()["location"], "/#5");
}

#[tokio::test]
async fn http_corrupt_storage_starts_empty() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("habits.json"), "{\"habits\": oops").unwrap();

    let server = spawn_server(dir.path(), true).await;
    let state = server.state().await;
    assert!(state.habits.is_empty());
    assert_eq!(state.location, "");

    let kept = std::fs::read_dir(dir.path())
        .unwrap()
        .flatten()
        .any(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .starts_with("habits.json.corrupt-")
        });
    assert!(kept);
}

use std::env;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use feedline::client::api::ApiClient;
use feedline::client::session::{Session, SessionManager, SessionStore};
use feedline::client::views;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    dotenv::dotenv().ok();

    let base_url =
        env::var("FEED_API_URL").unwrap_or_else(|_| "http://localhost:3005".to_string());
    let session_file =
        env::var("FEED_SESSION_FILE").unwrap_or_else(|_| "session.json".to_string());

    let api = ApiClient::new(base_url);
    let mut session = SessionManager::new(SessionStore::new(session_file));
    if session.restore() {
        if let Some(current) = session.current() {
            println!("{}", views::render_session(&current));
        }
    } else {
        println!("{}", views::render_auth_menu());
    }
    println!("{}", views::render_help(session.is_authenticated()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if line == "quit" {
            break;
        }
        run_command(&line, &api, &mut session).await;
    }

    Ok(())
}

async fn run_command(line: &str, api: &ApiClient, session: &mut SessionManager) {
    let (command, rest) = match line.split_once(' ') {
        Some((c, r)) => (c, r.trim()),
        None => (line, ""),
    };

    let outcome = match command {
        "help" => {
            println!("{}", views::render_help(session.is_authenticated()));
            Ok(())
        }
        "signup" => signup(api, rest).await,
        "login" => login(api, session, rest).await,
        "feed" => feed(api, rest).await,
        "view" => view(api, rest).await,
        "post" => post(api, session, rest).await,
        "edit" => edit(api, session, rest).await,
        "delete" => delete(api, session, rest).await,
        "logout" => {
            session.logout();
            println!("{}", views::render_auth_menu());
            Ok(())
        }
        _ => Err(format!("Unknown command {:?}. Try \"help\".", command)),
    };

    if let Err(message) = outcome {
        println!("{}", views::render_error(&message));
    }
}

fn authenticated(session: &SessionManager) -> Result<Session, String> {
    session
        .current()
        .ok_or_else(|| "You must be logged in for that.".to_string())
}

async fn signup(api: &ApiClient, rest: &str) -> Result<(), String> {
    let mut parts = rest.splitn(3, ' ');
    let (email, password, name) = match (parts.next(), parts.next(), parts.next()) {
        (Some(e), Some(p), Some(n)) if !n.trim().is_empty() => (e, p, n.trim()),
        _ => return Err("Usage: signup <email> <password> <name>".to_string()),
    };

    let out = api
        .signup(email, password, name)
        .await
        .map_err(|e| e.to_string())?;
    println!("{} Now log in.", out.message);
    Ok(())
}

async fn login(api: &ApiClient, session: &mut SessionManager, rest: &str) -> Result<(), String> {
    let mut parts = rest.split_whitespace();
    let (email, password) = match (parts.next(), parts.next()) {
        (Some(e), Some(p)) => (e, p),
        _ => return Err("Usage: login <email> <password>".to_string()),
    };

    let out = api.login(email, password).await.map_err(|e| e.to_string())?;
    let current = session.login(out.token, out.user_id, out.expires_in);
    println!("{}", views::render_session(&current));
    Ok(())
}

async fn feed(api: &ApiClient, rest: &str) -> Result<(), String> {
    let page = rest.parse::<i64>().unwrap_or(1).max(1);
    let out = api.fetch_posts(page).await.map_err(|e| e.to_string())?;
    println!("{}", views::render_feed(&out, page));
    Ok(())
}

async fn view(api: &ApiClient, rest: &str) -> Result<(), String> {
    let post_id = parse_post_id(rest)?;
    let out = api.fetch_post(post_id).await.map_err(|e| e.to_string())?;
    println!("{}", views::render_post(&out.post));
    Ok(())
}

async fn post(api: &ApiClient, session: &SessionManager, rest: &str) -> Result<(), String> {
    let current = authenticated(session)?;
    let (title, content, image) = parse_post_fields(rest)
        .ok_or_else(|| "Usage: post <title> | <content> [| <image-path>]".to_string())?;

    let out = api
        .create_post(&current.token, &title, &content, image.as_deref())
        .await
        .map_err(|e| e.to_string())?;
    println!("{}", out.message);
    println!("{}", views::render_post(&out.post));
    Ok(())
}

async fn edit(api: &ApiClient, session: &SessionManager, rest: &str) -> Result<(), String> {
    let current = authenticated(session)?;
    let (id_part, fields) = rest
        .split_once(' ')
        .ok_or_else(|| "Usage: edit <post-id> <title> | <content> [| <image-path>]".to_string())?;
    let post_id = parse_post_id(id_part)?;
    let (title, content, image) = parse_post_fields(fields)
        .ok_or_else(|| "Usage: edit <post-id> <title> | <content> [| <image-path>]".to_string())?;

    let out = api
        .update_post(&current.token, post_id, &title, &content, image.as_deref())
        .await
        .map_err(|e| e.to_string())?;
    println!("{}", out.message);
    println!("{}", views::render_post(&out.post));
    Ok(())
}

async fn delete(api: &ApiClient, session: &SessionManager, rest: &str) -> Result<(), String> {
    let current = authenticated(session)?;
    let post_id = parse_post_id(rest)?;
    let out = api
        .delete_post(&current.token, post_id)
        .await
        .map_err(|e| e.to_string())?;
    println!("{}", out.message);
    Ok(())
}

fn parse_post_id(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("{:?} is not a valid post id.", raw.trim()))
}

/// `<title> | <content> [| <image-path>]`
fn parse_post_fields(raw: &str) -> Option<(String, String, Option<PathBuf>)> {
    let mut parts = raw.splitn(3, '|').map(str::trim);
    let title = parts.next()?.to_string();
    let content = parts.next()?.to_string();
    if title.is_empty() || content.is_empty() {
        return None;
    }
    let image = parts.next().filter(|p| !p.is_empty()).map(|p| Path::new(p).to_path_buf());
    Some((title, content, image))
}

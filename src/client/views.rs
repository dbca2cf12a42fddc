use crate::client::session::Session;
use crate::dtos::post_dtos::{FeedPageOut, PostOut};
use crate::repositories::post_repository::POSTS_PER_PAGE;

/// Terminal rendering of the application views. Pure functions so the
/// REPL stays a thin dispatcher and the output is testable.

pub fn render_auth_menu() -> String {
    [
        "You are not logged in.",
        "  login <email> <password>",
        "  signup <email> <password> <name>",
    ]
    .join("\n")
}

pub fn render_session(session: &Session) -> String {
    format!(
        "Logged in as {} (session expires {})",
        session.user_id,
        session.expiry_date.to_rfc3339()
    )
}

pub fn render_feed(page: &FeedPageOut, page_number: i64) -> String {
    let total_pages = if page.total_items == 0 {
        1
    } else {
        (page.total_items + POSTS_PER_PAGE - 1) / POSTS_PER_PAGE
    };

    let mut out = String::new();
    if page.posts.is_empty() {
        out.push_str("No posts found.\n");
    }
    for post in &page.posts {
        out.push_str(&format!(
            "[{}] {} - posted {}\n",
            post.id,
            post.title,
            post.created_at.format("%Y-%m-%d %H:%M")
        ));
    }
    out.push_str(&format!(
        "page {} of {} ({} posts)",
        page_number, total_pages, page.total_items
    ));
    out
}

pub fn render_post(post: &PostOut) -> String {
    let mut out = format!(
        "{}\nby {} on {}\n\n{}\n",
        post.title,
        post.creator,
        post.created_at.format("%Y-%m-%d %H:%M"),
        post.content
    );
    if let Some(image) = &post.image_url {
        out.push_str(&format!("image: {}\n", image));
    }
    out
}

pub fn render_error(message: &str) -> String {
    format!("!! {}", message)
}

pub fn render_help(authenticated: bool) -> String {
    let mut lines = vec![
        "Commands:",
        "  feed [page]                          show a feed page",
        "  view <post-id>                       show one post",
    ];
    if authenticated {
        lines.extend([
            "  post <title> | <content> [| <image-path>]",
            "  edit <post-id> <title> | <content> [| <image-path>]",
            "  delete <post-id>                     delete one of your posts",
            "  logout                               end the session",
        ]);
    } else {
        lines.extend([
            "  login <email> <password>",
            "  signup <email> <password> <name>",
        ]);
    }
    lines.extend(["  help", "  quit"]);
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_post(title: &str) -> PostOut {
        PostOut {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: "Some content here".to_string(),
            image_url: Some("images/x.png".to_string()),
            creator: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn feed_lists_titles_and_pagination() {
        let page = FeedPageOut {
            posts: vec![sample_post("First post"), sample_post("Second post")],
            total_items: 12,
        };
        let out = render_feed(&page, 1);
        assert!(out.contains("First post - posted "));
        assert!(out.contains("Second post"));
        assert!(out.contains("page 1 of 6 (12 posts)"));
        assert!(out.is_ascii(), "feed lines must stay plain ASCII");
    }

    #[test]
    fn empty_feed_renders_a_placeholder() {
        let page = FeedPageOut {
            posts: vec![],
            total_items: 0,
        };
        let out = render_feed(&page, 1);
        assert!(out.contains("No posts found."));
        assert!(out.contains("page 1 of 1 (0 posts)"));
    }

    #[test]
    fn post_detail_includes_the_image_reference() {
        let out = render_post(&sample_post("Hello world"));
        assert!(out.contains("Hello world"));
        assert!(out.contains("images/x.png"));
    }

    #[test]
    fn help_depends_on_session_state() {
        assert!(render_help(false).contains("login"));
        assert!(!render_help(false).contains("logout"));
        assert!(render_help(true).contains("logout"));
        assert!(!render_help(true).contains("signup"));
    }

    #[test]
    fn error_banner_carries_the_message() {
        assert_eq!(render_error("Wrong password."), "!! Wrong password.");
    }
}

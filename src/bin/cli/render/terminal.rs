use chrono::{DateTime, Utc};

use heapcards_lib::scheduling::policy::format_delay;
use heapcards_lib::scheduling::{CardContent, DueAt, NextExpiry, ReviewState, SelectedCard};

/// ANSI color codes
#[allow(dead_code)]
pub struct Color;

#[allow(dead_code)]
impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";
}

/// Wrap `text` in `color` when colors are enabled
pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

/// Relative description of a due instant, e.g. "due", "in 3d", "2w overdue"
pub fn describe_due(due: &DueAt, now: DateTime<Utc>) -> String {
    match due.instant() {
        None => "due".to_string(),
        Some(at) if at <= now => {
            let overdue = now - at;
            if overdue.num_days() == 0 {
                "due".to_string()
            } else {
                format!("{} overdue", format_delay(overdue))
            }
        }
        Some(at) => format!("in {}", format_delay(at - now)),
    }
}

pub fn describe_expiry(expiry: &NextExpiry, now: DateTime<Utc>) -> String {
    match expiry {
        NextExpiry::Never => "-".to_string(),
        NextExpiry::At(at) => describe_due(&DueAt::At(*at), now),
    }
}

/// One line per card: short id, front, and tags
pub fn render_content(card: &CardContent, use_color: bool) -> String {
    let mut line = format!(
        "{} {}",
        paint(&short_id(card), Color::GRAY, use_color),
        card.front
    );
    if !card.tags.is_empty() {
        let tags = card.tags.iter().map(|t| format!("#{}", t)).collect::<Vec<_>>().join(" ");
        line.push(' ');
        line.push_str(&paint(&tags, Color::DIM, use_color));
    }
    line
}

/// A selected card with its heap and schedule
pub fn render_selected(card: &SelectedCard, now: DateTime<Utc>, use_color: bool) -> String {
    let placement = &card.placement;
    let heap = paint(&format!("[{:>2}]", placement.heap), Color::CYAN, use_color);
    let status = match placement.review {
        ReviewState::Unreviewed => paint("new", Color::GREEN, use_color),
        ReviewState::ReviewedAt(_) => {
            let due = describe_due(&placement.next_due, now);
            if placement.is_due(now) {
                paint(&due, Color::YELLOW, use_color)
            } else {
                due
            }
        }
    };

    let mut line = format!("{} {} ({})", heap, render_content(&card.content, use_color), status);
    if let Some(personal) = card.personal {
        if personal.rating > 0 {
            line.push_str(&format!(" {}", "*".repeat(usize::from(personal.rating))));
        }
        if personal.registered_for_notifications {
            line.push_str(&paint(" [watching]", Color::DIM, use_color));
        }
    }
    line
}

fn short_id(card: &CardContent) -> String {
    card.id.to_string()[..8].to_string()
}

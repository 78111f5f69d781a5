//! Presentational renderers.
//!
//! Each card is built from one record (plus display flags) into a small view
//! model, and the view model renders to an HTML fragment. Both steps are pure:
//! the same record always yields the same markup.

use chrono::{DateTime, Utc};

use crate::models::{Agent, Message, MessageStatus};

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// First letter of each of the first two words, uppercased.
pub fn initials(full_name: &str) -> String {
    full_name
        .split_whitespace()
        .take(2)
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Compact US currency (`$950`, `$12K`, `$1.5M`), `$0` when absent or zero.
///
/// Mirrors the browser's compact notation: two significant digits below a
/// hundred units, whole units above, promoted to the next suffix when
/// rounding reaches a thousand.
pub fn format_compact_usd(amount: Option<f64>) -> String {
    let Some(amount) = amount.filter(|a| a.is_finite() && *a != 0.0) else {
        return "$0".to_string();
    };

    const SUFFIXES: [&str; 5] = ["", "K", "M", "B", "T"];
    let sign = if amount < 0.0 { "-" } else { "" };
    let mut scaled = amount.abs();
    let mut unit = 0;
    while scaled >= 1000.0 && unit < SUFFIXES.len() - 1 {
        scaled /= 1000.0;
        unit += 1;
    }

    let mut rounded = round_compact(scaled);
    if rounded >= 1000.0 && unit < SUFFIXES.len() - 1 {
        unit += 1;
        rounded = round_compact(rounded / 1000.0);
    }

    let digits = if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        format!("{rounded:.1}")
    };
    format!("{sign}${digits}{}", SUFFIXES[unit])
}

fn round_compact(value: f64) -> f64 {
    if value < 10.0 {
        (value * 10.0).round() / 10.0
    } else {
        value.round()
    }
}

/// Clock time shown on a message, e.g. `3:07 PM`.
pub fn format_time(ts: DateTime<Utc>) -> String {
    ts.format("%-I:%M %p").to_string()
}

/// Sent time when known, else creation time, else blank.
pub fn timestamp_label(sent_at: Option<DateTime<Utc>>, created_at: Option<DateTime<Utc>>) -> String {
    sent_at.or(created_at).map(format_time).unwrap_or_default()
}

// --- Agent card ---

#[derive(Debug, Clone, PartialEq)]
pub struct AgentCard {
    pub name: String,
    pub initials: String,
    pub email: String,
    pub phone: String,
    pub avatar: Option<String>,
    pub specialization: Option<String>,
    pub deals: u32,
    pub revenue: String,
    pub is_active: bool,
}

impl AgentCard {
    pub fn new(agent: &Agent) -> Self {
        let data = &agent.data;
        Self {
            name: data.full_name.clone(),
            initials: initials(&data.full_name),
            email: data.email.clone(),
            phone: data.phone.clone(),
            avatar: data.avatar.clone(),
            specialization: data.specialization.clone(),
            deals: data.total_deals.unwrap_or(0),
            revenue: format_compact_usd(data.total_revenue),
            is_active: data.is_active,
        }
    }

    pub fn render(&self) -> String {
        let avatar = match &self.avatar {
            Some(url) => format!(
                r#"<img class="avatar" src="{}" alt="{}">"#,
                escape_html(url),
                escape_html(&self.name)
            ),
            None => format!(r#"<div class="avatar avatar-fallback">{}</div>"#, escape_html(&self.initials)),
        };
        let badge = if self.is_active {
            r#"<span class="badge badge-active">Active</span>"#
        } else {
            r#"<span class="badge badge-inactive">Inactive</span>"#
        };
        let specialization = self
            .specialization
            .as_deref()
            .map(|s| format!(r#"<p class="agent-specialization">{}</p>"#, escape_html(s)))
            .unwrap_or_default();

        format!(
            r#"<div class="agent-card">
    {avatar}
    <div class="agent-info">
        <h3 class="agent-name">{name}</h3>
        {badge}
        {specialization}
        <p class="agent-contact">{email} · {phone}</p>
    </div>
    <div class="agent-stats">
        <div><span class="stat-value">{deals}</span><span class="stat-label">Deals</span></div>
        <div><span class="stat-value">{revenue}</span><span class="stat-label">Revenue</span></div>
    </div>
</div>"#,
            name = escape_html(&self.name),
            email = escape_html(&self.email),
            phone = escape_html(&self.phone),
            deals = self.deals,
            revenue = escape_html(&self.revenue),
        )
    }
}

pub fn render_agent_grid(agents: &[Agent]) -> String {
    if agents.is_empty() {
        return r#"<div class="empty-state">
    <div class="empty-icon">🧑‍💼</div>
    <p>No agents yet</p>
    <p class="empty-hint">Add agents to assign leads and listings</p>
</div>"#
            .to_string();
    }
    let cards: Vec<String> = agents.iter().map(|a| AgentCard::new(a).render()).collect();
    format!(r#"<div class="agent-grid">{}</div>"#, cards.join("\n"))
}

// --- Message bubble ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIcon {
    Clock,
    Check,
    DoubleCheck,
    /// Double check drawn in the highlight colour.
    DoubleCheckRead,
    FailedLabel,
}

impl StatusIcon {
    /// A message without a status renders as pending.
    pub fn for_status(status: Option<MessageStatus>) -> Self {
        match status.unwrap_or_default() {
            MessageStatus::Pending => Self::Clock,
            MessageStatus::Sent => Self::Check,
            MessageStatus::Delivered => Self::DoubleCheck,
            MessageStatus::Read => Self::DoubleCheckRead,
            MessageStatus::Failed => Self::FailedLabel,
        }
    }

    pub fn markup(self) -> &'static str {
        match self {
            Self::Clock => r#"<i class="icon" data-icon="clock" title="Pending"></i>"#,
            Self::Check => r#"<i class="icon" data-icon="check" title="Sent"></i>"#,
            Self::DoubleCheck => r#"<i class="icon" data-icon="check-check" title="Delivered"></i>"#,
            Self::DoubleCheckRead => {
                r#"<i class="icon icon-highlight" data-icon="check-check" title="Read"></i>"#
            }
            Self::FailedLabel => r#"<span class="status-failed">Failed</span>"#,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageBubble {
    pub content: String,
    pub direction: Direction,
    pub icon: StatusIcon,
    pub timestamp: String,
    pub attachments: usize,
}

impl MessageBubble {
    /// Builds the bubble as seen by `viewer_id`: messages the viewer sent
    /// are outbound.
    pub fn new(message: &Message, viewer_id: &str) -> Self {
        let data = &message.data;
        Self {
            content: data.content.clone(),
            direction: if data.sender_id == viewer_id {
                Direction::Outbound
            } else {
                Direction::Inbound
            },
            icon: StatusIcon::for_status(Some(data.status)),
            timestamp: timestamp_label(data.sent_at, Some(message.created_at)),
            attachments: data.attachments.len(),
        }
    }

    pub fn render(&self) -> String {
        let (row_class, bubble_class) = match self.direction {
            Direction::Outbound => ("message-row justify-end", "message-bubble outbound"),
            Direction::Inbound => ("message-row justify-start", "message-bubble inbound"),
        };
        // Delivery state only matters to the sender.
        let status = match self.direction {
            Direction::Outbound => self.icon.markup(),
            Direction::Inbound => "",
        };
        let attachments = match self.attachments {
            0 => String::new(),
            1 => r#"<span class="attachments">1 attachment</span>"#.to_string(),
            n => format!(r#"<span class="attachments">{n} attachments</span>"#),
        };

        format!(
            r#"<div class="{row_class}">
    <div class="{bubble_class}">
        <p class="message-content">{content}</p>
        {attachments}
        <div class="message-meta"><span class="message-time">{time}</span>{status}</div>
    </div>
</div>"#,
            content = escape_html(&self.content),
            time = escape_html(&self.timestamp),
        )
    }
}

pub fn render_conversation(messages: &[Message], viewer_id: &str) -> String {
    if messages.is_empty() {
        return r#"<div class="empty-state">
    <div class="empty-icon">💬</div>
    <p>No messages yet</p>
</div>"#
            .to_string();
    }
    let bubbles: Vec<String> = messages
        .iter()
        .map(|m| MessageBubble::new(m, viewer_id).render())
        .collect();
    format!(r#"<div class="conversation">{}</div>"#, bubbles.join("\n"))
}

// --- Stat card ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatCard {
    pub title: String,
    pub value: String,
    /// Percentage change against the previous period.
    pub change: Option<f64>,
}

impl StatCard {
    pub fn new(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            change: None,
        }
    }

    pub fn with_change(mut self, change: Option<f64>) -> Self {
        self.change = change.filter(|c| c.is_finite());
        self
    }

    pub fn trend(&self) -> Option<Trend> {
        self.change
            .map(|c| if c >= 0.0 { Trend::Up } else { Trend::Down })
    }

    /// Signed percentage, e.g. `+12.5%` or `-3.0%`.
    pub fn change_label(&self) -> Option<String> {
        self.change.map(|c| format!("{c:+.1}%"))
    }

    pub fn render(&self) -> String {
        let change = match (self.trend(), self.change_label()) {
            (Some(Trend::Up), Some(label)) => format!(
                r#"<p class="stat-change text-green"><span class="arrow">↑</span>{label}</p>"#
            ),
            (Some(Trend::Down), Some(label)) => format!(
                r#"<p class="stat-change text-red"><span class="arrow">↓</span>{label}</p>"#
            ),
            _ => String::new(),
        };

        format!(
            r#"<div class="stat-card">
    <p class="stat-title">{title}</p>
    <p class="stat-value">{value}</p>
    {change}
</div>"#,
            title = escape_html(&self.title),
            value = escape_html(&self.value),
        )
    }
}

pub fn render_stat_grid(cards: &[StatCard]) -> String {
    let cards: Vec<String> = cards.iter().map(StatCard::render).collect();
    format!(r#"<div class="stat-grid">{}</div>"#, cards.join("\n"))
}

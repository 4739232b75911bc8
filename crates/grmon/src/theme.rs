use ratatui::style::{Color, Modifier, Style};

pub const ACCENT: Color = Color::Rgb(142, 192, 124);
pub const TEXT: Color = Color::Rgb(235, 219, 178);
pub const MUTED: Color = Color::Rgb(146, 131, 116);

pub const BORDER_STYLE: Style = Style::new().fg(ACCENT);
pub const TITLE_STYLE: Style = Style::new().fg(ACCENT).add_modifier(Modifier::BOLD);
pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(131, 165, 152))
    .fg(Color::Black)
    .add_modifier(Modifier::BOLD);
pub const EMPHASIS_STYLE: Style = Style::new().fg(TEXT).add_modifier(Modifier::BOLD);
pub const PLACEHOLDER_STYLE: Style = Style::new().fg(MUTED).add_modifier(Modifier::ITALIC);
pub const LOCATION_STYLE: Style = Style::new().fg(Color::Rgb(131, 165, 152));

pub fn status_color(status: &str) -> Color {
    match status {
        "running" | "runnable" => Color::Rgb(184, 187, 38),
        "IO wait" | "syscall" => Color::Rgb(131, 165, 152),
        "chan receive" | "chan send" | "select" => Color::Rgb(250, 189, 47),
        "sync.Mutex.Lock" | "sync.RWMutex.Lock" | "sync.RWMutex.RLock" | "semacquire" => {
            Color::Rgb(254, 128, 25)
        }
        "dead" => Color::Rgb(214, 93, 14),
        _ if status.starts_with("GC ") => Color::Rgb(211, 134, 155),
        _ => MUTED,
    }
}

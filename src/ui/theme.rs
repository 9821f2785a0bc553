use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Styles for the CLI's message kinds
#[derive(Debug, Clone)]
pub struct Theme {
    /// Command banners and record headings
    pub title: Style,
    /// Store active, entity persisted
    pub persisted: Style,
    /// In-memory fallback, incompatible or unreachable store
    pub fallback: Style,
    pub failure: Style,
    /// Field labels such as "Mode" or "records:"
    pub label: Style,
    /// Table names and other derived identifiers
    pub ident: Style,
}

impl Theme {
    /// Colors only when stdout is a terminal that accepts them
    pub fn detect() -> Self {
        let term = console::Term::stdout();
        if term.is_term() && console::colors_enabled() {
            Self::colored()
        } else {
            Self::plain()
        }
    }

    pub fn colored() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            persisted: Style::new().green().bold(),
            fallback: Style::new().yellow(),
            failure: Style::new().red().bold(),
            label: Style::new().dimmed(),
            ident: Style::new().magenta(),
        }
    }

    pub fn plain() -> Self {
        Self {
            title: Style::new(),
            persisted: Style::new(),
            fallback: Style::new(),
            failure: Style::new(),
            label: Style::new(),
            ident: Style::new(),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}

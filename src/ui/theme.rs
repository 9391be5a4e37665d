use crate::settings::UiSettings;

/// Speaker-kind colouring for terminal output.
#[derive(Debug, Clone)]
pub struct Theme {
    colors: UiSettings,
    enabled: bool,
}

impl Theme {
    pub fn new(colors: UiSettings, enabled: bool) -> Self {
        Self { colors, enabled }
    }

    pub fn plain() -> Self {
        Self::new(UiSettings::default(), false)
    }

    pub fn paint(&self, kind: &str, text: &str) -> String {
        match self.colors.color(kind) {
            Some([r, g, b]) if self.enabled => format!("\x1b[38;2;{r};{g};{b}m{text}\x1b[0m"),
            _ => text.to_string(),
        }
    }
}

//! Platform-neutral message types shared by the dispatcher and channel adapters.

/// What the user sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A typed message (commands included)
    Text(String),
    /// A button press carrying an action token
    Action(String),
    /// A photo, as the platform's opaque file reference
    Photo { file_id: String, caption: Option<String> },
}

/// An inbound event normalized from any chat platform
#[derive(Debug, Clone)]
pub struct NormalizedMessage {
    pub user_id: u64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    /// Platform language code, e.g. `en-US`
    pub language_code: Option<String>,
    pub input: Inbound,
}

/// One button: a label and the token sent back when pressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub token: String,
}

/// Ordered buttons grouped into rows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionMenu {
    pub rows: Vec<Vec<MenuEntry>>,
}

impl ActionMenu {
    pub fn entries(&self) -> impl Iterator<Item = &MenuEntry> {
        self.rows.iter().flatten()
    }

    /// All tokens in display order
    pub fn tokens(&self) -> Vec<&str> {
        self.entries().map(|e| e.token.as_str()).collect()
    }

    pub fn row_sizes(&self) -> Vec<usize> {
        self.rows.iter().map(|r| r.len()).collect()
    }
}

/// Collects buttons, then lays them out in rows
#[derive(Debug, Default)]
pub struct MenuBuilder {
    entries: Vec<MenuEntry>,
}

impl MenuBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, label: impl Into<String>, token: impl Into<String>) -> Self {
        self.entries.push(MenuEntry {
            label: label.into(),
            token: token.into(),
        });
        self
    }

    pub fn add_if(self, condition: bool, label: impl Into<String>, token: impl Into<String>) -> Self {
        if condition { self.add(label, token) } else { self }
    }

    /// Group into rows of the given sizes; the last size repeats for the rest.
    /// `layout(&[2, 2, 1])` on seven buttons gives rows of 2, 2, 1, 1, 1.
    pub fn layout(self, sizes: &[usize]) -> ActionMenu {
        let mut rows = Vec::new();
        let mut entries = self.entries.into_iter().peekable();
        let mut idx = 0;

        while entries.peek().is_some() {
            let size = sizes
                .get(idx)
                .or(sizes.last())
                .copied()
                .unwrap_or(1)
                .max(1);
            let row: Vec<MenuEntry> = entries.by_ref().take(size).collect();
            rows.push(row);
            idx += 1;
        }

        ActionMenu { rows }
    }
}

/// What to show the user: text plus an optional button menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub menu: Option<ActionMenu>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            menu: None,
        }
    }

    pub fn with_menu(text: impl Into<String>, menu: ActionMenu) -> Self {
        Self {
            text: text.into(),
            menu: Some(menu),
        }
    }

    pub fn tokens(&self) -> Vec<&str> {
        self.menu.as_ref().map(|m| m.tokens()).unwrap_or_default()
    }
}

/// Result of dispatching one inbound event
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub reply: Reply,
    pub error: Option<String>,
}

impl DispatchResult {
    pub fn success(reply: Reply) -> Self {
        Self { reply, error: None }
    }

    /// A failure the user still gets a message for
    pub fn error(reply: Reply, error: String) -> Self {
        Self {
            reply,
            error: Some(error),
        }
    }
}

//! Interactive command parsing
//!
//! Each stdin line is either text for the search box or a `:command`
//! such as `:cat 3`, `:enter`, `:esc`.

/// Parsed command from one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Replace the search box contents (default for plain text)
    Type { term: String },
    /// Change the category filter: :cat <id>
    Category { id: i64 },
    /// Press Enter: :enter
    Enter,
    /// Press Escape: :esc
    Escape,
    /// Focus the search box: :focus
    Focus,
    /// Open a displayed result's product page: :open <n> (1-based)
    Open { index: usize },
    /// Empty the search box: :clear
    Clear,
    /// List categories: :cats
    Categories,
    /// Show help: :help
    Help,
    /// Leave the session: :quit
    Quit,
    /// Unrecognized or malformed command, with a message for the user
    Invalid { message: String },
}

impl Command {
    /// Parse one input line into a command
    pub fn parse(input: &str) -> Self {
        if !input.trim_start().starts_with(':') {
            // Keep the raw text, normalization happens on commit
            return Command::Type { term: input.to_string() };
        }

        let input = input.trim();
        let parts: Vec<&str> = input.splitn(2, ' ').collect();
        let cmd = parts[0].to_lowercase();
        let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

        match cmd.as_str() {
            ":cat" | ":category" | ":c" => match args.parse::<i64>() {
                Ok(id) => Command::Category { id },
                Err(_) => Command::Invalid {
                    message: "Usage: :cat <id>  (-1 for all)".to_string(),
                },
            },
            ":open" | ":o" => match args.parse::<usize>() {
                Ok(n) if n > 0 => Command::Open { index: n - 1 },
                _ => Command::Invalid {
                    message: "Usage: :open <n>  (n = result number, from 1)".to_string(),
                },
            },
            ":enter" | ":e" => Command::Enter,
            ":esc" | ":escape" => Command::Escape,
            ":focus" | ":f" => Command::Focus,
            ":clear" | ":cl" => Command::Clear,
            ":cats" | ":categories" => Command::Categories,
            ":help" | ":h" | ":?" => Command::Help,
            ":quit" | ":q" | ":exit" => Command::Quit,
            _ => Command::Invalid {
                message: format!("Unknown command: {}. Type :help for available commands.", cmd),
            },
        }
    }

    /// Get help text for all commands
    pub fn help_text() -> &'static str {
        r#"Available Commands:
<text>       - Replace the search box contents
:cat <id>    - Filter by category (-1 = all)
:cats        - List categories
:enter       - Open the full results page for the current term
:open <n>    - Open the product page of result n
:esc         - Hide the results panel
:focus       - Focus the search box (shows the panel again)
:clear       - Empty the search box
:help        - Show this help
:quit        - Exit

Tip: results appear 300ms after you stop typing!"#
    }
}

//! Terminal rendering for research trees.

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

use crate::models::Research;

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Get the current terminal width.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(100)
}

/// Render a research tree for terminal display.
pub fn render_research(research: &Research, color: bool) -> String {
    let width = terminal_width().clamp(40, 120);
    let mut out = String::new();

    let heading = format!("Research: {}", research.prompt);
    if color {
        out.push_str(&format!("{}\n", heading.bold()));
    } else {
        out.push_str(&heading);
        out.push('\n');
    }

    for branch in &research.searches {
        let query_line = format!("\n● {}", branch.query);
        if color {
            out.push_str(&format!("\n● {}\n", branch.query.cyan().bold()));
        } else {
            out.push_str(&query_line);
            out.push('\n');
        }

        if branch.papers.is_empty() {
            out.push_str("  (no papers)\n");
            continue;
        }
        for paper in &branch.papers {
            if color {
                out.push_str(&format!("  ✓ {}\n", paper.title.bold()));
            } else {
                out.push_str(&format!("  ✓ {}\n", paper.title));
            }
            if let Some(authors) = &paper.authors {
                out.push_str(&format!("    {}\n", authors.join(", ")));
            }
            if let Some(publisher) = &paper.publisher {
                out.push_str(&format!("    {publisher}\n"));
            }
            for line in wrap_text(&paper.summary, width.saturating_sub(4)) {
                out.push_str(&format!("    {line}\n"));
            }
            if color {
                out.push_str(&format!("    {}\n", paper.url.dimmed()));
            } else {
                out.push_str(&format!("    {}\n", paper.url));
            }
        }
    }

    let footer = format!(
        "\n{} searches, {} papers",
        research.searches.len(),
        research.paper_count()
    );
    out.push_str(&footer);
    out.push('\n');
    out
}

/// Greedy word wrap.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(20);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + word.len() + 1 > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

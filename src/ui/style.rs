use console::style;
use std::fmt::Display;

/// White bold: section headers, the assistant label
pub fn header<D: Display>(text: D) -> String {
    style(text).white().bold().to_string()
}

/// Dim: hints, fence rules, tool output bodies
pub fn dim<D: Display>(text: D) -> String {
    style(text).dim().to_string()
}

/// Yellow: code block contents
pub fn code<D: Display>(text: D) -> String {
    style(text).yellow().to_string()
}

/// Cyan bold: tool-result labels
pub fn tool<D: Display>(text: D) -> String {
    style(text).cyan().bold().to_string()
}

/// Green: model ids, confirmed values
pub fn value<D: Display>(text: D) -> String {
    style(text).green().to_string()
}

/// Red bold: failures
pub fn error<D: Display>(text: D) -> String {
    style(text).red().bold().to_string()
}

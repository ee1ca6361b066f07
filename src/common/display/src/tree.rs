//! Tree display for query plans.

use std::fmt;

/// An owned tree of labelled nodes rendered with box-drawing connectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayTree {
    label: String,
    details: Option<String>,
    children: Vec<DisplayTree>,
}

impl DisplayTree {
    /// Create a leaf node.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            details: None,
            children: Vec::new(),
        }
    }

    /// Attach details rendered in parentheses after the label.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Append a child node.
    pub fn with_child(mut self, child: DisplayTree) -> Self {
        self.children.push(child);
        self
    }

    /// Append a child node in place.
    pub fn push_child(&mut self, child: DisplayTree) {
        self.children.push(child);
    }

    fn write_line(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)?;
        if let Some(details) = &self.details {
            write!(f, " ({details})")?;
        }
        writeln!(f)
    }

    fn fmt_child(&self, f: &mut fmt::Formatter<'_>, prefix: &str, is_last: bool) -> fmt::Result {
        let connector = if is_last { "└─ " } else { "├─ " };
        write!(f, "{prefix}{connector}")?;
        self.write_line(f)?;

        let child_prefix = format!("{prefix}{}", if is_last { "   " } else { "│  " });
        for (i, child) in self.children.iter().enumerate() {
            child.fmt_child(f, &child_prefix, i + 1 == self.children.len())?;
        }
        Ok(())
    }
}

impl fmt::Display for DisplayTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_line(f)?;
        for (i, child) in self.children.iter().enumerate() {
            child.fmt_child(f, "", i + 1 == self.children.len())?;
        }
        Ok(())
    }
}

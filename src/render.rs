use crate::session::Notification;
use crate::transcript::{Citation, Role, TranscriptEntry};

pub fn citation_line(citation: &Citation) -> String {
    format!(
        "[{}] (p.{}) {}",
        citation.display_label(),
        citation.display_page(),
        citation.url
    )
}

/// Plain-text block for one transcript entry, citations indented below.
pub fn entry(entry: &TranscriptEntry) -> String {
    let speaker = match entry.role() {
        Role::User => "you",
        Role::Assistant => "assistant",
    };
    let mut out = format!("{}> {}", speaker, entry.content());
    if let Some(citations) = entry.citations().filter(|c| !c.is_empty()) {
        out.push_str("\n  Reference Sources:");
        for c in citations {
            out.push_str("\n    ");
            out.push_str(&citation_line(c));
        }
    }
    out
}

pub fn notification(n: &Notification) -> String {
    format!("[{}] {}: {}", n.severity, n.title, n.description)
}

//! Plain-text ticket transcripts.

use crate::errors::Result;
use chrono::{DateTime, Utc};
use std::fmt::Write;

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// One message of a ticket channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    /// When the message was sent
    pub timestamp: DateTime<Utc>,
    /// Author username
    pub author: String,
    /// Message text
    pub content: String,
    /// File names of attachments
    pub attachments: Vec<String>,
}

/// Renders a transcript. Messages are written oldest first regardless of the
/// order they were fetched in.
pub fn render_transcript(
    channel_name: &str,
    requested_by: &str,
    generated_at: DateTime<Utc>,
    lines: &[TranscriptLine],
) -> Result<String> {
    let mut sorted: Vec<&TranscriptLine> = lines.iter().collect();
    sorted.sort_by_key(|line| line.timestamp);

    let mut out = String::new();
    writeln!(out, "TICKET TRANSCRIPT: {channel_name}")?;
    writeln!(out, "Date: {}", generated_at.format(TIMESTAMP_FORMAT))?;
    writeln!(out, "Requested by: {requested_by}")?;
    writeln!(out, "{}", "=".repeat(50))?;
    writeln!(out)?;

    for line in sorted {
        writeln!(
            out,
            "[{}] {}: {}",
            line.timestamp.format(TIMESTAMP_FORMAT),
            line.author,
            line.content
        )?;
        for attachment in &line.attachments {
            writeln!(out, "[ATTACHMENT: {attachment}]")?;
        }
        writeln!(out)?;
    }

    Ok(out)
}

/// File name for a transcript attachment.
#[must_use]
pub fn transcript_file_name(channel_name: &str, generated_at: DateTime<Utc>) -> String {
    format!(
        "transcript-{channel_name}-{}.txt",
        generated_at.timestamp_millis()
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_render_transcript_orders_messages() -> Result<()> {
        let generated = Utc.with_ymd_and_hms(2024, 6, 1, 18, 30, 0).unwrap();
        let lines = vec![
            TranscriptLine {
                timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 18, 5, 0).unwrap(),
                author: "mod_ana".to_string(),
                content: "Fixed, please check".to_string(),
                attachments: vec![],
            },
            TranscriptLine {
                timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap(),
                author: "steve".to_string(),
                content: "My items are gone".to_string(),
                attachments: vec!["screenshot.png".to_string()],
            },
        ];

        let text = render_transcript("ticket-steve", "mod_ana", generated, &lines)?;
        let expected = "TICKET TRANSCRIPT: ticket-steve\n\
            Date: 01/06/2024 18:30:00\n\
            Requested by: mod_ana\n\
            ==================================================\n\
            \n\
            [01/06/2024 18:00:00] steve: My items are gone\n\
            [ATTACHMENT: screenshot.png]\n\
            \n\
            [01/06/2024 18:05:00] mod_ana: Fixed, please check\n\
            \n";
        assert_eq!(text, expected);
        Ok(())
    }

    #[test]
    fn test_render_transcript_empty_channel() -> Result<()> {
        let generated = Utc.with_ymd_and_hms(2024, 6, 1, 18, 30, 0).unwrap();
        let text = render_transcript("ticket-x", "mod", generated, &[])?;
        assert!(text.ends_with("=\n\n"));
        assert_eq!(text.lines().count(), 5);
        Ok(())
    }

    #[test]
    fn test_transcript_file_name() {
        let generated = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(
            transcript_file_name("ticket-steve", generated),
            "transcript-ticket-steve-1717200000000.txt"
        );
    }
}

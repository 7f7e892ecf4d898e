//! Human and JSON rendering of harvested records.

use std::io::{self, Write};

use rankharvest::Record;

/// Comments shown per record in the human listing.
const PREVIEW_COMMENTS: usize = 3;

/// `1234567` → `"1,234,567"`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Numbered listing, one block per record.
pub fn write_listing<W: Write>(out: &mut W, records: &[Record]) -> io::Result<()> {
    if records.is_empty() {
        writeln!(out, "  No records harvested.")?;
        return Ok(());
    }
    for (idx, record) in records.iter().enumerate() {
        writeln!(out, "{}. {}", idx + 1, record.title())?;
        writeln!(out, " {}", record.release_year())?;
        writeln!(out, " 누적 관객 : {}명", group_thousands(record.rank_metric()))?;
        if let Some(comments) = record.comments() {
            writeln!(
                out,
                " 코멘트 : {} (collected {})",
                comments.total_count_label,
                comments.items.len()
            )?;
            for item in comments.items.iter().take(PREVIEW_COMMENTS) {
                let line = item.lines().next().unwrap_or_default();
                writeln!(out, "   - {line}")?;
            }
        }
        writeln!(out, "{}", "-".repeat(50))?;
    }
    Ok(())
}

pub fn write_json<W: Write>(out: &mut W, records: &[Record]) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, records)?;
    writeln!(out)
}

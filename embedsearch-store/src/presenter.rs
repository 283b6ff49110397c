//! Human-readable result output

use std::io::Write;

use crate::error::Result;
use crate::remote::QueryMatch;

/// A ranked hit from the local flat index
#[derive(Debug, Clone, PartialEq)]
pub struct LocalHit {
    /// 1-based rank
    pub rank: usize,
    /// Positional index id
    pub id: usize,
    pub text: String,
    /// Squared L2 distance; smaller is closer
    pub distance: f32,
}

/// Print local hits as `Rank` / `Text` / `Distance` blocks
pub fn write_local_results<W: Write>(out: &mut W, hits: &[LocalHit]) -> Result<()> {
    writeln!(out, "\nQuery Results:")?;
    for hit in hits {
        writeln!(out, "Rank: {}", hit.rank)?;
        writeln!(out, "Text: {}", hit.text)?;
        writeln!(out, "Distance: {}", hit.distance)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Print remote matches as `ID  Score` / `Text` blocks
pub fn write_remote_results<W: Write>(out: &mut W, matches: &[QueryMatch]) -> Result<()> {
    if matches.is_empty() {
        writeln!(out, "No matches found.")?;
        return Ok(());
    }

    writeln!(out, "\nQuery Results:")?;
    for m in matches {
        writeln!(out, "ID: {}  Score: {:.4}", m.id, m.score)?;
        writeln!(out, "Text: {}\n", m.text().unwrap_or(""))?;
    }
    Ok(())
}

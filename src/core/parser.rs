//! Parser for the three-column tabular output (`qacc sacc evalue`) produced by
//! blastp / psiblast.
//!
//! Comment lines (`#`), tool messages (`[blastp] WARNING ...`) and blank lines
//! are skipped. PSI-BLAST prints one block per iteration, so a pair that shows
//! up more than once keeps the value from the last iteration.

use crate::domain::model::ScoreTable;

const CONVERGED_MARKER: &str = "CONVERGED!";

#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub query: String,
    pub subject: String,
    pub evalue: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    Hit(Hit),
    Ignored,
    Malformed,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    pub parsed: usize,
    pub rejected: Vec<String>,
}

/// `sp|P12345|NAME_HUMAN` -> `P12345`；沒有 `|` 時原樣回傳
pub fn accession(token: &str) -> &str {
    let mut fields = token.split('|');
    match (fields.next(), fields.next()) {
        (Some(_), Some(acc)) => acc,
        _ => token,
    }
}

pub fn parse_line(line: &str) -> ParsedLine {
    if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
        return ParsedLine::Ignored;
    }

    let mut columns = line.split_whitespace();
    let (Some(query), Some(subject), Some(evalue)) =
        (columns.next(), columns.next(), columns.next())
    else {
        return ParsedLine::Malformed;
    };

    match evalue.parse::<f64>() {
        Ok(evalue) => ParsedLine::Hit(Hit {
            query: accession(query).to_string(),
            subject: accession(subject).to_string(),
            evalue,
        }),
        Err(_) => ParsedLine::Malformed,
    }
}

/// 解析整段工具輸出並寫入 score table
pub fn parse_tabular(output: &str, table: &mut ScoreTable) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();

    for line in output.lines() {
        match parse_line(line) {
            ParsedLine::Hit(hit) => {
                table.insert(&hit.query, &hit.subject, hit.evalue);
                outcome.parsed += 1;
            }
            ParsedLine::Ignored => {}
            ParsedLine::Malformed => {
                if !line.ends_with(CONVERGED_MARKER) {
                    tracing::warn!("Could not parse (psi-)blast response line: {}", line);
                    outcome.rejected.push(line.to_string());
                }
            }
        }
    }

    outcome
}

use crate::domain::model::{MatrixRow, ScoreTable};
use crate::utils::error::{EtlError, Result};

pub const MISSING_SCORE: &str = "NA";

/// ids × ids 的所有有序組合，跳過相同 ID 的組合
pub fn all_against_all(ids: &[String], scores: &ScoreTable) -> Vec<MatrixRow> {
    let mut rows = Vec::with_capacity(ids.len() * ids.len().saturating_sub(1));

    for query in ids {
        for subject in ids {
            if query == subject {
                continue;
            }
            rows.push(MatrixRow {
                query: query.clone(),
                subject: subject.clone(),
                score: scores.get(query, subject),
            });
        }
    }

    rows
}

/// 分數的精簡表示：`0.0`、`0.52`、`1e-50`、`2.5e-05`
pub fn format_score(score: f64) -> String {
    if score == 0.0 {
        return "0.0".to_string();
    }
    if !score.is_finite() {
        return score.to_string();
    }

    let magnitude = score.abs();
    if (1e-4..1e16).contains(&magnitude) {
        let plain = score.to_string();
        if plain.contains('.') {
            plain
        } else {
            format!("{}.0", plain)
        }
    } else {
        let scientific = format!("{:e}", score);
        match scientific.split_once('e') {
            Some((mantissa, exponent)) => {
                let exponent: i32 = exponent.parse().unwrap_or(0);
                let sign = if exponent < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, exponent.abs())
            }
            None => scientific,
        }
    }
}

/// 以 tab 分隔寫出矩陣，不含標頭、不加引號
pub fn render_matrix(rows: &[MatrixRow]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for row in rows {
        let score = row
            .score
            .map(format_score)
            .unwrap_or_else(|| MISSING_SCORE.to_string());
        writer.write_record([row.query.as_str(), row.subject.as_str(), score.as_str()])?;
    }

    writer.into_inner().map_err(|e| EtlError::ProcessingError {
        message: format!("Failed to finish matrix output: {}", e),
    })
}

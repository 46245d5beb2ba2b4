use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// (query, subject) 識別碼組合
pub type PairKey = (String, String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchProgram {
    #[default]
    Blastp,
    Psiblast,
}

impl SearchProgram {
    pub fn executable(&self) -> &'static str {
        match self {
            SearchProgram::Blastp => "blastp",
            SearchProgram::Psiblast => "psiblast",
        }
    }

    pub fn from_flag(psiblast: bool) -> Self {
        if psiblast {
            SearchProgram::Psiblast
        } else {
            SearchProgram::Blastp
        }
    }
}

impl fmt::Display for SearchProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.executable())
    }
}

/// 單一 query 執行外部比對工具後擷取的輸出
#[derive(Debug, Clone)]
pub struct QueryRun {
    pub query_id: String,
    pub command_line: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl QueryRun {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExtractResult {
    /// 清單中的所有 ID（含被跳過的）
    pub query_ids: Vec<String>,
    pub runs: Vec<QueryRun>,
}

/// (query, subject) -> e-value。同一組合重複寫入時以最後一次為準。
#[derive(Debug, Clone, Default)]
pub struct ScoreTable {
    scores: HashMap<PairKey, f64>,
}

impl ScoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, query: &str, subject: &str, score: f64) -> Option<f64> {
        self.scores
            .insert((query.to_string(), subject.to_string()), score)
    }

    pub fn get(&self, query: &str, subject: &str) -> Option<f64> {
        // HashMap<(String, String)> 無法直接用 (&str, &str) 查詢
        self.scores
            .get(&(query.to_string(), subject.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.scores.values().copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixRow {
    pub query: String,
    pub subject: String,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// 長度為 counts.len() + 1
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvalueDistribution {
    pub pseudocount: f64,
    pub log_values: Vec<f64>,
    pub mean: f64,
    pub histogram: Histogram,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub query_ids: Vec<String>,
    pub scores: ScoreTable,
    pub matrix: Vec<MatrixRow>,
    pub distribution: Option<EvalueDistribution>,
    pub below_threshold: usize,
    pub rejected_lines: usize,
    pub searched_queries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub generated_at: String,
    pub program: SearchProgram,
    pub database: String,
    pub evalue_threshold: f64,
    pub queries: usize,
    pub searched_queries: usize,
    pub pairs_scored: usize,
    pub matrix_rows: usize,
    pub missing_pairs: usize,
    pub below_threshold: usize,
    pub rejected_lines: usize,
    pub mean_log_evalue: Option<f64>,
    pub matrix_path: String,
    pub plot_path: Option<String>,
}

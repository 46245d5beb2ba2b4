use crate::adapters::blast::{AlignmentCommand, AlignmentRunner, SearchSettings};
use crate::core::distribution::{count_below, summarize};
use crate::core::matrix::{all_against_all, render_matrix};
use crate::core::parser::parse_tabular;
use crate::core::plot::{encode_histogram, PlotFormat};
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{ExtractResult, QueryRun, RunSummary, ScoreTable, TransformResult};
use crate::utils::error::Result;
use std::path::Path;

pub const QUERY_EXTENSION: &str = "fasta";

/// 去除 ID 前後的空白與換行；空行回傳 None
pub fn clean_query_id(line: &str) -> Option<&str> {
    let id = line.trim();
    (!id.is_empty()).then_some(id)
}

pub fn parse_id_list(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(clean_query_id)
        .map(str::to_string)
        .collect()
}

pub struct BlastPipeline<S: Storage, C: ConfigProvider, R: AlignmentRunner> {
    storage: S,
    config: C,
    runner: R,
    settings: SearchSettings,
}

impl<S: Storage, C: ConfigProvider, R: AlignmentRunner> BlastPipeline<S, C, R> {
    pub fn new(storage: S, config: C, runner: R) -> Self {
        let settings = SearchSettings::from_config(&config);
        Self {
            storage,
            config,
            runner,
            settings,
        }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub fn query_path(&self, query_id: &str) -> String {
        Path::new(self.config.query_folder())
            .join(format!("{}.{}", query_id, QUERY_EXTENSION))
            .to_string_lossy()
            .to_string()
    }

    pub async fn read_query_ids(&self) -> Result<Vec<String>> {
        let raw = self.storage.read_file(self.config.ids_file()).await?;
        let ids = parse_id_list(&String::from_utf8_lossy(&raw));
        tracing::debug!("Read {} query IDs from {}", ids.len(), self.config.ids_file());
        Ok(ids)
    }

    /// 每個 ID 對應的指令，不實際執行
    pub async fn plan(&self) -> Result<Vec<AlignmentCommand>> {
        let ids = self.read_query_ids().await?;
        Ok(ids
            .iter()
            .map(|id| AlignmentCommand::build(&self.settings, id, Path::new(&self.query_path(id))))
            .collect())
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, R: AlignmentRunner> Pipeline for BlastPipeline<S, C, R> {
    async fn extract(&self) -> Result<ExtractResult> {
        let query_ids = self.read_query_ids().await?;
        let mut runs = Vec::with_capacity(query_ids.len());
        let total = query_ids.len();

        for (index, query_id) in query_ids.iter().enumerate() {
            let query_path = self.query_path(query_id);
            if !self.storage.exists(&query_path).await {
                tracing::warn!(
                    "⚠️ Query file {} not found, skipping {}",
                    query_path,
                    query_id
                );
                continue;
            }

            let command = AlignmentCommand::build(&self.settings, query_id, Path::new(&query_path));
            tracing::info!(
                "🔍 [{}/{}] Running {} for {}",
                index + 1,
                total,
                self.settings.program,
                query_id
            );

            let output = self.runner.run(&command).await?;

            for line in output.stderr.lines().filter(|l| !l.trim().is_empty()) {
                tracing::warn!("{} ({}): {}", self.settings.program, query_id, line);
            }

            let run = QueryRun {
                query_id: query_id.clone(),
                command_line: command.command_line(),
                stdout: output.stdout,
                stderr: output.stderr,
                exit_code: output.exit_code,
            };

            if !run.succeeded() {
                tracing::warn!(
                    "{} exited with status {:?} for {}; parsing captured output anyway",
                    self.settings.program,
                    run.exit_code,
                    query_id
                );
            }

            runs.push(run);
        }

        Ok(ExtractResult { query_ids, runs })
    }

    async fn transform(&self, data: ExtractResult) -> Result<TransformResult> {
        let mut scores = ScoreTable::new();
        let mut rejected_lines = 0;

        for run in &data.runs {
            let outcome = parse_tabular(&run.stdout, &mut scores);
            tracing::debug!(
                "Parsed {} hits for {} ({} rejected)",
                outcome.parsed,
                run.query_id,
                outcome.rejected.len()
            );
            rejected_lines += outcome.rejected.len();
        }

        let values: Vec<f64> = scores.values().collect();
        let below_threshold = count_below(&values, self.config.evalue());
        let distribution = summarize(&values, self.config.histogram_bins());
        let matrix = all_against_all(&data.query_ids, &scores);

        tracing::info!(
            "📊 {} scored pairs, {} below e-value {}",
            scores.len(),
            below_threshold,
            self.config.evalue()
        );

        Ok(TransformResult {
            query_ids: data.query_ids,
            scores,
            matrix,
            distribution,
            below_threshold,
            rejected_lines,
            searched_queries: data.runs.len(),
        })
    }

    async fn load(&self, result: TransformResult) -> Result<RunSummary> {
        let matrix_path = self.config.output_file().to_string();
        let matrix_data = render_matrix(&result.matrix)?;
        self.storage.write_file(&matrix_path, &matrix_data).await?;
        tracing::debug!("Wrote {} matrix rows to {}", result.matrix.len(), matrix_path);

        let plot_path = match &result.distribution {
            Some(distribution) => {
                let path = self.config.output_png().to_string();
                let image = encode_histogram(distribution, PlotFormat::from_path(&path))?;
                self.storage.write_file(&path, &image).await?;
                tracing::debug!("Histogram saved to {}", path);
                Some(path)
            }
            None => {
                tracing::warn!("No e-values parsed, skipping histogram");
                None
            }
        };

        let summary = RunSummary {
            generated_at: chrono::Utc::now().to_rfc3339(),
            program: self.settings.program,
            database: self.settings.database.clone(),
            evalue_threshold: self.settings.evalue,
            queries: result.query_ids.len(),
            searched_queries: result.searched_queries,
            pairs_scored: result.scores.len(),
            matrix_rows: result.matrix.len(),
            missing_pairs: result.matrix.iter().filter(|r| r.score.is_none()).count(),
            below_threshold: result.below_threshold,
            rejected_lines: result.rejected_lines,
            mean_log_evalue: result.distribution.as_ref().map(|d| d.mean),
            matrix_path,
            plot_path,
        };

        if let Some(summary_path) = self.config.summary_path() {
            let json = serde_json::to_string_pretty(&summary)?;
            self.storage.write_file(summary_path, json.as_bytes()).await?;
            tracing::debug!("Run summary saved to {}", summary_path);
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::blast::ToolOutput;
    use crate::domain::model::SearchProgram;
    use crate::utils::error::EtlError;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn put(&self, path: &str, data: &str) {
            self.files
                .lock()
                .await
                .insert(path.to_string(), data.as_bytes().to_vec());
        }

        async fn get_text(&self, path: &str) -> Option<String> {
            let files = self.files.lock().await;
            files
                .get(path)
                .map(|d| String::from_utf8_lossy(d).to_string())
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        async fn exists(&self, path: &str) -> bool {
            self.files.lock().await.contains_key(path)
        }
    }

    struct MockConfig {
        program: SearchProgram,
        summary: Option<String>,
    }

    impl ConfigProvider for MockConfig {
        fn ids_file(&self) -> &str {
            "ids.txt"
        }
        fn query_folder(&self) -> &str {
            "queries"
        }
        fn database(&self) -> &str {
            "sprot"
        }
        fn program(&self) -> SearchProgram {
            self.program
        }
        fn evalue(&self) -> f64 {
            1.0
        }
        fn num_iterations(&self) -> u32 {
            3
        }
        fn blast_path(&self) -> Option<&str> {
            None
        }
        fn output_file(&self) -> &str {
            "out/matrix.tsv"
        }
        fn output_png(&self) -> &str {
            "out/hist.svg"
        }
        fn summary_path(&self) -> Option<&str> {
            self.summary.as_deref()
        }
    }

    /// 依 query ID 回傳預先準備好的輸出，並記錄收到的指令
    #[derive(Default)]
    struct ScriptedRunner {
        outputs: HashMap<String, String>,
        seen: Mutex<Vec<String>>,
    }

    impl AlignmentRunner for ScriptedRunner {
        async fn run(&self, command: &AlignmentCommand) -> Result<ToolOutput> {
            self.seen.lock().await.push(command.command_line());
            Ok(ToolOutput {
                stdout: self
                    .outputs
                    .get(&command.query_id)
                    .cloned()
                    .unwrap_or_default(),
                stderr: String::new(),
                exit_code: Some(0),
            })
        }
    }

    async fn storage_with_queries(ids: &str, present: &[&str]) -> MockStorage {
        let storage = MockStorage::default();
        storage.put("ids.txt", ids).await;
        for id in present {
            storage.put(&format!("queries/{}.fasta", id), ">seq\nMKV\n").await;
        }
        storage
    }

    #[test]
    fn test_parse_id_list() {
        let ids = parse_id_list("P1\nP2 \n\n  P3\r\n");
        assert_eq!(ids, vec!["P1", "P2", "P3"]);
    }

    #[tokio::test]
    async fn test_full_run_with_scripted_runner() {
        let storage = storage_with_queries("P1\nP2\nP3\n", &["P1", "P2", "P3"]).await;
        let mut runner = ScriptedRunner::default();
        runner.outputs.insert(
            "P1".to_string(),
            "sp|P1|A\tsp|P1|A\t0.0\nsp|P1|A\tsp|P2|B\t1e-40\n".to_string(),
        );
        runner.outputs.insert(
            "P2".to_string(),
            "sp|P2|B\tsp|P1|A\t2e-38\nsp|P2|B\tsp|P3|C\t5.0\n".to_string(),
        );

        let config = MockConfig {
            program: SearchProgram::Blastp,
            summary: Some("out/summary.json".to_string()),
        };
        let pipeline = BlastPipeline::new(storage.clone(), config, runner);

        let extracted = pipeline.extract().await.unwrap();
        assert_eq!(extracted.runs.len(), 3);

        let transformed = pipeline.transform(extracted).await.unwrap();
        assert_eq!(transformed.scores.len(), 4);
        // 0.0, 1e-40, 2e-38 < 1.0
        assert_eq!(transformed.below_threshold, 3);
        assert_eq!(transformed.matrix.len(), 6);

        let summary = pipeline.load(transformed).await.unwrap();
        assert_eq!(summary.missing_pairs, 3);
        assert_eq!(summary.plot_path.as_deref(), Some("out/hist.svg"));

        let matrix = storage.get_text("out/matrix.tsv").await.unwrap();
        assert_eq!(
            matrix,
            "P1\tP2\t1e-40\nP1\tP3\tNA\nP2\tP1\t2e-38\nP2\tP3\t5.0\nP3\tP1\tNA\nP3\tP2\tNA\n"
        );

        let json = storage.get_text("out/summary.json").await.unwrap();
        let parsed: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.pairs_scored, 4);
        assert_eq!(parsed.program, SearchProgram::Blastp);

        let svg = storage.get_text("out/hist.svg").await.unwrap();
        assert!(svg.contains("Average log(e-value)"));
    }

    #[tokio::test]
    async fn test_missing_query_file_is_skipped_but_kept_in_matrix() {
        let storage = storage_with_queries("P1\nP2\n", &["P1"]).await;
        let config = MockConfig {
            program: SearchProgram::Psiblast,
            summary: None,
        };
        let pipeline = BlastPipeline::new(storage.clone(), config, ScriptedRunner::default());

        let extracted = pipeline.extract().await.unwrap();
        assert_eq!(extracted.query_ids, vec!["P1", "P2"]);
        assert_eq!(extracted.runs.len(), 1);
        assert!(extracted.runs[0].command_line.starts_with("psiblast "));

        let transformed = pipeline.transform(extracted).await.unwrap();
        assert!(transformed.distribution.is_none());

        let summary = pipeline.load(transformed).await.unwrap();
        assert_eq!(summary.searched_queries, 1);
        assert!(summary.plot_path.is_none());
        assert_eq!(
            storage.get_text("out/matrix.tsv").await.unwrap(),
            "P1\tP2\tNA\nP2\tP1\tNA\n"
        );
        assert!(storage.get_text("out/summary.json").await.is_none());
    }

    #[tokio::test]
    async fn test_plan_lists_commands() {
        let storage = storage_with_queries("P1\n\nP2\n", &[]).await;
        let config = MockConfig {
            program: SearchProgram::Blastp,
            summary: None,
        };
        let pipeline = BlastPipeline::new(storage, config, ScriptedRunner::default());

        let plan = pipeline.plan().await.unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[1].query_id, "P2");
        assert!(plan[1]
            .command_line()
            .contains(&format!("-query {}", Path::new("queries").join("P2.fasta").display())));
    }
}

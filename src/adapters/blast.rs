use crate::core::ConfigProvider;
use crate::domain::model::SearchProgram;
use crate::utils::error::{EtlError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// 只輸出 query、subject accession 與 e-value 三欄
pub const TABULAR_OUTFMT: &str = "6 qacc sacc evalue";

#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub program: SearchProgram,
    pub database: String,
    pub evalue: f64,
    pub num_iterations: u32,
    pub blast_path: Option<PathBuf>,
}

impl SearchSettings {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self {
            program: config.program(),
            database: config.database().to_string(),
            evalue: config.evalue(),
            num_iterations: config.num_iterations(),
            blast_path: config
                .blast_path()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    fn executable(&self) -> PathBuf {
        match &self.blast_path {
            Some(dir) => dir.join(self.program.executable()),
            None => PathBuf::from(self.program.executable()),
        }
    }
}

/// 一個 query 的完整外部指令（不經過 shell）
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentCommand {
    pub query_id: String,
    program: PathBuf,
    args: Vec<String>,
}

impl AlignmentCommand {
    pub fn build(settings: &SearchSettings, query_id: &str, query_path: &Path) -> Self {
        let mut args = vec![
            "-query".to_string(),
            query_path.to_string_lossy().to_string(),
            "-db".to_string(),
            settings.database.clone(),
        ];

        if settings.program == SearchProgram::Psiblast {
            args.extend_from_slice(&[
                "-num_iterations".to_string(),
                settings.num_iterations.to_string(),
            ]);
        }

        args.extend_from_slice(&[
            "-outfmt".to_string(),
            TABULAR_OUTFMT.to_string(),
            "-evalue".to_string(),
            settings.evalue.to_string(),
        ]);

        // 關閉 composition-based statistics，避免 psiblast 每次都印警告
        if settings.program == SearchProgram::Psiblast {
            args.extend_from_slice(&["-comp_based_stats".to_string(), "0".to_string()]);
        }

        Self {
            query_id: query_id.to_string(),
            program: settings.executable(),
            args,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// 供日誌與 dry run 顯示的 shell 形式
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.to_string_lossy().to_string())
            .chain(self.args.iter().cloned())
            .map(|part| {
                if part.is_empty() || part.contains(char::is_whitespace) {
                    format!("\"{}\"", part)
                } else {
                    part
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

pub trait AlignmentRunner: Send + Sync {
    fn run(
        &self,
        command: &AlignmentCommand,
    ) -> impl std::future::Future<Output = Result<ToolOutput>> + Send;
}

/// 以子行程執行 blastp / psiblast，一次一個
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl AlignmentRunner for ProcessRunner {
    async fn run(&self, command: &AlignmentCommand) -> Result<ToolOutput> {
        tracing::debug!("Running '{}'", command.command_line());

        let output = tokio::process::Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| EtlError::ToolLaunchError {
                program: command.program().display().to_string(),
                source,
            })?;

        Ok(ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}

//! 用一個假的 blastp shell script 走過真實的子行程路徑。
//! 單獨放一個測試檔，避免與其他測試平行寫入可執行檔。

#![cfg(unix)]

use anyhow::Result;
use blast_etl::utils::logger::LogFormat;
use blast_etl::{BlastPipeline, CliConfig, EtlEngine, LocalStorage, ProcessRunner};
use std::os::unix::fs::PermissionsExt;
use tempfile::TempDir;

const FAKE_BLASTP: &str = r#"#!/bin/sh
query=""
while [ $# -gt 0 ]; do
  case "$1" in
    -query) query="$2"; shift 2 ;;
    *) shift ;;
  esac
done
id=$(basename "$query" .fasta)
case "$id" in
  P1)
    printf '# BLASTP 2.14.0+\n'
    printf 'sp|P1|AAA_HUMAN\tsp|P1|AAA_HUMAN\t0.0\n'
    printf 'sp|P1|AAA_HUMAN\tsp|P2|BBB_HUMAN\t4e-30\n'
    ;;
  P2)
    printf 'sp|P2|BBB_HUMAN\tsp|P1|AAA_HUMAN\t5e-29\n'
    printf 'truncated-line\n'
    echo "Warning: [blastp] Query is low complexity" >&2
    exit 1
    ;;
esac
exit 0
"#;

#[tokio::test]
async fn test_fake_blastp_through_process_runner() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();

    let bin_dir = root.join("bin");
    std::fs::create_dir_all(&bin_dir)?;
    let script = bin_dir.join("blastp");
    std::fs::write(&script, FAKE_BLASTP)?;
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))?;

    std::fs::write(root.join("ids.txt"), "P1\nP2 \n\nP3\n")?;
    let queries = root.join("queries");
    std::fs::create_dir_all(&queries)?;
    std::fs::write(queries.join("P1.fasta"), ">P1\nMKV\n")?;
    std::fs::write(queries.join("P2.fasta"), ">P2\nMKL\n")?;
    // P3 沒有 FASTA，應被跳過

    let config = CliConfig {
        protein_ids_file: root.join("ids.txt").to_string_lossy().to_string(),
        query_folder: queries.to_string_lossy().to_string(),
        db: "testdb".to_string(),
        output_file: root.join("scores.tsv").to_string_lossy().to_string(),
        output_png: root.join("hist.svg").to_string_lossy().to_string(),
        psiblast: false,
        evalue: 1e-10,
        num_iterations: 3,
        blast_path: Some(bin_dir.to_string_lossy().to_string()),
        summary_json: None,
        bins: 5,
        verbose: false,
        monitor: false,
        log_format: LogFormat::Compact,
    };

    let pipeline = BlastPipeline::new(LocalStorage::default(), config, ProcessRunner::new());
    let summary = EtlEngine::new(pipeline).run().await?;

    assert_eq!(summary.queries, 3);
    assert_eq!(summary.searched_queries, 2);
    assert_eq!(summary.pairs_scored, 3);
    assert_eq!(summary.rejected_lines, 1);
    assert_eq!(summary.below_threshold, 3);

    let matrix = std::fs::read_to_string(root.join("scores.tsv"))?;
    assert_eq!(
        matrix,
        "P1\tP2\t4e-30\nP1\tP3\tNA\nP2\tP1\t5e-29\nP2\tP3\tNA\nP3\tP1\tNA\nP3\tP2\tNA\n"
    );
    assert!(root.join("hist.svg").exists());

    Ok(())
}

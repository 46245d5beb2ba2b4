use crate::core::ConfigProvider;
use crate::domain::model::SearchProgram;
use crate::domain::ports::{
    DEFAULT_EVALUE, DEFAULT_HISTOGRAM_BINS, DEFAULT_NUM_ITERATIONS, DEFAULT_PLOT_FILE,
};
use crate::utils::error::Result;
use crate::utils::logger::LogFormat;
use crate::utils::validation::{
    validate_evalue, validate_existing_file, validate_non_empty_string, validate_path,
    validate_positive_number, Validate,
};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "blast-etl")]
#[command(about = "Automatically run BLAST or PSI-BLAST for a list of UniProt IDs")]
pub struct CliConfig {
    /// File with one UniProt ID per line
    #[arg(long = "protein-ids-file", visible_alias = "ids")]
    pub protein_ids_file: String,

    /// Folder holding <ID>.fasta query files
    #[arg(short, long)]
    pub query_folder: String,

    /// BLAST database to search
    #[arg(long)]
    pub db: String,

    /// All-against-all score matrix (tab separated)
    #[arg(short, long)]
    pub output_file: String,

    /// Histogram of log(e-value); .svg writes SVG, anything else PNG
    #[arg(long, visible_alias = "opng", default_value = DEFAULT_PLOT_FILE)]
    pub output_png: String,

    /// Run PSI-BLAST instead of BLASTP
    #[arg(long, visible_alias = "psi")]
    pub psiblast: bool,

    /// E-value threshold passed to the tool and used for the summary count
    #[arg(long, visible_alias = "eval", default_value_t = DEFAULT_EVALUE)]
    pub evalue: f64,

    /// PSI-BLAST iterations
    #[arg(long, default_value_t = DEFAULT_NUM_ITERATIONS)]
    pub num_iterations: u32,

    /// Directory containing the blastp/psiblast executables
    #[arg(long)]
    pub blast_path: Option<String>,

    /// Write a JSON run summary to this path
    #[arg(long)]
    pub summary_json: Option<String>,

    /// Number of histogram bins
    #[arg(long, default_value_t = DEFAULT_HISTOGRAM_BINS)]
    pub bins: usize,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl ConfigProvider for CliConfig {
    fn ids_file(&self) -> &str {
        &self.protein_ids_file
    }

    fn query_folder(&self) -> &str {
        &self.query_folder
    }

    fn database(&self) -> &str {
        &self.db
    }

    fn program(&self) -> SearchProgram {
        SearchProgram::from_flag(self.psiblast)
    }

    fn evalue(&self) -> f64 {
        self.evalue
    }

    fn num_iterations(&self) -> u32 {
        self.num_iterations
    }

    fn blast_path(&self) -> Option<&str> {
        self.blast_path.as_deref()
    }

    fn output_file(&self) -> &str {
        &self.output_file
    }

    fn output_png(&self) -> &str {
        &self.output_png
    }

    fn summary_path(&self) -> Option<&str> {
        self.summary_json.as_deref()
    }

    fn histogram_bins(&self) -> usize {
        self.bins
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_existing_file("protein_ids_file", &self.protein_ids_file)?;
        validate_path("query_folder", &self.query_folder)?;
        validate_non_empty_string("db", &self.db)?;
        validate_path("output_file", &self.output_file)?;
        validate_path("output_png", &self.output_png)?;
        validate_evalue("evalue", self.evalue)?;
        validate_positive_number("num_iterations", self.num_iterations as usize, 1)?;
        validate_positive_number("bins", self.bins, 1)?;
        if let Some(summary) = &self.summary_json {
            validate_path("summary_json", summary)?;
        }
        Ok(())
    }
}

//! Training report rendering

use clap::ValueEnum;
use colored::Colorize;
use qoe_lib::training::RegressionMetrics;
use qoe_lib::{DataSource, TrainingReport};
use tabled::{settings::Style, Table, Tabled};

/// Output format for the training report
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

#[derive(Tabled)]
struct CandidateRow {
    #[tabled(rename = "n_estimators")]
    n_estimators: usize,
    #[tabled(rename = "max_depth")]
    max_depth: u32,
    #[tabled(rename = "learning_rate")]
    learning_rate: f64,
    #[tabled(rename = "CV MSE")]
    mean_mse: String,
    #[tabled(rename = "std")]
    std_mse: String,
    #[tabled(rename = "")]
    marker: String,
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    name: &'static str,
    #[tabled(rename = "Test")]
    value: String,
}

/// Print the report to stdout
pub fn print_report(report: &TrainingReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => {
            print_info(&source_line(report));
            print_info(&format!(
                "Split: {} train / {} test, {} feature columns ({})",
                report.train_samples,
                report.test_samples,
                report.columns.len(),
                report.categories.join(", ")
            ));
            println!("{}", candidate_table(report));
            println!("{}", metrics_table(&report.test_metrics));
            print_success(&format!(
                "Best model: {} (CV MSE {:.4})",
                report.best_params, report.best_cv_mse
            ));
            print_success(&format!("Bundle {} saved", report.bundle_id.bold()));
            for path in &report.artifacts {
                println!("  {}", path.display());
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
    }
    Ok(())
}

fn source_line(report: &TrainingReport) -> String {
    match &report.source {
        DataSource::File(path) => {
            format!("Loaded {} samples from {}", report.samples, path.display())
        }
        DataSource::Synthetic {
            seed,
            saved_to: Some(path),
        } => format!(
            "Synthesized {} samples (seed {}), saved to {}",
            report.samples,
            seed,
            path.display()
        ),
        DataSource::Synthetic { seed, saved_to: None } => {
            format!("Synthesized {} samples (seed {})", report.samples, seed)
        }
    }
}

fn candidate_table(report: &TrainingReport) -> String {
    let best = &report.best_params;
    let rows: Vec<CandidateRow> = report
        .cv_results
        .iter()
        .map(|r| CandidateRow {
            n_estimators: r.params.n_estimators,
            max_depth: r.params.max_depth,
            learning_rate: r.params.learning_rate,
            mean_mse: format!("{:.4}", r.mean_mse),
            std_mse: format!("{:.4}", r.std_mse),
            marker: if &r.params == best {
                "best".green().to_string()
            } else {
                String::new()
            },
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

fn metrics_table(metrics: &RegressionMetrics) -> String {
    let rows = vec![
        MetricRow {
            name: "MSE",
            value: format!("{:.4}", metrics.mse),
        },
        MetricRow {
            name: "RMSE",
            value: format!("{:.4}", metrics.rmse),
        },
        MetricRow {
            name: "MAE",
            value: format!("{:.4}", metrics.mae),
        },
        MetricRow {
            name: "R²",
            value: color_r2(metrics.r2),
        },
    ];
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Color R² by fit quality
fn color_r2(r2: f64) -> String {
    let formatted = format!("{:.4}", r2);
    if r2 >= 0.8 {
        formatted.green().to_string()
    } else if r2 >= 0.5 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

//! Interactive plan-then-code session.

use std::io::Write;

use anyhow::Result;
use colored::Colorize;
use comfy_table::Table;
use rover_orchestrator::{CodeWriter, CodeWriterConfig, Planner, SelectionResult};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info};

use super::build_model;
use crate::config::RoverConfig;

/// Attempts per request while the best candidate looks truncated.
pub const DEFAULT_ATTEMPTS: usize = 2;

/// Scores below this get a quality warning.
const LOW_SCORE: f64 = 0.6;

const RULE_WIDTH: usize = 60;

/// Execute the code command against stdin and stdout.
pub async fn execute(config: &RoverConfig, attempts: usize) -> Result<()> {
    config.validate()?;

    let planner = Planner::new(build_model(config, &config.orchestrator_model)?, None);
    let writer = CodeWriter::new(
        build_model(config, &config.codewriter_model)?,
        CodeWriterConfig {
            temperatures: config.temperatures.clone(),
            max_tokens: config.max_tokens,
            ..CodeWriterConfig::default()
        },
    )?;

    info!(
        orchestrator = %config.orchestrator_model,
        codewriter = %config.codewriter_model,
        temperatures = ?config.temperatures,
        "Code session ready"
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    run_session(&planner, &writer, attempts, stdin, &mut stdout).await
}

/// Reads requests line by line until EOF or a quit word.
pub async fn run_session<R, W>(
    planner: &Planner,
    writer: &CodeWriter,
    attempts: usize,
    input: R,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "{}", "CodeRover".bold().cyan())?;
    writeln!(out, "  Planning: {}", planner.model_id())?;
    writeln!(out, "  Temperatures: {:?}", writer.config().temperatures)?;
    writeln!(out, "Type 'quit' or 'exit' to stop.")?;

    let mut lines = input.lines();
    loop {
        writeln!(out)?;
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };
        let request = line.trim();

        if matches!(request.to_lowercase().as_str(), "quit" | "exit" | "q") {
            break;
        }
        if request.is_empty() {
            writeln!(out, "{}", "Please enter a request.".yellow())?;
            continue;
        }

        handle_request(planner, writer, attempts, request, out).await?;
    }

    writeln!(out, "Goodbye!")?;
    Ok(())
}

async fn handle_request<W: Write>(
    planner: &Planner,
    writer: &CodeWriter,
    attempts: usize,
    request: &str,
    out: &mut W,
) -> Result<()> {
    let plan = planner.plan(request).await;
    writeln!(out)?;
    writeln!(out, "{}", "Plan:".bold())?;
    writeln!(out, "  Task: {}", plan.task)?;
    writeln!(out, "  Tests: {}", plan.tests)?;
    writeln!(out, "  Constraints: {}", plan.constraints)?;

    let result = writer.generate_with_retry(&plan.code_prompt(), attempts, None).await;
    let best = &result.best;

    if let Some(ref err) = best.error {
        error!(error = %err, "Code generation failed");
        writeln!(out)?;
        writeln!(out, "{} {}", "Generation issue:".red().bold(), err)?;
        writeln!(out, "Please try again with a different request.")?;
        return Ok(());
    }

    if best.score < LOW_SCORE {
        writeln!(out)?;
        writeln!(
            out,
            "{}",
            format!("Warning: generated code quality is low (score={:.2})", best.score).yellow()
        )?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "{}",
        format!("Best code (temperature={}, score={:.2}):", best.temperature, best.score)
            .green()
            .bold()
    )?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
    writeln!(out, "{}", best.text)?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;

    writeln!(out)?;
    writeln!(out, "All candidates ({}):", result.candidates.len())?;
    writeln!(out, "{}", candidate_table(&result))?;
    Ok(())
}

fn candidate_table(result: &SelectionResult) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", "Status", "Temperature", "Score", "Note"]);
    for (i, candidate) in result.candidates.iter().enumerate() {
        let (status, score, note) = match candidate.error {
            Some(ref err) => ("ERROR", "N/A".to_string(), err.to_string()),
            None => ("ok", format!("{:.2}", candidate.score), String::new()),
        };
        table.add_row(vec![
            (i + 1).to_string(),
            status.to_string(),
            candidate.temperature.to_string(),
            score,
            note,
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use rover_models::MockModel;
    use std::sync::Arc;

    fn session_parts() -> (Planner, CodeWriter) {
        let planner = Planner::new(Arc::new(MockModel::new("mock-planner".to_string())), None);
        let writer = CodeWriter::new(
            Arc::new(MockModel::new("mock-writer".to_string())),
            CodeWriterConfig { temperatures: vec![0.2, 0.9], ..CodeWriterConfig::default() },
        )
        .unwrap();
        (planner, writer)
    }

    async fn run(input: &str) -> String {
        colored::control::set_override(false);
        let (planner, writer) = session_parts();
        let mut out = Vec::new();
        run_session(&planner, &writer, 2, input.as_bytes(), &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn test_quit_words_end_session() {
        for word in ["quit", "EXIT", "  q  "] {
            let out = run(&format!("{}\nwrite fib\n", word)).await;
            assert!(out.ends_with("Goodbye!\n"));
            assert!(!out.contains("Plan:"));
        }
    }

    #[tokio::test]
    async fn test_empty_line_is_skipped() {
        let out = run("\nquit\n").await;
        assert!(out.contains("Please enter a request."));
        assert!(!out.contains("Plan:"));
    }

    #[tokio::test]
    async fn test_request_prints_plan_best_and_table() {
        let out = run("write fib\n").await;

        assert!(out.contains("Plan:"));
        assert!(out.contains("Best code (temperature=0.2"));
        assert!(out.contains("# mock-writer (temperature 0.2)"));
        assert!(out.contains("All candidates (2):"));
        assert!(out.ends_with("Goodbye!\n"));
    }
}

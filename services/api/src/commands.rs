use crate::infra::{load_dataset, load_engine, Analytics};
use clap::Args;
use edu_insight::analytics::batch::export_predictions;
use edu_insight::analytics::view::{Facet, Scope, SortColumn, TableView};
use edu_insight::analytics::{assistant_context, build_view, ViewAction};
use edu_insight::error::AppError;
use edu_insight::{BatchOutcome, ViewState};
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub(crate) struct PredictArgs {
    /// Student CSV export to score
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Write the Row/Persona/Risk prediction dump to this path
    #[arg(long)]
    pub(crate) export: Option<PathBuf>,
    /// Persona model JSON overriding the built-in centroids
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct TableArgs {
    /// Student CSV export to score
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// School type filter (exact match, "All" disables)
    #[arg(long, default_value = "All")]
    pub(crate) school: Facet,
    /// Gender filter (exact match, "All" disables)
    #[arg(long, default_value = "All")]
    pub(crate) gender: Facet,
    /// Motivation filter: Low, Medium, High or All
    #[arg(long, default_value = "All")]
    pub(crate) motivation: Facet,
    /// Row population: "high" for the high-risk subset or "all"
    #[arg(long, default_value = "high")]
    pub(crate) scope: Scope,
    /// Column to sort by (row, persona, score, attend, risk_score, ...)
    #[arg(long)]
    pub(crate) sort: Option<SortColumn>,
    /// Sort descending instead of ascending
    #[arg(long)]
    pub(crate) descending: bool,
    /// 1-based page number; out-of-range pages are clamped
    #[arg(long, default_value_t = 1)]
    pub(crate) page: usize,
    /// Persona model JSON overriding the built-in centroids
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ContextArgs {
    /// Student CSV export to summarize
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Persona model JSON overriding the built-in centroids
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
}

pub(crate) fn run_predict(args: PredictArgs) -> Result<(), AppError> {
    let PredictArgs { csv, export, model } = args;
    let engine = load_engine(model.as_deref())?;
    let outcome = load_dataset(&engine, &csv)?;

    render_batch_summary(&csv, &outcome);

    if let Some(path) = export {
        export_predictions(&outcome.records, File::create(&path)?)?;
        println!("\nPredictions written to {}", path.display());
    }

    Ok(())
}

pub(crate) fn run_table(args: TableArgs) -> Result<(), AppError> {
    let analytics = load_analytics(&args.csv, args.model.as_deref())?;
    let state = table_state(&args);
    let view = build_view(&analytics.dataset, &state);

    render_table(&view);
    Ok(())
}

pub(crate) fn run_context(args: ContextArgs) -> Result<(), AppError> {
    let analytics = load_analytics(&args.csv, args.model.as_deref())?;
    println!("{}", assistant_context(&analytics.summary));
    Ok(())
}

fn load_analytics(csv: &Path, model: Option<&Path>) -> Result<Analytics, AppError> {
    let engine = load_engine(model)?;
    let outcome = load_dataset(&engine, csv)?;
    Ok(Analytics::new(engine, Some(outcome)))
}

/// Replays the flags as view actions so the CLI walks the same transitions as
/// the HTTP table endpoint.
fn table_state(args: &TableArgs) -> ViewState {
    let mut state = ViewState::default()
        .apply(ViewAction::SetScope(args.scope))
        .apply(ViewAction::SetSchool(args.school.clone()))
        .apply(ViewAction::SetGender(args.gender.clone()))
        .apply(ViewAction::SetMotivation(args.motivation.clone()));

    if let Some(column) = args.sort {
        state = state.apply(ViewAction::SortBy(column));
        if args.descending {
            state = state.apply(ViewAction::SortBy(column));
        }
    }

    state.apply(ViewAction::GoToPage(args.page))
}

fn render_batch_summary(csv: &Path, outcome: &BatchOutcome) {
    println!("Student batch {}", csv.display());
    println!(
        "- {} rows read | {} scored | {} rejected",
        outcome.total_rows,
        outcome.accepted(),
        outcome.rejected.len()
    );

    let mut tiers = [0usize; 3];
    for scored in &outcome.records {
        tiers[usize::from(scored.risk.tier.rank())] += 1;
    }
    println!(
        "- Risk tiers: {} high | {} medium | {} low",
        tiers[2], tiers[1], tiers[0]
    );

    if !outcome.rejected.is_empty() {
        println!("Rejected rows:");
        for rejected in &outcome.rejected {
            println!("  - row {}: {}", rejected.row, rejected.error);
        }
    }
}

fn render_table(view: &TableView<'_>) {
    let meta = &view.meta;
    println!(
        "Page {} of {} ({} students)",
        meta.page, meta.total_pages, meta.total_rows
    );
    if view.rows.is_empty() {
        println!("No students match the current filters.");
        return;
    }

    println!(
        "{:>5}  {:<19} {:<8} {:<7} {:>6} {:>7} {:>6} {:<7} {:>5}  {:<6}",
        "Row", "Persona", "School", "Gender", "Score", "Attend", "Hours", "Motiv", "Risk", "Tier"
    );
    for scored in &view.rows {
        let record = &scored.record;
        println!(
            "{:>5}  {:<19} {:<8} {:<7} {:>6.1} {:>7.1} {:>6.1} {:<7} {:>5}  {:<6}",
            scored.row,
            scored.persona().name(),
            record.school.as_deref().unwrap_or("-"),
            record.gender.as_deref().unwrap_or("-"),
            record.exam_score,
            record.attendance,
            record.hours_studied,
            record.motivation_level.label(),
            scored.risk.risk_score,
            scored.risk.tier.label(),
        );
    }
}

//! Subcommand handlers
//!
//! Each handler builds what it needs from the effective configuration,
//! runs the engine and prints plain tables to stdout.

use crate::catalog::{country_label, CountrySelection, IndicatorCatalog, IndicatorDef};
use crate::cli::args::{peer_list, year_range, Args, Commands};
use crate::cli::config::Config;
use crate::cli::display::{
    fmt_delta, fmt_percent, fmt_point, fmt_value, short, spinner, status_label, MISSING,
};
use crate::dashboard::{GoalOverview, ProgressService};
use crate::fetch::SeriesSource;
use crate::types::{CountryCode, DataSource, YearRange};
use anyhow::{Context, Result};
use colored::*;
use std::sync::Arc;

/// Window used by `series --smooth`
const SMOOTHING_WINDOW: usize = 3;

/// Peers listed under each indicator in `status`
const SNAPSHOT_LIMIT: usize = 5;

/// Dispatch the parsed command
pub async fn run(args: &Args, config: &Config) -> Result<()> {
    let show_progress = args.verbosity().show_progress();

    match &args.command {
        Commands::Goals => {
            list_goals(&config.catalog()?);
            Ok(())
        }
        Commands::Indicators { goal } => list_indicators(&config.catalog()?, *goal),
        Commands::Status {
            goal,
            focus,
            preset,
            peers,
            baseline,
        } => {
            let selection = selection(config, focus.as_deref(), preset.as_deref(), peers.as_deref())?;
            let service = build_service(config, *baseline)?;
            let years = YearRange::default_window();

            let pb = spinner(&format!("Fetching SDG {} indicators…", goal), show_progress);
            let overview = service.goal_overview(*goal, &selection.all(), years).await;
            pb.finish_and_clear();

            print_overview(&overview?, &selection, service.baseline_year());
            Ok(())
        }
        Commands::Series {
            indicator,
            focus,
            preset,
            peers,
            from,
            to,
            smooth,
            source,
        } => {
            let selection = selection(config, focus.as_deref(), preset.as_deref(), peers.as_deref())?;
            let years = year_range(*from, *to)?;
            let service = build_service(config, None)?;
            let def = resolve_indicator(service.catalog(), indicator, *source)?;

            let pb = spinner(&format!("Fetching {}…", indicator), show_progress);
            let report = service.report(&def, &selection.all(), years).await;
            pb.finish_and_clear();
            let report = report?;

            println!(
                "{} {} ({})",
                report.indicator.label.bold(),
                report.indicator.code.dimmed(),
                years
            );
            for country in selection.all() {
                if let Some(series) = report.series.get(&country) {
                    let smoothed = (*smooth).then(|| series.rolling_mean(SMOOTHING_WINDOW));
                    print_series(&country, series.usable().collect(), smoothed);
                }
            }
            Ok(())
        }
        Commands::Define { indicator } => {
            let client = config.client()?;
            let pb = spinner(&format!("Looking up {}…", indicator), show_progress);
            let meta = client.indicator_meta(indicator).await;
            pb.finish_and_clear();
            let meta = meta?;

            println!("{} {}", meta.name.bold(), meta.id.dimmed());
            if !meta.unit.is_empty() {
                println!("  Unit:   {}", meta.unit);
            }
            println!("  Source: {}", or_missing(meta.source_name()));
            println!();
            println!("{}", short(or_missing(&meta.source_note), 600));
            Ok(())
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

/// Service wired from configuration, with an optional baseline override
pub fn build_service(config: &Config, baseline: Option<i32>) -> Result<ProgressService> {
    let source: Arc<dyn SeriesSource> = Arc::new(config.source()?);
    let service = ProgressService::new(config.catalog()?, source, config.cache())
        .with_parallelism(config.progress.max_parallel_fetches)
        .with_baseline_year(baseline.unwrap_or(config.progress.baseline_year));
    Ok(service)
}

/// Focus and peers from flags, falling back to configuration
pub fn selection(
    config: &Config,
    focus: Option<&str>,
    preset: Option<&str>,
    peers: Option<&str>,
) -> Result<CountrySelection> {
    let focus = match focus {
        Some(code) => CountryCode::new(code)?,
        None => config.focus_country()?,
    };
    let preset = preset.or(config.selection.preset.as_deref());
    let manual = peer_list(peers)?;

    CountrySelection::build(focus, preset, &manual).context("invalid country selection")
}

/// Catalogue entry for `code`, or a bare definition when a source is named
/// for a code the catalogue lacks
pub fn resolve_indicator(
    catalog: &IndicatorCatalog,
    code: &str,
    source: Option<DataSource>,
) -> Result<IndicatorDef> {
    match (catalog.indicator(code), source) {
        (Ok(def), Some(source)) if def.source != source => Ok(def.clone().with_source(source)),
        (Ok(def), _) => Ok(def.clone()),
        (Err(_), Some(source)) => Ok(IndicatorDef::new(code.trim(), code.trim()).with_source(source)),
        (Err(e), None) => Err(e.into()),
    }
}

fn list_goals(catalog: &IndicatorCatalog) {
    for goal in catalog.goals() {
        let count = if goal.indicator_count == 0 {
            "no indicators".dimmed().to_string()
        } else {
            format!("{} indicators", goal.indicator_count)
        };
        println!("{:>2}  {:<40} {}", goal.id, goal.name, count);
    }
}

fn list_indicators(catalog: &IndicatorCatalog, goal: u8) -> Result<()> {
    let indicators = catalog.indicators_for_goal(goal)?;
    if indicators.is_empty() {
        println!("No indicators configured for SDG {}.", goal);
        return Ok(());
    }

    for def in indicators {
        let target = match def.target_value {
            Some(value) => format!("{} by {}", fmt_value(Some(value)), def.target_year),
            None => MISSING.to_string(),
        };
        println!(
            "{:<6} {:<20} {:<50} {}",
            or_missing(&def.sdg_target),
            def.code,
            short(&def.label, 50),
            target
        );
    }
    Ok(())
}

fn print_overview(overview: &GoalOverview, selection: &CountrySelection, baseline_year: i32) {
    let focus = &selection.focus;
    println!(
        "{}  {} ({}), baseline policy year {}",
        overview.goal.label().bold(),
        country_label(focus),
        focus,
        baseline_year
    );
    println!();

    for outcome in &overview.outcomes {
        let def = &outcome.indicator;
        println!("{} {}", short(&def.label, 60).bold(), def.code.dimmed());

        let report = match &outcome.report {
            Ok(report) => report,
            Err(e) => {
                println!("  {} {}", "error:".red(), e);
                continue;
            }
        };

        if let Some(result) = report.progress_for(focus) {
            println!(
                "  baseline {:<18} latest {:<18} delta {:<12} gap closed {:<6} {}",
                fmt_point(result.baseline_year, result.baseline_value),
                fmt_point(result.latest_year, result.latest_value),
                fmt_delta(result.delta),
                fmt_percent(result.target_progress),
                status_label(result.status)
            );
        }

        let peers: Vec<String> = report
            .peer_snapshot()
            .into_iter()
            .take(SNAPSHOT_LIMIT)
            .map(|entry| format!("{} {} ({})", entry.country, fmt_value(Some(entry.value)), entry.year))
            .collect();
        if !peers.is_empty() {
            println!("  {} {}", "peers:".dimmed(), peers.join(", "));
        }
    }

    println!();
    let tally: Vec<String> = overview
        .status_tally(focus)
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(status, count)| format!("{} {}", count, status_label(status)))
        .collect();
    if !tally.is_empty() {
        println!("{}", tally.join(", "));
    }
    if overview.failure_count() > 0 {
        println!("{} indicator(s) could not be loaded", overview.failure_count());
    }
}

fn print_series(country: &CountryCode, points: Vec<(i32, f64)>, smoothed: Option<Vec<(i32, f64)>>) {
    println!();
    println!("{} {}", country.as_str().bold(), country_label(country));
    if points.is_empty() {
        println!("  {}", "no data".dimmed());
        return;
    }

    for (i, (year, value)) in points.iter().enumerate() {
        match smoothed.as_ref().and_then(|s| s.get(i)) {
            Some((_, mean)) => println!("  {}  {:>16}  {:>16}", year, fmt_value(Some(*value)), fmt_value(Some(*mean))),
            None => println!("  {}  {:>16}", year, fmt_value(Some(*value))),
        }
    }
}

fn or_missing(text: &str) -> &str {
    if text.trim().is_empty() {
        MISSING
    } else {
        text
    }
}

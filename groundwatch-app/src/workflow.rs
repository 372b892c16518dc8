use crate::config::{AppConfig, MonitoringData};
use crate::plotting;
use crate::report;
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use groundwatch_core::{
    alert_store::AlertStore,
    analysis::{self, DateWindow, ProjectSamples},
    assessment::{builder::AssessmentBuilder, state::AssessmentEvent, state::SampleAssessment},
    error::GroundwatchError,
    history,
};
use groundwatch_schemas::{calculation::CalculationRecord, sample::WaterSample};
use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
};
use tracing::info;

/// Which samples a calculation run should (re)assess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<'a> {
    /// Samples that have never been calculated.
    Pending,
    /// Every sample in the data directory.
    All,
    One(&'a str),
}

/// Counts reported back from a calculation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculationSummary {
    pub assessed: usize,
    pub skipped: usize,
    pub alerts: usize,
}

fn latest_calculations(config: &AppConfig) -> Result<HashMap<String, CalculationRecord>> {
    let records = history::read_history(config.history_path())
        .context("Failed to read calculation history")?;
    Ok(history::latest_by_sample(&records))
}

/// Runs the assessment engine over the selected samples, recording history and alerts.
pub fn run_calculations(
    config: &AppConfig,
    data: &MonitoringData,
    selection: Selection<'_>,
) -> Result<CalculationSummary> {
    println!("\n--- [Workflow] HMPI Calculation ---");

    let samples: Vec<WaterSample> = match selection {
        Selection::One(sample_id) => {
            let sample = data
                .sample(sample_id)
                .ok_or_else(|| GroundwatchError::SampleNotFound(sample_id.to_string()))?;
            vec![sample.clone()]
        }
        Selection::All => data.samples.clone(),
        Selection::Pending => {
            let latest = latest_calculations(config)?;
            data.samples
                .iter()
                .filter(|s| !latest.contains_key(&s.sample_id))
                .cloned()
                .collect()
        }
    };

    if samples.is_empty() {
        println!("No samples awaiting calculation.");
        return Ok(CalculationSummary::default());
    }

    fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", config.data_dir))?;

    let mut engine = AssessmentBuilder::new()
        .with_standards(data.standards_for(&config.jurisdiction)?)
        .with_alert_policy(config.alert_policy())
        .with_projects(data.projects.clone())
        .with_analyst(&config.analyst)
        .with_history_logging_to_file(config.history_path())
        .with_alert_store(config.alerts_path())
        .build()?;

    engine.run(&samples)?;

    for assessment in engine.assessments() {
        print_assessment(assessment);
    }

    let mut summary = CalculationSummary {
        assessed: engine.assessments().len(),
        ..Default::default()
    };
    for event in engine.events() {
        match event {
            AssessmentEvent::Skipped { sample_id, reason } => {
                summary.skipped += 1;
                println!("  - Skipped {}: {}", sample_id, reason);
            }
            AssessmentEvent::AlertRaised { .. } => summary.alerts += 1,
            AssessmentEvent::Calculated { .. } => {}
        }
    }

    println!("----------------------------------------");
    println!(
        "Assessed: {} | Skipped: {} | Alerts raised: {}",
        summary.assessed, summary.skipped, summary.alerts
    );
    info!(
        assessed = summary.assessed,
        skipped = summary.skipped,
        "calculation run finished"
    );
    Ok(summary)
}

fn print_assessment(assessment: &SampleAssessment) {
    println!(
        "\nSample {} ({}): HMPI {:.2} [{}]{}",
        assessment.sample_name,
        assessment.record.sample_id,
        assessment.result.index,
        assessment.result.level.risk_label(),
        if assessment.result.requires_treatment() { " - treatment required" } else { "" }
    );
    for (metal, contribution) in &assessment.result.contributions {
        println!("  - {:<10} {:>8.1}% of limit", metal, contribution);
    }
    for recommendation in &assessment.result.recommendations {
        println!("  * {}", recommendation);
    }
    if let Some(alert) = &assessment.alert {
        println!("  ! [{}] {}", alert.severity, alert.message);
    }
}

/// Builds the water quality report for the last `days` days and writes it as JSON.
pub fn water_quality_report(
    config: &AppConfig,
    data: &MonitoringData,
    project_id: Option<&str>,
    days: u32,
    today: NaiveDate,
) -> Result<PathBuf> {
    println!("\n--- [Workflow] Water Quality Report ---");
    if let Some(id) = project_id {
        data.project(id)
            .ok_or_else(|| GroundwatchError::ProjectNotFound(id.to_string()))?;
    }

    let latest = latest_calculations(config)?;
    let window = DateWindow::last_days(today, days);
    let groups = analysis::group_by_project(&data.projects, &data.samples, &latest, Some(window));
    let report = analysis::water_quality_report(&groups, project_id, today, days, Utc::now());

    println!("Timeframe: {} ({} to {})", report.timeframe, window.start, window.end);
    println!(
        "Projects: {} | Samples: {} | Average HMPI: {:.2} | High-risk projects: {}",
        report.summary.total_projects,
        report.summary.total_samples,
        report.summary.average_hmpi,
        report.summary.high_risk_projects
    );
    for project in &report.detailed_analysis {
        println!(
            "  - {:<24} samples {:>3} | avg {:>8.2} | max {:>8.2} | trend {:?}",
            project.project_name,
            project.sample_count,
            project.avg_hmpi,
            project.max_hmpi,
            project.contamination_trend
        );
    }

    let path = report::write_json_report(
        &config.output_dir,
        &report::water_quality_file_name(today),
        &report,
    )?;
    println!("Report saved to '{}'", path.display());
    Ok(path)
}

/// Builds the compliance report for projects located in `region` and writes it as JSON.
pub fn compliance_report(
    config: &AppConfig,
    data: &MonitoringData,
    region: Option<&str>,
    today: NaiveDate,
) -> Result<PathBuf> {
    println!("\n--- [Workflow] Compliance Report ---");
    let latest = latest_calculations(config)?;
    let groups = analysis::group_by_project(&data.projects, &data.samples, &latest, None);
    let report = analysis::compliance_report(&groups, region, Utc::now());

    println!(
        "Region: {} | Projects: {} | Compliance: {:.1}% | Critical violations: {}",
        report.region,
        report.total_projects,
        report.overall_compliance_rate,
        report.critical_violations
    );
    for project in &report.projects {
        println!(
            "  - {:<24} {:>3}/{:<3} compliant ({:.1}%)",
            project.project_name,
            project.compliant_samples,
            project.total_samples,
            project.compliance_rate
        );
    }

    let path = report::write_json_report(
        &config.output_dir,
        &report::compliance_file_name(region, today),
        &report,
    )?;
    println!("Report saved to '{}'", path.display());
    Ok(path)
}

/// Builds regional, distribution and seasonal analytics and writes them as JSON.
pub fn analytics_report(
    config: &AppConfig,
    data: &MonitoringData,
    days: u32,
    today: NaiveDate,
) -> Result<PathBuf> {
    println!("\n--- [Workflow] Regional Analytics ---");
    let latest = latest_calculations(config)?;
    let window = DateWindow::last_days(today, days);
    let groups = analysis::group_by_project(&data.projects, &data.samples, &latest, Some(window));
    let report = analysis::analytics_report(&groups, today, days, Utc::now());

    println!("Average compliance: {:.1}%", report.average_compliance);
    for region in &report.regions {
        println!(
            "  - {:<20} samples {:>3} | compliance {:>5.1}% | risk {:?} | trend {:?}",
            region.region,
            region.total_samples,
            region.compliance_rate,
            region.risk_level,
            region.trend
        );
    }
    println!("HMPI distribution:");
    for band in &report.hmpi_distribution {
        println!("  - {:<22} {}", band.name, band.count);
    }
    if !report.compliance_trend.is_empty() {
        println!("Compliance over time:");
        for point in &report.compliance_trend {
            println!(
                "  - {} {:>5.1}% across {} project(s)",
                point.date, point.compliance_rate, point.projects
            );
        }
    }

    let path = report::write_json_report(
        &config.output_dir,
        &report::analytics_file_name(today),
        &report,
    )?;
    println!("Report saved to '{}'", path.display());
    Ok(path)
}

pub fn dashboard(config: &AppConfig, data: &MonitoringData) -> Result<analysis::DashboardOverview> {
    let latest = latest_calculations(config)?;
    let store = AlertStore::load(config.alerts_path())?;
    let overview = analysis::dashboard_overview(&data.projects, &data.samples, &latest, store.all());

    println!("\n--- [Dashboard] ---");
    println!("========================================");
    println!("  - Projects:          {}", overview.total_projects);
    println!("  - Samples:           {}", overview.total_samples);
    println!("  - Analyzed samples:  {}", overview.analyzed_samples);
    println!("  - High-risk sites:   {}", overview.high_risk_sites);
    println!("  - Critical alerts:   {}", overview.critical_alerts);
    println!("  - Compliance rate:   {:.1}%", overview.compliance_rate);
    println!("\nProjects by region:");
    for (region, count) in &overview.projects_by_region {
        println!("  - {}: {}", region, count);
    }
    println!("========================================");
    Ok(overview)
}

pub fn list_alerts(config: &AppConfig, unresolved_only: bool) -> Result<usize> {
    let store = AlertStore::load(config.alerts_path())?;
    let alerts = store.list(unresolved_only);
    if alerts.is_empty() {
        println!("No alerts.");
    }
    for alert in &alerts {
        println!(
            "[{}] {} {} {}{}",
            alert.severity,
            alert.created_at.format("%Y-%m-%d %H:%M"),
            alert.alert_id,
            alert.message,
            if alert.resolved { " (resolved)" } else { "" }
        );
    }
    Ok(alerts.len())
}

pub fn resolve_alert(config: &AppConfig, alert_id: &str) -> Result<()> {
    let mut store = AlertStore::load(config.alerts_path())?;
    let message = store.resolve(alert_id)?.message.clone();
    store.save()?;
    info!(alert = %alert_id, "alert resolved");
    println!("Resolved {}: {}", alert_id, message);
    Ok(())
}

pub fn print_standards(config: &AppConfig, data: &MonitoringData) -> Result<()> {
    let table = data.standards_for(&config.jurisdiction)?;
    println!("\nPermissible limits ({}):", table.jurisdiction);
    for (metal, limit) in &table.limits {
        println!("  - {:<10} {:>8.4} mg/L", metal, limit);
    }
    Ok(())
}

/// Draws contribution charts for each latest calculation and an HMPI timeline per project.
pub fn generate_plots(
    config: &AppConfig,
    data: &MonitoringData,
    project_id: Option<&str>,
) -> Result<PathBuf> {
    if let Some(id) = project_id {
        data.project(id)
            .ok_or_else(|| GroundwatchError::ProjectNotFound(id.to_string()))?;
    }
    let standards = data.standards_for(&config.jurisdiction)?;
    let latest = latest_calculations(config)?;
    let groups: Vec<ProjectSamples<'_>> =
        analysis::group_by_project(&data.projects, &data.samples, &latest, None)
            .into_iter()
            .filter(|g| project_id.map_or(true, |id| g.project.project_id == id))
            .collect();

    let plot_dir = config.output_dir.join("plots");
    plotting::generate_all_plots(&plot_dir, &groups, &standards)?;
    Ok(plot_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROJECTS: &str = "schema_version: \"1\"
projects:
  - project_id: P-1
    name: Ludhiana wells
    location: Punjab, Ludhiana
    latitude: 30.9
    longitude: 75.8
    created_at: null
";

    const SAMPLES: &str = "schema_version: \"1\"
samples:
  - sample_id: S-1
    project_id: P-1
    sample_name: Tube well 1
    collection_date: 2024-06-20
    heavy_metals:
      - metal_type: Lead
        concentration_mg_l: 2.0
  - sample_id: S-2
    project_id: P-1
    sample_name: Tube well 2
    collection_date: 2024-06-25
    heavy_metals:
      - metal_type: Zinc
        concentration_mg_l: 1.0
";

    fn setup() -> (tempfile::TempDir, AppConfig, MonitoringData) {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        for (sub, content) in [("projects/p.yaml", PROJECTS), ("samples/s.yaml", SAMPLES)] {
            let path = data_dir.join(sub);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let config = AppConfig {
            data_dir: data_dir.clone(),
            output_dir: dir.path().join("reports"),
            analyst: "lab-1".to_string(),
            ..AppConfig::default()
        };
        let data = MonitoringData::load(&data_dir).unwrap();
        (dir, config, data)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    #[test]
    fn pending_run_only_calculates_new_samples() {
        let (_dir, config, data) = setup();

        let first = run_calculations(&config, &data, Selection::Pending).unwrap();
        assert_eq!(first, CalculationSummary { assessed: 2, skipped: 0, alerts: 1 });

        let second = run_calculations(&config, &data, Selection::Pending).unwrap();
        assert_eq!(second.assessed, 0);

        let again = run_calculations(&config, &data, Selection::One("S-2")).unwrap();
        assert_eq!(again.assessed, 1);
        assert_eq!(history::read_history(config.history_path()).unwrap().len(), 3);

        assert!(run_calculations(&config, &data, Selection::One("S-404")).is_err());
    }

    #[test]
    fn reports_are_written_to_output_dir() {
        let (_dir, config, data) = setup();
        run_calculations(&config, &data, Selection::All).unwrap();

        let path = water_quality_report(&config, &data, None, 30, today()).unwrap();
        assert!(path.ends_with("water-quality-report-2024-06-30.json"));
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["summary"]["total_samples"], 2);

        let path = compliance_report(&config, &data, Some("Punjab"), today()).unwrap();
        assert!(path.ends_with("compliance-report-punjab-2024-06-30.json"));

        let path = analytics_report(&config, &data, 90, today()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["regions"][0]["region"], "Punjab");
        assert_eq!(json["average_compliance"], 50.0);
        // Steps of 8 days back from June 30 hit June 20, when S-1 was collected.
        assert_eq!(json["compliance_trend"][0]["date"], "2024-06-20");
        assert_eq!(json["compliance_trend"][0]["projects"], 1);
        assert_eq!(json["compliance_trend"].as_array().unwrap().len(), 1);

        assert!(water_quality_report(&config, &data, Some("P-404"), 30, today()).is_err());
    }

    #[test]
    fn alerts_can_be_listed_and_resolved() {
        let (_dir, config, data) = setup();
        run_calculations(&config, &data, Selection::All).unwrap();

        let store = AlertStore::load(config.alerts_path()).unwrap();
        let alert_id = store.all()[0].alert_id.clone();
        assert_eq!(list_alerts(&config, true).unwrap(), 1);

        resolve_alert(&config, &alert_id).unwrap();
        assert_eq!(list_alerts(&config, true).unwrap(), 0);
        assert_eq!(list_alerts(&config, false).unwrap(), 1);
        assert!(resolve_alert(&config, "ALRT-missing").is_err());

        let overview = dashboard(&config, &data).unwrap();
        assert_eq!(overview.analyzed_samples, 2);
        assert_eq!(overview.high_risk_sites, 1);
        assert_eq!(overview.critical_alerts, 0);
    }
}

use approx::assert_relative_eq;
use chrono::{NaiveDate, TimeZone, Utc};
use groundwatch_core::{
    alert_store::AlertStore,
    analysis::{self, ContaminationTrend, DateWindow},
    assessment::{builder::AssessmentBuilder, state::AssessmentEvent},
    history,
};
use groundwatch_schemas::{
    alert::AlertSeverity,
    calculation::ContaminationLevel,
    metal::MetalReading,
    project::{Project, ProjectStatus},
    sample::WaterSample,
};

fn project(id: &str, location: &str) -> Project {
    Project {
        project_id: id.to_string(),
        name: format!("Project {}", id),
        description: String::new(),
        location: location.to_string(),
        latitude: None,
        longitude: None,
        status: ProjectStatus::Active,
        created_at: None,
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
}

fn samples() -> Vec<WaterSample> {
    vec![
        // Clean: Zinc well below its limit.
        WaterSample::new("S-1", "P-1", "Well A", day(1)).with_reading(MetalReading::new("Zinc", 0.5)),
        // Lead at 2 mg/L alone: ratio 200, index 200 -> high alert.
        WaterSample::new("S-2", "P-1", "Well B", day(2)).with_reading(MetalReading::new("Lead", 2.0)),
        // Mercury at 0.5 mg/L: ratio 500 -> critical alert.
        WaterSample::new("S-3", "P-2", "Spring C", day(3)).with_reading(MetalReading::new("Mercury", 0.5)),
        // Nothing measured: skipped.
        WaterSample::new("S-4", "P-2", "Spring D", day(4)).with_reading(MetalReading::new("Copper", 0.0)),
        // Unknown project: skipped.
        WaterSample::new("S-5", "P-9", "Stray", day(5)).with_reading(MetalReading::new("Lead", 0.1)),
    ]
}

#[test]
fn run_records_history_alerts_and_skips() {
    let dir = tempfile::tempdir().unwrap();
    let history_path = dir.path().join("calculations.csv");
    let alerts_path = dir.path().join("alerts.json");

    let mut engine = AssessmentBuilder::new()
        .with_projects(vec![project("P-1", "Punjab, Bathinda"), project("P-2", "Kerala, Kochi")])
        .with_analyst("dr.rao")
        .with_history_logging_to_file(&history_path)
        .with_alert_store(&alerts_path)
        .build()
        .unwrap();

    let all_samples = samples();
    engine.run(&all_samples).unwrap();

    assert_eq!(engine.assessments().len(), 3);
    let skipped: Vec<&str> = engine
        .events()
        .iter()
        .filter_map(|e| match e {
            AssessmentEvent::Skipped { sample_id, .. } => Some(sample_id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(skipped, vec!["S-4", "S-5"]);

    let records = history::read_history(&history_path).unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.calculated_by == "dr.rao"));
    assert_relative_eq!(records[1].hmpi_value, 200.0, epsilon = 1e-9);
    assert_eq!(records[1].contamination_level, ContaminationLevel::High);
    assert_eq!(records[2].contamination_level, ContaminationLevel::VeryHigh);

    let store = AlertStore::load(&alerts_path).unwrap();
    let severities: Vec<AlertSeverity> = store.all().iter().map(|a| a.severity).collect();
    assert_eq!(severities, vec![AlertSeverity::High, AlertSeverity::Critical]);
    assert_eq!(store.all()[0].message, "High HMPI value detected: 200.00 in sample Well B");
}

#[test]
fn assess_returns_recommendations_for_the_sample() {
    let mut engine = AssessmentBuilder::new()
        .with_projects(vec![project("P-1", "Punjab")])
        .build()
        .unwrap();

    let sample = WaterSample::new("S-9", "P-1", "Hand pump", day(9))
        .with_reading(MetalReading::new("Lead", 0.02))
        .with_reading(MetalReading::new("Mercury", 0.0005));
    let assessment = engine
        .assess(&sample, Utc.with_ymd_and_hms(2024, 7, 10, 8, 0, 0).unwrap())
        .unwrap();

    assert_relative_eq!(assessment.result.index, 700.0 / 1100.0, epsilon = 1e-9);
    assert!(assessment.alert.is_none());
    assert_eq!(assessment.record.calculated_by, "unknown");
    assert_eq!(
        assessment.result.recommendations,
        vec![
            "Lead contamination detected - check plumbing systems",
            "Water quality within acceptable limits",
            "Continue regular monitoring",
        ]
    );
}

#[test]
fn builder_rejects_inverted_thresholds() {
    let result = AssessmentBuilder::new()
        .with_projects(vec![project("P-1", "Punjab")])
        .with_alert_policy(groundwatch_core::alerting::AlertPolicy {
            alert_threshold: 400.0,
            critical_threshold: 300.0,
        })
        .build();
    assert!(result.is_err());
}

#[test]
fn reports_over_assessed_samples() {
    let dir = tempfile::tempdir().unwrap();
    let history_path = dir.path().join("calculations.csv");
    let projects = vec![project("P-1", "Punjab, Bathinda"), project("P-2", "Kerala, Kochi")];

    let mut engine = AssessmentBuilder::new()
        .with_projects(projects.clone())
        .with_history_logging_to_file(&history_path)
        .build()
        .unwrap();
    let all_samples = samples();
    engine.run(&all_samples).unwrap();

    let latest = history::latest_by_sample(&history::read_history(&history_path).unwrap());
    let window = DateWindow::last_days(day(10), 30);
    let groups = analysis::group_by_project(&projects, &all_samples, &latest, Some(window));

    let report = analysis::water_quality_report(&groups, None, day(10), 30, Utc::now());
    assert_eq!(report.summary.total_projects, 2);
    assert_eq!(report.summary.total_samples, 3);
    // P-1 averages (index of S-1 + 200) / 2, P-2 averages 500.
    assert_eq!(report.summary.high_risk_projects, 1);
    let p1 = &report.detailed_analysis[0];
    assert_relative_eq!(p1.max_hmpi, 200.0, epsilon = 1e-9);
    assert_eq!(p1.contamination_trend, ContaminationTrend::Stable);
    // Steps of 3 days back from July 10 land on July 1 and July 4; S-4 was never assessed.
    assert_eq!(report.trend_data.len(), 1);
    assert_eq!(report.trend_data[0].date, day(1));

    let compliance = analysis::compliance_report(&groups, Some("kerala"), Utc::now());
    assert_eq!(compliance.total_projects, 1);
    assert_eq!(compliance.total_samples, 1);
    assert_eq!(compliance.critical_violations, 1);
    assert_eq!(compliance.overall_compliance_rate, 0.0);

    let regions = analysis::regional_analytics(&groups);
    assert_eq!(regions.len(), 2);
    assert_eq!(regions[0].region, "Kerala");
    assert_eq!(regions[1].region, "Punjab");
    assert_relative_eq!(regions[1].compliance_rate, 50.0, epsilon = 1e-9);
}

#[test]
fn failed_alert_save_keeps_sample_pending() {
    let dir = tempfile::tempdir().unwrap();
    let history_path = dir.path().join("calculations.csv");
    let alerts_path = dir.path().join("alerts.json");
    let blocker = dir.path().join("alerts.json.tmp");
    let polluted = vec![WaterSample::new("S-2", "P-1", "Well B", day(2))
        .with_reading(MetalReading::new("Lead", 5.0))];

    std::fs::create_dir(&blocker).unwrap();
    let mut engine = AssessmentBuilder::new()
        .with_projects(vec![project("P-1", "Punjab")])
        .with_history_logging_to_file(&history_path)
        .with_alert_store(&alerts_path)
        .build()
        .unwrap();
    assert!(engine.run(&polluted).is_err());
    drop(engine);

    assert!(history::read_history(&history_path).unwrap().is_empty());
    assert!(AlertStore::load(&alerts_path).unwrap().all().is_empty());

    std::fs::remove_dir(&blocker).unwrap();
    let mut engine = AssessmentBuilder::new()
        .with_projects(vec![project("P-1", "Punjab")])
        .with_history_logging_to_file(&history_path)
        .with_alert_store(&alerts_path)
        .build()
        .unwrap();
    engine.run(&polluted).unwrap();

    assert_eq!(history::read_history(&history_path).unwrap().len(), 1);
    let store = AlertStore::load(&alerts_path).unwrap();
    assert_eq!(store.all().len(), 1);
    assert_eq!(engine.assessments()[0].alert.as_ref().unwrap().alert_id, store.all()[0].alert_id);
}

#[test]
fn engine_without_projects_skips_every_sample() {
    let mut engine = AssessmentBuilder::new().build().unwrap();

    let all_samples = samples();
    engine.run(&all_samples).unwrap();

    assert!(engine.assessments().is_empty());
    let reasons: Vec<&str> = engine
        .events()
        .iter()
        .filter_map(|e| match e {
            AssessmentEvent::Skipped { reason, .. } => Some(reason.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(reasons.len(), all_samples.len());
    assert!(reasons.iter().all(|r| r.contains("not found")));
}

use crate::infra::{
    load_guidelines, memory_service, parse_date, parse_value_pair, seed_demo_data, DEMO_ADMIN,
    DEMO_PATIENT,
};
use chrono::{NaiveDate, TimeZone, Utc};
use clap::Args;
use igtrack::config::GuidelineSource;
use igtrack::error::AppError;
use igtrack::evaluation::{EvaluationEngine, EvaluationReport, ParameterOutcome};
use igtrack::records::{
    ParameterCatalog, RecordDraft, RecordHistory, SubjectId, Viewer, DEFAULT_TEST_TYPE,
};
use std::fmt::Write as _;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Subject date of birth (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) dob: NaiveDate,
    /// Sample collection date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) observed: NaiveDate,
    /// Measured value as PARAMETER=VALUE; repeat for each parameter
    #[arg(long = "value", value_parser = parse_value_pair, required = true)]
    pub(crate) values: Vec<(String, String)>,
    /// Guideline file (.json or .csv); defaults to the built-in tables
    #[arg(long)]
    pub(crate) guidelines: Option<PathBuf>,
    /// Print the report as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Guideline file (.json or .csv); defaults to the built-in tables
    #[arg(long)]
    pub(crate) guidelines: Option<PathBuf>,
}

fn guideline_source(path: Option<PathBuf>) -> GuidelineSource {
    path.map(GuidelineSource::File)
        .unwrap_or(GuidelineSource::BuiltIn)
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs {
        dob,
        observed,
        values,
        guidelines,
        json,
    } = args;

    let guidelines = load_guidelines(&guideline_source(guidelines))?;
    let observed_at = Utc.from_utc_datetime(&observed.and_time(chrono::NaiveTime::MIN));
    let draft = RecordDraft {
        subject_id: SubjectId("cli".to_string()),
        observed_at,
        test_type: DEFAULT_TEST_TYPE.to_string(),
        results: values.into_iter().collect(),
        notes: None,
    };
    let record = draft
        .validate(&ParameterCatalog::immunoglobulin_panel())
        .map_err(igtrack::records::ServiceError::from)?;

    let report = EvaluationEngine::new(guidelines).evaluate(&record, dob);
    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(body) => println!("{body}"),
            Err(err) => println!("Report unavailable: {err}"),
        }
    } else {
        print!("{}", format_report(&report));
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let guidelines = load_guidelines(&guideline_source(args.guidelines))?;
    let (service, store) = memory_service(guidelines);

    println!("Immunoglobulin tracking demo");
    let records = seed_demo_data(&service, &store)?;
    let Some(latest) = records.last().and_then(|record| record.id.clone()) else {
        println!("  No records were stored");
        return Ok(());
    };

    let patient = Viewer::user(DEMO_PATIENT);
    let report = service.guideline_report(&patient, &latest)?;
    print!("{}", format_report(&report));

    let history = service.history(&patient, &latest)?;
    print!("{}", format_history(&history));

    println!("\nPatient roster (admin view)");
    for entry in service.roster(&Viewer::admin(DEMO_ADMIN), None)? {
        println!("- {} <{}> [{}]", entry.name, entry.email, entry.subject_id);
    }

    Ok(())
}

pub(crate) fn format_report(report: &EvaluationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "\n{} for {} (age {} months)",
        report.test_type, report.subject_id, report.age_months
    );

    for guideline in &report.guidelines {
        if !guideline.has_data {
            let _ = writeln!(out, "{} (no data)", guideline.guideline);
            continue;
        }
        let _ = writeln!(out, "{} guideline", guideline.guideline);
        for entry in &guideline.parameters {
            let line = match &entry.outcome {
                ParameterOutcome::Evaluated { bracket, verdict } => format!(
                    "{} {} {} {} | normal {} - {}",
                    verdict.arrow(),
                    entry.parameter,
                    entry.value,
                    entry.unit,
                    bracket.min_val,
                    bracket.max_val
                ),
                other => format!(
                    "{} {} {} | {}",
                    entry.parameter,
                    entry.value,
                    entry.unit,
                    other.summary()
                ),
            };
            let _ = writeln!(out, "  {line}");
        }
    }

    let summary = report.summary();
    let _ = writeln!(
        out,
        "Out of range: {} | without applicable bracket: {} | without guideline data: {}",
        summary.out_of_range(),
        summary.age_not_covered,
        summary.no_guideline_data
    );
    out
}

pub(crate) fn format_history(history: &RecordHistory) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "\nPrevious values ({}, up to {})",
        history.test_type,
        history.observed_at.format("%Y-%m-%d")
    );
    for parameter in &history.parameters {
        let _ = writeln!(out, "{}", parameter.parameter);
        for entry in &parameter.entries {
            let arrow = entry.trend.arrow().unwrap_or(" ");
            let _ = writeln!(
                out,
                "  {} {} {} {}",
                entry.observed_at.format("%Y-%m-%d"),
                entry.value,
                entry.unit,
                arrow
            );
        }
    }
    out
}

//! Markdown and JSON report generation.
//!
//! This module renders a [`StatsReport`] for people (Markdown tables) or
//! for dashboards (JSON keyed exactly like the summary fields).

use super::{ReportFormat, ReportMetadata, StatsReport};
use crate::error::RenderError;
use crate::models::{AncService, MAX_ANC_VISITS};
use crate::stats::{NutritionTotals, StatsSummary, VaccineWastage, AGE_BANDS};
use chrono::Month;
use std::collections::BTreeMap;
use std::path::Path;

/// Generate a complete Markdown report.
///
/// Grouping tables with no observed values are left out unless
/// `include_empty_sections` is set.
pub fn generate_markdown_report(report: &StatsReport, include_empty_sections: bool) -> String {
    let mut output = String::new();
    let summary = &report.patients;

    output.push_str("# Maternal & Child Health Statistics\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report));
    output.push_str(&generate_overview_section(summary));
    output.push_str(&generate_anc_section(summary));
    output.push_str(&generate_delivery_section(summary, include_empty_sections));
    output.push_str(&generate_pnc_section(summary));
    output.push_str(&generate_fp_section(summary));
    output.push_str(&generate_immunization_section(summary));
    output.push_str(&generate_demographics_section(summary, include_empty_sections));

    if let Some(ref nutrition) = report.nutrition {
        output.push_str(&generate_nutrition_section(nutrition));
    }
    if let Some(ref vaccine) = report.vaccine {
        output.push_str(&generate_vaccine_section(vaccine));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Scope:** {}\n", metadata.scope));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Reporting Year:** {}\n", metadata.reporting_year));
    section.push_str(&format!(
        "- **Patient Records:** {}\n",
        metadata.patient_records
    ));
    section.push_str(&format!(
        "- **Nutrition Reports:** {}\n",
        metadata.nutrition_reports
    ));
    section.push_str(&format!(
        "- **Vaccine Reports:** {}\n",
        metadata.vaccine_reports
    ));
    if metadata.include_drafts {
        section.push_str("- **Note:** draft monthly reports are included\n");
    }
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &StatsReport) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    for title in [
        "Overview",
        "Antenatal Care",
        "Delivery",
        "Postnatal Care",
        "Family Planning",
        "Immunization",
        "Demographics",
    ] {
        toc.push_str(&format!("- [{}](#{})\n", title, anchor(title)));
    }
    if report.nutrition.is_some() {
        toc.push_str("- [Nutrition](#nutrition)\n");
    }
    if report.vaccine.is_some() {
        toc.push_str("- [Vaccine Accountability](#vaccine-accountability)\n");
    }
    toc.push('\n');

    toc
}

fn anchor(title: &str) -> String {
    title.to_lowercase().replace(' ', "-")
}

/// Generate the headline numbers.
fn generate_overview_section(summary: &StatsSummary) -> String {
    let mut section = String::new();

    section.push_str("## Overview\n\n");
    section.push_str("| Registered | Delivered | Facility Deliveries | Live Births | FP Users |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} ({}%) | {} | {} ({}%) |\n\n",
        summary.total_patients,
        summary.delivered,
        summary.facility_deliveries,
        summary.facility_delivery_rate,
        summary.live_births,
        summary.total_fp_users,
        summary.fp_uptake_rate
    ));

    section
}

/// Generate the antenatal care section.
fn generate_anc_section(summary: &StatsSummary) -> String {
    let mut section = String::new();

    section.push_str("## Antenatal Care\n\n");
    section.push_str("| Visit | Patients | Rate |\n");
    section.push_str("|:---|:---:|:---:|\n");
    let counts = summary.anc_visits_breakdown.slots();
    let rates = summary.anc_rates();
    for i in 0..MAX_ANC_VISITS as usize {
        section.push_str(&format!("| ANC {} | {} | {}% |\n", i + 1, counts[i], rates[i]));
    }
    section.push_str(&format!(
        "\nPatients with 5 or more contacts: **{}**\n\n",
        summary.anc_visits_breakdown.anc5plus
    ));

    section.push_str("### Services Delivered (per visit)\n\n");
    section.push_str("| Service | Visits |\n");
    section.push_str("|:---|:---:|\n");
    for service in AncService::ALL {
        section.push_str(&format!(
            "| {} | {} |\n",
            service.key(),
            summary.anc_service_counts.get(service)
        ));
    }
    section.push('\n');

    let hiv = &summary.hiv_outcomes;
    section.push_str("### HIV Testing (per visit)\n\n");
    section.push_str("| Positive | Negative | Awaiting Result | Not Tested |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} |\n\n",
        hiv.positive, hiv.negative, hiv.awaiting_result, hiv.not_tested
    ));

    section
}

/// Generate the delivery section.
fn generate_delivery_section(summary: &StatsSummary, include_empty: bool) -> String {
    let mut section = String::new();

    section.push_str("## Delivery\n\n");
    section.push_str("| Live Births | Stillbirths | Miscarriages |\n");
    section.push_str("|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} |\n\n",
        summary.live_births, summary.stillbirths, summary.miscarriages
    ));

    section.push_str(&count_table(
        "Delivery Type",
        &summary.delivery_type_distribution,
        include_empty,
    ));
    section.push_str(&count_table(
        "Delivery Outcome",
        &summary.delivery_outcomes,
        include_empty,
    ));
    section.push_str(&count_table(
        "Delivery Kit Received",
        &summary.delivery_kits_received,
        include_empty,
    ));

    section
}

/// Generate the postnatal care section.
fn generate_pnc_section(summary: &StatsSummary) -> String {
    let mut section = String::new();

    section.push_str("## Postnatal Care\n\n");
    section.push_str("| Visit | Received | Rate |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for (i, (received, rate)) in summary
        .pnc_received()
        .into_iter()
        .zip(summary.pnc_rates())
        .enumerate()
    {
        section.push_str(&format!("| PNC {} | {} | {}% |\n", i + 1, received, rate));
    }
    section.push_str(&format!(
        "\nDelivered patients without all three visits: **{}**\n\n",
        summary.pnc_incomplete
    ));

    section
}

/// Generate the family planning section.
fn generate_fp_section(summary: &StatsSummary) -> String {
    let mut section = String::new();

    section.push_str("## Family Planning\n\n");
    section.push_str(&format!(
        "Users: **{}** ({}% uptake)\n\n",
        summary.total_fp_users, summary.fp_uptake_rate
    ));
    section.push_str("| Method | Users |\n");
    section.push_str("|:---|:---:|\n");
    let mut methods: Vec<_> = summary.fp_methods_usage.iter().collect();
    methods.sort_by_key(|(_, count)| std::cmp::Reverse(**count));
    for (method, count) in methods {
        section.push_str(&format!("| {} | {} |\n", method, count));
    }
    section.push('\n');

    section
}

/// Generate the immunization coverage section.
fn generate_immunization_section(summary: &StatsSummary) -> String {
    let mut section = String::new();

    section.push_str("## Immunization\n\n");
    section.push_str("| Vaccine | Children | Coverage |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for (vaccine, coverage) in &summary.immunization_coverage_details {
        section.push_str(&format!(
            "| {} | {} | {}% |\n",
            vaccine, coverage.count, coverage.rate
        ));
    }
    section.push_str("\n*Coverage is measured against all registered patients.*\n\n");

    section
}

/// Generate the demographics section.
fn generate_demographics_section(summary: &StatsSummary, include_empty: bool) -> String {
    let mut section = String::new();

    section.push_str("## Demographics\n\n");

    section.push_str("### Age\n\n");
    section.push_str("| Band | Patients |\n");
    section.push_str("|:---|:---:|\n");
    for band in AGE_BANDS {
        let count = summary.age_distribution.get(band).copied().unwrap_or(0);
        section.push_str(&format!("| {} | {} |\n", band, count));
    }
    section.push('\n');

    section.push_str(&format!(
        "### Registrations in {}\n\n",
        summary.reporting_year
    ));
    section.push_str("| Month | Registered |\n");
    section.push_str("|:---|:---:|\n");
    for (month, count) in &summary.monthly_registrations {
        section.push_str(&format!("| {} | {} |\n", month_name(*month), count));
    }
    section.push('\n');

    section.push_str(&count_table(
        "Literacy Status",
        &summary.literacy_status_distribution,
        include_empty,
    ));
    section.push_str(&count_table(
        "Health Insurance",
        &summary.health_insurance_enrollment,
        include_empty,
    ));

    section
}

fn month_name(month: u32) -> String {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name().to_string())
        .unwrap_or_else(|| month.to_string())
}

/// Generate the nutrition section.
fn generate_nutrition_section(totals: &NutritionTotals) -> String {
    let mut section = String::new();

    section.push_str("## Nutrition\n\n");
    section.push_str("| Screened 6-23m | Screened 24-59m | Normal | MAM | SAM | Oedema |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | {} | {} |\n\n",
        totals.age_6_23_total_screened,
        totals.age_24_59_total_screened,
        totals.total_normal,
        totals.total_mam,
        totals.total_sam,
        totals.total_oedema
    ));

    section.push_str("### Interventions\n\n");
    section.push_str("| Albendazole | Vitamin A | RUTF | MNP |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} |\n\n",
        totals.total_albendazole, totals.total_vitamin_a, totals.total_rutf, totals.total_mnp
    ));

    section
}

/// Generate the vaccine accountability section.
fn generate_vaccine_section(wastage: &VaccineWastage) -> String {
    let mut section = String::new();

    section.push_str("## Vaccine Accountability\n\n");
    section.push_str("| Doses Used | Wastage Rate | Stock-outs | Closing Stock |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {}% | {} | {} |\n\n",
        wastage.total_doses_used,
        wastage.vaccine_wastage_rate,
        wastage.stock_out_count,
        wastage.closing_stock
    ));

    if !wastage.wastage_by_antigen.is_empty() {
        section.push_str("### Wastage by Antigen\n\n");
        section.push_str("| Antigen | Wastage |\n");
        section.push_str("|:---|:---:|\n");
        for (antigen, rate) in &wastage.wastage_by_antigen {
            section.push_str(&format!("| {} | {}% |\n", antigen, rate));
        }
        section.push('\n');
    }

    section
}

/// A two-column table of observed values, most frequent first.
fn count_table(title: &str, counts: &BTreeMap<String, usize>, include_empty: bool) -> String {
    if counts.is_empty() && !include_empty {
        return String::new();
    }

    let mut table = String::new();
    table.push_str(&format!("### {}\n\n", title));

    if counts.is_empty() {
        table.push_str("*No data recorded.*\n\n");
        return table;
    }

    table.push_str("| Value | Patients |\n");
    table.push_str("|:---|:---:|\n");
    let mut rows: Vec<_> = counts.iter().collect();
    rows.sort_by_key(|(_, count)| std::cmp::Reverse(**count));
    for (value, count) in rows {
        table.push_str(&format!("| {} | {} |\n", value, count));
    }
    table.push('\n');

    table
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Generated by mch-stats v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &StatsReport) -> Result<String, RenderError> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Render `report` in `format` and write it to `path`.
pub fn write_report(
    report: &StatsReport,
    path: &Path,
    format: ReportFormat,
    include_empty_sections: bool,
) -> Result<(), RenderError> {
    let content = match format {
        ReportFormat::Json => generate_json_report(report)?,
        ReportFormat::Markdown => generate_markdown_report(report, include_empty_sections),
    };

    std::fs::write(path, content).map_err(|source| RenderError::Write {
        path: path.to_path_buf(),
        source,
    })
}

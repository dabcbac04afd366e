/// A4 project report rendered with printpdf's built-in Helvetica
///
/// Layout is a single text column: header, progress, budget, milestones and
/// tasks. A new page starts whenever the cursor reaches the bottom margin.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

use crate::domain::BudgetAlert;
use crate::error::ServiceResult;
use crate::export::ProjectReport;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const LINE_HEIGHT: f32 = 6.0;
const BODY_SIZE: f32 = 10.0;
const HEADING_SIZE: f32 = 13.0;
const TITLE_SIZE: f32 = 18.0;

/// Render the report; the result is a complete PDF file
pub fn render_project_report(report: &ProjectReport) -> ServiceResult<Vec<u8>> {
    let title = format!("Project report: {}", report.project.name);
    let (doc, page, layer) = PdfDocument::new(
        pdf_text(&title),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "content",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow::anyhow!("failed to load font: {e}"))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| anyhow::anyhow!("failed to load font: {e}"))?;

    let layer = doc.get_page(page).get_layer(layer);
    let mut writer = PageWriter {
        doc,
        layer,
        regular,
        bold,
        cursor: PAGE_HEIGHT - MARGIN,
        pages: 1,
    };

    write_header(&mut writer, report);
    write_progress(&mut writer, report);
    write_budget(&mut writer, report);
    write_milestones(&mut writer, report);
    write_tasks(&mut writer, report);

    let pages = writer.pages;
    let bytes = writer
        .doc
        .save_to_bytes()
        .map_err(|e| anyhow::anyhow!("failed to encode pdf: {e}"))?;

    tracing::debug!(
        "Rendered report for project {} ({} pages, {} bytes)",
        report.project.id,
        pages,
        bytes.len()
    );
    Ok(bytes)
}

struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Baseline of the next line, in mm from the bottom edge
    cursor: f32,
    pages: usize,
}

impl PageWriter {
    fn title(&mut self, text: &str) {
        self.ensure_room(TITLE_SIZE * 0.6);
        self.layer
            .use_text(pdf_text(text), TITLE_SIZE, Mm(MARGIN), Mm(self.cursor), &self.bold);
        self.cursor -= LINE_HEIGHT * 1.8;
    }

    fn heading(&mut self, text: &str) {
        self.cursor -= LINE_HEIGHT * 0.5;
        // keep a heading on the same page as its first line
        self.ensure_room(LINE_HEIGHT * 3.0);
        self.layer
            .use_text(pdf_text(text), HEADING_SIZE, Mm(MARGIN), Mm(self.cursor), &self.bold);
        self.cursor -= LINE_HEIGHT * 1.3;
    }

    fn line(&mut self, text: &str) {
        self.ensure_room(LINE_HEIGHT);
        self.layer
            .use_text(pdf_text(text), BODY_SIZE, Mm(MARGIN), Mm(self.cursor), &self.regular);
        self.cursor -= LINE_HEIGHT;
    }

    fn ensure_room(&mut self, needed: f32) {
        if self.cursor - needed >= MARGIN {
            return;
        }
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "content");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.cursor = PAGE_HEIGHT - MARGIN;
        self.pages += 1;
    }
}

fn write_header(w: &mut PageWriter, report: &ProjectReport) {
    let project = &report.project;
    w.title(&project.name);
    w.line(&format!("Status: {}", project.status));
    if let Some(address) = &project.address {
        w.line(&format!("Address: {address}"));
    }
    let start = project.start_date.map_or("-".to_string(), |d| d.to_string());
    let end = project.target_end_date.map_or("-".to_string(), |d| d.to_string());
    w.line(&format!("Schedule: {start} to {end}"));
    w.line(&format!("Generated on {}", report.generated_on));
}

fn write_progress(w: &mut PageWriter, report: &ProjectReport) {
    let progress = &report.progress;
    w.heading("Progress");
    w.line(&format!(
        "{:.1}% complete across {} tasks",
        progress.percent_complete, progress.tasks_total
    ));
    for (status, count) in &progress.tasks_by_status {
        w.line(&format!("  {status}: {count}"));
    }
    w.line(&format!(
        "Milestones: {} ({} overdue)",
        progress.milestones_total, progress.overdue_milestones
    ));
    if progress.overdue_deliveries > 0 {
        w.line(&format!("Overdue deliveries: {}", progress.overdue_deliveries));
    }
}

fn write_budget(w: &mut PageWriter, report: &ProjectReport) {
    let view = &report.budget;
    let currency = &view.budget.currency;
    w.heading("Budget");
    w.line(&format!(
        "Estimated: {:.2} {currency} (items {:.2}, tasks {:.2})",
        view.budget.total_estimated, view.budget.items_estimated, view.budget.tasks_estimated
    ));
    w.line(&format!(
        "Actual: {:.2} {currency} (items {:.2}, tasks {:.2})",
        view.budget.total_actual, view.budget.items_actual, view.budget.tasks_actual
    ));
    w.line(&format!("Remaining: {:.2} {currency}", view.remaining));
    match view.variance_percent {
        Some(variance) => w.line(&format!("Variance: {variance:+.2}%")),
        None => w.line("Variance: n/a"),
    }
    if view.alert != BudgetAlert::None {
        w.line(&format!("Alert: {}", view.alert));
    }
}

fn write_milestones(w: &mut PageWriter, report: &ProjectReport) {
    w.heading("Milestones");
    if report.milestones.is_empty() {
        w.line("No milestones");
    }
    for milestone in &report.milestones {
        w.line(&format!(
            "{}  [{}]  due {}",
            milestone.title, milestone.status, milestone.due_date
        ));
    }
}

fn write_tasks(w: &mut PageWriter, report: &ProjectReport) {
    w.heading("Tasks");
    if report.tasks.is_empty() {
        w.line("No tasks");
    }
    for task in &report.tasks {
        let mut line = format!("{}  [{}]", task.title, task.status);
        if let Some(due) = task.due_date {
            line.push_str(&format!("  due {due}"));
        }
        if let Some(price) = task.actual_price.or(task.estimated_price) {
            line.push_str(&format!("  {price:.2}"));
        }
        w.line(&line);
    }
}

/// The built-in fonts only cover single-byte text
fn pdf_text(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Budget, BudgetView, Milestone, MilestoneStatus, ProgressSummary, Project, ProjectStatus, Task,
        TaskPriority, TaskStatus,
    };
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn report(task_count: usize) -> ProjectReport {
        let now = Utc::now();
        let project_id = Uuid::new_v4();
        let day = NaiveDate::from_ymd_opt(2026, 5, 4).unwrap();
        let budget = Budget {
            id: Uuid::new_v4(),
            project_id,
            currency: "EUR".into(),
            total_estimated: 1000.0,
            total_actual: 1150.0,
            items_estimated: 600.0,
            items_actual: 700.0,
            tasks_estimated: 400.0,
            tasks_actual: 450.0,
            recalculated_at: now,
            created_at: now,
            updated_at: now,
        };
        let tasks = (0..task_count)
            .map(|i| Task {
                id: Uuid::new_v4(),
                project_id,
                milestone_id: None,
                assignee_id: None,
                template_id: None,
                title: format!("Task {i}"),
                description: None,
                status: TaskStatus::Todo,
                priority: TaskPriority::Medium,
                due_date: Some(day),
                estimated_price: Some(10.0),
                actual_price: None,
                created_at: now,
                updated_at: now,
            })
            .collect();

        ProjectReport {
            project: Project {
                id: project_id,
                owner_id: Uuid::new_v4(),
                name: "Küche renovation".into(),
                description: None,
                address: Some("12 Elm Street".into()),
                status: ProjectStatus::Active,
                start_date: Some(day),
                target_end_date: None,
                created_at: now,
                updated_at: now,
            },
            budget: BudgetView::from(budget),
            progress: ProgressSummary::default(),
            milestones: vec![Milestone {
                id: Uuid::new_v4(),
                project_id,
                title: "Rough-in".into(),
                description: None,
                due_date: day,
                status: MilestoneStatus::InProgress,
                completed_at: None,
                position: 0,
                created_at: now,
                updated_at: now,
            }],
            tasks,
            generated_on: day,
        }
    }

    #[test]
    fn renders_pdf_bytes() {
        let bytes = render_project_report(&report(3)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn long_reports_paginate() {
        let short = render_project_report(&report(1)).unwrap();
        let long = render_project_report(&report(200)).unwrap();
        assert!(long.starts_with(b"%PDF"));
        assert!(long.len() > short.len());
    }

    #[test]
    fn non_ascii_is_replaced() {
        assert_eq!(pdf_text("Küche"), "K?che");
        assert_eq!(pdf_text("Tiles & grout"), "Tiles & grout");
    }
}

use crate::error::Result;
use crate::models::problem::{Difficulty, Problem};
use rust_xlsxwriter::*;

pub const JSON_EXPORT_FILENAME: &str = "selected_problems.json";
pub const XLSX_EXPORT_FILENAME: &str = "selected_problems.xlsx";

pub struct ExportService;

impl ExportService {
    /// Pretty-printed JSON array of the full problem records.
    pub fn problems_json(problems: &[Problem]) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(problems)?)
    }

    /// One-sheet workbook with a row per problem.
    pub fn problems_xlsx(problems: &[Problem]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Problems")?;

        // ── Color palette ──
        let header_bg = Color::RGB(0x0F172A);
        let header_text = Color::White;
        let alt_row_1 = Color::RGB(0xF8FAFC);
        let alt_row_2 = Color::White;
        let border_color = Color::RGB(0xE2E8F0);

        let columns = [
            ("#", 6.0),
            ("ID", 24.0),
            ("Title", 36.0),
            ("Difficulty", 12.0),
            ("Topics", 30.0),
            ("Summary", 60.0),
            ("One-liner", 50.0),
        ];

        for (i, (_, width)) in columns.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }

        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(header_text)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        worksheet.set_row_height(0, 26)?;
        for (i, (name, _)) in columns.iter().enumerate() {
            worksheet.write_string_with_format(0, i as u16, *name, &header_format)?;
        }

        for (idx, problem) in problems.iter().enumerate() {
            let row = 1 + idx as u32;
            let bg = if idx % 2 == 0 { alt_row_1 } else { alt_row_2 };

            let base_fmt = Format::new()
                .set_font_size(10)
                .set_background_color(bg)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            let center_fmt = base_fmt.clone().set_align(FormatAlign::Center);
            let wrap_fmt = base_fmt.clone().set_text_wrap();

            let difficulty_color = match problem.difficulty {
                Difficulty::Easy => Color::RGB(0x10B981),
                Difficulty::Medium => Color::RGB(0xF59E0B),
                Difficulty::Hard => Color::RGB(0xEF4444),
            };
            let difficulty_fmt = center_fmt.clone().set_bold().set_font_color(difficulty_color);

            worksheet.write_number_with_format(row, 0, (idx + 1) as f64, &center_fmt)?;
            worksheet.write_string_with_format(row, 1, &problem.id, &base_fmt)?;
            worksheet.write_string_with_format(row, 2, &problem.title, &base_fmt.clone().set_bold())?;
            worksheet.write_string_with_format(row, 3, problem.difficulty.as_str(), &difficulty_fmt)?;
            worksheet.write_string_with_format(row, 4, &problem.topics.join(", "), &wrap_fmt)?;
            worksheet.write_string_with_format(row, 5, &problem.problem_summary, &wrap_fmt)?;
            worksheet.write_string_with_format(row, 6, &problem.canonical_idea.one_liner, &wrap_fmt)?;
        }

        worksheet.set_freeze_panes(1, 0)?;
        worksheet.autofilter(0, 0, (problems.len() as u32).max(1), (columns.len() - 1) as u16)?;

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}
